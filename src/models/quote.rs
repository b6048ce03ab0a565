//! Quote requests and estimates

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Estimate status as seen by both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstimateStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

/// Quote request status in the car-center listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Pending,
    InProgress,
    Completed,
}

/// Body of `POST /api/users/quote-requests`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestForm {
    pub user_car_id: i64,
    pub request_details: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteWriter {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCar {
    pub user_car_id: i64,
    pub car_model: String,
    pub model_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestImage {
    pub image_id: i64,
    pub image_url: String,
}

/// A user's quote request, with the estimates received so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub request_id: i64,
    pub request_details: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: String,
    pub writer: QuoteWriter,
    pub car: QuoteCar,
    #[serde(default)]
    pub images: Vec<RequestImage>,
    pub estimate_count: u32,
    #[serde(default)]
    pub estimates: Vec<Estimate>,
}

/// Quote request as listed for a car center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterQuoteRequest {
    pub request_id: i64,
    pub request_details: String,
    pub address: String,
    pub created_at: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub car_model: String,
    pub car_year: i32,
    #[serde(default)]
    pub preferred_date: Option<String>,
    pub status: QuoteStatus,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// One priced line of an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateItem {
    pub item_id: i64,
    pub item_name: String,
    pub price: i64,
    pub required_hours: f64,
    pub part_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateItemForm {
    pub item_name: String,
    pub price: i64,
    pub required_hours: f64,
    pub part_type: String,
}

/// Parses `NAME:PRICE:HOURS:TYPE`, e.g. `브레이크 패드:80000:1.5:정품`.
impl FromStr for EstimateItemForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [name, price, hours, part_type] = parts[..] else {
            return Err(format!("expected NAME:PRICE:HOURS:TYPE, got '{}'", s));
        };
        if name.is_empty() {
            return Err("item name is empty".to_string());
        }
        let price = price
            .parse::<i64>()
            .map_err(|_| format!("invalid price '{}'", price))?;
        let required_hours = hours
            .parse::<f64>()
            .ok()
            .filter(|h| h.is_finite() && *h >= 0.0)
            .ok_or_else(|| format!("invalid hours '{}'", hours))?;
        Ok(Self {
            item_name: name.to_string(),
            price,
            required_hours,
            part_type: part_type.to_string(),
        })
    }
}

/// Body of estimate submit/update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateForm {
    pub request_id: i64,
    pub estimated_cost: i64,
    pub details: String,
    pub estimate_items: Vec<EstimateItemForm>,
}

/// A car center's priced proposal for a quote request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub estimate_id: i64,
    pub request_id: i64,
    pub estimated_cost: i64,
    pub details: String,
    pub created_at: String,
    pub status: EstimateStatus,
    #[serde(default)]
    pub estimate_items: Vec<EstimateItem>,
    #[serde(default)]
    pub center_id: Option<String>,
    #[serde(default)]
    pub center_name: Option<String>,
    pub customer_name: String,
    pub car_model: String,
    pub car_year: i32,
}

impl Estimate {
    /// Sum of the itemised prices. May differ from `estimated_cost`, which the
    /// center enters by hand.
    pub fn items_total(&self) -> i64 {
        self.estimate_items.iter().map(|item| item.price).sum()
    }
}
