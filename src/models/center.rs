//! Car-center models: center profile, reservations, review replies, used parts

use serde::{Deserialize, Serialize};

/// Approval state of a car center account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CenterStatus {
    Pending,
    Active,
}

/// Car center as returned by the search and detail endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarCenter {
    pub center_id: String,
    pub center_name: String,
    #[serde(default)]
    pub business_registration_number: Option<String>,
    pub address: String,
    pub phone_number: String,
    pub status: CenterStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub opening_hours: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl CarCenter {
    /// Coordinates as `(latitude, longitude)` when both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarCenterRegistration {
    pub center_id: String,
    pub password: String,
    pub center_name: String,
    pub address: String,
    pub phone_number: String,
    pub business_registration_number: String,
    pub opening_hours: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarCenterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Search filters; unset filters are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CenterSearch {
    pub category: Option<String>,
    pub district: Option<String>,
    pub keyword: Option<String>,
    pub sort: Option<String>,
}

impl CenterSearch {
    /// Query pairs for the set filters, in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("category", &self.category),
            ("district", &self.district),
            ("keyword", &self.keyword),
            ("sort", &self.sort),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// Which field a duplicate check runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Id,
    BusinessNumber,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::Id => "id",
            DuplicateField::BusinessNumber => "businessNumber",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationForm {
    pub customer_name: String,
    pub customer_phone: String,
    pub car_info: String,
    pub reservation_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_id: i64,
    pub center_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub car_info: String,
    pub reservation_date: String,
    #[serde(default)]
    pub request_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReplyForm {
    pub review_id: i64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReply {
    pub reply_id: i64,
    pub review_id: i64,
    pub center_name: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReportForm {
    pub review_id: i64,
    pub reason: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub report_id: i64,
    pub review_id: i64,
    pub review_content: String,
    pub review_rating: u8,
    pub review_created_at: String,
    pub reporting_center_id: String,
    pub reporting_center_name: String,
    pub reason: String,
    pub content: String,
    pub status: ReportStatus,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedPart {
    pub part_id: i64,
    pub center_id: String,
    pub part_name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub compatible_car_model: String,
    pub created_at: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub center_phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(lat: Option<f64>, lng: Option<f64>) -> CarCenter {
        CarCenter {
            center_id: "c1".to_string(),
            center_name: "강남 오토 서비스".to_string(),
            business_registration_number: None,
            address: "서울".to_string(),
            phone_number: "02-000-0000".to_string(),
            status: CenterStatus::Active,
            description: None,
            opening_hours: None,
            latitude: lat,
            longitude: lng,
        }
    }

    #[test]
    fn test_coordinates_require_both_axes() {
        assert_eq!(center(Some(37.5), Some(127.0)).coordinates(), Some((37.5, 127.0)));
        assert_eq!(center(Some(37.5), None).coordinates(), None);
        assert_eq!(center(None, Some(127.0)).coordinates(), None);
    }

    #[test]
    fn test_search_pairs_skip_unset() {
        let search = CenterSearch {
            keyword: Some("타이어".to_string()),
            sort: Some("rating".to_string()),
            ..Default::default()
        };
        assert_eq!(search.pairs(), vec![("keyword", "타이어"), ("sort", "rating")]);
        assert!(CenterSearch::default().pairs().is_empty());
    }

    #[test]
    fn test_center_without_coordinates_decodes() {
        let c: CarCenter = serde_json::from_str(
            r#"{"centerId":"c2","centerName":"믿음 자동차 정비소","address":"서울 마포구",
                "phoneNumber":"02-111-1111","status":"PENDING"}"#,
        )
        .unwrap();
        assert_eq!(c.status, CenterStatus::Pending);
        assert!(c.coordinates().is_none());
    }
}
