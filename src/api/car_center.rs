//! Car-center API
//!
//! Unlike the user-side wrappers, failures here carry the server's own
//! `message` from the JSON error body.

use reqwest::Method;
use url::Url;

use super::client::{to_body, ApiClient, ErrorText};
use super::error::ApiError;
use crate::models::{
    CarCenter, CarCenterRegistration, CarCenterUpdate, CenterQuoteRequest, CenterSearch,
    DuplicateCheck, DuplicateField, Estimate, EstimateForm, Reservation, ReservationForm, Review,
    ReviewReply, ReviewReplyForm, ReviewReport, ReviewReportForm, UsedPart,
};

const ON_ERROR: ErrorText = ErrorText::FromServer;

fn centers_url(client: &ApiClient, rest: &[&str]) -> Result<Url, ApiError> {
    let mut segments = vec!["api", "car-centers"];
    segments.extend_from_slice(rest);
    client.url(&segments)
}

fn estimates_url(client: &ApiClient, rest: &[&str]) -> Result<Url, ApiError> {
    let mut segments = vec!["api", "estimates"];
    segments.extend_from_slice(rest);
    client.url(&segments)
}

// -- Account and profile --

pub async fn register(
    client: &ApiClient,
    form: &CarCenterRegistration,
) -> Result<CarCenter, ApiError> {
    let url = centers_url(client, &["register"])?;
    client
        .request(Method::POST, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn my_info(client: &ApiClient) -> Result<CarCenter, ApiError> {
    let url = centers_url(client, &["my-info"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn update_my_info(
    client: &ApiClient,
    update: &CarCenterUpdate,
) -> Result<CarCenter, ApiError> {
    let url = centers_url(client, &["my-info"])?;
    client
        .request(Method::PUT, url, Some(to_body(update)?), ON_ERROR)
        .await
}

pub async fn check_duplicate(
    client: &ApiClient,
    field: DuplicateField,
    value: &str,
) -> Result<DuplicateCheck, ApiError> {
    let mut url = centers_url(client, &["check-duplicate"])?;
    url.query_pairs_mut()
        .append_pair("type", field.as_str())
        .append_pair("value", value);
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn delete_center(client: &ApiClient, center_id: &str) -> Result<(), ApiError> {
    let url = centers_url(client, &[center_id])?;
    client.command(Method::DELETE, url, None, ON_ERROR).await
}

// -- Search (customer side) --

pub async fn search(client: &ApiClient, filters: &CenterSearch) -> Result<Vec<CarCenter>, ApiError> {
    let mut url = centers_url(client, &[])?;
    let pairs = filters.pairs();
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn center(client: &ApiClient, center_id: &str) -> Result<CarCenter, ApiError> {
    let url = centers_url(client, &[center_id])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

// -- Reservations --

pub async fn my_reservations(client: &ApiClient) -> Result<Vec<Reservation>, ApiError> {
    let url = centers_url(client, &["reservations", "my"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn create_reservation(
    client: &ApiClient,
    form: &ReservationForm,
) -> Result<Reservation, ApiError> {
    let url = centers_url(client, &["reservations"])?;
    client
        .request(Method::POST, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn update_reservation(
    client: &ApiClient,
    reservation_id: i64,
    form: &ReservationForm,
) -> Result<Reservation, ApiError> {
    let id = reservation_id.to_string();
    let url = centers_url(client, &["reservations", &id])?;
    client
        .request(Method::PUT, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn delete_reservation(client: &ApiClient, reservation_id: i64) -> Result<(), ApiError> {
    let id = reservation_id.to_string();
    let url = centers_url(client, &["reservations", &id])?;
    client.command(Method::DELETE, url, None, ON_ERROR).await
}

pub async fn today_reservation_count(client: &ApiClient) -> Result<u32, ApiError> {
    let url = centers_url(client, &["today-count"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

// -- Reviews, replies and reports --

pub async fn my_reviews(client: &ApiClient) -> Result<Vec<Review>, ApiError> {
    let url = centers_url(client, &["me", "reviews"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn reviews_for(client: &ApiClient, center_id: &str) -> Result<Vec<Review>, ApiError> {
    let url = centers_url(client, &[center_id, "reviews"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn create_reply(
    client: &ApiClient,
    form: &ReviewReplyForm,
) -> Result<ReviewReply, ApiError> {
    let url = centers_url(client, &["replies"])?;
    client
        .request(Method::POST, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn update_reply(
    client: &ApiClient,
    reply_id: i64,
    form: &ReviewReplyForm,
) -> Result<ReviewReply, ApiError> {
    let id = reply_id.to_string();
    let url = centers_url(client, &["replies", &id])?;
    client
        .request(Method::PUT, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn delete_reply(client: &ApiClient, reply_id: i64) -> Result<(), ApiError> {
    let id = reply_id.to_string();
    let url = centers_url(client, &["replies", &id])?;
    client.command(Method::DELETE, url, None, ON_ERROR).await
}

pub async fn report_review(
    client: &ApiClient,
    form: &ReviewReportForm,
) -> Result<ReviewReport, ApiError> {
    let url = centers_url(client, &["reports"])?;
    client
        .request(Method::POST, url, Some(to_body(form)?), ON_ERROR)
        .await
}

// -- Used parts --

pub async fn my_used_parts(client: &ApiClient) -> Result<Vec<UsedPart>, ApiError> {
    let url = centers_url(client, &["me", "used-parts"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn used_part(client: &ApiClient, part_id: i64) -> Result<UsedPart, ApiError> {
    let id = part_id.to_string();
    let url = centers_url(client, &["used-parts", &id])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn delete_used_part(client: &ApiClient, part_id: i64) -> Result<(), ApiError> {
    let id = part_id.to_string();
    let url = centers_url(client, &["used-parts", &id])?;
    client.command(Method::DELETE, url, None, ON_ERROR).await
}

/// Search used parts by name. A blank query returns nothing without a request.
pub async fn search_parts(client: &ApiClient, query: &str) -> Result<Vec<UsedPart>, ApiError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let mut url = centers_url(client, &["parts", "search"])?;
    url.query_pairs_mut().append_pair("query", query);
    client.request(Method::GET, url, None, ON_ERROR).await
}

// -- Quote requests and estimates --

pub async fn quote_requests(client: &ApiClient) -> Result<Vec<CenterQuoteRequest>, ApiError> {
    let url = centers_url(client, &["quote-requests"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn submit_estimate(client: &ApiClient, form: &EstimateForm) -> Result<Estimate, ApiError> {
    // The backend maps this one with a trailing slash.
    let url = estimates_url(client, &[""])?;
    client
        .request(Method::POST, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn my_estimates(client: &ApiClient) -> Result<Vec<Estimate>, ApiError> {
    let url = estimates_url(client, &["my-estimates"])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn estimate(client: &ApiClient, estimate_id: i64) -> Result<Estimate, ApiError> {
    let id = estimate_id.to_string();
    let url = estimates_url(client, &[&id])?;
    client.request(Method::GET, url, None, ON_ERROR).await
}

pub async fn update_estimate(
    client: &ApiClient,
    estimate_id: i64,
    form: &EstimateForm,
) -> Result<Estimate, ApiError> {
    let id = estimate_id.to_string();
    let url = estimates_url(client, &[&id])?;
    client
        .request(Method::PUT, url, Some(to_body(form)?), ON_ERROR)
        .await
}

pub async fn delete_estimate(client: &ApiClient, estimate_id: i64) -> Result<(), ApiError> {
    let id = estimate_id.to_string();
    let url = estimates_url(client, &[&id])?;
    client.command(Method::DELETE, url, None, ON_ERROR).await
}
