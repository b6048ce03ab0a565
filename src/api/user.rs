//! User-side API: quote requests, reviews, profile, vehicles, support inquiries

use reqwest::Method;

use super::client::{to_body, ApiClient, ErrorText};
use super::error::ApiError;
use crate::models::{
    CsInquiry, CsInquiryForm, QuoteRequest, QuoteRequestForm, Review, ReviewForm, UserCar,
    UserCarForm, UserProfile,
};

// -- Quote requests --

pub async fn create_quote_request(
    client: &ApiClient,
    form: &QuoteRequestForm,
) -> Result<(), ApiError> {
    client
        .command(
            Method::POST,
            client.url(&["api", "users", "quote-requests"])?,
            Some(to_body(form)?),
            ErrorText::Fixed("견적 요청 생성에 실패했습니다."),
        )
        .await
}

/// My open quote request. The backend answers 204 when there is none.
pub async fn my_quote_request(client: &ApiClient) -> Result<Option<QuoteRequest>, ApiError> {
    client
        .request_optional(
            Method::GET,
            client.url(&["api", "users", "my-quote-request"])?,
            None,
            ErrorText::Fixed("견적 요청 목록 조회에 실패했습니다."),
        )
        .await
}

pub async fn delete_quote_request(client: &ApiClient, request_id: i64) -> Result<(), ApiError> {
    let id = request_id.to_string();
    client
        .command(
            Method::DELETE,
            client.url(&["api", "users", "quote-requests", &id])?,
            None,
            ErrorText::Fixed("견적 요청 삭제에 실패했습니다."),
        )
        .await
}

/// Accept an estimate; the others on the same request get rejected server-side.
pub async fn accept_estimate(client: &ApiClient, estimate_id: i64) -> Result<(), ApiError> {
    let id = estimate_id.to_string();
    client
        .command(
            Method::PUT,
            client.url(&["api", "users", "estimates", &id, "accept"])?,
            None,
            ErrorText::Fixed("견적 확정에 실패했습니다."),
        )
        .await
}

// -- Reviews --

pub async fn review(client: &ApiClient, review_id: i64) -> Result<Review, ApiError> {
    let id = review_id.to_string();
    client
        .request(
            Method::GET,
            client.url(&["api", "users", "reviews", &id])?,
            None,
            ErrorText::Fixed("리뷰 정보를 불러오는 데 실패했습니다."),
        )
        .await
}

pub async fn create_review(client: &ApiClient, form: &ReviewForm) -> Result<(), ApiError> {
    client
        .command(
            Method::POST,
            client.url(&["api", "users", "reviews"])?,
            Some(to_body(form)?),
            ErrorText::Fixed("리뷰 작성에 실패했습니다."),
        )
        .await
}

pub async fn update_review(
    client: &ApiClient,
    review_id: i64,
    form: &ReviewForm,
) -> Result<(), ApiError> {
    let id = review_id.to_string();
    client
        .command(
            Method::PUT,
            client.url(&["api", "users", "reviews", &id])?,
            Some(to_body(form)?),
            ErrorText::Fixed("리뷰 수정에 실패했습니다."),
        )
        .await
}

pub async fn delete_review(client: &ApiClient, review_id: i64) -> Result<(), ApiError> {
    let id = review_id.to_string();
    client
        .command(
            Method::DELETE,
            client.url(&["api", "users", "reviews", &id])?,
            None,
            ErrorText::Fixed("리뷰 삭제에 실패했습니다."),
        )
        .await
}

pub async fn my_reviews(client: &ApiClient) -> Result<Vec<Review>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "users", "my-reviews"])?,
            None,
            ErrorText::Fixed("리뷰 목록 조회에 실패했습니다."),
        )
        .await
}

// -- Profile --

pub async fn profile(client: &ApiClient) -> Result<UserProfile, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "users", "profile"])?,
            None,
            ErrorText::Fixed("프로필 조회에 실패했습니다."),
        )
        .await
}

// -- Vehicles --

pub async fn my_vehicles(client: &ApiClient) -> Result<Vec<UserCar>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "users", "vehicles"])?,
            None,
            ErrorText::Fixed("내 차량 목록 조회에 실패했습니다."),
        )
        .await
}

pub async fn create_vehicle(client: &ApiClient, form: &UserCarForm) -> Result<(), ApiError> {
    client
        .command(
            Method::POST,
            client.url(&["api", "users", "vehicles"])?,
            Some(to_body(form)?),
            ErrorText::Fixed("차량 생성에 실패했습니다."),
        )
        .await
}

pub async fn update_vehicle(
    client: &ApiClient,
    vehicle_id: i64,
    form: &UserCarForm,
) -> Result<(), ApiError> {
    let id = vehicle_id.to_string();
    client
        .command(
            Method::PUT,
            client.url(&["api", "users", "vehicles", &id])?,
            Some(to_body(form)?),
            ErrorText::Fixed("차량 정보 수정에 실패했습니다."),
        )
        .await
}

// -- Support inquiries --

pub async fn create_cs_inquiry(client: &ApiClient, form: &CsInquiryForm) -> Result<(), ApiError> {
    client
        .command(
            Method::POST,
            client.url(&["api", "users", "cs"])?,
            Some(to_body(form)?),
            ErrorText::Fixed("문의 생성에 실패했습니다."),
        )
        .await
}

pub async fn my_cs_inquiries(client: &ApiClient) -> Result<Vec<CsInquiry>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "users", "cs"])?,
            None,
            ErrorText::Fixed("문의 목록 조회에 실패했습니다."),
        )
        .await
}
