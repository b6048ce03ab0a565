//! User-side models: profile, vehicles, reviews, support inquiries

use serde::{Deserialize, Serialize};

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub phone_number: String,
    pub marketing_agreed: bool,
}

/// A vehicle registered by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCar {
    pub user_car_id: i64,
    pub car_model: String,
    /// License plate
    pub car_number: String,
    pub model_year: i32,
    pub created_at: String,
}

/// Create/update body for a vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCarForm {
    pub car_model: String,
    pub car_number: String,
    pub model_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewForm {
    pub center_id: String,
    pub rating: u8,
    pub content: String,
    /// Only present when the review is attached to a completed repair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub review_id: i64,
    pub center_name: String,
    pub writer_name: String,
    pub rating: u8,
    pub content: String,
    pub created_at: String,
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsInquiryForm {
    pub title: String,
    pub question_content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsInquiry {
    pub inquiry_id: i64,
    pub user_name: String,
    pub title: String,
    pub question_content: String,
    #[serde(default)]
    pub answer_content: Option<String>,
    #[serde(default)]
    pub answered_at: Option<String>,
    pub created_at: String,
}

impl CsInquiry {
    pub fn is_answered(&self) -> bool {
        self.answer_content.is_some()
    }
}
