//! Completed repair records

use serde::{Deserialize, Serialize};

/// Repair lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    InProgress,
    Completed,
}

impl RepairStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RepairStatus::InProgress => "수리 중",
            RepairStatus::Completed => "수리 완료",
        }
    }
}

/// A repair performed by a car center for a user.
///
/// The user listing endpoint and the detail endpoint disagree on a few field
/// names (`id` vs `repairId`); both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRepair {
    #[serde(alias = "repairId")]
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    pub user_name: String,
    pub car_center_id: String,
    pub car_center_name: String,
    #[serde(default)]
    pub original_request_id: Option<i64>,
    #[serde(default)]
    pub original_estimate_id: Option<i64>,
    pub final_cost: i64,
    pub repair_details: String,
    pub status: RepairStatus,
    pub created_at: String,
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Set once the user has written a review for this repair.
    #[serde(default)]
    pub review_id: Option<i64>,
    #[serde(default)]
    pub car_model: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
}

impl CompletedRepair {
    pub fn is_reviewable(&self) -> bool {
        self.status == RepairStatus::Completed && self.review_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repair_id_alias_and_nulls() {
        let repair: CompletedRepair = serde_json::from_str(
            r#"{"repairId":12,"userName":"김철수","carCenterId":"c1","carCenterName":"믿음 정비",
                "finalCost":150000,"repairDetails":"엔진오일 교체","status":"COMPLETED",
                "createdAt":"2025-08-01T10:00:00","completedAt":null,"reviewId":null,
                "carModel":"아반떼","licensePlate":"12가3456"}"#,
        )
        .unwrap();
        assert_eq!(repair.id, 12);
        assert!(repair.completed_at.is_none());
        assert!(repair.is_reviewable());
    }

    #[test]
    fn test_in_progress_is_not_reviewable() {
        let repair: CompletedRepair = serde_json::from_str(
            r#"{"id":3,"userId":"u1","userName":"김철수","carCenterId":"c1","carCenterName":"믿음 정비",
                "originalRequestId":1,"originalEstimateId":2,"finalCost":0,"repairDetails":"",
                "status":"IN_PROGRESS","createdAt":"2025-08-01T10:00:00","completedAt":null}"#,
        )
        .unwrap();
        assert_eq!(repair.status, RepairStatus::InProgress);
        assert!(!repair.is_reviewable());
    }
}
