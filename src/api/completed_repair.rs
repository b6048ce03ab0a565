//! Completed repair records, from both the user and the car-center side

use reqwest::Method;

use super::client::{ApiClient, ErrorText};
use super::error::ApiError;
use crate::models::CompletedRepair;

/// (user) Repairs done on my vehicles.
pub async fn my_completed_repairs(client: &ApiClient) -> Result<Vec<CompletedRepair>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "users", "my-completed-repairs"])?,
            None,
            ErrorText::Fixed("내 수리 내역을 가져오는 데 실패했습니다."),
        )
        .await
}

/// (user) Remove a repair record from my history.
pub async fn delete(client: &ApiClient, repair_id: i64) -> Result<(), ApiError> {
    let id = repair_id.to_string();
    client
        .command(
            Method::DELETE,
            client.url(&["api", "users", "completed-repairs", &id])?,
            None,
            ErrorText::Fixed("수리 내역 삭제에 실패했습니다."),
        )
        .await
}

/// (center) Mark a repair as completed. The backend notifies the user.
pub async fn mark_completed(client: &ApiClient, repair_id: i64) -> Result<(), ApiError> {
    let id = repair_id.to_string();
    client
        .command(
            Method::POST,
            client.url(&["api", "completed-repairs", &id, "complete"])?,
            None,
            ErrorText::Fixed("수리 완료 처리에 실패했습니다."),
        )
        .await
}

/// Detail of a single repair.
pub async fn details(client: &ApiClient, repair_id: i64) -> Result<CompletedRepair, ApiError> {
    let id = repair_id.to_string();
    client
        .request(
            Method::GET,
            client.url(&["api", "completed-repairs", &id])?,
            None,
            ErrorText::Fixed("수리 내역 상세 정보를 가져오는 데 실패했습니다."),
        )
        .await
}

/// (center) Every repair this center has handled.
pub async fn center_completed_repairs(
    client: &ApiClient,
) -> Result<Vec<CompletedRepair>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "car-centers", "my-completed-repairs"])?,
            None,
            ErrorText::Fixed("카센터의 수리 내역을 가져오는 데 실패했습니다."),
        )
        .await
}
