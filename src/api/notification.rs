//! In-app notifications

use reqwest::Method;

use super::client::{ApiClient, ErrorText};
use super::error::ApiError;
use crate::models::Notification;

pub async fn list(client: &ApiClient) -> Result<Vec<Notification>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "notifications"])?,
            None,
            ErrorText::Fixed("알림 목록을 가져오는 데 실패했습니다."),
        )
        .await
}

/// Number of unread notifications. The backend answers with a bare integer.
pub async fn unread_count(client: &ApiClient) -> Result<u32, ApiError> {
    let url = client.url(&["api", "notifications", "unread-count"])?;
    let text = client
        .request_text(
            Method::GET,
            url.clone(),
            ErrorText::Fixed("안 읽은 알림 개수를 가져오는 데 실패했습니다."),
        )
        .await?;
    text.trim().parse().map_err(|e| ApiError::Decode {
        url: url.to_string(),
        reason: format!("expected an integer, got {:?}: {}", text, e),
    })
}

pub async fn mark_read(client: &ApiClient, notification_id: i64) -> Result<(), ApiError> {
    let id = notification_id.to_string();
    client
        .command(
            Method::POST,
            client.url(&["api", "notifications", &id, "read"])?,
            None,
            ErrorText::Fixed("알림을 읽음 처리하는 데 실패했습니다."),
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_and_mark_read() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/notifications");
                then.status(200).json_body(json!([{
                    "id": 3, "message": "새 견적이 도착했습니다.", "isRead": false,
                    "url": null, "createTime": "2025-08-01T10:00:00"
                }]));
            })
            .await;
        let read = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/notifications/3/read");
                then.status(200);
            })
            .await;

        let client = ApiClient::new(&server.base_url(), Some("tok".to_string())).unwrap();
        let items = list(&client).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(!items[0].is_read);
        assert!(items[0].url.is_none());

        mark_read(&client, items[0].id).await.unwrap();
        read.assert_async().await;
    }

    #[tokio::test]
    async fn test_unread_count_plain_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/notifications/unread-count");
                then.status(200).body("4\n");
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        assert_eq!(unread_count(&client).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_unread_count_garbage_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/notifications/unread-count");
                then.status(200).body("many");
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let err = unread_count(&client).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
