//! Chatbot host. Separate base URL, no auth.

use reqwest::Method;

use super::client::{to_body, ApiClient, ErrorText};
use super::error::ApiError;
use crate::models::{ChatbotReply, ChatbotRequest};

/// Forward a free-text question and return the bot's answer.
pub async fn ask(client: &ApiClient, message: &str) -> Result<String, ApiError> {
    let reply: ChatbotReply = client
        .request(
            Method::POST,
            client.url(&["chatbot", "ask"])?,
            Some(to_body(&ChatbotRequest { message })?),
            ErrorText::Fixed("챗봇 응답에 실패했습니다."),
        )
        .await?;
    Ok(reply.reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ask_returns_reply() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chatbot/ask")
                    .header_missing("Authorization")
                    .json_body(json!({"message": "엔진 경고등이 켜졌어요"}));
                then.status(200)
                    .json_body(json!({"reply": "가까운 정비소에서 점검을 받아보세요."}));
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let reply = ask(&client, "엔진 경고등이 켜졌어요").await.unwrap();

        m.assert_async().await;
        assert_eq!(reply, "가까운 정비소에서 점검을 받아보세요.");
    }

    #[tokio::test]
    async fn test_ask_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chatbot/ask");
                then.status(503);
            })
            .await;

        let client = ApiClient::new(&server.base_url(), None).unwrap();
        let err = ask(&client, "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "챗봇 응답에 실패했습니다.");
    }
}
