//! Chat rooms and message history (REST)
//!
//! Live delivery goes through the STOMP session in `crate::live`; these
//! endpoints only create rooms and load what was said before.

use async_trait::async_trait;
use reqwest::Method;

use super::client::{to_body, ApiClient, ErrorText};
use super::error::ApiError;
use crate::models::{ChatMessage, ChatRoom, CreateChatRoomRequest};

/// Anything that can list chat rooms and their history: the backend, or the
/// in-memory mock used for offline development.
#[async_trait]
pub trait ChatSource: Send + Sync {
    async fn rooms(&self) -> Result<Vec<ChatRoom>, ApiError>;
    async fn history(&self, room_id: &str) -> Result<Vec<ChatMessage>, ApiError>;
}

/// Create the room for a center/estimate pair, or return the existing one.
pub async fn create_or_get_room(
    client: &ApiClient,
    request: &CreateChatRoomRequest,
) -> Result<ChatRoom, ApiError> {
    client
        .request(
            Method::POST,
            client.url(&["api", "chat", "rooms"])?,
            Some(to_body(request)?),
            ErrorText::Fixed("채팅방을 생성하거나 불러오는데 실패했습니다."),
        )
        .await
}

/// List the rooms the current user takes part in.
pub async fn list_rooms(client: &ApiClient) -> Result<Vec<ChatRoom>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "chat", "rooms"])?,
            None,
            ErrorText::Fixed("채팅방 목록을 불러오는데 실패했습니다."),
        )
        .await
}

/// Earlier messages of a room, oldest first.
pub async fn history(client: &ApiClient, room_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
    client
        .request(
            Method::GET,
            client.url(&["api", "chat", "history", room_id])?,
            None,
            ErrorText::Fixed("대화 내역을 불러오는데 실패했습니다."),
        )
        .await
}

#[async_trait]
impl ChatSource for ApiClient {
    async fn rooms(&self) -> Result<Vec<ChatRoom>, ApiError> {
        list_rooms(self).await
    }

    async fn history(&self, room_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        history(self, room_id).await
    }
}
