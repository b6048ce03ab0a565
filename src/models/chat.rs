//! Chat-related models

use serde::{Deserialize, Deserializer, Serialize};

/// One side of a chat room (the user or the car center).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

/// Chat room between a user and a car center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    /// The backend emits a number here; the client always works with strings.
    #[serde(deserialize_with = "string_or_number")]
    pub room_id: String,
    pub user: Participant,
    pub car_center: Participant,
    pub updated_at: String,
    #[serde(default)]
    pub last_message: Option<String>,
}

/// Who sent a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderType {
    User,
    CarCenter,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// History documents carry `id`, the web client type calls it `messageId`.
    #[serde(alias = "id")]
    pub message_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_type: SenderType,
    pub content: String,
    #[serde(alias = "sentAt")]
    pub created_at: String,
}

/// A message that has not been assigned an id or timestamp yet.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub sender_id: String,
    pub sender_name: String,
    pub sender_type: SenderType,
    pub content: String,
}

/// Body of `POST /api/chat/rooms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRoomRequest {
    pub center_id: String,
    pub estimate_id: i64,
}

/// Outgoing live-chat payload. The server fills in everything but the content.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingChatMessage<'a> {
    pub content: &'a str,
}

/// Accept either a JSON string or a JSON integer and keep it as a string.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_accepts_number() {
        let room: ChatRoom = serde_json::from_str(
            r#"{"roomId":7,"updatedAt":"2025-08-01T10:00:00",
                "user":{"id":"u1","name":"김철수"},
                "carCenter":{"id":"c1","name":"강남 오토 서비스"}}"#,
        )
        .unwrap();
        assert_eq!(room.room_id, "7");
        assert_eq!(room.car_center.name, "강남 오토 서비스");
        assert!(room.last_message.is_none());
    }

    #[test]
    fn test_history_document_aliases() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"id":"66aa","roomId":3,"senderId":"c1","senderName":"카센터",
                "senderType":"CAR_CENTER","content":"안녕하세요","sentAt":"2025-08-01T10:00:00"}"#,
        )
        .unwrap();
        assert_eq!(msg.message_id, "66aa");
        assert_eq!(msg.room_id, "3");
        assert_eq!(msg.sender_type, SenderType::CarCenter);
        assert_eq!(msg.created_at, "2025-08-01T10:00:00");
    }

    #[test]
    fn test_create_room_request_is_camel_case() {
        let body = serde_json::to_value(CreateChatRoomRequest {
            center_id: "c1".to_string(),
            estimate_id: 5,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"centerId": "c1", "estimateId": 5}));
    }
}
