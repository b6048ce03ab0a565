use serde::{Deserialize, Serialize};

/// In-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub message: String,
    pub is_read: bool,
    #[serde(default)]
    pub url: Option<String>,
    pub create_time: String,
}

/// Body of `POST /chatbot/ask`
#[derive(Debug, Clone, Serialize)]
pub struct ChatbotRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatbotReply {
    pub reply: String,
}
