//! In-memory chat service for offline development
//!
//! Mirrors the REST chat endpoints with artificial latency and answers every
//! sent message with a canned reply. Each store owns its data; clones share it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiError, ChatSource};
use crate::models::{ChatMessage, ChatRoom, MessageDraft, Participant, SenderType};

pub const ROOMS_DELAY: Duration = Duration::from_millis(500);
pub const MESSAGES_DELAY: Duration = Duration::from_millis(300);
pub const REPLY_DELAY: Duration = Duration::from_millis(1500);

const REPLY_SENDER_ID: &str = "center1";
const REPLY_SENDER_NAME: &str = "상대방";

#[derive(Debug, Default)]
struct State {
    rooms: Vec<ChatRoom>,
    messages: HashMap<String, Vec<ChatMessage>>,
}

/// Handle to a mock chat backend.
#[derive(Clone)]
pub struct MockChatStore {
    state: Arc<Mutex<State>>,
}

impl MockChatStore {
    /// A store seeded with two rooms: "1" with two messages, "2" with none.
    pub fn new() -> Self {
        let now = Utc::now();
        let today = now.to_rfc3339();
        let yesterday = (now - ChronoDuration::days(1)).to_rfc3339();

        let me = Participant {
            id: "user1".to_string(),
            name: "나".to_string(),
        };
        let rooms = vec![
            ChatRoom {
                room_id: "1".to_string(),
                user: me.clone(),
                car_center: Participant {
                    id: "center1".to_string(),
                    name: "강남 오토 서비스".to_string(),
                },
                updated_at: today.clone(),
                last_message: Some("네, 예약 가능합니다.".to_string()),
            },
            ChatRoom {
                room_id: "2".to_string(),
                user: me,
                car_center: Participant {
                    id: "center2".to_string(),
                    name: "믿음 자동차 정비소".to_string(),
                },
                updated_at: yesterday,
                last_message: Some("부품 재고 확인 후 연락드리겠습니다.".to_string()),
            },
        ];

        let seed = |id: &str,
                    sender_id: &str,
                    sender_name: &str,
                    sender_type: SenderType,
                    content: &str| {
            ChatMessage {
                message_id: id.to_string(),
                room_id: "1".to_string(),
                sender_id: sender_id.to_string(),
                sender_name: sender_name.to_string(),
                sender_type,
                content: content.to_string(),
                created_at: today.clone(),
            }
        };
        let mut messages = HashMap::new();
        messages.insert(
            "1".to_string(),
            vec![
                seed(
                    "101",
                    "center1",
                    "강남 오토 서비스",
                    SenderType::CarCenter,
                    "안녕하세요. 문의 확인했습니다.",
                ),
                seed(
                    "102",
                    "user1",
                    "나",
                    SenderType::User,
                    "네, 엔진오일 교체 예약 가능한가요?",
                ),
            ],
        );
        messages.insert("2".to_string(), Vec::new());

        Self {
            state: Arc::new(Mutex::new(State { rooms, messages })),
        }
    }

    /// A poisoned lock only means a test panicked mid-update; keep serving.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All rooms, after `ROOMS_DELAY`.
    pub async fn fetch_rooms(&self) -> Vec<ChatRoom> {
        tracing::debug!("[mock] room list requested");
        tokio::time::sleep(ROOMS_DELAY).await;
        self.lock().rooms.clone()
    }

    /// Messages of a room, after `MESSAGES_DELAY`. Unknown rooms are empty.
    pub async fn fetch_messages(&self, room_id: &str) -> Vec<ChatMessage> {
        tracing::debug!("[mock] messages for room {} requested", room_id);
        tokio::time::sleep(MESSAGES_DELAY).await;
        self.lock().messages.get(room_id).cloned().unwrap_or_default()
    }

    /// Store a message and schedule the canned reply.
    ///
    /// The sent message is returned at once. After `REPLY_DELAY` the reply is
    /// appended to the room and handed to `on_reply`, unless the returned
    /// subscription was cancelled or dropped first. Must be called from
    /// within a Tokio runtime.
    pub fn send_message<F>(
        &self,
        room_id: &str,
        draft: MessageDraft,
        on_reply: F,
    ) -> (ChatMessage, ReplySubscription)
    where
        F: FnOnce(ChatMessage) + Send + 'static,
    {
        let sent = ChatMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            sender_id: draft.sender_id,
            sender_name: draft.sender_name,
            sender_type: draft.sender_type,
            content: draft.content,
            created_at: Utc::now().to_rfc3339(),
        };
        tracing::debug!("[mock] message {} sent to room {}", sent.message_id, room_id);
        self.lock()
            .messages
            .entry(room_id.to_string())
            .or_default()
            .push(sent.clone());

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let store = self.clone();
        let room_id = room_id.to_string();
        let content = sent.content.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    tracing::debug!("[mock] reply for room {} cancelled", room_id);
                }
                _ = tokio::time::sleep(REPLY_DELAY) => {
                    let reply = ChatMessage {
                        message_id: uuid::Uuid::new_v4().to_string(),
                        room_id: room_id.clone(),
                        sender_id: REPLY_SENDER_ID.to_string(),
                        sender_name: REPLY_SENDER_NAME.to_string(),
                        sender_type: SenderType::CarCenter,
                        content: format!("\"{}\" 라고 보내신 메시지 잘 받았습니다.", content),
                        created_at: Utc::now().to_rfc3339(),
                    };
                    store
                        .lock()
                        .messages
                        .entry(room_id)
                        .or_default()
                        .push(reply.clone());
                    on_reply(reply);
                }
            }
        });

        (
            sent,
            ReplySubscription {
                token,
                handle: Some(handle),
            },
        )
    }
}

impl Default for MockChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSource for MockChatStore {
    async fn rooms(&self) -> Result<Vec<ChatRoom>, ApiError> {
        Ok(self.fetch_rooms().await)
    }

    async fn history(&self, room_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        Ok(self.fetch_messages(room_id).await)
    }
}

/// Pending auto-reply. Dropping it cancels the reply.
pub struct ReplySubscription {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ReplySubscription {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the reply task has run to completion (delivered or cancelled).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the reply task to end.
    #[cfg(test)]
    pub async fn finished(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("[mock] reply task failed: {}", e);
            }
        }
    }
}

impl Drop for ReplySubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn draft(content: &str) -> MessageDraft {
        MessageDraft {
            sender_id: "user1".to_string(),
            sender_name: "나".to_string(),
            sender_type: SenderType::User,
            content: content.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_rooms_and_messages() {
        let store = MockChatStore::new();
        let rooms = store.fetch_rooms().await;
        assert_eq!(
            rooms.iter().map(|r| r.room_id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2"]
        );
        assert_eq!(rooms[0].car_center.name, "강남 오토 서비스");

        let first = store.fetch_messages("1").await;
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].content, "네, 엔진오일 교체 예약 가능한가요?");
        assert!(store.fetch_messages("2").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_waits_for_latency() {
        let store = MockChatStore::new();
        let start = tokio::time::Instant::now();
        store.fetch_rooms().await;
        assert!(start.elapsed() >= ROOMS_DELAY);

        let start = tokio::time::Instant::now();
        store.fetch_messages("1").await;
        assert!(start.elapsed() >= MESSAGES_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_room_is_empty() {
        let store = MockChatStore::new();
        assert!(store.fetch_messages("999").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_are_copies() {
        let store = MockChatStore::new();
        let mut rooms = store.fetch_rooms().await;
        rooms.clear();
        assert_eq!(store.fetch_rooms().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_auto_reply() {
        let store = MockChatStore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (sent, sub) = store.send_message("2", draft("타이어 교체 문의"), move |reply| {
            let _ = tx.send(reply);
        });
        assert_eq!(sent.room_id, "2");
        assert_eq!(sent.content, "타이어 교체 문의");

        // Appended synchronously, before any reply.
        assert_eq!(store.fetch_messages("2").await.len(), 1);
        assert!(rx.try_recv().is_err());

        let reply = rx.recv().await.unwrap();
        assert_ne!(reply.message_id, sent.message_id);
        assert_eq!(reply.sender_id, "center1");
        assert_eq!(reply.sender_name, "상대방");
        assert_eq!(reply.content, "\"타이어 교체 문의\" 라고 보내신 메시지 잘 받았습니다.");

        sub.finished().await;
        let msgs = store.fetch_messages("2").await;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1], reply);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_to_unknown_room_creates_it() {
        let store = MockChatStore::new();
        let (_sent, sub) = store.send_message("42", draft("hi"), |_| {});
        sub.finished().await;
        assert_eq!(store.fetch_messages("42").await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_subscription_never_replies() {
        let store = MockChatStore::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (_sent, sub) = store.send_message("1", draft("취소"), move |reply| {
            let _ = tx.send(reply);
        });
        drop(sub);

        tokio::time::sleep(REPLY_DELAY * 2).await;
        // The callback (and its sender) is dropped without being called.
        assert!(rx.recv().await.is_none());
        assert_eq!(store.fetch_messages("1").await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_timer() {
        let store = MockChatStore::new();
        let (_sent, sub) = store.send_message("1", draft("a"), |_| panic!("reply delivered"));
        tokio::time::sleep(REPLY_DELAY / 2).await;
        sub.cancel();
        sub.finished().await;
        assert_eq!(store.fetch_messages("1").await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stores_do_not_share_state() {
        let a = MockChatStore::new();
        let b = MockChatStore::new();
        let (_sent, sub) = a.send_message("2", draft("x"), |_| {});
        sub.cancel();
        assert_eq!(a.fetch_messages("2").await.len(), 1);
        assert!(b.fetch_messages("2").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_usable_as_chat_source() {
        let store = MockChatStore::new();
        let source: &dyn ChatSource = &store;
        assert_eq!(source.rooms().await.unwrap().len(), 2);
        assert_eq!(source.history("1").await.unwrap().len(), 2);
    }
}
