//! Async backend: bridges the TUI event loop with the chat source and API.
//!
//! Uses an mpsc channel pair. The TUI sends `BackendCommand` values, and a
//! background tokio task executes them and sends `BackendResponse` values back.
//!
//! Room-scoped resources (the live STOMP session, pending mock replies) are
//! owned by the loop and replaced whenever the TUI opens another room.

use std::sync::Arc;

use reqwest::StatusCode;

use tokio::sync::mpsc;
use url::Url;

use crate::api::{self, ApiClient, ApiError, ChatSource};
use crate::live::{self, LiveEvent, RoomSubscription};
use crate::mock::{MockChatStore, ReplySubscription};
use crate::models::{CarCenter, CenterSearch, ChatMessage, ChatRoom, MessageDraft, UserCar, UserCarForm};

/// Where chat data comes from.
#[derive(Clone)]
pub enum ChatMode {
    /// The backend over REST, with live delivery over STOMP.
    Remote(Arc<ApiClient>),
    /// In-memory store with canned replies.
    Mock(MockChatStore),
}

impl ChatMode {
    fn source(&self) -> &dyn ChatSource {
        match self {
            ChatMode::Remote(client) => client.as_ref(),
            ChatMode::Mock(store) => store,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, ChatMode::Mock(_))
    }
}

/// Commands sent from the TUI event loop to the async backend.
pub enum BackendCommand {
    LoadRooms,
    /// Switch the open room. Drops whatever belonged to the previous one.
    OpenRoom { room_id: String },
    CloseRoom,
    LoadMessages { room_id: String },
    SendMessage {
        room_id: String,
        temp_id: String,
        draft: MessageDraft,
    },
    LoadVehicles,
    SaveVehicle {
        vehicle_id: Option<i64>,
        form: UserCarForm,
    },
    LoadCenters { filters: CenterSearch },
}

/// Responses from the async backend to the TUI.
pub enum BackendResponse {
    Rooms(Result<Vec<ChatRoom>, ApiError>),
    Messages {
        room_id: String,
        result: Result<Vec<ChatMessage>, ApiError>,
    },
    /// Outcome of a send. `Ok(Some(..))` carries the stored message (mock),
    /// `Ok(None)` means it was handed to the live session and will echo back.
    MessageSent {
        room_id: String,
        temp_id: String,
        result: Result<Option<ChatMessage>, String>,
    },
    /// A message pushed to the open room by someone (or something) else.
    Incoming(ChatMessage),
    LiveStatus(LiveEvent),
    Vehicles(Result<Vec<UserCar>, ApiError>),
    VehicleSaved(Result<(), ApiError>),
    Centers(Result<Vec<CarCenter>, ApiError>),
}

/// Cloneable command sender, for handlers that outlive a single borrow of
/// the backend (e.g. the map's `on_create`).
#[derive(Clone)]
pub struct CommandSender(mpsc::UnboundedSender<BackendCommand>);

impl CommandSender {
    pub(super) fn new(tx: mpsc::UnboundedSender<BackendCommand>) -> Self {
        Self(tx)
    }

    pub fn send(&self, cmd: BackendCommand) {
        if self.0.send(cmd).is_err() {
            tracing::error!("Backend channel closed -- command dropped");
        }
    }
}

/// Handle for interacting with the backend from the TUI side.
pub struct Backend {
    cmd_tx: CommandSender,
    resp_rx: mpsc::UnboundedReceiver<BackendResponse>,
}

impl Backend {
    /// Start the backend. Spawns a tokio task that processes commands.
    pub fn start(mode: ChatMode) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel();

        tokio::spawn(backend_loop(mode, cmd_rx, resp_tx));

        Self {
            cmd_tx: CommandSender::new(cmd_tx),
            resp_rx,
        }
    }

    /// Send a command to the backend (non-blocking).
    pub fn send(&self, cmd: BackendCommand) {
        self.cmd_tx.send(cmd);
    }

    pub fn sender(&self) -> CommandSender {
        self.cmd_tx.clone()
    }

    /// Receive a response from the backend.
    ///
    /// Suspends until a response is available. Returns `None` only when the
    /// backend channel is permanently closed. Designed to be used inside
    /// `tokio::select!`.
    pub async fn recv(&mut self) -> Option<BackendResponse> {
        self.resp_rx.recv().await
    }
}

/// Everything tied to the currently open room.
#[derive(Default)]
struct RoomScope {
    room_id: Option<String>,
    live: Option<RoomSubscription>,
    pending_replies: Vec<ReplySubscription>,
}

impl RoomScope {
    fn is(&self, room_id: &str) -> bool {
        self.room_id.as_deref() == Some(room_id)
    }
}

/// Background loop that processes commands.
///
/// Room switches and sends are handled inline so the room-scoped handles stay
/// in one place; everything else is spawned so a slow request never blocks
/// the loop.
async fn backend_loop(
    mode: ChatMode,
    mut cmd_rx: mpsc::UnboundedReceiver<BackendCommand>,
    resp_tx: mpsc::UnboundedSender<BackendResponse>,
) {
    let mut room = RoomScope::default();

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            BackendCommand::OpenRoom { room_id } => {
                if room.is(&room_id) {
                    continue;
                }
                // Drop the previous room's session and pending replies first.
                room = RoomScope {
                    room_id: Some(room_id.clone()),
                    ..RoomScope::default()
                };
                if let ChatMode::Remote(ref client) = mode {
                    room.live = Some(open_live(client, room_id, &resp_tx));
                }
            }
            BackendCommand::CloseRoom => {
                room = RoomScope::default();
            }
            BackendCommand::SendMessage {
                room_id,
                temp_id,
                draft,
            } => {
                let result = send_in_room(&mode, &mut room, &room_id, draft, &resp_tx);
                let _ = resp_tx.send(BackendResponse::MessageSent {
                    room_id,
                    temp_id,
                    result,
                });
            }
            other => {
                let mode = mode.clone();
                let resp_tx = resp_tx.clone();
                tokio::spawn(async move {
                    let resp = run_request(&mode, other).await;
                    if let Some(resp) = resp {
                        let _ = resp_tx.send(resp);
                    }
                });
            }
        }
    }
}

/// Connect the live session for a room and forward its events.
fn open_live(
    client: &ApiClient,
    room_id: String,
    resp_tx: &mpsc::UnboundedSender<BackendResponse>,
) -> RoomSubscription {
    let (live_tx, mut live_rx) = mpsc::unbounded_channel();
    let base: Url = client.base_url().clone();
    let token = client.token().map(str::to_string);
    let subscription = live::subscribe_room(base, token, room_id, live_tx);

    // Ends once the subscription task is gone and its sender dropped.
    let resp_tx = resp_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = live_rx.recv().await {
            let resp = match event {
                LiveEvent::Message(msg) => BackendResponse::Incoming(msg),
                other => BackendResponse::LiveStatus(other),
            };
            if resp_tx.send(resp).is_err() {
                break;
            }
        }
    });

    subscription
}

fn send_in_room(
    mode: &ChatMode,
    room: &mut RoomScope,
    room_id: &str,
    draft: MessageDraft,
    resp_tx: &mpsc::UnboundedSender<BackendResponse>,
) -> Result<Option<ChatMessage>, String> {
    if !room.is(room_id) {
        return Err("채팅방이 열려 있지 않습니다.".to_string());
    }

    match mode {
        ChatMode::Mock(store) => {
            let reply_tx = resp_tx.clone();
            let (sent, pending) = store.send_message(room_id, draft, move |reply| {
                let _ = reply_tx.send(BackendResponse::Incoming(reply));
            });
            room.pending_replies.retain(|p| !p.is_finished());
            room.pending_replies.push(pending);
            Ok(Some(sent))
        }
        ChatMode::Remote(_) => match room.live {
            Some(ref live) if live.send(draft.content) => Ok(None),
            _ => Err("실시간 연결이 끊어져 메시지를 보낼 수 없습니다.".to_string()),
        },
    }
}

/// Run a request that does not touch room-scoped state.
async fn run_request(mode: &ChatMode, cmd: BackendCommand) -> Option<BackendResponse> {
    let resp = match cmd {
        BackendCommand::LoadRooms => BackendResponse::Rooms(mode.source().rooms().await),
        BackendCommand::LoadMessages { room_id } => {
            let result = mode.source().history(&room_id).await;
            BackendResponse::Messages { room_id, result }
        }
        BackendCommand::LoadVehicles => {
            BackendResponse::Vehicles(match mode {
                ChatMode::Remote(client) => api::user::my_vehicles(client).await,
                ChatMode::Mock(_) => Ok(Vec::new()),
            })
        }
        BackendCommand::SaveVehicle { vehicle_id, form } => {
            BackendResponse::VehicleSaved(match mode {
                ChatMode::Remote(client) => match vehicle_id {
                    Some(id) => api::user::update_vehicle(client, id, &form).await,
                    None => api::user::create_vehicle(client, &form).await,
                },
                ChatMode::Mock(_) => Err(offline("오프라인 모드에서는 차량을 저장할 수 없습니다.")),
            })
        }
        BackendCommand::LoadCenters { filters } => {
            BackendResponse::Centers(match mode {
                ChatMode::Remote(client) => api::car_center::search(client, &filters).await,
                ChatMode::Mock(_) => Ok(Vec::new()),
            })
        }
        BackendCommand::OpenRoom { .. }
        | BackendCommand::CloseRoom
        | BackendCommand::SendMessage { .. } => return None,
    };
    Some(resp)
}

fn offline(message: &str) -> ApiError {
    ApiError::RequestFailed {
        status: StatusCode::SERVICE_UNAVAILABLE,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::REPLY_DELAY;
    use crate::models::SenderType;

    fn draft(content: &str) -> MessageDraft {
        MessageDraft {
            sender_id: "user1".to_string(),
            sender_name: "나".to_string(),
            sender_type: SenderType::User,
            content: content.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_send_then_reply() {
        let mut backend = Backend::start(ChatMode::Mock(MockChatStore::new()));
        backend.send(BackendCommand::OpenRoom {
            room_id: "1".to_string(),
        });
        backend.send(BackendCommand::SendMessage {
            room_id: "1".to_string(),
            temp_id: "temp-1".to_string(),
            draft: draft("예약할게요"),
        });

        match backend.recv().await {
            Some(BackendResponse::MessageSent {
                temp_id,
                result: Ok(Some(sent)),
                ..
            }) => {
                assert_eq!(temp_id, "temp-1");
                assert_eq!(sent.content, "예약할게요");
            }
            _ => panic!("expected MessageSent"),
        }

        match backend.recv().await {
            Some(BackendResponse::Incoming(reply)) => {
                assert_eq!(reply.room_id, "1");
                assert_eq!(reply.sender_name, "상대방");
            }
            _ => panic!("expected the canned reply"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_switching_rooms_cancels_pending_reply() {
        let store = MockChatStore::new();
        let mut backend = Backend::start(ChatMode::Mock(store.clone()));
        backend.send(BackendCommand::OpenRoom {
            room_id: "1".to_string(),
        });
        backend.send(BackendCommand::SendMessage {
            room_id: "1".to_string(),
            temp_id: "temp-1".to_string(),
            draft: draft("취소될 메시지"),
        });
        assert!(matches!(
            backend.recv().await,
            Some(BackendResponse::MessageSent { .. })
        ));

        backend.send(BackendCommand::OpenRoom {
            room_id: "2".to_string(),
        });
        tokio::time::sleep(REPLY_DELAY * 2).await;

        // Room 1 has the seed messages plus the sent one, and no reply.
        assert_eq!(store.fetch_messages("1").await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_outside_open_room_fails() {
        let mut backend = Backend::start(ChatMode::Mock(MockChatStore::new()));
        backend.send(BackendCommand::SendMessage {
            room_id: "1".to_string(),
            temp_id: "temp-1".to_string(),
            draft: draft("hi"),
        });
        assert!(matches!(
            backend.recv().await,
            Some(BackendResponse::MessageSent { result: Err(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_vehicle_save_is_refused() {
        let mut backend = Backend::start(ChatMode::Mock(MockChatStore::new()));
        backend.send(BackendCommand::SaveVehicle {
            vehicle_id: None,
            form: UserCarForm {
                car_model: "K5".to_string(),
                car_number: "12가 3456".to_string(),
                model_year: 2021,
            },
        });
        match backend.recv().await {
            Some(BackendResponse::VehicleSaved(Err(e))) => {
                assert_eq!(e.status(), Some(StatusCode::SERVICE_UNAVAILABLE))
            }
            _ => panic!("expected a refused save"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_rooms_through_backend() {
        let mut backend = Backend::start(ChatMode::Mock(MockChatStore::new()));
        backend.send(BackendCommand::LoadRooms);
        match backend.recv().await {
            Some(BackendResponse::Rooms(Ok(rooms))) => assert_eq!(rooms.len(), 2),
            _ => panic!("expected rooms"),
        }
    }
}
