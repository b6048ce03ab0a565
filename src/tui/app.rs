//! TUI application state and main event loop

use std::io::stdout;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use futures::{FutureExt, StreamExt};
use ratatui::DefaultTerminal;
use reqwest::StatusCode;

use super::backend::{Backend, BackendCommand, BackendResponse, ChatMode, CommandSender};
use super::compose::TextInput;
use super::log_pane::{LogPane, LogSink};
use super::map::{self, CenterMap};
use super::messages::{MessagesState, TEMP_PREFIX};
use super::sidebar::SidebarState;
use super::ui;
use super::vehicles::{self, FormOutcome, VehicleAction, VehicleForm};
use crate::api::ApiClient;
use crate::auth::TokenClaims;
use crate::config::Config;
use crate::live::LiveEvent;
use crate::mock::MockChatStore;
use crate::models::{CarCenter, CenterSearch, MessageDraft, SenderType, UserCar};

/// Redraw interval when nothing else happens (~30 fps)
const FRAME_DURATION_MS: u64 = 33;
/// Lines the log pane moves per PageUp/PageDown.
const LOG_PAGE: usize = 10;

/// Active pane in the chat view
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    #[default]
    Sidebar,
    Messages,
    Compose,
}

impl Pane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pane::Sidebar => "채팅방",
            Pane::Messages => "메시지",
            Pane::Compose => "입력",
        }
    }

    fn next(self) -> Self {
        match self {
            Pane::Sidebar => Pane::Messages,
            Pane::Messages => Pane::Compose,
            Pane::Compose => Pane::Sidebar,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Sidebar => Pane::Compose,
            Pane::Messages => Pane::Sidebar,
            Pane::Compose => Pane::Messages,
        }
    }
}

/// Top-level screen
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum View {
    #[default]
    Chat,
    Map,
}

/// Popup on top of the current view
pub enum Modal {
    Vehicles,
    VehicleForm {
        form: VehicleForm,
        error: Option<String>,
    },
}

/// Who is using the client.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub sender_type: SenderType,
}

impl Identity {
    /// The user the mock store's seed data was written for.
    pub fn mock() -> Self {
        Self {
            user_id: "user1".to_string(),
            name: "나".to_string(),
            sender_type: SenderType::User,
        }
    }

    pub fn from_claims(claims: Option<TokenClaims>) -> Self {
        let claims = claims.unwrap_or_default();
        let user_id = claims.user_id.clone().unwrap_or_default();
        let name = claims
            .username
            .clone()
            .unwrap_or_else(|| user_id.clone());
        let sender_type = if claims.is_car_center() {
            SenderType::CarCenter
        } else {
            SenderType::User
        };
        Self {
            user_id,
            name,
            sender_type,
        }
    }

    pub fn is_center(&self) -> bool {
        self.sender_type == SenderType::CarCenter
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_center() {
            "카센터"
        } else {
            "사용자"
        }
    }
}

/// Application state
pub struct App {
    pub should_exit: bool,
    pub identity: Identity,
    pub is_mock: bool,
    /// Live connection state of the open room (for display)
    pub is_online: bool,
    pub connection_state: String,
    pub view: View,
    pub active_pane: Pane,
    pub sidebar: SidebarState,
    pub messages: MessagesState,
    pub compose: TextInput,
    pub show_help: bool,
    pub log: LogPane,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    pub modal: Option<Modal>,
    pub vehicles: Vec<UserCar>,
    pub vehicles_loading: bool,
    pub vehicle_selected: usize,
    pub centers: Vec<CarCenter>,
    pub map: CenterMap,
    /// Index into the map's markers
    pub map_selected: Option<usize>,
    commands: CommandSender,
}

impl App {
    pub fn new(identity: Identity, is_mock: bool, commands: CommandSender, log_sink: LogSink) -> Self {
        let on_map_created = commands.clone();
        let map = CenterMap::new().on_create(move |viewport| {
            tracing::debug!(
                "Map created at {:?} (level {}), loading centers",
                viewport.center,
                viewport.level
            );
            on_map_created.send(BackendCommand::LoadCenters {
                filters: CenterSearch::default(),
            });
        });

        let connection_state = if is_mock { "모의 모드" } else { "대기" };
        Self {
            should_exit: false,
            sidebar: SidebarState::new(identity.is_center()),
            messages: MessagesState::new(&identity.user_id),
            identity,
            is_mock,
            is_online: is_mock,
            connection_state: connection_state.to_string(),
            view: View::default(),
            active_pane: Pane::default(),
            compose: TextInput::default(),
            show_help: false,
            log: LogPane::new(log_sink),
            status_message: None,
            status_is_error: false,
            modal: None,
            vehicles: Vec::new(),
            vehicles_loading: false,
            vehicle_selected: 0,
            centers: Vec::new(),
            map,
            map_selected: None,
            commands,
        }
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_is_error = false;
    }

    fn set_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!("{}", msg);
        self.status_message = Some(msg);
        self.status_is_error = true;
    }

    /// Name shown for the open room, if any.
    pub fn room_name(&self) -> Option<String> {
        let room_id = self.messages.room_id.as_deref()?;
        Some(
            self.sidebar
                .room(room_id)
                .map(|r| self.sidebar.counterpart(r).to_string())
                .unwrap_or_else(|| format!("채팅방 {}", room_id)),
        )
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_exit = true;
                return;
            }
            KeyCode::Char('l') if ctrl => {
                self.log.toggle();
                return;
            }
            KeyCode::PageUp if self.log.visible => {
                self.log.older(LOG_PAGE);
                return;
            }
            KeyCode::PageDown if self.log.visible => {
                self.log.newer(LOG_PAGE);
                return;
            }
            _ => {}
        }

        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }

        let typing = self.view == View::Chat && self.active_pane == Pane::Compose;
        match key.code {
            KeyCode::Char('r') if ctrl => {
                self.refresh();
                return;
            }
            KeyCode::F(1) => {
                self.view = View::Chat;
                return;
            }
            KeyCode::F(2) => {
                self.view = View::Map;
                return;
            }
            KeyCode::Char('q') if !typing => {
                self.should_exit = true;
                return;
            }
            KeyCode::Char('?') if !typing => {
                self.show_help = true;
                return;
            }
            KeyCode::Char('v') if !typing => {
                self.open_vehicles();
                return;
            }
            _ => {}
        }

        match self.view {
            View::Chat => self.handle_chat_key(key),
            View::Map => self.handle_map_key(key),
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => {
                self.active_pane = self.active_pane.next();
                return;
            }
            KeyCode::BackTab => {
                self.active_pane = self.active_pane.prev();
                return;
            }
            _ => {}
        }

        match self.active_pane {
            Pane::Sidebar => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.sidebar.move_up(),
                KeyCode::Down | KeyCode::Char('j') => self.sidebar.move_down(),
                KeyCode::Enter | KeyCode::Right => self.open_selected_room(),
                KeyCode::Esc => self.close_room(),
                _ => {}
            },
            Pane::Messages => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.messages.select_previous(),
                KeyCode::Down | KeyCode::Char('j') => self.messages.select_next(),
                KeyCode::Char('G') | KeyCode::End => self.messages.select_last(),
                KeyCode::Left | KeyCode::Esc => self.active_pane = Pane::Sidebar,
                _ => {}
            },
            Pane::Compose => self.handle_compose_key(key),
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Enter if alt => self.compose.insert_newline(),
            KeyCode::Enter => self.send_message(),
            KeyCode::Esc => self.active_pane = Pane::Sidebar,
            KeyCode::Char('u') if ctrl => self.compose.clear(),
            KeyCode::Char(c) if !ctrl => self.compose.insert_char(c),
            KeyCode::Backspace => self.compose.backspace(),
            KeyCode::Delete => self.compose.delete(),
            KeyCode::Left => self.compose.move_left(),
            KeyCode::Right => self.compose.move_right(),
            KeyCode::Home => self.compose.move_home(),
            KeyCode::End => self.compose.move_end(),
            _ => {}
        }
    }

    fn handle_map_key(&mut self, key: KeyEvent) {
        let count = map::markers(&self.centers).len();
        if count == 0 {
            return;
        }
        let current = self.map_selected.unwrap_or(0);
        match key.code {
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.map_selected = Some((current + count - 1) % count);
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                self.map_selected = Some((current + 1) % count);
            }
            KeyCode::Enter => {
                let mut hit = None;
                self.map
                    .activate(&self.centers, current, |c| hit = Some(c.center_id.clone()));
                if let Some(id) = hit {
                    self.select_center(&id);
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match (self.view, mouse.kind) {
            (View::Map, MouseEventKind::Down(MouseButton::Left)) if self.modal.is_none() => {
                let mut hit = None;
                self.map.click(&self.centers, mouse.column, mouse.row, |c| {
                    hit = Some(c.center_id.clone())
                });
                if let Some(id) = hit {
                    self.select_center(&id);
                }
            }
            (View::Chat, MouseEventKind::ScrollUp) => self.messages.select_previous(),
            (View::Chat, MouseEventKind::ScrollDown) => self.messages.select_next(),
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        match modal {
            Modal::Vehicles => {
                let action = vehicles::handle_key(key, &self.vehicles, &mut self.vehicle_selected);
                match action {
                    Some(VehicleAction::Close) => self.modal = None,
                    Some(VehicleAction::AddNew) => {
                        self.modal = Some(Modal::VehicleForm {
                            form: VehicleForm::new(),
                            error: None,
                        })
                    }
                    Some(VehicleAction::Edit(car)) => {
                        self.modal = Some(Modal::VehicleForm {
                            form: VehicleForm::edit(&car),
                            error: None,
                        })
                    }
                    None => {}
                }
            }
            Modal::VehicleForm { form, error } => match form.handle_key(key) {
                Some(FormOutcome::Cancel) => self.modal = Some(Modal::Vehicles),
                Some(FormOutcome::Invalid(msg)) => *error = Some(msg),
                Some(FormOutcome::Submit(body)) => {
                    *error = None;
                    self.commands.send(BackendCommand::SaveVehicle {
                        vehicle_id: form.vehicle_id,
                        form: body,
                    });
                }
                None => {}
            },
        }
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    pub fn refresh(&mut self) {
        match self.view {
            View::Chat => {
                self.commands.send(BackendCommand::LoadRooms);
                if let Some(room_id) = self.messages.room_id.clone() {
                    self.commands.send(BackendCommand::LoadMessages { room_id });
                }
            }
            View::Map => self.commands.send(BackendCommand::LoadCenters {
                filters: CenterSearch::default(),
            }),
        }
        self.set_status("새로고침 중...");
    }

    fn open_vehicles(&mut self) {
        self.modal = Some(Modal::Vehicles);
        self.vehicles_loading = true;
        self.vehicle_selected = 0;
        self.commands.send(BackendCommand::LoadVehicles);
    }

    fn open_selected_room(&mut self) {
        let Some(room) = self.sidebar.selected_room() else {
            return;
        };
        let room_id = room.room_id.clone();
        let header = self.sidebar.counterpart(room).to_string();
        self.active_pane = Pane::Compose;
        if self.messages.is_open(&room_id) {
            return;
        }

        tracing::info!("Opening chat room {}", room_id);
        self.messages.open(&room_id, header);
        if !self.is_mock {
            self.is_online = false;
            self.connection_state = "연결 중...".to_string();
        }
        self.commands.send(BackendCommand::OpenRoom {
            room_id: room_id.clone(),
        });
        self.commands.send(BackendCommand::LoadMessages { room_id });
    }

    /// Leave the open room. Its live session and pending replies go with it.
    fn close_room(&mut self) {
        let Some(room_id) = self.messages.room_id.take() else {
            return;
        };
        tracing::info!("Closing chat room {}", room_id);
        self.messages.close();
        self.commands.send(BackendCommand::CloseRoom);
        self.is_online = self.is_mock;
        self.connection_state = if self.is_mock { "모의 모드" } else { "대기" }.to_string();
    }

    fn send_message(&mut self) {
        let Some(room_id) = self.messages.room_id.clone() else {
            self.set_error("채팅방을 먼저 선택하세요.");
            return;
        };
        let Some(content) = self.compose.take() else {
            return;
        };

        let draft = MessageDraft {
            sender_id: self.identity.user_id.clone(),
            sender_name: self.identity.name.clone(),
            sender_type: self.identity.sender_type,
            content,
        };
        let temp_id = format!("{}{}", TEMP_PREFIX, uuid::Uuid::new_v4());
        self.messages.add_optimistic(&room_id, &temp_id, &draft);
        if let Some(shown) = self.messages.messages.last() {
            self.sidebar
                .set_last_message(&room_id, &shown.content, &shown.created_at);
        }
        self.commands.send(BackendCommand::SendMessage {
            room_id,
            temp_id,
            draft,
        });
    }

    fn select_center(&mut self, center_id: &str) {
        let marks = map::markers(&self.centers);
        let Some(idx) = marks.iter().position(|m| m.center.center_id == center_id) else {
            return;
        };
        let center = marks[idx].center;
        let status = format!(
            "{} | {} | {}",
            center.center_name, center.address, center.phone_number
        );
        self.map_selected = Some(idx);
        self.set_status(status);
    }

    // -----------------------------------------------------------------------
    // Backend responses
    // -----------------------------------------------------------------------

    pub fn handle_response(&mut self, resp: BackendResponse) {
        match resp {
            BackendResponse::Rooms(Ok(rooms)) => {
                tracing::debug!("Loaded {} chat rooms", rooms.len());
                self.sidebar.update_rooms(rooms);
                if self.status_message.as_deref() == Some("새로고침 중...") {
                    self.status_message = None;
                }
            }
            BackendResponse::Rooms(Err(e)) => {
                self.sidebar.loading = false;
                if e.status() == Some(StatusCode::UNAUTHORIZED) {
                    self.set_error("로그인이 필요합니다: carparter login --token <jwt>");
                } else {
                    self.set_error(e.to_string());
                }
            }
            BackendResponse::Messages { room_id, result } => match result {
                Ok(history) => {
                    self.messages.set_history(&room_id, history);
                }
                Err(e) => {
                    if self.messages.is_open(&room_id) {
                        self.messages.loading = false;
                        self.set_error(e.to_string());
                    }
                }
            },
            BackendResponse::MessageSent {
                room_id,
                temp_id,
                result,
            } => match result {
                Ok(Some(stored)) => {
                    if self.messages.is_open(&room_id) {
                        self.messages.confirm(&temp_id, stored);
                    }
                }
                Ok(None) => {}
                Err(msg) => {
                    self.messages.discard(&temp_id);
                    self.set_error(msg);
                }
            },
            BackendResponse::Incoming(msg) => {
                self.sidebar
                    .set_last_message(&msg.room_id, &msg.content, &msg.created_at);
                self.messages.receive(msg);
            }
            BackendResponse::LiveStatus(event) => self.handle_live(event),
            BackendResponse::Vehicles(result) => {
                self.vehicles_loading = false;
                match result {
                    Ok(list) => {
                        self.vehicle_selected = self.vehicle_selected.min(list.len().saturating_sub(1));
                        self.vehicles = list;
                    }
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            BackendResponse::VehicleSaved(Ok(())) => {
                self.set_status("차량 정보가 저장되었습니다.");
                if matches!(self.modal, Some(Modal::VehicleForm { .. })) {
                    self.open_vehicles();
                }
            }
            BackendResponse::VehicleSaved(Err(e)) => match self.modal {
                Some(Modal::VehicleForm { ref mut error, .. }) => *error = Some(e.to_string()),
                _ => self.set_error(e.to_string()),
            },
            BackendResponse::Centers(Ok(centers)) => {
                let placed = map::markers(&centers).len();
                tracing::info!("Loaded {} car centers ({} on the map)", centers.len(), placed);
                self.map_selected = (placed > 0).then_some(0);
                self.centers = centers;
                self.set_status(format!("카센터 {}곳을 불러왔습니다.", placed));
            }
            BackendResponse::Centers(Err(e)) => self.set_error(e.to_string()),
        }
    }

    fn handle_live(&mut self, event: LiveEvent) {
        match event {
            LiveEvent::Connected { room_id } if self.messages.is_open(&room_id) => {
                self.is_online = true;
                self.connection_state = "실시간 연결됨".to_string();
            }
            LiveEvent::Disconnected { room_id, reason } if self.messages.is_open(&room_id) => {
                self.is_online = false;
                self.connection_state = format!("재연결 중 ({})", reason);
            }
            LiveEvent::Message(msg) => self.handle_response(BackendResponse::Incoming(msg)),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Options for `carparter tui`
pub struct TuiOptions {
    /// Use the in-memory chat store instead of the backend.
    pub mock: bool,
    pub base_url: Option<String>,
    /// Where tracing output goes while the TUI owns the terminal.
    pub log_sink: LogSink,
}

/// Run the TUI with panic-safe terminal restore
pub async fn run(opts: TuiOptions) -> Result<()> {
    let (mode, identity) = if opts.mock {
        (ChatMode::Mock(MockChatStore::new()), Identity::mock())
    } else {
        let mut config = Config::load()?;
        if let Some(url) = opts.base_url {
            config.api_base_url = Some(url);
        }
        let client = ApiClient::from_config(&config).context("Invalid API configuration")?;
        if client.token().is_none() {
            tracing::warn!("No token stored; run `carparter login --token <jwt>` first");
        }
        (
            ChatMode::Remote(Arc::new(client)),
            Identity::from_claims(config.claims()),
        )
    };
    tracing::info!(
        "Starting TUI as {} ({}){}",
        identity.name,
        identity.role_label(),
        if mode.is_mock() { " [mock]" } else { "" }
    );

    let backend = Backend::start(mode.clone());
    let app = App::new(identity, mode.is_mock(), backend.sender(), opts.log_sink);

    let mut terminal = ratatui::init();
    if let Err(e) = crossterm::execute!(stdout(), EnableMouseCapture) {
        tracing::warn!("Mouse capture unavailable: {}", e);
    }

    let result = AssertUnwindSafe(run_app(&mut terminal, app, backend))
        .catch_unwind()
        .await;

    let _ = crossterm::execute!(stdout(), DisableMouseCapture);
    ratatui::restore();

    match result {
        Ok(r) => r,
        Err(e) => std::panic::resume_unwind(e),
    }
}

async fn run_app(terminal: &mut DefaultTerminal, mut app: App, mut backend: Backend) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(FRAME_DURATION_MS));

    backend.send(BackendCommand::LoadRooms);

    while !app.should_exit {
        app.log.poll();
        terminal.draw(|frame| ui::render(frame, &mut app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => app.handle_event(event),
                Some(Err(e)) => return Err(e).context("Terminal event error"),
                None => break,
            },
            resp = backend.recv() => match resp {
                Some(resp) => app.handle_response(resp),
                None => anyhow::bail!("Backend stopped unexpectedly"),
            },
            _ = tick.tick() => {}
        }
    }

    tracing::info!("Leaving TUI");
    Ok(())
}
