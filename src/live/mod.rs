//! Live chat over STOMP/WebSocket
//!
//! The backend exposes a SockJS endpoint at `/ws-chat`; its raw WebSocket
//! transport lives at `/ws-chat/websocket` and speaks plain STOMP frames.
//! Messages published to `/app/chat/send/{roomId}` are stored and broadcast
//! to `/topic/room/{roomId}`, including back to the sender.

pub mod stomp;

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::models::{ChatMessage, OutgoingChatMessage};
use stomp::{Command, Frame};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

const SUBSCRIPTION_ID: &str = "sub-0";

/// WebSocket URL of the chat endpoint for an HTTP base URL.
pub fn ws_url(base: &Url) -> Result<Url> {
    let mut url = base.clone();
    let scheme = match base.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => bail!("Unsupported scheme for live chat: {}", other),
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("Cannot use {} as a WebSocket URL", base))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Cannot use {} as a WebSocket URL", base))?
        .pop_if_empty()
        .extend(["ws-chat", "websocket"]);
    Ok(url)
}

pub fn room_topic(room_id: &str) -> String {
    format!("/topic/room/{}", room_id)
}

pub fn send_destination(room_id: &str) -> String {
    format!("/app/chat/send/{}", room_id)
}

/// One STOMP session subscribed to one room.
pub struct LiveChatSession {
    stream: WsStream,
    room_id: String,
}

impl LiveChatSession {
    /// Connect, authenticate and subscribe to the room's topic.
    pub async fn connect(base: &Url, token: Option<&str>, room_id: &str) -> Result<Self> {
        let url = ws_url(base)?;
        tracing::info!("Connecting live chat to {}", url);

        let (stream, response) = connect_async(url.as_str())
            .await
            .context("WebSocket connection failed")?;
        tracing::debug!("WebSocket connected (status={})", response.status());

        let mut session = Self {
            stream,
            room_id: room_id.to_string(),
        };

        let host = base.host_str().unwrap_or("localhost");
        session.send_frame(&Frame::connect(host, token)).await?;

        let connected = session
            .recv_frame()
            .await?
            .context("Connection closed before CONNECTED")?;
        match connected.command {
            Command::Connected => {
                tracing::info!(
                    "STOMP connected (version={})",
                    connected.get("version").unwrap_or("?")
                );
            }
            Command::Error => bail!(
                "Broker refused connection: {}",
                connected.get("message").unwrap_or(&connected.body)
            ),
            other => bail!("Expected CONNECTED, got {}", other),
        }

        session
            .send_frame(&Frame::subscribe(SUBSCRIPTION_ID, &room_topic(room_id)))
            .await?;
        Ok(session)
    }

    /// Publish a message to the room.
    pub async fn send(&mut self, content: &str) -> Result<()> {
        let body = serde_json::to_string(&OutgoingChatMessage { content })?;
        let frame = Frame::send_json(&send_destination(&self.room_id), body);
        self.send_frame(&frame).await
    }

    /// Next chat message broadcast to the room. `Ok(None)` when the server
    /// closed the connection.
    pub async fn recv(&mut self) -> Result<Option<ChatMessage>> {
        loop {
            let Some(frame) = self.recv_frame().await? else {
                return Ok(None);
            };
            match frame.command {
                Command::Message => match serde_json::from_str::<ChatMessage>(&frame.body) {
                    Ok(msg) => return Ok(Some(msg)),
                    Err(e) => tracing::warn!("Undecodable chat message: {} ({})", e, frame.body),
                },
                Command::Error => bail!(
                    "Broker error: {}",
                    frame.get("message").unwrap_or(&frame.body)
                ),
                other => tracing::debug!("STOMP frame (ignored): {}", other),
            }
        }
    }

    /// Send DISCONNECT and close the socket.
    pub async fn close(mut self) -> Result<()> {
        self.send_frame(&Frame::disconnect()).await?;
        self.stream
            .close(None)
            .await
            .context("Failed to close WebSocket")
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        tracing::debug!("STOMP send: {}", frame.command);
        self.stream
            .send(Message::Text(frame.encode()))
            .await
            .context("Failed to send WebSocket message")
    }

    /// Next STOMP frame, skipping heart-beats and answering pings.
    async fn recv_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => match Frame::decode(&text) {
                    Ok(Some(frame)) => return Ok(Some(frame)),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Bad STOMP frame: {}", e),
                },
                Some(Ok(Message::Ping(data))) => {
                    self.stream
                        .send(Message::Pong(data))
                        .await
                        .context("Failed to send pong")?;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("WebSocket closed: {:?}", frame);
                    return Ok(None);
                }
                Some(Ok(other)) => {
                    tracing::debug!("WS frame (ignored): {:?}", other);
                }
                Some(Err(e)) => {
                    return Err(e).context("WebSocket receive error");
                }
                None => return Ok(None),
            }
        }
    }
}

/// Events a room subscription reports to its owner.
#[derive(Debug)]
pub enum LiveEvent {
    Connected { room_id: String },
    Message(ChatMessage),
    Disconnected { room_id: String, reason: String },
}

/// A background live session for one room. Dropping it stops the task and
/// closes the socket.
pub struct RoomSubscription {
    outgoing: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl RoomSubscription {
    /// Queue a message for publishing. Messages typed while reconnecting are
    /// sent once the session is back.
    pub fn send(&self, content: String) -> bool {
        self.outgoing.send(content).is_ok()
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run a live session for `room_id` in the background, reconnecting with
/// exponential backoff (1s, 2s, 4s, ... capped at 64s). A session that stayed
/// up for a minute resets the backoff.
pub fn subscribe_room(
    base: Url,
    token: Option<String>,
    room_id: String,
    events: mpsc::UnboundedSender<LiveEvent>,
) -> RoomSubscription {
    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<String>();

    let task = tokio::spawn(async move {
        let mut backoff = 1u64;
        let stability_threshold = Duration::from_secs(60);

        loop {
            let reason = match LiveChatSession::connect(&base, token.as_deref(), &room_id).await {
                Ok(mut session) => {
                    let connected_at = Instant::now();
                    let connected = LiveEvent::Connected {
                        room_id: room_id.clone(),
                    };
                    if events.send(connected).is_err() {
                        return;
                    }

                    let reason = loop {
                        tokio::select! {
                            msg = session.recv() => match msg {
                                Ok(Some(msg)) => {
                                    if events.send(LiveEvent::Message(msg)).is_err() {
                                        let _ = session.close().await;
                                        return;
                                    }
                                }
                                Ok(None) => break "closed by server".to_string(),
                                Err(e) => break format!("{:#}", e),
                            },
                            content = outgoing_rx.recv() => match content {
                                Some(content) => {
                                    if let Err(e) = session.send(&content).await {
                                        break format!("{:#}", e);
                                    }
                                }
                                None => {
                                    let _ = session.close().await;
                                    return;
                                }
                            },
                        }
                    };

                    if connected_at.elapsed() >= stability_threshold {
                        backoff = 1;
                    }
                    reason
                }
                Err(e) => format!("{:#}", e),
            };

            tracing::warn!(
                "Live chat for room {} disconnected: {}. Reconnecting in {}s...",
                room_id,
                reason,
                backoff
            );
            let disconnected = LiveEvent::Disconnected {
                room_id: room_id.clone(),
                reason,
            };
            if events.send(disconnected).is_err() {
                return;
            }

            time::sleep(Duration::from_secs(backoff)).await;
            backoff = (backoff * 2).min(64);
        }
    });

    RoomSubscription { outgoing, task }
}
