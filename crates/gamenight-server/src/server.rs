//! WebSocket server and connection handling.

use crate::host::{HostError, SessionHost};
use crate::protocol::{ClientMessage, ServerMessage};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use gamenight_core::{EngineConfig, GameEvent, Outcome};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// How often the clock loop lets time pass for every session
pub const CLOCK_INTERVAL: Duration = Duration::from_millis(250);

/// Server state shared across all connections.
pub struct ServerState {
    /// Sessions and the points ledger
    host: Mutex<SessionHost>,
    /// Mapping from client ID to their message sender
    pub client_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            host: Mutex::new(SessionHost::new(config)),
            client_senders: DashMap::new(),
        }
    }

    pub fn host(&self) -> MutexGuard<'_, SessionHost> {
        self.host.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send a message to a specific client.
    pub fn send_to_client(&self, client_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.client_senders.get(&client_id) {
            let _ = sender.send(msg);
        }
    }

    fn send_error(&self, client_id: Uuid, err: HostError) {
        self.send_to_client(
            client_id,
            ServerMessage::Error {
                message: err.to_string(),
            },
        );
    }

    fn send_game_over(&self, client_id: Uuid, finished: Option<(Outcome, u32)>) {
        if let Some((outcome, reward)) = finished {
            self.send_to_client(client_id, ServerMessage::GameOver { outcome, reward });
        }
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Game night server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Drive session clocks and bot turns from wall time.
pub async fn run_clock(state: Arc<ServerState>) {
    let mut ticker = interval(CLOCK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();

    loop {
        ticker.tick().await;
        let now = Instant::now();
        let elapsed = now - last;
        last = now;
        advance(&state, elapsed);
    }
}

/// Let `elapsed` pass and forward what happened to each client.
fn advance(state: &ServerState, elapsed: Duration) {
    let updates = state.host().advance(elapsed);
    for update in updates {
        state.send_to_client(
            update.client,
            ServerMessage::Events {
                events: update.events,
            },
        );
        state.send_game_over(update.client, update.finished);
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a client ID
    let client_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.client_senders.insert(client_id, tx);

    let welcome = ServerMessage::Welcome { client_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(client_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", client_id, e);
                    state.send_to_client(
                        client_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {e}"),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", client_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_client(client_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", client_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(client_id, &state);
    state.client_senders.remove(&client_id);
    send_task.abort();

    info!("Connection closed for {}", client_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(client_id: Uuid, msg: ClientMessage, state: &ServerState) {
    match msg {
        ClientMessage::StartSession {
            game,
            player_name,
            bot,
        } => {
            let started = state.host().start(client_id, game, player_name, bot);
            match started {
                Ok(snapshot) => state.send_to_client(
                    client_id,
                    ServerMessage::SessionStarted {
                        session_id: snapshot.id,
                        state: snapshot,
                    },
                ),
                Err(e) => state.send_error(client_id, e),
            }
        }

        ClientMessage::GameAction { seat, action } => {
            let result = state.host().act(client_id, seat, action);
            match result {
                Ok((events, finished)) => {
                    state.send_to_client(
                        client_id,
                        ServerMessage::ActionResult {
                            success: true,
                            events,
                            error: None,
                        },
                    );
                    state.send_game_over(client_id, finished);
                }
                Err(e) => state.send_to_client(
                    client_id,
                    ServerMessage::ActionResult {
                        success: false,
                        events: Vec::<GameEvent>::new(),
                        error: Some(e.to_string()),
                    },
                ),
            }
        }

        ClientMessage::GetState => {
            let snapshot = state.host().snapshot(client_id);
            match snapshot {
                Ok(snapshot) => {
                    state.send_to_client(client_id, ServerMessage::State { state: snapshot })
                }
                Err(e) => state.send_error(client_id, e),
            }
        }

        ClientMessage::GetValidActions { seat } => {
            let actions = state.host().valid_actions(client_id, seat);
            match actions {
                Ok(actions) => {
                    state.send_to_client(client_id, ServerMessage::ValidActions { seat, actions })
                }
                Err(e) => state.send_error(client_id, e),
            }
        }

        ClientMessage::CloseSession => {
            let closed = state.host().close(client_id);
            match closed {
                Ok(()) => state.send_to_client(client_id, ServerMessage::SessionClosed),
                Err(e) => state.send_error(client_id, e),
            }
        }

        ClientMessage::GetLedger => {
            let ledger = state.host().ledger().to_info();
            state.send_to_client(client_id, ServerMessage::Ledger { ledger });
        }

        ClientMessage::Ping => {
            state.send_to_client(client_id, ServerMessage::Pong);
        }
    }
}

/// Handle client disconnect.
fn handle_disconnect(client_id: Uuid, state: &ServerState) {
    // An abandoned session is closed; its bot turns are cancelled
    if state.host().close(client_id).is_ok() {
        info!("Closed session of disconnected client {}", client_id);
    }
}
