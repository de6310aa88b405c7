//! WebSocket protocol messages for the game night host.

use gamenight_core::{
    BotDifficulty, GameAction, GameEvent, GameType, Outcome, Seat, SessionId, SessionSnapshot,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Start a session. With no bot the client plays both seats.
    StartSession {
        game: GameType,
        player_name: String,
        bot: Option<BotDifficulty>,
    },

    /// Submit a game action; `seat` defaults to seat one
    GameAction {
        seat: Option<Seat>,
        action: GameAction,
    },

    /// Request the full session state
    GetState,

    /// Request the valid actions for a seat
    GetValidActions { seat: Seat },

    /// Abandon the current session
    CloseSession,

    /// Request the household points balance
    GetLedger,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned client ID
    Welcome { client_id: Uuid },

    /// Session started
    SessionStarted { session_id: SessionId, state: SessionSnapshot },

    /// Result of the client's own action
    ActionResult {
        success: bool,
        events: Vec<GameEvent>,
        error: Option<String>,
    },

    /// Events produced by clocks or the bot seat
    Events { events: Vec<GameEvent> },

    /// Full session state
    State { state: SessionSnapshot },

    /// Valid actions for a seat
    ValidActions { seat: Seat, actions: Vec<GameAction> },

    /// Session ended with the reward credited to the ledger
    GameOver { outcome: Outcome, reward: u32 },

    /// Session closed on request
    SessionClosed,

    /// Household points balance
    Ledger { ledger: LedgerInfo },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Points balance for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub total: u64,
    pub by_game: Vec<(GameType, u64)>,
    pub games_completed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let json = r#"{ "type": "StartSession", "payload": { "game": "GoFish", "player_name": "Ana", "bot": "Hard" } }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::StartSession {
                game: GameType::GoFish,
                bot: Some(BotDifficulty::Hard),
                ..
            }
        ));

        let ping: ClientMessage = serde_json::from_str(r#"{ "type": "Ping" }"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));
    }

    #[test]
    fn test_action_message_carries_typed_action() {
        let json = r#"{ "type": "GameAction", "payload": { "seat": null, "action": { "Speed": "Flip" } } }"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        let ClientMessage::GameAction { seat, action } = msg else {
            panic!("expected a game action");
        };
        assert_eq!(seat, None);
        assert_eq!(
            action,
            GameAction::Speed(gamenight_core::SpeedAction::Flip)
        );
    }
}
