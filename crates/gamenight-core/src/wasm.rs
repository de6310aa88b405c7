//! WebAssembly bindings for the game night engines.
//!
//! This module exposes a session registry to JavaScript through wasm-bindgen.
//! Commands and state cross the boundary as JSON.

use wasm_bindgen::prelude::*;

use crate::actions::GameAction;
use crate::bot::BotDifficulty;
use crate::config::EngineConfig;
use crate::player::{Participant, Seat};
use crate::session::{GameType, RecordedRewards, SessionId, SessionRegistry};
use std::time::Duration;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

fn parse_seat(seat: u8) -> Result<Seat, JsValue> {
    match seat {
        1 => Ok(Seat::One),
        2 => Ok(Seat::Two),
        _ => Err(JsValue::from_str("Seat must be 1 or 2")),
    }
}

fn parse_game_type(name: &str) -> Result<GameType, JsValue> {
    match name {
        "Chess" => Ok(GameType::Chess),
        "NavalBattle" | "Battleship" => Ok(GameType::NavalBattle),
        "Backgammon" => Ok(GameType::Backgammon),
        "GoFish" => Ok(GameType::GoFish),
        "Speed" => Ok(GameType::Speed),
        other => Err(JsValue::from_str(&format!("Unknown game: {other}"))),
    }
}

fn parse_id(id: &str) -> Result<SessionId, JsValue> {
    id.parse().map_err(|e| js_error("Invalid session id", e))
}

/// WASM-exposed registry wrapper
#[wasm_bindgen]
pub struct WasmGameNight {
    registry: SessionRegistry<RecordedRewards>,
}

#[wasm_bindgen]
impl WasmGameNight {
    /// Create a registry from a (possibly empty) JSON config
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmGameNight, JsValue> {
        let config = if config_json.trim().is_empty() {
            EngineConfig::default()
        } else {
            EngineConfig::from_json(config_json).map_err(|e| js_error("Invalid config", e))?
        };
        Ok(WasmGameNight {
            registry: SessionRegistry::new(config, RecordedRewards::default()),
        })
    }

    /// Start a session against a bot; returns the session id
    /// difficulty: "Easy", "Medium", or "Hard"
    #[wasm_bindgen(js_name = startAgainstBot)]
    pub fn start_against_bot(
        &mut self,
        game: &str,
        player_name: &str,
        difficulty: &str,
    ) -> Result<String, JsValue> {
        let diff = match difficulty {
            "Easy" => BotDifficulty::Easy,
            "Hard" => BotDifficulty::Hard,
            _ => BotDifficulty::Medium,
        };
        let id = self.registry.start_session(
            parse_game_type(game)?,
            Participant::human(player_name),
            Participant::bot("Bot", diff),
        );
        Ok(id.to_string())
    }

    /// Start a session from two JSON participants
    #[wasm_bindgen(js_name = startSession)]
    pub fn start_session(
        &mut self,
        game: &str,
        player1_json: &str,
        player2_json: &str,
    ) -> Result<String, JsValue> {
        let player1: Participant =
            serde_json::from_str(player1_json).map_err(|e| js_error("Invalid player 1", e))?;
        let player2: Participant =
            serde_json::from_str(player2_json).map_err(|e| js_error("Invalid player 2", e))?;
        let id = self
            .registry
            .start_session(parse_game_type(game)?, player1, player2);
        Ok(id.to_string())
    }

    #[wasm_bindgen(js_name = closeSession)]
    pub fn close_session(&mut self, id: &str) -> Result<(), JsValue> {
        self.registry
            .close_session(parse_id(id)?)
            .map_err(|e| js_error("Close failed", e))
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, id: &str, seat: u8, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| js_error("Invalid action JSON", e))?;
        let events = self
            .registry
            .apply(parse_id(id)?, parse_seat(seat)?, action)
            .map_err(|e| js_error("Action failed", e))?;
        Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Let `millis` pass; returns the produced events as JSON
    #[wasm_bindgen(js_name = advanceTime)]
    pub fn advance_time(&mut self, millis: u32) -> String {
        let events = self
            .registry
            .advance_time(Duration::from_millis(u64::from(millis)));
        serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
    }

    /// Get a session snapshot as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self, id: &str) -> Result<String, JsValue> {
        let session = self
            .registry
            .session(parse_id(id)?)
            .ok_or_else(|| JsValue::from_str("Unknown session"))?;
        Ok(serde_json::to_string(&session.snapshot()).unwrap_or_else(|_| "{}".to_string()))
    }

    /// Get valid actions for a seat as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self, id: &str, seat: u8) -> Result<String, JsValue> {
        let session = self
            .registry
            .session(parse_id(id)?)
            .ok_or_else(|| JsValue::from_str("Unknown session"))?;
        let actions = session.valid_actions(parse_seat(seat)?);
        Ok(serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Drain the rewards paid since the last call, as `[[game, points], ...]`
    #[wasm_bindgen(js_name = takeRewards)]
    pub fn take_rewards(&mut self) -> String {
        let payouts = std::mem::take(&mut self.registry.sink_mut().payouts);
        serde_json::to_string(&payouts).unwrap_or_else(|_| "[]".to_string())
    }
}
