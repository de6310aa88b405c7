//! Engine configuration: board sizes, fleets, clocks, delays and reward
//! magnitudes.
//!
//! Every field has a default, so a host can supply a partial JSON document and
//! only override what it cares about.

use crate::naval::ShipSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for all engines
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chess: ChessConfig,
    pub naval: NavalConfig,
    pub backgammon: BackgammonConfig,
    pub go_fish: GoFishConfig,
    pub speed: SpeedConfig,
    /// Reward when a non-chess game ends by resignation
    pub resign_reward: u32,
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.naval.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessConfig {
    /// Seconds on each color's clock at the start
    pub clock_seconds: u32,
    /// Reward when a king is captured
    pub capture_win: u32,
    /// Reward when a clock runs out
    pub timeout_win: u32,
    pub resign_win: u32,
    /// Delay before a bot replies
    pub bot_delay_ms: u64,
}

impl Default for ChessConfig {
    fn default() -> Self {
        Self {
            clock_seconds: 600,
            capture_win: 20,
            timeout_win: 5,
            resign_win: 5,
            bot_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavalConfig {
    pub rows: usize,
    pub cols: usize,
    pub fleet: Vec<ShipSpec>,
    /// Random placement attempts per ship before giving up
    pub placement_attempts: u32,
    pub opponent_delay_ms: u64,
    /// Reward per hit landed by seat one
    pub hit: u32,
    /// Reward per length unit of each ship seat one sinks
    pub sunk_per_length: u32,
    pub victory: u32,
    pub defeat: u32,
}

impl NavalConfig {
    /// The grid must be non-empty and the fleet must hold at least one ship,
    /// each of which fits on the grid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::Invalid("naval grid has no cells".into()));
        }
        if self.fleet.is_empty() {
            return Err(ConfigError::Invalid("naval fleet is empty".into()));
        }
        let longest = self.rows.max(self.cols);
        for ship in &self.fleet {
            if ship.length == 0 || ship.length as usize > longest {
                return Err(ConfigError::Invalid(format!(
                    "{} has length {} on a {}x{} grid",
                    ship.name, ship.length, self.rows, self.cols
                )));
            }
        }
        Ok(())
    }
}

impl Default for NavalConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            fleet: ShipSpec::standard_fleet(),
            placement_attempts: 200,
            opponent_delay_ms: 1000,
            hit: 1,
            sunk_per_length: 2,
            victory: 25,
            defeat: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgammonConfig {
    pub win: u32,
    /// Applied when the loser has borne off nothing
    pub gammon_multiplier: u32,
    pub bot_delay_ms: u64,
}

impl Default for BackgammonConfig {
    fn default() -> Self {
        Self {
            win: 20,
            gammon_multiplier: 2,
            bot_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoFishConfig {
    pub hand_size: usize,
    /// Combined book count that ends the game
    pub books_to_finish: usize,
    pub opponent_delay_ms: u64,
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Default for GoFishConfig {
    fn default() -> Self {
        Self {
            hand_size: 7,
            books_to_finish: 6,
            opponent_delay_ms: 1500,
            win: 15,
            draw: 10,
            loss: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    pub time_budget_seconds: u32,
    /// Cards dealt to each player (hand plus private pile)
    pub pile_size: usize,
    pub hand_size: usize,
    /// How often a bot seat tries to play a card
    pub bot_interval_ms: u64,
    pub win: u32,
    pub timeout: u32,
    pub loss: u32,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            time_budget_seconds: 60,
            pile_size: 20,
            hand_size: 5,
            bot_interval_ms: 2000,
            win: 30,
            timeout: 10,
            loss: 5,
        }
    }
}
