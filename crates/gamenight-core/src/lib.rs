//! Game night - two-player game engines for a household rewards app
//!
//! This crate provides the rules engines behind the app's bonus games:
//! - Chess with king capture as the only terminal condition
//! - Naval battle on two hidden grids
//! - Backgammon with hitting, the bar and bearing off
//! - Go Fish and Speed on a shared card model
//!
//! # Architecture
//!
//! Every engine is a plain state machine: commands validate fully before
//! mutating and return the events they produced. A [`GameSession`] hosts one
//! engine, enforces turn ownership and pays its reward once through the
//! host's [`RewardSink`]. The [`SessionRegistry`] owns all sessions and turns
//! elapsed time into clock ticks and scheduled bot turns.
//!
//! The crate can be compiled to:
//! - Native Rust for a server-side host
//! - WebAssembly (feature `wasm`) for an in-browser host
//!
//! # Modules
//!
//! - [`board`]: Rectangular grid and naval cell model
//! - [`chess`], [`naval`], [`backgammon`], [`go_fish`], [`speed`]: Engines
//! - [`session`]: Sessions, rewards and the registry
//! - [`bot`]: Simulated opponents
//! - [`rng`]: Injectable random source

pub mod actions;
pub mod backgammon;
pub mod board;
pub mod bot;
pub mod cards;
pub mod chess;
pub mod config;
pub mod error;
pub mod go_fish;
pub mod naval;
pub mod player;
pub mod rng;
pub mod session;
pub mod speed;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{
    BackgammonAction, ChessAction, GameAction, GameEvent, GoFishAction, NavalAction, SpeedAction,
};
pub use backgammon::{Backgammon, Destination, Origin};
pub use board::{create_board, Board, Cell, CellStatus, Coord, Grid};
pub use bot::{Bot, BotDifficulty};
pub use cards::{Card, Rank, Suit};
pub use chess::{ChessGame, Color, Piece, PieceKind, Square};
pub use config::{ConfigError, EngineConfig};
pub use error::GameError;
pub use go_fish::GoFish;
pub use naval::{AttackResult, Fleet, NavalBattle, NavalPhase, ShipSpec};
pub use player::{EndReason, GameResult, Outcome, Participant, Seat};
pub use rng::{RandomSource, ScriptedRandom, SeededRandom};
pub use session::{
    Engine, GameSession, GameType, RecordedRewards, RewardSink, SessionId, SessionRegistry,
    SessionSnapshot,
};
pub use speed::Speed;
