//! Errors shared by every engine and the session layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when applying commands
///
/// Rule violations (`IllegalMove`, `NotYourTurn`, `Overlap`, `OutOfBounds`,
/// `InvalidPhase`) are rejections: the engine state is unchanged when one is
/// returned. `InternalInvariantViolation` means an engine bug and must be
/// surfaced, never swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Position ({row}, {col}) is off the board")]
    OutOfBounds { row: i32, col: i32 },

    #[error("Placement overlaps another ship")]
    Overlap,

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Session already has an outcome")]
    AlreadyResolved,

    #[error("Could not place {ship} after {attempts} attempts")]
    PlacementFailed { ship: String, attempts: u32 },

    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("Command not accepted in the current phase")]
    InvalidPhase,

    #[error("Command addressed to a different game")]
    WrongGame,

    #[error("Unknown session")]
    UnknownSession,
}

impl GameError {
    pub(crate) fn illegal(reason: impl Into<String>) -> Self {
        GameError::IllegalMove(reason.into())
    }

    /// Whether this error is an expected rejection rather than an engine fault
    pub fn is_rejection(&self) -> bool {
        !matches!(self, GameError::InternalInvariantViolation(_))
    }
}
