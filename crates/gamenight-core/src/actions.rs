//! Commands players can issue and the events they produce.
//!
//! Commands are grouped per game; the session controller routes each group to
//! the engine it hosts. Events are appended to the session log in order and
//! are the narration/audit trail for the host.

use crate::backgammon::{Destination, Origin};
use crate::board::Coord;
use crate::cards::Rank;
use crate::chess::{Color, Piece, Square};
use crate::naval::AttackResult;
use crate::player::{Outcome, Seat};
use serde::{Deserialize, Serialize};

/// All commands a seat can issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    Chess(ChessAction),
    Naval(NavalAction),
    Backgammon(BackgammonAction),
    GoFish(GoFishAction),
    Speed(SpeedAction),
    /// Concede the game to the other seat
    Resign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChessAction {
    Move { from: Square, to: Square },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavalAction {
    /// Place ship `ship` (index into the configured fleet) during setup
    PlaceShip {
        ship: usize,
        origin: Coord,
        horizontal: bool,
    },
    /// Randomly place every ship not yet placed
    RandomizeFleet,
    /// Fire at a cell of the opposing board
    Attack { target: Coord },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgammonAction {
    Roll,
    Move { from: Origin, distance: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoFishAction {
    Ask { rank: Rank },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedAction {
    /// Play the card at `hand_index` onto center pile `pile` (0 or 1)
    Play { hand_index: usize, pile: usize },
    /// Turn fresh center cards when nobody can play
    Flip,
}

/// Events that occur as a result of commands and clock ticks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    // ==================== Chess ====================
    PieceMoved {
        from: Square,
        to: Square,
        piece: Piece,
        captured: Option<Piece>,
    },
    ClockExpired { color: Color },

    // ==================== Naval battle ====================
    ShipPlaced {
        seat: Seat,
        ship: String,
        cells: Vec<Coord>,
    },
    FleetReady { seat: Seat },
    BattleStarted,
    Attacked {
        attacker: Seat,
        target: Coord,
        result: AttackResult,
    },
    ShipSunk {
        owner: Seat,
        ship: String,
        length: u8,
    },

    // ==================== Backgammon ====================
    DiceRolled {
        seat: Seat,
        roll: (u8, u8),
        moves: Vec<u8>,
    },
    CheckerMoved {
        seat: Seat,
        from: Origin,
        to: Destination,
        distance: u8,
        hit: bool,
    },
    TurnForfeited { seat: Seat, unused: Vec<u8> },

    // ==================== Card games ====================
    CardsTransferred {
        from: Seat,
        to: Seat,
        rank: Rank,
        count: usize,
    },
    WentFishing { seat: Seat, drew: bool },
    BookCompleted { seat: Seat, rank: Rank },
    CardPlayed { seat: Seat, rank: Rank, pile: usize },
    CenterFlipped { top: [Rank; 2] },
    TimeBudgetExpired,

    // ==================== Session ====================
    TurnPassed { next: Seat },
    Resigned { seat: Seat },
    GameOver { outcome: Outcome },
}
