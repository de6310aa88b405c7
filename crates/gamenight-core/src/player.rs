//! Seats, participants and game outcomes.

use crate::bot::BotDifficulty;
use serde::{Deserialize, Serialize};

/// One of the two positions at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seat {
    One,
    Two,
}

impl Seat {
    pub const BOTH: [Seat; 2] = [Seat::One, Seat::Two];

    pub fn other(self) -> Seat {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }

    /// 0 for seat one, 1 for seat two
    pub fn index(self) -> usize {
        match self {
            Seat::One => 0,
            Seat::Two => 1,
        }
    }

    /// The outcome in which this seat wins
    pub fn win(self) -> Outcome {
        match self {
            Seat::One => Outcome::Player1Win,
            Seat::Two => Outcome::Player2Win,
        }
    }
}

/// Who sits in a seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Participant {
    Human { name: String },
    Bot { name: String, difficulty: BotDifficulty },
}

impl Participant {
    pub fn human(name: impl Into<String>) -> Self {
        Participant::Human { name: name.into() }
    }

    pub fn bot(name: impl Into<String>, difficulty: BotDifficulty) -> Self {
        Participant::Bot {
            name: name.into(),
            difficulty,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Participant::Human { name } | Participant::Bot { name, .. } => name,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Participant::Bot { .. })
    }
}

/// Terminal outcome of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Player1Win,
    Player2Win,
    Draw,
    /// A clock or time budget ran out; `winner` is `None` when the
    /// remaining material was level
    Timeout { winner: Option<Seat> },
}

impl Outcome {
    pub fn winner(&self) -> Option<Seat> {
        match self {
            Outcome::Player1Win => Some(Seat::One),
            Outcome::Player2Win => Some(Seat::Two),
            Outcome::Draw => None,
            Outcome::Timeout { winner } => *winner,
        }
    }
}

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    KingCaptured,
    ClockExpired,
    FleetSunk,
    /// All fifteen pieces borne off; `gammon` when the loser bore off none
    BorneOff { gammon: bool },
    BooksComplete,
    DeckExhausted,
    CardsOut,
    TimeBudgetExpired,
    Resignation,
}

/// Engine-level terminal result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub outcome: Outcome,
    pub reason: EndReason,
}

impl GameResult {
    pub fn new(outcome: Outcome, reason: EndReason) -> Self {
        Self { outcome, reason }
    }

    pub fn resignation(resigning: Seat) -> Self {
        Self::new(resigning.other().win(), EndReason::Resignation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_other() {
        assert_eq!(Seat::One.other(), Seat::Two);
        assert_eq!(Seat::Two.other().index(), 0);
    }

    #[test]
    fn test_outcome_winner() {
        assert_eq!(Outcome::Player2Win.winner(), Some(Seat::Two));
        assert_eq!(Outcome::Draw.winner(), None);
        assert_eq!(
            Outcome::Timeout {
                winner: Some(Seat::One)
            }
            .winner(),
            Some(Seat::One)
        );
        assert_eq!(
            GameResult::resignation(Seat::One).outcome,
            Outcome::Player2Win
        );
    }
}
