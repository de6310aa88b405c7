//! Simplified chess.
//!
//! Moves follow the piece movement rules (with path clearing for sliding
//! pieces) but there is no check detection, castling, en passant or
//! promotion. The game ends when a king is captured, when a clock runs out,
//! or on resignation.

use crate::actions::GameEvent;
use crate::board::{Coord, Grid};
use crate::error::GameError;
use crate::player::{EndReason, GameResult, Outcome, Seat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// White sits in seat one
    pub fn seat(self) -> Seat {
        match self {
            Color::White => Seat::One,
            Color::Black => Seat::Two,
        }
    }

    pub fn for_seat(seat: Seat) -> Color {
        match seat {
            Seat::One => Color::White,
            Seat::Two => Color::Black,
        }
    }

    /// Rank direction pawns advance in
    fn forward(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    fn pawn_rank(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }
}

/// A board square, file `a`-`h` (0-7) and rank `1`-`8` (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    fn coord(&self) -> Coord {
        Coord::new(self.rank as i32, self.file as i32)
    }

    /// Every square, a1 first
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square { file, rank }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(GameError::illegal(format!("bad square '{s}'")));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| GameError::illegal(format!("bad square '{s}'")))
    }
}

/// Append-only record of one applied move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub captured: Option<Piece>,
}

/// Remaining seconds on each clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clocks {
    pub white: u32,
    pub black: u32,
}

impl Clocks {
    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    fn get_mut(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }
}

/// Chess game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessGame {
    board: Grid<Option<Piece>>,
    pub current_player: Color,
    pub clocks: Clocks,
    history: Vec<MoveRecord>,
    result: Option<GameResult>,
}

impl ChessGame {
    /// Standard starting position with both clocks at `clock_seconds`
    pub fn new(clock_seconds: u32) -> Self {
        use PieceKind::*;
        const BACK_RANK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut pieces = Vec::with_capacity(32);
        for (file, kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            pieces.push((Square { file, rank: 0 }, Piece::new(Color::White, *kind)));
            pieces.push((Square { file, rank: 1 }, Piece::new(Color::White, Pawn)));
            pieces.push((Square { file, rank: 6 }, Piece::new(Color::Black, Pawn)));
            pieces.push((Square { file, rank: 7 }, Piece::new(Color::Black, *kind)));
        }

        Self::build(pieces, clock_seconds)
    }

    /// Arbitrary position; must contain exactly one king per color
    pub fn from_position(
        pieces: Vec<(Square, Piece)>,
        clock_seconds: u32,
    ) -> Result<Self, GameError> {
        for color in [Color::White, Color::Black] {
            let kings = pieces
                .iter()
                .filter(|(_, p)| p.color == color && p.kind == PieceKind::King)
                .count();
            if kings != 1 {
                return Err(GameError::illegal(format!(
                    "{color:?} must have exactly one king, found {kings}"
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        if !pieces.iter().all(|(sq, _)| seen.insert(*sq)) {
            return Err(GameError::Overlap);
        }
        Ok(Self::build(pieces, clock_seconds))
    }

    fn build(pieces: Vec<(Square, Piece)>, clock_seconds: u32) -> Self {
        let mut board = Grid::new(8, 8);
        for (square, piece) in pieces {
            // Squares are always in bounds
            let _ = board.set(square.coord(), Some(piece));
        }
        Self {
            board,
            current_player: Color::White,
            clocks: Clocks {
                white: clock_seconds,
                black: clock_seconds,
            },
            history: Vec::new(),
            result: None,
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.get(square.coord()).ok().copied().flatten()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Whether `from -> to` is a reachable move for the piece on `from`.
    ///
    /// Turn order is not considered here; see [`ChessGame::apply_move`].
    pub fn is_legal_move(&self, from: Square, to: Square) -> bool {
        if self.is_finished() || from == to {
            return false;
        }
        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        let target = self.piece_at(to);
        if target.is_some_and(|t| t.color == piece.color) {
            return false;
        }

        let df = to.file as i32 - from.file as i32;
        let dr = to.rank as i32 - from.rank as i32;

        match piece.kind {
            PieceKind::Pawn => {
                let dir = piece.color.forward();
                if df == 0 && dr == dir {
                    target.is_none()
                } else if df == 0 && dr == 2 * dir {
                    from.rank as i32 == piece.color.pawn_rank()
                        && target.is_none()
                        && self.path_clear(from, to)
                } else if df.abs() == 1 && dr == dir {
                    target.is_some()
                } else {
                    false
                }
            }
            PieceKind::Rook => (df == 0 || dr == 0) && self.path_clear(from, to),
            PieceKind::Bishop => df.abs() == dr.abs() && self.path_clear(from, to),
            PieceKind::Queen => {
                (df == 0 || dr == 0 || df.abs() == dr.abs()) && self.path_clear(from, to)
            }
            PieceKind::Knight => matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)),
            PieceKind::King => df.abs().max(dr.abs()) == 1,
        }
    }

    /// Every square strictly between `from` and `to` is empty.
    ///
    /// Callers guarantee the squares share a line or diagonal.
    fn path_clear(&self, from: Square, to: Square) -> bool {
        let step_f = (to.file as i32 - from.file as i32).signum();
        let step_r = (to.rank as i32 - from.rank as i32).signum();
        let mut cursor = from.coord().offset(step_r, step_f);
        let end = to.coord();
        while cursor != end {
            if matches!(self.board.get(cursor), Ok(Some(_))) {
                return false;
            }
            cursor = cursor.offset(step_r, step_f);
        }
        true
    }

    /// All legal moves for the side to move
    pub fn legal_moves(&self) -> Vec<(Square, Square)> {
        if self.is_finished() {
            return Vec::new();
        }
        Square::all()
            .filter(|sq| self.piece_at(*sq).is_some_and(|p| p.color == self.current_player))
            .flat_map(|from| Square::all().map(move |to| (from, to)))
            .filter(|(from, to)| self.is_legal_move(*from, *to))
            .collect()
    }

    /// Apply a move for the side to move
    pub fn apply_move(&mut self, from: Square, to: Square) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        let piece = self
            .piece_at(from)
            .ok_or_else(|| GameError::illegal(format!("no piece on {from}")))?;
        if piece.color != self.current_player {
            return Err(GameError::illegal(format!(
                "it is {:?}'s turn",
                self.current_player
            )));
        }
        if !self.is_legal_move(from, to) {
            return Err(GameError::illegal(format!(
                "{:?} cannot move {from} to {to}",
                piece.kind
            )));
        }

        self.board.set(from.coord(), None)?;
        let captured = self.board.set(to.coord(), Some(piece))?;

        let record = MoveRecord {
            from,
            to,
            piece,
            captured,
        };
        self.history.push(record);

        let mut events = vec![GameEvent::PieceMoved {
            from,
            to,
            piece,
            captured,
        }];

        if captured.is_some_and(|c| c.kind == PieceKind::King) {
            self.result = Some(GameResult::new(
                piece.color.seat().win(),
                EndReason::KingCaptured,
            ));
        } else {
            self.current_player = self.current_player.opponent();
            events.push(GameEvent::TurnPassed {
                next: self.current_player.seat(),
            });
        }

        Ok(events)
    }

    /// Run the active clock down by `seconds`; a flag fall ends the game
    pub fn tick(&mut self, seconds: u32) -> Vec<GameEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        let active = self.current_player;
        let clock = self.clocks.get_mut(active);
        *clock = clock.saturating_sub(seconds);
        if *clock > 0 {
            return Vec::new();
        }

        self.result = Some(GameResult::new(
            Outcome::Timeout {
                winner: Some(active.opponent().seat()),
            },
            EndReason::ClockExpired,
        ));
        vec![GameEvent::ClockExpired { color: active }]
    }

    pub fn resign(&mut self, seat: Seat) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        self.result = Some(GameResult::resignation(seat));
        Ok(vec![GameEvent::Resigned { seat }])
    }

    /// The side to move, as a seat
    pub fn turn_owner(&self) -> Option<Seat> {
        (!self.is_finished()).then(|| self.current_player.seat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn kings_and_rook() -> ChessGame {
        ChessGame::from_position(
            vec![
                (sq("e1"), Piece::new(Color::White, PieceKind::King)),
                (sq("e8"), Piece::new(Color::Black, PieceKind::King)),
                (sq("a1"), Piece::new(Color::White, PieceKind::Rook)),
            ],
            600,
        )
        .unwrap()
    }

    #[test]
    fn test_square_parsing() {
        assert_eq!(sq("a1"), Square::new(0, 0).unwrap());
        assert_eq!(sq("H8"), Square::new(7, 7).unwrap());
        assert_eq!(sq("e4").to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn test_initial_position() {
        let game = ChessGame::new(600);
        assert_eq!(
            game.piece_at(sq("e1")),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(
            game.piece_at(sq("d8")),
            Some(Piece::new(Color::Black, PieceKind::Queen))
        );
        // 16 pawn moves + 4 knight moves
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn test_rook_path_clear() {
        let mut game = kings_and_rook();
        assert!(game.is_legal_move(sq("a1"), sq("a8")));
        let events = game.apply_move(sq("a1"), sq("a8")).unwrap();
        assert!(matches!(
            events[0],
            GameEvent::PieceMoved { captured: None, .. }
        ));
        assert_eq!(game.current_player, Color::Black);
        assert!(!game.is_finished());
    }

    #[test]
    fn test_rook_blocked_and_diagonal() {
        let game = kings_and_rook();
        // King on e1 blocks the first rank
        assert!(!game.is_legal_move(sq("a1"), sq("h1")));
        assert!(game.is_legal_move(sq("a1"), sq("d1")));
        // Diagonal is not a rook move
        assert!(!game.is_legal_move(sq("a1"), sq("c3")));
    }

    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut game = kings_and_rook();
        let before = game.clone();
        let err = game.apply_move(sq("a1"), sq("h8")).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove(_)));
        assert_eq!(game, before);
    }

    #[test]
    fn test_cannot_move_opponent_piece() {
        let mut game = ChessGame::new(600);
        assert!(matches!(
            game.apply_move(sq("e7"), sq("e5")),
            Err(GameError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_pawn_rules() {
        let mut game = ChessGame::new(600);
        assert!(game.is_legal_move(sq("e2"), sq("e4")));
        assert!(game.is_legal_move(sq("e2"), sq("e3")));
        assert!(!game.is_legal_move(sq("e2"), sq("e5")));
        assert!(!game.is_legal_move(sq("e2"), sq("d3")));

        game.apply_move(sq("e2"), sq("e4")).unwrap();
        game.apply_move(sq("d7"), sq("d5")).unwrap();
        // Diagonal capture available, straight push blocked only by pieces
        assert!(game.is_legal_move(sq("e4"), sq("d5")));
        assert!(!game.is_legal_move(sq("e4"), sq("e6")));
        game.apply_move(sq("e4"), sq("d5")).unwrap();
        assert_eq!(
            game.history().last().unwrap().captured,
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
    }

    #[test]
    fn test_knight_jumps() {
        let game = ChessGame::new(600);
        assert!(game.is_legal_move(sq("g1"), sq("f3")));
        assert!(!game.is_legal_move(sq("g1"), sq("e2")));
        assert!(!game.is_legal_move(sq("g1"), sq("g3")));
    }

    #[test]
    fn test_king_capture_ends_game() {
        let mut game = ChessGame::from_position(
            vec![
                (sq("e1"), Piece::new(Color::White, PieceKind::King)),
                (sq("e8"), Piece::new(Color::Black, PieceKind::King)),
                (sq("e2"), Piece::new(Color::White, PieceKind::Queen)),
            ],
            600,
        )
        .unwrap();
        game.apply_move(sq("e2"), sq("e8")).unwrap();
        assert_eq!(
            game.result(),
            Some(GameResult::new(Outcome::Player1Win, EndReason::KingCaptured))
        );
        assert_eq!(
            game.apply_move(sq("e1"), sq("e2")),
            Err(GameError::AlreadyResolved)
        );
    }

    #[test]
    fn test_clock_timeout() {
        let mut game = ChessGame::new(3);
        assert!(game.tick(2).is_empty());
        assert_eq!(game.clocks.white, 1);
        let events = game.tick(1);
        assert_eq!(events, vec![GameEvent::ClockExpired { color: Color::White }]);
        assert_eq!(
            game.result().unwrap().outcome,
            Outcome::Timeout {
                winner: Some(Seat::Two)
            }
        );
        // Ticks after the end are ignored
        assert!(game.tick(5).is_empty());
        assert_eq!(game.clocks.black, 3);
    }

    #[test]
    fn test_position_needs_one_king_each() {
        let result = ChessGame::from_position(
            vec![(sq("e1"), Piece::new(Color::White, PieceKind::King))],
            600,
        );
        assert!(result.is_err());
    }
}
