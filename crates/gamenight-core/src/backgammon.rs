//! Backgammon.
//!
//! Points are indexed 0-23. Seat one moves from 23 towards 0 and bears off
//! from its home quadrant 0-5; seat two moves from 0 towards 23 with home
//! 18-23. Each seat owns fifteen pieces spread over the points, the bar and
//! its borne-off tray, and that total is re-checked after every move.

use crate::actions::GameEvent;
use crate::error::GameError;
use crate::player::{EndReason, GameResult, Seat};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use tracing::error;

pub const PIECES_PER_SIDE: u8 = 15;
const POINTS: usize = 24;

/// Where a move starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    Bar,
    Point(u8),
}

/// Where a move ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    Point(u8),
    BorneOff,
}

/// A point on the board; only one seat may occupy it at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub owner: Option<Seat>,
    pub count: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgammonPhase {
    /// Waiting for the current seat to roll
    Roll,
    /// Spending the rolled move values
    Move,
}

/// Backgammon game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backgammon {
    points: [Point; POINTS],
    bar: [u8; 2],
    borne_off: [u8; 2],
    pub current_player: Seat,
    pub phase: BackgammonPhase,
    pub dice: Option<(u8, u8)>,
    moves_left: Vec<u8>,
    result: Option<GameResult>,
}

impl Default for Backgammon {
    fn default() -> Self {
        Self::new()
    }
}

impl Backgammon {
    /// Standard starting layout, seat one to roll
    pub fn new() -> Self {
        let mut points = [Point::default(); POINTS];
        let layout = [
            (23, Seat::One, 2),
            (12, Seat::One, 5),
            (7, Seat::One, 3),
            (5, Seat::One, 5),
            (0, Seat::Two, 2),
            (11, Seat::Two, 5),
            (16, Seat::Two, 3),
            (18, Seat::Two, 5),
        ];
        for (index, seat, count) in layout {
            points[index] = Point {
                owner: Some(seat),
                count,
            };
        }
        Self::with_points(points, [0, 0], [0, 0])
    }

    fn with_points(points: [Point; POINTS], bar: [u8; 2], borne_off: [u8; 2]) -> Self {
        Self {
            points,
            bar,
            borne_off,
            current_player: Seat::One,
            phase: BackgammonPhase::Roll,
            dice: None,
            moves_left: Vec::new(),
            result: None,
        }
    }

    /// Arbitrary position. Stacks are `(point, seat, count)`; every seat must
    /// account for exactly fifteen pieces.
    pub fn from_layout(
        stacks: &[(u8, Seat, u8)],
        bar: [u8; 2],
        borne_off: [u8; 2],
    ) -> Result<Self, GameError> {
        let mut points = [Point::default(); POINTS];
        for &(index, seat, count) in stacks {
            let point = points.get_mut(index as usize).ok_or(GameError::OutOfBounds {
                row: 0,
                col: index as i32,
            })?;
            if point.owner.is_some() {
                return Err(GameError::Overlap);
            }
            if count > 0 {
                *point = Point {
                    owner: Some(seat),
                    count,
                };
            }
        }

        let game = Self::with_points(points, bar, borne_off);
        game.verify_conservation()?;
        Ok(game)
    }

    pub fn point(&self, index: u8) -> Option<Point> {
        self.points.get(index as usize).copied()
    }

    pub fn bar(&self, seat: Seat) -> u8 {
        self.bar[seat.index()]
    }

    pub fn borne_off(&self, seat: Seat) -> u8 {
        self.borne_off[seat.index()]
    }

    pub fn moves_left(&self) -> &[u8] {
        &self.moves_left
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn turn_owner(&self) -> Option<Seat> {
        (!self.is_finished()).then_some(self.current_player)
    }

    /// Pieces of `seat` on the board, bar and tray
    pub fn piece_count(&self, seat: Seat) -> u32 {
        let on_board: u32 = self
            .points
            .iter()
            .filter(|p| p.owner == Some(seat))
            .map(|p| p.count as u32)
            .sum();
        on_board + self.bar[seat.index()] as u32 + self.borne_off[seat.index()] as u32
    }

    /// Check the fifteen-pieces-per-side invariant
    pub fn verify_conservation(&self) -> Result<(), GameError> {
        for seat in Seat::BOTH {
            let count = self.piece_count(seat);
            if count != PIECES_PER_SIDE as u32 {
                let message = format!("{seat:?} has {count} pieces, expected {PIECES_PER_SIDE}");
                error!(%message, "backgammon conservation check failed");
                return Err(GameError::InternalInvariantViolation(message));
            }
        }
        Ok(())
    }

    fn direction(seat: Seat) -> i32 {
        match seat {
            Seat::One => -1,
            Seat::Two => 1,
        }
    }

    /// Virtual position of the bar: one step before the seat's first point
    fn bar_position(seat: Seat) -> i32 {
        match seat {
            Seat::One => POINTS as i32,
            Seat::Two => -1,
        }
    }

    fn is_home(seat: Seat, index: usize) -> bool {
        match seat {
            Seat::One => index <= 5,
            Seat::Two => index >= 18,
        }
    }

    /// Distance from a point to the bear-off edge
    fn distance_to_off(seat: Seat, index: usize) -> u8 {
        match seat {
            Seat::One => index as u8 + 1,
            Seat::Two => (POINTS - index) as u8,
        }
    }

    fn all_home(&self, seat: Seat) -> bool {
        self.bar[seat.index()] == 0
            && self
                .points
                .iter()
                .enumerate()
                .all(|(i, p)| p.owner != Some(seat) || Self::is_home(seat, i))
    }

    /// Whether `seat` has a piece further from home than `index` in its home
    /// quadrant
    fn has_piece_behind(&self, seat: Seat, index: usize) -> bool {
        let behind: Vec<usize> = match seat {
            Seat::One => (index + 1..=5).collect(),
            Seat::Two => (18..index).collect(),
        };
        behind.into_iter().any(|i| self.points[i].owner == Some(seat))
    }

    fn destination(seat: Seat, from: Origin, distance: u8) -> Destination {
        let start = match from {
            Origin::Bar => Self::bar_position(seat),
            Origin::Point(p) => p as i32,
        };
        let target = start + Self::direction(seat) * distance as i32;
        if (0..POINTS as i32).contains(&target) {
            Destination::Point(target as u8)
        } else {
            Destination::BorneOff
        }
    }

    /// Whether the current seat may move `distance` from `from`, ignoring
    /// whether that value is in the pool
    fn is_reachable(&self, from: Origin, distance: u8) -> bool {
        let seat = self.current_player;
        if !(1..=6).contains(&distance) {
            return false;
        }

        let on_bar = self.bar[seat.index()] > 0;
        match from {
            Origin::Bar if !on_bar => return false,
            Origin::Point(_) if on_bar => return false,
            Origin::Point(p) => match self.points.get(p as usize) {
                Some(point) if point.owner == Some(seat) && point.count >= 1 => {}
                _ => return false,
            },
            Origin::Bar => {}
        }

        match Self::destination(seat, from, distance) {
            Destination::Point(d) => {
                let target = self.points[d as usize];
                !(target.owner == Some(seat.other()) && target.count >= 2)
            }
            Destination::BorneOff => {
                let Origin::Point(p) = from else {
                    return false;
                };
                if !self.all_home(seat) {
                    return false;
                }
                let needed = Self::distance_to_off(seat, p as usize);
                distance == needed
                    || (distance > needed && !self.has_piece_behind(seat, p as usize))
            }
        }
    }

    /// Where the current seat would land moving `distance` from `from`
    pub fn landing(&self, from: Origin, distance: u8) -> Destination {
        Self::destination(self.current_player, from, distance)
    }

    /// Whether the current seat may spend `distance` from `from` right now
    pub fn can_move(&self, from: Origin, distance: u8) -> bool {
        !self.is_finished()
            && self.phase == BackgammonPhase::Move
            && self.moves_left.contains(&distance)
            && self.is_reachable(from, distance)
    }

    /// All legal (origin, distance) pairs for the current seat
    pub fn legal_moves(&self) -> Vec<(Origin, u8)> {
        let mut distances = self.moves_left.clone();
        distances.sort_unstable();
        distances.dedup();

        let origins =
            std::iter::once(Origin::Bar).chain((0..POINTS as u8).map(Origin::Point));
        origins
            .flat_map(|o| distances.iter().map(move |d| (o, *d)))
            .filter(|(o, d)| self.can_move(*o, *d))
            .collect()
    }

    /// Roll both dice; doubles give four moves of the rolled value
    pub fn roll_dice<R: RandomSource>(&mut self, rng: &mut R) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if self.phase != BackgammonPhase::Roll {
            return Err(GameError::InvalidPhase);
        }

        let d1 = rng.rand_int(1, 6) as u8;
        let d2 = rng.rand_int(1, 6) as u8;
        self.dice = Some((d1, d2));
        self.moves_left = if d1 == d2 { vec![d1; 4] } else { vec![d1, d2] };
        self.phase = BackgammonPhase::Move;

        let mut events = vec![GameEvent::DiceRolled {
            seat: self.current_player,
            roll: (d1, d2),
            moves: self.moves_left.clone(),
        }];
        events.extend(self.finish_turn_if_stuck());
        Ok(events)
    }

    /// Move one piece of the current seat by `distance`
    pub fn apply_move(&mut self, from: Origin, distance: u8) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if self.phase != BackgammonPhase::Move || self.moves_left.is_empty() {
            return Err(GameError::illegal("no moves left this turn"));
        }
        if !self.moves_left.contains(&distance) {
            return Err(GameError::illegal(format!(
                "{distance} is not among the remaining moves {:?}",
                self.moves_left
            )));
        }
        if !self.is_reachable(from, distance) {
            return Err(GameError::illegal(format!(
                "cannot move {distance} from {from:?}"
            )));
        }

        let seat = self.current_player;
        let other = seat.other();

        match from {
            Origin::Bar => self.bar[seat.index()] -= 1,
            Origin::Point(p) => {
                let point = &mut self.points[p as usize];
                point.count -= 1;
                if point.count == 0 {
                    point.owner = None;
                }
            }
        }

        let to = Self::destination(seat, from, distance);
        let mut hit = false;
        match to {
            Destination::Point(d) => {
                let point = &mut self.points[d as usize];
                if point.owner == Some(other) {
                    // Reachability guarantees a blot here
                    hit = true;
                    self.bar[other.index()] += point.count;
                    point.count = 0;
                }
                point.owner = Some(seat);
                point.count += 1;
            }
            Destination::BorneOff => self.borne_off[seat.index()] += 1,
        }

        if let Some(pos) = self.moves_left.iter().position(|m| *m == distance) {
            self.moves_left.remove(pos);
        }

        self.verify_conservation()?;

        let mut events = vec![GameEvent::CheckerMoved {
            seat,
            from,
            to,
            distance,
            hit,
        }];

        if self.borne_off[seat.index()] == PIECES_PER_SIDE {
            let gammon = self.borne_off[other.index()] == 0;
            self.moves_left.clear();
            self.result = Some(GameResult::new(seat.win(), EndReason::BorneOff { gammon }));
            return Ok(events);
        }

        if self.moves_left.is_empty() {
            events.extend(self.pass_turn());
        } else {
            events.extend(self.finish_turn_if_stuck());
        }
        Ok(events)
    }

    /// Forfeit the rest of the pool when no remaining value can be played
    fn finish_turn_if_stuck(&mut self) -> Vec<GameEvent> {
        if !self.legal_moves().is_empty() {
            return Vec::new();
        }
        let unused = std::mem::take(&mut self.moves_left);
        let mut events = vec![GameEvent::TurnForfeited {
            seat: self.current_player,
            unused,
        }];
        events.extend(self.pass_turn());
        events
    }

    fn pass_turn(&mut self) -> Vec<GameEvent> {
        self.moves_left.clear();
        self.phase = BackgammonPhase::Roll;
        self.current_player = self.current_player.other();
        vec![GameEvent::TurnPassed {
            next: self.current_player,
        }]
    }

    pub fn resign(&mut self, seat: Seat) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        self.moves_left.clear();
        self.result = Some(GameResult::resignation(seat));
        Ok(vec![GameEvent::Resigned { seat }])
    }
}
