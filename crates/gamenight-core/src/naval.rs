//! Naval battle.
//!
//! Each seat owns an ocean board and a fleet. Ships are placed during
//! `Setup` (by hand or randomly), then seats alternate attacks on the opposing
//! board during `Battle` until one fleet is entirely sunk.

use crate::actions::GameEvent;
use crate::board::{create_board, Board, CellStatus, Coord, ShipId};
use crate::error::GameError;
use crate::player::{EndReason, GameResult, Seat};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// Kind of ship in a fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipSpec {
    pub name: String,
    pub length: u8,
}

impl ShipSpec {
    pub fn new(name: impl Into<String>, length: u8) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    /// Lengths 5, 4, 3, 3, 2
    pub fn standard_fleet() -> Vec<ShipSpec> {
        vec![
            ShipSpec::new("Carrier", 5),
            ShipSpec::new("Battleship", 4),
            ShipSpec::new("Cruiser", 3),
            ShipSpec::new("Submarine", 3),
            ShipSpec::new("Destroyer", 2),
        ]
    }

    /// Lengths 3, 3, 2, 2, 1 for an 8x8 board
    pub fn small_fleet() -> Vec<ShipSpec> {
        vec![
            ShipSpec::new("Cruiser", 3),
            ShipSpec::new("Frigate", 3),
            ShipSpec::new("Destroyer", 2),
            ShipSpec::new("Corvette", 2),
            ShipSpec::new("Patrol Boat", 1),
        ]
    }
}

/// A placed ship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub spec: ShipSpec,
    /// Occupied cells, ordered from the origin
    pub cells: Vec<Coord>,
}

/// Result of firing at a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackResult {
    Hit,
    Miss,
    /// The cell was attacked before; nothing changed
    AlreadyAttacked,
}

/// Result of an attack plus the ship it sank, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub result: AttackResult,
    pub sunk: Option<ShipSpec>,
}

/// One seat's ocean: the board and the ships placed on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fleet {
    pub board: Board,
    ships: Vec<Option<Ship>>,
    specs: Vec<ShipSpec>,
}

impl Fleet {
    pub fn new(rows: usize, cols: usize, specs: Vec<ShipSpec>) -> Self {
        Self {
            board: create_board(rows, cols),
            ships: vec![None; specs.len()],
            specs,
        }
    }

    pub fn specs(&self) -> &[ShipSpec] {
        &self.specs
    }

    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.iter().flatten()
    }

    pub fn is_placed(&self, ship: usize) -> bool {
        self.ships.get(ship).is_some_and(|s| s.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.ships.iter().all(Option::is_some)
    }

    /// Cells a ship of `length` would occupy from `origin`
    fn footprint(origin: Coord, length: u8, horizontal: bool) -> Vec<Coord> {
        (0..length as i32)
            .map(|i| {
                if horizontal {
                    origin.offset(0, i)
                } else {
                    origin.offset(i, 0)
                }
            })
            .collect()
    }

    /// Place fleet ship `ship` with its first cell at `origin`.
    ///
    /// Fails with `OutOfBounds` or `Overlap` without touching the board.
    pub fn place_ship(
        &mut self,
        ship: usize,
        origin: Coord,
        horizontal: bool,
    ) -> Result<&Ship, GameError> {
        let spec = self
            .specs
            .get(ship)
            .cloned()
            .ok_or_else(|| GameError::illegal(format!("fleet has no ship #{ship}")))?;
        if self.is_placed(ship) {
            return Err(GameError::illegal(format!("{} is already placed", spec.name)));
        }

        let cells = Self::footprint(origin, spec.length, horizontal);
        for &cell in &cells {
            if self.board.get(cell)?.occupant.is_some() {
                return Err(GameError::Overlap);
            }
        }
        for &cell in &cells {
            self.board.place_occupant(cell, ship as ShipId)?;
        }

        Ok(&*self.ships[ship].insert(Ship { spec, cells }))
    }

    /// Randomly place every unplaced ship.
    ///
    /// Each ship gets at most `max_attempts` random origins/orientations. On
    /// `PlacementFailed` the fleet is left as it was.
    pub fn place_randomly<R: RandomSource>(
        &mut self,
        rng: &mut R,
        max_attempts: u32,
    ) -> Result<Vec<usize>, GameError> {
        let mut staged = self.clone();
        let mut placed = Vec::new();

        for ship in 0..staged.specs.len() {
            if staged.is_placed(ship) {
                continue;
            }
            let mut attempt = 0;
            loop {
                if attempt >= max_attempts {
                    return Err(GameError::PlacementFailed {
                        ship: staged.specs[ship].name.clone(),
                        attempts: max_attempts,
                    });
                }
                attempt += 1;

                let horizontal = rng.rand_int(0, 1) == 1;
                let origin = Coord::new(
                    rng.rand_int(0, staged.board.rows() as i64 - 1) as i32,
                    rng.rand_int(0, staged.board.cols() as i64 - 1) as i32,
                );
                if staged.place_ship(ship, origin, horizontal).is_ok() {
                    placed.push(ship);
                    break;
                }
            }
        }

        *self = staged;
        Ok(placed)
    }

    /// Fire at a cell of this fleet's board
    pub fn attack(&mut self, target: Coord) -> Result<AttackReport, GameError> {
        let cell = *self.board.get(target)?;
        if cell.status != CellStatus::Untouched {
            return Ok(AttackReport {
                result: AttackResult::AlreadyAttacked,
                sunk: None,
            });
        }

        let Some(ship_id) = cell.occupant else {
            self.board.mark_status(target, CellStatus::Miss)?;
            return Ok(AttackReport {
                result: AttackResult::Miss,
                sunk: None,
            });
        };

        self.board.mark_status(target, CellStatus::Hit)?;
        let sunk = self.ships[ship_id as usize]
            .as_ref()
            .filter(|ship| self.is_sunk(ship))
            .map(|ship| ship.spec.clone());

        Ok(AttackReport {
            result: AttackResult::Hit,
            sunk,
        })
    }

    fn is_sunk(&self, ship: &Ship) -> bool {
        ship.cells.iter().all(|c| {
            self.board
                .get(*c)
                .is_ok_and(|cell| cell.status == CellStatus::Hit)
        })
    }

    /// Whether ship `ship` could go at `origin` without touching the board
    pub fn fits(&self, ship: usize, origin: Coord, horizontal: bool) -> bool {
        let Some(spec) = self.specs.get(ship) else {
            return false;
        };
        !self.is_placed(ship)
            && Self::footprint(origin, spec.length, horizontal)
                .iter()
                .all(|c| self.board.get(*c).is_ok_and(|cell| cell.occupant.is_none()))
    }

    /// Whether the ship occupying `coord`, if any, has gone down
    pub fn is_sunk_at(&self, coord: Coord) -> bool {
        self.board
            .get(coord)
            .ok()
            .and_then(|cell| cell.occupant)
            .and_then(|id| self.ships.get(id as usize))
            .and_then(Option::as_ref)
            .is_some_and(|ship| self.is_sunk(ship))
    }

    pub fn all_sunk(&self) -> bool {
        self.is_complete() && self.ships().all(|ship| self.is_sunk(ship))
    }

    pub fn ships_remaining(&self) -> usize {
        self.ships().filter(|ship| !self.is_sunk(ship)).count()
    }
}

/// Phase of a naval battle, seen from seat one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavalPhase {
    Setup,
    Battle,
    Victory,
    Defeat,
}

/// Running reward tally for seat one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavalTally {
    pub hits: u32,
    /// Sum of the lengths of ships seat one has sunk
    pub sunk_length: u32,
}

/// Two-seat naval battle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavalBattle {
    fleets: [Fleet; 2],
    pub phase: NavalPhase,
    pub current_player: Seat,
    pub tally: NavalTally,
    result: Option<GameResult>,
}

impl NavalBattle {
    pub fn new(rows: usize, cols: usize, specs: Vec<ShipSpec>) -> Self {
        Self {
            fleets: [
                Fleet::new(rows, cols, specs.clone()),
                Fleet::new(rows, cols, specs),
            ],
            phase: NavalPhase::Setup,
            current_player: Seat::One,
            tally: NavalTally::default(),
            result: None,
        }
    }

    pub fn fleet(&self, seat: Seat) -> &Fleet {
        &self.fleets[seat.index()]
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    fn require_setup(&self) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if self.phase != NavalPhase::Setup {
            return Err(GameError::InvalidPhase);
        }
        Ok(())
    }

    pub fn place_ship(
        &mut self,
        seat: Seat,
        ship: usize,
        origin: Coord,
        horizontal: bool,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.require_setup()?;
        let placed = self.fleets[seat.index()].place_ship(ship, origin, horizontal)?;
        let mut events = vec![GameEvent::ShipPlaced {
            seat,
            ship: placed.spec.name.clone(),
            cells: placed.cells.clone(),
        }];
        events.extend(self.check_setup_complete(seat));
        Ok(events)
    }

    pub fn randomize_fleet<R: RandomSource>(
        &mut self,
        seat: Seat,
        rng: &mut R,
        max_attempts: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.require_setup()?;
        let fleet = &mut self.fleets[seat.index()];
        let placed = fleet.place_randomly(rng, max_attempts)?;
        let mut events: Vec<GameEvent> = placed
            .into_iter()
            .filter_map(|idx| fleet.ships[idx].as_ref())
            .map(|ship| GameEvent::ShipPlaced {
                seat,
                ship: ship.spec.name.clone(),
                cells: ship.cells.clone(),
            })
            .collect();
        events.extend(self.check_setup_complete(seat));
        Ok(events)
    }

    fn check_setup_complete(&mut self, seat: Seat) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.fleets[seat.index()].is_complete() {
            events.push(GameEvent::FleetReady { seat });
        }
        if self.fleets.iter().all(Fleet::is_complete) {
            self.phase = NavalPhase::Battle;
            self.current_player = Seat::One;
            events.push(GameEvent::BattleStarted);
        }
        events
    }

    /// Fire at the opposing board.
    ///
    /// `AlreadyAttacked` is reported as an event but does not pass the turn.
    pub fn attack(&mut self, seat: Seat, target: Coord) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if self.phase != NavalPhase::Battle {
            return Err(GameError::InvalidPhase);
        }
        if seat != self.current_player {
            return Err(GameError::NotYourTurn);
        }

        let defender = seat.other();
        let report = self.fleets[defender.index()].attack(target)?;
        let mut events = vec![GameEvent::Attacked {
            attacker: seat,
            target,
            result: report.result,
        }];

        match report.result {
            AttackResult::AlreadyAttacked => return Ok(events),
            AttackResult::Hit if seat == Seat::One => self.tally.hits += 1,
            _ => {}
        }

        if let Some(spec) = report.sunk {
            if seat == Seat::One {
                self.tally.sunk_length += spec.length as u32;
            }
            events.push(GameEvent::ShipSunk {
                owner: defender,
                ship: spec.name,
                length: spec.length,
            });
        }

        if self.fleets[defender.index()].all_sunk() {
            self.phase = match seat {
                Seat::One => NavalPhase::Victory,
                Seat::Two => NavalPhase::Defeat,
            };
            self.result = Some(GameResult::new(seat.win(), EndReason::FleetSunk));
        } else {
            self.current_player = defender;
            events.push(GameEvent::TurnPassed { next: defender });
        }

        Ok(events)
    }

    /// Cells of the board `seat` is attacking that are still untouched
    pub fn targets_for(&self, seat: Seat) -> Vec<Coord> {
        self.fleets[seat.other().index()].board.untouched()
    }

    /// Pick a uniformly random untouched target for `seat`.
    ///
    /// Candidates are enumerated up front, so the choice never repeats a cell
    /// and takes a single draw.
    pub fn choose_target<R: RandomSource>(&self, seat: Seat, rng: &mut R) -> Option<Coord> {
        let targets = self.targets_for(seat);
        if targets.is_empty() {
            return None;
        }
        Some(targets[rng.pick_index(targets.len())])
    }

    pub fn resign(&mut self, seat: Seat) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        self.phase = match seat {
            Seat::One => NavalPhase::Defeat,
            Seat::Two => NavalPhase::Victory,
        };
        self.result = Some(GameResult::resignation(seat));
        Ok(vec![GameEvent::Resigned { seat }])
    }

    /// Setup has no turn order; battle alternates
    pub fn turn_owner(&self) -> Option<Seat> {
        (self.phase == NavalPhase::Battle && !self.is_finished()).then_some(self.current_player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{ScriptedRandom, SeededRandom};

    fn single_cruiser() -> Vec<ShipSpec> {
        vec![ShipSpec::new("Cruiser", 3)]
    }

    #[test]
    fn test_place_ship_bounds_and_overlap() {
        let mut fleet = Fleet::new(10, 10, ShipSpec::standard_fleet());
        assert!(matches!(
            fleet.place_ship(0, Coord::new(0, 6), true),
            Err(GameError::OutOfBounds { .. })
        ));
        fleet.place_ship(0, Coord::new(0, 0), true).unwrap();
        let before = fleet.clone();
        assert_eq!(
            fleet.place_ship(1, Coord::new(0, 3), false).unwrap_err(),
            GameError::Overlap
        );
        assert_eq!(fleet, before);
    }

    #[test]
    fn test_ship_cells_contiguous() {
        let mut fleet = Fleet::new(10, 10, single_cruiser());
        let ship = fleet.place_ship(0, Coord::new(2, 4), false).unwrap();
        assert_eq!(
            ship.cells,
            vec![Coord::new(2, 4), Coord::new(3, 4), Coord::new(4, 4)]
        );
    }

    #[test]
    fn test_sinking_scenario() {
        let mut fleet = Fleet::new(10, 10, single_cruiser());
        fleet.place_ship(0, Coord::new(0, 0), true).unwrap();

        let r = fleet.attack(Coord::new(0, 0)).unwrap();
        assert_eq!(r.result, AttackResult::Hit);
        assert!(r.sunk.is_none());
        assert_eq!(fleet.attack(Coord::new(0, 1)).unwrap().result, AttackResult::Hit);
        let r = fleet.attack(Coord::new(0, 2)).unwrap();
        assert_eq!(r.result, AttackResult::Hit);
        assert_eq!(r.sunk, Some(ShipSpec::new("Cruiser", 3)));
        assert!(fleet.all_sunk());
    }

    #[test]
    fn test_repeat_attack_is_noop() {
        let mut fleet = Fleet::new(4, 4, single_cruiser());
        fleet.place_ship(0, Coord::new(0, 0), true).unwrap();
        fleet.attack(Coord::new(3, 3)).unwrap();
        let before = fleet.clone();
        assert_eq!(
            fleet.attack(Coord::new(3, 3)).unwrap().result,
            AttackResult::AlreadyAttacked
        );
        assert_eq!(fleet, before);
    }

    #[test]
    fn test_random_placement_is_valid() {
        let mut rng = SeededRandom::with_seed(11);
        let mut fleet = Fleet::new(10, 10, ShipSpec::standard_fleet());
        fleet.place_randomly(&mut rng, 200).unwrap();
        assert!(fleet.is_complete());
        let occupied = fleet
            .board
            .iter()
            .filter(|(_, cell)| cell.occupant.is_some())
            .count();
        assert_eq!(occupied, 5 + 4 + 3 + 3 + 2);
    }

    #[test]
    fn test_random_placement_gives_up() {
        // A 5-long ship never fits on a 2x2 board
        let mut rng = ScriptedRandom::new(vec![0, 1, 0]);
        let mut fleet = Fleet::new(2, 2, vec![ShipSpec::new("Carrier", 5)]);
        let before = fleet.clone();
        assert_eq!(
            fleet.place_randomly(&mut rng, 25),
            Err(GameError::PlacementFailed {
                ship: "Carrier".into(),
                attempts: 25
            })
        );
        assert_eq!(fleet, before);
    }

    #[test]
    fn test_battle_flow_to_victory() {
        let mut battle = NavalBattle::new(10, 10, single_cruiser());
        battle.place_ship(Seat::One, 0, Coord::new(5, 5), false).unwrap();
        assert_eq!(battle.phase, NavalPhase::Setup);
        let events = battle.place_ship(Seat::Two, 0, Coord::new(0, 0), true).unwrap();
        assert!(events.contains(&GameEvent::BattleStarted));
        assert_eq!(battle.phase, NavalPhase::Battle);

        assert_eq!(
            battle.attack(Seat::Two, Coord::new(0, 0)),
            Err(GameError::NotYourTurn)
        );

        for col in 0..3 {
            battle.attack(Seat::One, Coord::new(0, col)).unwrap();
            if col < 2 {
                battle.attack(Seat::Two, Coord::new(9, col)).unwrap();
            }
        }

        assert_eq!(battle.phase, NavalPhase::Victory);
        assert_eq!(battle.result().unwrap().outcome, crate::player::Outcome::Player1Win);
        assert_eq!(battle.tally, NavalTally { hits: 3, sunk_length: 3 });
    }

    #[test]
    fn test_opponent_never_repeats() {
        let mut rng = SeededRandom::with_seed(5);
        let mut battle = NavalBattle::new(3, 3, vec![ShipSpec::new("Boat", 1)]);
        battle.place_ship(Seat::One, 0, Coord::new(2, 2), true).unwrap();
        battle.place_ship(Seat::Two, 0, Coord::new(2, 2), true).unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..8 {
            let target = battle.choose_target(Seat::Two, &mut rng).unwrap();
            assert!(seen.insert(target));
            battle.fleets[0].attack(target).unwrap();
        }
        assert_eq!(battle.targets_for(Seat::Two).len(), 1);
    }
}
