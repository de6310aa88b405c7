//! Simulated opponents.
//!
//! Each difficulty level picks from the session's valid actions:
//! - Easy: a uniformly random valid action
//! - Medium: simple per-game priorities (captures, hits, bearing off)
//! - Hard: Medium plus hunting around damaged ships and not hanging pieces
//!
//! Bots only decide. The session registry decides when they act.

use crate::actions::{BackgammonAction, ChessAction, GameAction, GoFishAction, NavalAction};
use crate::backgammon::{Backgammon, Destination};
use crate::board::{CellStatus, Coord};
use crate::chess::{ChessGame, PieceKind};
use crate::naval::{NavalBattle, NavalPhase};
use crate::player::Seat;
use crate::session::Engine;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
}

/// A bot seat that can decide on actions
pub struct Bot {
    pub seat: Seat,
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(seat: Seat, difficulty: BotDifficulty) -> Self {
        Self {
            seat,
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seat: Seat, difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            seat,
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose an action from the valid actions
    pub fn choose_action(&mut self, engine: &Engine) -> Option<GameAction> {
        let valid_actions = engine.valid_actions(self.seat);
        if valid_actions.is_empty() {
            return None;
        }

        // Manual placement is never worth it for a bot
        let randomize = GameAction::Naval(NavalAction::RandomizeFleet);
        if valid_actions.contains(&randomize) {
            return Some(randomize);
        }

        let choice = match self.difficulty {
            BotDifficulty::Easy => self.choose_easy(&valid_actions),
            BotDifficulty::Medium | BotDifficulty::Hard => match engine {
                Engine::Chess(game) => self.choose_chess(game, &valid_actions),
                Engine::Naval(battle) => self.choose_naval(battle, &valid_actions),
                Engine::Backgammon(game) => self.choose_backgammon(game, &valid_actions),
                Engine::GoFish(game) => {
                    // Ask for the rank we hold most of
                    let hand = game.hand(self.seat);
                    valid_actions
                        .iter()
                        .max_by_key(|action| match action {
                            GameAction::GoFish(GoFishAction::Ask { rank }) => {
                                hand.iter().filter(|c| c.rank == *rank).count()
                            }
                            _ => 0,
                        })
                        .cloned()
                }
                // Speed rewards reaction time, not planning
                Engine::Speed(_) => valid_actions.first().cloned(),
            },
        };
        debug!(seat = ?self.seat, difficulty = ?self.difficulty, ?choice, "Bot chose");
        choice
    }

    /// Easy: Just pick a random valid action
    fn choose_easy(&mut self, actions: &[GameAction]) -> Option<GameAction> {
        actions.choose(&mut self.rng).cloned()
    }

    /// Take the king if possible, otherwise the best capture, otherwise any move
    fn choose_chess(&mut self, game: &ChessGame, actions: &[GameAction]) -> Option<GameAction> {
        let capture_value = |action: &GameAction| match action {
            GameAction::Chess(ChessAction::Move { to, .. }) => {
                game.piece_at(*to).map_or(0, |p| piece_value(p.kind))
            }
            _ => 0,
        };

        let best = actions.iter().map(capture_value).max().unwrap_or(0);
        let captures: Vec<&GameAction> = actions
            .iter()
            .filter(|a| best > 0 && capture_value(*a) == best)
            .collect();
        if let Some(action) = captures.choose(&mut self.rng) {
            return Some((*action).clone());
        }

        if self.difficulty == BotDifficulty::Hard {
            // Avoid stepping onto a square the opponent can take
            let safe: Vec<&GameAction> = actions
                .iter()
                .filter(|a| match a {
                    GameAction::Chess(ChessAction::Move { from, to }) => {
                        let mut after = game.clone();
                        after.apply_move(*from, *to).is_ok()
                            && !after.legal_moves().iter().any(|(_, target)| target == to)
                    }
                    _ => false,
                })
                .collect();
            if let Some(action) = safe.choose(&mut self.rng) {
                return Some((*action).clone());
            }
        }

        self.choose_easy(actions)
    }

    /// Uniform over untouched cells; Hard finishes off damaged ships first
    fn choose_naval(&mut self, battle: &NavalBattle, actions: &[GameAction]) -> Option<GameAction> {
        if battle.phase != NavalPhase::Battle || self.difficulty != BotDifficulty::Hard {
            return self.choose_easy(actions);
        }

        let board = &battle.fleet(self.seat.other()).board;
        let fleet = battle.fleet(self.seat.other());
        let wounded: Vec<Coord> = board
            .iter()
            .filter(|(coord, cell)| cell.status == CellStatus::Hit && !fleet.is_sunk_at(*coord))
            .map(|(coord, _)| coord)
            .collect();

        let near_wound: Vec<&GameAction> = actions
            .iter()
            .filter(|a| match a {
                GameAction::Naval(NavalAction::Attack { target }) => wounded.iter().any(|w| {
                    (w.row - target.row).abs() + (w.col - target.col).abs() == 1
                }),
                _ => false,
            })
            .collect();

        match near_wound.choose(&mut self.rng) {
            Some(action) => Some((*action).clone()),
            None => self.choose_easy(actions),
        }
    }

    /// Roll first, then prefer bearing off, then hitting, then anything
    fn choose_backgammon(
        &mut self,
        game: &Backgammon,
        actions: &[GameAction],
    ) -> Option<GameAction> {
        let roll = GameAction::Backgammon(BackgammonAction::Roll);
        if actions.contains(&roll) {
            return Some(roll);
        }

        let seat = self.seat;
        let stack_bonus = i32::from(self.difficulty == BotDifficulty::Hard);
        let score = |action: &GameAction| -> i32 {
            let GameAction::Backgammon(BackgammonAction::Move { from, distance }) = action else {
                return 0;
            };
            match game.landing(*from, *distance) {
                Destination::BorneOff => 3,
                Destination::Point(p) => match game.point(p) {
                    Some(point) if point.owner == Some(seat.other()) => 2,
                    // Covers a blot
                    Some(point) if point.owner == Some(seat) && point.count == 1 => stack_bonus,
                    _ => 0,
                },
            }
        };

        let best = actions.iter().map(score).max().unwrap_or(0);
        let preferred: Vec<&GameAction> = actions.iter().filter(|a| score(*a) == best).collect();
        preferred.choose(&mut self.rng).map(|a| (*a).clone())
    }
}

fn piece_value(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight | PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::SpeedAction;
    use crate::cards::{standard_deck, Card, Rank, Suit};
    use crate::chess::{Color, Piece, Square};
    use crate::go_fish::GoFish;
    use crate::naval::ShipSpec;
    use crate::rng::ScriptedRandom;
    use crate::speed::Speed;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_bot_creation() {
        let bot = Bot::new(Seat::Two, BotDifficulty::Easy);
        assert_eq!(bot.seat, Seat::Two);
        assert_eq!(bot.difficulty, BotDifficulty::Easy);
    }

    #[test]
    fn test_easy_bot_chooses_legal_chess_move() {
        let engine = Engine::Chess(ChessGame::new(600));
        let mut bot = Bot::with_seed(Seat::One, BotDifficulty::Easy, 1);
        let action = bot.choose_action(&engine).unwrap();
        assert!(engine.valid_actions(Seat::One).contains(&action));
    }

    #[test]
    fn test_bot_waits_off_turn() {
        let engine = Engine::Chess(ChessGame::new(600));
        let mut bot = Bot::with_seed(Seat::Two, BotDifficulty::Hard, 1);
        assert_eq!(bot.choose_action(&engine), None);
    }

    #[test]
    fn test_medium_bot_takes_the_king() {
        let game = ChessGame::from_position(
            vec![
                (sq("e1"), Piece::new(Color::White, PieceKind::King)),
                (sq("a1"), Piece::new(Color::White, PieceKind::Rook)),
                (sq("a8"), Piece::new(Color::Black, PieceKind::King)),
                (sq("h1"), Piece::new(Color::Black, PieceKind::Queen)),
            ],
            600,
        )
        .unwrap();
        let mut bot = Bot::with_seed(Seat::One, BotDifficulty::Medium, 9);
        assert_eq!(
            bot.choose_action(&Engine::Chess(game)),
            Some(GameAction::Chess(ChessAction::Move {
                from: sq("a1"),
                to: sq("a8")
            }))
        );
    }

    #[test]
    fn test_bot_randomizes_fleet_in_setup() {
        let engine = Engine::Naval(NavalBattle::new(10, 10, ShipSpec::standard_fleet()));
        let mut bot = Bot::with_seed(Seat::Two, BotDifficulty::Easy, 3);
        assert_eq!(
            bot.choose_action(&engine),
            Some(GameAction::Naval(NavalAction::RandomizeFleet))
        );
    }

    #[test]
    fn test_hard_bot_follows_up_a_hit() {
        let mut battle = NavalBattle::new(6, 6, vec![ShipSpec::new("Cruiser", 3)]);
        battle
            .place_ship(Seat::One, 0, Coord::new(0, 0), true)
            .unwrap();
        battle
            .place_ship(Seat::Two, 0, Coord::new(3, 2), true)
            .unwrap();
        battle.attack(Seat::One, Coord::new(5, 5)).unwrap();
        battle.attack(Seat::Two, Coord::new(0, 0)).unwrap();
        battle.attack(Seat::One, Coord::new(5, 4)).unwrap();

        let mut bot = Bot::with_seed(Seat::Two, BotDifficulty::Hard, 21);
        let Some(GameAction::Naval(NavalAction::Attack { target })) =
            bot.choose_action(&Engine::Naval(battle))
        else {
            panic!("expected an attack");
        };
        assert!([Coord::new(1, 0), Coord::new(0, 1)].contains(&target));
    }

    #[test]
    fn test_medium_bot_asks_for_biggest_set() {
        let one = vec![
            Card::new(Rank::new(4).unwrap(), Suit::Spades),
            Card::new(Rank::new(9).unwrap(), Suit::Spades),
            Card::new(Rank::new(9).unwrap(), Suit::Hearts),
        ];
        let two = vec![Card::new(Rank::new(2).unwrap(), Suit::Clubs)];
        let deck: Vec<Card> = standard_deck()
            .into_iter()
            .filter(|c| !one.contains(c) && !two.contains(c))
            .collect();
        let game = GoFish::from_parts(deck, [one, two], [Vec::new(), Vec::new()], 6).unwrap();

        let mut bot = Bot::with_seed(Seat::One, BotDifficulty::Medium, 2);
        assert_eq!(
            bot.choose_action(&Engine::GoFish(game)),
            Some(GameAction::GoFish(GoFishAction::Ask {
                rank: Rank::new(9).unwrap()
            }))
        );
    }

    #[test]
    fn test_backgammon_bot_rolls_first() {
        let engine = Engine::Backgammon(Backgammon::new());
        let mut bot = Bot::with_seed(Seat::One, BotDifficulty::Hard, 5);
        assert_eq!(
            bot.choose_action(&engine),
            Some(GameAction::Backgammon(BackgammonAction::Roll))
        );
    }

    #[test]
    fn test_speed_bot_plays_first_match() {
        // Scripted zeros deal seat one an ace onto a king in the center
        let game = Speed::new(&mut ScriptedRandom::new(vec![0]), &Default::default());
        let engine = Engine::Speed(game);
        let mut bot = Bot::with_seed(Seat::One, BotDifficulty::Medium, 8);
        assert_eq!(
            bot.choose_action(&engine),
            Some(GameAction::Speed(SpeedAction::Play {
                hand_index: 0,
                pile: 1
            }))
        );
        // Seat two holds nothing playable while seat one does
        let mut other = Bot::with_seed(Seat::Two, BotDifficulty::Medium, 8);
        assert_eq!(other.choose_action(&engine), None);
    }
}
