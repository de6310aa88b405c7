//! Household points ledger.
//!
//! The ledger is the host's reward sink: the registry credits it once for
//! every finished session.

use gamenight_core::{GameType, RewardSink};
use std::collections::HashMap;
use tracing::info;

use crate::protocol::LedgerInfo;

#[derive(Debug, Default)]
pub struct PointsLedger {
    total: u64,
    by_game: HashMap<GameType, u64>,
    games_completed: usize,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn points_for(&self, game_type: GameType) -> u64 {
        self.by_game.get(&game_type).copied().unwrap_or(0)
    }

    pub fn games_completed(&self) -> usize {
        self.games_completed
    }

    pub fn to_info(&self) -> LedgerInfo {
        LedgerInfo {
            total: self.total,
            by_game: GameType::ALL
                .iter()
                .map(|game| (*game, self.points_for(*game)))
                .collect(),
            games_completed: self.games_completed,
        }
    }
}

impl RewardSink for PointsLedger {
    fn on_game_complete(&mut self, game_type: GameType, reward_points: u32) {
        let points = u64::from(reward_points);
        self.total += points;
        *self.by_game.entry(game_type).or_default() += points;
        self.games_completed += 1;
        info!(game = ?game_type, points, total = self.total, "Credited game reward");
    }
}
