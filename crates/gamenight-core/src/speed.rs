//! Speed.
//!
//! Both seats play at the same time onto two shared center piles. A card is
//! playable when its rank is one away from the pile's top card, with king and
//! ace adjacent. The first seat to run out of hand and private pile wins; if
//! the time budget runs out first, the seat with fewer cards left wins.

use crate::actions::GameEvent;
use crate::cards::Rank;
use crate::config::SpeedConfig;
use crate::error::GameError;
use crate::player::{EndReason, GameResult, Outcome, Seat};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speed {
    hands: [Vec<Rank>; 2],
    piles: [Vec<Rank>; 2],
    /// Center piles; the last card is the one showing
    center: [Vec<Rank>; 2],
    /// Undealt cards used to turn fresh center cards
    reserve: Vec<Rank>,
    pub remaining_seconds: u32,
    result: Option<GameResult>,
}

impl Speed {
    /// Shuffle a rank-only deck, deal both halves and seed the center piles
    pub fn new<R: RandomSource>(rng: &mut R, config: &SpeedConfig) -> Self {
        let mut deck: Vec<Rank> = Rank::all().flat_map(|r| [r; 4]).collect();
        rng.shuffle(&mut deck);

        // Leave at least the two center cards undealt
        let pile_size = config.pile_size.clamp(1, (DECK_SIZE - 2) / 2);
        let hand_size = config.hand_size.clamp(1, pile_size);

        let deal = |deck: &mut Vec<Rank>| {
            let mut cards: Vec<Rank> = deck.drain(..pile_size).collect();
            let pile = cards.split_off(hand_size);
            (cards, pile)
        };
        let (hand_one, pile_one) = deal(&mut deck);
        let (hand_two, pile_two) = deal(&mut deck);

        let mut reserve = deck;
        let center = [
            reserve.pop().into_iter().collect(),
            reserve.pop().into_iter().collect(),
        ];

        Self {
            hands: [hand_one, hand_two],
            piles: [pile_one, pile_two],
            center,
            reserve,
            remaining_seconds: config.time_budget_seconds,
            result: None,
        }
    }

    /// Arbitrary deal; the ranks across all piles must form a full deck
    pub fn from_parts(
        hands: [Vec<Rank>; 2],
        piles: [Vec<Rank>; 2],
        center: [Vec<Rank>; 2],
        reserve: Vec<Rank>,
        time_budget_seconds: u32,
    ) -> Result<Self, GameError> {
        if center.iter().any(Vec::is_empty) {
            return Err(GameError::illegal("both center piles need a card"));
        }
        let game = Self {
            hands,
            piles,
            center,
            reserve,
            remaining_seconds: time_budget_seconds,
            result: None,
        };
        game.verify_conservation()?;
        Ok(game)
    }

    pub fn hand(&self, seat: Seat) -> &[Rank] {
        &self.hands[seat.index()]
    }

    pub fn pile_size(&self, seat: Seat) -> usize {
        self.piles[seat.index()].len()
    }

    /// Card showing on center pile `pile`
    pub fn center_top(&self, pile: usize) -> Option<Rank> {
        self.center.get(pile).and_then(|p| p.last().copied())
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Cards `seat` still has to get rid of
    pub fn cards_left(&self, seat: Seat) -> usize {
        self.hands[seat.index()].len() + self.piles[seat.index()].len()
    }

    pub fn card_count(&self) -> usize {
        self.hands.iter().map(Vec::len).sum::<usize>()
            + self.piles.iter().map(Vec::len).sum::<usize>()
            + self.center.iter().map(Vec::len).sum::<usize>()
            + self.reserve.len()
    }

    /// Four of each rank, 52 in total
    pub fn verify_conservation(&self) -> Result<(), GameError> {
        let mut counts: BTreeMap<Rank, usize> = BTreeMap::new();
        let all = self
            .hands
            .iter()
            .chain(self.piles.iter())
            .chain(self.center.iter())
            .flatten()
            .chain(self.reserve.iter());
        for rank in all {
            *counts.entry(*rank).or_default() += 1;
        }
        if self.card_count() != DECK_SIZE || counts.values().any(|c| *c != 4) {
            return Err(GameError::InternalInvariantViolation(format!(
                "speed holds {} cards",
                self.card_count()
            )));
        }
        Ok(())
    }

    pub fn can_play(&self, seat: Seat, hand_index: usize, pile: usize) -> bool {
        match (self.hands[seat.index()].get(hand_index), self.center_top(pile)) {
            (Some(card), Some(top)) => card.is_adjacent(top),
            _ => false,
        }
    }

    /// All (hand index, pile) plays open to `seat`
    pub fn playable(&self, seat: Seat) -> Vec<(usize, usize)> {
        if self.is_finished() {
            return Vec::new();
        }
        (0..self.hands[seat.index()].len())
            .flat_map(|i| [(i, 0), (i, 1)])
            .filter(|(i, p)| self.can_play(seat, *i, *p))
            .collect()
    }

    pub fn play_card(
        &mut self,
        seat: Seat,
        hand_index: usize,
        pile: usize,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if pile > 1 {
            return Err(GameError::illegal(format!("no center pile {pile}")));
        }
        let Some(&card) = self.hands[seat.index()].get(hand_index) else {
            return Err(GameError::illegal(format!("no card at hand position {hand_index}")));
        };
        if !self.can_play(seat, hand_index, pile) {
            return Err(GameError::illegal(format!(
                "{card} does not follow {}",
                self.center_top(pile).map(|r| r.to_string()).unwrap_or_default()
            )));
        }

        let hand = &mut self.hands[seat.index()];
        hand.remove(hand_index);
        if let Some(replacement) = self.piles[seat.index()].pop() {
            hand.insert(hand_index, replacement);
        }
        self.center[pile].push(card);

        if self.cards_left(seat) == 0 {
            self.result = Some(GameResult::new(seat.win(), EndReason::CardsOut));
        }

        Ok(vec![GameEvent::CardPlayed {
            seat,
            rank: card,
            pile,
        }])
    }

    /// Turn a fresh card onto each center pile.
    ///
    /// Only allowed when neither seat can play. When the reserve runs short,
    /// the buried center cards go back under it.
    pub fn flip(&mut self) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        if Seat::BOTH.iter().any(|s| !self.playable(*s).is_empty()) {
            return Err(GameError::illegal("a card can still be played"));
        }

        if self.reserve.len() < 2 {
            let mut recycled = Vec::new();
            for pile in &mut self.center {
                let top = pile.pop();
                recycled.append(pile);
                pile.extend(top);
            }
            recycled.append(&mut self.reserve);
            self.reserve = recycled;
        }
        if self.reserve.len() < 2 {
            return Err(GameError::illegal("no cards left to flip"));
        }

        let mut top = [Rank::ACE; 2];
        for (pile, shown) in self.center.iter_mut().zip(top.iter_mut()) {
            if let Some(card) = self.reserve.pop() {
                pile.push(card);
                *shown = card;
            }
        }
        Ok(vec![GameEvent::CenterFlipped { top }])
    }

    /// Run the time budget down. The end condition is only evaluated here.
    pub fn tick(&mut self, seconds: u32) -> Vec<GameEvent> {
        if self.is_finished() {
            return Vec::new();
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(seconds);
        if self.remaining_seconds > 0 {
            return Vec::new();
        }

        let left_one = self.cards_left(Seat::One);
        let left_two = self.cards_left(Seat::Two);
        let winner = match left_one.cmp(&left_two) {
            std::cmp::Ordering::Less => Some(Seat::One),
            std::cmp::Ordering::Greater => Some(Seat::Two),
            std::cmp::Ordering::Equal => None,
        };
        self.result = Some(GameResult::new(
            Outcome::Timeout { winner },
            EndReason::TimeBudgetExpired,
        ));
        vec![GameEvent::TimeBudgetExpired]
    }

    pub fn resign(&mut self, seat: Seat) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        self.result = Some(GameResult::resignation(seat));
        Ok(vec![GameEvent::Resigned { seat }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeededRandom;

    fn r(n: u8) -> Rank {
        Rank::new(n).unwrap()
    }

    /// Every rank four times, minus the given cards
    fn rest_of_deck(used: &[Rank]) -> Vec<Rank> {
        let mut deck: Vec<Rank> = Rank::all().flat_map(|r| [r; 4]).collect();
        for card in used {
            let pos = deck.iter().position(|c| c == card).unwrap();
            deck.remove(pos);
        }
        deck
    }

    #[test]
    fn test_deal_layout() {
        let game = Speed::new(&mut SeededRandom::with_seed(1), &SpeedConfig::default());
        assert_eq!(game.hand(Seat::One).len(), 5);
        assert_eq!(game.pile_size(Seat::Two), 15);
        assert!(game.center_top(0).is_some() && game.center_top(1).is_some());
        assert_eq!(game.card_count(), 52);
        game.verify_conservation().unwrap();
    }

    #[test]
    fn test_king_to_ace_wraparound() {
        let used = [r(1), r(5), r(2), r(9), r(2), r(13), r(9)];
        let mut game = Speed::from_parts(
            [vec![r(1), r(5)], vec![r(2)]],
            [vec![r(9)], vec![r(2)]],
            [vec![r(13)], vec![r(9)]],
            rest_of_deck(&used),
            60,
        )
        .unwrap();

        assert!(game.can_play(Seat::One, 0, 0));
        game.play_card(Seat::One, 0, 0).unwrap();
        assert_eq!(game.center_top(0), Some(r(1)));
        // Replacement drawn into the same slot
        assert_eq!(game.hand(Seat::One), &[r(9), r(5)]);
        assert_eq!(game.card_count(), 52);
    }

    #[test]
    fn test_illegal_play_rejected() {
        let used = [r(5), r(13), r(9), r(2)];
        let mut game = Speed::from_parts(
            [vec![r(5)], vec![r(2)]],
            [Vec::new(), Vec::new()],
            [vec![r(13)], vec![r(9)]],
            rest_of_deck(&used),
            60,
        )
        .unwrap();
        let before = game.clone();
        assert!(matches!(
            game.play_card(Seat::One, 0, 1),
            Err(GameError::IllegalMove(_))
        ));
        assert!(game.play_card(Seat::One, 3, 0).is_err());
        assert_eq!(game, before);
    }

    #[test]
    fn test_emptying_hand_and_pile_wins() {
        let used = [r(8), r(3), r(7), r(7)];
        let mut game = Speed::from_parts(
            [vec![r(8)], vec![r(3)]],
            [Vec::new(), Vec::new()],
            [vec![r(7)], vec![r(7)]],
            rest_of_deck(&used),
            60,
        )
        .unwrap();
        game.play_card(Seat::One, 0, 1).unwrap();
        assert_eq!(
            game.result(),
            Some(GameResult::new(Outcome::Player1Win, EndReason::CardsOut))
        );
    }

    #[test]
    fn test_time_budget_only_at_tick() {
        let mut game = Speed::new(&mut SeededRandom::with_seed(2), &SpeedConfig::default());
        assert!(game.tick(59).is_empty());
        assert!(!game.is_finished());
        assert_eq!(game.tick(1), vec![GameEvent::TimeBudgetExpired]);
        let result = game.result().unwrap();
        assert_eq!(result.reason, EndReason::TimeBudgetExpired);
        assert_eq!(result.outcome, Outcome::Timeout { winner: None });
        assert!(game.tick(1).is_empty());
    }

    #[test]
    fn test_flip_only_when_stuck() {
        let used = [r(5), r(5), r(10), r(10)];
        let mut game = Speed::from_parts(
            [vec![r(5)], vec![r(5)]],
            [Vec::new(), Vec::new()],
            [vec![r(10)], vec![r(10)]],
            rest_of_deck(&used),
            60,
        )
        .unwrap();
        let events = game.flip().unwrap();
        assert!(matches!(events[0], GameEvent::CenterFlipped { .. }));
        assert_eq!(game.card_count(), 52);

        // Make a play available and flipping is refused
        let four = game.reserve.iter().position(|c| *c == r(4)).unwrap();
        let card = game.reserve.remove(four);
        game.center[0].push(card);
        assert!(game.flip().is_err());
    }
}
