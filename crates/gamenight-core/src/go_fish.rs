//! Go Fish.
//!
//! Seats take turns asking the other seat for a rank they hold. A hit moves
//! every card of that rank to the asker, who keeps the turn; a miss sends the
//! asker fishing in the deck and passes the turn. Four of a kind in a hand is
//! laid down as a book immediately.

use crate::actions::GameEvent;
use crate::cards::{shuffled_deck, Card, Rank};
use crate::error::GameError;
use crate::player::{EndReason, GameResult, Outcome, Seat};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const DECK_SIZE: usize = 52;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoFish {
    deck: Vec<Card>,
    hands: [Vec<Card>; 2],
    books: [Vec<Rank>; 2],
    pub current_player: Seat,
    books_to_finish: usize,
    result: Option<GameResult>,
}

impl GoFish {
    /// Shuffle and deal `hand_size` cards to each seat
    pub fn new<R: RandomSource>(rng: &mut R, hand_size: usize, books_to_finish: usize) -> Self {
        let mut deck = shuffled_deck(rng);
        let hand_size = hand_size.min(DECK_SIZE / 2 - 1);
        // The deck is drawn from the back
        let first: Vec<Card> = deck.drain(..hand_size).collect();
        let second: Vec<Card> = deck.drain(..hand_size).collect();

        let mut game = Self {
            deck,
            hands: [first, second],
            books: [Vec::new(), Vec::new()],
            current_player: Seat::One,
            books_to_finish,
            result: None,
        };
        game.settle_deal();
        game
    }

    /// Arbitrary deal. The cards across deck, hands and books must be the 52
    /// distinct cards.
    pub fn from_parts(
        deck: Vec<Card>,
        hands: [Vec<Card>; 2],
        books: [Vec<Rank>; 2],
        books_to_finish: usize,
    ) -> Result<Self, GameError> {
        let game = Self {
            deck,
            hands,
            books,
            current_player: Seat::One,
            books_to_finish,
            result: None,
        };
        game.verify_conservation()?;
        Ok(game)
    }

    pub fn hand(&self, seat: Seat) -> &[Card] {
        &self.hands[seat.index()]
    }

    pub fn books(&self, seat: Seat) -> &[Rank] {
        &self.books[seat.index()]
    }

    pub fn deck_size(&self) -> usize {
        self.deck.len()
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

    /// Total cards across deck, hands and books
    pub fn card_count(&self) -> usize {
        self.deck.len()
            + self.hands.iter().map(Vec::len).sum::<usize>()
            + self.books.iter().map(|b| b.len() * 4).sum::<usize>()
    }

    /// Every card is in exactly one place
    pub fn verify_conservation(&self) -> Result<(), GameError> {
        let mut seen = HashSet::new();
        let all_unique = self
            .deck
            .iter()
            .chain(self.hands.iter().flatten())
            .all(|card| seen.insert(*card));
        let books_unique = {
            let mut ranks = HashSet::new();
            self.books.iter().flatten().all(|rank| ranks.insert(*rank))
                && self
                    .books
                    .iter()
                    .flatten()
                    .all(|rank| !seen.iter().any(|c: &Card| c.rank == *rank))
        };
        if !all_unique || !books_unique || self.card_count() != DECK_SIZE {
            return Err(GameError::InternalInvariantViolation(format!(
                "go fish holds {} cards",
                self.card_count()
            )));
        }
        Ok(())
    }

    /// Ranks `seat` may ask for
    pub fn askable_ranks(&self, seat: Seat) -> Vec<Rank> {
        let mut ranks: Vec<Rank> = self.hands[seat.index()].iter().map(|c| c.rank).collect();
        ranks.sort_unstable();
        ranks.dedup();
        ranks
    }

    /// The current seat asks the other seat for `rank`
    pub fn ask_for_rank(&mut self, rank: Rank) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::AlreadyResolved);
        }
        let asker = self.current_player;
        let opponent = asker.other();
        if !self.hands[asker.index()].iter().any(|c| c.rank == rank) {
            return Err(GameError::illegal(format!("you hold no {rank}s to ask for")));
        }

        let mut events = Vec::new();
        let (taken, kept): (Vec<Card>, Vec<Card>) = self.hands[opponent.index()]
            .iter()
            .partition(|c| c.rank == rank);

        if !taken.is_empty() {
            self.hands[opponent.index()] = kept;
            events.push(GameEvent::CardsTransferred {
                from: opponent,
                to: asker,
                rank,
                count: taken.len(),
            });
            self.hands[asker.index()].extend(taken);
            events.extend(self.collect_books(asker));
        } else {
            let drawn = self.deck.pop();
            events.push(GameEvent::WentFishing {
                seat: asker,
                drew: drawn.is_some(),
            });
            if let Some(card) = drawn {
                self.hands[asker.index()].push(card);
                events.extend(self.collect_books(asker));
            }
            self.current_player = opponent;
            events.push(GameEvent::TurnPassed { next: opponent });
        }

        for seat in Seat::BOTH {
            events.extend(self.refill_if_empty(seat));
        }
        self.verify_conservation()?;
        self.check_finished();
        Ok(events)
    }

    /// Lay down every rank `seat` holds all four of
    fn collect_books(&mut self, seat: Seat) -> Vec<GameEvent> {
        let mut counts: BTreeMap<Rank, usize> = BTreeMap::new();
        for card in &self.hands[seat.index()] {
            *counts.entry(card.rank).or_default() += 1;
        }

        let mut events = Vec::new();
        for (rank, count) in counts {
            if count == 4 {
                self.hands[seat.index()].retain(|c| c.rank != rank);
                self.books[seat.index()].push(rank);
                events.push(GameEvent::BookCompleted { seat, rank });
            }
        }
        events
    }

    /// Books dealt whole leave the hand; a hand emptied that way draws
    fn settle_deal(&mut self) {
        for seat in Seat::BOTH {
            self.collect_books(seat);
        }
        for seat in Seat::BOTH {
            self.refill_if_empty(seat);
        }
        self.check_finished();
    }

    fn refill_if_empty(&mut self, seat: Seat) -> Vec<GameEvent> {
        if !self.hands[seat.index()].is_empty() {
            return Vec::new();
        }
        match self.deck.pop() {
            Some(card) => {
                self.hands[seat.index()].push(card);
                self.collect_books(seat)
            }
            None => Vec::new(),
        }
    }

    fn check_finished(&mut self) {
        let books_one = self.books[0].len();
        let books_two = self.books[1].len();
        let reason = if books_one + books_two >= self.books_to_finish {
            EndReason::BooksComplete
        } else if self.deck.is_empty() {
            EndReason::DeckExhausted
        } else {
            return;
        };

        let outcome = match books_one.cmp(&books_two) {
            std::cmp::Ordering::Greater => Outcome::Player1Win,
            std::cmp::Ordering::Less => Outcome::Player2Win,
            std::cmp::Ordering::Equal => Outcome::Draw,
        };
        self.result = Some(GameResult::new(outcome, reason));
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
    use crate::cards::{standard_deck, Suit};
    use crate::rng::SeededRandom;

    fn rank(n: u8) -> Rank {
        Rank::new(n).unwrap()
    }

    /// Seat one: three 7s and a 2; seat two: the last 7 and a 3
    fn sevens_deal() -> GoFish {
        let one = vec![
            Card::new(rank(7), Suit::Spades),
            Card::new(rank(7), Suit::Hearts),
            Card::new(rank(7), Suit::Diamonds),
            Card::new(rank(2), Suit::Spades),
        ];
        let two = vec![
            Card::new(rank(7), Suit::Clubs),
            Card::new(rank(3), Suit::Spades),
        ];
        let deck: Vec<Card> = standard_deck()
            .into_iter()
            .filter(|c| !one.contains(c) && !two.contains(c))
            .collect();
        GoFish::from_parts(deck, [one, two], [Vec::new(), Vec::new()], 6).unwrap()
    }

    #[test]
    fn test_deal_conserves_cards() {
        let game = GoFish::new(&mut SeededRandom::with_seed(3), 7, 6);
        assert_eq!(game.card_count(), 52);
        assert_eq!(game.deck_size(), 38);
        game.verify_conservation().unwrap();
    }

    #[test]
    fn test_dealt_books_refill_empty_hand() {
        let one: Vec<Card> = Suit::ALL.iter().map(|s| Card::new(rank(5), *s)).collect();
        let two = vec![Card::new(rank(9), Suit::Clubs)];
        let deck: Vec<Card> = standard_deck()
            .into_iter()
            .filter(|c| !one.contains(c) && !two.contains(c))
            .collect();
        let top = *deck.last().unwrap();
        let mut game = GoFish::from_parts(deck, [one, two], [Vec::new(), Vec::new()], 6).unwrap();

        game.settle_deal();
        assert_eq!(game.books(Seat::One), &[rank(5)]);
        assert_eq!(game.hand(Seat::One), &[top]);
        assert_eq!(game.deck_size(), 46);
        assert!(!game.is_finished());
        assert!(!game.askable_ranks(Seat::One).is_empty());
        assert_eq!(game.card_count(), 52);
    }

    #[test]
    fn test_transfer_completes_book() {
        let mut game = sevens_deal();
        let events = game.ask_for_rank(rank(7)).unwrap();
        assert_eq!(
            events,
            vec![
                GameEvent::CardsTransferred {
                    from: Seat::Two,
                    to: Seat::One,
                    rank: rank(7),
                    count: 1
                },
                GameEvent::BookCompleted {
                    seat: Seat::One,
                    rank: rank(7)
                },
            ]
        );
        assert_eq!(game.books(Seat::One), &[rank(7)]);
        assert!(game.hand(Seat::One).iter().all(|c| c.rank != rank(7)));
        // A successful ask keeps the turn
        assert_eq!(game.current_player, Seat::One);
        assert_eq!(game.card_count(), 52);
    }

    #[test]
    fn test_miss_goes_fishing_and_passes() {
        let mut game = sevens_deal();
        let deck_before = game.deck_size();
        let events = game.ask_for_rank(rank(2)).unwrap();
        assert_eq!(events[0], GameEvent::WentFishing { seat: Seat::One, drew: true });
        assert_eq!(game.deck_size(), deck_before - 1);
        assert_eq!(game.current_player, Seat::Two);
    }

    #[test]
    fn test_cannot_ask_for_unheld_rank() {
        let mut game = sevens_deal();
        let before = game.clone();
        assert!(matches!(
            game.ask_for_rank(rank(9)),
            Err(GameError::IllegalMove(_))
        ));
        assert_eq!(game, before);
    }

    #[test]
    fn test_book_from_partial_transfer() {
        let mut game = sevens_deal();
        // Seat one now holds two sevens and gets the other two in one transfer
        let moved = game.hands[0].remove(0);
        game.hands[1].push(moved);
        game.ask_for_rank(rank(7)).unwrap();
        assert_eq!(game.books(Seat::One), &[rank(7)]);
    }

    #[test]
    fn test_deck_exhaustion_ends_game() {
        let one = vec![Card::new(rank(1), Suit::Spades)];
        let two = vec![Card::new(rank(2), Suit::Spades)];
        let mut deck: Vec<Card> = standard_deck()
            .into_iter()
            .filter(|c| !one.contains(c) && !two.contains(c))
            .collect();
        // Pre-complete every rank still whole in the deck, leaving one card to draw
        let last = deck.pop().unwrap();
        let mut books_one = Vec::new();
        for r in Rank::all() {
            if deck.iter().filter(|c| c.rank == r).count() == 4 {
                books_one.push(r);
            }
        }
        deck.retain(|c| !books_one.contains(&c.rank));
        let mut hand_one = one;
        hand_one.extend(deck);
        let mut game =
            GoFish::from_parts(vec![last], [hand_one, two], [books_one, Vec::new()], 100)
                .unwrap();
        game.ask_for_rank(rank(1)).unwrap();
        let result = game.result().unwrap();
        assert_eq!(result.reason, EndReason::DeckExhausted);
        assert_eq!(result.outcome, Outcome::Player1Win);
    }
}
