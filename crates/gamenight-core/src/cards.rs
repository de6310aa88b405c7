//! Playing cards shared by Go Fish and Speed.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Card rank, ace (1) through king (13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rank(u8);

impl Rank {
    pub const ACE: Rank = Rank(1);
    pub const KING: Rank = Rank(13);

    pub fn new(value: u8) -> Option<Rank> {
        (1..=13).contains(&value).then_some(Rank(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Every rank, ace first
    pub fn all() -> impl Iterator<Item = Rank> {
        (1..=13).map(Rank)
    }

    /// Ranks one apart, with king and ace adjacent
    pub fn is_adjacent(&self, other: Rank) -> bool {
        let diff = self.0.abs_diff(other.0);
        diff == 1 || diff == 12
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            1 => write!(f, "A"),
            11 => write!(f, "J"),
            12 => write!(f, "Q"),
            13 => write!(f, "K"),
            n => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suit = match self.suit {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
        };
        write!(f, "{}{}", self.rank, suit)
    }
}

/// The 52 distinct cards, unshuffled
pub fn standard_deck() -> Vec<Card> {
    Rank::all()
        .flat_map(|rank| Suit::ALL.into_iter().map(move |suit| Card::new(rank, suit)))
        .collect()
}

/// A shuffled 52-card deck
pub fn shuffled_deck<R: RandomSource>(rng: &mut R) -> Vec<Card> {
    let mut deck = standard_deck();
    rng.shuffle(&mut deck);
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_deck_unique() {
        let deck = standard_deck();
        assert_eq!(deck.len(), 52);
        assert_eq!(deck.iter().collect::<HashSet<_>>().len(), 52);
    }

    #[test]
    fn test_rank_adjacency_wraps() {
        assert!(Rank::KING.is_adjacent(Rank::ACE));
        assert!(Rank::ACE.is_adjacent(Rank::KING));
        assert!(Rank::new(6).unwrap().is_adjacent(Rank::new(7).unwrap()));
        assert!(!Rank::new(6).unwrap().is_adjacent(Rank::new(8).unwrap()));
        assert!(!Rank::new(5).unwrap().is_adjacent(Rank::new(5).unwrap()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Card::new(Rank::ACE, Suit::Spades).to_string(), "A♠");
        assert_eq!(Rank::new(10).unwrap().to_string(), "10");
        assert!(Rank::new(0).is_none());
        assert!(Rank::new(14).is_none());
    }
}
