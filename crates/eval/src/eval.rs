// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Poker hand evaluator.
//!
//! The evaluator ranks a hand into one of the ten standard Poker categories
//! and carries a kickers key so that any two hands of the same category are
//! totally ordered, with exact ties comparing equal.
use serde::{Deserialize, Serialize};
use std::fmt;

use railbird_cards::{Card, Rank};

/// The rank of a Poker hand.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HandRank {
    /// High card hand.
    HighCard,
    /// One pair hand.
    OnePair,
    /// Two pairs hand.
    TwoPair,
    /// Three of a kind hand.
    ThreeOfAKind,
    /// Straight hand.
    Straight,
    /// Flush hand.
    Flush,
    /// Full house hand.
    FullHouse,
    /// Four of a kind hand.
    FourOfAKind,
    /// Straight flush hand.
    StraightFlush,
    /// Royal flush hand.
    RoyalFlush,
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
            HandRank::RoyalFlush => "Royal Flush",
        };

        write!(f, "{label}")
    }
}

/// The value of an evaluated hand.
///
/// Values order first by [HandRank] and then by a kickers key, the key
/// holds the rank values that break ties within a category so that two
/// hands with the same category and kickers compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandValue {
    rank: HandRank,
    key: [u8; 5],
}

impl HandValue {
    /// Evaluates a hand of 2 to 7 cards.
    ///
    /// With 5 or more cards the value is the best 5 cards hand, with fewer
    /// cards only multiples and kickers are ranked.
    ///
    /// Panics if the hand has fewer than 2 or more than 7 cards.
    pub fn eval(cards: &[Card]) -> HandValue {
        assert!(
            (2..=7).contains(&cards.len()),
            "hand must have 2 to 7 cards"
        );

        if cards.len() < 5 {
            return eval_groups(cards);
        }

        // Evaluate every 5 cards hand and keep the best one.
        let n = cards.len();
        let mut best: Option<HandValue> = None;

        for a in 0..n - 4 {
            for b in a + 1..n - 3 {
                for c in b + 1..n - 2 {
                    for d in c + 1..n - 1 {
                        for e in d + 1..n {
                            let hand = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                            let hv = eval5(&hand);
                            if best.is_none_or(|best| hv > best) {
                                best = Some(hv);
                            }
                        }
                    }
                }
            }
        }

        best.expect("at least one 5 cards hand")
    }

    /// This hand category.
    pub fn rank(&self) -> HandRank {
        self.rank
    }
}

/// Returns the ids of all hands that are maximal under the hand order.
///
/// More than one id is returned on an exact tie, ids are returned in input
/// order. Returns an empty vector for an empty input.
pub fn winners<T: Clone>(hands: &[(T, HandValue)]) -> Vec<T> {
    let Some(best) = hands.iter().map(|(_, hv)| *hv).max() else {
        return Vec::new();
    };

    hands
        .iter()
        .filter(|(_, hv)| *hv == best)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Rank value used in kickers keys, deuce is 2 and ace is 14.
fn rank_value(rank: Rank) -> u8 {
    rank as u8 + 2
}

/// Evaluates a 5 cards hand.
fn eval5(cards: &[Card; 5]) -> HandValue {
    let mut ranks = cards.map(|c| c.rank());
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = cards.iter().all(|c| c.suit() == cards[0].suit());
    let straight_high = straight_high(&ranks);

    match (is_flush, straight_high) {
        (true, Some(Rank::Ace)) => HandValue {
            rank: HandRank::RoyalFlush,
            key: [0; 5],
        },
        (true, Some(high)) => HandValue {
            rank: HandRank::StraightFlush,
            key: key(&[high]),
        },
        (true, None) => HandValue {
            rank: HandRank::Flush,
            key: key(&ranks),
        },
        (false, Some(high)) => {
            // A straight flush is caught above, but a plain straight loses
            // to multiples only when they cannot exist (a straight has no
            // duplicate ranks), so this is final.
            HandValue {
                rank: HandRank::Straight,
                key: key(&[high]),
            }
        }
        (false, None) => eval_groups(cards),
    }
}

/// Ranks a hand on rank multiples and kickers.
fn eval_groups(cards: &[Card]) -> HandValue {
    // Group ranks by count, highest count first then highest rank.
    let mut groups: Vec<(u8, Rank)> = Vec::with_capacity(cards.len());
    for card in cards {
        match groups.iter_mut().find(|(_, r)| *r == card.rank()) {
            Some((count, _)) => *count += 1,
            None => groups.push((1, card.rank())),
        }
    }

    groups.sort_unstable_by(|a, b| b.cmp(a));

    let rank = match (groups[0].0, groups.get(1).map(|g| g.0).unwrap_or(0)) {
        (4, _) => HandRank::FourOfAKind,
        (3, 2) => HandRank::FullHouse,
        (3, _) => HandRank::ThreeOfAKind,
        (2, 2) => HandRank::TwoPair,
        (2, _) => HandRank::OnePair,
        _ => HandRank::HighCard,
    };

    let ranks = groups.iter().map(|(_, r)| *r).collect::<Vec<_>>();

    HandValue {
        rank,
        key: key(&ranks),
    }
}

/// Builds a kickers key from ranks in significance order.
fn key(ranks: &[Rank]) -> [u8; 5] {
    let mut key = [0; 5];
    for (k, rank) in key.iter_mut().zip(ranks) {
        *k = rank_value(*rank);
    }
    key
}

/// Returns the high card of a straight for 5 distinct consecutive ranks.
///
/// The ace plays low in the 5-4-3-2-A wheel whose high card is the five.
fn straight_high(ranks: &[Rank; 5]) -> Option<Rank> {
    if ranks.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }

    if ranks
        .windows(2)
        .all(|w| rank_value(w[0]) == rank_value(w[1]) + 1)
    {
        return Some(ranks[0]);
    }

    // The wheel, ranks are sorted descending so the ace comes first.
    if ranks == &[Rank::Ace, Rank::Five, Rank::Four, Rank::Trey, Rank::Deuce] {
        return Some(Rank::Five);
    }

    None
}
