// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Railbird Poker cards types.
//!
//! This crate defines the [Card], [Rank] and [Suit] value types:
//!
//! ```
//! # use railbird_cards::{Card, Rank, Suit};
//! let ah = Card::new(Rank::Ace, Suit::Hearts);
//! let kd = Card::new(Rank::King, Suit::Diamonds);
//! assert!(ah.rank() > kd.rank());
//! ```
//!
//! and a [Deck] type that enumerates all 52 cards and deals them from the
//! top after a uniform Fisher-Yates shuffle:
//!
//! ```
//! # use railbird_cards::Deck;
//! let mut deck = Deck::new_and_shuffled(&mut rand::rng());
//! let card = deck.deal().unwrap();
//! assert_eq!(deck.count(), Deck::SIZE - 1);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod deck;
pub use deck::{Card, Deck, Rank, Suit};
