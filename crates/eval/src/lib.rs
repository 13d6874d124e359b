// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Railbird Poker hand evaluator.
//!
//! Poker hand evaluator for 2 to 7 cards hands. With 5 or more cards the
//! evaluator ranks the best 5 cards hand, with fewer cards it ranks on
//! multiples and kickers only.
//!
//! To use the evaluator create a hand and use [HandValue] to evaluate the
//! hand and get its rank:
//!
//! ```
//! # use railbird_eval::*;
//! // 2H, 3H, .., JH
//! let cards = Deck::default().into_iter().take(10).collect::<Vec<_>>();
//! let v1 = HandValue::eval(&cards[0..5]);
//! let v2 = HandValue::eval(&cards[5..]);
//! assert!(v2 > v1);
//! ```
//!
//! [HandValue] implements a total order, two hands with the same category
//! and the same kickers compare equal, so exact ties are detected and
//! [winners] returns every maximal hand.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
pub mod eval;
pub use eval::{HandRank, HandValue, winners};

// Reexport cards types.
pub use railbird_cards::{Card, Deck, Rank, Suit};
