// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Railbird Poker game types.
//!
//! This crate defines the types shared by the game engine and its clients,
//! the [poker] identifiers and chips amounts, the [message] views and
//! events, and the game [Error](error::Error) type.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
pub mod error;
pub mod message;
pub mod poker;
