// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Railbird Poker game server.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod config;
mod game;
pub mod lobby;
pub mod room;

pub use config::Config;
pub use lobby::Lobby;
pub use room::Room;
