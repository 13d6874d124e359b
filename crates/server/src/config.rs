// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Server configuration.
use std::time::Duration;

use railbird_core::poker::Chips;

/// The game server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The chips stack given to a player who joins a room.
    pub starting_chips: Chips,
    /// How long a player has to act before the room acts for them.
    pub turn_timeout: Duration,
    /// The room task timer resolution.
    pub tick: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            starting_chips: Chips::new(1_000),
            turn_timeout: Duration::from_secs(30),
            tick: Duration::from_millis(500),
        }
    }
}
