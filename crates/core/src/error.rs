// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Game error definitions.
use thiserror::Error;

use crate::poker::{Chips, RoomId};

/// An error returned by a room or game operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The room does not exist.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),
    /// No hand is being played.
    #[error("no game in progress")]
    GameNotFound,
    /// The player is not a member of the room.
    #[error("player is not in the room")]
    PlayerNotInRoom,
    /// The room configuration is invalid.
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),
    /// Every seat in the room is taken.
    #[error("the room is full")]
    RoomFull,
    /// The seat does not exist in this room.
    #[error("seat {0} does not exist")]
    InvalidSeat(usize),
    /// The seat is taken by another player.
    #[error("seat {0} is occupied")]
    SeatOccupied(usize),
    /// The operation is not allowed while a hand is being played.
    #[error("a game is in progress")]
    GameInProgress,
    /// Not enough seated players to start a hand.
    #[error("not enough players to start a game")]
    NotEnoughPlayers,
    /// The player acted out of turn.
    #[error("it is not your turn")]
    NotYourTurn,
    /// The player cannot check a live bet.
    #[error("cannot check, there is a bet of {0}")]
    CannotCheck(Chips),
    /// The player cannot bet when there is a live bet.
    #[error("cannot bet, there is already a bet of {0}")]
    CannotBet(Chips),
    /// The player cannot raise without a live bet.
    #[error("cannot raise, there is no bet to raise")]
    CannotRaise,
    /// The bet or raise is below the minimum.
    #[error("amount {amount} is below the minimum of {min}")]
    BelowMinimum {
        /// The offered amount.
        amount: Chips,
        /// The minimum legal amount.
        min: Chips,
    },
    /// The player does not have enough chips.
    #[error("not enough chips, needed {needed} but have {chips}")]
    InsufficientChips {
        /// The chips needed for the action.
        needed: Chips,
        /// The player chips.
        chips: Chips,
    },
    /// The player has no chips left to move all in.
    #[error("no chips left")]
    NoChips,
    /// The player must be seated for this operation.
    #[error("player is not seated")]
    MustBeSeated,
    /// The player cannot stand up while dealt in a hand.
    #[error("cannot stand up during an active hand")]
    CannotStandUp,
    /// The deck ran out of cards.
    #[error("the deck is exhausted")]
    DeckExhausted,
}

/// A game result.
pub type Result<T> = std::result::Result<T, Error>;
