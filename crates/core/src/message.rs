// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Type definitions for room and game views and events.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::poker::{Card, Chips, HandRank, PlayerId, RoomId};

/// A Player action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Player folds.
    Fold,
    /// Player checks.
    Check,
    /// Player calls.
    Call,
    /// Player bets.
    Bet,
    /// Player raises.
    Raise,
    /// Player moves all in.
    AllIn,
}

impl PlayerAction {
    /// The action label.
    pub fn label(&self) -> &'static str {
        match self {
            PlayerAction::Fold => "FOLD",
            PlayerAction::Check => "CHECK",
            PlayerAction::Call => "CALL",
            PlayerAction::Bet => "BET",
            PlayerAction::Raise => "RAISE",
            PlayerAction::AllIn => "ALL IN",
        }
    }
}

/// The status of a room.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    /// The room is waiting for players to get ready.
    Waiting,
    /// A hand is being played.
    Playing,
}

/// A room summary for room listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// The room id.
    pub room_id: RoomId,
    /// The room name.
    pub name: String,
    /// The number of seats in the room.
    pub max_players: usize,
    /// The big blind for the room games.
    pub min_bet: Chips,
    /// The room status.
    pub status: RoomStatus,
    /// The number of players in the room.
    pub player_count: usize,
}

/// A seat in a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatView {
    /// The seat position.
    pub position: usize,
    /// The player sitting at this seat, if any.
    pub player_id: Option<PlayerId>,
}

/// A player state snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    /// The player id.
    pub player_id: PlayerId,
    /// The player nickname.
    pub nickname: String,
    /// The player chips stack.
    pub chips: Chips,
    /// The player seat, if seated.
    pub seat: Option<usize>,
    /// The player is ready to start a hand.
    pub is_ready: bool,
    /// The player is dealt in the current hand.
    pub is_active: bool,
    /// The player folded in the current hand.
    pub has_folded: bool,
    /// The player is all in.
    pub is_all_in: bool,
    /// The player bet in the current betting round.
    pub round_bet: Chips,
}

/// A betting street.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Street {
    /// Before any community cards.
    Preflop,
    /// The first three community cards.
    Flop,
    /// The fourth community card.
    Turn,
    /// The fifth community card.
    River,
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let street = match self {
            Street::Preflop => "preflop",
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
        };
        write!(f, "{street}")
    }
}

/// A game state snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    /// The current betting street.
    pub street: Street,
    /// The community cards dealt so far.
    pub community_cards: Vec<Card>,
    /// The total chips in play across all pots.
    pub pot: Chips,
    /// The bet to match in the current betting round.
    pub current_bet: Chips,
    /// The big blind.
    pub min_bet: Chips,
    /// The dealer seat.
    pub dealer: usize,
    /// The small blind seat.
    pub small_blind: usize,
    /// The big blind seat.
    pub big_blind: usize,
    /// The player to act, none once betting is over.
    pub current_turn: Option<PlayerId>,
}

/// How a share of the pot was won.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinCategory {
    /// Won at showdown with the given hand rank.
    Hand(HandRank),
    /// Won because everyone else folded.
    LastPlayerStanding,
}

impl fmt::Display for WinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinCategory::Hand(rank) => write!(f, "{rank}"),
            WinCategory::LastPlayerStanding => write!(f, "Last Player Standing"),
        }
    }
}

/// A payoff for one hand winner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandPayoff {
    /// The winning player.
    pub player_id: PlayerId,
    /// How the pot share was won.
    pub category: WinCategory,
    /// The winning cards, empty when the hand ended without a showdown.
    pub cards: Vec<Card>,
    /// The chips won.
    pub chips: Chips,
}

/// An event emitted by a room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A room snapshot for the player who joined.
    RoomJoined {
        /// The room summary.
        info: RoomInfo,
        /// The players in the room.
        players: Vec<PlayerView>,
        /// The room seats.
        seats: Vec<SeatView>,
        /// The game snapshot when a hand is being played.
        game: Option<GameView>,
    },
    /// The room summary changed.
    RoomUpdated(RoomInfo),
    /// A player joined the room.
    PlayerJoined {
        /// The player id.
        player_id: PlayerId,
        /// The player nickname.
        nickname: String,
    },
    /// A player left the room.
    PlayerLeft(PlayerId),
    /// A seat changed occupancy.
    SeatUpdated(SeatView),
    /// A player state changed.
    PlayerUpdated(PlayerView),
    /// A hand started.
    GameStarted {
        /// The initial game snapshot.
        game: GameView,
        /// The players dealt in, in acting order.
        players: Vec<PlayerId>,
    },
    /// Deal hole cards to a player.
    HoleCards(Card, Card),
    /// Community cards were dealt.
    CommunityCards {
        /// The street the cards belong to.
        street: Street,
        /// All community cards dealt so far.
        cards: Vec<Card>,
    },
    /// The turn moved to another player.
    TurnChanged {
        /// The player to act.
        player_id: PlayerId,
        /// The chips needed to call.
        to_call: Chips,
        /// The seconds the player has to act.
        timeout_secs: u64,
    },
    /// A player action was applied.
    ActionApplied {
        /// The acting player.
        player_id: PlayerId,
        /// The applied action.
        action: PlayerAction,
        /// The player total bet in this round after the action.
        bet: Chips,
    },
    /// The pot changed.
    PotUpdated(Chips),
    /// The hand ended with the winners payoffs.
    RoundEnded(Vec<HandPayoff>),
    /// The game is over and the room is back to waiting.
    GameEnded,
}

/// The recipients of an outgoing event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// A single player.
    Player(PlayerId),
}

/// An event with its recipients.
#[derive(Clone, Debug, PartialEq)]
pub struct Outgoing {
    /// The event recipients.
    pub to: Recipient,
    /// The event.
    pub event: Event,
}

impl Outgoing {
    /// Creates an event for every player in the room.
    pub fn all(event: Event) -> Self {
        Self {
            to: Recipient::All,
            event,
        }
    }

    /// Creates an event for a single player.
    pub fn player(player_id: PlayerId, event: Event) -> Self {
        Self {
            to: Recipient::Player(player_id),
            event,
        }
    }
}
