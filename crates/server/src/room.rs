// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Room membership, seats, and ready state.
use rand::prelude::*;

use railbird_core::{
    error::{Error, Result},
    message::{Event, Outgoing, PlayerView, RoomInfo, RoomStatus, SeatView},
    poker::{Card, Chips, PlayerId, RoomId},
};

use crate::game::GameState;

/// The smallest number of seats a room can have.
pub const MIN_SEATS: usize = 2;

/// The largest number of seats a room can have.
pub const MAX_SEATS: usize = 9;

/// A player in a room.
#[derive(Debug)]
pub(crate) struct Player {
    pub(crate) player_id: PlayerId,
    pub(crate) nickname: String,
    pub(crate) chips: Chips,
    pub(crate) seat: Option<usize>,
    pub(crate) is_ready: bool,
    /// The player is dealt in the current hand and has not folded.
    pub(crate) is_active: bool,
    pub(crate) has_folded: bool,
    pub(crate) is_all_in: bool,
    pub(crate) hole_cards: Option<(Card, Card)>,
    /// The bet in the current betting round.
    pub(crate) round_bet: Chips,
    /// The chips committed across the whole hand, used to build the pots.
    pub(crate) total_bet: Chips,
}

impl Player {
    fn new(player_id: PlayerId, nickname: String, chips: Chips) -> Self {
        Self {
            player_id,
            nickname,
            chips,
            seat: None,
            is_ready: false,
            is_active: false,
            has_folded: false,
            is_all_in: false,
            hole_cards: None,
            round_bet: Chips::ZERO,
            total_bet: Chips::ZERO,
        }
    }

    /// Reset per hand state.
    pub(crate) fn reset_hand(&mut self) {
        self.is_ready = false;
        self.is_active = false;
        self.has_folded = false;
        self.is_all_in = false;
        self.hole_cards = None;
        self.round_bet = Chips::ZERO;
        self.total_bet = Chips::ZERO;
    }

    pub(crate) fn view(&self) -> PlayerView {
        PlayerView {
            player_id: self.player_id,
            nickname: self.nickname.clone(),
            chips: self.chips,
            seat: self.seat,
            is_ready: self.is_ready,
            is_active: self.is_active,
            has_folded: self.has_folded,
            is_all_in: self.is_all_in,
            round_bet: self.round_bet,
        }
    }
}

/// A Poker room.
///
/// A room owns its players, seats, and the state of the hand being played.
/// All operations are synchronous, they validate, mutate, and return the
/// events to deliver, leaving delivery to the room task.
#[derive(Debug)]
pub struct Room {
    room_id: RoomId,
    name: String,
    pub(crate) min_bet: Chips,
    starting_chips: Chips,
    pub(crate) turn_secs: u64,
    pub(crate) players: Vec<Player>,
    pub(crate) seats: Vec<Option<PlayerId>>,
    pub(crate) last_dealer: Option<usize>,
    pub(crate) game: Option<GameState>,
    pub(crate) rng: StdRng,
}

impl Room {
    /// Creates a new room.
    ///
    /// Returns an error if the name is empty, the number of seats is out of
    /// range, or the big blind is zero.
    pub fn new(
        name: &str,
        max_players: usize,
        min_bet: Chips,
        starting_chips: Chips,
        turn_secs: u64,
    ) -> Result<Self> {
        Self::with_rng(
            name,
            max_players,
            min_bet,
            starting_chips,
            turn_secs,
            StdRng::from_os_rng(),
        )
    }

    /// Creates a new room with user initialized randomness.
    pub fn with_rng(
        name: &str,
        max_players: usize,
        min_bet: Chips,
        starting_chips: Chips,
        turn_secs: u64,
        rng: StdRng,
    ) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidConfig("room name is empty".to_string()));
        }

        if !(MIN_SEATS..=MAX_SEATS).contains(&max_players) {
            return Err(Error::InvalidConfig(format!(
                "seats must be between {MIN_SEATS} and {MAX_SEATS}"
            )));
        }

        if min_bet == Chips::ZERO {
            return Err(Error::InvalidConfig("big blind is zero".to_string()));
        }

        Ok(Self {
            room_id: RoomId::new_id(),
            name: name.to_string(),
            min_bet,
            starting_chips,
            turn_secs,
            players: Vec::new(),
            seats: vec![None; max_players],
            last_dealer: None,
            game: None,
            rng,
        })
    }

    /// This room identifier.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// The big blind for this room games.
    pub fn min_bet(&self) -> Chips {
        self.min_bet
    }

    /// Checks if a hand is being played.
    pub fn is_playing(&self) -> bool {
        self.game.is_some()
    }

    /// Checks if the room has no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The room summary.
    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.name.clone(),
            max_players: self.seats.len(),
            min_bet: self.min_bet,
            status: if self.is_playing() {
                RoomStatus::Playing
            } else {
                RoomStatus::Waiting
            },
            player_count: self.players.len(),
        }
    }

    /// The players snapshots.
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    /// The seats snapshots.
    pub fn seat_views(&self) -> Vec<SeatView> {
        self.seats
            .iter()
            .enumerate()
            .map(|(position, player_id)| SeatView {
                position,
                player_id: *player_id,
            })
            .collect()
    }

    /// A player joins this room.
    ///
    /// Joining twice is a no-op, the player keeps its state. A player who
    /// joins gets the room starting stack.
    pub fn join(&mut self, player_id: PlayerId, nickname: &str) -> Result<Vec<Outgoing>> {
        if self.players.iter().any(|p| p.player_id == player_id) {
            return Ok(Vec::new());
        }

        if self.players.len() == self.seats.len() {
            return Err(Error::RoomFull);
        }

        self.players
            .push(Player::new(player_id, nickname.to_string(), self.starting_chips));

        Ok(vec![
            Outgoing::player(
                player_id,
                Event::RoomJoined {
                    info: self.info(),
                    players: self.player_views(),
                    seats: self.seat_views(),
                    game: self.game_view(),
                },
            ),
            Outgoing::all(Event::PlayerJoined {
                player_id,
                nickname: nickname.to_string(),
            }),
            Outgoing::all(Event::RoomUpdated(self.info())),
        ])
    }

    /// A player leaves this room.
    ///
    /// A player who leaves while dealt in the current hand folds first, its
    /// committed chips stay in the pot.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Vec<Outgoing>> {
        let mut events = Vec::new();

        let pos = self
            .players
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or(Error::PlayerNotInRoom)?;

        if self.players[pos].is_active && self.game.is_some() {
            events.extend(self.fold_for(player_id)?);
        }

        // Chips committed to the hand stay in the pot.
        let total_bet = self.player(player_id)?.total_bet;
        if let Some(game) = self.game.as_mut() {
            game.add_dead_chips(player_id, total_bet);
        }

        let player = self.players.remove(
            self.players
                .iter()
                .position(|p| p.player_id == player_id)
                .ok_or(Error::PlayerNotInRoom)?,
        );

        if let Some(seat) = player.seat {
            self.seats[seat] = None;
            events.push(Outgoing::all(Event::SeatUpdated(SeatView {
                position: seat,
                player_id: None,
            })));
        }

        events.push(Outgoing::all(Event::PlayerLeft(player_id)));
        events.push(Outgoing::all(Event::RoomUpdated(self.info())));

        Ok(events)
    }

    /// A player takes a seat.
    ///
    /// A seated player moving to another seat stands up first. Seats cannot
    /// change while a hand is being played.
    pub fn sit_down(&mut self, player_id: PlayerId, seat: usize) -> Result<Vec<Outgoing>> {
        if self.is_playing() {
            return Err(Error::GameInProgress);
        }

        if seat >= self.seats.len() {
            return Err(Error::InvalidSeat(seat));
        }

        let player = self.player(player_id)?;
        if self.seats[seat].is_some_and(|id| id != player_id) {
            return Err(Error::SeatOccupied(seat));
        }

        let mut events = Vec::new();

        if let Some(prev) = player.seat
            && prev != seat
        {
            self.seats[prev] = None;
            events.push(Outgoing::all(Event::SeatUpdated(SeatView {
                position: prev,
                player_id: None,
            })));
        }

        self.seats[seat] = Some(player_id);
        let player = self.player_mut(player_id)?;
        player.seat = Some(seat);

        events.push(Outgoing::all(Event::SeatUpdated(SeatView {
            position: seat,
            player_id: Some(player_id),
        })));
        events.push(Outgoing::all(Event::PlayerUpdated(
            self.player(player_id)?.view(),
        )));

        Ok(events)
    }

    /// A player stands up from its seat.
    ///
    /// Standing up clears the ready flag. A player dealt in the current
    /// hand cannot stand up, it has to fold or leave.
    pub fn stand_up(&mut self, player_id: PlayerId) -> Result<Vec<Outgoing>> {
        let player = self.player(player_id)?;
        let Some(seat) = player.seat else {
            return Err(Error::MustBeSeated);
        };

        if player.is_active && self.game.is_some() {
            return Err(Error::CannotStandUp);
        }

        self.seats[seat] = None;
        let player = self.player_mut(player_id)?;
        player.seat = None;
        player.is_ready = false;

        Ok(vec![
            Outgoing::all(Event::SeatUpdated(SeatView {
                position: seat,
                player_id: None,
            })),
            Outgoing::all(Event::PlayerUpdated(self.player(player_id)?.view())),
        ])
    }

    /// A player toggles its ready flag.
    ///
    /// Only seated players can get ready. The flag can change while a hand
    /// is being played, the next hand only starts once the room is back to
    /// waiting.
    pub fn set_ready(&mut self, player_id: PlayerId, ready: bool) -> Result<Vec<Outgoing>> {
        let player = self.player_mut(player_id)?;
        if player.seat.is_none() {
            return Err(Error::MustBeSeated);
        }

        player.is_ready = ready;

        Ok(vec![Outgoing::all(Event::PlayerUpdated(
            self.player(player_id)?.view(),
        ))])
    }

    /// Checks if a hand can start.
    ///
    /// A hand can start when at least two seated players with chips are
    /// ready and every seated player is ready.
    pub fn all_seated_ready(&self) -> bool {
        let seated = self
            .players
            .iter()
            .filter(|p| p.seat.is_some())
            .collect::<Vec<_>>();

        seated.iter().filter(|p| p.chips > Chips::ZERO).count() >= 2
            && seated.iter().all(|p| p.is_ready)
    }

    pub(crate) fn player(&self, player_id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.player_id == player_id)
            .ok_or(Error::PlayerNotInRoom)
    }

    pub(crate) fn player_mut(&mut self, player_id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.player_id == player_id)
            .ok_or(Error::PlayerNotInRoom)
    }
}
