// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Betting state machine for a room hand.
use ahash::{AHashMap, AHashSet};
use log::info;
use rand::Rng;

use railbird_core::{
    error::{Error, Result},
    message::{Event, GameView, HandPayoff, Outgoing, PlayerAction, Street, WinCategory},
    poker::{Card, Chips, Deck, HandValue, PlayerId},
};
use railbird_eval::winners;

use crate::room::{Player, Room};

/// The state of a hand being played.
#[derive(Debug)]
pub(crate) struct GameState {
    street: Street,
    deck: Deck,
    community: Vec<Card>,
    current_bet: Chips,
    /// Seat positions for the button and the blinds.
    dealer: usize,
    small_blind: usize,
    big_blind: usize,
    /// Players still in the hand, in acting order from the small blind.
    active: Vec<PlayerId>,
    /// Players who have acted since the last bet or raise.
    acted: AHashSet<PlayerId>,
    current_turn: Option<PlayerId>,
    /// Contributions of players who left mid hand, they stay in the pot.
    dead: Vec<(PlayerId, Chips)>,
}

impl GameState {
    /// Records the committed chips of a player who left the room.
    pub(crate) fn add_dead_chips(&mut self, player_id: PlayerId, chips: Chips) {
        if chips > Chips::ZERO {
            self.dead.push((player_id, chips));
        }
    }
}

/// A pot with the players eligible to win it.
#[derive(Debug, PartialEq)]
pub(crate) struct Pot {
    pub(crate) chips: Chips,
    pub(crate) eligible: Vec<PlayerId>,
}

impl Room {
    /// Starts a new hand.
    ///
    /// Requires at least two seated ready players with chips. The button
    /// moves to the next occupied seat, heads up the dealer posts the small
    /// blind and acts first preflop.
    pub fn start_hand(&mut self) -> Result<Vec<Outgoing>> {
        if self.game.is_some() {
            return Err(Error::GameInProgress);
        }

        // Participants in seat order, seated ready players with chips.
        let participants = self
            .seats
            .iter()
            .enumerate()
            .filter_map(|(seat, id)| id.map(|id| (seat, id)))
            .filter(|(_, id)| {
                self.players
                    .iter()
                    .any(|p| p.player_id == *id && p.is_ready && p.chips > Chips::ZERO)
            })
            .collect::<Vec<_>>();

        if participants.len() < 2 {
            return Err(Error::NotEnoughPlayers);
        }

        let n = participants.len();

        // On the first hand the button lands on a random participant, after
        // that it moves to the next occupied seat.
        let dealer_idx = match self.last_dealer {
            Some(last) => participants
                .iter()
                .position(|(seat, _)| *seat > last)
                .unwrap_or(0),
            None => self.rng.random_range(0..n),
        };

        let (sb_idx, bb_idx) = if n == 2 {
            (dealer_idx, (dealer_idx + 1) % n)
        } else {
            ((dealer_idx + 1) % n, (dealer_idx + 2) % n)
        };

        // Acting order starts at the small blind.
        let acting = (0..n)
            .map(|i| participants[(sb_idx + i) % n].1)
            .collect::<Vec<_>>();

        for player in &mut self.players {
            if acting.contains(&player.player_id) {
                player.is_active = true;
                player.has_folded = false;
                player.is_all_in = false;
                player.hole_cards = None;
                player.round_bet = Chips::ZERO;
                player.total_bet = Chips::ZERO;
            }
        }

        // Deal two cards to each player, one at a time round robin starting
        // from the small blind.
        let mut deck = Deck::new_and_shuffled(&mut self.rng);
        let mut first = Vec::with_capacity(n);
        for _ in &acting {
            first.push(deck.deal().ok_or(Error::DeckExhausted)?);
        }

        let mut dealt = Vec::with_capacity(n);
        for (i, id) in acting.iter().enumerate() {
            let second = deck.deal().ok_or(Error::DeckExhausted)?;
            let player = find_player_mut(&mut self.players, *id)?;
            player.hole_cards = Some((first[i], second));
            dealt.push((*id, first[i], second));
        }

        // Post the blinds, a short stack posts what it has and is all in.
        commit(
            find_player_mut(&mut self.players, acting[0])?,
            self.min_bet / 2,
        );
        let bb_posted = commit(find_player_mut(&mut self.players, acting[1])?, self.min_bet);
        let bb_id = acting[1];

        self.game = Some(GameState {
            street: Street::Preflop,
            deck,
            community: Vec::new(),
            // The bet to match is what the big blind actually posted.
            current_bet: bb_posted,
            dealer: participants[dealer_idx].0,
            small_blind: participants[sb_idx].0,
            big_blind: participants[bb_idx].0,
            active: acting.clone(),
            acted: AHashSet::new(),
            current_turn: None,
            dead: Vec::new(),
        });

        info!(
            "Room {} started a hand with {} players",
            self.room_id(),
            acting.len()
        );

        let mut events = vec![
            Outgoing::all(Event::RoomUpdated(self.info())),
            Outgoing::all(Event::GameStarted {
                game: self.game_view().ok_or(Error::GameNotFound)?,
                players: acting.clone(),
            }),
        ];

        for (id, c1, c2) in &dealt {
            events.push(Outgoing::player(*id, Event::HoleCards(*c1, *c2)));
        }

        for id in &acting {
            events.push(Outgoing::all(Event::PlayerUpdated(
                find_player(&self.players, *id)?.view(),
            )));
        }

        events.push(Outgoing::all(Event::PotUpdated(self.pot())));

        if self.round_complete() {
            // Blinds put everyone all in, run the hand out.
            self.advance_streets(&mut events)?;
        } else if let Some(next) = self.next_can_bet_after(bb_id) {
            self.set_turn(next, &mut events);
        }

        Ok(events)
    }

    /// Applies an action for the player whose turn it is.
    ///
    /// The amount is the total bet for the round, it is ignored for fold,
    /// check, and call. A call short of the current bet puts the player all
    /// in. Nothing changes when the action is rejected.
    pub fn apply_action(
        &mut self,
        player_id: PlayerId,
        action: PlayerAction,
        amount: Chips,
    ) -> Result<Vec<Outgoing>> {
        let game = self.game.as_ref().ok_or(Error::GameNotFound)?;
        if game.current_turn != Some(player_id) {
            return Err(Error::NotYourTurn);
        }

        let current_bet = game.current_bet;
        let min_bet = self.min_bet;
        let player = find_player(&self.players, player_id)?;
        let chips = player.chips;
        let round_bet = player.round_bet;
        let owed = current_bet - round_bet;

        // Validate and plan before any mutation.
        let (pay, reopen, applied) = match action {
            PlayerAction::Fold => {
                return self.fold_for(player_id);
            }
            PlayerAction::Check => {
                if owed > Chips::ZERO {
                    return Err(Error::CannotCheck(current_bet));
                }
                (Chips::ZERO, false, PlayerAction::Check)
            }
            PlayerAction::Call => {
                if owed == Chips::ZERO {
                    (Chips::ZERO, false, PlayerAction::Check)
                } else {
                    let pay = owed.min(chips);
                    let applied = if pay == chips {
                        PlayerAction::AllIn
                    } else {
                        PlayerAction::Call
                    };
                    (pay, false, applied)
                }
            }
            PlayerAction::Bet => {
                if current_bet > Chips::ZERO {
                    return Err(Error::CannotBet(current_bet));
                }
                if amount < min_bet {
                    return Err(Error::BelowMinimum {
                        amount,
                        min: min_bet,
                    });
                }
                if amount > chips {
                    return Err(Error::InsufficientChips {
                        needed: amount,
                        chips,
                    });
                }
                let applied = if amount == chips {
                    PlayerAction::AllIn
                } else {
                    PlayerAction::Bet
                };
                (amount, true, applied)
            }
            PlayerAction::Raise => {
                if current_bet == Chips::ZERO {
                    return Err(Error::CannotRaise);
                }
                if amount <= current_bet || amount - current_bet < min_bet {
                    return Err(Error::BelowMinimum {
                        amount,
                        min: current_bet + min_bet,
                    });
                }
                let pay = amount - round_bet;
                if pay > chips {
                    return Err(Error::InsufficientChips { needed: pay, chips });
                }
                let applied = if pay == chips {
                    PlayerAction::AllIn
                } else {
                    PlayerAction::Raise
                };
                (pay, true, applied)
            }
            PlayerAction::AllIn => {
                if chips == Chips::ZERO {
                    return Err(Error::NoChips);
                }
                (chips, round_bet + chips > current_bet, PlayerAction::AllIn)
            }
        };

        let player = find_player_mut(&mut self.players, player_id)?;
        commit(player, pay);
        let bet = player.round_bet;
        let view = player.view();

        let game = self.game.as_mut().ok_or(Error::GameNotFound)?;
        if reopen {
            game.current_bet = game.current_bet.max(bet);
            game.acted.clear();
        }
        game.acted.insert(player_id);

        let mut events = vec![
            Outgoing::all(Event::ActionApplied {
                player_id,
                action: applied,
                bet,
            }),
            Outgoing::all(Event::PlayerUpdated(view)),
            Outgoing::all(Event::PotUpdated(self.pot())),
        ];

        if self.round_complete() {
            self.advance_streets(&mut events)?;
        } else if let Some(next) = self.next_can_bet_after(player_id) {
            self.set_turn(next, &mut events);
        }

        Ok(events)
    }

    /// Folds a player out of the current hand.
    ///
    /// Works out of turn, a player who leaves mid hand folds this way. The
    /// committed chips stay in the pot.
    pub(crate) fn fold_for(&mut self, player_id: PlayerId) -> Result<Vec<Outgoing>> {
        let game = self.game.as_ref().ok_or(Error::GameNotFound)?;
        if !game.active.contains(&player_id) {
            return Ok(Vec::new());
        }

        let was_turn = game.current_turn == Some(player_id);
        // The follower must be picked before the fold shrinks the order.
        let next = self.next_can_bet_after(player_id);

        let game = self.game.as_mut().ok_or(Error::GameNotFound)?;
        game.active.retain(|id| *id != player_id);
        game.acted.remove(&player_id);

        let player = find_player_mut(&mut self.players, player_id)?;
        player.is_active = false;
        player.has_folded = true;
        player.hole_cards = None;
        let bet = player.round_bet;
        let view = player.view();

        let mut events = vec![
            Outgoing::all(Event::ActionApplied {
                player_id,
                action: PlayerAction::Fold,
                bet,
            }),
            Outgoing::all(Event::PlayerUpdated(view)),
        ];

        if self.game.as_ref().is_some_and(|g| g.active.len() == 1) {
            self.finish_fold_out(&mut events)?;
        } else if self.round_complete() {
            self.advance_streets(&mut events)?;
        } else if was_turn && let Some(next) = next {
            self.set_turn(next, &mut events);
        }

        Ok(events)
    }

    /// Clears the hand state after a game has ended.
    ///
    /// The button seat is remembered for the next hand, chip stacks are
    /// preserved, ready flags and per hand state are cleared.
    pub fn reset_game(&mut self) -> Vec<Outgoing> {
        if let Some(game) = self.game.take() {
            self.last_dealer = Some(game.dealer);
        }

        for player in &mut self.players {
            player.reset_hand();
        }

        let mut events = self
            .players
            .iter()
            .map(|p| Outgoing::all(Event::PlayerUpdated(p.view())))
            .collect::<Vec<_>>();
        events.push(Outgoing::all(Event::RoomUpdated(self.info())));
        events
    }

    /// The game snapshot, never contains hole cards.
    pub fn game_view(&self) -> Option<GameView> {
        self.game.as_ref().map(|game| GameView {
            street: game.street,
            community_cards: game.community.clone(),
            pot: self.pot(),
            current_bet: game.current_bet,
            min_bet: self.min_bet,
            dealer: game.dealer,
            small_blind: game.small_blind,
            big_blind: game.big_blind,
            current_turn: game.current_turn,
        })
    }

    /// The chips committed by all players in this hand.
    fn pot(&self) -> Chips {
        let dead = self
            .game
            .as_ref()
            .map(|g| {
                g.dead
                    .iter()
                    .map(|(_, c)| *c)
                    .fold(Chips::ZERO, |acc, c| acc + c)
            })
            .unwrap_or_default();

        self.players
            .iter()
            .map(|p| p.total_bet)
            .fold(dead, |acc, c| acc + c)
    }

    /// Checks if the betting round is over.
    ///
    /// With two or more players who can still bet the round is over when
    /// all of them acted and matched the current bet. With fewer the round
    /// is over as soon as nobody owes chips, which runs streets out when
    /// everyone is all in.
    fn round_complete(&self) -> bool {
        let Some(game) = self.game.as_ref() else {
            return true;
        };

        let can_bet = self
            .players
            .iter()
            .filter(|p| game.active.contains(&p.player_id) && !p.is_all_in)
            .collect::<Vec<_>>();

        if can_bet.len() <= 1 {
            can_bet.iter().all(|p| p.round_bet >= game.current_bet)
        } else {
            // A forced blind can exceed a short all-in big blind, so players
            // match by covering the current bet rather than equalling it.
            can_bet
                .iter()
                .all(|p| game.acted.contains(&p.player_id) && p.round_bet >= game.current_bet)
        }
    }

    /// The next player after the given one who can still bet.
    fn next_can_bet_after(&self, after: PlayerId) -> Option<PlayerId> {
        let game = self.game.as_ref()?;
        let pos = game.active.iter().position(|id| *id == after)?;
        let n = game.active.len();

        (1..n)
            .map(|i| game.active[(pos + i) % n])
            .find(|id| !self.players.iter().any(|p| p.player_id == *id && p.is_all_in))
    }

    /// The first player in acting order who can still bet.
    fn first_can_bet(&self) -> Option<PlayerId> {
        let game = self.game.as_ref()?;
        game.active
            .iter()
            .copied()
            .find(|id| !self.players.iter().any(|p| p.player_id == *id && p.is_all_in))
    }

    /// Moves the turn to the given player.
    fn set_turn(&mut self, player_id: PlayerId, events: &mut Vec<Outgoing>) {
        let round_bet = self
            .players
            .iter()
            .find(|p| p.player_id == player_id)
            .map(|p| p.round_bet)
            .unwrap_or_default();
        let timeout_secs = self.turn_secs;

        if let Some(game) = self.game.as_mut() {
            game.current_turn = Some(player_id);
            events.push(Outgoing::all(Event::TurnChanged {
                player_id,
                to_call: game.current_bet - round_bet,
                timeout_secs,
            }));
        }
    }

    /// Advances streets until a player has to act or the hand is over.
    fn advance_streets(&mut self, events: &mut Vec<Outgoing>) -> Result<()> {
        loop {
            let street = self.game.as_ref().ok_or(Error::GameNotFound)?.street;
            if street == Street::River {
                return self.showdown(events);
            }

            // Bets move to the pot accounting between streets.
            for player in &mut self.players {
                player.round_bet = Chips::ZERO;
            }

            let game = self.game.as_mut().ok_or(Error::GameNotFound)?;
            game.current_bet = Chips::ZERO;
            game.current_turn = None;
            game.acted.clear();
            game.street = match game.street {
                Street::Preflop => Street::Flop,
                Street::Flop => Street::Turn,
                _ => Street::River,
            };

            let count = if game.street == Street::Flop { 3 } else { 1 };
            for _ in 0..count {
                let card = game.deck.deal().ok_or(Error::DeckExhausted)?;
                game.community.push(card);
            }

            events.push(Outgoing::all(Event::CommunityCards {
                street: game.street,
                cards: game.community.clone(),
            }));

            if !self.round_complete() {
                if let Some(first) = self.first_can_bet() {
                    self.set_turn(first, events);
                }
                return Ok(());
            }
        }
    }

    /// The last player in the hand wins the pot without a showdown.
    fn finish_fold_out(&mut self, events: &mut Vec<Outgoing>) -> Result<()> {
        let game = self.game.as_mut().ok_or(Error::GameNotFound)?;
        game.current_turn = None;
        let Some(&winner_id) = game.active.first() else {
            return Ok(());
        };

        let pot = self.pot();
        for player in &mut self.players {
            player.round_bet = Chips::ZERO;
            player.total_bet = Chips::ZERO;
        }
        if let Some(game) = self.game.as_mut() {
            game.dead.clear();
        }

        let winner = find_player_mut(&mut self.players, winner_id)?;
        winner.chips += pot;
        let view = winner.view();

        info!(
            "Room {} hand won by {winner_id} on folds for {pot}",
            self.room_id()
        );

        events.push(Outgoing::all(Event::PlayerUpdated(view)));
        events.push(Outgoing::all(Event::RoundEnded(vec![HandPayoff {
            player_id: winner_id,
            category: WinCategory::LastPlayerStanding,
            cards: Vec::new(),
            chips: pot,
        }])));
        events.push(Outgoing::all(Event::GameEnded));

        Ok(())
    }

    /// Evaluates hands, pays every pot, and ends the hand.
    fn showdown(&mut self, events: &mut Vec<Outgoing>) -> Result<()> {
        let game = self.game.as_mut().ok_or(Error::GameNotFound)?;
        game.current_turn = None;
        game.current_bet = Chips::ZERO;

        let community = game.community.clone();
        let active = game.active.clone();

        // Pot contributions in acting order, players who folded contribute
        // but can never win.
        let mut contribs = Vec::new();
        for id in &active {
            let player = find_player(&self.players, *id)?;
            contribs.push((*id, player.total_bet, true));
        }
        for player in &self.players {
            if !active.contains(&player.player_id) && player.total_bet > Chips::ZERO {
                contribs.push((player.player_id, player.total_bet, false));
            }
        }
        for (id, chips) in &game.dead {
            contribs.push((*id, *chips, false));
        }

        let pots = build_pots(&contribs);

        let mut values = AHashMap::new();
        let mut revealed = AHashMap::new();
        for id in &active {
            let player = find_player(&self.players, *id)?;
            let Some((c1, c2)) = player.hole_cards else {
                continue;
            };

            let mut cards = vec![c1, c2];
            cards.extend_from_slice(&community);
            values.insert(*id, HandValue::eval(&cards));
            revealed.insert(*id, vec![c1, c2]);
        }

        // Pay each pot, on a tie the odd chips go to the winners closest to
        // the small blind.
        let mut won: AHashMap<PlayerId, Chips> = AHashMap::new();
        for pot in &pots {
            let hands = pot
                .eligible
                .iter()
                .filter_map(|id| values.get(id).map(|hv| (*id, *hv)))
                .collect::<Vec<_>>();

            let pot_winners = winners(&hands);
            if pot_winners.is_empty() {
                continue;
            }

            for (id, share) in pot_winners
                .iter()
                .zip(split_pot(pot.chips, pot_winners.len()))
            {
                *won.entry(*id).or_default() += share;
            }
        }

        for player in &mut self.players {
            player.round_bet = Chips::ZERO;
            player.total_bet = Chips::ZERO;
        }
        if let Some(game) = self.game.as_mut() {
            game.dead.clear();
        }

        let mut payoffs = Vec::new();
        for id in &active {
            if let Some(&chips) = won.get(id) {
                let player = find_player_mut(&mut self.players, *id)?;
                player.chips += chips;
                payoffs.push(HandPayoff {
                    player_id: *id,
                    category: WinCategory::Hand(values[id].rank()),
                    cards: revealed[id].clone(),
                    chips,
                });
            }
        }

        info!(
            "Room {} hand ended at showdown, {} winners",
            self.room_id(),
            payoffs.len()
        );

        for id in &active {
            events.push(Outgoing::all(Event::PlayerUpdated(
                find_player(&self.players, *id)?.view(),
            )));
        }
        events.push(Outgoing::all(Event::RoundEnded(payoffs)));
        events.push(Outgoing::all(Event::GameEnded));

        Ok(())
    }
}

/// Moves chips from the player stack to its bets, capped at the stack.
///
/// Returns the chips actually committed, a player left with nothing is all
/// in.
fn commit(player: &mut Player, chips: Chips) -> Chips {
    let pay = chips.min(player.chips);
    player.chips -= pay;
    player.round_bet += pay;
    player.total_bet += pay;
    if player.chips == Chips::ZERO {
        player.is_all_in = true;
    }
    pay
}

fn find_player(players: &[Player], player_id: PlayerId) -> Result<&Player> {
    players
        .iter()
        .find(|p| p.player_id == player_id)
        .ok_or(Error::PlayerNotInRoom)
}

fn find_player_mut(players: &mut [Player], player_id: PlayerId) -> Result<&mut Player> {
    players
        .iter_mut()
        .find(|p| p.player_id == player_id)
        .ok_or(Error::PlayerNotInRoom)
}

/// Builds the pots from the players contributions.
///
/// Each layer takes the smallest outstanding contribution from everyone
/// still in it, only players who did not fold are eligible. Chips left
/// behind with no eligible player fall into the previous pot.
pub(crate) fn build_pots(contribs: &[(PlayerId, Chips, bool)]) -> Vec<Pot> {
    let mut remaining = contribs.to_vec();
    let mut pots: Vec<Pot> = Vec::new();

    loop {
        let Some(layer) = remaining
            .iter()
            .map(|c| c.1)
            .filter(|c| *c > Chips::ZERO)
            .min()
        else {
            break;
        };

        let mut chips = Chips::ZERO;
        let mut eligible = Vec::new();
        for c in remaining.iter_mut() {
            if c.1 > Chips::ZERO {
                c.1 -= layer;
                chips += layer;
                if c.2 {
                    eligible.push(c.0);
                }
            }
        }

        if eligible.is_empty() {
            if let Some(last) = pots.last_mut() {
                last.chips += chips;
            }
        } else {
            pots.push(Pot { chips, eligible });
        }
    }

    pots
}

/// Splits a pot between winners, the first winners get the odd chips.
fn split_pot(chips: Chips, winners: usize) -> Vec<Chips> {
    let share = chips / winners as u32;
    let remainder = (chips % winners as u32).amount() as usize;

    (0..winners)
        .map(|i| {
            if i < remainder {
                share + Chips::new(1)
            } else {
                share
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use railbird_core::message::Recipient;

    fn new_room(stacks: &[u32]) -> (Room, Vec<PlayerId>) {
        let rng = StdRng::seed_from_u64(13);
        let mut room = Room::with_rng(
            "test",
            stacks.len().max(2),
            Chips::new(10),
            Chips::new(1_000),
            30,
            rng,
        )
        .unwrap();

        let mut ids = Vec::new();
        for (seat, stack) in stacks.iter().enumerate() {
            let id = PlayerId::new_id();
            room.join(id, &format!("p{seat}")).unwrap();
            room.sit_down(id, seat).unwrap();
            room.player_mut(id).unwrap().chips = Chips::new(*stack);
            room.set_ready(id, true).unwrap();
            ids.push(id);
        }

        (room, ids)
    }

    fn turn(room: &Room) -> PlayerId {
        room.game_view().unwrap().current_turn.unwrap()
    }

    fn chips(room: &Room, id: PlayerId) -> Chips {
        room.player(id).unwrap().chips
    }

    fn blinds(room: &Room) -> (PlayerId, PlayerId) {
        let view = room.game_view().unwrap();
        (
            room.seats[view.small_blind].unwrap(),
            room.seats[view.big_blind].unwrap(),
        )
    }

    fn payoffs(events: &[Outgoing]) -> Option<Vec<HandPayoff>> {
        events.iter().find_map(|o| match &o.event {
            Event::RoundEnded(payoffs) => Some(payoffs.clone()),
            _ => None,
        })
    }

    #[test]
    fn start_needs_two_ready_players() {
        let (mut room, ids) = new_room(&[1_000, 1_000]);
        room.set_ready(ids[1], false).unwrap();
        assert_eq!(room.start_hand().unwrap_err(), Error::NotEnoughPlayers);

        room.set_ready(ids[1], true).unwrap();
        room.start_hand().unwrap();
        assert_eq!(room.start_hand().unwrap_err(), Error::GameInProgress);

        // Ready toggles stay legal while the hand plays out.
        room.set_ready(ids[1], false).unwrap();
        room.set_ready(ids[1], true).unwrap();
    }

    #[test]
    fn heads_up_blinds_and_turn_order() {
        let (mut room, ids) = new_room(&[1_000, 1_000]);
        let events = room.start_hand().unwrap();

        let view = room.game_view().unwrap();
        assert_eq!(view.street, Street::Preflop);
        assert_eq!(view.current_bet, Chips::new(10));
        assert_eq!(view.pot, Chips::new(15));

        // The start event carries the initial game snapshot.
        let started = events
            .iter()
            .find_map(|o| match &o.event {
                Event::GameStarted { game, players } => Some((game.clone(), players.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(started.0.pot, Chips::new(15));
        assert_eq!(started.0.current_bet, Chips::new(10));
        assert_eq!(started.1.len(), 2);

        // Heads up the dealer posts the small blind and acts first.
        assert_eq!(view.small_blind, view.dealer);
        let (sb, bb) = blinds(&room);
        assert_eq!(turn(&room), sb);
        assert_eq!(chips(&room, sb), Chips::new(995));
        assert_eq!(chips(&room, bb), Chips::new(990));

        // Each player got exactly one private hole cards event.
        for id in &ids {
            let count = events
                .iter()
                .filter(|o| {
                    o.to == Recipient::Player(*id) && matches!(o.event, Event::HoleCards(..))
                })
                .count();
            assert_eq!(count, 1);
        }

        // The small blind calls, the big blind keeps the option.
        room.apply_action(sb, PlayerAction::Call, Chips::ZERO)
            .unwrap();
        assert_eq!(turn(&room), bb);
        assert_eq!(room.game_view().unwrap().pot, Chips::new(20));

        // The check closes the round and deals the flop.
        let events = room
            .apply_action(bb, PlayerAction::Check, Chips::ZERO)
            .unwrap();
        let view = room.game_view().unwrap();
        assert_eq!(view.street, Street::Flop);
        assert_eq!(view.community_cards.len(), 3);
        assert_eq!(view.current_bet, Chips::ZERO);
        assert!(events.iter().any(|o| matches!(
            o.event,
            Event::CommunityCards {
                street: Street::Flop,
                ..
            }
        )));

        // Postflop the small blind seat acts first.
        assert_eq!(turn(&room), sb);
    }

    #[test]
    fn hand_runs_to_showdown_and_conserves_chips() {
        let (mut room, ids) = new_room(&[1_000, 1_000]);
        room.start_hand().unwrap();
        let (sb, bb) = blinds(&room);

        room.apply_action(sb, PlayerAction::Call, Chips::ZERO)
            .unwrap();
        room.apply_action(bb, PlayerAction::Check, Chips::ZERO)
            .unwrap();

        // Check down the flop, the turn, and the river.
        let mut last = Vec::new();
        for _ in 0..3 {
            room.apply_action(sb, PlayerAction::Check, Chips::ZERO)
                .unwrap();
            last = room
                .apply_action(bb, PlayerAction::Check, Chips::ZERO)
                .unwrap();
        }

        let payoffs = payoffs(&last).unwrap();
        let won = payoffs
            .iter()
            .map(|p| p.chips)
            .fold(Chips::ZERO, |a, c| a + c);
        assert_eq!(won, Chips::new(20));
        assert!(last.iter().any(|o| o.event == Event::GameEnded));

        for payoff in &payoffs {
            assert_eq!(payoff.cards.len(), 2);
            assert!(matches!(payoff.category, WinCategory::Hand(_)));
        }

        let total = ids
            .iter()
            .map(|id| chips(&room, *id))
            .fold(Chips::ZERO, |a, c| a + c);
        assert_eq!(total, Chips::new(2_000));

        // The coordinator reset puts the room back to waiting.
        room.reset_game();
        assert!(!room.is_playing());
        assert!(room.players.iter().all(|p| !p.is_ready));
        assert!(room.last_dealer.is_some());
    }

    #[test]
    fn dealer_rotates_between_hands() {
        let (mut room, ids) = new_room(&[1_000, 1_000]);
        room.start_hand().unwrap();
        let first_dealer = room.game_view().unwrap().dealer;

        let (sb, _) = blinds(&room);
        room.apply_action(sb, PlayerAction::Fold, Chips::ZERO)
            .unwrap();
        room.reset_game();

        for id in &ids {
            room.set_ready(*id, true).unwrap();
        }
        room.start_hand().unwrap();
        assert_ne!(room.game_view().unwrap().dealer, first_dealer);
    }

    #[test]
    fn invalid_actions_leave_state_unchanged() {
        let (mut room, _) = new_room(&[1_000, 1_000]);
        room.start_hand().unwrap();
        let (sb, bb) = blinds(&room);

        let game_before = room.game_view();
        let players_before = room.player_views();

        assert_eq!(
            room.apply_action(bb, PlayerAction::Call, Chips::ZERO)
                .unwrap_err(),
            Error::NotYourTurn
        );
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Check, Chips::ZERO)
                .unwrap_err(),
            Error::CannotCheck(_)
        ));
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Bet, Chips::new(50))
                .unwrap_err(),
            Error::CannotBet(_)
        ));
        // A raise must exceed the current bet by at least the big blind.
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Raise, Chips::new(10))
                .unwrap_err(),
            Error::BelowMinimum { .. }
        ));
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Raise, Chips::new(15))
                .unwrap_err(),
            Error::BelowMinimum { .. }
        ));
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Raise, Chips::new(5_000))
                .unwrap_err(),
            Error::InsufficientChips { .. }
        ));

        assert_eq!(room.game_view(), game_before);
        assert_eq!(room.player_views(), players_before);
    }

    #[test]
    fn bet_validation_on_the_flop() {
        let (mut room, _) = new_room(&[1_000, 1_000]);
        room.start_hand().unwrap();
        let (sb, bb) = blinds(&room);

        room.apply_action(sb, PlayerAction::Call, Chips::ZERO)
            .unwrap();
        room.apply_action(bb, PlayerAction::Check, Chips::ZERO)
            .unwrap();

        // No bet to raise on a fresh street.
        assert_eq!(
            room.apply_action(sb, PlayerAction::Raise, Chips::new(20))
                .unwrap_err(),
            Error::CannotRaise
        );
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Bet, Chips::new(5))
                .unwrap_err(),
            Error::BelowMinimum { .. }
        ));
        assert!(matches!(
            room.apply_action(sb, PlayerAction::Bet, Chips::new(2_000))
                .unwrap_err(),
            Error::InsufficientChips { .. }
        ));

        room.apply_action(sb, PlayerAction::Bet, Chips::new(50))
            .unwrap();
        assert_eq!(room.game_view().unwrap().current_bet, Chips::new(50));
    }

    #[test]
    fn raise_reopens_the_round() {
        let (mut room, _) = new_room(&[1_000, 1_000, 1_000]);
        room.start_hand().unwrap();
        let view = room.game_view().unwrap();
        let (sb, bb) = blinds(&room);
        let dealer = room.seats[view.dealer].unwrap();

        // Three handed the dealer acts first preflop.
        assert_eq!(turn(&room), dealer);
        room.apply_action(dealer, PlayerAction::Call, Chips::ZERO)
            .unwrap();
        room.apply_action(sb, PlayerAction::Raise, Chips::new(50))
            .unwrap();
        assert_eq!(room.game_view().unwrap().current_bet, Chips::new(50));

        // The raise reopens the round for the players who already acted.
        assert_eq!(turn(&room), bb);
        room.apply_action(bb, PlayerAction::Fold, Chips::ZERO)
            .unwrap();
        assert_eq!(turn(&room), dealer);
        room.apply_action(dealer, PlayerAction::Call, Chips::ZERO)
            .unwrap();

        // Round closes with the dead big blind in the pot.
        let view = room.game_view().unwrap();
        assert_eq!(view.street, Street::Flop);
        assert_eq!(view.pot, Chips::new(110));

        // On the flop a bet and a raise reopen the round again.
        assert_eq!(turn(&room), sb);
        room.apply_action(sb, PlayerAction::Bet, Chips::new(50))
            .unwrap();
        room.apply_action(dealer, PlayerAction::Raise, Chips::new(150))
            .unwrap();
        assert_eq!(turn(&room), sb);
        room.apply_action(sb, PlayerAction::Call, Chips::ZERO)
            .unwrap();

        let view = room.game_view().unwrap();
        assert_eq!(view.street, Street::Turn);
        assert_eq!(view.pot, Chips::new(410));
    }

    #[test]
    fn short_call_goes_all_in_and_runs_out() {
        let (mut room, ids) = new_room(&[1_000, 1_000]);
        room.start_hand().unwrap();
        let (sb, bb) = blinds(&room);

        let events = room
            .apply_action(sb, PlayerAction::AllIn, Chips::ZERO)
            .unwrap();
        assert!(events.iter().any(|o| matches!(
            o.event,
            Event::ActionApplied {
                action: PlayerAction::AllIn,
                ..
            }
        )));

        // Shorten the caller so the call is partial.
        room.player_mut(bb).unwrap().chips = Chips::new(200);
        let events = room
            .apply_action(bb, PlayerAction::Call, Chips::ZERO)
            .unwrap();

        // The short call ends betting and runs the board out to showdown.
        assert!(events.iter().any(|o| matches!(
            o.event,
            Event::ActionApplied {
                action: PlayerAction::AllIn,
                ..
            }
        )));
        assert_eq!(
            events
                .iter()
                .filter(|o| matches!(o.event, Event::CommunityCards { .. }))
                .count(),
            3
        );
        let payoffs = payoffs(&events).unwrap();
        assert!(!payoffs.is_empty());
        assert!(events.iter().any(|o| o.event == Event::GameEnded));

        // The uncovered chips come back to the big stack through the side
        // pot, the total stays constant.
        let total = ids
            .iter()
            .map(|id| chips(&room, *id))
            .fold(Chips::ZERO, |a, c| a + c);
        assert_eq!(total, Chips::new(1_210));
        assert!(chips(&room, sb) >= Chips::new(790));
    }

    #[test]
    fn fold_out_wins_without_showdown() {
        let (mut room, _) = new_room(&[1_000, 1_000]);
        room.start_hand().unwrap();
        let (sb, bb) = blinds(&room);

        let events = room
            .apply_action(sb, PlayerAction::Fold, Chips::ZERO)
            .unwrap();

        let payoffs = payoffs(&events).unwrap();
        assert_eq!(payoffs.len(), 1);
        assert_eq!(payoffs[0].player_id, bb);
        assert_eq!(payoffs[0].category, WinCategory::LastPlayerStanding);
        assert!(payoffs[0].cards.is_empty());
        assert_eq!(payoffs[0].chips, Chips::new(15));
        assert!(events.iter().any(|o| o.event == Event::GameEnded));

        // The folder loses the small blind only.
        assert_eq!(chips(&room, sb), Chips::new(995));
        assert_eq!(chips(&room, bb), Chips::new(1_005));
    }

    #[test]
    fn leaving_mid_hand_folds_first() {
        let (mut room, _) = new_room(&[1_000, 1_000, 1_000]);
        room.start_hand().unwrap();
        let view = room.game_view().unwrap();
        let dealer = room.seats[view.dealer].unwrap();

        // The player on turn leaves, its blind or call stays in the pot and
        // the turn moves on.
        assert_eq!(turn(&room), dealer);
        let events = room.leave(dealer).unwrap();
        assert!(events.iter().any(|o| matches!(
            o.event,
            Event::ActionApplied {
                action: PlayerAction::Fold,
                ..
            }
        )));
        assert!(events
            .iter()
            .any(|o| o.event == Event::PlayerLeft(dealer)));

        assert_eq!(room.players.len(), 2);
        assert_ne!(turn(&room), dealer);
        assert_eq!(room.game_view().unwrap().pot, Chips::new(15));
    }

    #[test]
    fn blind_posting_caps_at_the_stack() {
        let (mut room, ids) = new_room(&[1_000, 1_000]);

        // Both blinds are short, posting puts them all in and the hand runs
        // out on its own.
        room.player_mut(ids[0]).unwrap().chips = Chips::new(4);
        room.player_mut(ids[1]).unwrap().chips = Chips::new(7);

        let events = room.start_hand().unwrap();
        assert!(events.iter().any(|o| o.event == Event::GameEnded));

        let total = ids
            .iter()
            .map(|id| chips(&room, *id))
            .fold(Chips::ZERO, |a, c| a + c);
        assert_eq!(total, Chips::new(11));
    }

    #[test]
    fn short_big_blind_sets_the_current_bet() {
        let (mut room, ids) = new_room(&[1_000, 1_000, 1_000]);

        // Force the button on seat 0 so the short stack posts the big
        // blind from seat 2.
        room.last_dealer = Some(2);
        room.player_mut(ids[2]).unwrap().chips = Chips::new(3);
        room.start_hand().unwrap();

        let view = room.game_view().unwrap();
        assert_eq!(view.dealer, 0);
        assert_eq!(view.big_blind, 2);
        assert_eq!(view.current_bet, Chips::new(3));

        // Matching the short blind closes the round even though the small
        // blind posted more than the current bet.
        room.apply_action(ids[0], PlayerAction::Call, Chips::ZERO)
            .unwrap();
        room.apply_action(ids[1], PlayerAction::Check, Chips::ZERO)
            .unwrap();

        let view = room.game_view().unwrap();
        assert_eq!(view.street, Street::Flop);
        assert_eq!(view.pot, Chips::new(11));
    }

    #[test]
    fn joining_mid_hand_gets_the_game_snapshot() {
        let rng = StdRng::seed_from_u64(13);
        let mut room =
            Room::with_rng("test", 3, Chips::new(10), Chips::new(1_000), 30, rng).unwrap();

        for seat in 0..2 {
            let id = PlayerId::new_id();
            room.join(id, &format!("p{seat}")).unwrap();
            room.sit_down(id, seat).unwrap();
            room.set_ready(id, true).unwrap();
        }
        room.start_hand().unwrap();

        let events = room.join(PlayerId::new_id(), "late").unwrap();
        let game = events
            .iter()
            .find_map(|o| match &o.event {
                Event::RoomJoined { game, .. } => Some(game.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(game.unwrap().street, Street::Preflop);
    }

    #[test]
    fn build_pots_layers_side_pots() {
        let a = PlayerId::new_id();
        let b = PlayerId::new_id();
        let c = PlayerId::new_id();

        let pots = build_pots(&[
            (a, Chips::new(100), true),
            (b, Chips::new(100), true),
            (c, Chips::new(50), true),
        ]);
        assert_eq!(
            pots,
            vec![
                Pot {
                    chips: Chips::new(150),
                    eligible: vec![a, b, c],
                },
                Pot {
                    chips: Chips::new(100),
                    eligible: vec![a, b],
                },
            ]
        );
    }

    #[test]
    fn build_pots_excludes_folded_players() {
        let a = PlayerId::new_id();
        let b = PlayerId::new_id();
        let c = PlayerId::new_id();

        let pots = build_pots(&[
            (a, Chips::new(100), true),
            (b, Chips::new(100), false),
            (c, Chips::new(100), true),
        ]);
        assert_eq!(
            pots,
            vec![Pot {
                chips: Chips::new(300),
                eligible: vec![a, c],
            }]
        );

        // A folded overbet falls into the last pot with a winner.
        let pots = build_pots(&[(a, Chips::new(50), true), (b, Chips::new(100), false)]);
        assert_eq!(
            pots,
            vec![Pot {
                chips: Chips::new(150),
                eligible: vec![a],
            }]
        );
    }

    #[test]
    fn split_pot_gives_odd_chips_to_first_winners() {
        assert_eq!(
            split_pot(Chips::new(101), 2),
            vec![Chips::new(51), Chips::new(50)]
        );
        assert_eq!(
            split_pot(Chips::new(100), 3),
            vec![Chips::new(34), Chips::new(33), Chips::new(33)]
        );
        assert_eq!(split_pot(Chips::new(100), 1), vec![Chips::new(100)]);
    }
}
