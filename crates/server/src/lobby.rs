// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Lobby and per room tasks.
use ahash::AHashMap;
use log::{error, info};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time,
};

use railbird_core::{
    error::{Error, Result},
    message::{Event, Outgoing, PlayerAction, Recipient, RoomInfo},
    poker::{Chips, PlayerId, RoomId},
};

use crate::{config::Config, room::Room};

/// The lobby players go through to create and join rooms.
///
/// Each room runs in its own task that owns the [Room] and serializes every
/// mutation, distinct rooms run in parallel. The lobby keeps the player to
/// room sessions so that game commands only need the player id.
#[derive(Clone)]
pub struct Lobby {
    shared: Arc<Mutex<Shared>>,
    config: Config,
    shutdown_tx: broadcast::Sender<()>,
}

struct Shared {
    rooms: AHashMap<RoomId, RoomHandle>,
    sessions: AHashMap<PlayerId, RoomId>,
}

impl Lobby {
    /// Creates a new empty lobby.
    pub fn new(config: Config) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            shared: Arc::new(Mutex::new(Shared {
                rooms: AHashMap::new(),
                sessions: AHashMap::new(),
            })),
            config,
            shutdown_tx,
        }
    }

    /// Creates a new room and spawns its task.
    pub async fn create_room(
        &self,
        name: &str,
        max_players: usize,
        min_bet: Chips,
    ) -> Result<RoomId> {
        let room = Room::new(
            name,
            max_players,
            min_bet,
            self.config.starting_chips,
            self.config.turn_timeout.as_secs(),
        )?;
        let room_id = room.room_id();

        let handle = RoomHandle::new(room, self.config.clone(), self.shutdown_tx.subscribe());
        self.shared.lock().await.rooms.insert(room_id, handle);

        info!("Created room {room_id} {name}");

        Ok(room_id)
    }

    /// The summaries of all rooms.
    pub async fn room_list(&self) -> Vec<RoomInfo> {
        let handles = self
            .shared
            .lock()
            .await
            .rooms
            .values()
            .cloned()
            .collect::<Vec<_>>();

        let mut infos = Vec::new();
        for handle in handles {
            if let Ok(info) = handle.info().await {
                infos.push(info);
            }
        }

        infos.sort_by_key(|info| info.room_id);
        infos
    }

    /// A player joins a room with a channel for its events.
    ///
    /// A player can be in one room at a time, joining another room leaves
    /// the current one first.
    pub async fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        nickname: &str,
        events_tx: mpsc::Sender<Event>,
    ) -> Result<()> {
        let prev = self.shared.lock().await.sessions.get(&player_id).copied();
        if let Some(prev) = prev
            && prev != room_id
        {
            self.leave_room(player_id).await?;
        }

        let handle = self
            .shared
            .lock()
            .await
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(Error::RoomNotFound(room_id))?;

        handle.join(player_id, nickname, events_tx).await?;
        self.shared.lock().await.sessions.insert(player_id, room_id);

        Ok(())
    }

    /// A player leaves its room, an empty room is removed from the lobby.
    pub async fn leave_room(&self, player_id: PlayerId) -> Result<()> {
        let (room_id, handle) = {
            let shared = self.shared.lock().await;
            let room_id = *shared
                .sessions
                .get(&player_id)
                .ok_or(Error::PlayerNotInRoom)?;
            let handle = shared
                .rooms
                .get(&room_id)
                .cloned()
                .ok_or(Error::RoomNotFound(room_id))?;
            (room_id, handle)
        };

        let empty = handle.leave(player_id).await?;

        let mut shared = self.shared.lock().await;
        shared.sessions.remove(&player_id);
        if empty {
            shared.rooms.remove(&room_id);
            info!("Removed empty room {room_id}");
        }

        Ok(())
    }

    /// A player takes a seat in its room.
    pub async fn sit_down(&self, player_id: PlayerId, seat: usize) -> Result<()> {
        self.handle_for(player_id).await?.sit_down(player_id, seat).await
    }

    /// A player stands up in its room.
    pub async fn stand_up(&self, player_id: PlayerId) -> Result<()> {
        self.handle_for(player_id).await?.stand_up(player_id).await
    }

    /// A player toggles its ready flag, a hand starts when every seated
    /// player is ready.
    pub async fn set_ready(&self, player_id: PlayerId, ready: bool) -> Result<()> {
        self.handle_for(player_id).await?.set_ready(player_id, ready).await
    }

    /// A player submits a game action.
    pub async fn submit_action(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
        amount: Chips,
    ) -> Result<()> {
        self.handle_for(player_id)
            .await?
            .action(player_id, action, amount)
            .await
    }

    /// Stops all room tasks.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    async fn handle_for(&self, player_id: PlayerId) -> Result<RoomHandle> {
        let shared = self.shared.lock().await;
        let room_id = *shared
            .sessions
            .get(&player_id)
            .ok_or(Error::PlayerNotInRoom)?;
        shared
            .rooms
            .get(&room_id)
            .cloned()
            .ok_or(Error::RoomNotFound(room_id))
    }
}

/// Command for a room task.
enum RoomCommand {
    Join {
        player_id: PlayerId,
        nickname: String,
        events_tx: mpsc::Sender<Event>,
        resp_tx: oneshot::Sender<Result<()>>,
    },
    Leave {
        player_id: PlayerId,
        resp_tx: oneshot::Sender<Result<bool>>,
    },
    SitDown {
        player_id: PlayerId,
        seat: usize,
        resp_tx: oneshot::Sender<Result<()>>,
    },
    StandUp {
        player_id: PlayerId,
        resp_tx: oneshot::Sender<Result<()>>,
    },
    SetReady {
        player_id: PlayerId,
        ready: bool,
        resp_tx: oneshot::Sender<Result<()>>,
    },
    Action {
        player_id: PlayerId,
        action: PlayerAction,
        amount: Chips,
        resp_tx: oneshot::Sender<Result<()>>,
    },
    Info {
        resp_tx: oneshot::Sender<RoomInfo>,
    },
}

/// Handle for sending commands to a room task.
#[derive(Clone)]
struct RoomHandle {
    room_id: RoomId,
    commands_tx: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    fn new(room: Room, config: Config, shutdown_rx: broadcast::Receiver<()>) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(128);
        let room_id = room.room_id();

        let mut task = RoomTask {
            room,
            events: AHashMap::new(),
            commands_rx,
            shutdown_rx,
            turn_deadline: None,
            config,
        };

        tokio::spawn(async move {
            task.run().await;
            info!("Room task for room {room_id} stopped");
        });

        Self {
            room_id,
            commands_tx,
        }
    }

    async fn join(
        &self,
        player_id: PlayerId,
        nickname: &str,
        events_tx: mpsc::Sender<Event>,
    ) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            nickname: nickname.to_string(),
            events_tx,
            resp_tx,
        })
        .await?;
        self.recv(resp_rx).await?
    }

    async fn leave(&self, player_id: PlayerId) -> Result<bool> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::Leave { player_id, resp_tx }).await?;
        self.recv(resp_rx).await?
    }

    async fn sit_down(&self, player_id: PlayerId, seat: usize) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::SitDown {
            player_id,
            seat,
            resp_tx,
        })
        .await?;
        self.recv(resp_rx).await?
    }

    async fn stand_up(&self, player_id: PlayerId) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::StandUp { player_id, resp_tx }).await?;
        self.recv(resp_rx).await?
    }

    async fn set_ready(&self, player_id: PlayerId, ready: bool) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::SetReady {
            player_id,
            ready,
            resp_tx,
        })
        .await?;
        self.recv(resp_rx).await?
    }

    async fn action(&self, player_id: PlayerId, action: PlayerAction, amount: Chips) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::Action {
            player_id,
            action,
            amount,
            resp_tx,
        })
        .await?;
        self.recv(resp_rx).await?
    }

    async fn info(&self) -> Result<RoomInfo> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(RoomCommand::Info { resp_tx }).await?;
        self.recv(resp_rx).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<()> {
        self.commands_tx
            .send(cmd)
            .await
            .map_err(|_| Error::RoomNotFound(self.room_id))
    }

    async fn recv<T>(&self, resp_rx: oneshot::Receiver<T>) -> Result<T> {
        resp_rx
            .await
            .map_err(|_| Error::RoomNotFound(self.room_id))
    }
}

/// The task that owns a room.
struct RoomTask {
    room: Room,
    /// Event channels for the players in the room.
    events: AHashMap<PlayerId, mpsc::Sender<Event>>,
    commands_rx: mpsc::Receiver<RoomCommand>,
    shutdown_rx: broadcast::Receiver<()>,
    /// The player on turn and when its time runs out.
    turn_deadline: Option<(PlayerId, Instant)>,
    config: Config,
}

impl RoomTask {
    async fn run(&mut self) {
        let mut ticks = time::interval(self.config.tick);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => break,
                _ = ticks.tick() => self.check_turn_timeout().await,
                res = self.commands_rx.recv() => match res {
                    Some(cmd) => self.command(cmd).await,
                    None => break,
                },
            }
        }
    }

    async fn command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_id,
                nickname,
                events_tx,
                resp_tx,
            } => {
                // Register the channel first so the joiner gets the room
                // snapshot event.
                let res = self.room.join(player_id, &nickname);
                if res.is_ok() {
                    self.events.insert(player_id, events_tx);
                }
                let _ = resp_tx.send(self.dispatch(res).await);
            }
            RoomCommand::Leave { player_id, resp_tx } => {
                let res = self.room.leave(player_id);
                let res = self.dispatch(res).await;
                self.events.remove(&player_id);
                let _ = resp_tx.send(res.map(|_| self.room.is_empty()));
            }
            RoomCommand::SitDown {
                player_id,
                seat,
                resp_tx,
            } => {
                let res = self.room.sit_down(player_id, seat);
                let _ = resp_tx.send(self.dispatch(res).await);
            }
            RoomCommand::StandUp { player_id, resp_tx } => {
                let res = self.room.stand_up(player_id);
                let _ = resp_tx.send(self.dispatch(res).await);
            }
            RoomCommand::SetReady {
                player_id,
                ready,
                resp_tx,
            } => {
                let res = self.room.set_ready(player_id, ready);
                let res = self.dispatch(res).await;
                let _ = resp_tx.send(res);

                // Start the hand when everyone seated is ready.
                if self.room.all_seated_ready() && !self.room.is_playing() {
                    match self.room.start_hand() {
                        Ok(events) => self.deliver(events).await,
                        Err(e) => error!("Room {} start failed: {e}", self.room.room_id()),
                    }
                }
            }
            RoomCommand::Action {
                player_id,
                action,
                amount,
                resp_tx,
            } => {
                let res = self.room.apply_action(player_id, action, amount);
                let _ = resp_tx.send(self.dispatch(res).await);
            }
            RoomCommand::Info { resp_tx } => {
                let _ = resp_tx.send(self.room.info());
            }
        }
    }

    async fn dispatch(&mut self, res: Result<Vec<Outgoing>>) -> Result<()> {
        let events = res?;
        self.deliver(events).await;
        Ok(())
    }

    async fn deliver(&mut self, events: Vec<Outgoing>) {
        let mut ended = false;

        for out in &events {
            match &out.event {
                Event::TurnChanged {
                    player_id,
                    timeout_secs,
                    ..
                } => {
                    let deadline = Instant::now() + Duration::from_secs(*timeout_secs);
                    self.turn_deadline = Some((*player_id, deadline));
                }
                Event::RoundEnded(_) => self.turn_deadline = None,
                Event::GameEnded => {
                    self.turn_deadline = None;
                    ended = true;
                }
                _ => {}
            }

            self.send(out).await;
        }

        // The game is over, put the room back to waiting.
        if ended {
            for out in &self.room.reset_game() {
                self.send(out).await;
            }
        }
    }

    async fn send(&self, out: &Outgoing) {
        match out.to {
            Recipient::All => {
                for events_tx in self.events.values() {
                    let _ = events_tx.send(out.event.clone()).await;
                }
            }
            Recipient::Player(player_id) => {
                if let Some(events_tx) = self.events.get(&player_id) {
                    let _ = events_tx.send(out.event.clone()).await;
                }
            }
        }
    }

    async fn check_turn_timeout(&mut self) {
        let Some((player_id, deadline)) = self.turn_deadline else {
            return;
        };

        if Instant::now() < deadline {
            return;
        }

        self.turn_deadline = None;
        info!(
            "Room {} player {player_id} timed out",
            self.room.room_id()
        );

        // Time ran out, check when possible otherwise fold. The synthetic
        // action goes through the same validation as a player action.
        let res = match self
            .room
            .apply_action(player_id, PlayerAction::Check, Chips::ZERO)
        {
            Err(Error::CannotCheck(_)) => {
                self.room
                    .apply_action(player_id, PlayerAction::Fold, Chips::ZERO)
            }
            res => res,
        };

        match res {
            Ok(events) => self.deliver(events).await,
            Err(e) => error!("Room {} timeout action failed: {e}", self.room.room_id()),
        }
    }
}
