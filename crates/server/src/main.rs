// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Demo that plays scripted hands through the lobby.
use anyhow::Result;
use clap::Parser;
use log::{error, info};
use tokio::sync::mpsc;

use railbird_core::{
    message::{Event, PlayerAction},
    poker::{Chips, PlayerId},
};
use railbird_server::{Config, Lobby};

#[derive(Debug, Parser)]
struct Cli {
    /// Number of players in the demo room.
    #[clap(long, short, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=9))]
    players: u8,
    /// The big blind for the demo room.
    #[clap(long, default_value_t = 10)]
    min_bet: u32,
    /// Number of hands to play.
    #[clap(long, default_value_t = 3)]
    hands: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let lobby = Lobby::new(Config::default());
    let room_id = lobby
        .create_room("demo", cli.players as usize, Chips::new(cli.min_bet))
        .await?;

    let mut tasks = Vec::new();
    for seat in 0..cli.players as usize {
        let (events_tx, events_rx) = mpsc::channel(256);
        let player_id = PlayerId::new_id();
        let nickname = format!("bot-{seat}");

        lobby
            .join_room(room_id, player_id, &nickname, events_tx)
            .await?;
        lobby.sit_down(player_id, seat).await?;

        let lobby = lobby.clone();
        let hands = cli.hands;
        let observer = seat == 0;
        tasks.push(tokio::spawn(async move {
            if let Err(e) = run_bot(lobby, player_id, events_rx, hands, observer).await {
                error!("Bot {player_id} failed: {e}");
            }
        }));
    }

    for task in tasks {
        let _ = task.await;
    }

    lobby.shutdown();

    Ok(())
}

/// Plays the given number of hands calling any bet.
async fn run_bot(
    lobby: Lobby,
    player_id: PlayerId,
    mut events_rx: mpsc::Receiver<Event>,
    hands: u32,
    observer: bool,
) -> Result<()> {
    let mut played = 0;
    lobby.set_ready(player_id, true).await?;

    while let Some(event) = events_rx.recv().await {
        match event {
            Event::HoleCards(c1, c2) => info!("{player_id} dealt {c1} {c2}"),
            Event::TurnChanged { player_id: turn, to_call, .. } if turn == player_id => {
                let action = if to_call == Chips::ZERO {
                    PlayerAction::Check
                } else {
                    PlayerAction::Call
                };
                lobby.submit_action(player_id, action, Chips::ZERO).await?;
            }
            Event::ActionApplied { player_id, action, bet } if observer => {
                info!("{player_id} {} {bet}", action.label());
            }
            Event::CommunityCards { street, cards } if observer => {
                let cards = cards
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                info!("{street}: {cards}");
            }
            Event::RoundEnded(payoffs) if observer => {
                for payoff in &payoffs {
                    info!(
                        "{} wins {} with {}",
                        payoff.player_id, payoff.chips, payoff.category
                    );
                }
            }
            Event::GameEnded => {
                played += 1;
                if played == hands {
                    break;
                }
                lobby.set_ready(player_id, true).await?;
            }
            _ => {}
        }
    }

    lobby.leave_room(player_id).await?;

    Ok(())
}
