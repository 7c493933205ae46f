//! Hexsettle bot-vs-bot simulator.
//!
//! Plays seeded matches on the standard board through the public engine
//! API and prints a JSON summary:
//! - `hexsettle-sim --games 20 --seed 7` - twenty four-seat games
//! - `hexsettle-sim --players 3 --profile aggressive --profile defensive`
//! - `hexsettle-sim --config tuning.json` - override rules and AI weights

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use hexsettle_core::layout;
use hexsettle_core::{Bot, BotConfig, CoachConfig, GameState, PlayerId, RulesConfig, StrategyProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hexsettle-sim")]
#[command(about = "Play bot-vs-bot hexsettle matches", version)]
struct Cli {
    /// Seats at the table
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=4))]
    players: u8,

    /// Games to play
    #[arg(long, default_value_t = 1)]
    games: u32,

    /// Base seed; game `i` uses `seed + i`
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Strategy per seat, repeated in order when shorter than the table
    #[arg(long = "profile")]
    profiles: Vec<StrategyProfile>,

    /// Moves before a game is abandoned
    #[arg(long, default_value_t = 5_000)]
    max_moves: usize,

    /// JSON file with `rules`, `coach` and `bot` sections
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Tunables loaded from `--config`; every section is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct SimConfig {
    rules: RulesConfig,
    coach: CoachConfig,
    bot: BotConfig,
}

impl SimConfig {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[derive(Debug, Serialize)]
struct GameSummary {
    game: u32,
    seed: u64,
    winner: Option<PlayerId>,
    moves: usize,
    turns: u32,
    victory_points: Vec<u32>,
    profiles: Vec<StrategyProfile>,
}

#[derive(Debug, Default, Serialize)]
struct SimSummary {
    games: Vec<GameSummary>,
    /// Wins per profile name
    wins: BTreeMap<String, u32>,
    unfinished: u32,
}

fn seat_profiles(requested: &[StrategyProfile], players: u8) -> Vec<StrategyProfile> {
    if requested.is_empty() {
        return vec![StrategyProfile::default(); players as usize];
    }
    requested.iter().copied().cycle().take(players as usize).collect()
}

fn play_game(game: u32, seed: u64, profiles: &[StrategyProfile], max_moves: usize, config: &SimConfig) -> Result<GameSummary> {
    let board = layout::standard_board()?.with_geometry_capacity(config.coach.geometry_cache_capacity);
    let names = (1..=profiles.len())
        .map(|seat| format!("Bot {seat}"))
        .collect();
    let mut state = GameState::new(board, names, config.rules.clone())?;

    let mut bots: Vec<Bot> = profiles
        .iter()
        .enumerate()
        .map(|(seat, profile)| {
            Bot::new(seat as PlayerId, *profile, seed.wrapping_add(seat as u64))
                .with_config(config.bot.clone(), config.coach.clone())
        })
        .collect();

    let mut moves = 0;
    while moves < max_moves && !state.is_finished() {
        let actor = state.acting_player();
        let Some(bot) = bots.get_mut(actor as usize) else {
            bail!("no bot seated for player {actor}");
        };
        let Some((mv, events)) = bot.take_turn_step(&mut state)? else {
            bail!("player {actor} had no legal move in stage {}", state.stage);
        };
        debug!(game, player = actor, kind = %mv.kind(), events = events.len(), "move played");
        moves += 1;
    }

    let victory_points: Vec<u32> = state.players.iter().map(|p| p.victory_points).collect();
    match state.winner {
        Some(winner) => info!(game, seed, winner, moves, turns = state.turn_number, "game finished"),
        None => warn!(game, seed, moves, "game abandoned at move limit"),
    }

    Ok(GameSummary {
        game,
        seed,
        winner: state.winner,
        moves,
        turns: state.turn_number,
        victory_points,
        profiles: profiles.to_vec(),
    })
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let profiles = seat_profiles(&cli.profiles, cli.players);

    info!(players = cli.players, games = cli.games, seed = cli.seed, "starting simulation");

    let mut summary = SimSummary::default();
    for game in 0..cli.games {
        let seed = cli.seed.wrapping_add(u64::from(game));
        let result = play_game(game, seed, &profiles, cli.max_moves, &config)?;
        match result.winner.and_then(|w| result.profiles.get(w as usize)) {
            Some(profile) => *summary.wins.entry(profile.to_string()).or_default() += 1,
            None => summary.unfinished += 1,
        }
        summary.games.push(result);
    }

    info!(wins = ?summary.wins, unfinished = summary.unfinished, "simulation complete");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profiles_cycle_over_seats() {
        let seats = seat_profiles(&[StrategyProfile::Aggressive, StrategyProfile::Expansive], 3);
        assert_eq!(
            seats,
            vec![
                StrategyProfile::Aggressive,
                StrategyProfile::Expansive,
                StrategyProfile::Aggressive
            ]
        );
        assert_eq!(seat_profiles(&[], 2), vec![StrategyProfile::Balanced; 2]);
    }

    #[test]
    fn test_config_sections_default() {
        let config: SimConfig = serde_json::from_str(r#"{"rules": {"victory_target": 6}}"#).unwrap();
        assert_eq!(config.rules.victory_target, 6);
        assert_eq!(config.rules.discard_threshold, 7);
        assert_eq!(config.coach, CoachConfig::default());
        assert_eq!(config.bot, BotConfig::default());
    }

    #[test]
    fn test_cli_rejects_bad_seat_count() {
        assert!(Cli::try_parse_from(["hexsettle-sim", "--players", "5"]).is_err());
        let cli = Cli::try_parse_from(["hexsettle-sim", "--players", "3", "--profile", "defensive"]).unwrap();
        assert_eq!(cli.players, 3);
        assert_eq!(cli.profiles, vec![StrategyProfile::Defensive]);
    }

    #[test]
    fn test_short_game_is_reproducible() {
        let config = SimConfig {
            rules: RulesConfig {
                victory_target: 4,
                ..RulesConfig::default()
            },
            ..SimConfig::default()
        };
        let profiles = seat_profiles(&[], 2);
        let first = play_game(0, 9, &profiles, 3_000, &config).unwrap();
        let second = play_game(0, 9, &profiles, 3_000, &config).unwrap();
        assert_eq!(first.moves, second.moves);
        assert_eq!(first.winner, second.winner);
        assert_eq!(first.victory_points, second.victory_points);
    }
}
