//! AI bot players.
//!
//! A bot picks one move out of the legal set in three steps:
//! - Settlement placement defers to the coach and ranks spots by score.
//! - Every other move gets its profile weight for the move kind, adjusted
//!   for the situation; only the top-weight group survives, shuffled, then
//!   ordered by coach score where the move has a location.
//! - The final pick walks the ranking with a fixed greed probability, so
//!   top moves win most often but not always.

use crate::actions::{GameEvent, GameMove, MoveKind};
use crate::board::PlayerId;
use crate::coach::{self, CoachConfig};
use crate::game::{GameError, GameState};
use crate::movegen;
use crate::player::{costs, ResourceHand};
use crate::rng::{RandomSource, SeededRandom};
use crate::rules::{self, StageContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Named weight table over move kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyProfile {
    #[default]
    Balanced,
    /// Cities first, robs eagerly
    Aggressive,
    /// Builds up what it has, trades reluctantly
    Defensive,
    /// Roads and new settlements
    Expansive,
}

impl StrategyProfile {
    pub const ALL: [StrategyProfile; 4] = [
        StrategyProfile::Balanced,
        StrategyProfile::Aggressive,
        StrategyProfile::Defensive,
        StrategyProfile::Expansive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyProfile::Balanced => "balanced",
            StrategyProfile::Aggressive => "aggressive",
            StrategyProfile::Defensive => "defensive",
            StrategyProfile::Expansive => "expansive",
        }
    }

    /// Static weight of a move kind
    pub fn weight(&self, kind: MoveKind) -> f64 {
        use MoveKind::*;
        match (self, kind) {
            // forced single-option stages
            (_, RollDice | ResolveRoll | MoveRobber | Discard) => 10.0,

            (StrategyProfile::Balanced, Settlement) => 10.0,
            (StrategyProfile::Balanced, City) => 9.0,
            (StrategyProfile::Balanced, Road) => 5.0,
            (StrategyProfile::Balanced, BankTrade) => 4.0,

            (StrategyProfile::Aggressive, Settlement) => 9.0,
            (StrategyProfile::Aggressive, City) => 10.0,
            (StrategyProfile::Aggressive, Road) => 4.0,
            (StrategyProfile::Aggressive, BankTrade) => 5.0,

            (StrategyProfile::Defensive, Settlement) => 8.0,
            (StrategyProfile::Defensive, City) => 9.0,
            (StrategyProfile::Defensive, Road) => 3.0,
            (StrategyProfile::Defensive, BankTrade) => 2.0,

            (StrategyProfile::Expansive, Settlement) => 10.0,
            (StrategyProfile::Expansive, City) => 6.0,
            (StrategyProfile::Expansive, Road) => 8.0,
            (StrategyProfile::Expansive, BankTrade) => 5.0,

            (_, EndTurn) => 1.0,
        }
    }
}

impl fmt::Display for StrategyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyProfile::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown strategy profile: {s}"))
    }
}

/// Selection and adjustment constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Probability of accepting the current candidate before moving on
    pub greed: f64,
    /// Roads allowed beyond twice the settlement count before fatigue
    pub road_fatigue_slack: usize,
    /// Weight multiplier for roads once fatigued
    pub road_fatigue_factor: f64,
    /// Weight multiplier for an affordable settlement
    pub settlement_ready_boost: f64,
    /// Weight multiplier for a trade that makes a settlement affordable
    pub trade_for_settlement_boost: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            greed: 0.7,
            road_fatigue_slack: 3,
            road_fatigue_factor: 0.25,
            settlement_ready_boost: 1.5,
            trade_for_settlement_boost: 1.3,
        }
    }
}

// ==================== Selection ====================

/// Walk `len` ranked candidates, accepting each with probability `greed`.
/// The last candidate is taken unconditionally.
pub fn select_geometric<R: RandomSource + ?Sized>(len: usize, greed: f64, rng: &mut R) -> usize {
    let last = len.saturating_sub(1);
    for index in 0..last {
        if rng.next_unit() < greed {
            return index;
        }
    }
    last
}

/// Situational weight of one candidate
fn adjusted_weight(state: &GameState, player: PlayerId, mv: &GameMove, profile: StrategyProfile, config: &BotConfig) -> f64 {
    let kind = mv.kind();
    let mut weight = profile.weight(kind);
    let Some(seat) = state.player(player) else {
        return weight;
    };

    match kind {
        MoveKind::Road if !state.stage.is_setup() => {
            if seat.roads.len() > 2 * seat.settlements.len() + config.road_fatigue_slack {
                weight *= config.road_fatigue_factor;
            }
        }
        MoveKind::Settlement if !state.stage.is_setup() => {
            weight *= config.settlement_ready_boost;
        }
        MoveKind::BankTrade => {
            if let Some(plan) = rules::plan_bank_trade(state, player) {
                let mut hand = seat.resources;
                if hand.try_subtract(&ResourceHand::single(plan.give, plan.rate)) {
                    hand.add(plan.receive, 1);
                    if !seat.can_afford_settlement() && hand.can_afford(&costs::settlement()) {
                        weight *= config.trade_for_settlement_boost;
                    }
                }
            }
        }
        _ => {}
    }
    weight
}

/// Robber target value: production taken from opponents minus our own,
/// plus the victim's hand size
fn robber_score(state: &GameState, player: PlayerId, mv: &GameMove) -> f64 {
    let GameMove::MoveRobber { hex, victim } = mv else {
        return 0.0;
    };
    let pips = state
        .board
        .hex_at(hex)
        .and_then(|h| h.token)
        .map_or(0, coach::pips);

    let mut score = 0.0;
    for owner in state.board.owners_on_hex(hex) {
        if owner == player {
            score -= 2.0 * f64::from(pips);
        } else {
            score += f64::from(pips);
        }
    }
    if let Some(victim) = victim {
        score += f64::from(state.resources_of(*victim).total());
    }
    score
}

/// Coach scores keyed by location ID for the kinds present in `moves`
fn location_scores(state: &GameState, player: PlayerId, moves: &[GameMove], coach: &CoachConfig) -> BTreeMap<String, f64> {
    let has = |kind: MoveKind| moves.iter().any(|m| m.kind() == kind);
    let mut scores = BTreeMap::new();
    if has(MoveKind::Settlement) {
        scores.extend(
            coach::score_settlement_candidates(state, player, coach)
                .into_iter()
                .map(|c| (c.location, c.score)),
        );
    }
    if has(MoveKind::City) {
        scores.extend(
            coach::score_city_candidates(state, player, coach)
                .into_iter()
                .map(|c| (c.location, c.score)),
        );
    }
    if has(MoveKind::Road) {
        scores.extend(
            coach::score_road_candidates(state, player, coach)
                .into_iter()
                .map(|c| (c.location, c.score)),
        );
    }
    scores
}

fn move_score(state: &GameState, player: PlayerId, mv: &GameMove, scores: &BTreeMap<String, f64>) -> f64 {
    let location = match mv {
        GameMove::PlaceSettlement { vertex } | GameMove::BuildCity { vertex } => vertex.to_string(),
        GameMove::PlaceRoad { edge } => edge.to_string(),
        GameMove::MoveRobber { .. } => return robber_score(state, player, mv),
        _ => return 0.0,
    };
    scores.get(&location).copied().unwrap_or(0.0)
}

/// Rank `candidates` for `player` and pick one
pub fn choose_bot_move<R: RandomSource>(
    state: &GameState,
    player: PlayerId,
    candidates: &[GameMove],
    profile: StrategyProfile,
    config: &BotConfig,
    coach: &CoachConfig,
    rng: &mut R,
) -> Option<GameMove> {
    if candidates.is_empty() {
        return None;
    }

    let placing = candidates.iter().all(|m| m.kind() == MoveKind::Settlement);
    let mut ranked: Vec<GameMove> = if placing {
        candidates.to_vec()
    } else {
        let weighted: Vec<(f64, &GameMove)> = candidates
            .iter()
            .map(|mv| (adjusted_weight(state, player, mv, profile, config), mv))
            .collect();
        let top = weighted
            .iter()
            .map(|(w, _)| *w)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut group: Vec<GameMove> = weighted
            .into_iter()
            .filter(|(w, _)| (w - top).abs() < f64::EPSILON)
            .map(|(_, mv)| mv.clone())
            .collect();
        rng.shuffle(&mut group);
        group
    };

    let scores = location_scores(state, player, &ranked, coach);
    ranked.sort_by(|a, b| {
        move_score(state, player, b, &scores).total_cmp(&move_score(state, player, a, &scores))
    });

    let index = select_geometric(ranked.len(), config.greed, rng);
    trace!(player, options = ranked.len(), index, %profile, "bot move selected");
    ranked.into_iter().nth(index)
}

// ==================== Bot Driver ====================

/// A seated bot with its own random source
#[derive(Debug, Clone)]
pub struct Bot<R: RandomSource = SeededRandom> {
    pub player_id: PlayerId,
    pub profile: StrategyProfile,
    pub config: BotConfig,
    pub coach: CoachConfig,
    rng: R,
}

impl Bot<SeededRandom> {
    pub fn new(player_id: PlayerId, profile: StrategyProfile, seed: u64) -> Self {
        Self::with_rng(player_id, profile, SeededRandom::new(seed))
    }
}

impl<R: RandomSource> Bot<R> {
    pub fn with_rng(player_id: PlayerId, profile: StrategyProfile, rng: R) -> Self {
        Self {
            player_id,
            profile,
            config: BotConfig::default(),
            coach: CoachConfig::default(),
            rng,
        }
    }

    pub fn with_config(mut self, config: BotConfig, coach: CoachConfig) -> Self {
        self.config = config;
        self.coach = coach;
        self
    }

    /// Choose a move without applying it
    pub fn choose_move(&mut self, state: &GameState) -> Option<GameMove> {
        if state.is_finished() || !state.may_act(self.player_id) {
            return None;
        }
        let ctx = StageContext {
            player: self.player_id,
            stage: state.stage,
        };
        let moves = movegen::enumerate_moves(state, &ctx, self.player_id);
        choose_bot_move(
            state,
            self.player_id,
            &moves,
            self.profile,
            &self.config,
            &self.coach,
            &mut self.rng,
        )
    }

    /// Choose and apply one move. `Ok(None)` when the bot has nothing to do.
    pub fn take_turn_step(&mut self, state: &mut GameState) -> Result<Option<(GameMove, Vec<GameEvent>)>, GameError> {
        let Some(mv) = self.choose_move(state) else {
            return Ok(None);
        };
        let ctx = StageContext {
            player: self.player_id,
            stage: state.stage,
        };
        let events = state.execute_move(&ctx, &mv, &mut self.rng)?;
        Ok(Some((mv, events)))
    }
}
