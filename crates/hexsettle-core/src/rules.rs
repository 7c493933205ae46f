//! Rule validation engine.
//!
//! Every rule of the game lives here as a pure predicate over a
//! [`GameState`]. Validators never fail: they return a [`Validation`]
//! carrying a human-readable reason, which enumeration, bots and UIs use
//! directly. Executors in [`crate::game`] turn a rejection into a
//! [`GameError`] with [`Validation::into_result`].
//!
//! Which move kinds may be attempted at all is decided by a static
//! stage table, [`STAGE_TABLE`], before any per-move rule runs.

use crate::actions::{DiscardBundle, GameMove, MoveKind};
use crate::board::{Board, BuildingKind, PlayerId, PortKind, Resource};
use crate::game::{GameError, GameState};
use crate::hex::{CubeCoord, EdgeCoord, VertexCoord};
use crate::player::costs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Reason given for any move attempted outside its stage or seat
pub const NOT_YOUR_TURN: &str = "not your turn/stage";

/// Reason given once a winner exists
pub const GAME_OVER: &str = "game is over";

/// Bank rate without any port
pub const BASE_TRADE_RATE: u32 = 4;

/// Tunable rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Victory points that end the game
    pub victory_target: u32,
    /// Players holding more than this many cards discard on a 7
    pub discard_threshold: u32,
    /// Whether the robber's hex stops producing
    pub robber_blocks_production: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            victory_target: 10,
            discard_threshold: 7,
            robber_blocks_production: false,
        }
    }
}

/// Sub-phase of a turn restricting which move kinds are legal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    SetupSettlement,
    SetupRoad,
    Rolling,
    Acting,
    Robber,
    Discard,
}

impl Stage {
    pub fn is_setup(&self) -> bool {
        matches!(self, Stage::SetupSettlement | Stage::SetupRoad)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SetupSettlement => "setup-settlement",
            Stage::SetupRoad => "setup-road",
            Stage::Rolling => "rolling",
            Stage::Acting => "acting",
            Stage::Robber => "robber",
            Stage::Discard => "discard",
        };
        f.write_str(name)
    }
}

/// Move kinds permitted in each stage
pub const STAGE_TABLE: [(Stage, &[MoveKind]); 6] = [
    (Stage::SetupSettlement, &[MoveKind::Settlement]),
    (Stage::SetupRoad, &[MoveKind::Road]),
    (Stage::Rolling, &[MoveKind::RollDice, MoveKind::ResolveRoll]),
    (
        Stage::Acting,
        &[
            MoveKind::Settlement,
            MoveKind::City,
            MoveKind::Road,
            MoveKind::BankTrade,
            MoveKind::EndTurn,
        ],
    ),
    (Stage::Robber, &[MoveKind::MoveRobber]),
    (Stage::Discard, &[MoveKind::Discard]),
];

/// Move kinds the stage table allows in `stage`
pub fn allowed_moves(stage: Stage) -> &'static [MoveKind] {
    STAGE_TABLE
        .iter()
        .find(|(s, _)| *s == stage)
        .map(|(_, kinds)| *kinds)
        .unwrap_or(&[])
}

/// Who is acting, in which stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageContext {
    pub player: PlayerId,
    pub stage: Stage,
}

/// Outcome of a validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Validation {
    Ok,
    Rejected(String),
}

impl Validation {
    pub fn reject(reason: impl Into<String>) -> Self {
        Validation::Rejected(reason.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Validation::Ok)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Validation::Ok => None,
            Validation::Rejected(reason) => Some(reason),
        }
    }

    /// Re-raise a rejection as a domain error
    pub fn into_result(self, kind: MoveKind) -> Result<(), GameError> {
        match self {
            Validation::Ok => Ok(()),
            Validation::Rejected(reason) => Err(GameError::IllegalMove { kind, reason }),
        }
    }
}

macro_rules! ensure {
    ($cond:expr, $($reason:tt)+) => {
        if !$cond {
            return Validation::Rejected(format!($($reason)+));
        }
    };
}

// ==================== Entry Point ====================

/// Decide whether `mv` is legal for `ctx.player` in `ctx.stage`
pub fn validate_move(state: &GameState, ctx: &StageContext, mv: &GameMove) -> Validation {
    ensure!(state.winner.is_none(), "{GAME_OVER}");
    ensure!(allowed_moves(ctx.stage).contains(&mv.kind()), "{NOT_YOUR_TURN}");
    ensure!(
        ctx.stage == state.stage && state.may_act(ctx.player),
        "{NOT_YOUR_TURN}"
    );
    ensure!(state.player(ctx.player).is_some(), "unknown player {}", ctx.player);

    match mv {
        GameMove::PlaceSettlement { vertex } => validate_settlement(state, ctx, vertex),
        GameMove::BuildCity { vertex } => validate_city(state, ctx.player, vertex),
        GameMove::PlaceRoad { edge } => validate_road(state, ctx, edge),
        GameMove::BankTrade => validate_bank_trade(state, ctx.player),
        GameMove::MoveRobber { hex, victim } => validate_robber(state, ctx.player, hex, *victim),
        GameMove::Discard { bundle } => validate_discard(state, ctx.player, bundle),
        GameMove::RollDice => {
            ensure!(state.pending_roll.is_none(), "dice already rolled");
            Validation::Ok
        }
        GameMove::ResolveRoll => {
            ensure!(state.pending_roll.is_some(), "no roll to resolve");
            Validation::Ok
        }
        GameMove::EndTurn => {
            ensure!(state.stage == Stage::Acting, "{NOT_YOUR_TURN}");
            Validation::Ok
        }
    }
}

// ==================== Building ====================

pub fn validate_settlement(state: &GameState, ctx: &StageContext, vertex: &VertexCoord) -> Validation {
    let board = &state.board;
    ensure!(board.is_on_board_vertex(vertex), "vertex {vertex} is not on the board");
    ensure!(board.vertex_at(vertex).is_none(), "vertex {vertex} is occupied");
    ensure!(
        board.satisfies_distance_rule(vertex),
        "vertex {vertex} is too close to another settlement"
    );

    if !ctx.stage.is_setup() {
        let connected = vertex
            .edges()
            .iter()
            .any(|e| board.edge_at(e).is_some_and(|road| road.owner == ctx.player));
        ensure!(connected, "vertex {vertex} is not connected to your roads");
        ensure!(
            state.resources_of(ctx.player).can_afford(&costs::settlement()),
            "cannot afford settlement"
        );
    }
    Validation::Ok
}

pub fn validate_city(state: &GameState, player: PlayerId, vertex: &VertexCoord) -> Validation {
    let own_settlement = state
        .board
        .vertex_at(vertex)
        .is_some_and(|b| b.owner == player && b.kind == BuildingKind::Settlement);
    ensure!(own_settlement, "no settlement of yours at {vertex}");
    ensure!(
        state.resources_of(player).can_afford(&costs::city()),
        "cannot afford city"
    );
    Validation::Ok
}

pub fn validate_road(state: &GameState, ctx: &StageContext, edge: &EdgeCoord) -> Validation {
    let board = &state.board;
    ensure!(board.is_on_board_edge(edge), "edge {edge} is not on the board");
    ensure!(board.edge_at(edge).is_none(), "edge {edge} is occupied");

    if ctx.stage.is_setup() {
        let touches_new = state
            .last_setup_vertex
            .is_some_and(|v| edge.endpoints().contains(&v));
        ensure!(touches_new, "setup road must touch the settlement just placed");
        return Validation::Ok;
    }

    ensure!(
        road_connects(board, ctx.player, edge),
        "edge {edge} is not connected to your network"
    );
    ensure!(
        state.resources_of(ctx.player).can_afford(&costs::road()),
        "cannot afford road"
    );
    Validation::Ok
}

/// An endpoint owned by `player` connects; otherwise an unowned endpoint
/// with one of the player's roads on it does. Opponent buildings block.
pub fn road_connects(board: &Board, player: PlayerId, edge: &EdgeCoord) -> bool {
    edge.endpoints().iter().any(|endpoint| match board.owner_at(endpoint) {
        Some(owner) => owner == player,
        None => endpoint
            .edges()
            .iter()
            .filter(|e| *e != edge)
            .any(|e| board.edge_at(e).is_some_and(|road| road.owner == player)),
    })
}

// ==================== Trading ====================

/// Resources exchanged by a bank trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradePlan {
    pub give: Resource,
    pub rate: u32,
    pub receive: Resource,
}

/// Effective rate for `resource`: specific port, then generic, then 4:1
pub fn trade_rate(ports: &[PortKind], resource: Resource) -> u32 {
    if ports.contains(&PortKind::Specific(resource)) {
        PortKind::Specific(resource).rate()
    } else if ports.contains(&PortKind::Generic) {
        PortKind::Generic.rate()
    } else {
        BASE_TRADE_RATE
    }
}

/// Pick the trade the engine would make for `player`.
///
/// Gives the eligible resource with the largest surplus over its rate and
/// receives the least-held other resource. Ties go to the earlier resource
/// in priority order.
pub fn plan_bank_trade(state: &GameState, player: PlayerId) -> Option<TradePlan> {
    let hand = state.resources_of(player);
    let ports = state.board.player_ports(player);

    let mut best: Option<(Resource, u32, u32)> = None;
    for resource in Resource::ALL {
        let rate = trade_rate(&ports, resource);
        let held = hand.get(resource);
        if held < rate {
            continue;
        }
        let surplus = held - rate;
        if best.map_or(true, |(_, _, s)| surplus > s) {
            best = Some((resource, rate, surplus));
        }
    }
    let (give, rate, _) = best?;

    let mut receive: Option<(Resource, u32)> = None;
    for resource in Resource::ALL.into_iter().filter(|r| *r != give) {
        let held = hand.get(resource);
        if receive.map_or(true, |(_, h)| held < h) {
            receive = Some((resource, held));
        }
    }
    let (receive, _) = receive?;

    Some(TradePlan { give, rate, receive })
}

pub fn validate_bank_trade(state: &GameState, player: PlayerId) -> Validation {
    ensure!(
        plan_bank_trade(state, player).is_some(),
        "no resource meets its trade rate"
    );
    Validation::Ok
}

// ==================== Robber ====================

/// Opponents with a building on `hex` who hold at least one card
pub fn potential_victims(state: &GameState, thief: PlayerId, hex: &CubeCoord) -> BTreeSet<PlayerId> {
    state
        .board
        .owners_on_hex(hex)
        .into_iter()
        .filter(|&p| p != thief && !state.resources_of(p).is_empty())
        .collect()
}

pub fn validate_robber(
    state: &GameState,
    player: PlayerId,
    hex: &CubeCoord,
    victim: Option<PlayerId>,
) -> Validation {
    ensure!(state.board.is_land(hex), "hex {hex} is not a land hex on the board");
    ensure!(*hex != state.robber, "robber must move to a different hex");

    let victims = potential_victims(state, player, hex);
    match victim {
        Some(v) => ensure!(victims.contains(&v), "player {v} cannot be robbed at {hex}"),
        None => ensure!(victims.is_empty(), "a victim must be chosen at {hex}"),
    }
    Validation::Ok
}

// ==================== Discard ====================

pub fn validate_discard(state: &GameState, player: PlayerId, bundle: &DiscardBundle) -> Validation {
    let Some(&required) = state.pending_discards.get(&player) else {
        return Validation::reject("no discard owed");
    };
    ensure!(!bundle.has_negative(), "negative discard quantities are not allowed");
    let Some(hand) = bundle.to_hand() else {
        return Validation::reject("negative discard quantities are not allowed");
    };
    ensure!(
        state.resources_of(player).can_afford(&hand),
        "cannot discard cards you do not hold"
    );
    ensure!(
        hand.total() == required,
        "must discard exactly {required} cards"
    );
    Validation::Ok
}
