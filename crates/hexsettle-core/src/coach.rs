//! Heuristic location scoring.
//!
//! The coach ranks settlement spots, city upgrades and road extensions for a
//! player:
//! - Settlement score: pip total, times a scarcity and a diversity
//!   multiplier, plus a need bonus (synergy for the first settlement,
//!   missing resources afterwards). Rounded to one decimal.
//! - City score: the same formula over the player's own settlements.
//! - Road score: a bounded breadth-first projection from the candidate
//!   edge; reachable settlement spots and ports are reduced to a Pareto
//!   frontier over (score, distance) and the best discounted value wins.

use crate::board::{BuildingKind, PlayerId, PortKind, Resource};
use crate::game::GameState;
use crate::hex::{EdgeCoord, VertexCoord};
use crate::rules;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::trace;

/// Tunable scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub scarcity_multiplier: f64,
    /// Board pip share below which a resource counts as scarce
    pub scarcity_threshold: f64,
    pub diversity_multiplier: f64,
    /// Flat bonus for a first settlement on wood+brick or ore+wheat
    pub first_settlement_synergy_bonus: f64,
    /// Bonus per resource a later settlement adds to the player's income
    pub missing_resource_bonus: f64,
    /// Hops explored when projecting a road
    pub road_search_depth: u32,
    /// Discount per extra hop when valuing a projected target
    pub road_distance_decay: f64,
    pub specific_port_weight: f64,
    pub generic_port_weight: f64,
    /// Capacity of the board's geometry cache
    pub geometry_cache_capacity: usize,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            scarcity_multiplier: 1.2,
            scarcity_threshold: 0.10,
            diversity_multiplier: 1.2,
            first_settlement_synergy_bonus: 5.0,
            missing_resource_bonus: 5.0,
            road_search_depth: 6,
            road_distance_decay: 0.85,
            specific_port_weight: 0.5,
            generic_port_weight: 0.2,
            geometry_cache_capacity: crate::board::DEFAULT_GEOMETRY_CACHE_CAPACITY,
        }
    }
}

/// Production weight of a dice token: ways to roll it with two dice
pub fn pips(token: u8) -> u32 {
    match token {
        2 | 12 => 1,
        3 | 11 => 2,
        4 | 10 => 3,
        5 | 9 => 4,
        6 | 8 => 5,
        _ => 0,
    }
}

/// How a candidate's score was put together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pips: u32,
    pub scarcity_multiplier: f64,
    pub diversity_multiplier: f64,
    pub bonus: f64,
    /// Port value, for road projections that end at a port
    pub port_value: f64,
    /// Hops to the target a road projection settled on
    pub distance: Option<u32>,
}

/// A scored location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Vertex or edge ID
    pub location: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.location.cmp(&b.location))
    });
}

// ==================== Economy ====================

/// Board-wide and per-player production figures shared by every score in
/// one request
#[derive(Debug, Clone)]
struct Economy {
    /// Share of all board pips per resource
    board_share: BTreeMap<Resource, f64>,
    /// The player's pips per resource, cities counted twice
    income: BTreeMap<Resource, u32>,
    first_settlement: bool,
}

impl Economy {
    fn new(state: &GameState, player: PlayerId) -> Self {
        let board = &state.board;

        let mut board_pips: BTreeMap<Resource, u32> = BTreeMap::new();
        for hex in board.hexes() {
            if let (Some(resource), Some(token)) = (hex.resource(), hex.token) {
                *board_pips.entry(resource).or_default() += pips(token);
            }
        }
        let total: u32 = board_pips.values().sum();
        let board_share = Resource::ALL
            .into_iter()
            .map(|r| {
                let share = if total == 0 {
                    0.0
                } else {
                    f64::from(board_pips.get(&r).copied().unwrap_or(0)) / f64::from(total)
                };
                (r, share)
            })
            .collect();

        let mut income: BTreeMap<Resource, u32> = BTreeMap::new();
        for (vertex, building) in board.occupied_vertices() {
            if building.owner != player {
                continue;
            }
            for hex in board.hexes_at_vertex(vertex) {
                if let (Some(resource), Some(token)) = (hex.resource(), hex.token) {
                    *income.entry(resource).or_default() += pips(token) * building.yield_multiplier();
                }
            }
        }

        let first_settlement = state
            .player(player)
            .map_or(true, |p| p.settlements.is_empty());

        Self {
            board_share,
            income,
            first_settlement,
        }
    }

    fn produces(&self, resource: Resource) -> bool {
        self.income.contains_key(&resource)
    }

    fn income_of(&self, resource: Resource) -> u32 {
        self.income.get(&resource).copied().unwrap_or(0)
    }

    fn total_income(&self) -> u32 {
        self.income.values().sum()
    }
}

// ==================== Vertex Scoring ====================

fn score_with(state: &GameState, economy: &Economy, config: &CoachConfig, vertex: &VertexCoord) -> Candidate {
    let mut reasons = Vec::new();
    let mut pip_total = 0;
    let mut producing = 0;
    let mut resources = BTreeSet::new();

    for hex in state.board.hexes_at_vertex(vertex) {
        if let (Some(resource), Some(token)) = (hex.resource(), hex.token) {
            pip_total += pips(token);
            producing += 1;
            resources.insert(resource);
        }
    }

    let scarce: Vec<Resource> = resources
        .iter()
        .copied()
        .filter(|r| economy.board_share.get(r).copied().unwrap_or(0.0) < config.scarcity_threshold)
        .collect();
    let scarcity_multiplier = if scarce.is_empty() {
        1.0
    } else {
        for r in &scarce {
            reasons.push(format!("scarce:{r}"));
        }
        config.scarcity_multiplier
    };

    let diversity_multiplier = if producing == 3 && resources.len() == 3 {
        reasons.push("diverse".to_string());
        config.diversity_multiplier
    } else {
        1.0
    };

    let mut bonus = 0.0;
    if economy.first_settlement {
        let has = |r: Resource| resources.contains(&r);
        if (has(Resource::Wood) && has(Resource::Brick)) || (has(Resource::Ore) && has(Resource::Wheat)) {
            bonus += config.first_settlement_synergy_bonus;
            reasons.push("synergy".to_string());
        }
    } else {
        for r in resources.iter().filter(|r| !economy.produces(**r)) {
            bonus += config.missing_resource_bonus;
            reasons.push(format!("needs:{r}"));
        }
    }

    let score = round1(f64::from(pip_total) * scarcity_multiplier * diversity_multiplier + bonus);
    Candidate {
        location: vertex.to_string(),
        score,
        reasons,
        breakdown: ScoreBreakdown {
            pips: pip_total,
            scarcity_multiplier,
            diversity_multiplier,
            bonus,
            port_value: 0.0,
            distance: None,
        },
    }
}

/// Score one vertex as a settlement for `player`, whether or not it is legal
pub fn score_vertex(state: &GameState, player: PlayerId, vertex: &VertexCoord, config: &CoachConfig) -> Candidate {
    score_with(state, &Economy::new(state, player), config, vertex)
}

fn is_open_spot(state: &GameState, vertex: &VertexCoord) -> bool {
    let board = &state.board;
    board.is_on_board_vertex(vertex) && board.vertex_at(vertex).is_none() && board.satisfies_distance_rule(vertex)
}

/// Every open settlement spot on the board, best first
pub fn score_settlement_candidates(state: &GameState, player: PlayerId, config: &CoachConfig) -> Vec<Candidate> {
    let economy = Economy::new(state, player);
    let mut candidates: Vec<Candidate> = state
        .board
        .land_vertices()
        .iter()
        .filter(|v| is_open_spot(state, v))
        .map(|v| score_with(state, &economy, config, v))
        .collect();
    rank(&mut candidates);
    trace!(player, count = candidates.len(), "settlement candidates scored");
    candidates
}

/// The player's settlements that could become cities, best first
pub fn score_city_candidates(state: &GameState, player: PlayerId, config: &CoachConfig) -> Vec<Candidate> {
    let economy = Economy::new(state, player);
    let mut candidates: Vec<Candidate> = state
        .board
        .occupied_vertices()
        .filter(|(_, b)| b.owner == player && b.kind == BuildingKind::Settlement)
        .map(|(v, _)| score_with(state, &economy, config, v))
        .collect();
    rank(&mut candidates);
    candidates
}

// ==================== Road Projection ====================

/// A target reached by a road projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reach {
    pub score: f64,
    pub distance: u32,
}

/// Keep a reach only if it beats every reach at a smaller distance
pub fn pareto_frontier(mut reaches: Vec<Reach>) -> Vec<Reach> {
    reaches.sort_by(|a, b| a.distance.cmp(&b.distance).then(b.score.total_cmp(&a.score)));

    let mut frontier = Vec::new();
    let mut best_closer = f64::NEG_INFINITY;
    let mut best_here = f64::NEG_INFINITY;
    let mut current_distance = None;

    for reach in reaches {
        if current_distance != Some(reach.distance) {
            best_closer = best_closer.max(best_here);
            current_distance = Some(reach.distance);
        }
        if reach.score > best_closer {
            frontier.push(reach);
        }
        best_here = best_here.max(reach.score);
    }
    frontier
}

fn port_value(economy: &Economy, config: &CoachConfig, kind: PortKind) -> f64 {
    match kind {
        PortKind::Specific(resource) => f64::from(economy.income_of(resource)) * config.specific_port_weight,
        PortKind::Generic => f64::from(economy.total_income()) * config.generic_port_weight,
    }
}

struct Projection {
    settlements: Vec<(Reach, VertexCoord)>,
    ports: Vec<(Reach, VertexCoord, PortKind)>,
}

/// Breadth-first walk from both ends of `edge`. Opponent roads are not
/// crossed and nothing is expanded past an opponent's building.
fn project(
    state: &GameState,
    economy: &Economy,
    config: &CoachConfig,
    player: PlayerId,
    edge: &EdgeCoord,
) -> Projection {
    let board = &state.board;
    let mut projection = Projection {
        settlements: Vec::new(),
        ports: Vec::new(),
    };
    let mut visited: BTreeSet<VertexCoord> = BTreeSet::new();
    let mut queue: VecDeque<(VertexCoord, u32)> = VecDeque::new();

    for end in edge.endpoints() {
        if board.is_on_board_vertex(&end) && visited.insert(end) {
            queue.push_back((end, 1));
        }
    }

    while let Some((vertex, distance)) = queue.pop_front() {
        if is_open_spot(state, &vertex) {
            let score = score_with(state, economy, config, &vertex).score;
            projection.settlements.push((Reach { score, distance }, vertex));
        }
        if board.vertex_at(&vertex).is_none() {
            if let Some(port) = board.port_at(&vertex) {
                let score = port_value(economy, config, port.kind);
                projection.ports.push((Reach { score, distance }, vertex, port.kind));
            }
        }

        let blocked = board.owner_at(&vertex).is_some_and(|owner| owner != player);
        if blocked || distance >= config.road_search_depth {
            continue;
        }

        for next_edge in vertex.edges() {
            if !board.is_on_board_edge(&next_edge) {
                continue;
            }
            if board.edge_at(&next_edge).is_some_and(|road| road.owner != player) {
                continue;
            }
            let next = next_edge.other_endpoint(&vertex);
            if board.is_on_board_vertex(&next) && visited.insert(next) {
                queue.push_back((next, distance + 1));
            }
        }
    }

    projection
}

fn score_edge(
    state: &GameState,
    economy: &Economy,
    config: &CoachConfig,
    player: PlayerId,
    edge: &EdgeCoord,
) -> Candidate {
    let projection = project(state, economy, config, player, edge);

    let reaches: Vec<Reach> = projection
        .settlements
        .iter()
        .map(|(r, _)| *r)
        .chain(projection.ports.iter().map(|(r, _, _)| *r))
        .collect();
    let frontier = pareto_frontier(reaches);

    let discounted = |reach: &Reach| reach.score * config.road_distance_decay.powi(reach.distance as i32 - 1);
    let best = frontier
        .iter()
        .max_by(|a, b| discounted(*a).total_cmp(&discounted(*b)))
        .copied();

    let mut reasons = Vec::new();
    let mut breakdown = ScoreBreakdown {
        scarcity_multiplier: 1.0,
        diversity_multiplier: 1.0,
        ..ScoreBreakdown::default()
    };
    let mut score = 0.0;

    if let Some(best) = best {
        score = round1(discounted(&best));
        breakdown.distance = Some(best.distance);
        if let Some((_, vertex)) = projection.settlements.iter().find(|(r, _)| *r == best) {
            reasons.push(format!("settle:{vertex}@{}", best.distance));
        } else if let Some((_, vertex, kind)) = projection.ports.iter().find(|(r, _, _)| *r == best) {
            breakdown.port_value = best.score;
            let label = match kind {
                PortKind::Generic => "generic".to_string(),
                PortKind::Specific(r) => r.to_string(),
            };
            reasons.push(format!("port:{label}:{vertex}@{}", best.distance));
        }
    }

    Candidate {
        location: edge.to_string(),
        score,
        reasons,
        breakdown,
    }
}

/// Unoccupied edges the player could build on, scored by projection
pub fn score_road_candidates(state: &GameState, player: PlayerId, config: &CoachConfig) -> Vec<Candidate> {
    let economy = Economy::new(state, player);
    let board = &state.board;
    let mut candidates: Vec<Candidate> = board
        .land_edges()
        .iter()
        .filter(|e| board.edge_at(e).is_none() && rules::road_connects(board, player, e))
        .map(|e| score_edge(state, &economy, config, player, e))
        .collect();
    rank(&mut candidates);
    trace!(player, count = candidates.len(), "road candidates scored");
    candidates
}

/// Projection score of a single edge
pub fn score_road(state: &GameState, player: PlayerId, edge: &EdgeCoord, config: &CoachConfig) -> Candidate {
    score_edge(state, &Economy::new(state, player), config, player, edge)
}
