//! Legal move generation.
//!
//! Builds the exhaustive set of legal moves for one player in the current
//! stage. Candidates are generated per move kind the stage table allows and
//! then filtered through the validators, so the enumerator can never offer a
//! move the executors would refuse.

use crate::actions::{DiscardBundle, GameMove, MoveKind};
use crate::board::{PlayerId, Resource};
use crate::game::GameState;
use crate::player::ResourceHand;
use crate::rules::{self, StageContext};

/// Every legal move for `player` in `ctx.stage`
pub fn enumerate_moves(state: &GameState, ctx: &StageContext, player: PlayerId) -> Vec<GameMove> {
    let ctx = StageContext {
        player,
        stage: ctx.stage,
    };

    rules::allowed_moves(ctx.stage)
        .iter()
        .flat_map(|&kind| candidates(state, player, kind))
        .filter(|mv| rules::validate_move(state, &ctx, mv).is_ok())
        .collect()
}

/// Legal moves for whoever is due to act now
pub fn enumerate_current(state: &GameState) -> Vec<GameMove> {
    let ctx = state.stage_context();
    enumerate_moves(state, &ctx, ctx.player)
}

/// Unfiltered candidates of one kind
fn candidates(state: &GameState, player: PlayerId, kind: MoveKind) -> Vec<GameMove> {
    let board = &state.board;
    match kind {
        MoveKind::Settlement => board
            .land_vertices()
            .into_iter()
            .map(|vertex| GameMove::PlaceSettlement { vertex })
            .collect(),
        MoveKind::City => state
            .player(player)
            .map(|p| {
                p.settlements
                    .iter()
                    .map(|&vertex| GameMove::BuildCity { vertex })
                    .collect()
            })
            .unwrap_or_default(),
        MoveKind::Road => board
            .land_edges()
            .into_iter()
            .map(|edge| GameMove::PlaceRoad { edge })
            .collect(),
        MoveKind::MoveRobber => robber_candidates(state, player),
        MoveKind::Discard => {
            let owed = state.pending_discards.get(&player).copied().unwrap_or(0);
            discard_bundles(&state.resources_of(player), owed)
                .into_iter()
                .map(|hand| GameMove::Discard {
                    bundle: DiscardBundle::from(hand),
                })
                .collect()
        }
        MoveKind::BankTrade => vec![GameMove::BankTrade],
        MoveKind::RollDice => vec![GameMove::RollDice],
        MoveKind::ResolveRoll => vec![GameMove::ResolveRoll],
        MoveKind::EndTurn => vec![GameMove::EndTurn],
    }
}

/// One move per (land hex, victim) pair, or a victimless move where
/// nobody can be robbed
fn robber_candidates(state: &GameState, player: PlayerId) -> Vec<GameMove> {
    let mut moves = Vec::new();
    for hex in state.board.land_hexes().map(|h| h.coord) {
        let victims = rules::potential_victims(state, player, &hex);
        if victims.is_empty() {
            moves.push(GameMove::MoveRobber { hex, victim: None });
        } else {
            moves.extend(victims.into_iter().map(|v| GameMove::MoveRobber {
                hex,
                victim: Some(v),
            }));
        }
    }
    moves
}

/// Every sub-hand of `hand` with exactly `count` cards
pub fn discard_bundles(hand: &ResourceHand, count: u32) -> Vec<ResourceHand> {
    fn walk(
        hand: &ResourceHand,
        index: usize,
        remaining: u32,
        current: &mut ResourceHand,
        out: &mut Vec<ResourceHand>,
    ) {
        if index == Resource::ALL.len() {
            if remaining == 0 {
                out.push(*current);
            }
            return;
        }
        let resource = Resource::ALL[index];
        for take in 0..=hand.get(resource).min(remaining) {
            current.set(resource, take);
            walk(hand, index + 1, remaining - take, current, out);
        }
        current.set(resource, 0);
    }

    let mut out = Vec::new();
    if count > 0 && count <= hand.total() {
        walk(hand, 0, count, &mut ResourceHand::new(), &mut out);
    }
    out
}
