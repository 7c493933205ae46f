//! Core game state machine.
//!
//! This module contains the `GameState` struct, the move executors and
//! resource distribution. Executors re-run the matching validator from
//! [`crate::rules`] before touching anything, so a move that skipped
//! validation fails with a [`GameError`] instead of corrupting state.

use crate::actions::{GameEvent, GameMove, MoveKind};
use crate::board::{Board, BoardError, PlayerId, Terrain};
use crate::hex::{CubeCoord, EdgeCoord, IdError, VertexCoord};
use crate::layout;
use crate::player::{costs, Player, ResourceHand};
use crate::rng::RandomSource;
use crate::rules::{self, RulesConfig, Stage, StageContext, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Seats supported by the rules
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

/// Errors raised by executors
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("illegal {kind}: {reason}")]
    IllegalMove { kind: MoveKind, reason: String },

    #[error("malformed identifier: {0}")]
    MalformedId(#[from] IdError),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("invalid board: {0}")]
    Board(#[from] BoardError),

    #[error("a game needs 2-4 players, got {0}")]
    PlayerCount(usize),

    #[error("game is over")]
    GameOver,
}

/// The complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The game board
    pub board: Board,
    /// All players, indexed by id
    pub players: Vec<Player>,
    /// Whose turn it is
    pub current_player: PlayerId,
    pub stage: Stage,
    /// Turn number (0 during setup)
    pub turn_number: u32,
    /// Hex the robber sits on
    pub robber: CubeCoord,
    /// Dice thrown but not yet resolved
    pub pending_roll: Option<(u8, u8)>,
    /// Total of the last resolved roll
    pub last_roll: Option<u8>,
    /// Players who owe a discard, with the number of cards owed
    pub pending_discards: BTreeMap<PlayerId, u32>,
    /// Settlement placed this setup turn, which the setup road must touch
    pub last_setup_vertex: Option<VertexCoord>,
    pub last_event: Option<GameEvent>,
    pub winner: Option<PlayerId>,
    pub rules: RulesConfig,
    /// Setup turns completed (settlement plus road)
    setup_turns: usize,
}

impl GameState {
    /// Start a game on `board`. The robber starts on the desert (or the
    /// first land hex if there is none).
    pub fn new(board: Board, player_names: Vec<String>, rules: RulesConfig) -> Result<Self, GameError> {
        let count = player_names.len();
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
            return Err(GameError::PlayerCount(count));
        }

        let players = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Player::new(i as PlayerId, name))
            .collect();

        let robber = board
            .land_hexes()
            .find(|h| h.terrain == Terrain::Desert)
            .or_else(|| board.land_hexes().next())
            .map(|h| h.coord)
            .unwrap_or(CubeCoord::ORIGIN);

        Ok(Self {
            board,
            players,
            current_player: 0,
            stage: Stage::SetupSettlement,
            turn_number: 0,
            robber,
            pending_roll: None,
            last_roll: None,
            pending_discards: BTreeMap::new(),
            last_setup_vertex: None,
            last_event: None,
            winner: None,
            rules,
            setup_turns: 0,
        })
    }

    /// A game on the standard board with default rules
    pub fn standard(player_count: usize) -> Result<Self, GameError> {
        let board = layout::standard_board()?;
        let names = (1..=player_count).map(|i| format!("Player {i}")).collect();
        Self::new(board, names, RulesConfig::default())
    }

    // ==================== Query Methods ====================

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    fn seat_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(id as usize)
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// A player's hand; empty for unknown ids
    pub fn resources_of(&self, id: PlayerId) -> ResourceHand {
        self.player(id).map(|p| p.resources).unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// The player expected to move now. During discards this is the
    /// lowest seat still owing cards.
    pub fn acting_player(&self) -> PlayerId {
        match self.stage {
            Stage::Discard => self
                .pending_discards
                .keys()
                .next()
                .copied()
                .unwrap_or(self.current_player),
            _ => self.current_player,
        }
    }

    /// Whether `player` may move in the current stage. Any player owing a
    /// discard may discard; otherwise only the current player acts.
    pub fn may_act(&self, player: PlayerId) -> bool {
        match self.stage {
            Stage::Discard => self.pending_discards.contains_key(&player),
            _ => player == self.current_player,
        }
    }

    pub fn stage_context(&self) -> StageContext {
        StageContext {
            player: self.acting_player(),
            stage: self.stage,
        }
    }

    /// Whether setup is in its second (reverse) round
    pub fn in_second_setup_round(&self) -> bool {
        self.stage.is_setup() && self.setup_turns >= self.player_count()
    }

    /// Seat placing during setup turn `turn`: forward, then backward
    fn setup_seat(&self, turn: usize) -> PlayerId {
        let n = self.player_count();
        let seat = if turn < n { turn } else { 2 * n - 1 - turn };
        seat as PlayerId
    }

    // ==================== Validation & Execution ====================

    pub fn validate_move(&self, ctx: &StageContext, mv: &GameMove) -> Validation {
        rules::validate_move(self, ctx, mv)
    }

    /// Apply a move, returning the events it produced
    pub fn execute_move<R: RandomSource>(
        &mut self,
        ctx: &StageContext,
        mv: &GameMove,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.winner.is_some() {
            return Err(GameError::GameOver);
        }
        if self.player(ctx.player).is_none() {
            return Err(GameError::UnknownPlayer(ctx.player));
        }

        let kind = mv.kind();
        let verdict = rules::validate_move(self, ctx, mv);
        if let Some(reason) = verdict.reason() {
            warn!(player = ctx.player, %kind, reason, "executor refused unvalidated move");
        }
        verdict.into_result(kind)?;

        let player = ctx.player;
        let mut events = match mv {
            GameMove::PlaceSettlement { vertex } => self.place_settlement(player, *vertex)?,
            GameMove::BuildCity { vertex } => self.build_city(player, *vertex)?,
            GameMove::PlaceRoad { edge } => self.place_road(player, *edge)?,
            GameMove::BankTrade => self.bank_trade(player)?,
            GameMove::MoveRobber { hex, victim } => self.move_robber(player, *hex, *victim, rng)?,
            GameMove::Discard { bundle } => {
                let hand = bundle.to_hand().ok_or_else(|| GameError::IllegalMove {
                    kind,
                    reason: "negative discard quantities are not allowed".to_string(),
                })?;
                self.discard(player, hand)?
            }
            GameMove::RollDice => self.roll_dice(player, rng),
            GameMove::ResolveRoll => self.resolve_roll()?,
            GameMove::EndTurn => self.end_turn(player),
        };

        debug!(player, %kind, events = events.len(), "move executed");
        events.extend(self.check_win_condition(player));
        if let Some(last) = events.last() {
            self.last_event = Some(last.clone());
        }
        Ok(events)
    }

    /// Credit every owner of a building on a hex whose token matches `roll`:
    /// one card per settlement, two per city. A 7 credits nothing.
    pub fn distribute_resources(&mut self, roll: u8) -> BTreeMap<PlayerId, ResourceHand> {
        let blocked = self.rules.robber_blocks_production.then_some(self.robber);
        let distribution = self.board.production_for_roll(roll, blocked);
        for (&id, gained) in &distribution {
            if let Some(player) = self.players.get_mut(id as usize) {
                player.resources.add_hand(gained);
            }
        }
        distribution
    }

    // ==================== Executors ====================

    fn debit(&mut self, player: PlayerId, kind: MoveKind, cost: &ResourceHand) -> Result<(), GameError> {
        if self.seat_mut(player)?.resources.try_subtract(cost) {
            Ok(())
        } else {
            Err(GameError::IllegalMove {
                kind,
                reason: format!("cannot afford {kind}"),
            })
        }
    }

    fn place_settlement(&mut self, player: PlayerId, vertex: VertexCoord) -> Result<Vec<GameEvent>, GameError> {
        let setup = self.stage.is_setup();
        if !setup {
            self.debit(player, MoveKind::Settlement, &costs::settlement())?;
        }

        self.board.place_settlement(vertex, player);
        let seat = self.seat_mut(player)?;
        seat.settlements.push(vertex);
        seat.victory_points += 1;

        let mut events = vec![GameEvent::SettlementBuilt {
            player,
            vertex,
            setup,
        }];

        if setup {
            if self.in_second_setup_round() {
                let mut granted = ResourceHand::new();
                for hex in self.board.hexes_at_vertex(&vertex) {
                    if let Some(resource) = hex.resource() {
                        granted.add(resource, 1);
                    }
                }
                if !granted.is_empty() {
                    self.seat_mut(player)?.resources.add_hand(&granted);
                    events.push(GameEvent::SetupResourcesGranted {
                        player,
                        resources: granted,
                    });
                }
            }
            self.last_setup_vertex = Some(vertex);
            self.stage = Stage::SetupRoad;
        }

        Ok(events)
    }

    fn build_city(&mut self, player: PlayerId, vertex: VertexCoord) -> Result<Vec<GameEvent>, GameError> {
        self.debit(player, MoveKind::City, &costs::city())?;
        self.board.upgrade_to_city(vertex);
        self.seat_mut(player)?.victory_points += 1;
        Ok(vec![GameEvent::CityBuilt { player, vertex }])
    }

    fn place_road(&mut self, player: PlayerId, edge: EdgeCoord) -> Result<Vec<GameEvent>, GameError> {
        let setup = self.stage.is_setup();
        if !setup {
            self.debit(player, MoveKind::Road, &costs::road())?;
        }

        self.board.place_road(edge, player);
        self.seat_mut(player)?.roads.push(edge);

        if setup {
            self.advance_setup();
        }
        Ok(vec![GameEvent::RoadBuilt { player, edge }])
    }

    fn advance_setup(&mut self) {
        self.last_setup_vertex = None;
        self.setup_turns += 1;

        if self.setup_turns >= 2 * self.player_count() {
            self.current_player = 0;
            self.turn_number = 1;
            self.stage = Stage::Rolling;
            debug!("setup complete");
        } else {
            self.current_player = self.setup_seat(self.setup_turns);
            self.stage = Stage::SetupSettlement;
        }
    }

    fn bank_trade(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        let Some(plan) = rules::plan_bank_trade(self, player) else {
            return Err(GameError::IllegalMove {
                kind: MoveKind::BankTrade,
                reason: "no resource meets its trade rate".to_string(),
            });
        };

        self.debit(player, MoveKind::BankTrade, &ResourceHand::single(plan.give, plan.rate))?;
        self.seat_mut(player)?.resources.add(plan.receive, 1);

        Ok(vec![GameEvent::BankTraded {
            player,
            gave: plan.give,
            gave_count: plan.rate,
            received: plan.receive,
        }])
    }

    fn move_robber<R: RandomSource>(
        &mut self,
        player: PlayerId,
        hex: CubeCoord,
        victim: Option<PlayerId>,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        let from = std::mem::replace(&mut self.robber, hex);
        let mut events = vec![GameEvent::RobberMoved {
            player,
            from,
            to: hex,
        }];

        if let Some(victim) = victim {
            let stolen = self.seat_mut(victim)?.resources.steal_weighted(rng);
            if let Some(resource) = stolen {
                self.seat_mut(player)?.resources.add(resource, 1);
                debug!(thief = player, victim, %resource, "resource stolen");
                events.push(GameEvent::ResourceStolen {
                    thief: player,
                    victim,
                    resource,
                });
            }
        }

        self.stage = Stage::Acting;
        Ok(events)
    }

    fn discard(&mut self, player: PlayerId, hand: ResourceHand) -> Result<Vec<GameEvent>, GameError> {
        self.debit(player, MoveKind::Discard, &hand)?;
        self.pending_discards.remove(&player);
        if self.pending_discards.is_empty() {
            self.stage = Stage::Robber;
        }
        Ok(vec![GameEvent::CardsDiscarded {
            player,
            resources: hand,
        }])
    }

    fn roll_dice<R: RandomSource>(&mut self, player: PlayerId, rng: &mut R) -> Vec<GameEvent> {
        let dice = rng.roll_dice();
        self.pending_roll = Some(dice);
        vec![GameEvent::DiceRolled {
            player,
            dice,
            total: dice.0 + dice.1,
        }]
    }

    fn resolve_roll(&mut self) -> Result<Vec<GameEvent>, GameError> {
        let Some((a, b)) = self.pending_roll.take() else {
            return Err(GameError::IllegalMove {
                kind: MoveKind::ResolveRoll,
                reason: "no roll to resolve".to_string(),
            });
        };
        let roll = a + b;
        self.last_roll = Some(roll);
        debug!(roll, player = self.current_player, "roll resolved");

        if roll != 7 {
            let distribution = self.distribute_resources(roll);
            self.stage = Stage::Acting;
            return Ok(vec![GameEvent::ResourcesDistributed { roll, distribution }]);
        }

        let threshold = self.rules.discard_threshold;
        self.pending_discards = self
            .players
            .iter()
            .filter(|p| p.resources.total() > threshold)
            .map(|p| (p.id, p.resources.total() / 2))
            .collect();

        if self.pending_discards.is_empty() {
            self.stage = Stage::Robber;
            return Ok(vec![GameEvent::ResourcesDistributed {
                roll,
                distribution: BTreeMap::new(),
            }]);
        }

        debug!(players = ?self.pending_discards, "discards queued");
        self.stage = Stage::Discard;
        Ok(vec![GameEvent::DiscardsQueued {
            players: self.pending_discards.clone(),
        }])
    }

    fn end_turn(&mut self, player: PlayerId) -> Vec<GameEvent> {
        let next_player = ((player as usize + 1) % self.player_count()) as PlayerId;
        self.current_player = next_player;
        self.stage = Stage::Rolling;
        self.pending_roll = None;
        self.turn_number += 1;
        vec![GameEvent::TurnEnded {
            player,
            next_player,
        }]
    }

    fn check_win_condition(&mut self, player: PlayerId) -> Option<GameEvent> {
        let victory_points = self.player(player)?.victory_points;
        if victory_points < self.rules.victory_target {
            return None;
        }
        self.winner = Some(player);
        debug!(player, victory_points, "game won");
        Some(GameEvent::GameWon {
            player,
            victory_points,
        })
    }

    // ==================== Test Support ====================

    #[cfg(test)]
    pub(crate) fn force_settlement(&mut self, player: PlayerId, vertex: VertexCoord) {
        self.board.place_settlement(vertex, player);
        self.players[player as usize].settlements.push(vertex);
        self.players[player as usize].victory_points += 1;
    }

    #[cfg(test)]
    pub(crate) fn force_road(&mut self, player: PlayerId, edge: EdgeCoord) {
        self.board.place_road(edge, player);
        self.players[player as usize].roads.push(edge);
    }

    /// Skip setup and put player 0 in `stage`
    #[cfg(test)]
    pub(crate) fn begin_play_for_tests(&mut self, stage: Stage) {
        self.setup_turns = 2 * self.player_count();
        self.last_setup_vertex = None;
        self.current_player = 0;
        self.turn_number = 1;
        self.stage = stage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::DiscardBundle;
    use crate::board::{BuildingKind, Resource};
    use crate::rng::{ScriptedDice, SeededRandom};
    use pretty_assertions::assert_eq;

    fn vertex(id: &str) -> VertexCoord {
        id.parse().unwrap()
    }

    fn play(state: &mut GameState, mv: GameMove, rng: &mut impl RandomSource) -> Vec<GameEvent> {
        let ctx = state.stage_context();
        state.execute_move(&ctx, &mv, rng).unwrap()
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = GameState::standard(3).unwrap();
        assert_eq!(game.stage, Stage::SetupSettlement);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.robber, layout::DESERT);
    }

    #[test]
    fn test_player_count_is_checked() {
        assert_eq!(GameState::standard(1).unwrap_err(), GameError::PlayerCount(1));
        assert_eq!(GameState::standard(5).unwrap_err(), GameError::PlayerCount(5));
    }

    #[test]
    fn test_setup_is_snake_ordered() {
        let mut game = GameState::standard(3).unwrap();
        let mut rng = SeededRandom::new(5);
        let mut seats = Vec::new();
        let spots: Vec<VertexCoord> = game
            .board
            .land_vertices()
            .into_iter()
            .collect();

        while game.stage.is_setup() {
            seats.push(game.current_player);
            let spot = spots
                .iter()
                .copied()
                .find(|v| game.validate_move(&game.stage_context(), &GameMove::PlaceSettlement { vertex: *v }).is_ok())
                .unwrap();
            play(&mut game, GameMove::PlaceSettlement { vertex: spot }, &mut rng);
            let road = spot.edges().into_iter().find(|e| game.board.is_on_board_edge(e)).unwrap();
            play(&mut game, GameMove::PlaceRoad { edge: road }, &mut rng);
        }

        assert_eq!(seats, vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(game.stage, Stage::Rolling);
        assert_eq!(game.current_player, 0);
        for player in &game.players {
            assert_eq!(player.settlements.len(), 2);
            assert_eq!(player.roads.len(), 2);
            assert_eq!(player.victory_points, 2);
        }
    }

    #[test]
    fn test_second_setup_settlement_grants_resources() {
        let mut game = GameState::standard(2).unwrap();
        game.setup_turns = 2;
        game.current_player = 1;
        let mut rng = SeededRandom::new(1);

        // Corner of hexes (1,-1,0), (1,0,-1), (2,-1,-1): all producing
        let spot = vertex("1,-1,0_1,0,-1_2,-1,-1");
        let events = play(&mut game, GameMove::PlaceSettlement { vertex: spot }, &mut rng);

        let expected: u32 = game
            .board
            .hexes_at_vertex(&spot)
            .iter()
            .filter(|h| h.resource().is_some())
            .count() as u32;
        assert_eq!(game.players[1].resources.total(), expected);
        assert!(matches!(events.last(), Some(GameEvent::SetupResourcesGranted { player: 1, .. })));
    }

    #[test]
    fn test_roll_then_resolve() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Rolling);
        let mut dice = ScriptedDice::rolls(&[8]);

        let ctx = game.stage_context();
        assert!(!game.validate_move(&ctx, &GameMove::ResolveRoll).is_ok());

        let events = play(&mut game, GameMove::RollDice, &mut dice);
        assert_eq!(
            events,
            vec![GameEvent::DiceRolled {
                player: 0,
                dice: (6, 2),
                total: 8,
            }]
        );
        assert_eq!(game.stage, Stage::Rolling);
        assert!(!game.validate_move(&game.stage_context(), &GameMove::RollDice).is_ok());

        play(&mut game, GameMove::ResolveRoll, &mut dice);
        assert_eq!(game.stage, Stage::Acting);
        assert_eq!(game.last_roll, Some(8));
        assert_eq!(game.pending_roll, None);
    }

    #[test]
    fn test_distribution_credits_settlements_and_cities() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        let hex = game
            .board
            .land_hexes()
            .find(|h| h.token == Some(6))
            .cloned()
            .unwrap();
        let resource = hex.resource().unwrap();
        let corners = hex.coord.vertices();
        game.force_settlement(0, corners[0]);
        game.force_settlement(1, corners[3]);
        game.board.upgrade_to_city(corners[3]);

        let distribution = game.distribute_resources(6);
        assert!(distribution[&0].get(resource) >= 1);
        assert!(distribution[&1].get(resource) >= 2);
        assert_eq!(game.players[1].resources, distribution[&1]);
        assert!(game.distribute_resources(7).is_empty());
    }

    #[test]
    fn test_robber_blocking_toggle() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        let hex = game
            .board
            .land_hexes()
            .find(|h| h.token == Some(9))
            .map(|h| h.coord)
            .unwrap();
        game.force_settlement(0, hex.vertices()[0]);
        game.robber = hex;

        let open = game.distribute_resources(9)[&0].total();
        game.rules.robber_blocks_production = true;
        let blocked = game.distribute_resources(9).get(&0).map_or(0, |h| h.total());
        assert_eq!(blocked, open - 1);
    }

    #[test]
    fn test_seven_queues_discards_then_robber() {
        let mut game = GameState::standard(3).unwrap();
        game.begin_play_for_tests(Stage::Rolling);
        game.players[1].resources = ResourceHand::with_amounts(3, 3, 3, 0, 0);
        game.players[2].resources = ResourceHand::with_amounts(2, 2, 2, 1, 0);
        let mut dice = ScriptedDice::rolls(&[7]);

        play(&mut game, GameMove::RollDice, &mut dice);
        let events = play(&mut game, GameMove::ResolveRoll, &mut dice);

        assert_eq!(game.stage, Stage::Discard);
        assert_eq!(game.pending_discards, BTreeMap::from([(1, 4)]));
        assert!(matches!(events[0], GameEvent::DiscardsQueued { .. }));
        assert_eq!(game.acting_player(), 1);

        let bundle = DiscardBundle::from(ResourceHand::with_amounts(2, 2, 0, 0, 0));
        play(&mut game, GameMove::Discard { bundle }, &mut dice);
        assert_eq!(game.players[1].resources, ResourceHand::with_amounts(1, 1, 3, 0, 0));
        assert_eq!(game.stage, Stage::Robber);
        assert_eq!(game.acting_player(), 0);
    }

    #[test]
    fn test_seven_with_small_hands_goes_to_robber() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Rolling);
        let mut dice = ScriptedDice::rolls(&[7]);
        play(&mut game, GameMove::RollDice, &mut dice);
        play(&mut game, GameMove::ResolveRoll, &mut dice);
        assert_eq!(game.stage, Stage::Robber);
        assert!(game.pending_discards.is_empty());
    }

    #[test]
    fn test_robber_steals_only_held_type() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Robber);
        let target = CubeCoord::axial(1, -1).unwrap();
        game.force_settlement(1, target.vertices()[0]);
        game.players[1].resources = ResourceHand::single(Resource::Ore, 6);
        let mut rng = SeededRandom::new(99);

        let events = play(
            &mut game,
            GameMove::MoveRobber {
                hex: target,
                victim: Some(1),
            },
            &mut rng,
        );

        assert_eq!(game.robber, target);
        assert_eq!(game.players[0].resources, ResourceHand::single(Resource::Ore, 1));
        assert_eq!(game.players[1].resources.ore, 5);
        assert_eq!(
            events.last(),
            Some(&GameEvent::ResourceStolen {
                thief: 0,
                victim: 1,
                resource: Resource::Ore,
            })
        );
        assert_eq!(game.last_event, events.last().cloned());
        assert_eq!(game.stage, Stage::Acting);
    }

    #[test]
    fn test_build_and_upgrade() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        let home = vertex("0,0,0_1,-1,0_1,0,-1");
        game.force_settlement(0, home);
        game.players[0].resources = ResourceHand::with_amounts(1, 1, 0, 2, 3);
        let mut rng = SeededRandom::new(0);

        let road = home.edges()[0];
        play(&mut game, GameMove::PlaceRoad { edge: road }, &mut rng);
        assert_eq!(game.board.edge_at(&road).map(|r| r.owner), Some(0));

        play(&mut game, GameMove::BuildCity { vertex: home }, &mut rng);
        assert_eq!(game.board.vertex_at(&home).map(|b| b.kind), Some(BuildingKind::City));
        assert_eq!(game.players[0].victory_points, 2);
        assert!(game.players[0].resources.is_empty());
    }

    #[test]
    fn test_bank_trade_moves_cards() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 5, 0, 0);
        let mut rng = SeededRandom::new(0);

        let events = play(&mut game, GameMove::BankTrade, &mut rng);
        assert_eq!(game.players[0].resources, ResourceHand::with_amounts(1, 0, 1, 0, 0));
        assert_eq!(
            events,
            vec![GameEvent::BankTraded {
                player: 0,
                gave: Resource::Sheep,
                gave_count: 4,
                received: Resource::Wood,
            }]
        );
    }

    #[test]
    fn test_executor_rejects_unvalidated_move() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        let ctx = game.stage_context();
        let mut rng = SeededRandom::new(0);

        let err = game
            .execute_move(&ctx, &GameMove::BuildCity { vertex: vertex("0,0,0_1,-1,0_1,0,-1") }, &mut rng)
            .unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { kind: MoveKind::City, .. }));

        let ghost = StageContext {
            player: 9,
            stage: Stage::Acting,
        };
        assert_eq!(
            game.execute_move(&ghost, &GameMove::EndTurn, &mut rng).unwrap_err(),
            GameError::UnknownPlayer(9)
        );
    }

    #[test]
    fn test_end_turn_rotates() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        let mut rng = SeededRandom::new(0);
        play(&mut game, GameMove::EndTurn, &mut rng);
        assert_eq!(game.current_player, 1);
        assert_eq!(game.stage, Stage::Rolling);
        assert_eq!(game.turn_number, 2);
    }

    #[test]
    fn test_victory_target_ends_game() {
        let mut game = GameState::standard(2).unwrap();
        game.rules.victory_target = 3;
        game.begin_play_for_tests(Stage::Acting);
        let home = vertex("0,0,0_1,-1,0_1,0,-1");
        game.force_settlement(0, home);
        game.players[0].victory_points = 2;
        game.players[0].resources = costs::city();
        let mut rng = SeededRandom::new(0);

        let events = play(&mut game, GameMove::BuildCity { vertex: home }, &mut rng);
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameWon {
                player: 0,
                victory_points: 3,
            })
        );
        assert!(game.is_finished());

        let ctx = game.stage_context();
        assert_eq!(
            game.validate_move(&ctx, &GameMove::EndTurn).reason(),
            Some(rules::GAME_OVER)
        );
        assert_eq!(
            game.execute_move(&ctx, &GameMove::EndTurn, &mut rng).unwrap_err(),
            GameError::GameOver
        );
    }

    #[test]
    fn test_state_json_round_trip() {
        let mut game = GameState::standard(2).unwrap();
        game.begin_play_for_tests(Stage::Acting);
        game.force_settlement(1, vertex("0,0,0_1,-1,0_1,0,-1"));

        let json = serde_json::to_string(&game).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stage, Stage::Acting);
        assert_eq!(back.players[1].settlements, game.players[1].settlements);
        assert!(!back.in_second_setup_round());
        assert_eq!(back.robber, game.robber);
    }
}
