//! Hexsettle - rules and AI core for a hex-board settlement game
//!
//! This crate provides the game logic with no I/O of its own:
//! - Hex, vertex and edge coordinates with validated string IDs
//! - Board and player state
//! - Stage-driven move validation and execution
//! - Legal move enumeration, heuristic scoring and bot players
//!
//! # Architecture
//!
//! Every move, human or bot, goes through the same path: the validator
//! accepts or rejects it, then the executor mutates [`GameState`] and
//! returns the resulting events. Randomness is injected through
//! [`RandomSource`] so a seed replays a whole game.
//!
//! # Modules
//!
//! - [`hex`]: Coordinate system and ID codec
//! - [`board`]: Hexes, buildings, roads, ports and production
//! - [`player`]: Resource hands and player state
//! - [`rules`]: Stage table and validators
//! - [`game`]: Game state and executors
//! - [`movegen`]: Legal move enumeration
//! - [`coach`]: Location scoring
//! - [`bot`]: Bot decision policy

pub mod actions;
pub mod board;
pub mod bot;
pub mod coach;
pub mod game;
pub mod hex;
pub mod layout;
pub mod movegen;
pub mod player;
pub mod rng;
pub mod rules;

// Re-export commonly used types
pub use actions::{DiscardBundle, GameEvent, GameMove, MoveKind};
pub use board::{Board, Building, BuildingKind, Hex, PlayerId, Port, PortKind, Resource, Terrain};
pub use bot::{choose_bot_move, Bot, BotConfig, StrategyProfile};
pub use coach::{Candidate, CoachConfig};
pub use game::{GameError, GameState};
pub use hex::{CubeCoord, EdgeCoord, IdError, VertexCoord};
pub use movegen::{enumerate_current, enumerate_moves};
pub use player::{Player, ResourceHand};
pub use rng::{RandomSource, ScriptedDice, SeededRandom};
pub use rules::{RulesConfig, Stage, StageContext, Validation};
