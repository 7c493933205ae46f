//! Moves that players can make.
//!
//! This module defines the move vocabulary (`MoveKind` plus the argument-
//! carrying `GameMove`) and the events that executed moves produce.

use crate::board::{PlayerId, Resource};
use crate::game::GameError;
use crate::hex::{CubeCoord, EdgeCoord, VertexCoord};
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of a move, without its arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Settlement,
    City,
    Road,
    BankTrade,
    MoveRobber,
    Discard,
    RollDice,
    ResolveRoll,
    EndTurn,
}

impl MoveKind {
    pub const ALL: [MoveKind; 9] = [
        MoveKind::Settlement,
        MoveKind::City,
        MoveKind::Road,
        MoveKind::BankTrade,
        MoveKind::MoveRobber,
        MoveKind::Discard,
        MoveKind::RollDice,
        MoveKind::ResolveRoll,
        MoveKind::EndTurn,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MoveKind::Settlement => "settlement",
            MoveKind::City => "city",
            MoveKind::Road => "road",
            MoveKind::BankTrade => "bank_trade",
            MoveKind::MoveRobber => "move_robber",
            MoveKind::Discard => "discard",
            MoveKind::RollDice => "roll_dice",
            MoveKind::ResolveRoll => "resolve_roll",
            MoveKind::EndTurn => "end_turn",
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cards offered in a discard.
///
/// Counts are signed because requests arrive from outside the engine;
/// negative counts are rejected by validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscardBundle {
    pub wood: i32,
    pub brick: i32,
    pub sheep: i32,
    pub wheat: i32,
    pub ore: i32,
}

impl DiscardBundle {
    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    pub fn has_negative(&self) -> bool {
        Resource::ALL.iter().any(|&r| self.get(r) < 0)
    }

    /// The bundle as a hand, or `None` if any count is negative
    pub fn to_hand(&self) -> Option<ResourceHand> {
        let mut hand = ResourceHand::new();
        for resource in Resource::ALL {
            hand.set(resource, u32::try_from(self.get(resource)).ok()?);
        }
        Some(hand)
    }
}

impl From<ResourceHand> for DiscardBundle {
    fn from(hand: ResourceHand) -> Self {
        let clamp = |n: u32| i32::try_from(n).unwrap_or(i32::MAX);
        Self {
            wood: clamp(hand.wood),
            brick: clamp(hand.brick),
            sheep: clamp(hand.sheep),
            wheat: clamp(hand.wheat),
            ore: clamp(hand.ore),
        }
    }
}

/// A move with its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMove {
    // ==================== Building ====================
    /// Place a settlement (free during setup)
    #[serde(rename = "settlement")]
    PlaceSettlement { vertex: VertexCoord },
    /// Upgrade an own settlement to a city
    #[serde(rename = "city")]
    BuildCity { vertex: VertexCoord },
    /// Place a road (free during setup)
    #[serde(rename = "road")]
    PlaceRoad { edge: EdgeCoord },

    // ==================== Trading ====================
    /// Trade with the bank at the best available rate; the engine picks the
    /// resources exchanged
    BankTrade,

    // ==================== Robber ====================
    /// Move the robber and optionally steal from a player on the target hex
    MoveRobber {
        hex: CubeCoord,
        victim: Option<PlayerId>,
    },
    /// Give up cards after a 7
    Discard { bundle: DiscardBundle },

    // ==================== Turn Management ====================
    RollDice,
    ResolveRoll,
    EndTurn,
}

impl GameMove {
    pub fn kind(&self) -> MoveKind {
        match self {
            GameMove::PlaceSettlement { .. } => MoveKind::Settlement,
            GameMove::BuildCity { .. } => MoveKind::City,
            GameMove::PlaceRoad { .. } => MoveKind::Road,
            GameMove::BankTrade => MoveKind::BankTrade,
            GameMove::MoveRobber { .. } => MoveKind::MoveRobber,
            GameMove::Discard { .. } => MoveKind::Discard,
            GameMove::RollDice => MoveKind::RollDice,
            GameMove::ResolveRoll => MoveKind::ResolveRoll,
            GameMove::EndTurn => MoveKind::EndTurn,
        }
    }

    /// Build a located move from a raw identifier, screening it first.
    /// The robber form carries no victim.
    pub fn at_location(kind: MoveKind, id: &str) -> Result<GameMove, GameError> {
        let mv = match kind {
            MoveKind::Settlement => GameMove::PlaceSettlement { vertex: id.parse()? },
            MoveKind::City => GameMove::BuildCity { vertex: id.parse()? },
            MoveKind::Road => GameMove::PlaceRoad { edge: id.parse()? },
            MoveKind::MoveRobber => GameMove::MoveRobber {
                hex: id.parse()?,
                victim: None,
            },
            _ => {
                return Err(GameError::IllegalMove {
                    kind,
                    reason: format!("{kind} takes no location"),
                })
            }
        };
        Ok(mv)
    }
}

/// Events that occur as a result of moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    /// A settlement was placed or built
    SettlementBuilt {
        player: PlayerId,
        vertex: VertexCoord,
        setup: bool,
    },

    /// A settlement was upgraded to a city
    CityBuilt {
        player: PlayerId,
        vertex: VertexCoord,
    },

    /// A road was placed or built
    RoadBuilt { player: PlayerId, edge: EdgeCoord },

    /// Cards granted for the second setup settlement
    SetupResourcesGranted {
        player: PlayerId,
        resources: ResourceHand,
    },

    /// Dice were thrown; production waits for the resolve step
    DiceRolled {
        player: PlayerId,
        dice: (u8, u8),
        total: u8,
    },

    /// Resources were distributed after a dice roll
    ResourcesDistributed {
        roll: u8,
        distribution: BTreeMap<PlayerId, ResourceHand>,
    },

    /// A 7 left these players holding too many cards; value is the count owed
    DiscardsQueued { players: BTreeMap<PlayerId, u32> },

    /// A player discarded cards
    CardsDiscarded {
        player: PlayerId,
        resources: ResourceHand,
    },

    /// The robber was moved
    RobberMoved {
        player: PlayerId,
        from: CubeCoord,
        to: CubeCoord,
    },

    /// A resource was stolen
    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        resource: Resource,
    },

    /// Bank or port trade completed
    BankTraded {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        victory_points: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::IdError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_kind_matches_variant() {
        let vertex: VertexCoord = "0,0,0_1,-1,0_1,0,-1".parse().unwrap();
        assert_eq!(GameMove::PlaceSettlement { vertex }.kind(), MoveKind::Settlement);
        assert_eq!(GameMove::BuildCity { vertex }.kind(), MoveKind::City);
        assert_eq!(GameMove::EndTurn.kind(), MoveKind::EndTurn);
    }

    #[test]
    fn test_move_json_uses_ids() {
        let mv = GameMove::MoveRobber {
            hex: CubeCoord::axial(1, -1).unwrap(),
            victim: Some(2),
        };
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "move_robber", "hex": "1,-1,0", "victim": 2})
        );

        let road: GameMove =
            serde_json::from_str(r#"{"kind":"road","edge":"0,0,0_-1,1,0"}"#).unwrap();
        assert_eq!(road.kind(), MoveKind::Road);
    }

    #[test]
    fn test_move_json_rejects_hostile_ids() {
        let hostile = r#"{"kind":"settlement","vertex":"__proto__"}"#;
        assert!(serde_json::from_str::<GameMove>(hostile).is_err());
    }

    #[test]
    fn test_at_location_screens_ids() {
        let mv = GameMove::at_location(MoveKind::Road, "1,-1,0_0,0,0").unwrap();
        assert_eq!(mv.kind(), MoveKind::Road);

        assert_eq!(
            GameMove::at_location(MoveKind::Settlement, "constructor"),
            Err(GameError::MalformedId(IdError::Reserved))
        );
        assert!(matches!(
            GameMove::at_location(MoveKind::EndTurn, "0,0,0"),
            Err(GameError::IllegalMove { kind: MoveKind::EndTurn, .. })
        ));
    }

    #[test]
    fn test_discard_bundle_negative() {
        let bundle = DiscardBundle {
            wood: 2,
            ore: -1,
            ..DiscardBundle::default()
        };
        assert!(bundle.has_negative());
        assert_eq!(bundle.to_hand(), None);

        let ok = DiscardBundle::from(ResourceHand::with_amounts(1, 0, 2, 0, 0));
        assert_eq!(ok.to_hand(), Some(ResourceHand::with_amounts(1, 0, 2, 0, 0)));
    }
}
