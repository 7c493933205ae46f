//! Player state and resource management.
//!
//! This module contains:
//! - ResourceHand for managing resource counts
//! - Building costs
//! - Player struct with holdings and victory points

use crate::board::{PlayerId, Resource};
use crate::hex::{EdgeCoord, VertexCoord};
use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};

/// A hand of resources
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub wood: u32,
    pub brick: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts (wood, brick, sheep, wheat, ore)
    pub fn with_amounts(wood: u32, brick: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            wood,
            brick,
            sheep,
            wheat,
            ore,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    ///
    /// Saturates at `u32::MAX` instead of overflowing.
    pub fn total(&self) -> u32 {
        Resource::ALL
            .iter()
            .fold(0u32, |sum, &r| sum.saturating_add(self.get(r)))
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Wood => self.wood,
            Resource::Brick => self.brick,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Wood => &mut self.wood,
            Resource::Brick => &mut self.brick,
            Resource::Sheep => &mut self.sheep,
            Resource::Wheat => &mut self.wheat,
            Resource::Ore => &mut self.ore,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot(resource) = count;
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for resource in Resource::ALL {
            self.add(resource, other.get(resource));
        }
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|&r| self.get(r) >= cost.get(r))
    }

    /// Subtract a cost, returning false (and leaving the hand untouched)
    /// if any count would go negative
    pub fn try_subtract(&mut self, cost: &ResourceHand) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for resource in Resource::ALL {
            *self.slot(resource) -= cost.get(resource);
        }
        true
    }

    /// Non-zero entries in priority order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, n)| *n > 0)
    }

    /// Remove one card chosen with probability proportional to how many of
    /// each type are held (robber theft)
    pub fn steal_weighted<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }

        let mut pick = rng.pick_index(total as usize) as u32;
        for resource in Resource::ALL {
            let count = self.get(resource);
            if pick < count {
                *self.slot(resource) -= 1;
                return Some(resource);
            }
            pick -= count;
        }
        None
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 wood, 1 brick
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 wood, 1 brick, 1 sheep, 1 wheat
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 1, 1, 0)
    }

    /// Cost to upgrade to city: 2 wheat, 3 ore
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 0, 2, 3)
    }
}

/// A single player's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player ID (seat index)
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Current resources
    pub resources: ResourceHand,
    /// Vertices holding this player's settlements and cities
    pub settlements: Vec<VertexCoord>,
    /// Edges holding this player's roads
    pub roads: Vec<EdgeCoord>,
    pub victory_points: u32,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            resources: ResourceHand::new(),
            settlements: Vec::new(),
            roads: Vec::new(),
            victory_points: 0,
        }
    }

    /// Can this player afford a road?
    pub fn can_afford_road(&self) -> bool {
        self.resources.can_afford(&costs::road())
    }

    /// Can this player afford a settlement?
    pub fn can_afford_settlement(&self) -> bool {
        self.resources.can_afford(&costs::settlement())
    }

    /// Can this player afford a city upgrade?
    pub fn can_afford_city(&self) -> bool {
        self.resources.can_afford(&costs::city())
    }

    pub fn owns_settlement_at(&self, vertex: &VertexCoord) -> bool {
        self.settlements.contains(vertex)
    }
}
