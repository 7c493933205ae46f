//! Board representation: hexes, buildings, roads, and ports.
//!
//! This module contains:
//! - Resource and terrain types
//! - Building types (settlements, cities, roads)
//! - Port trading bonuses
//! - The `Board` container with read accessors and crate-private mutators
//! - A bounded LRU cache of per-hex geometry
//!
//! Unoccupied vertices and edges are simply absent from the board's maps.

use crate::hex::{CubeCoord, EdgeCoord, VertexCoord};
use crate::player::ResourceHand;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::trace;

/// Player identifier (index into the game's player list)
pub type PlayerId = u8;

/// Default number of hexes whose geometry is memoized
pub const DEFAULT_GEOMETRY_CACHE_CAPACITY: usize = 64;

/// The five resource types.
///
/// Declaration order is the fixed priority order used to break ties
/// (wood, brick, sheep, wheat, ore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Wood,
    Brick,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types, in priority order
    pub const ALL: [Resource; 5] = [
        Resource::Wood,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Wood => "wood",
            Resource::Brick => "brick",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terrain of a hex. Desert and sea produce nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Forest,
    Hills,
    Pasture,
    Fields,
    Mountains,
    Desert,
    Sea,
}

impl Terrain {
    /// The resource this terrain yields, if any
    pub fn resource(&self) -> Option<Resource> {
        match self {
            Terrain::Forest => Some(Resource::Wood),
            Terrain::Hills => Some(Resource::Brick),
            Terrain::Pasture => Some(Resource::Sheep),
            Terrain::Fields => Some(Resource::Wheat),
            Terrain::Mountains => Some(Resource::Ore),
            Terrain::Desert | Terrain::Sea => None,
        }
    }

    /// The terrain that yields `resource`
    pub fn producing(resource: Resource) -> Terrain {
        match resource {
            Resource::Wood => Terrain::Forest,
            Resource::Brick => Terrain::Hills,
            Resource::Sheep => Terrain::Pasture,
            Resource::Wheat => Terrain::Fields,
            Resource::Ore => Terrain::Mountains,
        }
    }

    pub fn is_land(&self) -> bool {
        !matches!(self, Terrain::Sea)
    }
}

/// A single hex on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hex {
    /// Position on the hex grid
    pub coord: CubeCoord,
    pub terrain: Terrain,
    /// Dice number that triggers production (2-12 except 7, None for desert/sea)
    pub token: Option<u8>,
}

impl Hex {
    /// Create a producing hex
    pub fn producing(coord: CubeCoord, resource: Resource, token: u8) -> Self {
        Self {
            coord,
            terrain: Terrain::producing(resource),
            token: Some(token),
        }
    }

    pub fn desert(coord: CubeCoord) -> Self {
        Self {
            coord,
            terrain: Terrain::Desert,
            token: None,
        }
    }

    pub fn sea(coord: CubeCoord) -> Self {
        Self {
            coord,
            terrain: Terrain::Sea,
            token: None,
        }
    }

    /// The canonical hex ID
    pub fn id(&self) -> String {
        self.coord.to_string()
    }

    /// Get the resource this hex produces, if any
    pub fn resource(&self) -> Option<Resource> {
        self.terrain.resource()
    }
}

/// Kind of building on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    Settlement,
    City,
}

/// What's built on an occupied vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub owner: PlayerId,
    pub kind: BuildingKind,
}

impl Building {
    pub fn settlement(owner: PlayerId) -> Self {
        Self {
            owner,
            kind: BuildingKind::Settlement,
        }
    }

    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        match self.kind {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }

    /// Resource multiplier (how many cards per production)
    pub fn yield_multiplier(&self) -> u32 {
        match self.kind {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

/// A road on an occupied edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    pub owner: PlayerId,
}

/// Port types for maritime trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl PortKind {
    /// The exchange rate for this port
    pub fn rate(&self) -> u32 {
        match self {
            PortKind::Generic => 3,
            PortKind::Specific(_) => 2,
        }
    }
}

/// Port placement on a coastal edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub kind: PortKind,
    /// The edge where ships dock
    pub edge: EdgeCoord,
    /// The two vertices that grant access to this port
    pub vertices: [VertexCoord; 2],
}

/// Errors raised while populating a board
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("hex {0} is already on the board")]
    DuplicateHex(CubeCoord),

    #[error("hex {0} has an invalid dice token")]
    InvalidToken(CubeCoord),

    #[error("port edge {0} is not on a coast")]
    PortNotCoastal(EdgeCoord),
}

/// Vertices and edges of one hex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexGeometry {
    pub vertices: [VertexCoord; 6],
    pub edges: [EdgeCoord; 6],
}

/// Fixed-capacity LRU memo of per-hex geometry.
///
/// Lookups take `&self`; the cache is single-threaded like the rest of the
/// engine.
pub struct GeometryCache {
    entries: RefCell<LruCache<CubeCoord, HexGeometry>>,
    capacity: NonZeroUsize,
}

impl GeometryCache {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RefCell::new(LruCache::new(capacity)),
            capacity,
        }
    }

    /// Geometry of `hex`, computing and caching it on a miss
    pub fn geometry(&self, hex: CubeCoord) -> HexGeometry {
        let mut entries = self.entries.borrow_mut();
        if let Some(found) = entries.get(&hex) {
            return *found;
        }
        trace!(%hex, "geometry cache miss");
        let geometry = HexGeometry {
            vertices: hex.vertices(),
            edges: hex.edges(),
        };
        entries.put(hex, geometry);
        geometry
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

impl Default for GeometryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_GEOMETRY_CACHE_CAPACITY)
    }
}

// A clone starts cold; the memo is derived data.
impl Clone for GeometryCache {
    fn clone(&self) -> Self {
        Self::with_capacity(self.capacity())
    }
}

impl fmt::Debug for GeometryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeometryCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

// Only the capacity is persisted; a restored cache starts cold.
impl Serialize for GeometryCache {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.capacity() as u64)
    }
}

impl<'de> Deserialize<'de> for GeometryCache {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let capacity = usize::deserialize(deserializer)?;
        Ok(Self::with_capacity(capacity))
    }
}

/// The complete game board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    /// All hexes (land and sea) indexed by coordinate
    hexes: BTreeMap<CubeCoord, Hex>,
    /// Buildings on occupied vertices
    vertices: BTreeMap<VertexCoord, Building>,
    /// Roads on occupied edges
    edges: BTreeMap<EdgeCoord, Road>,
    ports: Vec<Port>,
    #[serde(default, rename = "geometry_cache_capacity")]
    geometry: GeometryCache,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the geometry cache with one of the given capacity
    pub fn with_geometry_capacity(mut self, capacity: usize) -> Self {
        self.geometry = GeometryCache::with_capacity(capacity);
        self
    }

    // ==================== Population ====================

    /// Add a hex template. Producing hexes need a token in 2..=12 other than 7;
    /// desert and sea must have none.
    pub fn insert_hex(&mut self, hex: Hex) -> Result<(), BoardError> {
        let token_ok = match (hex.resource(), hex.token) {
            (Some(_), Some(t)) => (2..=12).contains(&t) && t != 7,
            (None, None) => true,
            _ => false,
        };
        if !token_ok {
            return Err(BoardError::InvalidToken(hex.coord));
        }
        if self.hexes.contains_key(&hex.coord) {
            return Err(BoardError::DuplicateHex(hex.coord));
        }
        self.hexes.insert(hex.coord, hex);
        Ok(())
    }

    /// Add a port on a coastal edge (one land side, one sea or off-board side)
    pub fn add_port(&mut self, kind: PortKind, edge: EdgeCoord) -> Result<(), BoardError> {
        let land_sides = edge.hexes().iter().filter(|h| self.is_land(h)).count();
        if land_sides != 1 {
            return Err(BoardError::PortNotCoastal(edge));
        }
        self.ports.push(Port {
            kind,
            edge,
            vertices: edge.endpoints(),
        });
        Ok(())
    }

    // ==================== Query Methods ====================

    pub fn hex_at(&self, coord: &CubeCoord) -> Option<&Hex> {
        self.hexes.get(coord)
    }

    /// Building at a vertex; `None` means unoccupied
    pub fn vertex_at(&self, vertex: &VertexCoord) -> Option<&Building> {
        self.vertices.get(vertex)
    }

    /// Road at an edge; `None` means unoccupied
    pub fn edge_at(&self, edge: &EdgeCoord) -> Option<&Road> {
        self.edges.get(edge)
    }

    /// The port a vertex gives access to, if any
    pub fn port_at(&self, vertex: &VertexCoord) -> Option<&Port> {
        self.ports.iter().find(|p| p.vertices.contains(vertex))
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values()
    }

    /// Get all land hexes (non-sea)
    pub fn land_hexes(&self) -> impl Iterator<Item = &Hex> {
        self.hexes.values().filter(|h| h.terrain.is_land())
    }

    pub fn occupied_vertices(&self) -> impl Iterator<Item = (&VertexCoord, &Building)> {
        self.vertices.iter()
    }

    pub fn occupied_edges(&self) -> impl Iterator<Item = (&EdgeCoord, &Road)> {
        self.edges.iter()
    }

    pub fn is_land(&self, coord: &CubeCoord) -> bool {
        self.hexes.get(coord).is_some_and(|h| h.terrain.is_land())
    }

    /// A vertex is on the board when all three of its hexes exist and at
    /// least one is land
    pub fn is_on_board_vertex(&self, vertex: &VertexCoord) -> bool {
        let hexes = vertex.hexes();
        hexes.iter().all(|h| self.hexes.contains_key(h)) && hexes.iter().any(|h| self.is_land(h))
    }

    /// Same rule as vertices: both hexes exist, at least one is land
    pub fn is_on_board_edge(&self, edge: &EdgeCoord) -> bool {
        let hexes = edge.hexes();
        hexes.iter().all(|h| self.hexes.contains_key(h)) && hexes.iter().any(|h| self.is_land(h))
    }

    pub fn vertices_of_hex(&self, coord: CubeCoord) -> [VertexCoord; 6] {
        self.geometry.geometry(coord).vertices
    }

    pub fn edges_of_hex(&self, coord: CubeCoord) -> [EdgeCoord; 6] {
        self.geometry.geometry(coord).edges
    }

    pub fn geometry_cache(&self) -> &GeometryCache {
        &self.geometry
    }

    /// Every vertex on the board
    pub fn land_vertices(&self) -> BTreeSet<VertexCoord> {
        self.land_hexes()
            .flat_map(|h| self.vertices_of_hex(h.coord))
            .filter(|v| self.is_on_board_vertex(v))
            .collect()
    }

    /// Every edge on the board
    pub fn land_edges(&self) -> BTreeSet<EdgeCoord> {
        self.land_hexes()
            .flat_map(|h| self.edges_of_hex(h.coord))
            .filter(|e| self.is_on_board_edge(e))
            .collect()
    }

    /// Hexes around a vertex that exist on the board
    pub fn hexes_at_vertex(&self, vertex: &VertexCoord) -> Vec<&Hex> {
        vertex
            .hexes()
            .iter()
            .filter_map(|h| self.hexes.get(h))
            .collect()
    }

    /// Owner of the building at `vertex`, if any
    pub fn owner_at(&self, vertex: &VertexCoord) -> Option<PlayerId> {
        self.vertices.get(vertex).map(|b| b.owner)
    }

    /// Check if a vertex satisfies the distance rule (no adjacent buildings)
    pub fn satisfies_distance_rule(&self, vertex: &VertexCoord) -> bool {
        vertex
            .adjacent_vertices()
            .iter()
            .all(|adj| !self.vertices.contains_key(adj))
    }

    /// Players with a building on one of `hex`'s corners
    pub fn owners_on_hex(&self, hex: &CubeCoord) -> BTreeSet<PlayerId> {
        self.vertices_of_hex(*hex)
            .iter()
            .filter_map(|v| self.owner_at(v))
            .collect()
    }

    /// Ports a player can use through their buildings
    pub fn player_ports(&self, player: PlayerId) -> Vec<PortKind> {
        self.ports
            .iter()
            .filter(|p| p.vertices.iter().any(|v| self.owner_at(v) == Some(player)))
            .map(|p| p.kind)
            .collect()
    }

    /// Cards produced by `roll`, per player.
    ///
    /// `blocked` names a hex that produces nothing (the robber's, when the
    /// rules say so).
    pub fn production_for_roll(
        &self,
        roll: u8,
        blocked: Option<CubeCoord>,
    ) -> BTreeMap<PlayerId, ResourceHand> {
        let mut distribution: BTreeMap<PlayerId, ResourceHand> = BTreeMap::new();
        if roll == 7 {
            return distribution;
        }

        for hex in self.hexes.values() {
            if hex.token != Some(roll) || Some(hex.coord) == blocked {
                continue;
            }
            let Some(resource) = hex.resource() else {
                continue;
            };

            for vertex in self.vertices_of_hex(hex.coord) {
                if let Some(building) = self.vertices.get(&vertex) {
                    distribution
                        .entry(building.owner)
                        .or_default()
                        .add(resource, building.yield_multiplier());
                }
            }
        }

        distribution
    }

    // ==================== Mutation Methods ====================
    //
    // Only executors call these, after validation.

    pub(crate) fn place_settlement(&mut self, vertex: VertexCoord, player: PlayerId) {
        self.vertices.insert(vertex, Building::settlement(player));
    }

    pub(crate) fn upgrade_to_city(&mut self, vertex: VertexCoord) {
        if let Some(building) = self.vertices.get_mut(&vertex) {
            building.kind = BuildingKind::City;
        }
    }

    pub(crate) fn place_road(&mut self, edge: EdgeCoord, player: PlayerId) {
        self.edges.insert(edge, Road { owner: player });
    }
}
