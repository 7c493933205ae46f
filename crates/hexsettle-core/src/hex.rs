//! Cube coordinate system for hexes, vertices, and edges.
//!
//! Every location on the board is named by the hexes that meet there:
//! - `CubeCoord`: a single hex, encoded as `"q,r,s"`
//! - `VertexCoord`: the three hexes meeting at a corner, sorted, joined with `_`
//! - `EdgeCoord`: the two hexes sharing a side, sorted, joined with `_`
//!
//! Sorting the member hexes makes an identifier independent of the order in
//! which they were discovered, so two IDs are equal exactly when they name the
//! same physical point. Adjacency is derived algebraically from the six cube
//! directions; no mesh is stored anywhere.
//!
//! The string forms are also the wire format. Anything parsed from a string
//! goes through [`screen`] first, which rejects oversized, reserved, or
//! oddly-shaped input before any arithmetic happens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest identifier accepted from outside the engine
pub const MAX_ID_LEN: usize = 64;

/// Largest absolute coordinate accepted when parsing
pub const COORD_LIMIT: i32 = 1_000;

/// Joins the member hexes of a vertex or edge ID
pub const SEPARATOR: char = '_';

/// Keys that must never be used as identifiers, whatever their shape
const RESERVED_KEYS: [&str; 6] = [
    "__proto__",
    "prototype",
    "constructor",
    "tostring",
    "valueof",
    "hasownproperty",
];

/// The six cube directions, in a fixed clockwise order starting north-east.
///
/// Consecutive entries (wrapping around) are themselves adjacent, which is
/// what lets `vertices()` pair neighbor `i` with neighbor `i + 1`.
const DIRECTIONS: [(i32, i32, i32); 6] = [
    (1, -1, 0),
    (1, 0, -1),
    (0, 1, -1),
    (-1, 1, 0),
    (-1, 0, 1),
    (0, -1, 1),
];

/// Why an identifier or coordinate was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IdError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier is longer than {} bytes", MAX_ID_LEN)]
    TooLong,

    #[error("identifier uses a reserved key")]
    Reserved,

    #[error("identifier does not match the expected pattern")]
    Pattern,

    #[error("coordinate is outside +/-{}", COORD_LIMIT)]
    OutOfRange,

    #[error("cube coordinates must sum to zero")]
    NotOnPlane,

    #[error("hexes in identifier are not mutually adjacent")]
    NotAdjacent,
}

/// Format checks applied to every untrusted identifier before decoding.
///
/// Only digits, `-`, `,` and the separator may appear.
pub fn screen(raw: &str) -> Result<(), IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty);
    }
    if raw.len() > MAX_ID_LEN {
        return Err(IdError::TooLong);
    }
    let lowered = raw.to_ascii_lowercase();
    if RESERVED_KEYS.iter().any(|key| lowered.contains(key)) {
        return Err(IdError::Reserved);
    }
    let allowed = |b: u8| b.is_ascii_digit() || b == b'-' || b == b',' || b == SEPARATOR as u8;
    if !raw.bytes().all(allowed) {
        return Err(IdError::Pattern);
    }
    Ok(())
}

/// Parse one signed integer component: `0` or `-?[1-9][0-9]{0,3}`.
fn parse_component(part: &str) -> Result<i32, IdError> {
    let digits = part.strip_prefix('-').unwrap_or(part);
    let negative = digits.len() != part.len();

    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdError::Pattern);
    }
    // No leading zeros and no "-0": every value has exactly one spelling
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(IdError::Pattern);
    }
    if negative && digits == "0" {
        return Err(IdError::Pattern);
    }

    let magnitude: i32 = digits.parse().map_err(|_| IdError::Pattern)?;
    if magnitude > COORD_LIMIT {
        return Err(IdError::OutOfRange);
    }
    Ok(if negative { -magnitude } else { magnitude })
}

/// Cube coordinate for a hex.
///
/// Fields are private so that `q + r + s == 0` holds for every value that
/// exists; construct through [`CubeCoord::new`], [`CubeCoord::axial`], or by
/// parsing.
///
/// The derived `Ord` (lexicographic on `q`, then `r`, then `s`) is the total
/// order used to canonicalize vertex and edge IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CubeCoord {
    q: i32,
    r: i32,
    s: i32,
}

impl CubeCoord {
    /// The center hex
    pub const ORIGIN: CubeCoord = CubeCoord { q: 0, r: 0, s: 0 };

    /// Create a coordinate, checking the plane invariant and range
    pub fn new(q: i32, r: i32, s: i32) -> Result<Self, IdError> {
        if [q, r, s].iter().any(|c| c.unsigned_abs() > COORD_LIMIT.unsigned_abs()) {
            return Err(IdError::OutOfRange);
        }
        if q + r + s != 0 {
            return Err(IdError::NotOnPlane);
        }
        Ok(Self { q, r, s })
    }

    /// Create from the two axial components; `s` is derived and all three
    /// are range-checked like [`CubeCoord::new`]
    pub fn axial(q: i32, r: i32) -> Result<Self, IdError> {
        let s = q
            .checked_add(r)
            .and_then(i32::checked_neg)
            .ok_or(IdError::OutOfRange)?;
        Self::new(q, r, s)
    }

    pub const fn q(&self) -> i32 {
        self.q
    }

    pub const fn r(&self) -> i32 {
        self.r
    }

    pub const fn s(&self) -> i32 {
        self.s
    }

    fn offset(&self, (dq, dr, ds): (i32, i32, i32)) -> Self {
        Self {
            q: self.q + dq,
            r: self.r + dr,
            s: self.s + ds,
        }
    }

    /// The six neighboring hexes in the fixed direction order
    pub fn neighbors(&self) -> [CubeCoord; 6] {
        DIRECTIONS.map(|d| self.offset(d))
    }

    /// The neighbor in direction `index` (taken modulo 6)
    pub fn neighbor(&self, index: usize) -> CubeCoord {
        self.offset(DIRECTIONS[index % 6])
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &CubeCoord) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s - other.s).unsigned_abs();
        (dq + dr + ds) / 2
    }

    pub fn is_adjacent(&self, other: &CubeCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// All hexes exactly `radius` steps from this one, walking the ring in
    /// direction order. Radius 0 yields the hex itself.
    pub fn ring(&self, radius: u32) -> Vec<CubeCoord> {
        if radius == 0 {
            return vec![*self];
        }
        let radius = radius as i32;
        let (sq, sr, ss) = DIRECTIONS[4];
        let mut current = self.offset((sq * radius, sr * radius, ss * radius));
        let mut ring = Vec::with_capacity(6 * radius as usize);
        for direction in DIRECTIONS {
            for _ in 0..radius {
                ring.push(current);
                current = current.offset(direction);
            }
        }
        ring
    }

    /// Every hex within `radius` steps, center first, then ring by ring
    pub fn spiral(&self, radius: u32) -> Vec<CubeCoord> {
        (0..=radius).flat_map(|k| self.ring(k)).collect()
    }

    /// The six corners of this hex: each pairs two consecutive neighbors
    pub fn vertices(&self) -> [VertexCoord; 6] {
        let n = self.neighbors();
        std::array::from_fn(|i| VertexCoord::canonical(*self, n[i], n[(i + 1) % 6]))
    }

    /// The six sides of this hex
    pub fn edges(&self) -> [EdgeCoord; 6] {
        self.neighbors().map(|n| EdgeCoord::canonical(*self, n))
    }
}

impl fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.q, self.r, self.s)
    }
}

impl FromStr for CubeCoord {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        screen(raw)?;
        parse_hex_unscreened(raw)
    }
}

/// Decode `"q,r,s"` once the whole identifier has passed [`screen`]
fn parse_hex_unscreened(raw: &str) -> Result<CubeCoord, IdError> {
    let mut parts = raw.split(',');
    let (Some(q), Some(r), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(IdError::Pattern);
    };
    CubeCoord::new(parse_component(q)?, parse_component(r)?, parse_component(s)?)
}

/// Split a screened compound ID into exactly `N` hexes
fn parse_members<const N: usize>(raw: &str) -> Result<[CubeCoord; N], IdError> {
    let parts: Vec<&str> = raw.split(SEPARATOR).collect();
    if parts.len() != N {
        return Err(IdError::Pattern);
    }
    let mut hexes = [CubeCoord::ORIGIN; N];
    for (slot, part) in hexes.iter_mut().zip(parts) {
        *slot = parse_hex_unscreened(part)?;
    }
    Ok(hexes)
}

impl TryFrom<String> for CubeCoord {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CubeCoord> for String {
    fn from(value: CubeCoord) -> Self {
        value.to_string()
    }
}

/// Vertex coordinate - a corner where 3 hexes meet.
///
/// Settlements and cities sit on vertices. The member hexes are stored sorted,
/// so the derived equality, hashing and ordering are all canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VertexCoord {
    hexes: [CubeCoord; 3],
}

impl VertexCoord {
    /// Create a vertex from three hexes in any order.
    ///
    /// The hexes must be pairwise adjacent.
    pub fn new(a: CubeCoord, b: CubeCoord, c: CubeCoord) -> Result<Self, IdError> {
        if !(a.is_adjacent(&b) && b.is_adjacent(&c) && a.is_adjacent(&c)) {
            return Err(IdError::NotAdjacent);
        }
        Ok(Self::canonical(a, b, c))
    }

    /// Sort without checking adjacency; callers derive the hexes geometrically
    fn canonical(a: CubeCoord, b: CubeCoord, c: CubeCoord) -> Self {
        let mut hexes = [a, b, c];
        hexes.sort();
        Self { hexes }
    }

    /// The 3 hexes that touch this vertex, in canonical order
    pub fn hexes(&self) -> [CubeCoord; 3] {
        self.hexes
    }

    pub fn touches(&self, hex: &CubeCoord) -> bool {
        self.hexes.contains(hex)
    }

    /// The 3 edges meeting at this vertex: the pairwise joins of its hexes
    pub fn edges(&self) -> [EdgeCoord; 3] {
        let [a, b, c] = self.hexes;
        [
            EdgeCoord::canonical(a, b),
            EdgeCoord::canonical(a, c),
            EdgeCoord::canonical(b, c),
        ]
    }

    /// The 3 vertices one edge away (for the distance rule)
    pub fn adjacent_vertices(&self) -> [VertexCoord; 3] {
        self.edges().map(|edge| edge.other_endpoint(self))
    }
}

impl fmt::Display for VertexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.hexes;
        write!(f, "{a}{SEPARATOR}{b}{SEPARATOR}{c}")
    }
}

impl FromStr for VertexCoord {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        screen(raw)?;
        let [a, b, c] = parse_members::<3>(raw)?;
        VertexCoord::new(a, b, c)
    }
}

impl TryFrom<String> for VertexCoord {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VertexCoord> for String {
    fn from(value: VertexCoord) -> Self {
        value.to_string()
    }
}

/// Edge coordinate - a side shared by 2 hexes, where roads are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeCoord {
    hexes: [CubeCoord; 2],
}

impl EdgeCoord {
    /// Create an edge from two adjacent hexes in any order
    pub fn new(a: CubeCoord, b: CubeCoord) -> Result<Self, IdError> {
        if !a.is_adjacent(&b) {
            return Err(IdError::NotAdjacent);
        }
        Ok(Self::canonical(a, b))
    }

    fn canonical(a: CubeCoord, b: CubeCoord) -> Self {
        if a <= b {
            Self { hexes: [a, b] }
        } else {
            Self { hexes: [b, a] }
        }
    }

    /// The 2 hexes that share this edge, in canonical order
    pub fn hexes(&self) -> [CubeCoord; 2] {
        self.hexes
    }

    /// The 2 vertices at the ends of this edge.
    ///
    /// Exactly two hexes neighbor both sides of an edge; each completes a
    /// triangle with the edge's own hexes, and each triangle is one endpoint.
    pub fn endpoints(&self) -> [VertexCoord; 2] {
        let [a, b] = self.hexes;
        let a_neighbors = a.neighbors();
        let mut shared = b.neighbors().into_iter().filter(|n| a_neighbors.contains(n));
        // Two adjacent hexes always share exactly two neighbors
        let first = shared.next().unwrap_or(a);
        let second = shared.next().unwrap_or(b);
        let mut ends = [
            VertexCoord::canonical(a, b, first),
            VertexCoord::canonical(a, b, second),
        ];
        ends.sort();
        ends
    }

    /// The endpoint that is not `vertex`
    pub fn other_endpoint(&self, vertex: &VertexCoord) -> VertexCoord {
        let [first, second] = self.endpoints();
        if first == *vertex {
            second
        } else {
            first
        }
    }

    /// Edges that share an endpoint with this one (4 of them)
    pub fn adjacent_edges(&self) -> Vec<EdgeCoord> {
        let mut adjacent = Vec::with_capacity(4);
        for vertex in self.endpoints() {
            for edge in vertex.edges() {
                if edge != *self && !adjacent.contains(&edge) {
                    adjacent.push(edge);
                }
            }
        }
        adjacent
    }
}

impl fmt::Display for EdgeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.hexes;
        write!(f, "{a}{SEPARATOR}{b}")
    }
}

impl FromStr for EdgeCoord {
    type Err = IdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        screen(raw)?;
        let [a, b] = parse_members::<2>(raw)?;
        EdgeCoord::new(a, b)
    }
}

impl TryFrom<String> for EdgeCoord {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EdgeCoord> for String {
    fn from(value: EdgeCoord) -> Self {
        value.to_string()
    }
}

// ==================== String-level helpers ====================
//
// These take raw identifiers as they arrive from the network or UI.

/// Canonical vertex ID for three hexes in any order
pub fn vertex_id(a: CubeCoord, b: CubeCoord, c: CubeCoord) -> Result<String, IdError> {
    VertexCoord::new(a, b, c).map(|v| v.to_string())
}

/// Canonical edge ID for two hexes in any order
pub fn edge_id(a: CubeCoord, b: CubeCoord) -> Result<String, IdError> {
    EdgeCoord::new(a, b).map(|e| e.to_string())
}

/// The three hexes named by a vertex ID
pub fn hexes_of_vertex(id: &str) -> Result<[CubeCoord; 3], IdError> {
    id.parse::<VertexCoord>().map(|v| v.hexes())
}

/// The two hexes named by an edge ID
pub fn hexes_of_edge(id: &str) -> Result<[CubeCoord; 2], IdError> {
    id.parse::<EdgeCoord>().map(|e| e.hexes())
}

/// The two vertex IDs at the ends of an edge ID
pub fn vertices_of_edge(id: &str) -> Result<[VertexCoord; 2], IdError> {
    id.parse::<EdgeCoord>().map(|e| e.endpoints())
}

/// The three edge IDs meeting at a vertex ID
pub fn edges_of_vertex(id: &str) -> Result<[EdgeCoord; 3], IdError> {
    id.parse::<VertexCoord>().map(|v| v.edges())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn hex(q: i32, r: i32) -> CubeCoord {
        CubeCoord::axial(q, r).unwrap()
    }

    #[test]
    fn test_hex_neighbors() {
        let center = CubeCoord::ORIGIN;
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);

        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_consecutive_neighbors_are_adjacent() {
        let n = hex(2, -1).neighbors();
        for i in 0..6 {
            assert!(n[i].is_adjacent(&n[(i + 1) % 6]));
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = CubeCoord::ORIGIN;
        assert_eq!(a.distance_to(&hex(2, -1)), 2);
        assert_eq!(a.distance_to(&hex(-3, 3)), 3);
    }

    #[test]
    fn test_ring_and_spiral_sizes() {
        assert_eq!(CubeCoord::ORIGIN.ring(0).len(), 1);
        assert_eq!(CubeCoord::ORIGIN.ring(3).len(), 18);
        assert_eq!(CubeCoord::ORIGIN.spiral(2).len(), 19);
        for h in CubeCoord::ORIGIN.ring(3) {
            assert_eq!(h.distance_to(&CubeCoord::ORIGIN), 3);
        }
    }

    #[test]
    fn test_vertex_id_ignores_discovery_order() {
        let (a, b, c) = (hex(0, 0), hex(1, -1), hex(1, 0));
        let ids: HashSet<String> = [
            vertex_id(a, b, c).unwrap(),
            vertex_id(c, b, a).unwrap(),
            vertex_id(b, a, c).unwrap(),
            vertex_id(c, a, b).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.into_iter().next().unwrap(), "0,0,0_1,-1,0_1,0,-1");
    }

    #[test]
    fn test_edge_id_ignores_discovery_order() {
        let (a, b) = (hex(0, 0), hex(-1, 1));
        assert_eq!(edge_id(a, b).unwrap(), edge_id(b, a).unwrap());
        assert_eq!(edge_id(a, b).unwrap(), "-1,1,0_0,0,0");
    }

    #[test]
    fn test_non_adjacent_hexes_rejected() {
        assert_eq!(
            VertexCoord::new(hex(0, 0), hex(2, 0), hex(1, 0)),
            Err(IdError::NotAdjacent)
        );
        assert_eq!(EdgeCoord::new(hex(0, 0), hex(0, 0)), Err(IdError::NotAdjacent));
    }

    #[test]
    fn test_hex_vertices_and_edges_unique() {
        let center = hex(1, -1);
        let vertices: HashSet<_> = center.vertices().into_iter().collect();
        let edges: HashSet<_> = center.edges().into_iter().collect();
        assert_eq!(vertices.len(), 6);
        assert_eq!(edges.len(), 6);
        for v in &vertices {
            assert!(v.touches(&center));
        }
    }

    #[test]
    fn test_neighboring_hexes_share_two_vertices() {
        let a: HashSet<_> = hex(0, 0).vertices().into_iter().collect();
        let b: HashSet<_> = hex(1, 0).vertices().into_iter().collect();
        assert_eq!(a.intersection(&b).count(), 2);
    }

    #[test]
    fn test_edge_endpoints_are_triangle_completions() {
        let edge = EdgeCoord::new(hex(0, 0), hex(1, 0)).unwrap();
        let [v1, v2] = edge.endpoints();
        assert_ne!(v1, v2);
        for v in [v1, v2] {
            assert!(v.touches(&hex(0, 0)));
            assert!(v.touches(&hex(1, 0)));
            assert!(v.edges().contains(&edge));
        }
    }

    #[test]
    fn test_vertex_edges_and_adjacency() {
        let v = hex(0, 0).vertices()[0];
        for edge in v.edges() {
            assert!(edge.endpoints().contains(&v));
        }
        let adjacent = v.adjacent_vertices();
        let unique: HashSet<_> = adjacent.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(!adjacent.contains(&v));
        for adj in adjacent {
            assert!(adj.adjacent_vertices().contains(&v));
        }
    }

    #[test]
    fn test_edge_adjacent_edges() {
        let e = EdgeCoord::new(hex(0, 0), hex(0, 1)).unwrap();
        let adjacent = e.adjacent_edges();
        assert_eq!(adjacent.len(), 4);
        assert!(!adjacent.contains(&e));
    }

    #[test]
    fn test_string_helpers_decode() {
        let v = hex(0, 0).vertices()[2];
        let id = v.to_string();
        assert_eq!(hexes_of_vertex(&id).unwrap(), v.hexes());
        assert_eq!(edges_of_vertex(&id).unwrap(), v.edges());

        let e = hex(0, 0).edges()[3];
        let id = e.to_string();
        assert_eq!(hexes_of_edge(&id).unwrap(), e.hexes());
        assert_eq!(vertices_of_edge(&id).unwrap(), e.endpoints());
    }

    #[test]
    fn test_parse_accepts_any_member_order() {
        let v: VertexCoord = "1,0,-1_0,0,0_1,-1,0".parse().unwrap();
        assert_eq!(v.to_string(), "0,0,0_1,-1,0_1,0,-1");
    }

    #[test]
    fn test_screen_rejects_hostile_input() {
        assert_eq!("".parse::<CubeCoord>(), Err(IdError::Empty));
        assert_eq!("__proto__".parse::<VertexCoord>(), Err(IdError::Reserved));
        assert_eq!("constructor".parse::<EdgeCoord>(), Err(IdError::Reserved));
        assert_eq!("1,-1,0 ".parse::<CubeCoord>(), Err(IdError::Pattern));
        assert_eq!("1;-1;0".parse::<CubeCoord>(), Err(IdError::Pattern));
        let long = "0,".repeat(40);
        assert_eq!(long.parse::<CubeCoord>(), Err(IdError::TooLong));
    }

    #[test]
    fn test_parse_rejects_bad_numbers() {
        assert_eq!("1,1,1".parse::<CubeCoord>(), Err(IdError::NotOnPlane));
        assert_eq!("2000,-2000,0".parse::<CubeCoord>(), Err(IdError::OutOfRange));
        assert_eq!("99999,0,-99999".parse::<CubeCoord>(), Err(IdError::Pattern));
        assert_eq!("01,-1,0".parse::<CubeCoord>(), Err(IdError::Pattern));
        assert_eq!("-0,0,0".parse::<CubeCoord>(), Err(IdError::Pattern));
        assert_eq!("1,-1".parse::<CubeCoord>(), Err(IdError::Pattern));
        assert_eq!("1,-1,0,0".parse::<CubeCoord>(), Err(IdError::Pattern));
        assert_eq!("--1,1,0".parse::<CubeCoord>(), Err(IdError::Pattern));
    }

    #[test]
    fn test_axial_checks_the_coordinate_limit() {
        let edge = CubeCoord::axial(COORD_LIMIT, 0).unwrap();
        assert_eq!(edge.s(), -COORD_LIMIT);
        assert_eq!(edge.to_string().parse::<CubeCoord>(), Ok(edge));

        assert_eq!(CubeCoord::axial(COORD_LIMIT + 1, 0), Err(IdError::OutOfRange));
        assert_eq!(CubeCoord::axial(600, 600), Err(IdError::OutOfRange));
        assert_eq!(CubeCoord::axial(i32::MAX, 1), Err(IdError::OutOfRange));
        assert_eq!(CubeCoord::new(i32::MIN, 0, 0), Err(IdError::OutOfRange));
    }

    #[test]
    fn test_compound_ids_need_the_right_member_count() {
        assert_eq!("0,0,0_1,-1,0".parse::<VertexCoord>(), Err(IdError::Pattern));
        assert_eq!("0,0,0_1,-1,0_1,0,-1".parse::<EdgeCoord>(), Err(IdError::Pattern));
        assert_eq!("0,0,0__1,-1,0".parse::<EdgeCoord>(), Err(IdError::Pattern));
    }

    #[test]
    fn test_serde_uses_string_ids() {
        let v = hex(0, 0).vertices()[1];
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, format!("\"{v}\""));
        let back: VertexCoord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        let bad: Result<EdgeCoord, _> = serde_json::from_str("\"__proto__\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn prop_hex_id_round_trips(q in -COORD_LIMIT..=COORD_LIMIT, r in -COORD_LIMIT..=COORD_LIMIT) {
            prop_assume!((q + r).abs() <= COORD_LIMIT);
            let coord = CubeCoord::new(q, r, -q - r).unwrap();
            let decoded: CubeCoord = coord.to_string().parse().unwrap();
            prop_assert_eq!(decoded, coord);
        }

        #[test]
        fn prop_vertex_and_edge_ids_round_trip(q in -50i32..50, r in -50i32..50, corner in 0usize..6) {
            let center = CubeCoord::axial(q, r).unwrap();
            let vertex = center.vertices()[corner];
            prop_assert_eq!(vertex.to_string().parse::<VertexCoord>().unwrap(), vertex);
            let edge = center.edges()[corner];
            prop_assert_eq!(edge.to_string().parse::<EdgeCoord>().unwrap(), edge);
        }
    }
}
