//! The fixed beginner board.
//!
//! Board generation belongs to the host application; this layout exists so
//! tests and the simulator have a known, balanced map to play on.

use crate::board::{Board, BoardError, Hex, PortKind, Resource};
use crate::hex::{CubeCoord, EdgeCoord};

/// Terrain of the 18 producing hexes, ring 1 then ring 2 (desert sits in
/// the middle)
const PRODUCING: [Resource; 18] = [
    Resource::Wood,
    Resource::Sheep,
    Resource::Wheat,
    Resource::Brick,
    Resource::Ore,
    Resource::Sheep,
    Resource::Wood,
    Resource::Wheat,
    Resource::Ore,
    Resource::Wood,
    Resource::Brick,
    Resource::Sheep,
    Resource::Wheat,
    Resource::Brick,
    Resource::Wood,
    Resource::Ore,
    Resource::Sheep,
    Resource::Wheat,
];

/// Dice tokens, matched to `PRODUCING` by position
const TOKENS: [u8; 18] = [5, 2, 6, 3, 8, 10, 9, 12, 11, 4, 8, 10, 9, 4, 5, 6, 3, 11];

/// Port kinds around the coast, one on every other sea hex
const PORTS: [PortKind; 9] = [
    PortKind::Generic,
    PortKind::Specific(Resource::Wood),
    PortKind::Generic,
    PortKind::Specific(Resource::Brick),
    PortKind::Specific(Resource::Sheep),
    PortKind::Generic,
    PortKind::Specific(Resource::Wheat),
    PortKind::Generic,
    PortKind::Specific(Resource::Ore),
];

/// Radius of the land island
pub const ISLAND_RADIUS: u32 = 2;

/// Where the robber starts on the standard board
pub const DESERT: CubeCoord = CubeCoord::ORIGIN;

/// 19 land hexes, a ring of 18 sea hexes and 9 ports
pub fn standard_board() -> Result<Board, BoardError> {
    let mut board = Board::new();

    board.insert_hex(Hex::desert(DESERT))?;
    let land = DESERT.spiral(ISLAND_RADIUS);
    for ((coord, resource), token) in land.iter().skip(1).zip(PRODUCING).zip(TOKENS) {
        board.insert_hex(Hex::producing(*coord, resource, token))?;
    }

    let sea = DESERT.ring(ISLAND_RADIUS + 1);
    for coord in &sea {
        board.insert_hex(Hex::sea(*coord))?;
    }

    for (coord, kind) in sea.iter().step_by(2).zip(PORTS) {
        let Some(shore) = coord.neighbors().into_iter().find(|n| board.is_land(n)) else {
            continue;
        };
        if let Ok(edge) = EdgeCoord::new(*coord, shore) {
            board.add_port(kind, edge)?;
        }
    }

    Ok(board)
}
