//! Battleship: placement phase, then battle.
//!
//! Each side has its own ship board, shot grid, ship map and ready flag.
//! The battle starts once both sides are ready.

mod board;
mod bot;
mod geometry;
mod service;

pub use board::{
    BattleshipState, Grid, Phase, PlacementError, RANDOM_PLACE_ATTEMPTS, Shot, SideBoard,
};
pub use bot::{BattleshipBot, PLACEMENT_ATTEMPTS};
pub use geometry::{BOARD_SIZE, Coord, Orientation, ShipType, neighbors, ship_cells};
pub use service::BattleshipService;
