//! # Burrow
//!
//! The computational core of a roguelike: procedural dungeon levels on a fixed
//! tile grid, plus shortest-path search over that grid for autonomous agents.
//!
//! ## Architecture Overview
//!
//! - **Game**: positions, the tile grid and the explicit [`WorldState`] that the
//!   surrounding application threads through every call
//! - **Generation**: BSP room layout, corridor carving, door/wall resolution and
//!   placement of spawn, stairs, pickups and monsters
//! - **Utils**: line rasterisation and the A* pathfinder
//!
//! Rendering, input, combat and persistence belong to the consumer; this crate
//! only produces a grid and a [`Level`] describing what sits on it.

pub mod game;
pub mod generation;
pub mod utils;

pub use game::*;
pub use generation::*;
pub use utils::*;

pub use game::{
    Direction, EntityId, Grid, MonsterAction, Position, Tile, TileType, WorldState,
};

pub use generation::{
    Architect, Blueprint, Edge, Frame, GenerationConfig, Generator, ItemPlacer, Level, Master,
    Monster, MonsterKind, MonsterPlacer, Pickup, Room,
};

/// Core error type for the Burrow generation pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BurrowError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The layout violates a generation invariant and must be regenerated
    #[error("Broken dungeon: {0}")]
    BrokenDungeon(String),

    /// Two points of the level are not connected by traversable tiles
    #[error("No path from {from:?} to {to:?}")]
    Unreachable { from: Position, to: Position },

    /// Configuration cannot ever produce a valid level
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation requires state that does not exist yet
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Grid access outside its bounds
    #[error("Position out of bounds: {0:?}")]
    OutOfBounds(Position),

    /// Regeneration gave up after the configured number of attempts
    #[error("Generation failed after {0} attempts")]
    RetryLimitExceeded(u32),
}

impl BurrowError {
    /// Whether the orchestrator should wipe the grid and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BurrowError::BrokenDungeon(_) | BurrowError::Unreachable { .. }
        )
    }
}

/// Result type used throughout the Burrow codebase.
pub type BurrowResult<T> = Result<T, BurrowError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate-wide constants.
pub mod config {
    /// Default grid width in tiles
    pub const DEFAULT_TILE_WIDTH: u32 = 80;

    /// Default grid height in tiles
    pub const DEFAULT_TILE_HEIGHT: u32 = 48;

    /// Distance from a room's bounding rectangle to its wall ring
    pub const WALL_OFFSET: i32 = 1;

    /// Default BSP recursion depth (roughly 20 to 25 leaves on the default grid)
    pub const DEFAULT_MAX_ROOM_DEPTH: u32 = 5;

    /// Rooms kept after pruning
    pub const DEFAULT_MAX_ROOMS: usize = 13;

    /// Distance under which a monster notices the player
    pub const SENSE_RADIUS: f64 = 7.0;
}
