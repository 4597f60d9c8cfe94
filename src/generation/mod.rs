//! # Generation Module
//!
//! Procedural level generation: BSP room layout, corridor carving, door/wall
//! resolution and placement of the interactive pieces.
//!
//! The stages run in a fixed order, driven by [`Master`]:
//!
//! 1. [`Architect`] splits the grid into rooms, connects them and carves tunnels
//! 2. [`Frame`] resolves walls, doors and floors and checks connectivity
//! 3. [`ItemPlacer`] picks the player spawn, the stairs and the pickups
//! 4. [`MonsterPlacer`] distributes monsters across the rooms

pub mod dungeon;
pub mod encounters;
pub mod frame;
pub mod items;
pub mod master;

pub use dungeon::*;
pub use encounters::*;
pub use frame::*;
pub use items::*;
pub use master::*;

use crate::config::{
    DEFAULT_MAX_ROOMS, DEFAULT_MAX_ROOM_DEPTH, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH, WALL_OFFSET,
};
use crate::{BurrowError, BurrowResult, Grid, Position};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// Configuration for level generation.
///
/// Every knob of the pipeline lives here so that a level is fully described by
/// its configuration and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
    /// BSP depth at which leaves are accepted as rooms
    pub max_room_depth: u32,
    /// Minimum room extent along either axis (`x2 - x1`)
    pub min_room_size: i32,
    /// Leaves larger than this are split regardless of depth
    pub max_room_area: i32,
    /// Rooms kept after pruning
    pub max_rooms: usize,
    /// Levels with this many rooms or fewer are rejected
    pub min_rooms: usize,
    /// Smallest gold pile
    pub pickup_quantity_min: u32,
    /// Largest gold pile
    pub pickup_quantity_max: u32,
    /// Per-room monster cap
    pub monsters_per_room: u32,
    /// Monsters per room on the first floor
    pub monster_base_ratio: f64,
    /// Additional monsters per room for every floor descended
    pub monster_depth_ratio: f64,
    /// Regeneration attempts before giving up
    pub max_attempts: u32,
}

impl GenerationConfig {
    /// Creates the default generation configuration with the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: DEFAULT_TILE_WIDTH,
            height: DEFAULT_TILE_HEIGHT,
            max_room_depth: DEFAULT_MAX_ROOM_DEPTH,
            min_room_size: 3 * WALL_OFFSET + 2,
            max_room_area: 300,
            max_rooms: DEFAULT_MAX_ROOMS,
            min_rooms: 4,
            pickup_quantity_min: 5,
            pickup_quantity_max: 50,
            monsters_per_room: 2,
            monster_base_ratio: 0.4,
            monster_depth_ratio: 0.1,
            max_attempts: 500,
        }
    }

    /// Creates a configuration for testing with a smaller grid and fewer rooms.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 48,
            height: 32,
            max_room_depth: 4,
            max_rooms: 8,
            min_rooms: 3,
            max_room_area: 200,
            ..Self::new(seed)
        }
    }

    /// Parses a JSON configuration. Missing fields fall back to the defaults.
    pub fn from_json_str(json: &str) -> BurrowResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> BurrowResult<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Creates the seeded random number generator shared by every stage.
    pub fn create_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Rejects configurations that could never produce a valid level.
    pub fn validate(&self) -> BurrowResult<()> {
        let invalid = |msg: String| -> BurrowResult<()> { Err(BurrowError::InvalidConfig(msg)) };

        if self.min_room_size < 3 * WALL_OFFSET + 2 {
            return invalid(format!(
                "min_room_size {} leaves no interior for wall offset {}",
                self.min_room_size, WALL_OFFSET
            ));
        }
        if WALL_OFFSET * 2 >= self.min_room_size {
            return invalid(format!(
                "wall offset {} is at least half of min_room_size {}",
                WALL_OFFSET, self.min_room_size
            ));
        }
        if self.max_room_depth == 0 {
            return invalid("max_room_depth must be positive".to_string());
        }
        if self.min_rooms >= self.max_rooms {
            return invalid(format!(
                "min_rooms {} must be below max_rooms {}",
                self.min_rooms, self.max_rooms
            ));
        }
        if self.max_room_area < (self.min_room_size + 1) * (self.min_room_size + 1) {
            return invalid(format!(
                "max_room_area {} is smaller than a minimum room",
                self.max_room_area
            ));
        }

        // A level needs more than `min_rooms` rooms after pruning
        let needed = self.min_rooms as u64 + 1;
        let cell = (self.min_room_size + 1) as u64;
        let capacity = (self.width as u64 / cell) * (self.height as u64 / cell);
        if capacity < needed {
            return invalid(format!(
                "{}x{} grid holds at most {} rooms, {} needed",
                self.width, self.height, capacity, needed
            ));
        }

        if self.pickup_quantity_min == 0 || self.pickup_quantity_min > self.pickup_quantity_max {
            return invalid(format!(
                "pickup quantity range {}..={} is empty",
                self.pickup_quantity_min, self.pickup_quantity_max
            ));
        }
        if self.monster_base_ratio < 0.0 || self.monster_depth_ratio < 0.0 {
            return invalid("monster ratios must not be negative".to_string());
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be positive".to_string());
        }

        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Axis-aligned rectangle produced by the BSP splitter.
///
/// The wall ring sits [`Room::WALL_OFFSET`] tiles inside the rectangle; the
/// border in between is left free for corridors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// Inset of the wall ring from the bounding rectangle.
    pub const WALL_OFFSET: i32 = WALL_OFFSET;

    /// Creates a room from its bounding rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::{Position, Room};
    ///
    /// let room = Room::new(0, 0, 10, 8);
    /// assert_eq!(room.wall_left(), 1);
    /// assert_eq!(room.interior_xs(), 2..=8);
    /// assert!(room.contains_interior(Position::new(5, 4)));
    /// assert!(!room.contains_interior(Position::new(1, 4)));
    /// ```
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i32 {
        self.width() * self.height()
    }

    /// Both extents reach the minimum room size.
    pub fn is_valid(&self, min_size: i32) -> bool {
        self.width() >= min_size && self.height() >= min_size
    }

    /// Geometric centre of the bounding rectangle.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }

    /// Tile containing the geometric centre; always an interior tile of a valid room.
    pub fn center_tile(&self) -> Position {
        let (x, y) = self.center();
        Position::new(x as i32, y as i32)
    }

    /// Euclidean distance between the centres of two rooms.
    pub fn center_distance(&self, other: &Room) -> f64 {
        let (x1, y1) = self.center();
        let (x2, y2) = other.center();
        ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
    }

    pub fn wall_left(&self) -> i32 {
        self.x1 + Self::WALL_OFFSET
    }

    pub fn wall_right(&self) -> i32 {
        self.x2 - Self::WALL_OFFSET
    }

    pub fn wall_top(&self) -> i32 {
        self.y1 + Self::WALL_OFFSET
    }

    pub fn wall_bottom(&self) -> i32 {
        self.y2 - Self::WALL_OFFSET
    }

    /// Interior columns, which are also the x-coordinates of the horizontal walls.
    pub fn interior_xs(&self) -> RangeInclusive<i32> {
        (self.wall_left() + 1)..=(self.wall_right() - 1)
    }

    /// Interior rows, which are also the y-coordinates of the vertical walls.
    pub fn interior_ys(&self) -> RangeInclusive<i32> {
        (self.wall_top() + 1)..=(self.wall_bottom() - 1)
    }

    /// Left-top, right-top, left-bottom, right-bottom.
    pub fn wall_corners(&self) -> [Position; 4] {
        [
            Position::new(self.wall_left(), self.wall_top()),
            Position::new(self.wall_right(), self.wall_top()),
            Position::new(self.wall_left(), self.wall_bottom()),
            Position::new(self.wall_right(), self.wall_bottom()),
        ]
    }

    pub fn is_wall_corner(&self, pos: Position) -> bool {
        (pos.x == self.wall_left() || pos.x == self.wall_right())
            && (pos.y == self.wall_top() || pos.y == self.wall_bottom())
    }

    /// Strictly inside the wall ring.
    pub fn contains_interior(&self, pos: Position) -> bool {
        self.interior_xs().contains(&pos.x) && self.interior_ys().contains(&pos.y)
    }

    /// Inside the wall ring or on it.
    pub fn contains_walled(&self, pos: Position) -> bool {
        (self.wall_left()..=self.wall_right()).contains(&pos.x)
            && (self.wall_top()..=self.wall_bottom()).contains(&pos.y)
    }

    pub fn interior_positions(&self) -> Vec<Position> {
        self.interior_ys()
            .flat_map(|y| self.interior_xs().map(move |x| Position::new(x, y)))
            .collect()
    }

    /// Every cell of the wall ring, corners included.
    pub fn wall_ring_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for x in self.wall_left()..=self.wall_right() {
            positions.push(Position::new(x, self.wall_top()));
            positions.push(Position::new(x, self.wall_bottom()));
        }
        for y in self.interior_ys() {
            positions.push(Position::new(self.wall_left(), y));
            positions.push(Position::new(self.wall_right(), y));
        }
        positions
    }

    /// Whether the wall rings of two rooms share any cell.
    pub fn walls_overlap(&self, other: &Room) -> bool {
        self.wall_left() <= other.wall_right()
            && other.wall_left() <= self.wall_right()
            && self.wall_top() <= other.wall_bottom()
            && other.wall_top() <= self.wall_bottom()
    }

    /// Uniformly random interior tile.
    pub fn random_interior_point<R: Rng>(&self, rng: &mut R) -> Position {
        Position::new(
            rng.gen_range(self.interior_xs()),
            rng.gen_range(self.interior_ys()),
        )
    }
}

/// Two rooms that must be joined by a corridor. The pair is unordered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub room1: Room,
    pub room2: Room,
}

impl Edge {
    pub fn new(room1: Room, room2: Room) -> Self {
        Self { room1, room2 }
    }

    /// Whether this edge has `room` as one of its endpoints.
    pub fn connects(&self, room: &Room) -> bool {
        self.room1 == *room || self.room2 == *room
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.room1 == other.room1 && self.room2 == other.room2)
            || (self.room1 == other.room2 && self.room2 == other.room1)
    }
}

impl Eq for Edge {}

/// A finished level, handed to the consumer after successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Floor number the level was generated for
    pub depth: u32,
    /// Surviving rooms, the authoritative room set
    pub rooms: Vec<Room>,
    /// Spanning-tree edges that were carved, including ones to pruned rooms
    pub corridors: Vec<Edge>,
    /// Where the player starts
    pub player_spawn: Position,
    /// Index into `rooms` of the spawn room
    pub spawn_room: usize,
    /// Exit to the next floor
    pub stairs: Position,
    /// Index into `rooms` of the stairs room
    pub stairs_room: usize,
    /// Collectibles, one per room other than spawn and stairs
    pub pickups: Vec<Pickup>,
    /// Monsters with their starting positions
    pub monsters: Vec<Monster>,
    /// Attempts the orchestrator needed, including the successful one
    pub attempts: u32,
}

impl Level {
    /// Room whose interior contains the position, if any.
    pub fn room_at(&self, pos: Position) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains_interior(pos))
    }
}

/// Trait for the stages of the generation pipeline.
///
/// Each stage writes into the shared grid, draws from the shared random
/// source and can check its own output afterwards.
pub trait Generator<T> {
    /// Runs the stage.
    fn generate(&self, grid: &mut Grid, rng: &mut StdRng) -> BurrowResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, grid: &Grid) -> BurrowResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.min_room_size, 3 * Room::WALL_OFFSET + 2);
        assert!(config.min_rooms < config.max_rooms);
        assert!(config.validate().is_ok());
        assert!(GenerationConfig::for_testing(1).validate().is_ok());
    }

    #[test]
    fn test_config_rejects_tiny_grid() {
        let config = GenerationConfig {
            width: 12,
            height: 12,
            ..GenerationConfig::new(1)
        };
        assert!(matches!(config.validate(), Err(BurrowError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_small_rooms() {
        let config = GenerationConfig {
            min_room_size: 2,
            ..GenerationConfig::new(1)
        };
        assert!(matches!(config.validate(), Err(BurrowError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_inverted_ranges() {
        let rooms = GenerationConfig {
            min_rooms: 13,
            ..GenerationConfig::new(1)
        };
        assert!(rooms.validate().is_err());

        let pickups = GenerationConfig {
            pickup_quantity_min: 10,
            pickup_quantity_max: 2,
            ..GenerationConfig::new(1)
        };
        assert!(pickups.validate().is_err());

        let attempts = GenerationConfig {
            max_attempts: 0,
            ..GenerationConfig::new(1)
        };
        assert!(attempts.validate().is_err());
    }

    #[test]
    fn test_shallow_tree_with_small_area_is_accepted() {
        let config = GenerationConfig {
            max_room_depth: 2,
            max_room_area: 150,
            ..GenerationConfig::new(11)
        };
        assert!(config.validate().is_ok());

        let mut grid = Grid::new(config.width, config.height);
        let mut rng = config.create_rng();
        let level = crate::Master::new(config.clone(), Grid::reset)
            .generate(&mut grid, &mut rng, 0)
            .unwrap();
        assert!(level.rooms.len() > config.min_rooms);
        assert!(level.rooms.iter().all(|room| room.area() <= config.max_room_area));
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config = GenerationConfig::from_json_str(r#"{ "seed": 99, "max_rooms": 10 }"#).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.max_rooms, 10);
        assert_eq!(config.width, GenerationConfig::default().width);

        assert!(matches!(
            GenerationConfig::from_json_str("{ not json"),
            Err(BurrowError::Serde(_))
        ));
        assert!(matches!(
            GenerationConfig::from_json_str(r#"{ "width": 6, "height": 6 }"#),
            Err(BurrowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_room_geometry() {
        let room = Room::new(10, 4, 20, 12);

        assert_eq!(room.width(), 10);
        assert_eq!(room.height(), 8);
        assert_eq!(room.area(), 80);
        assert_eq!(room.center(), (15.0, 8.0));
        assert_eq!(room.center_tile(), Position::new(15, 8));
        assert!(room.contains_interior(room.center_tile()));

        assert_eq!(room.interior_xs(), 12..=18);
        assert_eq!(room.interior_ys(), 6..=10);
        assert_eq!(
            room.wall_corners(),
            [
                Position::new(11, 5),
                Position::new(19, 5),
                Position::new(11, 11),
                Position::new(19, 11),
            ]
        );
        assert!(room.is_wall_corner(Position::new(19, 11)));
        assert!(!room.is_wall_corner(Position::new(15, 11)));
    }

    #[test]
    fn test_room_validity() {
        assert!(Room::new(0, 0, 5, 5).is_valid(5));
        assert!(!Room::new(0, 0, 4, 9).is_valid(5));
        assert!(Room::new(0, 0, 5, 5).contains_interior(Room::new(0, 0, 5, 5).center_tile()));
    }

    #[test]
    fn test_room_positions() {
        let room = Room::new(0, 0, 6, 6);

        let interior = room.interior_positions();
        let ring = room.wall_ring_positions();

        // Wall ring spans 1..=5, interior 2..=4
        assert_eq!(interior.len(), 9);
        assert_eq!(ring.len(), 16);

        let interior_set: HashSet<_> = interior.into_iter().collect();
        let ring_set: HashSet<_> = ring.into_iter().collect();
        assert!(interior_set.is_disjoint(&ring_set));
        assert!(ring_set.iter().all(|&p| room.contains_walled(p)));
    }

    #[test]
    fn test_adjacent_bsp_rooms_do_not_overlap() {
        let left = Room::new(0, 0, 10, 10);
        let right = Room::new(11, 0, 20, 10);
        let overlapping = Room::new(8, 2, 18, 9);

        assert!(!left.walls_overlap(&right));
        assert!(left.walls_overlap(&overlapping));
        assert!(right.walls_overlap(&overlapping));
    }

    #[test]
    fn test_edge_is_unordered() {
        let a = Room::new(0, 0, 6, 6);
        let b = Room::new(7, 0, 13, 6);
        assert_eq!(Edge::new(a, b), Edge::new(b, a));
        assert!(Edge::new(a, b).connects(&b));
        assert!(!Edge::new(a, a).connects(&b));
    }

    #[test]
    fn test_random_interior_point() {
        let room = Room::new(3, 3, 12, 9);
        let mut rng = GenerationConfig::new(5).create_rng();
        for _ in 0..50 {
            assert!(room.contains_interior(room.random_interior_point(&mut rng)));
        }
    }
}
