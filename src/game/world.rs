//! # World Representation
//!
//! Tile types and the fixed-size grid the generator paints into.

use crate::{BurrowError, BurrowResult, Position};
use serde::{Deserialize, Serialize};

/// Every kind of cell the generator can produce.
///
/// `Path` starts life as the provisional corridor marker written by the
/// tunnel carver and remains the corridor tile once door and wall resolution
/// is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileType {
    /// Solid rock outside any room or corridor
    #[default]
    Void,
    /// Room interior
    Floor,
    /// Corridor
    Path,
    /// Top horizontal wall
    HTWall,
    /// Bottom horizontal wall
    HBWall,
    /// Left vertical wall
    VLWall,
    /// Right vertical wall
    VRWall,
    /// Left-top corner
    LTCorner,
    /// Right-top corner
    RTCorner,
    /// Left-bottom corner
    LBCorner,
    /// Right-bottom corner
    RBCorner,
    /// Door in a top wall
    TDoor,
    /// Door in a bottom wall
    BDoor,
    /// Door in a left wall
    LDoor,
    /// Door in a right wall
    RDoor,
}

impl TileType {
    /// Whether agents can stand on this tile.
    pub fn is_traversable(self) -> bool {
        matches!(self, TileType::Floor | TileType::Path) || self.is_door()
    }

    /// Straight wall segments.
    pub fn is_wall(self) -> bool {
        matches!(
            self,
            TileType::HTWall | TileType::HBWall | TileType::VLWall | TileType::VRWall
        )
    }

    /// Wall ring corners.
    pub fn is_corner(self) -> bool {
        matches!(
            self,
            TileType::LTCorner | TileType::RTCorner | TileType::LBCorner | TileType::RBCorner
        )
    }

    /// Doors of any orientation.
    pub fn is_door(self) -> bool {
        matches!(
            self,
            TileType::TDoor | TileType::BDoor | TileType::LDoor | TileType::RDoor
        )
    }
}

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile {
    /// What occupies the cell
    pub tile_type: TileType,
    /// Fog-of-war flag, owned by the consumer
    pub explored: bool,
}

impl Tile {
    /// Creates an unexplored tile of the given type.
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            explored: false,
        }
    }
}

/// Fixed-size tile grid, addressed as `tiles[y][x]`.
///
/// The grid is allocated once by the owner and never resized by the
/// generator; generation only rewrites cell contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Vec<Tile>>,
}

impl Grid {
    /// Creates a grid filled with unexplored void.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow::{Grid, Position, TileType};
    ///
    /// let grid = Grid::new(10, 6);
    /// assert_eq!(grid.tile_type(Position::new(9, 5)), Some(TileType::Void));
    /// assert_eq!(grid.tile_type(Position::new(10, 5)), None);
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![vec![Tile::default(); width as usize]; height as usize],
        }
    }

    /// Sets every cell back to unexplored void.
    pub fn reset(&mut self) {
        for row in &mut self.tiles {
            for tile in row {
                *tile = Tile::default();
            }
        }
    }

    /// Checks whether a position lies inside the grid.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(&self.tiles[pos.y as usize][pos.x as usize])
    }

    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(&mut self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Tile type at a position, `None` outside the grid.
    pub fn tile_type(&self, pos: Position) -> Option<TileType> {
        self.get_tile(pos).map(|tile| tile.tile_type)
    }

    /// Rewrites the type of a cell, keeping its fog-of-war flag.
    pub fn set_tile_type(&mut self, pos: Position, tile_type: TileType) -> BurrowResult<()> {
        let tile = self
            .get_tile_mut(pos)
            .ok_or(BurrowError::OutOfBounds(pos))?;
        tile.tile_type = tile_type;
        Ok(())
    }

    /// Whether a position is inside the grid and walkable.
    pub fn is_traversable(&self, pos: Position) -> bool {
        self.tile_type(pos)
            .map(TileType::is_traversable)
            .unwrap_or(false)
    }

    /// Marks a cell as explored. Out-of-bounds positions are ignored.
    pub fn reveal(&mut self, pos: Position) {
        if let Some(tile) = self.get_tile_mut(pos) {
            tile.explored = true;
        }
    }

    /// Iterates every position together with its tile, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Tile)> + '_ {
        self.tiles.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, tile)| (Position::new(x as i32, y as i32), tile))
        })
    }

    /// Counts cells of the given type.
    pub fn count(&self, tile_type: TileType) -> usize {
        self.iter()
            .filter(|(_, tile)| tile.tile_type == tile_type)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(8, 5);
        assert_eq!(grid.tiles.len(), 5);
        assert_eq!(grid.tiles[0].len(), 8);
        assert_eq!(grid.count(TileType::Void), 40);
    }

    #[test]
    fn test_set_tile_type_bounds() {
        let mut grid = Grid::new(4, 4);
        assert!(grid.set_tile_type(Position::new(3, 3), TileType::Floor).is_ok());
        assert_eq!(grid.tile_type(Position::new(3, 3)), Some(TileType::Floor));

        let err = grid
            .set_tile_type(Position::new(4, 0), TileType::Floor)
            .unwrap_err();
        assert!(matches!(err, BurrowError::OutOfBounds(pos) if pos == Position::new(4, 0)));
    }

    #[test]
    fn test_reset_clears_types_and_fog() {
        let mut grid = Grid::new(4, 4);
        grid.set_tile_type(Position::new(1, 1), TileType::Path).unwrap();
        grid.reveal(Position::new(1, 1));
        grid.reset();
        assert_eq!(grid, Grid::new(4, 4));
    }

    #[test]
    fn test_traversable_tiles() {
        assert!(TileType::Floor.is_traversable());
        assert!(TileType::Path.is_traversable());
        assert!(TileType::LDoor.is_traversable());
        assert!(!TileType::Void.is_traversable());
        assert!(!TileType::HTWall.is_traversable());
        assert!(!TileType::RBCorner.is_traversable());
    }

    #[test]
    fn test_grid_traversable_outside_bounds() {
        let mut grid = Grid::new(3, 3);
        grid.set_tile_type(Position::new(0, 0), TileType::Floor).unwrap();
        assert!(grid.is_traversable(Position::new(0, 0)));
        assert!(!grid.is_traversable(Position::new(-1, 0)));
        assert!(!grid.is_traversable(Position::new(1, 1)));
    }
}
