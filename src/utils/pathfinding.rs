//! # Pathfinding Algorithms
//!
//! A* search over the tile grid, used both to check that a generated level is
//! solvable and to steer monsters towards the player.

use crate::{Direction, Grid, Position};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Finds a shortest 4-directional path between two cells.
///
/// The returned path excludes `start` and includes `goal`. It is empty when
/// the goal cannot be reached or when `start == goal`. Every step costs 1 and
/// only in-bounds traversable cells are expanded. The heuristic is the
/// Euclidean distance to the goal; entries with equal `f` leave the open set
/// in insertion order.
///
/// # Examples
///
/// ```
/// use burrow::{find_path, Grid, Position, TileType};
///
/// let mut grid = Grid::new(3, 1);
/// for x in 0..3 {
///     grid.set_tile_type(Position::new(x, 0), TileType::Path).unwrap();
/// }
/// let path = find_path(&grid, Position::new(0, 0), Position::new(2, 0));
/// assert_eq!(path, vec![Position::new(1, 0), Position::new(2, 0)]);
/// ```
pub fn find_path(grid: &Grid, start: Position, goal: Position) -> Vec<Position> {
    let mut open_set = BinaryHeap::new();
    let mut closed = HashSet::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, u32> = HashMap::new();
    let mut sequence = 0u64;

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        position: start,
        f_score: start.euclidean_distance(goal),
        sequence,
    });

    while let Some(current_node) = open_set.pop() {
        let current = current_node.position;

        if current == goal {
            return reconstruct_path(&came_from, goal);
        }

        // Stale heap entries for already expanded cells
        if !closed.insert(current) {
            continue;
        }

        let current_g = g_score.get(&current).copied().unwrap_or(u32::MAX);

        for direction in Direction::all() {
            let neighbor = current + direction.to_delta();
            if !grid.is_traversable(neighbor) || closed.contains(&neighbor) {
                continue;
            }

            let tentative_g_score = current_g + 1;
            if tentative_g_score < g_score.get(&neighbor).copied().unwrap_or(u32::MAX) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative_g_score);

                sequence += 1;
                open_set.push(AStarNode {
                    position: neighbor,
                    f_score: tentative_g_score as f64 + neighbor.euclidean_distance(goal),
                    sequence,
                });
            }
        }
    }

    Vec::new()
}

/// Walks predecessor links back from the goal and reverses them.
fn reconstruct_path(came_from: &HashMap<Position, Position>, goal: Position) -> Vec<Position> {
    let mut path = Vec::new();
    let mut current = goal;

    while let Some(&previous) = came_from.get(&current) {
        path.push(current);
        current = previous;
    }

    path.reverse();
    path
}

/// Node for A* pathfinding algorithm.
#[derive(Debug, Clone)]
struct AStarNode {
    position: Position,
    f_score: f64,
    sequence: u64,
}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AStarNode {}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour in BinaryHeap; older entries win ties
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileType;

    fn open_grid(width: u32, height: u32) -> Grid {
        let mut grid = Grid::new(width, height);
        for row in &mut grid.tiles {
            for tile in row {
                tile.tile_type = TileType::Floor;
            }
        }
        grid
    }

    #[test]
    fn test_open_grid_path_is_manhattan() {
        let grid = open_grid(5, 5);
        let start = Position::new(0, 0);
        let goal = Position::new(4, 4);

        let path = find_path(&grid, start, goal);
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(start.manhattan_distance(path[0]), 1);
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_wall_band_blocks_path() {
        let mut grid = open_grid(7, 7);
        for y in 0..7 {
            grid.set_tile_type(Position::new(3, y), TileType::VLWall).unwrap();
        }

        let path = find_path(&grid, Position::new(0, 3), Position::new(6, 3));
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_detours_through_gap() {
        let mut grid = open_grid(7, 7);
        for y in 0..7 {
            if y != 6 {
                grid.set_tile_type(Position::new(3, y), TileType::VLWall).unwrap();
            }
        }

        let path = find_path(&grid, Position::new(0, 0), Position::new(6, 0));
        assert!(path.contains(&Position::new(3, 6)));
        assert_eq!(path.len(), 18);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = open_grid(3, 3);
        let p = Position::new(1, 1);
        assert!(find_path(&grid, p, p).is_empty());
    }

    #[test]
    fn test_untraversable_goal() {
        let mut grid = open_grid(3, 3);
        grid.set_tile_type(Position::new(2, 2), TileType::Void).unwrap();
        assert!(find_path(&grid, Position::new(0, 0), Position::new(2, 2)).is_empty());
    }

    #[test]
    fn test_goal_outside_grid() {
        let grid = open_grid(3, 3);
        assert!(find_path(&grid, Position::new(0, 0), Position::new(5, 5)).is_empty());
    }
}
