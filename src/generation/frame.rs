//! # Frame
//!
//! Turns the architect's raw wall rings and corridor markers into final tiles:
//! corners, walls, doors where a corridor crosses a wall, and room floors.

use crate::{BurrowError, BurrowResult, Grid, Position, Room, TileType};
use log::debug;
use pathfinding::prelude::bfs_reach;
use std::collections::HashSet;

/// Door and wall post-processor.
///
/// Must run after every tunnel has been carved; a door is only recognised when
/// the corridor tiles on both sides of a wall cell already exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frame;

impl Frame {
    /// Resolves the wall ring and interior of every room.
    pub fn post_proc_tiles(grid: &mut Grid, rooms: &[Room]) -> BurrowResult<()> {
        for room in rooms {
            Self::resolve_room(grid, room)?;
        }
        debug!("frame: resolved {} rooms, {} doors", rooms.len(), Self::door_count(grid));
        Ok(())
    }

    fn resolve_room(grid: &mut Grid, room: &Room) -> BurrowResult<()> {
        let [left_top, right_top, left_bottom, right_bottom] = room.wall_corners();
        grid.set_tile_type(left_top, TileType::LTCorner)?;
        grid.set_tile_type(right_top, TileType::RTCorner)?;
        grid.set_tile_type(left_bottom, TileType::LBCorner)?;
        grid.set_tile_type(right_bottom, TileType::RBCorner)?;

        let vertical = [Position::new(0, -1), Position::new(0, 1)];
        for x in room.interior_xs() {
            let top = Position::new(x, room.wall_top());
            let tile = Self::door_or_wall(grid, top, vertical, TileType::TDoor, TileType::HTWall);
            grid.set_tile_type(top, tile)?;

            let bottom = Position::new(x, room.wall_bottom());
            let tile = Self::door_or_wall(grid, bottom, vertical, TileType::BDoor, TileType::HBWall);
            grid.set_tile_type(bottom, tile)?;
        }

        let horizontal = [Position::new(-1, 0), Position::new(1, 0)];
        for y in room.interior_ys() {
            let left = Position::new(room.wall_left(), y);
            let tile = Self::door_or_wall(grid, left, horizontal, TileType::LDoor, TileType::VLWall);
            grid.set_tile_type(left, tile)?;

            let right = Position::new(room.wall_right(), y);
            let tile = Self::door_or_wall(grid, right, horizontal, TileType::RDoor, TileType::VRWall);
            grid.set_tile_type(right, tile)?;
        }

        for pos in room.interior_positions() {
            grid.set_tile_type(pos, TileType::Floor)?;
        }

        Ok(())
    }

    /// A wall cell becomes a door when corridor tiles sit on both sides of it.
    fn door_or_wall(
        grid: &Grid,
        pos: Position,
        sides: [Position; 2],
        door: TileType,
        wall: TileType,
    ) -> TileType {
        let crossed = sides
            .iter()
            .all(|&delta| grid.tile_type(pos + delta) == Some(TileType::Path));
        if crossed {
            door
        } else {
            wall
        }
    }

    fn door_count(grid: &Grid) -> usize {
        grid.iter().filter(|(_, tile)| tile.tile_type.is_door()).count()
    }

    /// Checks that every room centre can be reached from the first room's centre.
    pub fn validate_connectivity(grid: &Grid, rooms: &[Room]) -> BurrowResult<()> {
        let Some(first) = rooms.first() else {
            return Ok(());
        };

        let origin = first.center_tile();
        let reachable: HashSet<Position> = bfs_reach(origin, |&pos: &Position| {
            pos.cardinal_adjacent_positions()
                .into_iter()
                .filter(|&next| grid.is_traversable(next))
                .collect::<Vec<_>>()
        })
        .collect();

        match rooms
            .iter()
            .map(Room::center_tile)
            .find(|center| !reachable.contains(center))
        {
            Some(center) => Err(BurrowError::BrokenDungeon(format!(
                "room centre {:?} is cut off from {:?}",
                center, origin
            ))),
            None => Ok(()),
        }
    }
}
