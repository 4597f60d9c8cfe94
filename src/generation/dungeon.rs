//! # Dungeon Generation
//!
//! Room layout and corridor carving using binary space partitioning.
//!
//! The architect produces the raw structure of a level: wall rings for every
//! room and `Path` markers for every corridor. Door and floor resolution is
//! left to [`Frame`](crate::Frame), which must run afterwards.

use crate::{
    bresenham_line, BurrowError, BurrowResult, Edge, GenerationConfig, Generator, Grid, Position,
    Room, TileType,
};
use log::debug;
use rand::{rngs::StdRng, Rng};

/// Rooms and corridors of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    /// Rooms that survived pruning
    pub rooms: Vec<Room>,
    /// Spanning-tree edges, built before pruning
    pub corridors: Vec<Edge>,
}

/// BSP dungeon architect.
///
/// This generator creates the level skeleton by:
/// 1. Recursively splitting the grid into leaf rectangles
/// 2. Joining the leaves with a greedy nearest-neighbour spanning tree
/// 3. Pruning random rooms down to the configured maximum
/// 4. Stamping wall rings and carving one tunnel per tree edge
#[derive(Debug, Clone)]
pub struct Architect<'a> {
    config: &'a GenerationConfig,
}

/// Axis of a BSP cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitDirection {
    /// Cut parallel to the x axis, splitting the height
    Horizontal,
    /// Cut parallel to the y axis, splitting the width
    Vertical,
}

impl SplitDirection {
    fn other(self) -> Self {
        match self {
            SplitDirection::Horizontal => SplitDirection::Vertical,
            SplitDirection::Vertical => SplitDirection::Horizontal,
        }
    }
}

/// A sideways shift of the tunnel around an obstructing room.
#[derive(Debug, Clone, Copy)]
struct Detour {
    offset: Position,
    remaining: u32,
    room: Room,
}

impl<'a> Architect<'a> {
    /// Creates an architect for the given configuration.
    pub fn new(config: &'a GenerationConfig) -> Self {
        Self { config }
    }

    /// Splits `leaf` recursively and returns the accepted rooms as a flat list.
    ///
    /// Leaves whose shorter side is below the minimum room size are dropped,
    /// oversized leaves are split regardless of depth, and leaves that cannot
    /// be cut along either axis are accepted as they are.
    pub fn split_tree(&self, leaf: Room, depth: u32, rng: &mut StdRng) -> Vec<Room> {
        if !leaf.is_valid(self.config.min_room_size) {
            return Vec::new();
        }

        let oversized = leaf.area() > self.config.max_room_area;
        if depth >= self.config.max_room_depth && !oversized {
            return vec![leaf];
        }

        let direction = self.choose_direction(&leaf, rng);
        let halves = self
            .split(&leaf, direction, rng)
            .or_else(|| self.split(&leaf, direction.other(), rng));

        match halves {
            Some((first, second)) => {
                let mut rooms = self.split_tree(first, depth + 1, rng);
                rooms.extend(self.split_tree(second, depth + 1, rng));
                rooms
            }
            None => vec![leaf],
        }
    }

    /// Prefers cutting across the long side of elongated leaves.
    fn choose_direction(&self, leaf: &Room, rng: &mut StdRng) -> SplitDirection {
        let width = leaf.width() as f64;
        let height = leaf.height() as f64;

        if width > 2.5 * height {
            SplitDirection::Vertical
        } else if height > 2.5 * width {
            SplitDirection::Horizontal
        } else if rng.gen_bool(0.5) {
            SplitDirection::Vertical
        } else {
            SplitDirection::Horizontal
        }
    }

    /// Cuts a leaf in two, leaving both halves at least the minimum size.
    fn split(&self, leaf: &Room, direction: SplitDirection, rng: &mut StdRng) -> Option<(Room, Room)> {
        let min = self.config.min_room_size;
        let extent = match direction {
            SplitDirection::Vertical => leaf.width(),
            SplitDirection::Horizontal => leaf.height(),
        };
        if extent < 2 * min + 1 {
            return None;
        }

        let cut = rng.gen_range(min..=extent - 1 - min);
        let mut first = *leaf;
        let mut second = *leaf;
        match direction {
            SplitDirection::Vertical => {
                first.x2 = leaf.x1 + cut;
                second.x1 = first.x2 + 1;
            }
            SplitDirection::Horizontal => {
                first.y2 = leaf.y1 + cut;
                second.y1 = first.y2 + 1;
            }
        }

        Some((first, second))
    }

    /// Connects all rooms with `rooms.len() - 1` edges.
    ///
    /// Starting from a random room, the unconnected room whose centre is
    /// nearest to any connected room's centre is attached next. Ties go to the
    /// earlier room in iteration order.
    pub fn spanning_tree(rooms: &[Room], rng: &mut StdRng) -> Vec<Edge> {
        if rooms.is_empty() {
            return Vec::new();
        }

        let mut unconnected = rooms.to_vec();
        let seed = unconnected.remove(rng.gen_range(0..unconnected.len()));
        let mut connected = vec![seed];
        let mut edges = Vec::with_capacity(rooms.len() - 1);

        while !unconnected.is_empty() {
            let mut nearest: Option<(usize, usize, f64)> = None;
            for (candidate_idx, candidate) in unconnected.iter().enumerate() {
                for (anchor_idx, anchor) in connected.iter().enumerate() {
                    let distance = anchor.center_distance(candidate);
                    if nearest.map_or(true, |(_, _, best)| distance < best) {
                        nearest = Some((anchor_idx, candidate_idx, distance));
                    }
                }
            }

            let Some((anchor_idx, candidate_idx, _)) = nearest else {
                break;
            };
            let room = unconnected.remove(candidate_idx);
            edges.push(Edge::new(connected[anchor_idx], room));
            connected.push(room);
        }

        edges
    }

    /// Drops random rooms until at most `max_rooms` remain.
    ///
    /// Runs after the spanning tree is built, so corridors towards a pruned
    /// room end in a bare junction where the room used to be.
    fn prune_rooms(&self, rooms: &mut Vec<Room>, rng: &mut StdRng) -> BurrowResult<()> {
        while rooms.len() > self.config.max_rooms {
            rooms.remove(rng.gen_range(0..rooms.len()));
        }

        if rooms.len() <= self.config.min_rooms {
            return Err(BurrowError::BrokenDungeon(format!(
                "only {} rooms left, more than {} required",
                rooms.len(),
                self.config.min_rooms
            )));
        }

        Ok(())
    }

    /// Stamps the wall ring of every room. Interiors stay untouched.
    fn write_walls(&self, grid: &mut Grid, rooms: &[Room]) -> BurrowResult<()> {
        for room in rooms {
            let [left_top, right_top, left_bottom, right_bottom] = room.wall_corners();
            grid.set_tile_type(left_top, TileType::LTCorner)?;
            grid.set_tile_type(right_top, TileType::RTCorner)?;
            grid.set_tile_type(left_bottom, TileType::LBCorner)?;
            grid.set_tile_type(right_bottom, TileType::RBCorner)?;

            for x in room.interior_xs() {
                grid.set_tile_type(Position::new(x, room.wall_top()), TileType::HTWall)?;
                grid.set_tile_type(Position::new(x, room.wall_bottom()), TileType::HBWall)?;
            }

            for y in room.interior_ys() {
                grid.set_tile_type(Position::new(room.wall_left(), y), TileType::VLWall)?;
                grid.set_tile_type(Position::new(room.wall_right(), y), TileType::VRWall)?;
            }
        }

        Ok(())
    }

    /// Plans the tiles of a corridor between the centres of two rooms.
    ///
    /// The route is an L through a randomly chosen elbow. Whenever the route
    /// is about to run into the boundary of a room in `rooms` other than the
    /// two endpoints, it is shifted sideways onto that room's boundary for as
    /// long as the room is wide, and the shifts in and out are carved as well.
    pub fn tunnel_between(
        &self,
        room1: Room,
        room2: Room,
        rooms: &[Room],
        rng: &mut StdRng,
    ) -> Vec<Position> {
        let start = room1.center_tile();
        let end = room2.center_tile();
        let elbow = if rng.gen_bool(0.5) {
            Position::new(end.x, start.y)
        } else {
            Position::new(start.x, end.y)
        };

        let mut direct = bresenham_line(start, elbow);
        direct.extend(bresenham_line(elbow, end).into_iter().skip(1));

        let mut carved = Vec::with_capacity(direct.len());
        let mut detour: Option<Detour> = None;
        let mut last_obstacle: Option<Room> = None;

        for point in direct {
            if detour.is_none() {
                detour = self.find_obstacle(point, room1, room2, last_obstacle, rooms, rng);
                if let Some(found) = detour {
                    carved.extend(bresenham_line(point, point + found.offset));
                    last_obstacle = Some(found.room);
                }
            }

            if let Some(mut active) = detour {
                let shifted = point + active.offset;
                carved.push(shifted);
                active.remaining -= 1;
                if active.remaining == 0 {
                    carved.extend(bresenham_line(shifted, point));
                    detour = None;
                } else {
                    detour = Some(active);
                }
            } else {
                carved.push(point);
            }
        }

        if let Some(active) = detour {
            carved.extend(bresenham_line(end + active.offset, end));
        }

        carved
    }

    /// Looks for a room whose boundary the tunnel is about to graze at `point`.
    fn find_obstacle(
        &self,
        point: Position,
        room1: Room,
        room2: Room,
        last_obstacle: Option<Room>,
        rooms: &[Room],
        rng: &mut StdRng,
    ) -> Option<Detour> {
        let obstacles = rooms
            .iter()
            .filter(|room| **room != room1 && **room != room2 && Some(**room) != last_obstacle);

        for room in obstacles {
            let within_x = (room.x1..=room.x2).contains(&point.x);
            let within_y = (room.y1..=room.y2).contains(&point.y);

            if within_x && (point.y == room.y1 || point.y == room.y2) {
                let side = if rng.gen_bool(0.5) { room.x1 } else { room.x2 };
                return Some(Detour {
                    offset: Position::new(side - point.x, 0),
                    remaining: room.height() as u32 + 1,
                    room: *room,
                });
            }

            if within_y && (point.x == room.x1 || point.x == room.x2) {
                let side = if rng.gen_bool(0.5) { room.y1 } else { room.y2 };
                return Some(Detour {
                    offset: Position::new(0, side - point.y),
                    remaining: room.width() as u32 + 1,
                    room: *room,
                });
            }
        }

        None
    }

    /// Writes a planned corridor into the grid as `Path` tiles.
    ///
    /// Points outside the grid are skipped. A corridor tile on the wall
    /// corner of any room breaks the level.
    fn carve(&self, grid: &mut Grid, path: &[Position], rooms: &[Room]) -> BurrowResult<()> {
        for &pos in path {
            if !grid.is_valid_position(pos) {
                continue;
            }

            if let Some(room) = rooms.iter().find(|room| room.is_wall_corner(pos)) {
                return Err(BurrowError::BrokenDungeon(format!(
                    "corridor punctures the corner {:?} of room {:?}",
                    pos, room
                )));
            }

            grid.set_tile_type(pos, TileType::Path)?;
        }

        Ok(())
    }

    /// Plans and carves the corridor for one spanning-tree edge.
    fn connect_rooms(
        &self,
        grid: &mut Grid,
        edge: &Edge,
        rooms: &[Room],
        rng: &mut StdRng,
    ) -> BurrowResult<()> {
        let path = self.tunnel_between(edge.room1, edge.room2, rooms, rng);
        self.carve(grid, &path, rooms)
    }
}

impl Generator<Blueprint> for Architect<'_> {
    fn generate(&self, grid: &mut Grid, rng: &mut StdRng) -> BurrowResult<Blueprint> {
        let root = Room::new(0, 0, grid.width as i32 - 1, grid.height as i32 - 1);
        let mut rooms = self.split_tree(root, 0, rng);
        if rooms.is_empty() {
            return Err(BurrowError::BrokenDungeon(
                "space partition produced no rooms".to_string(),
            ));
        }

        let corridors = Self::spanning_tree(&rooms, rng);
        let leaves = rooms.len();
        self.prune_rooms(&mut rooms, rng)?;
        debug!(
            "architect: {} leaves, {} rooms kept, {} corridors",
            leaves,
            rooms.len(),
            corridors.len()
        );

        self.write_walls(grid, &rooms)?;
        for edge in &corridors {
            self.connect_rooms(grid, edge, &rooms, rng)?;
        }

        Ok(Blueprint { rooms, corridors })
    }

    fn validate(&self, blueprint: &Blueprint, grid: &Grid) -> BurrowResult<()> {
        let min = self.config.min_room_size;

        for (idx, room) in blueprint.rooms.iter().enumerate() {
            if !room.is_valid(min) {
                return Err(BurrowError::BrokenDungeon(format!(
                    "room {:?} is smaller than {}",
                    room, min
                )));
            }
            if !grid.is_valid_position(Position::new(room.x1, room.y1))
                || !grid.is_valid_position(Position::new(room.x2, room.y2))
            {
                return Err(BurrowError::BrokenDungeon(format!(
                    "room {:?} leaves the grid",
                    room
                )));
            }
            if blueprint.rooms[idx + 1..]
                .iter()
                .any(|other| room.walls_overlap(other))
            {
                return Err(BurrowError::BrokenDungeon(format!(
                    "room {:?} overlaps another room",
                    room
                )));
            }
            if blueprint.rooms.len() > 1 && !blueprint.corridors.iter().any(|e| e.connects(room)) {
                return Err(BurrowError::BrokenDungeon(format!(
                    "room {:?} has no corridor",
                    room
                )));
            }
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "Architect"
    }
}
