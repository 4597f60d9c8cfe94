//! # Item Placement
//!
//! Picks the player spawn and the stairs, then scatters gold across the
//! remaining rooms.

use crate::{
    find_path, new_entity_id, BurrowError, BurrowResult, EntityId, GenerationConfig, Generator,
    Grid, Position, Room,
};
use log::debug;
use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// A pile of gold lying on a room floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup {
    pub id: EntityId,
    pub position: Position,
    pub quantity: u32,
}

/// Output of the item stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub player_spawn: Position,
    /// Index into the room list
    pub spawn_room: usize,
    pub stairs: Position,
    /// Index into the room list, never equal to `spawn_room`
    pub stairs_room: usize,
    pub pickups: Vec<Pickup>,
}

/// Places the spawn point, the stairs and one gold pickup per other room.
#[derive(Debug, Clone)]
pub struct ItemPlacer<'a> {
    config: &'a GenerationConfig,
    rooms: &'a [Room],
}

impl<'a> ItemPlacer<'a> {
    pub fn new(config: &'a GenerationConfig, rooms: &'a [Room]) -> Self {
        Self { config, rooms }
    }
}

impl Generator<Placement> for ItemPlacer<'_> {
    fn generate(&self, _grid: &mut Grid, rng: &mut StdRng) -> BurrowResult<Placement> {
        let room_count = self.rooms.len();
        if room_count < 2 {
            return Err(BurrowError::BrokenDungeon(format!(
                "{} rooms cannot hold both spawn and stairs",
                room_count
            )));
        }

        let spawn_room = rng.gen_range(0..room_count);
        let player_spawn = self.rooms[spawn_room].random_interior_point(rng);

        // Draw from the other rooms only
        let mut stairs_room = rng.gen_range(0..room_count - 1);
        if stairs_room >= spawn_room {
            stairs_room += 1;
        }
        let stairs = self.rooms[stairs_room].random_interior_point(rng);

        let mut pickups = Vec::with_capacity(room_count - 2);
        for (idx, room) in self.rooms.iter().enumerate() {
            if idx == spawn_room || idx == stairs_room {
                continue;
            }
            let position = room.random_interior_point(rng);
            let quantity =
                rng.gen_range(self.config.pickup_quantity_min..=self.config.pickup_quantity_max);
            pickups.push(Pickup {
                id: new_entity_id(rng),
                position,
                quantity,
            });
        }

        debug!(
            "items: spawn {:?} in room {}, stairs {:?} in room {}, {} pickups",
            player_spawn,
            spawn_room,
            stairs,
            stairs_room,
            pickups.len()
        );

        Ok(Placement {
            player_spawn,
            spawn_room,
            stairs,
            stairs_room,
            pickups,
        })
    }

    fn validate(&self, placement: &Placement, grid: &Grid) -> BurrowResult<()> {
        if placement.spawn_room == placement.stairs_room {
            return Err(BurrowError::BrokenDungeon(
                "spawn and stairs share a room".to_string(),
            ));
        }

        let path = find_path(grid, placement.player_spawn, placement.stairs);
        if path.is_empty() {
            return Err(BurrowError::Unreachable {
                from: placement.player_spawn,
                to: placement.stairs,
            });
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "ItemPlacer"
    }
}
