//! # Encounter Generation
//!
//! Distributes monsters over the rooms of a level. Deeper floors get more of
//! them, up to a fixed number per room.

use crate::{
    new_entity_id, BurrowError, BurrowResult, EntityId, GenerationConfig, Generator, Grid,
    Placement, Position, Room,
};
use log::debug;
use rand::{rngs::StdRng, seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The fixed roster of monster species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonsterKind {
    Bat,
    Emu,
    Hobgoblin,
    Kestrel,
    Snake,
}

impl MonsterKind {
    pub const ALL: [MonsterKind; 5] = [
        MonsterKind::Bat,
        MonsterKind::Emu,
        MonsterKind::Hobgoblin,
        MonsterKind::Kestrel,
        MonsterKind::Snake,
    ];

    /// Uniformly random species.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            MonsterKind::Bat => "bat",
            MonsterKind::Emu => "emu",
            MonsterKind::Hobgoblin => "hobgoblin",
            MonsterKind::Kestrel => "kestrel",
            MonsterKind::Snake => "snake",
        }
    }
}

/// A monster and where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub id: EntityId,
    pub kind: MonsterKind,
    pub position: Position,
}

/// Places monsters on free interior tiles, round-robin over shuffled rooms.
///
/// The spawn room stays empty whenever another room exists, and no room gets
/// more than `monsters_per_room`.
#[derive(Debug, Clone)]
pub struct MonsterPlacer<'a> {
    config: &'a GenerationConfig,
    rooms: &'a [Room],
    placement: &'a Placement,
    depth: u32,
}

impl<'a> MonsterPlacer<'a> {
    pub fn new(
        config: &'a GenerationConfig,
        rooms: &'a [Room],
        placement: &'a Placement,
        depth: u32,
    ) -> Self {
        Self {
            config,
            rooms,
            placement,
            depth,
        }
    }

    /// Indices of the rooms monsters may start in.
    fn eligible_rooms(&self) -> Vec<usize> {
        (0..self.rooms.len())
            .filter(|&idx| self.rooms.len() == 1 || idx != self.placement.spawn_room)
            .collect()
    }

    /// How many monsters this floor gets.
    pub fn monster_count(&self) -> usize {
        let ratio = self.config.monster_base_ratio
            + self.depth as f64 * self.config.monster_depth_ratio;
        let wanted = (self.rooms.len() as f64 * ratio).ceil() as usize;
        let cap = self.config.monsters_per_room as usize * self.eligible_rooms().len();
        wanted.min(cap)
    }
}

impl Generator<Vec<Monster>> for MonsterPlacer<'_> {
    fn generate(&self, _grid: &mut Grid, rng: &mut StdRng) -> BurrowResult<Vec<Monster>> {
        let mut order = self.eligible_rooms();
        if order.is_empty() {
            return Ok(Vec::new());
        }
        order.shuffle(rng);

        let mut occupied: HashSet<Position> =
            [self.placement.player_spawn, self.placement.stairs].into();
        let count = self.monster_count();
        let mut monsters = Vec::with_capacity(count);

        for slot in 0..count {
            let room = &self.rooms[order[slot % order.len()]];
            let free: Vec<Position> = room
                .interior_positions()
                .into_iter()
                .filter(|pos| !occupied.contains(pos))
                .collect();
            let Some(&position) = free.choose(rng) else {
                continue;
            };

            occupied.insert(position);
            monsters.push(Monster {
                id: new_entity_id(rng),
                kind: MonsterKind::random(rng),
                position,
            });
        }

        debug!(
            "encounters: {} monsters on depth {} across {} rooms",
            monsters.len(),
            self.depth,
            order.len()
        );

        Ok(monsters)
    }

    fn validate(&self, monsters: &Vec<Monster>, grid: &Grid) -> BurrowResult<()> {
        let mut seen = HashSet::new();
        let mut per_room: HashMap<usize, u32> = HashMap::new();

        for monster in monsters {
            let pos = monster.position;
            if !grid.is_traversable(pos)
                || pos == self.placement.player_spawn
                || pos == self.placement.stairs
                || !seen.insert(pos)
            {
                return Err(BurrowError::BrokenDungeon(format!(
                    "{} placed on unusable tile {:?}",
                    monster.kind.name(),
                    pos
                )));
            }

            if let Some(idx) = self
                .rooms
                .iter()
                .position(|room| room.contains_interior(pos))
            {
                let count = per_room.entry(idx).or_insert(0);
                *count += 1;
                if *count > self.config.monsters_per_room {
                    return Err(BurrowError::BrokenDungeon(format!(
                        "room {} holds more than {} monsters",
                        idx, self.config.monsters_per_room
                    )));
                }
            }
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "MonsterPlacer"
    }
}
