//! # World State Module
//!
//! Explicit state threaded through generation and per-turn updates.
//!
//! [`WorldState`] owns the tile grid, the shared random source and the current
//! level, and is the primary interface for consumers: build a floor, descend,
//! reveal tiles around the player and advance the monsters.

use crate::{
    BurrowError, BurrowResult, GenerationConfig, Grid, Level, Master, MonsterAction, Position,
    Pursuit,
};
use log::info;
use rand::rngs::StdRng;

/// Everything the generator and the turn updates work on.
#[derive(Debug, Clone)]
pub struct WorldState {
    /// Configuration every floor is generated with
    pub config: GenerationConfig,
    /// Tile grid, allocated once from the configured size
    pub grid: Grid,
    /// Current floor, `None` until the first generation succeeds
    pub level: Option<Level>,
    /// Floor number of the current level
    pub depth: u32,
    rng: StdRng,
    pursuit: Pursuit,
}

impl WorldState {
    /// Creates an empty world. No level exists until [`WorldState::reset`] runs.
    pub fn new(config: GenerationConfig) -> BurrowResult<Self> {
        config.validate()?;
        let grid = Grid::new(config.width, config.height);
        let rng = config.create_rng();

        Ok(Self {
            config,
            grid,
            level: None,
            depth: 0,
            rng,
            pursuit: Pursuit::new(),
        })
    }

    /// Starts over from the first floor.
    pub fn reset(&mut self) -> BurrowResult<&Level> {
        self.depth = 0;
        self.regenerate_dungeon()
    }

    /// Moves one floor down and builds it.
    pub fn descend(&mut self) -> BurrowResult<&Level> {
        self.depth += 1;
        info!("Descending to depth {}", self.depth);
        self.regenerate_dungeon()
    }

    /// Replaces the current level with a fresh one for the current depth.
    pub fn regenerate_dungeon(&mut self) -> BurrowResult<&Level> {
        self.level = None;
        self.pursuit.clear();

        let mut master = Master::new(self.config.clone(), Grid::reset);
        let level = master.generate(&mut self.grid, &mut self.rng, self.depth)?;
        Ok(&*self.level.insert(level))
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    fn current_level(&self) -> BurrowResult<&Level> {
        self.level
            .as_ref()
            .ok_or_else(|| BurrowError::InvalidState("no level has been generated".to_string()))
    }

    /// Reveals tiles around the player.
    ///
    /// Entering a room for the first time uncovers the whole room, walls
    /// included. Anywhere else only the four orthogonal neighbours are
    /// uncovered.
    pub fn update_fog_of_war(&mut self, player: Position) -> BurrowResult<()> {
        let level = self.current_level()?;

        let unexplored_room = level
            .rooms
            .iter()
            .find(|room| room.contains_walled(player))
            .filter(|room| {
                let first = Position::new(*room.interior_xs().start(), *room.interior_ys().start());
                self.grid.get_tile(first).map_or(false, |tile| !tile.explored)
            })
            .copied();

        match unexplored_room {
            Some(room) => {
                for pos in room.interior_positions() {
                    self.grid.reveal(pos);
                }
                for pos in room.wall_ring_positions() {
                    self.grid.reveal(pos);
                }
            }
            None => {
                for pos in player.cardinal_adjacent_positions() {
                    self.grid.reveal(pos);
                }
            }
        }

        Ok(())
    }

    /// Runs one pursuit turn for every monster on the floor.
    pub fn update_monsters(&mut self, player: Position) -> BurrowResult<Vec<MonsterAction>> {
        let level = self
            .level
            .as_mut()
            .ok_or_else(|| BurrowError::InvalidState("no level has been generated".to_string()))?;
        Ok(self.pursuit.tick(&self.grid, &mut level.monsters, player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Monster, MonsterKind, TileType};

    fn world(seed: u64) -> WorldState {
        let mut world = WorldState::new(GenerationConfig::for_testing(seed)).unwrap();
        world.reset().unwrap();
        world
    }

    #[test]
    fn test_world_state_creation() {
        let world = WorldState::new(GenerationConfig::for_testing(1)).unwrap();
        assert!(world.level().is_none());
        assert_eq!(world.depth, 0);
        assert_eq!(world.grid.width, 48);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GenerationConfig {
            width: 4,
            ..GenerationConfig::new(1)
        };
        assert!(matches!(WorldState::new(config), Err(BurrowError::InvalidConfig(_))));
    }

    #[test]
    fn test_descend_and_reset() {
        let mut world = world(5);
        assert_eq!(world.level().map(|l| l.depth), Some(0));

        assert_eq!(world.descend().unwrap().depth, 1);
        assert_eq!(world.descend().unwrap().depth, 2);
        assert_eq!(world.depth, 2);

        assert_eq!(world.reset().unwrap().depth, 0);
        assert_eq!(world.depth, 0);
    }

    #[test]
    fn test_regenerate_clears_fog() {
        let mut world = world(6);
        let spawn = world.level().unwrap().player_spawn;
        world.update_fog_of_war(spawn).unwrap();
        assert!(world.grid.iter().any(|(_, tile)| tile.explored));

        world.regenerate_dungeon().unwrap();
        assert!(world.grid.iter().all(|(_, tile)| !tile.explored));
    }

    #[test]
    fn test_entering_room_reveals_it() {
        let mut world = world(7);
        let level = world.level().unwrap().clone();
        let room = level.rooms[level.spawn_room];

        world.update_fog_of_war(level.player_spawn).unwrap();

        for pos in room.interior_positions().into_iter().chain(room.wall_ring_positions()) {
            assert!(world.grid.get_tile(pos).unwrap().explored, "{:?}", pos);
        }
        assert!(!world.grid.get_tile(Position::new(room.x1, room.y1)).unwrap().explored);
    }

    #[test]
    fn test_corridor_reveals_neighbours() {
        let mut world = world(8);
        let corridor = world
            .grid
            .iter()
            .find(|(pos, tile)| {
                tile.tile_type == TileType::Path
                    && world.level().unwrap().rooms.iter().all(|r| !r.contains_walled(*pos))
            })
            .map(|(pos, _)| pos)
            .unwrap();

        world.update_fog_of_war(corridor).unwrap();

        let explored: Vec<Position> = world
            .grid
            .iter()
            .filter(|(_, tile)| tile.explored)
            .map(|(pos, _)| pos)
            .collect();
        assert!(!explored.is_empty());
        assert!(explored.len() <= 4);
        assert!(explored.iter().all(|pos| pos.manhattan_distance(corridor) == 1));
    }

    #[test]
    fn test_update_monsters_requires_level() {
        let mut world = WorldState::new(GenerationConfig::for_testing(1)).unwrap();
        assert!(matches!(
            world.update_monsters(Position::new(0, 0)),
            Err(BurrowError::InvalidState(_))
        ));
        assert!(world.update_fog_of_war(Position::new(0, 0)).is_err());
    }

    #[test]
    fn test_update_monsters_reports_every_monster() {
        let mut world = world(9);
        let player = world.level().unwrap().player_spawn;
        let actions = world.update_monsters(player).unwrap();
        assert_eq!(actions.len(), world.level().unwrap().monsters.len());
    }

    #[test]
    fn test_monster_next_to_player_attacks() {
        let mut world = world(10);
        let level = world.level().unwrap().clone();
        let player = level.player_spawn;
        let room = level.rooms[level.spawn_room];
        let beside = player
            .cardinal_adjacent_positions()
            .into_iter()
            .find(|pos| room.contains_interior(*pos))
            .unwrap();

        let id = level.monsters.first().map(|m| m.id).unwrap_or_default();
        if let Some(current) = world.level.as_mut() {
            current.monsters = vec![Monster {
                id,
                kind: MonsterKind::Emu,
                position: beside,
            }];
        }

        let actions = world.update_monsters(player).unwrap();
        assert_eq!(actions, vec![MonsterAction::Attack { id, target: player }]);
        assert_eq!(world.level().unwrap().monsters[0].position, beside);
    }
}
