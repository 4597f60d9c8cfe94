//! # Master
//!
//! Runs the generation stages in order and retries the whole level when a
//! stage reports a recoverable failure.

use crate::{
    Architect, BurrowError, BurrowResult, Frame, GenerationConfig, Generator, Grid, ItemPlacer,
    Level, MonsterPlacer,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;

/// Level generation orchestrator.
///
/// `reset_tiles` is called to wipe the grid before every attempt, so the owner
/// decides what a clean grid looks like.
pub struct Master<F>
where
    F: FnMut(&mut Grid),
{
    config: GenerationConfig,
    reset_tiles: F,
}

impl<F> Master<F>
where
    F: FnMut(&mut Grid),
{
    pub fn new(config: GenerationConfig, reset_tiles: F) -> Self {
        Self {
            config,
            reset_tiles,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generates a complete level for floor `depth`.
    ///
    /// The configuration is checked before the first attempt. Each attempt
    /// starts from a freshly reset grid. Broken layouts and unreachable stairs
    /// trigger another attempt, up to `max_attempts`; any other error is
    /// returned immediately.
    pub fn generate(&mut self, grid: &mut Grid, rng: &mut StdRng, depth: u32) -> BurrowResult<Level> {
        self.config.validate()?;
        if grid.width != self.config.width || grid.height != self.config.height {
            return Err(BurrowError::InvalidConfig(format!(
                "grid is {}x{} but the configuration expects {}x{}",
                grid.width, grid.height, self.config.width, self.config.height
            )));
        }

        let max_attempts = self.config.max_attempts;
        for attempt in 1..=max_attempts {
            (self.reset_tiles)(grid);
            match self.attempt(grid, rng, depth) {
                Ok(mut level) => {
                    level.attempts = attempt;
                    info!(
                        "Generated depth {} with {} rooms, {} pickups and {} monsters after {} attempt(s)",
                        depth,
                        level.rooms.len(),
                        level.pickups.len(),
                        level.monsters.len(),
                        attempt
                    );
                    return Ok(level);
                }
                Err(err) if err.is_recoverable() => {
                    debug!("Attempt {} for depth {} failed: {}", attempt, depth, err);
                }
                Err(err) => return Err(err),
            }
        }

        warn!(
            "Giving up on depth {} after {} failed attempt(s)",
            depth, max_attempts
        );
        Err(BurrowError::RetryLimitExceeded(max_attempts))
    }

    fn attempt(&self, grid: &mut Grid, rng: &mut StdRng, depth: u32) -> BurrowResult<Level> {
        let architect = Architect::new(&self.config);
        let blueprint = architect.generate(grid, rng)?;
        architect.validate(&blueprint, grid)?;

        Frame::post_proc_tiles(grid, &blueprint.rooms)?;
        Frame::validate_connectivity(grid, &blueprint.rooms)?;

        let items = ItemPlacer::new(&self.config, &blueprint.rooms);
        let placement = items.generate(grid, rng)?;
        items.validate(&placement, grid)?;

        let encounters = MonsterPlacer::new(&self.config, &blueprint.rooms, &placement, depth);
        let monsters = encounters.generate(grid, rng)?;
        encounters.validate(&monsters, grid)?;

        Ok(Level {
            depth,
            rooms: blueprint.rooms,
            corridors: blueprint.corridors,
            player_spawn: placement.player_spawn,
            spawn_room: placement.spawn_room,
            stairs: placement.stairs,
            stairs_room: placement.stairs_room,
            pickups: placement.pickups,
            monsters,
            attempts: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{find_path, TileType};

    #[test]
    fn test_generate_level() {
        let config = GenerationConfig::for_testing(17);
        let mut grid = Grid::new(config.width, config.height);
        let mut rng = config.create_rng();
        let mut master = Master::new(config.clone(), Grid::reset);

        let level = master.generate(&mut grid, &mut rng, 0).unwrap();

        assert!(level.attempts >= 1);
        assert!(level.rooms.len() > config.min_rooms);
        assert!(level.rooms.len() <= config.max_rooms);
        assert_ne!(level.spawn_room, level.stairs_room);
        assert_eq!(grid.tile_type(level.player_spawn), Some(TileType::Floor));
        assert!(!find_path(&grid, level.player_spawn, level.stairs).is_empty());
        assert_eq!(level.pickups.len(), level.rooms.len() - 2);
    }

    #[test]
    fn test_reset_called_once_per_attempt() {
        let config = GenerationConfig::new(23);
        let mut grid = Grid::new(config.width, config.height);
        let mut rng = config.create_rng();
        let mut resets = 0;

        let level = {
            let mut master = Master::new(config, |grid: &mut Grid| {
                resets += 1;
                grid.reset();
            });
            master.generate(&mut grid, &mut rng, 2).unwrap()
        };

        assert_eq!(resets, level.attempts);
    }

    #[test]
    fn test_reused_grid_matches_fresh_grid() {
        for seed in 0..10 {
            let config = GenerationConfig::for_testing(seed);
            let mut master = Master::new(config.clone(), Grid::reset);

            let mut reused = Grid::new(config.width, config.height);
            let mut rng = config.create_rng();
            let first = master.generate(&mut reused, &mut rng, 0).unwrap();
            for pos in first.rooms[first.spawn_room].interior_positions() {
                reused.reveal(pos);
            }

            let mut fresh = Grid::new(config.width, config.height);
            let mut fresh_rng = rng.clone();
            let second = master.generate(&mut reused, &mut rng, 1).unwrap();
            let expected = master.generate(&mut fresh, &mut fresh_rng, 1).unwrap();

            assert_eq!(second, expected);
            assert_eq!(reused, fresh, "seed {} left stale tiles", seed);
        }
    }

    #[test]
    fn test_single_attempt_resets_once() {
        let config = GenerationConfig {
            max_attempts: 1,
            ..GenerationConfig::for_testing(3)
        };
        let mut grid = Grid::new(config.width, config.height);
        let mut rng = config.create_rng();
        let mut resets = 0;

        let result = {
            let mut master = Master::new(config, |grid: &mut Grid| {
                resets += 1;
                grid.reset();
            });
            master.generate(&mut grid, &mut rng, 0)
        };

        assert_eq!(resets, 1);
        match result {
            Ok(level) => assert_eq!(level.attempts, 1),
            Err(err) => assert!(matches!(err, BurrowError::RetryLimitExceeded(1))),
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = GenerationConfig {
            max_rooms: 2,
            ..GenerationConfig::new(1)
        };
        let mut grid = Grid::new(config.width, config.height);
        let mut rng = config.create_rng();
        let mut resets = 0;
        let result = {
            let mut master = Master::new(config, |_: &mut Grid| resets += 1);
            master.generate(&mut grid, &mut rng, 0)
        };

        assert!(matches!(result, Err(BurrowError::InvalidConfig(_))));
        assert_eq!(resets, 0);
        assert_eq!(grid, Grid::new(grid.width, grid.height));
    }

    #[test]
    fn test_grid_size_must_match_config() {
        let config = GenerationConfig::new(1);
        let mut grid = Grid::new(10, 10);
        let mut rng = config.create_rng();
        let mut master = Master::new(config, Grid::reset);

        assert!(matches!(
            master.generate(&mut grid, &mut rng, 0),
            Err(BurrowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_single_attempt_budget() {
        for seed in 0..20 {
            let config = GenerationConfig {
                max_attempts: 1,
                ..GenerationConfig::for_testing(seed)
            };
            let mut grid = Grid::new(config.width, config.height);
            let mut rng = config.create_rng();
            let mut master = Master::new(config, Grid::reset);

            match master.generate(&mut grid, &mut rng, 0) {
                Ok(level) => assert_eq!(level.attempts, 1),
                Err(err) => assert!(matches!(err, BurrowError::RetryLimitExceeded(1))),
            }
        }
    }

    #[test]
    fn test_same_seed_same_level() {
        let config = GenerationConfig::for_testing(99);
        let run = || {
            let mut grid = Grid::new(config.width, config.height);
            let mut rng = config.create_rng();
            let level = Master::new(config.clone(), Grid::reset)
                .generate(&mut grid, &mut rng, 1)
                .unwrap();
            (level, grid)
        };

        assert_eq!(run(), run());
    }
}
