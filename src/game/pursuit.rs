//! # Monster Pursuit
//!
//! Per-monster path memory for chasing the player across the grid.

use crate::config::SENSE_RADIUS;
use crate::{find_path, EntityId, Grid, Monster, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What a monster did during one pursuit tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterAction {
    /// Stepped one tile along its path
    Move {
        id: EntityId,
        from: Position,
        to: Position,
    },
    /// Stands next to the player and strikes
    Attack { id: EntityId, target: Position },
    /// Nothing to do, or the way is blocked
    Idle { id: EntityId },
}

/// Path memory of a single monster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChaseState {
    /// Remaining steps towards the last seen player position
    pub path: Vec<Position>,
    /// Player position the path was computed for
    pub last_seen: Option<Position>,
}

/// Pursuit memory for every monster on the current floor.
#[derive(Debug, Clone, Default)]
pub struct Pursuit {
    chases: HashMap<EntityId, ChaseState>,
}

impl Pursuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every path, e.g. when the floor changes.
    pub fn clear(&mut self) {
        self.chases.clear();
    }

    pub fn chase_state(&self, id: EntityId) -> Option<&ChaseState> {
        self.chases.get(&id)
    }

    /// Advances every monster by one turn.
    ///
    /// A monster that senses a player who has moved since its last look
    /// replans with A*. Monsters next to the player (diagonals included)
    /// attack; the rest follow their path unless another monster stands on
    /// the next cell.
    pub fn tick(&mut self, grid: &Grid, monsters: &mut [Monster], player: Position) -> Vec<MonsterAction> {
        let mut actions = Vec::with_capacity(monsters.len());

        for idx in 0..monsters.len() {
            let id = monsters[idx].id;
            let position = monsters[idx].position;
            let chase = self.chases.entry(id).or_default();

            if chase.last_seen != Some(player) && position.euclidean_distance(player) < SENSE_RADIUS {
                chase.path = find_path(grid, position, player);
                chase.last_seen = Some(player);
            }

            if position.chebyshev_distance(player) <= 1 {
                actions.push(MonsterAction::Attack { id, target: player });
                continue;
            }

            let Some(&next) = chase.path.first() else {
                actions.push(MonsterAction::Idle { id });
                continue;
            };

            let blocked = monsters
                .iter()
                .enumerate()
                .any(|(other, monster)| other != idx && monster.position == next);
            if blocked {
                actions.push(MonsterAction::Idle { id });
                continue;
            }

            chase.path.remove(0);
            monsters[idx].position = next;
            actions.push(MonsterAction::Move {
                id,
                from: position,
                to: next,
            });
        }

        actions
    }
}
