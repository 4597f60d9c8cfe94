//! # Utilities Module
//!
//! Grid geometry helpers and the A* pathfinder.

pub mod math;
pub mod pathfinding;

pub use self::math::*;
pub use self::pathfinding::*;
