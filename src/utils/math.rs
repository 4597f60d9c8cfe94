//! # Grid Mathematics
//!
//! Line rasterisation used by the tunnel carver.

use crate::Position;

/// Rasterises the segment between two cells with Bresenham's algorithm.
///
/// Both endpoints are included, in order from `from` to `to`. Axis-aligned
/// segments come out as a contiguous run of orthogonal steps.
///
/// # Examples
///
/// ```
/// use burrow::{bresenham_line, Position};
///
/// let line = bresenham_line(Position::new(0, 0), Position::new(3, 0));
/// assert_eq!(line.len(), 4);
/// assert_eq!(line[3], Position::new(3, 0));
/// ```
pub fn bresenham_line(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let step_x = if from.x < to.x { 1 } else { -1 };
    let step_y = if from.y < to.y { 1 } else { -1 };

    let mut points = Vec::with_capacity((dx.max(-dy) + 1) as usize);
    let mut current = from;
    let mut error = dx + dy;

    loop {
        points.push(current);
        if current == to {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            current.x += step_x;
        }
        if doubled <= dx {
            error += dx;
            current.y += step_y;
        }
    }

    points
}
