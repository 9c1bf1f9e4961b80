//! Connectivity search: same-tile groups over 4-way adjacency.

use crate::grid::{Coord, Grid};
use std::collections::{HashSet, VecDeque};

/// Smallest group a tap may destroy.
pub const MIN_GROUP: usize = 2;

/// Breadth-first walk from `start` over cells holding the same tile.
/// Includes `start` itself, so an isolated tile yields a single coordinate.
/// Empty or out-of-range start returns an empty group.
pub fn connected_group(grid: &Grid, start: Coord) -> Vec<Coord> {
    let Some(tile) = grid.tile_at(start) else {
        return Vec::new();
    };

    let mut group = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(at) = queue.pop_front() {
        group.push(at);
        for next in at.neighbours() {
            if grid.tile_at(next) == Some(tile) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    group
}

/// True if `group` is large enough for a tap to destroy it.
#[inline]
pub fn is_destroyable(group: &[Coord]) -> bool {
    group.len() >= MIN_GROUP
}
