//! Power-items: bomb, lightning, rainbow. Each picks its own destroy-set.

use crate::grid::{COLS, Coord, Grid, ROWS, Tile};
use rand::Rng;
use rand::seq::index;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Columns cleared by one lightning strike.
pub const LIGHTNING_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerItem {
    Bomb,
    Lightning,
    Rainbow,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("unknown item type: {0:?}")]
    Unknown(String),
}

impl PowerItem {
    pub const ALL: [Self; 3] = [Self::Bomb, Self::Lightning, Self::Rainbow];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Bomb => "💣",
            Self::Lightning => "⚡",
            Self::Rainbow => "🌈",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bomb => "bomb",
            Self::Lightning => "lightning",
            Self::Rainbow => "rainbow",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Bomb => "destroys a random 3x3 area",
            Self::Lightning => "clears 3 random columns",
            Self::Rainbow => "clears the most common emoji",
        }
    }

    /// Pick this item's random targets and compute its destroy-set.
    pub fn resolve<R: Rng + ?Sized>(self, grid: &Grid, rng: &mut R) -> Strike {
        match self {
            Self::Bomb => {
                let anchor = Coord::new(rng.gen_range(0..ROWS), rng.gen_range(0..COLS));
                Strike {
                    cells: bomb_cells(grid, anchor),
                    target: Target::Area(anchor),
                }
            }
            Self::Lightning => {
                let columns: Vec<usize> = index::sample(rng, COLS, LIGHTNING_COLUMNS).into_vec();
                Strike {
                    cells: lightning_cells(grid, &columns),
                    target: Target::Columns(columns),
                }
            }
            Self::Rainbow => match rainbow_cells(grid) {
                Some((tile, cells)) => Strike {
                    cells,
                    target: Target::Tile(tile),
                },
                None => Strike {
                    cells: Vec::new(),
                    target: Target::Nothing,
                },
            },
        }
    }
}

impl fmt::Display for PowerItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PowerItem {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bomb" => Ok(Self::Bomb),
            "lightning" => Ok(Self::Lightning),
            "rainbow" => Ok(Self::Rainbow),
            _ => Err(ItemError::Unknown(s.to_string())),
        }
    }
}

/// What an item aimed at, for presentation and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Area(Coord),
    Columns(Vec<usize>),
    Tile(Tile),
    Nothing,
}

/// Resolved item: the destroy-set and what was targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strike {
    pub cells: Vec<Coord>,
    pub target: Target,
}

/// Occupied cells within Chebyshev distance 1 of `anchor`, clipped to the grid.
/// The anchor itself need not be occupied.
pub fn bomb_cells(grid: &Grid, anchor: Coord) -> Vec<Coord> {
    let rows = anchor.row.saturating_sub(1)..=(anchor.row + 1).min(ROWS - 1);
    rows.flat_map(|row| {
        let cols = anchor.col.saturating_sub(1)..=(anchor.col + 1).min(COLS - 1);
        cols.map(move |col| Coord::new(row, col))
    })
    .filter(|&at| grid.tile_at(at).is_some())
    .collect()
}

/// Occupied cells in `columns`, top to bottom, in the given column order.
pub fn lightning_cells(grid: &Grid, columns: &[usize]) -> Vec<Coord> {
    columns
        .iter()
        .filter(|&&col| col < COLS)
        .flat_map(|&col| (0..ROWS).map(move |row| Coord::new(row, col)))
        .filter(|&at| grid.tile_at(at).is_some())
        .collect()
}

/// Largest same-tile population on the whole grid. Ties go to the tile seen
/// first in row-major scan order. `None` on an empty grid.
pub fn rainbow_cells(grid: &Grid) -> Option<(Tile, Vec<Coord>)> {
    let mut groups: Vec<(Tile, Vec<Coord>)> = Vec::new();
    for (at, tile) in grid.occupied() {
        match groups.iter_mut().find(|(t, _)| *t == tile) {
            Some((_, cells)) => cells.push(at),
            None => groups.push((tile, vec![at])),
        }
    }

    let mut best: Option<(Tile, Vec<Coord>)> = None;
    for (tile, cells) in groups {
        if best.as_ref().is_none_or(|(_, b)| cells.len() > b.len()) {
            best = Some((tile, cells));
        }
    }
    best
}
