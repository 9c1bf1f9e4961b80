//! emoji-smash: a 6×8 emoji tile-matching game core.
//!
//! Tap a group of two or more same-emoji tiles to destroy it. Survivors fall,
//! new tiles drop in from the top, and a streak of good taps builds a combo.
//! Long streaks earn power items (bomb, lightning, rainbow).
//!
//! The [`round::Round`] controller ties the pieces together; the binary in
//! this package is a terminal frontend on top of it.

pub mod combo;
pub mod field;
pub mod grid;
pub mod items;
pub mod pipeline;
pub mod round;
pub mod scoring;
pub mod search;
pub mod session;

pub use combo::{ComboEvent, ComboMeter, ComboTier};
pub use field::{CycleReport, ItemOutcome, PuzzleField, TapOutcome};
pub use grid::{COLS, Cell, Coord, FieldLayout, Grid, ROWS, Tile, Variant};
pub use items::PowerItem;
pub use pipeline::{Phase, PhaseTiming, Trigger};
pub use round::{Round, RoundConfig, RoundEvent, RoundResults, TrayItem};
pub use scoring::Rank;
pub use session::{FileStore, MemoryStore, RecordStore, Session};
