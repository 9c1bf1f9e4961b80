//! Puzzle field: grid + pipeline. Entry point for taps and item activations.

use crate::grid::{Coord, Grid, Variant};
use crate::items::{PowerItem, Strike, Target};
use crate::pipeline::{Cycle, Phase, PhaseTiming, Pipeline, Step, TransitionError, Trigger};
use crate::search::{connected_group, is_destroyable};
use rand::Rng;
use std::time::Duration;

/// A finished cycle: reported once, after refill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub trigger: Trigger,
    pub destroyed: usize,
    pub cells: Vec<Coord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// A cycle is in flight; the tap was not evaluated.
    Busy,
    /// Empty or out-of-range cell.
    Nothing,
    /// Group smaller than two.
    TooSmall,
    /// Cycle started for this many tiles.
    Started(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// A cycle is in flight; the item was not used.
    Busy,
    /// The item found nothing to destroy. Reported as a zero-count cycle.
    Fizzled(CycleReport),
    /// Cycle started.
    Started { count: usize, target: Target },
}

#[derive(Debug, Clone)]
pub struct PuzzleField {
    grid: Grid,
    variant: Variant,
    pipeline: Pipeline,
}

impl PuzzleField {
    pub fn new<R: Rng + ?Sized>(variant: Variant, timing: PhaseTiming, rng: &mut R) -> Self {
        Self::with_grid(Grid::random(variant, rng), variant, timing)
    }

    pub fn with_grid(grid: Grid, variant: Variant, timing: PhaseTiming) -> Self {
        Self {
            grid,
            variant,
            pipeline: Pipeline::new(timing),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn phase(&self) -> Phase {
        self.pipeline.phase()
    }

    pub fn is_busy(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub fn timing(&self) -> &PhaseTiming {
        self.pipeline.timing()
    }

    /// Destroy-set currently being removed, if any.
    pub fn destroying(&self) -> &[Coord] {
        match (self.pipeline.phase(), self.pipeline.cycle()) {
            (Phase::Destroying, Some(cycle)) => cycle.cells.as_slice(),
            _ => &[],
        }
    }

    /// Tap a cell: connectivity search, then start a cycle for groups of two or more.
    pub fn tap(&mut self, at: Coord) -> TapOutcome {
        if self.pipeline.is_busy() {
            log::debug!("tap at {:?} ignored: pipeline {}", at, self.pipeline.phase());
            return TapOutcome::Busy;
        }
        let group = connected_group(&self.grid, at);
        if group.is_empty() {
            return TapOutcome::Nothing;
        }
        if !is_destroyable(&group) {
            return TapOutcome::TooSmall;
        }
        let count = group.len();
        match self.begin(Trigger::Tap, group) {
            Ok(()) => TapOutcome::Started(count),
            Err(_) => TapOutcome::Busy,
        }
    }

    /// Run a power-item. Empty results complete at once with a zero count.
    pub fn activate_item<R: Rng + ?Sized>(&mut self, item: PowerItem, rng: &mut R) -> ItemOutcome {
        if self.pipeline.is_busy() {
            log::debug!("{} ignored: pipeline {}", item, self.pipeline.phase());
            return ItemOutcome::Busy;
        }
        let Strike { cells, target } = item.resolve(&self.grid, rng);
        log::info!("{} targeted {:?}, {} tiles", item, target, cells.len());
        if cells.is_empty() {
            log::warn!("{} found nothing to destroy", item);
            return ItemOutcome::Fizzled(CycleReport {
                trigger: Trigger::Item(item),
                destroyed: 0,
                cells,
            });
        }
        let count = cells.len();
        match self.begin(Trigger::Item(item), cells) {
            Ok(()) => ItemOutcome::Started { count, target },
            Err(_) => ItemOutcome::Busy,
        }
    }

    /// Activate by token (`bomb`, `lightning`, `rainbow`). Unknown tokens are
    /// logged and ignored.
    pub fn activate_named<R: Rng + ?Sized>(&mut self, token: &str, rng: &mut R) -> Option<ItemOutcome> {
        match token.parse::<PowerItem>() {
            Ok(item) => Some(self.activate_item(item, rng)),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    /// Drive the pipeline by `dt`. Several phases may complete in one call.
    /// Returns the report when a cycle finishes.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: Duration, rng: &mut R) -> Option<CycleReport> {
        let mut budget = dt;
        while let Some(left) = self.pipeline.elapse(budget) {
            budget = left;
            let step = match self.pipeline.phase() {
                Phase::Destroying => {
                    self.remove_destroy_set();
                    self.grid.apply_gravity();
                    Step::RemovalDone
                }
                Phase::Gravity => {
                    self.grid.refill(self.variant, rng);
                    Step::CompactionDone
                }
                Phase::Refilling => Step::RefillDone,
                Phase::Idle => break,
            };
            if let Err(e) = self.pipeline.transition(step) {
                log::error!("pipeline stalled: {}", e);
                return None;
            }
            if let Some(cycle) = self.pipeline.take_finished() {
                return Some(CycleReport {
                    trigger: cycle.trigger,
                    destroyed: cycle.cells.len(),
                    cells: cycle.cells,
                });
            }
        }
        None
    }

    fn begin(&mut self, trigger: Trigger, cells: Vec<Coord>) -> Result<(), TransitionError> {
        self.pipeline
            .transition(Step::Begin(Cycle { trigger, cells }))
            .map(|_| ())
    }

    fn remove_destroy_set(&mut self) {
        let Some(cycle) = self.pipeline.cycle() else {
            return;
        };
        for &at in &cycle.cells {
            if !self.grid.clear(at) {
                log::warn!("destroy-set cell {:?} was already empty", at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{COLS, Cell, ROWS, Tile};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Column 0 holds four 0s at the bottom; the rest is a checkerboard of 1/2.
    fn field() -> PuzzleField {
        let mut grid = Grid::empty();
        for at in Grid::coords() {
            let t = if at.col == 0 && at.row >= 4 {
                0
            } else {
                1 + ((at.row + at.col) % 2) as u8
            };
            grid.set(at, Cell::Emoji(Tile(t)));
        }
        PuzzleField::with_grid(grid, Variant::A, PhaseTiming::default())
    }

    #[test]
    fn tap_runs_full_cycle_and_reports_once() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut f = field();
        assert_eq!(f.tap(Coord::new(6, 0)), TapOutcome::Started(4));
        assert_eq!(f.phase(), Phase::Destroying);
        assert_eq!(f.destroying().len(), 4);

        // 400 + 3*50 + 50 = 600ms destroy window, then 200ms fall.
        assert_eq!(f.advance(Duration::from_millis(599), &mut rng), None);
        assert_eq!(f.advance(Duration::from_millis(1), &mut rng), None);
        assert_eq!(f.phase(), Phase::Gravity);
        assert_eq!(f.grid().empty_count(), 4);
        assert!(f.grid().column(0)[..4].iter().all(|c| c.is_empty()));

        let report = f.advance(Duration::from_millis(200), &mut rng).unwrap();
        assert_eq!(report.destroyed, 4);
        assert_eq!(report.trigger, Trigger::Tap);
        assert!(f.grid().is_full());
        assert!(!f.is_busy());
        assert_eq!(f.advance(Duration::from_secs(5), &mut rng), None);
    }

    #[test]
    fn second_tap_mid_cycle_is_ignored() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut f = field();
        f.tap(Coord::new(7, 0));
        let before = f.grid().clone();
        assert_eq!(f.tap(Coord::new(0, 1)), TapOutcome::Busy);
        assert_eq!(f.grid(), &before);
        let report = f.advance(Duration::from_secs(2), &mut rng).unwrap();
        assert_eq!(report.destroyed, 4);
    }

    #[test]
    fn singles_and_empty_cells_do_not_start() {
        let mut f = field();
        assert_eq!(f.tap(Coord::new(0, 3)), TapOutcome::TooSmall);
        assert_eq!(f.tap(Coord::new(ROWS, COLS)), TapOutcome::Nothing);
        assert!(!f.is_busy());
    }

    #[test]
    fn instant_timing_finishes_on_next_advance() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut f = field();
        f.pipeline = Pipeline::new(PhaseTiming::INSTANT);
        f.tap(Coord::new(4, 0));
        let report = f.advance(Duration::ZERO, &mut rng).unwrap();
        assert_eq!(report.destroyed, 4);
        assert!(f.grid().is_full());
    }

    #[test]
    fn item_runs_through_pipeline() {
        let mut rng = SmallRng::seed_from_u64(21);
        let mut f = field();
        let outcome = f.activate_item(PowerItem::Lightning, &mut rng);
        let ItemOutcome::Started { count, target: Target::Columns(cols) } = outcome else {
            panic!("lightning should start a cycle, got {:?}", outcome);
        };
        assert_eq!(count, ROWS * 3);
        assert_eq!(cols.len(), 3);
        assert_eq!(f.activate_item(PowerItem::Bomb, &mut rng), ItemOutcome::Busy);
        assert_eq!(f.tap(Coord::new(7, 0)), TapOutcome::Busy);
        let report = f.advance(Duration::from_secs(10), &mut rng).unwrap();
        assert_eq!(report.destroyed, ROWS * 3);
        assert_eq!(report.trigger, Trigger::Item(PowerItem::Lightning));
        assert!(f.grid().is_full());
    }

    #[test]
    fn item_on_empty_grid_fizzles() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut f = PuzzleField::with_grid(Grid::empty(), Variant::B, PhaseTiming::default());
        let ItemOutcome::Fizzled(report) = f.activate_item(PowerItem::Rainbow, &mut rng) else {
            panic!("rainbow on an empty grid should fizzle");
        };
        assert_eq!(report.destroyed, 0);
        assert!(!f.is_busy());
    }

    #[test]
    fn unknown_token_is_ignored() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut f = field();
        assert_eq!(f.activate_named("teleport", &mut rng), None);
        assert!(!f.is_busy());
        assert!(matches!(
            f.activate_named("Bomb", &mut rng),
            Some(ItemOutcome::Started { .. })
        ));
    }

    #[test]
    fn random_cycles_always_leave_a_full_grid() {
        let mut rng = SmallRng::seed_from_u64(1234);
        let mut f = PuzzleField::new(Variant::B, PhaseTiming::default(), &mut rng);
        for i in 0..200 {
            let at = Coord::new(i % ROWS, (i * 7) % COLS);
            if i % 10 == 0 {
                f.activate_item(PowerItem::random(&mut rng), &mut rng);
            } else {
                f.tap(at);
            }
            f.advance(Duration::from_secs(5), &mut rng);
            assert!(f.grid().is_full());
            assert!(!f.is_busy());
        }
    }
}
