//! Destroy → gravity → refill cycle as an explicit state machine.
//!
//! The pipeline never touches the grid itself. It owns the phase, the
//! in-flight destroy-set and the animation window of the current phase; the
//! field performs each phase's grid work when [`Pipeline::elapse`] reports
//! that a window has closed, then calls [`Pipeline::transition`].

use crate::grid::Coord;
use crate::items::PowerItem;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Destroying,
    Gravity,
    Refilling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Destroying => "destroying",
            Self::Gravity => "gravity",
            Self::Refilling => "refilling",
        })
    }
}

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Tap,
    Item(PowerItem),
}

/// One in-flight cycle: its trigger and destroy-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub trigger: Trigger,
    pub cells: Vec<Coord>,
}

/// Inputs to [`Pipeline::transition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Begin(Cycle),
    RemovalDone,
    CompactionDone,
    RefillDone,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::Begin(_) => "begin",
            Self::RemovalDone => "removal-done",
            Self::CompactionDone => "compaction-done",
            Self::RefillDone => "refill-done",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a cycle is already in flight ({0})")]
    Busy(Phase),
    #[error("step {step} is not valid while {from}")]
    Invalid { from: Phase, step: &'static str },
}

/// Animation windows between phases, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Pop animation of a single tile.
    pub pop_ms: u64,
    /// Extra delay per tile after the first, for the wave effect.
    pub stagger_ms: u64,
    /// Pause after the last tile pops.
    pub settle_ms: u64,
    /// Fall window after a tap.
    pub tap_fall_ms: u64,
    /// Fall window after an item.
    pub item_fall_ms: u64,
    /// Window after refill before the lock is released.
    pub refill_ms: u64,
}

impl Default for PhaseTiming {
    fn default() -> Self {
        Self {
            pop_ms: 400,
            stagger_ms: 50,
            settle_ms: 50,
            tap_fall_ms: 200,
            item_fall_ms: 350,
            refill_ms: 0,
        }
    }
}

impl PhaseTiming {
    /// Every window zero: a cycle finishes on the next advance.
    pub const INSTANT: Self = Self {
        pop_ms: 0,
        stagger_ms: 0,
        settle_ms: 0,
        tap_fall_ms: 0,
        item_fall_ms: 0,
        refill_ms: 0,
    };

    /// Destroying window for `tiles` tiles.
    pub fn destroy_window(&self, tiles: usize) -> Duration {
        let stagger = self.stagger_ms * tiles.saturating_sub(1) as u64;
        Duration::from_millis(self.pop_ms + stagger + self.settle_ms)
    }

    /// When the `index`-th tile of the destroy-set starts popping.
    pub fn pop_offset(&self, index: usize) -> Duration {
        Duration::from_millis(self.stagger_ms * index as u64)
    }

    pub fn fall_window(&self, trigger: Trigger) -> Duration {
        Duration::from_millis(match trigger {
            Trigger::Tap => self.tap_fall_ms,
            Trigger::Item(_) => self.item_fall_ms,
        })
    }

    pub fn refill_window(&self) -> Duration {
        Duration::from_millis(self.refill_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    phase: Phase,
    cycle: Option<Cycle>,
    remaining: Duration,
    timing: PhaseTiming,
}

impl Pipeline {
    pub fn new(timing: PhaseTiming) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Processing lock: held from `Begin` until `RefillDone`.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn cycle(&self) -> Option<&Cycle> {
        self.cycle.as_ref()
    }

    pub fn timing(&self) -> &PhaseTiming {
        &self.timing
    }

    /// Time left in the current phase's window.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Single authority for phase changes. Returns the new phase; after
    /// `RefillDone` the finished cycle is available from [`Self::take_finished`].
    pub fn transition(&mut self, step: Step) -> Result<Phase, TransitionError> {
        let next = match (self.phase, step) {
            (Phase::Idle, Step::Begin(cycle)) => {
                self.remaining = self.timing.destroy_window(cycle.cells.len());
                self.cycle = Some(cycle);
                Phase::Destroying
            }
            (busy, Step::Begin(_)) => return Err(TransitionError::Busy(busy)),
            (Phase::Destroying, Step::RemovalDone) => {
                let trigger = self.cycle.as_ref().map_or(Trigger::Tap, |c| c.trigger);
                self.remaining = self.timing.fall_window(trigger);
                Phase::Gravity
            }
            (Phase::Gravity, Step::CompactionDone) => {
                self.remaining = self.timing.refill_window();
                Phase::Refilling
            }
            (Phase::Refilling, Step::RefillDone) => {
                self.remaining = Duration::ZERO;
                Phase::Idle
            }
            (from, step) => {
                return Err(TransitionError::Invalid {
                    from,
                    step: step.name(),
                });
            }
        };
        log::debug!("pipeline {} -> {}", self.phase, next);
        self.phase = next;
        Ok(next)
    }

    /// Hand back the finished cycle once the pipeline is idle again.
    pub fn take_finished(&mut self) -> Option<Cycle> {
        if self.phase == Phase::Idle {
            self.cycle.take()
        } else {
            None
        }
    }

    /// Spend up to `dt` of the current window. Returns the unspent remainder
    /// once the window has closed, `None` while it is still open or when idle.
    pub fn elapse(&mut self, dt: Duration) -> Option<Duration> {
        if !self.is_busy() {
            return None;
        }
        if dt < self.remaining {
            self.remaining -= dt;
            return None;
        }
        let left = dt - self.remaining;
        self.remaining = Duration::ZERO;
        Some(left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tap_cycle(n: usize) -> Cycle {
        Cycle {
            trigger: Trigger::Tap,
            cells: (0..n).map(|i| Coord::new(0, i)).collect(),
        }
    }

    #[test]
    fn walks_all_phases_in_order() {
        let mut p = Pipeline::new(PhaseTiming::default());
        assert_eq!(p.transition(Step::Begin(tap_cycle(2))), Ok(Phase::Destroying));
        assert!(p.is_busy());
        assert_eq!(p.transition(Step::RemovalDone), Ok(Phase::Gravity));
        assert_eq!(p.transition(Step::CompactionDone), Ok(Phase::Refilling));
        assert_eq!(p.transition(Step::RefillDone), Ok(Phase::Idle));
        assert!(!p.is_busy());
        assert_eq!(p.take_finished(), Some(tap_cycle(2)));
        assert_eq!(p.take_finished(), None);
    }

    #[test]
    fn begin_while_busy_is_rejected() {
        let mut p = Pipeline::new(PhaseTiming::default());
        p.transition(Step::Begin(tap_cycle(3))).unwrap();
        assert_eq!(
            p.transition(Step::Begin(tap_cycle(2))),
            Err(TransitionError::Busy(Phase::Destroying))
        );
        assert_eq!(p.cycle(), Some(&tap_cycle(3)));
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let mut p = Pipeline::new(PhaseTiming::default());
        assert!(matches!(
            p.transition(Step::RemovalDone),
            Err(TransitionError::Invalid { from: Phase::Idle, .. })
        ));
        p.transition(Step::Begin(tap_cycle(2))).unwrap();
        assert!(p.transition(Step::RefillDone).is_err());
        assert_eq!(p.phase(), Phase::Destroying);
    }

    #[test]
    fn destroy_window_staggers_per_tile() {
        let t = PhaseTiming::default();
        assert_eq!(t.destroy_window(1), Duration::from_millis(450));
        assert_eq!(t.destroy_window(4), Duration::from_millis(600));
        assert_eq!(t.pop_offset(3), Duration::from_millis(150));
    }

    #[test]
    fn item_cycles_fall_longer() {
        let mut p = Pipeline::new(PhaseTiming::default());
        p.transition(Step::Begin(Cycle {
            trigger: Trigger::Item(PowerItem::Bomb),
            cells: vec![Coord::new(0, 0)],
        }))
        .unwrap();
        p.transition(Step::RemovalDone).unwrap();
        assert_eq!(p.remaining(), Duration::from_millis(350));
    }

    #[test]
    fn elapse_returns_carry_over() {
        let mut p = Pipeline::new(PhaseTiming::default());
        assert_eq!(p.elapse(Duration::from_secs(1)), None);
        p.transition(Step::Begin(tap_cycle(2))).unwrap();
        assert_eq!(p.elapse(Duration::from_millis(300)), None);
        assert_eq!(p.elapse(Duration::from_millis(300)), Some(Duration::from_millis(100)));
    }
}
