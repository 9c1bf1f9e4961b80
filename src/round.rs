//! Round controller: field, combo, score, countdown and the item tray.
//!
//! Everything the presentation needs to react to is queued as a
//! [`RoundEvent`] and drained with [`Round::drain_events`].

use crate::combo::{ComboEvent, ComboMeter};
use crate::field::{CycleReport, ItemOutcome, PuzzleField, TapOutcome};
use crate::grid::{Coord, FieldLayout, Variant};
use crate::items::PowerItem;
use crate::pipeline::{PhaseTiming, Trigger};
use crate::scoring::{Rank, item_points, tap_points};
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    pub round_secs: u32,
    /// Delay before the countdown starts.
    pub start_delay: Duration,
    /// Streak needed after a tap for an item to be awarded.
    pub item_award_streak: u32,
    pub item_lifetime: Duration,
    pub tray_capacity: usize,
    pub timing: PhaseTiming,
    pub variant: Variant,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_secs: 30,
            start_delay: Duration::from_millis(100),
            item_award_streak: 4,
            item_lifetime: Duration::from_secs(15),
            tray_capacity: 9,
            timing: PhaseTiming::default(),
            variant: Variant::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrayItem {
    pub item: PowerItem,
    pub expires_in: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResults {
    pub score: u32,
    pub longest_combo: u32,
    pub all_time_combo: u32,
    /// All-time record beaten during this round.
    pub new_record: bool,
    pub rank: Rank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Combo(ComboEvent),
    ScoreAdded { points: u32, total: u32 },
    CycleCompleted { trigger: Trigger, destroyed: usize },
    ItemAwarded(PowerItem),
    ItemExpired(PowerItem),
    ItemUsed { item: PowerItem, destroyed: usize },
    TimerTick(u32),
    RoundOver(RoundResults),
}

#[derive(Debug)]
pub struct Round<R: Rng> {
    config: RoundConfig,
    field: PuzzleField,
    combo: ComboMeter,
    rng: R,
    score: u32,
    record_at_start: u32,
    start_delay: Duration,
    time_left: Duration,
    secs_shown: u32,
    tray: Vec<TrayItem>,
    paused: bool,
    results: Option<RoundResults>,
    events: Vec<RoundEvent>,
}

impl<R: Rng> Round<R> {
    /// New round on a random field. `all_time_combo` comes from the session.
    pub fn new(config: RoundConfig, all_time_combo: u32, mut rng: R) -> Self {
        let field = PuzzleField::new(config.variant, config.timing, &mut rng);
        Self::with_field(config, field, all_time_combo, rng)
    }

    pub fn with_field(config: RoundConfig, field: PuzzleField, all_time_combo: u32, rng: R) -> Self {
        let mut round = Self {
            config,
            field,
            combo: ComboMeter::with_record(all_time_combo),
            rng,
            score: 0,
            record_at_start: all_time_combo,
            start_delay: config.start_delay,
            time_left: Duration::from_secs(u64::from(config.round_secs)),
            secs_shown: config.round_secs,
            tray: Vec::new(),
            paused: false,
            results: None,
            events: Vec::new(),
        };
        let events = &mut round.events;
        round
            .combo
            .reset_for_round(|e| events.push(RoundEvent::Combo(e)));
        round.events.push(RoundEvent::TimerTick(config.round_secs));
        log::info!(
            "round started: {}s, variant {:?}, record {}",
            config.round_secs,
            config.variant,
            all_time_combo
        );
        round
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn field(&self) -> &PuzzleField {
        &self.field
    }

    pub fn combo(&self) -> &ComboMeter {
        &self.combo
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn tray(&self) -> &[TrayItem] {
        &self.tray
    }

    pub fn time_left(&self) -> Duration {
        self.time_left
    }

    pub fn is_over(&self) -> bool {
        self.results.is_some()
    }

    pub fn results(&self) -> Option<RoundResults> {
        self.results
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Paused rounds freeze the countdown, item expiry and the pipeline.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn accepts_input(&self) -> bool {
        !self.paused && !self.is_over()
    }

    /// Tap a cell. Ignored (reported as `Busy`) while paused or after the round.
    pub fn tap(&mut self, at: Coord) -> TapOutcome {
        if !self.accepts_input() {
            return TapOutcome::Busy;
        }
        self.field.tap(at)
    }

    /// Tap at a screen position; points outside the board do nothing.
    pub fn tap_at(&mut self, x: u16, y: u16, layout: &FieldLayout) -> TapOutcome {
        match layout.cell_at(x, y) {
            Some(at) => self.tap(at),
            None => TapOutcome::Nothing,
        }
    }

    /// Use the item in tray `slot`. The item leaves the tray only if it ran.
    pub fn use_item(&mut self, slot: usize) -> Option<ItemOutcome> {
        if !self.accepts_input() {
            return None;
        }
        let item = self.tray.get(slot)?.item;
        let outcome = self.field.activate_item(item, &mut self.rng);
        match &outcome {
            ItemOutcome::Busy => {}
            ItemOutcome::Started { .. } => {
                self.tray.remove(slot);
            }
            ItemOutcome::Fizzled(report) => {
                self.tray.remove(slot);
                let report = report.clone();
                self.finish_cycle(report);
            }
        }
        Some(outcome)
    }

    /// Move the clock forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        if self.paused || self.is_over() {
            return;
        }

        if let Some(report) = self.field.advance(dt, &mut self.rng) {
            self.finish_cycle(report);
        }

        self.tick_tray(dt);

        let countdown = if self.start_delay > dt {
            self.start_delay -= dt;
            Duration::ZERO
        } else {
            let spent = dt - self.start_delay;
            self.start_delay = Duration::ZERO;
            spent
        };
        if countdown.is_zero() {
            return;
        }
        self.time_left = self.time_left.saturating_sub(countdown);
        let secs = u32::try_from(self.time_left.as_millis().div_ceil(1000)).unwrap_or(u32::MAX);
        if secs != self.secs_shown {
            self.secs_shown = secs;
            self.events.push(RoundEvent::TimerTick(secs));
        }
        if self.time_left.is_zero() {
            self.end();
        }
    }

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    fn finish_cycle(&mut self, report: CycleReport) {
        let destroyed = report.destroyed;
        let events = &mut self.events;
        let count = i64::try_from(destroyed).unwrap_or(i64::MAX);
        if let Err(e) = self.combo.update(count, |e| events.push(RoundEvent::Combo(e))) {
            log::warn!("combo update skipped: {}", e);
        }
        let streak = self.combo.current();

        let points = match report.trigger {
            Trigger::Tap => tap_points(destroyed, streak),
            Trigger::Item(_) => item_points(destroyed),
        };
        if points > 0 {
            self.score = self.score.saturating_add(points);
            self.events.push(RoundEvent::ScoreAdded {
                points,
                total: self.score,
            });
        }
        self.events.push(RoundEvent::CycleCompleted {
            trigger: report.trigger,
            destroyed,
        });

        match report.trigger {
            Trigger::Item(item) => {
                self.events.push(RoundEvent::ItemUsed { item, destroyed });
            }
            Trigger::Tap if streak >= self.config.item_award_streak => self.award_item(),
            Trigger::Tap => {}
        }
    }

    fn award_item(&mut self) {
        let item = PowerItem::random(&mut self.rng);
        if self.tray.len() >= self.config.tray_capacity {
            log::debug!("tray full, {} dropped", item);
            return;
        }
        log::info!("item awarded: {}", item);
        self.tray.push(TrayItem {
            item,
            expires_in: self.config.item_lifetime,
        });
        self.events.push(RoundEvent::ItemAwarded(item));
    }

    fn tick_tray(&mut self, dt: Duration) {
        let events = &mut self.events;
        self.tray.retain_mut(|t| {
            t.expires_in = t.expires_in.saturating_sub(dt);
            if t.expires_in.is_zero() {
                events.push(RoundEvent::ItemExpired(t.item));
                false
            } else {
                true
            }
        });
    }

    fn end(&mut self) {
        let results = RoundResults {
            score: self.score,
            longest_combo: self.combo.longest(),
            all_time_combo: self.combo.all_time(),
            new_record: self.combo.all_time() > self.record_at_start,
            rank: Rank::for_score(self.score),
        };
        log::info!(
            "round over: score {}, longest combo {}, record {}",
            results.score,
            results.longest_combo,
            results.all_time_combo
        );
        self.results = Some(results);
        self.events.push(RoundEvent::RoundOver(results));
    }
}
