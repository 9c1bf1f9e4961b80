//! Combo streaks: one update per finished cycle.

use thiserror::Error;

/// Streak at which the big-combo tier fires.
pub const BIG_COMBO: u32 = 12;
/// Streak at which the huge-combo tier fires.
pub const HUGE_COMBO: u32 = 20;
/// Cycles destroying fewer tiles than this break the streak.
pub const STREAK_MIN_DESTROYED: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboTier {
    Big,
    Huge,
}

impl ComboTier {
    pub fn threshold(self) -> u32 {
        match self {
            Self::Big => BIG_COMBO,
            Self::Huge => HUGE_COMBO,
        }
    }
}

/// Notifications emitted by [`ComboMeter::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboEvent {
    StreakChanged(u32),
    /// Fires on every update whose streak is at or above the tier.
    TierReached { tier: ComboTier, streak: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComboError {
    #[error("invalid destroyed count: {0}")]
    InvalidCount(i64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComboMeter {
    current: u32,
    longest: u32,
    all_time: u32,
}

impl ComboMeter {
    /// Fresh meter carrying over the session's all-time record.
    pub fn with_record(all_time: u32) -> Self {
        Self {
            all_time,
            ..Self::default()
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn longest(&self) -> u32 {
        self.longest
    }

    pub fn all_time(&self) -> u32 {
        self.all_time
    }

    /// Feed one finished cycle's destroyed count. Negative counts are logged
    /// and leave the meter untouched.
    pub fn update(&mut self, destroyed: i64, mut emit: impl FnMut(ComboEvent)) -> Result<(), ComboError> {
        if destroyed < 0 {
            log::warn!("combo update rejected: destroyed count {}", destroyed);
            return Err(ComboError::InvalidCount(destroyed));
        }

        if destroyed < STREAK_MIN_DESTROYED {
            self.current = 0;
            emit(ComboEvent::StreakChanged(0));
            return Ok(());
        }

        self.current += 1;
        self.longest = self.longest.max(self.current);
        self.all_time = self.all_time.max(self.current);
        emit(ComboEvent::StreakChanged(self.current));
        for tier in [ComboTier::Big, ComboTier::Huge] {
            if self.current >= tier.threshold() {
                emit(ComboEvent::TierReached {
                    tier,
                    streak: self.current,
                });
            }
        }
        Ok(())
    }

    /// Round start: clears current and longest, keeps the all-time record.
    pub fn reset_for_round(&mut self, mut emit: impl FnMut(ComboEvent)) {
        self.current = 0;
        self.longest = 0;
        emit(ComboEvent::StreakChanged(0));
    }
}
