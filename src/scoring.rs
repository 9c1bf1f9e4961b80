//! Points per cycle and the end-of-round rank.

use std::fmt;

/// Base points per destroyed tile, applied to the square of the count.
pub const TILE_POINTS: u32 = 10;
/// Bonus per streak step.
pub const STREAK_BONUS: u32 = 50;
/// Flat points per tile destroyed by an item.
pub const ITEM_TILE_POINTS: u32 = 20;

/// Tap cycle: `count² × 10`, plus `streak × 50` when a streak is running.
/// `streak` is the value after this cycle's combo update.
pub fn tap_points(destroyed: usize, streak: u32) -> u32 {
    let n = u32::try_from(destroyed).unwrap_or(u32::MAX);
    let base = n.saturating_mul(n).saturating_mul(TILE_POINTS);
    let bonus = if streak > 0 {
        streak.saturating_mul(STREAK_BONUS)
    } else {
        0
    };
    base.saturating_add(bonus)
}

/// Item cycle: flat bonus per destroyed tile.
pub fn item_points(destroyed: usize) -> u32 {
    u32::try_from(destroyed)
        .unwrap_or(u32::MAX)
        .saturating_mul(ITEM_TILE_POINTS)
}

/// Result rank from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Practice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Master,
}

impl Rank {
    pub fn for_score(score: u32) -> Self {
        match score {
            5000.. => Self::Master,
            3000.. => Self::Expert,
            1500.. => Self::Advanced,
            800.. => Self::Intermediate,
            300.. => Self::Beginner,
            _ => Self::Practice,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Master => "🏆 Amazing! Master level!",
            Self::Expert => "⭐ Excellent! Expert!",
            Self::Advanced => "👍 Nice! Advanced!",
            Self::Intermediate => "😊 Not bad! Intermediate!",
            Self::Beginner => "🙂 Okay! Beginner!",
            Self::Practice => "😅 Keep practising!",
        }
    }

    pub fn celebration(self) -> [&'static str; 5] {
        match self {
            Self::Master | Self::Expert => ["🎉", "🏆", "⭐", "🎊", "👑"],
            Self::Advanced => ["🎉", "⭐", "😎", "🎊", "🔥"],
            Self::Intermediate => ["😊", "👍", "⭐", "🎉", "😄"],
            Self::Beginner | Self::Practice => ["😅", "💪", "🎯", "📈", "🚀"],
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_points_square_the_group() {
        assert_eq!(tap_points(4, 0), 160);
        assert_eq!(tap_points(4, 1), 210);
        assert_eq!(tap_points(2, 3), 40 + 150);
    }

    #[test]
    fn item_points_are_flat() {
        assert_eq!(item_points(0), 0);
        assert_eq!(item_points(9), 180);
    }

    #[test]
    fn huge_counts_saturate() {
        assert_eq!(tap_points(usize::MAX, 1), u32::MAX);
    }

    #[test]
    fn ranks_follow_thresholds() {
        assert_eq!(Rank::for_score(0), Rank::Practice);
        assert_eq!(Rank::for_score(299), Rank::Practice);
        assert_eq!(Rank::for_score(300), Rank::Beginner);
        assert_eq!(Rank::for_score(800), Rank::Intermediate);
        assert_eq!(Rank::for_score(1500), Rank::Advanced);
        assert_eq!(Rank::for_score(3000), Rank::Expert);
        assert_eq!(Rank::for_score(5000), Rank::Master);
        assert!(Rank::Master > Rank::Beginner);
    }
}
