//! XP/level progression and daily streak tracking.
//!
//! Pure computations only: callers read the current `UserProgress`,
//! run these functions, and persist the result (see `state.rs` for the
//! atomic read-modify-write around them).
//!
//! The level curve is iterative integer math on purpose. Increments
//! grow by a factor of 1.5 floored at every step (100, 150, 225, 337,
//! 505, 757, ...), so a closed-form `100 * 1.5^(n-1)` in floating
//! point would drift from the real sequence after a few levels.

use chrono::{DateTime, Utc};

const FIRST_INCREMENT: u64 = 100;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Level for a cumulative XP total. Total XP of 0 is level 1.
pub fn level_from_xp(xp: u64) -> u32 {
  let mut level: u32 = 1;
  let mut threshold: u64 = 0;
  let mut inc = FIRST_INCREMENT;
  while xp >= threshold + inc {
    threshold += inc;
    inc = inc * 3 / 2;
    level += 1;
  }
  level
}

/// Cumulative XP needed to reach `level` (level 1 => 0).
pub fn threshold_for_level(level: u32) -> u64 {
  let mut threshold: u64 = 0;
  let mut inc = FIRST_INCREMENT;
  for _ in 1..level {
    threshold += inc;
    inc = inc * 3 / 2;
  }
  threshold
}

/// XP already earned inside the current level.
pub fn xp_into_level(xp: u64) -> u64 {
  xp - threshold_for_level(level_from_xp(xp))
}

/// XP span of the current level (distance from its threshold to the next one).
pub fn xp_for_next_level(xp: u64) -> u64 {
  let level = level_from_xp(xp);
  threshold_for_level(level + 1) - threshold_for_level(level)
}

/// Result of applying an XP award.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XpAward {
  pub new_xp: u64,
  pub new_level: u32,
  pub leveled_up: bool,
}

/// Apply a non-negative XP delta to a running total.
/// The level is always derived from the new total, never carried separately.
pub fn apply_xp(xp: u64, delta: u64) -> XpAward {
  let new_xp = xp + delta;
  let new_level = level_from_xp(new_xp);
  XpAward {
    new_xp,
    new_level,
    leveled_up: new_level > level_from_xp(xp),
  }
}

/// Result of recording an activity event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreakUpdate {
  pub current_streak: u32,
  pub longest_streak: u32,
  pub last_active_at: DateTime<Utc>,
}

/// Update streak counters for an activity happening at `now`.
///
/// "Day" here is elapsed-duration based: the millisecond gap since the
/// last activity, floor-divided by 24h. Two events 23h apart are the
/// same day even when they straddle midnight; 30h apart is one day;
/// 50h apart is two days and breaks the streak. A gap <= 0 (clock
/// skew) is folded into the same-day branch so a skewed clock can
/// never inflate or break a streak. `last_active_at` is refreshed on
/// every call, including the same-day no-op.
pub fn record_activity(
  last_active_at: Option<DateTime<Utc>>,
  current_streak: u32,
  longest_streak: u32,
  now: DateTime<Utc>,
) -> StreakUpdate {
  let current = match last_active_at {
    None => 1,
    Some(last) => {
      let day_diff = (now - last).num_milliseconds().div_euclid(MILLIS_PER_DAY);
      if day_diff <= 0 {
        current_streak
      } else if day_diff == 1 {
        current_streak + 1
      } else {
        1
      }
    }
  };
  StreakUpdate {
    current_streak: current,
    longest_streak: longest_streak.max(current),
    last_active_at: now,
  }
}
