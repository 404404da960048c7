//! In-game calendar time.
//!
//! The game world runs on a fixed calendar: 12 months of 30 days, 24 hours
//! of 60 minutes. The engine never reads a wall clock; the caller advances
//! `ctx.world.time` between calls.
//!
//! Comparisons use the full timestamp (year down to minute), so an event
//! window that crosses midnight or a month boundary expires correctly.

use serde::{Deserialize, Serialize};

/// Days in every month of the game calendar.
pub const DAYS_PER_MONTH: u32 = 30;
/// Months in a game year.
pub const MONTHS_PER_YEAR: u32 = 12;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;

/// A point in game time.
///
/// `month` and `day` are 1-based; `hour` is 0..24, `minute` 0..60.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameTime {
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Default for GameTime {
    fn default() -> Self {
        Self {
            year: 1,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
        }
    }
}

impl GameTime {
    /// Create a time. Out-of-range components are normalized.
    #[must_use]
    pub fn new(year: u32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let raw = Self {
            year,
            month: month.max(1),
            day: day.max(1),
            hour,
            minute,
        };
        Self::from_total_minutes(raw.total_minutes())
    }

    /// Time of day on the first day of year 1.
    #[must_use]
    pub fn at(hour: u32, minute: u32) -> Self {
        Self::new(1, 1, 1, hour, minute)
    }

    /// Minutes since the calendar epoch.
    #[must_use]
    pub fn total_minutes(&self) -> u64 {
        self.day_number() * MINUTES_PER_DAY
            + u64::from(self.hour) * MINUTES_PER_HOUR
            + u64::from(self.minute)
    }

    /// Whole days since the calendar epoch.
    ///
    /// Used for cooldown bookkeeping ("days since last completion").
    #[must_use]
    pub fn day_number(&self) -> u64 {
        let months = u64::from(self.year) * u64::from(MONTHS_PER_YEAR)
            + u64::from(self.month.saturating_sub(1));
        months * u64::from(DAYS_PER_MONTH) + u64::from(self.day.saturating_sub(1))
    }

    /// Rebuild a time from minutes since the epoch.
    #[must_use]
    pub fn from_total_minutes(total: u64) -> Self {
        let minute = (total % MINUTES_PER_HOUR) as u32;
        let hour = ((total / MINUTES_PER_HOUR) % 24) as u32;
        let days = total / MINUTES_PER_DAY;
        let day = (days % u64::from(DAYS_PER_MONTH)) as u32 + 1;
        let months = days / u64::from(DAYS_PER_MONTH);
        let month = (months % u64::from(MONTHS_PER_YEAR)) as u32 + 1;
        let year = (months / u64::from(MONTHS_PER_YEAR)) as u32;
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
    }

    /// This time plus a number of minutes, rolling over days and months.
    #[must_use]
    pub fn plus_minutes(&self, minutes: u64) -> Self {
        Self::from_total_minutes(self.total_minutes() + minutes)
    }

    /// Minutes from `self` until `later` (zero if `later` is not after).
    #[must_use]
    pub fn minutes_until(&self, later: &GameTime) -> u64 {
        later.total_minutes().saturating_sub(self.total_minutes())
    }
}

impl PartialOrd for GameTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.total_minutes().cmp(&other.total_minutes())
    }
}

impl std::fmt::Display for GameTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Y{} M{:02} D{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_minutes_same_day() {
        let start = GameTime::new(3, 4, 10, 9, 15);
        let end = start.plus_minutes(90);
        assert_eq!(end, GameTime::new(3, 4, 10, 10, 45));
    }

    #[test]
    fn test_plus_minutes_crosses_midnight() {
        let start = GameTime::new(3, 4, 10, 23, 0);
        let end = start.plus_minutes(120);
        assert_eq!(end.day, 11);
        assert_eq!(end.hour, 1);
        assert!(end > start);
    }

    #[test]
    fn test_plus_minutes_crosses_year() {
        let start = GameTime::new(3, 12, 30, 23, 30);
        let end = start.plus_minutes(60);
        assert_eq!(end, GameTime::new(4, 1, 1, 0, 30));
    }

    #[test]
    fn test_new_normalizes() {
        let time = GameTime::new(1, 1, 1, 25, 70);
        assert_eq!(time, GameTime::new(1, 1, 2, 2, 10));
    }

    #[test]
    fn test_day_number_and_minutes_until() {
        let a = GameTime::new(1, 2, 1, 0, 0);
        let b = GameTime::new(1, 1, 1, 0, 0);
        assert_eq!(a.day_number() - b.day_number(), 30);
        assert_eq!(b.minutes_until(&a), 30 * 24 * 60);
        assert_eq!(a.minutes_until(&b), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(GameTime::new(2, 3, 4, 5, 6).to_string(), "Y2 M03 D04 05:06");
    }
}
