//! Time-window tiling for paginated clip queries.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A half-open UTC interval `[started_at, ended_at)` bounding one paginated
/// clip query.
///
/// The upstream cursor becomes unreliable somewhere past a thousand results
/// per query, so the lookback period is tiled into windows small enough to
/// stay under that ceiling even at peak traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl FetchWindow {
    /// Tile `[start-of-day(now - lookback_days), now)` into windows of
    /// `window_minutes`.
    ///
    /// Each day is walked from its UTC midnight in fixed steps, oldest day
    /// first, so the returned list is chronological. No window starts after
    /// `now`; the last window is clamped to `now` instead of being dropped,
    /// so the lookback period is covered up to the current instant. A step
    /// that does not divide the day spills past midnight and overlaps the
    /// next day's first windows; deduplication downstream absorbs that.
    pub fn tile(now: DateTime<Utc>, lookback_days: u32, window_minutes: u32) -> Vec<FetchWindow> {
        // A zero-width step would never advance.
        let step = i64::from(window_minutes.max(1));
        let mut windows = Vec::new();

        for day_offset in (0..=i64::from(lookback_days)).rev() {
            let day = (now - Duration::days(day_offset)).date_naive();
            let day_start = day.and_time(NaiveTime::MIN).and_utc();

            let mut minute = 0;
            while minute < MINUTES_PER_DAY {
                let started_at = day_start + Duration::minutes(minute);
                if started_at > now {
                    break;
                }
                let ended_at = (started_at + Duration::minutes(step)).min(now);
                if started_at < ended_at {
                    windows.push(FetchWindow {
                        started_at,
                        ended_at,
                    });
                }
                minute += step;
            }
        }

        windows
    }

    /// Window length in whole minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.ended_at - self.started_at).num_minutes()
    }
}

impl std::fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} .. {})",
            self.started_at.format("%Y-%m-%dT%H:%M:%SZ"),
            self.ended_at.format("%Y-%m-%dT%H:%M:%SZ"),
        )
    }
}
