//! Time windows for fetching events and placing placeholders.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        TimeWindow { start, end }
    }

    /// The sync window `[now, now + days)`.
    pub fn upcoming(now: DateTime<Utc>, days: u32) -> Self {
        TimeWindow {
            start: now,
            end: now + Duration::days(i64::from(days)),
        }
    }

    /// Sync window starting at the current instant.
    pub fn from_now(days: u32) -> Self {
        Self::upcoming(Utc::now(), days)
    }

    /// Whether `other` overlaps this window at all.
    ///
    /// Zero-length events count when they sit inside the window.
    pub fn intersects(&self, other: &TimeWindow) -> bool {
        if other.start == other.end {
            return other.start >= self.start && other.start < self.end;
        }
        other.start < self.end && other.end > self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.date_naive() == self.end.date_naive() {
            write!(
                f,
                "{} {}-{}",
                self.start.format("%Y-%m-%d"),
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )
        } else {
            write!(
                f,
                "{} - {}",
                self.start.format("%Y-%m-%d %H:%M"),
                self.end.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 16, h, m, 0).unwrap()
    }

    #[test]
    fn upcoming_spans_requested_days() {
        let window = TimeWindow::upcoming(at(8, 0), 30);
        assert_eq!(window.end - window.start, Duration::days(30));
    }

    #[test]
    fn intersects_is_half_open() {
        let window = TimeWindow::new(at(9, 0), at(10, 0));

        assert!(window.intersects(&TimeWindow::new(at(9, 30), at(11, 0))));
        assert!(window.intersects(&TimeWindow::new(at(8, 0), at(9, 1))));
        assert!(!window.intersects(&TimeWindow::new(at(10, 0), at(11, 0))));
        assert!(!window.intersects(&TimeWindow::new(at(8, 0), at(9, 0))));
    }

    #[test]
    fn zero_length_event_inside_window_intersects() {
        let window = TimeWindow::new(at(9, 0), at(10, 0));
        assert!(window.intersects(&TimeWindow::new(at(9, 0), at(9, 0))));
        assert!(!window.intersects(&TimeWindow::new(at(10, 0), at(10, 0))));
    }

    #[test]
    fn display_same_day() {
        let window = TimeWindow::new(at(9, 0), at(10, 30));
        assert_eq!(window.to_string(), "2026-03-16 09:00-10:30");
    }
}
