//! Business-hours calendar.
//!
//! The working window (which hours on which days count toward a
//! business-hours SLA) is explicit configuration, never ambient state. The
//! default matches the service desk's home timezone: 08:00-17:00 WITA
//! (UTC+8), Monday through Friday.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::elapsed::MS_PER_HOUR;

/// Safety cap on day-by-day walks, roughly two years.
const MAX_WALK_DAYS: u32 = 800;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessCalendar {
    /// First counted hour of the working day (local time, inclusive).
    pub start_hour: u32,
    /// End of the working day (local time, exclusive).
    pub end_hour: u32,
    /// Work days indexed Sunday = 0 through Saturday = 6.
    pub work_days: [bool; 7],
    /// Local offset from UTC in seconds.
    pub utc_offset_secs: i32,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self {
            start_hour: 8,
            end_hour: 17,
            work_days: [false, true, true, true, true, true, false],
            utc_offset_secs: 8 * 3600,
        }
    }
}

impl BusinessCalendar {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }

    fn is_work_day(&self, day: NaiveDate) -> bool {
        self.work_days[day.weekday().num_days_from_sunday() as usize]
    }

    /// The day's working window as UTC instants, `None` if the configured
    /// hours are out of range.
    fn window_for(&self, day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let tz = self.offset();
        let open = day
            .and_hms_opt(self.start_hour, 0, 0)?
            .and_local_timezone(tz)
            .single()?;
        let close = day
            .and_hms_opt(self.end_hour, 0, 0)?
            .and_local_timezone(tz)
            .single()?;
        Some((open.with_timezone(&Utc), close.with_timezone(&Utc)))
    }

    /// Whether an instant falls inside the working window.
    pub fn is_business_hours(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.offset());
        self.work_days[local.weekday().num_days_from_sunday() as usize]
            && local.hour() >= self.start_hour
            && local.hour() < self.end_hour
    }

    /// Business hours between two instants, as fractional hours.
    ///
    /// Walks the interval day by day in local time and sums only the
    /// minutes falling inside the working window on work days; weekends and
    /// off-hours contribute nothing. Returns 0 when `end <= start`.
    pub fn business_hours_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
        if end <= start {
            return 0.0;
        }
        let tz = self.offset();
        let mut total_ms: i64 = 0;
        let mut day = start.with_timezone(&tz).date_naive();
        let last = end.with_timezone(&tz).date_naive();
        let mut walked = 0;
        while day <= last && walked < MAX_WALK_DAYS {
            walked += 1;
            if self.is_work_day(day) {
                if let Some((open, close)) = self.window_for(day) {
                    let window_start = open.max(start);
                    let window_end = close.min(end);
                    if window_end > window_start {
                        total_ms += (window_end - window_start).num_milliseconds();
                    }
                }
            }
            day = match day.succ_opt() {
                Some(d) => d,
                None => break,
            };
        }
        total_ms as f64 / MS_PER_HOUR
    }

    /// Project a deadline: the instant at which `hours` of business time
    /// will have elapsed from `start`.
    pub fn add_business_hours(&self, start: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
        if hours <= 0.0 {
            return start;
        }
        let mut remaining_ms = (hours * MS_PER_HOUR) as i64;
        let mut cursor = start;
        let mut walked = 0;
        while remaining_ms > 0 && walked < MAX_WALK_DAYS {
            walked += 1;
            let day = cursor.with_timezone(&self.offset()).date_naive();
            if self.is_work_day(day) {
                if let Some((open, close)) = self.window_for(day) {
                    let from = cursor.max(open);
                    if from < close {
                        let available = (close - from).num_milliseconds();
                        if remaining_ms <= available {
                            return from + Duration::milliseconds(remaining_ms);
                        }
                        remaining_ms -= available;
                    }
                }
            }
            let next = match day.succ_opt() {
                Some(d) => d,
                None => break,
            };
            cursor = self
                .window_for(next)
                .map(|(open, _)| open)
                .unwrap_or(cursor + Duration::days(1));
        }
        cursor
    }
}
