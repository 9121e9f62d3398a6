//! Temporal pattern analyzer.
//!
//! Three independent histograms over the classified set: breaches by
//! hour-of-day, breaches by day-of-week, and a rolling month-aligned
//! compliance trend. Peaks are simple argmax with first-occurrence
//! tie-break for determinism.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Serialize;

use crate::classifier::ClassifiedTicket;
use crate::dimensions::compliance_rate;

pub const DEFAULT_TREND_MONTHS: u32 = 6;

pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Hour-of-day and day-of-week breach histograms, bucketed on ticket
/// creation time in the report's local timezone. Day index 0 is Sunday.
#[derive(Debug, Clone, Serialize)]
pub struct BreachHistograms {
    pub by_hour: [u32; 24],
    pub by_day_of_week: [u32; 7],
}

impl BreachHistograms {
    pub fn collect(tickets: &[ClassifiedTicket], offset: FixedOffset) -> Self {
        let mut histograms = Self {
            by_hour: [0; 24],
            by_day_of_week: [0; 7],
        };
        for ticket in tickets.iter().filter(|t| t.evaluation.any_breach()) {
            let local = ticket.created_at.with_timezone(&offset);
            histograms.by_hour[local.hour() as usize] += 1;
            histograms.by_day_of_week[local.weekday().num_days_from_sunday() as usize] += 1;
        }
        histograms
    }

    pub fn peak_hour(&self) -> usize {
        argmax(&self.by_hour)
    }

    pub fn peak_day(&self) -> usize {
        argmax(&self.by_day_of_week)
    }
}

/// Index of the maximum count; ties resolve to the lowest index.
fn argmax(buckets: &[u32]) -> usize {
    let mut best = 0;
    for (i, count) in buckets.iter().enumerate() {
        if *count > buckets[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendPoint {
    /// Label like "Jun 2025".
    pub month: String,
    pub total_tickets: u64,
    pub breaches: u64,
    pub compliance_rate: f64,
}

/// Compliance per calendar month over the trailing `months` windows ending
/// at `now`, oldest first. Each window re-runs the compliance formula over
/// the tickets created in that month.
pub fn monthly_trend(
    tickets: &[ClassifiedTicket],
    months: u32,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<MonthlyTrendPoint> {
    let local_now = now.with_timezone(&offset).date_naive();
    (0..months)
        .map(|i| {
            let back = months - 1 - i;
            let (year, month) = shift_month(local_now.year(), local_now.month(), back);
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b %Y").to_string())
                .unwrap_or_default();
            let mut total = 0u64;
            let mut breaches = 0u64;
            for ticket in tickets {
                let local = ticket.created_at.with_timezone(&offset).date_naive();
                if local.year() == year && local.month() == month {
                    total += 1;
                    if ticket.evaluation.any_breach() {
                        breaches += 1;
                    }
                }
            }
            MonthlyTrendPoint {
                month: label,
                total_tickets: total,
                breaches,
                compliance_rate: compliance_rate(total, breaches),
            }
        })
        .collect()
}

fn shift_month(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year as i64 * 12 + month as i64 - 1 - back as i64;
    (index.div_euclid(12) as i32, (index.rem_euclid(12) + 1) as u32)
}
