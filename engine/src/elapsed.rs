//! Elapsed-time calculator.
//!
//! The single source of truth for "how much clock time did this ticket
//! actually consume". Every report computes elapsed time through
//! [`elapsed_hours`] so pause handling cannot drift between endpoints.

use chrono::{DateTime, Utc};
use servicedesk_shared::SlaTicket;

use crate::calendar::BusinessCalendar;

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Pause bookkeeping lifted off a ticket: the accumulated total of closed
/// pause intervals plus the start of an in-progress pause, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlaClock {
    pub paused_total_ms: i64,
    pub paused_at: Option<DateTime<Utc>>,
}

impl SlaClock {
    pub fn of(ticket: &SlaTicket) -> Self {
        Self {
            paused_total_ms: ticket.sla_paused_total_ms,
            paused_at: ticket.sla_paused_at,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ElapsedMode<'a> {
    WallClock,
    BusinessHours(&'a BusinessCalendar),
}

/// The instant the SLA clock started for a ticket: the first concrete
/// handling signal, else the explicit start mark, else raw creation.
pub fn sla_start_of(ticket: &SlaTicket) -> DateTime<Utc> {
    ticket
        .claimed_at
        .or(ticket.sla_start_at)
        .unwrap_or(ticket.created_at)
}

/// Net elapsed duration that counted toward the SLA clock, in fractional
/// hours, never negative.
///
/// Subtracts the closed pause total, then the open pause tail when the
/// clock is still paused at `end`. Stale pause bookkeeping can push the raw
/// result below zero; it clamps to zero. In business-hours mode the
/// start/end interval and the open pause tail are walked against the
/// calendar; the closed pause total is subtracted at face value, since the
/// individual intervals it folded together are no longer available.
pub fn elapsed_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    clock: SlaClock,
    mode: ElapsedMode<'_>,
) -> f64 {
    match mode {
        ElapsedMode::WallClock => {
            let mut ms = (end - start).num_milliseconds() - clock.paused_total_ms;
            if let Some(paused_at) = clock.paused_at {
                if end >= paused_at {
                    ms -= (end - paused_at).num_milliseconds();
                }
            }
            ms.max(0) as f64 / MS_PER_HOUR
        }
        ElapsedMode::BusinessHours(calendar) => {
            let mut hours = calendar.business_hours_between(start, end);
            hours -= clock.paused_total_ms as f64 / MS_PER_HOUR;
            if let Some(paused_at) = clock.paused_at {
                if end >= paused_at {
                    hours -= calendar.business_hours_between(paused_at, end);
                }
            }
            hours.max(0.0)
        }
    }
}
