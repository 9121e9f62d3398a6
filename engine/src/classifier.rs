//! Breach classifier.
//!
//! Combines a ticket's milestone timestamps with the policy resolver and
//! the elapsed-time calculator into a per-ticket SLA evaluation. The
//! evaluation is a pure projection of the ticket's current field values;
//! nothing is persisted here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use servicedesk_shared::{
    Priority, ServicePolicy, SlaTicket, SlaTrackingRecord, TicketStatus,
};
use uuid::Uuid;

use crate::calendar::BusinessCalendar;
use crate::elapsed::{elapsed_hours, sla_start_of, ElapsedMode, SlaClock};
use crate::error::EngineWarning;
use crate::policy::{resolve_policy, PriorityFallbackTable, ResolvedPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreachSeverity {
    None,
    Minor,
    Moderate,
    Severe,
}

impl BreachSeverity {
    /// Severity tiering: the resolution leg dominates, with SEVERE reserved
    /// for blowing past twice the target; a response-only breach is MINOR.
    fn grade(
        response_breached: bool,
        resolution_breached: bool,
        actual_resolution_hours: f64,
        resolution_target: f64,
    ) -> Self {
        if resolution_breached {
            if actual_resolution_hours > resolution_target * 2.0 {
                Self::Severe
            } else {
                Self::Moderate
            }
        } else if response_breached {
            Self::Minor
        } else {
            Self::None
        }
    }
}

/// Breach state of one SLA leg.
///
/// `Historical` is a durable fact: the milestone was reached, or the
/// breach-detection job recorded the breach. `InFlight` is a projection
/// against the evaluation instant for a ticket that has not reached the
/// milestone yet. `NotEvaluated` marks a missing milestone on a settled
/// ticket, which contributes neither a breach nor an on-time result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "breached", rename_all = "camelCase")]
pub enum BreachDetermination {
    Historical(bool),
    InFlight(bool),
    NotEvaluated,
}

impl BreachDetermination {
    pub fn breached(&self) -> bool {
        matches!(
            self,
            BreachDetermination::Historical(true) | BreachDetermination::InFlight(true)
        )
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, BreachDetermination::InFlight(_))
    }
}

/// Per-ticket SLA evaluation result.
#[derive(Debug, Clone, Serialize)]
pub struct SlaEvaluation {
    pub sla_start: DateTime<Utc>,
    pub actual_response_hours: f64,
    pub actual_resolution_hours: f64,
    /// Time to assignment, informational only; no breach semantics.
    pub actual_assignment_hours: f64,
    pub response: BreachDetermination,
    pub resolution: BreachDetermination,
    pub severity: BreachSeverity,
}

impl SlaEvaluation {
    pub fn any_breach(&self) -> bool {
        self.response.breached() || self.resolution.breached()
    }
}

/// A ticket joined with its evaluation and the grouping metadata the
/// aggregators need. This is the unit flowing through every report pass.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedTicket {
    pub ticket_id: Uuid,
    pub ticket_number: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    /// Effective milestones (tracking record value when present, else the
    /// ticket's own field). Averages only count legs where these are set.
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub service_name: Option<String>,
    pub category_name: Option<String>,
    pub support_group_name: Option<String>,
    pub branch_name: Option<String>,
    pub technician_name: Option<String>,
    pub policy: ResolvedPolicy,
    pub evaluation: SlaEvaluation,
}

/// Classify a single ticket.
///
/// A persisted tracking record wins the breach booleans (it recorded what
/// was true at detection time) while the computed hours are kept for
/// magnitude and trend reporting. A missing milestone on a live ticket
/// yields an in-flight projection against `now`; on a settled ticket the
/// leg is not evaluated at all.
pub fn classify(
    ticket: &SlaTicket,
    service: Option<&ServicePolicy>,
    tracking: Option<&SlaTrackingRecord>,
    fallback: &PriorityFallbackTable,
    calendar: Option<&BusinessCalendar>,
    now: DateTime<Utc>,
) -> (ClassifiedTicket, Option<EngineWarning>) {
    let policy = resolve_policy(service, ticket.priority, fallback);

    let (mode, warning) = if policy.business_hours_only {
        match calendar {
            Some(cal) => (ElapsedMode::BusinessHours(cal), None),
            None => {
                let service_name = service
                    .map(|s| s.name.clone())
                    .or_else(|| ticket.service_name.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                tracing::warn!(
                    service = %service_name,
                    ticket = %ticket.ticket_number,
                    "business-hours SLA requested but no calendar configured; using wall-clock"
                );
                (
                    ElapsedMode::WallClock,
                    Some(EngineWarning::MissingBusinessCalendar {
                        service: service_name,
                    }),
                )
            }
        }
    } else {
        (ElapsedMode::WallClock, None)
    };

    let sla_start = sla_start_of(ticket);
    let clock = SlaClock::of(ticket);
    let elapsed = |end: DateTime<Utc>| elapsed_hours(sla_start, end, clock, mode);

    let first_response_at = tracking
        .and_then(|t| t.response_time)
        .or(ticket.first_response_at);
    let resolved_at = tracking
        .and_then(|t| t.resolution_time)
        .or(ticket.resolved_at);

    let (actual_response_hours, response) = leg_outcome(
        first_response_at,
        ticket.status,
        tracking.map(|t| t.is_response_breached),
        policy.response_hours,
        now,
        &elapsed,
    );
    let (actual_resolution_hours, resolution) = leg_outcome(
        resolved_at,
        ticket.status,
        tracking.map(|t| t.is_resolution_breached),
        policy.resolution_hours,
        now,
        &elapsed,
    );
    let actual_assignment_hours = ticket.assigned_at.map(&elapsed).unwrap_or(0.0);

    let severity = BreachSeverity::grade(
        response.breached(),
        resolution.breached(),
        actual_resolution_hours,
        policy.resolution_hours,
    );

    let classified = ClassifiedTicket {
        ticket_id: ticket.id,
        ticket_number: ticket.ticket_number.clone(),
        priority: ticket.priority,
        status: ticket.status,
        created_at: ticket.created_at,
        first_response_at,
        resolved_at,
        service_name: ticket.service_name.clone(),
        category_name: ticket.category_name.clone(),
        support_group_name: ticket.support_group_name.clone(),
        branch_name: ticket.branch_name.clone(),
        technician_name: ticket.technician_name.clone(),
        policy,
        evaluation: SlaEvaluation {
            sla_start,
            actual_response_hours,
            actual_resolution_hours,
            actual_assignment_hours,
            response,
            resolution,
            severity,
        },
    };
    (classified, warning)
}

fn leg_outcome(
    milestone: Option<DateTime<Utc>>,
    status: TicketStatus,
    persisted_breach: Option<bool>,
    target_hours: f64,
    now: DateTime<Utc>,
    elapsed: &impl Fn(DateTime<Utc>) -> f64,
) -> (f64, BreachDetermination) {
    match milestone {
        Some(at) => {
            let hours = elapsed(at);
            let breached = persisted_breach.unwrap_or(hours > target_hours);
            (hours, BreachDetermination::Historical(breached))
        }
        None if !status.is_settled() => {
            let hours = elapsed(now);
            match persisted_breach {
                Some(flag) => (hours, BreachDetermination::Historical(flag)),
                None => (hours, BreachDetermination::InFlight(hours > target_hours)),
            }
        }
        None => (0.0, BreachDetermination::NotEvaluated),
    }
}

/// Classify a snapshot of tickets. Warnings are deduplicated per service so
/// one misconfigured service does not flood the report.
pub fn classify_all(
    tickets: &[SlaTicket],
    services: &HashMap<Uuid, ServicePolicy>,
    tracking: &HashMap<Uuid, SlaTrackingRecord>,
    fallback: &PriorityFallbackTable,
    calendar: Option<&BusinessCalendar>,
    now: DateTime<Utc>,
) -> (Vec<ClassifiedTicket>, Vec<EngineWarning>) {
    let mut warnings: Vec<EngineWarning> = Vec::new();
    let mut classified = Vec::with_capacity(tickets.len());
    for ticket in tickets {
        let service = ticket.service_id.and_then(|id| services.get(&id));
        let record = tracking.get(&ticket.id);
        let (result, warning) = classify(ticket, service, record, fallback, calendar, now);
        if let Some(w) = warning {
            if !warnings.contains(&w) {
                warnings.push(w);
            }
        }
        classified.push(result);
    }
    tracing::debug!(
        tickets = classified.len(),
        warnings = warnings.len(),
        "classified ticket snapshot"
    );
    (classified, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap()
    }

    fn ticket(t: DateTime<Utc>) -> SlaTicket {
        SlaTicket {
            id: Uuid::new_v4(),
            ticket_number: "TKT-1001".to_string(),
            title: "ATM offline".to_string(),
            priority: Priority::High,
            status: TicketStatus::InProgress,
            created_at: t,
            claimed_at: None,
            sla_start_at: None,
            assigned_at: None,
            first_response_at: None,
            resolved_at: None,
            sla_paused_total_ms: 0,
            sla_paused_at: None,
            service_id: None,
            service_name: Some("ATM Support".to_string()),
            category_name: None,
            support_group_name: None,
            branch_name: Some("Manado".to_string()),
            branch_code: Some("MND".to_string()),
            technician_name: None,
        }
    }

    fn service_with_resolution(hours: f64) -> ServicePolicy {
        ServicePolicy {
            id: Uuid::new_v4(),
            name: "ATM Support".to_string(),
            sla_hours: None,
            response_hours: Some(1.0),
            resolution_hours: Some(hours),
            business_hours_only: false,
            category_name: None,
            support_group_name: None,
        }
    }

    /// Created at T, claimed at T+1h, paused 2h, resolved at T+10h.
    fn paused_resolved_ticket() -> SlaTicket {
        let t = t0();
        let mut tk = ticket(t);
        tk.claimed_at = Some(t + Duration::hours(1));
        tk.first_response_at = Some(t + Duration::hours(2));
        tk.resolved_at = Some(t + Duration::hours(10));
        tk.sla_paused_total_ms = 2 * 3_600_000;
        tk.status = TicketStatus::Resolved;
        tk
    }

    #[test]
    fn claimed_at_starts_the_clock_and_pause_is_deducted() {
        let tk = paused_resolved_ticket();
        let table = PriorityFallbackTable::default();
        let service = service_with_resolution(8.0);
        let (c, warning) = classify(&tk, Some(&service), None, &table, None, t0());
        assert!(warning.is_none());
        assert_eq!(c.evaluation.sla_start, t0() + Duration::hours(1));
        // (T+10h - T+1h) - 2h = 7h, under the 8h target.
        assert!((c.evaluation.actual_resolution_hours - 7.0).abs() < 1e-9);
        assert_eq!(c.evaluation.resolution, BreachDetermination::Historical(false));
        assert_eq!(c.evaluation.severity, BreachSeverity::None);
    }

    #[test]
    fn tighter_target_breaches_moderately() {
        let tk = paused_resolved_ticket();
        let table = PriorityFallbackTable::default();
        let service = service_with_resolution(6.0);
        let (c, _) = classify(&tk, Some(&service), None, &table, None, t0());
        // 7h > 6h but 7h <= 12h.
        assert_eq!(c.evaluation.resolution, BreachDetermination::Historical(true));
        assert_eq!(c.evaluation.severity, BreachSeverity::Moderate);
    }

    #[test]
    fn runaway_resolution_is_severe() {
        let t = t0();
        let mut tk = ticket(t);
        tk.resolved_at = Some(t + Duration::hours(20));
        tk.first_response_at = Some(t + Duration::minutes(30));
        tk.status = TicketStatus::Resolved;
        let table = PriorityFallbackTable::default();
        let service = service_with_resolution(8.0);
        let (c, _) = classify(&tk, Some(&service), None, &table, None, t);
        // 20h > 2 * 8h.
        assert_eq!(c.evaluation.severity, BreachSeverity::Severe);
    }

    #[test]
    fn response_only_breach_is_minor() {
        let t = t0();
        let mut tk = ticket(t);
        tk.first_response_at = Some(t + Duration::hours(3));
        tk.resolved_at = Some(t + Duration::hours(5));
        tk.status = TicketStatus::Resolved;
        let table = PriorityFallbackTable::default();
        let service = service_with_resolution(8.0); // response target 1h
        let (c, _) = classify(&tk, Some(&service), None, &table, None, t);
        assert_eq!(c.evaluation.response, BreachDetermination::Historical(true));
        assert_eq!(c.evaluation.resolution, BreachDetermination::Historical(false));
        assert_eq!(c.evaluation.severity, BreachSeverity::Minor);
    }

    #[test]
    fn open_ticket_projects_in_flight_breach() {
        let t = t0();
        let tk = ticket(t);
        let table = PriorityFallbackTable::default();
        let service = service_with_resolution(8.0);
        let now = t + Duration::hours(20);
        let (c, _) = classify(&tk, Some(&service), None, &table, None, now);
        assert_eq!(c.evaluation.resolution, BreachDetermination::InFlight(true));
        assert!(c.evaluation.resolution.is_in_flight());
        assert!((c.evaluation.actual_resolution_hours - 20.0).abs() < 1e-9);
    }

    #[test]
    fn persisted_flag_overrides_in_flight_projection() {
        let t = t0();
        let tk = ticket(t);
        let table = PriorityFallbackTable::default();
        let service = service_with_resolution(8.0);
        let record = SlaTrackingRecord {
            ticket_id: tk.id,
            is_response_breached: false,
            is_resolution_breached: false,
            response_time: None,
            resolution_time: None,
        };
        let now = t + Duration::hours(20);
        let (c, _) = classify(&tk, Some(&service), Some(&record), &table, None, now);
        // The tracking job's verdict is the durable fact; the elapsed hours
        // still reflect the later "now".
        assert_eq!(c.evaluation.resolution, BreachDetermination::Historical(false));
        assert!(c.evaluation.actual_resolution_hours > 8.0);
    }

    #[test]
    fn settled_ticket_with_missing_milestone_contributes_nothing() {
        let t = t0();
        let mut tk = ticket(t);
        tk.status = TicketStatus::Closed;
        let table = PriorityFallbackTable::default();
        let (c, _) = classify(&tk, None, None, &table, None, t + Duration::hours(100));
        assert_eq!(c.evaluation.response, BreachDetermination::NotEvaluated);
        assert_eq!(c.evaluation.resolution, BreachDetermination::NotEvaluated);
        assert_eq!(c.evaluation.actual_resolution_hours, 0.0);
        assert_eq!(c.evaluation.severity, BreachSeverity::None);
    }

    #[test]
    fn missing_calendar_downgrades_to_wall_clock_with_warning() {
        let t = t0();
        let mut tk = ticket(t);
        tk.resolved_at = Some(t + Duration::hours(5));
        tk.first_response_at = Some(t + Duration::minutes(30));
        tk.status = TicketStatus::Resolved;
        let mut service = service_with_resolution(8.0);
        service.business_hours_only = true;
        let table = PriorityFallbackTable::default();
        let (c, warning) = classify(&tk, Some(&service), None, &table, None, t);
        assert_eq!(
            warning,
            Some(EngineWarning::MissingBusinessCalendar {
                service: "ATM Support".to_string()
            })
        );
        // Wall-clock fallback still produced a full evaluation.
        assert!((c.evaluation.actual_resolution_hours - 5.0).abs() < 1e-9);
    }

    #[test]
    fn classify_all_dedups_warnings_per_service() {
        let t = t0();
        let mut service = service_with_resolution(8.0);
        service.business_hours_only = true;
        let mut a = ticket(t);
        a.service_id = Some(service.id);
        let mut b = ticket(t);
        b.service_id = Some(service.id);
        let services = HashMap::from([(service.id, service)]);
        let (classified, warnings) = classify_all(
            &[a, b],
            &services,
            &HashMap::new(),
            &PriorityFallbackTable::default(),
            None,
            t + Duration::hours(1),
        );
        assert_eq!(classified.len(), 2);
        assert_eq!(warnings.len(), 1);
    }
}
