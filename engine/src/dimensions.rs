//! Dimension aggregator.
//!
//! Groups classified tickets by a report dimension and computes breach
//! counts, compliance rates, and performance tiers per group. Passes over
//! different dimensions are independent and safe to run concurrently over
//! the same immutable slice.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifiedTicket;

/// Top-N slice used by the ranking views.
pub const RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Service,
    Technician,
    Branch,
    Category,
    SupportGroup,
    Priority,
}

impl Dimension {
    pub fn key_of(&self, ticket: &ClassifiedTicket) -> String {
        match self {
            Dimension::Service => ticket
                .service_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            Dimension::Technician => ticket
                .technician_name
                .clone()
                .unwrap_or_else(|| "Unassigned".to_string()),
            Dimension::Branch => ticket
                .branch_name
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            Dimension::Category => ticket
                .category_name
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_string()),
            Dimension::SupportGroup => ticket
                .support_group_name
                .clone()
                .unwrap_or_else(|| "Unassigned".to_string()),
            Dimension::Priority => ticket.priority.to_string(),
        }
    }
}

/// Presentational compliance tier. Boundaries are closed: exactly 90.0 is
/// Excellent, exactly 89.9 is Good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerformanceTier {
    pub fn from_rate(overall_compliance: f64) -> Self {
        if overall_compliance >= 90.0 {
            Self::Excellent
        } else if overall_compliance >= 75.0 {
            Self::Good
        } else if overall_compliance >= 60.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }

    pub fn color_hint(&self) -> &'static str {
        match self {
            Self::Excellent => "#10b981",
            Self::Good => "#3b82f6",
            Self::Fair => "#f59e0b",
            Self::Poor => "#ef4444",
        }
    }
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentage of tickets that did not breach. A group with no tickets is
/// vacuously compliant at 100.
pub fn compliance_rate(total: u64, breaches: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    total.saturating_sub(breaches) as f64 / total as f64 * 100.0
}

/// Aggregated compliance figures for one group. Rates are full precision
/// here; rounding happens at the serialization boundary.
#[derive(Debug, Clone, Serialize)]
pub struct GroupCompliance {
    pub key: String,
    pub total_tickets: u64,
    pub response_breaches: u64,
    pub resolution_breaches: u64,
    pub both_breaches: u64,
    pub avg_response_hours: f64,
    pub avg_resolution_hours: f64,
    pub response_compliance: f64,
    pub resolution_compliance: f64,
    pub overall_compliance: f64,
    pub tier: PerformanceTier,
}

#[derive(Default)]
struct Accumulator {
    total: u64,
    response_breaches: u64,
    resolution_breaches: u64,
    both_breaches: u64,
    response_sum: f64,
    response_count: u64,
    resolution_sum: f64,
    resolution_count: u64,
}

impl Accumulator {
    fn push(&mut self, ticket: &ClassifiedTicket) {
        self.total += 1;
        let response = ticket.evaluation.response.breached();
        let resolution = ticket.evaluation.resolution.breached();
        if response {
            self.response_breaches += 1;
        }
        if resolution {
            self.resolution_breaches += 1;
        }
        if response && resolution {
            self.both_breaches += 1;
        }
        // Averages only over legs with a real milestone, so in-flight zeros
        // and projections do not dilute them.
        if ticket.first_response_at.is_some() {
            self.response_sum += ticket.evaluation.actual_response_hours;
            self.response_count += 1;
        }
        if ticket.resolved_at.is_some() {
            self.resolution_sum += ticket.evaluation.actual_resolution_hours;
            self.resolution_count += 1;
        }
    }

    fn finish(self, key: String) -> GroupCompliance {
        let response_compliance = compliance_rate(self.total, self.response_breaches);
        let resolution_compliance = compliance_rate(self.total, self.resolution_breaches);
        let overall_compliance = (response_compliance + resolution_compliance) / 2.0;
        GroupCompliance {
            key,
            total_tickets: self.total,
            response_breaches: self.response_breaches,
            resolution_breaches: self.resolution_breaches,
            both_breaches: self.both_breaches,
            avg_response_hours: if self.response_count > 0 {
                self.response_sum / self.response_count as f64
            } else {
                0.0
            },
            avg_resolution_hours: if self.resolution_count > 0 {
                self.resolution_sum / self.resolution_count as f64
            } else {
                0.0
            },
            response_compliance,
            resolution_compliance,
            overall_compliance,
            tier: PerformanceTier::from_rate(overall_compliance),
        }
    }
}

/// Group the classified set by one dimension. Output is sorted by group key
/// for deterministic ordering regardless of hash iteration.
pub fn aggregate_by(tickets: &[ClassifiedTicket], dimension: Dimension) -> Vec<GroupCompliance> {
    let mut groups: HashMap<String, Accumulator> = HashMap::new();
    for ticket in tickets {
        groups.entry(dimension.key_of(ticket)).or_default().push(ticket);
    }
    let mut out: Vec<GroupCompliance> = groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect();
    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}

fn rank(
    groups: &[GroupCompliance],
    cmp: impl Fn(&GroupCompliance, &GroupCompliance) -> Ordering,
) -> Vec<GroupCompliance> {
    let mut ranked: Vec<GroupCompliance> = groups
        .iter()
        .filter(|g| g.total_tickets > 0)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| cmp(a, b).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(RANKING_LIMIT);
    ranked
}

/// Best performers: highest overall compliance first.
pub fn top_performers(groups: &[GroupCompliance]) -> Vec<GroupCompliance> {
    rank(groups, |a, b| {
        b.overall_compliance
            .partial_cmp(&a.overall_compliance)
            .unwrap_or(Ordering::Equal)
    })
}

/// Needs attention: lowest overall compliance first.
pub fn needs_attention(groups: &[GroupCompliance]) -> Vec<GroupCompliance> {
    rank(groups, |a, b| {
        a.overall_compliance
            .partial_cmp(&b.overall_compliance)
            .unwrap_or(Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{BreachDetermination, BreachSeverity, SlaEvaluation};
    use crate::policy::ResolvedPolicy;
    use chrono::{Duration, TimeZone, Utc};
    use servicedesk_shared::{Priority, TicketStatus};
    use uuid::Uuid;

    fn classified(branch: &str, resolution_breached: bool) -> ClassifiedTicket {
        let t = Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap();
        ClassifiedTicket {
            ticket_id: Uuid::new_v4(),
            ticket_number: "TKT-1".to_string(),
            priority: Priority::Medium,
            status: TicketStatus::Resolved,
            created_at: t,
            first_response_at: Some(t + Duration::hours(1)),
            resolved_at: Some(t + Duration::hours(4)),
            service_name: Some("Email".to_string()),
            category_name: None,
            support_group_name: None,
            branch_name: Some(branch.to_string()),
            technician_name: None,
            policy: ResolvedPolicy {
                response_hours: 4.0,
                resolution_hours: 24.0,
                business_hours_only: false,
            },
            evaluation: SlaEvaluation {
                sla_start: t,
                actual_response_hours: 1.0,
                actual_resolution_hours: 4.0,
                actual_assignment_hours: 0.0,
                response: BreachDetermination::Historical(false),
                resolution: BreachDetermination::Historical(resolution_breached),
                severity: if resolution_breached {
                    BreachSeverity::Moderate
                } else {
                    BreachSeverity::None
                },
            },
        }
    }

    #[test]
    fn vacuous_group_is_fully_compliant() {
        assert_eq!(compliance_rate(0, 0), 100.0);
        assert_eq!(PerformanceTier::from_rate(compliance_rate(0, 0)), PerformanceTier::Excellent);
    }

    #[test]
    fn tier_boundaries_are_closed() {
        assert_eq!(PerformanceTier::from_rate(90.0), PerformanceTier::Excellent);
        assert_eq!(PerformanceTier::from_rate(89.9), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_rate(75.0), PerformanceTier::Good);
        assert_eq!(PerformanceTier::from_rate(74.9), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_rate(60.0), PerformanceTier::Fair);
        assert_eq!(PerformanceTier::from_rate(59.9), PerformanceTier::Poor);
    }

    #[test]
    fn groups_count_breaches_and_average_hours() {
        let tickets = vec![
            classified("Manado", false),
            classified("Manado", true),
            classified("Bitung", false),
        ];
        let groups = aggregate_by(&tickets, Dimension::Branch);
        assert_eq!(groups.len(), 2);
        // Sorted by key: Bitung first.
        assert_eq!(groups[0].key, "Bitung");
        assert_eq!(groups[0].total_tickets, 1);
        assert_eq!(groups[0].overall_compliance, 100.0);

        let manado = &groups[1];
        assert_eq!(manado.total_tickets, 2);
        assert_eq!(manado.resolution_breaches, 1);
        assert_eq!(manado.response_breaches, 0);
        assert_eq!(manado.both_breaches, 0);
        // response 100, resolution 50 -> overall 75 -> Good.
        assert_eq!(manado.overall_compliance, 75.0);
        assert_eq!(manado.tier, PerformanceTier::Good);
        assert!((manado.avg_resolution_hours - 4.0).abs() < 1e-9);
    }

    #[test]
    fn in_flight_legs_do_not_dilute_averages() {
        let mut open = classified("Manado", false);
        open.status = TicketStatus::InProgress;
        open.first_response_at = None;
        open.resolved_at = None;
        open.evaluation.response = BreachDetermination::InFlight(false);
        open.evaluation.resolution = BreachDetermination::InFlight(false);
        open.evaluation.actual_resolution_hours = 2.0;
        let tickets = vec![classified("Manado", false), open];
        let groups = aggregate_by(&tickets, Dimension::Branch);
        // Only the resolved ticket contributes to the average.
        assert!((groups[0].avg_resolution_hours - 4.0).abs() < 1e-9);
    }

    #[test]
    fn rankings_sort_and_slice_deterministically() {
        let mut tickets = Vec::new();
        // Manado: 0 of 1 breached; Bitung: 1 of 1 breached.
        tickets.push(classified("Manado", false));
        tickets.push(classified("Bitung", true));
        let groups = aggregate_by(&tickets, Dimension::Branch);
        let best = top_performers(&groups);
        assert_eq!(best[0].key, "Manado");
        let worst = needs_attention(&groups);
        assert_eq!(worst[0].key, "Bitung");
    }

    #[test]
    fn ranking_tie_breaks_by_key() {
        let tickets = vec![classified("B", false), classified("A", false)];
        let groups = aggregate_by(&tickets, Dimension::Branch);
        let best = top_performers(&groups);
        assert_eq!(best[0].key, "A");
        assert_eq!(best[1].key, "B");
    }
}
