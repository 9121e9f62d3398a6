//! Report orchestration and the JSON serialization boundary.
//!
//! All numeric rates leave the engine rounded to one decimal place; every
//! intermediate computation stays full precision so rounding error cannot
//! compound across aggregations. The dimension and temporal passes run
//! concurrently over the same immutable classified slice; ordering inside
//! each output list is deterministic and applied sequentially after the
//! parallel work completes.

use std::sync::Arc;

use chrono::{DateTime, Offset, Utc};
use serde::Serialize;
use servicedesk_shared::{ServicePolicy, SlaTicket, SlaTrackingRecord};

use crate::calendar::BusinessCalendar;
use crate::classifier::{classify, BreachSeverity, ClassifiedTicket};
use crate::dimensions::{
    aggregate_by, compliance_rate, needs_attention, top_performers, Dimension, GroupCompliance,
    PerformanceTier,
};
use crate::error::{EngineWarning, ReportError};
use crate::policy::PriorityFallbackTable;
use crate::temporal::{monthly_trend, BreachHistograms, MonthlyTrendPoint, DAY_NAMES, DEFAULT_TREND_MONTHS};

/// One-decimal rounding, applied only at this boundary.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Single-ticket evaluation shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEvaluationReport {
    pub sla_start: DateTime<Utc>,
    pub actual_response_hours: f64,
    pub actual_resolution_hours: f64,
    pub response_breached: bool,
    pub resolution_breached: bool,
    /// True when the matching breach flag is a live projection, not a
    /// durable fact.
    pub response_in_flight: bool,
    pub resolution_in_flight: bool,
    pub breach_severity: BreachSeverity,
}

impl TicketEvaluationReport {
    pub fn from_classified(ticket: &ClassifiedTicket) -> Self {
        let eval = &ticket.evaluation;
        Self {
            sla_start: eval.sla_start,
            actual_response_hours: round1(eval.actual_response_hours),
            actual_resolution_hours: round1(eval.actual_resolution_hours),
            response_breached: eval.response.breached(),
            resolution_breached: eval.resolution.breached(),
            response_in_flight: eval.response.is_in_flight(),
            resolution_in_flight: eval.resolution.is_in_flight(),
            breach_severity: eval.severity,
        }
    }
}

/// Evaluate one ticket for the detail view. Same calculators as the bulk
/// reports, so the numbers can never disagree between screens.
pub fn evaluate_ticket(
    ticket: &SlaTicket,
    service: Option<&ServicePolicy>,
    tracking: Option<&SlaTrackingRecord>,
    fallback: &PriorityFallbackTable,
    calendar: Option<&BusinessCalendar>,
    now: DateTime<Utc>,
) -> TicketEvaluationReport {
    let (classified, _warning) = classify(ticket, service, tracking, fallback, calendar, now);
    TicketEvaluationReport::from_classified(&classified)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachCounts {
    pub response: u64,
    pub resolution: u64,
    pub both: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceMetrics {
    pub response_compliance: f64,
    pub resolution_compliance: f64,
    pub overall_compliance: f64,
    pub avg_response_hours: f64,
    pub avg_resolution_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceLabel {
    pub status: &'static str,
    pub color_hint: &'static str,
}

/// One group of a dimension report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionGroupReport {
    pub group_key: String,
    pub total_tickets: u64,
    pub breaches: BreachCounts,
    pub metrics: ComplianceMetrics,
    pub performance: PerformanceLabel,
}

impl From<&GroupCompliance> for DimensionGroupReport {
    fn from(group: &GroupCompliance) -> Self {
        Self {
            group_key: group.key.clone(),
            total_tickets: group.total_tickets,
            breaches: BreachCounts {
                response: group.response_breaches,
                resolution: group.resolution_breaches,
                both: group.both_breaches,
            },
            metrics: ComplianceMetrics {
                response_compliance: round1(group.response_compliance),
                resolution_compliance: round1(group.resolution_compliance),
                overall_compliance: round1(group.overall_compliance),
                avg_response_hours: round1(group.avg_response_hours),
                avg_resolution_hours: round1(group.avg_resolution_hours),
            },
            performance: PerformanceLabel {
                status: group.tier.as_str(),
                color_hint: group.tier.color_hint(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporalReport {
    pub by_hour: [u32; 24],
    pub by_day_of_week: [u32; 7],
    pub monthly_trend: Vec<MonthlyTrendPoint>,
    pub peak_breach_hour: u32,
    pub peak_breach_day: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub total_tickets: u64,
    pub response_breaches: u64,
    pub resolution_breaches: u64,
    pub total_breaches: u64,
    pub response_compliance_rate: f64,
    pub resolution_compliance_rate: f64,
    pub overall_compliance_rate: f64,
    pub avg_response_hours: f64,
    pub avg_resolution_hours: f64,
    pub current_active_breaches: u64,
    pub compliance_status: &'static str,
}

/// The full compliance report consumed by the dashboards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub summary: ComplianceSummary,
    pub by_service: Vec<DimensionGroupReport>,
    pub by_technician: Vec<DimensionGroupReport>,
    pub by_branch: Vec<DimensionGroupReport>,
    pub by_category: Vec<DimensionGroupReport>,
    pub by_support_group: Vec<DimensionGroupReport>,
    pub by_priority: Vec<DimensionGroupReport>,
    pub top_performers: Vec<DimensionGroupReport>,
    pub needs_attention: Vec<DimensionGroupReport>,
    pub temporal: TemporalReport,
    pub warnings: Vec<String>,
}

/// Build the full report. The per-dimension passes and the temporal pass
/// fan out over worker threads; they only read the shared classified slice
/// and merge by append, so no ordering is needed between them.
pub async fn build_compliance_report(
    classified: Vec<ClassifiedTicket>,
    warnings: Vec<EngineWarning>,
    calendar: Option<BusinessCalendar>,
    now: DateTime<Utc>,
) -> Result<ComplianceReport, ReportError> {
    let tickets: Arc<[ClassifiedTicket]> = Arc::from(classified);
    let offset = calendar
        .as_ref()
        .map(|c| c.offset())
        .unwrap_or_else(|| Utc.fix());

    let pass = |dimension: Dimension| {
        let tickets = Arc::clone(&tickets);
        tokio::task::spawn_blocking(move || aggregate_by(&tickets, dimension))
    };
    let services = pass(Dimension::Service);
    let technicians = pass(Dimension::Technician);
    let branches = pass(Dimension::Branch);
    let categories = pass(Dimension::Category);
    let support_groups = pass(Dimension::SupportGroup);
    let priorities = pass(Dimension::Priority);
    let temporal = {
        let tickets = Arc::clone(&tickets);
        tokio::task::spawn_blocking(move || {
            let histograms = BreachHistograms::collect(&tickets, offset);
            let trend = monthly_trend(&tickets, DEFAULT_TREND_MONTHS, now, offset);
            (histograms, trend)
        })
    };

    let (services, technicians, branches, categories, support_groups, priorities, temporal) = tokio::join!(
        services,
        technicians,
        branches,
        categories,
        support_groups,
        priorities,
        temporal
    );
    let services = services?;
    let technicians = technicians?;
    let branches = branches?;
    let categories = categories?;
    let support_groups = support_groups?;
    let priorities = priorities?;
    let (histograms, trend) = temporal?;

    // Rankings and presentation rounding are sequential, after the merge.
    let top_performers = top_performers(&services);
    let needs_attention = needs_attention(&services);

    Ok(ComplianceReport {
        summary: summarize(&tickets),
        by_service: to_reports(&services),
        by_technician: to_reports(&technicians),
        by_branch: to_reports(&branches),
        by_category: to_reports(&categories),
        by_support_group: to_reports(&support_groups),
        by_priority: to_reports(&priorities),
        top_performers: to_reports(&top_performers),
        needs_attention: to_reports(&needs_attention),
        temporal: TemporalReport {
            peak_breach_hour: histograms.peak_hour() as u32,
            peak_breach_day: DAY_NAMES[histograms.peak_day()],
            by_hour: histograms.by_hour,
            by_day_of_week: histograms.by_day_of_week,
            monthly_trend: trend
                .into_iter()
                .map(|mut point| {
                    point.compliance_rate = round1(point.compliance_rate);
                    point
                })
                .collect(),
        },
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
    })
}

fn to_reports(groups: &[GroupCompliance]) -> Vec<DimensionGroupReport> {
    groups.iter().map(DimensionGroupReport::from).collect()
}

fn summarize(tickets: &[ClassifiedTicket]) -> ComplianceSummary {
    let total = tickets.len() as u64;
    let mut response_breaches = 0u64;
    let mut resolution_breaches = 0u64;
    let mut total_breaches = 0u64;
    let mut current_active_breaches = 0u64;
    let mut response_sum = 0.0;
    let mut response_count = 0u64;
    let mut resolution_sum = 0.0;
    let mut resolution_count = 0u64;

    for ticket in tickets {
        let response = ticket.evaluation.response.breached();
        let resolution = ticket.evaluation.resolution.breached();
        if response {
            response_breaches += 1;
        }
        if resolution {
            resolution_breaches += 1;
        }
        if response || resolution {
            total_breaches += 1;
            if !ticket.status.is_settled() {
                current_active_breaches += 1;
            }
        }
        if ticket.first_response_at.is_some() {
            response_sum += ticket.evaluation.actual_response_hours;
            response_count += 1;
        }
        if ticket.resolved_at.is_some() {
            resolution_sum += ticket.evaluation.actual_resolution_hours;
            resolution_count += 1;
        }
    }

    let overall = compliance_rate(total, total_breaches);
    ComplianceSummary {
        total_tickets: total,
        response_breaches,
        resolution_breaches,
        total_breaches,
        response_compliance_rate: round1(compliance_rate(total, response_breaches)),
        resolution_compliance_rate: round1(compliance_rate(total, resolution_breaches)),
        overall_compliance_rate: round1(overall),
        avg_response_hours: if response_count > 0 {
            round1(response_sum / response_count as f64)
        } else {
            0.0
        },
        avg_resolution_hours: if resolution_count > 0 {
            round1(resolution_sum / resolution_count as f64)
        } else {
            0.0
        },
        current_active_breaches,
        compliance_status: PerformanceTier::from_rate(overall).as_str(),
    }
}
