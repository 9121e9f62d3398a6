//! Shared domain types for the ServiceDesk SLA engine.
//!
//! These are projections of the ticket-storage collaborator's records: only
//! the fields the SLA engine needs for policy resolution, elapsed-time
//! arithmetic, and report grouping. Filtering (date range, branch scope,
//! role visibility) happens upstream before these types are built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ticket priority levels, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    Assigned,
    InProgress,
    OnHold,
    Resolved,
    Closed,
}

impl TicketStatus {
    /// A settled ticket no longer accrues SLA clock time; missing milestones
    /// on a settled ticket contribute nothing instead of an in-flight
    /// projection.
    pub fn is_settled(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

/// SLA-relevant projection of a ticket record.
///
/// Pause bookkeeping: `sla_paused_total_ms` accumulates closed pause
/// intervals and only ever grows; `sla_paused_at` marks the start of an
/// in-progress pause (at most one open pause per ticket).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaTicket {
    pub id: Uuid,
    pub ticket_number: String,
    pub title: String,
    pub priority: Priority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub sla_start_at: Option<DateTime<Utc>>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sla_paused_total_ms: i64,
    pub sla_paused_at: Option<DateTime<Utc>>,
    pub service_id: Option<Uuid>,
    // Display fields used only for report grouping, never for arithmetic.
    pub service_name: Option<String>,
    pub category_name: Option<String>,
    pub support_group_name: Option<String>,
    pub branch_name: Option<String>,
    pub branch_code: Option<String>,
    pub technician_name: Option<String>,
}

/// Per-service SLA configuration. Any field the service leaves unset falls
/// back to the priority table during policy resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicePolicy {
    pub id: Uuid,
    pub name: String,
    /// Combined target; used as the resolution target when
    /// `resolution_hours` is unset.
    pub sla_hours: Option<f64>,
    pub response_hours: Option<f64>,
    pub resolution_hours: Option<f64>,
    pub business_hours_only: bool,
    pub category_name: Option<String>,
    pub support_group_name: Option<String>,
}

/// Persisted SLA tracking record written by the breach-detection job at the
/// moment a breach was observed. When present, its breach flags are the
/// authoritative record of what was true at detection time and take
/// precedence over on-the-fly recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaTrackingRecord {
    pub ticket_id: Uuid,
    pub is_response_breached: bool,
    pub is_resolution_breached: bool,
    pub response_time: Option<DateTime<Utc>>,
    pub resolution_time: Option<DateTime<Utc>>,
}
