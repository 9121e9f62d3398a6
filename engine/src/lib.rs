//! SLA tracking and breach compliance engine.
//!
//! A read-only, stateless computation over a snapshot of ticket records:
//! resolves the effective SLA policy per ticket, measures consumed clock
//! time with pause/resume and business-hours semantics, classifies response
//! and resolution breaches, and aggregates compliance statistics across
//! services, technicians, branches, categories, and time windows.
//!
//! The engine is invoked, not exposed: it consumes the plain projections in
//! `servicedesk-shared` and produces JSON-serializable report shapes. The
//! ticket fetch, filtering, and any persistence belong to upstream
//! collaborators.

pub mod calendar;
pub mod classifier;
pub mod dimensions;
pub mod elapsed;
mod error;
pub mod policy;
pub mod report;
pub mod temporal;

pub use calendar::BusinessCalendar;
pub use classifier::{
    classify, classify_all, BreachDetermination, BreachSeverity, ClassifiedTicket, SlaEvaluation,
};
pub use dimensions::{
    aggregate_by, compliance_rate, needs_attention, top_performers, Dimension, GroupCompliance,
    PerformanceTier,
};
pub use elapsed::{elapsed_hours, sla_start_of, ElapsedMode, SlaClock};
pub use error::{EngineWarning, ReportError};
pub use policy::{resolve_policy, PriorityFallbackTable, ResolvedPolicy, SlaTarget};
pub use report::{
    build_compliance_report, evaluate_ticket, ComplianceReport, ComplianceSummary,
    DimensionGroupReport, TemporalReport, TicketEvaluationReport,
};
pub use temporal::{monthly_trend, BreachHistograms, MonthlyTrendPoint};
