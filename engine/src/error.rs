use thiserror::Error;

/// Recoverable conditions surfaced alongside report output.
///
/// The calculators themselves are total functions: every input combination
/// (missing timestamps, zero-ticket groups, unset policy fields) has a
/// defined fallback, so reports never fail for incomplete tickets. The only
/// condition worth telling the caller about is a configuration
/// inconsistency, and even that downgrades to a safe default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineWarning {
    #[error(
        "service '{service}' requests business-hours SLA tracking but no business calendar is configured; using wall-clock"
    )]
    MissingBusinessCalendar { service: String },
}

/// Failures of the report orchestration layer.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
