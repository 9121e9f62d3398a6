//! Policy resolver.
//!
//! Effective response/resolution targets come from the service when it
//! specifies them, field by field, with a priority-based fallback for
//! anything left unset. Resolution is total: every priority has a fallback,
//! so there is no error case.

use serde::{Deserialize, Serialize};
use servicedesk_shared::{Priority, ServicePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlaTarget {
    pub response_hours: f64,
    pub resolution_hours: f64,
}

/// Priority-to-target defaults, passed explicitly so tests can substitute
/// alternate tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityFallbackTable {
    pub critical: SlaTarget,
    pub high: SlaTarget,
    pub medium: SlaTarget,
    pub low: SlaTarget,
}

impl Default for PriorityFallbackTable {
    fn default() -> Self {
        Self {
            critical: SlaTarget {
                response_hours: 1.0,
                resolution_hours: 4.0,
            },
            high: SlaTarget {
                response_hours: 2.0,
                resolution_hours: 8.0,
            },
            medium: SlaTarget {
                response_hours: 4.0,
                resolution_hours: 24.0,
            },
            low: SlaTarget {
                response_hours: 8.0,
                resolution_hours: 72.0,
            },
        }
    }
}

impl PriorityFallbackTable {
    pub fn target_for(&self, priority: Priority) -> SlaTarget {
        match priority {
            Priority::Critical => self.critical,
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

/// The effective targets for one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    pub response_hours: f64,
    pub resolution_hours: f64,
    pub business_hours_only: bool,
}

/// Resolve the effective policy for a ticket's service and priority.
///
/// A combined `sla_hours` on the service stands in for `resolution_hours`
/// when the latter is unset. `business_hours_only` comes straight from the
/// service; no service means wall-clock.
pub fn resolve_policy(
    service: Option<&ServicePolicy>,
    priority: Priority,
    fallback: &PriorityFallbackTable,
) -> ResolvedPolicy {
    let defaults = fallback.target_for(priority);
    ResolvedPolicy {
        response_hours: service
            .and_then(|s| s.response_hours)
            .unwrap_or(defaults.response_hours),
        resolution_hours: service
            .and_then(|s| s.resolution_hours.or(s.sla_hours))
            .unwrap_or(defaults.resolution_hours),
        business_hours_only: service.map(|s| s.business_hours_only).unwrap_or(false),
    }
}
