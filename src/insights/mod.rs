//! Read-only views derived from an organization's agreements.

pub mod calendar;
pub mod metrics;

pub use calendar::{CalendarEvent, CalendarEventKind, calendar_events, events_for_agreement};
pub use metrics::{AgreementMetrics, organization_metrics};
