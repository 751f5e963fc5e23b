use crate::store::{Agreement, AgreementStatus, SqliteStore};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const REVIEW_LEAD_DAYS: i64 = 7;
const RENEWAL_LEAD_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CalendarEventKind {
    Deadline,
    Review,
    Renewal,
}

impl CalendarEventKind {
    fn label(self) -> &'static str {
        match self {
            Self::Deadline => "Deadline",
            Self::Review => "Review",
            Self::Renewal => "Renewal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: CalendarEventKind,
}

impl CalendarEvent {
    fn new(agreement: &Agreement, kind: CalendarEventKind, date: DateTime<Utc>) -> Self {
        Self {
            id: format!("{kind}-{}", agreement.id),
            title: format!("{} - {}", agreement.title, kind.label()),
            date,
            kind,
        }
    }
}

/// Events derived from one agreement.
///
/// An expiry date yields a deadline on that date and a review a week
/// earlier. Signed agreements also get a renewal reminder thirty days
/// before expiry, or thirty days before `now` when no expiry is set.
pub fn events_for_agreement(agreement: &Agreement, now: DateTime<Utc>) -> Vec<CalendarEvent> {
    let mut events = Vec::new();
    if let Some(expires_at) = agreement.expires_at {
        events.push(CalendarEvent::new(agreement, CalendarEventKind::Deadline, expires_at));
        events.push(CalendarEvent::new(
            agreement,
            CalendarEventKind::Review,
            expires_at - Duration::days(REVIEW_LEAD_DAYS),
        ));
    }
    if agreement.status == AgreementStatus::Signed {
        let anchor = agreement.expires_at.unwrap_or(now);
        events.push(CalendarEvent::new(
            agreement,
            CalendarEventKind::Renewal,
            anchor - Duration::days(RENEWAL_LEAD_DAYS),
        ));
    }
    events
}

/// Calendar for an organization, ordered by date.
pub async fn calendar_events(
    store: &SqliteStore,
    organization_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>> {
    let agreements = store.list_agreements(organization_id).await?;
    let mut events: Vec<CalendarEvent> = agreements
        .iter()
        .flat_map(|agreement| events_for_agreement(agreement, now))
        .collect();
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    Ok(events)
}
