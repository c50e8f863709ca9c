use chrono::NaiveDate;

use crate::board::calendar::{calendar_events, events_in_month, CalendarEvent};
use crate::board::dashboard::{dashboard as summarize, DashboardSummary};
use crate::board::store::EntityStore;
use crate::session::Session;
use crate::utils::errors::ServiceError;

pub async fn dashboard(session: &Session, today: NaiveDate) -> Result<DashboardSummary, ServiceError> {
    let store = EntityStore::load(session.gateway(), session.user_id()).await?;
    Ok(summarize(store.projects(), store.tasks(), today))
}

/// Calendar events, optionally limited to one month.
pub async fn calendar(
    session: &Session,
    month: Option<(i32, u32)>,
) -> Result<Vec<CalendarEvent>, ServiceError> {
    if let Some((_, m)) = month {
        if !(1..=12).contains(&m) {
            return Err(ServiceError::ValidationError("Month must be between 1 and 12".to_string()));
        }
    }
    let store = EntityStore::load(session.gateway(), session.user_id()).await?;
    let events = calendar_events(store.tasks(), store.projects());
    Ok(match month {
        Some((year, month)) => events_in_month(events, year, month),
        None => events,
    })
}
