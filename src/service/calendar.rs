use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::event::CalendarEvent;

/// Calendar backend seam. Implementations return events overlapping the
/// window, ordered by start time ascending.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, Box<dyn std::error::Error + Send + Sync>>;

    async fn insert_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: Tz,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// Calendar held entirely in process memory. Useful for demos and for
/// running without Google credentials.
pub struct InMemoryCalendar {
    events: Mutex<Vec<CalendarEvent>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }
}

impl Default for InMemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarClient for InMemoryCalendar {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, Box<dyn std::error::Error + Send + Sync>> {
        let events = self.events.lock().await;
        let mut found: Vec<CalendarEvent> = events
            .iter()
            .filter(|e| e.overlaps(time_min, time_max))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.start);
        Ok(found)
    }

    async fn insert_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _timezone: Tz,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let id = Uuid::new_v4().to_string();
        let mut events = self.events.lock().await;
        events.push(CalendarEvent {
            id: id.clone(),
            summary: summary.to_string(),
            start,
            end,
        });
        Ok(id)
    }
}
