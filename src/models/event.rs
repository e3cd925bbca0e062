use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchedulerError;

/// A calendar event as the external provider reports it. This core only
/// reads events and appends new ones; it never edits or deletes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarEvent {
    /// Overlap against a half-open window `[time_min, time_max)`.
    pub fn overlaps(&self, time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> bool {
        self.end > time_min && self.start < time_max
    }
}

/// Raw event fields as the extraction oracle returns them. Any field the
/// oracle could not determine comes back null.
#[derive(Debug, Deserialize)]
pub struct EventExtraction {
    pub title: Option<String>,
    pub start: Option<String>,
    pub duration_minutes: Option<i64>,
}

/// A fully validated target window for a new event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventWindow {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl EventExtraction {
    /// Validate that every required field is present and usable. Extraction
    /// gaps are user-facing errors, not retried.
    pub fn into_window(self) -> Result<EventWindow, SchedulerError> {
        let title = match self.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                return Err(SchedulerError::IncompleteExtraction(
                    "no event title could be determined".to_string(),
                ));
            }
        };
        let Some(raw_start) = self.start else {
            return Err(SchedulerError::IncompleteExtraction(format!(
                "no start time could be determined for \"{}\"",
                title
            )));
        };
        let start = DateTime::parse_from_rfc3339(&raw_start)
            .map_err(|e| {
                SchedulerError::IncompleteExtraction(format!(
                    "unusable start time {:?}: {}",
                    raw_start, e
                ))
            })?
            .with_timezone(&Utc);
        let duration_minutes = match self.duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            Some(minutes) => {
                return Err(SchedulerError::IncompleteExtraction(format!(
                    "unusable duration of {} minutes",
                    minutes
                )));
            }
            None => {
                return Err(SchedulerError::IncompleteExtraction(
                    "no duration could be determined".to_string(),
                ));
            }
        };
        Ok(EventWindow {
            title,
            start,
            end: start + Duration::minutes(duration_minutes),
            duration_minutes,
        })
    }
}

/// Inclusive date range as the summary-range oracle returns it.
#[derive(Debug, Deserialize)]
pub struct RangeExtraction {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl RangeExtraction {
    /// Both dates, when both parse and are ordered; otherwise None and the
    /// caller falls back to the phrase rule table.
    pub fn dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::parse_from_str(self.start_date.as_deref()?, "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(self.end_date.as_deref()?, "%Y-%m-%d").ok()?;
        if start <= end { Some((start, end)) } else { None }
    }
}
