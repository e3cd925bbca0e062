use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::event::CalendarEvent;
use crate::service::oracle::OracleClient;

#[derive(Serialize)]
struct EventContext<'a> {
    summary: &'a str,
    start: String,
    end: String,
}

#[derive(Serialize)]
struct SummaryContext<'a> {
    timezone: &'a str,
    events: Vec<EventContext<'a>>,
}

#[derive(Serialize)]
struct AvailabilityContext<'a> {
    question: &'a str,
    timezone: &'a str,
    events: Vec<EventContext<'a>>,
}

/// Narrates calendar windows. The language model writes the prose; when
/// it fails or returns nothing, a plain listing goes out instead so the
/// reply is never empty.
pub struct SummaryService;

impl SummaryService {
    pub async fn build_summary<C: OracleClient + ?Sized>(
        events: &[CalendarEvent],
        timezone: Tz,
        oracle: &C,
    ) -> String {
        if events.is_empty() {
            return no_meetings_message();
        }

        let context = SummaryContext {
            timezone: timezone.name(),
            events: event_contexts(events, timezone),
        };
        let structured = match serde_json::to_string(&context) {
            Ok(v) => v,
            Err(_) => return listing_fallback(events, timezone),
        };

        match oracle.generate_prompt(&structured, "meeting_summary").await {
            Ok(body) if !body.trim().is_empty() => body,
            _ => listing_fallback(events, timezone),
        }
    }

    pub async fn build_availability<C: OracleClient + ?Sized>(
        question: &str,
        events: &[CalendarEvent],
        timezone: Tz,
        oracle: &C,
    ) -> String {
        if events.is_empty() {
            return "That time looks completely free on your calendar.".to_string();
        }

        let context = AvailabilityContext {
            question,
            timezone: timezone.name(),
            events: event_contexts(events, timezone),
        };
        let structured = match serde_json::to_string(&context) {
            Ok(v) => v,
            Err(_) => return booked_fallback(events, timezone),
        };

        match oracle.generate_prompt(&structured, "availability").await {
            Ok(body) if !body.trim().is_empty() => body,
            _ => booked_fallback(events, timezone),
        }
    }
}

fn event_contexts(events: &[CalendarEvent], timezone: Tz) -> Vec<EventContext<'_>> {
    events
        .iter()
        .map(|e| EventContext {
            summary: e.summary.as_str(),
            start: e.start.with_timezone(&timezone).to_rfc3339(),
            end: e.end.with_timezone(&timezone).to_rfc3339(),
        })
        .collect()
}

pub fn render_listing(events: &[CalendarEvent], timezone: Tz) -> String {
    let mut body = String::new();
    for (idx, event) in events.iter().enumerate() {
        let start = event.start.with_timezone(&timezone);
        let end = event.end.with_timezone(&timezone);
        body.push_str(&format!(
            "{}) {} ({} to {})\n",
            idx + 1,
            event.summary,
            start.format("%a %b %-d, %-I:%M %p"),
            end.format("%-I:%M %p"),
        ));
    }
    body.trim_end().to_string()
}

pub fn no_meetings_message() -> String {
    "You had no meetings in that period.".to_string()
}

fn listing_fallback(events: &[CalendarEvent], timezone: Tz) -> String {
    format!(
        "Here is what was on your calendar:\n{}",
        render_listing(events, timezone)
    )
}

fn booked_fallback(events: &[CalendarEvent], timezone: Tz) -> String {
    format!(
        "You already have these booked:\n{}",
        render_listing(events, timezone)
    )
}

/// Midnight of `date` in the user's timezone, as a UTC instant. Falls
/// back to UTC midnight when the local wall time does not exist.
pub fn local_midnight(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap();
    timezone
        .from_local_datetime(&naive)
        .single()
        .unwrap_or_else(|| timezone.from_utc_datetime(&naive))
        .with_timezone(&Utc)
}

/// Half-open date pair for a recognized relative period phrase. Weeks
/// start on Monday in the user's calendar.
pub fn period_phrase_dates(text: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let lower = text.to_lowercase();
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);

    if lower.contains("last week") {
        Some((monday - Duration::days(7), monday))
    } else if lower.contains("next week") {
        Some((monday + Duration::days(7), monday + Duration::days(14)))
    } else if lower.contains("this week") {
        Some((monday, monday + Duration::days(7)))
    } else if lower.contains("last month") {
        Some((first_of_previous_month(today), first_of_month(today)))
    } else if lower.contains("next month") {
        let next = first_of_next_month(today);
        Some((next, first_of_next_month(next)))
    } else if lower.contains("this month") {
        Some((first_of_month(today), first_of_next_month(today)))
    } else if lower.contains("yesterday") {
        Some((today - Duration::days(1), today))
    } else if lower.contains("tomorrow") {
        Some((today + Duration::days(1), today + Duration::days(2)))
    } else if lower.contains("today") {
        Some((today, today + Duration::days(1)))
    } else {
        None
    }
}

/// Turns a relative period phrase into a half-open UTC window. An
/// unrecognized phrase means the current week.
pub fn resolve_range_phrase(
    text: &str,
    today: NaiveDate,
    timezone: Tz,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let (start, end) =
        period_phrase_dates(text, today).unwrap_or((monday, monday + Duration::days(7)));
    (local_midnight(start, timezone), local_midnight(end, timezone))
}

/// Window for an explicit date pair. The end date is inclusive, so the
/// window closes at midnight after it.
pub fn range_from_dates(
    start: NaiveDate,
    end: NaiveDate,
    timezone: Tz,
) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        local_midnight(start, timezone),
        local_midnight(end + Duration::days(1), timezone),
    )
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

fn first_of_previous_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}
