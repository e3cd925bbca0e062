use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::{Tz, UTC};
use scheduleBot::handlers::command::SchedulerEngine;
use scheduleBot::models::command::CommandOutcome;
use scheduleBot::models::event::CalendarEvent;
use scheduleBot::service::calendar::CalendarClient;
use scheduleBot::service::oracle::OracleClient;
use scheduleBot::service::pending_store::InMemoryPendingStore;
use scheduleBot::service::timezone::ConfiguredTimezones;
use tokio::sync::Mutex;

struct FakeOracle {
    responses: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
}

impl FakeOracle {
    fn scripted(script: &[(&str, Result<&str, &str>)]) -> Arc<Self> {
        let mut responses: HashMap<String, VecDeque<Result<String, String>>> = HashMap::new();
        for (prompt_type, response) in script {
            responses
                .entry(prompt_type.to_string())
                .or_default()
                .push_back(response.map(str::to_string).map_err(str::to_string));
        }
        Arc::new(Self {
            responses: Mutex::new(responses),
        })
    }
}

#[async_trait::async_trait]
impl OracleClient for FakeOracle {
    async fn generate_prompt(
        &self,
        _prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        match self
            .responses
            .lock()
            .await
            .get_mut(prompt_type)
            .and_then(|queue| queue.pop_front())
        {
            Some(Ok(body)) => Ok(body),
            Some(Err(err)) => Err(err.into()),
            None => Err(format!("no scripted response for {}", prompt_type).into()),
        }
    }
}

struct FakeCalendar {
    events: Vec<CalendarEvent>,
    list_calls: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl FakeCalendar {
    fn with_events(events: Vec<CalendarEvent>) -> Arc<Self> {
        Arc::new(Self {
            events,
            list_calls: Mutex::new(Vec::new()),
        })
    }

    async fn last_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        self.list_calls
            .lock()
            .await
            .last()
            .copied()
            .expect("list_events was called")
    }
}

#[async_trait::async_trait]
impl CalendarClient for FakeCalendar {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, Box<dyn std::error::Error + Send + Sync>> {
        self.list_calls.lock().await.push((time_min, time_max));
        Ok(self
            .events
            .iter()
            .filter(|e| e.overlaps(time_min, time_max))
            .cloned()
            .collect())
    }

    async fn insert_event(
        &self,
        _summary: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _timezone: Tz,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Err("read-only fixture".to_string().into())
    }
}

fn engine_with(oracle: Arc<FakeOracle>, calendar: Arc<FakeCalendar>) -> SchedulerEngine {
    SchedulerEngine::new(
        oracle,
        calendar,
        Arc::new(InMemoryPendingStore::new()),
        Arc::new(ConfiguredTimezones::new(UTC)),
    )
}

fn event(id: &str, summary: &str, start: DateTime<Utc>, minutes: i64) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        summary: summary.to_string(),
        start,
        end: start + Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn empty_range_yields_the_no_meetings_message() {
    let oracle = FakeOracle::scripted(&[
        ("intent", Ok("meeting_summary")),
        ("summary_range", Ok("{}")),
    ]);
    let calendar = FakeCalendar::with_events(Vec::new());
    let engine = engine_with(oracle, calendar);

    let outcome = engine.handle_command("u1", "summarize last week").await;

    assert_eq!(
        outcome,
        CommandOutcome::Summary("You had no meetings in that period.".to_string())
    );
}

#[tokio::test]
async fn oracle_range_takes_precedence_and_is_end_inclusive() {
    let oracle = FakeOracle::scripted(&[
        ("intent", Ok("meeting_summary")),
        (
            "summary_range",
            Ok(r#"{"start_date":"2026-03-09","end_date":"2026-03-15"}"#),
        ),
        ("meeting_summary", Ok("A quiet week with one design review.")),
    ]);
    let calendar = FakeCalendar::with_events(vec![event(
        "e1",
        "design review",
        Utc.with_ymd_and_hms(2026, 3, 10, 14, 0, 0).unwrap(),
        60,
    )]);
    let engine = engine_with(oracle, calendar.clone());

    let outcome = engine.handle_command("u1", "summarize that week").await;

    assert_eq!(
        outcome,
        CommandOutcome::Summary("A quiet week with one design review.".to_string())
    );
    let (time_min, time_max) = calendar.last_window().await;
    assert_eq!(time_min, Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap());
    // End date is inclusive, so the window closes at midnight after it.
    assert_eq!(time_max, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
}

#[tokio::test]
async fn narration_failure_falls_back_to_a_listing() {
    let oracle = FakeOracle::scripted(&[
        ("intent", Ok("meeting_summary")),
        (
            "summary_range",
            Ok(r#"{"start_date":"2026-03-09","end_date":"2026-03-15"}"#),
        ),
        ("meeting_summary", Err("model overloaded")),
    ]);
    let calendar = FakeCalendar::with_events(vec![
        event(
            "e1",
            "standup",
            Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
            15,
        ),
        event(
            "e2",
            "design review",
            Utc.with_ymd_and_hms(2026, 3, 11, 14, 0, 0).unwrap(),
            60,
        ),
    ]);
    let engine = engine_with(oracle, calendar);

    let outcome = engine.handle_command("u1", "summarize that week").await;

    match outcome {
        CommandOutcome::Summary(text) => {
            assert!(text.contains("standup"));
            assert!(text.contains("design review"));
            assert!(text.contains("1)"));
        }
        other => panic!("expected Summary, got {:?}", other),
    }
}

#[tokio::test]
async fn availability_defaults_to_a_single_day_window() {
    let oracle = FakeOracle::scripted(&[
        ("intent", Ok("datetime_query")),
        ("summary_range", Err("offline")),
    ]);
    let calendar = FakeCalendar::with_events(Vec::new());
    let engine = engine_with(oracle, calendar.clone());

    let outcome = engine.handle_command("u1", "when am I free?").await;

    match outcome {
        CommandOutcome::Message(message) => assert!(message.contains("free")),
        other => panic!("expected Message, got {:?}", other),
    }
    let (time_min, time_max) = calendar.last_window().await;
    assert_eq!(time_max - time_min, Duration::days(1));
}

#[tokio::test]
async fn availability_honors_period_phrases_when_the_oracle_is_down() {
    let oracle = FakeOracle::scripted(&[
        ("intent", Ok("datetime_query")),
        ("summary_range", Err("offline")),
        ("availability", Ok("Tuesday afternoon is packed.")),
    ]);
    let calendar = FakeCalendar::with_events(vec![event(
        "e1",
        "all hands",
        Utc::now() + Duration::days(7),
        60,
    )]);
    let engine = engine_with(oracle, calendar.clone());

    let outcome = engine.handle_command("u1", "am I busy next week?").await;

    match outcome {
        CommandOutcome::Message(message) => {
            assert_eq!(message, "Tuesday afternoon is packed.");
        }
        other => panic!("expected Message, got {:?}", other),
    }
    let (time_min, time_max) = calendar.last_window().await;
    assert_eq!(time_max - time_min, Duration::days(7));
    assert!(time_min > Utc::now() - Duration::days(8));
}

#[tokio::test]
async fn summary_narration_uses_the_oracle_text() {
    let oracle = FakeOracle::scripted(&[
        ("intent", Ok("meeting_summary")),
        ("summary_range", Ok("{}")),
        (
            "meeting_summary",
            Ok("You spent most of the week in reviews."),
        ),
    ]);
    let calendar = FakeCalendar::with_events(vec![event(
        "e1",
        "review marathon",
        Utc::now(),
        120,
    )]);
    let engine = engine_with(oracle, calendar);

    let outcome = engine.handle_command("u1", "summarize this week").await;

    assert_eq!(
        outcome,
        CommandOutcome::Summary("You spent most of the week in reviews.".to_string())
    );
}
