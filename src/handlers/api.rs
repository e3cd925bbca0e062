use std::convert::Infallible;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use warp::{Filter, Reply};

use crate::handlers::command::SchedulerEngine;
use crate::models::command::CommandOutcome;
use crate::models::event::CalendarEvent;
use crate::service::calendar::CalendarClient;

pub const WELCOME_MESSAGE: &str = "Welcome to the Executive Assistant AI!";

/// The events endpoint lists the next few upcoming events, matching the
/// calendar provider's own "upcoming" view.
const UPCOMING_LIMIT: usize = 10;
const UPCOMING_WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<SchedulerEngine>,
    pub calendar: Arc<dyn CalendarClient>,
    pub default_user: String,
    pub timezone: Tz,
}

#[derive(Debug, Deserialize)]
pub struct ParseCommandRequest {
    pub command: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
}

/// Response body for /parse-command. The caller branches on which keys
/// are present, so unset fields must stay out of the JSON entirely.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct CommandResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CreateEventResponse {
    fn created(event_id: String) -> Self {
        Self {
            success: true,
            event_id: Some(event_id),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            event_id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
struct WelcomeResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct EventsResponse {
    events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn command_response(outcome: CommandOutcome) -> CommandResponse {
    match outcome {
        CommandOutcome::EventCreated { event_id, message } => CommandResponse {
            success: Some(true),
            event_id: Some(event_id),
            message: Some(message),
            ..Default::default()
        },
        CommandOutcome::Summary(summary) => CommandResponse {
            summary: Some(summary),
            ..Default::default()
        },
        CommandOutcome::Question(question) => CommandResponse {
            message: Some(question),
            ..Default::default()
        },
        CommandOutcome::Message(message) => CommandResponse {
            message: Some(message),
            ..Default::default()
        },
        CommandOutcome::Error(error) => CommandResponse {
            error: Some(error),
            ..Default::default()
        },
    }
}

pub fn routes(
    ctx: ApiContext,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let with_ctx = {
        let ctx = ctx.clone();
        warp::any().map(move || ctx.clone())
    };

    let welcome = warp::path::end().and(warp::get()).map(|| {
        warp::reply::json(&WelcomeResponse {
            message: WELCOME_MESSAGE,
        })
    });

    let events = warp::path("events")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_ctx.clone())
        .and_then(list_upcoming);

    let parse_command = warp::path("parse-command")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_ctx.clone())
        .and_then(parse_command);

    let create_event = warp::path("create-event")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(with_ctx)
        .and_then(create_event);

    welcome.or(events).or(parse_command).or(create_event)
}

async fn list_upcoming(ctx: ApiContext) -> Result<impl Reply, Infallible> {
    let now = Utc::now();
    let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
    match ctx.calendar.list_events(now, horizon).await {
        Ok(events) => {
            let events: Vec<CalendarEvent> = events.into_iter().take(UPCOMING_LIMIT).collect();
            Ok(warp::reply::json(&EventsResponse { events }))
        }
        Err(e) => Ok(warp::reply::json(&ErrorResponse {
            error: format!("Failed to fetch calendar events: {}", e),
        })),
    }
}

async fn parse_command(
    request: ParseCommandRequest,
    ctx: ApiContext,
) -> Result<impl Reply, Infallible> {
    let user_id = request.user_id.unwrap_or_else(|| ctx.default_user.clone());
    let outcome = ctx.engine.handle_command(&user_id, &request.command).await;
    Ok(warp::reply::json(&command_response(outcome)))
}

async fn create_event(
    request: CreateEventRequest,
    ctx: ApiContext,
) -> Result<impl Reply, Infallible> {
    let start = match DateTime::parse_from_rfc3339(&request.start_time) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            return Ok(warp::reply::json(&CreateEventResponse::failed(format!(
                "unusable start_time: {}",
                e
            ))));
        }
    };
    let end = match DateTime::parse_from_rfc3339(&request.end_time) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            return Ok(warp::reply::json(&CreateEventResponse::failed(format!(
                "unusable end_time: {}",
                e
            ))));
        }
    };
    if end <= start {
        return Ok(warp::reply::json(&CreateEventResponse::failed(
            "start_time must come before end_time".to_string(),
        )));
    }

    match ctx
        .calendar
        .insert_event(&request.summary, start, end, ctx.timezone)
        .await
    {
        Ok(event_id) => Ok(warp::reply::json(&CreateEventResponse::created(event_id))),
        Err(e) => Ok(warp::reply::json(&CreateEventResponse::failed(e.to_string()))),
    }
}
