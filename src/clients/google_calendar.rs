use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::models::event::CalendarEvent;
use crate::service::calendar::CalendarClient;

pub const CALENDAR_TIMEOUT_SECS: u64 = 10;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

type ClientError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Serialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

#[derive(Debug, Serialize)]
struct InsertEventRequest {
    summary: String,
    start: EventDateTime,
    end: EventDateTime,
}

#[derive(Debug, Deserialize)]
struct InsertEventResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EventsListResponse {
    #[serde(default)]
    items: Vec<GoogleEvent>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    start: GoogleEventTime,
    end: GoogleEventTime,
}

// Timed events carry dateTime; all-day events carry date.
#[derive(Debug, Deserialize)]
struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

impl GoogleEventTime {
    fn resolve(&self) -> Option<DateTime<Utc>> {
        if let Some(raw) = &self.date_time {
            return DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }
        let date = chrono::NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        Some(DateTime::from_naive_utc_and_offset(
            date.and_hms_opt(0, 0, 0).unwrap(),
            Utc,
        ))
    }
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Google Calendar client for the primary calendar. Access tokens come
/// from the OAuth2 refresh-token grant and are cached until shortly
/// before they expire.
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleCalendarClient {
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(CALENDAR_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            client_id,
            client_secret,
            refresh_token,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, ClientError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            // Refresh a minute early rather than racing the expiry.
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            eprintln!("Google token refresh failed {}: {}", status, text);
            return Err(format!("Token refresh failed with status {}", status).into());
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse token response: {}", e))?;
        let value = parsed.access_token.clone();
        *cached = Some(CachedToken {
            value: parsed.access_token,
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
        });
        Ok(value)
    }
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, ClientError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(EVENTS_URL)
            .bearer_auth(&token)
            .query(&[
                (
                    "timeMin",
                    time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                (
                    "timeMax",
                    time_max.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            eprintln!("Google events list failed {}: {}", status, text);
            return Err(format!("Events list failed with status {}", status).into());
        }

        let parsed: EventsListResponse = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse events list: {}", e))?;

        let mut events: Vec<CalendarEvent> = parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let start = item.start.resolve()?;
                let end = item.end.resolve()?;
                Some(CalendarEvent {
                    id: item.id,
                    summary: item.summary.unwrap_or_else(|| "(untitled)".to_string()),
                    start,
                    end,
                })
            })
            .collect();
        // The API already orders by startTime; keep the contract locally too.
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    async fn insert_event(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: Tz,
    ) -> Result<String, ClientError> {
        let token = self.access_token().await?;
        let body = InsertEventRequest {
            summary: summary.to_string(),
            start: EventDateTime {
                date_time: start.with_timezone(&timezone).to_rfc3339(),
                time_zone: timezone.name().to_string(),
            },
            end: EventDateTime {
                date_time: end.with_timezone(&timezone).to_rfc3339(),
                time_zone: timezone.name().to_string(),
            },
        };

        let response = self
            .http
            .post(EVENTS_URL)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            eprintln!("Google event insert failed {}: {}", status, text);
            return Err(format!("Event insert failed with status {}", status).into());
        }

        let parsed: InsertEventResponse = serde_json::from_str(&text)
            .map_err(|e| format!("Failed to parse insert response: {}", e))?;
        Ok(parsed.id)
    }
}
