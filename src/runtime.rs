use std::sync::Arc;

use chrono_tz::Tz;

use crate::clients::google_calendar::GoogleCalendarClient;
use crate::config::AppConfig;
use crate::handlers::api::{ApiContext, routes};
use crate::handlers::command::SchedulerEngine;
use crate::service::calendar::{CalendarClient, InMemoryCalendar};
use crate::service::oracle::OpenAIOracle;
use crate::service::pending_store::InMemoryPendingStore;
use crate::service::timezone::{ConfiguredTimezones, TimezoneResolver};

pub const DEFAULT_USER: &str = "default";

/// Wired-up application pieces shared by the API and CLI front ends.
pub struct Components {
    pub engine: Arc<SchedulerEngine>,
    pub calendar: Arc<dyn CalendarClient>,
    pub default_user: String,
    pub timezone: Tz,
}

pub fn build_components(config: &AppConfig, openai_api_key: String) -> Components {
    let timezones = Arc::new(ConfiguredTimezones::from_config(config.prop("USER_TIMEZONE")));
    let default_user = config
        .prop("DEFAULT_USER_ID")
        .unwrap_or_else(|| DEFAULT_USER.to_string());
    let timezone = timezones.resolve(&default_user);

    let oracle = Arc::new(OpenAIOracle::new(openai_api_key, timezone));

    let calendar: Arc<dyn CalendarClient> = match config.prop("CALENDAR_MODE").as_deref() {
        Some("memory") => {
            println!("Calendar mode: in-memory, events stay inside this process");
            Arc::new(InMemoryCalendar::new())
        }
        _ => {
            let client_id = config
                .prop("GOOGLE_CLIENT_ID")
                .expect("GOOGLE_CLIENT_ID not set");
            let client_secret = config
                .prop("GOOGLE_CLIENT_SECRET")
                .expect("GOOGLE_CLIENT_SECRET not set");
            let refresh_token = config
                .prop("GOOGLE_REFRESH_TOKEN")
                .expect("GOOGLE_REFRESH_TOKEN not set");
            Arc::new(GoogleCalendarClient::new(
                client_id,
                client_secret,
                refresh_token,
            ))
        }
    };

    let store = Arc::new(InMemoryPendingStore::new());
    let engine = Arc::new(SchedulerEngine::new(
        oracle,
        calendar.clone(),
        store,
        timezones,
    ));

    Components {
        engine,
        calendar,
        default_user,
        timezone,
    }
}

pub async fn run_api(components: Components, port: u16) {
    let ctx = ApiContext {
        engine: components.engine,
        calendar: components.calendar,
        default_user: components.default_user,
        timezone: components.timezone,
    };
    println!("Executive assistant API listening on 0.0.0.0:{}", port);
    warp::serve(routes(ctx)).run(([0, 0, 0, 0], port)).await;
}
