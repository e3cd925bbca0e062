use std::sync::Arc;

use crate::error::SchedulerError;
use crate::models::command::{IntentClass, ResponseClass};
use crate::service::oracle::OracleClient;

pub const MAX_ORACLE_ATTEMPTS: u32 = 2;

/// Classification gateway. Asks the language model first and falls back
/// to keyword rules after [`MAX_ORACLE_ATTEMPTS`] failed attempts, so a
/// caller always gets a usable label.
pub struct ClassifierGateway {
    oracle: Arc<dyn OracleClient>,
}

impl ClassifierGateway {
    pub fn new(oracle: Arc<dyn OracleClient>) -> Self {
        Self { oracle }
    }

    pub async fn classify_intent(&self, text: &str) -> IntentClass {
        for attempt in 1..=MAX_ORACLE_ATTEMPTS {
            match self.oracle.generate_prompt(text, "intent").await {
                Ok(raw) => {
                    let intent = parse_intent_label(&raw);
                    if intent != IntentClass::Unknown {
                        return intent;
                    }
                    eprintln!(
                        "Intent attempt {}/{}: {}",
                        attempt,
                        MAX_ORACLE_ATTEMPTS,
                        SchedulerError::InvalidClassification(raw)
                    );
                }
                Err(e) => {
                    eprintln!(
                        "Intent attempt {}/{}: {}",
                        attempt,
                        MAX_ORACLE_ATTEMPTS,
                        SchedulerError::OracleUnavailable(e.to_string())
                    );
                }
            }
        }
        heuristic_intent(text)
    }

    pub async fn classify_response(&self, text: &str) -> ResponseClass {
        for attempt in 1..=MAX_ORACLE_ATTEMPTS {
            match self.oracle.generate_prompt(text, "response").await {
                Ok(raw) => {
                    if let Some(response) = parse_response_label(&raw) {
                        return response;
                    }
                    eprintln!(
                        "Response attempt {}/{}: {}",
                        attempt,
                        MAX_ORACLE_ATTEMPTS,
                        SchedulerError::InvalidClassification(raw)
                    );
                }
                Err(e) => {
                    eprintln!(
                        "Response attempt {}/{}: {}",
                        attempt,
                        MAX_ORACLE_ATTEMPTS,
                        SchedulerError::OracleUnavailable(e.to_string())
                    );
                }
            }
        }
        heuristic_response(text)
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '.')
        .to_lowercase()
        .replace([' ', '-'], "_")
}

/// Maps a model reply onto an intent. Anything outside the known labels
/// comes back as [`IntentClass::Unknown`], which the gateway treats as a
/// failed attempt.
pub fn parse_intent_label(raw: &str) -> IntentClass {
    match normalize_label(raw).as_str() {
        "meeting_summary" => IntentClass::MeetingSummary,
        "create_event" => IntentClass::CreateEvent,
        "datetime_query" | "date_time_query" => IntentClass::DateTimeQuery,
        "confirmation" => IntentClass::Confirmation,
        _ => IntentClass::Unknown,
    }
}

pub fn parse_response_label(raw: &str) -> Option<ResponseClass> {
    match normalize_label(raw).as_str() {
        "affirmation" => Some(ResponseClass::Affirmation),
        "rejection" => Some(ResponseClass::Rejection),
        "unclear" => Some(ResponseClass::Unclear),
        _ => None,
    }
}

/// Keyword fallback for intents. Summary phrases win over creation
/// verbs, and anything else is treated as an availability question.
pub fn heuristic_intent(text: &str) -> IntentClass {
    let lower = text.to_lowercase();

    let summary_phrases = [
        "summarize",
        "spent my time",
        "last week",
        "this week",
        "next week",
        "last month",
        "this month",
        "next month",
    ];
    if summary_phrases.iter().any(|p| lower.contains(p)) {
        return IntentClass::MeetingSummary;
    }

    let creation_verbs = ["create", "schedule", "book", "set up", "block"];
    if creation_verbs.iter().any(|v| lower.contains(v)) {
        return IntentClass::CreateEvent;
    }

    IntentClass::DateTimeQuery
}

/// Keyword fallback for confirmation replies. Matches on whole words so
/// "north" never reads as "no".
pub fn heuristic_response(text: &str) -> ResponseClass {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();

    let affirm_words = ["yes", "yeah", "yep", "sure", "ok", "okay", "confirm"];
    let affirm_phrases = ["that works", "sounds good"];
    if words.iter().any(|w| affirm_words.contains(w))
        || affirm_phrases.iter().any(|p| lower.contains(p))
    {
        return ResponseClass::Affirmation;
    }

    let reject_words = ["no", "nope", "cancel", "reject"];
    let reject_phrases = ["not good", "no thanks"];
    if words.iter().any(|w| reject_words.contains(w))
        || reject_phrases.iter().any(|p| lower.contains(p))
    {
        return ResponseClass::Rejection;
    }

    ResponseClass::Unclear
}
