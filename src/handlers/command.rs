use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use tokio::sync::OwnedMutexGuard;

use crate::error::SchedulerError;
use crate::models::command::{CommandOutcome, IntentClass, ResponseClass};
use crate::models::event::{EventExtraction, RangeExtraction};
use crate::models::proposal::PendingProposal;
use crate::service::calendar::CalendarClient;
use crate::service::classify::ClassifierGateway;
use crate::service::oracle::OracleClient;
use crate::service::pending_store::PendingStore;
use crate::service::slot_search::find_free_slot;
use crate::service::summary::{
    SummaryService, local_midnight, period_phrase_dates, range_from_dates, resolve_range_phrase,
};
use crate::service::timezone::TimezoneResolver;

type Slot = OwnedMutexGuard<Option<PendingProposal>>;

/// Top-level dispatcher for one user turn.
///
/// A user is either idle or has one proposal awaiting confirmation, and
/// that alone decides how the turn is read: idle turns go through intent
/// classification, awaiting turns through response classification. The
/// user's pending slot stays locked for the whole turn so concurrent
/// turns for the same user cannot race on the proposal.
pub struct SchedulerEngine {
    classifier: ClassifierGateway,
    oracle: Arc<dyn OracleClient>,
    calendar: Arc<dyn CalendarClient>,
    store: Arc<dyn PendingStore>,
    timezones: Arc<dyn TimezoneResolver>,
}

impl SchedulerEngine {
    pub fn new(
        oracle: Arc<dyn OracleClient>,
        calendar: Arc<dyn CalendarClient>,
        store: Arc<dyn PendingStore>,
        timezones: Arc<dyn TimezoneResolver>,
    ) -> Self {
        Self {
            classifier: ClassifierGateway::new(oracle.clone()),
            oracle,
            calendar,
            store,
            timezones,
        }
    }

    pub async fn handle_command(&self, user_id: &str, text: &str) -> CommandOutcome {
        let text = text.trim();
        if text.is_empty() {
            return CommandOutcome::Message("Please enter a command.".to_string());
        }

        let mut slot = self.store.lock_user(user_id).await;

        match slot.as_ref().cloned() {
            Some(proposal) if proposal.is_expired(Utc::now()) => {
                *slot = None;
                CommandOutcome::Message(format!(
                    "Your proposed \"{}\" expired unanswered, so I dropped it. \
                     Ask again if you still want it.",
                    proposal.title
                ))
            }
            Some(proposal) => {
                self.confirmation_turn(user_id, text, proposal, &mut slot)
                    .await
            }
            None => match self.classifier.classify_intent(text).await {
                IntentClass::MeetingSummary => self.handle_summary(user_id, text).await,
                IntentClass::CreateEvent => self.handle_create(user_id, text, &mut slot).await,
                IntentClass::DateTimeQuery => self.handle_query(user_id, text).await,
                IntentClass::Confirmation => CommandOutcome::Message(
                    "There is nothing waiting for your confirmation right now.".to_string(),
                ),
                IntentClass::Unknown => CommandOutcome::Message(
                    "Sorry, I couldn't work out what you meant. You can ask me to \
                     schedule an event, summarize your meetings, or check a time."
                        .to_string(),
                ),
            },
        }
    }

    async fn confirmation_turn(
        &self,
        user_id: &str,
        text: &str,
        proposal: PendingProposal,
        slot: &mut Slot,
    ) -> CommandOutcome {
        match self.classifier.classify_response(text).await {
            ResponseClass::Affirmation => {
                // The stored window goes in exactly as proposed.
                let result = self
                    .calendar
                    .insert_event(
                        &proposal.title,
                        proposal.proposed_start,
                        proposal.proposed_end,
                        proposal.user_timezone,
                    )
                    .await;
                match result {
                    Ok(event_id) => {
                        **slot = None;
                        CommandOutcome::EventCreated {
                            event_id,
                            message: format!(
                                "Booked \"{}\" for {}.",
                                proposal.title,
                                format_local(proposal.local_start())
                            ),
                        }
                    }
                    Err(e) => CommandOutcome::Error(
                        SchedulerError::CalendarUnavailable(e.to_string()).to_string(),
                    ),
                }
            }
            ResponseClass::Rejection => {
                match find_free_slot(self.calendar.as_ref(), &proposal).await {
                    Ok(updated) => {
                        let suggestion = format!(
                            "How about {} for \"{}\"?",
                            format_local(updated.local_start()),
                            updated.title
                        );
                        **slot = Some(updated);
                        CommandOutcome::Question(suggestion)
                    }
                    Err(SchedulerError::SearchExhausted) => {
                        **slot = None;
                        CommandOutcome::Message(format!(
                            "I couldn't find a free slot near that time for \"{}\". \
                             I've dropped it; try asking with a different time.",
                            proposal.title
                        ))
                    }
                    Err(e) => CommandOutcome::Error(e.to_string()),
                }
            }
            ResponseClass::Unclear => {
                // A fresh creation command supersedes the open proposal.
                if self.classifier.classify_intent(text).await == IntentClass::CreateEvent {
                    return self.handle_create(user_id, text, slot).await;
                }
                CommandOutcome::Question(format!(
                    "You still have \"{}\" proposed for {}. Does that time work? (yes/no)",
                    proposal.title,
                    format_local(proposal.local_start())
                ))
            }
        }
    }

    async fn handle_create(&self, user_id: &str, text: &str, slot: &mut Slot) -> CommandOutcome {
        let timezone = self.timezones.resolve(user_id);

        let payload = match self.oracle.generate_prompt(text, "event_extraction").await {
            Ok(p) => p,
            Err(e) => {
                return CommandOutcome::Error(
                    SchedulerError::OracleUnavailable(e.to_string()).to_string(),
                );
            }
        };
        let extraction: EventExtraction = match serde_json::from_str(&payload) {
            Ok(r) => r,
            Err(e) => {
                return CommandOutcome::Error(
                    SchedulerError::IncompleteExtraction(format!(
                        "could not read the event details: {}",
                        e
                    ))
                    .to_string(),
                );
            }
        };
        let window = match extraction.into_window() {
            Ok(w) => w,
            Err(e) => return CommandOutcome::Error(e.to_string()),
        };

        let conflicts = match self.calendar.list_events(window.start, window.end).await {
            Ok(events) => events,
            Err(e) => {
                return CommandOutcome::Error(
                    SchedulerError::CalendarUnavailable(e.to_string()).to_string(),
                );
            }
        };

        if conflicts.is_empty() {
            match self
                .calendar
                .insert_event(&window.title, window.start, window.end, timezone)
                .await
            {
                Ok(event_id) => {
                    **slot = None;
                    CommandOutcome::EventCreated {
                        event_id,
                        message: format!(
                            "Scheduled \"{}\" for {}.",
                            window.title,
                            format_local(window.start.with_timezone(&timezone))
                        ),
                    }
                }
                Err(e) => CommandOutcome::Error(
                    SchedulerError::CalendarUnavailable(e.to_string()).to_string(),
                ),
            }
        } else {
            let proposal = PendingProposal::new(
                window.title,
                window.start,
                window.end,
                window.duration_minutes,
                timezone,
            );
            let question = format!(
                "\"{}\" at {} overlaps \"{}\". Book it anyway? \
                 Say no and I'll look for the next free slot.",
                proposal.title,
                format_local(proposal.local_start()),
                conflicts[0].summary
            );
            **slot = Some(proposal);
            CommandOutcome::Question(question)
        }
    }

    async fn handle_summary(&self, user_id: &str, text: &str) -> CommandOutcome {
        let timezone = self.timezones.resolve(user_id);
        let today = Utc::now().with_timezone(&timezone).date_naive();

        let (time_min, time_max) = match self.extract_range(text).await {
            Some((start, end)) => range_from_dates(start, end, timezone),
            None => resolve_range_phrase(text, today, timezone),
        };

        let events = match self.calendar.list_events(time_min, time_max).await {
            Ok(events) => events,
            Err(e) => {
                return CommandOutcome::Error(
                    SchedulerError::CalendarUnavailable(e.to_string()).to_string(),
                );
            }
        };

        CommandOutcome::Summary(
            SummaryService::build_summary(&events, timezone, self.oracle.as_ref()).await,
        )
    }

    async fn handle_query(&self, user_id: &str, text: &str) -> CommandOutcome {
        let timezone = self.timezones.resolve(user_id);
        let today = Utc::now().with_timezone(&timezone).date_naive();

        let (time_min, time_max) = match self.extract_range(text).await {
            Some((start, end)) => range_from_dates(start, end, timezone),
            None => {
                // Availability questions default to today, not this week.
                let (start, end) = period_phrase_dates(text, today)
                    .unwrap_or((today, today + Duration::days(1)));
                (local_midnight(start, timezone), local_midnight(end, timezone))
            }
        };

        let events = match self.calendar.list_events(time_min, time_max).await {
            Ok(events) => events,
            Err(e) => {
                return CommandOutcome::Error(
                    SchedulerError::CalendarUnavailable(e.to_string()).to_string(),
                );
            }
        };

        CommandOutcome::Message(
            SummaryService::build_availability(text, &events, timezone, self.oracle.as_ref()).await,
        )
    }

    /// Explicit dates from the range oracle, or None so the caller falls
    /// back to the phrase rule table. Oracle trouble never surfaces here.
    async fn extract_range(&self, text: &str) -> Option<(NaiveDate, NaiveDate)> {
        match self.oracle.generate_prompt(text, "summary_range").await {
            Ok(payload) => serde_json::from_str::<RangeExtraction>(&payload)
                .ok()
                .and_then(|range| range.dates()),
            Err(e) => {
                eprintln!(
                    "Range extraction skipped: {}",
                    SchedulerError::OracleUnavailable(e.to_string())
                );
                None
            }
        }
    }
}

fn format_local(time: DateTime<Tz>) -> String {
    time.format("%a %b %-d at %-I:%M %p %Z").to_string()
}
