use chrono::{Duration, Utc};

use crate::error::SchedulerError;
use crate::models::proposal::{PENDING_TTL_MINUTES, PendingProposal};
use crate::service::calendar::CalendarClient;

pub const SLOT_INCREMENT_MINUTES: i64 = 30;

/// Ceiling on probes across the whole lifetime of one proposal, not per
/// call. A proposal rejected repeatedly keeps counting from where the
/// previous search stopped.
pub const MAX_SLOT_ATTEMPTS: u32 = 10;

/// Walks forward from the proposal's current window in half-hour steps
/// until a window with no overlapping events turns up. Returns the
/// proposal moved to that window with its probe count advanced and its
/// expiry refreshed, `SearchExhausted` once the cumulative probe budget
/// is spent, or `CalendarUnavailable` if a lookup fails mid-search.
pub async fn find_free_slot(
    calendar: &dyn CalendarClient,
    proposal: &PendingProposal,
) -> Result<PendingProposal, SchedulerError> {
    let mut candidate_start = proposal.proposed_start;
    let mut tried = proposal.increments_tried;

    while tried < MAX_SLOT_ATTEMPTS {
        candidate_start += Duration::minutes(SLOT_INCREMENT_MINUTES);
        tried += 1;
        let candidate_end = candidate_start + Duration::minutes(proposal.duration_minutes);

        let events = calendar
            .list_events(candidate_start, candidate_end)
            .await
            .map_err(|e| SchedulerError::CalendarUnavailable(e.to_string()))?;

        if events.is_empty() {
            let mut updated = proposal.clone();
            updated.proposed_start = candidate_start;
            updated.proposed_end = candidate_end;
            updated.increments_tried = tried;
            updated.expires_at = Utc::now() + Duration::minutes(PENDING_TTL_MINUTES);
            return Ok(updated);
        }
    }

    Err(SchedulerError::SearchExhausted)
}
