use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

/// How long an unanswered proposal stays actionable. Expiry is enforced
/// lazily: the next turn that finds a stale proposal discards it.
pub const PENDING_TTL_MINUTES: i64 = 5;

/// A not-yet-committed event awaiting the user's confirmation because the
/// requested window conflicted with an existing event. At most one exists
/// per user identity; a new creation command overwrites it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingProposal {
    pub title: String,
    pub proposed_start: DateTime<Utc>,
    pub proposed_end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub user_timezone: Tz,
    /// Cumulative slot-search probes spent on this proposal. The current
    /// `proposed_start` always sits `increments_tried` increments past the
    /// originally requested start.
    pub increments_tried: u32,
    pub expires_at: DateTime<Utc>,
}

impl PendingProposal {
    pub fn new(
        title: String,
        proposed_start: DateTime<Utc>,
        proposed_end: DateTime<Utc>,
        duration_minutes: i64,
        user_timezone: Tz,
    ) -> Self {
        Self {
            title,
            proposed_start,
            proposed_end,
            duration_minutes,
            user_timezone,
            increments_tried: 0,
            expires_at: Utc::now() + Duration::minutes(PENDING_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// The proposed start in the user's own timezone, for messages.
    pub fn local_start(&self) -> DateTime<Tz> {
        self.proposed_start.with_timezone(&self.user_timezone)
    }
}
