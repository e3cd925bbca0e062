/// Command categories the classifier gateway can hand to the dispatcher.
///
/// `Unknown` marks an oracle label outside the known set. The gateway never
/// returns it: an unknown label counts as a failed attempt and the keyword
/// fallback decides instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentClass {
    MeetingSummary,
    CreateEvent,
    DateTimeQuery,
    Confirmation,
    Unknown,
}

/// How a user's turn reads while a proposal is awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Affirmation,
    Rejection,
    Unclear,
}

/// Structured result of one command turn. The API layer maps each variant
/// onto the JSON key shape the desktop client branches on (`success` +
/// `event_id`, `summary`, `message`, or `error`).
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    EventCreated { event_id: String, message: String },
    Summary(String),
    Question(String),
    Message(String),
    Error(String),
}
