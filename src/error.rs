use thiserror::Error;

/// Failure taxonomy for the scheduling core.
///
/// During classification, `OracleUnavailable` and `InvalidClassification`
/// are absorbed by the gateway's keyword fallback and never reach a caller.
/// Everything else is surfaced verbatim in the command response.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("language service unavailable: {0}")]
    OracleUnavailable(String),

    #[error("language service returned an unusable classification: {0:?}")]
    InvalidClassification(String),

    #[error("missing event details: {0}")]
    IncompleteExtraction(String),

    #[error("calendar request failed: {0}")]
    CalendarUnavailable(String),

    #[error("no free slot found within the search limit")]
    SearchExhausted,
}
