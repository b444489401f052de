//! Error types for occurrence-engine operations.
//!
//! The expander itself never fails; these cover the form, timezone, and
//! event-source layers around it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Recurring events need a recurrence type")]
    MissingRecurrenceType,

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Failed to fetch events: {0}")]
    Fetch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CalendarError>;
