//! Create/edit form submissions and their validation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};
use crate::event::{EventDefinition, RecurrenceType};

/// What the event form submits before it is written to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_type: Option<RecurrenceType>,
    #[serde(default)]
    pub recurrence_interval: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl EventDraft {
    /// Prefill the edit form from a stored event.
    pub fn from_event(event: &EventDefinition) -> Self {
        Self {
            title: event.title.clone(),
            start: event.start_instant(),
            is_recurring: event.is_recurring,
            recurrence_type: event.recurrence_type,
            recurrence_interval: Some(event.recurrence_interval.unwrap_or(1)),
            description: event.description.clone(),
            location: event.location.clone(),
            category: event.category.clone(),
        }
    }

    /// Check required fields and produce the record to write.
    ///
    /// The returned event carries no `id`; updates keep the stored one.
    ///
    /// # Errors
    /// `MissingField("title")` or `MissingField("start")` when either is absent,
    /// `MissingRecurrenceType` when the draft recurs without a type.
    pub fn validate(self) -> Result<EventDefinition> {
        if self.title.trim().is_empty() {
            return Err(CalendarError::MissingField("title"));
        }
        let start = self.start.ok_or(CalendarError::MissingField("start"))?;
        if self.is_recurring && self.recurrence_type.is_none() {
            return Err(CalendarError::MissingRecurrenceType);
        }

        let (recurrence_type, recurrence_interval) = if self.is_recurring {
            (
                self.recurrence_type,
                Some(self.recurrence_interval.unwrap_or(1).max(1)),
            )
        } else {
            (None, None)
        };

        Ok(EventDefinition {
            id: None,
            title: self.title,
            description: non_empty(self.description),
            start_date: start.to_rfc3339_opts(SecondsFormat::Millis, true),
            location: non_empty(self.location),
            is_recurring: self.is_recurring,
            recurrence_type,
            recurrence_interval,
            category: non_empty(self.category),
            created_at: None,
            updated_at: None,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
