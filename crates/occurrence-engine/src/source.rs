//! Where event definitions come from, and who may change them.
//!
//! The store itself lives outside this crate; it only has to hand over the
//! full list of events. Order does not matter, the agenda re-sorts.

use std::io::Read;

use serde::Deserialize;

use crate::error::{CalendarError, Result};
use crate::event::EventDefinition;

/// Query capability: fetch every stored event.
pub trait EventSource {
    fn fetch_events(&self) -> Result<Vec<EventDefinition>>;
}

impl EventSource for [EventDefinition] {
    fn fetch_events(&self) -> Result<Vec<EventDefinition>> {
        Ok(self.to_vec())
    }
}

impl EventSource for Vec<EventDefinition> {
    fn fetch_events(&self) -> Result<Vec<EventDefinition>> {
        Ok(self.clone())
    }
}

/// A JSON export of the events table.
///
/// Accepts either a bare array of rows or the `{ "data": [...], "error": ... }`
/// envelope the hosted backend returns; a non-null `error` becomes
/// `CalendarError::Fetch`.
#[derive(Debug, Clone)]
pub struct JsonEventSource {
    json: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Rows(Vec<EventDefinition>),
    Envelope {
        #[serde(default)]
        data: Option<Vec<EventDefinition>>,
        #[serde(default)]
        error: Option<serde_json::Value>,
    },
}

impl JsonEventSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }

    /// Read the whole export from `reader`.
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        Ok(Self { json })
    }
}

impl EventSource for JsonEventSource {
    fn fetch_events(&self) -> Result<Vec<EventDefinition>> {
        match serde_json::from_str::<Payload>(&self.json)? {
            Payload::Rows(rows) => Ok(rows),
            Payload::Envelope {
                error: Some(error), ..
            } => Err(CalendarError::Fetch(error_message(&error))),
            Payload::Envelope { data, .. } => Ok(data.unwrap_or_default()),
        }
    }
}

fn error_message(error: &serde_json::Value) -> String {
    error
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

/// Permission to create, edit, and delete events.
///
/// Any signed-in user holds it; there are no roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteAccess {
    granted: bool,
}

impl WriteAccess {
    pub fn for_session(is_authenticated: bool) -> Self {
        Self {
            granted: is_authenticated,
        }
    }

    pub fn denied() -> Self {
        Self::default()
    }

    pub fn allows_edit(self) -> bool {
        self.granted
    }
}
