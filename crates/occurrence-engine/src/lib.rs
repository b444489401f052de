//! # occurrence-engine
//!
//! Deterministic expansion of simple recurring calendar events into the
//! occurrences of one display week.
//!
//! Events repeat daily, weekly, monthly, or yearly with an interval. Expansion
//! is pure: it never reads the clock, never fails, and every stepping loop is
//! bounded, so malformed rows degrade to an empty or truncated result.
//!
//! ## Modules
//!
//! - [`event`] - stored event rows and their recurrence fields
//! - [`calendar`] - day/month/year stepping, date ranges, Monday-based weeks
//! - [`dst`] - DST gap/overlap policies for wall-clock stepping
//! - [`expander`] - one event + one window → ascending occurrences
//! - [`week`] - category filter, grouping by day, the seven-day agenda
//! - [`draft`] - form submissions and their validation
//! - [`source`] - the event-fetch seam and the write-access capability
//! - [`error`] - Error types

pub mod calendar;
pub mod draft;
pub mod dst;
pub mod error;
pub mod event;
pub mod expander;
pub mod source;
pub mod week;

pub use calendar::{DateRange, Week};
pub use draft::EventDraft;
pub use dst::DstPolicy;
pub use error::CalendarError;
pub use event::{EventDefinition, Recurrence, RecurrenceType};
pub use expander::{expand, expand_all, expand_all_with, expand_with, ExpandOptions, Occurrence};
pub use source::{EventSource, JsonEventSource, WriteAccess};
pub use week::{CategoryFilter, DayAgenda, WeekAgenda};
