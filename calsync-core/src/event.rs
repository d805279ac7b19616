//! Provider-neutral event model.
//!
//! Adapters convert whatever their backend stores into these types. The
//! reconciliation core only ever reads them; real events are never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::window::TimeWindow;

/// Free/busy property set directly on an event by its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Busy,
    Free,
    Tentative,
    /// Out of office
    Unavailable,
    #[default]
    Unset,
}

/// The calendar owner's own response to an invitation.
///
/// Read-only from our side: it is set by whoever sent the invitation and by
/// the owner answering it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    Pending,
    Accepted,
    Declined,
    Tentative,
    /// Not an invitation (the owner organizes the event)
    #[default]
    None,
}

/// One instance of a real event, possibly one of a recurring series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Stable across edits; shared by every occurrence of a recurring series.
    pub source_event_id: String,
    pub source_calendar_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub self_status: ParticipantStatus,
}

impl Occurrence {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }

    /// Identity of this occurrence. The series id alone is not unique.
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            start: self.start,
            source_calendar_id: self.source_calendar_id.clone(),
            source_event_id: self.source_event_id.clone(),
        }
    }
}

/// Unique identity of a source occurrence: (calendar, series id, start).
///
/// Field order drives the derived ordering, so plans come out sorted by start.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub start: DateTime<Utc>,
    pub source_calendar_id: String,
    pub source_event_id: String,
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} ({})",
            self.source_event_id,
            self.start.format("%Y-%m-%d %H:%M"),
            self.source_calendar_id
        )
    }
}

/// A calendar as reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    pub name: String,
    /// Account the calendar belongs to (e.g. "iCloud", "Exchange")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub writable: bool,
}
