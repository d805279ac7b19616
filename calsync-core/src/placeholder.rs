//! Placeholder events and the tracking marker that links them to their source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{Availability, OccurrenceKey};
use crate::window::TimeWindow;

/// Metadata stored in a placeholder's notes field.
///
/// This is the only persistent link between a placeholder and the occurrence
/// that spawned it. Key names are part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingMarker {
    /// Identifies this placeholder; stays the same across updates.
    #[serde(rename = "tid")]
    pub tracking_id: String,
    #[serde(rename = "src")]
    pub source_event_id: String,
    #[serde(rename = "scal")]
    pub source_calendar_id: String,
    #[serde(rename = "hash")]
    pub content_hash: String,
    /// Disambiguates instances of a recurring series.
    #[serde(rename = "sstart")]
    pub occurrence_start: DateTime<Utc>,
}

impl TrackingMarker {
    /// Identity of the source occurrence this marker points at.
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            start: self.occurrence_start,
            source_calendar_id: self.source_calendar_id.clone(),
            source_event_id: self.source_event_id.clone(),
        }
    }
}

/// An existing event in a target calendar, as seen by the engine.
///
/// `marker` is `None` for events we do not manage (anything a human created,
/// or a placeholder whose notes were mangled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedEvent {
    pub placeholder_id: String,
    pub calendar_id: String,
    pub marker: Option<TrackingMarker>,
    pub window: TimeWindow,
}

impl ManagedEvent {
    pub fn is_managed(&self) -> bool {
        self.marker.is_some()
    }
}

/// Everything an adapter needs to write a placeholder in one call.
///
/// Window and notes travel together so a placeholder never ends up with a
/// marker that describes a different window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderWrite {
    pub title: String,
    pub window: TimeWindow,
    pub availability: Availability,
    pub notes: String,
}
