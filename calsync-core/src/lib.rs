//! Core library for calsync.
//!
//! calsync keeps several calendars aware of each other's busy time. For every
//! real event in one participating calendar, each other participating
//! calendar carries an opaque "Not available" placeholder, linked back to its
//! source through a tracking marker in the notes field.
//!
//! - [`sync::SyncEngine`] runs one fetch → plan → apply cycle
//! - [`sync::differ`] computes the plan as a pure function of a snapshot
//! - [`tracker`] owns the marker format and content hashing
//! - [`adapter`] defines the calendar store interface and its backends

pub mod adapter;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod placeholder;
pub mod sync;
pub mod tracker;
pub mod window;

pub use adapter::CalendarAdapter;
pub use config::{CalendarRef, SyncConfig};
pub use error::{CalSyncError, CalSyncResult};
pub use event::{Availability, CalendarInfo, Occurrence, OccurrenceKey, ParticipantStatus};
pub use placeholder::{ManagedEvent, PlaceholderWrite, TrackingMarker};
pub use window::TimeWindow;
