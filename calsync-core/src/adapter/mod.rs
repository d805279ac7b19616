//! Calendar backends.
//!
//! The engine talks to calendars only through [`CalendarAdapter`]. One
//! implementation is picked at startup: [`ProviderAdapter`] drives an external
//! provider binary, [`MemoryAdapter`] keeps everything in process.

mod memory;
pub mod protocol;
mod provider;

pub use memory::{MemoryAdapter, StoredEvent};
pub use provider::{Provider, ProviderAdapter};

use crate::error::CalSyncResult;
use crate::event::{CalendarInfo, Occurrence};
use crate::placeholder::{ManagedEvent, PlaceholderWrite};
use crate::window::TimeWindow;

/// Access to a calendar store.
///
/// Calls are awaited one at a time; implementations need no internal
/// concurrency control beyond what a single writer requires.
#[allow(async_fn_in_trait)]
pub trait CalendarAdapter {
    async fn list_calendars(&self) -> CalSyncResult<Vec<CalendarInfo>>;

    /// Real events intersecting `window`. Placeholders are excluded.
    async fn fetch_occurrences(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<Occurrence>>;

    /// Every event intersecting `window`, with its marker decoded when it has one.
    async fn fetch_managed_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<ManagedEvent>>;

    /// Returns the new placeholder's id.
    async fn create_event(
        &self,
        calendar_id: &str,
        placeholder: &PlaceholderWrite,
    ) -> CalSyncResult<String>;

    async fn update_event(
        &self,
        placeholder_id: &str,
        placeholder: &PlaceholderWrite,
    ) -> CalSyncResult<()>;

    async fn delete_event(&self, placeholder_id: &str) -> CalSyncResult<()>;
}
