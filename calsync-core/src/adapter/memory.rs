//! In-process calendar store.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::adapter::CalendarAdapter;
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{Availability, CalendarInfo, Occurrence, ParticipantStatus};
use crate::placeholder::{ManagedEvent, PlaceholderWrite};
use crate::tracker;
use crate::window::TimeWindow;

/// An event as the memory store keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: String,
    /// Shared by all instances of a recurring series.
    pub series_id: Option<String>,
    pub calendar_id: String,
    pub title: String,
    pub window: TimeWindow,
    pub notes: Option<String>,
    pub availability: Availability,
    pub self_status: ParticipantStatus,
}

impl StoredEvent {
    fn occurrence(&self) -> Occurrence {
        Occurrence {
            source_event_id: self.series_id.clone().unwrap_or_else(|| self.id.clone()),
            source_calendar_id: self.calendar_id.clone(),
            start: self.window.start,
            end: self.window.end,
            availability: self.availability,
            self_status: self.self_status,
        }
    }

    fn is_placeholder(&self) -> bool {
        tracker::has_marker(self.notes.as_deref())
    }
}

#[derive(Default)]
struct MemoryState {
    calendars: Vec<CalendarInfo>,
    events: BTreeMap<String, StoredEvent>,
    next_id: u64,
    access_denied: bool,
    failing_calendars: HashSet<String>,
    writes: usize,
}

impl MemoryState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("mem-{}", self.next_id)
    }

    fn check_access(&self) -> CalSyncResult<()> {
        if self.access_denied {
            return Err(CalSyncError::AccessDenied(
                "calendar access not granted".into(),
            ));
        }
        Ok(())
    }

    fn check_calendar(&self, calendar_id: &str) -> CalSyncResult<()> {
        self.check_access()?;
        if self.calendars.iter().any(|c| c.id == calendar_id) {
            Ok(())
        } else {
            Err(CalSyncError::CalendarNotFound(calendar_id.to_string()))
        }
    }

    fn check_writable(&self, calendar_id: &str) -> CalSyncResult<()> {
        self.check_calendar(calendar_id)?;
        if self.failing_calendars.contains(calendar_id) {
            return Err(CalSyncError::StoreWriteFailed(format!(
                "calendar '{calendar_id}' rejected the write"
            )));
        }
        Ok(())
    }

    fn events_in<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> impl Iterator<Item = &'a StoredEvent> + 'a {
        self.events
            .values()
            .filter(move |e| e.calendar_id == calendar_id && window.intersects(&e.window))
    }
}

/// A calendar store held entirely in memory.
///
/// Used by tests and for trying out a configuration without touching a real
/// backend. Writes can be made to fail per calendar.
#[derive(Default)]
pub struct MemoryAdapter {
    state: Mutex<MemoryState>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_calendar(self, id: &str, name: &str, writable: bool) -> Self {
        self.state().calendars.push(CalendarInfo {
            id: id.to_string(),
            name: name.to_string(),
            source: Some("Memory".to_string()),
            writable,
        });
        self
    }

    /// Add a real event and return its id.
    pub fn add_event(
        &self,
        calendar_id: &str,
        title: &str,
        window: TimeWindow,
        availability: Availability,
        self_status: ParticipantStatus,
    ) -> String {
        let mut state = self.state();
        let id = state.allocate_id();
        state.events.insert(
            id.clone(),
            StoredEvent {
                id: id.clone(),
                series_id: None,
                calendar_id: calendar_id.to_string(),
                title: title.to_string(),
                window,
                notes: None,
                availability,
                self_status,
            },
        );
        id
    }

    /// Insert an event exactly as given, replacing any with the same id.
    pub fn insert(&self, event: StoredEvent) {
        self.state().events.insert(event.id.clone(), event);
    }

    pub fn get(&self, id: &str) -> Option<StoredEvent> {
        self.state().events.get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Option<StoredEvent> {
        self.state().events.remove(id)
    }

    /// Change a real event's time, as its owner would.
    pub fn reschedule(&self, id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self.state().events.get_mut(id) {
            Some(event) => {
                event.window = TimeWindow::new(start, end);
                true
            }
            None => false,
        }
    }

    pub fn set_status(&self, id: &str, availability: Availability, status: ParticipantStatus) {
        if let Some(event) = self.state().events.get_mut(id) {
            event.availability = availability;
            event.self_status = status;
        }
    }

    /// All events in a calendar, placeholders included, ordered by id.
    pub fn events(&self, calendar_id: &str) -> Vec<StoredEvent> {
        self.state()
            .events
            .values()
            .filter(|e| e.calendar_id == calendar_id)
            .cloned()
            .collect()
    }

    /// Events carrying a marker, whether or not it still decodes.
    pub fn placeholders(&self, calendar_id: &str) -> Vec<StoredEvent> {
        self.events(calendar_id)
            .into_iter()
            .filter(StoredEvent::is_placeholder)
            .collect()
    }

    pub fn deny_access(&self) {
        self.state().access_denied = true;
    }

    /// Make every write to `calendar_id` fail; `false` restores it.
    pub fn set_failing(&self, calendar_id: &str, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing_calendars.insert(calendar_id.to_string());
        } else {
            state.failing_calendars.remove(calendar_id);
        }
    }

    /// Number of successful create/update/delete calls so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }
}

impl CalendarAdapter for MemoryAdapter {
    async fn list_calendars(&self) -> CalSyncResult<Vec<CalendarInfo>> {
        let state = self.state();
        state.check_access()?;
        Ok(state.calendars.clone())
    }

    async fn fetch_occurrences(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<Occurrence>> {
        let state = self.state();
        state.check_calendar(calendar_id)?;

        Ok(state
            .events_in(calendar_id, window)
            .filter(|e| !e.is_placeholder())
            .map(StoredEvent::occurrence)
            .collect())
    }

    async fn fetch_managed_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<ManagedEvent>> {
        let state = self.state();
        state.check_calendar(calendar_id)?;

        Ok(state
            .events_in(calendar_id, window)
            .map(|e| ManagedEvent {
                placeholder_id: e.id.clone(),
                calendar_id: e.calendar_id.clone(),
                marker: e.notes.as_deref().and_then(tracker::decode),
                window: e.window,
            })
            .collect())
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        placeholder: &PlaceholderWrite,
    ) -> CalSyncResult<String> {
        let mut state = self.state();
        state.check_writable(calendar_id)?;

        let id = state.allocate_id();
        state.events.insert(
            id.clone(),
            StoredEvent {
                id: id.clone(),
                series_id: None,
                calendar_id: calendar_id.to_string(),
                title: placeholder.title.clone(),
                window: placeholder.window,
                notes: Some(placeholder.notes.clone()),
                availability: placeholder.availability,
                self_status: ParticipantStatus::None,
            },
        );
        state.writes += 1;

        Ok(id)
    }

    async fn update_event(
        &self,
        placeholder_id: &str,
        placeholder: &PlaceholderWrite,
    ) -> CalSyncResult<()> {
        let mut state = self.state();
        let calendar_id = state
            .events
            .get(placeholder_id)
            .map(|e| e.calendar_id.clone())
            .ok_or_else(|| {
                CalSyncError::StoreWriteFailed(format!("event not found: {placeholder_id}"))
            })?;
        state.check_writable(&calendar_id)?;

        if let Some(event) = state.events.get_mut(placeholder_id) {
            event.title = placeholder.title.clone();
            event.window = placeholder.window;
            event.notes = Some(placeholder.notes.clone());
            event.availability = placeholder.availability;
        }
        state.writes += 1;

        Ok(())
    }

    async fn delete_event(&self, placeholder_id: &str) -> CalSyncResult<()> {
        let mut state = self.state();
        let calendar_id = state
            .events
            .get(placeholder_id)
            .map(|e| e.calendar_id.clone())
            .ok_or_else(|| {
                CalSyncError::StoreWriteFailed(format!("event not found: {placeholder_id}"))
            })?;
        state.check_writable(&calendar_id)?;

        state.events.remove(placeholder_id);
        state.writes += 1;

        Ok(())
    }
}
