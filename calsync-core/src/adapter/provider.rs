//! Provider subprocess adapter.
//!
//! Talks to an external provider binary (e.g. `calsync-provider-eventkit`)
//! using JSON over stdin/stdout, one process per call.
//!
//! The protocol is language-agnostic: any executable that speaks it can
//! serve as a calendar backend.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::adapter::CalendarAdapter;
use crate::adapter::protocol::{
    Command, CreateEvent, DeleteEvent, ListCalendars, ListEvents, ProviderCommand, RemoteEvent,
    Request, UpdateEvent, parse_response,
};
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{CalendarInfo, Occurrence};
use crate::placeholder::{ManagedEvent, PlaceholderWrite};
use crate::tracker;
use crate::window::TimeWindow;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
/// The first call may block on an OS permission prompt.
const AUTHORIZE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("calsync-provider-{}", self.0)
    }

    fn binary_path(&self) -> CalSyncResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| CalSyncError::ProviderNotInstalled(binary_name))
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalSyncResult<C::Response> {
        self.call_with_timeout(cmd, PROVIDER_TIMEOUT).await
    }

    pub async fn call_with_timeout<C: ProviderCommand>(
        &self,
        cmd: C,
        limit: Duration,
    ) -> CalSyncResult<C::Response> {
        timeout(limit, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalSyncError::ProviderTimeout(limit.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalSyncResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.0, ?command, "Calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CalSyncError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CalSyncError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalSyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// [`CalendarAdapter`] backed by a provider binary.
pub struct ProviderAdapter {
    provider: Provider,
}

impl ProviderAdapter {
    pub fn new(provider: Provider) -> Self {
        ProviderAdapter { provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<RemoteEvent>> {
        let events = self
            .provider
            .call(ListEvents {
                calendar_id: calendar_id.to_string(),
                from: window.start.to_rfc3339(),
                to: window.end.to_rfc3339(),
            })
            .await?;

        Ok(events
            .into_iter()
            .filter(|e| window.intersects(&TimeWindow::new(e.start, e.end)))
            .collect())
    }
}

/// Real events become occurrences; anything carrying a marker is ours,
/// including markers that no longer decode.
pub(crate) fn occurrences_from(calendar_id: &str, events: &[RemoteEvent]) -> Vec<Occurrence> {
    events
        .iter()
        .filter(|e| !tracker::has_marker(e.notes.as_deref()))
        .map(|e| Occurrence {
            source_event_id: e.series_id.clone().unwrap_or_else(|| e.id.clone()),
            source_calendar_id: calendar_id.to_string(),
            start: e.start,
            end: e.end,
            availability: e.availability,
            self_status: e.self_status,
        })
        .collect()
}

pub(crate) fn managed_from(calendar_id: &str, events: &[RemoteEvent]) -> Vec<ManagedEvent> {
    events
        .iter()
        .map(|e| ManagedEvent {
            placeholder_id: e.id.clone(),
            calendar_id: calendar_id.to_string(),
            marker: e.notes.as_deref().and_then(tracker::decode),
            window: TimeWindow::new(e.start, e.end),
        })
        .collect()
}

impl CalendarAdapter for ProviderAdapter {
    async fn list_calendars(&self) -> CalSyncResult<Vec<CalendarInfo>> {
        self.provider
            .call_with_timeout(ListCalendars {}, AUTHORIZE_TIMEOUT)
            .await
    }

    async fn fetch_occurrences(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<Occurrence>> {
        let events = self.list_events(calendar_id, window).await?;
        Ok(occurrences_from(calendar_id, &events))
    }

    async fn fetch_managed_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> CalSyncResult<Vec<ManagedEvent>> {
        let events = self.list_events(calendar_id, window).await?;
        Ok(managed_from(calendar_id, &events))
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        placeholder: &PlaceholderWrite,
    ) -> CalSyncResult<String> {
        self.provider
            .call(CreateEvent {
                calendar_id: calendar_id.to_string(),
                title: placeholder.title.clone(),
                start: placeholder.window.start,
                end: placeholder.window.end,
                availability: placeholder.availability,
                notes: placeholder.notes.clone(),
            })
            .await
    }

    async fn update_event(
        &self,
        placeholder_id: &str,
        placeholder: &PlaceholderWrite,
    ) -> CalSyncResult<()> {
        self.provider
            .call(UpdateEvent {
                event_id: placeholder_id.to_string(),
                title: placeholder.title.clone(),
                start: placeholder.window.start,
                end: placeholder.window.end,
                availability: placeholder.availability,
                notes: placeholder.notes.clone(),
            })
            .await
    }

    async fn delete_event(&self, placeholder_id: &str) -> CalSyncResult<()> {
        self.provider
            .call(DeleteEvent {
                event_id: placeholder_id.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Availability, ParticipantStatus};
    use crate::placeholder::TrackingMarker;
    use chrono::{TimeZone, Utc};

    fn remote(id: &str, notes: Option<String>) -> RemoteEvent {
        RemoteEvent {
            id: id.to_string(),
            series_id: None,
            start: Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap(),
            notes,
            availability: Availability::Busy,
            self_status: ParticipantStatus::None,
        }
    }

    fn marker_notes() -> String {
        tracker::encode(&TrackingMarker {
            tracking_id: "t1".into(),
            source_event_id: "e9".into(),
            source_calendar_id: "other".into(),
            content_hash: "h".into(),
            occurrence_start: Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn binary_name_uses_provider_prefix() {
        assert_eq!(
            Provider::from_name("eventkit").binary_name(),
            "calsync-provider-eventkit"
        );
    }

    #[test]
    fn placeholders_are_not_occurrences() {
        let events = vec![
            remote("real", Some("Agenda: quarterly review".into())),
            remote("ph", Some(marker_notes())),
        ];

        let occurrences = occurrences_from("work", &events);
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].source_event_id, "real");
        assert_eq!(occurrences[0].source_calendar_id, "work");
    }

    #[test]
    fn managed_events_decode_markers() {
        let events = vec![remote("real", None), remote("ph", Some(marker_notes()))];

        let managed = managed_from("work", &events);
        assert_eq!(managed.len(), 2);
        assert!(!managed[0].is_managed());
        assert_eq!(managed[1].marker.as_ref().unwrap().tracking_id, "t1");
    }

    #[test]
    fn undecodable_markers_are_neither_occurrences_nor_managed() {
        let legacy = r#"[CALSYNC:{"tid": "ab12cd34", "src": "e1", "scal": "a", "hash": "0123456789abcdef"}]"#;
        let events = vec![remote("old-ph", Some(legacy.to_string()))];

        assert!(occurrences_from("work", &events).is_empty());

        let managed = managed_from("work", &events);
        assert_eq!(managed.len(), 1);
        assert_eq!(managed[0].marker, None);
    }

    #[test]
    fn series_id_identifies_recurring_occurrences() {
        let mut instance = remote("instance-3", None);
        instance.series_id = Some("standup".into());

        let occurrences = occurrences_from("work", &[instance]);
        assert_eq!(occurrences[0].source_event_id, "standup");
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let provider = Provider::from_name("definitely-not-installed-xyz");
        let result = provider.call(ListCalendars {}).await;
        assert!(matches!(result, Err(CalSyncError::ProviderNotInstalled(_))));
    }
}
