//! Defines the JSON protocol used for communication between calsync and
//! provider binaries over stdin/stdout.
//!
//! One request per line in, one response per line out. Providers are thin
//! wrappers around a native calendar store; they never see tracking markers
//! as anything but opaque notes text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{Availability, CalendarInfo, ParticipantStatus};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListCalendars,
    ListEvents,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
}

/// Request sent from calsync to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Classifies provider failures so the engine can tell fatal from recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AccessDenied,
    CalendarNotFound,
    StoreWriteFailed,
}

/// Response sent from provider to calsync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<ErrorKind>,
    },
}

impl<T> Response<T> {
    pub fn into_result(self) -> CalSyncResult<T> {
        match self {
            Response::Success { data } => Ok(data),
            Response::Error { error, kind } => Err(match kind {
                Some(ErrorKind::AccessDenied) => CalSyncError::AccessDenied(error),
                Some(ErrorKind::CalendarNotFound) => CalSyncError::CalendarNotFound(error),
                Some(ErrorKind::StoreWriteFailed) => CalSyncError::StoreWriteFailed(error),
                None => CalSyncError::Provider(error),
            }),
        }
    }
}

/// Parse one line of provider output.
pub fn parse_response<T: DeserializeOwned>(output: &str) -> CalSyncResult<T> {
    let line = output.trim();
    if line.is_empty() {
        return Err(CalSyncError::Provider("Provider returned no response".into()));
    }

    let response: Response<T> = serde_json::from_str(line)
        .map_err(|e| CalSyncError::Provider(format!("Failed to parse response: {e}")))?;

    response.into_result()
}

/// An event as a provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Unique event id; usable with update/delete.
    pub id: String,
    /// Id shared by all instances of a recurring series, when different from `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub self_status: ParticipantStatus,
}

/// List all calendars the provider can see.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListCalendars {}

impl ProviderCommand for ListCalendars {
    type Response = Vec<CalendarInfo>;
    fn command() -> Command {
        Command::ListCalendars
    }
}

/// List events of one calendar within a time range.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    pub calendar_id: String,
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<RemoteEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create a placeholder event. Window and notes are written in one save.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    pub calendar_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub availability: Availability,
    pub notes: String,
}

impl ProviderCommand for CreateEvent {
    type Response = String; // New event id
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Rewrite an existing placeholder.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub event_id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub availability: Availability,
    pub notes: String,
}

impl ProviderCommand for UpdateEvent {
    type Response = ();
    fn command() -> Command {
        Command::UpdateEvent
    }
}

/// Delete an event by ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    pub event_id: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_command_in_snake_case() {
        let request = Request {
            command: Command::ListEvents,
            params: serde_json::to_value(ListEvents {
                calendar_id: "work".into(),
                from: "2026-03-16T00:00:00+00:00".into(),
                to: "2026-04-15T00:00:00+00:00".into(),
            })
            .unwrap(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["command"], "list_events");
        assert_eq!(json["params"]["calendar_id"], "work");
    }

    #[test]
    fn parses_success_response() {
        let id: String = parse_response(r#"{"status":"success","data":"evt-1"}"#).unwrap();
        assert_eq!(id, "evt-1");

        parse_response::<()>("{\"status\":\"success\",\"data\":null}\n").unwrap();
    }

    #[test]
    fn maps_error_kinds() {
        let denied = parse_response::<()>(
            r#"{"status":"error","error":"no access","kind":"access_denied"}"#,
        );
        assert!(matches!(denied, Err(CalSyncError::AccessDenied(msg)) if msg == "no access"));

        let write = parse_response::<()>(
            r#"{"status":"error","error":"save failed","kind":"store_write_failed"}"#,
        );
        assert!(matches!(write, Err(CalSyncError::StoreWriteFailed(_))));

        let untyped = parse_response::<()>(r#"{"status":"error","error":"boom"}"#);
        assert!(matches!(untyped, Err(CalSyncError::Provider(msg)) if msg == "boom"));
    }

    #[test]
    fn rejects_empty_and_garbage_output() {
        assert!(matches!(
            parse_response::<()>("  \n"),
            Err(CalSyncError::Provider(_))
        ));
        assert!(matches!(
            parse_response::<()>("segfault"),
            Err(CalSyncError::Provider(_))
        ));
    }

    #[test]
    fn remote_event_defaults_missing_status_fields() {
        let event: RemoteEvent = serde_json::from_str(
            r#"{"id":"e1","start":"2026-03-16T09:00:00Z","end":"2026-03-16T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(event.availability, Availability::Unset);
        assert_eq!(event.self_status, ParticipantStatus::None);
        assert_eq!(event.notes, None);
    }
}
