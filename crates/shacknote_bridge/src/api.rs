//! Boundary contract: request kinds, response envelopes and the
//! display-facing API trait.
//!
//! # Invariants
//! - Operation names on the wire are `getAllNotes`, `getNotesPaginated`,
//!   `getOne`, `create`, `update`, `delete`; any other name fails to decode.
//! - Requests carry only plain serializable arguments.

use serde::{Deserialize, Serialize};
use shacknote_core::{
    CreateNoteResult, DeleteNoteResult, GetAllNotesResult, GetNoteResult,
    GetNotesWithPaginationResult, NoteId, NoteUpdate, UpdateNoteResult,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Transport-level failures. Envelope errors are never reported here.
#[derive(Debug)]
pub enum BridgeError {
    /// Outgoing data could not be serialized.
    Encode(serde_json::Error),
    /// Incoming data was malformed or named an unknown operation.
    Decode(serde_json::Error),
    /// The host side is no longer accepting requests.
    Disconnected,
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode bridge message: {err}"),
            Self::Decode(err) => write!(f, "failed to decode bridge message: {err}"),
            Self::Disconnected => write!(f, "notes host is not running"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
            Self::Disconnected => None,
        }
    }
}

/// The closed set of operations the display may invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "camelCase")]
pub enum BridgeRequest {
    GetAllNotes,
    GetNotesPaginated { limit: u32, offset: u32 },
    GetOne { id: NoteId },
    Create { title: String, content: String },
    Update { note: NoteUpdate },
    Delete { id: NoteId },
}

impl BridgeRequest {
    /// Wire operation name.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::GetAllNotes => "getAllNotes",
            Self::GetNotesPaginated { .. } => "getNotesPaginated",
            Self::GetOne { .. } => "getOne",
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    /// IPC channel name used by earlier display hosts.
    pub fn channel(&self) -> &'static str {
        match self {
            Self::GetAllNotes => "notes:getAll",
            Self::GetNotesPaginated { .. } => "notes:getPaginated",
            Self::GetOne { .. } => "notes:getOne",
            Self::Create { .. } => "notes:create",
            Self::Update { .. } => "notes:update",
            Self::Delete { .. } => "notes:delete",
        }
    }
}

/// Envelope produced for one request, serialized without extra wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    AllNotes(GetAllNotesResult),
    Page(GetNotesWithPaginationResult),
    Note(GetNoteResult),
    Created(CreateNoteResult),
    Updated(UpdateNoteResult),
    Deleted(DeleteNoteResult),
}

impl BridgeResponse {
    pub fn is_success(&self) -> bool {
        match self {
            Self::AllNotes(envelope) => envelope.is_success(),
            Self::Page(envelope) => envelope.is_success(),
            Self::Note(envelope) => envelope.is_success(),
            Self::Created(envelope) => envelope.is_success(),
            Self::Updated(envelope) => envelope.is_success(),
            Self::Deleted(envelope) => envelope.is_success(),
        }
    }
}

/// Display-facing notes API.
pub trait NotesApi {
    fn get_all_notes(&mut self) -> BridgeResult<GetAllNotesResult>;
    fn get_notes_paginated(
        &mut self,
        limit: u32,
        offset: u32,
    ) -> BridgeResult<GetNotesWithPaginationResult>;
    fn get_one(&mut self, id: NoteId) -> BridgeResult<GetNoteResult>;
    fn create(&mut self, title: &str, content: &str) -> BridgeResult<CreateNoteResult>;
    fn update(&mut self, note: &NoteUpdate) -> BridgeResult<UpdateNoteResult>;
    fn delete(&mut self, id: NoteId) -> BridgeResult<DeleteNoteResult>;
}

#[cfg(test)]
mod tests {
    use super::BridgeRequest;
    use serde_json::json;
    use shacknote_core::NoteUpdate;

    #[test]
    fn requests_use_verbatim_operation_names() {
        let cases = [
            (BridgeRequest::GetAllNotes, json!({"op": "getAllNotes"})),
            (
                BridgeRequest::GetNotesPaginated { limit: 4, offset: 8 },
                json!({"op": "getNotesPaginated", "args": {"limit": 4, "offset": 8}}),
            ),
            (
                BridgeRequest::GetOne { id: 1 },
                json!({"op": "getOne", "args": {"id": 1}}),
            ),
            (
                BridgeRequest::Delete { id: 2 },
                json!({"op": "delete", "args": {"id": 2}}),
            ),
        ];
        for (request, expected) in cases {
            assert_eq!(serde_json::to_value(&request).unwrap(), expected);
            assert_eq!(request.op_name(), expected["op"]);
        }
    }

    #[test]
    fn update_request_ignores_extra_note_fields() {
        let request: BridgeRequest = serde_json::from_value(json!({
            "op": "update",
            "args": {"note": {
                "id": 1, "title": "t", "content": "c",
                "createdAt": "2024-01-01 00:00:00", "updatedAt": "2024-01-01 00:00:00"
            }}
        }))
        .unwrap();
        assert_eq!(
            request,
            BridgeRequest::Update {
                note: NoteUpdate {
                    id: 1,
                    title: "t".to_string(),
                    content: "c".to_string(),
                }
            }
        );
    }

    #[test]
    fn unknown_operations_are_rejected() {
        for raw in [
            r#"{"op":"dropAll"}"#,
            r#"{"op":"notes:getAll"}"#,
            r#"{"op":"GetAllNotes"}"#,
        ] {
            assert!(serde_json::from_str::<BridgeRequest>(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn channels_follow_legacy_ipc_names() {
        assert_eq!(BridgeRequest::GetAllNotes.channel(), "notes:getAll");
        assert_eq!(BridgeRequest::Delete { id: 1 }.channel(), "notes:delete");
    }
}
