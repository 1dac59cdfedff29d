//! Result envelopes returned by every note operation.
//!
//! # Responsibility
//! - Represent operation outcomes as a two-variant tagged type.
//! - Map to and from the `{ success, ...payload | error }` wire shape.
//!
//! # Invariants
//! - An envelope is either a payload or an error, never both.
//! - On the wire, success envelopes carry their payload fields flattened
//!   next to `success: true`; failures carry `error` and `errorKind`.

use crate::model::note::{Note, NoteId};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Message used for the not-found outcome of a lookup.
pub const NOTE_NOT_FOUND_MESSAGE: &str = "Note not found";

/// Failure category carried by an error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Operation issued before the service was initialized.
    NotInitialized,
    /// Lookup matched no row.
    NotFound,
    /// Caller input rejected before reaching the store.
    InvalidInput,
    /// Store handle already closed.
    StoreUnavailable,
    /// I/O, corruption or constraint failure inside the store.
    StoreFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::StoreUnavailable => "store_unavailable",
            Self::StoreFailure => "store_failure",
        }
    }
}

/// Error half of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeError {
    pub kind: ErrorKind,
    /// Human-readable message suitable for display.
    pub message: String,
}

impl EnvelopeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound, NOTE_NOT_FOUND_MESSAGE)
    }
}

impl Display for EnvelopeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind.as_str())
    }
}

impl std::error::Error for EnvelopeError {}

/// Uniform operation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Ok(T),
    Err(EnvelopeError),
}

impl<T> Envelope<T> {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Err(EnvelopeError::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Ok(payload) => Some(payload),
            Self::Err(_) => None,
        }
    }

    pub fn error(&self) -> Option<&EnvelopeError> {
        match self {
            Self::Ok(_) => None,
            Self::Err(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<T, EnvelopeError> {
        match self {
            Self::Ok(payload) => Ok(payload),
            Self::Err(err) => Err(err),
        }
    }
}

#[derive(Serialize)]
struct SuccessWire<'a, T> {
    success: bool,
    #[serde(flatten)]
    payload: &'a T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureWire<'a> {
    success: bool,
    error: &'a str,
    error_kind: ErrorKind,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FailureWireOwned {
    error: String,
    #[serde(default)]
    error_kind: Option<ErrorKind>,
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok(payload) => SuccessWire {
                success: true,
                payload,
            }
            .serialize(serializer),
            Self::Err(err) => FailureWire {
                success: false,
                error: err.message.as_str(),
                error_kind: err.kind,
            }
            .serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Envelope<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let success = value
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| D::Error::custom("envelope is missing boolean `success`"))?;

        if success {
            if value.get("error").is_some() {
                return Err(D::Error::custom(
                    "envelope cannot be both successful and carry an error",
                ));
            }
            return T::deserialize(value).map(Self::Ok).map_err(D::Error::custom);
        }

        let wire: FailureWireOwned = serde_json::from_value(value).map_err(D::Error::custom)?;
        // Envelopes written before `errorKind` existed only carry the message.
        let kind = wire.error_kind.unwrap_or(if wire.error == NOTE_NOT_FOUND_MESSAGE {
            ErrorKind::NotFound
        } else {
            ErrorKind::StoreFailure
        });
        Ok(Self::Err(EnvelopeError::new(kind, wire.error)))
    }
}

/// Payload of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedNote {
    pub id: NoteId,
    pub message: String,
}

/// Payload of a successful single-note lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFound {
    pub note: Note,
}

/// Payload of a full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteList {
    pub notes: Vec<Note>,
}

/// Payload of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Row count of the whole collection, not of this page.
    pub total: u64,
    /// `offset + notes.len() < total`.
    pub has_more: bool,
}

/// Payload of a successful update or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

pub type CreateNoteResult = Envelope<CreatedNote>;
pub type GetNoteResult = Envelope<NoteFound>;
pub type GetAllNotesResult = Envelope<NoteList>;
pub type GetNotesWithPaginationResult = Envelope<NotePage>;
pub type UpdateNoteResult = Envelope<Ack>;
pub type DeleteNoteResult = Envelope<Ack>;
