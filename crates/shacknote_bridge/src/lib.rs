//! Boundary between the display surface and the notes service.
//!
//! # Responsibility
//! - Enumerate the exact operation set the display may invoke.
//! - Carry requests and envelopes across the boundary as plain JSON data.
//!
//! # Invariants
//! - Only the six operations of `BridgeRequest` cross the boundary.
//! - Envelopes are relayed unchanged; the bridge adds no validation and no
//!   new envelope error kinds.

pub mod api;
pub mod client;
pub mod host;

pub use api::{BridgeError, BridgeRequest, BridgeResponse, BridgeResult, NotesApi};
pub use client::{ChannelBridge, JsonBridge};
pub use host::NotesHost;
