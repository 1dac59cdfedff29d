//! Display-side bridge clients.
//!
//! # Responsibility
//! - Turn typed `NotesApi` calls into JSON requests and decode the replies.
//! - Provide an in-process transport and a thread-isolated transport.
//!
//! # Invariants
//! - Every call is marshalled through JSON, including the in-process one,
//!   so no references cross the boundary.
//! - The host thread is the only owner of the store handle; it closes the
//!   store when the last client handle is gone.

use crate::api::{BridgeError, BridgeRequest, BridgeResult, NotesApi};
use crate::host::NotesHost;
use log::{error, info};
use serde::de::DeserializeOwned;
use shacknote_core::{
    CreateNoteResult, DeleteNoteResult, GetAllNotesResult, GetNoteResult,
    GetNotesWithPaginationResult, NoteId, NoteService, NoteUpdate, UpdateNoteResult,
};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

/// Moves one encoded request to the host and returns the encoded reply.
pub trait JsonTransport {
    fn call_json(&mut self, raw: &str) -> BridgeResult<String>;
}

impl JsonTransport for NotesHost {
    fn call_json(&mut self, raw: &str) -> BridgeResult<String> {
        self.handle_json(raw)
    }
}

/// Typed `NotesApi` over any JSON transport.
pub struct BridgeClient<T> {
    transport: T,
}

/// In-process client; the host lives in the same thread.
pub type JsonBridge = BridgeClient<NotesHost>;
/// Client whose host runs on a dedicated thread.
pub type ChannelBridge = BridgeClient<HostThread>;

impl<T: JsonTransport> BridgeClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn call<R: DeserializeOwned>(&mut self, request: &BridgeRequest) -> BridgeResult<R> {
        let raw = serde_json::to_string(request).map_err(BridgeError::Encode)?;
        let reply = self.transport.call_json(&raw)?;
        serde_json::from_str(&reply).map_err(BridgeError::Decode)
    }
}

impl<T: JsonTransport> NotesApi for BridgeClient<T> {
    fn get_all_notes(&mut self) -> BridgeResult<GetAllNotesResult> {
        self.call(&BridgeRequest::GetAllNotes)
    }

    fn get_notes_paginated(
        &mut self,
        limit: u32,
        offset: u32,
    ) -> BridgeResult<GetNotesWithPaginationResult> {
        self.call(&BridgeRequest::GetNotesPaginated { limit, offset })
    }

    fn get_one(&mut self, id: NoteId) -> BridgeResult<GetNoteResult> {
        self.call(&BridgeRequest::GetOne { id })
    }

    fn create(&mut self, title: &str, content: &str) -> BridgeResult<CreateNoteResult> {
        self.call(&BridgeRequest::Create {
            title: title.to_string(),
            content: content.to_string(),
        })
    }

    fn update(&mut self, note: &NoteUpdate) -> BridgeResult<UpdateNoteResult> {
        self.call(&BridgeRequest::Update { note: note.clone() })
    }

    fn delete(&mut self, id: NoteId) -> BridgeResult<DeleteNoteResult> {
        self.call(&BridgeRequest::Delete { id })
    }
}

type Job = (String, mpsc::Sender<BridgeResult<String>>);

/// Host running on its own thread; requests are handled one at a time.
pub struct HostThread {
    sender: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl HostThread {
    /// Moves an initialized service onto a new host thread.
    pub fn spawn(service: NoteService) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let worker = thread::Builder::new()
            .name("notes-host".to_string())
            .spawn(move || {
                let host = NotesHost::new(service);
                info!("event=host_start module=bridge status=ok");
                for (raw, reply) in receiver {
                    // A dropped reply channel only means the caller gave up.
                    let _ = reply.send(host.handle_json(&raw));
                }
                host.shutdown();
                info!("event=host_stop module=bridge status=ok");
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Stops accepting requests, then waits for the store to close.
    pub fn shutdown(mut self) {
        self.stop();
    }

    /// Stops the host in place; later calls fail with `Disconnected`.
    pub fn stop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("event=host_stop module=bridge status=error error_code=host_panicked");
            }
        }
    }
}

impl JsonTransport for HostThread {
    fn call_json(&mut self, raw: &str) -> BridgeResult<String> {
        let sender = self.sender.as_ref().ok_or(BridgeError::Disconnected)?;
        let (reply_tx, reply_rx) = mpsc::channel();
        sender
            .send((raw.to_string(), reply_tx))
            .map_err(|_| BridgeError::Disconnected)?;
        reply_rx.recv().map_err(|_| BridgeError::Disconnected)?
    }
}

impl Drop for HostThread {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ChannelBridge {
    /// Starts a host thread for `service` and returns a client for it.
    pub fn spawn(service: NoteService) -> std::io::Result<Self> {
        Ok(Self::new(HostThread::spawn(service)?))
    }

    /// Stops the host thread and closes the store.
    pub fn shutdown(self) {
        self.into_transport().shutdown();
    }
}

impl JsonBridge {
    /// Wraps `service` in an in-process host.
    pub fn in_process(service: NoteService) -> Self {
        Self::new(NotesHost::new(service))
    }
}
