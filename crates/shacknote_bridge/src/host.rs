//! Privileged side of the bridge.
//!
//! # Responsibility
//! - Own the notes service and dispatch decoded requests to it.
//! - Serialize returned envelopes unchanged.

use crate::api::{BridgeError, BridgeRequest, BridgeResponse, BridgeResult};
use log::{debug, warn};
use shacknote_core::NoteService;

/// Dispatches bridge requests to the notes service it owns.
pub struct NotesHost {
    service: NoteService,
}

impl NotesHost {
    pub fn new(service: NoteService) -> Self {
        Self { service }
    }

    /// Runs one typed request against the service.
    pub fn handle(&self, request: BridgeRequest) -> BridgeResponse {
        debug!(
            "event=bridge_call module=bridge status=start op={} channel={}",
            request.op_name(),
            request.channel()
        );
        let op = request.op_name();

        let response = match request {
            BridgeRequest::GetAllNotes => BridgeResponse::AllNotes(self.service.get_all()),
            BridgeRequest::GetNotesPaginated { limit, offset } => {
                BridgeResponse::Page(self.service.get_page(limit, offset))
            }
            BridgeRequest::GetOne { id } => BridgeResponse::Note(self.service.get_one(id)),
            BridgeRequest::Create { title, content } => {
                BridgeResponse::Created(self.service.create(&title, &content))
            }
            BridgeRequest::Update { note } => BridgeResponse::Updated(self.service.update(
                note.id,
                &note.title,
                &note.content,
            )),
            BridgeRequest::Delete { id } => BridgeResponse::Deleted(self.service.delete(id)),
        };

        debug!(
            "event=bridge_call module=bridge status=ok op={} success={}",
            op,
            response.is_success()
        );
        response
    }

    /// Decodes a JSON request, runs it, and encodes the envelope.
    pub fn handle_json(&self, raw: &str) -> BridgeResult<String> {
        let request: BridgeRequest = serde_json::from_str(raw).map_err(|err| {
            warn!(
                "event=bridge_call module=bridge status=error error_code=decode_failed error={}",
                err
            );
            BridgeError::Decode(err)
        })?;
        let response = self.handle(request);
        serde_json::to_string(&response).map_err(BridgeError::Encode)
    }

    /// Closes the underlying store.
    pub fn shutdown(mut self) {
        self.service.close();
    }
}

#[cfg(test)]
mod tests {
    use super::NotesHost;
    use crate::api::{BridgeError, BridgeRequest, BridgeResponse};
    use serde_json::{json, Value};
    use shacknote_core::{NoteService, NoteUpdate};

    fn host() -> NotesHost {
        NotesHost::new(NoteService::open_in_memory().unwrap())
    }

    fn call(host: &NotesHost, request: Value) -> Value {
        let raw = host.handle_json(&request.to_string()).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn typed_dispatch_matches_direct_service_calls() {
        let host = host();
        let created = host.handle(BridgeRequest::Create {
            title: "t".to_string(),
            content: "c".to_string(),
        });
        let BridgeResponse::Created(envelope) = created else {
            panic!("create must answer with a create envelope");
        };
        let id = envelope.into_result().unwrap().id;

        let updated = host.handle(BridgeRequest::Update {
            note: NoteUpdate {
                id,
                title: "t2".to_string(),
                content: "c2".to_string(),
            },
        });
        assert!(updated.is_success());
        assert!(matches!(
            host.handle(BridgeRequest::GetOne { id }),
            BridgeResponse::Note(envelope) if envelope.payload().unwrap().note.title == "t2"
        ));
    }

    #[test]
    fn json_scenario_preserves_envelope_shapes() {
        let host = host();

        let created = call(
            &host,
            json!({"op": "create", "args": {"title": "Groceries", "content": "Milk, eggs"}}),
        );
        assert_eq!(created["success"], true);
        assert_eq!(created["id"], 1);
        assert_eq!(created["message"], "Note created successfully");

        let all = call(&host, json!({"op": "getAllNotes"}));
        assert_eq!(all["notes"][0]["title"], "Groceries");

        let updated = call(
            &host,
            json!({"op": "update", "args": {"note": {"id": 1, "title": "Groceries v2", "content": "Milk"}}}),
        );
        assert_eq!(updated["success"], true);

        let one = call(&host, json!({"op": "getOne", "args": {"id": 1}}));
        assert_eq!(one["note"]["title"], "Groceries v2");

        let deleted = call(&host, json!({"op": "delete", "args": {"id": 1}}));
        assert_eq!(deleted["success"], true);

        let missing = call(&host, json!({"op": "getOne", "args": {"id": 1}}));
        assert_eq!(
            missing,
            json!({"success": false, "error": "Note not found", "errorKind": "not_found"})
        );
    }

    #[test]
    fn paginated_response_carries_total_and_has_more() {
        let host = host();
        for idx in 0..10 {
            call(
                &host,
                json!({"op": "create", "args": {"title": format!("n{idx}"), "content": ""}}),
            );
        }

        let page = call(
            &host,
            json!({"op": "getNotesPaginated", "args": {"limit": 4, "offset": 8}}),
        );
        assert_eq!(page["notes"].as_array().unwrap().len(), 2);
        assert_eq!(page["total"], 10);
        assert_eq!(page["hasMore"], false);
    }

    #[test]
    fn unknown_operation_is_a_decode_error() {
        let host = host();
        let err = host.handle_json(r#"{"op":"exec","args":{"sql":"DROP TABLE notes"}}"#);
        assert!(matches!(err, Err(BridgeError::Decode(_))));
    }
}
