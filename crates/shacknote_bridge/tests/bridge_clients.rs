use shacknote_bridge::{BridgeError, ChannelBridge, JsonBridge, NotesApi};
use shacknote_core::{ErrorKind, NoteService, NoteUpdate};

fn exercise_crud_scenario(api: &mut impl NotesApi) {
    let created = api
        .create("Groceries", "Milk, eggs")
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(created.id, 1);

    let all = api.get_all_notes().unwrap().into_result().unwrap().notes;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Groceries");

    let mut update = NoteUpdate::from(&all[0]);
    update.title = "Groceries v2".to_string();
    update.content = "Milk".to_string();
    assert!(api.update(&update).unwrap().is_success());

    let note = api.get_one(1).unwrap().into_result().unwrap().note;
    assert_eq!(note.title, "Groceries v2");
    assert!(note.updated_at >= note.created_at);

    assert!(api.delete(1).unwrap().is_success());
    let missing = api.get_one(1).unwrap().into_result().unwrap_err();
    assert_eq!(missing.kind, ErrorKind::NotFound);
}

#[test]
fn json_bridge_relays_full_crud_scenario() {
    let mut api = JsonBridge::in_process(NoteService::open_in_memory().unwrap());
    exercise_crud_scenario(&mut api);
}

#[test]
fn channel_bridge_relays_full_crud_scenario() {
    let mut api = ChannelBridge::spawn(NoteService::open_in_memory().unwrap()).unwrap();
    exercise_crud_scenario(&mut api);
    api.shutdown();
}

#[test]
fn channel_bridge_paginates_like_the_service() {
    let mut api = ChannelBridge::spawn(NoteService::open_in_memory().unwrap()).unwrap();
    for idx in 0..10 {
        api.create(&format!("note {idx}"), "").unwrap();
    }

    let first = api.get_notes_paginated(4, 0).unwrap().into_result().unwrap();
    assert_eq!((first.notes.len(), first.total, first.has_more), (4, 10, true));

    let last = api.get_notes_paginated(4, 8).unwrap().into_result().unwrap();
    assert_eq!((last.notes.len(), last.total, last.has_more), (2, 10, false));
}

#[test]
fn error_envelopes_cross_the_bridge_unchanged() {
    let service = NoteService::open_in_memory().unwrap();
    let direct = service.create("  ", "x");

    let mut api = JsonBridge::in_process(service);
    let relayed = api.create("  ", "x").unwrap();
    assert_eq!(relayed, direct);
    assert_eq!(relayed.error().unwrap().kind, ErrorKind::InvalidInput);
}

#[test]
fn uninitialized_service_reports_not_initialized_through_bridge() {
    let mut api = JsonBridge::in_process(NoteService::in_memory());
    let envelope = api.get_all_notes().unwrap();
    assert_eq!(envelope.error().unwrap().kind, ErrorKind::NotInitialized);
}

#[test]
fn stopped_host_reports_disconnected() {
    let mut api = ChannelBridge::spawn(NoteService::open_in_memory().unwrap()).unwrap();
    api.transport_mut().stop();
    assert!(matches!(api.get_all_notes(), Err(BridgeError::Disconnected)));
}

#[test]
fn host_thread_releases_database_file_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let mut api = ChannelBridge::spawn(NoteService::open(&path).unwrap()).unwrap();
    api.create("persisted", "<p>body</p>").unwrap();
    api.shutdown();

    let service = NoteService::open(&path).unwrap();
    let notes = service.get_all().into_result().unwrap().notes;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "persisted");
}
