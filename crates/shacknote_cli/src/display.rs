//! Display state machine.
//!
//! # Responsibility
//! - Hold purely presentational state: current screen, loaded list page,
//!   editor draft, door animation phase and the user-visible notice.
//! - Drive every note operation through `NotesApi`.
//!
//! # Invariants
//! - The screen is either `List` or `Editor`; there is no third state.
//! - While a door animation runs, further transitions are rejected.
//! - A failed save/delete leaves the editor and its draft untouched.

use log::{debug, warn};
use shacknote_bridge::{BridgeError, NotesApi};
use shacknote_core::{validate_title, Envelope, Note, NoteUpdate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const EMPTY_TITLE_NOTICE: &str = "Please enter a title";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// A transition is still animating.
    Busy,
    /// Action not available on the current screen.
    WrongScreen { expected: &'static str },
    /// List row index out of range.
    NoSuchRow(usize),
    /// Delete requested while creating a new note.
    NothingToDelete,
    /// `load_more` called with no further pages.
    NoMorePages,
    /// Title blank at save time.
    EmptyTitle,
    /// Operation reported failure; the message is also the notice.
    Failed(String),
}

impl Display for DisplayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "please wait for the current transition"),
            Self::WrongScreen { expected } => write!(f, "only available in the {expected} view"),
            // Positions are shown 1-based, as in the rendered list.
            Self::NoSuchRow(index) => write!(f, "no note at position {}", index + 1),
            Self::NothingToDelete => write!(f, "a new note has nothing to delete"),
            Self::NoMorePages => write!(f, "no more notes to load"),
            Self::EmptyTitle => write!(f, "{EMPTY_TITLE_NOTICE}"),
            Self::Failed(message) => write!(f, "{message}"),
        }
    }
}

impl Error for DisplayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    /// Editing a stored note; holds the note as it was loaded.
    Edit(Note),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub mode: EditorMode,
    pub title: String,
    /// Editor markup, stored verbatim.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    List,
    Editor(EditorState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    /// List to editor.
    Opening,
    /// Editor to list.
    Closing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ListState {
    notes: Vec<Note>,
    total: u64,
    has_more: bool,
}

pub struct DisplayController<A: NotesApi> {
    api: A,
    page_size: u32,
    screen: Screen,
    list: ListState,
    animation: AnimationPhase,
    notice: Option<String>,
}

impl<A: NotesApi> DisplayController<A> {
    /// Starts on an empty list; call `refresh` to load the first page.
    pub fn new(api: A, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            screen: Screen::List,
            list: ListState::default(),
            animation: AnimationPhase::Idle,
            notice: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn editor(&self) -> Option<&EditorState> {
        match &self.screen {
            Screen::Editor(editor) => Some(editor),
            Screen::List => None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.list.notes
    }

    pub fn total(&self) -> u64 {
        self.list.total
    }

    pub fn has_more(&self) -> bool {
        self.list.has_more
    }

    pub fn animation(&self) -> AnimationPhase {
        self.animation
    }

    pub fn is_busy(&self) -> bool {
        self.animation != AnimationPhase::Idle
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn into_api(self) -> A {
        self.api
    }

    /// Called by the host once the door animation has finished.
    pub fn finish_animation(&mut self) {
        self.animation = AnimationPhase::Idle;
    }

    /// Reloads the first page of the list.
    pub fn refresh(&mut self) -> Result<(), DisplayError> {
        let reply = self.api.get_notes_paginated(self.page_size, 0);
        let page = self.surface(reply)?.ok_or_else(|| self.last_failure())?;
        self.list = ListState {
            notes: page.notes,
            total: page.total,
            has_more: page.has_more,
        };
        debug!(
            "event=list_refresh module=display status=ok count={} total={}",
            self.list.notes.len(),
            self.list.total
        );
        Ok(())
    }

    /// Appends the next page to the list.
    pub fn load_more(&mut self) -> Result<(), DisplayError> {
        self.require_list()?;
        if !self.list.has_more {
            return Err(DisplayError::NoMorePages);
        }

        let offset = u32::try_from(self.list.notes.len()).unwrap_or(u32::MAX);
        let reply = self.api.get_notes_paginated(self.page_size, offset);
        let page = self.surface(reply)?.ok_or_else(|| self.last_failure())?;
        self.list.notes.extend(page.notes);
        self.list.total = page.total;
        self.list.has_more = page.has_more;
        Ok(())
    }

    /// Replaces the list with every note at once.
    pub fn show_all(&mut self) -> Result<(), DisplayError> {
        self.require_list()?;
        let reply = self.api.get_all_notes();
        let all = self.surface(reply)?.ok_or_else(|| self.last_failure())?;
        self.list = ListState {
            total: all.notes.len() as u64,
            notes: all.notes,
            has_more: false,
        };
        Ok(())
    }

    /// Opens an empty editor in create mode.
    pub fn new_note(&mut self) -> Result<(), DisplayError> {
        self.ensure_idle()?;
        self.require_list()?;
        self.notice = None;
        self.screen = Screen::Editor(EditorState {
            mode: EditorMode::Create,
            title: String::new(),
            content: String::new(),
        });
        self.animation = AnimationPhase::Opening;
        Ok(())
    }

    /// Opens the list row at `index` in edit mode, reloading it first.
    pub fn open_note(&mut self, index: usize) -> Result<(), DisplayError> {
        self.ensure_idle()?;
        self.require_list()?;
        let id = self
            .list
            .notes
            .get(index)
            .map(|note| note.id)
            .ok_or(DisplayError::NoSuchRow(index))?;

        let reply = self.api.get_one(id);
        let found = self.surface(reply)?.ok_or_else(|| self.last_failure())?;
        let note = found.note;
        self.screen = Screen::Editor(EditorState {
            title: note.title.clone(),
            content: note.content.clone(),
            mode: EditorMode::Edit(note),
        });
        self.animation = AnimationPhase::Opening;
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), DisplayError> {
        self.editor_mut()?.title = title.into();
        Ok(())
    }

    /// Replaces the draft content with the editor's latest markup.
    pub fn set_content(&mut self, content: impl Into<String>) -> Result<(), DisplayError> {
        self.editor_mut()?.content = content.into();
        Ok(())
    }

    /// Persists the draft and returns to the list.
    pub fn save(&mut self) -> Result<(), DisplayError> {
        self.ensure_idle()?;
        let editor = self.editor().cloned().ok_or(DisplayError::WrongScreen {
            expected: "editor",
        })?;
        if validate_title(&editor.title).is_err() {
            self.notice = Some(EMPTY_TITLE_NOTICE.to_string());
            return Err(DisplayError::EmptyTitle);
        }

        let saved = match &editor.mode {
            EditorMode::Create => {
                let reply = self.api.create(&editor.title, &editor.content);
                self.surface(reply)?.map(|_| ())
            }
            EditorMode::Edit(note) => {
                let update = NoteUpdate {
                    id: note.id,
                    title: editor.title.clone(),
                    content: editor.content.clone(),
                };
                let reply = self.api.update(&update);
                self.surface(reply)?.map(|_| ())
            }
        };
        saved.ok_or_else(|| self.last_failure())?;

        self.close_editor();
        Ok(())
    }

    /// Deletes the note being edited and returns to the list.
    pub fn delete(&mut self) -> Result<(), DisplayError> {
        self.ensure_idle()?;
        let id = match &self.screen {
            Screen::Editor(EditorState {
                mode: EditorMode::Edit(note),
                ..
            }) => note.id,
            Screen::Editor(_) => return Err(DisplayError::NothingToDelete),
            Screen::List => return Err(DisplayError::WrongScreen { expected: "editor" }),
        };

        let reply = self.api.delete(id);
        self.surface(reply)?.ok_or_else(|| self.last_failure())?;
        self.close_editor();
        Ok(())
    }

    /// Leaves the editor without persisting.
    pub fn back(&mut self) -> Result<(), DisplayError> {
        self.ensure_idle()?;
        if matches!(self.screen, Screen::List) {
            return Err(DisplayError::WrongScreen { expected: "editor" });
        }
        self.screen = Screen::List;
        self.animation = AnimationPhase::Closing;
        Ok(())
    }

    fn close_editor(&mut self) {
        self.screen = Screen::List;
        self.animation = AnimationPhase::Closing;
        self.notice = None;
        // A failed reload keeps the stale list and leaves its notice set.
        if let Err(err) = self.refresh() {
            warn!("event=list_refresh module=display status=error error={err}");
        }
    }

    /// Unwraps a bridge reply; failures are stored as the notice.
    ///
    /// Returns `Ok(None)` for an error envelope so callers can abort the
    /// transition with `last_failure()`.
    fn surface<T>(
        &mut self,
        reply: Result<Envelope<T>, BridgeError>,
    ) -> Result<Option<T>, DisplayError> {
        match reply {
            Ok(Envelope::Ok(payload)) => Ok(Some(payload)),
            Ok(Envelope::Err(err)) => {
                warn!(
                    "event=display_action module=display status=error error_code={}",
                    err.kind.as_str()
                );
                self.notice = Some(err.message);
                Ok(None)
            }
            Err(err) => {
                warn!(
                    "event=display_action module=display status=error error_code=bridge error={}",
                    err
                );
                let message = err.to_string();
                self.notice = Some(message.clone());
                Err(DisplayError::Failed(message))
            }
        }
    }

    fn last_failure(&self) -> DisplayError {
        DisplayError::Failed(self.notice.clone().unwrap_or_default())
    }

    fn ensure_idle(&self) -> Result<(), DisplayError> {
        if self.is_busy() {
            return Err(DisplayError::Busy);
        }
        Ok(())
    }

    fn require_list(&self) -> Result<(), DisplayError> {
        match self.screen {
            Screen::List => Ok(()),
            Screen::Editor(_) => Err(DisplayError::WrongScreen { expected: "list" }),
        }
    }

    fn editor_mut(&mut self) -> Result<&mut EditorState, DisplayError> {
        match &mut self.screen {
            Screen::Editor(editor) => Ok(editor),
            Screen::List => Err(DisplayError::WrongScreen { expected: "editor" }),
        }
    }
}
