//! Line-oriented terminal front end for the display controller.
//!
//! Rendering is plain text; door animations complete as soon as a view has
//! been printed.

use crate::display::{DisplayController, EditorMode, EditorState, Screen};
use shacknote_bridge::NotesApi;
use shacknote_core::note_preview;
use std::io::{self, BufRead, Write};

const HELP: &str = "\
list            reload the first page
all             show every note
more            load the next page
new             start a new note
open <n>        edit note number n
title <text>    set the title
content <text>  set the content (editor markup)
save            save and return to the list
delete          delete the note being edited
back            return to the list without saving
help            show this help
quit            exit";

/// Reads commands from `input` until `quit` or end of input.
pub fn run<A: NotesApi>(
    controller: &mut DisplayController<A>,
    mut input: impl BufRead,
    mut output: impl Write,
) -> io::Result<()> {
    render(controller, &mut output)?;

    let mut line = String::new();
    loop {
        write!(output, "> ")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let trimmed = line.trim_end_matches(['\n', '\r']);
        let (command, arg) = match trimmed.split_once(' ') {
            Some((command, arg)) => (command, arg),
            None => (trimmed, ""),
        };

        let result = match command.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            "list" => controller.refresh(),
            "all" => controller.show_all(),
            "more" => controller.load_more(),
            "new" => controller.new_note(),
            "open" => match arg.trim().parse::<usize>() {
                Ok(number) if number > 0 => controller.open_note(number - 1),
                _ => {
                    writeln!(output, "usage: open <n>")?;
                    continue;
                }
            },
            "title" => controller.set_title(arg),
            "content" => controller.set_content(arg),
            "save" => controller.save(),
            "delete" => {
                let editing_stored = matches!(
                    controller.editor(),
                    Some(EditorState {
                        mode: EditorMode::Edit(_),
                        ..
                    })
                );
                if editing_stored
                    && !confirm(&mut input, &mut output, "Delete this note? [y/N] ")?
                {
                    continue;
                }
                controller.delete()
            }
            "back" => controller.back(),
            other => {
                writeln!(output, "unknown command `{other}`; type `help`")?;
                continue;
            }
        };

        if let Err(err) = result {
            // Failures from the store already surface as the notice.
            if controller.notice().is_none() {
                writeln!(output, "! {err}")?;
            }
        }
        if controller.is_busy() {
            controller.finish_animation();
        }
        render(controller, &mut output)?;
        controller.take_notice();
    }
    Ok(())
}

fn render<A: NotesApi>(controller: &DisplayController<A>, output: &mut impl Write) -> io::Result<()> {
    if let Some(notice) = controller.notice() {
        writeln!(output, "! {notice}")?;
    }
    match controller.screen() {
        Screen::List => {
            writeln!(output, "== ShackNote ({} notes) ==", controller.total())?;
            if controller.notes().is_empty() {
                writeln!(output, "No notes yet. Type `new` to create your first note.")?;
            }
            for (index, note) in controller.notes().iter().enumerate() {
                writeln!(output, "{:>3}. {}  [{}]", index + 1, note.title, note.updated_at)?;
                let preview = note_preview(&note.content);
                if !preview.is_empty() {
                    writeln!(output, "     {preview}")?;
                }
            }
            if controller.has_more() {
                writeln!(output, "(more available: `more`)")?;
            }
        }
        Screen::Editor(editor) => {
            let label = match editor.mode {
                EditorMode::Create => "New note",
                EditorMode::Edit(_) => "Edit note",
            };
            writeln!(output, "== {label} ==")?;
            writeln!(output, "title:   {}", editor.title)?;
            writeln!(output, "content: {}", editor.content)?;
        }
    }
    Ok(())
}

fn confirm(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> io::Result<bool> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::display::DisplayController;
    use shacknote_bridge::JsonBridge;
    use shacknote_core::NoteService;
    use std::io::Cursor;

    fn session(script: &str) -> String {
        let api = JsonBridge::in_process(NoteService::open_in_memory().unwrap());
        let mut controller = DisplayController::new(api, 2);
        controller.refresh().unwrap();
        let mut output = Vec::new();
        run(&mut controller, Cursor::new(script.to_string()), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn create_and_list_a_note() {
        let output = session("new\ntitle Groceries\ncontent <p>Milk, eggs</p>\nsave\nquit\n");
        assert!(output.contains("No notes yet"));
        assert!(output.contains("== New note =="));
        assert!(output.contains("  1. Groceries"));
        assert!(output.contains("Milk, eggs"));
    }

    #[test]
    fn save_without_title_shows_notice_and_stays_in_editor() {
        let output = session("new\nsave\nquit\n");
        assert!(output.contains("! Please enter a title"));
        assert!(output.trim_end().ends_with(">"));
        assert!(output.matches("== New note ==").count() >= 2);
    }

    #[test]
    fn delete_requires_confirmation() {
        let output = session(
            "new\ntitle doomed\nsave\nopen 1\ndelete\nn\nback\nopen 1\ndelete\ny\nquit\n",
        );
        assert!(output.contains("(0 notes)"));
        assert!(output.contains("(1 notes)"));
        assert!(output.trim_end().ends_with(">"));
    }

    #[test]
    fn delete_outside_a_stored_note_fails_without_prompting() {
        let output = session("delete\nnew\ndelete\nquit\n");
        assert!(!output.contains("Delete this note?"));
        assert!(output.contains("! only available in the editor view"));
        assert!(output.contains("! a new note has nothing to delete"));
    }

    #[test]
    fn open_reports_the_number_the_user_typed() {
        let output = session("new\ntitle only\nsave\nopen 5\nquit\n");
        assert!(output.contains("! no note at position 5"));
    }

    #[test]
    fn unknown_commands_are_reported() {
        let output = session("frobnicate\nopen zero\nquit\n");
        assert!(output.contains("unknown command `frobnicate`"));
        assert!(output.contains("usage: open <n>"));
    }
}
