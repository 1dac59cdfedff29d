//! ShackNote terminal entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open the notes store.
//! - Serve either one raw bridge request (`--request`) or the interactive
//!   list/editor session.

mod cli;
mod display;
mod repl;

use clap::Parser;
use cli::Cli;
use display::DisplayController;
use log::{error, info};
use shacknote_bridge::{ChannelBridge, NotesHost};
use shacknote_core::{init_logging, NoteService};
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Cli::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=app_exit module=cli status=error error={message}");
            eprintln!("shacknote: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<(), String> {
    let config = args.resolve_config().map_err(|err| err.to_string())?;
    // Logging is best-effort; the notes store must stay usable without it.
    if let Err(err) = init_logging(config.log_level, &config.log_dir) {
        eprintln!("shacknote: logging disabled: {err}");
    }
    info!(
        "event=app_start module=cli status=ok version={} db={}",
        shacknote_core::core_version(),
        config.db_path.display()
    );

    let service = NoteService::open(&config.db_path).map_err(|err| err.to_string())?;

    if let Some(raw) = &args.request {
        let host = NotesHost::new(service);
        let reply = host.handle_json(raw).map_err(|err| err.to_string());
        host.shutdown();
        println!("{}", reply?);
        return Ok(());
    }

    let api = ChannelBridge::spawn(service).map_err(|err| err.to_string())?;
    let mut controller = DisplayController::new(api, config.page_size);
    if let Err(err) = controller.refresh() {
        eprintln!("shacknote: {err}");
    }

    let stdin = io::stdin();
    let session = repl::run(&mut controller, stdin.lock(), io::stdout());
    controller.into_api().shutdown();
    session.map_err(|err| err.to_string())?;

    info!("event=app_exit module=cli status=ok");
    Ok(())
}
