//! slotedit CLI - binary entry point.
//!
//! # Architecture
//!
//! The CLI wires [`slotedit_engine`] to real capabilities and runs one command
//! per invocation:
//!
//! ```text
//! main() -> load config -> Engine::builder(..).build() -> mount() -> command -> unmount()
//! ```
//!
//! | Capability | Implementation |
//! |------------|----------------|
//! | widgets | in-memory [`terminal::BufferWidget`] per open slot |
//! | transport | [`HttpTransport`] against `server.endpoint` |
//! | storage | [`FileStorage`] under the local data dir |
//! | ui | [`terminal::TerminalUi`], notices on stderr |
//! | hooks | [`FieldMappedHooks`] from the `[[slots]]` table |
//!
//! Unsaved edits (from `import`) live in the persisted engine state between
//! invocations, exactly as they would across page reloads.

mod args;
mod terminal;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use slotedit_engine::slotedit_config::{
    ConfigSource, EditorSettings, TomlConfig, config_path, slots_from_source,
};
use slotedit_engine::slotedit_transport::HttpTransport;
use slotedit_engine::{
    DiscardStep, DiscardTarget, Engine, FieldMappedHooks, FileStorage, InitialFetch,
};

use crate::args::{Cli, Command};
use crate::terminal::{BufferWidgets, TerminalUi, confirm, format_slot_line};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match open_log_file() {
        Ok((path, file)) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %path.display(), "Logging initialized");
        }
        // Without a log file, stay silent rather than mixing logs into command output.
        Err(_) => tracing_subscriber::registry().with(env_filter).init(),
    }
}

/// `~/.slotedit/logs/slotedit.log`, or `.slotedit/logs/` in the working
/// directory when there is no home.
fn open_log_file() -> io::Result<(PathBuf, fs::File)> {
    let dir = config_path()
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(".slotedit"))
        .join("logs");
    fs::create_dir_all(&dir)?;
    let path = dir.join("slotedit.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

fn load_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return TomlConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()));
    }
    TomlConfig::load()?.ok_or_else(|| {
        let expected = config_path()
            .map_or_else(|| "~/.slotedit/config.toml".to_string(), |p| p.display().to_string());
        anyhow!("no configuration found; create {expected} or pass --config")
    })
}

fn build_engine(config: &dyn ConfigSource) -> Result<Engine> {
    let settings = EditorSettings::resolve(config)?;
    let slots = slots_from_source(config)?;
    let storage_dir = FileStorage::default_dir()
        .unwrap_or_else(|| PathBuf::from(".slotedit").join("state"));
    tracing::debug!(dir = %storage_dir.display(), "Using state directory");

    let engine = Engine::builder(settings, slots.clone())
        .widgets(BufferWidgets)
        .transport(HttpTransport::new()?)
        .storage(FileStorage::new(storage_dir))
        .ui(TerminalUi)
        .hooks(FieldMappedHooks::new(slots))
        .build()?;
    Ok(engine)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref())?;
    let mut engine = build_engine(&config)?;

    // Terminal sessions always use the desktop layout.
    let width = engine.settings().desktop_breakpoint;
    if let InitialFetch::Failed(err) = engine.mount(width).await
        && cli.command.needs_server()
    {
        engine.unmount();
        bail!("could not reach the document server: {err}");
    }

    let result = run(&mut engine, cli.command).await;
    engine.unmount();
    result
}

async fn run(engine: &mut Engine, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            for view in engine.slot_views() {
                let content = engine.content(&view.id).unwrap_or_default();
                println!("{}", format_slot_line(&view, content));
            }
            if engine.has_unsaved_changes() {
                println!("\nUnsaved changes are kept locally until saved or discarded.");
            }
        }
        Command::Import { slot, file } => {
            let bytes = fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            engine.import_file(&slot, &file_name, &bytes).await?;
        }
        Command::Export { slot, out } => {
            let exported = engine
                .export_slot(&slot)
                .ok_or_else(|| anyhow!("unknown slot: {slot}"))?;
            match out {
                Some(path) => {
                    fs::write(&path, exported.content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Wrote {}", path.display());
                }
                None => print!("{}", exported.content),
            }
        }
        Command::Save { slot } => {
            engine.save_slot(&slot).await?;
        }
        Command::SaveAll => {
            engine.save_all().await?;
        }
        Command::Discard { slot } => {
            let target = match slot {
                Some(id) => DiscardTarget::Slot(
                    engine
                        .slot_views()
                        .into_iter()
                        .map(|v| v.id)
                        .find(|candidate| candidate.as_str() == id)
                        .ok_or_else(|| anyhow!("unknown slot: {id}"))?,
                ),
                None => DiscardTarget::All,
            };
            discard_with_prompt(engine, &target, confirm)?;
        }
        Command::Reload => {
            engine.reload_from_server().await?;
        }
    }
    Ok(())
}

/// Arm the discard, ask, and revert on "yes".
///
/// The confirm is stamped with the arming instant: the prompt blocks, so a
/// slow answer still lands inside the confirmation window.
fn discard_with_prompt(
    engine: &mut Engine,
    target: &DiscardTarget,
    ask: impl FnOnce(&str) -> io::Result<bool>,
) -> Result<()> {
    let armed_at = Instant::now();
    match engine.request_discard(target, armed_at) {
        DiscardStep::Armed => {}
        DiscardStep::Ignored => bail!("unknown discard target: {target}"),
        _ => return Ok(()),
    }

    let question = match target {
        DiscardTarget::All => "Discard all unsaved changes?".to_string(),
        DiscardTarget::Slot(id) => format!("Discard unsaved changes to {id}?"),
    };
    if !ask(&question)? {
        eprintln!("Kept changes.");
        return Ok(());
    }

    match engine.confirm_discard(target, armed_at) {
        DiscardStep::Reverted(_) => Ok(()),
        step => bail!("discard was not applied ({step:?})"),
    }
}
