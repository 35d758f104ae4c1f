//! Command-line host for the inbox note plugin.
//!
//! # Responsibility
//! - Play the host role: open storage, load the plugin, fire due triggers.
//! - Offer small maintenance commands for the settings the gates read.

use clap::{Parser, Subcommand};
use inbox_note_core::db::open_db;
use inbox_note_core::plugin::DAILY_HOOK;
use inbox_note_core::repo::settings_repo::{SETTING_INSTALL_TIMESTAMP, SETTING_SETUP_COMPLETE};
use inbox_note_core::schedule::DAILY_INTERVAL;
use inbox_note_core::service::gatekeeper::EXAMPLE_NOTE_NAME;
use inbox_note_core::{
    default_log_level, init_logging, unix_now_secs, HostEnvironment, InProcessScheduler,
    JobScheduler, LoadOutcome, NoteGatekeeper, NotePlugin, NoopTextDomainLoader, NoteRepository,
    PluginConfig, SettingsStore, SqliteNoteRepository, SqliteSettingsStore,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "inbox-note", version, about = "Scheduled inbox note plugin host")]
struct Cli {
    /// SQLite database file.
    #[arg(long, default_value = "inbox_note.sqlite3")]
    db: PathBuf,
    /// JSON file overriding plugin defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Installed host admin version; omit to simulate a host without it.
    #[arg(long)]
    admin_version: Option<String>,
    #[arg(long, default_value = "http://localhost/admin")]
    admin_url: String,
    /// Absolute directory for rolling log files; logging is off without it.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the plugin and run every trigger due now.
    ///
    /// Scheduler state is kept in the database, so a hook fires at most
    /// once per interval no matter how often this runs.
    Tick,
    /// Print stored notes with a given name.
    List {
        #[arg(long, default_value = EXAMPLE_NOTE_NAME)]
        name: String,
    },
    /// Record the host admin install time (defaults to now).
    MarkInstalled {
        #[arg(long)]
        at: Option<i64>,
    },
    /// Mark host setup as complete.
    SetSetupComplete,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_ref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy())?;
    }

    let config = match cli.config.as_ref() {
        Some(path) => PluginConfig::from_path(path)?,
        None => PluginConfig::default(),
    };
    let conn = open_db(&cli.db)?;
    let repo = SqliteNoteRepository::try_new(&conn)?;
    let settings = SqliteSettingsStore::try_new(&conn)?;
    let now = unix_now_secs();

    match cli.command {
        Command::Tick => {
            let host = match cli.admin_version {
                Some(version) => HostEnvironment::new(version, cli.admin_url),
                None => HostEnvironment::without_admin(cli.admin_url),
            };
            tick(&host, config, repo, settings, now)
        }
        Command::List { name } => {
            for note in repo.list_by_name(&name)? {
                let line = serde_json::json!({
                    "preview": note.preview_text(),
                    "note": note,
                });
                println!("{line}");
            }
            Ok(())
        }
        Command::MarkInstalled { at } => {
            let at = at.unwrap_or(now);
            settings.set(SETTING_INSTALL_TIMESTAMP, &at.to_string())?;
            println!("{SETTING_INSTALL_TIMESTAMP}={at}");
            Ok(())
        }
        Command::SetSetupComplete => {
            settings.set(SETTING_SETUP_COMPLETE, "1")?;
            println!("{SETTING_SETUP_COMPLETE}=1");
            Ok(())
        }
    }
}

fn tick(
    host: &HostEnvironment,
    config: PluginConfig,
    repo: SqliteNoteRepository<'_>,
    settings: SqliteSettingsStore<'_>,
    now: i64,
) -> Result<(), Box<dyn Error>> {
    let mut scheduler = InProcessScheduler::load(&settings)?;
    // The host owns the daily event; the first run ever treats it as due.
    if scheduler.next_scheduled(DAILY_HOOK).is_none() {
        scheduler.schedule_event(now, DAILY_INTERVAL, DAILY_HOOK)?;
    }

    let outcome = NotePlugin::instance().on_plugins_loaded(
        host,
        &config,
        &mut scheduler,
        &mut NoopTextDomainLoader,
        now,
    )?;
    let registration = match outcome {
        LoadOutcome::Loaded(registration) => registration,
        LoadOutcome::Incompatible { found, required } => {
            println!(
                "plugin inactive: host admin {} does not satisfy >= {required}",
                found.as_deref().unwrap_or("(absent)")
            );
            return Ok(());
        }
    };

    // Due runs are consumed before the handlers execute.
    let due = scheduler.take_due(now);
    scheduler.save(&settings)?;

    let gatekeeper = NoteGatekeeper::new(repo, settings, config, host);
    for hook in due {
        if let Some(outcome) = registration.dispatch(&hook, &gatekeeper, now)? {
            info!(
                "event=cli_tick module=cli status=ok hook={} outcome={}",
                hook,
                outcome.as_str()
            );
            println!("{hook}: {}", outcome.as_str());
        }
    }
    Ok(())
}
