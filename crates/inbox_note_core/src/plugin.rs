//! Plugin bootstrap and process-wide identity.
//!
//! # Responsibility
//! - Hold the once-per-process plugin identity (`NotePlugin::instance`).
//! - Run the load-time compatibility gate, load the text domain and register
//!   the weekly interval, the weekly event and the trigger hooks.
//! - Route fired hooks to the gatekeeper.
//!
//! # Invariants
//! - `instance()` always returns the same object.
//! - Duplicating or deserializing the plugin reports a `ProgrammingError`
//!   and never yields a second instance.
//! - An incompatible host gets no intervals, no events and no hooks.

use crate::config::PluginConfig;
use crate::host::{meets_minimum_version, HostEnvironment, TextDomainLoader};
use crate::repo::note_repo::NoteRepository;
use crate::repo::settings_repo::SettingsStore;
use crate::schedule::{sunday_this_week, JobScheduler, ScheduleError, ScheduleInterval};
use crate::service::gatekeeper::{GateOutcome, GatekeeperError, NoteGatekeeper};
use log::{info, warn};
use once_cell::sync::OnceCell;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const PLUGIN_NAME: &str = "Inbox Note Example";
/// Translation catalog domain.
pub const TEXT_DOMAIN: &str = "inbox-note-example";
/// Catalog directory, relative to the plugin root.
pub const LANGUAGES_PATH: &str = "languages";
/// Daily hook fired by the host scheduler.
pub const DAILY_HOOK: &str = "admin_daily";
/// Weekly hook scheduled by this plugin.
pub const WEEKLY_HOOK: &str = "admin_weekly";

static INSTANCE: OnceCell<NotePlugin> = OnceCell::new();

/// Misuse of the plugin singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammingError {
    CloneForbidden,
    DeserializeForbidden,
}

impl ProgrammingError {
    fn function(self) -> &'static str {
        match self {
            Self::CloneForbidden => "duplicate",
            Self::DeserializeForbidden => "deserialize",
        }
    }
}

impl Display for ProgrammingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CloneForbidden => write!(f, "Cloning this object is forbidden."),
            Self::DeserializeForbidden => {
                write!(f, "Unserializing instances of this class is forbidden.")
            }
        }
    }
}

impl Error for ProgrammingError {}

/// Outcome of loading the plugin into a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Host admin is missing or older than required; nothing registered.
    Incompatible {
        found: Option<String>,
        required: String,
    },
    Loaded(Registration),
}

/// What a successful load registered with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    hooks: Vec<&'static str>,
    translations_loaded: bool,
    weekly_first_run: Option<i64>,
}

impl Registration {
    /// Hooks routed to the gatekeeper.
    pub fn hooks(&self) -> &[&'static str] {
        &self.hooks
    }

    pub fn handles(&self, hook: &str) -> bool {
        self.hooks.iter().any(|registered| *registered == hook)
    }

    pub fn translations_loaded(&self) -> bool {
        self.translations_loaded
    }

    /// First run of the weekly event when this load scheduled it;
    /// `None` when it was already scheduled.
    pub fn weekly_first_run(&self) -> Option<i64> {
        self.weekly_first_run
    }

    /// Runs the gatekeeper if `hook` is one of ours.
    ///
    /// Returns `Ok(None)` for foreign hooks.
    pub fn dispatch<R: NoteRepository, S: SettingsStore>(
        &self,
        hook: &str,
        gatekeeper: &NoteGatekeeper<R, S>,
        now: i64,
    ) -> Result<Option<GateOutcome>, GatekeeperError> {
        if !self.handles(hook) {
            return Ok(None);
        }
        gatekeeper.maybe_create_note(now).map(Some)
    }
}

/// Process-wide plugin identity.
#[derive(Debug, PartialEq, Eq)]
pub struct NotePlugin {
    name: &'static str,
    version: &'static str,
    text_domain: &'static str,
}

impl NotePlugin {
    /// Returns the single plugin instance, creating it on first use.
    pub fn instance() -> &'static NotePlugin {
        INSTANCE.get_or_init(|| NotePlugin {
            name: PLUGIN_NAME,
            version: env!("CARGO_PKG_VERSION"),
            text_domain: TEXT_DOMAIN,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn text_domain(&self) -> &'static str {
        self.text_domain
    }

    /// Always fails: the plugin must not be copied.
    pub fn duplicate(&self) -> Result<NotePlugin, ProgrammingError> {
        Err(doing_it_wrong(ProgrammingError::CloneForbidden))
    }

    /// Loads the plugin into the host.
    ///
    /// # Errors
    /// - `ScheduleError` when the configured interval is unknown to the
    ///   scheduler.
    pub fn on_plugins_loaded(
        &self,
        host: &HostEnvironment,
        config: &PluginConfig,
        scheduler: &mut dyn JobScheduler,
        text_domains: &mut dyn TextDomainLoader,
        now: i64,
    ) -> Result<LoadOutcome, ScheduleError> {
        let found = host.admin_version.as_deref();
        if !meets_minimum_version(found, &config.minimum_admin_version) {
            info!(
                "event=plugin_load module=plugin status=skipped reason=incompatible_host found={} required={}",
                found.unwrap_or("none"),
                config.minimum_admin_version
            );
            return Ok(LoadOutcome::Incompatible {
                found: host.admin_version.clone(),
                required: config.minimum_admin_version.clone(),
            });
        }

        let translations_loaded = text_domains.load_text_domain(self.text_domain, LANGUAGES_PATH);

        scheduler.add_interval(ScheduleInterval::weekly());
        let weekly_first_run = if scheduler.next_scheduled(WEEKLY_HOOK).is_none() {
            let first_run = config.schedule_time.unwrap_or_else(|| sunday_this_week(now));
            scheduler.schedule_event(first_run, &config.schedule_interval, WEEKLY_HOOK)?;
            Some(first_run)
        } else {
            None
        };

        info!(
            "event=plugin_load module=plugin status=ok version={} translations_loaded={} weekly_scheduled={}",
            self.version,
            translations_loaded,
            weekly_first_run.is_some()
        );
        Ok(LoadOutcome::Loaded(Registration {
            hooks: vec![DAILY_HOOK, WEEKLY_HOOK],
            translations_loaded,
            weekly_first_run,
        }))
    }
}

impl<'de> Deserialize<'de> for NotePlugin {
    fn deserialize<D>(_deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Err(D::Error::custom(doing_it_wrong(
            ProgrammingError::DeserializeForbidden,
        )))
    }
}

/// Reports singleton misuse through the diagnostics log and returns it.
fn doing_it_wrong(err: ProgrammingError) -> ProgrammingError {
    warn!(
        "event=doing_it_wrong module=plugin status=error function={} version={} message={}",
        err.function(),
        env!("CARGO_PKG_VERSION"),
        err
    );
    err
}
