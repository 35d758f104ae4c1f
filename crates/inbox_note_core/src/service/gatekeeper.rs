//! Note gatekeeper.
//!
//! # Responsibility
//! - Decide on each trigger whether the example note should be (re)created.
//! - Delegate construction to `NoteBuilder` and persistence to the injected
//!   `NoteRepository`.
//!
//! # Invariants
//! - Gates run in a fixed order: readiness, age, dedup, feature flag.
//! - A disabled gate is skipped entirely and has no side effects.
//! - Unreadable host settings skip the trigger instead of failing it.
//! - Under `DedupPolicy::Abort` a trigger never increases the number of
//!   notes sharing the example name.
//! - Save failures propagate to the caller; nothing is retried here.

use crate::config::{DedupPolicy, PluginConfig};
use crate::host::HostEnvironment;
use crate::model::config::{ActionConfig, NoteConfig};
use crate::model::note::{ActionStatus, NoteId};
use crate::repo::note_repo::{NoteRepository, RepoError, RepoResult};
use crate::repo::settings_repo::{SettingsStore, SETTING_INSTALL_TIMESTAMP, SETTING_SETUP_COMPLETE};
use crate::service::note_builder::{NoteBuilder, NoteDefaults, DEFAULT_NOTE_SOURCE};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Dedup key of the example note.
pub const EXAMPLE_NOTE_NAME: &str = "inbox-note-example";
/// Project page linked from the example note.
pub const EXAMPLE_PROJECT_URL: &str = "https://github.com/seb86/wc-admin-notice-example";

/// Result of one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// A fresh note was saved.
    Created(NoteId),
    /// Host setup is not complete yet.
    SetupIncomplete,
    /// Host admin has not been installed long enough.
    NotActiveLongEnough,
    /// Notes with the example name exist and the policy is abort.
    AlreadyExists { existing: usize },
    /// The feature flag is off. `removed` counts notes the replace policy
    /// deleted before the flag was checked.
    Disabled { removed: usize },
}

impl GateOutcome {
    /// Stable label used in log events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::SetupIncomplete => "setup_incomplete",
            Self::NotActiveLongEnough => "not_active_long_enough",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Disabled { .. } => "disabled",
        }
    }
}

/// Gatekeeper failure; only persistence can fail.
#[derive(Debug)]
pub enum GatekeeperError {
    Repo(RepoError),
}

impl Display for GatekeeperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "note gatekeeper storage failure: {err}"),
        }
    }
}

impl Error for GatekeeperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for GatekeeperError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Per-process context handed to the trigger handler.
pub struct NoteGatekeeper<R: NoteRepository, S: SettingsStore> {
    repo: R,
    settings: S,
    config: PluginConfig,
    builder: NoteBuilder,
    admin_url: String,
}

impl<R: NoteRepository, S: SettingsStore> NoteGatekeeper<R, S> {
    /// Creates the gatekeeper with its collaborators.
    pub fn new(repo: R, settings: S, config: PluginConfig, host: &HostEnvironment) -> Self {
        let builder = NoteBuilder::new(NoteDefaults {
            action_primary: config.default_action_primary,
            ..NoteDefaults::default()
        });
        Self {
            repo,
            settings,
            config,
            builder,
            admin_url: host.admin_url.clone(),
        }
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Runs every enabled gate and creates the example note when all pass.
    ///
    /// `now` is Unix epoch seconds.
    pub fn maybe_create_note(&self, now: i64) -> Result<GateOutcome, GatekeeperError> {
        let outcome = self.run_gates(now);
        match &outcome {
            Ok(GateOutcome::Created(note_id)) => info!(
                "event=note_gate module=gatekeeper status=ok outcome=created note_id={}",
                note_id
            ),
            Ok(skipped) => info!(
                "event=note_gate module=gatekeeper status=skipped outcome={}",
                skipped.as_str()
            ),
            Err(err) => error!(
                "event=note_gate module=gatekeeper status=error error={}",
                err
            ),
        }
        outcome
    }

    fn run_gates(&self, now: i64) -> Result<GateOutcome, GatekeeperError> {
        if self.config.require_setup_complete
            && !self.settings.get_bool(SETTING_SETUP_COMPLETE, false)?
        {
            return Ok(GateOutcome::SetupIncomplete);
        }

        if self.config.require_min_active && !self.active_for(self.config.min_active_secs, now)? {
            return Ok(GateOutcome::NotActiveLongEnough);
        }

        let removed = match self.config.dedup_policy {
            DedupPolicy::Off => 0,
            DedupPolicy::Abort => {
                let existing = self.repo.find_by_name(EXAMPLE_NOTE_NAME)?.len();
                if existing > 0 {
                    return Ok(GateOutcome::AlreadyExists { existing });
                }
                0
            }
            DedupPolicy::Replace => {
                let removed = self.repo.delete_by_name(EXAMPLE_NOTE_NAME)?;
                if removed > 0 {
                    info!(
                        "event=note_dedup module=gatekeeper status=ok removed={}",
                        removed
                    );
                }
                removed
            }
        };

        if !self.config.enabled {
            return Ok(GateOutcome::Disabled { removed });
        }

        let note_id = self.create_new_note(example_note_config(&self.admin_url), now)?;
        Ok(GateOutcome::Created(note_id))
    }

    /// Builds a note from `config` and saves it without consulting gates.
    ///
    /// # Errors
    /// - `Repo(Validation(EmptyName))` when `config` carries no note name.
    pub fn create_new_note(&self, config: NoteConfig, now: i64) -> Result<NoteId, GatekeeperError> {
        let note = self.builder.build(config, now);
        let note_id = self.repo.save(&note)?;
        info!(
            "event=note_create module=gatekeeper status=ok note_id={} name={} actions={}",
            note_id,
            note.name,
            note.actions.len()
        );
        Ok(note_id)
    }

    /// See [`active_for`].
    pub fn active_for(&self, seconds: u64, now: i64) -> RepoResult<bool> {
        active_for(&self.settings, seconds, now)
    }
}

/// Returns whether the host admin has been installed for at least
/// `seconds` as of `now` (Unix epoch seconds).
///
/// `false` when no readable install timestamp has been recorded.
pub fn active_for<S: SettingsStore + ?Sized>(
    settings: &S,
    seconds: u64,
    now: i64,
) -> RepoResult<bool> {
    let installed_at = match settings.get_i64(SETTING_INSTALL_TIMESTAMP) {
        Ok(Some(installed_at)) => installed_at,
        Ok(None) => return Ok(false),
        Err(RepoError::InvalidData(message)) => {
            warn!(
                "event=note_gate module=gatekeeper status=skipped reason=invalid_setting message={}",
                message
            );
            return Ok(false);
        }
        Err(err) => return Err(err),
    };
    let required = i64::try_from(seconds).unwrap_or(i64::MAX);
    Ok(now.saturating_sub(installed_at) >= required)
}

/// The note this plugin places in the inbox.
pub fn example_note_config(admin_url: &str) -> NoteConfig {
    NoteConfig {
        title: Some("My Note Title".to_string()),
        content: Some(
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Iam enim adesse poterit. \
             Prodest, inquit, mihi eo esse animo. <strong>Pollicetur certe.</strong> \
             Duo Reges: constructio interrete."
                .to_string(),
        ),
        icon: Some("reader".to_string()),
        note_name: Some(EXAMPLE_NOTE_NAME.to_string()),
        source: Some(DEFAULT_NOTE_SOURCE.to_string()),
        actions: vec![
            ActionConfig {
                name: Some("do-something".to_string()),
                label: Some("Click Me".to_string()),
                query: Some(admin_url.to_string()),
                status: Some(ActionStatus::Actioned),
                primary: Some(false),
            },
            ActionConfig {
                name: Some("external-url".to_string()),
                label: Some("View Repository".to_string()),
                query: Some(EXAMPLE_PROJECT_URL.to_string()),
                status: Some(ActionStatus::Actioned),
                primary: Some(true),
            },
        ],
        is_snoozable: Some(true),
        locale: Some("en_US".to_string()),
        ..NoteConfig::default()
    }
}
