//! Host settings collaborator and SQLite implementation.
//!
//! # Responsibility
//! - Read host-persisted values such as the install timestamp and the
//!   setup-complete flag.
//! - Provide typed helpers so gates never parse raw strings themselves.
//!
//! # Invariants
//! - Unknown keys read as `None`, never as an error.
//! - Flags are read by truthiness and never fail to parse.
//! - Integers that cannot be parsed are reported as `InvalidData`.

use crate::repo::note_repo::{table_exists, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Key holding the Unix epoch seconds when the host admin was installed.
pub const SETTING_INSTALL_TIMESTAMP: &str = "admin_install_timestamp";
/// Key holding whether the host onboarding task list is complete.
pub const SETTING_SETUP_COMPLETE: &str = "task_list_complete";
/// Key holding the in-process scheduler's intervals and events as JSON.
pub const SETTING_SCHEDULER_STATE: &str = "cron";

/// Key/value settings collaborator.
pub trait SettingsStore {
    /// Returns the raw value for `key`, if recorded.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Records `value` for `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;

    /// Returns the raw value for `key`, or `default` when unrecorded.
    fn get_or(&self, key: &str, default: &str) -> RepoResult<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// Reads an integer setting.
    fn get_i64(&self, key: &str) -> RepoResult<Option<i64>> {
        match self.get(key)? {
            Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
                RepoError::InvalidData(format!("setting `{key}` is not an integer: `{raw}`"))
            }),
            None => Ok(None),
        }
    }

    /// Reads a boolean setting; unrecorded reads as `default`.
    ///
    /// Blank, `0`, `false`, `no` and `off` (case-insensitive) are false;
    /// any other recorded value is true.
    fn get_bool(&self, key: &str, default: bool) -> RepoResult<bool> {
        Ok(self.get(key)?.map_or(default, |raw| parse_flag(&raw)))
    }
}

/// SQLite-backed settings store over the `settings` table.
pub struct SqliteSettingsStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "settings")? {
            return Err(RepoError::MissingRequiredTable("settings"));
        }
        Ok(Self { conn })
    }
}

impl SettingsStore for SqliteSettingsStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1;", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn parse_flag_reads_truthiness() {
        assert!(parse_flag("YES"));
        assert!(parse_flag("on"));
        assert!(parse_flag("2024-06-12"));
        assert!(!parse_flag(" 0 "));
        assert!(!parse_flag(""));
        assert!(!parse_flag("Off"));
    }
}
