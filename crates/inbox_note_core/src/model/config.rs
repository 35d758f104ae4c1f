//! Partial note input accepted by the note builder.
//!
//! Every field is optional; omitted fields are filled by
//! `service::note_builder` and supplied fields always win.

use crate::model::note::{ActionStatus, NoteType};
use serde::{Deserialize, Serialize};

/// Partial configuration of one inbox note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    pub title: Option<String>,
    pub content: Option<String>,
    pub content_data: Option<serde_json::Value>,
    #[serde(rename = "type")]
    pub kind: Option<NoteType>,
    pub icon: Option<String>,
    /// Required for a valid note; there is no safe default.
    pub note_name: Option<String>,
    pub source: Option<String>,
    /// Unix epoch seconds.
    pub date_created: Option<i64>,
    /// Unix epoch seconds.
    pub date_reminder: Option<i64>,
    pub is_snoozable: Option<bool>,
    pub locale: Option<String>,
    pub actions: Vec<ActionConfig>,
}

/// Partial configuration of one action button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub name: Option<String>,
    pub label: Option<String>,
    /// URL or command token. Blank means no navigation.
    pub query: Option<String>,
    pub status: Option<ActionStatus>,
    pub primary: Option<bool>,
}

impl NoteConfig {
    /// Starts a config carrying only the dedup key.
    pub fn named(note_name: impl Into<String>) -> Self {
        Self {
            note_name: Some(note_name.into()),
            ..Self::default()
        }
    }
}
