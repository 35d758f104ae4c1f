//! Inbox note domain model.
//!
//! # Responsibility
//! - Define the persisted note record and its action buttons.
//! - Validate note invariants before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `name` is a natural dedup key and is not unique in storage.
//! - A note is never mutated by this crate after it has been saved.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one persisted note row.
pub type NoteId = Uuid;

const PREVIEW_MAX_CHARS: usize = 100;

static MARKUP_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Presentation category of an inbox note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    /// Plain informational message.
    #[default]
    Informational,
    /// Message that expects the merchant to act.
    Actionable,
    /// Something went wrong on the host side.
    Error,
    /// Something may go wrong soon.
    Warning,
    /// Promotional content.
    Marketing,
}

impl NoteType {
    /// Storage/wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::Actionable => "actionable",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Marketing => "marketing",
        }
    }

    /// Parses the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "informational" => Some(Self::Informational),
            "actionable" => Some(Self::Actionable),
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "marketing" => Some(Self::Marketing),
            _ => None,
        }
    }
}

/// Merchant-facing state of one action button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Unactioned,
    Actioned,
    Snoozed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unactioned => "unactioned",
            Self::Actioned => "actioned",
            Self::Snoozed => "snoozed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "unactioned" => Some(Self::Unactioned),
            "actioned" => Some(Self::Actioned),
            "snoozed" => Some(Self::Snoozed),
            _ => None,
        }
    }
}

/// Where an action button leads when clicked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Option<String>", from = "Option<String>")]
pub enum ActionQuery {
    /// Button only records the click.
    #[default]
    NoNavigation,
    /// URL or host command token.
    Target(String),
}

impl ActionQuery {
    /// Builds a query from raw input; blank input means no navigation.
    pub fn from_raw(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::NoNavigation
        } else {
            Self::Target(value)
        }
    }

    pub fn as_target(&self) -> Option<&str> {
        match self {
            Self::NoNavigation => None,
            Self::Target(value) => Some(value.as_str()),
        }
    }
}

impl From<Option<String>> for ActionQuery {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::NoNavigation, Self::from_raw)
    }
}

impl From<ActionQuery> for Option<String> {
    fn from(value: ActionQuery) -> Self {
        match value {
            ActionQuery::NoNavigation => None,
            ActionQuery::Target(target) => Some(target),
        }
    }
}

/// One fully-populated action button attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAction {
    /// Identifier, unique within the owning note.
    pub name: String,
    /// Display text.
    pub label: String,
    pub query: ActionQuery,
    pub status: ActionStatus,
    /// Visually emphasized button. Not enforced to be unique.
    pub primary: bool,
}

/// Canonical persisted inbox note.
///
/// Every field is populated. `date_reminder == None` is the explicit
/// "no reminder" value, not a missing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Dedup key shared by every instance of the same logical note.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    pub locale: String,
    pub title: String,
    /// Body text, may embed simple HTML markup.
    pub content: String,
    /// Opaque structured payload, `{}` when unused.
    pub content_data: serde_json::Value,
    pub icon: String,
    /// Identifier of the producing plugin.
    pub source: String,
    /// Unix epoch seconds.
    pub date_created: i64,
    /// Unix epoch seconds.
    pub date_reminder: Option<i64>,
    pub is_snoozable: bool,
    /// Ordered as supplied.
    pub actions: Vec<NoteAction>,
}

/// Validation failures for note invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// `name` is blank; the note cannot be deduplicated.
    EmptyName,
    /// Action at position has a blank name.
    EmptyActionName(usize),
    /// Action at position has a blank label.
    EmptyActionLabel(usize),
    /// Two actions share the same name.
    DuplicateActionName(String),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "note name is required"),
            Self::EmptyActionName(index) => write!(f, "action #{index} has an empty name"),
            Self::EmptyActionLabel(index) => write!(f, "action #{index} has an empty label"),
            Self::DuplicateActionName(name) => {
                write!(f, "action name `{name}` is used more than once")
            }
        }
    }
}

impl Error for NoteValidationError {}

impl Note {
    /// Checks invariants required before the note may be saved.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.name.trim().is_empty() {
            return Err(NoteValidationError::EmptyName);
        }

        let mut seen = BTreeSet::new();
        for (index, action) in self.actions.iter().enumerate() {
            if action.name.trim().is_empty() {
                return Err(NoteValidationError::EmptyActionName(index));
            }
            if action.label.trim().is_empty() {
                return Err(NoteValidationError::EmptyActionLabel(index));
            }
            if !seen.insert(action.name.as_str()) {
                return Err(NoteValidationError::DuplicateActionName(action.name.clone()));
            }
        }

        Ok(())
    }

    /// Returns the emphasized action, if any.
    pub fn primary_action(&self) -> Option<&NoteAction> {
        self.actions.iter().find(|action| action.primary)
    }

    /// Plain-text preview of `content`, see [`derive_preview_text`].
    pub fn preview_text(&self) -> Option<String> {
        derive_preview_text(&self.content)
    }
}

/// Derives a plain-text preview from note content.
///
/// Markup tags are dropped, whitespace collapsed, first 100 chars kept.
/// Returns `None` when nothing readable remains.
pub fn derive_preview_text(content: &str) -> Option<String> {
    let without_tags = MARKUP_TAG_RE.replace_all(content, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_tags, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}
