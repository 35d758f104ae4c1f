//! Note builder.
//!
//! # Responsibility
//! - Turn a partial `NoteConfig` into a fully-populated `Note`.
//! - Fill each omitted action field from a default generated for the
//!   action's position.
//!
//! # Invariants
//! - Supplied fields always win; defaults only fill gaps.
//! - The output has as many actions as the input, in the same order.
//! - Building has no side effects and never fails; invalid notes (blank
//!   name) are rejected later by the repository.

use crate::model::config::{ActionConfig, NoteConfig};
use crate::model::note::{ActionQuery, ActionStatus, Note, NoteAction, NoteType};
use uuid::Uuid;

/// Source recorded on notes that do not name one.
pub const DEFAULT_NOTE_SOURCE: &str = "inbox-note-example";
/// Locale recorded on notes that do not name one.
pub const DEFAULT_LOCALE: &str = "en_US";
/// Placeholder replaced with the action position in generated labels.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Fallback values applied by [`NoteBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDefaults {
    pub title: String,
    pub content: String,
    pub icon: String,
    pub source: String,
    pub locale: String,
    /// Label template for generated actions, e.g. `Button {index}`.
    pub action_label_template: String,
    pub action_status: ActionStatus,
    pub action_primary: bool,
}

impl Default for NoteDefaults {
    fn default() -> Self {
        Self {
            title: "A Note Title".to_string(),
            content: "Note content goes here.".to_string(),
            icon: "info".to_string(),
            source: DEFAULT_NOTE_SOURCE.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            action_label_template: format!("Button {INDEX_PLACEHOLDER}"),
            action_status: ActionStatus::Actioned,
            action_primary: false,
        }
    }
}

/// Builds notes from partial configs.
#[derive(Debug, Clone, Default)]
pub struct NoteBuilder {
    defaults: NoteDefaults,
}

impl NoteBuilder {
    pub fn new(defaults: NoteDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &NoteDefaults {
        &self.defaults
    }

    /// Builds a note; `now` (Unix epoch seconds) stands in for a missing
    /// `date_created`.
    pub fn build(&self, config: NoteConfig, now: i64) -> Note {
        let defaults = &self.defaults;
        let actions = config
            .actions
            .into_iter()
            .enumerate()
            .map(|(index, action)| self.build_action(index, action))
            .collect();

        Note {
            id: Uuid::new_v4(),
            name: config.note_name.unwrap_or_default(),
            kind: config.kind.unwrap_or(NoteType::Informational),
            locale: config.locale.unwrap_or_else(|| defaults.locale.clone()),
            title: config.title.unwrap_or_else(|| defaults.title.clone()),
            content: config.content.unwrap_or_else(|| defaults.content.clone()),
            content_data: config
                .content_data
                .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new())),
            icon: config.icon.unwrap_or_else(|| defaults.icon.clone()),
            source: config.source.unwrap_or_else(|| defaults.source.clone()),
            date_created: config.date_created.unwrap_or(now),
            date_reminder: config.date_reminder,
            is_snoozable: config.is_snoozable.unwrap_or(false),
            actions,
        }
    }

    fn build_action(&self, index: usize, action: ActionConfig) -> NoteAction {
        NoteAction {
            name: action.name.unwrap_or_else(|| default_action_name(index)),
            label: action.label.unwrap_or_else(|| {
                self.defaults
                    .action_label_template
                    .replace(INDEX_PLACEHOLDER, &index.to_string())
            }),
            query: action
                .query
                .map_or(ActionQuery::NoNavigation, ActionQuery::from_raw),
            status: action.status.unwrap_or(self.defaults.action_status),
            primary: action.primary.unwrap_or(self.defaults.action_primary),
        }
    }
}

/// Builds a note with the stock defaults.
pub fn build_note(config: NoteConfig, now: i64) -> Note {
    NoteBuilder::default().build(config, now)
}

/// Name generated for an unnamed action at `index`.
pub fn default_action_name(index: usize) -> String {
    format!("action-{index}")
}

#[cfg(test)]
mod tests {
    use super::{build_note, NoteBuilder, NoteDefaults};
    use crate::model::config::{ActionConfig, NoteConfig};
    use crate::model::note::{ActionQuery, ActionStatus, NoteType};
    use serde_json::json;

    #[test]
    fn empty_config_gets_every_default() {
        let note = build_note(NoteConfig::default(), 1_000);
        assert_eq!(note.name, "");
        assert_eq!(note.title, "A Note Title");
        assert_eq!(note.content, "Note content goes here.");
        assert_eq!(note.content_data, json!({}));
        assert_eq!(note.kind, NoteType::Informational);
        assert_eq!(note.icon, "info");
        assert_eq!(note.source, "inbox-note-example");
        assert_eq!(note.locale, "en_US");
        assert_eq!(note.date_created, 1_000);
        assert_eq!(note.date_reminder, None);
        assert!(!note.is_snoozable);
        assert!(note.actions.is_empty());
    }

    #[test]
    fn supplied_fields_are_preserved() {
        let config = NoteConfig {
            title: Some("T".to_string()),
            content: Some("<b>C</b>".to_string()),
            content_data: Some(json!({"k": 1})),
            kind: Some(NoteType::Warning),
            icon: Some("reader".to_string()),
            note_name: Some("n".to_string()),
            source: Some("s".to_string()),
            date_created: Some(5),
            date_reminder: Some(6),
            is_snoozable: Some(true),
            locale: Some("fr_FR".to_string()),
            actions: Vec::new(),
        };
        let note = build_note(config, 1_000);
        assert_eq!(note.title, "T");
        assert_eq!(note.content, "<b>C</b>");
        assert_eq!(note.content_data, json!({"k": 1}));
        assert_eq!(note.kind, NoteType::Warning);
        assert_eq!(note.icon, "reader");
        assert_eq!(note.name, "n");
        assert_eq!(note.source, "s");
        assert_eq!(note.date_created, 5);
        assert_eq!(note.date_reminder, Some(6));
        assert!(note.is_snoozable);
        assert_eq!(note.locale, "fr_FR");
    }

    #[test]
    fn actions_are_merged_with_positional_defaults() {
        let config = NoteConfig {
            actions: vec![
                ActionConfig::default(),
                ActionConfig {
                    label: Some("Open".to_string()),
                    query: Some("https://example.com".to_string()),
                    primary: Some(true),
                    ..ActionConfig::default()
                },
                ActionConfig {
                    name: Some("custom".to_string()),
                    status: Some(ActionStatus::Unactioned),
                    ..ActionConfig::default()
                },
            ],
            ..NoteConfig::named("n")
        };
        let note = build_note(config, 0);

        assert_eq!(note.actions.len(), 3);
        assert_eq!(note.actions[0].name, "action-0");
        assert_eq!(note.actions[0].label, "Button 0");
        assert_eq!(note.actions[0].query, ActionQuery::NoNavigation);
        assert_eq!(note.actions[0].status, ActionStatus::Actioned);
        assert!(!note.actions[0].primary);

        assert_eq!(note.actions[1].name, "action-1");
        assert_eq!(note.actions[1].label, "Open");
        assert_eq!(
            note.actions[1].query,
            ActionQuery::Target("https://example.com".to_string())
        );
        assert!(note.actions[1].primary);

        assert_eq!(note.actions[2].name, "custom");
        assert_eq!(note.actions[2].label, "Button 2");
        assert_eq!(note.actions[2].status, ActionStatus::Unactioned);
        assert!(note.validate().is_ok());
    }

    #[test]
    fn generated_primary_follows_configured_policy() {
        let builder = NoteBuilder::new(NoteDefaults {
            action_primary: true,
            ..NoteDefaults::default()
        });
        let config = NoteConfig {
            actions: vec![
                ActionConfig::default(),
                ActionConfig {
                    primary: Some(false),
                    ..ActionConfig::default()
                },
            ],
            ..NoteConfig::named("n")
        };
        let note = builder.build(config, 0);
        assert!(note.actions[0].primary);
        assert!(!note.actions[1].primary);
    }

    #[test]
    fn generated_names_are_unique_for_many_actions() {
        let config = NoteConfig {
            actions: vec![ActionConfig::default(); 25],
            ..NoteConfig::named("n")
        };
        let note = build_note(config, 0);
        let mut names: Vec<_> = note.actions.iter().map(|a| a.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 25);
        assert_eq!(note.actions[24].name, "action-24");
    }

    #[test]
    fn each_build_gets_a_fresh_id() {
        let first = build_note(NoteConfig::named("n"), 0);
        let second = build_note(NoteConfig::named("n"), 0);
        assert_ne!(first.id, second.id);
    }
}
