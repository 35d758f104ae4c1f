//! Host environment facts and the localization collaborator.
//!
//! # Responsibility
//! - Describe what the plugin learns about its host at load time.
//! - Compare the host admin version against the required minimum.
//!
//! # Invariants
//! - A missing or unparsable host version never satisfies a minimum.

use semver::Version;

/// Facts about the host admin subsystem, read once at load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Installed admin subsystem version; `None` when it is absent.
    pub admin_version: Option<String>,
    /// Base URL of the admin dashboard, used by in-dashboard actions.
    pub admin_url: String,
}

impl HostEnvironment {
    pub fn new(admin_version: impl Into<String>, admin_url: impl Into<String>) -> Self {
        Self {
            admin_version: Some(admin_version.into()),
            admin_url: admin_url.into(),
        }
    }

    /// Host without the admin subsystem installed.
    pub fn without_admin(admin_url: impl Into<String>) -> Self {
        Self {
            admin_version: None,
            admin_url: admin_url.into(),
        }
    }
}

/// Parses a version leniently: leading `v` is dropped and missing minor or
/// patch components are padded with zero (`0.22` becomes `0.22.0`).
pub fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }

    let core_end = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, rest) = trimmed.split_at(core_end);
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Returns whether `installed >= minimum` under semantic version ordering.
///
/// Unparsable input on either side is treated as not compatible.
pub fn meets_minimum_version(installed: Option<&str>, minimum: &str) -> bool {
    match (installed.and_then(parse_version), parse_version(minimum)) {
        (Some(installed), Some(minimum)) => installed >= minimum,
        _ => false,
    }
}

/// Localization collaborator: loads a translation catalog for a text domain.
pub trait TextDomainLoader {
    /// Loads the catalog for `domain` from `relative_path`.
    /// Returns whether a catalog was found.
    fn load_text_domain(&mut self, domain: &str, relative_path: &str) -> bool;
}

/// Loader for hosts without translation catalogs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTextDomainLoader;

impl TextDomainLoader for NoopTextDomainLoader {
    fn load_text_domain(&mut self, _domain: &str, _relative_path: &str) -> bool {
        false
    }
}
