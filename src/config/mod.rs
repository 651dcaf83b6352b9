//! Configuration management.
//!
//! Settings come from three layers, later layers winning: built-in defaults,
//! an optional TOML config file, and `GITHUB_*` environment variables. The
//! token is held as a [`SecretString`] and never logged or printed.

use crate::codec::FilenameStyle;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

/// Target repository coordinates and credentials.
#[derive(Debug, Clone)]
pub struct Settings {
    /// GitHub API token.
    pub token: SecretString,
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch to commit to.
    pub branch: String,
    /// Note filename convention for this deployment.
    pub filename_style: FilenameStyle,
}

/// Default branch used when the setting is blank.
pub const DEFAULT_BRANCH: &str = "main";

impl Settings {
    /// Builds settings from raw strings, applying the branch default.
    #[must_use]
    pub fn new(token: &str, owner: &str, repo: &str, branch: &str) -> Self {
        let branch = if branch.trim().is_empty() {
            DEFAULT_BRANCH.to_string()
        } else {
            branch.trim().to_string()
        };
        Self {
            token: SecretString::from(token.trim().to_string()),
            owner: owner.trim().to_string(),
            repo: repo.trim().to_string(),
            branch,
            filename_style: FilenameStyle::default(),
        }
    }

    /// Sets the filename convention.
    #[must_use]
    pub const fn with_filename_style(mut self, style: FilenameStyle) -> Self {
        self.filename_style = style;
        self
    }

    /// Whether token, owner, and repository are all non-blank.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.token.expose_secret().is_empty() && !self.owner.is_empty() && !self.repo.is_empty()
    }

    /// Errors with [`Error::NotConfigured`] unless fully configured.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(Error::NotConfigured)
        }
    }

    /// Loads settings from environment variables (`GITHUB_TOKEN`,
    /// `GITHUB_USERNAME`, `GITHUB_REPO`, `GITHUB_BRANCH`,
    /// `GITNOTES_FILENAME_STYLE`), falling back to the config file for
    /// anything unset.
    #[must_use]
    pub fn load() -> Self {
        let file = config_file_path()
            .and_then(|p| SettingsFile::read(&p).ok())
            .unwrap_or_default();

        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .or(file.token)
            .unwrap_or_default();
        let owner = std::env::var("GITHUB_USERNAME")
            .ok()
            .or(file.owner)
            .unwrap_or_default();
        let repo = std::env::var("GITHUB_REPO")
            .ok()
            .or(file.repo)
            .unwrap_or_default();
        let branch = std::env::var("GITHUB_BRANCH")
            .ok()
            .or(file.branch)
            .unwrap_or_default();
        let style = std::env::var("GITNOTES_FILENAME_STYLE")
            .ok()
            .or(file.filename_style)
            .map(|s| FilenameStyle::parse(&s))
            .unwrap_or_default();

        Self::new(&token, &owner, &repo, &branch).with_filename_style(style)
    }
}

/// Config file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct SettingsFile {
    /// GitHub API token.
    pub token: Option<String>,
    /// Repository owner.
    pub owner: Option<String>,
    /// Repository name.
    pub repo: Option<String>,
    /// Branch to commit to.
    pub branch: Option<String>,
    /// Filename convention: `plain` or `prefixed`.
    pub filename_style: Option<String>,
}

impl SettingsFile {
    /// Reads and parses a TOML config file.
    pub fn read(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("cannot read config {}: {e}", path.display()))
        })?;
        toml::from_str(&text)
            .map_err(|e| Error::InvalidInput(format!("invalid config {}: {e}", path.display())))
    }
}

/// Default config file location (`~/.config/gitnotes/config.toml` on Linux).
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gitnotes")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Writes settings to the config file, creating parent directories.
///
/// The token is included; the file lives under the user's config directory
/// with whatever permissions the platform defaults to.
pub fn save_to_file(settings: &Settings, path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::InvalidInput(format!("cannot create {}: {e}", parent.display()))
        })?;
    }
    #[derive(serde::Serialize)]
    struct FileBody<'a> {
        token: &'a str,
        owner: &'a str,
        repo: &'a str,
        branch: &'a str,
        filename_style: &'a str,
    }
    let body = toml::to_string(&FileBody {
        token: settings.token.expose_secret(),
        owner: &settings.owner,
        repo: &settings.repo,
        branch: &settings.branch,
        filename_style: settings.filename_style.as_str(),
    })
    .map_err(|e| Error::InvalidInput(format!("cannot serialize settings: {e}")))?;
    std::fs::write(path, body)
        .map_err(|e| Error::InvalidInput(format!("cannot write {}: {e}", path.display())))
}

/// Listener invoked after a settings update.
pub type ChangeListener = Box<dyn Fn(&Settings) + Send + Sync>;

/// In-memory settings store with single-subscriber change notification.
///
/// Settings are loaded once at startup and mutated only via [`update`],
/// which notifies the registered subscriber (the server uses this to drop
/// its listing cache, since owner/repo/branch changes make every cached
/// window wrong).
///
/// [`update`]: SettingsStore::update
pub struct SettingsStore {
    inner: RwLock<Settings>,
    listener: Mutex<Option<ChangeListener>>,
}

impl SettingsStore {
    /// Creates a store holding the given settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
            listener: Mutex::new(None),
        }
    }

    /// Returns a snapshot of the current settings.
    #[must_use]
    pub fn current(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Replaces the settings and notifies the subscriber.
    pub fn update(&self, settings: Settings) {
        {
            let mut guard = self
                .inner
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *guard = settings;
        }
        let snapshot = self.current();
        let guard = self
            .listener
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(listener) = guard.as_ref() {
            listener(&snapshot);
        }
    }

    /// Registers the change subscriber, replacing any previous one.
    pub fn on_change(&self, listener: ChangeListener) {
        let mut guard = self
            .listener
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(listener);
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &self.current())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_branch_defaults_to_main_when_blank() {
        let s = Settings::new("t", "o", "r", "  ");
        assert_eq!(s.branch, "main");
        let s = Settings::new("t", "o", "r", "dev");
        assert_eq!(s.branch, "dev");
    }

    #[test]
    fn test_is_configured_requires_all_three() {
        assert!(Settings::new("t", "o", "r", "").is_configured());
        assert!(!Settings::new("", "o", "r", "").is_configured());
        assert!(!Settings::new("t", "", "r", "").is_configured());
        assert!(!Settings::new("t", "o", "", "").is_configured());
        assert!(Settings::new("", "o", "r", "").ensure_configured().is_err());
    }

    #[test]
    fn test_store_update_notifies_subscriber() {
        let store = SettingsStore::new(Settings::new("t", "o", "r", ""));
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        store.on_change(Box::new(move |s| {
            assert_eq!(s.repo, "other");
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        store.update(Settings::new("t", "o", "other", ""));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.current().repo, "other");
    }

    #[test]
    fn test_settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let settings = Settings::new("tok", "me", "notes", "dev")
            .with_filename_style(FilenameStyle::Prefixed);
        save_to_file(&settings, &path).unwrap();
        let file = SettingsFile::read(&path).unwrap();
        assert_eq!(file.owner.as_deref(), Some("me"));
        assert_eq!(file.branch.as_deref(), Some("dev"));
        assert_eq!(file.filename_style.as_deref(), Some("prefixed"));
    }

    #[test]
    fn test_settings_file_read_missing() {
        assert!(SettingsFile::read(std::path::Path::new("/nonexistent/config.toml")).is_err());
    }
}
