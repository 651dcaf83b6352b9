//! Shared test fixtures: an in-memory remote store and service builders.

#![allow(clippy::unwrap_used, dead_code)]

use gitnotes::cache::{ListingCache, NoopCache};
use gitnotes::codec;
use gitnotes::config::{Settings, SettingsStore};
use gitnotes::github::RemoteStore;
use gitnotes::models::{Note, RemoteFile, RemoteFileEntry};
use gitnotes::services::NotesService;
use gitnotes::{Error, Result};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-operation call counters.
#[derive(Default)]
pub struct Calls {
    pub list_dir: AtomicUsize,
    pub get_file: AtomicUsize,
    pub put_file: AtomicUsize,
    pub delete_file: AtomicUsize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.list_dir.load(Ordering::SeqCst)
            + self.get_file.load(Ordering::SeqCst)
            + self.put_file.load(Ordering::SeqCst)
            + self.delete_file.load(Ordering::SeqCst)
    }
}

/// In-memory stand-in for the GitHub Contents API.
///
/// Stores base64 bodies keyed by filename and mimics the API's error
/// surface: 404 for a missing directory or file, 409 for a stale sha.
#[derive(Default)]
pub struct MockStore {
    files: Mutex<BTreeMap<String, String>>,
    raw_entries: Mutex<Vec<RemoteFileEntry>>,
    missing_dir: Mutex<bool>,
    failing_reads: Mutex<HashSet<String>>,
    list_error: Mutex<Option<(u16, String)>>,
    put_error: Mutex<Option<(u16, String)>>,
    pub calls: Calls,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose notes directory does not exist yet.
    pub fn with_missing_dir() -> Self {
        let store = Self::default();
        *store.missing_dir.lock().unwrap() = true;
        store
    }

    fn sha_for(name: &str) -> String {
        format!("sha-{name}")
    }

    /// Seeds a well-formed note file named `{millis}.json`.
    pub fn seed_note(&self, millis: i64, content: &str) -> String {
        let timestamp = chrono::DateTime::from_timestamp_millis(millis)
            .unwrap()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let note = Note {
            id: millis,
            content: content.to_string(),
            timestamp: timestamp.clone(),
            created: timestamp,
            filename: None,
        };
        let name = format!("{millis}.json");
        self.seed_raw_file(&name, &codec::encode(&note));
        name
    }

    /// Seeds a file with an arbitrary (possibly malformed) base64 body.
    pub fn seed_raw_file(&self, name: &str, content_base64: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content_base64.to_string());
        *self.missing_dir.lock().unwrap() = false;
    }

    /// Adds a directory entry with no backing file (subdirectory, stray file).
    pub fn seed_entry(&self, name: &str, entry_type: &str) {
        self.raw_entries.lock().unwrap().push(RemoteFileEntry {
            name: name.to_string(),
            path: format!("notes/{name}"),
            sha: Some(Self::sha_for(name)),
            entry_type: Some(entry_type.to_string()),
        });
        *self.missing_dir.lock().unwrap() = false;
    }

    /// Makes `get_file` fail with a 500 for the given name.
    pub fn fail_reads_of(&self, name: &str) {
        self.failing_reads.lock().unwrap().insert(name.to_string());
    }

    /// Makes `list_dir` fail with the given status and body.
    pub fn fail_listing(&self, status: u16, message: &str) {
        *self.list_error.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Makes `put_file` fail with the given status and body.
    pub fn fail_writes(&self, status: u16, message: &str) {
        *self.put_error.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    pub fn stored_base64(&self, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

impl RemoteStore for MockStore {
    async fn list_dir(&self) -> Result<Vec<RemoteFileEntry>> {
        self.calls.list_dir.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = self.list_error.lock().unwrap().clone() {
            return Err(Error::Remote { status, message });
        }
        if *self.missing_dir.lock().unwrap() {
            return Err(Error::NotFound("notes".to_string()));
        }
        let mut entries: Vec<RemoteFileEntry> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .map(|name| RemoteFileEntry {
                name: name.clone(),
                path: format!("notes/{name}"),
                sha: Some(Self::sha_for(name)),
                entry_type: Some("file".to_string()),
            })
            .collect();
        entries.extend(self.raw_entries.lock().unwrap().iter().cloned());
        Ok(entries)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        self.calls.get_file.fetch_add(1, Ordering::SeqCst);
        if self.failing_reads.lock().unwrap().contains(name) {
            return Err(Error::Remote {
                status: 500,
                message: "injected read failure".to_string(),
            });
        }
        let files = self.files.lock().unwrap();
        let content = files
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Ok(RemoteFile {
            content: Some(content.clone()),
            sha: Self::sha_for(name),
        })
    }

    async fn put_file(&self, name: &str, _message: &str, content_base64: &str) -> Result<String> {
        self.calls.put_file.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = self.put_error.lock().unwrap().clone() {
            return Err(Error::Remote { status, message });
        }
        self.seed_raw_file(name, content_base64);
        Ok(Self::sha_for(name))
    }

    async fn delete_file(&self, name: &str, _message: &str, sha: &str) -> Result<()> {
        self.calls.delete_file.fetch_add(1, Ordering::SeqCst);
        let mut files = self.files.lock().unwrap();
        if !files.contains_key(name) {
            return Err(Error::NotFound(name.to_string()));
        }
        if sha != Self::sha_for(name) {
            return Err(Error::Remote {
                status: 409,
                message: "sha mismatch".to_string(),
            });
        }
        files.remove(name);
        Ok(())
    }
}

/// Fully configured settings for tests.
pub fn test_settings() -> Arc<SettingsStore> {
    Arc::new(SettingsStore::new(Settings::new(
        "test-token",
        "octocat",
        "journal",
        "",
    )))
}

/// Settings with a blank token, i.e. not configured.
pub fn unconfigured_settings() -> Arc<SettingsStore> {
    Arc::new(SettingsStore::new(Settings::new("", "octocat", "journal", "")))
}

/// Service over the mock store with no cache.
pub fn service(store: Arc<MockStore>) -> NotesService<MockStore> {
    NotesService::new(store, test_settings(), Arc::new(NoopCache))
}

/// Service over the mock store with the given cache.
pub fn service_with_cache(
    store: Arc<MockStore>,
    cache: Arc<dyn ListingCache>,
) -> NotesService<MockStore> {
    NotesService::new(store, test_settings(), cache)
}
