//! Note listing and lifecycle operations.

use crate::cache::ListingCache;
use crate::codec;
use crate::config::SettingsStore;
use crate::github::RemoteStore;
use crate::models::{Note, NoteListing, Pagination, RemoteFileEntry, page_window};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Maximum note length accepted by `create`, in characters.
pub const MAX_CONTENT_CHARS: usize = 100_000;

/// Upper bound on concurrent per-page content fetches.
const FETCH_CONCURRENCY: usize = 8;

/// Note store over a remote file store.
///
/// The remote repository is the sole source of truth. Listing is assembled
/// client-side because the Contents API has no sort or pagination
/// primitives: one directory fetch, a filename-derived sort, then content
/// fetches for exactly the requested window.
///
/// The cache is injected; pass [`crate::cache::NoopCache`] outside the
/// server variant. Construction registers the settings-store subscriber so
/// a settings update drops every cached window.
pub struct NotesService<S> {
    store: Arc<S>,
    settings: Arc<SettingsStore>,
    cache: Arc<dyn ListingCache>,
    last_id: AtomicI64,
}

impl<S: RemoteStore> NotesService<S> {
    /// Creates a service over the given store, settings, and cache.
    #[must_use]
    pub fn new(store: Arc<S>, settings: Arc<SettingsStore>, cache: Arc<dyn ListingCache>) -> Self {
        let subscriber_cache = cache.clone();
        settings.on_change(Box::new(move |_| subscriber_cache.invalidate_all()));
        Self {
            store,
            settings,
            cache,
            last_id: AtomicI64::new(0),
        }
    }

    /// Returns the settings store backing this service.
    #[must_use]
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Number of cached listing windows, for the health endpoint.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Produces a stable, newest-first, paginated view of the notes
    /// directory.
    ///
    /// `total` counts filename-matching directory entries; entries whose
    /// content later fails to fetch or decode are dropped from the page
    /// without shrinking `total`. A missing directory means zero notes,
    /// not an error. Dropping the returned future aborts any pending
    /// content fetches without touching shared state.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn list(&self, page: u32, limit: usize) -> Result<NoteListing> {
        self.settings.current().ensure_configured()?;
        if page < 1 {
            return Err(Error::InvalidInput("page must be at least 1".to_string()));
        }

        if let Some(hit) = self.cache.get(page, limit) {
            tracing::debug!(page, limit, "listing served from cache");
            return Ok(hit);
        }

        let entries = match self.store.list_dir().await {
            Ok(entries) => entries,
            Err(Error::NotFound(_)) => {
                tracing::debug!("notes directory absent, returning empty listing");
                return Ok(NoteListing::empty(page, limit));
            }
            Err(err) => return Err(err),
        };

        let style = self.settings.current().filename_style;
        // Newest first; the key comes from the filename alone, so sorting
        // never touches file content.
        let keyed = note_entries(style, &entries);

        let total = keyed.len();
        let (start, end) = page_window(page, limit, total);
        let notes = self.fetch_window(&keyed[start..end]).await;

        let listing = NoteListing {
            notes,
            pagination: Pagination::compute(page, limit, total),
        };
        self.cache.put(page, limit, &listing);
        Ok(listing)
    }

    /// Fetches and decodes the window's files concurrently, bounded by a
    /// semaphore, and reimposes the filename-derived order on join.
    async fn fetch_window(&self, window: &[(i64, String)]) -> Vec<Note> {
        let semaphore = Arc::new(Semaphore::new(FETCH_CONCURRENCY));
        let mut tasks: JoinSet<(usize, Option<Note>)> = JoinSet::new();
        for (index, (_, name)) in window.iter().enumerate() {
            let store = self.store.clone();
            let semaphore = semaphore.clone();
            let name = name.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (index, None);
                };
                (index, fetch_note(&*store, &name).await)
            });
        }

        let mut slots: Vec<Option<Note>> = vec![None; window.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, note)) => slots[index] = note,
                Err(err) => tracing::warn!(error = %err, "content fetch task failed"),
            }
        }
        slots.into_iter().flatten().collect()
    }

    /// Creates a note from the given content.
    ///
    /// Mints the id from the current millisecond (nudged forward if the
    /// clock reads the same millisecond twice within this process), writes
    /// the file in a single `put_file`, and invalidates the listing cache.
    /// There is no read-before-write check; a concurrent creation on the
    /// same millisecond surfaces as a remote conflict.
    #[tracing::instrument(skip(self, content), level = "debug")]
    pub async fn create(&self, content: &str) -> Result<Note> {
        self.settings.current().ensure_configured()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput(
                "note content must not be blank".to_string(),
            ));
        }
        if trimmed.chars().count() > MAX_CONTENT_CHARS {
            return Err(Error::InvalidInput(format!(
                "note content exceeds {MAX_CONTENT_CHARS} characters"
            )));
        }

        let id = self.mint_id();
        let timestamp = iso_millis(id);
        let filename = self.settings.current().filename_style.filename_for(id);
        let note = Note {
            id,
            content: trimmed.to_string(),
            timestamp: timestamp.clone(),
            created: timestamp,
            filename: Some(filename.clone()),
        };

        let encoded = codec::encode(&note);
        let message = format!("Add note: {filename}");
        self.store.put_file(&filename, &message, &encoded).await?;
        self.cache.invalidate_all();
        tracing::info!(filename, "note created");
        Ok(note)
    }

    /// Deletes a note by filename.
    ///
    /// The filename is validated against the configured pattern before any
    /// network call; the pattern rejects path-traversal-shaped input. Two
    /// round trips follow: a read for the current sha, then the sha-checked
    /// delete. Any step's failure aborts the whole operation.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn delete(&self, filename: &str) -> Result<()> {
        let style = self.settings.current().filename_style;
        if !style.is_valid_filename(filename) {
            return Err(Error::InvalidName(filename.to_string()));
        }
        self.settings.current().ensure_configured()?;

        let file = self.store.get_file(filename).await?;
        let message = format!("Delete note: {filename}");
        self.store.delete_file(filename, &message, &file.sha).await?;
        self.cache.invalidate_all();
        tracing::info!(filename, "note deleted");
        Ok(())
    }

    /// Mints a creation-millisecond id, monotonic within this process.
    fn mint_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(prev.saturating_add(1).max(now))
            })
            .unwrap_or(0);
        prev.saturating_add(1).max(now)
    }
}

/// Formats a millisecond timestamp as ISO-8601 with millisecond precision.
fn iso_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fetches one note's content and decodes it.
///
/// Failures are logged and swallowed: one corrupt or unreadable note must
/// never break the page it appears in.
async fn fetch_note<S: RemoteStore>(store: &S, name: &str) -> Option<Note> {
    let file = match store.get_file(name).await {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(name, error = %err, "skipping note: fetch failed");
            return None;
        }
    };
    let Some(content) = file.content else {
        tracing::warn!(name, "skipping note: no inline content");
        return None;
    };
    match codec::decode(&content, name) {
        Ok(note) => Some(note),
        Err(err) => {
            tracing::warn!(name, error = %err, "skipping note: decode failed");
            None
        }
    }
}

/// Filters directory entries to note files and sorts them newest first by
/// the filename-embedded timestamp.
#[must_use]
pub(crate) fn note_entries(
    style: crate::codec::FilenameStyle,
    entries: &[RemoteFileEntry],
) -> Vec<(i64, String)> {
    let mut keyed: Vec<(i64, String)> = entries
        .iter()
        .filter(|e| e.entry_type.as_deref() == Some("file"))
        .filter_map(|e| style.parse_timestamp(&e.name).map(|ts| (ts, e.name.clone())))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed
}
