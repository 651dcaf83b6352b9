//! # Gitnotes
//!
//! A note store backed by a GitHub repository.
//!
//! Each note is a single JSON file committed under `notes/` in the target
//! repository via the GitHub Contents REST API. The repository is the sole
//! source of truth; there is no local database. Because the Contents API
//! offers no query, sort, or pagination primitives over file collections,
//! listing is assembled client-side: one directory listing, a filename-derived
//! sort, and content fetches restricted to the requested page.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gitnotes::{NotesService, config::SettingsStore, github::GitHubClient};
//!
//! let service = NotesService::new(store, settings, cache);
//! let listing = service.list(1, 10).await?;
//! for note in listing.notes {
//!     println!("{}", note.content);
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cache;
pub mod codec;
pub mod config;
pub mod github;
pub mod models;
pub mod observability;
pub mod server;
pub mod services;

// Re-exports for convenience
pub use cache::{ListingCache, NoopCache, TtlCache};
pub use codec::{DecodeError, FilenameStyle};
pub use config::{Settings, SettingsStore};
pub use github::{GitHubClient, RemoteStore};
pub use models::{Note, NoteListing, Pagination, RemoteFileEntry};
pub use services::NotesService;

/// Error type for gitnotes operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `NotConfigured` | Token, owner, or repository settings are blank |
/// | `InvalidInput` | Blank or oversized note content, page number below 1 |
/// | `InvalidName` | Filename fails the note pattern (checked before any network call) |
/// | `NotFound` | Remote resource absent (empty-state for listing, real error for delete) |
/// | `Remote` | Non-2xx from the GitHub API, carries upstream status and body |
/// | `Network` | Transport failure (timeout, DNS, connection reset), no status available |
/// | `Codec` | Note body failed to decode (dropped per-note inside listings) |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Required settings are missing.
    ///
    /// Raised before any network call when token, owner, or repository
    /// are blank. Branch is exempt (defaults to `main`).
    #[error("not configured: set token, owner, and repository first")]
    NotConfigured,

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A filename failed validation against the note filename pattern.
    ///
    /// The pattern doubles as a path-traversal guard, so this is raised
    /// client-side with zero network calls made.
    #[error("invalid note filename: {0}")]
    InvalidName(String),

    /// A remote resource was not found.
    ///
    /// For directory listings this means "zero notes" and is absorbed by
    /// the listing engine; for the delete precondition read it is a real
    /// failure and propagates.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote API rejected a request.
    ///
    /// Carries the upstream HTTP status and response body so callers can
    /// mirror them (the HTTP server surfaces these verbatim).
    #[error("remote error ({status}): {message}")]
    Remote {
        /// Upstream HTTP status code.
        status: u16,
        /// Upstream response body, verbatim.
        message: String,
    },

    /// A transport-level failure with no HTTP status.
    ///
    /// Timeouts fail the whole enclosing operation; nothing is retried
    /// because the Contents API has no idempotency-key mechanism.
    #[error("network error: {0}")]
    Network(String),

    /// A note body failed to decode.
    ///
    /// Never crosses the listing boundary: the engine logs and skips the
    /// offending note. Surfaces directly only from the codec itself.
    #[error("decode failure: {0}")]
    Codec(#[from] codec::DecodeError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Result type alias for gitnotes operations.
pub type Result<T> = std::result::Result<T, Error>;
