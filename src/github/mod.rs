//! GitHub Contents API client.
//!
//! Thin typed wrapper over `GET`/`PUT`/`DELETE` on
//! `repos/{owner}/{repo}/contents/notes/{path}`. Each operation is a single
//! HTTP round trip with no client-side retry: the Contents API has no
//! idempotency-key mechanism, so a failed call must surface to the caller
//! rather than be replayed blind.

use crate::config::SettingsStore;
use crate::models::{RemoteFile, RemoteFileEntry};
use crate::{Error, Result};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Repository directory that holds note files.
pub const NOTES_DIR: &str = "notes";

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Per-call HTTP timeout. A timed-out call fails the enclosing operation.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("gitnotes/", env!("CARGO_PKG_VERSION"));

/// Abstraction over the remote file store.
///
/// Implemented by [`GitHubClient`] for production and by in-memory fakes in
/// tests. Futures are `Send` so the listing engine can fan fetches out
/// across tasks.
pub trait RemoteStore: Send + Sync + 'static {
    /// Lists the notes directory.
    ///
    /// A missing directory surfaces as [`Error::NotFound`]; the listing
    /// engine treats that as "zero notes", not a failure.
    fn list_dir(&self) -> impl Future<Output = Result<Vec<RemoteFileEntry>>> + Send;

    /// Fetches one file's base64 content and current sha.
    fn get_file(&self, name: &str) -> impl Future<Output = Result<RemoteFile>> + Send;

    /// Creates or updates a file; returns the new content sha.
    fn put_file(
        &self,
        name: &str,
        message: &str,
        content_base64: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Deletes a file. The sha must match the file's current state; a stale
    /// sha is rejected upstream and surfaces as a conflict.
    fn delete_file(
        &self,
        name: &str,
        message: &str,
        sha: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct PutResponse {
    content: Option<PutResponseContent>,
}

#[derive(Deserialize)]
struct PutResponseContent {
    sha: Option<String>,
}

/// GitHub Contents API client.
///
/// Reads coordinates from the [`SettingsStore`] on every call, so a settings
/// update applies to in-flight sessions without rebuilding the client.
pub struct GitHubClient {
    settings: Arc<SettingsStore>,
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    /// Creates a client against the public GitHub API.
    pub fn new(settings: Arc<SettingsStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            settings,
            http,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Overrides the API base URL (GitHub Enterprise, test doubles).
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, owner: &str, repo: &str, name: Option<&str>) -> String {
        match name {
            Some(name) => format!(
                "{}/repos/{owner}/{repo}/contents/{NOTES_DIR}/{name}",
                self.api_base
            ),
            None => format!(
                "{}/repos/{owner}/{repo}/contents/{NOTES_DIR}",
                self.api_base
            ),
        }
    }

    /// Maps a non-2xx response to the error taxonomy, reading the body.
    async fn reject(path: &str, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        if status == 404 {
            return Error::NotFound(path.to_string());
        }
        let message = response.text().await.unwrap_or_default();
        Error::Remote { status, message }
    }
}

/// Attaches the bearer token and the Contents API accept header.
fn authorize(req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
    req.bearer_auth(token)
        .header("Accept", "application/vnd.github+json")
}

impl RemoteStore for GitHubClient {
    async fn list_dir(&self) -> Result<Vec<RemoteFileEntry>> {
        let settings = self.settings.current();
        let url = self.contents_url(&settings.owner, &settings.repo, None);
        tracing::debug!(url = %url, "listing notes directory");
        let response = authorize(self.http.get(&url), settings.token.expose_secret())
            .query(&[("ref", settings.branch.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(NOTES_DIR, response).await);
        }
        Ok(response.json().await?)
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        let settings = self.settings.current();
        let url = self.contents_url(&settings.owner, &settings.repo, Some(name));
        let response = authorize(self.http.get(&url), settings.token.expose_secret())
            .query(&[("ref", settings.branch.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(name, response).await);
        }
        Ok(response.json().await?)
    }

    async fn put_file(&self, name: &str, message: &str, content_base64: &str) -> Result<String> {
        let settings = self.settings.current();
        let url = self.contents_url(&settings.owner, &settings.repo, Some(name));
        tracing::debug!(name, "writing note file");
        let response = authorize(self.http.put(&url), settings.token.expose_secret())
            .json(&PutBody {
                message,
                content: content_base64,
                branch: &settings.branch,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(name, response).await);
        }
        let parsed: PutResponse = response.json().await?;
        Ok(parsed
            .content
            .and_then(|c| c.sha)
            .unwrap_or_default())
    }

    async fn delete_file(&self, name: &str, message: &str, sha: &str) -> Result<()> {
        let settings = self.settings.current();
        let url = self.contents_url(&settings.owner, &settings.repo, Some(name));
        tracing::debug!(name, "deleting note file");
        let response = authorize(self.http.delete(&url), settings.token.expose_secret())
            .json(&DeleteBody {
                message,
                sha,
                branch: &settings.branch,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::reject(name, response).await);
        }
        Ok(())
    }
}
