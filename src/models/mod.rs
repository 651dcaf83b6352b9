//! Domain models.
//!
//! Wire-facing types use camelCase field names to stay byte-compatible with
//! the original web client and the GitHub Contents API.

use serde::{Deserialize, Serialize};

/// A single note.
///
/// The JSON body committed to the repository carries only `id`, `content`,
/// `timestamp`, and `created`; `filename` is derived from the directory
/// entry and attached after fetch (see [`crate::codec`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Creation-time millisecond timestamp, doubles as the identifier.
    pub id: i64,
    /// Note text, may contain simple markup.
    pub content: String,
    /// ISO-8601 timestamp with millisecond precision.
    pub timestamp: String,
    /// ISO-8601 creation timestamp (same as `timestamp` at create time).
    pub created: String,
    /// Repository filename, attached from the directory entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// One row of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileEntry {
    /// Entry name within the directory.
    pub name: String,
    /// Full path within the repository.
    pub path: String,
    /// Content hash, required as the precondition for delete/update.
    pub sha: Option<String>,
    /// `"file"` or `"dir"`; anything but `"file"` is never a note.
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
}

/// File content as returned by a remote read.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    /// Base64-encoded body. The Contents API omits it for oversized files.
    pub content: Option<String>,
    /// Current content hash.
    pub sha: String,
}

/// Derived pagination metadata, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub limit: usize,
    /// Count of note-matching directory entries (not successfully decoded notes).
    pub total: usize,
    /// Whether entries exist beyond this page's window.
    pub has_more: bool,
    /// `ceil(total / limit)`, 0 when `limit` is 0.
    pub total_pages: usize,
}

impl Pagination {
    /// Computes pagination metadata for a window over `total` entries.
    #[must_use]
    pub fn compute(page: u32, limit: usize, total: usize) -> Self {
        let (_, window_end) = page_window(page, limit, total);
        let total_pages = if limit > 0 { total.div_ceil(limit) } else { 0 };
        Self {
            page,
            limit,
            total,
            has_more: window_end < total,
            total_pages,
        }
    }
}

/// Computes the `[start, end)` slice bounds for a page, clamped to `total`.
///
/// A zero `limit` yields a zero-width window at the page offset; an
/// out-of-range page collapses to an empty window at `total`.
#[must_use]
pub fn page_window(page: u32, limit: usize, total: usize) -> (usize, usize) {
    let start = (page.max(1) as usize - 1).saturating_mul(limit);
    let window_start = start.min(total);
    let window_end = start.saturating_add(limit).min(total).max(window_start);
    (window_start, window_end)
}

/// An ordered page of notes plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteListing {
    /// Notes in the window, newest first.
    pub notes: Vec<Note>,
    /// Window metadata.
    pub pagination: Pagination,
}

impl NoteListing {
    /// An empty listing for the given page/limit, used when the notes
    /// directory does not exist yet.
    #[must_use]
    pub fn empty(page: u32, limit: usize) -> Self {
        Self {
            notes: Vec::new(),
            pagination: Pagination::compute(page, limit, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use test_case::test_case;

    #[test_case(1, 10, 0 => (0, 0); "empty directory")]
    #[test_case(1, 10, 25 => (0, 10); "first page")]
    #[test_case(3, 10, 25 => (20, 25); "last partial page")]
    #[test_case(4, 10, 25 => (25, 25); "out of range page")]
    #[test_case(1, 0, 7 => (0, 0); "zero limit")]
    #[test_case(5, 0, 7 => (0, 0); "zero limit later page")]
    #[test_case(2, 5, 5 => (5, 5); "window past exact fit")]
    fn test_page_window(page: u32, limit: usize, total: usize) -> (usize, usize) {
        page_window(page, limit, total)
    }

    #[test]
    fn test_pagination_ceil_division() {
        let p = Pagination::compute(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);
    }

    #[test]
    fn test_pagination_zero_limit_has_more_when_entries_exist() {
        let p = Pagination::compute(1, 0, 7);
        assert_eq!(p.total_pages, 0);
        assert!(p.has_more);
        assert_eq!(p.total, 7);
    }

    #[test]
    fn test_pagination_zero_limit_empty() {
        let p = Pagination::compute(1, 0, 0);
        assert!(!p.has_more);
    }

    #[test]
    fn test_pagination_out_of_range_page_has_no_more() {
        let p = Pagination::compute(9, 10, 25);
        assert!(!p.has_more);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let p = Pagination::compute(1, 1, 2);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["hasMore"], serde_json::Value::Bool(true));
        assert_eq!(json["totalPages"], serde_json::json!(2));
    }

    #[test]
    fn test_note_filename_skipped_when_absent() {
        let note = Note {
            id: 1,
            content: "x".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            created: "2024-01-01T00:00:00.000Z".to_string(),
            filename: None,
        };
        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("filename"));
    }

    #[test]
    fn test_remote_entry_type_field_rename() {
        let entry: RemoteFileEntry = serde_json::from_str(
            r#"{"name":"a.json","path":"notes/a.json","sha":"abc","type":"file"}"#,
        )
        .unwrap();
        assert_eq!(entry.entry_type.as_deref(), Some("file"));
    }
}
