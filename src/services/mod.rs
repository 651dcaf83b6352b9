//! Service layer.
//!
//! [`NotesService`] is the crate's core: the listing & pagination engine
//! plus the create/delete lifecycle protocols, all running against a
//! [`crate::github::RemoteStore`].

mod notes;

pub use notes::{MAX_CONTENT_CHARS, NotesService};
