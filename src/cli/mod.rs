//! # CLI Module
//!
//! User-facing commands of the `moodtune` binary.
//!
//! ## Commands
//!
//! - [`serve`] - run the HTTP server (file-backed or in-memory session state,
//!   optionally opening the login page in the browser)
//! - [`list_sessions`] - table of stored sessions with their mood target and
//!   cache/history sizes
//! - [`show_session`] - the analysis cache of one session
//! - [`clear_session`] - remove one session's state
//! - [`purge_sessions`] - remove sessions idle longer than the TTL
//!
//! Console output uses the crate's `info!`, `success!`, `warning!` and
//! `error!` macros; `error!` terminates the process.

mod serve;
mod sessions;

pub use serve::serve;
pub use sessions::{clear_session, list_sessions, purge_sessions, show_session};
