//! Storage is organized through [session_store::JsonSessionStore].
//! The basic idea is:
//!   - There is one data file holding every finished session, oldest first.
//!   - The file is always rewritten as a whole, through a temporary file and a rename.
//!   - Sessions are stored with both timestamps, the duration in seconds and their night.

pub mod entities;
pub mod session_store;
