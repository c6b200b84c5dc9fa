//! Terminal time tracker for study sessions. Sessions are grouped into nights running from
//! 6 PM to 6 PM, summarized on request, and the data file is periodically committed to git.
//!

pub mod cli;
pub mod fs;
pub mod storage;
pub mod tracker;
pub mod utils;
pub mod vcs;
