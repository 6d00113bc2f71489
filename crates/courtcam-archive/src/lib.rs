//! Archive of saved analyses.
//!
//! A plain text file with one `name|remote_key|notes` line per saved
//! analysis. The remote key is the processed video key, so a saved entry
//! can be fetched again later.

pub mod config;
pub mod error;
pub mod store;

pub use config::ArchiveConfig;
pub use error::{ArchiveError, ArchiveResult};
pub use store::{parse_line, render_line, ArchiveLog};
