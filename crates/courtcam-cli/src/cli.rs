//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "courtcam", version, about = "Tennis match analysis from the command line")]
pub struct Cli {
    /// Analysis service base URL
    #[arg(long, env = "COURTCAM_API_URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a match video, wait for the analysis and download the result
    Analyze {
        /// Video file to analyse
        file: PathBuf,

        /// Save the result to the archive under this name
        #[arg(long)]
        archive_name: Option<String>,

        /// Save the result to the archive under the current time
        #[arg(long, conflicts_with = "archive_name")]
        archive: bool,
    },

    /// Inspect or edit saved analyses
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },

    /// Ask the service whether a JPEG frame shows a tennis court
    CheckCourt {
        /// JPEG image
        image: PathBuf,
    },

    /// Run a detection sequence through the auto-recorder and print decisions
    Debounce {
        /// Detections in order, e.g. `0,0,1,1,1`
        #[arg(value_parser = parse_detections)]
        detections: ::std::vec::Vec<bool>,

        /// Time between detections in milliseconds
        #[arg(long, default_value_t = 200)]
        interval_ms: u64,
    },
}

#[derive(Debug, Subcommand)]
pub enum ArchiveAction {
    /// List saved analyses
    List,
    /// Delete every saved analysis
    Clear,
    /// Replace the notes of one saved analysis
    Notes {
        name: String,
        remote_key: String,
        notes: String,
    },
}

/// Parse `1,0,true,false,...` into detections.
pub fn parse_detections(raw: &str) -> Result<Vec<bool>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "y" => Ok(true),
            "0" | "false" | "f" | "n" => Ok(false),
            other => Err(format!("not a detection: {other:?}")),
        })
        .collect()
}
