//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the snapshot, the report destination,
//! path queries and row nudges to apply.

use std::str::FromStr;

use clap::Parser;

/// Command-line arguments for the Trellis interaction graph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input snapshot (TOML)
    #[arg(help = "Path to the snapshot file")]
    pub input: String,

    /// Path to the report file; the report goes to stdout when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path query to resolve against the built graph, e.g. `lifelineClusters[1]/nodes[2]`
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// Row nudge to apply, as `ROW:DELTA` (e.g. `3:20`)
    #[arg(short, long = "nudge")]
    pub nudges: Vec<Nudge>,

    /// Write the snapshot with the nudged notation to this path
    #[arg(long)]
    pub write_snapshot: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// A row nudge given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nudge {
    pub row: usize,
    pub delta: f32,
}

impl FromStr for Nudge {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (row, delta) = value
            .split_once(':')
            .ok_or_else(|| format!("expected ROW:DELTA, got `{value}`"))?;
        let row = row
            .trim()
            .parse()
            .map_err(|err| format!("invalid row `{row}`: {err}"))?;
        let delta = delta
            .trim()
            .parse()
            .map_err(|err| format!("invalid delta `{delta}`: {err}"))?;
        Ok(Self { row, delta })
    }
}
