pub mod output;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "loglens",
    version,
    about = "Line indexing and nested-section classification for large log files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a file and print its line and byte counts
    Info {
        /// File to index
        file: PathBuf,

        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print a range of lines through the index
    Lines {
        /// File to index
        file: PathBuf,

        /// 1-based inclusive line range, e.g. "10:20" (or a single line)
        #[arg(short, long)]
        range: Option<String>,

        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Prefix each line with its number
        #[arg(short, long)]
        numbers: bool,
    },
    /// Classify lines into marker-delimited sections
    Sections {
        /// File to classify
        file: PathBuf,

        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Resolve a single 1-based line instead of listing all sections
        #[arg(short, long)]
        line: Option<usize>,
    },
    /// Create a default .loglensrc.toml
    Init,
}

#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses a 1-based inclusive "A:B" range (or a bare "A" for one line) into
/// a 0-based half-open range.
pub fn parse_range(spec: &str, line_count: usize) -> Result<(usize, usize)> {
    let (lo, hi) = match spec.split_once(':') {
        Some((a, b)) => (a.parse::<usize>()?, b.parse::<usize>()?),
        None => {
            let line = spec.parse::<usize>()?;
            (line, line)
        }
    };
    if lo == 0 || hi < lo {
        bail!("invalid range `{spec}` (lines are 1-based, start must not exceed end)");
    }
    if hi > line_count {
        bail!("range `{spec}` exceeds file length ({line_count} lines)");
    }
    Ok((lo - 1, hi))
}
