//! Command line arguments and run configuration for the `fastfilter` binary.

use std::path::Path;

use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::factory::Params;
use crate::model::SegmentId;
use crate::segment::{MemoryDocument, MemorySegment};

/// CLI arguments for the binary.
#[derive(Parser, Debug)]
#[command(name = "fastfilter")]
#[command(about = "Roaring-bitmap document filter")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the base64 terms of a set of integers
    Encode {
        /// Values to include; `a..b` and `a..=b` add ranges
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Print the contents of base64 terms
    Decode {
        terms: String,

        /// Maximum number of values to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Evaluate a filter over the segments of a configuration file
    Run {
        /// Path to the YAML run configuration
        #[arg(short, long, env = "FASTFILTER_CONFIG_FILE")]
        config: String,

        /// Search segments on parallel threads
        #[arg(long)]
        parallel: bool,

        /// Print evaluation metrics after the hits
        #[arg(long)]
        metrics: bool,
    },
}

/// A filter together with the segments to run it over.
///
/// ```yaml
/// params:
///   field: price
///   terms: OjAAAAEAAAAAAAIAEAAAAAEAAgADAA==
///   operation: include
/// segments:
///   - documents:
///       - id: "1"
///         values:
///           price: [2]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub params: Params,
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

/// One in-memory segment of a [`RunConfig`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SegmentConfig {
    /// Defaults to the segment's position in the file.
    #[serde(default)]
    pub id: Option<SegmentId>,
    #[serde(default)]
    pub documents: Vec<MemoryDocument>,
}

impl RunConfig {
    /// Builds the configured segments.
    pub fn build_segments(&self) -> Vec<MemorySegment> {
        self.segments
            .iter()
            .enumerate()
            .map(|(position, segment)| {
                MemorySegment::from_documents(
                    segment.id.unwrap_or(position as SegmentId),
                    segment.documents.clone(),
                )
            })
            .collect()
    }
}

/// Load a run configuration from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let contents = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
    parse_config(&contents)
}

/// Parse a run configuration from YAML text.
pub fn parse_config(yaml: &str) -> Result<RunConfig> {
    serde_yaml::from_str(yaml)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
}

/// Parses command line values such as `7`, `10..20` or `10..=20`.
pub fn parse_values(args: &[String]) -> Result<Vec<u32>> {
    let mut values = Vec::new();
    for arg in args {
        if let Some((start, end)) = arg.split_once("..=") {
            values.extend(parse_value(start)?..=parse_value(end)?);
        } else if let Some((start, end)) = arg.split_once("..") {
            values.extend(parse_value(start)?..parse_value(end)?);
        } else {
            values.push(parse_value(arg)?);
        }
    }
    Ok(values)
}

fn parse_value(s: &str) -> Result<u32> {
    s.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value [{}]: {}", s, e)))
}
