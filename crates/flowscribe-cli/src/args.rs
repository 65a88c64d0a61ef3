//! Command-line argument definitions for the `flowscribe` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use flowscribe_core::OutputFormat;

/// Turn plain-language descriptions into rendered Mermaid flowcharts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (JSON). Defaults to ~/.flowscribe/settings.json
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Per-run overrides for values normally taken from the settings file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Chat endpoint of the generator service
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Model name sent to the generator service
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Mermaid CLI executable
    #[arg(long, global = true)]
    pub renderer: Option<String>,

    /// Directory receiving rendered images
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Image format: png or svg
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a flowchart from a description and render it
    Generate {
        /// Description text
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Plain-text file holding the description. Reads stdin when neither flag is given
        #[arg(long)]
        file: Option<PathBuf>,

        /// Also export the final diagram in this format
        #[arg(long)]
        also: Option<OutputFormat>,
    },

    /// Render an existing Mermaid definition without generating anything
    Render {
        /// Path to the .mmd file
        file: PathBuf,

        /// Also export the diagram in this format
        #[arg(long)]
        also: Option<OutputFormat>,
    },

    /// Check that the renderer is installed
    Check,

    /// Print the effective settings
    Config {
        /// Write the effective settings (including overrides) back to the settings file
        #[arg(long)]
        save: bool,
    },
}
