use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for mdlive
#[derive(Parser, Debug)]
#[command(author, version, about = "mdlive: Markdown for live pages")]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Commands,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times). Later files override earlier ones.
  #[arg(short = 'c', long = "config-file", global = true, action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, e.g.
  /// `markdown.chart_height=400`, can be used multiple times)
  #[arg(long = "config", global = true, action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the mdlive CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Render a Markdown document to an HTML fragment
  Render {
    /// Markdown file to render, or `-` for standard input
    input: PathBuf,

    /// Write the HTML here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Activate chart placeholders by embedding their options as JSON
    /// scripts, for pages without a hydration pass of their own
    #[arg(long)]
    hydrate: bool,

    /// Prefix for block identifiers
    #[arg(long)]
    id_prefix: Option<String>,
  },

  /// Check that every chart declaration in a document decodes
  Check {
    /// Markdown file to check, or `-` for standard input
    input: PathBuf,
  },

  /// Initialize a new mdlive configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "mdlive.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },
}

impl Cli {
  /// Parse arguments from the process command line
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}
