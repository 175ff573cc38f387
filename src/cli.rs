//! Command-line argument parsing
//!
//! Supports:
//! - Opening a markdown file, or booting from a query string / fragment
//! - Writing the rendered preview to a file
//! - Choosing or disabling the persistence store
//! - Exercising scroll sync from a given source line

use clap::Parser;
use std::path::PathBuf;

/// A distraction-free markdown editor core
#[derive(Parser, Debug)]
#[command(name = "markon", version, about = "Render markdown with a synced, highlighted preview")]
pub struct CliArgs {
    /// Markdown file to open
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Boot query string, e.g. "content=b64:..." or "url=https://..."
    #[arg(long, value_name = "QS")]
    pub query: Option<String>,

    /// Boot fragment, consulted when the query has neither key
    #[arg(long, value_name = "FRAG")]
    pub fragment: Option<String>,

    /// Write the preview HTML here instead of stdout
    #[arg(short = 'o', long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Slot file for persistence (defaults to the data directory)
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Do not load or save the document
    #[arg(long)]
    pub no_persist: bool,

    /// Scroll the source to line N and sync the preview to it
    #[arg(long, value_name = "N")]
    pub sync_line: Option<usize>,

    /// Print the table of contents instead of the HTML
    #[arg(long)]
    pub toc: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Where the initial document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootSource {
    /// Built-in sample, or whatever persistence restores
    Default,
    /// A markdown file on disk
    File(PathBuf),
    /// Query string and/or fragment of a launch location
    Location {
        search: Option<String>,
        fragment: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMode {
    /// Config value or the data directory
    Default,
    Path(PathBuf),
    Disabled,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub source: BootSource,
    pub store: StoreMode,
    pub output: Option<PathBuf>,
    /// 1-indexed source line to sync the preview to
    pub sync_line: Option<usize>,
    pub show_toc: bool,
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    /// Convert parsed CLI args into startup configuration
    pub fn into_config(self) -> Result<StartupConfig, String> {
        let source = match (self.file, self.query, self.fragment) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err("FILE cannot be combined with --query or --fragment".to_string());
            }
            (Some(file), None, None) => BootSource::File(file),
            (None, None, None) => BootSource::Default,
            (None, search, fragment) => BootSource::Location { search, fragment },
        };

        let store = match (self.no_persist, self.store) {
            (true, Some(_)) => {
                return Err("--store cannot be combined with --no-persist".to_string());
            }
            (true, None) => StoreMode::Disabled,
            (false, Some(path)) => StoreMode::Path(path),
            (false, None) => StoreMode::Default,
        };

        if self.sync_line == Some(0) {
            return Err("--sync-line is 1-indexed".to_string());
        }

        Ok(StartupConfig {
            source,
            store,
            output: self.out,
            sync_line: self.sync_line,
            show_toc: self.toc,
            config_path: self.config,
        })
    }
}
