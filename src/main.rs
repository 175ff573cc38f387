use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use markon::boot::{
    resolve_initial_content, BootParams, ContentFetcher, HttpFetcher, DEFAULT_CONTENT,
};
use markon::cli::{BootSource, CliArgs, StartupConfig, StoreMode};
use markon::config::EditorConfig;
use markon::document::{ContentStore, Document};
use markon::preview::{extract_headings, PreviewPane};
use markon::storage::{FileStore, PersistenceChannel, PersistenceOptions, StorageError};
use markon::sync::{PreviewView, ScrollSync, ScrollTarget, SourceView, SyncAction};
use markon::syntax::Highlighter;

/// How long a one-shot run waits for the stored document
const LOAD_TIMEOUT: Duration = Duration::from_secs(2);

/// Initial text and whether it must win over the stored document
fn boot_document(source: &BootSource) -> Result<(String, bool)> {
    match source {
        BootSource::File(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((text, true))
        }
        BootSource::Location { search, fragment } => {
            let params = BootParams::from_location(search.as_deref(), fragment.as_deref());
            let fetcher = match &params.url {
                Some(_) => match HttpFetcher::new() {
                    Ok(fetcher) => Some(fetcher),
                    Err(e) => {
                        tracing::warn!("HTTP client unavailable: {}", e);
                        None
                    }
                },
                None => None,
            };
            let initial = resolve_initial_content(
                &params,
                DEFAULT_CONTENT,
                fetcher
                    .as_ref()
                    .map(|fetcher: &HttpFetcher| fetcher as &dyn ContentFetcher),
            );
            tracing::info!(source = ?initial.source, "Boot content resolved");
            Ok((initial.text, initial.external))
        }
        BootSource::Default => Ok((DEFAULT_CONTENT.to_string(), false)),
    }
}

fn open_persistence(
    startup: &StartupConfig,
    editor_config: &EditorConfig,
    document: Rc<dyn ContentStore>,
    external: bool,
) -> Option<PersistenceChannel> {
    let store = match &startup.store {
        StoreMode::Disabled => return None,
        StoreMode::Path(path) => FileStore::open(path.clone()),
        StoreMode::Default => editor_config
            .storage
            .store_path()
            .ok_or(StorageError::Unavailable)
            .and_then(|path: PathBuf| FileStore::open(path)),
    };
    let options = PersistenceOptions::from_config(&editor_config.storage, external);
    Some(PersistenceChannel::new(document, store, options))
}

/// Scroll the source to `line` and let the synchronizer follow in the preview
fn demo_sync(
    document: &Rc<Document>,
    pane: &Rc<PreviewPane>,
    config: &EditorConfig,
    line: usize,
) -> Option<SyncAction> {
    document.set_top_line(line - 1);

    let source: Rc<dyn SourceView> = document.clone();
    let preview: Rc<dyn PreviewView> = pane.clone();
    let content: Rc<dyn ContentStore> = document.clone();
    let mut sync = ScrollSync::new(source, preview, content, config.sync.clone());
    sync.enable();

    let start = Instant::now();
    sync.handle_scroll(ScrollTarget::Source, start);
    let due = sync.next_deadline()?;
    if !sync.tick(due) {
        return None;
    }
    sync.animation_frame(due)
}

fn write_output(html: &str, out: Option<&PathBuf>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote preview to {}", path.display());
        }
        None => print!("{}", html),
    }
    Ok(())
}

fn main() -> Result<()> {
    markon::tracing::init();

    let startup = CliArgs::parse()
        .into_config()
        .map_err(anyhow::Error::msg)?;

    let editor_config = match &startup.config_path {
        Some(path) => EditorConfig::load_from(path),
        None => EditorConfig::load(),
    };

    let (text, external) = boot_document(&startup.source)?;
    let document = Rc::new(
        Document::new(&text).with_scroll_margin(editor_config.preview.scroll_margin_lines),
    );

    let highlighter = Rc::new(RefCell::new(Highlighter::new()));
    let pane = Rc::new(PreviewPane::new(&editor_config.preview, highlighter));
    PreviewPane::attach(&pane, document.as_ref());

    let mut persistence = open_persistence(&startup, &editor_config, document.clone(), external);
    if let Some(channel) = persistence.as_ref() {
        if channel.is_enabled() && !external {
            channel.load();
            if channel.wait_for_load(LOAD_TIMEOUT) {
                if let Some(summary) = pane.profiler().summary() {
                    tracing::debug!("Restore {}", summary);
                }
            }
        }
    }

    if let Some(line) = startup.sync_line {
        if !editor_config.sync.enabled {
            tracing::info!("Scroll sync is disabled in the config");
        } else {
            match demo_sync(&document, &pane, &editor_config, line) {
                Some(SyncAction::PreviewScrolled { element, line }) => eprintln!(
                    "line {} -> preview element {} (offset {:.0}px)",
                    line,
                    element,
                    pane.scroll_offset()
                ),
                Some(action) => eprintln!("{:?}", action),
                None => eprintln!("line {}: no matching preview element", line),
            }
        }
    }

    if startup.show_toc {
        for entry in extract_headings(&pane.tree()) {
            let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
            println!("{}- [{}](#{}) L{}", indent, entry.text, entry.id, entry.line);
        }
    }

    let html = pane.html();
    if startup.output.is_some() || !startup.show_toc {
        write_output(&html, startup.output.as_ref())?;
    }

    let report = pane.last_highlight_report();
    tracing::debug!(
        blocks = report.blocks,
        highlighted = report.highlighted,
        grammars_loaded = report.grammars_loaded,
        "Highlighted code blocks"
    );

    if let Some(channel) = persistence.as_mut() {
        channel.handle_before_unload();
        channel.cleanup();
    }

    Ok(())
}
