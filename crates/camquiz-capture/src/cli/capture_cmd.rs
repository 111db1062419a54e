//! `camquiz capture` — run a single observed request through the pipeline.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::output;
use crate::config::CaptureConfig;
use crate::dedup::PendingSet;
use crate::display::DisplayedCapture;
use crate::events::EventBus;
use crate::fetch::HttpFetcher;
use crate::filter::{RequestEvent, RequestFilter, RequestKind};
use crate::pipeline::{CaptureOutcome, CapturePipeline};
use crate::store::SqliteStore;

/// Run the capture command.
pub async fn run(config: &CaptureConfig, db_path: &Path, url: &str, kind: &str) -> Result<()> {
    let filter = RequestFilter::new(&config.url_pattern)?;
    let store = SqliteStore::open(db_path)
        .with_context(|| format!("failed to open capture store {}", db_path.display()))?;
    let pipeline = CapturePipeline::new(
        filter,
        Arc::new(PendingSet::new(config.dedup_window())),
        HttpFetcher::new(config.fetch_timeout_ms),
        store,
        Arc::new(EventBus::default()),
    );

    let kind: RequestKind = kind.parse()?;
    let event = RequestEvent::new(url, kind);

    match pipeline.handle(&event).await? {
        CaptureOutcome::Captured {
            key,
            record,
            document,
        } => {
            let shown = DisplayedCapture::new(&key, &record, &document);
            if output::is_json() {
                output::print_json(&shown);
            } else {
                print!("{}", shown.to_text());
            }
        }
        CaptureOutcome::Ignored => {
            if output::is_json() {
                output::print_json(&serde_json::json!({"captured": false, "reason": "ignored"}));
            } else if !output::is_quiet() {
                println!("  {url} is not a descriptor request ({}); nothing captured.", event.kind);
            }
        }
        CaptureOutcome::Duplicate => {
            if output::is_json() {
                output::print_json(&serde_json::json!({"captured": false, "reason": "duplicate"}));
            } else if !output::is_quiet() {
                println!("  {url} was captured moments ago; skipped.");
            }
        }
    }

    Ok(())
}
