//! `camquiz watch` — feed observed requests from stdin into the pipeline.
//!
//! Each stdin line is `<kind> <url>` (or a bare URL, taken as an XHR), as
//! a request-logging proxy or browser bridge would report them. Display
//! updates are printed as they arrive.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

use crate::cli::output;
use crate::config::CaptureConfig;
use crate::dedup::PendingSet;
use crate::display::DisplayState;
use crate::events::{CaptureEvent, EventBus};
use crate::fetch::HttpFetcher;
use crate::filter::{RequestEvent, RequestFilter};
use crate::pipeline::CapturePipeline;
use crate::store::SqliteStore;

/// Run the watch command until stdin closes.
pub async fn run(config: &CaptureConfig, db_path: &Path) -> Result<()> {
    let filter = RequestFilter::new(&config.url_pattern)?;
    let store = SqliteStore::open(db_path)
        .with_context(|| format!("failed to open capture store {}", db_path.display()))?;

    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    let pipeline = Arc::new(CapturePipeline::new(
        filter,
        Arc::new(PendingSet::new(config.dedup_window())),
        HttpFetcher::new(config.fetch_timeout_ms),
        store,
        bus,
    ));

    let (tx, rx) = mpsc::channel::<RequestEvent>(64);
    let runner = tokio::spawn(pipeline.run(rx));
    let printer = tokio::spawn(print_updates(events));

    if !output::is_quiet() && !output::is_json() {
        eprintln!("  Watching stdin for requests (\"<kind> <url>\" per line, Ctrl-D to stop)...");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(event) = RequestEvent::parse_line(&line) else {
            continue;
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }
    drop(tx);

    runner.await.context("capture pipeline task failed")?;
    let updates = printer.await.context("display task failed")?;
    tracing::info!(updates, "watch finished");

    Ok(())
}

/// Print every accepted display update until the bus closes.
async fn print_updates(mut events: broadcast::Receiver<CaptureEvent>) -> usize {
    let mut state = DisplayState::new();

    loop {
        match events.recv().await {
            Ok(event) => {
                if let CaptureEvent::CaptureFailed { url, error } = &event {
                    if !output::is_quiet() && !output::is_json() {
                        eprintln!("  Capture failed for {url}: {error}");
                    }
                }
                if state.apply(&event) {
                    if let Some(shown) = state.current() {
                        if output::is_json() {
                            output::print_json(shown);
                        } else {
                            print!("{}", shown.to_text());
                        }
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "display fell behind; some updates were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    state.update_count()
}
