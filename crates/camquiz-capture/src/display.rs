//! What the side panel currently shows, and restoring it on page load.

use camquiz::{extract_quizzes, render_text, PanelView, QuizDocument};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::error::CaptureResult;
use crate::events::CaptureEvent;
use crate::store::{latest_for_path, CapturedRecord, RecordStore, StoredRecord};

/// Path fragment of Brightspace content (video) pages.
pub const VIDEO_PAGE_MARKER: &str = "/d2l/le/content/";

/// A capture as shown in the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayedCapture {
    pub key: String,
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
    pub view: PanelView,
}

impl DisplayedCapture {
    pub fn new(key: &str, record: &CapturedRecord, document: &QuizDocument) -> Self {
        Self {
            key: key.to_string(),
            source_url: record.source_url.clone(),
            timestamp: record.timestamp,
            view: PanelView::from_document(document),
        }
    }

    /// Terminal rendering with a header naming the source.
    pub fn to_text(&self) -> String {
        format!(
            "Captured {} from {}\n\n{}",
            self.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            self.source_url,
            render_text(&self.view)
        )
    }
}

/// The panel's current content.
///
/// Only the most recently completed capture is shown: an offer older than
/// what is already displayed is rejected.
#[derive(Debug, Default)]
pub struct DisplayState {
    current: Option<DisplayedCapture>,
    updates: usize,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&DisplayedCapture> {
        self.current.as_ref()
    }

    /// Number of accepted display updates.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    /// Show `capture` unless it completed before the current one.
    pub fn offer(&mut self, capture: DisplayedCapture) -> bool {
        if let Some(current) = &self.current {
            if capture.timestamp < current.timestamp {
                tracing::debug!(
                    key = %capture.key,
                    "ignoring capture older than the one displayed"
                );
                return false;
            }
        }
        self.current = Some(capture);
        self.updates += 1;
        true
    }

    /// Apply a pipeline event. Returns true if the panel changed.
    pub fn apply(&mut self, event: &CaptureEvent) -> bool {
        match event {
            CaptureEvent::XmlCaptured {
                key,
                record,
                document,
            } => self.offer(DisplayedCapture::new(key, record, document)),
            _ => false,
        }
    }
}

/// True if `page_url` is a Brightspace content page.
pub fn is_video_page(page_url: &str) -> bool {
    page_url.contains(VIDEO_PAGE_MARKER)
}

/// Restore the panel for a page from stored captures.
///
/// On a video page, the most recent capture is shown if its source URL
/// contains the page's path. Anything else shows nothing.
pub fn restore_for_page(
    store: &dyn RecordStore,
    page_url: &str,
) -> CaptureResult<Option<DisplayedCapture>> {
    if !is_video_page(page_url) {
        return Ok(None);
    }

    let path = page_path(page_url);
    let Some(stored) = latest_for_path(store, &path)? else {
        tracing::debug!(page = page_url, "no capture for this page");
        return Ok(None);
    };

    Ok(Some(displayed_from_stored(&stored)))
}

/// Build the panel content for a stored record.
pub fn displayed_from_stored(stored: &StoredRecord) -> DisplayedCapture {
    let document = extract_quizzes(&stored.record.raw_xml).unwrap_or_else(|e| {
        tracing::warn!(key = %stored.key, "stored payload is not a readable descriptor: {e}");
        QuizDocument::empty()
    });
    DisplayedCapture::new(&stored.key, &stored.record, &document)
}

fn page_path(page_url: &str) -> String {
    match url::Url::parse(page_url) {
        Ok(u) => u.path().to_string(),
        Err(_) => page_url.to_string(),
    }
}

/// Listing of stored captures, newest first, as shown by the popup.
pub fn render_history(records: &[StoredRecord]) -> String {
    if records.is_empty() {
        return "No XML data captured yet...\n".to_string();
    }

    let mut out = String::new();
    for stored in records {
        let record = &stored.record;
        out.push_str(&format!(
            "{}\n{}\n",
            record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            record.source_url
        ));
        if record.raw_xml.is_empty() {
            out.push_str("No content available\n");
        } else {
            out.push_str(&record.raw_xml);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
