//! Capture pipeline: request → filter → dedup → fetch → store → extract → bus.

use std::sync::Arc;

use camquiz::{extract_quizzes, QuizDocument};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::dedup::PendingSet;
use crate::error::{CaptureError, CaptureResult};
use crate::events::{CaptureEvent, EventBus};
use crate::fetch::Fetcher;
use crate::filter::{RequestEvent, RequestFilter};
use crate::store::{CapturedRecord, RecordStore};

/// What happened to one observed request.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// The request is not a descriptor fetch.
    Ignored,
    /// Collapsed into an in-flight or recent capture of the same URL.
    Duplicate,
    /// Fetched, stored and extracted.
    Captured {
        key: String,
        record: CapturedRecord,
        document: QuizDocument,
    },
}

/// Turns observed requests into stored records and display events.
pub struct CapturePipeline<F, S> {
    filter: RequestFilter,
    pending: Arc<PendingSet>,
    fetcher: F,
    store: S,
    bus: Arc<EventBus>,
}

impl<F: Fetcher, S: RecordStore> CapturePipeline<F, S> {
    pub fn new(
        filter: RequestFilter,
        pending: Arc<PendingSet>,
        fetcher: F,
        store: S,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            filter,
            pending,
            fetcher,
            store,
            bus,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Run one observed request through the pipeline.
    ///
    /// The URL stays claimed while its fetch is in flight; the dedup window
    /// starts once the record is stored. Transport and store failures
    /// release the dedup entry, emit
    /// `CaptureFailed` and are returned. A payload that is not well-formed
    /// XML is still stored; its event carries an empty document.
    pub async fn handle(&self, event: &RequestEvent) -> CaptureResult<CaptureOutcome> {
        if !self.filter.matches(event) {
            tracing::trace!(url = %event.url, kind = %event.kind, "request ignored");
            return Ok(CaptureOutcome::Ignored);
        }

        let url = event.url.as_str();
        if !self.pending.try_acquire(url) {
            tracing::debug!(url, "already captured recently");
            self.bus.emit(CaptureEvent::RequestDeduplicated {
                url: url.to_string(),
            });
            return Ok(CaptureOutcome::Duplicate);
        }

        tracing::debug!(url, "matched descriptor request");
        self.bus.emit(CaptureEvent::RequestMatched {
            url: url.to_string(),
        });

        let resource = match self.fetcher.fetch(url).await {
            Ok(r) => r,
            Err(e) => return Err(self.fail(url, e)),
        };

        let record = CapturedRecord::new(url, resource.body);
        let key = match self.store.append(&record) {
            Ok(k) => k,
            Err(e) => return Err(self.fail(url, e)),
        };
        self.pending.complete(url);

        let document = match extract_quizzes(&record.raw_xml) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(url, key = %key, "stored payload is not a readable descriptor: {e}");
                QuizDocument::empty()
            }
        };

        tracing::info!(
            url,
            key = %key,
            bytes = record.raw_xml.len(),
            sections = document.sections.len(),
            questions = document.question_count(),
            "captured descriptor"
        );

        self.bus.emit(CaptureEvent::XmlCaptured {
            key: key.clone(),
            record: record.clone(),
            document: document.clone(),
        });

        Ok(CaptureOutcome::Captured {
            key,
            record,
            document,
        })
    }

    fn fail(&self, url: &str, error: CaptureError) -> CaptureError {
        tracing::warn!(url, "capture failed: {error}");
        self.pending.release(url);
        self.bus.emit(CaptureEvent::CaptureFailed {
            url: url.to_string(),
            error: error.to_string(),
        });
        error
    }
}

impl<F, S> CapturePipeline<F, S>
where
    F: Fetcher + 'static,
    S: RecordStore + 'static,
{
    /// Drain `rx`, handling each request on its own task.
    ///
    /// Returns once the channel is closed and every spawned capture has
    /// finished. Failures are already reported on the bus and in the log.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<RequestEvent>) {
        let mut tasks = JoinSet::new();

        while let Some(event) = rx.recv().await {
            let pipeline = Arc::clone(&self);
            tasks.spawn(async move {
                let _ = pipeline.handle(&event).await;
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!("capture task panicked: {e}");
            }
        }
    }
}
