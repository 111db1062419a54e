//! camquiz capture side — watch player requests, store descriptor XML, show
//! the quiz answers.
//!
//! Observed requests flow through [`pipeline::CapturePipeline`]:
//! [`filter`] → [`dedup`] → [`fetch`] → [`store`] → extraction → [`events`].
//! [`display`] turns the resulting events into what the panel shows.

pub mod cli;
pub mod config;
pub mod dedup;
pub mod display;
pub mod error;
pub mod events;
pub mod fetch;
pub mod filter;
pub mod pipeline;
pub mod store;

pub use config::{resolve_db_path, CaptureConfig};
pub use dedup::PendingSet;
pub use display::{restore_for_page, DisplayState, DisplayedCapture};
pub use error::{CaptureError, CaptureResult};
pub use events::{CaptureEvent, EventBus};
pub use fetch::{FetchedResource, Fetcher, HttpFetcher};
pub use filter::{RequestEvent, RequestFilter, RequestKind};
pub use pipeline::{CaptureOutcome, CapturePipeline};
pub use store::{CapturedRecord, MemoryStore, RecordStore, SqliteStore, StoredRecord};
