//! End-to-end capture: HTTP fetch into a SQLite store, through to what the
//! panel shows and what a page reload restores.

use std::sync::Arc;
use std::time::Duration;

use camquiz_capture::dedup::PendingSet;
use camquiz_capture::display::{restore_for_page, DisplayState};
use camquiz_capture::events::{CaptureEvent, EventBus};
use camquiz_capture::fetch::HttpFetcher;
use camquiz_capture::filter::{RequestEvent, RequestFilter, RequestKind};
use camquiz_capture::pipeline::{CaptureOutcome, CapturePipeline};
use camquiz_capture::store::{history, SqliteStore};
use tokio::sync::{broadcast, mpsc};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_PATH: &str = "/d2l/le/content/4411/viewContent/9021/View";

const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:xmpDM="http://ns.adobe.com/xmp/1.0/DynamicMedia/"
    xmlns:tscIQ="http://www.techsmith.com/xmp/tscIQ/">
   <xmpDM:Tracks>
    <rdf:Bag>
     <rdf:li>
      <rdf:Description xmpDM:trackName="Quiz" xmpDM:trackType="Quiz">
       <xmpDM:markers>
        <rdf:Seq>
         <rdf:li>
          <rdf:Description xmpDM:startTime="5100" tscIQ:questionSetName="Checkpoint">
           <tscIQ:questions>
            <rdf:Seq>
             <rdf:li>
              <rdf:Description tscIQ:type="MC" tscIQ:id="1">
               <tscIQ:question>Which layer routes packets?</tscIQ:question>
               <tscIQ:answer>Transport</tscIQ:answer>
               <tscIQ:answer>Network</tscIQ:answer>
               <tscIQ:answer>Data link</tscIQ:answer>
               <tscIQ:answer>Physical</tscIQ:answer>
               <tscIQ:correctAnswer>2</tscIQ:correctAnswer>
              </rdf:Description>
             </rdf:li>
             <rdf:li>
              <rdf:Description tscIQ:type="FITB" tscIQ:id="2">
               <tscIQ:question>Port for HTTPS?</tscIQ:question>
              </rdf:Description>
             </rdf:li>
            </rdf:Seq>
           </tscIQ:questions>
          </rdf:Description>
         </rdf:li>
        </rdf:Seq>
       </xmpDM:markers>
      </rdf:Description>
     </rdf:li>
    </rdf:Bag>
   </xmpDM:Tracks>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#;

async fn descriptor_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{PAGE_PATH}/lecture_config.xml")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(DESCRIPTOR),
        )
        .mount(&server)
        .await;
    server
}

fn pipeline(
    store: SqliteStore,
    window: Duration,
) -> (CapturePipeline<HttpFetcher, SqliteStore>, broadcast::Receiver<CaptureEvent>) {
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    let pipeline = CapturePipeline::new(
        RequestFilter::new(r"_config\.xml$").unwrap(),
        Arc::new(PendingSet::new(window)),
        HttpFetcher::new(5_000),
        store,
        bus,
    );
    (pipeline, events)
}

fn drain(events: &mut broadcast::Receiver<CaptureEvent>) -> Vec<CaptureEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_captured_descriptor_is_stored_shown_and_restored() {
    let server = descriptor_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("captures.db")).unwrap();
    let (pipeline, mut events) = pipeline(store, Duration::from_secs(5));

    let url = format!("{}{PAGE_PATH}/lecture_config.xml", server.uri());
    let outcome = pipeline
        .handle(&RequestEvent::new(&url, RequestKind::XmlHttpRequest))
        .await
        .unwrap();

    let key = match outcome {
        CaptureOutcome::Captured { key, document, .. } => {
            assert_eq!(document.sections.len(), 1);
            assert_eq!(document.question_count(), 1);
            key
        }
        other => panic!("expected a capture, got {other:?}"),
    };
    assert!(key.starts_with("xml_data_"));

    let mut panel = DisplayState::new();
    for event in drain(&mut events) {
        panel.apply(&event);
    }
    let shown = panel.current().expect("panel shows the capture");
    let text = shown.to_text();
    assert!(text.contains("Checkpoint"));
    assert!(text.contains("Which layer routes packets?"));
    assert!(text.contains("Correct Answer: Press 2"));
    assert!(!text.contains("Port for HTTPS?"));

    let stored = history(pipeline.store()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record.raw_xml, DESCRIPTOR);

    let page = format!("https://learn.example.edu{PAGE_PATH}");
    let restored = restore_for_page(pipeline.store(), &page)
        .unwrap()
        .expect("reload restores the capture");
    assert_eq!(restored.key, key);
    assert_eq!(restored.view, shown.view);

    let other_page = "https://learn.example.edu/d2l/le/content/4411/viewContent/1/View";
    assert!(restore_for_page(pipeline.store(), other_page).unwrap().is_none());
}

#[tokio::test]
async fn test_repeated_requests_collapse_into_one_capture() {
    let server = descriptor_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("captures.db")).unwrap();
    let (pipeline, mut events) = pipeline(store, Duration::from_secs(5));
    let pipeline = Arc::new(pipeline);

    let url = format!("{}{PAGE_PATH}/lecture_config.xml", server.uri());
    let (tx, rx) = mpsc::channel(8);
    for _ in 0..2 {
        tx.send(RequestEvent::new(&url, RequestKind::XmlHttpRequest))
            .await
            .unwrap();
    }
    tx.send(RequestEvent::new(&url, RequestKind::Script))
        .await
        .unwrap();
    drop(tx);

    Arc::clone(&pipeline).run(rx).await;

    let events = drain(&mut events);
    let captured = events
        .iter()
        .filter(|e| matches!(e, CaptureEvent::XmlCaptured { .. }))
        .count();
    let deduplicated = events
        .iter()
        .filter(|e| matches!(e, CaptureEvent::RequestDeduplicated { .. }))
        .count();
    assert_eq!(captured, 1);
    assert_eq!(deduplicated, 1);

    let mut panel = DisplayState::new();
    for event in &events {
        panel.apply(event);
    }
    assert_eq!(panel.update_count(), 1);

    assert_eq!(history(pipeline.store()).unwrap().len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_fetch_can_be_retried_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = SqliteStore::open_in_memory().unwrap();
    let (pipeline, mut events) = pipeline(store, Duration::from_secs(5));
    let url = format!("{}/gone_config.xml", server.uri());
    let event = RequestEvent::new(&url, RequestKind::XmlHttpRequest);

    assert!(pipeline.handle(&event).await.is_err());
    assert!(pipeline.handle(&event).await.is_err());

    let failures = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, CaptureEvent::CaptureFailed { .. }))
        .count();
    assert_eq!(failures, 2);
    assert!(history(pipeline.store()).unwrap().is_empty());
}

#[test]
fn test_page_loads_and_scripts_are_never_fetched() {
    let store = SqliteStore::open_in_memory().unwrap();
    let (pipeline, mut events) = pipeline(store, Duration::from_secs(5));
    let url = "https://learn.example.edu/v/lecture_config.xml";

    for kind in [RequestKind::Document, RequestKind::Script, RequestKind::Fetch] {
        let outcome =
            tokio_test::block_on(pipeline.handle(&RequestEvent::new(url, kind))).unwrap();
        assert!(matches!(outcome, CaptureOutcome::Ignored));
    }

    assert!(drain(&mut events).is_empty());
    let page = format!("https://learn.example.edu{PAGE_PATH}");
    assert!(restore_for_page(pipeline.store(), &page).unwrap().is_none());
}
