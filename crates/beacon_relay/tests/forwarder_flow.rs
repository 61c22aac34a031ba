//! End-to-end relay tests: host bus -> forwarder -> transport.

use anyhow::Result;
use beacon_protocol::defaults::BEACON_EVENT;
use beacon_protocol::{BeaconPayload, RelayConfig, TransportUnavailable};
use beacon_relay::*;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PIXEL_PATH: &str = "/public/text/pmt.gif";

async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..250 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= count {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("collector did not receive {} requests", count);
}

async fn pixel_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PIXEL_PATH))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

#[derive(Default)]
struct RecordingFactory {
    urls: Arc<Mutex<Vec<String>>>,
}

struct RecordingTransport {
    urls: Arc<Mutex<Vec<String>>>,
}

impl Transport for RecordingTransport {
    fn fire(&self, url: &str) {
        self.urls.lock().unwrap().push(url.to_string());
    }
}

impl TransportFactory for RecordingFactory {
    fn create(&self) -> Result<Box<dyn Transport>, TransportUnavailable> {
        Ok(Box::new(RecordingTransport {
            urls: Arc::clone(&self.urls),
        }))
    }
}

/// Counts subscribe calls without delivering anything.
#[derive(Default)]
struct CountingBus {
    subscribes: Mutex<Vec<(String, String)>>,
}

impl EventBus for CountingBus {
    fn subscribe(
        &self,
        event: &str,
        _handler: BeaconHandler,
        _state: Option<serde_json::Value>,
        context: SubscriberContext,
    ) {
        self.subscribes
            .lock()
            .unwrap()
            .push((event.to_string(), context.name));
    }
}

#[test]
fn test_initialize_many_times_subscribes_once() {
    let bus = Arc::new(CountingBus::default());
    let (forwarder, _relay_loop) = BeaconForwarder::new(
        bus.clone(),
        RelayConfig::default(),
        Arc::new(RecordingFactory::default()),
    );

    for _ in 0..5 {
        forwarder.initialize();
    }

    assert_eq!(
        *bus.subscribes.lock().unwrap(),
        vec![("beacon".to_string(), "BeaconRepeater".to_string())]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pixel_reaches_collector() -> Result<()> {
    let server = pixel_server().await;
    let target = format!("{}{}", server.uri(), PIXEL_PATH);

    let bus = Arc::new(HostBus::new());
    let (forwarder, relay_loop) = BeaconForwarder::new(
        bus.clone(),
        RelayConfig::default().with_target(&target),
        Arc::new(PixelTransportFactory::new()),
    );
    forwarder.initialize();
    let relay_task = tokio::spawn(relay_loop.run());

    let payload =
        BeaconPayload::from_json_str(r#"{"rt.start": "100", "foo": "bar", "t_done": 250}"#)?;
    bus.fire(BEACON_EVENT, &payload);

    let requests = wait_for_requests(&server, 1).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), PIXEL_PATH);
    assert_eq!(requests[0].url.query(), Some("rt.start=100&t_done=250"));
    assert!(requests[0].body.is_empty());

    drop(forwarder);
    drop(bus);
    let stats = timeout(Duration::from_secs(5), relay_task).await??;
    assert_eq!(
        stats,
        RelayStats {
            received: 1,
            forwarded: 1,
            dropped: 0,
        }
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unfiltered_pixel_carries_every_field() -> Result<()> {
    let server = pixel_server().await;
    let target = format!("{}{}", server.uri(), PIXEL_PATH);

    let bus = Arc::new(HostBus::new());
    let (forwarder, relay_loop) = BeaconForwarder::new(
        bus.clone(),
        RelayConfig::default().with_target(&target).unfiltered(),
        Arc::new(PixelTransportFactory::new()),
    );
    forwarder.initialize();
    let relay_task = tokio::spawn(relay_loop.run());

    let payload = BeaconPayload::from_json_str(r#"{"a": 1, "b": 2, "c": "x y&z"}"#)?;
    bus.fire(BEACON_EVENT, &payload);

    let requests = wait_for_requests(&server, 1).await;
    assert_eq!(requests[0].url.query(), Some("a=1&b=2&c=x%20y%26z"));

    drop(forwarder);
    drop(bus);
    timeout(Duration::from_secs(5), relay_task).await??;
    Ok(())
}

#[tokio::test]
async fn test_handler_returns_before_request_is_built() -> Result<()> {
    let bus = Arc::new(HostBus::new());
    let factory = Arc::new(RecordingFactory::default());
    let urls = Arc::clone(&factory.urls);
    let (forwarder, relay_loop) = BeaconForwarder::new(
        bus.clone(),
        RelayConfig::default().with_target("https://collector.example/p.gif"),
        factory,
    );
    forwarder.initialize();
    let relay_task = tokio::spawn(relay_loop.run());

    // Current-thread runtime: the loop cannot run until this task yields
    bus.fire(BEACON_EVENT, &BeaconPayload::new().with("t_done", 1i64));
    bus.fire(BEACON_EVENT, &BeaconPayload::new().with("t_done", 2i64));
    assert!(urls.lock().unwrap().is_empty());

    drop(forwarder);
    drop(bus);
    let stats = timeout(Duration::from_secs(5), relay_task).await??;

    assert_eq!(stats.forwarded, 2);
    assert_eq!(
        *urls.lock().unwrap(),
        vec![
            "https://collector.example/p.gif?t_done=1".to_string(),
            "https://collector.example/p.gif?t_done=2".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_pixel_factory_outside_runtime_fails_open() {
    let bus = Arc::new(HostBus::new());
    let (forwarder, mut relay_loop) = BeaconForwarder::new(
        bus.clone(),
        RelayConfig::default(),
        Arc::new(PixelTransportFactory::with_client(reqwest::Client::new())),
    );
    forwarder.initialize();

    bus.fire(BEACON_EVENT, &BeaconPayload::new().with("t_done", 1i64));
    assert_eq!(relay_loop.process_pending(), 1);
    assert_eq!(forwarder.stats().dropped, 1);
    assert_eq!(forwarder.stats().forwarded, 0);
}

#[tokio::test]
async fn test_replay_file_through_forwarder() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, r#"{{"rt.start": "1", "foo": "bar"}}"#)?;
    writeln!(file, "garbage")?;
    writeln!(file, r#"{{"t_done": 42, "u": "https://example.com/a b"}}"#)?;
    file.flush()?;

    let bus = Arc::new(HostBus::new());
    let factory = Arc::new(RecordingFactory::default());
    let urls = Arc::clone(&factory.urls);
    let (forwarder, mut relay_loop) = BeaconForwarder::new(
        bus.clone(),
        RelayConfig::default().with_target("https://collector.example/p.gif"),
        factory,
    );
    forwarder.initialize();

    let reader = tokio::io::BufReader::new(tokio::fs::File::open(file.path()).await?);
    let summary = replay_lines(reader, &bus).await?;
    assert_eq!(summary, ReplaySummary { fired: 2, skipped: 1 });

    assert_eq!(relay_loop.process_pending(), 2);
    assert_eq!(
        *urls.lock().unwrap(),
        vec![
            "https://collector.example/p.gif?rt.start=1".to_string(),
            "https://collector.example/p.gif?t_done=42&u=https%3A%2F%2Fexample.com%2Fa%20b"
                .to_string(),
        ]
    );
    Ok(())
}
