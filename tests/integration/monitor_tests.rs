//! Integration tests for the monitor
//!
//! These tests use wiremock to serve source pages and API endpoints and run
//! the full fetch, parse, detect and notify cycle end-to-end.

use async_trait::async_trait;
use numwatch::config::{parse_config, Config, FetchConfig};
use numwatch::fetch::Fetcher;
use numwatch::monitor::{lock_monitor, CheckOutcome, CountdownExit, Phase};
use numwatch::notify::{MessageHandle, Notification, NotifyError};
use numwatch::storage::{MemoryStore, SourceSnapshot, SourceStore, SqliteStore};
use numwatch::{Monitor, Notifier, SourceKind, Strategy};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Notifier that records everything it is asked to do
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    edits: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<MessageHandle, NotifyError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(notification.clone());
        Ok(MessageHandle(format!("msg-{}", sent.len())))
    }

    async fn edit_caption(&self, _handle: &MessageHandle, caption: &str) -> Result<(), NotifyError> {
        self.edits.lock().unwrap().push(caption.to_string());
        Ok(())
    }
}

/// Creates a test configuration with one source pointing at `url`
fn create_test_config(url: &str, kind: Option<&str>, extra: &str) -> Config {
    let kind = kind
        .map(|k| format!("kind = \"{}\"", k))
        .unwrap_or_default();
    parse_config(&format!(
        r#"
[fetch]
timeout = 1000
max-attempts = 1
retry-delay = 10

[monitor]
source-pause = 1

[flags]
template = "https://flags.test/{{iso}}.png"
probe = false

{extra}

[[source]]
id = "site_1"
url = "{url}"
{kind}
"#
    ))
    .expect("test config should be valid")
}

fn snapshot(last: &str, values: &[&str]) -> SourceSnapshot {
    SourceSnapshot {
        last_value: Some(last.to_string()),
        previous_last_value: Some(last.to_string()),
        latest_values: values.iter().map(|v| v.to_string()).collect(),
        ..SourceSnapshot::new("site_1")
    }
}

fn single_page(number: &str) -> String {
    format!(
        r#"<html><body>
        <div class="latest-added__title"><a href="/n">{}</a></div>
        </body></html>"#,
        number
    )
}

fn list_page(numbers: &[&str]) -> String {
    let buttons: String = numbers
        .iter()
        .map(|n| format!(r#"<a class="numbutton" href="/n/{0}">{0}</a>"#, n))
        .collect();
    format!("<html><body>{}</body></html>", buttons)
}

async fn serve_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_value_first_poll() {
    let server = MockServer::start().await;
    serve_page(&server, "/latest", single_page("123")).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&format!("{}/latest", server.uri()), None, "");
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    let outcome = monitor.check_source("site_1").await.unwrap();
    assert!(matches!(outcome, CheckOutcome::Changed(_)));

    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.last_value.as_deref(), Some("123"));
    assert_eq!(source.previous_last_value.as_deref(), Some("123"));
    assert!(source.is_initial_run);

    let handle = monitor.registry().get("site_1").unwrap();
    assert_eq!(lock_monitor(&handle).phase(), Phase::InitialRun);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].is_initial_run);
    assert_eq!(sent[0].entries, vec!["123"]);
    assert_eq!(sent[0].kind, SourceKind::Single);
}

#[tokio::test]
async fn test_single_value_changed() {
    let server = MockServer::start().await;
    serve_page(&server, "/latest", single_page("456")).await;

    let mut store = MemoryStore::new();
    store.save(&snapshot("123", &[])).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&format!("{}/latest", server.uri()), Some("single"), "");
    let monitor = Monitor::new(&config, Box::new(store), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.previous_last_value.as_deref(), Some("123"));
    assert_eq!(source.last_value.as_deref(), Some("456"));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(!sent[0].is_initial_run);
    assert_eq!(sent[0].entries, vec!["456"]);

    // Same value again: nothing happens
    assert_eq!(
        monitor.check_source("site_1").await.unwrap(),
        CheckOutcome::Unchanged
    );
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_multiple_new_entries_prepended() {
    let server = MockServer::start().await;
    serve_page(&server, "/list", list_page(&["X", "Y", "A", "B", "C"])).await;

    let mut store = MemoryStore::new();
    store.save(&snapshot("A", &["A", "B", "C"])).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&format!("{}/list", server.uri()), Some("multiple"), "");
    let monitor = Monitor::new(&config, Box::new(store), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.previous_last_value.as_deref(), Some("A"));
    assert_eq!(source.last_value.as_deref(), Some("X"));
    assert_eq!(source.latest_values, vec!["X", "Y", "A", "B", "C"]);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].entries, vec!["X", "Y"]);
    assert_eq!(sent[0].kind, SourceKind::Multiple);
}

#[tokio::test]
async fn test_multiple_anchor_missing_treats_all_as_new() {
    let server = MockServer::start().await;
    serve_page(&server, "/list", list_page(&["Q", "R", "S"])).await;

    let mut store = MemoryStore::new();
    store.save(&snapshot("A", &["A", "B"])).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&format!("{}/list", server.uri()), Some("multiple"), "");
    let monitor = Monitor::new(&config, Box::new(store), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    assert_eq!(notifier.sent()[0].entries, vec!["Q", "R", "S"]);
}

#[tokio::test]
async fn test_multiple_anchor_missing_none_new_policy() {
    let server = MockServer::start().await;
    serve_page(&server, "/list", list_page(&["Q", "R", "S"])).await;

    let mut store = MemoryStore::new();
    store.save(&snapshot("A", &["A", "B"])).unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(
        &format!("{}/list", server.uri()),
        Some("multiple"),
        "[selection]\nanchor-missing = \"none-new\"",
    );
    let monitor = Monitor::new(&config, Box::new(store), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    assert!(notifier.sent().is_empty());
    assert_eq!(monitor.source("site_1").unwrap().last_value.as_deref(), Some("Q"));
}

#[tokio::test]
async fn test_cached_selector_evicted_after_repeated_failures() {
    let server = MockServer::start().await;
    serve_page(&server, "/list", list_page(&["1", "2"])).await;

    let url = format!("{}/list", server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&url, None, "");
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();
    let cached = Strategy::Html {
        selector: ".numbutton".to_string(),
        kind: SourceKind::Multiple,
    };
    assert_eq!(monitor.parser().cached_strategy(&url), Some(cached.clone()));

    // Layout change: nothing matches any more and there is no JSON endpoint
    server.reset().await;
    serve_page(&server, "/list", "<html><body>maintenance</body></html>".to_string()).await;

    for _ in 0..2 {
        assert_eq!(
            monitor.check_source("site_1").await.unwrap(),
            CheckOutcome::Skipped
        );
        assert_eq!(monitor.parser().cached_strategy(&url), Some(cached.clone()));
    }
    monitor.check_source("site_1").await.unwrap();

    // Fourth lookup: no cached strategy, the full cascade runs again
    assert_eq!(monitor.parser().cached_strategy(&url), None);

    server.reset().await;
    serve_page(
        &server,
        "/list",
        r#"<ul class="number-list"><li><a>9</a></li><li><a>1</a></li></ul>"#.to_string(),
    )
    .await;
    monitor.check_source("site_1").await.unwrap();
    assert_eq!(
        monitor.parser().cached_strategy(&url),
        Some(Strategy::Html {
            selector: ".number-list li a".to_string(),
            kind: SourceKind::Multiple,
        })
    );

    // State survived the outage untouched until the page came back
    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.previous_last_value.as_deref(), Some("1"));
    assert_eq!(source.last_value.as_deref(), Some("9"));
    assert_eq!(notifier.sent().last().unwrap().entries, vec!["9"]);
}

#[tokio::test]
async fn test_inferred_kind_is_kept_across_polls() {
    let server = MockServer::start().await;
    serve_page(&server, "/list", list_page(&["A", "B", "C"])).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&format!("{}/list", server.uri()), None, "");
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();
    assert_eq!(
        monitor.source("site_1").unwrap().effective_kind(),
        Some(SourceKind::Multiple)
    );

    // The list shrinks to a single entry
    server.reset().await;
    serve_page(&server, "/list", list_page(&["X"])).await;
    monitor.check_source("site_1").await.unwrap();

    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.effective_kind(), Some(SourceKind::Multiple));
    assert_eq!(source.latest_values, vec!["X"]);
    assert_eq!(source.previous_last_value.as_deref(), Some("A"));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].kind, SourceKind::Multiple);
    assert_eq!(sent[1].entries, vec!["X"]);
}

#[tokio::test]
async fn test_fetch_gives_up_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&FetchConfig {
        timeout: 100,
        max_attempts: 3,
        retry_delay: 10,
        ..FetchConfig::default()
    })
    .unwrap();

    let body = fetcher.fetch(&format!("{}/slow", server.uri())).await;
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_json_endpoint_fallback() {
    let server = MockServer::start().await;
    serve_page(&server, "/country/uk", "<html><body>loading...</body></html>".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/api/numbers"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"numbers": [
                {"number": "+44 7700 900002"},
                {"number": "+44 7700 900001", "is_archive": true},
                {"number": "+44 7700 900000"}
            ]}"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/country/uk", server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(&url, None, "");
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.latest_values, vec!["447700900002", "447700900000"]);
    assert_eq!(source.flag_url.as_deref(), Some("https://flags.test/gb.png"));
    assert_eq!(monitor.parser().cached_strategy(&url), Some(Strategy::JsonApi));
}

#[tokio::test]
async fn test_keyed_api_fallback() {
    let server = MockServer::start().await;
    serve_page(&server, "/", "<html><body>empty</body></html>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/v1/getFreeList"))
        .and(query_param("country", "49"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"numbers": {"4915112345678": {"is_archive": false}}}"#,
        ))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/getFreeList"))
        .and(query_param("apikey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"countries": [{"country": 49, "country_text": "Germany"}]}"#,
        ))
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(
        &url,
        None,
        &format!("[api]\nbase-url = \"{}/v1\"\nkey = \"secret\"", server.uri()),
    );
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    let sent = notifier.sent();
    assert_eq!(sent[0].entries, vec!["4915112345678"]);
    assert_eq!(sent[0].flag_url.as_deref(), Some("https://flags.test/de.png"));
    assert_eq!(monitor.parser().cached_strategy(&url), Some(Strategy::KeyedApi));
}

async fn mount_keyed_api(server: &MockServer, numbers: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/getFreeList"))
        .and(query_param("country", "44"))
        .respond_with(ResponseTemplate::new(200).set_body_string(numbers.to_string()))
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/getFreeList"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"countries": [{"country": 44}]}"#),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_keyed_api_keeps_listing_order() {
    let server = MockServer::start().await;
    serve_page(&server, "/", "<html><body>empty</body></html>".to_string()).await;
    mount_keyed_api(
        &server,
        r#"{"numbers": {
            "447700900009": {"is_archive": false},
            "447700900001": {"is_archive": false}
        }}"#,
    )
    .await;

    let url = format!("{}/", server.uri());
    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(
        &url,
        None,
        &format!("[api]\nbase-url = \"{}/v1\"\nkey = \"secret\"", server.uri()),
    );
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();
    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.last_value.as_deref(), Some("447700900009"));
    assert_eq!(source.latest_values, vec!["447700900009", "447700900001"]);

    // A newer number listed first, though it sorts between the others
    server.reset().await;
    serve_page(&server, "/", "<html><body>empty</body></html>".to_string()).await;
    mount_keyed_api(
        &server,
        r#"{"numbers": {
            "447700900005": {"is_archive": false},
            "447700900009": {"is_archive": false},
            "447700900001": {"is_archive": false}
        }}"#,
    )
    .await;

    monitor.check_source("site_1").await.unwrap();

    let source = monitor.source("site_1").unwrap();
    assert_eq!(source.previous_last_value.as_deref(), Some("447700900009"));
    assert_eq!(source.last_value.as_deref(), Some("447700900005"));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].entries, vec!["447700900005"]);
}

#[tokio::test]
async fn test_failed_flag_probe_falls_back_to_page_image() {
    let server = MockServer::start().await;
    serve_page(
        &server,
        "/latest",
        r#"<html><body>
            <div class="latest-added__title"><a>+49 151 1234</a></div>
            <img alt="Germany country flag" src="/img/de.svg">
            </body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/flags/de.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let mut config = create_test_config(&format!("{}/latest", server.uri()), None, "");
    config.flags.template = format!("{}/flags/{{iso}}.png", server.uri());
    config.flags.probe = true;
    config.flags.probe_timeout = 500;
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();

    let expected = format!("{}/img/de.svg", server.uri());
    assert_eq!(notifier.sent()[0].flag_url.as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_countdown_runs_after_notification() {
    let server = MockServer::start().await;
    serve_page(&server, "/latest", single_page("123")).await;

    let notifier = Arc::new(RecordingNotifier::default());
    let config = create_test_config(
        &format!("{}/latest", server.uri()),
        None,
        "[repeat]\nenabled = true\ninterval = 1\ntick = 100",
    );
    let monitor = Monitor::new(&config, Box::new(MemoryStore::new()), notifier.clone()).unwrap();

    monitor.check_source("site_1").await.unwrap();
    assert!(monitor.countdown().is_active("site_1"));

    let exit = monitor.countdown().join("site_1").await;
    assert_eq!(exit, Some(CountdownExit::Expired));

    let edits = notifier.edits.lock().unwrap();
    assert!(edits.len() >= 5);
    assert!(edits[0].contains("New number added: 123"));
    assert!(edits.last().unwrap().ends_with("00 sec"));
}

#[tokio::test]
async fn test_state_persists_across_restarts() {
    let server = MockServer::start().await;
    serve_page(&server, "/list", list_page(&["3", "2", "1"])).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("numwatch.db");
    let config = create_test_config(&format!("{}/list", server.uri()), None, "");

    {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = SqliteStore::new(&db_path).unwrap();
        let monitor = Monitor::new(&config, Box::new(store), notifier.clone()).unwrap();
        monitor.run_cycle().await;
        assert_eq!(notifier.sent().len(), 1);
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let store = SqliteStore::new(&db_path).unwrap();
    let monitor = Monitor::new(&config, Box::new(store), notifier.clone()).unwrap();

    let handle = monitor.registry().get("site_1").unwrap();
    assert_eq!(lock_monitor(&handle).phase(), Phase::Steady);
    assert!(!monitor.source("site_1").unwrap().is_initial_run);

    let report = monitor.run_cycle().await;
    assert_eq!(report.checked, 1);
    assert_eq!(report.changed, 0);
    assert!(notifier.sent().is_empty());
}
