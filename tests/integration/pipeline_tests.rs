//! Integration tests for the catalog-to-topic pipeline
//!
//! These tests use wiremock for both the catalog server and the Pub/Sub REST
//! API (addressed the way an emulator is), and run the full pipeline
//! end-to-end.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jwks_catalog_crawler::bus::PubSubBus;
use jwks_catalog_crawler::catalog::{build_http_client, load_catalog};
use jwks_catalog_crawler::config::{CatalogConfig, Config, HttpConfig, PubSubConfig, RunConfig};
use jwks_catalog_crawler::pipeline::{exit_status, run, EXIT_FAILURE, EXIT_SUCCESS};
use jwks_catalog_crawler::publisher::{AbortSignal, Outcome};
use jwks_catalog_crawler::{BusError, CatalogError, CrawlerError, FetchFailure, TargetError};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOPIC_PATH: &str = "/v1/projects/test-project/topics/crawl-requests";
const PUBLISH_PATH: &str = "/v1/projects/test-project/topics/crawl-requests:publish";

const TWO_SERVICE_CATALOG: &str = r#"
services:
  - openid-configuration: https://a/oidc
    jwks_uri: https://a/jwks
  - id: b
"#;

/// Creates a test configuration pointing at the given catalog and emulator
fn create_test_config(catalog_url: &str, emulator: &MockServer) -> Config {
    Config {
        catalog: CatalogConfig {
            url: catalog_url.to_string(),
        },
        pubsub: PubSubConfig {
            project_id: "test-project".to_string(),
            topic: "crawl-requests".to_string(),
            emulator_host: Some(emulator.uri().trim_start_matches("http://").to_string()),
            ..PubSubConfig::default()
        },
        http: HttpConfig {
            user_agent: "TestCrawler/1.0".to_string(),
            timeout_secs: 5,
        },
        run: RunConfig::default(),
    }
}

/// The publish request body the emulator should see for `url`
fn publish_body(url: &str) -> serde_json::Value {
    let payload = serde_json::to_vec(&json!({ "url": url })).unwrap();
    json!({ "messages": [{ "data": STANDARD.encode(payload) }] })
}

async fn mount_catalog(server: &MockServer, yaml: &str) -> String {
    Mock::given(method("GET"))
        .and(path("/catalog.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(yaml))
        .mount(server)
        .await;
    format!("{}/catalog.yaml", server.uri())
}

async fn mount_topic(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(TOPIC_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "projects/test-project/topics/crawl-requests" })),
        )
        .mount(server)
        .await;
}

async fn mount_publish_ok(server: &MockServer, url: &str, message_id: &str) {
    Mock::given(method("POST"))
        .and(path(PUBLISH_PATH))
        .and(body_json(publish_body(url)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "messageIds": [message_id] })),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_targets_published_in_catalog_order() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    let catalog_url = mount_catalog(&catalog_server, TWO_SERVICE_CATALOG).await;
    mount_topic(&pubsub).await;
    mount_publish_ok(&pubsub, "https://a/oidc", "101").await;
    mount_publish_ok(&pubsub, "https://a/jwks", "102").await;

    let config = create_test_config(&catalog_url, &pubsub);
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let result = run(&config, &client, &bus, &AbortSignal::never()).await;
    assert_eq!(exit_status(&result), EXIT_SUCCESS);

    let summary = result.unwrap();
    assert_eq!(summary.services, 2);
    assert_eq!(summary.report.attempted(), 2);
    assert_eq!(summary.report.succeeded(), 2);

    let published: Vec<(String, String)> = summary
        .report
        .published()
        .map(|(target, id)| (target.to_string(), id.to_string()))
        .collect();
    assert_eq!(
        published,
        vec![
            ("https://a/oidc".to_string(), "101".to_string()),
            ("https://a/jwks".to_string(), "102".to_string()),
        ]
    );

    // Publishes were submitted in catalog order
    let posts: Vec<serde_json::Value> = pubsub
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == PUBLISH_PATH)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(posts, vec![publish_body("https://a/oidc"), publish_body("https://a/jwks")]);
}

#[tokio::test]
async fn test_catalog_503_aborts_before_publishing() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog.yaml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&catalog_server)
        .await;

    // Neither topic resolution nor publishing may happen
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pubsub)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pubsub)
        .await;

    let config = create_test_config(&format!("{}/catalog.yaml", catalog_server.uri()), &pubsub);
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let result = run(&config, &client, &bus, &AbortSignal::never()).await;
    assert_eq!(exit_status(&result), EXIT_FAILURE);

    match result {
        Err(CrawlerError::Catalog(err)) => {
            assert!(matches!(
                err,
                CatalogError::Fetch {
                    source: FetchFailure::Status(503),
                    ..
                }
            ));
            assert_eq!(err.status(), Some(503));
        }
        other => panic!("expected catalog fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_one_failed_publish_still_exits_zero() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    let catalog_url = mount_catalog(&catalog_server, TWO_SERVICE_CATALOG).await;
    mount_topic(&pubsub).await;
    Mock::given(method("POST"))
        .and(path(PUBLISH_PATH))
        .and(body_json(publish_body("https://a/oidc")))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
        .expect(1)
        .mount(&pubsub)
        .await;
    mount_publish_ok(&pubsub, "https://a/jwks", "202").await;

    let config = create_test_config(&catalog_url, &pubsub);
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let result = run(&config, &client, &bus, &AbortSignal::never()).await;
    assert_eq!(exit_status(&result), EXIT_SUCCESS);

    let report = result.unwrap().report;
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let (target, error) = report.failures().next().unwrap();
    assert_eq!(target.as_str(), "https://a/oidc");
    assert!(matches!(
        error,
        TargetError::Publish(BusError::Status { status: 500, .. })
    ));
    assert!(matches!(
        &report.outcomes[1].outcome,
        Outcome::Published { message_id } if message_id == "202"
    ));
}

#[tokio::test]
async fn test_strict_policy_fails_partial_batch() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    let catalog_url = mount_catalog(&catalog_server, TWO_SERVICE_CATALOG).await;
    mount_topic(&pubsub).await;
    Mock::given(method("POST"))
        .and(path(PUBLISH_PATH))
        .and(body_json(publish_body("https://a/oidc")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&pubsub)
        .await;
    mount_publish_ok(&pubsub, "https://a/jwks", "302").await;

    let mut config = create_test_config(&catalog_url, &pubsub);
    config.run.strict = true;
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let result = run(&config, &client, &bus, &AbortSignal::never()).await;
    assert!(matches!(
        result,
        Err(CrawlerError::PartialPublish {
            failed: 1,
            attempted: 2
        })
    ));
    assert_eq!(exit_status(&result), EXIT_FAILURE);
}

#[tokio::test]
async fn test_missing_topic_is_fatal() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    let catalog_url = mount_catalog(&catalog_server, TWO_SERVICE_CATALOG).await;
    Mock::given(method("GET"))
        .and(path(TOPIC_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&pubsub)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pubsub)
        .await;

    let config = create_test_config(&catalog_url, &pubsub);
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let result = run(&config, &client, &bus, &AbortSignal::never()).await;
    assert!(matches!(
        result,
        Err(CrawlerError::BusConnect {
            source: BusError::TopicNotFound(_),
            ..
        })
    ));
    assert_eq!(exit_status(&result), EXIT_FAILURE);
}

#[tokio::test]
async fn test_empty_catalog_publishes_nothing() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    let catalog_url = mount_catalog(&catalog_server, "services: []\n").await;
    mount_topic(&pubsub).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pubsub)
        .await;

    let config = create_test_config(&catalog_url, &pubsub);
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let summary = run(&config, &client, &bus, &AbortSignal::never())
        .await
        .unwrap();
    assert_eq!(summary.services, 0);
    assert_eq!(summary.report.total(), 0);
    assert_eq!(summary.report.failed(), 0);
}

#[tokio::test]
async fn test_static_token_sent_to_pubsub() {
    let catalog_server = MockServer::start().await;
    let pubsub = MockServer::start().await;

    let catalog_url =
        mount_catalog(&catalog_server, "services:\n  - jwks_uri: https://c/jwks\n").await;
    Mock::given(method("GET"))
        .and(path(TOPIC_PATH))
        .and(wiremock::matchers::header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&pubsub)
        .await;
    Mock::given(method("POST"))
        .and(path(PUBLISH_PATH))
        .and(wiremock::matchers::header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messageIds": ["9"] })))
        .expect(1)
        .mount(&pubsub)
        .await;

    let mut config = create_test_config(&catalog_url, &pubsub);
    config.pubsub.emulator_host = None;
    config.pubsub.endpoint = Some(pubsub.uri());
    config.pubsub.access_token = Some("secret-token".to_string());

    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let summary = run(&config, &client, &bus, &AbortSignal::never())
        .await
        .unwrap();
    assert_eq!(summary.report.succeeded(), 1);
}

#[tokio::test]
async fn test_load_catalog_decode_error() {
    let server = MockServer::start().await;
    let url = mount_catalog(&server, "services: not-a-list\n").await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let result = load_catalog(&client, &url).await;

    assert!(matches!(result, Err(CatalogError::Decode { .. })));
}

#[tokio::test]
async fn test_load_catalog_connection_refused() {
    // Nothing listens on port 1
    let url = "http://127.0.0.1:1/catalog.yaml";

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let result = load_catalog(&client, url).await;

    match result {
        Err(err @ CatalogError::Fetch {
            source: FetchFailure::Transport(_),
            ..
        }) => assert_eq!(err.status(), None),
        other => panic!("expected transport fetch error, got {:?}", other),
    }
}

/// Serves a catalog whose body is cut short of its declared length
///
/// Every connection gets a 200 with `Content-Length: 500` and a much shorter
/// body, then the socket is closed.
async fn spawn_truncated_catalog_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 500\r\n\r\nservices: []\n")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/catalog.yaml", addr)
}

#[tokio::test]
async fn test_load_catalog_truncated_body_is_read_error() {
    let url = spawn_truncated_catalog_server().await;

    let client = build_http_client(&HttpConfig::default()).unwrap();
    let result = load_catalog(&client, &url).await;

    match result {
        Err(err @ CatalogError::Read { .. }) => assert_eq!(err.status(), None),
        other => panic!("expected catalog read error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_truncated_catalog_aborts_before_publishing() {
    let catalog_url = spawn_truncated_catalog_server().await;
    let pubsub = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pubsub)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pubsub)
        .await;

    let config = create_test_config(&catalog_url, &pubsub);
    let client = build_http_client(&config.http).unwrap();
    let bus = PubSubBus::from_config(client.clone(), &config.pubsub);

    let result = run(&config, &client, &bus, &AbortSignal::never()).await;
    assert_eq!(exit_status(&result), EXIT_FAILURE);
    assert!(matches!(
        result,
        Err(CrawlerError::Catalog(CatalogError::Read { .. }))
    ));
    assert!(pubsub.received_requests().await.unwrap().is_empty());
}
