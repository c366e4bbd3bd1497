#![allow(clippy::unwrap_used)]
// Integration tests for `DashboardClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vncwall_api::{DashboardClient, Error, ListAction, ListMutation};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DashboardClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = DashboardClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Server inventory ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_servers_default_omits_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .and(query_param_is_missing("include_excluded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ip": "10.0.0.1", "username": "alice", "websockify_port": 6080 },
            { "ip": "10.0.0.2", "username": "bob", "excluded": false, "websockify_port": 6081 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let servers = client.list_servers(false).await.unwrap();
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].username, "alice");
    assert!(!servers[0].excluded);
    assert_eq!(servers[1].websockify_port, 6081);
}

#[tokio::test]
async fn test_list_servers_include_excluded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .and(query_param("include_excluded", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ip": "10.0.0.9", "username": "eve", "excluded": true, "websockify_port": 6090 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let servers = client.list_servers(true).await.unwrap();
    assert_eq!(servers.len(), 1);
    assert!(servers[0].excluded);
}

#[tokio::test]
async fn test_list_servers_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("inventory unavailable"))
        .mount(&server)
        .await;

    let err = client.list_servers(false).await.unwrap_err();
    match err {
        Error::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "inventory unavailable");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_servers_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_servers(false).await;
    assert!(
        matches!(&result, Err(Error::Deserialization { body, .. }) if body.contains("oops")),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Reachability ────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_server_passes_ip_and_port() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers/check"))
        .and(query_param("ip", "10.0.0.1"))
        .and(query_param("websockify_port", "6080"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ip": "10.0.0.1", "reachable": true })),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.check_server("10.0.0.1", 6080).await.unwrap());
}

#[tokio::test]
async fn test_check_server_unreachable() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reachable": false })))
        .mount(&server)
        .await;

    assert!(!client.check_server("10.0.0.3", 6083).await.unwrap());
}

#[tokio::test]
async fn test_check_server_error_status_is_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/servers/check"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client.check_server("10.0.0.1", 6080).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
}

#[tokio::test]
async fn test_connection_refused_is_connection_error() {
    // Nothing listens on port 9 of the loopback interface in test sandboxes.
    let client = DashboardClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
    );
    let err = client.check_server("10.0.0.1", 6080).await.unwrap_err();
    assert!(err.is_connection(), "expected connection error, got: {err:?}");
}

// ── Exclusion ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_exclude_server_posts_ip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/servers/exclude"))
        .and(body_json(json!({ "ip": "10.0.0.4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client.exclude_server("10.0.0.4").await.unwrap();
}

#[tokio::test]
async fn test_include_server_posts_ip() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/servers/include"))
        .and(body_json(json!({ "ip": "10.0.0.4" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.include_server("10.0.0.4").await.unwrap();
}

#[tokio::test]
async fn test_exclude_unknown_server_is_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/servers/exclude"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such server"))
        .mount(&server)
        .await;

    let err = client.exclude_server("10.9.9.9").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

// ── Named lists ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_lists_preserves_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"All Servers":[],"night-shift":["10.0.0.2"],"lab":["10.0.0.1","10.0.0.3"]}"#,
        ))
        .mount(&server)
        .await;

    let lists = client.list_lists().await.unwrap();
    let names: Vec<_> = lists.keys().map(String::as_str).collect();
    assert_eq!(names, ["All Servers", "night-shift", "lab"]);
    assert_eq!(lists["lab"], ["10.0.0.1", "10.0.0.3"]);
}

#[tokio::test]
async fn test_mutate_list_add_servers() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/lists"))
        .and(body_json(json!({
            "action": "add",
            "list_name": "lab",
            "servers": ["10.0.0.1", "10.0.0.2"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let mutation = ListMutation {
        action: ListAction::Add,
        list_name: "lab".into(),
        servers: vec!["10.0.0.1".into(), "10.0.0.2".into()],
    };
    client.mutate_list(&mutation).await.unwrap();
}

#[tokio::test]
async fn test_mutate_list_delete_sends_empty_remove() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/lists"))
        .and(body_json(json!({
            "action": "remove",
            "list_name": "old",
            "servers": []
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.mutate_list(&ListMutation::delete("old")).await.unwrap();
}
