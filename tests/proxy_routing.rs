//! End-to-end routing tests: dev server in front of two mock upstreams.

use std::fs;

use axum::http::StatusCode;
use dev_proxy::DevServerConfig;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_golang_prefix_forwarded_and_stripped() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let res = common::client()
        .get(format!("http://{}/api/golang/users/42", proxy_addr))
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-upstream"], "golang");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["uri"], "/users/42");

    let requests = golang.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].uri, "/users/42");
    assert_eq!(requests[0].host.as_deref(), Some(golang.authority().as_str()));
    assert_eq!(node.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_node_post_keeps_method_and_body() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let payload = r#"{"user":"ron","password":"hunter2"}"#;
    let res = common::client()
        .post(format!("http://{}/api/node/login", proxy_addr))
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .expect("Proxy unreachable");

    assert_eq!(res.status(), StatusCode::OK);

    let requests = node.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].uri, "/login");
    assert_eq!(requests[0].body, payload);
    assert_eq!(requests[0].host.as_deref(), Some(node.authority().as_str()));
    assert_eq!(requests[0].headers["content-type"], "application/json");
    assert_eq!(golang.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_path_served_statically() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("favicon.ico"), "icon-bytes").unwrap();

    let mut config = common::api_config(&golang, &node);
    config.static_files.root = Some(dir.path().to_path_buf());
    let (proxy_addr, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/favicon.ico", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "icon-bytes");
    assert_eq!(golang.hits(), 0);
    assert_eq!(node.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_paths_never_reach_upstreams() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let client = common::client();
    for path in ["/favicon.ico", "/", "/api", "/api/python/x", "/assets/api/node.js"] {
        let res = client
            .get(format!("http://{}{}", proxy_addr, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path {}", path);
    }

    assert_eq!(golang.hits(), 0);
    assert_eq!(node.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_query_string_preserved() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    common::client()
        .get(format!("http://{}/api/golang/search?q=a%20b&page=2", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(golang.requests()[0].uri, "/search?q=a%20b&page=2");

    shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_request_forwarded_identically() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let client = common::client();
    for _ in 0..3 {
        let res = client
            .get(format!("http://{}/api/node/items/7", proxy_addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let requests = node.requests();
    assert_eq!(requests.len(), 3);
    for recorded in &requests {
        assert_eq!(recorded.method, requests[0].method);
        assert_eq!(recorded.uri, "/items/7");
        assert_eq!(recorded.host, requests[0].host);
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_host_preserved_without_change_origin() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;

    let mut config = common::api_config(&golang, &node);
    config.proxy[0].change_origin = false;
    let (proxy_addr, shutdown) = common::start_proxy(config).await;

    common::client()
        .get(format!("http://{}/api/golang/ping", proxy_addr))
        .send()
        .await
        .unwrap();

    let expected = proxy_addr.to_string();
    assert_eq!(golang.requests()[0].host.as_deref(), Some(expected.as_str()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_prefix_kept_without_strip() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;

    let mut config = common::api_config(&golang, &node);
    config.proxy[1].strip_prefix = false;
    let (proxy_addr, shutdown) = common::start_proxy(config).await;

    common::client()
        .get(format!("http://{}/api/node/login", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(node.requests()[0].uri, "/api/node/login");

    shutdown.trigger();
}

#[tokio::test]
async fn test_redirect_relayed_not_followed() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let res = common::client()
        .get(format!("http://{}/api/node/redirect", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/elsewhere");
    assert_eq!(node.hits(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_forwarded_upstream() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let res = common::client()
        .get(format!("http://{}/api/golang/trace", proxy_addr))
        .send()
        .await
        .unwrap();

    let response_id = res.headers()["x-request-id"].to_str().unwrap().to_string();
    let upstream_id = golang.requests()[0].headers["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(response_id, upstream_id);

    shutdown.trigger();
}

#[tokio::test]
async fn test_regex_rule() {
    let golang = common::start_upstream("golang").await;
    let legacy = common::start_upstream("legacy").await;

    let mut config: DevServerConfig = common::api_config(&golang, &legacy);
    config.proxy[1] = common::api_rule("^/v[0-9]+/", &legacy.origin());
    let (proxy_addr, shutdown) = common::start_proxy(config).await;

    common::client()
        .get(format!("http://{}/v2/orders/5", proxy_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(legacy.requests()[0].uri, "/orders/5");
    assert_eq!(golang.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_target_forwarded_verbatim() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let cases = [
        ("/api/golang/a/../b", "/a/../b"),
        ("/api/golang/a/%2e%2e/c", "/a/%2e%2e/c"),
        ("/api/golang/x?name=o'k", "/x?name=o'k"),
        ("/api/golang/{id}", "/{id}"),
    ];
    for (target, _) in cases {
        let response = common::raw_get(proxy_addr, target).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{}: {}", target, response);
    }

    let received: Vec<String> = golang.requests().into_iter().map(|r| r.uri).collect();
    let expected: Vec<&str> = cases.iter().map(|(_, forwarded)| *forwarded).collect();
    assert_eq!(received, expected);
    assert_eq!(node.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_no_headers_added_upstream() {
    let golang = common::start_upstream("golang").await;
    let node = common::start_upstream("node").await;
    let (proxy_addr, shutdown) = common::start_proxy(common::api_config(&golang, &node)).await;

    let response = common::raw_get(proxy_addr, "/api/node/plain").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);

    let requests = node.requests();
    assert_eq!(requests.len(), 1);
    let mut names: Vec<&str> = requests[0].headers.keys().map(|k| k.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["host", "x-request-id"]);

    shutdown.trigger();
}
