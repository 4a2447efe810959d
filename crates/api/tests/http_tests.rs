use async_std::task;
use magnet_feed_api::{FeedApi, FeedConfig, FeedError, HttpFeedClient};
use magnet_feed_core::LocationAssignment;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tide::{Request, Response, StatusCode};

#[derive(Debug, Clone, PartialEq)]
struct Seen {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Option<serde_json::Value>,
}

#[derive(Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Recorder {
    fn push<S>(&self, req: &Request<S>, body: Option<serde_json::Value>) {
        self.seen.lock().unwrap().push(Seen {
            method: req.method().to_string(),
            path: req.url().path().to_string(),
            content_type: req.content_type().map(|m| m.essence().to_string()),
            body,
        });
    }

    fn take(&self) -> Vec<Seen> {
        std::mem::take(&mut *self.seen.lock().unwrap())
    }
}

fn sample_files() -> serde_json::Value {
    json!([{
        "id": "f1",
        "name": "ubuntu.iso",
        "magnet": "magnet:?xt=urn:btih:abc",
        "originalUrl": "http://x/ubuntu",
        "lastComment": "",
        "lastSyncAt": "2024-01-01T00:00:00Z",
        "torrentUpdatedAt": "2024-01-02T00:00:00Z",
        "location": "loc1"
    }])
}

async fn list_files(req: Request<Recorder>) -> tide::Result {
    req.state().push(&req, None);
    Ok(Response::builder(StatusCode::Ok)
        .body(sample_files())
        .build())
}

async fn remove_file(req: Request<Recorder>) -> tide::Result {
    req.state().push(&req, None);
    let status = if req.param("id")? == "f1" {
        StatusCode::NoContent
    } else {
        StatusCode::NotFound
    };
    Ok(Response::new(status))
}

async fn refresh(req: Request<Recorder>) -> tide::Result {
    req.state().push(&req, None);
    Ok(Response::new(StatusCode::Ok))
}

async fn list_locations(req: Request<Recorder>) -> tide::Result {
    req.state().push(&req, None);
    Ok(Response::builder(StatusCode::Ok)
        .body(json!([{"id": "loc1", "name": "Downloads"}]))
        .build())
}

async fn assign_location(mut req: Request<Recorder>) -> tide::Result {
    let body: serde_json::Value = req.body_json().await?;
    req.state().push(&req, Some(body.clone()));
    // The service rejects loc2, with a body that still looks like success.
    if body["location"] == "loc2" {
        return Ok(Response::builder(StatusCode::InternalServerError)
            .body(json!({"ok": true}))
            .build());
    }
    Ok(Response::new(StatusCode::Ok))
}

/// Start an in-process feed service and return its base URL.
async fn setup_test_server(port: u16) -> (Recorder, String) {
    let recorder = Recorder::default();
    let mut app = tide::with_state(recorder.clone());
    app.at("/api/files").get(list_files);
    app.at("/api/files/refresh").patch(refresh);
    app.at("/api/files/:id").delete(remove_file);
    app.at("/api/files/:id/refresh").patch(refresh);
    app.at("/api/file-locations").get(list_locations);
    app.at("/api/file-locations").post(assign_location);

    let addr = format!("127.0.0.1:{}", port);
    task::spawn(app.listen(addr.clone()));

    let base_url = format!("http://{}", addr);
    for _ in 0..50 {
        task::sleep(Duration::from_millis(20)).await;
        if surf::get(format!("{}/api/file-locations", base_url))
            .await
            .is_ok()
        {
            recorder.take();
            return (recorder, base_url);
        }
    }

    panic!("Test server failed to start within timeout");
}

fn client(base_url: &str) -> HttpFeedClient {
    let config = FeedConfig::from_base_url(base_url).expect("Invalid test base URL");
    HttpFeedClient::new(&config)
}

#[async_std::test]
async fn test_list_files_and_locations() {
    let (recorder, base_url) = setup_test_server(9311).await;
    let client = client(&base_url);

    let files = client.list_files().await.expect("Failed to list files");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "ubuntu.iso");
    assert_eq!(files[0].location.as_deref(), Some("loc1"));

    let locations = client.list_locations().await.expect("Failed to list locations");
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].name, "Downloads");

    let seen = recorder.take();
    let routes: Vec<_> = seen.iter().map(|s| (s.method.as_str(), s.path.as_str())).collect();
    assert_eq!(
        routes,
        vec![("GET", "/api/files"), ("GET", "/api/file-locations")]
    );
}

#[async_std::test]
async fn test_mutations_hit_expected_routes() {
    let (recorder, base_url) = setup_test_server(9313).await;
    let client = client(&base_url);

    client.remove_file("f1").await.expect("Failed to remove");
    client.refresh_file("f1").await.expect("Failed to refresh one");
    client.refresh_all().await.expect("Failed to refresh all");
    client
        .assign_location(&LocationAssignment::new("f1", "loc1"))
        .await
        .expect("Failed to assign");

    let seen = recorder.take();
    let routes: Vec<_> = seen.iter().map(|s| (s.method.as_str(), s.path.as_str())).collect();
    assert_eq!(
        routes,
        vec![
            ("DELETE", "/api/files/f1"),
            ("PATCH", "/api/files/f1/refresh"),
            ("PATCH", "/api/files/refresh"),
            ("POST", "/api/file-locations"),
        ]
    );

    let post = &seen[3];
    assert_eq!(post.content_type.as_deref(), Some("application/json"));
    assert_eq!(post.body, Some(json!({"fileId": "f1", "location": "loc1"})));
}

#[async_std::test]
async fn test_non_success_status_is_failure() {
    let (_recorder, base_url) = setup_test_server(9315).await;
    let client = client(&base_url);

    let err = client
        .assign_location(&LocationAssignment::new("f1", "loc2"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FeedError::Response {
            method: "POST".to_string(),
            path: "/api/file-locations".to_string(),
            status: 500,
        }
    );

    let err = client.remove_file("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[async_std::test]
async fn test_base_path_prefix_is_kept() {
    let recorder = Recorder::default();
    let mut app = tide::with_state(recorder.clone());
    app.at("/feed/api/files").get(list_files);
    task::spawn(app.listen("127.0.0.1:9317"));
    task::sleep(Duration::from_millis(200)).await;

    let client = client("http://127.0.0.1:9317/feed/");
    assert_eq!(client.base_url().path(), "/feed/");
    let files = client
        .list_files()
        .await
        .expect("Failed to list files under prefix");
    assert_eq!(files.len(), 1);
    assert_eq!(recorder.take()[0].path, "/feed/api/files");
}

#[async_std::test]
async fn test_invalid_json_is_body_error() {
    let mut app = tide::new();
    app.at("/api/files").get(|_| async {
        Ok(Response::builder(StatusCode::Ok)
            .body("<html>maintenance</html>")
            .build())
    });
    task::spawn(app.listen("127.0.0.1:9319"));
    task::sleep(Duration::from_millis(200)).await;

    let err = client("http://127.0.0.1:9319").list_files().await.unwrap_err();
    assert!(matches!(err, FeedError::Body(_)), "got {:?}", err);
}

#[async_std::test]
async fn test_unreachable_host_is_transport_error() {
    let err = client("http://127.0.0.1:1").list_files().await.unwrap_err();
    assert!(matches!(err, FeedError::Transport(_)), "got {:?}", err);
}
