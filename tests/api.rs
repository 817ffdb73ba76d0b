use axum::{routing::post, Json, Router};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use screenshot_catalog::tagging::TagGenerator;
use screenshot_catalog::{bind_listener, build_router, AppState, Config, MemStorage};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-png-body";

struct TestApp {
    base: String,
    client: reqwest::Client,
    uploads: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self.client.get(self.url(path)).send().await.expect("send");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    async fn send_form(
        &self,
        method: reqwest::Method,
        path: &str,
        form: Form,
    ) -> (StatusCode, Value) {
        let resp = self
            .client
            .request(method, self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("send");
        let status = resp.status();
        (status, resp.json().await.unwrap_or(Value::Null))
    }

    fn stored_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.uploads) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn file_for(&self, image_path: &str) -> PathBuf {
        self.uploads
            .join(image_path.strip_prefix("/uploads/").expect("uploaded path"))
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    format!("http://{addr}")
}

async fn spawn_app_with(configure: impl FnOnce(&mut Config), tagger: Option<TagGenerator>) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let uploads = dir.path().join("uploads");
    let mut config = Config {
        uploads_dir: uploads.clone(),
        bcrypt_cost: 4,
        ..Config::default()
    };
    configure(&mut config);
    let tagger = tagger.unwrap_or_else(|| TagGenerator::from_config(&config));
    let state = AppState::with_parts(config, MemStorage::with_samples(), tagger);

    TestApp {
        base: serve(build_router(state)).await,
        client: reqwest::Client::new(),
        uploads,
        _dir: dir,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}, Some(TagGenerator::disabled())).await
}

fn image_part(name: &str, mime: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(mime)
        .expect("mime")
}

fn login_form() -> Form {
    Form::new()
        .text("title", "Bank Login")
        .text("description", "Sign-in with PIN pad")
        .text("app", "Vaultly")
        .text("genre", "Finance")
        .text("screenTask", "Authentication")
        .text("uiElements", "Form,Button")
        .text("tags", "secure, minimal")
}

#[tokio::test]
async fn lists_seeded_samples_in_order() {
    let app = spawn_app().await;
    let (status, body) = app.get_json("/api/screenshots").await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["title"], "Minimalist Dashboard");
    assert_eq!(items[0]["imagePath"], "/placeholder-dashboard.svg");
    assert_eq!(items[0]["screenTask"], "Dashboard");
    assert!(items[0]["uploadedAt"].is_string());
    assert_eq!(items[1]["aiTags"][0], "social-media");
}

#[tokio::test]
async fn get_by_id_reports_missing_records() {
    let app = spawn_app().await;

    let (status, body) = app.get_json("/api/screenshots/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Social Feed");

    for path in ["/api/screenshots/42", "/api/screenshots/not-a-number"] {
        let (status, body) = app.get_json(path).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Screenshot not found");
    }
}

#[tokio::test]
async fn search_requires_a_query() {
    let app = spawn_app().await;

    let (status, body) = app.get_json("/api/screenshots/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query required");

    let (_, body) = app.get_json("/api/screenshots/search?q=DASH").await;
    let hits = body.as_array().expect("array");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["title"], "Minimalist Dashboard");

    let (_, body) = app.get_json("/api/screenshots/search?q=zzz-no-match").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn filter_combines_dimensions() {
    let app = spawn_app().await;

    let (_, body) = app
        .get_json("/api/screenshots/filter?uiElements=Card,Navigation")
        .await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (_, body) = app.get_json("/api/screenshots/filter?tags=minimal").await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (_, body) = app.get_json("/api/screenshots/filter?app=Analytics").await;
    assert_eq!(body, json!([]));

    let (_, body) = app
        .get_json("/api/screenshots/filter?genre=Social&screenTask=Navigation")
        .await;
    assert_eq!(body[0]["title"], "Social Feed");

    let (_, body) = app.get_json("/api/screenshots/filter").await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn create_stores_image_and_ai_tags() {
    let ai = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            Json(json!({ "choices": [{ "message": { "content": "fintech, pin-pad" } }] }))
        }),
    );
    let ai_base = serve(ai).await;
    let app = spawn_app_with(
        |config| {
            config.openai_api_key = Some("k".into());
            config.openai_base_url = format!("{ai_base}/v1");
            config.tagging_timeout = Duration::from_secs(2);
        },
        None,
    )
    .await;

    let form = login_form().part("image", image_part("login.png", "image/png", PNG));
    let (status, created) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 3);
    assert_eq!(created["uiElements"], json!(["Form", "Button"]));
    assert_eq!(created["tags"], json!(["secure", "minimal"]));
    assert_eq!(created["aiTags"], json!(["fintech", "pin-pad"]));

    let image_path = created["imagePath"].as_str().expect("path").to_string();
    assert!(image_path.starts_with("/uploads/") && image_path.ends_with(".png"));
    assert_eq!(std::fs::read(app.file_for(&image_path)).expect("file"), PNG);

    let resp = app.client.get(app.url(&image_path)).send().await.expect("send");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(resp.bytes().await.expect("body").as_ref(), PNG);

    let (status, fetched) = app.get_json("/api/screenshots/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_without_ai_key_still_succeeds() {
    let app = spawn_app_with(|_| {}, None).await;
    let form = login_form().part("image", image_part("a.jpg", "image/jpeg", PNG));
    let (status, created) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["aiTags"], json!([]));
}

#[tokio::test]
async fn abandoned_create_leaves_no_file_behind() {
    let ai = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({ "choices": [{ "message": { "content": "late" } }] }))
        }),
    );
    let ai_base = serve(ai).await;
    let app = spawn_app_with(
        |config| {
            config.openai_api_key = Some("k".into());
            config.openai_base_url = format!("{ai_base}/v1");
            config.tagging_timeout = Duration::from_secs(5);
        },
        None,
    )
    .await;

    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(300))
        .build()
        .expect("client");
    let form = login_form().part("image", image_part("slow.png", "image/png", PNG));
    let result = impatient
        .post(app.url("/api/screenshots"))
        .multipart(form)
        .send()
        .await;
    assert!(result.is_err());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(app.stored_files().is_empty());
    let (_, all) = app.get_json("/api/screenshots").await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn invalid_submissions_leave_no_files_behind() {
    let app = spawn_app_with(|config| config.max_upload_bytes = 8, Some(TagGenerator::disabled())).await;

    let (status, body) = app
        .send_form(reqwest::Method::POST, "/api/screenshots", login_form())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image file uploaded");

    let form = login_form().part("image", image_part("a.svg", "image/svg+xml", b"<svg/>"));
    let (status, _) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let form = login_form().part("image", image_part("big.png", "image/png", PNG));
    let (status, body) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("too large"));

    let form = Form::new()
        .text("app", "Vaultly")
        .part("image", image_part("a.png", "image/png", b"tiny"));
    let (status, body) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid screenshot data");

    assert!(app.stored_files().is_empty());
    let (_, all) = app.get_json("/api/screenshots").await;
    assert_eq!(all.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn update_changes_only_supplied_fields() {
    let app = spawn_app().await;
    let (_, before) = app.get_json("/api/screenshots/1").await;

    let form = Form::new().text("title", "Maximalist Dashboard");
    let (status, updated) = app
        .send_form(reqwest::Method::PATCH, "/api/screenshots/1", form)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Maximalist Dashboard");

    let mut expected = before.clone();
    expected["title"] = json!("Maximalist Dashboard");
    let (_, after) = app.get_json("/api/screenshots/1").await;
    assert_eq!(after, expected);
    assert_eq!(after["uploadedAt"], before["uploadedAt"]);

    let (status, _) = app
        .send_form(reqwest::Method::PATCH, "/api/screenshots/99", Form::new())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replacing_an_uploaded_image_removes_the_old_file() {
    let app = spawn_app().await;
    let form = login_form().part("image", image_part("first.png", "image/png", PNG));
    let (_, created) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    let first = created["imagePath"].as_str().expect("path").to_string();
    let id = created["id"].as_i64().expect("id");

    let form = Form::new()
        .text("tags", "refreshed")
        .part("image", image_part("second.gif", "image/gif", b"GIF89a"));
    let (status, updated) = app
        .send_form(reqwest::Method::PATCH, &format!("/api/screenshots/{id}"), form)
        .await;
    assert_eq!(status, StatusCode::OK);

    let second = updated["imagePath"].as_str().expect("path").to_string();
    assert_ne!(first, second);
    assert!(second.ends_with(".gif"));
    assert_eq!(updated["tags"], json!(["refreshed"]));
    assert_eq!(updated["uiElements"], json!(["Form", "Button"]));
    assert!(!app.file_for(&first).exists());
    assert!(app.file_for(&second).exists());
}

#[tokio::test]
async fn delete_removes_record_and_file() {
    let app = spawn_app().await;
    let form = login_form().part("image", image_part("gone.png", "image/png", PNG));
    let (_, created) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    let image_path = created["imagePath"].as_str().expect("path").to_string();

    let resp = app
        .client
        .delete(app.url("/api/screenshots/3"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!app.file_for(&image_path).exists());

    let (status, _) = app.get_json("/api/screenshots/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let resp = app
        .client
        .delete(app.url("/api/screenshots/3"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_succeeds_when_file_cleanup_fails() {
    let app = spawn_app().await;
    let form = login_form().part("image", image_part("stuck.png", "image/png", PNG));
    let (_, created) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    let stored = app.file_for(created["imagePath"].as_str().expect("path"));

    // a directory in place of the file makes removal fail with an IO error
    std::fs::remove_file(&stored).expect("remove file");
    std::fs::create_dir(&stored).expect("dir in its place");
    std::fs::write(stored.join("keep"), b"x").expect("child");

    let resp = app
        .client
        .delete(app.url("/api/screenshots/3"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(stored.is_dir());

    let (status, _) = app.get_json("/api/screenshots/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_placeholder_keeps_ids_advancing() {
    let app = spawn_app().await;
    let resp = app
        .client
        .delete(app.url("/api/screenshots/2"))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let form = login_form().part("image", image_part("n.png", "image/png", PNG));
    let (_, created) = app.send_form(reqwest::Method::POST, "/api/screenshots", form).await;
    assert_eq!(created["id"], 3);
}

#[tokio::test]
async fn uploads_outside_the_directory_are_not_served() {
    let app = spawn_app().await;
    for path in ["/uploads/missing.png", "/uploads/..%2Fsecret"] {
        let resp = app.client.get(app.url(path)).send().await.expect("send");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn options_list_dropdown_values() {
    let app = spawn_app().await;
    let (status, body) = app.get_json("/api/options").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genres"][0], "Business");
    assert_eq!(body["screenTasks"].as_array().map(Vec::len), Some(7));
    assert_eq!(body["uiElements"].as_array().map(Vec::len), Some(8));
}

#[tokio::test]
async fn register_and_login() {
    let app = spawn_app().await;
    let credentials = json!({ "username": "ada", "password": "lovelace" });

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&credentials)
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = resp.json().await.expect("json");
    assert_eq!(user, json!({ "id": 1, "username": "ada", "isAdmin": false }));

    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&credentials)
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&credentials)
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({ "username": "ada", "password": "babbage" }))
        .send()
        .await
        .expect("send");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let (_, current) = app.get_json("/api/user").await;
    assert_eq!(current["isAdmin"], true);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = spawn_app().await;
    let resp = app
        .client
        .get(app.url("/api/screenshots"))
        .send()
        .await
        .expect("send");
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn bind_falls_back_to_the_next_free_port() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = taken.local_addr().expect("addr").port();
    let config = Config {
        host: "127.0.0.1".into(),
        port,
        port_fallbacks: 20,
        ..Config::default()
    };

    let listener = bind_listener(&config).await.expect("fallback bind");
    let bound = listener.local_addr().expect("addr").port();
    assert_ne!(bound, port);
    assert!(bound > port);
}
