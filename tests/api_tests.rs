// tests/api_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use zeelink::{
    config::Config,
    error::AppError,
    routes,
    services::markers::AvatarSource,
    state::AppState,
    storage::{KvStore, MemoryStore},
};

const ADMIN_EMAIL: &str = "admin@zeelink.test";
const ADMIN_PASSWORD: &str = "admin-pass";

/// Avatars are never reachable in tests; markers use the fallback badge.
struct NoAvatars;

#[async_trait]
impl AvatarSource for NoAvatars {
    async fn fetch(&self, photo_ref: &str) -> Result<Vec<u8>, AppError> {
        Err(AppError::NotFound(format!("offline: {}", photo_ref)))
    }
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    let config = Config {
        rust_log: "error".to_string(),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        public_origin: "https://zee.link".to_string(),
        ..Config::default()
    };

    let kv: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let state = AppState::build(config, kv, Arc::new(NoAvatars))
        .await
        .expect("Failed to build app state");

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn register(client: &reqwest::Client, address: &str, email: &str) -> Value {
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "email": email, "password": "pw", "name": "" }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

async fn login_admin(client: &reqwest::Client, address: &str) {
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Admin login failed");
    assert_eq!(response.status().as_u16(), 200);
}

fn profile_body(username: &str, province: &str) -> Value {
    json!({
        "username": username,
        "displayName": username,
        "photoRef": format!("https://picsum.photos/seed/{}/200", username),
        "bio": "Hi there",
        "province": province,
        "district": "เมือง",
        "subDistrict": "ช้างเผือก",
        "visibleOnMap": true,
        "links": [{ "title": "Blog", "url": "https://example.com/blog" }]
    })
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_signs_in() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let body = register(&client, &address, "alice@x.com").await;
    assert_eq!(body["identity"]["email"], "alice@x.com");
    assert_eq!(body["identity"]["role"], "user");
    assert!(body["popup"].is_null());

    let me: Value = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["identity"]["email"], "alice@x.com");
}

#[tokio::test]
async fn login_rejects_non_email() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": "nobody", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let me = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap();
    assert_eq!(me.status().as_u16(), 401);
}

#[tokio::test]
async fn dashboard_requires_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .put(format!("{}/api/dashboard/profile", address))
        .json(&profile_body("alice", "เชียงใหม่"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn save_profile_and_open_public_page() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "alice@x.com").await;

    let response = client
        .put(format!("{}/api/dashboard/profile", address))
        .json(&profile_body("alice", "เชียงใหม่"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let saved: Value = response.json().await.unwrap();
    assert_eq!(saved["uid"], "0220262");
    assert_eq!(saved["region"], "ภาคเหนือ");
    assert!(saved["postalCode"].as_str().unwrap().starts_with("50"));
    assert_eq!(saved["shareLink"], "https://zee.link/#/alice");

    let public: Value = client
        .get(format!("{}/api/public/alice", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["id"], saved["id"]);
    assert_eq!(public["links"][0]["title"], "Blog");

    let id = saved["id"].as_str().unwrap();
    let link_id = saved["links"][0]["id"].as_str().unwrap();
    let clicks: Value = client
        .post(format!("{}/api/profiles/{}/links/{}/click", address, id, link_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(clicks["clickCount"], 1);

    let missing = client
        .get(format!("{}/api/public/nobody", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn save_profile_without_photo_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "bob@x.com").await;

    let mut body = profile_body("bob", "เชียงใหม่");
    body["photoRef"] = json!("");
    let response = client
        .put(format!("{}/api/dashboard/profile", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut body = profile_body("bad name!", "เชียงใหม่");
    body["photoRef"] = json!("https://picsum.photos/200");
    let response = client
        .put(format!("{}/api/dashboard/profile", address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn taken_username_conflicts() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "carol@x.com").await;

    let response = client
        .put(format!("{}/api/dashboard/profile", address))
        .json(&profile_body("somchai", "ภูเก็ต"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn like_is_unbounded() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let mut last = Value::Null;
    for _ in 0..3 {
        last = client
            .post(format!("{}/api/profiles/mock1/like", address))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    }
    assert_eq!(last["likeCount"], 28);

    let missing = client
        .post(format!("{}/api/profiles/ghost/like", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn submitting_a_question_requires_session() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/questions/submit", address))
        .json(&json!({ "text": "สวัสดี" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // Reading the board is public.
    let board: Vec<Value> = client
        .get(format!("{}/api/questions", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 2);
}

#[tokio::test]
async fn question_moderation_and_voting() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "dan@x.com").await;

    let rejected = client
        .post(format!("{}/api/questions/submit", address))
        .json(&json!({ "text": "กูไม่ชอบ" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status().as_u16(), 422);

    let too_long = client
        .post(format!("{}/api/questions/submit", address))
        .json(&json!({ "text": "ก".repeat(301) }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_long.status().as_u16(), 400);

    let created = client
        .post(format!("{}/api/questions/submit", address))
        .json(&json!({ "text": "ชอบมากครับ" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let question: Value = created.json().await.unwrap();
    assert_eq!(question["status"], "approved");
    assert_eq!(question["voteCount"], 0);
    let id = question["id"].as_str().unwrap().to_string();

    // First voter.
    let voted: Value = client
        .post(format!("{}/api/questions/{}/vote", address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(voted["voteCount"], 1);

    // Second voter, then the second voter again.
    register(&client, &address, "eve@x.com").await;
    for _ in 0..2 {
        let voted: Value = client
            .post(format!("{}/api/questions/{}/vote", address, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(voted["voteCount"], 2);
    }

    let board: Vec<Value> = client
        .get(format!("{}/api/questions?limit=5", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 3);
    assert!(board.iter().all(|q| q["status"] == "approved"));
    assert!(board.iter().all(|q| q["text"] != "กูไม่ชอบ"));

    let missing = client
        .post(format!("{}/api/questions/nope/vote", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(format!("{}/api/admin/users", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    register(&client, &address, "frank@x.com").await;
    let forbidden = client
        .get(format!("{}/api/admin/users", address))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_simulates_and_bans_users() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    login_admin(&client, &address).await;

    let created = client
        .post(format!("{}/api/admin/simulate", address))
        .json(&json!({ "count": 3, "province": "ขอนแก่น" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let created: Vec<Value> = created.json().await.unwrap();
    assert_eq!(created.len(), 3);

    let too_many = client
        .post(format!("{}/api/admin/simulate", address))
        .json(&json!({ "count": 0, "province": "ขอนแก่น" }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status().as_u16(), 400);

    let victim = created[0]["id"].as_str().unwrap();
    let banned = client
        .post(format!("{}/api/admin/users/{}/ban", address, victim))
        .send()
        .await
        .unwrap();
    assert_eq!(banned.status().as_u16(), 200);

    let users: Vec<Value> = client
        .get(format!("{}/api/admin/users", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| u["id"] != victim));

    // Banning someone else leaves the admin signed in.
    let me: Value = client
        .get(format!("{}/api/auth/me", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["identity"]["role"], "admin");
    assert_eq!(me["identity"]["isBanned"], false);

    let deleted = client
        .delete(format!("{}/api/admin/users/{}", address, victim))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_popup_lifecycle_and_active_selection() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    login_admin(&client, &address).await;

    let popup: Value = client
        .post(format!("{}/api/admin/popups", address))
        .json(&json!({ "title": "Hello", "imageUrl": "", "linkUrl": "https://zee.link/promo" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(popup["isActive"], true);
    let id = popup["id"].as_str().unwrap();

    let active: Value = client
        .get(format!("{}/api/popups/active", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active["id"], popup["id"]);

    let toggled: Value = client
        .put(format!("{}/api/admin/popups/{}/toggle", address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggled["isActive"], false);

    let active: Value = client
        .get(format!("{}/api/popups/active", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(active.is_null());

    let deleted = client
        .delete(format!("{}/api/admin/popups/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);
}

#[tokio::test]
async fn admin_downloads_backup() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    login_admin(&client, &address).await;

    let response = client
        .get(format!("{}/api/admin/backup", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"zeelink-backup-"));

    let backup: Value = response.json().await.unwrap();
    assert_eq!(backup["profiles"].as_array().unwrap().len(), 1);
    assert_eq!(backup["questions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn markers_follow_the_directory() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let report: Value = client
        .post(format!("{}/api/explore/markers/refresh", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["added"], json!(["mock1"]));

    let markers: Vec<Value> = client
        .get(format!("{}/api/explore/markers", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(markers.len(), 1);
    assert!(markers[0]["icon"].as_str().unwrap().starts_with("data:image/png;base64,"));

    let regions: Vec<Value> = client
        .get(format!("{}/api/regions", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(regions.len(), 4);
}

#[tokio::test]
async fn photo_upload_returns_data_url() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "gus@x.com").await;

    let mut png = std::io::Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]))
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();

    let response = client
        .post(format!("{}/api/dashboard/photo", address))
        .body(png.into_inner())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["photoRef"].as_str().unwrap().starts_with("data:image/png;base64,"));

    let junk = client
        .post(format!("{}/api/dashboard/photo", address))
        .body("not an image")
        .send()
        .await
        .unwrap();
    assert_eq!(junk.status().as_u16(), 400);
}

#[tokio::test]
async fn theme_preference_persists() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let initial: Value = client
        .get(format!("{}/api/preferences/theme", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(initial["theme"], "light");

    client
        .put(format!("{}/api/preferences/theme", address))
        .json(&json!({ "theme": "dark" }))
        .send()
        .await
        .unwrap();

    let updated: Value = client
        .get(format!("{}/api/preferences/theme", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["theme"], "dark");
}

#[tokio::test]
async fn ranked_board_defaults_to_top_five() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "hal@x.com").await;

    for i in 0..6 {
        let response = client
            .post(format!("{}/api/questions/submit", address))
            .json(&json!({ "text": format!("คำถามที่ {}", i) }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    let board: Vec<Value> = client
        .get(format!("{}/api/questions", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board.len(), 5);

    let everything: Vec<Value> = client
        .get(format!("{}/api/questions?limit=20", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(everything.len(), 8);
}

#[tokio::test]
async fn photo_routes_lift_the_body_cap() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    register(&client, &address, "ian@x.com").await;

    // Over the photo cap but under the route's body limit: the handler answers.
    let response = client
        .post(format!("{}/api/dashboard/photo", address))
        .body(vec![0u8; 5 * 1024 * 1024 + 1])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 413);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    // The dashboard save accepts an inline photo larger than the global cap.
    let mut profile = profile_body("ian", "เชียงใหม่");
    profile["photoRef"] = json!(format!("data:image/png;base64,{}", "A".repeat(3 * 1024 * 1024)));
    let response = client
        .put(format!("{}/api/dashboard/profile", address))
        .json(&profile)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}
