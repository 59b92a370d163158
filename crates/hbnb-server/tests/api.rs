use hbnb_server::config::Settings;
use hbnb_server::{build_app, storage, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn(backend: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let vars = HashMap::from([
            ("HBNB_TYPE_STORAGE".to_string(), backend.to_string()),
            (
                "HBNB_FILE_PATH".to_string(),
                dir.path().join("file.json").to_string_lossy().to_string(),
            ),
            (
                "HBNB_DB_PATH".to_string(),
                dir.path().join("hbnb.db").to_string_lossy().to_string(),
            ),
        ]);
        let settings = Settings::from_vars(vars).expect("settings");
        let storage = storage::open(&settings).await.expect("storage");

        // Same router as prod, bound to an ephemeral port
        let app = build_app(AppState::new(storage));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/v1", addr),
            client: reqwest::Client::new(),
            handle,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    /// POST expecting 201; returns the new object's id.
    async fn create(&self, path: &str, body: Value) -> String {
        let (status, body) = self.post(path, body).await;
        assert_eq!(status, StatusCode::CREATED, "{} -> {}", path, body);
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn ids(body: &Value) -> Vec<String> {
    let mut ids: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn status_and_unknown_routes() {
    let srv = TestServer::spawn("file").await;

    let (status, body) = srv.get("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OK" }));

    let (status, body) = srv.get("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn state_crud_lifecycle() {
    let srv = TestServer::spawn("file").await;

    let id = srv.create("/states", json!({ "name": "Oregon" })).await;

    let (status, created) = srv.get(&format!("/states/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["name"], "Oregon");
    assert_eq!(created["__class__"], "State");

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let (status, body) = srv
        .put(
            &format!("/states/{}", id),
            json!({
                "name": "Oregon!",
                "id": "hijack",
                "created_at": "2000-01-01T00:00:00.000000",
                "updated_at": "2000-01-01T00:00:00.000000"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Oregon!");
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["created_at"], created["created_at"]);

    // Fixed-width timestamps order lexically
    let before = created["updated_at"].as_str().unwrap();
    let after = body["updated_at"].as_str().unwrap();
    assert!(after > before, "{} !> {}", after, before);

    let (status, body) = srv.delete(&format!("/states/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = srv.get(&format!("/states/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_validation_messages() {
    let srv = TestServer::spawn("file").await;

    let res = srv
        .client
        .post(srv.url("/states"))
        .body("plain text")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Not a JSON" }));

    let (status, body) = srv.post("/states", json!({ "nom": "x" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing name");

    let (status, body) = srv.post("/users", json!({ "email": "a@b.c" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing password");

    // Unknown parent wins over a bad body
    let (status, _) = srv.post("/states/missing/cities", json!([])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_never_expose_passwords() {
    let srv = TestServer::spawn("db").await;

    let id = srv
        .create("/users", json!({ "email": "a@b.c", "password": "pw", "first_name": "Ann" }))
        .await;

    let (_, body) = srv.get(&format!("/users/{}", id)).await;
    assert_eq!(body["first_name"], "Ann");
    assert!(body.get("password").is_none());

    let (status, body) = srv
        .put(
            &format!("/users/{}", id),
            json!({ "password": "new", "email": "evil@b.c" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@b.c");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn place_graph_and_search() {
    for backend in ["file", "db"] {
        let srv = TestServer::spawn(backend).await;

        let state = srv.create("/states", json!({ "name": "Florida" })).await;
        let c1 = srv
            .create(&format!("/states/{}/cities", state), json!({ "name": "Miami" }))
            .await;
        let c2 = srv
            .create(&format!("/states/{}/cities", state), json!({ "name": "Tampa" }))
            .await;
        let user = srv
            .create("/users", json!({ "email": "u@h.io", "password": "pw" }))
            .await;
        let a1 = srv.create("/amenities", json!({ "name": "Wifi" })).await;
        let a2 = srv.create("/amenities", json!({ "name": "Pool" })).await;

        let (status, body) = srv
            .post(&format!("/cities/{}/places", c1), json!({ "name": "P1" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing user_id");

        let (status, _) = srv
            .post(
                &format!("/cities/{}/places", c1),
                json!({ "user_id": "ghost", "name": "P1" }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let place = |city: &str, name: &str| {
            (
                format!("/cities/{}/places", city),
                json!({ "user_id": user, "name": name }),
            )
        };
        let (path, body) = place(&c1, "P1");
        let p1 = srv.create(&path, body).await;
        let (path, body) = place(&c1, "P2");
        let p2 = srv.create(&path, body).await;
        let (path, body) = place(&c2, "P3");
        let p3 = srv.create(&path, body).await;

        for (p, a) in [(&p1, &a1), (&p1, &a2), (&p2, &a1)] {
            let (status, _) = srv
                .post(&format!("/places/{}/amenities/{}", p, a), json!({}))
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _) = srv
            .post(&format!("/places/{}/amenities/{}", p1, a1), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = srv.get(&format!("/places/{}/amenities", p1)).await;
        let mut expected = vec![a1.clone(), a2.clone()];
        expected.sort();
        assert_eq!(ids(&body), expected);

        let (status, body) = srv
            .post("/places_search", json!({ "cities": [c1], "amenities": [a1, a2] }))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", backend);
        assert_eq!(ids(&body), vec![p1.clone()]);
        assert!(body[0].get("amenity_ids").is_none());

        let (_, body) = srv.post("/places_search", json!({})).await;
        let mut all = vec![p1.clone(), p2.clone(), p3.clone()];
        all.sort();
        assert_eq!(ids(&body), all);

        let (status, body) = srv.post("/places_search", json!([1, 2])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Not a JSON");

        let (_, stats) = srv.get("/stats").await;
        assert_eq!(
            stats,
            json!({
                "amenities": 2, "cities": 2, "places": 3,
                "reviews": 0, "states": 1, "users": 1
            })
        );
    }
}

#[tokio::test]
async fn reviews_and_cascading_delete() {
    let srv = TestServer::spawn("db").await;

    let state = srv.create("/states", json!({ "name": "Utah" })).await;
    let city = srv
        .create(&format!("/states/{}/cities", state), json!({ "name": "Provo" }))
        .await;
    let user = srv
        .create("/users", json!({ "email": "r@h.io", "password": "pw" }))
        .await;
    let place = srv
        .create(
            &format!("/cities/{}/places", city),
            json!({ "user_id": user, "name": "Hut", "number_rooms": 2 }),
        )
        .await;

    let (status, body) = srv
        .post(&format!("/places/{}/reviews", place), json!({ "user_id": user }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing text");

    let review = srv
        .create(
            &format!("/places/{}/reviews", place),
            json!({ "user_id": user, "text": "Cozy" }),
        )
        .await;
    let (_, body) = srv.get(&format!("/places/{}/reviews", place)).await;
    assert_eq!(ids(&body), vec![review.clone()]);

    let (status, _) = srv.delete(&format!("/states/{}", state)).await;
    assert_eq!(status, StatusCode::OK);

    for path in [
        format!("/cities/{}", city),
        format!("/places/{}", place),
        format!("/reviews/{}", review),
    ] {
        let (status, _) = srv.get(&path).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
    }
    let (status, _) = srv.get(&format!("/users/{}", user)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unlinking_an_unlinked_amenity_is_not_found() {
    let srv = TestServer::spawn("file").await;

    let state = srv.create("/states", json!({ "name": "Iowa" })).await;
    let city = srv
        .create(&format!("/states/{}/cities", state), json!({ "name": "Ames" }))
        .await;
    let user = srv
        .create("/users", json!({ "email": "i@h.io", "password": "pw" }))
        .await;
    let place = srv
        .create(
            &format!("/cities/{}/places", city),
            json!({ "user_id": user, "name": "Barn" }),
        )
        .await;
    let amenity = srv.create("/amenities", json!({ "name": "Hay" })).await;

    let path = format!("/places/{}/amenities/{}", place, amenity);
    let (status, _) = srv.delete(&path).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    srv.post(&path, json!({})).await;
    let (status, body) = srv.delete(&path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (_, body) = srv.get(&format!("/places/{}", place)).await;
    assert_eq!(body["amenity_ids"], json!([]));
}

#[tokio::test]
async fn concurrent_links_to_one_place_all_persist() {
    for backend in ["file", "db"] {
        let srv = TestServer::spawn(backend).await;

        let state = srv.create("/states", json!({ "name": "Maine" })).await;
        let city = srv
            .create(&format!("/states/{}/cities", state), json!({ "name": "Bath" }))
            .await;
        let user = srv
            .create("/users", json!({ "email": "m@h.io", "password": "pw" }))
            .await;
        let place = srv
            .create(
                &format!("/cities/{}/places", city),
                json!({ "user_id": user, "name": "Dock" }),
            )
            .await;

        let mut amenities = Vec::new();
        for name in ["Wifi", "Pool", "Sauna", "Dock", "Grill", "Kayak"] {
            amenities.push(srv.create("/amenities", json!({ "name": name })).await);
        }

        let handles: Vec<_> = amenities
            .iter()
            .map(|amenity| {
                let request = srv
                    .client
                    .post(srv.url(&format!("/places/{}/amenities/{}", place, amenity)))
                    .send();
                tokio::spawn(request)
            })
            .collect();
        for handle in handles {
            let res = handle.await.unwrap().unwrap();
            assert_eq!(res.status(), StatusCode::CREATED, "{}", backend);
        }

        let (_, body) = srv.get(&format!("/places/{}/amenities", place)).await;
        amenities.sort();
        assert_eq!(ids(&body), amenities, "{}", backend);
    }
}
