use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use remisage::build_router;
use remisage::config::EnvironmentConfig;
use remisage::services::NotificationDispatcher;
use remisage::state::AppState;
use remisage::store::{
    Document, DocumentQuery, DocumentStore, MemoryDocumentStore, SharedStore, StoreResult,
    Transaction,
};
use tokio::sync::Notify;

#[derive(Clone)]
struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_store(Arc::new(MemoryDocumentStore::new())).await
    }

    async fn with_store(store: SharedStore) -> Self {
        let config = EnvironmentConfig {
            bcrypt_cost: 4,
            vehicle_cache_ttl: 300,
            ..Default::default()
        };
        let (notifier, _handle) = NotificationDispatcher::spawn(store.clone(), 64);
        let state = AppState::new(config, store, notifier);
        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn admin_token(&self) -> String {
        self.state
            .auth
            .bootstrap_admin("admin@remisage.fr", "admin-secret")
            .await
            .unwrap();
        self.login("admin@remisage.fr", "admin-secret").await
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Registra un empleado y devuelve (id, token)
    async fn employee(&self, email: &str) -> (i64, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "firstName": "Jeanne",
                    "lastName": "Martin",
                    "email": email,
                    "password": "employee-secret"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["user"]["role"], "employee");
        (
            body["data"]["user"]["id"].as_i64().unwrap(),
            body["data"]["token"].as_str().unwrap().to_string(),
        )
    }

    async fn make_eligible(&self, admin: &str, user_id: i64) {
        let (status, body) = self
            .request(
                Method::PUT,
                &format!("/api/users/{}/vehicle-assignment", user_id),
                Some(admin),
                Some(json!({ "has_vehicle_assigned": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    async fn create_vehicle(&self, admin: &str, model: &str, plate: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/vehicles",
                Some(admin),
                Some(json!({ "model": model, "licensePlate": plate })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["id"].as_i64().unwrap()
    }
}

/// Almacén en memoria que puede retener un listado de vehículos ya leído
/// hasta que el test lo libere.
#[derive(Default)]
struct GatedStore {
    inner: MemoryDocumentStore,
    armed: AtomicBool,
    read_done: Notify,
    release: Notify,
}

impl GatedStore {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get(id).await
    }

    async fn list(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        let docs = self.inner.list(query).await?;
        if query.doc_type == "vehicle" && self.armed.swap(false, Ordering::SeqCst) {
            self.read_done.notify_one();
            self.release.notified().await;
        }
        Ok(docs)
    }

    async fn commit(&self, transaction: Transaction) -> StoreResult<Vec<Document>> {
        self.inner.commit(transaction).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn count(&self, query: &DocumentQuery) -> StoreResult<usize> {
        self.inner.count(query).await
    }
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_fleet_scenario() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (employee_id, employee) = app.employee("jeanne@remisage.fr").await;
    app.make_eligible(&admin, employee_id).await;

    let vehicle_id = app.create_vehicle(&admin, "Peugeot 205", "AB-123-CD").await;

    let (status, body) = app.request(Method::GET, "/api/vehicles", Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["id"] == json!(vehicle_id))
        .cloned()
        .unwrap();
    assert_eq!(listed["status"], "available");
    assert_eq!(listed["assignedTo"], Value::Null);

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/assign", vehicle_id),
            Some(&admin),
            Some(json!({ "userId": employee_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "assigned");
    assert_eq!(body["data"]["assignedTo"], json!(employee_id));

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/vehicles/{}/location", vehicle_id),
            Some(&employee),
            Some(json!({ "address": "10 Rue de Paris", "latitude": 48.85, "longitude": 2.35 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["address"], "10 Rue de Paris");

    let (status, body) = app
        .request(
            Method::GET,
            &format!("/api/vehicles/vehicle-{}/location-history", vehicle_id),
            Some(&employee),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["address"], "10 Rue de Paris");
    assert_eq!(history[0]["latitude"], 48.85);
    assert_eq!(history[0]["longitude"], 2.35);
    assert_eq!(history[0]["updatedBy"], json!(employee_id));
}

#[tokio::test]
async fn test_duplicate_plate_is_conflict_and_store_untouched() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    app.create_vehicle(&admin, "Peugeot 205", "AB-123-CD").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/vehicles",
            Some(&admin),
            Some(json!({ "model": "Renault Clio", "licensePlate": "ab-123-cd" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["type"], "CONFLICT");

    let vehicles = app
        .state
        .store
        .list(&DocumentQuery::of_type("vehicle").with_drafts())
        .await
        .unwrap();
    assert_eq!(vehicles.len(), 1);
}

#[tokio::test]
async fn test_invalid_path_id_is_bad_request() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    for uri in ["/api/vehicles/abc", "/api/vehicles/user-3", "/api/vehicles/-4"] {
        let (status, body) = app.request(Method::GET, uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"]["type"], "BAD_REQUEST");
        assert!(body["error"]["message"].is_string());
    }

    let (status, _) = app.request(Method::GET, "/api/vehicles/99", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authentication_and_roles() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/api/vehicles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "UNAUTHORIZED");

    let (status, _) = app.request(Method::GET, "/api/vehicles", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, employee) = app.employee("paul@remisage.fr").await;
    let (status, body) = app
        .request(
            Method::POST,
            "/api/vehicles",
            Some(&employee),
            Some(json!({ "model": "Kangoo", "licensePlate": "XY-999-ZZ" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["type"], "FORBIDDEN");

    let (status, _) = app.request(Method::GET, "/api/users", Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_location_update_requires_admin_or_assignee() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, outsider) = app.employee("outsider@remisage.fr").await;
    let vehicle_id = app.create_vehicle(&admin, "Renault Zoe", "EV-001-FR").await;

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/vehicles/{}/location", vehicle_id),
            Some(&outsider),
            Some(json!({ "address": "1 Place Bellecour", "latitude": 45.75, "longitude": 4.83 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/vehicles/{}/location", vehicle_id),
            Some(&admin),
            Some(json!({ "address": "1 Place Bellecour", "latitude": 95.0, "longitude": 4.83 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_assignment_requires_eligible_user() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (employee_id, _) = app.employee("blocked@remisage.fr").await;
    let vehicle_id = app.create_vehicle(&admin, "Citroën C3", "CC-333-CC").await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/assign", vehicle_id),
            Some(&admin),
            Some(json!({ "userId": employee_id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("Jeanne Martin"));

    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/assign", vehicle_id),
            Some(&admin),
            Some(json!({ "userId": 123 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unassign_then_assign_leaves_one_document() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (employee_id, employee) = app.employee("jeanne@remisage.fr").await;
    app.make_eligible(&admin, employee_id).await;
    let vehicle_id = app.create_vehicle(&admin, "Peugeot 208", "PP-208-PP").await;
    let assign_uri = format!("/api/vehicles/{}/assign", vehicle_id);

    for user in [json!(employee_id), Value::Null, json!(employee_id)] {
        let (status, body) = app
            .request(Method::POST, &assign_uri, Some(&admin), Some(json!({ "userId": user })))
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        let assigned = body["data"]["assignedTo"] != Value::Null;
        assert_eq!(body["data"]["status"] == "assigned", assigned);
    }

    let documents = app
        .state
        .store
        .list(&DocumentQuery::of_type("vehicle").with_drafts())
        .await
        .unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, format!("vehicle-{}", vehicle_id));

    // Las notificaciones son asíncronas
    let mut kinds = Vec::new();
    for _ in 0..50 {
        let (_, body) = app.request(Method::GET, "/api/notifications", Some(&employee), None).await;
        kinds = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["type"].as_str().unwrap_or_default().to_string())
            .collect();
        if kinds.len() >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(kinds.iter().filter(|k| *k == "vehicle_assigned").count(), 2);
    assert_eq!(kinds.iter().filter(|k| *k == "vehicle_unassigned").count(), 1);
}

#[tokio::test]
async fn test_vehicle_list_cache_is_invalidated() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let (_, body) = app.request(Method::GET, "/api/vehicles", Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let vehicle_id = app.create_vehicle(&admin, "Dacia Sandero", "DS-111-DS").await;
    let (_, body) = app.request(Method::GET, "/api/vehicles", Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/vehicles/{}", vehicle_id),
            Some(&admin),
            Some(json!({ "status": "maintenance" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .request(Method::GET, "/api/vehicles?status=maintenance", Some(&admin), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/vehicles/{}", vehicle_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.request(Method::GET, "/api/vehicles", Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_read_before_assignment_is_not_cached() {
    let store = Arc::new(GatedStore::default());
    let app = TestApp::with_store(store.clone()).await;
    let admin = app.admin_token().await;
    let (employee_id, _) = app.employee("jeanne@remisage.fr").await;
    app.make_eligible(&admin, employee_id).await;
    let vehicle_id = app.create_vehicle(&admin, "Renault Clio", "CL-100-IO").await;

    // El listado lee el almacén y queda retenido antes de rellenar el cache
    store.arm();
    let reader = app.clone();
    let token = admin.clone();
    let pending = tokio::spawn(async move {
        reader.request(Method::GET, "/api/vehicles", Some(&token), None).await
    });
    store.read_done.notified().await;

    let (status, body) = app
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/assign", vehicle_id),
            Some(&admin),
            Some(json!({ "userId": employee_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    store.release.notify_one();
    let (status, stale) = pending.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stale["data"][0]["status"], "available");

    let (_, body) = app.request(Method::GET, "/api/vehicles", Some(&admin), None).await;
    assert_eq!(body["data"][0]["status"], "assigned");
    assert_eq!(body["data"][0]["assignedTo"], json!(employee_id));
}

#[tokio::test]
async fn test_metadata_update_cannot_set_assigned() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let vehicle_id = app.create_vehicle(&admin, "Fiat 500", "FI-500-AT").await;

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/vehicles/{}", vehicle_id),
            Some(&admin),
            Some(json!({ "status": "assigned" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_messages_and_unread_count() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (employee_id, employee) = app.employee("jeanne@remisage.fr").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/messages",
            Some(&admin),
            Some(json!({ "receiverId": employee_id, "subject": "Révision", "content": "Passage au garage lundi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let message_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = app
        .request(Method::GET, "/api/messages/unread/count", Some(&employee), None)
        .await;
    assert_eq!(body["data"]["count"], 1);

    // Sólo el destinatario marca como leído
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/messages/{}", message_id),
            Some(&admin),
            Some(json!({ "isRead": true })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/messages/message-{}", message_id),
            Some(&employee),
            Some(json!({ "isRead": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .request(Method::GET, "/api/messages/unread/count", Some(&employee), None)
        .await;
    assert_eq!(body["data"]["count"], 0);
}

#[tokio::test]
async fn test_profile_password_change() {
    let app = TestApp::new().await;
    let (_, employee) = app.employee("jeanne@remisage.fr").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/users/profile",
            Some(&employee),
            Some(json!({ "newPassword": "nouveau-secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/users/profile",
            Some(&employee),
            Some(json!({ "currentPassword": "mauvais", "newPassword": "nouveau-secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    // Ninguno de los intentos fallidos cambió la contraseña
    app.login("jeanne@remisage.fr", "employee-secret").await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/api/users/profile",
            Some(&employee),
            Some(json!({ "currentPassword": "employee-secret", "newPassword": "nouveau-secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "jeanne@remisage.fr", "password": "employee-secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    app.login("jeanne@remisage.fr", "nouveau-secret").await;
}

#[tokio::test]
async fn test_notifications_belong_to_their_user() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (employee_id, employee) = app.employee("jeanne@remisage.fr").await;
    let (_, other) = app.employee("paul@remisage.fr").await;

    for subject in ["Révision", "Contrôle technique"] {
        let (status, body) = app
            .request(
                Method::POST,
                "/api/messages",
                Some(&admin),
                Some(json!({ "receiverId": employee_id, "subject": subject, "content": "Merci de confirmer" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
    }

    // Las notificaciones son asíncronas
    let mut ids = Vec::new();
    for _ in 0..50 {
        let (_, body) = app.request(Method::GET, "/api/notifications", Some(&employee), None).await;
        ids = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|n| n["id"].as_i64())
            .collect();
        if ids.len() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(ids.len(), 2);
    let target = format!("/api/notifications/{}", ids[0]);

    let (status, _) = app.request(Method::GET, &target, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .request(Method::PUT, &format!("{}/read", target), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.request(Method::DELETE, &target, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::GET, &target, Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isRead"], false);

    let (_, body) = app
        .request(Method::GET, "/api/notifications/unread/count", Some(&employee), None)
        .await;
    assert_eq!(body["data"]["count"], 2);

    let (status, body) = app
        .request(Method::PUT, "/api/notifications/read-all", Some(&employee), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["updated"], 2);

    let (_, body) = app
        .request(Method::GET, "/api/notifications/unread/count", Some(&employee), None)
        .await;
    assert_eq!(body["data"]["count"], 0);
    let (_, body) = app
        .request(Method::GET, "/api/notifications?unreadOnly=true", Some(&employee), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = app.request(Method::DELETE, &target, Some(&employee), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request(Method::GET, &target, Some(&employee), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_lifecycle() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (_, employee) = app.employee("jeanne@remisage.fr").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/requests",
            Some(&employee),
            Some(json!({ "type": "maintenance", "details": "Pneu crevé" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let request_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "pending");

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/requests/{}/status", request_id),
            Some(&employee),
            Some(json!({ "status": "approved" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/api/requests/{}/status", request_id),
            Some(&admin),
            Some(json!({ "status": "approved", "adminResponse": "Rendez-vous jeudi" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "approved");

    // Ya no está pendiente
    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/requests/{}", request_id),
            Some(&employee),
            Some(json!({ "details": "Deux pneus" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.request(Method::GET, "/api/requests/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}
