use std::sync::{Arc, Mutex};

use academy_api::app::{AppServices, build_app};
use academy_auth::{NewUser, Role, User};
use academy_catalog::{ClassDraft, ClassOffering, InstructorProfile};
use academy_core::{ClassId, InstructorId, UserId};
use academy_infra::{DisabledGateway, PaymentError, PaymentGateway, PaymentIntent, Stores};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(Arc::new(DisabledGateway)).await
    }

    async fn spawn_with(payments: Arc<dyn PaymentGateway>) -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let services = Arc::new(AppServices::new(Stores::in_memory(), JWT_SECRET, payments));
        let app = build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn stores(&self) -> &Stores {
        &self.services.stores
    }

    async fn seed_user(&self, email: &str, role: Option<Role>) -> User {
        let mut user = User::register(
            UserId::new(),
            NewUser {
                email: email.to_string(),
                name: None,
                photo_url: None,
            },
        )
        .unwrap();
        user.role = role;
        self.stores().users.insert_if_absent(user.clone()).await.unwrap();
        user
    }

    async fn seed_class(&self, seats: i64) -> ClassOffering {
        let draft: ClassDraft = serde_json::from_value(json!({
            "name": "Fencing",
            "instructorName": "Coach",
            "price": 40,
            "availableSeats": seats,
        }))
        .unwrap();
        let class = ClassOffering::create(ClassId::new(), draft, "coach@example.com", Utc::now()).unwrap();
        self.stores().classes.insert(class.clone()).await.unwrap();
        class
    }

    async fn stored_role(&self, email: &str) -> Option<Role> {
        self.stores()
            .users
            .find_by_email(email)
            .await
            .unwrap()
            .and_then(|u| u.role)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt_at(email: &str, issued_at: chrono::DateTime<Utc>) -> String {
    let iat = issued_at.timestamp();
    let claims = json!({
        "email": email,
        "iat": iat,
        "exp": iat + ChronoDuration::hours(1).num_seconds(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn mint_jwt(email: &str) -> String {
    mint_jwt_at(email, Utc::now())
}

/// Records every intent request instead of calling a processor.
#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<(i64, String)>>,
}

#[async_trait::async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_intent(&self, amount_cents: i64, currency: &str) -> Result<PaymentIntent, PaymentError> {
        self.calls.lock().unwrap().push((amount_cents, currency.to_string()));
        Ok(PaymentIntent {
            id: "pi_test".to_string(),
            client_secret: "pi_test_secret".to_string(),
        })
    }
}

#[tokio::test]
async fn root_reports_liveness() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Sports Academies Is Now Open");
}

#[tokio::test]
async fn issued_token_carries_identity_for_one_hour() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/jwt"))
        .json(&json!({ "email": "ana@example.com", "name": "Ana" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    let decoded = jsonwebtoken::decode::<Value>(
        &token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &validation,
    )
    .unwrap();
    assert_eq!(decoded.claims["email"], "ana@example.com");
    assert_eq!(decoded.claims["name"], "Ana");
    let lifetime = decoded.claims["exp"].as_i64().unwrap() - decoded.claims["iat"].as_i64().unwrap();
    assert_eq!(lifetime, 3600);

    // The server accepts its own token.
    let res = client
        .get(srv.url("/selectedCourse?email=ana@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let target = srv.seed_user("sam@example.com", None).await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": true, "message": "Your access unauthorized" }));

    let res = client
        .patch(srv.url(&format!("/users/admin/{}", target.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .patch(srv.url(&format!("/users/admin/{}", target.id)))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .patch(srv.url(&format!("/users/admin/{}", target.id)))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(srv.stored_role("sam@example.com").await, None);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt_at("ana@example.com", Utc::now() - ChronoDuration::minutes(61));

    let res = reqwest::Client::new()
        .get(srv.url("/enrolled?email=ana@example.com"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_gate_blocks_non_admins() {
    let srv = TestServer::spawn().await;
    srv.seed_user("inst@example.com", Some(Role::INSTRUCTOR)).await;
    let target = srv.seed_user("sam@example.com", None).await;
    let client = reqwest::Client::new();

    for email in ["inst@example.com", "stranger@example.com"] {
        let res = client
            .patch(srv.url(&format!("/users/instructor/{}", target.id)))
            .bearer_auth(mint_jwt(email))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], true);
    }
    assert_eq!(srv.stored_role("sam@example.com").await, None);

    let res = client
        .get(srv.url("/users"))
        .bearer_auth(mint_jwt("inst@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_promotes_users() {
    let srv = TestServer::spawn().await;
    srv.seed_user("root@example.com", Some(Role::ADMIN)).await;
    let target = srv.seed_user("sam@example.com", None).await;
    let admin_token = mint_jwt("root@example.com");
    let client = reqwest::Client::new();

    let res = client
        .patch(srv.url(&format!("/users/instructor/{}", target.id)))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ack: Value = res.json().await.unwrap();
    assert_eq!(ack["matchedCount"], 1);
    assert_eq!(ack["modifiedCount"], 1);
    assert_eq!(srv.stored_role("sam@example.com").await, Some(Role::INSTRUCTOR));

    // Role checks are uncached: the promotion is visible immediately.
    let res = client
        .get(srv.url("/users/instructor/sam@example.com"))
        .bearer_auth(mint_jwt("sam@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "instructor": true }));

    let res = client.get(srv.url("/instructor")).send().await.unwrap();
    let instructors: Value = res.json().await.unwrap();
    assert_eq!(instructors.as_array().unwrap().len(), 1);
    assert_eq!(instructors[0]["email"], "sam@example.com");

    let res = client
        .patch(srv.url("/users/admin/not-an-id"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registering_twice_reports_existing_user() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let body = json!({ "email": "new@example.com", "name": "New", "photoURL": "https://img/x.png" });

    let first: Value = client
        .post(srv.url("/users"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(first["insertedId"].is_string());

    let second: Value = client
        .post(srv.url("/users"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second, json!({ "message": "user already exists" }));
}

#[tokio::test]
async fn self_scoped_routes_reject_other_emails() {
    let srv = TestServer::spawn().await;
    srv.seed_user("root@example.com", Some(Role::ADMIN)).await;
    let token = mint_jwt("ana@example.com");
    let client = reqwest::Client::new();

    let res = client
        .get(srv.url("/selectedCourse?email=root@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "error": true, "message": "Forbidden access" }));

    let res = client
        .get(srv.url("/enrolled?email=root@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .get(srv.url("/enrolled"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!([]));

    for path in ["/selectedCourse?email=", "/enrolled?email="] {
        let res = client.get(srv.url(path)).bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.json::<Value>().await.unwrap(), json!([]), "{path}");
    }

    let res = client
        .get(srv.url("/users/admin/root@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "admin": false }));
}

#[tokio::test]
async fn class_creation_coerces_numbers_and_forces_pending() {
    let srv = TestServer::spawn().await;
    srv.seed_user("coach@example.com", Some(Role::INSTRUCTOR)).await;
    let token = mint_jwt("coach@example.com");
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/classes"))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Archery",
            "instructorName": "Coach",
            "instructorEmail": "someone-else@example.com",
            "price": "25.50",
            "availableSeats": "10",
            "status": "approved",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ack: Value = res.json().await.unwrap();
    let id = ack["insertedId"].as_str().unwrap().to_string();

    let class: Value = client
        .get(srv.url(&format!("/classes/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(class["price"], 25.5);
    assert_eq!(class["availableSeats"], 10);
    assert_eq!(class["status"], "pending");
    assert_eq!(class["instructorEmail"], "coach@example.com");

    let res = client
        .post(srv.url("/classes"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Archery", "price": "cheap", "availableSeats": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let mine: Value = client
        .get(srv.url("/myClass/coach@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn instructor_revision_requires_ownership_and_resets_status() {
    let srv = TestServer::spawn().await;
    srv.seed_user("root@example.com", Some(Role::ADMIN)).await;
    srv.seed_user("coach@example.com", Some(Role::INSTRUCTOR)).await;
    srv.seed_user("rival@example.com", Some(Role::INSTRUCTOR)).await;
    let class = srv.seed_class(8).await;
    let client = reqwest::Client::new();

    let res = client
        .put(srv.url(&format!("/updateClass/{}", class.id)))
        .bearer_auth(mint_jwt("root@example.com"))
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap()["modifiedCount"], 1);

    let res = client
        .put(srv.url(&format!("/updateMyClass/{}", class.id)))
        .bearer_auth(mint_jwt("rival@example.com"))
        .json(&json!({ "name": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .put(srv.url(&format!("/updateMyClass/{}", class.id)))
        .bearer_auth(mint_jwt("coach@example.com"))
        .json(&json!({ "price": "45", "availableSeats": "12" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stored = srv.stores().classes.get(class.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Fencing");
    assert_eq!(stored.price, 45.0);
    assert_eq!(stored.available_seats, 12);
    assert_eq!(stored.status.as_str(), "pending");

    let res = client
        .post(srv.url(&format!("/sendFeedback/{}", class.id)))
        .bearer_auth(mint_jwt("root@example.com"))
        .json(&json!({ "feedback": "Add a safety briefing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let stored = srv.stores().classes.get(class.id).await.unwrap().unwrap();
    assert_eq!(stored.feedback.as_deref(), Some("Add a safety briefing"));
}

#[tokio::test]
async fn enrollment_moves_selection_and_takes_a_seat() {
    let srv = TestServer::spawn().await;
    let class = srv.seed_class(5).await;
    let token = mint_jwt("eve@example.com");
    let client = reqwest::Client::new();

    // Select
    let res = client
        .post(srv.url("/selectedCourse"))
        .bearer_auth(&token)
        .json(&json!({ "email": "eve@example.com", "classId": class.id.to_string() }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let selection_id = res.json::<Value>().await.unwrap()["insertedId"]
        .as_str()
        .unwrap()
        .to_string();

    let cart: Value = client
        .get(srv.url("/selectedCourse?email=eve@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart[0]["name"], "Fencing");
    assert_eq!(cart[0]["price"], 40.0);

    // Enroll
    let payment = json!({
        "_id": selection_id,
        "email": "eve@example.com",
        "transactionId": "pi_123",
        "price": 40,
        "className": "Fencing",
    });
    let res = client
        .post(srv.url(&format!("/enrolled/{}", class.id)))
        .bearer_auth(&token)
        .json(&payment)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: Value = res.json().await.unwrap();
    assert_eq!(receipt["deleteResult"]["deletedCount"], 1);
    assert_eq!(receipt["updateResult"]["modifiedCount"], 1);
    assert!(receipt["insertResult"]["insertedId"].is_string());

    let seats = srv.stores().classes.get(class.id).await.unwrap().unwrap().available_seats;
    assert_eq!(seats, 4);

    let res = client
        .get(srv.url(&format!("/selectedCourse/{selection_id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), Value::Null);

    let enrolled: Value = client
        .get(srv.url("/enrolled?email=eve@example.com"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(enrolled.as_array().unwrap().len(), 1);
    assert_eq!(enrolled[0]["transactionId"], "pi_123");
    assert_eq!(enrolled[0]["className"], "Fencing");

    // Replay
    let res = client
        .post(srv.url(&format!("/enrolled/{}", class.id)))
        .bearer_auth(&token)
        .json(&payment)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("selection"));

    let seats = srv.stores().classes.get(class.id).await.unwrap().unwrap().available_seats;
    assert_eq!(seats, 4);
}

#[tokio::test]
async fn enrollment_for_someone_else_is_forbidden() {
    let srv = TestServer::spawn().await;
    let class = srv.seed_class(5).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url(&format!("/enrolled/{}", class.id)))
        .bearer_auth(mint_jwt("mallory@example.com"))
        .json(&json!({ "_id": ClassId::new().to_string(), "email": "eve@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(srv.stores().classes.get(class.id).await.unwrap().unwrap().available_seats, 5);
}

#[tokio::test]
async fn payment_intent_uses_cents_and_usd() {
    let gateway = Arc::new(RecordingGateway::default());
    let srv = TestServer::spawn_with(gateway.clone()).await;

    let res = reqwest::Client::new()
        .post(srv.url("/create-payment-intent"))
        .bearer_auth(mint_jwt("eve@example.com"))
        .json(&json!({ "price": "12.5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({ "clientSecret": "pi_test_secret" })
    );
    assert_eq!(*gateway.calls.lock().unwrap(), vec![(1250, "usd".to_string())]);
}

#[tokio::test]
async fn payment_intent_without_processor_is_unavailable() {
    let srv = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .post(srv.url("/create-payment-intent"))
        .bearer_auth(mint_jwt("eve@example.com"))
        .json(&json!({ "price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn popular_instructors_are_ranked_by_students() {
    let srv = TestServer::spawn().await;
    for (name, students) in [("Low", 3), ("High", 40), ("Mid", 12)] {
        srv.stores()
            .instructors
            .insert(InstructorProfile {
                id: InstructorId::new(),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                image: None,
                number_of_students: students,
            })
            .await
            .unwrap();
    }

    let ranked: Value = reqwest::get(srv.url("/popularInstructors"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = ranked
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["High", "Mid", "Low"]);
}
