mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::Workshop;
use taller_workflow::create_app;
use taller_workflow::models::{NewRepair, Repair, UserAccount};
use taller_workflow::utils::jwt::generate_token;

struct TestApp {
    workshop: Workshop,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let workshop = Workshop::new().await;
        let router = create_app(workshop.state.clone());
        Self { workshop, router }
    }

    fn bearer(&self, user: &UserAccount) -> String {
        let token = generate_token(user.id, &self.workshop.state.jwt).unwrap();
        format!("Bearer {}", token)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<&UserAccount>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, self.bearer(user));
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
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Reparación terminada sobre un auto del cliente principal
    async fn seed_repair(&self, plate: &str, cost: Decimal) -> Repair {
        let car = self.workshop.register_car(plate).await;
        self.workshop
            .store
            .seed_repair(NewRepair {
                description: "Cambio de embrague".to_string(),
                cost,
                warranty_days: 90,
                car_id: car.id,
                mechanic_id: Some(self.workshop.mechanic_id()),
            })
            .await
    }

    fn car_body(&self, plate: &str) -> Value {
        json!({
            "licensePlate": plate,
            "brand": "Peugeot",
            "model": "208",
            "kms": 15000,
            "chassis": "VF3CCHMZ6JT012345",
            "clientId": self.workshop.client_id(),
        })
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/test", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/api/cars", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_inactive_user_is_unauthorized() {
    let app = TestApp::new().await;
    app.workshop
        .store
        .set_user_active(app.workshop.client.id, false)
        .await;

    let (status, _) = app
        .send(Method::GET, "/api/cars", Some(&app.workshop.client), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_registry_endpoint() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(Method::GET, "/api/car-states/statuses", Some(&app.workshop.client), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let statuses = body["data"].as_array().unwrap();
    assert_eq!(statuses.len(), 8);
    assert_eq!(statuses[0]["id"], 1);
    assert_eq!(statuses[0]["name"], "Entrada");
}

#[tokio::test]
async fn test_car_and_request_flow() {
    let app = TestApp::new().await;
    let client = &app.workshop.client;

    let (status, body) = app
        .send(Method::POST, "/api/cars", Some(client), Some(app.car_body("ab 123 cd")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["licensePlate"], "AB123CD");
    assert_eq!(body["data"]["status"]["id"], 1);
    let car_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/requests",
            Some(client),
            Some(json!({ "carId": car_id, "description": "Revisión de frenos" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["request"]["status"], "PENDING");
    assert_eq!(body["data"]["car"]["status"]["name"], "Pendiente");

    let uri = format!("/api/requests/client/{}", app.workshop.client_id());
    let (status, body) = app.send(Method::GET, &uri, Some(client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/cars/{}/history", car_id);
    let (status, body) = app.send(Method::GET, &uri, Some(client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_forbidden_error_body() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/cars",
            Some(&app.workshop.other_client),
            Some(app.car_body("ABC123")),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_duplicate_plate_is_conflict() {
    let app = TestApp::new().await;
    let client = &app.workshop.client;

    let (status, _) = app
        .send(Method::POST, "/api/cars", Some(client), Some(app.car_body("ABC123")))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::POST, "/api/cars", Some(client), Some(app.car_body("abc-123")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_delete_car_requires_admin() {
    let app = TestApp::new().await;
    let car = app.workshop.register_car("ABC124").await;
    let uri = format!("/api/cars/{}", car.id);

    let (status, _) = app
        .send(Method::DELETE, &uri, Some(&app.workshop.client), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &uri, Some(&app.workshop.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().unwrap())
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn test_duplicate_payment_body_carries_details() {
    let app = TestApp::new().await;
    let repair = app.seed_repair("ABC125", Decimal::new(25000, 2)).await;
    let client = &app.workshop.client;
    let body = json!({ "repairId": repair.id, "clientId": app.workshop.client_id() });

    let (status, first) = app
        .send(Method::POST, "/api/payments/create-preference", Some(client), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["payment"]["status"], "PENDIENTE");
    assert_eq!(first["data"]["simulation"], true);
    let payment_id = first["data"]["payment"]["id"].clone();

    let (status, duplicate) = app
        .send(Method::POST, "/api/payments/create-preference", Some(client), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["success"], false);
    assert_eq!(duplicate["code"], "DUPLICATE_PENDING_PAYMENT");
    let details = &duplicate["details"];
    assert_eq!(details["existingPaymentId"], payment_id);
    assert_eq!(
        timestamp(&details["canCancelAfter"]),
        timestamp(&details["createdAt"]) + Duration::minutes(30)
    );
}

#[tokio::test]
async fn test_payment_endpoints_lifecycle() {
    let app = TestApp::new().await;
    let repair = app.seed_repair("ABC126", Decimal::new(9900, 2)).await;
    let client = &app.workshop.client;
    let pending_uri = format!("/api/payments/pending/{}", repair.id);
    let create = || json!({ "repairId": repair.id, "clientId": app.workshop.client_id() });

    let (status, body) = app.send(Method::GET, &pending_uri, Some(client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_null());

    let (_, created) = app
        .send(Method::POST, "/api/payments/create-preference", Some(client), Some(create()))
        .await;
    let payment_id = created["data"]["payment"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.send(Method::GET, &pending_uri, Some(client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], payment_id.as_str());
    assert_eq!(body["data"]["canReplaceNow"], false);
    let minutes_left = body["data"]["minutesLeft"].as_i64().unwrap();
    assert!((29..=30).contains(&minutes_left));

    // Otro cliente no ve ni cancela el pago
    let cancel_uri = format!("/api/payments/cancel-pending/{}", payment_id);
    let (status, body) = app
        .send(Method::POST, &cancel_uri, Some(&app.workshop.other_client), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = app.send(Method::POST, &cancel_uri, Some(client), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "CANCELADO");

    let (status, body) = app.send(Method::POST, &cancel_uri, Some(client), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE");

    // Un intento nuevo y la confirmación del admin
    let (status, created) = app
        .send(Method::POST, "/api/payments/create-preference", Some(client), Some(create()))
        .await;
    assert_eq!(status, StatusCode::OK);
    let confirm_uri = format!(
        "/api/payments/{}/confirm",
        created["data"]["payment"]["id"].as_str().unwrap()
    );

    let (status, _) = app.send(Method::POST, &confirm_uri, Some(client), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, &confirm_uri, Some(&app.workshop.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PAGADO");
}

#[tokio::test]
async fn test_zero_cost_repair_payment_is_validation_error() {
    let app = TestApp::new().await;
    let repair = app.seed_repair("ABC127", Decimal::ZERO).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/payments/create-preference",
            Some(&app.workshop.client),
            Some(json!({ "repairId": repair.id, "clientId": app.workshop.client_id() })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_repair_listing_is_cached_until_a_repair_write() {
    let app = TestApp::new().await;
    let admin = &app.workshop.admin;
    app.seed_repair("ABC128", Decimal::new(1000, 0)).await;

    let (status, body) = app.send(Method::GET, "/api/repairs", Some(admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    {
        let entries = app.workshop.cache.entries.lock().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.keys().all(|key| key.starts_with("cache:repairs:")));
    }

    // Escritura por fuera del servicio: la lectura sale del cache
    app.seed_repair("ABC129", Decimal::new(2000, 0)).await;
    let (_, cached) = app.send(Method::GET, "/api/repairs", Some(admin), None).await;
    assert_eq!(cached, body);

    // Cada identidad tiene su propia entrada
    let (_, own) = app
        .send(Method::GET, "/api/repairs", Some(&app.workshop.client), None)
        .await;
    assert_eq!(own["data"].as_array().unwrap().len(), 2);
    assert_eq!(app.workshop.cache.entries.lock().await.len(), 2);

    // Alta por la API: invalida y la próxima lectura es fresca
    let car = app.workshop.register_car("ABC130").await;
    let (status, created) = app
        .send(
            Method::POST,
            "/api/repairs",
            Some(&app.workshop.mechanic),
            Some(json!({
                "carId": car.id,
                "mechanicId": app.workshop.mechanic_id(),
                "description": "Cambio de aceite",
                "cost": "45.00",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["data"]["car"]["status"]["name"], "Finalizado");
    assert_eq!(created["data"]["repair"]["warrantyDays"], 90);
    assert!(app.workshop.cache.entries.lock().await.is_empty());

    let (_, fresh) = app.send(Method::GET, "/api/repairs", Some(admin), None).await;
    assert_eq!(fresh["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_repair_correction_and_mechanic_listing_endpoints() {
    let app = TestApp::new().await;
    let repair = app.seed_repair("ABC131", Decimal::new(5000, 0)).await;
    let uri = format!("/api/repairs/{}", repair.id);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.workshop.receptionist),
            Some(json!({ "cost": "60" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.workshop.mechanic),
            Some(json!({ "cost": "-5" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.workshop.mechanic),
            Some(json!({ "description": "Embrague y volante", "warranty": 120 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "Embrague y volante");
    assert_eq!(body["data"]["warrantyDays"], 120);

    let listing = format!("/api/repairs/mechanic/{}", app.workshop.mechanic_id());
    let (status, body) = app
        .send(Method::GET, &listing, Some(&app.workshop.boss), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], json!(repair.id));
    assert_eq!(body["data"][0]["licensePlate"], "ABC131");

    let (status, _) = app
        .send(Method::GET, &listing, Some(&app.workshop.client), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_car_endpoint() {
    let app = TestApp::new().await;
    let car = app.workshop.register_car("ABC132").await;
    app.workshop.register_car("ABC133").await;
    let uri = format!("/api/cars/{}", car.id);

    let (status, _) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.workshop.client),
            Some(json!({ "kms": 50000 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.workshop.receptionist),
            Some(json!({ "licensePlate": "ab 321 cd", "brand": "Fiat", "kms": 50000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["licensePlate"], "AB321CD");
    assert_eq!(body["data"]["kms"], 50000);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.workshop.admin),
            Some(json!({ "licensePlate": "abc-133" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_registration_confirmation_is_enqueued() {
    let app = TestApp::new().await;
    let body = json!({ "email": "nuevo@mail.com", "name": "Nuevo" });

    let (status, _) = app
        .send(
            Method::POST,
            "/api/email/registration-confirmation",
            Some(&app.workshop.client),
            Some(body.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, response) = app
        .send(
            Method::POST,
            "/api/email/registration-confirmation",
            Some(&app.workshop.admin),
            Some(body),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["job"], "registrationConfirmation");
    assert_eq!(app.workshop.queue.kinds().await, vec!["registrationConfirmation"]);
}
