use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use events_server::auth::password::hash_password;
use events_server::auth::tokens::{encode_uid, TokenPurpose};
use events_server::config::Config;
use events_server::models::{NewUser, User};
use events_server::routes::create_routes;
use events_server::store::MemoryStore;
use events_server::AppState;

const PASSWORD: &str = "sup3r-secret";

struct TestApp {
    router: Router,
    state: AppState,
}

fn app() -> TestApp {
    let config = Config::development();
    let state = AppState::new(Arc::new(MemoryStore::new()), &config).unwrap();
    TestApp {
        router: create_routes(state.clone(), &config),
        state,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn user(&self, username: &str, is_active: bool, is_superuser: bool) -> User {
        self.state
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                is_active,
                is_superuser,
            })
            .await
            .unwrap()
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/cuentas/login/",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.user("admin", true, true).await;
        self.login("admin", PASSWORD).await
    }

    /// Link path carrying a fresh token for the user as currently stored.
    async fn link(&self, prefix: &str, purpose: TokenPurpose, username: &str) -> String {
        let user = self
            .state
            .store
            .find_user_by_username(username)
            .await
            .unwrap()
            .unwrap();
        format!(
            "{}/{}/{}/",
            prefix,
            encode_uid(user.id),
            self.state.tokens(purpose).make_token(&user)
        )
    }
}

fn event_payload(name: &str) -> Value {
    json!({ "name": name, "commission": "10.00", "place": "Córdoba", "category": "PCo" })
}

fn sponsor_payload(document_number: &str) -> Value {
    json!({
        "organization_name": "Acme SA",
        "document_number": document_number,
        "vat_condition": "responsable inscripto",
    })
}

#[tokio::test]
async fn test_health_carries_security_headers() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_signup_activation_and_login() {
    let app = app();
    let (status, body) = app
        .send(
            "POST",
            "/registrar-organizador/",
            None,
            Some(json!({
                "username": "ana",
                "email": "ana@example.com",
                "first_name": "Ana",
                "last_name": "García",
                "password1": PASSWORD,
                "password2": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["display"], "ana - ana@example.com");

    let (status, _) = app
        .send(
            "POST",
            "/cuentas/login/",
            None,
            Some(json!({ "username": "ana", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let link = app.link("/activate", TokenPurpose::Activation, "ana").await;
    let (status, body) = app.send("GET", &link, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);

    // Activation flips the active flag, which retires the token.
    let (status, _) = app.send("GET", &link, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let token = app.login("ana", PASSWORD).await;
    let (status, body) = app.send("GET", "/api/organizers/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["first_name"], "Ana");
}

#[tokio::test]
async fn test_signup_rejects_bad_passwords_and_duplicates() {
    let app = app();
    let (status, body) = app
        .send(
            "POST",
            "/registrar-organizador/",
            None,
            Some(json!({
                "username": "beto",
                "email": "beto@example.com",
                "first_name": "Beto",
                "last_name": "Pérez",
                "password1": "12345678",
                "password2": "12345678",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["password2"].is_array());

    app.user("beto", true, false).await;
    let (status, body) = app
        .send(
            "POST",
            "/registrar-organizador/",
            None,
            Some(json!({
                "username": "beto",
                "email": "beto@example.com",
                "first_name": "Beto",
                "last_name": "Pérez",
                "password1": PASSWORD,
                "password2": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = app();
    app.user("carla", true, false).await;

    let (status, _) = app
        .send(
            "POST",
            "/cuentas/cambio-clave/",
            None,
            Some(json!({ "email": "carla@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            "POST",
            "/cuentas/cambio-clave/",
            None,
            Some(json!({ "email": "nobody@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let link = app.link("/cuentas", TokenPurpose::PasswordReset, "carla").await;
    let (_, body) = app.send("GET", &link, None, None).await;
    assert_eq!(body["data"]["valid"], true);

    let (status, body) = app
        .send(
            "POST",
            &link,
            None,
            Some(json!({ "new_password1": "n3w-password", "new_password2": "other-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["new_password2"].is_array());

    let (status, _) = app
        .send(
            "POST",
            &link,
            None,
            Some(json!({ "new_password1": "n3w-password", "new_password2": "n3w-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", &link, None, None).await;
    assert_eq!(body["data"]["valid"], false);

    app.login("carla", "n3w-password").await;
}

#[tokio::test]
async fn test_activation_and_reset_tokens_do_not_mix() {
    let app = app();
    app.user("eve", false, false).await;

    let activation = app.link("/activate", TokenPurpose::Activation, "eve").await;
    let (_, token_path) = activation.split_at("/activate".len());
    let reset = format!("/cuentas{}", token_path);

    let (status, body) = app.send("GET", &reset, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["valid"], false);

    let (status, _) = app
        .send(
            "POST",
            &reset,
            None,
            Some(json!({ "new_password1": "otherpass2", "new_password2": "otherpass2" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Reset links don't hold for accounts that were never activated.
    let reset = app.link("/cuentas", TokenPurpose::PasswordReset, "eve").await;
    let (_, body) = app.send("GET", &reset, None, None).await;
    assert_eq!(body["data"]["valid"], false);

    let user = app
        .state
        .store
        .find_user_by_username("eve")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_active);
    assert!(events_server::auth::password::verify_password(
        PASSWORD,
        &user.password_hash
    ));

    // The activation link is still usable, and only on its own route.
    let (status, body) = app.send("GET", &activation, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);
}

#[tokio::test]
async fn test_api_requires_a_valid_session() {
    let app = app();
    let (status, body) = app.send("GET", "/api/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, _) = app.send("GET", "/api/events", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_permissions_gate_sponsor_listing() {
    let app = app();
    let admin = app.admin_token().await;
    let dani = app.user("dani", true, false).await;
    let token = app.login("dani", PASSWORD).await;

    let (status, _) = app.send("GET", "/api/sponsors", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/users/{}/permissions", dani.id);
    let (status, _) = app
        .send(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({ "permissions": ["view_sponsors"] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            "PUT",
            &uri,
            Some(&admin),
            Some(json!({ "permissions": ["view_sponsors"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["permissions"], json!(["view_sponsors"]));

    let (status, _) = app.send("GET", "/api/sponsors", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_sponsor_soft_delete_and_scopes() {
    let app = app();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send("POST", "/api/sponsors", Some(&admin), Some(sponsor_payload("20-12345678-9")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["enabled"], false);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/sponsors/{}/enabled", id),
            Some(&admin),
            Some(json!({ "enabled": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], true);

    let (status, _) = app
        .send("DELETE", &format!("/api/sponsors/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.send("GET", "/api/sponsors", Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let (_, body) = app.send("GET", "/api/sponsors?all=true", Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["active"], false);

    let (status, _) = app
        .send("GET", &format!("/api/sponsors/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send("GET", &format!("/api/sponsors/{}?all=true", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_cuit_and_commission_are_rejected() {
    let app = app();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send("POST", "/api/sponsors", Some(&admin), Some(sponsor_payload("20123456789")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["details"]["document_number"][0],
        "El CUIT ingresado no es correcto."
    );

    let mut event = event_payload("PyCon");
    event["commission"] = json!("100.01");
    let (status, body) = app.send("POST", "/api/events", Some(&admin), Some(event)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["commission"].is_array());
}

#[tokio::test]
async fn test_duplicate_category_and_event_organizer_conflict() {
    let app = app();
    let admin = app.admin_token().await;

    let (_, body) = app
        .send("POST", "/api/events", Some(&admin), Some(event_payload("PyCon")))
        .await;
    let event_id = body["data"]["id"].as_str().unwrap().to_string();
    let categories = format!("/api/events/{}/categories", event_id);

    let category = json!({ "name": "Oro", "amount": "1500.00" });
    let (status, _) = app
        .send("POST", &categories, Some(&admin), Some(category.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.send("POST", &categories, Some(&admin), Some(category)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "Sponsor category with this Event and Name already exists."
    );

    let emi = app.user("emi", true, false).await;
    let (_, body) = app
        .send(
            "POST",
            "/api/organizers",
            Some(&admin),
            Some(json!({ "first_name": "Emi", "last_name": "Sosa", "user_id": emi.id })),
        )
        .await;
    let organizer_id = body["data"]["id"].as_str().unwrap().to_string();

    let organizers = format!("/api/events/{}/organizers", event_id);
    let link = json!({ "organizer_id": organizer_id });
    let (status, _) = app.send("POST", &organizers, Some(&admin), Some(link.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.send("POST", &organizers, Some(&admin), Some(link)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.send("GET", &organizers, Some(&admin), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bank_account_access_is_limited_to_owners() {
    let app = app();
    let admin = app.admin_token().await;

    let fede = app.user("fede", true, false).await;
    app.state
        .store
        .create_organizer(
            events_server::models::NewOrganizer {
                first_name: "Fede".to_string(),
                last_name: "Ruiz".to_string(),
                user_id: fede.id,
                account_data_id: None,
            },
            None,
        )
        .await
        .unwrap();
    let owner = app.login("fede", PASSWORD).await;

    app.user("gabi", true, false).await;
    let stranger = app.login("gabi", PASSWORD).await;

    let (status, body) = app
        .send(
            "POST",
            "/api/bank-accounts",
            Some(&owner),
            Some(json!({
                "document_number": "30-71234567-1",
                "bank_entity": "Banco Nación",
                "account_number": "1234567890",
                "account_type": "CA",
                "organization_name": "Fede Ruiz",
                "cbu": "0110599520000001234567",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let account = format!("/api/bank-accounts/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = app.send("GET", &account, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &account, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.send("GET", &account, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .send("GET", &format!("{}/owners", account), Some(&owner), None)
        .await;
    assert_eq!(body["data"][0]["user_id"], json!(fede.id));
}

#[tokio::test]
async fn test_versions_and_sponsoring_cascade() {
    let app = app();
    let admin = app.admin_token().await;

    let (_, body) = app
        .send("POST", "/api/events", Some(&admin), Some(event_payload("PyDay")))
        .await;
    let event_id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/events/{}", event_id),
            Some(&admin),
            Some(event_payload("PyDay Rosario")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send("GET", &format!("/api/versions/event/{}", event_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["revision"], 2);
    assert_eq!(body["data"][0]["data"]["name"], "PyDay Rosario");
    assert_eq!(body["data"][1]["revision"], 1);

    let (status, _) = app
        .send("GET", &format!("/api/versions/widget/{}", event_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .send(
            "POST",
            &format!("/api/events/{}/categories", event_id),
            Some(&admin),
            Some(json!({ "name": "Plata", "amount": "800" })),
        )
        .await;
    let category_id = body["data"]["id"].as_str().unwrap().to_string();
    let (_, body) = app
        .send("POST", "/api/sponsors", Some(&admin), Some(sponsor_payload("30-11111111-2")))
        .await;
    let sponsor_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            "POST",
            "/api/sponsorings",
            Some(&admin),
            Some(json!({ "sponsor_category_id": category_id, "sponsor_id": sponsor_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let sponsoring_id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .send("GET", &format!("/api/sponsorings/{}", sponsoring_id), Some(&admin), None)
        .await;
    assert_eq!(body["data"]["description"], "Acme SA - PyDay Rosario (Plata)");

    let (status, body) = app
        .send(
            "POST",
            "/api/invoices",
            Some(&admin),
            Some(json!({
                "amount": "800.00",
                "document": "factura-0001.pdf",
                "sponsoring_id": sponsoring_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["document"], "invoices/documents/factura-0001.pdf");
    let invoice = format!("/api/invoices/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = app
        .send("DELETE", &format!("/api/sponsorings/{}", sponsoring_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send("GET", &invoice, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["sponsoring_id"].is_null());
}

#[tokio::test]
async fn test_invoice_payment_flags_are_exclusive() {
    let app = app();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            "POST",
            "/api/invoices",
            Some(&admin),
            Some(json!({
                "amount": "10",
                "document": "factura.pdf",
                "partial_payment": true,
                "complete_payment": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"]["complete_payment"].is_array());
}
