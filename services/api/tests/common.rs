#![allow(dead_code)]

use api_lib::{
    adapters::razorpay::checkout_signature,
    config::Config,
    web::{build_router, AppState},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use tutoring_core::domain::{GatewayOrder, GoogleIdentity};
use tutoring_core::memory::{
    InMemoryAccountRepository, InMemoryPaymentRepository, InMemorySlotRepository,
};
use tutoring_core::ports::{IdentityProvider, PaymentGateway, PortError, PortResult};

pub const GATEWAY_SECRET: &str = "test_gateway_secret";
pub const GOOGLE_TOKEN: &str = "valid-google-token";
pub const GOOGLE_CODE: &str = "valid-google-code";
pub const GOOGLE_EMAIL: &str = "google.user@example.com";

pub struct StubIdentityProvider;

impl StubIdentityProvider {
    fn identity() -> GoogleIdentity {
        GoogleIdentity {
            email: GOOGLE_EMAIL.to_string(),
            name: "Google User".to_string(),
            picture: Some("https://example.com/p.png".to_string()),
            email_verified: true,
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.example.com/auth?state={}", state)
    }

    async fn verify_id_token(&self, id_token: &str) -> PortResult<GoogleIdentity> {
        if id_token == GOOGLE_TOKEN {
            Ok(Self::identity())
        } else {
            Err(PortError::Unauthorized)
        }
    }

    async fn exchange_code(&self, code: &str) -> PortResult<GoogleIdentity> {
        if code == GOOGLE_CODE {
            Ok(Self::identity())
        } else {
            Err(PortError::Unauthorized)
        }
    }
}

#[derive(Default)]
pub struct StubGateway {
    orders: AtomicUsize,
}

#[async_trait]
impl PaymentGateway for StubGateway {
    fn public_key(&self) -> String {
        "rzp_test_key".to_string()
    }

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        _receipt: &str,
        _notes: &[(String, String)],
    ) -> PortResult<GatewayOrder> {
        let n = self.orders.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayOrder {
            order_id: format!("order_{}", n),
            amount,
            currency: currency.to_string(),
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        checkout_signature(GATEWAY_SECRET, order_id, payment_id) == signature
    }
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        db_max_connections: 1,
        log_level: tracing::Level::INFO,
        cors_origin: "http://localhost:3000".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 30,
        google_client_id: Some("client-id".to_string()),
        google_client_secret: Some("client-secret".to_string()),
        google_redirect_url: "http://localhost:8080/auth/google/callback".to_string(),
        razorpay_key: Some("rzp_test_key".to_string()),
        razorpay_secret: Some(GATEWAY_SECRET.to_string()),
        platform_fee_percent: 10,
        currency: "INR".to_string(),
        week_start: Weekday::Mon,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub payments: Arc<InMemoryPaymentRepository>,
}

/// An authenticated user created through `/auth/register`.
pub struct Account {
    pub id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let payments = Arc::new(InMemoryPaymentRepository::new());
        let state = Arc::new(AppState::new(
            Arc::new(test_config()),
            Arc::new(InMemorySlotRepository::new()),
            Arc::new(InMemoryAccountRepository::new()),
            payments.clone(),
            Arc::new(StubIdentityProvider),
            Arc::new(StubGateway::default()),
        ));
        let router = build_router(state.clone());
        Self {
            router,
            state,
            payments,
        }
    }

    pub async fn call(
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
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn register(&self, role: &str, email: &str) -> Account {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "full_name": format!("Test {}", role),
                    "email": email,
                    "password": "pa55word",
                    "confirm_password": "pa55word",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        Account {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            access_token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Registers an expert charging `fee` per session and publishes one Monday
    /// 10:00-11:00 window in 30-minute slots, two weeks out.
    pub async fn expert_with_slots(&self, email: &str, fee: i64) -> (Account, Vec<Value>) {
        let expert = self.register("expert", email).await;
        let (status, _) = self
            .call(
                "PUT",
                "/expert/profile",
                Some(&expert.access_token),
                Some(json!({ "fee_per_session": fee, "expertise": "Mathematics" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .call(
                "POST",
                "/expert/generate-slots",
                Some(&expert.access_token),
                Some(json!({
                    "days": ["monday"],
                    "start_time": "10:00",
                    "end_time": "11:00",
                    "slot_size": 30,
                    "week_of": future_week(),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "generate failed: {}", body);
        let slots = body["slots"].as_array().unwrap().clone();
        (expert, slots)
    }
}

/// A date comfortably in the future so generated slots are listed as upcoming.
pub fn future_week() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(14)
}
