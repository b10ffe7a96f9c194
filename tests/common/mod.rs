#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use sea_orm_migration::MigratorTrait;
use tempfile::TempDir;
use tower::ServiceExt;

use solara_api::config::AppConfig;
use solara_api::db::{self, DbConfig, DbPool};
use solara_api::entities::plan;
use solara_api::errors::ServiceError;
use solara_api::events;
use solara_api::handlers::webhooks::sign_payload;
use solara_api::migrator::Migrator;
use solara_api::services::gateway::{
    CheckoutSession, CheckoutSessionRequest, PaymentGateway, PaymentIntent,
};
use solara_api::services::storage::LocalDocumentStore;
use solara_api::services::subscriptions::seed_default_plans;
use solara_api::services::AppServices;
use solara_api::{app_router, AppState};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// In-memory payment gateway. Intents start `succeeded` unless a test
/// overrides the status.
pub struct StubGateway {
    counter: AtomicU64,
    statuses: Mutex<HashMap<String, String>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            statuses: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_intent_status(&self, intent_id: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(intent_id.to_string(), status.to_string());
    }

    fn status_of(&self, intent_id: &str) -> String {
        self.statuses
            .lock()
            .unwrap()
            .get(intent_id)
            .cloned()
            .unwrap_or_else(|| "succeeded".to_string())
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
        _metadata: &[(&str, &str)],
    ) -> Result<PaymentIntent, ServiceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("pi_test_{}", n);
        Ok(PaymentIntent {
            client_secret: Some(format!("{}_secret", id)),
            id,
            amount_minor,
            currency: currency.to_string(),
            status: "requires_payment_method".to_string(),
        })
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, ServiceError> {
        Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: None,
            amount_minor: 0,
            currency: "inr".to_string(),
            status: self.status_of(id),
        })
    }

    async fn create_checkout_session(
        &self,
        req: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let id = format!("cs_test_{}", n);
        Ok(CheckoutSession {
            url: Some(format!(
                "https://checkout.test/{}?ref={}",
                id, req.reference_id
            )),
            id,
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbPool>,
    pub gateway: Arc<StubGateway>,
    _upload_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_config = DbConfig {
            url: "sqlite::memory:".to_string(),
            // A single connection keeps the in-memory database alive
            // and shared for the whole test.
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_config)
            .await
            .expect("failed to open test database");
        Migrator::up(&pool, None)
            .await
            .expect("failed to run migrations");
        seed_default_plans(&pool).await.expect("failed to seed plans");
        let pool = Arc::new(pool);

        let upload_dir = TempDir::new().expect("failed to create upload dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.payment_webhook_secret = Some(WEBHOOK_SECRET.to_string());
        cfg.upload_dir = upload_dir.path().display().to_string();
        let config = Arc::new(cfg);

        let (event_sender, event_rx) = events::event_channel(64);
        let event_sender = Arc::new(event_sender);
        tokio::spawn(events::process_events(event_rx));

        let gateway = Arc::new(StubGateway::new());
        let store = Arc::new(LocalDocumentStore::new(upload_dir.path()));

        let services = AppServices::new(
            pool.clone(),
            &config,
            event_sender.clone(),
            gateway.clone(),
            store,
        );
        let state = AppState {
            db: pool.clone(),
            config,
            event_sender,
            services,
        };

        Self {
            router: app_router(state),
            db: pool,
            gateway,
            _upload_dir: upload_dir,
        }
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("request failed")
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.request(req).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Sends a correctly signed provider webhook.
    pub async fn post_webhook(&self, payload: &serde_json::Value) -> Response<Body> {
        let body = payload.to_string();
        let signature = sign_payload(WEBHOOK_SECRET, body.as_bytes(), Utc::now().timestamp());
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/stripe/webhook")
            .header("content-type", "application/json")
            .header("Stripe-Signature", signature)
            .body(Body::from(body))
            .unwrap();
        self.request(req).await
    }

    /// Marks a seeded plan as purchasable online.
    pub async fn enable_plan_checkout(&self, plan_id: &str, price_id: &str) {
        let active = plan::ActiveModel {
            id: Set(plan_id.to_string()),
            provider_price_id: Set(Some(price_id.to_string())),
            ..Default::default()
        };
        active
            .update(&*self.db)
            .await
            .expect("failed to enable plan checkout");
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    serde_json::from_slice(&bytes).expect("body is not JSON")
}

pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    json_body(response).await
}
