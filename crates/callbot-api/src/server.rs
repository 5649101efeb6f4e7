//! HTTP API Server
//!
//! Assembles the admin API, the voice webhooks and the dashboard bundle into
//! one axum application.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use callbot_core::SqliteStore;
use callbot_payments::PaymentGateway;
use callbot_voice::CallFlowController;
use callbot_whatsapp::Notifier;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub notifier: Arc<dyn Notifier>,
    /// `None` when no payments key is configured
    pub payments: Option<Arc<dyn PaymentGateway>>,
}

/// Build the full application router
pub fn app(state: AppState, controller: Arc<CallFlowController>, static_dir: &str) -> Router {
    let mut router = routes()
        .with_state(state)
        .merge(callbot_voice::router(controller));

    // Unmatched paths fall through to the built dashboard (SPA routing).
    if Path::new(static_dir).is_dir() {
        info!("Serving dashboard from: {}", static_dir);
        let index = Path::new(static_dir).join("index.html");
        router = router.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)));
    } else {
        warn!("Dashboard directory {} not found, static hosting disabled", static_dir);
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `app` on all interfaces until `shutdown` resolves
pub async fn start_server<F>(port: u16, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::response::Response;
    use callbot_core::{ReplyGenerator, TranscriptStore};
    use callbot_payments::{PaymentIntent, PaymentIntentRequest};
    use callbot_voice::CallScript;
    use http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Remembers every message; optionally pretends the gateway is down
    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<(String, String)>>,
        failing: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn notify(&self, phone: &str, message: &str) -> Option<String> {
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), message.to_string()));
            if self.failing {
                None
            } else {
                Some("Message queued".to_string())
            }
        }
    }

    struct FakeGateway;

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_intent(
            &self,
            request: &PaymentIntentRequest,
        ) -> callbot_payments::Result<PaymentIntent> {
            Ok(PaymentIntent {
                id: "pi_1".to_string(),
                client_secret: format!("secret_{}", request.amount_minor()?),
                amount: request.amount_minor()?,
                currency: request.currency().to_string(),
                status: None,
            })
        }
    }

    struct QuietReplier;

    #[async_trait]
    impl ReplyGenerator for QuietReplier {
        async fn generate(&self, _utterance: &str, _context: &str) -> String {
            "Okay.".to_string()
        }
    }

    struct TestApp {
        router: Router,
        store: Arc<SqliteStore>,
        notifier: Arc<FakeNotifier>,
    }

    fn test_app(notifier: FakeNotifier, payments: Option<Arc<dyn PaymentGateway>>) -> TestApp {
        test_app_with_static(notifier, payments, "does/not/exist")
    }

    fn test_app_with_static(
        notifier: FakeNotifier,
        payments: Option<Arc<dyn PaymentGateway>>,
        static_dir: &str,
    ) -> TestApp {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let notifier = Arc::new(notifier);
        let controller = Arc::new(CallFlowController::new(
            store.clone(),
            Arc::new(QuietReplier),
            CallScript::default(),
        ));
        let state = AppState {
            store: store.clone(),
            notifier: notifier.clone(),
            payments,
        };
        TestApp {
            router: app(state, controller, static_dir),
            store,
            notifier,
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(FakeNotifier::default(), None);
        let response = app.router.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn test_stats_and_calls() {
        let app = test_app(FakeNotifier::default(), None);
        app.store.create_call("CA1", "+15551234567").await.unwrap();

        let response = app.router.clone().oneshot(get("/api/stats")).await.unwrap();
        assert_eq!(
            read_json(response).await,
            json!({"totalCalls": 1, "totalOrders": 0, "totalRevenue": 0.0, "avgCallDuration": 0})
        );

        let response = app.router.oneshot(get("/api/calls")).await.unwrap();
        let calls = read_json(response).await;
        assert_eq!(calls[0]["call_sid"], "CA1");
        assert_eq!(calls[0]["caller_number"], "+15551234567");
        assert_eq!(calls[0]["duration"], 0);
        assert!(calls[0]["ai_response"].is_null());
    }

    #[tokio::test]
    async fn test_voice_webhook_is_mounted() {
        let app = test_app(FakeNotifier::default(), None);
        let request = Request::builder()
            .method("POST")
            .uri("/webhook/voice")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("CallSid=CA9&From=%2B1"))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/xml");
        assert_eq!(app.store.list_calls().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_product_crud() {
        let app = test_app(FakeNotifier::default(), None);

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/products",
                json!({"name": "Bagel", "price": 1.5, "category": "Bakery"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let product = read_json(response).await;
        let id = product["id"].as_i64().unwrap();
        assert_eq!(product["active"], true);

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/products/{id}"),
                json!({"stock": 4}),
            ))
            .await
            .unwrap();
        let product = read_json(response).await;
        assert_eq!(product["stock"], 4);
        assert_eq!(product["name"], "Bagel");

        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/products/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(read_json(response).await, json!({"success": true}));

        let response = app.router.oneshot(get("/api/products")).await.unwrap();
        assert_eq!(read_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_id_is_404() {
        let app = test_app(FakeNotifier::default(), None);
        let response = app
            .router
            .oneshot(json_request("PUT", "/api/faqs/99", json!({"answer": "Yes."})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["error"], "FAQ not found: 99");
    }

    #[tokio::test]
    async fn test_validation_error_is_500_with_message() {
        let app = test_app(FakeNotifier::default(), None);
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/faqs",
                json!({"question": "  ", "answer": "No."}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("question must not be empty"));
    }

    #[tokio::test]
    async fn test_unknown_fields_rejected() {
        let app = test_app(FakeNotifier::default(), None);
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/products",
                json!({"name": "Bagel", "price": 1.0, "colour": "golden"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_process_order_sends_confirmation() {
        let app = test_app(FakeNotifier::default(), None);
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/process-order",
                json!({
                    "customerPhone": "+15551234567",
                    "items": [{"name": "Bagel", "quantity": 2}],
                    "total": 3.0,
                    "paymentIntentId": "pi_1"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["order"]["status"], "confirmed");

        let sent = app.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+15551234567");
        assert!(sent[0].1.starts_with("Order Confirmed!\nConfirmation #: ORD-"));
        assert!(sent[0].1.contains("Items: Bagel x2"));
    }

    #[tokio::test]
    async fn test_process_order_survives_notifier_failure() {
        let app = test_app(
            FakeNotifier {
                failing: true,
                ..Default::default()
            },
            None,
        );
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/process-order",
                json!({
                    "customerPhone": "+15551234567",
                    "items": [{"name": "Bagel", "quantity": 1}],
                    "total": 1.5
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.store.orders().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_order_status() {
        let app = test_app(FakeNotifier::default(), None);
        let order = app
            .store
            .insert_order(callbot_core::NewOrder {
                customer_phone: "+1".to_string(),
                items: vec![callbot_core::OrderItem {
                    name: "Bagel".to_string(),
                    quantity: 1,
                    price: None,
                }],
                total: 1.5,
                payment_intent_id: None,
                status: callbot_core::OrderStatus::Confirmed,
            })
            .unwrap();

        let response = app
            .router
            .oneshot(json_request(
                "PUT",
                &format!("/api/orders/{}", order.id),
                json!({"status": "shipped"}),
            ))
            .await
            .unwrap();
        assert_eq!(read_json(response).await["status"], "shipped");
    }

    #[tokio::test]
    async fn test_create_payment() {
        let app = test_app(FakeNotifier::default(), Some(Arc::new(FakeGateway)));
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/create-payment",
                json!({"amount": 12.5, "orderId": 7}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"clientSecret": "secret_1250"}));
    }

    #[tokio::test]
    async fn test_create_payment_unconfigured() {
        let app = test_app(FakeNotifier::default(), None);
        let response = app
            .router
            .oneshot(json_request("POST", "/api/create-payment", json!({"amount": 5})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_create_payment_invalid_amount() {
        let app = test_app(FakeNotifier::default(), Some(Arc::new(FakeGateway)));
        let response = app
            .router
            .oneshot(json_request("POST", "/api/create-payment", json!({"amount": 0})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid amount"));
    }

    #[tokio::test]
    async fn test_dashboard_spa_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>dashboard</html>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

        let app = test_app_with_static(
            FakeNotifier::default(),
            None,
            dir.path().to_str().unwrap(),
        );

        let response = app.router.clone().oneshot(get("/app.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.router.oneshot(get("/orders")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>dashboard</html>");
    }
}
