//! Route definitions
//!
//! Defines all admin HTTP API endpoints.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers::{catalog, dashboard, health, orders, payments};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Dashboard views
        .route("/api/stats", get(dashboard::stats))
        .route("/api/calls", get(dashboard::list_calls))
        // Orders
        .route("/api/orders", get(orders::list_orders))
        .route("/api/orders/{id}", put(orders::update_order))
        .route("/api/process-order", post(orders::process_order))
        // Catalog
        .route(
            "/api/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/api/products/{id}",
            put(catalog::update_product).delete(catalog::delete_product),
        )
        .route("/api/faqs", get(catalog::list_faqs).post(catalog::create_faq))
        .route(
            "/api/faqs/{id}",
            put(catalog::update_faq).delete(catalog::delete_faq),
        )
        // Payments
        .route("/api/create-payment", post(payments::create_payment))
}
