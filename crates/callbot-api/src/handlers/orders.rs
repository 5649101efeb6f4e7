//! Orders and order processing

use axum::{
    Json,
    extract::{Path, State},
};
use callbot_core::{NewOrder, Order, OrderItem, OrderStatus};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ApiJson;
use crate::error::Result;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOrderRequest {
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessOrderResponse {
    pub success: bool,
    pub order: Order,
}

pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.store.orders()?))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let order = state.store.update_order_status(id, req.status)?;
    info!("Order {} is now {}", id, order.status);
    Ok(Json(order))
}

/// Store a confirmed order, then tell the customer over WhatsApp
pub async fn process_order(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ProcessOrderRequest>,
) -> Result<Json<ProcessOrderResponse>> {
    let order = state.store.insert_order(NewOrder {
        customer_phone: req.customer_phone,
        items: req.items,
        total: req.total,
        payment_intent_id: req.payment_intent_id,
        status: OrderStatus::Confirmed,
    })?;

    if state
        .notifier
        .notify(&order.customer_phone, &order.confirmation_message())
        .await
        .is_none()
    {
        warn!("Order {} stored but confirmation was not delivered", order.confirmation_number);
    }

    Ok(Json(ProcessOrderResponse {
        success: true,
        order,
    }))
}
