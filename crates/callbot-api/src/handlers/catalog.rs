//! Products and FAQs

use axum::{
    Json,
    extract::{Path, State},
};
use callbot_core::{Faq, FaqInput, FaqPatch, Product, ProductInput, ProductPatch};
use tracing::info;

use super::{ApiJson, SuccessResponse};
use crate::error::Result;
use crate::server::AppState;

// ============================================================================
// Products
// ============================================================================

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.store.products()?))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Product>> {
    let product = state.store.insert_product(input)?;
    info!("Created product {} ({})", product.id, product.name);
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>> {
    Ok(Json(state.store.update_product(id, patch)?))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>> {
    state.store.delete_product(id)?;
    info!("Deleted product {}", id);
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================================
// FAQs
// ============================================================================

pub async fn list_faqs(State(state): State<AppState>) -> Result<Json<Vec<Faq>>> {
    Ok(Json(state.store.faqs()?))
}

pub async fn create_faq(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<FaqInput>,
) -> Result<Json<Faq>> {
    Ok(Json(state.store.insert_faq(input)?))
}

pub async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<FaqPatch>,
) -> Result<Json<Faq>> {
    Ok(Json(state.store.update_faq(id, patch)?))
}

pub async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>> {
    state.store.delete_faq(id)?;
    Ok(Json(SuccessResponse::ok()))
}
