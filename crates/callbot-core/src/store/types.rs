//! Persisted records and the validated request shapes that create them

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Error, Result};

#[derive(Error, Debug)]
#[error("unknown {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

/// Outcome of an inbound call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Answered,
    Missed,
    Busy,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Answered => "answered",
            CallStatus::Missed => "missed",
            CallStatus::Busy => "busy",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "answered" => Ok(CallStatus::Answered),
            "missed" => Ok(CallStatus::Missed),
            "busy" => Ok(CallStatus::Busy),
            other => Err(ParseStatusError {
                kind: "call status",
                value: other.to_string(),
            }),
        }
    }
}

/// One inbound phone call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: i64,
    /// Provider-assigned call identifier
    pub call_sid: String,
    pub caller_number: String,
    pub status: CallStatus,
    pub transcript: Option<String>,
    pub ai_response: Option<String>,
    #[serde(rename = "duration")]
    pub duration_seconds: u32,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry managed from the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: Option<String>,
    pub stock: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of a product create request
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ProductInput {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_price(self.price)?;
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }
}

/// Body of a product update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub active: Option<bool>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }

    pub(crate) fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(active) = self.active {
            product.active = active;
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("product name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::Validation(format!(
            "product price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> Result<()> {
    if stock < 0 {
        return Err(Error::Validation(format!(
            "product stock must not be negative, got {}",
            stock
        )));
    }
    Ok(())
}

/// Frequently asked question shown to callers' assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaqInput {
    pub question: String,
    pub answer: String,
}

impl FaqInput {
    pub fn validate(&self) -> Result<()> {
        validate_faq_text("question", &self.question)?;
        validate_faq_text("answer", &self.answer)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl FaqPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(question) = &self.question {
            validate_faq_text("question", question)?;
        }
        if let Some(answer) = &self.answer {
            validate_faq_text("answer", answer)?;
        }
        Ok(())
    }
}

fn validate_faq_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("FAQ {} must not be empty", field)));
    }
    Ok(())
}

/// Fulfilment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// Line item of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// A placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub payment_intent_id: Option<String>,
    pub status: OrderStatus,
    pub confirmation_number: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// WhatsApp confirmation text sent to the customer
    pub fn confirmation_message(&self) -> String {
        let items = self
            .items
            .iter()
            .map(|item| format!("{} x{}", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Order Confirmed!\nConfirmation #: {}\nTotal: ${}\nItems: {}\nThank you for your order!",
            self.confirmation_number, self.total, items
        )
    }
}

/// Everything needed to insert an order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub payment_intent_id: Option<String>,
    pub status: OrderStatus,
}

impl NewOrder {
    pub fn validate(&self) -> Result<()> {
        if self.customer_phone.trim().is_empty() {
            return Err(Error::Validation("customer phone must not be empty".to_string()));
        }
        if self.items.is_empty() {
            return Err(Error::Validation("an order needs at least one item".to_string()));
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity == 0) {
            return Err(Error::Validation(format!(
                "item {} has a zero quantity",
                item.name
            )));
        }
        if !self.total.is_finite() || self.total < 0.0 {
            return Err(Error::Validation(format!(
                "order total must be a non-negative number, got {}",
                self.total
            )));
        }
        Ok(())
    }
}

/// Dashboard summary numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_calls: u64,
    pub total_orders: u64,
    pub total_revenue: f64,
    /// Mean call duration in seconds, rounded
    pub avg_call_duration: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(items: Vec<OrderItem>, total: f64) -> Order {
        Order {
            id: 1,
            customer_phone: "+15551234567".to_string(),
            items,
            total,
            payment_intent_id: None,
            status: OrderStatus::Confirmed,
            confirmation_number: "ORD-1700000000000".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_call_status_round_trip_strings() {
        for status in [CallStatus::Answered, CallStatus::Missed, CallStatus::Busy] {
            assert_eq!(status.as_str().parse::<CallStatus>().unwrap(), status);
        }
        assert!("ringing".parse::<CallStatus>().is_err());
    }

    #[test]
    fn test_call_record_serializes_duration_name() {
        let record = CallRecord {
            id: 1,
            call_sid: "CA123".to_string(),
            caller_number: "+15551234567".to_string(),
            status: CallStatus::Answered,
            transcript: None,
            ai_response: None,
            duration_seconds: 0,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["duration"], 0);
        assert_eq!(json["status"], "answered");
        assert!(json["transcript"].is_null());
    }

    #[test]
    fn test_confirmation_message() {
        let order = order(
            vec![
                OrderItem { name: "Bagel".to_string(), quantity: 2, price: Some(1.5) },
                OrderItem { name: "Coffee".to_string(), quantity: 1, price: None },
            ],
            5.5,
        );
        assert_eq!(
            order.confirmation_message(),
            "Order Confirmed!\nConfirmation #: ORD-1700000000000\nTotal: $5.5\n\
             Items: Bagel x2, Coffee x1\nThank you for your order!"
        );
    }

    #[test]
    fn test_product_input_validation() {
        let input: ProductInput =
            serde_json::from_value(serde_json::json!({"name": "Bagel", "price": 1.5})).unwrap();
        assert!(input.validate().is_ok());

        let input: ProductInput =
            serde_json::from_value(serde_json::json!({"name": " ", "price": 1.5})).unwrap();
        assert!(matches!(input.validate(), Err(Error::Validation(_))));

        let input: ProductInput =
            serde_json::from_value(serde_json::json!({"name": "Bagel", "price": -1.0})).unwrap();
        assert!(input.validate().is_err());

        let unknown = serde_json::from_value::<ProductInput>(
            serde_json::json!({"name": "Bagel", "price": 1.0, "sku": "B1"}),
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn test_new_order_validation() {
        let mut new_order = NewOrder {
            customer_phone: "+15551234567".to_string(),
            items: vec![OrderItem { name: "Bagel".to_string(), quantity: 1, price: None }],
            total: 1.5,
            payment_intent_id: None,
            status: OrderStatus::Confirmed,
        };
        assert!(new_order.validate().is_ok());

        new_order.items[0].quantity = 0;
        assert!(new_order.validate().is_err());

        new_order.items.clear();
        assert!(new_order.validate().is_err());
    }

    #[test]
    fn test_stats_camel_case() {
        let stats = Stats {
            total_calls: 2,
            total_orders: 1,
            total_revenue: 10.0,
            avg_call_duration: 30,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalCalls"], 2);
        assert_eq!(json["avgCallDuration"], 30);
    }
}
