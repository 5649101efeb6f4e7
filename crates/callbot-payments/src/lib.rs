//! callbot-payments: payment intents over the Stripe REST API

pub mod client;
pub mod error;
pub mod models;

pub use client::{PaymentGateway, StripeClient};
pub use error::{PaymentsError, Result};
pub use models::{PaymentIntent, PaymentIntentRequest};
