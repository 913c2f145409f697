//! ap2-schemas
//!
//! Data contracts shared across the workspace: catalog products, the payment
//! result shape every rail adapter must produce, and the coarse risk scale.
//!
//! Field names on the wire follow the external collaborators (camelCase for
//! the payment result, SCREAMING_SNAKE_CASE for enum values).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod money;

pub use money::{amount_to_micros, format_amount, micros_to_amount, PricingError, MICROS_PER_UNIT};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// One catalog record. Read-only input to the checkout flow.
///
/// `price` is the wire representation; use [`Product::price_micros`] before
/// any arithmetic or comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub specs: String,
    pub image: String,
    pub price: f64,
    pub currency: String,
}

impl Product {
    pub fn price_micros(&self) -> Result<i64, PricingError> {
        amount_to_micros(self.price)
    }

    /// Order description used when issuing a mandate for this product.
    pub fn order_description(&self) -> String {
        format!("Order {}", self.title)
    }
}

/// The person placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopperProfile {
    pub name: String,
    pub shipping_address: String,
}

impl Default for ShopperProfile {
    fn default() -> Self {
        Self {
            name: "Aamir Al Harthy".to_string(),
            shipping_address: "Apartment 21B, Downtown Tower, Dubai, UAE".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Risk scale
// ---------------------------------------------------------------------------

/// Coarse transaction risk classification. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskScore {
    Low,
    Medium,
    High,
}

impl RiskScore {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskScore::Low => "LOW",
            RiskScore::Medium => "MEDIUM",
            RiskScore::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payment result (rail adapter boundary)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentStatus::Success)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal contract any payment-rail adapter must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub rail: String,
    pub settlement_time: DateTime<Utc>,
}

impl PaymentResult {
    /// Full response payload as JSON, as carried inside the audit trail.
    pub fn to_payload(&self) -> serde_json::Value {
        // Serializing a plain struct of strings/enums/timestamps cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
