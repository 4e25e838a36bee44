//! Priced catalog records folded into package quotes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sightseeing {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub adult_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub child_fee: Decimal,
}

impl Sightseeing {
    /// Fee charged per finalized selection.
    pub fn fee(&self) -> Decimal {
        self.adult_fee + self.child_fee
    }
}

/// Row in hotels_model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub manual_price: Decimal,
}

/// Row in add_ons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

/// Row written to pricing_calculations when an operator saves a route quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub id: Uuid,
    pub route_id: Option<Uuid>,
    pub vehicle_model_id: Uuid,
    pub trip_way: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_distance_km: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub currency: String,
    pub breakdown: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
