//! Pricing results. Derived values, always recomputed from current inputs.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::rates::TripWay;

/// Cost of one day of a package
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBreakdown {
    pub day_number: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_km: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub vehicle_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sightseeing_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub hotel_cost: Decimal,
    /// Add-ons attached to points of this day.
    #[serde(with = "rust_decimal::serde::str")]
    pub add_on_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

/// Result of package pricing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingResult {
    pub currency: String,
    pub days: Vec<DayBreakdown>,
    #[serde(with = "rust_decimal::serde::str")]
    pub vehicle_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sightseeing_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub hotel_total: Decimal,
    /// Charged once per package, not per day.
    #[serde(with = "rust_decimal::serde::str")]
    pub carrier_charge: Decimal,
    /// Package-level plus point-level add-ons.
    #[serde(with = "rust_decimal::serde::str")]
    pub add_on_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
}

/// Price of one hop of a standalone route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentPrice {
    pub from: String,
    pub to: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub distance_km: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub duration_minutes: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub vehicle_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub shared_fare: Option<Decimal>,
}

/// Result of standalone route pricing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePricing {
    pub currency: String,
    pub trip_way: TripWay,
    #[serde(with = "rust_decimal::serde::str")]
    pub per_km: Decimal,
    pub segments: Vec<SegmentPrice>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_distance_km: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_duration_minutes: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub vehicle_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub night_charge: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub carrier_charge: Decimal,
    /// Sum of operator-entered shared-ride fares; informational, not part of
    /// `total_price`.
    #[serde(with = "rust_decimal::serde::str")]
    pub shared_fare_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
}
