//! Routes as ordered segments

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One hop between two consecutive points of a route.
///
/// Amounts deserialize from either JSON strings or numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub from: String,
    pub to: String,
    pub distance_km: Decimal,
    pub duration_minutes: Decimal,
    /// Fare typed in by an operator for shared rides on this hop.
    #[serde(default)]
    pub shared_fare: Option<Decimal>,
}

/// Row in routes. Segments are stored as a JSON array on the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub segments: Vec<RouteSegment>,
}
