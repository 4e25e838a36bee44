//! Standalone route pricing for one-off trips.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{PricingSnapshot, RouteSegment, VehicleModel};
use crate::pricing::rates::{PricingContext, RateTable, TripWay};
use crate::pricing::requests::RouteQuoteRequest;
use crate::pricing::responses::{RoutePricing, SegmentPrice};

/// Price a whole route as a single day's hire.
///
/// Total is driven kilometres at the one-way or two-way rate, one night
/// charge and the route carrier charge. Shared-ride fares typed in on
/// segments are reported alongside but do not change the hire price.
pub fn price_route(
    segments: &[RouteSegment],
    vehicle: &VehicleModel,
    trip_way: TripWay,
    rate_table: &RateTable,
    currency: &str,
) -> RoutePricing {
    let rates = rate_table.resolve_for(vehicle, PricingContext::Route(trip_way));

    let priced: Vec<SegmentPrice> = segments
        .iter()
        .map(|segment| {
            let distance_km = segment.distance_km.max(Decimal::ZERO);
            SegmentPrice {
                from: segment.from.clone(),
                to: segment.to.clone(),
                distance_km,
                duration_minutes: segment.duration_minutes.max(Decimal::ZERO),
                vehicle_cost: distance_km * rates.per_km,
                shared_fare: segment.shared_fare,
            }
        })
        .collect();

    let total_distance_km: Decimal = priced.iter().map(|s| s.distance_km).sum();
    let total_duration_minutes: Decimal = priced.iter().map(|s| s.duration_minutes).sum();
    let vehicle_cost: Decimal = priced.iter().map(|s| s.vehicle_cost).sum();
    let shared_fare_total: Decimal = priced.iter().filter_map(|s| s.shared_fare).sum();

    RoutePricing {
        currency: currency.to_string(),
        trip_way,
        per_km: rates.per_km,
        segments: priced,
        total_distance_km,
        total_duration_minutes,
        vehicle_cost,
        night_charge: rates.night_charge,
        carrier_charge: rates.carrier_charge,
        shared_fare_total,
        total_price: vehicle_cost + rates.night_charge + rates.carrier_charge,
    }
}

/// Build the pricing_calculations row for a computed route quote.
pub fn snapshot_for(request: &RouteQuoteRequest, pricing: &RoutePricing) -> Result<PricingSnapshot> {
    let breakdown = serde_json::to_value(pricing).map_err(EngineError::Breakdown)?;
    Ok(PricingSnapshot {
        id: Uuid::new_v4(),
        route_id: request.route_id,
        vehicle_model_id: request.vehicle_model_id,
        trip_way: request.trip_way.as_str().to_string(),
        total_distance_km: pricing.total_distance_km,
        total_price: pricing.total_price,
        currency: pricing.currency.clone(),
        breakdown,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcType, VehicleCategory};
    use rust_decimal_macros::dec;

    fn segment(from: &str, to: &str, km: Decimal, shared_fare: Option<Decimal>) -> RouteSegment {
        RouteSegment {
            from: from.to_string(),
            to: to.to_string(),
            distance_km: km,
            duration_minutes: km * dec!(2),
            shared_fare,
        }
    }

    fn vehicle(category: VehicleCategory, ac_type: AcType, has_carrier: bool) -> VehicleModel {
        VehicleModel {
            id: Uuid::new_v4(),
            name: "Innova".to_string(),
            category,
            ac_type,
            has_carrier,
        }
    }

    #[test]
    fn test_two_way_route_total() {
        let segments = vec![
            segment("Udaipur", "Nathdwara", dec!(48), None),
            segment("Nathdwara", "Kumbhalgarh", dec!(52), None),
        ];
        let vehicle = vehicle(VehicleCategory::Medium, AcType::Ac, true);
        let pricing = price_route(&segments, &vehicle, TripWay::TwoWay, &RateTable::default(), "INR");

        assert_eq!(pricing.total_distance_km, dec!(100));
        assert_eq!(pricing.per_km, dec!(18.5));
        assert_eq!(pricing.vehicle_cost, dec!(1850));
        assert_eq!(pricing.night_charge, dec!(600));
        assert_eq!(pricing.carrier_charge, dec!(200));
        assert_eq!(pricing.total_price, dec!(2650));
        assert_eq!(pricing.segments[1].vehicle_cost, dec!(962));
    }

    #[test]
    fn test_one_way_non_ac_route() {
        let segments = vec![segment("Jaipur", "Ajmer", dec!(10), None)];
        let vehicle = vehicle(VehicleCategory::Small, AcType::NonAc, false);
        let pricing = price_route(&segments, &vehicle, TripWay::OneWay, &RateTable::default(), "INR");
        assert_eq!(pricing.per_km, dec!(24.5));
        assert_eq!(pricing.total_price, dec!(245) + dec!(500));
    }

    #[test]
    fn test_shared_fares_reported_separately() {
        let segments = vec![
            segment("A", "B", dec!(5), Some(dec!(120))),
            segment("B", "C", dec!(5), None),
            segment("C", "D", dec!(5), Some(dec!(80))),
        ];
        let vehicle = vehicle(VehicleCategory::Small, AcType::Ac, false);
        let pricing = price_route(&segments, &vehicle, TripWay::TwoWay, &RateTable::default(), "INR");
        assert_eq!(pricing.shared_fare_total, dec!(200));
        assert_eq!(pricing.total_price, dec!(15) * dec!(16) + dec!(500));
    }

    #[test]
    fn test_snapshot_carries_totals() {
        let request = RouteQuoteRequest {
            route_id: Some(Uuid::new_v4()),
            vehicle_model_id: Uuid::new_v4(),
            trip_way: TripWay::OneWay,
            segments: vec![segment("A", "B", dec!(3), None)],
        };
        let vehicle = vehicle(VehicleCategory::Small, AcType::Ac, false);
        let pricing = price_route(&request.segments, &vehicle, request.trip_way, &RateTable::default(), "INR");
        let snapshot = snapshot_for(&request, &pricing).unwrap();
        assert!(snapshot.breakdown.is_object());
        assert_eq!(snapshot.trip_way, "one_way");
        assert_eq!(snapshot.total_price, pricing.total_price);
        assert_eq!(snapshot.route_id, request.route_id);
        assert_eq!(snapshot.breakdown["total_price"], serde_json::json!("578"));
    }
}
