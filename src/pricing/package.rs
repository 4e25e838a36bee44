//! Multi-day package pricing.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{AddOn, Hotel, Sightseeing, VehicleModel};
use crate::pricing::calculators::day_vehicle_cost;
use crate::pricing::rates::{PricingContext, RateTable};
use crate::pricing::requests::{DayPlan, LegTable, PackageQuoteRequest, PointSelection};
use crate::pricing::responses::{DayBreakdown, PricingResult};

/// Catalog records a package refers to, loaded before pricing.
#[derive(Debug, Clone, Default)]
pub struct PricingCatalog {
    pub sightseeing: HashMap<Uuid, Sightseeing>,
    pub hotels: HashMap<Uuid, Hotel>,
    pub add_ons: HashMap<Uuid, AddOn>,
}

impl PricingCatalog {
    pub fn new(sightseeing: Vec<Sightseeing>, hotels: Vec<Hotel>, add_ons: Vec<AddOn>) -> Self {
        Self {
            sightseeing: sightseeing.into_iter().map(|s| (s.id, s)).collect(),
            hotels: hotels.into_iter().map(|h| (h.id, h)).collect(),
            add_ons: add_ons.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    // Stale ids price at zero.

    fn sightseeing_fee(&self, id: Uuid) -> Decimal {
        match self.sightseeing.get(&id) {
            Some(s) => s.fee(),
            None => {
                tracing::debug!("Sightseeing {} no longer resolves, pricing at zero", id);
                Decimal::ZERO
            }
        }
    }

    fn hotel_price(&self, id: Uuid) -> Decimal {
        match self.hotels.get(&id) {
            Some(h) => h.manual_price,
            None => {
                tracing::debug!("Hotel {} no longer resolves, pricing at zero", id);
                Decimal::ZERO
            }
        }
    }

    fn add_on_price(&self, id: Uuid) -> Decimal {
        match self.add_ons.get(&id) {
            Some(a) => a.price,
            None => {
                tracing::debug!("Add-on {} no longer resolves, pricing at zero", id);
                Decimal::ZERO
            }
        }
    }
}

/// Price a package from its days, vehicle and add-ons.
///
/// Each day costs its driven kilometres at the vehicle's package rate plus
/// one night charge, plus sightseeing fees, hotel prices and point add-ons
/// finalized on that day. The carrier charge and package-level add-ons are
/// added once on top.
pub fn compute_package_price(
    request: &PackageQuoteRequest,
    vehicle: &VehicleModel,
    catalog: &PricingCatalog,
    rate_table: &RateTable,
    currency: &str,
) -> PricingResult {
    let rates = rate_table.resolve_for(vehicle, PricingContext::Package);

    let days: Vec<DayBreakdown> = request
        .days
        .iter()
        .map(|day| price_day(day, &request.legs, catalog, |km| day_vehicle_cost(km, &rates)))
        .collect();

    let vehicle_total: Decimal = days.iter().map(|d| d.vehicle_cost).sum();
    let sightseeing_total: Decimal = days.iter().map(|d| d.sightseeing_cost).sum();
    let hotel_total: Decimal = days.iter().map(|d| d.hotel_cost).sum();
    let point_add_ons: Decimal = days.iter().map(|d| d.add_on_cost).sum();
    let package_add_ons: Decimal = request
        .add_on_ids
        .iter()
        .map(|id| catalog.add_on_price(*id))
        .sum();
    let add_on_total = point_add_ons + package_add_ons;

    let total_price =
        vehicle_total + sightseeing_total + hotel_total + rates.carrier_charge + add_on_total;

    PricingResult {
        currency: currency.to_string(),
        days,
        vehicle_total,
        sightseeing_total,
        hotel_total,
        carrier_charge: rates.carrier_charge,
        add_on_total,
        total_price,
    }
}

fn price_day<F>(day: &DayPlan, legs: &LegTable, catalog: &PricingCatalog, vehicle_cost: F) -> DayBreakdown
where
    F: Fn(Decimal) -> Decimal,
{
    let distance_km = day.travelled_km(legs);

    let mut sightseeing_cost = Decimal::ZERO;
    let mut hotel_cost = Decimal::ZERO;
    let mut add_on_cost = Decimal::ZERO;

    for selection in day.active_selections() {
        match selection {
            PointSelection::Sightseeing(id) => sightseeing_cost += catalog.sightseeing_fee(*id),
            PointSelection::Hotel(id) => hotel_cost += catalog.hotel_price(*id),
            PointSelection::Other(ids) => {
                add_on_cost += ids.iter().map(|id| catalog.add_on_price(*id)).sum::<Decimal>()
            }
            PointSelection::Unset => {}
        }
    }

    let vehicle_cost = vehicle_cost(distance_km);

    DayBreakdown {
        day_number: day.day_number,
        distance_km,
        vehicle_cost,
        sightseeing_cost,
        hotel_cost,
        add_on_cost,
        total: vehicle_cost + sightseeing_cost + hotel_cost + add_on_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcType, VehicleCategory};
    use crate::pricing::requests::DayPoint;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn vehicle(category: VehicleCategory, has_carrier: bool) -> VehicleModel {
        VehicleModel {
            id: Uuid::new_v4(),
            name: "Dzire".to_string(),
            category,
            ac_type: AcType::Ac,
            has_carrier,
        }
    }

    fn points(n: usize) -> Vec<DayPoint> {
        (0..n)
            .map(|_| DayPoint {
                id: Uuid::new_v4(),
                selected: true,
            })
            .collect()
    }

    fn add_on(price: Decimal) -> AddOn {
        AddOn {
            id: Uuid::new_v4(),
            name: "Add-on".to_string(),
            price,
        }
    }

    fn one_day_request(vehicle_id: Uuid) -> PackageQuoteRequest {
        let day_points = points(3);
        let legs = LegTable::new()
            .with_leg(day_points[0].id, day_points[1].id, dec!(10))
            .with_leg(day_points[1].id, day_points[2].id, dec!(5));
        PackageQuoteRequest {
            vehicle_model_id: vehicle_id,
            days: vec![DayPlan {
                day_number: 1,
                points: day_points,
                selections: BTreeMap::new(),
            }],
            legs,
            add_on_ids: vec![],
        }
    }

    #[test]
    fn test_one_night_charge_per_day_not_per_segment() {
        let vehicle = vehicle(VehicleCategory::Small, false);
        let request = one_day_request(vehicle.id);
        let result = compute_package_price(
            &request,
            &vehicle,
            &PricingCatalog::default(),
            &RateTable::default(),
            "INR",
        );
        assert_eq!(result.days.len(), 1);
        assert_eq!(result.days[0].distance_km, dec!(15));
        assert_eq!(result.days[0].vehicle_cost, dec!(740));
        assert_eq!(result.total_price, dec!(740));
        assert_eq!(result.currency, "INR");
    }

    #[test]
    fn test_carrier_charged_once_and_add_ons_summed() {
        let vehicle = vehicle(VehicleCategory::Small, true);
        let mut request = one_day_request(vehicle.id);
        // Second day, no travel
        request.days.push(DayPlan {
            day_number: 2,
            points: points(1),
            selections: BTreeMap::new(),
        });
        let (cheap, dear) = (add_on(dec!(100)), add_on(dec!(250)));
        request.add_on_ids = vec![cheap.id, dear.id];
        let catalog = PricingCatalog::new(vec![], vec![], vec![cheap, dear]);

        let result = compute_package_price(&request, &vehicle, &catalog, &RateTable::default(), "INR");

        assert_eq!(result.carrier_charge, dec!(200));
        assert_eq!(result.add_on_total, dec!(350));
        assert_eq!(result.vehicle_total, dec!(740) + dec!(500));
        assert_eq!(result.total_price, dec!(1240) + dec!(200) + dec!(350));
    }

    #[test]
    fn test_day_selections_fold_into_day_totals() {
        let vehicle = vehicle(VehicleCategory::Medium, false);
        let day_points = points(3);
        let fort = Sightseeing {
            id: Uuid::new_v4(),
            name: "Fort".to_string(),
            adult_fee: dec!(300),
            child_fee: dec!(150),
        };
        let hotel = Hotel {
            id: Uuid::new_v4(),
            name: "Lake View".to_string(),
            manual_price: dec!(2500),
        };
        let boat = add_on(dec!(400));

        let mut selections = BTreeMap::new();
        selections.insert(day_points[0].id, PointSelection::Sightseeing(fort.id));
        selections.insert(day_points[1].id, PointSelection::Other(vec![boat.id]));
        selections.insert(day_points[2].id, PointSelection::Hotel(hotel.id));

        let request = PackageQuoteRequest {
            vehicle_model_id: vehicle.id,
            days: vec![DayPlan {
                day_number: 1,
                points: day_points,
                selections,
            }],
            legs: LegTable::new(),
            add_on_ids: vec![],
        };
        let catalog = PricingCatalog::new(vec![fort], vec![hotel], vec![boat]);

        let result = compute_package_price(&request, &vehicle, &catalog, &RateTable::default(), "INR");
        let day = &result.days[0];
        assert_eq!(day.vehicle_cost, dec!(600));
        assert_eq!(day.sightseeing_cost, dec!(450));
        assert_eq!(day.hotel_cost, dec!(2500));
        assert_eq!(day.add_on_cost, dec!(400));
        assert_eq!(day.total, dec!(3950));
        assert_eq!(result.add_on_total, dec!(400));
        assert_eq!(result.total_price, dec!(3950));
    }

    #[test]
    fn test_stale_references_price_at_zero() {
        let vehicle = vehicle(VehicleCategory::Small, false);
        let day_points = points(2);
        let mut selections = BTreeMap::new();
        selections.insert(day_points[0].id, PointSelection::Sightseeing(Uuid::new_v4()));
        selections.insert(day_points[1].id, PointSelection::Hotel(Uuid::new_v4()));
        let request = PackageQuoteRequest {
            vehicle_model_id: vehicle.id,
            days: vec![DayPlan {
                day_number: 1,
                points: day_points,
                selections,
            }],
            legs: LegTable::new(),
            add_on_ids: vec![Uuid::new_v4()],
        };

        let result = compute_package_price(
            &request,
            &vehicle,
            &PricingCatalog::default(),
            &RateTable::default(),
            "INR",
        );
        assert_eq!(result.sightseeing_total, dec!(0));
        assert_eq!(result.hotel_total, dec!(0));
        assert_eq!(result.add_on_total, dec!(0));
        assert_eq!(result.total_price, dec!(500));
    }

    #[test]
    fn test_recomputation_is_identical() {
        let vehicle = vehicle(VehicleCategory::Large, true);
        let mut request = one_day_request(vehicle.id);
        let extra = add_on(dec!(99.99));
        request.add_on_ids = vec![extra.id];
        let catalog = PricingCatalog::new(vec![], vec![], vec![extra]);
        let table = RateTable::default();

        let first = compute_package_price(&request, &vehicle, &catalog, &table, "INR");
        let _other = compute_package_price(
            &one_day_request(vehicle.id),
            &vehicle,
            &PricingCatalog::default(),
            &table,
            "INR",
        );
        let second = compute_package_price(&request, &vehicle, &catalog, &table, "INR");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
