//! Static rate tables.
//!
//! Per-km rates, night charges and carrier surcharges per vehicle category,
//! plus the distance staircase used for short city transfers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{AcType, VehicleCategory, VehicleModel};

/// Whether the vehicle returns empty (one way) or carries passengers back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripWay {
    OneWay,
    TwoWay,
}

impl TripWay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripWay::OneWay => "one_way",
            TripWay::TwoWay => "two_way",
        }
    }
}

/// Which screen the price is computed for. The two use different carrier
/// constants and only route pricing distinguishes one-way trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingContext {
    Package,
    Route(TripWay),
}

/// AC rates for one category; Non AC subtracts `RateTable::non_ac_discount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRates {
    pub two_way_per_km: Decimal,
    pub one_way_per_km: Decimal,
    pub night_charge: Decimal,
}

/// Carrier surcharge, charged once per quote when the vehicle has a carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierCharges {
    pub small: Decimal,
    /// Medium, large and extra large.
    pub standard: Decimal,
    pub fallback: Decimal,
}

/// One step of the city transfer staircase. Covers the distance from the
/// previous tier's ceiling up to `up_to_km` (unbounded when `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareTier {
    pub up_to_km: Option<Decimal>,
    /// Charged once when the ride reaches this tier.
    pub base: Decimal,
    pub per_km: Decimal,
    pub per_minute: Decimal,
}

/// Rates resolved for one vehicle in one pricing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rates {
    pub per_km: Decimal,
    pub night_charge: Decimal,
    pub carrier_charge: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub small: CategoryRates,
    /// Medium, large and extra large share one table.
    pub standard: CategoryRates,
    /// Unrecognised categories. Never zero.
    pub fallback: CategoryRates,
    pub non_ac_discount: Decimal,
    pub package_carrier: CarrierCharges,
    pub route_carrier: CarrierCharges,
    /// Ordered by ascending ceiling. Distance past a bounded last tier is
    /// charged at that tier's rates.
    pub city_tiers: Vec<FareTier>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            small: CategoryRates {
                two_way_per_km: dec!(16),
                one_way_per_km: dec!(26),
                night_charge: dec!(500),
            },
            standard: CategoryRates {
                two_way_per_km: dec!(18.5),
                one_way_per_km: dec!(30),
                night_charge: dec!(600),
            },
            fallback: CategoryRates {
                two_way_per_km: dec!(16),
                one_way_per_km: dec!(26),
                night_charge: dec!(500),
            },
            non_ac_discount: dec!(1.5),
            package_carrier: CarrierCharges {
                small: dec!(200),
                standard: dec!(250),
                fallback: dec!(200),
            },
            route_carrier: CarrierCharges {
                small: dec!(200),
                standard: dec!(200),
                fallback: dec!(200),
            },
            city_tiers: default_city_tiers(),
        }
    }
}

/// Short hops pay a flag fare and a steep per-minute rate; long hops taper
/// to a flat per-km rate.
fn default_city_tiers() -> Vec<FareTier> {
    let tier = |up_to_km: Option<Decimal>, base, per_km, per_minute| FareTier {
        up_to_km,
        base,
        per_km,
        per_minute,
    };
    vec![
        tier(Some(dec!(1)), dec!(40), dec!(0), dec!(2)),
        tier(Some(dec!(5)), dec!(0), dec!(20), dec!(1.5)),
        tier(Some(dec!(15)), dec!(0), dec!(18), dec!(1.25)),
        tier(Some(dec!(25)), dec!(0), dec!(16), dec!(1)),
        tier(Some(dec!(50)), dec!(0), dec!(15), dec!(0.75)),
        tier(Some(dec!(100)), dec!(0), dec!(14), dec!(0.5)),
        tier(Some(dec!(250)), dec!(0), dec!(13), dec!(0.25)),
        tier(None, dec!(0), dec!(12), dec!(0)),
    ]
}

impl RateTable {
    /// Resolve per-km, night and carrier charges for a vehicle class.
    pub fn resolve(
        &self,
        category: &VehicleCategory,
        ac_type: AcType,
        has_carrier: bool,
        context: PricingContext,
    ) -> Rates {
        let carriers = match context {
            PricingContext::Package => &self.package_carrier,
            PricingContext::Route(_) => &self.route_carrier,
        };

        let (table, carrier, discountable) = match category {
            VehicleCategory::Small => (&self.small, carriers.small, true),
            VehicleCategory::Medium | VehicleCategory::Large | VehicleCategory::ExtraLarge => {
                (&self.standard, carriers.standard, true)
            }
            VehicleCategory::Other(_) => (&self.fallback, carriers.fallback, false),
        };

        let base_per_km = match context {
            PricingContext::Route(TripWay::OneWay) => table.one_way_per_km,
            PricingContext::Route(TripWay::TwoWay) | PricingContext::Package => {
                table.two_way_per_km
            }
        };

        let per_km = if discountable && ac_type == AcType::NonAc {
            base_per_km - self.non_ac_discount
        } else {
            base_per_km
        };

        Rates {
            per_km,
            night_charge: table.night_charge,
            carrier_charge: if has_carrier { carrier } else { Decimal::ZERO },
        }
    }

    /// Shorthand for [`RateTable::resolve`] on a stored vehicle model.
    pub fn resolve_for(&self, vehicle: &VehicleModel, context: PricingContext) -> Rates {
        self.resolve(&vehicle.category, vehicle.ac_type, vehicle.has_carrier, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_package_rates() {
        let table = RateTable::default();
        let ac = table.resolve(&VehicleCategory::Small, AcType::Ac, true, PricingContext::Package);
        assert_eq!(ac.per_km, dec!(16));
        assert_eq!(ac.night_charge, dec!(500));
        assert_eq!(ac.carrier_charge, dec!(200));

        let non_ac = table.resolve(&VehicleCategory::Small, AcType::NonAc, false, PricingContext::Package);
        assert_eq!(non_ac.per_km, dec!(14.5));
        assert_eq!(non_ac.carrier_charge, dec!(0));
    }

    #[test]
    fn test_standard_categories_share_rates() {
        let table = RateTable::default();
        for category in [VehicleCategory::Medium, VehicleCategory::Large, VehicleCategory::ExtraLarge] {
            let rates = table.resolve(&category, AcType::Ac, true, PricingContext::Package);
            assert_eq!(rates.per_km, dec!(18.5));
            assert_eq!(rates.night_charge, dec!(600));
            assert_eq!(rates.carrier_charge, dec!(250));

            let non_ac = table.resolve(&category, AcType::NonAc, false, PricingContext::Package);
            assert_eq!(non_ac.per_km, dec!(17));
        }
    }

    #[test]
    fn test_carrier_constant_differs_between_contexts() {
        let table = RateTable::default();
        let package = table.resolve(&VehicleCategory::Large, AcType::Ac, true, PricingContext::Package);
        let route = table.resolve(
            &VehicleCategory::Large,
            AcType::Ac,
            true,
            PricingContext::Route(TripWay::TwoWay),
        );
        assert_eq!(package.carrier_charge, dec!(250));
        assert_eq!(route.carrier_charge, dec!(200));
    }

    #[test]
    fn test_one_way_rates_include_empty_return() {
        let table = RateTable::default();
        let one_way = PricingContext::Route(TripWay::OneWay);
        assert_eq!(table.resolve(&VehicleCategory::Small, AcType::Ac, false, one_way).per_km, dec!(26));
        assert_eq!(table.resolve(&VehicleCategory::Medium, AcType::Ac, false, one_way).per_km, dec!(30));
        assert_eq!(table.resolve(&VehicleCategory::Medium, AcType::NonAc, false, one_way).per_km, dec!(28.5));
        assert_eq!(table.resolve(&VehicleCategory::Small, AcType::NonAc, false, one_way).per_km, dec!(24.5));
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let table = RateTable::default();
        let category = VehicleCategory::Other("bus".to_string());
        let rates = table.resolve(&category, AcType::NonAc, true, PricingContext::Package);
        assert_eq!(rates.per_km, dec!(16));
        assert_eq!(rates.night_charge, dec!(500));
        assert_eq!(rates.carrier_charge, dec!(200));
    }

    #[test]
    fn test_default_staircase_is_ascending_and_open_ended() {
        let tiers = RateTable::default().city_tiers;
        let ceilings: Vec<Decimal> = tiers.iter().filter_map(|t| t.up_to_km).collect();
        assert_eq!(
            ceilings,
            vec![dec!(1), dec!(5), dec!(15), dec!(25), dec!(50), dec!(100), dec!(250)]
        );
        assert!(tiers.last().map(|t| t.up_to_km.is_none()).unwrap_or(false));
    }
}
