//! Core pricing calculation functions.
//!
//! Pure functions for tariff math - no store access. Every function here is
//! deterministic in its inputs so quotes can be recomputed on each edit.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

use crate::pricing::rates::{FareTier, Rates};

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use travelops_engine::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Vehicle cost of one day bucket: kilometres at the per-km rate plus a
/// single night charge, however many segments the day has.
pub fn day_vehicle_cost(distance_km: Decimal, rates: &Rates) -> Decimal {
    distance_km.max(Decimal::ZERO) * rates.per_km + rates.night_charge
}

/// Price a short point-to-point transfer on the distance staircase.
///
/// The distance is consumed tier by tier in ascending order. Each tier adds
/// its base, its per-km rate on the kilometres that fall inside it, and its
/// per-minute rate on the share of `duration_minutes` proportional to those
/// kilometres. A distance sitting exactly on a ceiling never reaches the
/// next tier. Distance beyond a bounded last tier keeps that tier's per-km
/// and per-minute rates.
///
/// The sum is unrounded; round only what is presented.
pub fn city_segment_cost(distance_km: Decimal, duration_minutes: Decimal, tiers: &[FareTier]) -> Decimal {
    if distance_km <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let duration = duration_minutes.max(Decimal::ZERO);

    let mut consumed = Decimal::ZERO;
    let mut total = Decimal::ZERO;

    for tier in tiers {
        if consumed >= distance_km {
            break;
        }
        let ceiling = tier.up_to_km.map_or(distance_km, |up_to| up_to.min(distance_km));
        let km = ceiling - consumed;
        if km <= Decimal::ZERO {
            continue;
        }

        let minutes = duration * km / distance_km;
        total += tier.base + km * tier.per_km + minutes * tier.per_minute;
        consumed = ceiling;
    }

    if let Some(last) = tiers.last() {
        let km = distance_km - consumed;
        if km > Decimal::ZERO {
            let minutes = duration * km / distance_km;
            total += km * last.per_km + minutes * last.per_minute;
        }
    }

    total
}
