//! Pricing service functions with store access.
//!
//! These functions load the vehicle model and catalog records a quote refers
//! to, then hand them to the pure calculators in `package` and `route`.

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::{EngineError, Result};
use crate::models::{PricingSnapshot, VehicleModel};
use crate::store::BookingStore;

use super::calculators::{city_segment_cost, round_money};
use super::package::{compute_package_price, PricingCatalog};
use super::rates::RateTable;
use super::requests::{PackageQuoteRequest, RouteQuoteRequest};
use super::responses::{PricingResult, RoutePricing};

async fn load_vehicle_model<S>(store: &S, cache: &AppCache, id: Uuid) -> Result<VehicleModel>
where
    S: BookingStore + ?Sized,
{
    cache
        .vehicle_model(store, id)
        .await
        .map_err(EngineError::store("load vehicle model"))?
        .map(|model| (*model).clone())
        .ok_or(EngineError::VehicleModelNotFound(id))
}

/// Load every sightseeing, hotel and add-on record a package refers to.
///
/// Three batched lookups regardless of how many days the package has.
pub async fn load_catalog<S>(store: &S, request: &PackageQuoteRequest) -> Result<PricingCatalog>
where
    S: BookingStore + ?Sized,
{
    let sightseeing_ids = request.sightseeing_ids();
    let sightseeing = if sightseeing_ids.is_empty() {
        Vec::new()
    } else {
        store
            .sightseeing(&sightseeing_ids)
            .await
            .map_err(EngineError::store("load sightseeing"))?
    };

    let hotel_ids = request.hotel_ids();
    let hotels = if hotel_ids.is_empty() {
        Vec::new()
    } else {
        store.hotels(&hotel_ids).await.map_err(EngineError::store("load hotels"))?
    };

    let add_on_ids = request.all_add_on_ids();
    let add_ons = if add_on_ids.is_empty() {
        Vec::new()
    } else {
        store.add_ons(&add_on_ids).await.map_err(EngineError::store("load add-ons"))?
    };

    debug!(
        "Loaded catalog: {} sightseeing, {} hotels, {} add-ons",
        sightseeing.len(),
        hotels.len(),
        add_ons.len()
    );
    Ok(PricingCatalog::new(sightseeing, hotels, add_ons))
}

/// Quote a multi-day package.
///
/// # Arguments
/// * `store` - Record store
/// * `cache` - Engine cache (for the vehicle model lookup)
/// * `request` - Days, legs and add-ons of the package
/// * `rates` - Rate tables to price with
/// * `currency` - Currency code stamped on the result
///
/// # Returns
/// `PricingResult` with a per-day breakdown, or `VehicleModelNotFound`
pub async fn quote_package<S>(
    store: &S,
    cache: &AppCache,
    request: &PackageQuoteRequest,
    rates: &RateTable,
    currency: &str,
) -> Result<PricingResult>
where
    S: BookingStore + ?Sized,
{
    let vehicle = load_vehicle_model(store, cache, request.vehicle_model_id).await?;
    let catalog = load_catalog(store, request).await?;

    let result = compute_package_price(request, &vehicle, &catalog, rates, currency);
    info!(
        "Package quote for {} days with {} ({}, {}): {} {}",
        result.days.len(),
        vehicle.name,
        vehicle.category.label(),
        vehicle.ac_type.label(),
        result.total_price,
        result.currency
    );
    Ok(result)
}

/// Quote a standalone route for one vehicle.
pub async fn quote_route<S>(
    store: &S,
    cache: &AppCache,
    request: &RouteQuoteRequest,
    rates: &RateTable,
    currency: &str,
) -> Result<RoutePricing>
where
    S: BookingStore + ?Sized,
{
    let vehicle = load_vehicle_model(store, cache, request.vehicle_model_id).await?;
    let pricing = super::route::price_route(&request.segments, &vehicle, request.trip_way, rates, currency);
    info!(
        "Route quote ({}) with {} ({}, {}): {} km, {} {}",
        request.trip_way.as_str(),
        vehicle.name,
        vehicle.category.label(),
        vehicle.ac_type.label(),
        pricing.total_distance_km,
        pricing.total_price,
        pricing.currency
    );
    Ok(pricing)
}

/// Persist a computed route quote to pricing_calculations.
pub async fn save_route_quote<S>(
    store: &S,
    request: &RouteQuoteRequest,
    pricing: &RoutePricing,
) -> Result<PricingSnapshot>
where
    S: BookingStore + ?Sized,
{
    let snapshot = super::route::snapshot_for(request, pricing)?;
    let saved = store
        .insert_pricing_snapshot(&snapshot)
        .await
        .map_err(EngineError::store("save route quote"))?;
    info!("Saved route quote {} ({} {})", saved.id, saved.total_price, saved.currency);
    Ok(saved)
}

/// Estimate an in-city transfer from the staircase table, rounded for display.
pub fn estimate_transfer(distance_km: Decimal, duration_minutes: Decimal, rates: &RateTable) -> Decimal {
    round_money(city_segment_cost(distance_km, duration_minutes, &rates.city_tiers), 2)
}
