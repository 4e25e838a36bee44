//! Engine state shared by callers: store, cache, config and rate tables.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::allocation::{self, AssignmentReceipt, DriverOption};
use crate::cache::AppCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{BookingRequest, HotelBooking, PricingSnapshot};
use crate::pricing::{self, PackageQuoteRequest, PricingResult, RateTable, RoutePricing, RouteQuoteRequest};
use crate::store::{BookingStore, PgStore};

/// Booking allocation and pricing engine over a record store
pub struct BookingEngine<S: BookingStore> {
    pub store: Arc<S>,
    pub cache: AppCache,
    pub config: EngineConfig,
    pub rates: RateTable,
}

impl<S: BookingStore> Clone for BookingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: self.cache.clone(),
            config: self.config.clone(),
            rates: self.rates.clone(),
        }
    }
}

impl<S: BookingStore> BookingEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(store),
            cache: AppCache::new(config.vehicle_model_cache_ttl),
            rates: config.rate_table(),
            config,
        }
    }

    /// Drivers who can take a stored booking.
    pub async fn find_eligible_drivers(&self, booking_id: Uuid) -> Result<Vec<DriverOption>> {
        let booking = self
            .store
            .booking(booking_id)
            .await
            .map_err(EngineError::store("find eligible drivers"))?
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        self.eligible_drivers_for(&booking).await
    }

    /// Drivers who can take a booking request that may not be stored yet.
    pub async fn eligible_drivers_for(&self, booking: &BookingRequest) -> Result<Vec<DriverOption>> {
        allocation::find_eligible_drivers(self.store.as_ref(), &self.cache, booking, self.config.utc_offset).await
    }

    pub async fn confirm_assignment(&self, booking_id: Uuid, option: &DriverOption) -> Result<AssignmentReceipt> {
        allocation::confirm_assignment(self.store.as_ref(), booking_id, option).await
    }

    pub async fn cancel_booking(&self, booking_id: Uuid) -> Result<BookingRequest> {
        allocation::cancel_booking(self.store.as_ref(), booking_id).await
    }

    pub async fn cancel_hotel_booking(&self, booking_id: Uuid) -> Result<HotelBooking> {
        allocation::cancel_hotel_booking(self.store.as_ref(), booking_id).await
    }

    pub async fn quote_package(&self, request: &PackageQuoteRequest) -> Result<PricingResult> {
        pricing::quote_package(self.store.as_ref(), &self.cache, request, &self.rates, &self.config.currency).await
    }

    pub async fn quote_route(&self, request: &RouteQuoteRequest) -> Result<RoutePricing> {
        pricing::quote_route(self.store.as_ref(), &self.cache, request, &self.rates, &self.config.currency).await
    }

    /// Price a route and persist the quote in one call.
    pub async fn save_route_quote(&self, request: &RouteQuoteRequest) -> Result<(RoutePricing, PricingSnapshot)> {
        let quote = self.quote_route(request).await?;
        let snapshot = pricing::save_route_quote(self.store.as_ref(), request, &quote).await?;
        Ok((quote, snapshot))
    }

    pub fn estimate_transfer(&self, distance_km: Decimal, duration_minutes: Decimal) -> Decimal {
        pricing::estimate_transfer(distance_km, duration_minutes, &self.rates)
    }
}

impl BookingEngine<PgStore> {
    /// Connect to Postgres using `DATABASE_URL` from the config.
    pub async fn connect(config: EngineConfig) -> Result<Self> {
        let store = PgStore::connect(&config).await?;
        Ok(Self::new(store, config))
    }
}
