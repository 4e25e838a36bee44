//! Record store seam.
//!
//! Every method is a single round-trip query or write against one table of
//! the persistence store. Empty lookups come back as `None` or an empty
//! vector; only transport and decoding failures are errors.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::allocation::assignment::{run_compensated, AssignmentPlan, AssignmentReceipt};
use crate::error::{Result, StoreError};
use crate::models::{
    AddOn, BookingRequest, BookingStatus, Driver, DriverBooking, Hotel, HotelBooking,
    PricingSnapshot, Route, Sightseeing, Trip, TripStatus, VehicleModel,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Departure-time range covering one operator-local calendar day, in UTC.
/// `start` is inclusive and `end` (the next local midnight) exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Local midnight of `date` at `offset` up to, not including, the next one.
    pub fn for_date(date: NaiveDate, offset: FixedOffset) -> Self {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc_midnight = local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()));
        let start = DateTime::<Utc>::from_naive_utc_and_offset(utc_midnight, Utc);
        let end = start + Duration::days(1);
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// bookings WHERE id = $1
    async fn booking(&self, id: Uuid) -> StoreResult<Option<BookingRequest>>;

    /// trips WHERE id = $1
    async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>>;

    /// routes WHERE id = $1
    async fn route(&self, id: Uuid) -> StoreResult<Option<Route>>;

    /// trips WHERE route_id = $1 AND window.start <= departure_at < window.end
    /// AND driver_id IS NOT NULL ORDER BY departure_at ASC
    async fn assigned_trips_on_route(&self, route_id: Uuid, window: DayWindow) -> StoreResult<Vec<Trip>>;

    /// bookings WHERE trip_id IN $1 AND status IN ('pending', 'upcoming')
    async fn seat_holding_bookings(&self, trip_ids: &[Uuid]) -> StoreResult<Vec<BookingRequest>>;

    /// driver_profiles WHERE id IN $1
    async fn drivers(&self, ids: &[Uuid]) -> StoreResult<Vec<Driver>>;

    /// vehicles_model WHERE id IN $1
    async fn vehicle_models(&self, ids: &[Uuid]) -> StoreResult<Vec<VehicleModel>>;

    /// Overwrite the mutable columns (trip, status, driver) of a booking.
    async fn update_booking(&self, booking: &BookingRequest) -> StoreResult<BookingRequest>;

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<BookingRequest>;

    async fn insert_driver_booking(&self, link: &DriverBooking) -> StoreResult<DriverBooking>;

    async fn delete_driver_booking(&self, id: Uuid) -> StoreResult<()>;

    async fn update_trip_status(&self, id: Uuid, status: TripStatus) -> StoreResult<Trip>;

    /// hotel_bookings WHERE id = $1
    async fn hotel_booking(&self, id: Uuid) -> StoreResult<Option<HotelBooking>>;

    async fn update_hotel_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<HotelBooking>;

    /// sightseeing WHERE id IN $1
    async fn sightseeing(&self, ids: &[Uuid]) -> StoreResult<Vec<Sightseeing>>;

    /// hotels_model WHERE id IN $1
    async fn hotels(&self, ids: &[Uuid]) -> StoreResult<Vec<Hotel>>;

    /// add_ons WHERE id IN $1
    async fn add_ons(&self, ids: &[Uuid]) -> StoreResult<Vec<AddOn>>;

    async fn insert_pricing_snapshot(&self, snapshot: &PricingSnapshot) -> StoreResult<PricingSnapshot>;

    /// Apply the three confirm writes as one unit.
    ///
    /// The default runs them in order and undoes completed steps when a later
    /// one fails. Stores with transactions override this.
    async fn confirm_assignment(&self, plan: &AssignmentPlan) -> Result<AssignmentReceipt> {
        run_compensated(self, plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_day_window_in_utc() {
        let window = DayWindow::for_date(
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            FixedOffset::east_opt(0).unwrap(),
        );
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 6, 11, 0, 0, 0).unwrap());
        assert!(!window.contains(window.end));
    }

    #[test]
    fn test_day_window_has_no_gap_before_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let offset = FixedOffset::east_opt(0).unwrap();
        let today = DayWindow::for_date(date, offset);
        let tomorrow = DayWindow::for_date(date.succ_opt().unwrap(), offset);
        // Sub-millisecond departure just before midnight
        let late = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 59).unwrap() + Duration::microseconds(999_500);
        assert!(today.contains(late));
        assert!(!tomorrow.contains(late));
        assert_eq!(today.end, tomorrow.start);
    }

    #[test]
    fn test_day_window_shifts_by_local_offset() {
        // 05:30 ahead: local midnight is 18:30 UTC the previous day
        let window = DayWindow::for_date(
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            FixedOffset::east_opt(330 * 60).unwrap(),
        );
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 6, 9, 18, 30, 0).unwrap());
        assert!(window.contains(Utc.with_ymd_and_hms(2024, 6, 10, 18, 29, 59).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 6, 10, 18, 30, 0).unwrap()));
        assert!(!window.contains(Utc.with_ymd_and_hms(2024, 6, 9, 18, 29, 59).unwrap()));
    }
}
