//! In-process record store.
//!
//! Holds every table in memory behind one lock. Used when the engine is
//! embedded without a database and throughout the tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AddOn, BookingRequest, BookingStatus, Driver, DriverBooking, Hotel, HotelBooking,
    PricingSnapshot, Route, Sightseeing, Trip, TripStatus, VehicleModel,
};
use crate::store::{BookingStore, DayWindow, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    bookings: HashMap<Uuid, BookingRequest>,
    trips: HashMap<Uuid, Trip>,
    routes: HashMap<Uuid, Route>,
    drivers: HashMap<Uuid, Driver>,
    vehicle_models: HashMap<Uuid, VehicleModel>,
    driver_bookings: HashMap<Uuid, DriverBooking>,
    hotel_bookings: HashMap<Uuid, HotelBooking>,
    sightseeing: HashMap<Uuid, Sightseeing>,
    hotels: HashMap<Uuid, Hotel>,
    add_ons: HashMap<Uuid, AddOn>,
    pricing_snapshots: Vec<PricingSnapshot>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    failing: Mutex<HashSet<&'static str>>,
}

fn pick<T: Clone>(table: &HashMap<Uuid, T>, ids: &[Uuid]) -> Vec<T> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| table.get(id).cloned())
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of the named store method fail with a backend
    /// error, e.g. `"insert_driver_booking"`.
    pub fn fail_on(&self, method: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(method);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    fn check(&self, method: &'static str) -> StoreResult<()> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| StoreError::Backend("failure registry poisoned".to_string()))?;
        if failing.contains(method) {
            return Err(StoreError::Backend(format!("{} unavailable", method)));
        }
        Ok(())
    }

    pub async fn add_booking(&self, booking: BookingRequest) {
        self.tables.write().await.bookings.insert(booking.id, booking);
    }

    pub async fn add_trip(&self, trip: Trip) {
        self.tables.write().await.trips.insert(trip.id, trip);
    }

    pub async fn add_route(&self, route: Route) {
        self.tables.write().await.routes.insert(route.id, route);
    }

    pub async fn add_driver(&self, driver: Driver) {
        self.tables.write().await.drivers.insert(driver.id, driver);
    }

    pub async fn add_vehicle_model(&self, model: VehicleModel) {
        self.tables.write().await.vehicle_models.insert(model.id, model);
    }

    pub async fn add_hotel_booking(&self, booking: HotelBooking) {
        self.tables.write().await.hotel_bookings.insert(booking.id, booking);
    }

    pub async fn add_sightseeing(&self, sightseeing: Sightseeing) {
        self.tables.write().await.sightseeing.insert(sightseeing.id, sightseeing);
    }

    pub async fn add_hotel(&self, hotel: Hotel) {
        self.tables.write().await.hotels.insert(hotel.id, hotel);
    }

    pub async fn add_add_on(&self, add_on: AddOn) {
        self.tables.write().await.add_ons.insert(add_on.id, add_on);
    }

    pub async fn driver_bookings(&self) -> Vec<DriverBooking> {
        self.tables.read().await.driver_bookings.values().cloned().collect()
    }

    pub async fn pricing_snapshots(&self) -> Vec<PricingSnapshot> {
        self.tables.read().await.pricing_snapshots.clone()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn booking(&self, id: Uuid) -> StoreResult<Option<BookingRequest>> {
        self.check("booking")?;
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
        self.check("trip")?;
        Ok(self.tables.read().await.trips.get(&id).cloned())
    }

    async fn route(&self, id: Uuid) -> StoreResult<Option<Route>> {
        self.check("route")?;
        Ok(self.tables.read().await.routes.get(&id).cloned())
    }

    async fn assigned_trips_on_route(&self, route_id: Uuid, window: DayWindow) -> StoreResult<Vec<Trip>> {
        self.check("assigned_trips_on_route")?;
        let tables = self.tables.read().await;
        let mut trips: Vec<Trip> = tables
            .trips
            .values()
            .filter(|t| {
                t.route_id == Some(route_id) && t.driver_id.is_some() && window.contains(t.departure_at)
            })
            .cloned()
            .collect();
        trips.sort_by_key(|t| (t.departure_at, t.id));
        Ok(trips)
    }

    async fn seat_holding_bookings(&self, trip_ids: &[Uuid]) -> StoreResult<Vec<BookingRequest>> {
        self.check("seat_holding_bookings")?;
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .values()
            .filter(|b| b.status.holds_seats())
            .filter(|b| b.trip_id.map_or(false, |id| trip_ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn drivers(&self, ids: &[Uuid]) -> StoreResult<Vec<Driver>> {
        self.check("drivers")?;
        Ok(pick(&self.tables.read().await.drivers, ids))
    }

    async fn vehicle_models(&self, ids: &[Uuid]) -> StoreResult<Vec<VehicleModel>> {
        self.check("vehicle_models")?;
        Ok(pick(&self.tables.read().await.vehicle_models, ids))
    }

    async fn update_booking(&self, booking: &BookingRequest) -> StoreResult<BookingRequest> {
        self.check("update_booking")?;
        let mut tables = self.tables.write().await;
        let row = tables.bookings.get_mut(&booking.id).ok_or(StoreError::MissingRow {
            table: "bookings",
            id: booking.id,
        })?;
        row.trip_id = booking.trip_id;
        row.status = booking.status;
        row.driver_id = booking.driver_id;
        Ok(row.clone())
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<BookingRequest> {
        self.check("update_booking_status")?;
        let mut tables = self.tables.write().await;
        let row = tables
            .bookings
            .get_mut(&id)
            .ok_or(StoreError::MissingRow { table: "bookings", id })?;
        row.status = status;
        Ok(row.clone())
    }

    async fn insert_driver_booking(&self, link: &DriverBooking) -> StoreResult<DriverBooking> {
        self.check("insert_driver_booking")?;
        let mut tables = self.tables.write().await;
        tables.driver_bookings.insert(link.id, link.clone());
        Ok(link.clone())
    }

    async fn delete_driver_booking(&self, id: Uuid) -> StoreResult<()> {
        self.check("delete_driver_booking")?;
        self.tables
            .write()
            .await
            .driver_bookings
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::MissingRow {
                table: "driver_bookings",
                id,
            })
    }

    async fn update_trip_status(&self, id: Uuid, status: TripStatus) -> StoreResult<Trip> {
        self.check("update_trip_status")?;
        let mut tables = self.tables.write().await;
        let row = tables
            .trips
            .get_mut(&id)
            .ok_or(StoreError::MissingRow { table: "trips", id })?;
        row.status = status;
        Ok(row.clone())
    }

    async fn hotel_booking(&self, id: Uuid) -> StoreResult<Option<HotelBooking>> {
        self.check("hotel_booking")?;
        Ok(self.tables.read().await.hotel_bookings.get(&id).cloned())
    }

    async fn update_hotel_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<HotelBooking> {
        self.check("update_hotel_booking_status")?;
        let mut tables = self.tables.write().await;
        let row = tables.hotel_bookings.get_mut(&id).ok_or(StoreError::MissingRow {
            table: "hotel_bookings",
            id,
        })?;
        row.status = status;
        Ok(row.clone())
    }

    async fn sightseeing(&self, ids: &[Uuid]) -> StoreResult<Vec<Sightseeing>> {
        self.check("sightseeing")?;
        Ok(pick(&self.tables.read().await.sightseeing, ids))
    }

    async fn hotels(&self, ids: &[Uuid]) -> StoreResult<Vec<Hotel>> {
        self.check("hotels")?;
        Ok(pick(&self.tables.read().await.hotels, ids))
    }

    async fn add_ons(&self, ids: &[Uuid]) -> StoreResult<Vec<AddOn>> {
        self.check("add_ons")?;
        Ok(pick(&self.tables.read().await.add_ons, ids))
    }

    async fn insert_pricing_snapshot(&self, snapshot: &PricingSnapshot) -> StoreResult<PricingSnapshot> {
        self.check("insert_pricing_snapshot")?;
        self.tables.write().await.pricing_snapshots.push(snapshot.clone());
        Ok(snapshot.clone())
    }
}
