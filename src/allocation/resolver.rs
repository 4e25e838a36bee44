//! Capacity resolver: which drivers can take a pending booking.

use std::collections::{HashMap, HashSet};

use chrono::FixedOffset;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::{EngineError, Result};
use crate::models::{BookingRequest, Trip};
use crate::store::{BookingStore, DayWindow};

/// Shown when a trip's vehicle model no longer resolves.
const UNKNOWN_VEHICLE: &str = "Unknown vehicle";

/// A driver an operator may pick for a booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverOption {
    pub driver_id: Uuid,
    pub name: String,
    pub vehicle_model_name: String,
    /// Qualifying trip the driver runs; the confirm attaches the booking to it.
    pub trip_id: Uuid,
    pub vehicle_model_id: Option<Uuid>,
    pub remaining_capacity: i32,
}

/// A candidate trip that can still hold the requested seats.
#[derive(Debug, Clone, PartialEq)]
pub struct QualifyingTrip<'a> {
    pub trip: &'a Trip,
    pub driver_id: Uuid,
    pub remaining_capacity: i32,
}

/// Keep candidate trips with a driver and room for `booking.seat_count`,
/// first trip per driver, in candidate order.
///
/// `bookings` may include the request itself; it never counts against a
/// trip it is about to join.
pub fn qualifying_trips<'a>(
    booking: &BookingRequest,
    candidates: &'a [Trip],
    bookings: &[BookingRequest],
) -> Vec<QualifyingTrip<'a>> {
    let others: Vec<&BookingRequest> = bookings.iter().filter(|b| b.id != booking.id).collect();
    let mut seen: HashSet<Uuid> = HashSet::new();

    candidates
        .iter()
        .filter_map(|trip| {
            let driver_id = trip.driver_id?;
            let remaining_capacity = trip.remaining_capacity(others.iter().copied());
            if remaining_capacity < booking.seat_count {
                debug!(
                    "Trip {} has {} seats left, {} requested",
                    trip.id, remaining_capacity, booking.seat_count
                );
                return None;
            }
            Some(QualifyingTrip {
                trip,
                driver_id,
                remaining_capacity,
            })
        })
        .filter(|q| seen.insert(q.driver_id))
        .collect()
}

/// List the drivers who can legally serve `booking`.
///
/// Looks at trips on the route of the booking's trip that depart on the
/// requested local day, already have a driver, and still have room once
/// pending and upcoming bookings are counted. An empty list is a normal
/// outcome. The caller decides which option to confirm.
pub async fn find_eligible_drivers<S>(
    store: &S,
    cache: &AppCache,
    booking: &BookingRequest,
    utc_offset: FixedOffset,
) -> Result<Vec<DriverOption>>
where
    S: BookingStore + ?Sized,
{
    if booking.seat_count <= 0 {
        return Err(EngineError::InvalidSeatCount {
            booking_id: booking.id,
            seat_count: booking.seat_count,
        });
    }

    let Some(trip_id) = booking.trip_id else {
        debug!("Booking {} references no trip", booking.id);
        return Ok(Vec::new());
    };
    let Some(route_id) = store
        .trip(trip_id)
        .await
        .map_err(EngineError::store("load booking trip"))?
        .and_then(|trip| trip.route_id)
    else {
        debug!("Trip {} for booking {} is missing or has no route", trip_id, booking.id);
        return Ok(Vec::new());
    };
    if store.route(route_id).await.map_err(EngineError::store("load route"))?.is_none() {
        debug!("Route {} for booking {} is missing", route_id, booking.id);
        return Ok(Vec::new());
    }

    let window = DayWindow::for_date(booking.requested_date, utc_offset);
    let candidates = store
        .assigned_trips_on_route(route_id, window)
        .await
        .map_err(EngineError::store("load candidate trips"))?;
    if candidates.is_empty() {
        info!("No assigned trips on route {} for {}", route_id, booking.requested_date);
        return Ok(Vec::new());
    }

    let candidate_ids: Vec<Uuid> = candidates.iter().map(|t| t.id).collect();
    let holding = store
        .seat_holding_bookings(&candidate_ids)
        .await
        .map_err(EngineError::store("load seat reservations"))?;

    let qualifying = qualifying_trips(booking, &candidates, &holding);
    if qualifying.is_empty() {
        info!(
            "None of {} trips on route {} can take {} seats",
            candidates.len(),
            route_id,
            booking.seat_count
        );
        return Ok(Vec::new());
    }

    let driver_ids: Vec<Uuid> = qualifying.iter().map(|q| q.driver_id).collect();
    let drivers: HashMap<Uuid, String> = store
        .drivers(&driver_ids)
        .await
        .map_err(EngineError::store("load drivers"))?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    let model_ids: Vec<Uuid> = qualifying.iter().filter_map(|q| q.trip.vehicle_model_id).collect();
    let models = cache
        .vehicle_models(store, &model_ids)
        .await
        .map_err(EngineError::store("load vehicle models"))?;

    let options: Vec<DriverOption> = qualifying
        .into_iter()
        .filter_map(|q| {
            let Some(name) = drivers.get(&q.driver_id) else {
                warn!("Driver {} on trip {} has no profile, skipping", q.driver_id, q.trip.id);
                return None;
            };
            let vehicle_model_name = q
                .trip
                .vehicle_model_id
                .and_then(|id| models.get(&id))
                .map(|m| m.name.clone())
                .unwrap_or_else(|| UNKNOWN_VEHICLE.to_string());
            Some(DriverOption {
                driver_id: q.driver_id,
                name: name.clone(),
                vehicle_model_name,
                trip_id: q.trip.id,
                vehicle_model_id: q.trip.vehicle_model_id,
                remaining_capacity: q.remaining_capacity,
            })
        })
        .collect();

    info!("Found {} eligible drivers for booking {}", options.len(), booking.id);
    Ok(options)
}
