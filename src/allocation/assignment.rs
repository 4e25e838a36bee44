//! Operator confirm and cancel actions.
//!
//! Confirming writes three rows in order: the booking (driver, trip,
//! `upcoming`), a driver_bookings link, and the trip status. Stores without
//! transactions get a compensating log so a failure in a later step undoes
//! the earlier ones instead of leaving a half-assigned booking.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::allocation::resolver::DriverOption;
use crate::error::{AssignmentStep, EngineError, Result, StoreError};
use crate::models::{BookingRequest, BookingStatus, DriverBooking, HotelBooking, Trip, TripStatus};
use crate::store::BookingStore;

/// Everything needed to apply or undo a confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPlan {
    /// Booking as read before the confirm; restored on rollback.
    pub booking: BookingRequest,
    pub driver_id: Uuid,
    pub trip_id: Uuid,
}

impl AssignmentPlan {
    /// The booking row after step one.
    pub fn attached_booking(&self) -> BookingRequest {
        BookingRequest {
            trip_id: Some(self.trip_id),
            driver_id: Some(self.driver_id),
            status: BookingStatus::Upcoming,
            ..self.booking.clone()
        }
    }

    pub fn link(&self) -> DriverBooking {
        DriverBooking {
            id: Uuid::new_v4(),
            driver_id: self.driver_id,
            booking_id: self.booking.id,
            trip_id: self.trip_id,
            created_at: Utc::now(),
        }
    }

    pub fn failure(&self, step: AssignmentStep, rolled_back: bool, source: StoreError) -> EngineError {
        EngineError::Assignment {
            step,
            booking_id: self.booking.id,
            driver_id: self.driver_id,
            trip_id: self.trip_id,
            rolled_back,
            source,
        }
    }
}

/// Rows written by a successful confirm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentReceipt {
    pub booking: BookingRequest,
    pub link: DriverBooking,
    pub trip: Trip,
}

enum Compensation {
    RestoreBooking(BookingRequest),
    RemoveDriverBooking(Uuid),
}

/// Run the confirm steps, undoing completed ones if a later step fails.
pub(crate) async fn run_compensated<S>(store: &S, plan: &AssignmentPlan) -> Result<AssignmentReceipt>
where
    S: BookingStore + ?Sized,
{
    let mut log: Vec<Compensation> = Vec::new();

    let booking = store
        .update_booking(&plan.attached_booking())
        .await
        .map_err(|e| plan.failure(AssignmentStep::AttachDriver, true, e))?;
    log.push(Compensation::RestoreBooking(plan.booking.clone()));

    let link = match store.insert_driver_booking(&plan.link()).await {
        Ok(link) => link,
        Err(e) => {
            let rolled_back = compensate(store, log).await;
            return Err(plan.failure(AssignmentStep::LinkDriverBooking, rolled_back, e));
        }
    };
    log.push(Compensation::RemoveDriverBooking(link.id));

    let trip = match store.update_trip_status(plan.trip_id, TripStatus::Booked).await {
        Ok(trip) => trip,
        Err(e) => {
            let rolled_back = compensate(store, log).await;
            return Err(plan.failure(AssignmentStep::MarkTripBooked, rolled_back, e));
        }
    };

    Ok(AssignmentReceipt { booking, link, trip })
}

/// Undo logged steps newest first. Returns false if any undo failed.
async fn compensate<S>(store: &S, log: Vec<Compensation>) -> bool
where
    S: BookingStore + ?Sized,
{
    let mut clean = true;
    for step in log.into_iter().rev() {
        let outcome = match &step {
            Compensation::RestoreBooking(booking) => {
                warn!("Restoring booking {} after failed confirm", booking.id);
                store.update_booking(booking).await.map(|_| ())
            }
            Compensation::RemoveDriverBooking(id) => {
                warn!("Removing driver booking {} after failed confirm", id);
                store.delete_driver_booking(*id).await
            }
        };
        if let Err(e) = outcome {
            error!("Compensation failed, manual remediation needed: {}", e);
            clean = false;
        }
    }
    clean
}

/// Attach the chosen driver to a pending booking.
///
/// `option` must come from [`find_eligible_drivers`](crate::allocation::find_eligible_drivers)
/// for this booking in the same interaction; capacity is not re-checked here.
pub async fn confirm_assignment<S>(store: &S, booking_id: Uuid, option: &DriverOption) -> Result<AssignmentReceipt>
where
    S: BookingStore + ?Sized,
{
    let booking = store
        .booking(booking_id)
        .await
        .map_err(EngineError::store("confirm assignment"))?
        .ok_or(EngineError::BookingNotFound(booking_id))?;

    if booking.status != BookingStatus::Pending {
        return Err(EngineError::InvalidTransition {
            booking_id,
            from: booking.status,
            to: BookingStatus::Upcoming,
        });
    }

    let plan = AssignmentPlan {
        booking,
        driver_id: option.driver_id,
        trip_id: option.trip_id,
    };

    info!(
        "Confirming driver {} on trip {} for booking {}",
        plan.driver_id, plan.trip_id, booking_id
    );
    let receipt = store.confirm_assignment(&plan).await?;
    info!("Booking {} is now {}", booking_id, receipt.booking.status);

    Ok(receipt)
}

/// Cancel a booking. Its seats stop counting on the next resolver call.
pub async fn cancel_booking<S>(store: &S, booking_id: Uuid) -> Result<BookingRequest>
where
    S: BookingStore + ?Sized,
{
    let booking = store
        .booking(booking_id)
        .await
        .map_err(EngineError::store("cancel booking"))?
        .ok_or(EngineError::BookingNotFound(booking_id))?;

    match booking.status {
        BookingStatus::Cancelled => Ok(booking),
        BookingStatus::Completed => Err(EngineError::InvalidTransition {
            booking_id,
            from: booking.status,
            to: BookingStatus::Cancelled,
        }),
        BookingStatus::Pending | BookingStatus::Upcoming => {
            let cancelled = store
                .update_booking_status(booking_id, BookingStatus::Cancelled)
                .await
                .map_err(EngineError::store("cancel booking"))?;
            info!("Booking {} cancelled", booking_id);
            Ok(cancelled)
        }
    }
}

/// Cancel a hotel booking.
pub async fn cancel_hotel_booking<S>(store: &S, booking_id: Uuid) -> Result<HotelBooking>
where
    S: BookingStore + ?Sized,
{
    let booking = store
        .hotel_booking(booking_id)
        .await
        .map_err(EngineError::store("cancel hotel booking"))?
        .ok_or(EngineError::HotelBookingNotFound(booking_id))?;

    match booking.status {
        BookingStatus::Cancelled => Ok(booking),
        BookingStatus::Completed => Err(EngineError::InvalidTransition {
            booking_id,
            from: booking.status,
            to: BookingStatus::Cancelled,
        }),
        BookingStatus::Pending | BookingStatus::Upcoming => {
            let cancelled = store
                .update_hotel_booking_status(booking_id, BookingStatus::Cancelled)
                .await
                .map_err(EngineError::store("cancel hotel booking"))?;
            info!("Hotel booking {} cancelled", booking_id);
            Ok(cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, TimeZone};

    struct Setup {
        store: MemoryStore,
        booking: BookingRequest,
        trip: Trip,
        option: DriverOption,
    }

    async fn setup() -> Setup {
        let store = MemoryStore::new();
        let driver_id = Uuid::new_v4();
        let trip = Trip {
            id: Uuid::new_v4(),
            route_id: Some(Uuid::new_v4()),
            departure_at: Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap(),
            driver_id: Some(driver_id),
            vehicle_model_id: None,
            seat_capacity: 4,
            status: TripStatus::Scheduled,
        };
        let booking = BookingRequest {
            id: Uuid::new_v4(),
            trip_id: None,
            requested_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            seat_count: 2,
            status: BookingStatus::Pending,
            driver_id: None,
        };
        store.add_trip(trip.clone()).await;
        store.add_booking(booking.clone()).await;
        let option = DriverOption {
            driver_id,
            name: "Asha".to_string(),
            vehicle_model_name: "Ertiga".to_string(),
            trip_id: trip.id,
            vehicle_model_id: None,
            remaining_capacity: 4,
        };
        Setup {
            store,
            booking,
            trip,
            option,
        }
    }

    #[tokio::test]
    async fn test_confirm_writes_all_three_rows() {
        let s = setup().await;
        let receipt = confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap();

        assert_eq!(receipt.booking.status, BookingStatus::Upcoming);
        assert_eq!(receipt.booking.driver_id, Some(s.option.driver_id));
        assert_eq!(receipt.booking.trip_id, Some(s.trip.id));
        assert_eq!(receipt.trip.status, TripStatus::Booked);

        let links = s.store.driver_bookings().await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].booking_id, s.booking.id);
        assert_eq!(links[0].driver_id, s.option.driver_id);
    }

    #[tokio::test]
    async fn test_failed_link_restores_booking() {
        let s = setup().await;
        s.store.fail_on("insert_driver_booking");

        let err = confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Assignment {
                step: AssignmentStep::LinkDriverBooking,
                rolled_back: true,
                ..
            }
        ));
        assert!(!err.needs_remediation());

        let stored = s.store.booking(s.booking.id).await.unwrap().unwrap();
        assert_eq!(stored, s.booking);
        assert!(s.store.driver_bookings().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_trip_update_removes_link() {
        let s = setup().await;
        s.store.fail_on("update_trip_status");

        let err = confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Assignment {
                step: AssignmentStep::MarkTripBooked,
                rolled_back: true,
                ..
            }
        ));
        assert!(s.store.driver_bookings().await.is_empty());
        let stored = s.store.booking(s.booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_undo_needs_remediation() {
        let s = setup().await;
        s.store.fail_on("update_trip_status");
        s.store.fail_on("delete_driver_booking");

        let err = confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap_err();
        assert!(err.needs_remediation());
        assert_eq!(s.store.driver_bookings().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_first_step_writes_nothing() {
        let s = setup().await;
        s.store.fail_on("update_booking");

        let err = confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Assignment {
                step: AssignmentStep::AttachDriver,
                rolled_back: true,
                ..
            }
        ));
        assert!(s.store.driver_bookings().await.is_empty());
        let trip = s.store.trip(s.trip.id).await.unwrap().unwrap();
        assert_eq!(trip.status, TripStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_only_pending_bookings_can_be_confirmed() {
        let s = setup().await;
        confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap();

        let err = confirm_assignment(&s.store, s.booking.id, &s.option).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition {
                from: BookingStatus::Upcoming,
                to: BookingStatus::Upcoming,
                ..
            }
        ));
        assert_eq!(s.store.driver_bookings().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_booking() {
        let s = setup().await;
        let missing = Uuid::new_v4();
        let err = confirm_assignment(&s.store, missing, &s.option).await.unwrap_err();
        assert!(matches!(err, EngineError::BookingNotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let s = setup().await;
        let cancelled = cancel_booking(&s.store, s.booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let again = cancel_booking(&s.store, s.booking.id).await.unwrap();
        assert_eq!(again.status, BookingStatus::Cancelled);

        s.store
            .update_booking_status(s.booking.id, BookingStatus::Completed)
            .await
            .unwrap();
        let err = cancel_booking(&s.store, s.booking.id).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { from: BookingStatus::Completed, .. }));
    }

    #[tokio::test]
    async fn test_cancel_hotel_booking() {
        let store = MemoryStore::new();
        let booking = HotelBooking {
            id: Uuid::new_v4(),
            hotel_id: Some(Uuid::new_v4()),
            status: BookingStatus::Upcoming,
        };
        store.add_hotel_booking(booking.clone()).await;

        let cancelled = cancel_hotel_booking(&store, booking.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let missing = Uuid::new_v4();
        let err = cancel_hotel_booking(&store, missing).await.unwrap_err();
        assert!(matches!(err, EngineError::HotelBookingNotFound(id) if id == missing));
    }
}
