//! Error handling for the engine

use uuid::Uuid;

use crate::models::BookingStatus;

/// Failure reported by a record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid {column} value '{value}' in {table}")]
    Decode {
        table: &'static str,
        column: &'static str,
        value: String,
    },

    #[error("No row {id} in {table}")]
    MissingRow { table: &'static str, id: Uuid },

    #[error("Store error: {0}")]
    Backend(String),
}

/// Step of the confirm sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStep {
    AttachDriver,
    LinkDriverBooking,
    MarkTripBooked,
}

impl std::fmt::Display for AssignmentStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AssignmentStep::AttachDriver => "attach driver to booking",
            AssignmentStep::LinkDriverBooking => "record driver booking",
            AssignmentStep::MarkTripBooked => "mark trip booked",
        };
        f.write_str(name)
    }
}

/// Engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("Hotel booking {0} not found")]
    HotelBookingNotFound(Uuid),

    #[error("Vehicle model {0} not found")]
    VehicleModelNotFound(Uuid),

    #[error("Booking {booking_id} requests {seat_count} seats; seat count must be positive")]
    InvalidSeatCount { booking_id: Uuid, seat_count: i32 },

    #[error("Booking {booking_id} cannot move from {from} to {to}")]
    InvalidTransition {
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error(
        "Assigning driver {driver_id} to booking {booking_id} on trip {trip_id} failed at step '{step}' (rolled back: {rolled_back}): {source}"
    )]
    Assignment {
        step: AssignmentStep,
        booking_id: Uuid,
        driver_id: Uuid,
        trip_id: Uuid,
        rolled_back: bool,
        #[source]
        source: StoreError,
    },

    #[error("Could not encode pricing breakdown: {0}")]
    Breakdown(#[source] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Label a store failure with the operation that hit it.
    pub fn store(operation: &'static str) -> impl FnOnce(StoreError) -> EngineError {
        move |source| EngineError::Store { operation, source }
    }

    /// True when the failure left writes in place that an operator must reconcile.
    pub fn needs_remediation(&self) -> bool {
        matches!(self, EngineError::Assignment { rolled_back: false, .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_labelled_with_operation() {
        let id = Uuid::new_v4();
        let err = EngineError::store("find eligible drivers")(StoreError::MissingRow {
            table: "trips",
            id,
        });
        let message = err.to_string();
        assert!(message.starts_with("find eligible drivers failed"));
        assert!(message.contains(&id.to_string()));
    }

    #[test]
    fn test_assignment_error_names_ids_and_step() {
        let (booking_id, driver_id, trip_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let err = EngineError::Assignment {
            step: AssignmentStep::MarkTripBooked,
            booking_id,
            driver_id,
            trip_id,
            rolled_back: false,
            source: StoreError::Backend("connection reset".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains(&booking_id.to_string()));
        assert!(message.contains(&driver_id.to_string()));
        assert!(message.contains(&trip_id.to_string()));
        assert!(message.contains("mark trip booked"));
        assert!(err.needs_remediation());
    }

    #[test]
    fn test_breakdown_error_keeps_encoder_message() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let detail = source.to_string();
        let err = EngineError::Breakdown(source);
        assert!(err.to_string().starts_with("Could not encode pricing breakdown"));
        assert!(err.to_string().contains(&detail));
        assert!(!err.needs_remediation());
    }

    #[test]
    fn test_failed_first_step_needs_no_remediation() {
        let err = EngineError::Assignment {
            step: AssignmentStep::AttachDriver,
            booking_id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            rolled_back: true,
            source: StoreError::Backend("timeout".to_string()),
        };
        assert!(!err.needs_remediation());
    }
}
