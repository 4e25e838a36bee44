//! Bookings, trips and the driver linkage between them

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a booking request.
///
/// `pending -> upcoming` happens on confirm, `pending|upcoming -> cancelled`
/// on explicit cancel. Completion is driven outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Upcoming,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Upcoming => "upcoming",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Statuses whose seats count against a trip's capacity.
    pub fn holds_seats(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Upcoming)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "upcoming" => Ok(BookingStatus::Upcoming),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(other.to_string()),
        }
    }
}

/// A customer's request for seats on a route on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    /// Trip the request was raised against; its route defines where the
    /// customer wants to go.
    pub trip_id: Option<Uuid>,
    pub requested_date: NaiveDate,
    pub seat_count: i32,
    pub status: BookingStatus,
    pub driver_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Scheduled,
    Booked,
    Cancelled,
    Completed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "scheduled",
            TripStatus::Booked => "booked",
            TripStatus::Cancelled => "cancelled",
            TripStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" | "available" => Ok(TripStatus::Scheduled),
            "booked" => Ok(TripStatus::Booked),
            "cancelled" | "canceled" => Ok(TripStatus::Cancelled),
            "completed" => Ok(TripStatus::Completed),
            other => Err(other.to_string()),
        }
    }
}

/// A scheduled departure on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub route_id: Option<Uuid>,
    pub departure_at: DateTime<Utc>,
    pub driver_id: Option<Uuid>,
    pub vehicle_model_id: Option<Uuid>,
    pub seat_capacity: i32,
    pub status: TripStatus,
}

impl Trip {
    /// Seats left once `bookings` are reserved on this trip.
    ///
    /// Only bookings that reference this trip and still hold seats count;
    /// the value is derived fresh on every call and never stored.
    pub fn remaining_capacity<'a, I>(&self, bookings: I) -> i32
    where
        I: IntoIterator<Item = &'a BookingRequest>,
    {
        let reserved: i32 = bookings
            .into_iter()
            .filter(|b| b.trip_id == Some(self.id) && b.status.holds_seats())
            .map(|b| b.seat_count)
            .sum();
        self.seat_capacity - reserved
    }
}

/// Row in driver_bookings linking a confirmed booking to its driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverBooking {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub booking_id: Uuid,
    pub trip_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Row in hotel_bookings; only its status is touched by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelBooking {
    pub id: Uuid,
    pub hotel_id: Option<Uuid>,
    pub status: BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(trip_id: Uuid, seats: i32, status: BookingStatus) -> BookingRequest {
        BookingRequest {
            id: Uuid::new_v4(),
            trip_id: Some(trip_id),
            requested_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            seat_count: seats,
            status,
            driver_id: None,
        }
    }

    #[test]
    fn test_status_parsing_accepts_store_spellings() {
        assert_eq!("pending".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert_eq!(" Upcoming ".parse::<BookingStatus>(), Ok(BookingStatus::Upcoming));
        assert_eq!("canceled".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
        assert!("lost".parse::<BookingStatus>().is_err());
        assert_eq!("booked".parse::<TripStatus>(), Ok(TripStatus::Booked));
    }

    #[test]
    fn test_remaining_capacity_ignores_cancelled_and_foreign_bookings() {
        let trip = Trip {
            id: Uuid::new_v4(),
            route_id: Some(Uuid::new_v4()),
            departure_at: Utc::now(),
            driver_id: None,
            vehicle_model_id: None,
            seat_capacity: 6,
            status: TripStatus::Scheduled,
        };
        let bookings = vec![
            booking(trip.id, 2, BookingStatus::Pending),
            booking(trip.id, 1, BookingStatus::Upcoming),
            booking(trip.id, 3, BookingStatus::Cancelled),
            booking(trip.id, 1, BookingStatus::Completed),
            booking(Uuid::new_v4(), 4, BookingStatus::Pending),
        ];
        assert_eq!(trip.remaining_capacity(&bookings), 3);
    }
}
