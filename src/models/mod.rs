//! Domain records read and written by the engine.
//!
//! All of these are request-scoped copies of rows owned by the persistence
//! store; the engine never keeps them beyond a single call.

pub mod booking;
pub mod catalog;
pub mod fleet;
pub mod route;

pub use booking::{BookingRequest, BookingStatus, DriverBooking, HotelBooking, Trip, TripStatus};
pub use catalog::{AddOn, Hotel, PricingSnapshot, Sightseeing};
pub use fleet::{AcType, Driver, VehicleCategory, VehicleModel};
pub use route::{Route, RouteSegment};
