//! Capacity resolver and the operator actions that follow it.

pub mod assignment;
pub mod resolver;

pub use assignment::{
    cancel_booking, cancel_hotel_booking, confirm_assignment, AssignmentPlan, AssignmentReceipt,
};
pub use resolver::{find_eligible_drivers, qualifying_trips, DriverOption, QualifyingTrip};
