//! Booking allocation and tariff engine for the travel operations dashboard.
//!
//! The capacity resolver lists drivers who can serve a pending booking on a
//! given day, and the confirm action attaches one of them. The tariff
//! calculator prices multi-day packages, standalone routes and city
//! transfers. Both read and write through a [`store::BookingStore`].

pub mod allocation;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pricing;
pub mod store;
pub mod telemetry;

pub use cache::AppCache;
pub use config::EngineConfig;
pub use engine::BookingEngine;
pub use error::{EngineError, Result, StoreError};
pub use store::{BookingStore, MemoryStore, PgStore};
