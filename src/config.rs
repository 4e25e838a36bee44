//! Engine configuration from environment variables

use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{EngineError, Result};
use crate::pricing::RateTable;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Only needed by the Postgres store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Operators' local timezone, used to turn a booking date into a
    /// departure window.
    pub utc_offset: FixedOffset,
    pub currency: String,
    /// Carrier surcharge for medium and larger vehicles on package quotes.
    pub package_carrier_charge: Decimal,
    /// Carrier surcharge for medium and larger vehicles on route quotes.
    pub route_carrier_charge: Decimal,
    pub vehicle_model_cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 5,
            // IST
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap_or_else(|| Utc.fix()),
            currency: "INR".to_string(),
            package_carrier_charge: dec!(250),
            route_carrier_charge: dec!(200),
            vehicle_model_cache_ttl: Duration::from_secs(10 * 60),
        }
    }
}

impl EngineConfig {
    /// Load from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let offset_minutes: i32 = parse_var(
            &lookup,
            "ENGINE_UTC_OFFSET_MINUTES",
            defaults.utc_offset.local_minus_utc() / 60,
        )?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            EngineError::Config(format!(
                "ENGINE_UTC_OFFSET_MINUTES out of range: {}",
                offset_minutes
            ))
        })?;

        let cache_ttl_secs: u64 = parse_var(
            &lookup,
            "VEHICLE_MODEL_CACHE_TTL_SECS",
            defaults.vehicle_model_cache_ttl.as_secs(),
        )?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse_var(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            utc_offset,
            currency: lookup("ENGINE_CURRENCY").unwrap_or(defaults.currency),
            package_carrier_charge: parse_var(
                &lookup,
                "PACKAGE_CARRIER_CHARGE",
                defaults.package_carrier_charge,
            )?,
            route_carrier_charge: parse_var(
                &lookup,
                "ROUTE_CARRIER_CHARGE",
                defaults.route_carrier_charge,
            )?,
            vehicle_model_cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }

    /// Default rate tables with the configured carrier surcharges applied
    pub fn rate_table(&self) -> RateTable {
        let mut table = RateTable::default();
        table.package_carrier.standard = self.package_carrier_charge;
        table.route_carrier.standard = self.route_carrier_charge;
        table
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| EngineError::Config(format!("{} must be a valid number, got '{}'", key, raw))),
    }
}
