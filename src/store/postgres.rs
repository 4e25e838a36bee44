//! Postgres record store.
//!
//! All queries use sqlx with runtime-checked `query_as` and `FromRow` rows.
//! Status columns are plain text and are parsed into domain enums here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgExecutor, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::allocation::assignment::{AssignmentPlan, AssignmentReceipt};
use crate::config::EngineConfig;
use crate::error::{AssignmentStep, EngineError, Result, StoreError};
use crate::models::{
    AcType, AddOn, BookingRequest, BookingStatus, Driver, DriverBooking, Hotel, HotelBooking,
    PricingSnapshot, Route, RouteSegment, Sightseeing, Trip, TripStatus, VehicleCategory,
    VehicleModel,
};
use crate::store::{BookingStore, DayWindow, StoreResult};

/// Booking from bookings
#[derive(Debug, Clone, FromRow)]
struct BookingRow {
    id: Uuid,
    trip_id: Option<Uuid>,
    requested_date: NaiveDate,
    seat_count: i32,
    status: String,
    driver_id: Option<Uuid>,
}

impl TryFrom<BookingRow> for BookingRequest {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            trip_id: row.trip_id,
            requested_date: row.requested_date,
            seat_count: row.seat_count,
            status: parse_booking_status("bookings", &row.status)?,
            driver_id: row.driver_id,
        })
    }
}

/// Trip from trips
#[derive(Debug, Clone, FromRow)]
struct TripRow {
    id: Uuid,
    route_id: Option<Uuid>,
    departure_at: DateTime<Utc>,
    driver_id: Option<Uuid>,
    vehicle_model_id: Option<Uuid>,
    seat_capacity: i32,
    status: String,
}

impl TryFrom<TripRow> for Trip {
    type Error = StoreError;

    fn try_from(row: TripRow) -> StoreResult<Self> {
        let status = row.status.parse::<TripStatus>().map_err(|value| StoreError::Decode {
            table: "trips",
            column: "status",
            value,
        })?;
        Ok(Self {
            id: row.id,
            route_id: row.route_id,
            departure_at: row.departure_at,
            driver_id: row.driver_id,
            vehicle_model_id: row.vehicle_model_id,
            seat_capacity: row.seat_capacity,
            status,
        })
    }
}

/// Route from routes
#[derive(Debug, Clone, FromRow)]
struct RouteRow {
    id: Uuid,
    name: String,
    segments: serde_json::Value,
}

impl TryFrom<RouteRow> for Route {
    type Error = StoreError;

    fn try_from(row: RouteRow) -> StoreResult<Self> {
        let segments: Vec<RouteSegment> =
            serde_json::from_value(row.segments.clone()).map_err(|_| StoreError::Decode {
                table: "routes",
                column: "segments",
                value: row.segments.to_string(),
            })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            segments,
        })
    }
}

/// Driver from driver_profiles
#[derive(Debug, Clone, FromRow)]
struct DriverRow {
    id: Uuid,
    name: String,
}

/// VehicleModel from vehicles_model
#[derive(Debug, Clone, FromRow)]
struct VehicleModelRow {
    id: Uuid,
    name: String,
    category: String,
    ac_type: String,
    has_carrier: bool,
}

impl From<VehicleModelRow> for VehicleModel {
    fn from(row: VehicleModelRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: VehicleCategory::parse(&row.category),
            ac_type: AcType::parse(&row.ac_type),
            has_carrier: row.has_carrier,
        }
    }
}

/// HotelBooking from hotel_bookings
#[derive(Debug, Clone, FromRow)]
struct HotelBookingRow {
    id: Uuid,
    hotel_id: Option<Uuid>,
    status: String,
}

impl TryFrom<HotelBookingRow> for HotelBooking {
    type Error = StoreError;

    fn try_from(row: HotelBookingRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            hotel_id: row.hotel_id,
            status: parse_booking_status("hotel_bookings", &row.status)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct DriverBookingRow {
    id: Uuid,
    driver_id: Uuid,
    booking_id: Uuid,
    trip_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct SightseeingRow {
    id: Uuid,
    name: String,
    adult_fee: Decimal,
    child_fee: Decimal,
}

#[derive(Debug, Clone, FromRow)]
struct HotelRow {
    id: Uuid,
    name: String,
    manual_price: Decimal,
}

#[derive(Debug, Clone, FromRow)]
struct AddOnRow {
    id: Uuid,
    name: String,
    price: Decimal,
}

#[derive(Debug, Clone, FromRow)]
struct PricingSnapshotRow {
    id: Uuid,
    route_id: Option<Uuid>,
    vehicle_model_id: Uuid,
    trip_way: String,
    total_distance_km: Decimal,
    total_price: Decimal,
    currency: String,
    breakdown: serde_json::Value,
    created_at: DateTime<Utc>,
}

fn parse_booking_status(table: &'static str, value: &str) -> StoreResult<BookingStatus> {
    value.parse::<BookingStatus>().map_err(|value| StoreError::Decode {
        table,
        column: "status",
        value,
    })
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// Writes shared by the plain trait methods and the confirm transaction.

async fn write_booking<'e, E: PgExecutor<'e>>(executor: E, booking: &BookingRequest) -> StoreResult<BookingRequest> {
    sqlx::query_as::<_, BookingRow>(
        r#"
        UPDATE bookings
        SET trip_id = $2, status = $3, driver_id = $4
        WHERE id = $1
        RETURNING id, trip_id, requested_date, seat_count, status, driver_id
        "#,
    )
    .bind(booking.id)
    .bind(booking.trip_id)
    .bind(booking.status.as_str())
    .bind(booking.driver_id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::MissingRow {
        table: "bookings",
        id: booking.id,
    })?
    .try_into()
}

async fn write_driver_booking<'e, E: PgExecutor<'e>>(executor: E, link: &DriverBooking) -> StoreResult<DriverBooking> {
    let row = sqlx::query_as::<_, DriverBookingRow>(
        r#"
        INSERT INTO driver_bookings (id, driver_id, booking_id, trip_id, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, driver_id, booking_id, trip_id, created_at
        "#,
    )
    .bind(link.id)
    .bind(link.driver_id)
    .bind(link.booking_id)
    .bind(link.trip_id)
    .bind(link.created_at)
    .fetch_one(executor)
    .await?;

    Ok(DriverBooking {
        id: row.id,
        driver_id: row.driver_id,
        booking_id: row.booking_id,
        trip_id: row.trip_id,
        created_at: row.created_at,
    })
}

async fn write_trip_status<'e, E: PgExecutor<'e>>(executor: E, id: Uuid, status: TripStatus) -> StoreResult<Trip> {
    sqlx::query_as::<_, TripRow>(
        r#"
        UPDATE trips
        SET status = $2
        WHERE id = $1
        RETURNING id, route_id, departure_at, driver_id, vehicle_model_id, seat_capacity, status
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::MissingRow { table: "trips", id })?
    .try_into()
}

/// Record store backed by a Postgres pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from `DATABASE_URL` in the engine configuration
    pub async fn connect(config: &EngineConfig) -> Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .ok_or_else(|| EngineError::Config("DATABASE_URL must be set for the Postgres store".to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(url)
            .await
            .map_err(|e| EngineError::store("connect to database")(e.into()))?;

        info!(
            "Connected to database with {} max connections",
            config.database_max_connections
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn booking(&self, id: Uuid) -> StoreResult<Option<BookingRequest>> {
        sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, trip_id, requested_date, seat_count, status, driver_id
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(BookingRequest::try_from)
        .transpose()
    }

    async fn trip(&self, id: Uuid) -> StoreResult<Option<Trip>> {
        sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, route_id, departure_at, driver_id, vehicle_model_id, seat_capacity, status
            FROM trips
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Trip::try_from)
        .transpose()
    }

    async fn route(&self, id: Uuid) -> StoreResult<Option<Route>> {
        sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT id, name, segments
            FROM routes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Route::try_from)
        .transpose()
    }

    async fn assigned_trips_on_route(&self, route_id: Uuid, window: DayWindow) -> StoreResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, route_id, departure_at, driver_id, vehicle_model_id, seat_capacity, status
            FROM trips
            WHERE route_id = $1
              AND departure_at >= $2
              AND departure_at < $3
              AND driver_id IS NOT NULL
            ORDER BY departure_at ASC
            "#,
        )
        .bind(route_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn seat_holding_bookings(&self, trip_ids: &[Uuid]) -> StoreResult<Vec<BookingRequest>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, trip_id, requested_date, seat_count, status, driver_id
            FROM bookings
            WHERE trip_id = ANY($1)
              AND status IN ('pending', 'upcoming')
            "#,
        )
        .bind(trip_ids)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn drivers(&self, ids: &[Uuid]) -> StoreResult<Vec<Driver>> {
        let rows = sqlx::query_as::<_, DriverRow>(
            r#"
            SELECT id, name
            FROM driver_profiles
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Driver { id: r.id, name: r.name })
            .collect())
    }

    async fn vehicle_models(&self, ids: &[Uuid]) -> StoreResult<Vec<VehicleModel>> {
        let rows = sqlx::query_as::<_, VehicleModelRow>(
            r#"
            SELECT id, name, category, ac_type, has_carrier
            FROM vehicles_model
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VehicleModel::from).collect())
    }

    async fn update_booking(&self, booking: &BookingRequest) -> StoreResult<BookingRequest> {
        write_booking(&self.pool, booking).await
    }

    async fn update_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<BookingRequest> {
        sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings
            SET status = $2
            WHERE id = $1
            RETURNING id, trip_id, requested_date, seat_count, status, driver_id
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::MissingRow { table: "bookings", id })?
        .try_into()
    }

    async fn insert_driver_booking(&self, link: &DriverBooking) -> StoreResult<DriverBooking> {
        write_driver_booking(&self.pool, link).await
    }

    async fn delete_driver_booking(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM driver_bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MissingRow {
                table: "driver_bookings",
                id,
            });
        }
        Ok(())
    }

    async fn update_trip_status(&self, id: Uuid, status: TripStatus) -> StoreResult<Trip> {
        write_trip_status(&self.pool, id, status).await
    }

    async fn hotel_booking(&self, id: Uuid) -> StoreResult<Option<HotelBooking>> {
        sqlx::query_as::<_, HotelBookingRow>(
            r#"
            SELECT id, hotel_id, status
            FROM hotel_bookings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(HotelBooking::try_from)
        .transpose()
    }

    async fn update_hotel_booking_status(&self, id: Uuid, status: BookingStatus) -> StoreResult<HotelBooking> {
        sqlx::query_as::<_, HotelBookingRow>(
            r#"
            UPDATE hotel_bookings
            SET status = $2
            WHERE id = $1
            RETURNING id, hotel_id, status
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::MissingRow {
            table: "hotel_bookings",
            id,
        })?
        .try_into()
    }

    async fn sightseeing(&self, ids: &[Uuid]) -> StoreResult<Vec<Sightseeing>> {
        let rows = sqlx::query_as::<_, SightseeingRow>(
            r#"
            SELECT id, name, adult_fee, child_fee
            FROM sightseeing
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Sightseeing {
                id: r.id,
                name: r.name,
                adult_fee: r.adult_fee,
                child_fee: r.child_fee,
            })
            .collect())
    }

    async fn hotels(&self, ids: &[Uuid]) -> StoreResult<Vec<Hotel>> {
        let rows = sqlx::query_as::<_, HotelRow>(
            r#"
            SELECT id, name, manual_price
            FROM hotels_model
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Hotel {
                id: r.id,
                name: r.name,
                manual_price: r.manual_price,
            })
            .collect())
    }

    async fn add_ons(&self, ids: &[Uuid]) -> StoreResult<Vec<AddOn>> {
        let rows = sqlx::query_as::<_, AddOnRow>(
            r#"
            SELECT id, name, price
            FROM add_ons
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| AddOn {
                id: r.id,
                name: r.name,
                price: r.price,
            })
            .collect())
    }

    async fn insert_pricing_snapshot(&self, snapshot: &PricingSnapshot) -> StoreResult<PricingSnapshot> {
        let row = sqlx::query_as::<_, PricingSnapshotRow>(
            r#"
            INSERT INTO pricing_calculations
                (id, route_id, vehicle_model_id, trip_way, total_distance_km,
                 total_price, currency, breakdown, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, route_id, vehicle_model_id, trip_way, total_distance_km,
                      total_price, currency, breakdown, created_at
            "#,
        )
        .bind(snapshot.id)
        .bind(snapshot.route_id)
        .bind(snapshot.vehicle_model_id)
        .bind(&snapshot.trip_way)
        .bind(snapshot.total_distance_km)
        .bind(snapshot.total_price)
        .bind(&snapshot.currency)
        .bind(&snapshot.breakdown)
        .bind(snapshot.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(PricingSnapshot {
            id: row.id,
            route_id: row.route_id,
            vehicle_model_id: row.vehicle_model_id,
            trip_way: row.trip_way,
            total_distance_km: row.total_distance_km,
            total_price: row.total_price,
            currency: row.currency,
            breakdown: row.breakdown,
            created_at: row.created_at,
        })
    }

    /// Runs all three confirm writes in one transaction; any failure rolls
    /// the whole confirm back.
    async fn confirm_assignment(&self, plan: &AssignmentPlan) -> Result<AssignmentReceipt> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| plan.failure(AssignmentStep::AttachDriver, true, e.into()))?;

        let booking = write_booking(&mut *tx, &plan.attached_booking())
            .await
            .map_err(|e| plan.failure(AssignmentStep::AttachDriver, true, e))?;

        let link = write_driver_booking(&mut *tx, &plan.link())
            .await
            .map_err(|e| plan.failure(AssignmentStep::LinkDriverBooking, true, e))?;

        let trip = write_trip_status(&mut *tx, plan.trip_id, TripStatus::Booked)
            .await
            .map_err(|e| plan.failure(AssignmentStep::MarkTripBooked, true, e))?;

        // A failed commit may or may not have applied server-side.
        tx.commit().await.map_err(|e| {
            warn!("Commit of confirm for booking {} failed: {}", plan.booking.id, e);
            plan.failure(AssignmentStep::MarkTripBooked, false, e.into())
        })?;

        Ok(AssignmentReceipt { booking, link, trip })
    }
}
