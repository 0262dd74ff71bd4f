use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::booking::value_objects::BookingStatus;
use crate::domain::booking::Booking;
use crate::domain::repositories::BookingRepository;

#[derive(Debug, FromRow)]
struct BookingRow {
    id: Uuid,
    tour_id: Uuid,
    user_id: Uuid,
    price: Decimal,
    session_id: String,
    status: String,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, String> {
        let status = BookingStatus::parse(&self.status)
            .map_err(|e| format!("Invalid booking status from database: {}", e))?;
        Ok(Booking::from_parts(
            self.id,
            self.tour_id,
            self.user_id,
            self.price,
            self.session_id,
            status,
            self.created_at,
            self.paid_at,
        ))
    }
}

const BOOKING_COLUMNS: &str =
    "id, tour_id, user_id, price, session_id, status, created_at, paid_at";

/// PostgreSQL implementation of BookingRepository
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn save(&self, booking: &Booking) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, tour_id, user_id, price, session_id, status, created_at, paid_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                paid_at = EXCLUDED.paid_at
            "#,
        )
        .bind(booking.id())
        .bind(booking.tour_id())
        .bind(booking.user_id())
        .bind(booking.price())
        .bind(booking.session_id())
        .bind(booking.status().as_str())
        .bind(booking.created_at())
        .bind(booking.paid_at())
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to save booking: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, String> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find booking by id: {}", e))?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Booking>, String> {
        let row: Option<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE session_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find booking by session: {}", e))?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list(&self) -> Result<Vec<Booking>, String> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list bookings: {}", e))?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Booking>, String> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list bookings for user: {}", e))?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to delete booking: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Booking not found: {}", id));
        }
        Ok(())
    }
}
