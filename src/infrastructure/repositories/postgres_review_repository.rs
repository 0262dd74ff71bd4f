use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::repositories::ReviewRepository;
use crate::domain::review::Review;

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: Uuid,
    tour_id: Uuid,
    author_id: Uuid,
    text: String,
    rating: i32,
    created_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: self.id,
            tour_id: self.tour_id,
            author_id: self.author_id,
            text: self.text,
            rating: self.rating,
            created_at: self.created_at,
        }
    }
}

const REVIEW_COLUMNS: &str = "id, tour_id, author_id, text, rating, created_at";

/// PostgreSQL implementation of ReviewRepository
///
/// Writes run in a transaction with the aggregate refresh so the owning
/// tour's `ratings_average` / `ratings_quantity` never drift from the rows.
pub struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Recomputes the rating aggregates of one tour from its review rows
    ///
    /// A tour with no reviews falls back to the 4.5 catalog default.
    async fn refresh_tour_ratings(
        tx: &mut Transaction<'_, Postgres>,
        tour_id: Uuid,
    ) -> Result<(), String> {
        sqlx::query(
            r#"
            UPDATE tours SET
                ratings_quantity = stats.cnt,
                ratings_average = stats.avg
            FROM (
                SELECT COUNT(*)::int AS cnt, COALESCE(AVG(rating)::float8, 4.5) AS avg
                FROM reviews WHERE tour_id = $1
            ) AS stats
            WHERE tours.id = $1
            "#,
        )
        .bind(tour_id)
        .execute(&mut **tx)
        .await
        .map_err(|e| format!("Failed to refresh tour ratings: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn create(&self, review: &Review) -> Result<(), String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| format!("Failed to start transaction: {}", e))?;

        sqlx::query(
            r#"
            INSERT INTO reviews (id, tour_id, author_id, text, rating, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(review.tour_id)
        .bind(review.author_id)
        .bind(&review.text)
        .bind(review.rating)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to create review: {}", e))?;

        Self::refresh_tour_ratings(&mut tx, review.tour_id).await?;

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit review: {}", e))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Review>, String> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to find review by id: {}", e))?;

        Ok(row.map(ReviewRow::into_review))
    }

    async fn list(&self) -> Result<Vec<Review>, String> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list reviews: {}", e))?;

        Ok(rows.into_iter().map(ReviewRow::into_review).collect())
    }

    async fn list_by_tour(&self, tour_id: Uuid) -> Result<Vec<Review>, String> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reviews WHERE tour_id = $1 ORDER BY created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(tour_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to list reviews for tour: {}", e))?;

        Ok(rows.into_iter().map(ReviewRow::into_review).collect())
    }

    async fn update(&self, review: &Review) -> Result<(), String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| format!("Failed to start transaction: {}", e))?;

        let result = sqlx::query("UPDATE reviews SET text = $2, rating = $3 WHERE id = $1")
            .bind(review.id)
            .bind(&review.text)
            .bind(review.rating)
            .execute(&mut *tx)
            .await
            .map_err(|e| format!("Failed to update review: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Review not found: {}", review.id));
        }

        Self::refresh_tour_ratings(&mut tx, review.tour_id).await?;

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit review update: {}", e))
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| format!("Failed to start transaction: {}", e))?;

        let tour_id: Option<(Uuid,)> =
            sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING tour_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| format!("Failed to delete review: {}", e))?;

        let Some((tour_id,)) = tour_id else {
            return Err(format!("Review not found: {}", id));
        };

        Self::refresh_tour_ratings(&mut tx, tour_id).await?;

        tx.commit()
            .await
            .map_err(|e| format!("Failed to commit review delete: {}", e))
    }
}
