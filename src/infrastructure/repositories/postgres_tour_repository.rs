use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::repositories::tour_repository::{SortKey, TourFilter, TourRepository, TourStats};
use crate::domain::tour::value_objects::Difficulty;
use crate::domain::tour::Tour;

/// Internal struct mapping database rows to the Tour record
///
/// Queries are runtime-checked (`query_as` + `bind`), so the crate builds
/// without a database connection.
#[derive(Debug, FromRow)]
struct TourRow {
    id: Uuid,
    name: String,
    slug: String,
    duration_days: i32,
    max_group_size: i32,
    difficulty: String,
    ratings_average: f64,
    ratings_quantity: i32,
    price: Decimal,
    price_discount: Option<Decimal>,
    summary: String,
    description: Option<String>,
    image_cover: Option<String>,
    start_dates: Vec<DateTime<Utc>>,
    secret: bool,
    created_at: DateTime<Utc>,
}

impl TourRow {
    fn into_tour(self) -> Result<Tour, String> {
        Ok(Tour {
            id: self.id,
            name: self.name,
            slug: self.slug,
            duration_days: self.duration_days,
            max_group_size: self.max_group_size,
            difficulty: Difficulty::parse(&self.difficulty)
                .map_err(|e| format!("Invalid difficulty from database: {}", e))?,
            ratings_average: self.ratings_average,
            ratings_quantity: self.ratings_quantity,
            price: self.price,
            price_discount: self.price_discount,
            summary: self.summary,
            description: self.description,
            image_cover: self.image_cover,
            start_dates: self.start_dates,
            secret: self.secret,
            created_at: self.created_at,
        })
    }
}

const TOUR_COLUMNS: &str = "id, name, slug, duration_days, max_group_size, difficulty, \
     ratings_average, ratings_quantity, price, price_discount, summary, description, \
     image_cover, start_dates, secret, created_at";

fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::Price => "price",
        SortKey::RatingsAverage => "ratings_average",
        SortKey::Duration => "duration_days",
        SortKey::CreatedAt => "created_at",
    }
}

/// PostgreSQL implementation of TourRepository
pub struct PostgresTourRepository {
    pool: PgPool,
}

impl PostgresTourRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TourRepository for PostgresTourRepository {
    async fn create(&self, tour: &Tour) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO tours (
                id, name, slug, duration_days, max_group_size, difficulty,
                ratings_average, ratings_quantity, price, price_discount,
                summary, description, image_cover, start_dates, secret, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(tour.id)
        .bind(&tour.name)
        .bind(&tour.slug)
        .bind(tour.duration_days)
        .bind(tour.max_group_size)
        .bind(tour.difficulty.as_str())
        .bind(tour.ratings_average)
        .bind(tour.ratings_quantity)
        .bind(tour.price)
        .bind(tour.price_discount)
        .bind(&tour.summary)
        .bind(&tour.description)
        .bind(&tour.image_cover)
        .bind(&tour.start_dates)
        .bind(tour.secret)
        .bind(tour.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create tour: {}", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tour>, String> {
        let row: Option<TourRow> =
            sqlx::query_as(&format!("SELECT {} FROM tours WHERE id = $1", TOUR_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| format!("Failed to find tour by id: {}", e))?;

        row.map(TourRow::into_tour).transpose()
    }

    async fn list(&self, filter: &TourFilter) -> Result<Vec<Tour>, String> {
        let mut query: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM tours WHERE secret = FALSE",
            TOUR_COLUMNS
        ));

        if let Some(difficulty) = filter.difficulty {
            query.push(" AND difficulty = ").push_bind(difficulty.as_str());
        }
        if let Some(price_gte) = filter.price_gte {
            query.push(" AND price >= ").push_bind(price_gte);
        }
        if let Some(price_lte) = filter.price_lte {
            query.push(" AND price <= ").push_bind(price_lte);
        }
        if let Some(duration_gte) = filter.duration_gte {
            query.push(" AND duration_days >= ").push_bind(duration_gte);
        }
        if let Some(duration_lte) = filter.duration_lte {
            query.push(" AND duration_days <= ").push_bind(duration_lte);
        }
        if let Some(ratings_gte) = filter.ratings_gte {
            query.push(" AND ratings_average >= ").push_bind(ratings_gte);
        }

        match filter.sort {
            Some((key, descending)) => {
                query
                    .push(" ORDER BY ")
                    .push(sort_column(key))
                    .push(if descending { " DESC" } else { " ASC" });
                if key != SortKey::RatingsAverage {
                    query.push(", ratings_average DESC");
                }
            }
            None => {
                query.push(" ORDER BY created_at DESC");
            }
        }

        query
            .push(" LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset()));

        let rows: Vec<TourRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| format!("Failed to list tours: {}", e))?;

        rows.into_iter().map(TourRow::into_tour).collect()
    }

    async fn update(&self, tour: &Tour) -> Result<(), String> {
        let result = sqlx::query(
            r#"
            UPDATE tours SET
                name = $2, slug = $3, duration_days = $4, max_group_size = $5,
                difficulty = $6, ratings_average = $7, ratings_quantity = $8,
                price = $9, price_discount = $10, summary = $11, description = $12,
                image_cover = $13, start_dates = $14, secret = $15
            WHERE id = $1
            "#,
        )
        .bind(tour.id)
        .bind(&tour.name)
        .bind(&tour.slug)
        .bind(tour.duration_days)
        .bind(tour.max_group_size)
        .bind(tour.difficulty.as_str())
        .bind(tour.ratings_average)
        .bind(tour.ratings_quantity)
        .bind(tour.price)
        .bind(tour.price_discount)
        .bind(&tour.summary)
        .bind(&tour.description)
        .bind(&tour.image_cover)
        .bind(&tour.start_dates)
        .bind(tour.secret)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to update tour: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Tour not found: {}", tour.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), String> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to delete tour: {}", e))?;

        if result.rows_affected() == 0 {
            return Err(format!("Tour not found: {}", id));
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Vec<TourStats>, String> {
        #[derive(FromRow)]
        struct StatsRow {
            difficulty: String,
            num_tours: i64,
            avg_rating: f64,
            avg_price: Decimal,
            min_price: Decimal,
            max_price: Decimal,
        }

        let rows: Vec<StatsRow> = sqlx::query_as(
            r#"
            SELECT
                difficulty,
                COUNT(*) AS num_tours,
                AVG(ratings_average)::float8 AS avg_rating,
                AVG(price) AS avg_price,
                MIN(price) AS min_price,
                MAX(price) AS max_price
            FROM tours
            WHERE secret = FALSE
            GROUP BY difficulty
            ORDER BY avg_price
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to aggregate tour stats: {}", e))?;

        rows.into_iter()
            .map(|row| {
                Ok(TourStats {
                    difficulty: Difficulty::parse(&row.difficulty)
                        .map_err(|e| format!("Invalid difficulty from database: {}", e))?,
                    num_tours: row.num_tours,
                    avg_rating: row.avg_rating,
                    avg_price: row.avg_price,
                    min_price: row.min_price,
                    max_price: row.max_price,
                })
            })
            .collect()
    }
}
