//! Repositorio de viajes
//!
//! El documento del viaje vive en columnas JSONB; los campos por los que se
//! filtra se duplican en columnas indexadas. Las transiciones de estado se
//! aplican con un único UPDATE condicionado al estado actual, y el resto de
//! escrituras tocan sólo su propio campo para no pisar el estado.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    models::travel::{
        Guardian, PaymentDetails, Student, Travel, TravelDetails, TravelQuery, TravelStatus,
    },
    repositories::{like_pattern, map_unique_violation},
    utils::{
        errors::{not_found_error, AppError, AppResult},
        validation::utc_day_bounds,
    },
};

#[async_trait]
pub trait TravelRepository: Send + Sync {
    /// Falla con `Conflict` si el número de viaje ya existe
    async fn insert(&self, travel: Travel) -> AppResult<Travel>;
    /// Insertar sólo si la franja del viaje tiene menos de `seats` reservas
    /// activas; el conteo y el insert son atómicos. `None` si está llena.
    async fn insert_within_capacity(&self, travel: Travel, seats: u32) -> AppResult<Option<Travel>>;
    async fn exists_by_travel_number(&self, travel_number: &str) -> AppResult<bool>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Travel>>;
    async fn find_by_travel_number(&self, travel_number: &str) -> AppResult<Option<Travel>>;
    /// Más recientes primero
    async fn find_all(&self, query: &TravelQuery) -> AppResult<Vec<Travel>>;
    /// Reservas no canceladas de una franja
    async fn count_active_bookings(&self, schedule_id: Uuid, departure_time: &str) -> AppResult<i64>;
    /// Reemplaza sólo los detalles de pago
    async fn update_payment(&self, id: Uuid, payment: &PaymentDetails) -> AppResult<Option<Travel>>;
    /// Reemplaza tutor y/o alumno; `None` deja el valor guardado
    async fn update_contacts(
        &self,
        id: Uuid,
        guardian: Option<&Guardian>,
        student: Option<&Student>,
    ) -> AppResult<Option<Travel>>;
    /// Cambia el estado sólo si el actual está en `from`; `None` si no aplicó
    async fn update_status(
        &self,
        id: Uuid,
        from: &[TravelStatus],
        to: TravelStatus,
    ) -> AppResult<Option<Travel>>;
    /// Cambia en bloque los viajes de una franja cuyo estado esté en `from`
    async fn bulk_update_status(
        &self,
        schedule_id: Uuid,
        departure_time: &str,
        from: &[TravelStatus],
        to: TravelStatus,
    ) -> AppResult<Vec<Travel>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, sqlx::FromRow)]
struct TravelRow {
    id: Uuid,
    travel_number: String,
    status: String,
    school_id: Uuid,
    travel_details: Json<TravelDetails>,
    guardian: Json<Guardian>,
    student: Json<Student>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TravelRow> for Travel {
    type Error = AppError;

    fn try_from(row: TravelRow) -> Result<Self, Self::Error> {
        let status = TravelStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Internal(format!(
                "Travel {} has unknown status '{}'",
                row.travel_number, row.status
            ))
        })?;

        Ok(Self {
            id: row.id,
            travel_details: row.travel_details.0,
            guardian: row.guardian.0,
            student: row.student.0,
            school: row.school_id,
            status,
            travel_number: row.travel_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_travels(rows: Vec<TravelRow>) -> AppResult<Vec<Travel>> {
    rows.into_iter().map(Travel::try_from).collect()
}

fn status_names(statuses: &[TravelStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

const TRAVEL_COLUMNS: &str = "id, travel_number, status, school_id, travel_details, guardian, \
    student, created_at, updated_at";

const COUNT_ACTIVE_BOOKINGS: &str = r#"
    SELECT COUNT(*) FROM travels
    WHERE schedule_id = $1 AND departure_time = $2 AND status <> $3
"#;

async fn insert_row<'e, E>(executor: E, travel: &Travel) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    let details = &travel.travel_details;
    sqlx::query(
        r#"
        INSERT INTO travels (
            id, travel_number, status, school_id, schedule_id, transporter_id,
            departure_time, destination, plan_date, travel_details, guardian, student,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(travel.id)
    .bind(&travel.travel_number)
    .bind(travel.status.as_str())
    .bind(travel.school)
    .bind(details.schedule)
    .bind(details.transporter.id)
    .bind(&details.departure_time)
    .bind(&details.destination)
    .bind(details.plan.date)
    .bind(Json(details))
    .bind(Json(&travel.guardian))
    .bind(Json(&travel.student))
    .bind(travel.created_at)
    .bind(travel.updated_at)
    .execute(executor)
    .await
    .map_err(|e| {
        map_unique_violation(
            e,
            format!("Travel number '{}' already exists", travel.travel_number),
        )
    })?;

    Ok(())
}

pub struct PgTravelRepository {
    pool: PgPool,
}

impl PgTravelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TravelRepository for PgTravelRepository {
    async fn insert(&self, travel: Travel) -> AppResult<Travel> {
        insert_row(&self.pool, &travel).await?;
        Ok(travel)
    }

    async fn insert_within_capacity(&self, travel: Travel, seats: u32) -> AppResult<Option<Travel>> {
        let details = &travel.travel_details;
        let mut tx = self.pool.begin().await?;

        // Serializa las reservas del mismo schedule hasta el commit
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM schedules WHERE id = $1 FOR UPDATE")
                .bind(details.schedule)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(not_found_error("Schedule", &details.schedule.to_string()));
        }

        let booked: (i64,) = sqlx::query_as(COUNT_ACTIVE_BOOKINGS)
            .bind(details.schedule)
            .bind(&details.departure_time)
            .bind(TravelStatus::Cancelled.as_str())
            .fetch_one(&mut *tx)
            .await?;
        if booked.0 >= i64::from(seats) {
            tx.rollback().await?;
            return Ok(None);
        }

        insert_row(&mut *tx, &travel).await?;
        tx.commit().await?;

        Ok(Some(travel))
    }

    async fn exists_by_travel_number(&self, travel_number: &str) -> AppResult<bool> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM travels WHERE travel_number = $1)")
                .bind(travel_number)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Travel>> {
        let row = sqlx::query_as::<_, TravelRow>(&format!(
            "SELECT {} FROM travels WHERE id = $1",
            TRAVEL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Travel::try_from).transpose()
    }

    async fn find_by_travel_number(&self, travel_number: &str) -> AppResult<Option<Travel>> {
        let row = sqlx::query_as::<_, TravelRow>(&format!(
            "SELECT {} FROM travels WHERE travel_number = $1",
            TRAVEL_COLUMNS
        ))
        .bind(travel_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Travel::try_from).transpose()
    }

    async fn find_all(&self, query: &TravelQuery) -> AppResult<Vec<Travel>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM travels WHERE 1 = 1",
            TRAVEL_COLUMNS
        ));

        if let Some(destination) = &query.destination {
            builder
                .push(" AND destination ILIKE ")
                .push_bind(like_pattern(destination));
        }
        if let Some(date) = query.date {
            let (start, end) = utc_day_bounds(date);
            builder
                .push(" AND plan_date >= ")
                .push_bind(start)
                .push(" AND plan_date < ")
                .push_bind(end);
        }
        if let Some(departure_time) = &query.departure_time {
            builder
                .push(" AND departure_time = ")
                .push_bind(departure_time.clone());
        }
        if let Some(schedule_id) = query.schedule_id {
            builder.push(" AND schedule_id = ").push_bind(schedule_id);
        }
        if let Some(transporter_id) = query.transporter_id {
            builder.push(" AND transporter_id = ").push_bind(transporter_id);
        }
        if let Some(school_id) = query.school_id {
            builder.push(" AND school_id = ").push_bind(school_id);
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build_query_as::<TravelRow>()
            .fetch_all(&self.pool)
            .await?;

        into_travels(rows)
    }

    async fn count_active_bookings(&self, schedule_id: Uuid, departure_time: &str) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(COUNT_ACTIVE_BOOKINGS)
            .bind(schedule_id)
            .bind(departure_time)
            .bind(TravelStatus::Cancelled.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn update_payment(&self, id: Uuid, payment: &PaymentDetails) -> AppResult<Option<Travel>> {
        let row = sqlx::query_as::<_, TravelRow>(&format!(
            r#"
            UPDATE travels
            SET travel_details = jsonb_set(travel_details, '{{paymentDetails}}', $2),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TRAVEL_COLUMNS
        ))
        .bind(id)
        .bind(Json(payment))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Travel::try_from).transpose()
    }

    async fn update_contacts(
        &self,
        id: Uuid,
        guardian: Option<&Guardian>,
        student: Option<&Student>,
    ) -> AppResult<Option<Travel>> {
        let row = sqlx::query_as::<_, TravelRow>(&format!(
            r#"
            UPDATE travels
            SET guardian = COALESCE($2, guardian),
                student = COALESCE($3, student),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TRAVEL_COLUMNS
        ))
        .bind(id)
        .bind(guardian.map(Json))
        .bind(student.map(Json))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Travel::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[TravelStatus],
        to: TravelStatus,
    ) -> AppResult<Option<Travel>> {
        let row = sqlx::query_as::<_, TravelRow>(&format!(
            r#"
            UPDATE travels SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = ANY($3)
            RETURNING {}
            "#,
            TRAVEL_COLUMNS
        ))
        .bind(id)
        .bind(to.as_str())
        .bind(status_names(from))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Travel::try_from).transpose()
    }

    async fn bulk_update_status(
        &self,
        schedule_id: Uuid,
        departure_time: &str,
        from: &[TravelStatus],
        to: TravelStatus,
    ) -> AppResult<Vec<Travel>> {
        let rows = sqlx::query_as::<_, TravelRow>(&format!(
            r#"
            UPDATE travels SET status = $3, updated_at = NOW()
            WHERE schedule_id = $1 AND departure_time = $2 AND status = ANY($4)
            RETURNING {}
            "#,
            TRAVEL_COLUMNS
        ))
        .bind(schedule_id)
        .bind(departure_time)
        .bind(to.as_str())
        .bind(status_names(from))
        .fetch_all(&self.pool)
        .await?;

        let mut travels = into_travels(rows)?;
        travels.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(travels)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM travels WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
