// src/db/engin_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, Pagination},
        error::{map_unique_violation, AppError},
    },
    models::engin::{Engin, EnginFilter},
};

/// Colunas gravadas em create/update.
pub struct EnginRecord<'a> {
    pub name: &'a str,
    pub parc_id: Uuid,
    pub site_id: Uuid,
    pub active: bool,
    pub initial_heure_chassis: Decimal,
}

#[derive(Clone)]
pub struct EnginRepository {
    pool: PgPool,
}

impl EnginRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Página de engins + total (mesmos filtros nas duas consultas).
    pub async fn list(
        &self,
        entreprise_id: Uuid,
        filter: &EnginFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<Engin>, i64), AppError> {
        let search = filter.search.as_deref().filter(|s| !s.trim().is_empty()).map(like_pattern);

        let engins = sqlx::query_as::<_, Engin>(
            r#"
            SELECT * FROM engins
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR parc_id = $2)
              AND ($3::uuid IS NULL OR site_id = $3)
              AND ($4::bool IS NULL OR active = $4)
              AND ($5::text IS NULL OR name ILIKE $5)
            ORDER BY name ASC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.parc_id)
        .bind(filter.site_id)
        .bind(filter.active)
        .bind(search.as_deref())
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM engins
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR parc_id = $2)
              AND ($3::uuid IS NULL OR site_id = $3)
              AND ($4::bool IS NULL OR active = $4)
              AND ($5::text IS NULL OR name ILIKE $5)
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.parc_id)
        .bind(filter.site_id)
        .bind(filter.active)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((engins, total))
    }

    pub async fn find<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<Option<Engin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let engin = sqlx::query_as::<_, Engin>(
            "SELECT * FROM engins WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(engin)
    }

    pub async fn find_by_name<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<Option<Engin>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let engin = sqlx::query_as::<_, Engin>(
            "SELECT * FROM engins WHERE entreprise_id = $1 AND lower(name) = lower($2)",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(engin)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        record: &EnginRecord<'_>,
    ) -> Result<Engin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Engin>(
            r#"
            INSERT INTO engins (entreprise_id, parc_id, site_id, name, active, initial_heure_chassis)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(record.parc_id)
        .bind(record.site_id)
        .bind(record.name)
        .bind(record.active)
        .bind(record.initial_heure_chassis)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "engin",
                name: record.name.to_string(),
            })
        })
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        record: &EnginRecord<'_>,
    ) -> Result<Engin, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Engin>(
            r#"
            UPDATE engins
            SET parc_id = $3, site_id = $4, name = $5, active = $6,
                initial_heure_chassis = $7, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(record.parc_id)
        .bind(record.site_id)
        .bind(record.name)
        .bind(record.active)
        .bind(record.initial_heure_chassis)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "engin",
                name: record.name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "engin" })
    }

    pub async fn delete<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM engins WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "engin" });
        }
        Ok(())
    }

    /// Σ hrm do engin até a data (inclusive).
    pub async fn total_hrm_until(&self, entreprise_id: Uuid, engin_id: Uuid, au: NaiveDate) -> Result<Decimal, AppError> {
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(hrm), 0)
            FROM saisiehrms
            WHERE entreprise_id = $1 AND engin_id = $2 AND du <= $3
            "#,
        )
        .bind(entreprise_id)
        .bind(engin_id)
        .bind(au)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
