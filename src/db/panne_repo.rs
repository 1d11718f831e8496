// src/db/panne_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{like_pattern, Pagination},
        error::{map_unique_violation, AppError},
    },
    models::panne::{Panne, PanneFilter, TypePanne},
};

#[derive(Clone)]
pub struct PanneRepository {
    pool: PgPool,
}

impl PanneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Types de panne
    // ---

    pub async fn list_typepannes(&self, entreprise_id: Uuid) -> Result<Vec<TypePanne>, AppError> {
        let rows = sqlx::query_as::<_, TypePanne>(
            "SELECT * FROM typepannes WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_typepanne<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TypePanne>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, TypePanne>(
            "SELECT * FROM typepannes WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn find_typepanne_by_name<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<Option<TypePanne>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, TypePanne>(
            "SELECT * FROM typepannes WHERE entreprise_id = $1 AND lower(name) = lower($2)",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn create_typepanne<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<TypePanne, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TypePanne>(
            r#"
            INSERT INTO typepannes (entreprise_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "typepanne",
                name: name.to_string(),
            })
        })
    }

    pub async fn update_typepanne<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<TypePanne, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TypePanne>(
            r#"
            UPDATE typepannes SET name = $3, description = $4, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "typepanne",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "typepanne" })
    }

    pub async fn delete_typepanne<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM typepannes WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "typepanne" });
        }
        Ok(())
    }

    // ---
    // Pannes
    // ---

    pub async fn list_pannes(
        &self,
        entreprise_id: Uuid,
        filter: &PanneFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<Panne>, i64), AppError> {
        let search = filter.search.as_deref().filter(|s| !s.trim().is_empty()).map(like_pattern);

        let pannes = sqlx::query_as::<_, Panne>(
            r#"
            SELECT p.* FROM pannes p
            WHERE p.entreprise_id = $1
              AND ($2::uuid IS NULL OR p.typepanne_id = $2)
              AND ($3::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM panne_parcs pp WHERE pp.panne_id = p.id AND pp.parc_id = $3))
              AND ($4::text IS NULL OR p.name ILIKE $4)
            ORDER BY p.name ASC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.typepanne_id)
        .bind(filter.parc_id)
        .bind(search.as_deref())
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM pannes p
            WHERE p.entreprise_id = $1
              AND ($2::uuid IS NULL OR p.typepanne_id = $2)
              AND ($3::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM panne_parcs pp WHERE pp.panne_id = p.id AND pp.parc_id = $3))
              AND ($4::text IS NULL OR p.name ILIKE $4)
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.typepanne_id)
        .bind(filter.parc_id)
        .bind(search.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok((pannes, total))
    }

    pub async fn find_panne<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<Option<Panne>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let panne = sqlx::query_as::<_, Panne>(
            "SELECT * FROM pannes WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(panne)
    }

    pub async fn find_panne_by_name<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<Option<Panne>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let panne = sqlx::query_as::<_, Panne>(
            "SELECT * FROM pannes WHERE entreprise_id = $1 AND lower(name) = lower($2)",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(panne)
    }

    pub async fn create_panne<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        typepanne_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Panne, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Panne>(
            r#"
            INSERT INTO pannes (entreprise_id, typepanne_id, name, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(typepanne_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "panne",
                name: name.to_string(),
            })
        })
    }

    pub async fn update_panne<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        typepanne_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Panne, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Panne>(
            r#"
            UPDATE pannes SET typepanne_id = $3, name = $4, description = $5, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(typepanne_id)
        .bind(name)
        .bind(description)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "panne",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "panne" })
    }

    pub async fn delete_panne<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM pannes WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "panne" });
        }
        Ok(())
    }

    // ---
    // Parcs da panne
    // ---

    pub async fn parc_ids<'e, E>(&self, executor: E, panne_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT parc_id FROM panne_parcs WHERE panne_id = $1 ORDER BY parc_id",
        )
        .bind(panne_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    pub async fn replace_parcs(&self, conn: &mut PgConnection, panne_id: Uuid, parc_ids: &[Uuid]) -> Result<(), AppError> {
        sqlx::query("DELETE FROM panne_parcs WHERE panne_id = $1")
            .bind(panne_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO panne_parcs (panne_id, parc_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(panne_id)
        .bind(parc_ids)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// A panne pode ser lançada num engin deste parc?
    pub async fn is_allowed_for_parc<'e, E>(&self, executor: E, panne_id: Uuid, parc_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let allowed: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM panne_parcs WHERE panne_id = $1 AND parc_id = $2)",
        )
        .bind(panne_id)
        .bind(parc_id)
        .fetch_one(executor)
        .await?;
        Ok(allowed)
    }
}
