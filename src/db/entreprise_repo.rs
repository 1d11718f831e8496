// src/db/entreprise_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, AppError};
use crate::models::entreprise::Entreprise;

#[derive(Clone)]
pub struct EntrepriseRepository {
    pool: PgPool,
}

impl EntrepriseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Entreprise>, AppError> {
        let entreprises = sqlx::query_as::<_, Entreprise>("SELECT * FROM entreprises ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(entreprises)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Entreprise>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entreprise = sqlx::query_as::<_, Entreprise>("SELECT * FROM entreprises WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(entreprise)
    }

    /// Cria a entreprise (executor: pool ou transação).
    pub async fn create<'e, E>(&self, executor: E, name: &str, language: &str) -> Result<Entreprise, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Entreprise>(
            r#"
            INSERT INTO entreprises (name, language)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(language)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "entreprise",
                name: name.to_string(),
            })
        })
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        active: bool,
        language: &str,
    ) -> Result<Entreprise, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Entreprise>(
            r#"
            UPDATE entreprises
            SET name = $2, active = $3, language = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(active)
        .bind(language)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "entreprise",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "entreprise" })
    }

    /// Apaga os catálogos da entreprise (sem sites nem usuários não há saisies).
    pub async fn purge_catalogues(&self, conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
        // Ordem: filhos antes dos pais; as tabelas-ponte caem em cascata
        for table in [
            "pannes",
            "parcs",
            "typeparcs",
            "typepannes",
            "lubrifiants",
            "typelubrifiants",
            "typeconsommationlubs",
            "roles",
        ] {
            let sql = format!("DELETE FROM {} WHERE entreprise_id = $1", table);
            sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        }
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM entreprises WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "entreprise" });
        }
        Ok(())
    }
}
