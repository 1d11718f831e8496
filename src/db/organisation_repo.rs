// src/db/organisation_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::organisation::{Parc, Site, TypeParc},
};

#[derive(Clone)]
pub struct OrganisationRepository {
    pool: PgPool,
}

impl OrganisationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Sites
    // ---

    pub async fn list_sites(&self, entreprise_id: Uuid) -> Result<Vec<Site>, AppError> {
        let sites = sqlx::query_as::<_, Site>(
            "SELECT * FROM sites WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sites)
    }

    pub async fn find_site<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Site>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let site = sqlx::query_as::<_, Site>(
            "SELECT * FROM sites WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(site)
    }

    pub async fn find_site_by_name<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<Option<Site>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let site = sqlx::query_as::<_, Site>(
            "SELECT * FROM sites WHERE entreprise_id = $1 AND lower(name) = lower($2)",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(site)
    }

    pub async fn create_site<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
        active: bool,
    ) -> Result<Site, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Site>(
            r#"
            INSERT INTO sites (entreprise_id, name, active)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(name)
        .bind(active)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "site",
                name: name.to_string(),
            })
        })
    }

    pub async fn update_site<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        name: &str,
        active: bool,
    ) -> Result<Site, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Site>(
            r#"
            UPDATE sites SET name = $3, active = $4, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(name)
        .bind(active)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "site",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "site" })
    }

    pub async fn delete_site<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "site" });
        }
        Ok(())
    }

    // ---
    // Types de parc
    // ---

    pub async fn list_typeparcs(&self, entreprise_id: Uuid) -> Result<Vec<TypeParc>, AppError> {
        let typeparcs = sqlx::query_as::<_, TypeParc>(
            "SELECT * FROM typeparcs WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(typeparcs)
    }

    pub async fn find_typeparc<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TypeParc>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let typeparc = sqlx::query_as::<_, TypeParc>(
            "SELECT * FROM typeparcs WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(typeparc)
    }

    pub async fn find_typeparc_by_name<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<Option<TypeParc>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let typeparc = sqlx::query_as::<_, TypeParc>(
            "SELECT * FROM typeparcs WHERE entreprise_id = $1 AND lower(name) = lower($2)",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(typeparc)
    }

    pub async fn create_typeparc<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<TypeParc, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TypeParc>(
            "INSERT INTO typeparcs (entreprise_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "typeparc",
                name: name.to_string(),
            })
        })
    }

    pub async fn rename_typeparc<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<TypeParc, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, TypeParc>(
            r#"
            UPDATE typeparcs SET name = $3, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "typeparc",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "typeparc" })
    }

    pub async fn delete_typeparc<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM typeparcs WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "typeparc" });
        }
        Ok(())
    }

    // ---
    // Parcs
    // ---

    pub async fn list_parcs(&self, entreprise_id: Uuid, typeparc_id: Option<Uuid>) -> Result<Vec<Parc>, AppError> {
        let parcs = sqlx::query_as::<_, Parc>(
            r#"
            SELECT * FROM parcs
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR typeparc_id = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(entreprise_id)
        .bind(typeparc_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(parcs)
    }

    pub async fn find_parc<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Parc>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let parc = sqlx::query_as::<_, Parc>(
            "SELECT * FROM parcs WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(parc)
    }

    pub async fn find_parc_by_name<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
    ) -> Result<Option<Parc>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let parc = sqlx::query_as::<_, Parc>(
            "SELECT * FROM parcs WHERE entreprise_id = $1 AND lower(name) = lower($2)",
        )
        .bind(entreprise_id)
        .bind(name)
        .fetch_optional(executor)
        .await?;
        Ok(parc)
    }

    pub async fn create_parc<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        typeparc_id: Uuid,
        name: &str,
    ) -> Result<Parc, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Parc>(
            r#"
            INSERT INTO parcs (entreprise_id, typeparc_id, name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(typeparc_id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "parc",
                name: name.to_string(),
            })
        })
    }

    pub async fn update_parc<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        typeparc_id: Uuid,
        name: &str,
    ) -> Result<Parc, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Parc>(
            r#"
            UPDATE parcs SET typeparc_id = $3, name = $4, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(typeparc_id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "parc",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "parc" })
    }

    pub async fn delete_parc<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM parcs WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "parc" });
        }
        Ok(())
    }

    // ---
    // Associações do parc (tabelas-ponte)
    // ---

    pub async fn parc_typepanne_ids<'e, E>(&self, executor: E, parc_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT typepanne_id FROM parc_typepannes WHERE parc_id = $1 ORDER BY typepanne_id",
        )
        .bind(parc_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    pub async fn parc_typeconsommationlub_ids<'e, E>(&self, executor: E, parc_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT typeconsommationlub_id FROM parc_typeconsommationlubs
            WHERE parc_id = $1 ORDER BY typeconsommationlub_id
            "#,
        )
        .bind(parc_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    /// Substitui os tipos de panne do parc (apaga e reinsere).
    pub async fn replace_parc_typepannes(
        &self,
        conn: &mut sqlx::PgConnection,
        parc_id: Uuid,
        typepanne_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM parc_typepannes WHERE parc_id = $1")
            .bind(parc_id)
            .execute(&mut *conn)
            .await?;

        if !typepanne_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO parc_typepannes (parc_id, typepanne_id)
                SELECT $1, unnest($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(parc_id)
            .bind(typepanne_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    pub async fn replace_parc_typeconsommationlubs(
        &self,
        conn: &mut sqlx::PgConnection,
        parc_id: Uuid,
        typeconsommationlub_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM parc_typeconsommationlubs WHERE parc_id = $1")
            .bind(parc_id)
            .execute(&mut *conn)
            .await?;

        if !typeconsommationlub_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO parc_typeconsommationlubs (parc_id, typeconsommationlub_id)
                SELECT $1, unnest($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(parc_id)
            .bind(typeconsommationlub_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
