// src/db/lubrifiant_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::Pagination, error::{map_unique_violation, AppError}},
    models::lubrifiant::{Lubrifiant, Saisielubrifiant, SaisielubrifiantFilter, TypeConsommationLub, TypeLubrifiant},
};

/// Catálogos "só nome" desta área.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LubCatalogue {
    TypeLubrifiants,
    TypeConsommationLubs,
}

impl LubCatalogue {
    fn table(&self) -> &'static str {
        match self {
            LubCatalogue::TypeLubrifiants => "typelubrifiants",
            LubCatalogue::TypeConsommationLubs => "typeconsommationlubs",
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            LubCatalogue::TypeLubrifiants => "typelubrifiant",
            LubCatalogue::TypeConsommationLubs => "typeconsommationlub",
        }
    }
}

pub struct SaisielubrifiantRecord<'a> {
    pub saisiehim_id: Uuid,
    pub lubrifiant_id: Uuid,
    pub typeconsommationlub_id: Option<Uuid>,
    pub qte: Decimal,
    pub obs: Option<&'a str>,
}

#[derive(Clone)]
pub struct LubrifiantRepository {
    pool: PgPool,
}

impl LubrifiantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Types de lubrifiant / types de consommation
    // ---

    pub async fn list_typelubrifiants(&self, entreprise_id: Uuid) -> Result<Vec<TypeLubrifiant>, AppError> {
        let rows = sqlx::query_as::<_, TypeLubrifiant>(
            "SELECT * FROM typelubrifiants WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_typeconsommationlubs(&self, entreprise_id: Uuid) -> Result<Vec<TypeConsommationLub>, AppError> {
        let rows = sqlx::query_as::<_, TypeConsommationLub>(
            "SELECT * FROM typeconsommationlubs WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_typelubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<Option<TypeLubrifiant>, AppError> {
        let row = sqlx::query_as::<_, TypeLubrifiant>(
            "SELECT * FROM typelubrifiants WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_typeconsommationlub(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TypeConsommationLub>, AppError> {
        let row = sqlx::query_as::<_, TypeConsommationLub>(
            "SELECT * FROM typeconsommationlubs WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Insere num catálogo "só nome"; devolve o id criado.
    pub async fn create_named(&self, catalogue: LubCatalogue, entreprise_id: Uuid, name: &str) -> Result<Uuid, AppError> {
        let sql = format!(
            "INSERT INTO {} (entreprise_id, name) VALUES ($1, $2) RETURNING id",
            catalogue.table()
        );
        sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(entreprise_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, |_| AppError::NameAlreadyExists {
                    resource: catalogue.resource(),
                    name: name.to_string(),
                })
            })
    }

    pub async fn rename_named(
        &self,
        catalogue: LubCatalogue,
        entreprise_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET name = $3, updated_at = NOW() WHERE id = $1 AND entreprise_id = $2",
            catalogue.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(entreprise_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, |_| AppError::NameAlreadyExists {
                    resource: catalogue.resource(),
                    name: name.to_string(),
                })
            })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: catalogue.resource() });
        }
        Ok(())
    }

    pub async fn delete_named<'e, E>(
        &self,
        executor: E,
        catalogue: LubCatalogue,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("DELETE FROM {} WHERE id = $1 AND entreprise_id = $2", catalogue.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: catalogue.resource() });
        }
        Ok(())
    }

    /// O tipo de consumo está habilitado para o parc?
    pub async fn consommation_allowed_for_parc<'e, E>(
        &self,
        executor: E,
        typeconsommationlub_id: Uuid,
        parc_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let allowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM parc_typeconsommationlubs
                WHERE typeconsommationlub_id = $1 AND parc_id = $2
            )
            "#,
        )
        .bind(typeconsommationlub_id)
        .bind(parc_id)
        .fetch_one(executor)
        .await?;
        Ok(allowed)
    }

    // ---
    // Lubrifiants
    // ---

    pub async fn list_lubrifiants(
        &self,
        entreprise_id: Uuid,
        typelubrifiant_id: Option<Uuid>,
    ) -> Result<Vec<Lubrifiant>, AppError> {
        let rows = sqlx::query_as::<_, Lubrifiant>(
            r#"
            SELECT * FROM lubrifiants
            WHERE entreprise_id = $1 AND ($2::uuid IS NULL OR typelubrifiant_id = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(entreprise_id)
        .bind(typelubrifiant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_lubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<Option<Lubrifiant>, AppError> {
        let row = sqlx::query_as::<_, Lubrifiant>(
            "SELECT * FROM lubrifiants WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_lubrifiant(
        &self,
        entreprise_id: Uuid,
        typelubrifiant_id: Uuid,
        name: &str,
    ) -> Result<Lubrifiant, AppError> {
        sqlx::query_as::<_, Lubrifiant>(
            r#"
            INSERT INTO lubrifiants (entreprise_id, typelubrifiant_id, name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(typelubrifiant_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "lubrifiant",
                name: name.to_string(),
            })
        })
    }

    pub async fn update_lubrifiant(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        typelubrifiant_id: Uuid,
        name: &str,
    ) -> Result<Lubrifiant, AppError> {
        sqlx::query_as::<_, Lubrifiant>(
            r#"
            UPDATE lubrifiants SET typelubrifiant_id = $3, name = $4, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(typelubrifiant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| AppError::NameAlreadyExists {
                resource: "lubrifiant",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "lubrifiant" })
    }

    pub async fn delete_lubrifiant<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM lubrifiants WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "lubrifiant" });
        }
        Ok(())
    }

    // ---
    // Saisies de lubrifiant
    // ---

    pub async fn list_saisielubrifiants(
        &self,
        entreprise_id: Uuid,
        filter: &SaisielubrifiantFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<Saisielubrifiant>, i64), AppError> {
        let rows = sqlx::query_as::<_, Saisielubrifiant>(
            r#"
            SELECT * FROM saisielubrifiants
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR saisiehim_id = $2)
              AND ($3::uuid IS NULL OR lubrifiant_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.saisiehim_id)
        .bind(filter.lubrifiant_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM saisielubrifiants
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR saisiehim_id = $2)
              AND ($3::uuid IS NULL OR lubrifiant_id = $3)
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.saisiehim_id)
        .bind(filter.lubrifiant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn find_saisielubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<Option<Saisielubrifiant>, AppError> {
        let row = sqlx::query_as::<_, Saisielubrifiant>(
            "SELECT * FROM saisielubrifiants WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_saisielubrifiant<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        record: &SaisielubrifiantRecord<'_>,
    ) -> Result<Saisielubrifiant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Saisielubrifiant>(
            r#"
            INSERT INTO saisielubrifiants
                (entreprise_id, saisiehim_id, lubrifiant_id, typeconsommationlub_id, qte, obs)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(record.saisiehim_id)
        .bind(record.lubrifiant_id)
        .bind(record.typeconsommationlub_id)
        .bind(record.qte)
        .bind(record.obs)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn update_saisielubrifiant(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        record: &SaisielubrifiantRecord<'_>,
    ) -> Result<Saisielubrifiant, AppError> {
        sqlx::query_as::<_, Saisielubrifiant>(
            r#"
            UPDATE saisielubrifiants
            SET lubrifiant_id = $3, typeconsommationlub_id = $4, qte = $5, obs = $6, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(record.lubrifiant_id)
        .bind(record.typeconsommationlub_id)
        .bind(record.qte)
        .bind(record.obs)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound { resource: "saisielubrifiant" })
    }

    pub async fn delete_saisielubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM saisielubrifiants WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "saisielubrifiant" });
        }
        Ok(())
    }
}
