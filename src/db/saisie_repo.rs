// src/db/saisie_repo.rs
//
// Saisies HRM / HIM. Toda escrita de HIM (e toda alteração de HRM) passa por
// `lock_saisiehrm` dentro da mesma transação: o SELECT ... FOR UPDATE serializa
// os escritores do mesmo dia antes da soma.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::Pagination, error::{map_unique_violation, AppError}},
    models::saisie::{Saisiehim, SaisiehimFilter, Saisiehrm, SaisiehrmFilter},
};

fn saisiehrm_conflict(e: sqlx::Error, du: NaiveDate) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "saisiehrms_du_engin_key" => AppError::SaisiehrmAlreadyExists { du },
        other => AppError::UniqueConstraintViolation(other.to_string()),
    })
}

fn saisiehim_conflict(e: sqlx::Error) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "saisiehims_panne_saisiehrm_key" => AppError::SaisiehimAlreadyExists,
        other => AppError::UniqueConstraintViolation(other.to_string()),
    })
}

/// Colunas gravadas de uma HRM.
pub struct SaisiehrmRecord {
    pub du: NaiveDate,
    pub engin_id: Uuid,
    pub site_id: Uuid,
    pub hrm: Decimal,
    pub compteur: Option<Decimal>,
}

/// Colunas editáveis de uma HIM.
pub struct SaisiehimRecord<'a> {
    pub panne_id: Uuid,
    pub him: Decimal,
    pub ni: i32,
    pub obs: Option<&'a str>,
}

#[derive(Clone)]
pub struct SaisieRepository {
    pool: PgPool,
}

impl SaisieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // HRM
    // ---

    pub async fn list_saisiehrms(
        &self,
        entreprise_id: Uuid,
        filter: &SaisiehrmFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<Saisiehrm>, i64), AppError> {
        let rows = sqlx::query_as::<_, Saisiehrm>(
            r#"
            SELECT * FROM saisiehrms
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR engin_id = $2)
              AND ($3::uuid IS NULL OR site_id = $3)
              AND ($4::date IS NULL OR du = $4)
              AND ($5::date IS NULL OR du >= $5)
              AND ($6::date IS NULL OR du <= $6)
            ORDER BY du DESC, created_at DESC
            LIMIT $7 OFFSET $8
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.engin_id)
        .bind(filter.site_id)
        .bind(filter.du)
        .bind(filter.from)
        .bind(filter.to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM saisiehrms
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR engin_id = $2)
              AND ($3::uuid IS NULL OR site_id = $3)
              AND ($4::date IS NULL OR du = $4)
              AND ($5::date IS NULL OR du >= $5)
              AND ($6::date IS NULL OR du <= $6)
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.engin_id)
        .bind(filter.site_id)
        .bind(filter.du)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn find_saisiehrm<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Saisiehrm>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Saisiehrm>(
            "SELECT * FROM saisiehrms WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// Trava a linha HRM até o fim da transação.
    pub async fn lock_saisiehrm(
        &self,
        conn: &mut PgConnection,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Saisiehrm>, AppError> {
        let row = sqlx::query_as::<_, Saisiehrm>(
            "SELECT * FROM saisiehrms WHERE id = $1 AND entreprise_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Outra saisie HRM no mesmo (du, engin), ignorando `exclude_id`.
    pub async fn exists_for_day<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        du: NaiveDate,
        engin_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM saisiehrms
                WHERE entreprise_id = $1 AND du = $2 AND engin_id = $3
                  AND ($4::uuid IS NULL OR id <> $4)
            )
            "#,
        )
        .bind(entreprise_id)
        .bind(du)
        .bind(engin_id)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create_saisiehrm<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        record: &SaisiehrmRecord,
    ) -> Result<Saisiehrm, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Saisiehrm>(
            r#"
            INSERT INTO saisiehrms (entreprise_id, du, engin_id, site_id, hrm, compteur)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(record.du)
        .bind(record.engin_id)
        .bind(record.site_id)
        .bind(record.hrm)
        .bind(record.compteur)
        .fetch_one(executor)
        .await
        .map_err(|e| saisiehrm_conflict(e, record.du))
    }

    pub async fn update_saisiehrm<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        record: &SaisiehrmRecord,
    ) -> Result<Saisiehrm, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Saisiehrm>(
            r#"
            UPDATE saisiehrms
            SET du = $3, engin_id = $4, site_id = $5, hrm = $6, compteur = $7, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(record.du)
        .bind(record.engin_id)
        .bind(record.site_id)
        .bind(record.hrm)
        .bind(record.compteur)
        .fetch_optional(executor)
        .await
        .map_err(|e| saisiehrm_conflict(e, record.du))?
        .ok_or(AppError::NotFound { resource: "saisiehrm" })
    }

    pub async fn delete_saisiehrm<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM saisiehrms WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "saisiehrm" });
        }
        Ok(())
    }

    // ---
    // HIM
    // ---

    pub async fn list_saisiehims(
        &self,
        entreprise_id: Uuid,
        filter: &SaisiehimFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<Saisiehim>, i64), AppError> {
        let rows = sqlx::query_as::<_, Saisiehim>(
            r#"
            SELECT * FROM saisiehims
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR saisiehrm_id = $2)
              AND ($3::uuid IS NULL OR engin_id = $3)
              AND ($4::uuid IS NULL OR panne_id = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.saisiehrm_id)
        .bind(filter.engin_id)
        .bind(filter.panne_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM saisiehims
            WHERE entreprise_id = $1
              AND ($2::uuid IS NULL OR saisiehrm_id = $2)
              AND ($3::uuid IS NULL OR engin_id = $3)
              AND ($4::uuid IS NULL OR panne_id = $4)
            "#,
        )
        .bind(entreprise_id)
        .bind(filter.saisiehrm_id)
        .bind(filter.engin_id)
        .bind(filter.panne_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    pub async fn find_saisiehim<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Saisiehim>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Saisiehim>(
            "SELECT * FROM saisiehims WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    /// HIM do dia (filhos do HRM), em ordem de criação.
    /// Trava a HIM: exclusão e lançamentos de lubrifiant sobre ela se serializam aqui.
    pub async fn lock_saisiehim(
        &self,
        conn: &mut PgConnection,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Saisiehim>, AppError> {
        let row = sqlx::query_as::<_, Saisiehim>(
            "SELECT * FROM saisiehims WHERE id = $1 AND entreprise_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn saisiehims_of<'e, E>(&self, executor: E, saisiehrm_id: Uuid) -> Result<Vec<Saisiehim>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Saisiehim>(
            "SELECT * FROM saisiehims WHERE saisiehrm_id = $1 ORDER BY created_at ASC",
        )
        .bind(saisiehrm_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Valores `him` dos irmãos, sem a linha `exclude_id` (em update).
    pub async fn sibling_him<'e, E>(
        &self,
        executor: E,
        saisiehrm_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<Vec<Decimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let values = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT him FROM saisiehims
            WHERE saisiehrm_id = $1 AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(saisiehrm_id)
        .bind(exclude_id)
        .fetch_all(executor)
        .await?;
        Ok(values)
    }

    pub async fn panne_already_entered<'e, E>(
        &self,
        executor: E,
        saisiehrm_id: Uuid,
        panne_id: Uuid,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM saisiehims
                WHERE saisiehrm_id = $1 AND panne_id = $2
                  AND ($3::uuid IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(saisiehrm_id)
        .bind(panne_id)
        .bind(exclude_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    pub async fn create_saisiehim<'e, E>(
        &self,
        executor: E,
        parent: &Saisiehrm,
        record: &SaisiehimRecord<'_>,
    ) -> Result<Saisiehim, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Saisiehim>(
            r#"
            INSERT INTO saisiehims (entreprise_id, panne_id, saisiehrm_id, engin_id, him, ni, obs)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(parent.entreprise_id)
        .bind(record.panne_id)
        .bind(parent.id)
        .bind(parent.engin_id)
        .bind(record.him)
        .bind(record.ni)
        .bind(record.obs)
        .fetch_one(executor)
        .await
        .map_err(saisiehim_conflict)
    }

    pub async fn update_saisiehim<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        record: &SaisiehimRecord<'_>,
    ) -> Result<Saisiehim, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Saisiehim>(
            r#"
            UPDATE saisiehims
            SET panne_id = $3, him = $4, ni = $5, obs = $6, updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(record.panne_id)
        .bind(record.him)
        .bind(record.ni)
        .bind(record.obs)
        .fetch_optional(executor)
        .await
        .map_err(saisiehim_conflict)?
        .ok_or(AppError::NotFound { resource: "saisiehim" })
    }

    pub async fn delete_saisiehim<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM saisiehims WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "saisiehim" });
        }
        Ok(())
    }
}
