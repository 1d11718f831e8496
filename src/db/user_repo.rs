// src/db/user_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{auth::User, rbac::RolePermissionRow},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

fn email_conflict(e: sqlx::Error) -> AppError {
    map_unique_violation(e, |constraint| match constraint {
        "users_email_key" => AppError::EmailAlreadyExists,
        other => AppError::UniqueConstraintViolation(other.to_string()),
    })
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail (login é global, o e-mail é único)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_user)
    }

    pub async fn find_in_entreprise<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maybe_user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(maybe_user)
    }

    pub async fn list_by_entreprise(&self, entreprise_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // Cria um novo usuário (entreprise_id = None só para o super admin)
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        entreprise_id: Option<Uuid>,
        email: &str,
        name: &str,
        password_hash: &str,
        is_super_admin: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (entreprise_id, email, name, password_hash, is_super_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(entreprise_id)
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(is_super_admin)
        .fetch_one(executor)
        .await
        .map_err(email_conflict)
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        name: &str,
        password_hash: Option<&str>,
        active: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $3,
                password_hash = COALESCE($4, password_hash),
                active = $5,
                updated_at = NOW()
            WHERE id = $1 AND entreprise_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(entreprise_id)
        .bind(name)
        .bind(password_hash)
        .bind(active)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound { resource: "user" })
    }

    pub async fn delete_user<'e, E>(&self, executor: E, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "user" });
        }
        Ok(())
    }

    /// Promove (ou cria) a conta do super admin da plataforma.
    pub async fn upsert_super_admin(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (entreprise_id, email, name, password_hash, is_super_admin)
            VALUES (NULL, $1, 'Super Admin', $2, TRUE)
            ON CONFLICT (email) DO UPDATE
                SET is_super_admin = TRUE, active = TRUE, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    // ---
    // Cargos do usuário
    // ---

    /// Cargos do usuário com os slugs de cada um (uma linha por par cargo/permissão).
    pub async fn roles_with_permissions(&self, user_id: Uuid) -> Result<Vec<RolePermissionRow>, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT r.id AS role_id, r.name AS role_name, p.resource, p.action
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            LEFT JOIN role_permissions rp ON rp.role_id = r.id
            LEFT JOIN permissions p ON p.id = rp.permission_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn role_ids<'e, E>(&self, executor: E, user_id: Uuid) -> Result<Vec<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id",
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(ids)
    }

    /// Substitui os cargos do usuário.
    pub async fn set_roles(&self, conn: &mut PgConnection, user_id: Uuid, role_ids: &[Uuid]) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if !role_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO user_roles (user_id, role_id)
                SELECT $1, unnest($2::uuid[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(role_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
