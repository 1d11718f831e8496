// src/db/rbac_repo.rs

use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::common::error::{map_unique_violation, AppError};
use crate::models::rbac::{Permission, Role};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Criar o Cargo
    pub async fn create_role<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (entreprise_id, name, description)
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
                resource: "role",
                name: name.to_string(),
            })
        })
    }

    pub async fn update_role<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET name = $3, description = $4, updated_at = NOW()
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
                resource: "role",
                name: name.to_string(),
            })
        })?
        .ok_or(AppError::NotFound { resource: "role" })
    }

    pub async fn find_role<'e, E>(
        &self,
        executor: E,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Role>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE id = $1 AND entreprise_id = $2",
        )
        .bind(id)
        .bind(entreprise_id)
        .fetch_optional(executor)
        .await?;
        Ok(role)
    }

    pub async fn list_roles(&self, entreprise_id: Uuid) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT * FROM roles WHERE entreprise_id = $1 ORDER BY name ASC",
        )
        .bind(entreprise_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    /// Remove o cargo; bloqueado enquanto houver usuários com ele.
    pub async fn delete_role(
        &self,
        conn: &mut PgConnection,
        entreprise_id: Uuid,
        id: Uuid,
    ) -> Result<(), AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_roles WHERE role_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if count > 0 {
            return Err(AppError::HasDependents { relation: "users", count });
        }

        let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND entreprise_id = $2")
            .bind(id)
            .bind(entreprise_id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound { resource: "role" });
        }
        Ok(())
    }

    // 2. Buscar as permissões a partir dos slugs ("engins:read" -> linha)
    pub async fn find_permissions_by_slugs<'e, E>(
        &self,
        executor: E,
        slugs: &[String],
    ) -> Result<Vec<Permission>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT id, resource, action, description
            FROM permissions
            WHERE resource || ':' || action = ANY($1)
            "#,
        )
        .bind(slugs)
        .fetch_all(executor)
        .await?;

        Ok(permissions)
    }

    // 3. Vincular Cargo <-> Permissão
    pub async fn assign_permissions<'e, E>(
        &self,
        executor: E,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, unnest($2::uuid[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn clear_permissions<'e, E>(&self, executor: E, role_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn permissions_of_role<'e, E>(&self, executor: E, role_id: Uuid) -> Result<Vec<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.resource || ':' || p.action
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY 1
            "#,
        )
        .bind(role_id)
        .fetch_all(executor)
        .await?;
        Ok(slugs)
    }

    // 4. Listar todas as permissões disponíveis (para o Frontend montar a tela)
    pub async fn list_all_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, resource, action, description FROM permissions ORDER BY resource, action",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }
}
