// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{
    guards::{ensure_references, TenantTable},
    RbacRepository, UserRepository,
};
use crate::models::{
    auth::{CreateUserPayload, UpdateUserPayload, UserResponse},
    rbac::{Capability, CreateRolePayload, Permission, Role, RoleResponse, UpdateRolePayload},
};
use crate::services::auth::hash_password;

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    user_repo: UserRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, user_repo: UserRepository, pool: PgPool) -> Self {
        Self { repo, user_repo, pool }
    }

    // ---
    // Cargos
    // ---

    pub async fn create_role_with_permissions(
        &self,
        entreprise_id: Uuid,
        payload: CreateRolePayload,
        caller: &Capability,
    ) -> Result<RoleResponse, AppError> {
        caller.ensure_can_name_role(&payload.name)?;

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = self.repo
            .create_role(&mut *tx, entreprise_id, payload.name.trim(), payload.description.as_deref())
            .await?;

        // 3. Resolve slugs para permissões; slug desconhecido é ignorado
        let permissions = self.repo.find_permissions_by_slugs(&mut *tx, &payload.permissions).await?;
        let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();

        // 4. Salva o Vínculo
        if !permission_ids.is_empty() {
            self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
        }

        // 5. Commit
        tx.commit().await?;

        let mut slugs: Vec<String> = permissions.iter().map(Permission::slug).collect();
        slugs.sort();
        Ok(RoleResponse { role, permissions: slugs })
    }

    pub async fn list_roles(&self, entreprise_id: Uuid) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles(entreprise_id).await?;
        let mut out = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.repo.permissions_of_role(&self.pool, role.id).await?;
            out.push(RoleResponse { role, permissions });
        }
        Ok(out)
    }

    pub async fn get_role(&self, entreprise_id: Uuid, id: Uuid) -> Result<RoleResponse, AppError> {
        let role = self.find_role(entreprise_id, id).await?;
        let permissions = self.repo.permissions_of_role(&self.pool, role.id).await?;
        Ok(RoleResponse { role, permissions })
    }

    pub async fn update_role(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateRolePayload,
        caller: &Capability,
    ) -> Result<RoleResponse, AppError> {
        if let Some(name) = &payload.name {
            caller.ensure_can_name_role(name)?;
        }
        let current = self.find_role(entreprise_id, id).await?;
        let name = payload.name.as_deref().map(str::trim).unwrap_or(&current.name).to_string();
        let description = payload.description.or(current.description);

        let mut tx = self.pool.begin().await?;
        let role = self.repo
            .update_role(&mut *tx, entreprise_id, id, &name, description.as_deref())
            .await?;

        if let Some(slugs) = &payload.permissions {
            let permissions = self.repo.find_permissions_by_slugs(&mut *tx, slugs).await?;
            let permission_ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
            self.repo.clear_permissions(&mut *tx, role.id).await?;
            if !permission_ids.is_empty() {
                self.repo.assign_permissions(&mut *tx, role.id, &permission_ids).await?;
            }
        }

        let permissions = self.repo.permissions_of_role(&mut *tx, role.id).await?;
        tx.commit().await?;

        Ok(RoleResponse { role, permissions })
    }

    pub async fn delete_role(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.find_role(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        self.repo.delete_role(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_role(&self, entreprise_id: Uuid, id: Uuid) -> Result<Role, AppError> {
        self.repo
            .find_role(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "role" })
    }

    pub async fn list_system_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions().await
    }

    // ---
    // Usuários da entreprise
    // ---

    pub async fn list_users(&self, entreprise_id: Uuid) -> Result<Vec<UserResponse>, AppError> {
        let users = self.user_repo.list_by_entreprise(entreprise_id).await?;
        let mut out = Vec::with_capacity(users.len());
        for user in users {
            let role_ids = self.user_repo.role_ids(&self.pool, user.id).await?;
            out.push(UserResponse { user, role_ids });
        }
        Ok(out)
    }

    pub async fn get_user(&self, entreprise_id: Uuid, id: Uuid) -> Result<UserResponse, AppError> {
        let user = self.user_repo
            .find_in_entreprise(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "user" })?;
        let role_ids = self.user_repo.role_ids(&self.pool, user.id).await?;
        Ok(UserResponse { user, role_ids })
    }

    pub async fn create_user(&self, entreprise_id: Uuid, payload: CreateUserPayload) -> Result<UserResponse, AppError> {
        ensure_references(&self.pool, TenantTable::Roles, &payload.role_ids, entreprise_id, "roleIds").await?;

        let hashed = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self.user_repo
            .create_user(
                &mut *tx,
                Some(entreprise_id),
                payload.email.trim(),
                payload.name.trim(),
                &hashed,
                false,
            )
            .await?;
        self.user_repo.set_roles(&mut *tx, user.id, &payload.role_ids).await?;
        let role_ids = self.user_repo.role_ids(&mut *tx, user.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, %entreprise_id, "usuário criado");
        Ok(UserResponse { user, role_ids })
    }

    pub async fn update_user(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateUserPayload,
    ) -> Result<UserResponse, AppError> {
        let current = self.user_repo
            .find_in_entreprise(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "user" })?;

        if let Some(role_ids) = &payload.role_ids {
            ensure_references(&self.pool, TenantTable::Roles, role_ids, entreprise_id, "roleIds").await?;
        }

        let hashed = match &payload.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };
        let name = payload.name.as_deref().map(str::trim).unwrap_or(&current.name).to_string();
        let active = payload.active.unwrap_or(current.active);

        let mut tx = self.pool.begin().await?;
        let user = self.user_repo
            .update_user(&mut *tx, entreprise_id, id, &name, hashed.as_deref(), active)
            .await?;
        if let Some(role_ids) = &payload.role_ids {
            self.user_repo.set_roles(&mut *tx, user.id, role_ids).await?;
        }
        let role_ids = self.user_repo.role_ids(&mut *tx, user.id).await?;
        tx.commit().await?;

        Ok(UserResponse { user, role_ids })
    }

    pub async fn delete_user(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.user_repo.delete_user(&self.pool, entreprise_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::common::test_support;

    fn role_manager() -> Capability {
        Capability::Scoped(HashSet::from(["roles:create".to_string(), "roles:update".to_string()]))
    }

    fn create(name: &str) -> CreateRolePayload {
        CreateRolePayload { name: name.into(), description: None, permissions: vec!["engins:read".into()] }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_manager_cannot_mint_an_admin_role(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let service = &state.rbac_service;

        let err = service.create_role_with_permissions(eid, create("Admin"), &role_manager()).await.unwrap_err();
        assert!(matches!(err, AppError::ReservedRoleName { .. }));
        assert!(service.list_roles(eid).await.unwrap().is_empty());

        let role = service.create_role_with_permissions(eid, create("Lecture"), &role_manager()).await.unwrap();
        let rename = UpdateRolePayload { name: Some(" SUPER admin".into()), description: None, permissions: None };
        let err = service.update_role(eid, role.role.id, rename, &role_manager()).await.unwrap_err();
        assert!(matches!(err, AppError::ReservedRoleName { .. }));
        assert_eq!(service.get_role(eid, role.role.id).await.unwrap().role.name, "Lecture");

        // Só as permissões: o nome atual não é revalidado
        let perms = UpdateRolePayload { name: None, description: None, permissions: Some(vec!["sites:read".into()]) };
        let updated = service.update_role(eid, role.role.id, perms, &role_manager()).await.unwrap();
        assert_eq!(updated.permissions, vec!["sites:read"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn full_access_caller_may_use_reserved_names(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;

        let role = state
            .rbac_service
            .create_role_with_permissions(eid, create("Admin"), &Capability::FullAccess)
            .await
            .unwrap();
        assert_eq!(role.role.name, "Admin");
    }
}
