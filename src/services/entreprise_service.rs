// src/services/entreprise_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::{field_error, AppError}, i18n::I18nStore},
    db::{
        guards::{ensure_deletable, ENTREPRISE_DEPENDENTS},
        EntrepriseRepository, RbacRepository, UserRepository,
    },
    models::entreprise::{CreateEntreprisePayload, Entreprise, UpdateEntreprisePayload},
    services::auth::hash_password,
};

/// Nome do cargo criado junto com a entreprise (acesso total).
pub const ADMIN_ROLE_NAME: &str = "admin";

#[derive(Clone)]
pub struct EntrepriseService {
    repo: EntrepriseRepository,
    rbac_repo: RbacRepository,
    user_repo: UserRepository,
    i18n: Arc<I18nStore>,
    pool: PgPool,
}

impl EntrepriseService {
    pub fn new(
        repo: EntrepriseRepository,
        rbac_repo: RbacRepository,
        user_repo: UserRepository,
        i18n: Arc<I18nStore>,
        pool: PgPool,
    ) -> Self {
        Self { repo, rbac_repo, user_repo, i18n, pool }
    }

    fn checked_language(&self, language: Option<&str>, fallback: &str) -> Result<String, AppError> {
        let language = language.map(|l| l.trim().to_lowercase()).unwrap_or_else(|| fallback.to_string());
        if self.i18n.supports(&language) {
            return Ok(language);
        }
        Err(field_error("language", "validation.invalid"))
    }

    pub async fn list(&self) -> Result<Vec<Entreprise>, AppError> {
        self.repo.list().await
    }

    pub async fn get(&self, id: Uuid) -> Result<Entreprise, AppError> {
        self.repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound { resource: "entreprise" })
    }

    /// Cria a entreprise, o cargo `admin` com todas as permissões e o primeiro usuário.
    pub async fn create_with_admin(&self, payload: CreateEntreprisePayload) -> Result<Entreprise, AppError> {
        let language = self.checked_language(payload.language.as_deref(), "fr")?;
        let hashed = hash_password(&payload.admin_password).await?;

        let mut tx = self.pool.begin().await?;

        let entreprise = self.repo.create(&mut *tx, payload.name.trim(), &language).await?;

        let admin_role = self.rbac_repo
            .create_role(&mut *tx, entreprise.id, ADMIN_ROLE_NAME, Some("Accès complet (créé automatiquement)"))
            .await?;

        let all_permissions = self.rbac_repo.list_all_permissions().await?;
        let all_perm_ids: Vec<Uuid> = all_permissions.iter().map(|p| p.id).collect();
        if !all_perm_ids.is_empty() {
            self.rbac_repo.assign_permissions(&mut *tx, admin_role.id, &all_perm_ids).await?;
        }

        let admin = self.user_repo
            .create_user(
                &mut *tx,
                Some(entreprise.id),
                payload.admin_email.trim(),
                payload.admin_name.trim(),
                &hashed,
                false,
            )
            .await?;
        self.user_repo.set_roles(&mut *tx, admin.id, &[admin_role.id]).await?;

        tx.commit().await?;

        tracing::info!(entreprise_id = %entreprise.id, admin_id = %admin.id, "entreprise criada");
        Ok(entreprise)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateEntreprisePayload) -> Result<Entreprise, AppError> {
        let current = self.get(id).await?;
        let language = self.checked_language(payload.language.as_deref(), &current.language)?;
        let name = payload.name.as_deref().map(str::trim).unwrap_or(&current.name).to_string();
        let active = payload.active.unwrap_or(current.active);

        self.repo.update(&self.pool, id, &name, active, &language).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.get(id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, ENTREPRISE_DEPENDENTS).await?;
        self.repo.purge_catalogues(&mut *tx, id).await?;
        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(entreprise_id = %id, "entreprise removida");
        Ok(())
    }
}
