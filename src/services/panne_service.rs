// src/services/panne_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{Paginated, Pagination},
        error::AppError,
    },
    db::{
        guards::{ensure_deletable, ensure_reference, ensure_references, TenantTable, PANNE_DEPENDENTS, TYPEPANNE_DEPENDENTS},
        PanneRepository,
    },
    models::panne::{CreatePannePayload, Panne, PanneDetail, PanneFilter, TypePanne, TypePannePayload, UpdatePannePayload},
    services::clean_name,
};

#[derive(Clone)]
pub struct PanneService {
    repo: PanneRepository,
    pool: PgPool,
}

impl PanneService {
    pub fn new(repo: PanneRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // ---
    // Types de panne
    // ---

    pub async fn list_typepannes(&self, entreprise_id: Uuid) -> Result<Vec<TypePanne>, AppError> {
        self.repo.list_typepannes(entreprise_id).await
    }

    pub async fn get_typepanne(&self, entreprise_id: Uuid, id: Uuid) -> Result<TypePanne, AppError> {
        self.repo
            .find_typepanne(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "typepanne" })
    }

    pub async fn create_typepanne(&self, entreprise_id: Uuid, payload: TypePannePayload) -> Result<TypePanne, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo
            .create_typepanne(&self.pool, entreprise_id, &name, payload.description.as_deref())
            .await
    }

    pub async fn update_typepanne(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: TypePannePayload,
    ) -> Result<TypePanne, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo
            .update_typepanne(&self.pool, entreprise_id, id, &name, payload.description.as_deref())
            .await
    }

    pub async fn delete_typepanne(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get_typepanne(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, TYPEPANNE_DEPENDENTS).await?;
        self.repo.delete_typepanne(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Pannes
    // ---

    pub async fn list_pannes(
        &self,
        entreprise_id: Uuid,
        filter: PanneFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Panne>, AppError> {
        let (pannes, total) = self.repo.list_pannes(entreprise_id, &filter, &pagination).await?;
        Ok(Paginated::new(pannes, &pagination, total))
    }

    async fn find_panne(&self, entreprise_id: Uuid, id: Uuid) -> Result<Panne, AppError> {
        self.repo
            .find_panne(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "panne" })
    }

    pub async fn get_panne(&self, entreprise_id: Uuid, id: Uuid) -> Result<PanneDetail, AppError> {
        let panne = self.find_panne(entreprise_id, id).await?;
        let parc_ids = self.repo.parc_ids(&self.pool, panne.id).await?;
        Ok(PanneDetail { panne, parc_ids })
    }

    pub async fn create_panne(&self, entreprise_id: Uuid, payload: CreatePannePayload) -> Result<PanneDetail, AppError> {
        let name = clean_name(&payload.name)?;
        let typepanne_id = payload.typepanne_id.ok_or(AppError::ReferenceNotFound { field: "typepanneId" })?;

        ensure_reference(&self.pool, TenantTable::TypePannes, typepanne_id, entreprise_id, "typepanneId").await?;
        ensure_references(&self.pool, TenantTable::Parcs, &payload.parc_ids, entreprise_id, "parcIds").await?;

        let mut tx = self.pool.begin().await?;
        let panne = self.repo
            .create_panne(&mut *tx, entreprise_id, typepanne_id, &name, payload.description.as_deref())
            .await?;
        self.repo.replace_parcs(&mut *tx, panne.id, &payload.parc_ids).await?;
        let parc_ids = self.repo.parc_ids(&mut *tx, panne.id).await?;
        tx.commit().await?;

        Ok(PanneDetail { panne, parc_ids })
    }

    pub async fn update_panne(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdatePannePayload,
    ) -> Result<PanneDetail, AppError> {
        let current = self.find_panne(entreprise_id, id).await?;
        let name = match &payload.name {
            Some(name) => clean_name(name)?,
            None => current.name,
        };
        let typepanne_id = payload.typepanne_id.unwrap_or(current.typepanne_id);
        let description = payload.description.or(current.description);

        ensure_reference(&self.pool, TenantTable::TypePannes, typepanne_id, entreprise_id, "typepanneId").await?;
        if let Some(parc_ids) = &payload.parc_ids {
            ensure_references(&self.pool, TenantTable::Parcs, parc_ids, entreprise_id, "parcIds").await?;
        }

        let mut tx = self.pool.begin().await?;
        let panne = self.repo
            .update_panne(&mut *tx, entreprise_id, id, typepanne_id, &name, description.as_deref())
            .await?;
        if let Some(parc_ids) = &payload.parc_ids {
            self.repo.replace_parcs(&mut *tx, panne.id, parc_ids).await?;
        }
        let parc_ids = self.repo.parc_ids(&mut *tx, panne.id).await?;
        tx.commit().await?;

        Ok(PanneDetail { panne, parc_ids })
    }

    pub async fn delete_panne(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.find_panne(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, PANNE_DEPENDENTS).await?;
        self.repo.delete_panne(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }
}
