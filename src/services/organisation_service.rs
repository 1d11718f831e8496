// src/services/organisation_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        guards::{ensure_deletable, ensure_references, TenantTable, PARC_DEPENDENTS, SITE_DEPENDENTS, TYPEPARC_DEPENDENTS},
        OrganisationRepository,
    },
    models::organisation::{
        CreateParcPayload, CreateSitePayload, NamePayload, Parc, ParcDetail, Site, TypeParc, UpdateParcPayload,
        UpdateSitePayload,
    },
    services::clean_name,
};

#[derive(Clone)]
pub struct OrganisationService {
    repo: OrganisationRepository,
    pool: PgPool,
}

impl OrganisationService {
    pub fn new(repo: OrganisationRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    // ---
    // Sites
    // ---

    pub async fn list_sites(&self, entreprise_id: Uuid) -> Result<Vec<Site>, AppError> {
        self.repo.list_sites(entreprise_id).await
    }

    pub async fn get_site(&self, entreprise_id: Uuid, id: Uuid) -> Result<Site, AppError> {
        self.repo
            .find_site(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "site" })
    }

    pub async fn create_site(&self, entreprise_id: Uuid, payload: CreateSitePayload) -> Result<Site, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo
            .create_site(&self.pool, entreprise_id, &name, payload.active.unwrap_or(true))
            .await
    }

    pub async fn update_site(&self, entreprise_id: Uuid, id: Uuid, payload: UpdateSitePayload) -> Result<Site, AppError> {
        let current = self.get_site(entreprise_id, id).await?;
        let name = match &payload.name {
            Some(name) => clean_name(name)?,
            None => current.name,
        };
        let active = payload.active.unwrap_or(current.active);
        self.repo.update_site(&self.pool, entreprise_id, id, &name, active).await
    }

    pub async fn delete_site(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get_site(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, SITE_DEPENDENTS).await?;
        self.repo.delete_site(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Types de parc
    // ---

    pub async fn list_typeparcs(&self, entreprise_id: Uuid) -> Result<Vec<TypeParc>, AppError> {
        self.repo.list_typeparcs(entreprise_id).await
    }

    pub async fn get_typeparc(&self, entreprise_id: Uuid, id: Uuid) -> Result<TypeParc, AppError> {
        self.repo
            .find_typeparc(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "typeparc" })
    }

    pub async fn create_typeparc(&self, entreprise_id: Uuid, payload: NamePayload) -> Result<TypeParc, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo.create_typeparc(&self.pool, entreprise_id, &name).await
    }

    pub async fn update_typeparc(&self, entreprise_id: Uuid, id: Uuid, payload: NamePayload) -> Result<TypeParc, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo.rename_typeparc(&self.pool, entreprise_id, id, &name).await
    }

    pub async fn delete_typeparc(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get_typeparc(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, TYPEPARC_DEPENDENTS).await?;
        self.repo.delete_typeparc(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Parcs
    // ---

    pub async fn list_parcs(&self, entreprise_id: Uuid, typeparc_id: Option<Uuid>) -> Result<Vec<Parc>, AppError> {
        self.repo.list_parcs(entreprise_id, typeparc_id).await
    }

    async fn find_parc(&self, entreprise_id: Uuid, id: Uuid) -> Result<Parc, AppError> {
        self.repo
            .find_parc(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "parc" })
    }

    async fn detail(&self, parc: Parc) -> Result<ParcDetail, AppError> {
        let typepanne_ids = self.repo.parc_typepanne_ids(&self.pool, parc.id).await?;
        let typeconsommationlub_ids = self.repo.parc_typeconsommationlub_ids(&self.pool, parc.id).await?;
        Ok(ParcDetail { parc, typepanne_ids, typeconsommationlub_ids })
    }

    pub async fn get_parc(&self, entreprise_id: Uuid, id: Uuid) -> Result<ParcDetail, AppError> {
        let parc = self.find_parc(entreprise_id, id).await?;
        self.detail(parc).await
    }

    pub async fn create_parc(&self, entreprise_id: Uuid, payload: CreateParcPayload) -> Result<ParcDetail, AppError> {
        let name = clean_name(&payload.name)?;
        let typeparc_id = payload.typeparc_id.ok_or(AppError::ReferenceNotFound { field: "typeparcId" })?;

        ensure_references(&self.pool, TenantTable::TypeParcs, &[typeparc_id], entreprise_id, "typeparcId").await?;
        ensure_references(&self.pool, TenantTable::TypePannes, &payload.typepanne_ids, entreprise_id, "typepanneIds")
            .await?;
        ensure_references(
            &self.pool,
            TenantTable::TypeConsommationLubs,
            &payload.typeconsommationlub_ids,
            entreprise_id,
            "typeconsommationlubIds",
        )
        .await?;

        let mut tx = self.pool.begin().await?;
        let parc = self.repo.create_parc(&mut *tx, entreprise_id, typeparc_id, &name).await?;
        self.repo.replace_parc_typepannes(&mut *tx, parc.id, &payload.typepanne_ids).await?;
        self.repo
            .replace_parc_typeconsommationlubs(&mut *tx, parc.id, &payload.typeconsommationlub_ids)
            .await?;
        tx.commit().await?;

        self.detail(parc).await
    }

    pub async fn update_parc(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateParcPayload,
    ) -> Result<ParcDetail, AppError> {
        let current = self.find_parc(entreprise_id, id).await?;
        let name = match &payload.name {
            Some(name) => clean_name(name)?,
            None => current.name,
        };
        let typeparc_id = payload.typeparc_id.unwrap_or(current.typeparc_id);

        ensure_references(&self.pool, TenantTable::TypeParcs, &[typeparc_id], entreprise_id, "typeparcId").await?;
        if let Some(ids) = &payload.typepanne_ids {
            ensure_references(&self.pool, TenantTable::TypePannes, ids, entreprise_id, "typepanneIds").await?;
        }
        if let Some(ids) = &payload.typeconsommationlub_ids {
            ensure_references(&self.pool, TenantTable::TypeConsommationLubs, ids, entreprise_id, "typeconsommationlubIds")
                .await?;
        }

        let mut tx = self.pool.begin().await?;
        let parc = self.repo.update_parc(&mut *tx, entreprise_id, id, typeparc_id, &name).await?;
        if let Some(ids) = &payload.typepanne_ids {
            self.repo.replace_parc_typepannes(&mut *tx, parc.id, ids).await?;
        }
        if let Some(ids) = &payload.typeconsommationlub_ids {
            self.repo.replace_parc_typeconsommationlubs(&mut *tx, parc.id, ids).await?;
        }
        tx.commit().await?;

        self.detail(parc).await
    }

    pub async fn delete_parc(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.find_parc(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, PARC_DEPENDENTS).await?;
        self.repo.delete_parc(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;

        tracing::info!(parc_id = %id, "parc removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::common::test_support;

    #[sqlx::test(migrations = "./migrations")]
    async fn parc_with_engins_is_kept(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.organisation_service;

        let err = service.delete_parc(eid, fleet.parc_id).await.unwrap_err();
        assert!(matches!(err, AppError::HasDependents { relation: "engins", count: 1 }));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        assert_eq!(service.get_parc(eid, fleet.parc_id).await.unwrap().parc.id, fleet.parc_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn empty_parc_can_be_deleted(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.organisation_service;

        let parc = service
            .create_parc(
                eid,
                CreateParcPayload {
                    name: "  Compresseurs ".into(),
                    typeparc_id: Some(service.get_parc(eid, fleet.parc_id).await.unwrap().parc.typeparc_id),
                    typepanne_ids: vec![],
                    typeconsommationlub_ids: vec![],
                },
            )
            .await
            .unwrap();
        assert_eq!(parc.parc.name, "Compresseurs");

        service.delete_parc(eid, parc.parc.id).await.unwrap();
        assert!(matches!(
            service.get_parc(eid, parc.parc.id).await,
            Err(AppError::NotFound { resource: "parc" })
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn sites_of_another_entreprise_are_invisible(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let owner = test_support::entreprise(&pool, "ENAFOR").await;
        let intruder = test_support::entreprise(&pool, "ENTP").await;
        let fleet = test_support::fleet(&pool, owner).await;
        let service = &state.organisation_service;

        assert_eq!(service.get_site(intruder, fleet.site_id).await.unwrap_err().status(), StatusCode::NOT_FOUND);
        assert_eq!(service.get_parc(intruder, fleet.parc_id).await.unwrap_err().status(), StatusCode::NOT_FOUND);

        let rename = UpdateSitePayload { name: Some("Piraté".into()), active: None };
        assert_eq!(
            service.update_site(intruder, fleet.site_id, rename).await.unwrap_err().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(service.delete_parc(intruder, fleet.parc_id).await.unwrap_err().status(), StatusCode::NOT_FOUND);

        assert!(service.list_sites(intruder).await.unwrap().is_empty());
        assert_eq!(service.get_site(owner, fleet.site_id).await.unwrap().name, "Hassi Messaoud");
    }
}
