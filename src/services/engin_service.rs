// src/services/engin_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{Paginated, Pagination},
        error::AppError,
    },
    db::{
        engin_repo::EnginRecord,
        guards::{ensure_deletable, ensure_reference, TenantTable, ENGIN_DEPENDENTS},
        EnginRepository,
    },
    models::engin::{CreateEnginPayload, Engin, EnginFilter, HeuresChassis, HeuresChassisQuery, UpdateEnginPayload},
    services::{clean_name, daily_hours::round_hours},
};

#[derive(Clone)]
pub struct EnginService {
    repo: EnginRepository,
    pool: PgPool,
}

impl EnginService {
    pub fn new(repo: EnginRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn list(
        &self,
        entreprise_id: Uuid,
        filter: EnginFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Engin>, AppError> {
        let (engins, total) = self.repo.list(entreprise_id, &filter, &pagination).await?;
        Ok(Paginated::new(engins, &pagination, total))
    }

    pub async fn get(&self, entreprise_id: Uuid, id: Uuid) -> Result<Engin, AppError> {
        self.repo
            .find(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "engin" })
    }

    async fn check_placement(&self, entreprise_id: Uuid, parc_id: Uuid, site_id: Uuid) -> Result<(), AppError> {
        ensure_reference(&self.pool, TenantTable::Parcs, parc_id, entreprise_id, "parcId").await?;
        ensure_reference(&self.pool, TenantTable::Sites, site_id, entreprise_id, "siteId").await?;
        Ok(())
    }

    pub async fn create(&self, entreprise_id: Uuid, payload: CreateEnginPayload) -> Result<Engin, AppError> {
        let name = clean_name(&payload.name)?;
        let parc_id = payload.parc_id.ok_or(AppError::ReferenceNotFound { field: "parcId" })?;
        let site_id = payload.site_id.ok_or(AppError::ReferenceNotFound { field: "siteId" })?;
        self.check_placement(entreprise_id, parc_id, site_id).await?;

        let record = EnginRecord {
            name: &name,
            parc_id,
            site_id,
            active: payload.active.unwrap_or(true),
            initial_heure_chassis: round_hours(payload.initial_heure_chassis.unwrap_or(Decimal::ZERO)),
        };
        let engin = self.repo.create(&self.pool, entreprise_id, &record).await?;

        tracing::info!(engin_id = %engin.id, %entreprise_id, "engin criado");
        Ok(engin)
    }

    pub async fn update(&self, entreprise_id: Uuid, id: Uuid, payload: UpdateEnginPayload) -> Result<Engin, AppError> {
        let current = self.get(entreprise_id, id).await?;
        let name = match &payload.name {
            Some(name) => clean_name(name)?,
            None => current.name,
        };
        let parc_id = payload.parc_id.unwrap_or(current.parc_id);
        let site_id = payload.site_id.unwrap_or(current.site_id);
        self.check_placement(entreprise_id, parc_id, site_id).await?;

        let record = EnginRecord {
            name: &name,
            parc_id,
            site_id,
            active: payload.active.unwrap_or(current.active),
            initial_heure_chassis: payload
                .initial_heure_chassis
                .map(round_hours)
                .unwrap_or(current.initial_heure_chassis),
        };
        self.repo.update(&self.pool, entreprise_id, id, &record).await
    }

    pub async fn delete(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, ENGIN_DEPENDENTS).await?;
        self.repo.delete(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Horímetro do chassi numa data: base inicial + Σ hrm até ela.
    pub async fn heures_chassis(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        query: HeuresChassisQuery,
    ) -> Result<HeuresChassis, AppError> {
        let engin = self.get(entreprise_id, id).await?;
        let au = query.au.unwrap_or_else(|| Utc::now().date_naive());

        let total_hrm = self.repo.total_hrm_until(entreprise_id, engin.id, au).await?;

        Ok(HeuresChassis {
            engin_id: engin.id,
            au,
            initial_heure_chassis: engin.initial_heure_chassis,
            total_hrm,
            heure_chassis: engin.initial_heure_chassis + total_hrm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::common::test_support;

    fn payload(name: &str, fleet: &test_support::Fleet) -> CreateEnginPayload {
        CreateEnginPayload {
            name: name.into(),
            parc_id: Some(fleet.parc_id),
            site_id: Some(fleet.site_id),
            active: None,
            initial_heure_chassis: Some("1250.456".parse().unwrap()),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn created_engin_reads_back_trimmed_and_active(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.engin_service;

        let created = service.create(eid, payload("  CHG-01  ", &fleet)).await.unwrap();
        let fetched = service.get(eid, created.id).await.unwrap();

        assert_eq!(fetched.name, "CHG-01");
        assert!(fetched.active);
        assert_eq!(fetched.parc_id, fleet.parc_id);
        assert_eq!(fetched.site_id, fleet.site_id);
        assert_eq!(fetched.initial_heure_chassis, "1250.46".parse::<Decimal>().unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn engins_do_not_cross_entreprises(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let owner = test_support::entreprise(&pool, "ENAFOR").await;
        let intruder = test_support::entreprise(&pool, "ENTP").await;
        let fleet = test_support::fleet(&pool, owner).await;
        let service = &state.engin_service;

        assert_eq!(service.get(intruder, fleet.engin_id).await.unwrap_err().status(), StatusCode::NOT_FOUND);
        assert_eq!(service.delete(intruder, fleet.engin_id).await.unwrap_err().status(), StatusCode::NOT_FOUND);

        // Parc e site de outra entreprise não servem de referência
        let err = service.create(intruder, payload("CHG-02", &fleet)).await.unwrap_err();
        assert!(matches!(err, AppError::ReferenceNotFound { field: "parcId" }));

        assert_eq!(service.get(owner, fleet.engin_id).await.unwrap().name, "FOR-01");
    }
}
