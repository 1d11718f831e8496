// src/services/lubrifiant_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{Paginated, Pagination},
        error::{field_error, AppError},
    },
    db::{
        guards::{
            ensure_deletable, ensure_reference, TenantTable, LUBRIFIANT_DEPENDENTS, TYPECONSOMMATIONLUB_DEPENDENTS,
            TYPELUBRIFIANT_DEPENDENTS,
        },
        lubrifiant_repo::{LubCatalogue, SaisielubrifiantRecord},
        EnginRepository, LubrifiantRepository, SaisieRepository,
    },
    models::{
        lubrifiant::{
            CreateLubrifiantPayload, CreateSaisielubrifiantPayload, Lubrifiant, Saisielubrifiant,
            SaisielubrifiantFilter, TypeConsommationLub, TypeLubrifiant, UpdateLubrifiantPayload,
            UpdateSaisielubrifiantPayload,
        },
        organisation::NamePayload,
    },
    services::{clean_name, daily_hours::round_hours},
};

#[derive(Clone)]
pub struct LubrifiantService {
    repo: LubrifiantRepository,
    saisie_repo: SaisieRepository,
    engin_repo: EnginRepository,
    pool: PgPool,
}

impl LubrifiantService {
    pub fn new(
        repo: LubrifiantRepository,
        saisie_repo: SaisieRepository,
        engin_repo: EnginRepository,
        pool: PgPool,
    ) -> Self {
        Self { repo, saisie_repo, engin_repo, pool }
    }

    // ---
    // Types de lubrifiant
    // ---

    pub async fn list_typelubrifiants(&self, entreprise_id: Uuid) -> Result<Vec<TypeLubrifiant>, AppError> {
        self.repo.list_typelubrifiants(entreprise_id).await
    }

    pub async fn get_typelubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<TypeLubrifiant, AppError> {
        self.repo
            .find_typelubrifiant(entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "typelubrifiant" })
    }

    pub async fn create_typelubrifiant(&self, entreprise_id: Uuid, payload: NamePayload) -> Result<TypeLubrifiant, AppError> {
        let name = clean_name(&payload.name)?;
        let id = self.repo.create_named(LubCatalogue::TypeLubrifiants, entreprise_id, &name).await?;
        self.get_typelubrifiant(entreprise_id, id).await
    }

    pub async fn update_typelubrifiant(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: NamePayload,
    ) -> Result<TypeLubrifiant, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo.rename_named(LubCatalogue::TypeLubrifiants, entreprise_id, id, &name).await?;
        self.get_typelubrifiant(entreprise_id, id).await
    }

    pub async fn delete_typelubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get_typelubrifiant(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, TYPELUBRIFIANT_DEPENDENTS).await?;
        self.repo.delete_named(&mut *tx, LubCatalogue::TypeLubrifiants, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Types de consommation
    // ---

    pub async fn list_typeconsommationlubs(&self, entreprise_id: Uuid) -> Result<Vec<TypeConsommationLub>, AppError> {
        self.repo.list_typeconsommationlubs(entreprise_id).await
    }

    pub async fn get_typeconsommationlub(&self, entreprise_id: Uuid, id: Uuid) -> Result<TypeConsommationLub, AppError> {
        self.repo
            .find_typeconsommationlub(entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "typeconsommationlub" })
    }

    pub async fn create_typeconsommationlub(
        &self,
        entreprise_id: Uuid,
        payload: NamePayload,
    ) -> Result<TypeConsommationLub, AppError> {
        let name = clean_name(&payload.name)?;
        let id = self.repo.create_named(LubCatalogue::TypeConsommationLubs, entreprise_id, &name).await?;
        self.get_typeconsommationlub(entreprise_id, id).await
    }

    pub async fn update_typeconsommationlub(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: NamePayload,
    ) -> Result<TypeConsommationLub, AppError> {
        let name = clean_name(&payload.name)?;
        self.repo.rename_named(LubCatalogue::TypeConsommationLubs, entreprise_id, id, &name).await?;
        self.get_typeconsommationlub(entreprise_id, id).await
    }

    pub async fn delete_typeconsommationlub(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get_typeconsommationlub(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, TYPECONSOMMATIONLUB_DEPENDENTS).await?;
        self.repo.delete_named(&mut *tx, LubCatalogue::TypeConsommationLubs, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Lubrifiants
    // ---

    pub async fn list_lubrifiants(
        &self,
        entreprise_id: Uuid,
        typelubrifiant_id: Option<Uuid>,
    ) -> Result<Vec<Lubrifiant>, AppError> {
        self.repo.list_lubrifiants(entreprise_id, typelubrifiant_id).await
    }

    pub async fn get_lubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<Lubrifiant, AppError> {
        self.repo
            .find_lubrifiant(entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "lubrifiant" })
    }

    pub async fn create_lubrifiant(
        &self,
        entreprise_id: Uuid,
        payload: CreateLubrifiantPayload,
    ) -> Result<Lubrifiant, AppError> {
        let name = clean_name(&payload.name)?;
        let typelubrifiant_id = payload
            .typelubrifiant_id
            .ok_or_else(|| field_error("typelubrifiantId", "validation.required"))?;
        ensure_reference(&self.pool, TenantTable::TypeLubrifiants, typelubrifiant_id, entreprise_id, "typelubrifiantId")
            .await?;

        self.repo.create_lubrifiant(entreprise_id, typelubrifiant_id, &name).await
    }

    pub async fn update_lubrifiant(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateLubrifiantPayload,
    ) -> Result<Lubrifiant, AppError> {
        let current = self.get_lubrifiant(entreprise_id, id).await?;
        let name = match &payload.name {
            Some(name) => clean_name(name)?,
            None => current.name,
        };
        let typelubrifiant_id = payload.typelubrifiant_id.unwrap_or(current.typelubrifiant_id);
        ensure_reference(&self.pool, TenantTable::TypeLubrifiants, typelubrifiant_id, entreprise_id, "typelubrifiantId")
            .await?;

        self.repo.update_lubrifiant(entreprise_id, id, typelubrifiant_id, &name).await
    }

    pub async fn delete_lubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.get_lubrifiant(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        ensure_deletable(&mut *tx, id, LUBRIFIANT_DEPENDENTS).await?;
        self.repo.delete_lubrifiant(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }

    // ---
    // Saisies de lubrifiant (consumo ligado a uma HIM)
    // ---

    pub async fn list_saisielubrifiants(
        &self,
        entreprise_id: Uuid,
        filter: SaisielubrifiantFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Saisielubrifiant>, AppError> {
        let (rows, total) = self.repo.list_saisielubrifiants(entreprise_id, &filter, &pagination).await?;
        Ok(Paginated::new(rows, &pagination, total))
    }

    pub async fn get_saisielubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<Saisielubrifiant, AppError> {
        self.repo
            .find_saisielubrifiant(entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisielubrifiant" })
    }

    /// Lubrifiant da entreprise; tipo de consumo, se houver, associado ao parc do engin da HIM.
    async fn check_consommation(
        &self,
        entreprise_id: Uuid,
        saisiehim_id: Uuid,
        lubrifiant_id: Uuid,
        typeconsommationlub_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        ensure_reference(&self.pool, TenantTable::Lubrifiants, lubrifiant_id, entreprise_id, "lubrifiantId").await?;

        let Some(tcl_id) = typeconsommationlub_id else {
            return Ok(());
        };
        ensure_reference(
            &self.pool,
            TenantTable::TypeConsommationLubs,
            tcl_id,
            entreprise_id,
            "typeconsommationlubId",
        )
        .await?;

        let saisiehim = self.saisie_repo
            .find_saisiehim(&self.pool, entreprise_id, saisiehim_id)
            .await?
            .ok_or(AppError::ReferenceNotFound { field: "saisiehimId" })?;
        let engin = self.engin_repo
            .find(&self.pool, entreprise_id, saisiehim.engin_id)
            .await?
            .ok_or(AppError::NotFound { resource: "engin" })?;

        if !self.repo.consommation_allowed_for_parc(&self.pool, tcl_id, engin.parc_id).await? {
            return Err(AppError::ConsommationNotAllowedForParc);
        }
        Ok(())
    }

    pub async fn create_saisielubrifiant(
        &self,
        entreprise_id: Uuid,
        payload: CreateSaisielubrifiantPayload,
    ) -> Result<Saisielubrifiant, AppError> {
        let saisiehim_id = payload
            .saisiehim_id
            .ok_or_else(|| field_error("saisiehimId", "validation.required"))?;
        let lubrifiant_id = payload
            .lubrifiant_id
            .ok_or_else(|| field_error("lubrifiantId", "validation.required"))?;
        let qte = checked_qte(payload.qte.ok_or_else(|| field_error("qte", "validation.required"))?)?;

        // A HIM fica travada até o commit: uma exclusão concorrente espera e vê este lançamento
        let mut tx = self.pool.begin().await?;
        self.saisie_repo
            .lock_saisiehim(&mut *tx, entreprise_id, saisiehim_id)
            .await?
            .ok_or(AppError::ReferenceNotFound { field: "saisiehimId" })?;
        self.check_consommation(entreprise_id, saisiehim_id, lubrifiant_id, payload.typeconsommationlub_id)
            .await?;

        let record = SaisielubrifiantRecord {
            saisiehim_id,
            lubrifiant_id,
            typeconsommationlub_id: payload.typeconsommationlub_id,
            qte,
            obs: payload.obs.as_deref(),
        };
        let saisielubrifiant = self.repo.create_saisielubrifiant(&mut *tx, entreprise_id, &record).await?;
        tx.commit().await?;

        Ok(saisielubrifiant)
    }

    pub async fn update_saisielubrifiant(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateSaisielubrifiantPayload,
    ) -> Result<Saisielubrifiant, AppError> {
        let current = self.get_saisielubrifiant(entreprise_id, id).await?;

        let lubrifiant_id = payload.lubrifiant_id.unwrap_or(current.lubrifiant_id);
        let typeconsommationlub_id = payload.typeconsommationlub_id.or(current.typeconsommationlub_id);
        let qte = match payload.qte {
            Some(qte) => checked_qte(qte)?,
            None => current.qte,
        };
        self.check_consommation(entreprise_id, current.saisiehim_id, lubrifiant_id, typeconsommationlub_id)
            .await?;

        let obs = payload.obs.or(current.obs);
        let record = SaisielubrifiantRecord {
            saisiehim_id: current.saisiehim_id,
            lubrifiant_id,
            typeconsommationlub_id,
            qte,
            obs: obs.as_deref(),
        };
        self.repo.update_saisielubrifiant(entreprise_id, id, &record).await
    }

    pub async fn delete_saisielubrifiant(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        self.repo.delete_saisielubrifiant(entreprise_id, id).await
    }
}

/// Quantidade com duas casas, nunca negativa.
fn checked_qte(qte: Decimal) -> Result<Decimal, AppError> {
    let qte = round_hours(qte);
    if qte.is_sign_negative() && !qte.is_zero() {
        return Err(field_error("qte", "validation.not_negative"));
    }
    Ok(qte.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::common::test_support;
    use crate::models::saisie::{CreateSaisiehimPayload, CreateSaisiehrmPayload};

    fn entry(saisiehim_id: Uuid, lubrifiant_id: Uuid) -> CreateSaisielubrifiantPayload {
        CreateSaisielubrifiantPayload {
            saisiehim_id: Some(saisiehim_id),
            lubrifiant_id: Some(lubrifiant_id),
            typeconsommationlub_id: None,
            qte: Some("20".parse().unwrap()),
            obs: None,
        }
    }

    #[test]
    fn quantity_is_rounded_and_non_negative() {
        assert_eq!(checked_qte("12.345".parse().unwrap()).unwrap(), "12.35".parse::<Decimal>().unwrap());
        assert!(matches!(checked_qte("-1".parse().unwrap()), Err(AppError::ValidationError(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn entries_hold_their_him_against_deletion(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let other = test_support::entreprise(&pool, "ENTP").await;
        let fleet = test_support::fleet(&pool, eid).await;

        let parent = state
            .saisie_service
            .create_saisiehrm(
                eid,
                CreateSaisiehrmPayload {
                    du: NaiveDate::from_ymd_opt(2024, 3, 1),
                    engin_id: Some(fleet.engin_id),
                    hrm: Some("10".parse().unwrap()),
                    compteur: None,
                },
            )
            .await
            .unwrap();
        let him = state
            .saisie_service
            .create_saisiehim(
                eid,
                CreateSaisiehimPayload {
                    panne_id: Some(fleet.panne_ids[0]),
                    him: Some("2".parse().unwrap()),
                    ni: 1,
                    saisiehrm_id: Some(parent.id),
                    engin_id: Some(fleet.engin_id),
                    obs: None,
                },
            )
            .await
            .unwrap();

        let typelubrifiant = state
            .lubrifiant_service
            .create_typelubrifiant(eid, NamePayload { name: "Huile".into() })
            .await
            .unwrap();
        let lubrifiant_id: Uuid = sqlx::query_scalar(
            "INSERT INTO lubrifiants (entreprise_id, typelubrifiant_id, name) VALUES ($1, $2, '15W40') RETURNING id",
        )
        .bind(eid)
        .bind(typelubrifiant.id)
        .fetch_one(&pool)
        .await
        .unwrap();

        let created = state.lubrifiant_service.create_saisielubrifiant(eid, entry(him.id, lubrifiant_id)).await.unwrap();
        assert_eq!(created.saisiehim_id, him.id);

        let err = state.saisie_service.delete_saisiehim(eid, him.id).await.unwrap_err();
        assert!(matches!(err, AppError::HasDependents { relation: "saisielubrifiants", count: 1 }));

        // HIM inexistente ou de outra entreprise
        assert!(matches!(
            state.lubrifiant_service.create_saisielubrifiant(eid, entry(Uuid::new_v4(), lubrifiant_id)).await,
            Err(AppError::ReferenceNotFound { field: "saisiehimId" })
        ));
        assert!(matches!(
            state.lubrifiant_service.create_saisielubrifiant(other, entry(him.id, lubrifiant_id)).await,
            Err(AppError::ReferenceNotFound { field: "saisiehimId" })
        ));
    }
}
