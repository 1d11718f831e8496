// src/services/saisie_service.rs
//
// Saisies do dia. Toda escrita que mexe no total (HIM criada/alterada, HRM
// alterada) roda numa transação que começa travando a linha HRM.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{Paginated, Pagination},
        error::{field_error, AppError},
    },
    db::{
        guards::{ensure_deletable, SAISIEHIM_DEPENDENTS, SAISIEHRM_DEPENDENTS},
        saisie_repo::{SaisiehimRecord, SaisiehrmRecord},
        EnginRepository, PanneRepository, SaisieRepository,
    },
    models::{
        engin::Engin,
        saisie::{
            CreateSaisiehimPayload, CreateSaisiehrmPayload, Saisiehim, SaisiehimFilter, Saisiehrm, SaisiehrmDetail,
            SaisiehrmFilter, UpdateSaisiehimPayload, UpdateSaisiehrmPayload,
        },
    },
    services::daily_hours::{ensure_within_day, normalize_hours, remaining, round_hours, sum_him},
};

/// O engin informado na HIM tem de ser o da HRM-mãe.
fn ensure_same_engin(parent: &Saisiehrm, engin_id: Uuid) -> Result<(), AppError> {
    if parent.engin_id != engin_id {
        return Err(AppError::EnginMismatch);
    }
    Ok(())
}

#[derive(Clone)]
pub struct SaisieService {
    repo: SaisieRepository,
    engin_repo: EnginRepository,
    panne_repo: PanneRepository,
    pool: PgPool,
}

impl SaisieService {
    pub fn new(repo: SaisieRepository, engin_repo: EnginRepository, panne_repo: PanneRepository, pool: PgPool) -> Self {
        Self { repo, engin_repo, panne_repo, pool }
    }

    async fn find_engin(&self, conn: &mut PgConnection, entreprise_id: Uuid, engin_id: Uuid) -> Result<Engin, AppError> {
        self.engin_repo
            .find(&mut *conn, entreprise_id, engin_id)
            .await?
            .ok_or(AppError::ReferenceNotFound { field: "enginId" })
    }

    /// Panne da entreprise e associada ao parc do engin.
    async fn check_panne(
        &self,
        conn: &mut PgConnection,
        entreprise_id: Uuid,
        panne_id: Uuid,
        engin: &Engin,
    ) -> Result<(), AppError> {
        self.panne_repo
            .find_panne(&mut *conn, entreprise_id, panne_id)
            .await?
            .ok_or(AppError::ReferenceNotFound { field: "panneId" })?;

        if !self.panne_repo.is_allowed_for_parc(&mut *conn, panne_id, engin.parc_id).await? {
            return Err(AppError::PanneNotAllowedForParc);
        }
        Ok(())
    }

    // ---
    // HRM
    // ---

    pub async fn list_saisiehrms(
        &self,
        entreprise_id: Uuid,
        filter: SaisiehrmFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Saisiehrm>, AppError> {
        let (rows, total) = self.repo.list_saisiehrms(entreprise_id, &filter, &pagination).await?;
        Ok(Paginated::new(rows, &pagination, total))
    }

    /// HRM + HIM do dia, com o total e o saldo até 24h.
    pub async fn get_saisiehrm(&self, entreprise_id: Uuid, id: Uuid) -> Result<SaisiehrmDetail, AppError> {
        let saisiehrm = self.repo
            .find_saisiehrm(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehrm" })?;
        let saisiehims = self.repo.saisiehims_of(&self.pool, saisiehrm.id).await?;

        let total_him = sum_him(saisiehims.iter().map(|h| h.him));
        let total = saisiehrm.hrm + total_him;

        Ok(SaisiehrmDetail {
            saisiehrm,
            saisiehims,
            total_him,
            total,
            remaining: remaining(total),
        })
    }

    pub async fn create_saisiehrm(
        &self,
        entreprise_id: Uuid,
        payload: CreateSaisiehrmPayload,
    ) -> Result<Saisiehrm, AppError> {
        let du = payload.du.ok_or_else(|| field_error("du", "validation.required"))?;
        let engin_id = payload.engin_id.ok_or(AppError::ReferenceNotFound { field: "enginId" })?;
        let hrm = normalize_hours(payload.hrm.ok_or_else(|| field_error("hrm", "validation.required"))?, "hrm")?;

        let mut tx = self.pool.begin().await?;

        let engin = self.find_engin(&mut *tx, entreprise_id, engin_id).await?;
        if !engin.active {
            return Err(AppError::EnginInactive { name: engin.name });
        }

        if self.repo.exists_for_day(&mut *tx, entreprise_id, du, engin.id, None).await? {
            return Err(AppError::SaisiehrmAlreadyExists { du });
        }

        let record = SaisiehrmRecord {
            du,
            engin_id: engin.id,
            site_id: engin.site_id,
            hrm,
            compteur: payload.compteur.map(round_hours),
        };
        let saisiehrm = self.repo.create_saisiehrm(&mut *tx, entreprise_id, &record).await?;
        tx.commit().await?;

        tracing::info!(saisiehrm_id = %saisiehrm.id, engin_id = %engin.id, %du, %hrm, "saisie HRM criada");
        Ok(saisiehrm)
    }

    pub async fn update_saisiehrm(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateSaisiehrmPayload,
    ) -> Result<Saisiehrm, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self.repo
            .lock_saisiehrm(&mut *tx, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehrm" })?;

        let du = payload.du.unwrap_or(current.du);
        let engin_id = payload.engin_id.unwrap_or(current.engin_id);
        let hrm = match payload.hrm {
            Some(hrm) => normalize_hours(hrm, "hrm")?,
            None => current.hrm,
        };

        let siblings = self.repo.sibling_him(&mut *tx, current.id, None).await?;

        // Trocar o engin de uma HRM que já tem HIM deixaria as filhas apontando para outro engin
        let site_id = if engin_id != current.engin_id {
            if !siblings.is_empty() {
                return Err(AppError::EnginMismatch);
            }
            let engin = self.find_engin(&mut *tx, entreprise_id, engin_id).await?;
            if !engin.active {
                return Err(AppError::EnginInactive { name: engin.name });
            }
            engin.site_id
        } else {
            current.site_id
        };

        ensure_within_day(hrm, sum_him(siblings), rust_decimal::Decimal::ZERO)?;

        if (du, engin_id) != (current.du, current.engin_id)
            && self.repo.exists_for_day(&mut *tx, entreprise_id, du, engin_id, Some(current.id)).await?
        {
            return Err(AppError::SaisiehrmAlreadyExists { du });
        }

        let record = SaisiehrmRecord {
            du,
            engin_id,
            site_id,
            hrm,
            compteur: payload.compteur.map(round_hours).or(current.compteur),
        };
        let saisiehrm = self.repo.update_saisiehrm(&mut *tx, entreprise_id, id, &record).await?;
        tx.commit().await?;

        Ok(saisiehrm)
    }

    pub async fn delete_saisiehrm(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.repo
            .lock_saisiehrm(&mut *tx, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehrm" })?;
        ensure_deletable(&mut *tx, id, SAISIEHRM_DEPENDENTS).await?;
        self.repo.delete_saisiehrm(&mut *tx, entreprise_id, id).await?;

        tx.commit().await?;
        Ok(())
    }

    // ---
    // HIM
    // ---

    pub async fn list_saisiehims(
        &self,
        entreprise_id: Uuid,
        filter: SaisiehimFilter,
        pagination: Pagination,
    ) -> Result<Paginated<Saisiehim>, AppError> {
        let (rows, total) = self.repo.list_saisiehims(entreprise_id, &filter, &pagination).await?;
        Ok(Paginated::new(rows, &pagination, total))
    }

    pub async fn get_saisiehim(&self, entreprise_id: Uuid, id: Uuid) -> Result<Saisiehim, AppError> {
        self.repo
            .find_saisiehim(&self.pool, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehim" })
    }

    pub async fn create_saisiehim(
        &self,
        entreprise_id: Uuid,
        payload: CreateSaisiehimPayload,
    ) -> Result<Saisiehim, AppError> {
        let saisiehrm_id = payload.saisiehrm_id.ok_or_else(|| field_error("saisiehrmId", "validation.required"))?;
        let panne_id = payload.panne_id.ok_or(AppError::ReferenceNotFound { field: "panneId" })?;
        let engin_id = payload.engin_id.ok_or(AppError::ReferenceNotFound { field: "enginId" })?;
        let him = normalize_hours(payload.him.ok_or_else(|| field_error("him", "validation.required"))?, "him")?;

        let mut tx = self.pool.begin().await?;

        // 1. Trava a HRM-mãe: escritores concorrentes do mesmo dia esperam aqui
        let parent = self.repo
            .lock_saisiehrm(&mut *tx, entreprise_id, saisiehrm_id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehrm" })?;

        // 2. Panne e engin coerentes com a HRM
        ensure_same_engin(&parent, engin_id)?;
        let engin = self.find_engin(&mut *tx, entreprise_id, parent.engin_id).await?;
        self.check_panne(&mut *tx, entreprise_id, panne_id, &engin).await?;

        // 3. Uma HIM por panne no dia
        if self.repo.panne_already_entered(&mut *tx, parent.id, panne_id, None).await? {
            return Err(AppError::SaisiehimAlreadyExists);
        }

        // 4. Teto diário
        let siblings = self.repo.sibling_him(&mut *tx, parent.id, None).await?;
        let total = ensure_within_day(parent.hrm, sum_him(siblings), him)?;

        let record = SaisiehimRecord { panne_id, him, ni: payload.ni, obs: payload.obs.as_deref() };
        let saisiehim = self.repo.create_saisiehim(&mut *tx, &parent, &record).await?;
        tx.commit().await?;

        tracing::info!(saisiehim_id = %saisiehim.id, saisiehrm_id = %parent.id, %him, %total, "saisie HIM criada");
        Ok(saisiehim)
    }

    pub async fn update_saisiehim(
        &self,
        entreprise_id: Uuid,
        id: Uuid,
        payload: UpdateSaisiehimPayload,
    ) -> Result<Saisiehim, AppError> {
        let before_lock = self.get_saisiehim(entreprise_id, id).await?;

        let mut tx = self.pool.begin().await?;
        let parent = self.repo
            .lock_saisiehrm(&mut *tx, entreprise_id, before_lock.saisiehrm_id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehrm" })?;

        // Relê com a trava tomada
        let current = self.repo
            .find_saisiehim(&mut *tx, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehim" })?;

        let panne_id = payload.panne_id.unwrap_or(current.panne_id);
        if panne_id != current.panne_id {
            let engin = self.find_engin(&mut *tx, entreprise_id, parent.engin_id).await?;
            self.check_panne(&mut *tx, entreprise_id, panne_id, &engin).await?;
            if self.repo.panne_already_entered(&mut *tx, parent.id, panne_id, Some(current.id)).await? {
                return Err(AppError::SaisiehimAlreadyExists);
            }
        }

        let him = match payload.him {
            Some(him) => normalize_hours(him, "him")?,
            None => current.him,
        };
        let siblings = self.repo.sibling_him(&mut *tx, parent.id, Some(current.id)).await?;
        ensure_within_day(parent.hrm, sum_him(siblings), him)?;

        let obs = payload.obs.or(current.obs);
        let record = SaisiehimRecord {
            panne_id,
            him,
            ni: payload.ni.unwrap_or(current.ni),
            obs: obs.as_deref(),
        };
        let saisiehim = self.repo.update_saisiehim(&mut *tx, entreprise_id, id, &record).await?;
        tx.commit().await?;

        Ok(saisiehim)
    }

    /// Excluir só diminui o total do dia; nada a revalidar.
    pub async fn delete_saisiehim(&self, entreprise_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.repo
            .lock_saisiehim(&mut *tx, entreprise_id, id)
            .await?
            .ok_or(AppError::NotFound { resource: "saisiehim" })?;
        ensure_deletable(&mut *tx, id, SAISIEHIM_DEPENDENTS).await?;
        self.repo.delete_saisiehim(&mut *tx, entreprise_id, id).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::common::test_support::{self, Fleet};
    use crate::middleware::i18n::Locale;

    fn h(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn saisiehrm(engin_id: Uuid) -> Saisiehrm {
        Saisiehrm {
            id: Uuid::new_v4(),
            entreprise_id: Uuid::new_v4(),
            du: day(),
            engin_id,
            site_id: Uuid::new_v4(),
            hrm: Decimal::new(10, 0),
            compteur: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn hrm_payload(fleet: &Fleet, hrm: &str) -> CreateSaisiehrmPayload {
        CreateSaisiehrmPayload { du: Some(day()), engin_id: Some(fleet.engin_id), hrm: Some(h(hrm)), compteur: None }
    }

    fn him_payload(parent: &Saisiehrm, panne_id: Uuid, him: &str) -> CreateSaisiehimPayload {
        CreateSaisiehimPayload {
            panne_id: Some(panne_id),
            him: Some(h(him)),
            ni: 0,
            saisiehrm_id: Some(parent.id),
            engin_id: Some(parent.engin_id),
            obs: None,
        }
    }

    #[test]
    fn him_must_target_the_parent_engin() {
        let engin = Uuid::new_v4();
        let parent = saisiehrm(engin);

        assert!(ensure_same_engin(&parent, engin).is_ok());
        assert!(matches!(ensure_same_engin(&parent, Uuid::new_v4()), Err(AppError::EnginMismatch)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn him_that_would_reach_25h_is_rejected(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.saisie_service;

        let parent = service.create_saisiehrm(eid, hrm_payload(&fleet, "10")).await.unwrap();
        service.create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[0], "8")).await.unwrap();

        let err = service
            .create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[1], "7"))
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::DailyHoursExceeded { total } if *total == h("25")));

        let api = err.to_api_error(&Locale("fr".into()), &state.i18n_store);
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.contains("25h"), "{}", api.message);

        let detail = service.get_saisiehrm(eid, parent.id).await.unwrap();
        assert_eq!(detail.saisiehims.len(), 1);
        assert_eq!(detail.total, h("18"));
        assert_eq!(detail.remaining, h("6"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn him_update_excludes_its_own_previous_value(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.saisie_service;

        let parent = service.create_saisiehrm(eid, hrm_payload(&fleet, "10")).await.unwrap();
        let him = service.create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[0], "8")).await.unwrap();
        service.create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[1], "5")).await.unwrap();

        let update = |value: &str| UpdateSaisiehimPayload { panne_id: None, him: Some(h(value)), ni: None, obs: None };

        // 10 + 5 + 9 = 24
        let updated = service.update_saisiehim(eid, him.id, update("9")).await.unwrap();
        assert_eq!(updated.him, h("9"));

        // 10 + 5 + 10 = 25
        let err = service.update_saisiehim(eid, him.id, update("10")).await.unwrap_err();
        assert!(matches!(err, AppError::DailyHoursExceeded { total } if total == h("25")));
        assert_eq!(service.get_saisiehim(eid, him.id).await.unwrap().him, h("9"));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn second_hrm_for_the_same_day_and_engin_conflicts(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.saisie_service;

        service.create_saisiehrm(eid, hrm_payload(&fleet, "10")).await.unwrap();

        let err = service.create_saisiehrm(eid, hrm_payload(&fleet, "4")).await.unwrap_err();
        assert!(matches!(err, AppError::SaisiehrmAlreadyExists { du } if du == day()));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        // Sem a checagem prévia, a constraint do banco dá o mesmo conflito
        let record = SaisiehrmRecord { du: day(), engin_id: fleet.engin_id, site_id: fleet.site_id, hrm: h("4"), compteur: None };
        let err = SaisieRepository::new(pool.clone())
            .create_saisiehrm(&pool, eid, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SaisiehrmAlreadyExists { .. }));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn same_panne_twice_in_one_day_conflicts(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.saisie_service;

        let parent = service.create_saisiehrm(eid, hrm_payload(&fleet, "10")).await.unwrap();
        service.create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[0], "2")).await.unwrap();

        let err = service
            .create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[0], "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SaisiehimAlreadyExists));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let record = SaisiehimRecord { panne_id: fleet.panne_ids[0], him: h("1"), ni: 0, obs: None };
        let err = SaisieRepository::new(pool.clone())
            .create_saisiehim(&pool, &parent, &record)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SaisiehimAlreadyExists));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn other_entreprise_gets_not_found(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let owner = test_support::entreprise(&pool, "ENAFOR").await;
        let intruder = test_support::entreprise(&pool, "ENTP").await;
        let fleet = test_support::fleet(&pool, owner).await;
        let service = &state.saisie_service;

        let parent = service.create_saisiehrm(owner, hrm_payload(&fleet, "10")).await.unwrap();
        let him = service.create_saisiehim(owner, him_payload(&parent, fleet.panne_ids[0], "2")).await.unwrap();

        let err = service.get_saisiehrm(intruder, parent.id).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let update = UpdateSaisiehrmPayload { du: None, engin_id: None, hrm: Some(h("1")), compteur: None };
        assert!(matches!(
            service.update_saisiehrm(intruder, parent.id, update).await,
            Err(AppError::NotFound { resource: "saisiehrm" })
        ));
        assert!(matches!(
            service.delete_saisiehim(intruder, him.id).await,
            Err(AppError::NotFound { resource: "saisiehim" })
        ));

        // HIM apontando para a HRM de outra entreprise
        let err = service
            .create_saisiehim(intruder, him_payload(&parent, fleet.panne_ids[1], "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let detail = service.get_saisiehrm(owner, parent.id).await.unwrap();
        assert_eq!(detail.saisiehrm.hrm, h("10"));
        assert_eq!(detail.saisiehims.len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn him_with_lubrifiant_entries_cannot_be_deleted(pool: PgPool) {
        let state = test_support::state(pool.clone());
        let eid = test_support::entreprise(&pool, "ENAFOR").await;
        let fleet = test_support::fleet(&pool, eid).await;
        let service = &state.saisie_service;

        let parent = service.create_saisiehrm(eid, hrm_payload(&fleet, "10")).await.unwrap();
        let him = service.create_saisiehim(eid, him_payload(&parent, fleet.panne_ids[0], "2")).await.unwrap();

        let typelubrifiant_id: Uuid =
            sqlx::query_scalar("INSERT INTO typelubrifiants (entreprise_id, name) VALUES ($1, 'Huile') RETURNING id")
                .bind(eid)
                .fetch_one(&pool)
                .await
                .unwrap();
        let lubrifiant_id: Uuid = sqlx::query_scalar(
            "INSERT INTO lubrifiants (entreprise_id, typelubrifiant_id, name) VALUES ($1, $2, '15W40') RETURNING id",
        )
        .bind(eid)
        .bind(typelubrifiant_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO saisielubrifiants (entreprise_id, saisiehim_id, lubrifiant_id, qte) VALUES ($1, $2, $3, 20)")
            .bind(eid)
            .bind(him.id)
            .bind(lubrifiant_id)
            .execute(&pool)
            .await
            .unwrap();

        let err = service.delete_saisiehim(eid, him.id).await.unwrap_err();
        assert!(matches!(err, AppError::HasDependents { count: 1, .. }));
        assert!(service.get_saisiehim(eid, him.id).await.is_ok());
    }
}
