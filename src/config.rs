// src/config.rs

pub mod settings;

use std::{sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        EnginRepository, EntrepriseRepository, LubrifiantRepository, OrganisationRepository, PanneRepository,
        RbacRepository, SaisieRepository, UserRepository,
    },
    services::{
        AuthService, EnginService, EntrepriseService, ImportService, LubrifiantService, OrganisationService,
        PanneService, RbacService, SaisieService,
    },
};

pub use settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub entreprise_service: EntrepriseService,
    pub organisation_service: OrganisationService,
    pub engin_service: EnginService,
    pub panne_service: PanneService,
    pub saisie_service: SaisieService,
    pub lubrifiant_service: LubrifiantService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_secs))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_parts(settings, db_pool)
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_parts(settings: Settings, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load(&settings.default_locale)?);

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let entreprise_repo = EntrepriseRepository::new(db_pool.clone());
        let organisation_repo = OrganisationRepository::new(db_pool.clone());
        let engin_repo = EnginRepository::new(db_pool.clone());
        let panne_repo = PanneRepository::new(db_pool.clone());
        let saisie_repo = SaisieRepository::new(db_pool.clone());
        let lubrifiant_repo = LubrifiantRepository::new(db_pool.clone());

        // --- Serviços ---
        let auth_service = AuthService::new(
            user_repo.clone(),
            entreprise_repo.clone(),
            settings.jwt_secret.clone(),
            settings.token_ttl_days,
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo.clone(), user_repo.clone(), db_pool.clone());
        let entreprise_service = EntrepriseService::new(
            entreprise_repo,
            rbac_repo,
            user_repo,
            i18n_store.clone(),
            db_pool.clone(),
        );
        let organisation_service = OrganisationService::new(organisation_repo.clone(), db_pool.clone());
        let engin_service = EnginService::new(engin_repo.clone(), db_pool.clone());
        let panne_service = PanneService::new(panne_repo.clone(), db_pool.clone());
        let saisie_service = SaisieService::new(
            saisie_repo.clone(),
            engin_repo.clone(),
            panne_repo.clone(),
            db_pool.clone(),
        );
        let lubrifiant_service = LubrifiantService::new(
            lubrifiant_repo,
            saisie_repo,
            engin_repo.clone(),
            db_pool.clone(),
        );
        let import_service = ImportService::new(
            organisation_repo,
            engin_repo,
            panne_repo,
            i18n_store.clone(),
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            settings: Arc::new(settings),
            i18n_store,
            auth_service,
            rbac_service,
            entreprise_service,
            organisation_service,
            engin_service,
            panne_service,
            saisie_service,
            lubrifiant_service,
            import_service,
        })
    }
}
