pub mod guards;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod entreprise_repo;
pub use entreprise_repo::EntrepriseRepository;
pub mod organisation_repo;
pub use organisation_repo::OrganisationRepository;
pub mod engin_repo;
pub use engin_repo::EnginRepository;
pub mod panne_repo;
pub use panne_repo::PanneRepository;
pub mod saisie_repo;
pub use saisie_repo::SaisieRepository;
pub mod lubrifiant_repo;
pub use lubrifiant_repo::LubrifiantRepository;
