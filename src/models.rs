pub mod auth;
pub mod engin;
pub mod entreprise;
pub mod import;
pub mod lubrifiant;
pub mod organisation;
pub mod panne;
pub mod rbac;
pub mod saisie;
