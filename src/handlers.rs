pub mod auth;
pub mod engins;
pub mod entreprises;
pub mod imports;
pub mod lubrifiants;
pub mod organisation;
pub mod pannes;
pub mod rbac;
pub mod saisies;
pub mod users;
