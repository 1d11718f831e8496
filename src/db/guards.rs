// src/db/guards.rs
//
// Guardas compartilhadas: posse (a linha pertence à entreprise?) e exclusão
// (ainda existem linhas dependentes?).

use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;

/// Tabelas com `entreprise_id`. Os nomes nunca vêm do usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantTable {
    Users,
    Roles,
    Sites,
    TypeParcs,
    Parcs,
    Engins,
    TypePannes,
    Pannes,
    Saisiehrms,
    Saisiehims,
    TypeLubrifiants,
    Lubrifiants,
    TypeConsommationLubs,
    Saisielubrifiants,
}

impl TenantTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantTable::Users => "users",
            TenantTable::Roles => "roles",
            TenantTable::Sites => "sites",
            TenantTable::TypeParcs => "typeparcs",
            TenantTable::Parcs => "parcs",
            TenantTable::Engins => "engins",
            TenantTable::TypePannes => "typepannes",
            TenantTable::Pannes => "pannes",
            TenantTable::Saisiehrms => "saisiehrms",
            TenantTable::Saisiehims => "saisiehims",
            TenantTable::TypeLubrifiants => "typelubrifiants",
            TenantTable::Lubrifiants => "lubrifiants",
            TenantTable::TypeConsommationLubs => "typeconsommationlubs",
            TenantTable::Saisielubrifiants => "saisielubrifiants",
        }
    }
}

/// Uma relação que bloqueia a exclusão: linhas de `table` cuja `column` aponta para o alvo.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub table: TenantTable,
    pub column: &'static str,
}

const fn dep(table: TenantTable, column: &'static str) -> Dependent {
    Dependent { table, column }
}

pub const ENTREPRISE_DEPENDENTS: &[Dependent] = &[
    dep(TenantTable::Users, "entreprise_id"),
    dep(TenantTable::Sites, "entreprise_id"),
];
pub const SITE_DEPENDENTS: &[Dependent] = &[
    dep(TenantTable::Engins, "site_id"),
    dep(TenantTable::Saisiehrms, "site_id"),
];
pub const TYPEPARC_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Parcs, "typeparc_id")];
pub const PARC_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Engins, "parc_id")];
pub const ENGIN_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Saisiehrms, "engin_id")];
pub const TYPEPANNE_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Pannes, "typepanne_id")];
pub const PANNE_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Saisiehims, "panne_id")];
pub const SAISIEHRM_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Saisiehims, "saisiehrm_id")];
pub const SAISIEHIM_DEPENDENTS: &[Dependent] = &[dep(TenantTable::Saisielubrifiants, "saisiehim_id")];
pub const TYPELUBRIFIANT_DEPENDENTS: &[Dependent] =
    &[dep(TenantTable::Lubrifiants, "typelubrifiant_id")];
pub const LUBRIFIANT_DEPENDENTS: &[Dependent] =
    &[dep(TenantTable::Saisielubrifiants, "lubrifiant_id")];
pub const TYPECONSOMMATIONLUB_DEPENDENTS: &[Dependent] =
    &[dep(TenantTable::Saisielubrifiants, "typeconsommationlub_id")];

/// `true` se a linha existe e pertence à entreprise.
pub async fn exists_in_entreprise<'e, E>(
    executor: E,
    table: TenantTable,
    id: Uuid,
    entreprise_id: Uuid,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1 AND entreprise_id = $2)",
        table.as_str()
    );
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(id)
        .bind(entreprise_id)
        .fetch_one(executor)
        .await?;
    Ok(exists)
}

/// Valida um id referenciado no payload (400 com o nome do campo se não for da entreprise).
pub async fn ensure_reference<'e, E>(
    executor: E,
    table: TenantTable,
    id: Uuid,
    entreprise_id: Uuid,
    field: &'static str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    if exists_in_entreprise(executor, table, id, entreprise_id).await? {
        Ok(())
    } else {
        Err(AppError::ReferenceNotFound { field })
    }
}

/// Valida uma lista de ids referenciados de uma só vez.
pub async fn ensure_references<'e, E>(
    executor: E,
    table: TenantTable,
    ids: &[Uuid],
    entreprise_id: Uuid,
    field: &'static str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    if ids.is_empty() {
        return Ok(());
    }

    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();

    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE id = ANY($1) AND entreprise_id = $2",
        table.as_str()
    );
    let found: i64 = sqlx::query_scalar(&sql)
        .bind(&unique)
        .bind(entreprise_id)
        .fetch_one(executor)
        .await?;

    if found as usize == unique.len() {
        Ok(())
    } else {
        Err(AppError::ReferenceNotFound { field })
    }
}

/// Contagem prévia à exclusão; a primeira relação com linhas bloqueia.
pub async fn ensure_deletable(
    conn: &mut PgConnection,
    id: Uuid,
    dependents: &[Dependent],
) -> Result<(), AppError> {
    for dependent in dependents {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            dependent.table.as_str(),
            dependent.column
        );
        let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;

        if count > 0 {
            tracing::info!(
                relation = dependent.table.as_str(),
                count,
                %id,
                "exclusão bloqueada por dependentes"
            );
            return Err(AppError::HasDependents {
                relation: dependent.table.as_str(),
                count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::i18n::I18nStore;

    const ALL: &[&[Dependent]] = &[
        ENTREPRISE_DEPENDENTS,
        SITE_DEPENDENTS,
        TYPEPARC_DEPENDENTS,
        PARC_DEPENDENTS,
        ENGIN_DEPENDENTS,
        TYPEPANNE_DEPENDENTS,
        PANNE_DEPENDENTS,
        SAISIEHRM_DEPENDENTS,
        SAISIEHIM_DEPENDENTS,
        TYPELUBRIFIANT_DEPENDENTS,
        LUBRIFIANT_DEPENDENTS,
        TYPECONSOMMATIONLUB_DEPENDENTS,
    ];

    #[test]
    fn parc_is_blocked_by_engins() {
        assert_eq!(PARC_DEPENDENTS[0].table, TenantTable::Engins);
        assert_eq!(PARC_DEPENDENTS[0].column, "parc_id");
    }

    #[test]
    fn every_blocking_relation_has_a_label() {
        let store = I18nStore::load("fr").unwrap();
        for deps in ALL {
            for d in deps.iter() {
                let key = format!("labels.{}", d.table.as_str());
                assert!(store.has("fr", &key), "{}", key);
                assert!(store.has("en", &key), "{}", key);
            }
        }
    }

    #[test]
    fn foreign_key_columns_are_plain_identifiers() {
        for deps in ALL {
            for d in deps.iter() {
                assert!(d.column.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
            }
        }
    }
}
