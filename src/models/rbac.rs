// src/models/rbac.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)]
    pub entreprise_id: Uuid,

    #[schema(example = "Chef d'atelier")]
    pub name: String,

    #[schema(example = "Saisie des heures et des pannes")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,

    #[schema(example = "saisiehrms")]
    pub resource: String,

    #[schema(example = "create")]
    pub action: String,

    #[schema(example = "Create saisiehrms")]
    pub description: String,
}

impl Permission {
    pub fn slug(&self) -> String {
        permission_slug(&self.resource, &self.action)
    }
}

pub fn permission_slug(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}

// Linha achatada: cargo de um usuário + slug de uma permissão (LEFT JOIN)
#[derive(Debug, Clone, FromRow)]
pub struct RolePermissionRow {
    pub role_id: Uuid,
    pub role_name: String,
    pub resource: Option<String>,
    pub action: Option<String>,
}

// Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    #[schema(example = "Chef d'atelier")]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    #[schema(example = json!(["saisiehrms:read", "saisiehrms:create"]))]
    pub permissions: Vec<String>,
}

// Payload para atualizar nome/descrição e (opcionalmente) substituir as permissões
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub permissions: Option<Vec<String>>,
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["saisiehrms:read", "saisiehrms:create"]))]
    pub permissions: Vec<String>,
}

// ---
// Capacidade efetiva de uma sessão
// ---

/// Nomes de cargo que concedem acesso total dentro da entreprise.
const FULL_ACCESS_ROLES: &[&str] = &["admin", "super admin"];

/// Nome que, atribuído a um cargo, daria acesso total.
pub fn is_full_access_role(name: &str) -> bool {
    let normalized = name.trim().to_lowercase();
    FULL_ACCESS_ROLES.contains(&normalized.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    FullAccess,
    Scoped(HashSet<String>),
}

impl Capability {
    /// União das permissões dos cargos; cargo admin ou super admin curto-circuita.
    pub fn from_roles<'a, I>(is_super_admin: bool, roles: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Vec<String>)>,
    {
        if is_super_admin {
            return Capability::FullAccess;
        }

        let mut slugs = HashSet::new();
        for (role_name, permissions) in roles {
            if is_full_access_role(role_name) {
                return Capability::FullAccess;
            }
            slugs.extend(permissions);
        }
        Capability::Scoped(slugs)
    }

    /// Só quem já tem acesso total pode dar a um cargo um nome de admin.
    pub fn ensure_can_name_role(&self, name: &str) -> Result<(), AppError> {
        if is_full_access_role(name) && *self != Capability::FullAccess {
            return Err(AppError::ReservedRoleName { name: name.trim().to_string() });
        }
        Ok(())
    }

    pub fn allows(&self, slug: &str) -> bool {
        match self {
            Capability::FullAccess => true,
            Capability::Scoped(slugs) => slugs.contains(slug),
        }
    }

    /// Lista ordenada para o `/me` (acesso total vira `*`).
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Capability::FullAccess => vec!["*".to_string()],
            Capability::Scoped(slugs) => {
                let mut list: Vec<String> = slugs.iter().cloned().collect();
                list.sort();
                list
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(slugs: &[&str]) -> Vec<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn union_of_role_permissions() {
        let cap = Capability::from_roles(
            false,
            vec![
                ("Saisie", perms(&["saisiehrms:read", "saisiehrms:create"])),
                ("Lecture", perms(&["engins:read"])),
            ],
        );

        assert!(cap.allows("saisiehrms:create"));
        assert!(cap.allows("engins:read"));
        assert!(!cap.allows("engins:delete"));
    }

    #[test]
    fn admin_role_short_circuits_regardless_of_case() {
        let cap = Capability::from_roles(false, vec![("Lecture", perms(&[])), (" Admin ", perms(&[]))]);
        assert_eq!(cap, Capability::FullAccess);

        let cap = Capability::from_roles(false, vec![("SUPER ADMIN", perms(&[]))]);
        assert_eq!(cap, Capability::FullAccess);
    }

    #[test]
    fn super_admin_flag_grants_everything() {
        let cap = Capability::from_roles(true, Vec::<(&str, Vec<String>)>::new());
        assert!(cap.allows("roles:delete"));
    }

    #[test]
    fn no_roles_means_no_access() {
        let cap = Capability::from_roles(false, Vec::<(&str, Vec<String>)>::new());
        assert!(!cap.allows("engins:read"));
        assert!(cap.to_list().is_empty());
    }

    #[test]
    fn listing_is_sorted() {
        let cap = Capability::from_roles(false, vec![("x", perms(&["sites:read", "engins:read"]))]);
        assert_eq!(cap.to_list(), vec!["engins:read", "sites:read"]);
    }

    #[test]
    fn slug_joins_resource_and_action() {
        assert_eq!(permission_slug("pannes", "update"), "pannes:update");
    }

    #[test]
    fn scoped_caller_cannot_name_a_role_admin() {
        let scoped = Capability::from_roles(false, vec![("Gestion", perms(&["roles:create", "roles:update"]))]);

        assert!(matches!(
            scoped.ensure_can_name_role("Admin"),
            Err(AppError::ReservedRoleName { name }) if name == "Admin"
        ));
        assert!(scoped.ensure_can_name_role("  super ADMIN ").is_err());
        assert!(scoped.ensure_can_name_role("Chef de parc").is_ok());
        assert!(Capability::FullAccess.ensure_can_name_role("admin").is_ok());
    }
}
