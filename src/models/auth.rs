// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{entreprise::Entreprise, rbac::Capability};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub entreprise_id: Option<Uuid>,
    pub email: String,
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub active: bool,
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "validation.email"))]
    #[schema(example = "chef@entreprise.dz")]
    pub email: String,
    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,          // ID do usuário
    pub eid: Option<Uuid>,  // Entreprise do usuário (None para super admin)
    pub exp: usize,
    pub iat: usize,
}

/// Sessão resolvida a cada requisição pelo `auth_guard`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub entreprise: Option<Entreprise>,
    pub roles: Vec<String>,
    pub capability: Capability,
}

impl Session {
    pub fn is_super_admin(&self) -> bool {
        self.user.is_super_admin
    }

    pub fn entreprise_id(&self) -> Option<Uuid> {
        self.entreprise.as_ref().map(|e| e.id)
    }
}

// O que o `/api/auth/me` devolve
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: User,
    pub entreprise: Option<Entreprise>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub is_super_admin: bool,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            entreprise: session.entreprise.clone(),
            roles: session.roles.clone(),
            permissions: session.capability.to_list(),
            is_super_admin: session.is_super_admin(),
        }
    }
}

// ---
// Gestão de usuários dentro da entreprise
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(email(message = "validation.email"))]
    pub email: String,

    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,

    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: String,

    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,

    #[validate(length(min = 6, message = "validation.password_length"))]
    pub password: Option<String>,

    pub active: Option<bool>,

    pub role_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(flatten)]
    pub user: User,
    pub role_ids: Vec<Uuid>,
}
