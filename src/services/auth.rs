// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EntrepriseRepository, UserRepository},
    models::{
        auth::{Claims, Session, User},
        entreprise::Entreprise,
        rbac::{permission_slug, Capability, RolePermissionRow},
    },
};

/// Hash bcrypt fora do runtime async.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Agrupa as linhas (cargo, permissão) por cargo, na ordem em que chegam.
fn group_roles(rows: Vec<RolePermissionRow>) -> Vec<(Uuid, String, Vec<String>)> {
    let mut roles: Vec<(Uuid, String, Vec<String>)> = Vec::new();
    for row in rows {
        let slug = match (&row.resource, &row.action) {
            (Some(resource), Some(action)) => Some(permission_slug(resource, action)),
            _ => None,
        };
        match roles.iter_mut().find(|(id, _, _)| *id == row.role_id) {
            Some((_, _, slugs)) => slugs.extend(slug),
            None => roles.push((row.role_id, row.role_name, slug.into_iter().collect())),
        }
    }
    roles
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    entreprise_repo: EntrepriseRepository,
    jwt_secret: String,
    token_ttl_days: i64,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        entreprise_repo: EntrepriseRepository,
        jwt_secret: String,
        token_ttl_days: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, entreprise_repo, jwt_secret, token_ttl_days, pool }
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self.user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Conta ou entreprise desativada não recebe token
        self.ensure_active(&user).await?;

        tracing::info!(user_id = %user.id, "login efetuado");
        self.create_token(&user)
    }

    /// Decodifica o JWT e remonta a sessão a partir do banco.
    pub async fn validate_token(&self, token: &str) -> Result<Session, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        // O token carrega a entreprise de quando foi emitido; se o usuário mudou, o token caiu
        if user.entreprise_id != token_data.claims.eid {
            return Err(AppError::InvalidToken);
        }

        self.load_session(user).await
    }

    async fn load_session(&self, user: User) -> Result<Session, AppError> {
        let entreprise = self.ensure_active(&user).await?;

        let roles = group_roles(self.user_repo.roles_with_permissions(user.id).await?);
        let capability = Capability::from_roles(
            user.is_super_admin,
            roles.iter().map(|(_, name, slugs)| (name.as_str(), slugs.clone())),
        );

        Ok(Session {
            roles: roles.into_iter().map(|(_, name, _)| name).collect(),
            capability,
            entreprise,
            user,
        })
    }

    /// Usuário ativo e, se tiver entreprise, entreprise ativa.
    async fn ensure_active(&self, user: &User) -> Result<Option<Entreprise>, AppError> {
        if !user.active {
            return Err(AppError::InactiveAccount);
        }

        let Some(entreprise_id) = user.entreprise_id else {
            return Ok(None);
        };

        let entreprise = self.entreprise_repo
            .find_by_id(&self.pool, entreprise_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !entreprise.active {
            return Err(AppError::InactiveAccount);
        }
        Ok(Some(entreprise))
    }

    /// Garante a conta do super admin configurada no ambiente.
    pub async fn ensure_super_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        let hashed = hash_password(password).await?;
        let user = self.user_repo.upsert_super_admin(email.trim(), &hashed).await?;
        tracing::info!(user_id = %user.id, "super admin disponível");
        Ok(())
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.token_ttl_days);

        let claims = Claims {
            sub: user.id,
            eid: user.entreprise_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role_id: Uuid, name: &str, perm: Option<(&str, &str)>) -> RolePermissionRow {
        RolePermissionRow {
            role_id,
            role_name: name.to_string(),
            resource: perm.map(|(r, _)| r.to_string()),
            action: perm.map(|(_, a)| a.to_string()),
        }
    }

    #[test]
    fn rows_are_grouped_by_role() {
        let saisie = Uuid::new_v4();
        let lecture = Uuid::new_v4();
        let grouped = group_roles(vec![
            row(saisie, "Saisie", Some(("saisiehrms", "create"))),
            row(saisie, "Saisie", Some(("saisiehims", "create"))),
            row(lecture, "Lecture", None),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].2, vec!["saisiehrms:create", "saisiehims:create"]);
        assert_eq!(grouped[1].1, "Lecture");
        assert!(grouped[1].2.is_empty());
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hashed = hash_password("segredo123").await.unwrap();
        assert!(verify("segredo123", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
