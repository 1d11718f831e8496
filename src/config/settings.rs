// src/config/settings.rs

use std::env;

use anyhow::Context;

/// Configuração lida do ambiente (`.env` carregado pelo dotenvy).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub app_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub token_ttl_days: i64,
    pub default_locale: String,
    pub superadmin_email: Option<String>,
    pub superadmin_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).with_context(|| format!("{} deve ser definida", key));
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        fn parsed<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T> {
            match raw {
                None => Ok(default),
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} inválida: '{}'", key, raw)),
            }
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            app_addr: optional("APP_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS", optional("DB_MAX_CONNECTIONS"), 5)?,
            db_acquire_timeout_secs: parsed("DB_ACQUIRE_TIMEOUT_SECS", optional("DB_ACQUIRE_TIMEOUT_SECS"), 3)?,
            token_ttl_days: parsed("TOKEN_TTL_DAYS", optional("TOKEN_TTL_DAYS"), 7)?,
            default_locale: optional("DEFAULT_LOCALE").unwrap_or_else(|| "fr".to_string()),
            superadmin_email: optional("SUPERADMIN_EMAIL"),
            superadmin_password: optional("SUPERADMIN_PASSWORD"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/gmao"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(settings.app_addr, "0.0.0.0:3000");
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.token_ttl_days, 7);
        assert_eq!(settings.default_locale, "fr");
        assert!(settings.superadmin_email.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/gmao")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let result = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/gmao"),
            ("JWT_SECRET", "segredo"),
            ("TOKEN_TTL_DAYS", "sept"),
        ]));
        assert!(result.is_err());
    }
}
