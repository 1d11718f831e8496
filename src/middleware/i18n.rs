// src/middleware/i18n.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};

use crate::{common::i18n::I18nStore, config::AppState, models::auth::Session};

pub const DEFAULT_LOCALE: &str = "fr";

// Idioma da requisição
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LOCALE.to_string())
    }
}

/// Ordem: Accept-Language suportado, idioma da entreprise da sessão, padrão da aplicação.
pub fn resolve_locale(headers: &HeaderMap, session: Option<&Session>, i18n: &I18nStore, default_lang: &str) -> Locale {
    let from_header = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| {
            accept_language::parse(raw)
                .into_iter()
                // "fr-FR" -> "fr"
                .map(|tag| tag.split('-').next().unwrap_or(&tag).to_lowercase())
                .find(|lang| i18n.supports(lang))
        });

    let lang = from_header
        .or_else(|| {
            session
                .and_then(|s| s.entreprise.as_ref())
                .map(|e| e.language.clone())
                .filter(|lang| i18n.supports(lang))
        })
        .unwrap_or_else(|| default_lang.to_string());

    Locale(lang)
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let session = parts.extensions.get::<Session>();

        Ok(resolve_locale(
            &parts.headers,
            session,
            &app_state.i18n_store,
            &app_state.settings.default_locale,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(accept: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_str(accept).unwrap());
        headers
    }

    #[test]
    fn first_supported_language_wins() {
        let store = I18nStore::load("fr").unwrap();
        assert_eq!(resolve_locale(&headers("en-US,en;q=0.9"), None, &store, "fr").0, "en");
        assert_eq!(resolve_locale(&headers("de-DE, fr;q=0.5"), None, &store, "en").0, "fr");
    }

    #[test]
    fn falls_back_to_the_default() {
        let store = I18nStore::load("fr").unwrap();
        assert_eq!(resolve_locale(&HeaderMap::new(), None, &store, "fr").0, "fr");
        assert_eq!(resolve_locale(&headers("es"), None, &store, "en").0, "en");
        assert_eq!(Locale::default().0, "fr");
    }
}
