// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::OnceLock;

// Catálogos embutidos no binário
const CATALOGUES: &[(&str, &str)] = &[
    ("fr", include_str!("../../locales/fr.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Catálogo de mensagens por idioma (chave -> texto com `{placeholders}`).
#[derive(Debug, Clone, Default)]
pub struct I18nStore {
    catalogues: HashMap<String, HashMap<String, String>>,
    default_lang: String,
}

impl I18nStore {
    pub fn load(default_lang: &str) -> anyhow::Result<Self> {
        let mut catalogues = HashMap::new();
        for (lang, raw) in CATALOGUES {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            catalogues.insert(lang.to_string(), messages);
        }

        if !catalogues.contains_key(default_lang) {
            anyhow::bail!("Idioma padrão '{}' sem catálogo", default_lang);
        }

        Ok(Self {
            catalogues,
            default_lang: default_lang.to_string(),
        })
    }

    /// Store usado quando não há `AppState` disponível.
    pub fn global_fallback() -> &'static I18nStore {
        static FALLBACK: OnceLock<I18nStore> = OnceLock::new();
        FALLBACK.get_or_init(|| I18nStore::load("fr").unwrap_or_default())
    }

    pub fn supports(&self, lang: &str) -> bool {
        self.catalogues.contains_key(lang)
    }

    /// `true` se o catálogo do idioma tem a chave (sem fallback).
    pub fn has(&self, lang: &str, key: &str) -> bool {
        self.catalogues
            .get(lang)
            .is_some_and(|messages| messages.contains_key(key))
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.catalogues
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| {
                self.catalogues
                    .get(&self.default_lang)
                    .and_then(|messages| messages.get(key))
            })
            .map(String::as_str)
    }

    /// Traduz `key` e substitui `{nome}` pelos argumentos. Chave desconhecida volta crua.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        let mut message = self.lookup(lang, key).unwrap_or(key).to_string();
        for (name, value) in args {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }

    /// Rótulo legível de um recurso/campo (`labels.<nome>`), ou o próprio nome.
    pub fn label(&self, lang: &str, name: &str) -> String {
        let key = format!("labels.{}", name);
        match self.lookup(lang, &key) {
            Some(label) => label.to_string(),
            None => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalogue_has_the_same_keys() {
        let store = I18nStore::load("fr").unwrap();
        let fr = &store.catalogues["fr"];
        let en = &store.catalogues["en"];

        for key in fr.keys() {
            assert!(en.contains_key(key), "chave '{}' ausente em en.json", key);
        }
        for key in en.keys() {
            assert!(fr.contains_key(key), "chave '{}' ausente em fr.json", key);
        }
    }

    #[test]
    fn unknown_language_falls_back_to_default() {
        let store = I18nStore::load("fr").unwrap();
        let de = store.translate("de", "auth.invalid_token", &[]);
        let fr = store.translate("fr", "auth.invalid_token", &[]);

        assert_eq!(de, fr);
    }

    #[test]
    fn placeholders_are_interpolated() {
        let store = I18nStore::load("en").unwrap();
        let msg = store.translate("en", "hours.daily_limit_exceeded", &[("total", "26".into())]);

        assert!(msg.contains("Total: 26h"));
        assert!(!msg.contains('{'));
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load("fr").unwrap();
        assert_eq!(store.translate("fr", "nao.existe", &[]), "nao.existe");
    }

    #[test]
    fn rejects_default_language_without_catalogue() {
        assert!(I18nStore::load("xx").is_err());
    }
}
