// src/models/import.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::error::AppError;

/// Recursos aceitos em `POST /api/imports/{resource}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportResource {
    Sites,
    Parcs,
    Engins,
    Pannes,
}

impl FromStr for ImportResource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sites" => Ok(ImportResource::Sites),
            "parcs" => Ok(ImportResource::Parcs),
            "engins" => Ok(ImportResource::Engins),
            "pannes" => Ok(ImportResource::Pannes),
            other => Err(AppError::UnknownImportResource(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Create,
    Update,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ImportQuery {
    #[serde(default)]
    pub mode: ImportMode,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportRowError {
    /// Linha da planilha (1 = cabeçalho).
    pub row: usize,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
pub struct ImportSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ImportReport {
    pub summary: ImportSummary,
    pub errors: Vec<ImportRowError>,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn error(&mut self, row: usize, field: impl Into<String>, message: String) {
        self.errors.push(ImportRowError { row, field: field.into(), message });
    }

    pub fn warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Fecha os contadores a partir das listas.
    pub fn finish(mut self) -> Self {
        self.summary.errors = self.errors.len();
        self.summary.warnings = self.warnings.len();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_names_are_case_insensitive() {
        assert_eq!("Engins".parse::<ImportResource>().unwrap(), ImportResource::Engins);
        assert!(matches!(
            "saisiehrms".parse::<ImportResource>(),
            Err(AppError::UnknownImportResource(name)) if name == "saisiehrms"
        ));
    }

    #[test]
    fn mode_defaults_to_create() {
        let query: ImportQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.mode, ImportMode::Create);

        let query: ImportQuery = serde_json::from_value(serde_json::json!({ "mode": "update" })).unwrap();
        assert_eq!(query.mode, ImportMode::Update);
    }
}
