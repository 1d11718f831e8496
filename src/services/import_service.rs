// src/services/import_service.rs
//
// Importação em massa a partir de planilha (primeira aba, primeira linha = cabeçalhos).
// Cada linha é validada e gravada de forma independente; o relatório junta tudo.

use std::{
    collections::{HashMap, HashSet},
    io::Cursor,
    sync::Arc,
};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    db::{engin_repo::EnginRecord, EnginRepository, OrganisationRepository, PanneRepository},
    middleware::i18n::Locale,
    models::import::{ImportMode, ImportReport, ImportResource},
    services::daily_hours::round_hours,
};

// ---
// Leitura da planilha
// ---

/// Linha da planilha com o número que o usuário vê no Excel.
#[derive(Debug, Clone)]
pub struct SheetRow {
    pub number: usize,
    pub cells: Vec<String>,
}

impl SheetRow {
    fn cell(&self, index: Option<usize>) -> &str {
        index
            .and_then(|i| self.cells.get(i))
            .map(|c| c.trim())
            .unwrap_or("")
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => d.to_string(),
        Data::DateTimeIso(d) => d.clone(),
        Data::DurationIso(d) => d.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

/// Abre xlsx/xls/ods a partir dos bytes e devolve a primeira aba como texto.
pub fn read_workbook(bytes: Vec<u8>) -> Result<Vec<SheetRow>, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::InvalidImportFile(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::InvalidImportFile("no worksheet".to_string()))?
        .map_err(|e| AppError::InvalidImportFile(e.to_string()))?;

    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let rows = range
        .rows()
        .enumerate()
        .map(|(i, row)| SheetRow {
            number: first_row + i + 1,
            cells: row.iter().map(cell_text).collect(),
        })
        .collect();
    Ok(rows)
}

// ---
// Colunas
// ---

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub required: bool,
}

const fn col(key: &'static str, label: &'static str, required: bool) -> Column {
    Column { key, label, required }
}

const SITE_COLUMNS: &[Column] = &[col("name", "Nom du site", true), col("active", "Actif", false)];

const PARC_COLUMNS: &[Column] = &[
    col("name", "Nom du parc", true),
    col("typeparc", "Type de parc", true),
];

const ENGIN_COLUMNS: &[Column] = &[
    col("name", "Nom de l'engin", true),
    col("parc", "Parc", true),
    col("site", "Site", true),
    col("initialHeureChassis", "Heures chassis initiales", false),
    col("active", "Actif", false),
];

const PANNE_COLUMNS: &[Column] = &[
    col("name", "Nom de la panne", true),
    col("typepanne", "Type de panne", true),
    col("parcs", "Parcs", true),
    col("description", "Description", false),
];

pub fn columns_of(resource: ImportResource) -> &'static [Column] {
    match resource {
        ImportResource::Sites => SITE_COLUMNS,
        ImportResource::Parcs => PARC_COLUMNS,
        ImportResource::Engins => ENGIN_COLUMNS,
        ImportResource::Pannes => PANNE_COLUMNS,
    }
}

/// Cabeçalho comparável: minúsculas, espaços colapsados, apóstrofo tipográfico e `*` final ignorados.
pub fn normalize_header(raw: &str) -> String {
    raw.replace(['\u{2019}', '\u{2018}'], "'")
        .trim()
        .trim_end_matches('*')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resultado do casamento cabeçalho x colunas esperadas.
#[derive(Debug, Default)]
pub struct ColumnBinding {
    positions: HashMap<&'static str, usize>,
    pub missing: Vec<&'static str>,
    pub unknown: Vec<String>,
}

impl ColumnBinding {
    fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }
}

pub fn bind_columns(header: &SheetRow, columns: &[Column]) -> ColumnBinding {
    let mut binding = ColumnBinding::default();
    let mut by_label: HashMap<String, usize> = HashMap::new();

    for (i, raw) in header.cells.iter().enumerate() {
        let normalized = normalize_header(raw);
        if normalized.is_empty() {
            continue;
        }
        if columns.iter().any(|c| normalize_header(c.label) == normalized) {
            by_label.entry(normalized).or_insert(i);
        } else {
            binding.unknown.push(raw.trim().to_string());
        }
    }

    for column in columns {
        match by_label.get(&normalize_header(column.label)) {
            Some(&i) => {
                binding.positions.insert(column.key, i);
            }
            None if column.required => binding.missing.push(column.label),
            None => {}
        }
    }
    binding
}

// ---
// Conversão de células
// ---

/// Número conforme o idioma: `fr` aceita vírgula decimal e espaço como milhar;
/// `en` usa ponto decimal e vírgula como milhar.
pub fn parse_decimal(raw: &str, lang: &str) -> Option<Decimal> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202f}' && *c != '\u{a0}')
        .collect();
    if compact.is_empty() {
        return None;
    }
    let normalized = if lang == "fr" {
        compact.replace(',', ".")
    } else {
        compact.replace(',', "")
    };
    normalized.parse::<Decimal>().ok()
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "oui" | "o" | "yes" | "y" | "true" | "vrai" | "1" | "x" | "actif" | "active" => Some(true),
        "non" | "n" | "no" | "false" | "faux" | "0" | "inactif" | "inactive" => Some(false),
        _ => None,
    }
}

/// Lista de nomes separados por `,` ou `;`.
pub fn split_names(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split([',', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(|s| s.to_string())
        .collect()
}

// ---
// Erros por linha
// ---

enum RowError {
    Cell {
        column: &'static str,
        key: &'static str,
        value: String,
    },
    App(AppError),
}

impl From<AppError> for RowError {
    fn from(e: AppError) -> Self {
        RowError::App(e)
    }
}

fn cell_error(column: &Column, key: &'static str, value: &str) -> RowError {
    RowError::Cell { column: column.label, key, value: value.to_string() }
}

enum Outcome {
    Created,
    Updated,
}

/// Acesso às células da linha pelas chaves das colunas.
struct RowView<'a> {
    row: &'a SheetRow,
    binding: &'a ColumnBinding,
    columns: &'static [Column],
    lang: &'a str,
}

impl<'a> RowView<'a> {
    fn column(&self, key: &str) -> &'static Column {
        // As chaves usadas abaixo existem sempre na tabela do recurso
        self.columns
            .iter()
            .find(|c| c.key == key)
            .unwrap_or(&self.columns[0])
    }

    fn text(&self, key: &str) -> &'a str {
        self.row.cell(self.binding.position(key))
    }

    fn required(&self, key: &str) -> Result<&'a str, RowError> {
        let value = self.text(key);
        if value.is_empty() {
            return Err(cell_error(self.column(key), "import.row.required", value));
        }
        Ok(value)
    }

    fn optional_text(&self, key: &str) -> Option<&'a str> {
        Some(self.text(key)).filter(|v| !v.is_empty())
    }

    fn optional_bool(&self, key: &str) -> Result<Option<bool>, RowError> {
        match self.optional_text(key) {
            None => Ok(None),
            Some(value) => parse_bool(value)
                .map(Some)
                .ok_or_else(|| cell_error(self.column(key), "import.row.boolean", value)),
        }
    }

    fn optional_hours(&self, key: &str) -> Result<Option<Decimal>, RowError> {
        match self.optional_text(key) {
            None => Ok(None),
            Some(value) => match parse_decimal(value, self.lang) {
                Some(n) if !n.is_sign_negative() || n.is_zero() => Ok(Some(round_hours(n).abs())),
                _ => Err(cell_error(self.column(key), "import.row.number", value)),
            },
        }
    }
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct ImportService {
    org_repo: OrganisationRepository,
    engin_repo: EnginRepository,
    panne_repo: PanneRepository,
    i18n: Arc<I18nStore>,
    pool: PgPool,
}

impl ImportService {
    pub fn new(
        org_repo: OrganisationRepository,
        engin_repo: EnginRepository,
        panne_repo: PanneRepository,
        i18n: Arc<I18nStore>,
        pool: PgPool,
    ) -> Self {
        Self { org_repo, engin_repo, panne_repo, i18n, pool }
    }

    fn t(&self, locale: &Locale, key: &str, args: &[(&str, String)]) -> String {
        self.i18n.translate(&locale.0, key, args)
    }

    pub async fn import(
        &self,
        entreprise_id: Uuid,
        resource: ImportResource,
        mode: ImportMode,
        locale: &Locale,
        bytes: Vec<u8>,
    ) -> Result<ImportReport, AppError> {
        let rows = tokio::task::spawn_blocking(move || read_workbook(bytes))
            .await
            .map_err(|e| AppError::InternalServerError(e.into()))??;

        let mut report = ImportReport::default();
        let Some((header, body)) = rows.split_first() else {
            report.error(1, "", self.t(locale, "import.empty", &[]));
            return Ok(report.finish());
        };

        let columns = columns_of(resource);
        let binding = bind_columns(header, columns);

        for unknown in &binding.unknown {
            report.warning(self.t(locale, "import.warning.unknown_column", &[("column", unknown.clone())]));
        }
        if !binding.missing.is_empty() {
            for label in &binding.missing {
                report.error(
                    header.number,
                    *label,
                    self.t(locale, "import.missing_column", &[("column", label.to_string())]),
                );
            }
            return Ok(report.finish());
        }

        let mut seen: HashSet<String> = HashSet::new();
        for row in body.iter().filter(|r| !r.is_blank()) {
            report.summary.total += 1;
            let view = RowView { row, binding: &binding, columns, lang: &locale.0 };

            let result = match view.required("name") {
                Err(e) => Err(e),
                Ok(name) if !seen.insert(name.to_lowercase()) => {
                    Err(cell_error(&columns[0], "import.row.duplicate", name))
                }
                Ok(name) => self.import_row(entreprise_id, resource, mode, &view, name).await,
            };

            match result {
                Ok(Outcome::Created) => report.summary.created += 1,
                Ok(Outcome::Updated) => report.summary.updated += 1,
                Err(RowError::Cell { column, key, value }) => {
                    let message = self.t(locale, key, &[("column", column.to_string()), ("value", value)]);
                    report.error(row.number, column, message);
                }
                Err(RowError::App(e)) => {
                    let message = e.to_api_error(locale, &self.i18n).message;
                    report.error(row.number, "", message);
                }
            }
        }

        if report.summary.total == 0 {
            report.error(header.number, "", self.t(locale, "import.empty", &[]));
        }

        let report = report.finish();
        tracing::info!(
            %entreprise_id,
            ?resource,
            ?mode,
            total = report.summary.total,
            created = report.summary.created,
            updated = report.summary.updated,
            errors = report.summary.errors,
            "importação concluída"
        );
        Ok(report)
    }

    async fn import_row(
        &self,
        entreprise_id: Uuid,
        resource: ImportResource,
        mode: ImportMode,
        view: &RowView<'_>,
        name: &str,
    ) -> Result<Outcome, RowError> {
        match resource {
            ImportResource::Sites => self.import_site(entreprise_id, mode, view, name).await,
            ImportResource::Parcs => self.import_parc(entreprise_id, mode, view, name).await,
            ImportResource::Engins => self.import_engin(entreprise_id, mode, view, name).await,
            ImportResource::Pannes => self.import_panne(entreprise_id, mode, view, name).await,
        }
    }

    /// Create: o nome não pode existir. Update: o nome tem de existir.
    fn check_mode<T>(mode: ImportMode, existing: Option<T>, view: &RowView<'_>, name: &str) -> Result<Option<T>, RowError> {
        match (mode, existing) {
            (ImportMode::Create, Some(_)) => Err(cell_error(view.column("name"), "import.row.exists", name)),
            (ImportMode::Create, None) => Ok(None),
            (ImportMode::Update, None) => Err(cell_error(view.column("name"), "import.row.unknown", name)),
            (ImportMode::Update, Some(found)) => Ok(Some(found)),
        }
    }

    async fn import_site(
        &self,
        entreprise_id: Uuid,
        mode: ImportMode,
        view: &RowView<'_>,
        name: &str,
    ) -> Result<Outcome, RowError> {
        let active = view.optional_bool("active")?;
        let existing = self.org_repo.find_site_by_name(&self.pool, entreprise_id, name).await?;

        match Self::check_mode(mode, existing, view, name)? {
            None => {
                self.org_repo
                    .create_site(&self.pool, entreprise_id, name, active.unwrap_or(true))
                    .await?;
                Ok(Outcome::Created)
            }
            Some(site) => {
                self.org_repo
                    .update_site(&self.pool, entreprise_id, site.id, name, active.unwrap_or(site.active))
                    .await?;
                Ok(Outcome::Updated)
            }
        }
    }

    async fn import_parc(
        &self,
        entreprise_id: Uuid,
        mode: ImportMode,
        view: &RowView<'_>,
        name: &str,
    ) -> Result<Outcome, RowError> {
        let typeparc_name = view.required("typeparc")?;
        let typeparc = self.org_repo
            .find_typeparc_by_name(&self.pool, entreprise_id, typeparc_name)
            .await?
            .ok_or_else(|| cell_error(view.column("typeparc"), "import.row.not_found", typeparc_name))?;

        let existing = self.org_repo.find_parc_by_name(&self.pool, entreprise_id, name).await?;
        match Self::check_mode(mode, existing, view, name)? {
            None => {
                self.org_repo.create_parc(&self.pool, entreprise_id, typeparc.id, name).await?;
                Ok(Outcome::Created)
            }
            Some(parc) => {
                self.org_repo
                    .update_parc(&self.pool, entreprise_id, parc.id, typeparc.id, name)
                    .await?;
                Ok(Outcome::Updated)
            }
        }
    }

    async fn import_engin(
        &self,
        entreprise_id: Uuid,
        mode: ImportMode,
        view: &RowView<'_>,
        name: &str,
    ) -> Result<Outcome, RowError> {
        let parc_name = view.required("parc")?;
        let site_name = view.required("site")?;
        let heures = view.optional_hours("initialHeureChassis")?;
        let active = view.optional_bool("active")?;

        let parc = self.org_repo
            .find_parc_by_name(&self.pool, entreprise_id, parc_name)
            .await?
            .ok_or_else(|| cell_error(view.column("parc"), "import.row.not_found", parc_name))?;
        let site = self.org_repo
            .find_site_by_name(&self.pool, entreprise_id, site_name)
            .await?
            .ok_or_else(|| cell_error(view.column("site"), "import.row.not_found", site_name))?;

        let existing = self.engin_repo.find_by_name(&self.pool, entreprise_id, name).await?;
        match Self::check_mode(mode, existing, view, name)? {
            None => {
                let record = EnginRecord {
                    name,
                    parc_id: parc.id,
                    site_id: site.id,
                    active: active.unwrap_or(true),
                    initial_heure_chassis: heures.unwrap_or(Decimal::ZERO),
                };
                self.engin_repo.create(&self.pool, entreprise_id, &record).await?;
                Ok(Outcome::Created)
            }
            Some(engin) => {
                let record = EnginRecord {
                    name,
                    parc_id: parc.id,
                    site_id: site.id,
                    active: active.unwrap_or(engin.active),
                    initial_heure_chassis: heures.unwrap_or(engin.initial_heure_chassis),
                };
                self.engin_repo.update(&self.pool, entreprise_id, engin.id, &record).await?;
                Ok(Outcome::Updated)
            }
        }
    }

    async fn import_panne(
        &self,
        entreprise_id: Uuid,
        mode: ImportMode,
        view: &RowView<'_>,
        name: &str,
    ) -> Result<Outcome, RowError> {
        let typepanne_name = view.required("typepanne")?;
        let parc_names = split_names(view.required("parcs")?);
        let description = view.optional_text("description");

        let typepanne = self.panne_repo
            .find_typepanne_by_name(&self.pool, entreprise_id, typepanne_name)
            .await?
            .ok_or_else(|| cell_error(view.column("typepanne"), "import.row.not_found", typepanne_name))?;

        let mut parc_ids = Vec::with_capacity(parc_names.len());
        for parc_name in &parc_names {
            let parc = self.org_repo
                .find_parc_by_name(&self.pool, entreprise_id, parc_name)
                .await?
                .ok_or_else(|| cell_error(view.column("parcs"), "import.row.not_found", parc_name))?;
            parc_ids.push(parc.id);
        }
        if parc_ids.is_empty() {
            return Err(cell_error(view.column("parcs"), "import.row.required", ""));
        }

        let existing = self.panne_repo.find_panne_by_name(&self.pool, entreprise_id, name).await?;
        let found = Self::check_mode(mode, existing, view, name)?;

        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        let outcome = match found {
            None => {
                let panne = self.panne_repo
                    .create_panne(&mut *tx, entreprise_id, typepanne.id, name, description)
                    .await?;
                self.panne_repo.replace_parcs(&mut *tx, panne.id, &parc_ids).await?;
                Outcome::Created
            }
            Some(panne) => {
                let description = description.or(panne.description.as_deref());
                self.panne_repo
                    .update_panne(&mut *tx, entreprise_id, panne.id, typepanne.id, name, description)
                    .await?;
                self.panne_repo.replace_parcs(&mut *tx, panne.id, &parc_ids).await?;
                Outcome::Updated
            }
        };
        tx.commit().await.map_err(AppError::from)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(number: usize, cells: &[&str]) -> SheetRow {
        SheetRow { number, cells: cells.iter().map(|c| c.to_string()).collect() }
    }

    #[test]
    fn headers_match_regardless_of_case_and_spacing() {
        assert_eq!(normalize_header("  NOM   de  l’engin * "), "nom de l'engin");

        let header = row(1, &["nom de l'ENGIN", "Parc", "site", "Couleur"]);
        let binding = bind_columns(&header, ENGIN_COLUMNS);

        assert!(binding.missing.is_empty());
        assert_eq!(binding.unknown, vec!["Couleur".to_string()]);
        assert_eq!(binding.position("site"), Some(2));
        assert_eq!(binding.position("active"), None);
    }

    #[test]
    fn missing_required_columns_are_reported() {
        let header = row(1, &["Nom de la panne", "Description"]);
        let binding = bind_columns(&header, PANNE_COLUMNS);
        assert_eq!(binding.missing, vec!["Type de panne", "Parcs"]);
    }

    #[test]
    fn numbers_follow_the_locale() {
        assert_eq!(parse_decimal("12,5", "fr"), Some("12.5".parse().unwrap()));
        assert_eq!(parse_decimal("1 250,75", "fr"), Some("1250.75".parse().unwrap()));
        assert_eq!(parse_decimal("12.5", "fr"), Some("12.5".parse().unwrap()));
        assert_eq!(parse_decimal("1,250.75", "en"), Some("1250.75".parse().unwrap()));
        assert_eq!(parse_decimal("abc", "fr"), None);
        assert_eq!(parse_decimal("", "en"), None);
    }

    #[test]
    fn booleans_accept_french_and_english_words() {
        assert_eq!(parse_bool("Oui"), Some(true));
        assert_eq!(parse_bool("no"), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("peut-être"), None);
    }

    #[test]
    fn parc_lists_split_on_comma_and_semicolon() {
        assert_eq!(split_names("P1, P2;P3 ; p1 ;"), vec!["P1", "P2", "P3"]);
        assert!(split_names(" ; ").is_empty());
    }

    #[test]
    fn blank_rows_are_detected_and_cells_trimmed() {
        assert!(row(3, &["", "  "]).is_blank());
        let r = row(4, &["  Site A ", "oui"]);
        assert!(!r.is_blank());
        assert_eq!(r.cell(Some(0)), "Site A");
        assert_eq!(r.cell(Some(9)), "");
        assert_eq!(r.cell(None), "");
    }

    #[test]
    fn hours_cells_are_rounded_and_must_be_positive() {
        let header = row(1, &["Nom de l'engin", "Parc", "Site", "Heures chassis initiales"]);
        let binding = bind_columns(&header, ENGIN_COLUMNS);

        let ok = row(2, &["E1", "P", "S", "1520,456"]);
        let view = RowView { row: &ok, binding: &binding, columns: ENGIN_COLUMNS, lang: "fr" };
        assert_eq!(view.optional_hours("initialHeureChassis").ok().flatten(), Some("1520.46".parse().unwrap()));

        let bad = row(3, &["E2", "P", "S", "-3"]);
        let view = RowView { row: &bad, binding: &binding, columns: ENGIN_COLUMNS, lang: "fr" };
        assert!(matches!(
            view.optional_hours("initialHeureChassis"),
            Err(RowError::Cell { key: "import.row.number", .. })
        ));
    }

    #[test]
    fn garbage_bytes_are_an_invalid_file() {
        assert!(matches!(read_workbook(b"not a workbook".to_vec()), Err(AppError::InvalidImportFile(_))));
    }
}
