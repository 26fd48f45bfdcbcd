// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV batch-manifest preview and import.
//!
//! Suppliers deliver stock with a manifest; the preview validates every
//! row without touching the database, and the import commits the valid
//! rows through the normal receipt path, one audit event per batch.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use vax_audit::Cause;
use vax_domain::{BatchNumber, validate_batch_fields};
use vax_persistence::Persistence;

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::handlers::receive_batch;
use crate::request_response::{ReceiveBatchRequest, parse_wire_date};

/// The column headers a manifest must carry, in any order.
pub const REQUIRED_HEADERS: [&str; 6] = [
    "vaccine_id",
    "batch_number",
    "doses_per_vial",
    "quantity",
    "expiry_date",
    "manufacturing_date",
];

/// Request to preview a manifest without committing anything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewManifestRequest {
    /// The center the stock is destined for.
    pub center_id: i64,
    /// The raw CSV content.
    pub csv_content: String,
}

/// Request to import a manifest's valid rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportManifestRequest {
    /// The center the stock is destined for.
    pub center_id: i64,
    /// The raw CSV content.
    pub csv_content: String,
}

/// Validation outcome for one manifest row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvRowStatus {
    /// The row would be accepted by the receipt path.
    Valid,
    /// The row has at least one problem.
    Invalid,
}

/// One previewed manifest row with whatever fields parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRowResult {
    /// 1-based data row number, excluding the header.
    pub row_number: usize,
    /// The vaccine the batch holds, if parseable.
    pub vaccine_id: Option<i64>,
    /// The manufacturer batch number, if present.
    pub batch_number: Option<String>,
    /// Doses each vial holds, if parseable.
    pub doses_per_vial: Option<u32>,
    /// Vials received, if parseable.
    pub quantity: Option<u32>,
    /// Expiry date as supplied.
    pub expiry_date: Option<String>,
    /// Manufacturing date as supplied.
    pub manufacturing_date: Option<String>,
    /// Whether the row would be accepted.
    pub status: CsvRowStatus,
    /// Everything wrong with the row.
    pub errors: Vec<String>,
}

/// The outcome of previewing a full manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvPreviewResult {
    /// Every data row, in file order.
    pub rows: Vec<CsvRowResult>,
    /// Total data rows in the file.
    pub total_rows: usize,
    /// Rows that would be accepted.
    pub valid_count: usize,
    /// Rows with problems.
    pub invalid_count: usize,
}

/// Outcome for one row of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportRowStatus {
    /// The batch was recorded.
    Imported,
    /// The row was skipped, with errors.
    Skipped,
}

/// One imported or skipped manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowResult {
    /// 1-based data row number, excluding the header.
    pub row_number: usize,
    /// The batch number the row named, if present.
    pub batch_number: Option<String>,
    /// Whether the row was committed.
    pub status: ImportRowStatus,
    /// The new batch's identifier, when imported.
    pub batch_id: Option<i64>,
    /// The receipt audit event, when imported.
    pub event_id: Option<i64>,
    /// Why the row was skipped, when skipped.
    pub errors: Vec<String>,
}

/// The outcome of importing a full manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvImportResult {
    /// Every data row, in file order.
    pub rows: Vec<ImportRowResult>,
    /// Rows committed.
    pub imported_count: usize,
    /// Rows skipped.
    pub skipped_count: usize,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

fn validate_headers(headers: &csv::StringRecord) -> Result<HashMap<String, usize>, ApiError> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (index, raw) in headers.iter().enumerate() {
        positions.insert(normalize_header(raw), index);
    }

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|header| !positions.contains_key(**header))
        .copied()
        .collect();
    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(ApiError::InvalidCsvFormat {
            reason: format!("missing required column(s): {}", missing.join(", ")),
        })
    }
}

fn field<'a>(
    record: &'a csv::StringRecord,
    positions: &HashMap<String, usize>,
    header: &str,
) -> Option<&'a str> {
    positions
        .get(header)
        .and_then(|&index| record.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

struct ParsedRow {
    vaccine_id: Option<i64>,
    batch_number: Option<String>,
    doses_per_vial: Option<u32>,
    quantity: Option<u32>,
    expiry_date: Option<String>,
    manufacturing_date: Option<String>,
    errors: Vec<String>,
}

fn parse_row(record: &csv::StringRecord, positions: &HashMap<String, usize>) -> ParsedRow {
    let mut errors: Vec<String> = Vec::new();

    let vaccine_id = match field(record, positions, "vaccine_id") {
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push(format!("vaccine_id '{raw}' is not a number"));
                None
            }
        },
        None => {
            errors.push(String::from("vaccine_id is required"));
            None
        }
    };

    let batch_number = field(record, positions, "batch_number").map(str::to_string);
    if batch_number.is_none() {
        errors.push(String::from("batch_number is required"));
    }

    let doses_per_vial = parse_count(record, positions, "doses_per_vial", &mut errors);
    let quantity = parse_count(record, positions, "quantity", &mut errors);

    let expiry_date = parse_date_field(record, positions, "expiry_date", &mut errors);
    let manufacturing_date = parse_date_field(record, positions, "manufacturing_date", &mut errors);

    if let (Some(number), Some(quantity), Some(doses)) = (&batch_number, quantity, doses_per_vial) {
        if let Err(err) = validate_batch_fields(&BatchNumber::new(number), quantity, doses) {
            errors.push(err.to_string());
        }
    }

    ParsedRow {
        vaccine_id,
        batch_number,
        doses_per_vial,
        quantity,
        expiry_date,
        manufacturing_date,
        errors,
    }
}

fn parse_count(
    record: &csv::StringRecord,
    positions: &HashMap<String, usize>,
    header: &str,
    errors: &mut Vec<String>,
) -> Option<u32> {
    match field(record, positions, header) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(value) if value > 0 => Some(value),
            Ok(value) => {
                errors.push(format!("{header} must be greater than 0, got {value}"));
                None
            }
            Err(_) => {
                errors.push(format!("{header} '{raw}' is not a number"));
                None
            }
        },
        None => {
            errors.push(format!("{header} is required"));
            None
        }
    }
}

fn parse_date_field(
    record: &csv::StringRecord,
    positions: &HashMap<String, usize>,
    header: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    match field(record, positions, header) {
        Some(raw) => {
            if parse_wire_date(raw).is_err() {
                errors.push(format!("{header} '{raw}' is not a YYYY-MM-DD date"));
            }
            Some(raw.to_string())
        }
        None => {
            errors.push(format!("{header} is required"));
            None
        }
    }
}

fn check_against_inventory(
    persistence: &mut Persistence,
    center_id: i64,
    row: &ParsedRow,
    seen: &mut HashSet<(i64, String)>,
    errors: &mut Vec<String>,
) -> Result<(), ApiError> {
    let (Some(vaccine_id), Some(number)) = (row.vaccine_id, row.batch_number.as_deref()) else {
        return Ok(());
    };
    let normalized = BatchNumber::new(number);

    if !seen.insert((vaccine_id, normalized.value().to_string())) {
        errors.push(format!(
            "batch '{}' appears more than once in the file",
            normalized
        ));
        return Ok(());
    }

    match persistence.get_vaccine(vaccine_id) {
        Ok(_) => {}
        Err(vax_persistence::PersistenceError::NotFound(_)) => {
            errors.push(format!("vaccine {vaccine_id} does not exist"));
            return Ok(());
        }
        Err(other) => return Err(other.into()),
    }

    if persistence
        .find_batch_by_number(vaccine_id, center_id, &normalized)?
        .is_some()
    {
        errors.push(format!(
            "batch '{}' already exists for this vaccine and center",
            normalized
        ));
    }
    Ok(())
}

/// Previews a manifest: parses every row, checks it against the current
/// inventory, and reports what the import would do. Nothing is written.
///
/// # Errors
///
/// Returns `InvalidCsvFormat` if the file is unreadable or missing
/// required columns, or an error if the center lookup fails.
pub fn preview_manifest(
    persistence: &mut Persistence,
    request: &PreviewManifestRequest,
    actor: &AuthenticatedActor,
) -> Result<CsvPreviewResult, ApiError> {
    AuthorizationService::authorize_import_manifest(actor)?;
    persistence
        .get_center(request.center_id)
        .map_err(|err| match err {
            vax_persistence::PersistenceError::NotFound(_) => ApiError::ResourceNotFound {
                resource_type: String::from("Center"),
                message: format!("Center {} does not exist", request.center_id),
            },
            other => other.into(),
        })?;

    let mut reader = csv::Reader::from_reader(request.csv_content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| ApiError::InvalidCsvFormat {
            reason: err.to_string(),
        })?
        .clone();
    let positions = validate_headers(&headers)?;

    let mut rows: Vec<CsvRowResult> = Vec::new();
    let mut seen: HashSet<(i64, String)> = HashSet::new();
    for (index, record) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = record.map_err(|err| ApiError::InvalidCsvFormat {
            reason: format!("row {row_number}: {err}"),
        })?;
        let mut parsed = parse_row(&record, &positions);
        let mut errors = std::mem::take(&mut parsed.errors);
        check_against_inventory(persistence, request.center_id, &parsed, &mut seen, &mut errors)?;

        let status = if errors.is_empty() {
            CsvRowStatus::Valid
        } else {
            CsvRowStatus::Invalid
        };
        rows.push(CsvRowResult {
            row_number,
            vaccine_id: parsed.vaccine_id,
            batch_number: parsed.batch_number,
            doses_per_vial: parsed.doses_per_vial,
            quantity: parsed.quantity,
            expiry_date: parsed.expiry_date,
            manufacturing_date: parsed.manufacturing_date,
            status,
            errors,
        });
    }

    let total_rows = rows.len();
    let valid_count = rows
        .iter()
        .filter(|row| row.status == CsvRowStatus::Valid)
        .count();
    Ok(CsvPreviewResult {
        invalid_count: total_rows - valid_count,
        rows,
        total_rows,
        valid_count,
    })
}

/// Imports a manifest: valid rows go through the normal receipt path,
/// each with its own audit event; invalid rows are reported and skipped.
///
/// # Errors
///
/// Returns `InvalidCsvFormat` if the file is unreadable, `Unauthorized`
/// if the caller is not an admin, or an error if a commit fails for a
/// reason the preview could not see.
pub fn import_manifest(
    persistence: &mut Persistence,
    request: &ImportManifestRequest,
    actor: &AuthenticatedActor,
    cause: &Cause,
    today: time::Date,
) -> Result<CsvImportResult, ApiError> {
    AuthorizationService::authorize_import_manifest(actor)?;

    let preview = preview_manifest(
        persistence,
        &PreviewManifestRequest {
            center_id: request.center_id,
            csv_content: request.csv_content.clone(),
        },
        actor,
    )?;

    let mut rows: Vec<ImportRowResult> = Vec::new();
    for row in preview.rows {
        if row.status == CsvRowStatus::Invalid {
            rows.push(ImportRowResult {
                row_number: row.row_number,
                batch_number: row.batch_number,
                status: ImportRowStatus::Skipped,
                batch_id: None,
                event_id: None,
                errors: row.errors,
            });
            continue;
        }

        // The preview guarantees these fields for valid rows.
        let (Some(vaccine_id), Some(batch_number), Some(doses_per_vial), Some(quantity)) = (
            row.vaccine_id,
            row.batch_number.clone(),
            row.doses_per_vial,
            row.quantity,
        ) else {
            rows.push(ImportRowResult {
                row_number: row.row_number,
                batch_number: row.batch_number,
                status: ImportRowStatus::Skipped,
                batch_id: None,
                event_id: None,
                errors: vec![String::from("row is missing required fields")],
            });
            continue;
        };
        let (Some(expiry_date), Some(manufacturing_date)) =
            (row.expiry_date.clone(), row.manufacturing_date.clone())
        else {
            rows.push(ImportRowResult {
                row_number: row.row_number,
                batch_number: Some(batch_number),
                status: ImportRowStatus::Skipped,
                batch_id: None,
                event_id: None,
                errors: vec![String::from("row is missing required dates")],
            });
            continue;
        };

        let receipt = ReceiveBatchRequest {
            vaccine_id,
            center_id: request.center_id,
            batch_number: batch_number.clone(),
            doses_per_vial,
            quantity,
            expiry_date,
            manufacturing_date,
        };
        match receive_batch(persistence, &receipt, actor, cause.clone(), today) {
            Ok(response) => rows.push(ImportRowResult {
                row_number: row.row_number,
                batch_number: Some(batch_number),
                status: ImportRowStatus::Imported,
                batch_id: response.batch.batch_id,
                event_id: Some(response.event_id),
                errors: Vec::new(),
            }),
            Err(err) => rows.push(ImportRowResult {
                row_number: row.row_number,
                batch_number: Some(batch_number),
                status: ImportRowStatus::Skipped,
                batch_id: None,
                event_id: None,
                errors: vec![err.to_string()],
            }),
        }
    }

    let imported_count = rows
        .iter()
        .filter(|row| row.status == ImportRowStatus::Imported)
        .count();
    Ok(CsvImportResult {
        skipped_count: rows.len() - imported_count,
        imported_count,
        rows,
    })
}
