//! Bulk product import from an uploaded CSV sheet.
//!
//! ```text
//! multipart "file" ──► .csv? ──► header normalize ──► row → NewProduct
//!                        │                                   │
//!                  .xls/.xlsx → 400                 products().create()
//!                                                            │
//!                               201 all rows ok / 207 some rows failed
//! ```
//!
//! Rows are created one by one through the normal catalog path, so each
//! row without a code draws the next `PRD-` number.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;
use shopbill_core::catalog::NewProduct;
use shopbill_core::{Money, TaxRate, ValidationError};
use shopbill_db::DbError;
use tracing::info;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// What went wrong with one field of one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl From<ValidationError> for FieldError {
    fn from(e: ValidationError) -> Self {
        FieldError {
            field: e.field().to_string(),
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RowError {
    /// 1-based, not counting the header line.
    pub row: usize,
    pub row_data: BTreeMap<String, String>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadFormat {
    Csv,
    Spreadsheet,
    Unknown,
}

impl UploadFormat {
    fn of(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".csv") {
            UploadFormat::Csv
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            UploadFormat::Spreadsheet
        } else {
            UploadFormat::Unknown
        }
    }
}

/// `POST /import-products`
pub async fn import_products(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ImportReport>)> {
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            upload = Some((file_name, data));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    match UploadFormat::of(&file_name) {
        UploadFormat::Csv => {}
        UploadFormat::Spreadsheet => {
            return Err(ApiError::BadRequest(
                "Unsupported file format: export the spreadsheet as CSV".to_string(),
            ))
        }
        UploadFormat::Unknown => {
            return Err(ApiError::BadRequest("Unsupported file format".to_string()))
        }
    }

    let rows = parse_rows(&data)?;
    let products = state.db.products();
    let mut report = ImportReport::default();

    for (index, row) in rows.into_iter().enumerate() {
        let outcome = match product_from_row(&row) {
            Ok(input) => match products.create(user.id(), input).await {
                Ok(_) => Ok(()),
                Err(e) => Err(vec![row_failure(e)?]),
            },
            Err(errors) => Err(errors),
        };

        match outcome {
            Ok(()) => report.success_count += 1,
            Err(errors) => report.errors.push(RowError {
                row: index + 1,
                row_data: row,
                errors,
            }),
        }
    }
    report.error_count = report.errors.len();

    info!(
        owner = %user.id(),
        file = %file_name,
        created = report.success_count,
        failed = report.error_count,
        "Product import finished"
    );

    let status = if report.errors.is_empty() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(report)))
}

/// Row-level problems become report entries; anything else aborts the
/// import.
fn row_failure(err: DbError) -> ApiResult<FieldError> {
    match err {
        DbError::Validation(v) => Ok(v.into()),
        DbError::UniqueViolation { ref field, .. } => Ok(FieldError {
            field: field.clone(),
            message: err.to_string(),
        }),
        other => Err(other.into()),
    }
}

/// Lower-case, spaces to underscores: `"Selling Price"` → `selling_price`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

/// Reads every data row keyed by normalized header.
pub fn parse_rows(data: &[u8]) -> ApiResult<Vec<BTreeMap<String, String>>> {
    let bad_csv = |e: csv::Error| ApiError::BadRequest(format!("Unreadable CSV: {e}"));

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(bad_csv)?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(bad_csv)?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Maps one row onto a product, collecting every field error.
///
/// Defaults: stock 0, min stock 0, tax 0, discount 0, active.
pub fn product_from_row(row: &BTreeMap<String, String>) -> Result<NewProduct, Vec<FieldError>> {
    let text = |key: &str| {
        row.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut errors = Vec::new();

    let name = check(&mut errors, required(text("product_name"), "product_name"));
    let purchase = check(
        &mut errors,
        required(text("purchase_price"), "purchase_price")
            .and_then(|v| Money::parse_decimal_field(&v, "purchase_price")),
    );
    let selling = check(
        &mut errors,
        required(text("selling_price"), "selling_price")
            .and_then(|v| Money::parse_decimal_field(&v, "selling_price")),
    );
    let stock = check(&mut errors, whole_number(text("stock_quantity"), "stock_quantity"));
    let min_stock = check(&mut errors, whole_number(text("min_stock_level"), "min_stock_level"));
    let tax = check(&mut errors, percentage(text("tax_rate"), "tax_rate"));
    let discount = check(&mut errors, percentage(text("discount"), "discount"));
    let expiry = check(&mut errors, date(text("expiry_date"), "expiry_date"));
    let is_active = check(&mut errors, flag(text("is_active"), "is_active"));

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewProduct {
        product_code: text("product_code"),
        name,
        category: text("category"),
        unit: text("unit"),
        purchase_price_cents: purchase.cents(),
        selling_price_cents: selling.cents(),
        stock_quantity: stock,
        min_stock_level: min_stock,
        barcode: text("barcode"),
        tax_rate_bps: tax.bps(),
        discount_bps: discount.bps(),
        expiry_date: expiry,
        manufacturer: text("manufacturer"),
        supplier: text("supplier"),
        description: text("description"),
        is_active: is_active.unwrap_or(true),
    })
}

fn check<T: Default>(errors: &mut Vec<FieldError>, result: Result<T, ValidationError>) -> T {
    result.unwrap_or_else(|e| {
        errors.push(e.into());
        T::default()
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

fn whole_number(value: Option<String>, field: &str) -> Result<i64, ValidationError> {
    match value {
        None => Ok(0),
        Some(v) => v.parse().map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        }),
    }
}

fn percentage(value: Option<String>, field: &str) -> Result<TaxRate, ValidationError> {
    match value {
        None => Ok(TaxRate::zero()),
        Some(v) => TaxRate::parse_percentage_field(&v, field),
    }
}

fn date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>, ValidationError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            })
        })
        .transpose()
}

fn flag(value: Option<String>, field: &str) -> Result<Option<bool>, ValidationError> {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(None),
        Some("true" | "1" | "yes" | "y") => Ok(Some(true)),
        Some("false" | "0" | "no" | "n") => Ok(Some(false)),
        Some(_) => Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
