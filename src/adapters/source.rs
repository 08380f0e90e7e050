//! Decoding of raw tabular input (CSV or JSON) into `SalesRecord`s.
//!
//! Field values degrade silently: a missing column becomes an empty string
//! and an unparsable quantity becomes 0.

use crate::domain::model::SalesRecord;
use crate::utils::error::{ReportError, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SellerCode,
    CategoryCode,
    CustomerCode,
    CustomerName,
    ProductCode,
    ProductName,
    QuantitySold,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::SellerCode,
        Field::CategoryCode,
        Field::CustomerCode,
        Field::CustomerName,
        Field::ProductCode,
        Field::ProductName,
        Field::QuantitySold,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Field::SellerCode => "seller_code",
            Field::CategoryCode => "category_code",
            Field::CustomerCode => "customer_code",
            Field::CustomerName => "customer_name",
            Field::ProductCode => "product_code",
            Field::ProductName => "product_name",
            Field::QuantitySold => "quantity_sold",
        }
    }

    /// Role names used by the reporting host the data usually comes from.
    pub fn host_role_name(self) -> &'static str {
        match self {
            Field::SellerCode => "codVendedor",
            Field::CategoryCode => "classeProduto",
            Field::CustomerCode => "codCliente",
            Field::CustomerName => "nomeCliente",
            Field::ProductCode => "codProduto",
            Field::ProductName => "nomeProduto",
            Field::QuantitySold => "qtVendida",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.canonical_name() == name || f.host_role_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Json,
}

impl SourceFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("json") => Ok(SourceFormat::Json),
            _ => Err(ReportError::UnsupportedSourceError {
                source_name: path.to_string(),
                reason: "expected a .csv or .json file".to_string(),
            }),
        }
    }
}

/// Resolves source column names to record fields.
#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    aliases: HashMap<String, Field>,
}

impl FieldResolver {
    /// `mapping` is source column → canonical (or host role) field name.
    /// Unknown targets are ignored with a warning.
    pub fn new(mapping: &HashMap<String, String>) -> Self {
        let mut aliases = HashMap::new();
        for (column, target) in mapping {
            match Field::from_name(target) {
                Some(field) => {
                    aliases.insert(column.clone(), field);
                }
                None => tracing::warn!(
                    "Ignoring field mapping '{}' -> '{}': unknown target field",
                    column,
                    target
                ),
            }
        }
        Self { aliases }
    }

    pub fn resolve(&self, column: &str) -> Option<Field> {
        self.aliases
            .get(column)
            .copied()
            .or_else(|| Field::from_name(column))
            .or_else(|| Field::from_name(column.trim()))
    }
}

fn assign(record: &mut SalesRecord, field: Field, text: String, quantity: f64) {
    match field {
        Field::SellerCode => record.seller_code = text,
        Field::CategoryCode => record.category_code = text,
        Field::CustomerCode => record.customer_code = text,
        Field::CustomerName => record.customer_name = text,
        Field::ProductCode => record.product_code = text,
        Field::ProductName => record.product_name = text,
        Field::QuantitySold => record.quantity_sold = quantity,
    }
}

/// 無法解析的數量一律為 0
pub fn parse_quantity(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn json_quantity(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_quantity(s),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

pub fn record_from_json(
    object: &serde_json::Map<String, Value>,
    resolver: &FieldResolver,
) -> SalesRecord {
    let mut record = SalesRecord::default();
    for (column, value) in object {
        if let Some(field) = resolver.resolve(column) {
            assign(&mut record, field, json_text(value), json_quantity(value));
        }
    }
    record
}

/// Decodes a JSON array of objects. Non-object elements are skipped.
pub fn decode_json(data: &[u8], resolver: &FieldResolver) -> Result<Vec<SalesRecord>> {
    let value: Value = serde_json::from_slice(data)?;
    decode_json_value(value, resolver)
}

pub fn decode_json_value(value: Value, resolver: &FieldResolver) -> Result<Vec<SalesRecord>> {
    let items = match value {
        Value::Array(items) => items,
        // 單一物件視為一筆記錄
        Value::Object(obj) => vec![Value::Object(obj)],
        other => {
            return Err(ReportError::ProcessingError {
                message: format!("expected a JSON array of records, got {}", json_kind(&other)),
            })
        }
    };

    let total = items.len();
    let records: Vec<SalesRecord> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| record_from_json(obj, resolver))
        .collect();

    if records.len() < total {
        tracing::warn!("Skipped {} non-object JSON items", total - records.len());
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// UTF-8 when valid, otherwise read as Latin-1 (legacy exports).
fn field_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Decodes CSV with a header row. Short rows leave missing fields empty.
pub fn decode_csv(data: &[u8], resolver: &FieldResolver) -> Result<Vec<SalesRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let columns: Vec<Option<Field>> = reader
        .byte_headers()?
        .iter()
        .map(|header| {
            let header = field_text(header);
            resolver.resolve(header.trim_start_matches('\u{feff}'))
        })
        .collect();

    for field in Field::ALL {
        if !columns.contains(&Some(field)) {
            tracing::warn!(
                "Input has no column for '{}', values default to empty",
                field.canonical_name()
            );
        }
    }

    let mut records = Vec::new();
    for row in reader.byte_records() {
        let row = row?;
        let mut record = SalesRecord::default();
        for (value, field) in row.iter().zip(&columns) {
            if let Some(field) = field {
                let text = field_text(value);
                let quantity = parse_quantity(&text);
                assign(&mut record, *field, text, quantity);
            }
        }
        records.push(record);
    }
    Ok(records)
}

pub fn decode(
    format: SourceFormat,
    data: &[u8],
    resolver: &FieldResolver,
) -> Result<Vec<SalesRecord>> {
    match format {
        SourceFormat::Csv => decode_csv(data, resolver),
        SourceFormat::Json => decode_json(data, resolver),
    }
}
