//! Grouping and pivoting of flat sales records.

use crate::config::render::ColumnSet;
use crate::domain::model::{GroupedRecords, PivotRow, SalesRecord};
use std::collections::HashMap;

pub fn product_label(product_code: &str, product_name: &str) -> String {
    format!("{} - {}", product_code, product_name)
}

pub fn customer_key(customer_code: &str, customer_name: &str) -> String {
    format!("{}_{}", customer_code, customer_name)
}

/// Buckets records by seller and then category. Every record lands in
/// exactly one bucket and keeps its relative order.
pub fn group(records: &[SalesRecord]) -> GroupedRecords {
    let mut grouped = GroupedRecords::new();

    for record in records {
        let key = record.group_key();
        grouped
            .entry(key.seller_code)
            .or_default()
            .entry(key.category_code)
            .or_default()
            .push(record.clone());
    }

    grouped
}

/// Pivots one group's records into customer rows, summing quantities per
/// product. Rows come out in order of first appearance.
pub fn pivot(records: &[SalesRecord]) -> Vec<PivotRow> {
    let mut rows: Vec<PivotRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = customer_key(&record.customer_code, &record.customer_name);
        let position = *index.entry(key).or_insert_with(|| {
            rows.push(PivotRow::new(
                record.customer_code.clone(),
                record.customer_name.clone(),
            ));
            rows.len() - 1
        });

        rows[position].add(
            product_label(&record.product_code, &record.product_name),
            record.quantity_sold,
        );
    }

    rows
}

/// Product columns for a page.
pub fn column_set(rows: &[PivotRow], mode: ColumnSet) -> Vec<String> {
    match mode {
        ColumnSet::FirstRow => rows
            .first()
            .map(|row| row.product_labels().map(str::to_string).collect())
            .unwrap_or_default(),
        ColumnSet::Union => {
            let mut columns: Vec<String> = Vec::new();
            for label in rows.iter().flat_map(PivotRow::product_labels) {
                if !columns.iter().any(|c| c == label) {
                    columns.push(label.to_string());
                }
            }
            columns
        }
    }
}
