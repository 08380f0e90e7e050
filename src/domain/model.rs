use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一筆銷售記錄。所有識別欄位都是不透明字串。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub seller_code: String,
    pub category_code: String,
    pub customer_code: String,
    pub customer_name: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity_sold: f64,
}

impl SalesRecord {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            seller_code: self.seller_code.clone(),
            category_code: self.category_code.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub seller_code: String,
    pub category_code: String,
}

/// Customer row of a pivot. `quantities` keeps product labels in the order
/// they were first seen for this customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub customer_code: String,
    pub customer_name: String,
    pub quantities: Vec<(String, f64)>,
}

impl PivotRow {
    pub fn new(customer_code: impl Into<String>, customer_name: impl Into<String>) -> Self {
        Self {
            customer_code: customer_code.into(),
            customer_name: customer_name.into(),
            quantities: Vec::new(),
        }
    }

    /// 缺少的產品視為 0
    pub fn quantity(&self, product_label: &str) -> f64 {
        self.quantities
            .iter()
            .find(|(label, _)| label == product_label)
            .map(|(_, qty)| *qty)
            .unwrap_or(0.0)
    }

    pub fn add(&mut self, product_label: String, quantity: f64) {
        match self
            .quantities
            .iter_mut()
            .find(|(label, _)| *label == product_label)
        {
            Some((_, total)) => *total += quantity,
            None => self.quantities.push((product_label, quantity)),
        }
    }

    pub fn product_labels(&self) -> impl Iterator<Item = &str> {
        self.quantities.iter().map(|(label, _)| label.as_str())
    }
}

/// seller → category → records (bucket order preserved)
pub type GroupedRecords = BTreeMap<String, BTreeMap<String, Vec<SalesRecord>>>;

/// seller → category → PDF bytes
pub type ReportSet = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub reports: ReportSet,
    pub record_count: usize,
    pub document_count: usize,
    /// 因單頁容量不足而未輸出的客戶列數（所有報表加總）
    pub truncated_rows: usize,
}
