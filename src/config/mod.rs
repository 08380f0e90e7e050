pub mod cli;
pub mod render;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::render::{ColumnSet, OverflowMode, RenderConfig};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "cli")]
use std::collections::HashMap;

pub const DEFAULT_ARCHIVE_NAME: &str = "sales_reports.zip";

/// 本機輸入檔轉成絕對路徑，避免被 storage 的 base_path 影響
pub fn absolutize_input(input: &str) -> crate::utils::error::Result<String> {
    let path = std::path::Path::new(input);
    if crate::utils::validation::is_remote_source(input) || path.is_absolute() {
        return Ok(input.to_string());
    }
    let absolute = std::env::current_dir()?.join(path);
    Ok(absolute.to_string_lossy().into_owned())
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pivot-reports")]
#[command(about = "Render per-seller, per-category sales grids to PDF and bundle them in a zip")]
pub struct CliConfig {
    /// Input table: a .csv/.json file or an http(s) URL returning a JSON array
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_ARCHIVE_NAME)]
    pub archive_name: String,

    #[arg(long, default_value = crate::config::render::DEFAULT_TITLE)]
    pub title: String,

    /// first_row (legacy) or union
    #[arg(long, default_value = "first_row")]
    pub column_set: ColumnSet,

    /// truncate (legacy) or paginate
    #[arg(long, default_value = "truncate")]
    pub overflow: OverflowMode,

    #[arg(long, default_value = "4")]
    pub concurrent_renders: usize,

    #[arg(long)]
    pub max_records: Option<usize>,

    /// Extra column aliases, e.g. `Vendedor=seller_code`
    #[arg(long = "map", value_parser = parse_mapping)]
    pub field_mapping: Vec<(String, String)>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log system resource usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
fn parse_mapping(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(from, to)| (from.trim().to_string(), to.trim().to_string()))
        .filter(|(from, to)| !from.is_empty() && !to.is_empty())
        .ok_or_else(|| format!("expected COLUMN=FIELD, got '{}'", raw))
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_source(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn archive_name(&self) -> String {
        self.archive_name.clone()
    }

    fn concurrent_renders(&self) -> usize {
        self.concurrent_renders
    }

    fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    fn field_mapping(&self) -> HashMap<String, String> {
        self.field_mapping.iter().cloned().collect()
    }

    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            title: self.title.clone(),
            column_set: self.column_set,
            overflow: self.overflow,
            ..RenderConfig::default()
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_input_source("input", &self.input)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_path("archive_name", &self.archive_name)?;
        validation::validate_positive_number("concurrent_renders", self.concurrent_renders, 1)?;
        if let Some(max) = self.max_records {
            validation::validate_positive_number("max_records", max, 1)?;
        }
        Ok(())
    }
}
