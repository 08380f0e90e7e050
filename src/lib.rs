pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::cli::LocalStorage;
pub use config::render::{Color, ColumnSet, OverflowMode, PageGeometry, RenderConfig};
pub use config::toml_config::TomlConfig;
pub use core::aggregator::{group, pivot};
pub use core::engine::ReportEngine;
pub use core::pipeline::ReportPipeline;
pub use core::renderer::GridRenderer;
pub use domain::model::{GroupKey, PivotRow, ReportSet, SalesRecord};
pub use utils::error::{ReportError, Result};
