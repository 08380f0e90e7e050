use crate::config::render::{Color, ColumnSet, OverflowMode, PageGeometry, RenderConfig};
use crate::config::DEFAULT_ARCHIVE_NAME;
use crate::core::ConfigProvider;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub report: ReportSection,
    pub source: SourceConfig,
    #[serde(default)]
    pub render: RenderSection,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub name: String,
    pub title: Option<String>,
    pub seller_caption: Option<String>,
    pub category_caption: Option<String>,
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// `.csv`/`.json` path or http(s) URL
    pub input: String,
    pub timeout_seconds: Option<u64>,
    pub max_records: Option<usize>,
    pub headers: Option<HashMap<String, String>>,
    pub field_mapping: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderSection {
    pub column_set: Option<ColumnSet>,
    pub overflow: Option<OverflowMode>,
    pub concurrent_renders: Option<usize>,
    pub colors: Option<ColorConfig>,
    pub page: Option<PageGeometry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorConfig {
    pub no_sales: Option<String>,
    pub has_sales: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub archive_name: Option<String>,
    pub timestamp_suffix: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| ReportError::ConfigError {
                message: format!("cannot read '{}': {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed)?)
    }

    /// 替換環境變數 (例如 ${SALES_INPUT})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("report.name", &self.report.name)?;
        validation::validate_input_source("source.input", &self.source.input)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(name) = &self.output.archive_name {
            validation::validate_file_extensions("output.archive_name", &[name.clone()], &["zip"])?;
        }

        if let Some(concurrent) = self.render.concurrent_renders {
            validation::validate_positive_number("render.concurrent_renders", concurrent, 1)?;
        }

        if let Some(max) = self.source.max_records {
            validation::validate_positive_number("source.max_records", max, 1)?;
        }

        if let Some(colors) = &self.render.colors {
            if let Some(value) = &colors.no_sales {
                validation::validate_hex_color("render.colors.no_sales", value)?;
            }
            if let Some(value) = &colors.has_sales {
                validation::validate_hex_color("render.colors.has_sales", value)?;
            }
        }

        if let Some(page) = &self.render.page {
            validation::validate_range("render.page.header_angle", page.header_angle, 0.0, 90.0)?;
            if page.row_height <= 0.0 || page.width <= 0.0 || page.height <= 0.0 {
                return Err(ReportError::InvalidConfigValueError {
                    field: "render.page".to_string(),
                    value: format!("{}x{} row {}", page.width, page.height, page.row_height),
                    reason: "page size and row height must be positive".to_string(),
                });
            }
            if page.code_width < 0.0
                || page.name_width < 0.0
                || page.code_width + page.name_width > page.usable_width()
            {
                return Err(ReportError::InvalidConfigValueError {
                    field: "render.page".to_string(),
                    value: format!("code {} + name {}", page.code_width, page.name_width),
                    reason: format!(
                        "identity columns must fit in the usable width of {}",
                        page.usable_width()
                    ),
                });
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_source(&self) -> &str {
        &self.source.input
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn archive_name(&self) -> String {
        let name = self
            .output
            .archive_name
            .clone()
            .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string());

        if !self.output.timestamp_suffix.unwrap_or(false) {
            return name;
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        match name.strip_suffix(".zip") {
            Some(stem) => format!("{}_{}.zip", stem, stamp),
            None => format!("{}_{}", name, stamp),
        }
    }

    fn concurrent_renders(&self) -> usize {
        self.render.concurrent_renders.unwrap_or(4)
    }

    fn max_records(&self) -> Option<usize> {
        self.source.max_records
    }

    fn field_mapping(&self) -> HashMap<String, String> {
        self.source.field_mapping.clone().unwrap_or_default()
    }

    fn render_config(&self) -> RenderConfig {
        let defaults = RenderConfig::default();
        let colors = self.render.colors.clone().unwrap_or_default();

        RenderConfig {
            title: self.report.title.clone().unwrap_or(defaults.title),
            seller_caption: self
                .report
                .seller_caption
                .clone()
                .unwrap_or(defaults.seller_caption),
            category_caption: self
                .report
                .category_caption
                .clone()
                .unwrap_or(defaults.category_caption),
            empty_message: self
                .report
                .empty_message
                .clone()
                .unwrap_or(defaults.empty_message),
            no_sales_color: Color::from_hex_or(colors.no_sales.as_deref(), defaults.no_sales_color),
            has_sales_color: Color::from_hex_or(
                colors.has_sales.as_deref(),
                defaults.has_sales_color,
            ),
            column_set: self.render.column_set.unwrap_or(defaults.column_set),
            overflow: self.render.overflow.unwrap_or(defaults.overflow),
            page: self.render.page.clone().unwrap_or(defaults.page),
        }
    }

    fn request_headers(&self) -> HashMap<String, String> {
        self.source.headers.clone().unwrap_or_default()
    }

    fn request_timeout_seconds(&self) -> Option<u64> {
        self.source.timeout_seconds
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
