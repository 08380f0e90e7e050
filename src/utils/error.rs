use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("PDF generation error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("Render task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unsupported input source '{source_name}': {reason}")]
    UnsupportedSourceError { source_name: String, reason: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Rendering,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::ConfigError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ReportError::HttpError(_)
            | ReportError::CsvError(_)
            | ReportError::SerializationError(_)
            | ReportError::UnsupportedSourceError { .. } => ErrorCategory::Input,
            ReportError::PdfError(_) | ReportError::ProcessingError { .. } => {
                ErrorCategory::Rendering
            }
            ReportError::ZipError(_) => ErrorCategory::Output,
            ReportError::IoError(_) | ReportError::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常可以重試
            ReportError::HttpError(_) => ErrorSeverity::Medium,
            ReportError::ConfigError { .. }
            | ReportError::ConfigValidationError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::UnsupportedSourceError { .. }
            | ReportError::CsvError(_)
            | ReportError::SerializationError(_)
            | ReportError::ProcessingError { .. } => ErrorSeverity::High,
            ReportError::PdfError(_)
            | ReportError::ZipError(_)
            | ReportError::IoError(_)
            | ReportError::TaskError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReportError::HttpError(_) => {
                "Check that the input URL is reachable and returns a JSON array".to_string()
            }
            ReportError::CsvError(_) => {
                "Make sure the CSV file has a header row and consistent columns".to_string()
            }
            ReportError::SerializationError(_) => {
                "Make sure the JSON input is an array of objects".to_string()
            }
            ReportError::UnsupportedSourceError { .. } => {
                "Use a .csv or .json file, or an http(s) URL".to_string()
            }
            ReportError::ConfigError { .. } | ReportError::ConfigValidationError { .. } => {
                "Review the configuration file syntax and values".to_string()
            }
            ReportError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' and try again", field)
            }
            ReportError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            ReportError::IoError(_) => {
                "Check file permissions and available disk space".to_string()
            }
            ReportError::ZipError(_) | ReportError::PdfError(_) => {
                "Retry; if the problem persists, report it with the input that triggered it"
                    .to_string()
            }
            ReportError::TaskError(_) => "Lower the number of concurrent renders".to_string(),
            ReportError::ProcessingError { .. } => {
                "Inspect the input records with --verbose".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not read sales records: {}", self),
            ErrorCategory::Rendering => format!("Could not generate the reports: {}", self),
            ErrorCategory::Output => format!("Could not build the archive: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 依嚴重程度決定 CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl From<toml::de::Error> for ReportError {
    fn from(e: toml::de::Error) -> Self {
        ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
