use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlantError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Model API returned status {status}: {message}")]
    ModelResponseError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Image input error: {message}")]
    ImageError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Model,
    Input,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlantError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlantError::ApiError(_) => ErrorCategory::Network,
            PlantError::ModelResponseError { .. } | PlantError::SerializationError(_) => {
                ErrorCategory::Model
            }
            PlantError::ImageError { .. } | PlantError::ValidationError { .. } => {
                ErrorCategory::Input
            }
            PlantError::ConfigError { .. }
            | PlantError::MissingConfigError { .. }
            | PlantError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            PlantError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlantError::ValidationError { .. } => ErrorSeverity::Low,
            PlantError::ApiError(_) => ErrorSeverity::Medium,
            // 5xx/429 通常可重試，其餘狀態碼多半是請求本身有問題
            PlantError::ModelResponseError { status, .. } => {
                if *status == 429 || *status >= 500 {
                    ErrorSeverity::Medium
                } else {
                    ErrorSeverity::High
                }
            }
            PlantError::ImageError { .. } | PlantError::SerializationError(_) => {
                ErrorSeverity::High
            }
            PlantError::ConfigError { .. }
            | PlantError::MissingConfigError { .. }
            | PlantError::InvalidConfigValueError { .. }
            | PlantError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PlantError::ApiError(e) if e.is_timeout() => {
                "The model took too long to answer. Try again or raise --timeout.".to_string()
            }
            PlantError::ApiError(_) => {
                "Check your network connection and the configured API base URL.".to_string()
            }
            PlantError::ModelResponseError { status, .. } => match status {
                400 => "The model rejected the request. Try a smaller or clearer image.".to_string(),
                401 | 403 => "Check that GEMINI_API_KEY is valid for the Gemini API.".to_string(),
                404 => "Check the configured model name.".to_string(),
                429 => "Rate limit reached. Wait a moment and try again.".to_string(),
                _ => "The model service is having trouble. Try again later.".to_string(),
            },
            PlantError::MissingConfigError { field } if field == "api_key" => {
                "Set GEMINI_API_KEY or pass --api-key.".to_string()
            }
            PlantError::MissingConfigError { field } => {
                format!("Provide a value for '{}' on the command line or in the config file.", field)
            }
            PlantError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' and run again.", field)
            }
            PlantError::ConfigError { .. } => {
                "Make sure the config file exists and is valid TOML.".to_string()
            }
            PlantError::ImageError { .. } => {
                "Supply a JPEG, PNG, WebP or GIF image file, '-' for stdin, or a data: URL."
                    .to_string()
            }
            PlantError::IoError(_) => "Check file paths and permissions.".to_string(),
            PlantError::SerializationError(_) => {
                "The model returned an unexpected payload. Try again.".to_string()
            }
            PlantError::ValidationError { .. } => "Adjust the input and try again.".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the plant model: {}", self),
            ErrorCategory::Model => format!("The plant model could not answer: {}", self),
            ErrorCategory::Input => format!("There is a problem with your input: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// 依嚴重程度對應的行程結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlantError>;
