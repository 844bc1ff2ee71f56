use crate::adapters::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::adapters::image_input::DEFAULT_MAX_IMAGE_BYTES;
use crate::adapters::image_links::DEFAULT_IMAGE_BASE;
use crate::config::toml_config::TomlConfig;
use crate::core::chat::DEFAULT_MAX_HISTORY_MESSAGES;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Fully resolved runtime settings: defaults, then config file, then environment, then flags.
#[derive(Clone)]
pub struct Settings {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub image_base: String,
    pub timeout_secs: u64,
    pub max_image_bytes: usize,
    pub max_history_messages: usize,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_history_messages: DEFAULT_MAX_HISTORY_MESSAGES,
            log_level: None,
            log_format: LogFormat::Compact,
        }
    }
}

// 不把金鑰印進日誌
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("image_base", &self.image_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("max_history_messages", &self.max_history_messages)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// A key left as `${VAR}` after substitution, or blank, counts as unset.
fn usable_key(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() || (key.starts_with("${") && key.ends_with('}')) {
        None
    } else {
        Some(key.to_string())
    }
}

impl Settings {
    pub fn apply_file(&mut self, file: &TomlConfig) {
        if let Some(model) = &file.model {
            if let Some(key) = model.api_key.as_deref().and_then(usable_key) {
                self.api_key = Some(key);
            }
            if let Some(base) = &model.api_base {
                self.api_base = base.clone();
            }
            if let Some(name) = &model.name {
                self.model = name.clone();
            }
            if let Some(timeout) = model.timeout_seconds {
                self.timeout_secs = timeout;
            }
        }
        if let Some(images) = &file.images {
            if let Some(base) = &images.generator_base {
                self.image_base = base.clone();
            }
            if let Some(max) = images.max_upload_bytes {
                self.max_image_bytes = max;
            }
        }
        if let Some(chat) = &file.chat {
            if let Some(max) = chat.max_history_messages {
                self.max_history_messages = max;
            }
        }
        if let Some(logging) = &file.logging {
            if let Some(level) = &logging.level {
                self.log_level = Some(level.clone());
            }
            if let Some(format) = logging.format {
                self.log_format = format;
            }
        }
    }

    /// `GEMINI_API_KEY` wins over `GOOGLE_API_KEY`.
    pub fn apply_env(&mut self) {
        self.apply_env_keys(&API_KEY_ENV_VARS);
    }

    /// Takes the key from the first listed variable holding a usable value.
    pub fn apply_env_keys(&mut self, names: &[&str]) {
        let from_env = names
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find_map(|value| usable_key(&value));
        if let Some(key) = from_env {
            tracing::debug!("Using API key from environment");
            self.api_key = Some(key);
        }
    }
}

impl ConfigProvider for Settings {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn image_base(&self) -> &str {
        &self.image_base
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    fn max_history_messages(&self) -> usize {
        self.max_history_messages
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api_base", &self.api_base)?;
        validate_url("image_base", &self.image_base)?;
        validate_non_empty_string("model", &self.model)?;
        validate_required_field("api_key", &self.api_key)?;
        validate_range("timeout_seconds", self.timeout_secs, 1, 600)?;
        validate_range("max_image_bytes", self.max_image_bytes, 1, 100 * 1024 * 1024)?;
        validate_range("max_history_messages", self.max_history_messages, 0, 200)?;
        Ok(())
    }
}
