use crate::utils::error::{PlantError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

pub const DEFAULT_IMAGE_BASE: &str = "https://image.pollinations.ai/prompt";

// URI component encoding: only A-Z a-z 0-9 - _ . ! ~ * ' ( ) pass through
const PROMPT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds picture URLs for a text-to-image service addressed purely by URL path.
#[derive(Debug, Clone)]
pub struct ImageLinker {
    base: Url,
}

impl ImageLinker {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| PlantError::InvalidConfigValueError {
            field: "image_base".to_string(),
            value: base.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        if base.cannot_be_a_base() {
            return Err(PlantError::InvalidConfigValueError {
                field: "image_base".to_string(),
                value: base.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        Ok(Self { base })
    }

    pub fn generate_image(&self, prompt: &str) -> String {
        let base = self.base.as_str().trim_end_matches('/');
        format!("{}/{}", base, utf8_percent_encode(prompt, PROMPT_ENCODE_SET))
    }
}

impl Default for ImageLinker {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_IMAGE_BASE).expect("default image base is a valid URL"),
        }
    }
}
