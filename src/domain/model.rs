use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_PLANT_NAME: &str = "Unknown Plant";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const NO_CARE_INSTRUCTIONS: &str = "No care instructions provided.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarPlant {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantInfo {
    pub name: String,
    pub description: String,
    pub care_instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub similar_plants: Vec<SimilarPlant>,
}

impl PlantInfo {
    /// 模型回覆不是 JSON 時，直接把原文當描述
    pub fn from_plain_text(text: &str) -> Self {
        Self {
            name: "Plant Analysis".to_string(),
            description: text.to_string(),
            care_instructions: vec!["Please refer to the description for more details.".to_string()],
            image: None,
            similar_plants: Vec::new(),
        }
    }

    /// 辨識失敗時顯示給使用者的佔位內容
    pub fn unavailable() -> Self {
        Self {
            name: "Error".to_string(),
            description: "Unable to identify the plant at this time. Please try again.".to_string(),
            care_instructions: vec!["Please try uploading the image again.".to_string()],
            image: None,
            similar_plants: Vec::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub name: String,
    pub description: String,
    pub image: String,
    #[serde(default)]
    pub care_instructions: Vec<String>,
    #[serde(default)]
    pub similar_plants: Vec<SimilarPlant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Gemini 的對話角色名稱
    pub fn model_role(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            error: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            error: false,
        }
    }

    pub fn assistant_error(content: impl Into<String>) -> Self {
        Self {
            error: true,
            ..Self::assistant(content)
        }
    }
}

/// Base64 image data without any `data:` URL prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One part of a model request turn: text or inline image bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<ImagePayload>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn image(payload: ImagePayload) -> Self {
        Self {
            text: None,
            inline_data: Some(payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    pub fn turn(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.model_role().to_string()),
            parts: vec![Part::text(text)],
        }
    }
}
