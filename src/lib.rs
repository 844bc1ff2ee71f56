pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use config::{Settings, TomlConfig};

pub use adapters::gemini::GeminiClient;
pub use adapters::image_input::ImageSource;
pub use adapters::image_links::ImageLinker;
pub use core::{assistant::PlantAssistant, chat::ChatSession};
pub use domain::model::{ChatMessage, ChatRole, ImagePayload, PlantInfo, SearchResult, SimilarPlant};
pub use domain::ports::{ConfigProvider, ModelClient};
pub use utils::error::{PlantError, Result};
