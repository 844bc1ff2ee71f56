pub mod assistant;
pub mod chat;
pub mod identify;
pub mod prompts;
pub mod response;
pub mod search;

pub use crate::domain::model::{ChatMessage, ImagePayload, PlantInfo, SearchResult};
pub use crate::domain::ports::{ConfigProvider, ModelClient};
pub use crate::utils::error::Result;
