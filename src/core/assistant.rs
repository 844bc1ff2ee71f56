use crate::adapters::gemini::GeminiClient;
use crate::adapters::image_links::ImageLinker;
use crate::core::chat::ChatSession;
use crate::core::identify::identify_plant;
use crate::core::search::search_plants;
use crate::domain::model::{ChatMessage, ImagePayload, PlantInfo, SearchResult};
use crate::domain::ports::{ConfigProvider, ModelClient};
use crate::utils::error::Result;

/// Binds a model client and an image linker; every user action is one round trip.
pub struct PlantAssistant<C: ModelClient> {
    client: C,
    linker: ImageLinker,
    max_history: usize,
}

impl PlantAssistant<GeminiClient> {
    pub fn from_config<P: ConfigProvider>(config: &P) -> Result<Self> {
        let client = GeminiClient::from_config(config)?;
        let linker = ImageLinker::new(config.image_base())?;
        tracing::debug!("Using model {} at {}", config.model(), client.endpoint());
        Ok(Self::new(client, linker).with_max_history(config.max_history_messages()))
    }
}

impl<C: ModelClient> PlantAssistant<C> {
    pub fn new(client: C, linker: ImageLinker) -> Self {
        Self {
            client,
            linker,
            max_history: crate::core::chat::DEFAULT_MAX_HISTORY_MESSAGES,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub async fn identify(&self, image: &ImagePayload) -> Result<PlantInfo> {
        identify_plant(&self.client, &self.linker, image).await
    }

    /// 失敗時回傳佔位內容而不是錯誤
    pub async fn identify_or_placeholder(&self, image: &ImagePayload) -> PlantInfo {
        match self.identify(image).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("❌ Error identifying plant: {}", e);
                PlantInfo::unavailable()
            }
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        search_plants(&self.client, &self.linker, query).await
    }

    pub async fn search_or_empty(&self, query: &str) -> Vec<SearchResult> {
        match self.search(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("❌ Error searching plants: {}", e);
                Vec::new()
            }
        }
    }

    pub fn start_chat(&self, plant: &PlantInfo) -> ChatSession {
        ChatSession::new(plant, self.max_history)
    }

    pub async fn chat<'s>(&self, session: &'s mut ChatSession, text: &str) -> Option<&'s ChatMessage> {
        session.send(&self.client, text).await
    }

    pub async fn retry<'s>(&self, session: &'s mut ChatSession) -> Option<&'s ChatMessage> {
        session.retry_last(&self.client).await
    }
}
