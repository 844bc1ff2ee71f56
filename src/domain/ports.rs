use crate::domain::model::Content;
use crate::utils::error::Result;
use async_trait::async_trait;

/// A hosted generative model that answers a list of conversation turns with text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Returns the text of the first part of the first candidate, or an empty
    /// string when the reply carries none.
    async fn generate_content(&self, contents: Vec<Content>) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn image_base(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn max_image_bytes(&self) -> usize;
    fn max_history_messages(&self) -> usize;
}
