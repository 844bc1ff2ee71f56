use crate::core::prompts::{chat_context, CHAT_ACKNOWLEDGEMENT};
use crate::domain::model::{ChatMessage, ChatRole, Content, PlantInfo};
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;

pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "How often should I water this plant?",
    "What are the ideal light conditions?",
    "What type of soil is best?",
    "How do I propagate this plant?",
];

pub const EMPTY_REPLY: &str = "Sorry, I could not generate a response.";
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";
pub const SESSION_ERROR: &str = "Failed to get response. Please try again.";

pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 20;

/// Context turns, then the most recent `max_history` non-error messages, then `message`.
pub fn build_chat_contents(
    plant_name: &str,
    plant_description: &str,
    history: &[ChatMessage],
    max_history: usize,
    message: &str,
) -> Vec<Content> {
    let usable: Vec<&ChatMessage> = history.iter().filter(|m| !m.error).collect();
    let skip = usable.len().saturating_sub(max_history);

    let mut contents = vec![
        Content::turn(ChatRole::User, chat_context(plant_name, plant_description)),
        Content::turn(ChatRole::Assistant, CHAT_ACKNOWLEDGEMENT),
    ];
    contents.extend(
        usable
            .into_iter()
            .skip(skip)
            .map(|m| Content::turn(m.role, m.content.clone())),
    );
    contents.push(Content::turn(ChatRole::User, message));
    contents
}

pub async fn get_chat_response<C: ModelClient + ?Sized>(
    client: &C,
    plant_name: &str,
    plant_description: &str,
    history: &[ChatMessage],
    max_history: usize,
    message: &str,
) -> Result<String> {
    let contents = build_chat_contents(plant_name, plant_description, history, max_history, message);
    let text = client.generate_content(contents).await?;

    if text.trim().is_empty() {
        return Ok(EMPTY_REPLY.to_string());
    }
    Ok(text)
}

/// Transcript and error state for a conversation about one plant.
#[derive(Debug, Clone)]
pub struct ChatSession {
    plant_name: String,
    plant_description: String,
    messages: Vec<ChatMessage>,
    last_error: Option<String>,
    max_history: usize,
}

impl ChatSession {
    pub fn new(plant: &PlantInfo, max_history: usize) -> Self {
        Self {
            plant_name: plant.name.clone(),
            plant_description: plant.description.clone(),
            messages: Vec::new(),
            last_error: None,
            max_history,
        }
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::assistant(greeting));
        self
    }

    pub fn plant_name(&self) -> &str {
        &self.plant_name
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn suggested_questions(&self) -> &'static [&'static str] {
        &SUGGESTED_QUESTIONS
    }

    /// 送出一則訊息；空白輸入直接忽略並回傳 `None`
    pub async fn send<C: ModelClient + ?Sized>(
        &mut self,
        client: &C,
        text: &str,
    ) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        self.last_error = None;
        let history_len = self.messages.len();
        self.messages.push(ChatMessage::user(text));

        let reply = get_chat_response(
            client,
            &self.plant_name,
            &self.plant_description,
            &self.messages[..history_len],
            self.max_history,
            text,
        )
        .await;

        match reply {
            Ok(content) => self.messages.push(ChatMessage::assistant(content)),
            Err(e) => {
                tracing::error!("❌ Chat request failed: {}", e);
                self.last_error = Some(SESSION_ERROR.to_string());
                self.messages.push(ChatMessage::assistant_error(ERROR_REPLY));
            }
        }

        self.messages.last()
    }

    /// Re-sends the last user message after dropping error replies and the
    /// unanswered user turn they followed.
    pub async fn retry_last<C: ModelClient + ?Sized>(
        &mut self,
        client: &C,
    ) -> Option<&ChatMessage> {
        let last_user = self
            .messages
            .iter()
            .rposition(|m| m.role == ChatRole::User)?;
        let text = self.messages[last_user].content.clone();

        let answered = self.messages[last_user + 1..]
            .iter()
            .any(|m| m.role == ChatRole::Assistant && !m.error);
        if !answered {
            self.messages.remove(last_user);
        }
        self.messages.retain(|m| !m.error);

        tracing::debug!("Retrying last question: {}", text);
        self.send(client, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PlantError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies and records what it was sent.
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<Vec<Content>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<Content>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedClient {
        async fn generate_content(&self, contents: Vec<Content>) -> Result<String> {
            self.calls.lock().unwrap().push(contents);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn unavailable() -> Result<String> {
        Err(PlantError::ModelResponseError {
            status: 503,
            message: "overloaded".to_string(),
        })
    }

    fn fern() -> PlantInfo {
        PlantInfo {
            name: "Boston Fern".to_string(),
            description: "A lush fern.".to_string(),
            care_instructions: vec![],
            image: None,
            similar_plants: vec![],
        }
    }

    fn texts(contents: &[Content]) -> Vec<(String, String)> {
        contents
            .iter()
            .map(|c| {
                (
                    c.role.clone().unwrap_or_default(),
                    c.parts[0].text.clone().unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn test_contents_start_with_plant_context() {
        let contents = build_chat_contents("Boston Fern", "A lush fern.", &[], 10, "Humidity?");
        let turns = texts(&contents);

        assert_eq!(turns.len(), 3);
        assert_eq!(
            turns[0],
            (
                "user".to_string(),
                "I have a Boston Fern. Here's what I know about it: A lush fern.".to_string()
            )
        );
        assert_eq!(turns[1].0, "model");
        assert_eq!(turns[2], ("user".to_string(), "Humidity?".to_string()));
    }

    #[test]
    fn test_history_is_trimmed_and_skips_errors() {
        let history = vec![
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
            ChatMessage::assistant_error(ERROR_REPLY),
            ChatMessage::user("q3"),
            ChatMessage::assistant("a3"),
        ];

        let contents = build_chat_contents("Fern", "d", &history, 3, "q4");
        let turns: Vec<String> = texts(&contents).into_iter().map(|(_, t)| t).collect();

        assert_eq!(turns[2..], ["q2", "q3", "a3", "q4"]);
    }

    #[tokio::test]
    async fn test_empty_model_text_gets_apology() {
        let client = ScriptedClient::new(vec![Ok("   ".to_string())]);
        let reply = get_chat_response(&client, "Fern", "d", &[], 10, "hi").await.unwrap();
        assert_eq!(reply, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_send_ignores_blank_input() {
        let client = ScriptedClient::new(vec![]);
        let mut session = ChatSession::new(&fern(), 10);

        assert!(session.send(&client, "   ").await.is_none());
        assert!(session.is_empty());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_send_records_both_turns_and_passes_history() {
        let client = ScriptedClient::new(vec![
            Ok("Keep it moist.".to_string()),
            Ok("Indirect light.".to_string()),
        ]);
        let mut session = ChatSession::new(&fern(), 10).with_greeting("Ask me anything!");

        let reply = session.send(&client, " Water? ").await.unwrap();
        assert_eq!(reply.content, "Keep it moist.");
        session.send(&client, "Light?").await;

        assert_eq!(session.messages().len(), 5);
        assert_eq!(session.messages()[1].content, "Water?");

        let second_call = texts(&client.calls()[1]);
        let sent: Vec<&str> = second_call.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(sent[2..], ["Ask me anything!", "Water?", "Keep it moist.", "Light?"]);
    }

    #[tokio::test]
    async fn test_failed_send_appends_error_message() {
        let client = ScriptedClient::new(vec![unavailable()]);
        let mut session = ChatSession::new(&fern(), 10);

        let reply = session.send(&client, "Repot?").await.unwrap();
        assert!(reply.error);
        assert_eq!(reply.content, ERROR_REPLY);
        assert_eq!(session.last_error(), Some(SESSION_ERROR));
    }

    #[tokio::test]
    async fn test_retry_replaces_failed_exchange() {
        let client = ScriptedClient::new(vec![unavailable(), Ok("In spring.".to_string())]);
        let mut session = ChatSession::new(&fern(), 10);

        session.send(&client, "When to repot?").await;
        let reply = session.retry_last(&client).await.unwrap();

        assert_eq!(reply.content, "In spring.");
        assert!(session.last_error().is_none());
        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["When to repot?", "In spring."]);
    }

    #[tokio::test]
    async fn test_retry_without_user_message_is_noop() {
        let client = ScriptedClient::new(vec![]);
        let mut session = ChatSession::new(&fern(), 10).with_greeting("Hello");

        assert!(session.retry_last(&client).await.is_none());
        assert_eq!(session.messages().len(), 1);
    }
}
