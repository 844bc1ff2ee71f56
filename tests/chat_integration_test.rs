use httpmock::prelude::*;
use plant_assistant::app::commands::{run_chat_loop, run_chat_script};
use plant_assistant::{ChatRole, GeminiClient, ImageLinker, PlantAssistant, PlantInfo};
use serde_json::json;
use std::time::Duration;

const ENDPOINT: &str = "/models/gemini-2.5-flash:generateContent";

fn assistant_for(server: &MockServer) -> PlantAssistant<GeminiClient> {
    let client = GeminiClient::new(
        server.base_url(),
        "chat-key",
        "gemini-2.5-flash",
        Duration::from_secs(5),
    )
    .unwrap();
    PlantAssistant::new(client, ImageLinker::default()).with_max_history(10)
}

fn snake_plant() -> PlantInfo {
    PlantInfo {
        name: "Snake Plant".to_string(),
        description: "Upright sword-shaped leaves.".to_string(),
        care_instructions: vec!["Let soil dry out".to_string()],
        image: None,
        similar_plants: vec![],
    }
}

#[tokio::test]
async fn test_interactive_chat_with_suggested_question() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path(ENDPOINT)
            .header("x-goog-api-key", "chat-key")
            .body_contains("I have a Snake Plant. Here's what I know about it: Upright sword-shaped leaves.")
            .body_contains("I'll help you with any questions about your plant.");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Every 2-3 weeks."}]}}]
            }));
    });

    let assistant = assistant_for(&server);
    let mut session = assistant.start_chat(&snake_plant());
    let input: &[u8] = b"/ask 1\n\nIn winter too?\n/ask 9\n/bogus\n/quit\nnever sent\n";
    let mut out = Vec::new();

    run_chat_loop(&assistant, &mut session, input, &mut out).await.unwrap();

    api_mock.assert_hits(2);
    let transcript: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        transcript,
        [
            "How often should I water this plant?",
            "Every 2-3 weeks.",
            "In winter too?",
            "Every 2-3 weeks."
        ]
    );

    let rendered = String::from_utf8(out).unwrap();
    assert!(rendered.starts_with("Chatting about Snake Plant."));
    assert!(rendered.contains("1. 💡 How often should I water this plant?"));
    assert!(rendered.contains("🌱 Assistant · just now\nEvery 2-3 weeks."));
    assert!(rendered.contains("Pick a question between 1 and 4."));
    assert!(rendered.contains("Unknown command /bogus."));
}

#[tokio::test]
async fn test_chat_failure_then_retry_still_failing() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path(ENDPOINT);
        then.status(503)
            .header("Content-Type", "application/json")
            .json_body(json!({"error": {"code": 503, "message": "The model is overloaded."}}));
    });

    let assistant = assistant_for(&server);
    let mut session = assistant.start_chat(&snake_plant());
    let input: &[u8] = b"Does it flower?\n/retry\n";
    let mut out = Vec::new();

    run_chat_loop(&assistant, &mut session, input, &mut out).await.unwrap();

    api_mock.assert_hits(2);
    assert_eq!(session.messages().len(), 2);
    assert_eq!(session.messages()[0].content, "Does it flower?");
    assert!(session.messages()[1].error);
    assert_eq!(
        session.last_error(),
        Some("Failed to get response. Please try again.")
    );

    let rendered = String::from_utf8(out).unwrap();
    assert_eq!(
        rendered.matches("Sorry, I encountered an error. Please try again.").count(),
        2
    );
    assert!(rendered.contains("Type /retry to try again."));
}

#[tokio::test]
async fn test_scripted_chat_json_transcript() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(ENDPOINT);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"candidates": [{"content": {"parts": [{"text": "Yes, in bright light."}]}}]}));
    });

    let assistant = assistant_for(&server);
    let mut session = assistant
        .start_chat(&snake_plant())
        .with_greeting("Hi! Ask me about your snake plant.");
    let messages = vec!["Can it live outside?".to_string(), "   ".to_string()];
    let mut out = Vec::new();

    run_chat_script(&assistant, &mut session, &messages, true, &mut out)
        .await
        .unwrap();

    let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let printed = printed.as_array().unwrap();
    assert_eq!(printed.len(), 3);
    assert_eq!(printed[0]["role"], "assistant");
    assert_eq!(printed[1]["content"], "Can it live outside?");
    assert_eq!(printed[2]["content"], "Yes, in bright light.");
    assert_eq!(session.messages()[1].role, ChatRole::User);
}

#[tokio::test]
async fn test_blank_model_text_becomes_apology() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(ENDPOINT);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(json!({"candidates": []}));
    });

    let assistant = assistant_for(&server);
    let mut session = assistant.start_chat(&snake_plant());
    let reply = assistant.chat(&mut session, "Is it toxic to cats?").await.unwrap();

    assert_eq!(reply.content, "Sorry, I could not generate a response.");
    assert!(!reply.error);
}
