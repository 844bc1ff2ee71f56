use crate::adapters::image_input::{load_image, ImageSource};
use crate::app::render::{
    render_message, render_plant_info, render_search_results, render_suggestions,
    render_transcript,
};
use crate::core::assistant::PlantAssistant;
use crate::core::chat::{ChatSession, SUGGESTED_QUESTIONS};
use crate::domain::model::PlantInfo;
use crate::domain::ports::ModelClient;
use crate::utils::error::Result;
use chrono::Utc;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const CHAT_HELP: &str = "Commands: /suggest, /ask <n>, /history, /retry, /help, /quit";

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// 辨識失敗時仍輸出佔位內容，再把錯誤往上傳以決定結束碼
pub async fn run_identify<C: ModelClient, W: Write>(
    assistant: &PlantAssistant<C>,
    source: &ImageSource,
    max_image_bytes: usize,
    json: bool,
    out: &mut W,
) -> Result<PlantInfo> {
    let image = load_image(source, max_image_bytes).await?;

    let (info, failure) = match assistant.identify(&image).await {
        Ok(info) => (info, None),
        Err(e) => (PlantInfo::unavailable(), Some(e)),
    };
    let info = info.with_image(image.to_data_url());

    if json {
        write_json(out, &info)?;
    } else {
        write!(out, "{}", render_plant_info(&info))?;
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(info),
    }
}

pub async fn run_search<C: ModelClient, W: Write>(
    assistant: &PlantAssistant<C>,
    query: &str,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let results = assistant.search(query).await?;

    if json {
        write_json(out, &results)?;
    } else {
        write!(out, "{}", render_search_results(query.trim(), &results))?;
    }
    Ok(())
}

/// Sends each message in order; the transcript is printed as it grows, or once as JSON.
pub async fn run_chat_script<C: ModelClient, W: Write>(
    assistant: &PlantAssistant<C>,
    session: &mut ChatSession,
    messages: &[String],
    json: bool,
    out: &mut W,
) -> Result<()> {
    for message in messages {
        let reply = assistant.chat(session, message).await.cloned();
        if json {
            continue;
        }
        if let Some(reply) = reply {
            let now = Utc::now();
            let len = session.messages().len();
            if len >= 2 {
                writeln!(out, "{}", render_message(&session.messages()[len - 2], now))?;
            }
            writeln!(out, "{}", render_message(&reply, now))?;
        }
    }

    if json {
        write_json(out, session.messages())?;
    }
    Ok(())
}

pub async fn run_chat_loop<C, R, W>(
    assistant: &PlantAssistant<C>,
    session: &mut ChatSession,
    reader: R,
    out: &mut W,
) -> Result<()>
where
    C: ModelClient,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Chatting about {}. {}", session.plant_name(), CHAT_HELP)?;
    if session.is_empty() {
        write!(out, "{}", render_suggestions())?;
    } else {
        write!(out, "{}", render_transcript(session.messages(), Utc::now()))?;
    }

    let mut lines = reader.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        let reply = match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                writeln!(out, "{}", CHAT_HELP)?;
                continue;
            }
            "/suggest" => {
                write!(out, "{}", render_suggestions())?;
                continue;
            }
            "/history" => {
                write!(out, "{}", render_transcript(session.messages(), Utc::now()))?;
                continue;
            }
            "/retry" => assistant.retry(session).await.cloned(),
            cmd if cmd.starts_with("/ask") => {
                let question = cmd["/ask".len()..]
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| SUGGESTED_QUESTIONS.get(idx));
                match question {
                    Some(question) => {
                        writeln!(out, "🧑 {}", question)?;
                        assistant.chat(session, question).await.cloned()
                    }
                    None => {
                        writeln!(out, "Pick a question between 1 and {}.", SUGGESTED_QUESTIONS.len())?;
                        continue;
                    }
                }
            }
            cmd if cmd.starts_with('/') => {
                writeln!(out, "Unknown command {}. {}", cmd, CHAT_HELP)?;
                continue;
            }
            text => assistant.chat(session, text).await.cloned(),
        };

        match reply {
            Some(message) => write!(out, "{}", render_message(&message, Utc::now()))?,
            None => writeln!(out, "Nothing to retry.")?,
        }
        if let Some(error) = session.last_error() {
            writeln!(out, "⚠️ {} Type /retry to try again.", error)?;
        }
    }

    Ok(())
}
