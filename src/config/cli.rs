use crate::config::settings::{LogFormat, Settings};
use crate::utils::error::{PlantError, Result};
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "plant-assistant")]
#[command(about = "Identify plants from photos, ask about their care, and search for plants")]
pub struct CliConfig {
    /// Gemini API key (defaults to GEMINI_API_KEY / GOOGLE_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Base URL of the generative language API
    #[arg(long)]
    pub api_base: Option<String>,

    /// Model name, e.g. gemini-2.5-flash
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL used to build similar-plant picture links
    #[arg(long)]
    pub image_base: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Identify the plant in an image (file path, '-' for stdin, or a data: URL)
    Identify {
        image: String,

        /// Keep chatting about the identified plant
        #[arg(long)]
        chat: bool,
    },

    /// Ask questions about a plant
    Chat {
        /// Plant name the conversation is about
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Opening assistant message shown before the first question
        #[arg(long)]
        greeting: Option<String>,

        /// Questions to send without an interactive prompt (repeatable)
        #[arg(short, long = "message")]
        messages: Vec<String>,
    },

    /// Search for plants by name, characteristics or location
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

impl CliConfig {
    /// 命令列參數優先於設定檔與環境變數
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(base) = &self.api_base {
            settings.api_base = base.clone();
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(base) = &self.image_base {
            settings.image_base = base.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if self.log_json {
            settings.log_format = LogFormat::Json;
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        // 互動聊天會把提示文字寫到 stdout，JSON 輸出就不再合法
        if self.json && matches!(self.command, Command::Identify { chat: true, .. }) {
            return Err(PlantError::ValidationError {
                message: "--json cannot be combined with identify --chat".to_string(),
            });
        }
        Ok(())
    }
}
