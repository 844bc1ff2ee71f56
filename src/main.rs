use clap::Parser;
use plant_assistant::app::commands::{run_chat_loop, run_chat_script, run_identify, run_search};
use plant_assistant::config::LogFormat;
use plant_assistant::utils::{logger, validation::Validate};
use plant_assistant::{
    CliConfig, Command, ConfigProvider, GeminiClient, ImageSource, PlantAssistant, PlantError,
    PlantInfo, Settings, TomlConfig,
};
use tokio::io::BufReader;

fn fail(e: &PlantError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

async fn run(
    cli: &CliConfig,
    settings: &Settings,
    assistant: &PlantAssistant<GeminiClient>,
) -> plant_assistant::Result<()> {
    let mut stdout = std::io::stdout();

    match &cli.command {
        Command::Identify { image, chat } => {
            let source = ImageSource::parse(image);
            let info =
                run_identify(assistant, &source, settings.max_image_bytes(), cli.json, &mut stdout)
                    .await?;

            if *chat {
                let mut session = assistant.start_chat(&info);
                let stdin = BufReader::new(tokio::io::stdin());
                run_chat_loop(assistant, &mut session, stdin, &mut stdout).await?;
            }
        }
        Command::Chat {
            name,
            description,
            greeting,
            messages,
        } => {
            let plant = PlantInfo {
                name: name.clone(),
                description: description.clone(),
                care_instructions: Vec::new(),
                image: None,
                similar_plants: Vec::new(),
            };
            let mut session = assistant.start_chat(&plant);
            if let Some(greeting) = greeting {
                session = session.with_greeting(greeting.clone());
            }

            if messages.is_empty() {
                let stdin = BufReader::new(tokio::io::stdin());
                run_chat_loop(assistant, &mut session, stdin, &mut stdout).await?;
            } else {
                run_chat_script(assistant, &mut session, messages, cli.json, &mut stdout).await?;
            }
        }
        Command::Search { query } => {
            run_search(assistant, &query.join(" "), cli.json, &mut stdout).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入設定：預設值 < 設定檔 < 環境變數 < 命令列
    let mut settings = Settings::default();
    if let Some(path) = &cli.config {
        match TomlConfig::from_file(path) {
            Ok(file) => settings.apply_file(&file),
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path.display(), e);
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(e.exit_code());
            }
        }
    }
    settings.apply_env();
    cli.apply_to(&mut settings);

    // 初始化日誌
    match settings.log_format {
        LogFormat::Json => logger::init_json_logger(cli.verbose, settings.log_level.as_deref()),
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, settings.log_level.as_deref()),
    }

    tracing::info!("🚀 Starting plant-assistant");
    tracing::debug!("Resolved settings: {:?}", settings);

    if let Err(e) = cli.validate() {
        fail(&e);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    let assistant = match PlantAssistant::from_config(&settings) {
        Ok(assistant) => assistant,
        Err(e) => fail(&e),
    };

    if let Err(e) = run(&cli, &settings, &assistant).await {
        fail(&e);
    }

    tracing::info!("✅ Done");
    Ok(())
}
