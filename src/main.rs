use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dreamweaver::config::DreamConfig;
use dreamweaver::host::{SessionDirectory, StaticProviders};
use dreamweaver::llm::LlmClient;
use dreamweaver::local::{ConsoleDirectory, ConsoleEvent, FileConversationStore, FileRenderer};
use dreamweaver::{DailyTrigger, DreamTheme, DreamWeaver, HostServices};

const LOCAL_ORIGIN: &str = "local:terminal";

#[derive(Parser)]
#[command(name = "dreamweaver")]
#[command(version)]
#[command(about = "Weave a conversation into a dream card", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.dreamweaver/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weave one dream from a conversation file
    Dream(ChatArgs),
    /// Run the daily trigger against a conversation file until Ctrl-C
    Watch(ChatArgs),
    /// Show the effective configuration
    Config {
        /// Write the configuration back to disk with every key filled in
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct ChatArgs {
    /// JSON file holding the conversation history
    #[arg(long)]
    history: PathBuf,

    /// Group name shown on the card
    #[arg(long)]
    group: Option<String>,

    /// Treat the conversation as a private chat
    #[arg(long)]
    private: bool,

    /// Override the configured theme
    #[arg(long)]
    theme: Option<DreamTheme>,

    /// Where rendered cards are written
    #[arg(long, default_value = "dreams")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => DreamConfig::default_path()?,
    };
    let config = DreamConfig::load_from(&config_path)?;

    match cli.command {
        Commands::Config { init } => {
            if init {
                config.save_to(&config_path)?;
                println!("📝 Wrote {}", config_path.display());
            }
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
            Ok(())
        }
        Commands::Dream(args) => {
            let (weaver, event) = build(config, &args);
            weaver.handle_command(&event).await
        }
        Commands::Watch(args) => {
            let (weaver, event) = build(config, &args);
            {
                let mut config = weaver.config().write().await;
                if !config.is_daily_auto() {
                    info!("trigger_mode is '{}'; forcing daily_auto for watch", config.trigger_mode);
                    config.trigger_mode = "daily_auto".to_string();
                }
            }

            let directory: Arc<dyn SessionDirectory> =
                Arc::new(ConsoleDirectory::new(event.as_session()));
            let Some(trigger) = DailyTrigger::start_if_enabled(weaver, Some(directory)).await else {
                return Ok(());
            };

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            trigger.shutdown().await;
            info!("DreamWeaver terminated.");
            Ok(())
        }
    }
}

fn build(mut config: DreamConfig, args: &ChatArgs) -> (DreamWeaver, ConsoleEvent) {
    if let Some(theme) = args.theme {
        config.dream_theme = theme.id().to_string();
    }

    let providers = match LlmClient::new(config.provider.clone()) {
        Ok(client) => StaticProviders::new(Arc::new(client)),
        Err(err) => {
            warn!("{:#}", err);
            StaticProviders::none()
        }
    };

    let host = HostServices {
        conversations: Arc::new(FileConversationStore::new(LOCAL_ORIGIN, &args.history)),
        providers: Arc::new(providers),
        renderer: Arc::new(FileRenderer::new(&args.out)),
    };

    let event = ConsoleEvent::new(LOCAL_ORIGIN, args.group.clone(), args.private);
    let weaver = DreamWeaver::new(Arc::new(RwLock::new(config)), host);
    (weaver, event)
}
