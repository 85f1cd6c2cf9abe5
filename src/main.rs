use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use hotswap_bot::domain::traits::{Bot, RemoteRegistry};
use hotswap_bot::infrastructure::adapters::{ConsoleAdapter, LoggingRegistry, TelegramAdapter};
use hotswap_bot::infrastructure::config::{mask_token, AdapterChoice, Config};
use hotswap_bot::infrastructure::plugins::{PluginFileIndex, PluginLoader};
use hotswap_bot::BotHost;

#[derive(Parser)]
#[command(name = "hotswap-bot")]
#[command(about = "A chat bot with hot-reloadable plugins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
    /// List plugin files and the commands they declare
    Plugins,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_bot(&cli.config, cli.token) {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("hotswap-bot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
        Commands::Plugins => {
            list_plugins(&load_config(&cli.config));
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if Path::new(config_path).exists() {
        match Config::load(config_path) {
            Ok(mut config) => {
                config.apply_env();
                config
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Config::load_env()
            }
        }
    } else {
        Config::load_env()
    }
}

fn run_bot(config_path: &str, token_override: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path);
    config.validate()?;

    tracing::info!("Starting hotswap-bot: {}", config.bot.name);
    tracing::info!(
        "Watching {} for *.{} every {}ms",
        config.plugins.directory.display(),
        config.plugins.extension,
        config.plugins.poll_interval_ms
    );

    let rt = tokio::runtime::Runtime::new()?;

    // Select adapter
    let host = match config.select_adapter(token_override)? {
        AdapterChoice::Telegram(token) => {
            tracing::info!("Using Telegram token {}", mask_token(&token));
            let bot = TelegramAdapter::new(token);
            let registry: Arc<dyn RemoteRegistry> = Arc::new(bot.registry());
            BotHost::new(config, Box::new(bot) as Box<dyn Bot>, registry)
        }
        AdapterChoice::Console => {
            tracing::info!("No bot token found, running in console mode");
            let registry: Arc<dyn RemoteRegistry> = Arc::new(LoggingRegistry::new());
            BotHost::new(config, Box::new(ConsoleAdapter::new()) as Box<dyn Bot>, registry)
        }
    };

    rt.block_on(host.run())?;
    Ok(())
}

fn list_plugins(config: &Config) {
    let plugins = &config.plugins;
    let index = PluginFileIndex::new(&plugins.directory, plugins.extension.as_str());
    let loader = PluginLoader::new(&plugins.directory, plugins.extension.as_str());

    let snapshot = match index.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Failed to read {}: {}", plugins.directory.display(), e);
            return;
        }
    };

    if snapshot.is_empty() {
        println!("No plugins in {}", plugins.directory.display());
        return;
    }

    for name in snapshot.keys() {
        match loader.read_manifest(name) {
            Ok(manifest) => {
                let app: Vec<String> = manifest.app_commands.iter().map(|c| format!("/{}", c.name)).collect();
                let prefix: Vec<&str> = manifest.prefix_commands.iter().map(|c| c.name.as_str()).collect();
                println!("{} [{:?}, {}]", name, manifest.kind, manifest.scope());
                if let Some(description) = &manifest.description {
                    println!("  {}", description);
                }
                if !app.is_empty() {
                    println!("  app commands: {}", app.join(", "));
                }
                if !prefix.is_empty() {
                    println!("  prefix commands: {}", prefix.join(", "));
                }
            }
            Err(e) => println!("{} [invalid: {}]", name, e),
        }
    }
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => eprintln!("Failed to render config: {}", e),
    }
}
