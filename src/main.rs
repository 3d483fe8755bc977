mod cli;

use cheerdeck::{config, engine::Engine, server};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting cheerdeck server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let engine = Engine::from_config(&config);

    server::start_server(config, engine).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cheerdeck=debug,tower_http=debug".to_string()
        } else {
            "cheerdeck=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            // Create tokio runtime
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Run { action } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_action(&action, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("cheerdeck {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_action(name: &str, config_path: Option<&std::path::Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let engine = Engine::from_config(&config);

    let key = engine.resolve(name)?;

    tracing::info!("Running action: {}", key);
    let content = engine.run_once(key).await;

    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            print_config_summary(&config);
        }
    }

    Ok(())
}

fn print_config_summary(config: &config::Config) {
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Gemini model: {}", config.gemini.model);
    println!(
        "  Gemini key configured: {}",
        !config.gemini.api_key.is_empty()
    );
    println!(
        "  ElevenLabs key configured: {}",
        !config.elevenlabs.api_key.is_empty()
    );
    println!(
        "  ElevenLabs voice usable: {}",
        config.elevenlabs.usable_voice_id().is_some()
    );
    println!(
        "  Tavus key configured: {}",
        !config.tavus.api_key.is_empty()
    );
    println!(
        "  Poller: every {}s, up to {} attempts",
        config.poller.interval_secs, config.poller.max_attempts
    );
}
