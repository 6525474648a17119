mod collectors;
mod config;
mod format;
mod report;
mod telegram;

use clap::Parser;
use config::Config;
use teloxide::Bot;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "statsbot")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "./config.yaml")]
    config: String,
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match Config::load_from_file(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let token = match ensure_telegram_settings(&cfg) {
        Ok(token) => token,
        Err(err) => {
            error!(error = %err, "telegram settings are incomplete");
            std::process::exit(1);
        }
    };

    info!(trigger = %cfg.trigger(), "starting statsbot");

    let bot = Bot::new(token);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bot_task = {
        let cfg = cfg.clone();
        tokio::spawn(async move {
            telegram::run_bot(bot, cfg, shutdown_rx).await;
        })
    };

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to wait for Ctrl+C");
    }
    info!("received Ctrl+C, shutting down");

    let _ = shutdown_tx.send(true);
    let _ = bot_task.await;
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_token_from_env(env_name: &str) -> Option<String> {
    if let Ok(v) = std::env::var(env_name) {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }
    None
}

fn ensure_telegram_settings(cfg: &Config) -> Result<String, String> {
    if cfg.telegram.allowed_chat_ids.is_empty() {
        return Err(
            "telegram.allowed_chat_ids is empty: list at least one chat id in the config"
                .to_string(),
        );
    }

    let env_name = &cfg.telegram.bot_token_env;
    if let Some(v) = resolve_token_from_env(env_name) {
        return Ok(v);
    }
    if let Some(v) = cfg
        .telegram
        .bot_token
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
    {
        return Ok(v);
    }

    Err(format!(
        "no telegram token found: set '{env_name}' in the environment or telegram.bot_token in the config"
    ))
}
