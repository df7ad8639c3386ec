use anyhow::Result;
use code_extractor::mcp::server::McpServer;
use code_extractor::SearchConfig;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CONFIG_DIR_NAME: &str = "code-extractor-mcp";

/// Load the first .env found:
/// 1. Current working directory (project-specific config)
/// 2. XDG config directory ~/.config/code-extractor-mcp/.env
///
/// Variables already set in the shell take priority over both.
fn load_env_files() {
    let candidates = std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".env"))
        .into_iter()
        .chain(xdg_config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(".env")));

    for path in candidates {
        if path.exists() && dotenv::from_path(&path).is_ok() {
            tracing::debug!("Loaded .env from: {}", path.display());
            return;
        }
    }

    tracing::debug!("No .env file found, using environment variables only");
}

/// XDG config directory, falling back to ~/.config
fn xdg_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_files();

    // Logs go to stderr; stdout carries the protocol
    let env_filter = EnvFilter::try_from_env("RUST_LOG")
        .unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();

    tracing::info!("Starting code extractor MCP server...");

    let server = McpServer::new(SearchConfig::from_env())?;
    server.start().await?;

    Ok(())
}
