use tokio::net::TcpListener;
use todo_core::ShareTokenCodec;
use todo_server::{config::Config, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let codec = ShareTokenCodec::new(config.share_secret.as_bytes())?;

    let listener = TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "listening");
    todo_server::run(listener, AppState::in_memory(codec)).await?;
    Ok(())
}
