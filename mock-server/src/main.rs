use mock_server::BackendConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let config = BackendConfig::from_env();
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, admin = %config.login_id, "mock ad admin backend listening");
    mock_server::run_with(listener, config).await
}
