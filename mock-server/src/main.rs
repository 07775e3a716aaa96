use serde::Deserialize;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Bind address, from `MOCK_HOST` / `MOCK_PORT`.
#[derive(Debug, Deserialize)]
struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    host: String,
    #[serde(default = "ServerSettings::default_port")]
    port: u16,
}

impl ServerSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        3000
    }

    fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("MOCK"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = ServerSettings::load()?;
    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock backend listening");
    mock_server::run(listener).await?;
    Ok(())
}
