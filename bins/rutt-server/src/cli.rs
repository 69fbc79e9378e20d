use clap::Parser;

use rutt_engine::RuttConfig;

use crate::error::ServerError;

#[derive(Parser, Clone, Debug, Default)]
#[command(name = "rutt-server", about = "Correlation tracking endpoint")]
pub struct Cli {
    /// Path to TOML configuration file. Defaults apply when absent.
    #[arg(long, env = "RUTT_CONFIG")]
    pub config: Option<String>,

    /// HTTP port, overrides `api_port`.
    #[arg(long, env = "RUTT_PORT")]
    pub port: Option<u16>,

    /// Store connection string, overrides `[store] url`.
    #[arg(long, env = "RUTT_STORE_URL")]
    pub store_url: Option<String>,
}

impl Cli {
    /// File configuration (or defaults) with command-line overrides applied.
    pub fn resolve(&self) -> Result<RuttConfig, ServerError> {
        let mut config = match &self.config {
            Some(path) => RuttConfig::load(path)?,
            None => RuttConfig::default(),
        };
        if let Some(port) = self.port {
            config.api_port = port;
        }
        if let Some(url) = &self.store_url {
            config.store.url = url.clone();
        }
        Ok(config)
    }
}
