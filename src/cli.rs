use clap::Parser;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "collection-gateway")]
#[command(about = "Document CRUD gateway: REST endpoints per collection behind Basic auth")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Address to bind (overrides HOST)")]
    pub host: Option<String>,

    #[arg(short, long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, value_delimiter = ',', help = "Comma-separated collection names (overrides COLLECTIONS)")]
    pub collections: Option<Vec<String>>,

    #[arg(long, help = "Use the in-process store instead of DATABASE_URL")]
    pub memory: bool,
}

impl Cli {
    /// Command-line flags take precedence over the environment
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.api.host = host.clone();
        }
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(collections) = &self.collections {
            config.api.collections = collections
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
    }
}
