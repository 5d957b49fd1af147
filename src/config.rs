use serde::{Deserialize, Serialize};
use std::env;

use crate::ancestry::AncestryStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub thread: ThreadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadConfig {
    pub ancestry_strategy: AncestryStrategy,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let ancestry_strategy = match env::var("ANCESTRY_STRATEGY") {
            Ok(value) => AncestryStrategy::parse(&value)
                .ok_or_else(|| anyhow::anyhow!("Unknown ancestry strategy: {}", value))?,
            Err(_) => AncestryStrategy::ClosureTable,
        };

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:social_threads.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            thread: ThreadConfig { ancestry_strategy },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_closure_table() {
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.thread.ancestry_strategy,
            AncestryStrategy::ClosureTable
        );
        assert_eq!(config.server.port, 3000);
    }
}
