use std::net::SocketAddr;

use anyhow::Context;
use quotehub_market_data::MarketDataConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub log_format: LogFormat,
    pub market_data: MarketDataConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_allow: vec!["*".to_string()],
            log_format: LogFormat::Text,
            market_data: MarketDataConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("QUOTEHUB_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid QUOTEHUB_LISTEN_ADDR")?;
        let cors_allow = std::env::var("QUOTEHUB_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let log_format = match std::env::var("QUOTEHUB_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Ok(Self {
            listen_addr,
            cors_allow,
            log_format,
            market_data: MarketDataConfig::from_env(),
        })
    }
}
