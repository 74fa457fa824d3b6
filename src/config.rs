use std::path::PathBuf;

use crate::credentials::Credentials;

pub const TESTNET_FAPI_BASE: &str = "https://testnet.binancefuture.com";
pub const LIVE_FAPI_BASE: &str = "https://fapi.binance.com";

/// Process configuration, built once in `main` and passed down by reference.
#[derive(Clone, Debug)]
pub struct Config {
    pub testnet: bool,
    pub fapi_base: String,
    /// API_KEY / API_SECRET from the process environment; wins over the `.env` file.
    pub env_credentials: Option<Credentials>,
    /// `.env`-style file holding API_KEY / API_SECRET.
    pub env_path: PathBuf,
    pub log_path: PathBuf,
    pub recv_window_ms: u64,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let testnet = std::env::var("BINANCE_TESTNET").map(|v| parse_flag(&v)).unwrap_or(true);
        let default_base = if testnet { TESTNET_FAPI_BASE } else { LIVE_FAPI_BASE };
        Self {
            testnet,
            fapi_base: std::env::var("BINANCE_FAPI_BASE").unwrap_or_else(|_| default_base.to_string()),
            env_credentials: match (std::env::var("API_KEY"), std::env::var("API_SECRET")) {
                (Ok(key), Ok(secret)) => Credentials::new(&key, &secret).ok(),
                _ => None,
            },
            env_path: std::env::var("ENV_FILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(".env")),
            log_path: std::env::var("LOG_FILE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("bot.log")),
            recv_window_ms: std::env::var("RECV_WINDOW_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
        }
    }

    pub fn network_name(&self) -> &'static str {
        if self.testnet { "testnet" } else { "mainnet" }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            testnet: true,
            fapi_base: TESTNET_FAPI_BASE.to_string(),
            env_credentials: None,
            env_path: PathBuf::from(".env"),
            log_path: PathBuf::from("bot.log"),
            recv_window_ms: 5000,
            http_timeout_secs: 10,
        }
    }
}

fn parse_flag(v: &str) -> bool {
    !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("False"));
        assert!(!parse_flag(" no "));
    }

    #[test]
    fn test_default_points_at_testnet() {
        let cfg = Config::default();
        assert!(cfg.testnet);
        assert_eq!(cfg.fapi_base, TESTNET_FAPI_BASE);
        assert_eq!(cfg.network_name(), "testnet");
        assert_eq!(cfg.recv_window_ms, 5000);
    }
}
