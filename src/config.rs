/*
 * Responsibility
 * - Load settings from the environment (.env supported via dotenvy)
 * - Validate startup-critical values (PORT, timeouts, base URL)
 * - Lark app identity stays optional here: a missing id/secret is reported
 *   per call as a configuration error instead of refusing to boot
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_LARK_BASE_URL: &str = "https://open.larksuite.com";

/// Settings for talking to the Lark open platform.
#[derive(Clone)]
pub struct LarkConfig {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub base_url: url::Url,
    pub request_timeout: Duration,
}

// The secret must never end up in logs.
impl fmt::Debug for LarkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LarkConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub lark: LarkConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = match std::env::var("PORT") {
            Ok(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 3001,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = split_origins(
            &std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
        );

        let base_url = std::env::var("LARK_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_LARK_BASE_URL.to_string());
        let base_url =
            url::Url::parse(&base_url).map_err(|_| ConfigError::Invalid("LARK_BASE_URL"))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid("LARK_BASE_URL"));
        }

        let request_timeout_secs: u64 = match std::env::var("LARK_REQUEST_TIMEOUT_SECS") {
            Ok(s) => s
                .trim()
                .parse()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::Invalid("LARK_REQUEST_TIMEOUT_SECS"))?,
            Err(_) => 10,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            lark: LarkConfig {
                app_id: non_empty_var("LARK_APP_ID"),
                app_secret: non_empty_var("LARK_APP_SECRET"),
                base_url,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
