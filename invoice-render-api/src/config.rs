//! Configuration for the invoice render API.
//!
//! Every knob comes from the environment with a usable default, so a bare
//! `invoice-render-api` starts a managed chromedriver and serves on port
//! 3000. Setting `WEBDRIVER_URL` switches to an externally managed WebDriver
//! endpoint and disables the managed child process.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use invoice_render::{SessionConfig, Viewport};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Secret the `x-api-key` header is compared against; requests are
    /// rejected outright when unset
    pub api_key: Option<String>,
    /// Deployment-wide target page, used when the request carries no `url`
    pub default_target_url: Option<String>,
    pub webdriver_url: String,
    /// Spawn and supervise a chromedriver child process
    pub manage_chromedriver: bool,
    pub settle_ms: u64,
    pub navigation_timeout_secs: u64,
    pub script_timeout_secs: u64,
    /// Hard cap on concurrently in-flight engine sessions; requests past the
    /// cap queue until a session frees up
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_key: None,
            default_target_url: None,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            manage_chromedriver: true,
            settle_ms: 900,
            navigation_timeout_secs: 45,
            script_timeout_secs: 30,
            max_sessions: 4,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let external_webdriver = env::var("WEBDRIVER_URL").ok();
        Config {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("SERVER_PORT", 3000),
            api_key: env::var("GENERATE_PDF_API_KEY").ok(),
            default_target_url: env::var("INVOICE_HTML_URL").ok(),
            manage_chromedriver: external_webdriver.is_none(),
            webdriver_url: external_webdriver.unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            settle_ms: parse_var("SETTLE_MS", 900),
            navigation_timeout_secs: parse_var("NAVIGATION_TIMEOUT_SECS", 45),
            script_timeout_secs: parse_var("SCRIPT_TIMEOUT_SECS", 30),
            max_sessions: parse_var("MAX_SESSIONS", 4),
        }
    }

    /// Session knobs derived from this configuration
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            viewport: Viewport::default(),
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            script_timeout: Duration::from_secs(self.script_timeout_secs),
            settle: Duration::from_millis(self.settle_ms),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
