use clap::Parser;

use crate::config::Config;

/// Command line overrides applied on top of the environment configuration
#[derive(Debug, Parser)]
pub struct Cli {
    /// Port to listen on (overrides SERVER_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Connect to an already-running WebDriver endpoint instead of spawning
    /// chromedriver (overrides WEBDRIVER_URL)
    #[arg(short, long)]
    pub webdriver_url: Option<String>,
}

impl Cli {
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
            config.manage_chromedriver = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_env_values() {
        let cli = Cli {
            port: Some(8080),
            webdriver_url: Some("http://driver:9515".to_string()),
        };
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.port, 8080);
        assert_eq!(config.webdriver_url, "http://driver:9515");
        assert!(!config.manage_chromedriver);
    }

    #[test]
    fn absent_flags_leave_the_config_alone() {
        let cli = Cli {
            port: None,
            webdriver_url: None,
        };
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.port, 3000);
        assert!(config.manage_chromedriver);
    }
}
