use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection URL of the hosted database
    pub database_url: String,
    /// Base URL of the hosted auth service
    pub supabase_url: String,
    /// Public anon key sent with every auth request
    pub supabase_anon_key: String,
    /// Public origin of the site, used for redirects and the sitemap
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
}

fn default_site_url() -> String {
    "https://eliteinfluencer.in".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Build a configuration from explicit key/value pairs instead of the process environment
    #[cfg(test)]
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(pairs)?)
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Site origin without a trailing slash
    pub fn origin(&self) -> &str {
        self.site_url.trim_end_matches('/')
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    dotenv().ok();

    let config = Config::load()?;

    Ok(config)
}
