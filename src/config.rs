use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL (durable occasion cache)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Planning service API key (empty means the planner is unavailable
    /// and every request is served from the static fallback)
    #[serde(default)]
    pub planner_api_key: String,

    /// Planning service base URL (OpenAI-compatible chat completions)
    #[serde(default = "default_planner_api_url")]
    pub planner_api_url: String,

    /// Planning service model name
    #[serde(default = "default_planner_model")]
    pub planner_model: String,

    /// Marketplace search API key (empty means the provider reports
    /// itself unconfigured and retrieval degrades to the fallback)
    #[serde(default)]
    pub marketplace_api_key: String,

    /// Marketplace search API base URL
    #[serde(default = "default_marketplace_api_url")]
    pub marketplace_api_url: String,

    /// Marketplace identifier sent with each search call
    #[serde(default = "default_marketplace_id")]
    pub marketplace_id: String,

    /// Per-request deadline for external service calls, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_planner_api_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_planner_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_marketplace_api_url() -> String {
    "https://api.ebay.com".to_string()
}

fn default_marketplace_id() -> String {
    "EBAY_US".to_string()
}

fn default_request_timeout_secs() -> u64 {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
