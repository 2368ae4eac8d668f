use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL; rooms live only in memory when unset
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL; catalog responses are not cached when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB v3 API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Origin allowed by CORS; any origin is allowed when unset
    #[serde(default)]
    pub frontend_origin: Option<String>,

    /// Highest discover page a seed may land on
    #[serde(default = "default_max_discover_page")]
    pub max_discover_page: u32,

    /// Movies returned per batch
    #[serde(default = "default_movies_per_batch")]
    pub movies_per_batch: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_max_discover_page() -> u32 {
    300
}

fn default_movies_per_batch() -> usize {
    10
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
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
