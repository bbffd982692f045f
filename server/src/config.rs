use clap::Parser;
use std::time::Duration;

/// Server configuration from flags, falling back to environment variables.
#[derive(Parser, Debug, Clone)]
#[command(name = "server", about = "Serve movie recommendations over HTTP")]
pub struct Config {
    /// Index directory path
    #[arg(long, env = "INDEX_DIR", default_value = "./index")]
    pub index: String,
    /// Host to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
    /// Results per request when the client does not ask for a count
    #[arg(long, default_value_t = 10)]
    pub default_k: usize,
    /// Upper bound on results per request
    #[arg(long, default_value_t = 100)]
    pub max_k: usize,
    /// Comma-separated allowed origins; any origin when unset
    #[arg(long, env = "CORS_ALLOW_ORIGIN")]
    pub cors_allow_origin: Option<String>,
    /// TMDB API key; poster lookup is disabled without it
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    pub tmdb_api_key: Option<String>,
    #[arg(long, env = "TMDB_BASE_URL", default_value = "https://api.themoviedb.org/3")]
    pub tmdb_base_url: String,
    #[arg(long, env = "TMDB_IMAGE_URL", default_value = "https://image.tmdb.org/t/p/w500")]
    pub tmdb_image_url: String,
    /// Per-request timeout for poster lookups
    #[arg(long, default_value_t = 3000)]
    pub poster_timeout_ms: u64,
}

impl Config {
    pub fn limits(&self) -> Limits {
        Limits { default_k: self.default_k, max_k: self.max_k.max(1) }
    }

    pub fn poster_timeout(&self) -> Duration {
        Duration::from_millis(self.poster_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub default_k: usize,
    pub max_k: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { default_k: 10, max_k: 100 }
    }
}

impl Limits {
    /// Requested count, or the default, kept within `1..=max_k`.
    pub fn clamp(&self, k: Option<usize>) -> usize {
        k.unwrap_or(self.default_k).clamp(1, self.max_k.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_requested_counts() {
        let limits = Limits { default_k: 10, max_k: 20 };
        assert_eq!(limits.clamp(None), 10);
        assert_eq!(limits.clamp(Some(0)), 1);
        assert_eq!(limits.clamp(Some(5)), 5);
        assert_eq!(limits.clamp(Some(500)), 20);
    }

    #[test]
    fn parses_flags() {
        let config = Config::try_parse_from(["server", "--index", "/tmp/idx", "--port", "9000", "--max-k", "0"]).unwrap();
        assert_eq!(config.index, "/tmp/idx");
        assert_eq!(config.port, 9000);
        assert_eq!(config.limits().max_k, 1);
    }
}
