use anyhow::anyhow;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://store.db";

/// Runtime settings read from the environment (and `.env` via `dotenv`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite connection string
    pub database_url: String,

    /// Interface the HTTP surface binds to
    pub host: String,

    /// Port the HTTP surface listens on
    pub port: u16,
}

impl Config {
    /// Loads `DATABASE_URL`, `SERVER_HOST` and `SERVER_PORT`.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow!("Invalid SERVER_PORT"))?;

        Ok(Config {
            database_url,
            host,
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
