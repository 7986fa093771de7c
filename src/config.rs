use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub transfer_max_retries: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            transfer_max_retries: env::var("TRANSFER_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_applies_defaults() {
        env::set_var("DATABASE_URL", "postgres://localhost/ledger");
        env::remove_var("DATABASE_MAX_CONNECTIONS");
        env::remove_var("TRANSFER_MAX_RETRIES");

        let config = Config::from_env().unwrap();
        assert_eq!(config.database_url, "postgres://localhost/ledger");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.transfer_max_retries, 3);
    }
}
