use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::embedding::{DEFAULT_DIMENSION, DEFAULT_MODEL};
use crate::screening::ScreeningSettings;

const DEFAULT_MEMORY_MAX_RECORDS: usize = 100_000;

/// Which vector store backs the index.
#[derive(Debug, Clone)]
pub enum VectorStoreConfig {
    /// Process-local store capped at `max_records`; older sessions are evicted first.
    Memory { max_records: usize },
    Pinecone {
        api_key: String,
        index_host: String,
        namespace: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub vector_store: VectorStoreConfig,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub over_fetch_factor: usize,
    pub max_desired_count: usize,
    pub summary_concurrency: usize,
    pub summary_timeout: Duration,
    pub http_timeout: Duration,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let vector_store = match optional_env("VECTOR_STORE")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => VectorStoreConfig::Memory {
                max_records: parse_env("MEMORY_STORE_MAX_RECORDS", DEFAULT_MEMORY_MAX_RECORDS)?,
            },
            "pinecone" => VectorStoreConfig::Pinecone {
                api_key: require_env("PINECONE_API_KEY")?,
                index_host: require_env("PINECONE_INDEX_HOST")?,
                namespace: optional_env("PINECONE_NAMESPACE").unwrap_or_default(),
            },
            other => bail!("VECTOR_STORE must be 'memory' or 'pinecone', got '{other}'"),
        };

        let config = Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_url: require_env("EMBEDDING_URL")?,
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", DEFAULT_DIMENSION)?,
            vector_store,
            chunk_size: parse_env("CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", 200)?,
            over_fetch_factor: parse_env("OVER_FETCH_FACTOR", 5)?,
            max_desired_count: parse_env("MAX_DESIRED_COUNT", 50)?,
            summary_concurrency: parse_env("SUMMARY_CONCURRENCY", 4)?,
            summary_timeout: Duration::from_secs(parse_env("SUMMARY_TIMEOUT_SECS", 60)?),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 30)?),
            max_upload_bytes: parse_env::<usize>("MAX_UPLOAD_MB", 25)? * 1024 * 1024,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("CHUNK_SIZE must be greater than 0");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.over_fetch_factor == 0 {
            bail!("OVER_FETCH_FACTOR must be at least 1");
        }
        if self.max_desired_count == 0 {
            bail!("MAX_DESIRED_COUNT must be at least 1");
        }
        if let VectorStoreConfig::Memory { max_records: 0 } = self.vector_store {
            bail!("MEMORY_STORE_MAX_RECORDS must be at least 1");
        }
        if self.embedding_dimension == 0 {
            bail!("EMBEDDING_DIMENSION must be greater than 0");
        }
        Ok(())
    }

    pub fn screening_settings(&self) -> ScreeningSettings {
        ScreeningSettings {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            over_fetch_factor: self.over_fetch_factor,
            max_desired_count: self.max_desired_count,
            summary_concurrency: self.summary_concurrency.max(1),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            anthropic_api_key: "key".to_string(),
            embedding_url: "http://localhost:8081".to_string(),
            embedding_model: DEFAULT_MODEL.to_string(),
            embedding_dimension: DEFAULT_DIMENSION,
            vector_store: VectorStoreConfig::Memory {
                max_records: DEFAULT_MEMORY_MAX_RECORDS,
            },
            chunk_size: 1000,
            chunk_overlap: 200,
            over_fetch_factor: 5,
            max_desired_count: 50,
            summary_concurrency: 4,
            summary_timeout: Duration::from_secs(60),
            http_timeout: Duration::from_secs(30),
            max_upload_bytes: 1024,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = Config {
            chunk_overlap: 1000,
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_over_fetch_factor_rejected() {
        let config = Config {
            over_fetch_factor: 0,
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_memory_store_cap_rejected() {
        let config = Config {
            vector_store: VectorStoreConfig::Memory { max_records: 0 },
            ..base()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_screening_settings_carry_over() {
        let settings = Config {
            over_fetch_factor: 3,
            summary_concurrency: 0,
            ..base()
        }
        .screening_settings();
        assert_eq!(settings.over_fetch_factor, 3);
        assert_eq!(settings.chunk_size, 1000);
        assert_eq!(settings.summary_concurrency, 1);
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: usize = parse_env("SCREENER_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }
}
