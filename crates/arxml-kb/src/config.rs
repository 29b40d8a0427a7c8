//! Configuration for the import pipeline and the Neo4j connection
//!
//! Both structs start from their defaults and are overridden by environment
//! variables. A `.env` file in the working directory is honored.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Labels that get `uuid` and `name` indexes unless overridden.
pub const DEFAULT_INDEXED_LABELS: &[&str] = &[
    "AR_PACKAGE",
    "APPLICATION_SW_COMPONENT_TYPE",
    "COMPOSITION_SW_COMPONENT_TYPE",
    "SW_COMPONENT_PROTOTYPE",
    "P_PORT_PROTOTYPE",
    "R_PORT_PROTOTYPE",
    "PR_PORT_PROTOTYPE",
    "SENDER_RECEIVER_INTERFACE",
    "CLIENT_SERVER_INTERFACE",
    "VARIABLE_DATA_PROTOTYPE",
    "ASSEMBLY_SW_CONNECTOR",
    "DELEGATION_SW_CONNECTOR",
    "SWC_INTERNAL_BEHAVIOR",
    "RUNNABLE_ENTITY",
    "ECU_INSTANCE",
];

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Maximum rows per batched write statement
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Labels indexed on `uuid` and `name`
    #[serde(default = "default_indexed_labels")]
    pub indexed_labels: Vec<String>,
}

fn default_batch_size() -> usize {
    500
}

fn default_indexed_labels() -> Vec<String> {
    DEFAULT_INDEXED_LABELS.iter().map(|s| s.to_string()).collect()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            indexed_labels: default_indexed_labels(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(batch_size) = env::var("ARXML_IMPORT_BATCH_SIZE") {
            match batch_size.parse::<usize>() {
                Ok(size) if size > 0 => config.batch_size = size,
                _ => warn!("Invalid ARXML_IMPORT_BATCH_SIZE value: {}", batch_size),
            }
        }

        if let Ok(labels) = env::var("ARXML_INDEXED_LABELS") {
            let parsed = parse_label_list(&labels);
            if parsed.is_empty() {
                warn!("Invalid ARXML_INDEXED_LABELS value: {}", labels);
            } else {
                config.indexed_labels = parsed;
            }
        }

        config
    }
}

fn parse_label_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration for Neo4j connection
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: usize,
    pub connection_retry_count: u32,
    pub connection_retry_delay: Duration,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "neo4j://localhost:7687".to_string(),
            username: "neo4j".to_string(),
            password: "password".to_string(),
            database: None,
            pool_size: 10,
            connection_retry_count: 3,
            connection_retry_delay: Duration::from_secs(2),
        }
    }
}

impl Neo4jConfig {
    /// Reads `NEO4J_URI`, `NEO4J_USERNAME`, `NEO4J_PASSWORD`,
    /// `NEO4J_DATABASE` and `NEO4J_POOL_SIZE`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(uri) = env::var("NEO4J_URI") {
            config.uri = uri;
        }
        if let Ok(username) = env::var("NEO4J_USERNAME") {
            config.username = username;
        }
        if let Ok(password) = env::var("NEO4J_PASSWORD") {
            config.password = password;
        }
        if let Ok(database) = env::var("NEO4J_DATABASE") {
            if !database.is_empty() {
                config.database = Some(database);
            }
        }
        if let Ok(pool_size) = env::var("NEO4J_POOL_SIZE") {
            if let Ok(size) = pool_size.parse::<usize>() {
                config.pool_size = size;
            } else {
                warn!("Invalid NEO4J_POOL_SIZE value: {}", pool_size);
            }
        }
        if let Ok(retries) = env::var("NEO4J_CONNECTION_RETRIES") {
            if let Ok(count) = retries.parse::<u32>() {
                config.connection_retry_count = count.max(1);
            } else {
                warn!("Invalid NEO4J_CONNECTION_RETRIES value: {}", retries);
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_config_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 500);
        assert!(config.indexed_labels.contains(&"R_PORT_PROTOTYPE".to_string()));
    }

    #[test]
    fn test_parse_label_list_skips_blanks() {
        assert_eq!(parse_label_list(" A , ,B,"), vec!["A".to_string(), "B".to_string()]);
        assert!(parse_label_list(" , ").is_empty());
    }

    #[test]
    fn test_import_config_deserializes_with_defaults() {
        let config: ImportConfig = serde_json::from_str(r#"{"batch_size": 10}"#).unwrap();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.indexed_labels.len(), DEFAULT_INDEXED_LABELS.len());
    }
}
