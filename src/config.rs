//! Configuration for Mongo Viewer
//!
//! CLI arguments and environment variable handling using clap.
//! A `.env` file is loaded by `main` before parsing, so every option can
//! come from the environment.

use clap::Parser;
use std::net::SocketAddr;

/// Mongo Viewer - browse any MongoDB collection without a schema
#[derive(Parser, Debug, Clone)]
#[command(name = "mongo-viewer")]
#[command(about = "Schema-less MongoDB browser with a single shared connection")]
#[command(version)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Port override (replaces the port of LISTEN when set)
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Default MongoDB connection URI, used when a connect request omits one
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// Database name for browsing (defaults to the URI's database, then "test")
    #[arg(long, env = "MONGODB_DB")]
    pub mongodb_db: Option<String>,

    /// Connection URI of the dedicated insert target
    /// Inserts fail with a configuration error when this is not set
    #[arg(long, env = "PERSONAL_DB_URI")]
    pub personal_db_uri: Option<String>,

    /// Database name of the dedicated insert target
    #[arg(long, env = "PERSONAL_DB_NAME")]
    pub personal_db_name: Option<String>,

    /// Server selection and connect timeout for store calls, in milliseconds
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value = "3000")]
    pub store_timeout_ms: u64,

    /// Connect to MONGODB_URI at startup instead of waiting for a connect request
    #[arg(long, env = "CONNECT_ON_START", default_value = "false")]
    pub connect_on_start: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

impl Args {
    /// Effective listen address (PORT wins over the port in LISTEN)
    pub fn listen_addr(&self) -> SocketAddr {
        match self.port {
            Some(port) => SocketAddr::new(self.listen.ip(), port),
            None => self.listen,
        }
    }

    /// Insert target URI, treating an empty value as unset
    pub fn personal_db_uri(&self) -> Option<&str> {
        self.personal_db_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.mongodb_uri.trim().is_empty() {
            return Err("MONGODB_URI must not be empty".to_string());
        }

        if self.store_timeout_ms == 0 {
            return Err("STORE_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}
