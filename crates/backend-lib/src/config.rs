// ============================
// coachcall-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory for the flat-file ledger
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
    /// Optional JSON file seeding the in-memory account store
    pub accounts_file: Option<PathBuf>,
    /// Fee-bypass window: further calls to the same trainer are free
    /// this many hours after a payment
    pub fee_bypass_hours: u64,
    /// Outbound event buffer per connection
    pub ws_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            accounts_file: None,
            fee_bypass_hours: 24,
            ws_buffer: 32,
        }
    }
}

impl Settings {
    /// Load settings from `config/default.*` merged with
    /// `COACHCALL_`-prefixed environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from("config/default")
    }

    /// Load settings with an explicit config file base path
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("COACHCALL"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn bypass_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.fee_bypass_hours as i64)
    }
}
