use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use w5boc_core::message::SendMode;
use w5boc_core::wallet::{WalletIdV5R1, MAINNET_GLOBAL_ID, TESTNET_GLOBAL_ID};

pub const NO_EXPIRY: u32 = u32::MAX;
pub const DEFAULT_SEQNO_TIMEOUT_MS: u64 = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config io error ({0})")]
    Io(#[from] std::io::Error),

    #[error("Config parse error ({0})")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value (field: {field}, reason: {reason})")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Logging setup failed ({0})")]
    Logging(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn global_id(&self) -> i32 {
        match self {
            Network::Mainnet => MAINNET_GLOBAL_ID,
            Network::Testnet => TESTNET_GLOBAL_ID,
        }
    }
}

/// Settings of one transfer assembly. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    pub network: Network,
    pub workchain: i8,
    pub subwallet_number: u16,
    /// Unix time after which the message is rejected, `0xFFFFFFFF` for none.
    pub valid_until: u32,
    pub send_mode: u8,
    /// Nanotons sent to the wallet itself.
    pub amount: u64,
    pub bounce: bool,
    pub seqno_timeout_ms: u64,
    pub with_crc32: bool,
    pub log_level: String,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            workchain: 0,
            subwallet_number: 0,
            valid_until: NO_EXPIRY,
            send_mode: (SendMode::PAY_GAS_SEPARATELY | SendMode::IGNORE_ERRORS).bits(),
            amount: 1,
            bounce: true,
            seqno_timeout_ms: DEFAULT_SEQNO_TIMEOUT_MS,
            with_crc32: true,
            log_level: "info".to_string(),
        }
    }
}

impl AssemblerConfig {
    pub fn from_json(config: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(config)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn wallet_id(&self) -> Result<WalletIdV5R1, ConfigError> {
        WalletIdV5R1::new(
            self.network.global_id(),
            self.workchain,
            self.subwallet_number,
        )
        .map_err(|err| ConfigError::InvalidValue {
            field: "subwallet_number",
            reason: err.to_string(),
        })
    }

    pub fn send_mode(&self) -> SendMode {
        SendMode::from(self.send_mode)
    }

    pub fn seqno_timeout(&self) -> Duration {
        Duration::from_millis(self.seqno_timeout_ms)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            field: "log_level",
            reason: err.to_string(),
        })
    }
}
