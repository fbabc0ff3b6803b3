use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use ward_core::{PermitSupport, ProtocolConfig, TokenConfig};

pub const DEFAULT_CONFIG_PATH: &str = "ward.toml";
const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

#[derive(Debug, Deserialize, PartialEq)]
pub struct WardConfig {
    pub chain: ChainConfig,
    pub contracts: ContractsConfig,
    /// Present iff the protocol token supports EIP-2612.
    pub permit: Option<PermitConfig>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ChainConfig {
    pub id: u64,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct ContractsConfig {
    pub token: alloy::primitives::Address,
    pub factory: alloy::primitives::Address,
    pub registry: alloy::primitives::Address,
    pub fee_manager: alloy::primitives::Address,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct PermitConfig {
    pub version: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse toml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("missing signer key: set {PRIVATE_KEY_ENV}")]
    MissingKey,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<WardConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: WardConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(config)
}

pub fn signer_key() -> Result<String, ConfigError> {
    env::var(PRIVATE_KEY_ENV).map_err(|_| ConfigError::MissingKey)
}

impl WardConfig {
    pub fn protocol_config(&self) -> ProtocolConfig {
        ProtocolConfig {
            chain_id: self.chain.id,
            token: TokenConfig {
                address: self.contracts.token,
                permit: self.permit.as_ref().map(|p| PermitSupport {
                    version: p.version.clone(),
                }),
            },
            factory: self.contracts.factory,
            registry: self.contracts.registry,
            fee_manager: self.contracts.fee_manager,
        }
    }
}
