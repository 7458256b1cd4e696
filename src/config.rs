// 7.0 config.rs: all settings in one place. chain, exchange domain, fees, mob policies, logging.
// 7.1 policies cover the two places where deployed variants disagreed: purchase value and fee base.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::order::{DOMAIN_NAME, DOMAIN_VERSION};
use crate::types::Bps;

pub const SEAPORT_1_1: Address = address!("00000000006c3852cbef3e08e8df289169ede581");
pub const WETH9_MAINNET: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
pub const WETH9_GOERLI: Address = address!("b4fbf271143f4fbf7b91a5ded31805e42b2208d6");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    // Wrapped native token new mobs are pointed at, if any
    pub weth9: Option<Address>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            weth9: None,
        }
    }
}

/** 7.2: exchange address and its EIP-712 domain. must match the deployed exchange byte for byte */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub address: Address,
    pub domain_name: String,
    pub domain_version: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            address: SEAPORT_1_1,
            domain_name: DOMAIN_NAME.to_string(),
            domain_version: DOMAIN_VERSION.to_string(),
        }
    }
}

/// What the settlement fee is charged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBase {
    /// The whole balance at allocation time.
    #[default]
    Gross,
    /// Only the part of the balance above the raised principal.
    Profit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    // Registry fee rate at deployment
    pub default_fee_bps: u16,
    // Upper bound the registry owner can set
    pub max_fee_bps: u16,
    pub fee_base: FeeBase,
    // Receives fees at allocation. None means the registry owner
    pub fee_recipient: Option<Address>,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            default_fee_bps: 0,
            max_fee_bps: 1_000, // 10%
            fee_base: FeeBase::Gross,
            fee_recipient: None,
        }
    }
}

/// How `authorize_resale` gets a resale order accepted by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResaleMode {
    /// Mark orders validated on the exchange.
    #[default]
    Validate,
    /// Register signing digests inside the mob for EIP-1271.
    Register,
}

/// Value attached to a purchase call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseValuePolicy {
    /// Native total the order itself demands.
    #[default]
    OrderTotal,
    /// The full raise; the exchange refunds the excess.
    RaisedAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MobPolicy {
    pub resale_mode: ResaleMode,
    pub purchase_value: PurchaseValuePolicy,
    // Check ledger ownership of the bought token after a purchase
    pub verify_purchase: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    // EnvFilter directive, RUST_LOG wins when set
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Installs the global subscriber. Only binaries should call this.
    pub fn init(&self) -> Result<(), ConfigError> {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| ConfigError::InvalidLogging { reason: e.to_string() })?;
        let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
        let installed = if self.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        installed.map_err(|e| ConfigError::InvalidLogging { reason: e.to_string() })
    }
}

// The complete protocol configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub chain: ChainConfig,
    pub exchange: ExchangeConfig,
    pub fees: FeeConfig,
    pub policy: MobPolicy,
    pub logging: LoggingConfig,
    // Per-contract event retention
    pub max_events: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            exchange: ExchangeConfig::default(),
            fees: FeeConfig::default(),
            policy: MobPolicy::default(),
            logging: LoggingConfig::default(),
            max_events: 10_000,
        }
    }
}

impl ProtocolConfig {
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.chain.chain_id = 5;
        config.chain.weth9 = Some(WETH9_GOERLI);
        config.fees.default_fee_bps = 100; // 1%
        config
    }

    pub fn mainnet() -> Self {
        let mut config = Self::default();
        config.chain.chain_id = 1;
        config.chain.weth9 = Some(WETH9_MAINNET);
        config.fees.default_fee_bps = 250; // 2.5%
        config.policy.verify_purchase = true;
        config.logging.json = true;
        config
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse { reason: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn default_fee_rate(&self) -> Result<Bps, ConfigError> {
        Bps::new(self.fees.default_fee_bps).ok_or_else(|| ConfigError::InvalidFees {
            reason: format!("{} bps is above 100%", self.fees.default_fee_bps),
        })
    }

    pub fn max_fee_rate(&self) -> Result<Bps, ConfigError> {
        Bps::new(self.fees.max_fee_bps).ok_or_else(|| ConfigError::InvalidFees {
            reason: format!("{} bps is above 100%", self.fees.max_fee_bps),
        })
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.chain_id == 0 {
            return Err(ConfigError::InvalidChain {
                reason: "chain id must be non-zero".to_string(),
            });
        }

        if self.exchange.address == Address::ZERO {
            return Err(ConfigError::InvalidExchange {
                reason: "exchange address is zero".to_string(),
            });
        }
        if self.exchange.domain_name.is_empty() || self.exchange.domain_version.is_empty() {
            return Err(ConfigError::InvalidExchange {
                reason: "EIP-712 domain name and version are required".to_string(),
            });
        }

        let max = self.max_fee_rate()?;
        if self.default_fee_rate()? > max {
            return Err(ConfigError::InvalidFees {
                reason: "default fee rate exceeds max fee rate".to_string(),
            });
        }

        if self.max_events == 0 {
            return Err(ConfigError::InvalidLogging {
                reason: "max_events must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid chain config: {reason}")]
    InvalidChain { reason: String },

    #[error("invalid exchange config: {reason}")]
    InvalidExchange { reason: String },

    #[error("invalid fee config: {reason}")]
    InvalidFees { reason: String },

    #[error("invalid logging config: {reason}")]
    InvalidLogging { reason: String },

    #[error("cannot parse config: {reason}")]
    Parse { reason: String },

    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> ProtocolConfig {
        match self {
            Environment::Development => ProtocolConfig::default(),
            Environment::Testnet => ProtocolConfig::testnet(),
            Environment::Mainnet => ProtocolConfig::mainnet(),
        }
    }
}
