//! Crate-level error. Each module keeps its own enum; this one only aggregates.

use crate::config::ConfigError;
use crate::exchange::ExchangeError;
use crate::ledger::LedgerError;
use crate::mob::MobError;
use crate::order::OrderError;
use crate::registry::RegistryError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Mob(#[from] MobError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl Error {
    /// The mob-level reason, looking through registry wrapping.
    pub fn as_mob_error(&self) -> Option<&MobError> {
        match self {
            Error::Mob(e) | Error::Registry(RegistryError::Mob(e)) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
