//! EOA order signing for sellers and buyers that are not contracts.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use super::ExchangeError;
use crate::order::{signing_digest, ExchangeDomain, OrderComponents};

#[derive(Debug, Clone)]
pub struct OrderSigner {
    inner: PrivateKeySigner,
}

impl OrderSigner {
    pub fn from_key(key: B256) -> Result<Self, ExchangeError> {
        let inner = PrivateKeySigner::from_bytes(&key).map_err(|e| ExchangeError::Signing(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Deterministic key, mostly for tests and the simulator. Seed 0 is not a valid key.
    pub fn from_seed(seed: u64) -> Result<Self, ExchangeError> {
        Self::from_key(B256::from(U256::from(seed).to_be_bytes::<32>()))
    }

    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// 65-byte `r ‖ s ‖ v` signature over the order's EIP-712 digest.
    pub fn sign(&self, components: &OrderComponents, domain: &ExchangeDomain) -> Result<Bytes, ExchangeError> {
        let digest = signing_digest(components, domain);
        let signature = self
            .inner
            .sign_hash_sync(&digest)
            .map_err(|e| ExchangeError::Signing(e.to_string()))?;
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }
}
