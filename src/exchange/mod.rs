//! External exchange adapter.
//!
//! The mob never settles trades itself. It hashes orders, forwards purchases
//! with value attached, and authorizes resale orders through this narrow
//! surface. [`SimulatedSeaport`] is an in-memory stand-in that behaves like
//! Seaport 1.1 for the single-NFT flows the mob uses.

mod seaport;
mod signer;

pub use seaport::SimulatedSeaport;
pub use signer::OrderSigner;

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::ledger::{Ledger, LedgerError};
use crate::order::{BasicOrderParameters, ExchangeDomain, ItemType, Order, OrderComponents, OrderError};

/// `bytes4(keccak256("isValidSignature(bytes32,bytes)"))`
pub const EIP1271_MAGIC_VALUE: FixedBytes<4> = FixedBytes([0x16, 0x26, 0xba, 0x7e]);

/// Returned by a contract signer that does not recognise the digest.
pub const EIP1271_INVALID: FixedBytes<4> = FixedBytes([0xff, 0xff, 0xff, 0xff]);

/// Placeholder signature a mob attaches to its own resale orders: ASCII "0x42".
pub const MAGIC_SIGNATURE: [u8; 4] = *b"0x42";

pub fn magic_signature() -> Bytes {
    Bytes::from_static(&MAGIC_SIGNATURE)
}

/// Lookup of contract accounts able to answer EIP-1271 `isValidSignature`.
pub trait SignatureVerifier {
    /// `None` when `signer` is not a contract, otherwise whether it accepts the signature.
    fn contract_signature(&self, signer: Address, digest: B256, signature: &Bytes) -> Option<bool>;
}

/// Every signer is an EOA.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContracts;

impl SignatureVerifier for NoContracts {
    fn contract_signature(&self, _signer: Address, _digest: B256, _signature: &Bytes) -> Option<bool> {
        None
    }
}

/// Host state an exchange call runs against.
pub struct CallContext<'a> {
    pub ledger: &'a mut Ledger,
    pub contracts: &'a dyn SignatureVerifier,
}

impl<'a> CallContext<'a> {
    pub fn new(ledger: &'a mut Ledger, contracts: &'a dyn SignatureVerifier) -> Self {
        Self { ledger, contracts }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatus {
    pub is_validated: bool,
    pub is_cancelled: bool,
    pub total_filled: U256,
    pub total_size: U256,
}

impl OrderStatus {
    pub fn is_filled(&self) -> bool {
        !self.total_size.is_zero() && self.total_filled >= self.total_size
    }
}

/// Call surface of the order-settlement protocol.
pub trait Exchange {
    fn address(&self) -> Address;

    fn domain(&self) -> &ExchangeDomain;

    fn get_counter(&self, offerer: Address) -> U256;

    fn get_order_hash(&self, components: &OrderComponents) -> B256;

    fn get_order_status(&self, order_hash: B256) -> OrderStatus;

    /// Marks orders as signed off so they can be filled without a signature.
    /// Signatures are skipped when `caller` is the offerer.
    fn validate(&mut self, ctx: &mut CallContext<'_>, caller: Address, orders: &[Order]) -> Result<bool, ExchangeError>;

    fn fulfill_basic_order(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        params: &BasicOrderParameters,
        value: U256,
    ) -> Result<bool, ExchangeError>;

    fn fulfill_order(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        order: &Order,
        fulfiller_conduit_key: B256,
        value: U256,
    ) -> Result<bool, ExchangeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("order is not active: now {now}, window [{start}, {end})")]
    InvalidTime { now: U256, start: U256, end: U256 },

    #[error("order {0} is cancelled")]
    OrderIsCancelled(B256),

    #[error("order {0} is already filled")]
    OrderAlreadyFilled(B256),

    #[error("restricted order {0} can only be filled by its offerer or zone")]
    InvalidRestrictedOrder(B256),

    #[error("signature does not recover to the offerer")]
    InvalidSigner,

    #[error("malformed signature")]
    InvalidSignature,

    #[error("contract offerer rejected the signature")]
    BadContractSignature,

    #[error("insufficient ether supplied: required {required}, supplied {supplied}")]
    InsufficientEtherSupplied { required: U256, supplied: U256 },

    #[error("native items cannot be offered")]
    InvalidNativeOfferItem,

    #[error("unsupported item type {0:?}")]
    UnsupportedItemType(ItemType),

    #[error("unsupported basic order type {0}")]
    UnsupportedBasicOrderType(u8),

    #[error("consideration has fewer items than totalOriginalConsiderationItems")]
    MissingOriginalConsiderationItems,

    #[error("only the offerer or zone may cancel")]
    InvalidCanceller,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("amount overflow")]
    Overflow,

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
