// 8.0.2: result types and errors for mob operations.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::exchange::ExchangeError;
use crate::ledger::LedgerError;
use crate::order::OrderError;
use crate::types::{Phase, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub order_hash: B256,
    pub token_id: U256,
    // value attached to the exchange call, before any refund
    pub value: U256,
    // what the mob actually spent
    pub spent: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub balance: U256,
    pub fee: U256,
    pub distributed: U256,
    // rounding remainder, stays with the mob
    pub dust: U256,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MobError {
    #[error("{caller} is not allowed to do this")]
    Unauthorized { caller: Address },

    #[error("wrong phase: expected {expected}, mob is {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("NFT already bought")]
    AlreadyBought,

    #[error("settlement already allocated")]
    AlreadyAllocated,

    #[error("nothing sold yet, no proceeds to allocate")]
    NotSettled,

    #[error("nothing to claim")]
    NothingToClaim,

    #[error("deposit must be greater than zero")]
    ZeroDeposit,

    #[error("insufficient quota: {remaining} remaining, {requested} offered")]
    InsufficientQuota { remaining: U256, requested: U256 },

    #[error("deadline {deadline} passed (now {now})")]
    DeadlinePassed { deadline: Timestamp, now: Timestamp },

    #[error("refunds open only after a failed raise or an expired campaign")]
    RefundUnavailable,

    #[error("nothing raised")]
    NothingRaised,

    #[error("wrong consider.startAmount")]
    BelowFloorPrice,

    // a descending price must not end under the floor either
    #[error("wrong consider.endAmount: {end} below floor {floor}")]
    EndBelowFloorPrice { end: U256, floor: U256 },

    #[error("wrong token: expected {expected}, got {actual}")]
    WrongToken { expected: Address, actual: Address },

    #[error("wrong token id: expected {expected}, got {actual}")]
    WrongTokenId { expected: U256, actual: U256 },

    #[error("only native payments for a single ERC-721 are supported")]
    UnsupportedPurchase,

    #[error("insufficient funds: order needs {required}, mob raised {available}")]
    InsufficientFunds { required: U256, available: U256 },

    #[error("purchased token {token_id} was not received")]
    PurchaseNotReceived { token_id: U256 },

    #[error("resale order must be offered by the mob itself")]
    NotOfferer,

    #[error("resale order must offer exactly the acquired NFT")]
    WrongResaleItem,

    #[error("resale proceeds must go to the mob")]
    WrongProceedsRecipient,

    #[error("resale proceeds must be native or WETH9")]
    UnsupportedProceeds,

    #[error("order hash mismatch: local {local}, exchange {remote}")]
    OrderHashMismatch { local: B256, remote: B256 },

    #[error("mob trades on {expected}, call went to {actual}")]
    ExchangeMismatch { expected: Address, actual: Address },

    #[error("invalid mob parameters: {reason}")]
    InvalidParameters { reason: String },

    #[error("amount overflow")]
    Overflow,

    #[error("exchange: {0}")]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
