// 1.0: all the primitives live here. ids, timestamps, basis points, lifecycle phases.
// on-chain values stay U256/Address from alloy; these newtypes cover the rest.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sequential id assigned by the registry. First mob is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MobId(pub u64);

impl fmt::Display for MobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mob#{}", self.0)
    }
}

// 1.1: unix timestamp in seconds, same unit as block.timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn plus(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    pub fn as_u256(&self) -> U256 {
        U256::from(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.2: basis points. 100 bps = 1%, 10_000 bps = 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Bps(u16);

impl Bps {
    pub const DENOMINATOR: u16 = 10_000;

    #[must_use]
    pub fn new(bps: u16) -> Option<Self> {
        (bps <= Self::DENOMINATOR).then_some(Self(bps))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }

    /// `amount * bps / 10_000`, rounded down. Never overflows since bps <= 10_000.
    pub fn apply(&self, amount: U256) -> U256 {
        let bps = U256::from(self.0);
        let denominator = U256::from(Self::DENOMINATOR);
        match amount.checked_mul(bps) {
            Some(scaled) => scaled / denominator,
            None => amount / denominator * bps,
        }
    }
}

impl fmt::Display for Bps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// Which token ids a mob accepts from its target collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetMode {
    /// Only the configured token id.
    Restrict,
    /// Any token id of the collection.
    FullOpen,
}

// 1.3: lifecycle phases. ordering matters: phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Raising,
    RaiseSuccess,
    NftBought,
    CanClaim,
    AllClaimed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Raising => "RAISING",
            Phase::RaiseSuccess => "RAISE_SUCCESS",
            Phase::NftBought => "NFT_BOUGHT",
            Phase::CanClaim => "CAN_CLAIM",
            Phase::AllClaimed => "ALL_CLAIMED",
        };
        f.write_str(name)
    }
}

// 1.4: wei helpers. 1 ether = 1e18 wei.
pub const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WEI_PER_ETHER)
}

/// `amount / 10^decimals` ether, e.g. `ether_fraction(5, 1)` is 0.5 ether.
pub fn ether_fraction(amount: u64, decimals: u32) -> U256 {
    ether(amount) / U256::from(10u64).pow(U256::from(decimals))
}

/// Human readable ether amount. None when the value doesn't fit a Decimal.
pub fn to_ether(wei: U256) -> Option<Decimal> {
    let raw = i128::try_from(wei).ok()?;
    Decimal::try_from_i128_with_scale(raw, 18).ok().map(|d| d.normalize())
}
