// 8.0: per-campaign mob engine. deposit ledger, phase machine, purchase, resale
// authorization, settlement and claims. deterministic, no I/O: the ledger, the
// exchange and the registry are handed in on every call.

mod admin;
mod core;
mod deposits;
mod purchase;
mod resale;
mod results;
mod settlement;

pub use core::{Mob, MobInit};
pub use results::{Allocation, MobError, Purchase};

use alloy_primitives::Address;

use crate::exchange::{Exchange, SignatureVerifier};
use crate::ledger::Ledger;

/// Registry-level roles a mob defers to.
pub trait Governance {
    fn is_oracle(&self, account: Address) -> bool;

    fn fee_recipient(&self) -> Address;
}

/// Everything outside the mob that a call may touch.
pub struct Host<'a> {
    pub ledger: &'a mut Ledger,
    pub exchange: &'a mut dyn Exchange,
    pub contracts: &'a dyn SignatureVerifier,
    pub governance: &'a dyn Governance,
}
