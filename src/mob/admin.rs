//! Creator-only wiring changes.

use alloy_primitives::Address;
use tracing::info;

use super::core::Mob;
use super::results::MobError;
use crate::events::{AddressUpdatedEvent, EventPayload};
use crate::types::{Phase, Timestamp};

impl Mob {
    fn check_admin(&self, caller: Address) -> Result<(), MobError> {
        if caller != self.creator {
            return Err(MobError::Unauthorized { caller });
        }
        // once the NFT is held the exchange holds operator approval and resale
        // proceeds are checked against weth9, so both are pinned
        if self.phase >= Phase::NftBought {
            return Err(MobError::WrongPhase {
                expected: Phase::RaiseSuccess,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// `setSeaportAddress`
    pub fn set_exchange_address(&mut self, caller: Address, exchange: Address, now: Timestamp) -> Result<(), MobError> {
        self.check_admin(caller)?;
        let old = self.exchange;
        self.exchange = exchange;
        info!(mob = %self.id, %old, new = %exchange, "exchange updated");
        self.emit_event(
            now,
            EventPayload::ExchangeUpdated(AddressUpdatedEvent {
                old: Some(old),
                new: exchange,
            }),
        );
        Ok(())
    }

    pub fn set_weth9_address(&mut self, caller: Address, weth9: Address, now: Timestamp) -> Result<(), MobError> {
        self.check_admin(caller)?;
        let old = self.weth9.replace(weth9);
        info!(mob = %self.id, new = %weth9, "weth9 updated");
        self.emit_event(now, EventPayload::Weth9Updated(AddressUpdatedEvent { old, new: weth9 }));
        Ok(())
    }
}
