// 8.4 mob/settlement.rs: turning resale proceeds into per-member settlements, and claims.
// share = deposit * (balance - fee) / raised, rounded down. remainder stays as dust.

use alloy_primitives::{Address, U256};
use tracing::info;

use super::core::Mob;
use super::results::{Allocation, MobError};
use super::Governance;
use crate::config::FeeBase;
use crate::events::{EventPayload, PayoutEvent, SettlementAllocatedEvent};
use crate::ledger::Ledger;
use crate::types::Phase;

impl Mob {
    /// `settlementAllocation`: callable by anyone once the NFT has left the mob.
    pub fn settlement_allocation(
        &mut self,
        ledger: &mut Ledger,
        governance: &dyn Governance,
    ) -> Result<Allocation, MobError> {
        let now = ledger.now();
        if self.phase >= Phase::CanClaim {
            return Err(MobError::AlreadyAllocated);
        }
        self.require_phase(Phase::NftBought)?;

        if let Some(token_id) = self.acquired_token_id {
            if ledger.owner_of(self.token, token_id) == Some(self.address) {
                return Err(MobError::NotSettled);
            }
        }

        if let Some(weth) = self.weth9 {
            let wrapped = ledger.erc20_balance(weth, self.address);
            if !wrapped.is_zero() {
                ledger.unwrap_native(weth, self.address, wrapped)?;
            }
        }

        let balance = ledger.balance_of(self.address);
        if balance.is_zero() {
            return Err(MobError::NotSettled);
        }

        let fee = self.fee_rate.apply(self.fee_base_amount(balance));
        let distributable = balance - fee;
        if !fee.is_zero() {
            ledger.transfer_native(self.address, governance.fee_recipient(), fee)?;
        }

        let mut distributed = U256::ZERO;
        for member in &self.members {
            let deposit = self.deposits.get(member).copied().unwrap_or(U256::ZERO);
            if deposit.is_zero() {
                continue;
            }
            let share = deposit.checked_mul(distributable).ok_or(MobError::Overflow)? / self.raised_amount;
            self.settlements.insert(*member, share);
            distributed += share;
        }
        self.outstanding = distributed;

        let allocation = Allocation {
            balance,
            fee,
            distributed,
            dust: distributable - distributed,
            members: self.members.len(),
        };
        info!(mob = %self.id, %balance, %fee, %distributed, "settlement allocated");
        self.emit_event(
            now,
            EventPayload::SettlementAllocated(SettlementAllocatedEvent {
                balance,
                fee,
                distributed,
                members: allocation.members,
            }),
        );

        self.advance(Phase::CanClaim, now);
        if self.outstanding.is_zero() {
            self.advance(Phase::AllClaimed, now);
        }
        Ok(allocation)
    }

    fn fee_base_amount(&self, balance: U256) -> U256 {
        match self.fee_base {
            FeeBase::Gross => balance,
            FeeBase::Profit => balance.saturating_sub(self.raised_amount),
        }
    }

    /// `claim`: pays the caller's settlement. The entry is zeroed before the transfer.
    pub fn claim(&mut self, ledger: &mut Ledger, caller: Address) -> Result<U256, MobError> {
        let now = ledger.now();
        if self.phase < Phase::CanClaim {
            return Err(MobError::NotSettled);
        }
        let amount = self.settlement_of(caller);
        if amount.is_zero() {
            return Err(MobError::NothingToClaim);
        }

        self.settlements.insert(caller, U256::ZERO);
        self.outstanding -= amount;
        ledger.transfer_native(self.address, caller, amount)?;

        info!(mob = %self.id, member = %caller, %amount, "claimed");
        self.emit_event(now, EventPayload::Claimed(PayoutEvent { member: caller, amount }));
        if self.outstanding.is_zero() {
            self.advance(Phase::AllClaimed, now);
        }
        Ok(amount)
    }
}
