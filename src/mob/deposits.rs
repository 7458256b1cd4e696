//! Raise phase: deposits, oracle completion of a partial raise, refunds.

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

use super::core::Mob;
use super::results::MobError;
use super::Governance;
use crate::events::{EventPayload, MemberJoinedEvent, PayoutEvent};
use crate::ledger::Ledger;
use crate::types::{Phase, Timestamp};

impl Mob {
    /// `joinPay(beneficiary)`: `caller` pays `value`, `beneficiary` is credited.
    /// All-or-nothing: a deposit past the target is rejected whole.
    pub fn join_pay(
        &mut self,
        ledger: &mut Ledger,
        caller: Address,
        beneficiary: Address,
        value: U256,
    ) -> Result<U256, MobError> {
        let now = ledger.now();
        if value.is_zero() {
            return Err(MobError::ZeroDeposit);
        }
        self.require_phase(Phase::Raising)?;
        if now >= self.raise_deadline {
            return Err(MobError::DeadlinePassed {
                deadline: self.raise_deadline,
                now,
            });
        }
        let remaining = self.remaining_quota();
        if value > remaining {
            warn!(mob = %self.id, %remaining, requested = %value, "deposit over quota");
            return Err(MobError::InsufficientQuota {
                remaining,
                requested: value,
            });
        }

        ledger.transfer_native(caller, self.address, value)?;

        if !self.members.contains(&beneficiary) {
            self.members.push(beneficiary);
        }
        *self.deposits.entry(beneficiary).or_insert(U256::ZERO) += value;
        self.raised_amount += value;

        self.emit_event(
            now,
            EventPayload::MemberJoined(MemberJoinedEvent {
                member: beneficiary,
                amount: value,
                raised_amount: self.raised_amount,
            }),
        );

        if self.raised_amount == self.raise_target {
            self.advance(Phase::RaiseSuccess, now);
        }
        Ok(self.raised_amount)
    }

    /// Oracle override accepting a partial raise.
    pub fn complete_raise(&mut self, governance: &dyn Governance, caller: Address, now: Timestamp) -> Result<(), MobError> {
        if !governance.is_oracle(caller) {
            return Err(MobError::Unauthorized { caller });
        }
        self.require_phase(Phase::Raising)?;
        // a failed raise stays failed: members may already be refunding
        if now >= self.raise_deadline {
            return Err(MobError::DeadlinePassed {
                deadline: self.raise_deadline,
                now,
            });
        }
        if self.raised_amount.is_zero() {
            return Err(MobError::NothingRaised);
        }
        info!(mob = %self.id, raised = %self.raised_amount, target = %self.raise_target, "raise completed early");
        self.advance(Phase::RaiseSuccess, now);
        Ok(())
    }

    /// Whether deposits can be taken back: the raise failed, or the buy never happened.
    pub fn refundable(&self, now: Timestamp) -> bool {
        match self.phase {
            Phase::Raising => now >= self.raise_deadline,
            Phase::RaiseSuccess => now >= self.deadline,
            _ => false,
        }
    }

    pub fn refund(&mut self, ledger: &mut Ledger, caller: Address) -> Result<U256, MobError> {
        let now = ledger.now();
        if !self.refundable(now) {
            return Err(MobError::RefundUnavailable);
        }
        let amount = self.deposit_of(caller);
        if amount.is_zero() {
            return Err(MobError::NothingToClaim);
        }

        // effects before the transfer
        self.deposits.insert(caller, U256::ZERO);
        self.raised_amount -= amount;
        ledger.transfer_native(self.address, caller, amount)?;

        self.emit_event(now, EventPayload::Refunded(PayoutEvent { member: caller, amount }));
        if self.raised_amount.is_zero() {
            self.advance(Phase::AllClaimed, now);
        }
        Ok(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mob::core::tests::{init, MOB};
    use crate::types::ether;
    use alloy_primitives::address;

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0000000000000000000000000000000000000b0b");
    const ORACLE: Address = address!("000000000000000000000000000000000000041e");

    struct Roles;

    impl Governance for Roles {
        fn is_oracle(&self, account: Address) -> bool {
            account == ORACLE
        }

        fn fee_recipient(&self) -> Address {
            Address::ZERO
        }
    }

    fn setup() -> (Mob, Ledger) {
        let mut ledger = Ledger::new(31337, Timestamp(1_000));
        ledger.fund(ALICE, ether(10));
        ledger.fund(BOB, ether(10));
        (Mob::new(init()).unwrap(), ledger)
    }

    #[test]
    fn deposits_accumulate_until_target() {
        let (mut mob, mut ledger) = setup();
        mob.join_pay(&mut ledger, ALICE, ALICE, ether(1)).unwrap();
        mob.join_pay(&mut ledger, BOB, BOB, ether(1)).unwrap();
        assert_eq!(mob.phase(), Phase::Raising);

        mob.join_pay(&mut ledger, ALICE, ALICE, ether(1)).unwrap();
        assert_eq!(mob.phase(), Phase::RaiseSuccess);
        assert_eq!(mob.deposit_of(ALICE), ether(2));
        assert_eq!(mob.members(), &[ALICE, BOB]);
        assert_eq!(ledger.balance_of(MOB), ether(3));

        let err = mob.join_pay(&mut ledger, BOB, BOB, ether(1)).unwrap_err();
        assert!(matches!(err, MobError::WrongPhase { .. }));
    }

    #[test]
    fn over_quota_rejected_whole() {
        let (mut mob, mut ledger) = setup();
        mob.join_pay(&mut ledger, ALICE, ALICE, ether(2)).unwrap();

        let err = mob.join_pay(&mut ledger, BOB, BOB, ether(1) + U256::from(1u64)).unwrap_err();
        assert_eq!(
            err,
            MobError::InsufficientQuota {
                remaining: ether(1),
                requested: ether(1) + U256::from(1u64),
            }
        );
        assert_eq!(mob.raised_amount(), ether(2));
        assert_eq!(ledger.balance_of(BOB), ether(10));
    }

    #[test]
    fn beneficiary_gets_credit() {
        let (mut mob, mut ledger) = setup();
        mob.join_pay(&mut ledger, ALICE, BOB, ether(1)).unwrap();
        assert_eq!(mob.deposit_of(BOB), ether(1));
        assert_eq!(mob.deposit_of(ALICE), U256::ZERO);
        assert_eq!(ledger.balance_of(ALICE), ether(9));
    }

    #[test]
    fn late_and_empty_deposits_rejected() {
        let (mut mob, mut ledger) = setup();
        assert_eq!(
            mob.join_pay(&mut ledger, ALICE, ALICE, U256::ZERO),
            Err(MobError::ZeroDeposit)
        );
        ledger.set_time(Timestamp(2_000));
        let err = mob.join_pay(&mut ledger, ALICE, ALICE, ether(1)).unwrap_err();
        assert!(matches!(err, MobError::DeadlinePassed { .. }));
    }

    #[test]
    fn only_oracle_completes_partial_raise() {
        let (mut mob, mut ledger) = setup();
        assert_eq!(mob.complete_raise(&Roles, ORACLE, ledger.now()), Err(MobError::NothingRaised));

        mob.join_pay(&mut ledger, ALICE, ALICE, ether(1)).unwrap();
        assert!(matches!(
            mob.complete_raise(&Roles, ALICE, ledger.now()),
            Err(MobError::Unauthorized { .. })
        ));
        mob.complete_raise(&Roles, ORACLE, ledger.now()).unwrap();
        assert_eq!(mob.phase(), Phase::RaiseSuccess);
    }

    #[test]
    fn failed_raise_cannot_be_completed() {
        let (mut mob, mut ledger) = setup();
        mob.join_pay(&mut ledger, ALICE, ALICE, ether(1)).unwrap();
        mob.join_pay(&mut ledger, BOB, BOB, ether(1)).unwrap();

        ledger.set_time(Timestamp(2_000));
        mob.refund(&mut ledger, ALICE).unwrap();
        assert!(matches!(
            mob.complete_raise(&Roles, ORACLE, ledger.now()),
            Err(MobError::DeadlinePassed { .. })
        ));
        assert_eq!(mob.phase(), Phase::Raising);
        assert_eq!(mob.refund(&mut ledger, BOB).unwrap(), ether(1));
    }

    #[test]
    fn refund_after_failed_raise() {
        let (mut mob, mut ledger) = setup();
        mob.join_pay(&mut ledger, ALICE, ALICE, ether(1)).unwrap();
        mob.join_pay(&mut ledger, BOB, BOB, ether(1)).unwrap();
        assert_eq!(mob.refund(&mut ledger, ALICE), Err(MobError::RefundUnavailable));

        ledger.set_time(Timestamp(2_000));
        assert_eq!(mob.refund(&mut ledger, ALICE).unwrap(), ether(1));
        assert_eq!(mob.refund(&mut ledger, ALICE), Err(MobError::NothingToClaim));
        assert_eq!(ledger.balance_of(ALICE), ether(10));
        assert_eq!(mob.phase(), Phase::Raising);

        mob.refund(&mut ledger, BOB).unwrap();
        assert_eq!(mob.phase(), Phase::AllClaimed);
        assert_eq!(ledger.balance_of(MOB), U256::ZERO);
    }

    #[test]
    fn refund_after_missed_purchase() {
        let (mut mob, mut ledger) = setup();
        mob.join_pay(&mut ledger, ALICE, ALICE, ether(3)).unwrap();
        ledger.set_time(Timestamp(4_999));
        assert_eq!(mob.refund(&mut ledger, ALICE), Err(MobError::RefundUnavailable));

        ledger.set_time(Timestamp(5_000));
        assert_eq!(mob.refund(&mut ledger, ALICE).unwrap(), ether(3));
        assert_eq!(mob.phase(), Phase::AllClaimed);
    }
}
