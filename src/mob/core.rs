// 8.0 mob/core.rs: the mob struct, its one-time constructor and read accessors.

use alloy_primitives::{Address, B256, U256};
use std::collections::{HashMap, HashSet};
use tracing::info;

use super::results::MobError;
use crate::config::{FeeBase, MobPolicy};
use crate::events::{Event, EventLog, EventPayload, PhaseChangedEvent};
use crate::types::{Bps, MobId, Phase, TargetMode, Timestamp};

/// Creation parameters. Consumed once by [`Mob::new`]; a built mob has no re-initializer.
#[derive(Debug, Clone)]
pub struct MobInit {
    pub id: MobId,
    pub address: Address,
    pub creator: Address,
    pub name: String,
    pub token: Address,
    pub token_id: Option<U256>,
    pub mode: TargetMode,
    pub raise_target: U256,
    pub take_profit_price: U256,
    pub stop_loss_price: U256,
    pub raise_deadline: Timestamp,
    pub deadline: Timestamp,
    pub fee_rate: Bps,
    pub fee_base: FeeBase,
    pub policy: MobPolicy,
    pub exchange: Address,
    pub weth9: Option<Address>,
    pub max_events: usize,
    pub now: Timestamp,
}

/** 8.1: one campaign. all state lives here */
#[derive(Debug, Clone)]
pub struct Mob {
    pub(super) id: MobId,
    pub(super) address: Address,
    pub(super) creator: Address,
    pub(super) name: String,

    pub(super) token: Address,
    pub(super) token_id: Option<U256>,
    pub(super) mode: TargetMode,
    pub(super) raise_target: U256,
    pub(super) take_profit_price: U256,
    pub(super) stop_loss_price: U256,
    pub(super) raise_deadline: Timestamp,
    pub(super) deadline: Timestamp,

    pub(super) fee_rate: Bps,
    pub(super) fee_base: FeeBase,
    pub(super) policy: MobPolicy,
    pub(super) exchange: Address,
    pub(super) weth9: Option<Address>,

    pub(super) phase: Phase,
    pub(super) raised_amount: U256,
    // join order, settlement walks it
    pub(super) members: Vec<Address>,
    pub(super) deposits: HashMap<Address, U256>,
    pub(super) settlements: HashMap<Address, U256>,
    pub(super) outstanding: U256,
    pub(super) acquired_token_id: Option<U256>,
    pub(super) registered_digests: HashSet<B256>,

    pub(super) events: EventLog,
    pub(super) created_at: Timestamp,
}

impl Mob {
    pub fn new(init: MobInit) -> Result<Self, MobError> {
        let invalid = |reason: &str| MobError::InvalidParameters {
            reason: reason.to_string(),
        };

        if init.raise_deadline >= init.deadline {
            return Err(invalid("raise deadline must be before deadline"));
        }
        if init.raise_deadline <= init.now {
            return Err(invalid("raise deadline already passed"));
        }
        if init.raise_target.is_zero() {
            return Err(invalid("raise target must be positive"));
        }
        if init.take_profit_price.is_zero() {
            return Err(invalid("take profit price must be positive"));
        }
        if init.stop_loss_price > init.take_profit_price {
            return Err(invalid("stop loss above take profit"));
        }
        if init.token == Address::ZERO {
            return Err(invalid("target token is zero"));
        }
        if init.mode == TargetMode::Restrict && init.token_id.is_none() {
            return Err(invalid("restricted mob needs a token id"));
        }

        Ok(Self {
            id: init.id,
            address: init.address,
            creator: init.creator,
            name: init.name,
            token: init.token,
            token_id: init.token_id,
            mode: init.mode,
            raise_target: init.raise_target,
            take_profit_price: init.take_profit_price,
            stop_loss_price: init.stop_loss_price,
            raise_deadline: init.raise_deadline,
            deadline: init.deadline,
            fee_rate: init.fee_rate,
            fee_base: init.fee_base,
            policy: init.policy,
            exchange: init.exchange,
            weth9: init.weth9,
            phase: Phase::Raising,
            raised_amount: U256::ZERO,
            members: Vec::new(),
            deposits: HashMap::new(),
            settlements: HashMap::new(),
            outstanding: U256::ZERO,
            acquired_token_id: None,
            registered_digests: HashSet::new(),
            events: EventLog::new(init.max_events),
            created_at: init.now,
        })
    }

    pub fn id(&self) -> MobId {
        self.id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn token_id(&self) -> Option<U256> {
        self.token_id
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    pub fn raise_target(&self) -> U256 {
        self.raise_target
    }

    pub fn take_profit_price(&self) -> U256 {
        self.take_profit_price
    }

    pub fn stop_loss_price(&self) -> U256 {
        self.stop_loss_price
    }

    pub fn raise_deadline(&self) -> Timestamp {
        self.raise_deadline
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub fn fee_rate(&self) -> Bps {
        self.fee_rate
    }

    pub fn fee_base(&self) -> FeeBase {
        self.fee_base
    }

    pub fn policy(&self) -> MobPolicy {
        self.policy
    }

    pub fn exchange(&self) -> Address {
        self.exchange
    }

    pub fn weth9(&self) -> Option<Address> {
        self.weth9
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn raised_amount(&self) -> U256 {
        self.raised_amount
    }

    pub fn remaining_quota(&self) -> U256 {
        self.raise_target.saturating_sub(self.raised_amount)
    }

    pub fn members(&self) -> &[Address] {
        &self.members
    }

    pub fn deposit_of(&self, member: Address) -> U256 {
        self.deposits.get(&member).copied().unwrap_or(U256::ZERO)
    }

    pub fn settlement_of(&self, member: Address) -> U256 {
        self.settlements.get(&member).copied().unwrap_or(U256::ZERO)
    }

    /// Sum of allocated settlements not yet claimed.
    pub fn outstanding(&self) -> U256 {
        self.outstanding
    }

    pub fn acquired_token_id(&self) -> Option<U256> {
        self.acquired_token_id
    }

    pub fn is_registered(&self, digest: B256) -> bool {
        self.registered_digests.contains(&digest)
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        self.events.recent(count)
    }

    pub(super) fn require_phase(&self, expected: Phase) -> Result<(), MobError> {
        if self.phase != expected {
            return Err(MobError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    // phases never move backwards; a no-op when already there
    pub(super) fn advance(&mut self, to: Phase, now: Timestamp) {
        if to <= self.phase {
            return;
        }
        let from = self.phase;
        self.phase = to;
        info!(mob = %self.id, %from, %to, "phase changed");
        self.emit_event(now, EventPayload::PhaseChanged(PhaseChangedEvent { from, to }));
    }

    pub(super) fn emit_event(&mut self, now: Timestamp, payload: EventPayload) {
        self.events.emit(now, self.address, payload);
    }
}
