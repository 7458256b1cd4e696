// 11.0: every state change on a mob or the registry produces an event.
// each contract keeps its own bounded log, like on-chain logs scoped by emitter.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Bps, MobId, Phase, TargetMode, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub emitter: Address,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Registry events
    MobCreated(MobCreatedEvent),
    FeeRateChanged(FeeRateChangedEvent),
    OracleUpdated(OracleUpdatedEvent),

    // Raise events
    MemberJoined(MemberJoinedEvent),
    PhaseChanged(PhaseChangedEvent),

    // Trade events
    NftBought(NftBoughtEvent),
    SellOrderValidated(SellOrderEvent),
    SellOrderRegistered(SellOrderEvent),

    // Payout events
    SettlementAllocated(SettlementAllocatedEvent),
    Claimed(PayoutEvent),
    Refunded(PayoutEvent),

    // Admin events
    ExchangeUpdated(AddressUpdatedEvent),
    Weth9Updated(AddressUpdatedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MobCreatedEvent {
    pub mob_id: MobId,
    pub mob: Address,
    pub creator: Address,
    pub name: String,
    pub token: Address,
    pub token_id: Option<U256>,
    pub mode: TargetMode,
    pub raise_target: U256,
    pub take_profit_price: U256,
    pub stop_loss_price: U256,
    pub fee_rate: Bps,
    pub raise_deadline: Timestamp,
    pub deadline: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateChangedEvent {
    pub old_rate: Bps,
    pub new_rate: Bps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleUpdatedEvent {
    pub oracle: Address,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJoinedEvent {
    pub member: Address,
    pub amount: U256,
    pub raised_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChangedEvent {
    pub from: Phase,
    pub to: Phase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftBoughtEvent {
    pub token: Address,
    pub token_id: U256,
    pub value: U256,
    pub order_hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellOrderEvent {
    pub order_hash: B256,
    pub price: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementAllocatedEvent {
    pub balance: U256,
    pub fee: U256,
    pub distributed: U256,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEvent {
    pub member: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressUpdatedEvent {
    pub old: Option<Address>,
    pub new: Address,
}

/// Bounded append-only log. Oldest events are dropped past `max_events`.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            max_events,
        }
    }

    pub fn emit(&mut self, timestamp: Timestamp, emitter: Address, payload: EventPayload) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        debug!(event_id = id.0, emitter = %emitter, ?payload, "event");

        self.events.push(Event {
            id,
            timestamp,
            emitter,
            payload,
        });

        if self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(0..drain_count);
        }
        id
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }
}
