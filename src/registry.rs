// 10.0 registry.rs: mob factory and index. owns every mob instance, the global fee rate,
// the fee recipient and the oracle set. mobs snapshot the fee rate when they are created.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

use crate::config::{FeeBase, MobPolicy, ProtocolConfig};
use crate::events::{Event, EventLog, EventPayload, FeeRateChangedEvent, MobCreatedEvent, OracleUpdatedEvent};
use crate::exchange::{SignatureVerifier, EIP1271_MAGIC_VALUE};
use crate::mob::{Governance, Mob, MobError, MobInit};
use crate::types::{Bps, MobId, TargetMode, Timestamp};

pub const VERSION: &str = "1.0.0";

/// Arguments of `createMob`. The caller becomes the creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMobParams {
    pub token: Address,
    pub token_id: Option<U256>,
    pub raise_target: U256,
    pub take_profit_price: U256,
    pub stop_loss_price: U256,
    pub raise_deadline: Timestamp,
    pub deadline: Timestamp,
    pub mode: TargetMode,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct MobRegistry {
    address: Address,
    owner: Address,
    fee_rate: Bps,
    max_fee_rate: Bps,
    fee_recipient: Option<Address>,
    oracles: HashSet<Address>,

    // defaults handed to new mobs
    exchange: Address,
    weth9: Option<Address>,
    fee_base: FeeBase,
    policy: MobPolicy,
    max_events: usize,

    mobs: BTreeMap<MobId, Mob>,
    by_address: HashMap<Address, MobId>,
    next_id: u64,
    events: EventLog,
}

impl MobRegistry {
    pub fn new(address: Address, owner: Address, config: &ProtocolConfig) -> Result<Self, RegistryError> {
        config.validate().map_err(|e| RegistryError::Config(e.to_string()))?;
        let fee_rate = config.default_fee_rate().map_err(|e| RegistryError::Config(e.to_string()))?;
        let max_fee_rate = config.max_fee_rate().map_err(|e| RegistryError::Config(e.to_string()))?;

        Ok(Self {
            address,
            owner,
            fee_rate,
            max_fee_rate,
            fee_recipient: config.fees.fee_recipient,
            oracles: HashSet::new(),
            exchange: config.exchange.address,
            weth9: config.chain.weth9,
            fee_base: config.fees.fee_base,
            policy: config.policy,
            max_events: config.max_events,
            mobs: BTreeMap::new(),
            by_address: HashMap::new(),
            next_id: 1,
            events: EventLog::new(config.max_events),
        })
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn fee_rate(&self) -> Bps {
        self.fee_rate
    }

    /// `createMob`: builds the instance, indexes it, and returns its id and address.
    pub fn create_mob(
        &mut self,
        caller: Address,
        params: CreateMobParams,
        now: Timestamp,
    ) -> Result<(MobId, Address), RegistryError> {
        let id = MobId(self.next_id);
        // CREATE-style address from the registry and a counter that only grows,
        // so an address is never handed out twice
        let address = self.address.create(self.next_id);

        let mob = Mob::new(MobInit {
            id,
            address,
            creator: caller,
            name: params.name.clone(),
            token: params.token,
            token_id: params.token_id,
            mode: params.mode,
            raise_target: params.raise_target,
            take_profit_price: params.take_profit_price,
            stop_loss_price: params.stop_loss_price,
            raise_deadline: params.raise_deadline,
            deadline: params.deadline,
            fee_rate: self.fee_rate,
            fee_base: self.fee_base,
            policy: self.policy,
            exchange: self.exchange,
            weth9: self.weth9,
            max_events: self.max_events,
            now,
        })?;

        self.next_id += 1;
        self.mobs.insert(id, mob);
        self.by_address.insert(address, id);

        info!(%id, mob = %address, creator = %caller, name = %params.name, "mob created");
        self.events.emit(
            now,
            self.address,
            EventPayload::MobCreated(MobCreatedEvent {
                mob_id: id,
                mob: address,
                creator: caller,
                name: params.name,
                token: params.token,
                token_id: params.token_id,
                mode: params.mode,
                raise_target: params.raise_target,
                take_profit_price: params.take_profit_price,
                stop_loss_price: params.stop_loss_price,
                fee_rate: self.fee_rate,
                raise_deadline: params.raise_deadline,
                deadline: params.deadline,
            }),
        );
        Ok((id, address))
    }

    /// `mobsById`
    pub fn mobs_by_id(&self, id: MobId) -> Option<Address> {
        self.mobs.get(&id).map(|mob| mob.address())
    }

    /// `mobsTotal`
    pub fn mobs_total(&self) -> u64 {
        self.next_id - 1
    }

    pub fn mob(&self, id: MobId) -> Option<&Mob> {
        self.mobs.get(&id)
    }

    pub fn mob_id_at(&self, address: Address) -> Option<MobId> {
        self.by_address.get(&address).copied()
    }

    pub fn mob_at(&self, address: Address) -> Option<&Mob> {
        self.mob_id_at(address).and_then(|id| self.mobs.get(&id))
    }

    pub fn mobs(&self) -> impl Iterator<Item = &Mob> {
        self.mobs.values()
    }

    // checked out while the mob runs a call so the registry can still answer
    // role and signature queries
    pub(crate) fn take_mob(&mut self, id: MobId) -> Result<Mob, RegistryError> {
        self.mobs.remove(&id).ok_or(RegistryError::UnknownMob(id))
    }

    pub(crate) fn restore_mob(&mut self, mob: Mob) {
        self.mobs.insert(mob.id(), mob);
    }

    fn only_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::Unauthorized { caller });
        }
        Ok(())
    }

    /// `setFeeRate`. Only affects mobs created afterwards.
    pub fn set_fee_rate(&mut self, caller: Address, bps: u16, now: Timestamp) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        let new_rate = Bps::new(bps)
            .filter(|rate| *rate <= self.max_fee_rate)
            .ok_or(RegistryError::FeeRateTooHigh {
                requested: bps,
                max: self.max_fee_rate,
            })?;
        let old_rate = std::mem::replace(&mut self.fee_rate, new_rate);
        info!(%old_rate, %new_rate, "fee rate changed");
        self.events.emit(
            now,
            self.address,
            EventPayload::FeeRateChanged(FeeRateChangedEvent { old_rate, new_rate }),
        );
        Ok(())
    }

    pub fn set_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        self.fee_recipient = Some(recipient);
        Ok(())
    }

    /// `setOracle`
    pub fn set_oracle(&mut self, caller: Address, oracle: Address, enabled: bool, now: Timestamp) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        if enabled {
            self.oracles.insert(oracle);
        } else {
            self.oracles.remove(&oracle);
        }
        info!(%oracle, enabled, "oracle updated");
        self.events.emit(
            now,
            self.address,
            EventPayload::OracleUpdated(OracleUpdatedEvent { oracle, enabled }),
        );
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }
}

impl Governance for MobRegistry {
    fn is_oracle(&self, account: Address) -> bool {
        self.oracles.contains(&account)
    }

    fn fee_recipient(&self) -> Address {
        self.fee_recipient.unwrap_or(self.owner)
    }
}

impl SignatureVerifier for MobRegistry {
    fn contract_signature(&self, signer: Address, digest: B256, signature: &Bytes) -> Option<bool> {
        self.mob_at(signer)
            .map(|mob| mob.is_valid_signature(digest, signature) == EIP1271_MAGIC_VALUE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("{caller} is not the registry owner")]
    Unauthorized { caller: Address },

    #[error("fee rate {requested}bps above maximum {max}")]
    FeeRateTooHigh { requested: u16, max: Bps },

    #[error("unknown {0}")]
    UnknownMob(MobId),

    #[error("registry config: {0}")]
    Config(String),

    #[error(transparent)]
    Mob(#[from] MobError),
}
