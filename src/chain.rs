// 12.0 chain.rs: transaction facade over the ledger, the exchange and the registry.
// each call is one transaction: state is snapshotted first and restored on any error,
// so a failed call leaves nothing behind.

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use tracing::warn;

use crate::config::ProtocolConfig;
use crate::error::{Error, Result};
use crate::exchange::{CallContext, Exchange, OrderStatus, SimulatedSeaport};
use crate::ledger::Ledger;
use crate::mob::{Allocation, Host, Mob, MobError, Purchase};
use crate::order::{BasicOrderParameters, ExchangeDomain, Order, OrderComponents};
use crate::registry::{CreateMobParams, MobRegistry, RegistryError};
use crate::types::{MobId, Timestamp};

#[derive(Debug, Clone)]
pub struct Chain {
    ledger: Ledger,
    exchange: SimulatedSeaport,
    registry: MobRegistry,
    config: ProtocolConfig,
}

impl Chain {
    pub fn new(config: ProtocolConfig, registry: Address, owner: Address, now: Timestamp) -> Result<Self> {
        config.validate()?;
        let domain = ExchangeDomain {
            name: config.exchange.domain_name.clone(),
            version: config.exchange.domain_version.clone(),
            chain_id: config.chain.chain_id,
            verifying_contract: config.exchange.address,
        };
        Ok(Self {
            ledger: Ledger::new(config.chain.chain_id, now),
            exchange: SimulatedSeaport::with_domain(domain),
            registry: MobRegistry::new(registry, owner, &config)?,
            config,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Direct ledger access for funding and minting outside of any transaction.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn exchange(&self) -> &SimulatedSeaport {
        &self.exchange
    }

    pub fn registry(&self) -> &MobRegistry {
        &self.registry
    }

    pub fn now(&self) -> Timestamp {
        self.ledger.now()
    }

    pub fn set_time(&mut self, now: Timestamp) {
        self.ledger.set_time(now);
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.ledger.advance_time(secs);
    }

    pub fn mob(&self, id: MobId) -> Result<&Mob> {
        self.registry
            .mob(id)
            .ok_or_else(|| RegistryError::UnknownMob(id).into())
    }

    // registry calls check before they write, so only the ledger and the exchange
    // need a snapshot here; with_mob keeps its own copy of the one mob it runs
    fn transact<T>(&mut self, call: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let ledger = self.ledger.clone();
        let exchange = self.exchange.clone();
        match call(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, "transaction reverted");
                self.ledger = ledger;
                self.exchange = exchange;
                Err(err)
            }
        }
    }

    fn with_mob<T>(
        &mut self,
        id: MobId,
        call: impl FnOnce(&mut Mob, &mut Host<'_>) -> std::result::Result<T, MobError>,
    ) -> Result<T> {
        self.transact(|chain| {
            let mut mob = chain.registry.take_mob(id)?;
            let snapshot = mob.clone();
            let result = {
                let mut host = Host {
                    ledger: &mut chain.ledger,
                    exchange: &mut chain.exchange,
                    contracts: &chain.registry,
                    governance: &chain.registry,
                };
                call(&mut mob, &mut host)
            };
            match result {
                Ok(value) => {
                    chain.registry.restore_mob(mob);
                    Ok(value)
                }
                Err(err) => {
                    chain.registry.restore_mob(snapshot);
                    Err(Error::from(err))
                }
            }
        })
    }

    // registry

    pub fn create_mob(&mut self, caller: Address, params: CreateMobParams) -> Result<(MobId, Address)> {
        let now = self.now();
        self.transact(|chain| Ok(chain.registry.create_mob(caller, params, now)?))
    }

    pub fn set_fee_rate(&mut self, caller: Address, bps: u16) -> Result<()> {
        let now = self.now();
        self.transact(|chain| Ok(chain.registry.set_fee_rate(caller, bps, now)?))
    }

    pub fn set_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<()> {
        self.transact(|chain| Ok(chain.registry.set_fee_recipient(caller, recipient)?))
    }

    pub fn set_oracle(&mut self, caller: Address, oracle: Address, enabled: bool) -> Result<()> {
        let now = self.now();
        self.transact(|chain| Ok(chain.registry.set_oracle(caller, oracle, enabled, now)?))
    }

    // mob

    pub fn join_pay(&mut self, id: MobId, caller: Address, beneficiary: Address, value: U256) -> Result<U256> {
        self.with_mob(id, |mob, host| mob.join_pay(host.ledger, caller, beneficiary, value))
    }

    pub fn complete_raise(&mut self, id: MobId, caller: Address) -> Result<()> {
        self.with_mob(id, |mob, host| mob.complete_raise(host.governance, caller, host.ledger.now()))
    }

    pub fn refund(&mut self, id: MobId, caller: Address) -> Result<U256> {
        self.with_mob(id, |mob, host| mob.refund(host.ledger, caller))
    }

    pub fn buy_basic_order(&mut self, id: MobId, caller: Address, params: &BasicOrderParameters) -> Result<Purchase> {
        self.with_mob(id, |mob, host| mob.buy_basic_order(host, caller, params))
    }

    pub fn buy_order(
        &mut self,
        id: MobId,
        caller: Address,
        order: &Order,
        fulfiller_conduit_key: B256,
    ) -> Result<Purchase> {
        self.with_mob(id, |mob, host| mob.buy_order(host, caller, order, fulfiller_conduit_key))
    }

    pub fn validate_sell_orders(&mut self, id: MobId, caller: Address, orders: &[Order]) -> Result<Vec<B256>> {
        self.with_mob(id, |mob, host| mob.validate_sell_orders(host, caller, orders))
    }

    pub fn register_sell_order(&mut self, id: MobId, caller: Address, orders: &[Order]) -> Result<Vec<B256>> {
        self.with_mob(id, |mob, host| mob.register_sell_order(host, caller, orders))
    }

    pub fn authorize_resale(&mut self, id: MobId, caller: Address, orders: &[Order]) -> Result<Vec<B256>> {
        self.with_mob(id, |mob, host| mob.authorize_resale(host, caller, orders))
    }

    pub fn settlement_allocation(&mut self, id: MobId) -> Result<Allocation> {
        self.with_mob(id, |mob, host| mob.settlement_allocation(host.ledger, host.governance))
    }

    pub fn claim(&mut self, id: MobId, caller: Address) -> Result<U256> {
        self.with_mob(id, |mob, host| mob.claim(host.ledger, caller))
    }

    pub fn set_exchange_address(&mut self, id: MobId, caller: Address, exchange: Address) -> Result<()> {
        self.with_mob(id, |mob, host| mob.set_exchange_address(caller, exchange, host.ledger.now()))
    }

    pub fn set_weth9_address(&mut self, id: MobId, caller: Address, weth9: Address) -> Result<()> {
        self.with_mob(id, |mob, host| mob.set_weth9_address(caller, weth9, host.ledger.now()))
    }

    pub fn is_valid_signature(&self, id: MobId, digest: B256, signature: &Bytes) -> Result<FixedBytes<4>> {
        Ok(self.mob(id)?.is_valid_signature(digest, signature))
    }

    // exchange, for sellers and buyers that are not mobs

    pub fn fulfill_order(&mut self, caller: Address, order: &Order, fulfiller_conduit_key: B256, value: U256) -> Result<bool> {
        self.transact(|chain| {
            let mut ctx = CallContext::new(&mut chain.ledger, &chain.registry);
            Ok(chain
                .exchange
                .fulfill_order(&mut ctx, caller, order, fulfiller_conduit_key, value)?)
        })
    }

    pub fn fulfill_basic_order(&mut self, caller: Address, params: &BasicOrderParameters, value: U256) -> Result<bool> {
        self.transact(|chain| {
            let mut ctx = CallContext::new(&mut chain.ledger, &chain.registry);
            Ok(chain.exchange.fulfill_basic_order(&mut ctx, caller, params, value)?)
        })
    }

    pub fn validate_orders(&mut self, caller: Address, orders: &[Order]) -> Result<bool> {
        self.transact(|chain| {
            let mut ctx = CallContext::new(&mut chain.ledger, &chain.registry);
            Ok(chain.exchange.validate(&mut ctx, caller, orders)?)
        })
    }

    pub fn cancel_orders(&mut self, caller: Address, orders: &[OrderComponents]) -> Result<bool> {
        self.transact(|chain| Ok(chain.exchange.cancel(caller, orders)?))
    }

    pub fn increment_counter(&mut self, caller: Address) -> U256 {
        self.exchange.increment_counter(caller)
    }

    pub fn order_status(&self, order_hash: B256) -> OrderStatus {
        self.exchange.get_order_status(order_hash)
    }
}
