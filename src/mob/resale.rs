// 8.3 mob/resale.rs: authorizing resale of the held NFT. two variants, one set of checks.
// validate: the mob marks the order validated on the exchange, as its offerer.
// register: the mob keeps the signing digest and answers EIP-1271 for it.

use alloy_primitives::{Address, Bytes, FixedBytes, B256};
use tracing::{info, warn};

use super::core::Mob;
use super::results::MobError;
use super::{Governance, Host};
use crate::config::ResaleMode;
use crate::events::{EventPayload, SellOrderEvent};
use crate::exchange::{CallContext, EIP1271_INVALID, EIP1271_MAGIC_VALUE, MAGIC_SIGNATURE};
use crate::order::{order_hash, signing_digest, ItemType, Order, OrderError};
use crate::types::Phase;

impl Mob {
    /// Dispatches to the variant selected by the mob's policy.
    pub fn authorize_resale(&mut self, host: &mut Host<'_>, caller: Address, orders: &[Order]) -> Result<Vec<B256>, MobError> {
        match self.policy.resale_mode {
            ResaleMode::Validate => self.validate_sell_orders(host, caller, orders),
            ResaleMode::Register => self.register_sell_order(host, caller, orders),
        }
    }

    /// `validateSellOrders`: returns the hashes of the validated orders.
    pub fn validate_sell_orders(
        &mut self,
        host: &mut Host<'_>,
        caller: Address,
        orders: &[Order],
    ) -> Result<Vec<B256>, MobError> {
        self.check_resale_call(host.governance, caller)?;
        self.check_exchange(&*host.exchange)?;
        for order in orders {
            self.check_resale_order(order)?;
        }

        let counter = host.exchange.get_counter(self.address);
        let hashes: Vec<B256> = orders
            .iter()
            .map(|o| order_hash(&o.parameters.to_signed_components(counter)))
            .collect();

        let mut ctx = CallContext::new(&mut *host.ledger, host.contracts);
        host.exchange.validate(&mut ctx, self.address, orders)?;
        self.approve_exchange(host);

        let now = host.ledger.now();
        for (order, hash) in orders.iter().zip(&hashes) {
            info!(mob = %self.id, order_hash = %hash, "sell order validated");
            self.emit_event(
                now,
                EventPayload::SellOrderValidated(SellOrderEvent {
                    order_hash: *hash,
                    price: order.parameters.consideration[0].start_amount,
                }),
            );
        }
        Ok(hashes)
    }

    /// `registerSellOrder`: stores each order's signing digest so the exchange's
    /// EIP-1271 callback accepts the placeholder signature. Returns the digests.
    pub fn register_sell_order(
        &mut self,
        host: &mut Host<'_>,
        caller: Address,
        orders: &[Order],
    ) -> Result<Vec<B256>, MobError> {
        self.check_resale_call(host.governance, caller)?;
        self.check_exchange(&*host.exchange)?;
        for order in orders {
            self.check_resale_order(order)?;
        }

        let counter = host.exchange.get_counter(self.address);
        let mut registered = Vec::with_capacity(orders.len());
        for order in orders {
            let components = order.parameters.to_signed_components(counter);
            let local = order_hash(&components);
            let remote = host.exchange.get_order_hash(&components);
            if local != remote {
                return Err(MobError::OrderHashMismatch { local, remote });
            }
            registered.push((local, signing_digest(&components, host.exchange.domain())));
        }

        self.approve_exchange(host);
        let now = host.ledger.now();
        for (order, (hash, digest)) in orders.iter().zip(&registered) {
            self.registered_digests.insert(*digest);
            info!(mob = %self.id, order_hash = %hash, %digest, "sell order registered");
            self.emit_event(
                now,
                EventPayload::SellOrderRegistered(SellOrderEvent {
                    order_hash: *hash,
                    price: order.parameters.consideration[0].start_amount,
                }),
            );
        }
        Ok(registered.into_iter().map(|(_, digest)| digest).collect())
    }

    /// EIP-1271 `isValidSignature`.
    pub fn is_valid_signature(&self, digest: B256, signature: &Bytes) -> FixedBytes<4> {
        if signature[..] == MAGIC_SIGNATURE && self.registered_digests.contains(&digest) {
            EIP1271_MAGIC_VALUE
        } else {
            EIP1271_INVALID
        }
    }

    fn check_resale_call(&self, governance: &dyn Governance, caller: Address) -> Result<(), MobError> {
        if caller != self.creator && !governance.is_oracle(caller) {
            return Err(MobError::Unauthorized { caller });
        }
        self.require_phase(Phase::NftBought)
    }

    // same checks for both variants, floor price first
    pub(super) fn check_resale_order(&self, order: &Order) -> Result<(), MobError> {
        let params = &order.parameters;
        let proceeds = params.consideration.first().ok_or(OrderError::MissingConsideration)?;
        if proceeds.start_amount < self.take_profit_price {
            warn!(mob = %self.id, price = %proceeds.start_amount, floor = %self.take_profit_price, "resale below floor");
            return Err(MobError::BelowFloorPrice);
        }
        if proceeds.end_amount < self.take_profit_price {
            warn!(mob = %self.id, end = %proceeds.end_amount, floor = %self.take_profit_price, "resale ends below floor");
            return Err(MobError::EndBelowFloorPrice {
                end: proceeds.end_amount,
                floor: self.take_profit_price,
            });
        }
        if params.offerer != self.address {
            return Err(MobError::NotOfferer);
        }

        let item = params.offer.first().ok_or(OrderError::MissingOffer)?;
        let held = self.acquired_token_id;
        if params.offer.len() != 1
            || item.item_type != ItemType::Erc721
            || item.token != self.token
            || held != Some(item.identifier_or_criteria)
        {
            return Err(MobError::WrongResaleItem);
        }

        if proceeds.recipient != self.address {
            return Err(MobError::WrongProceedsRecipient);
        }
        let weth_proceeds = proceeds.item_type == ItemType::Erc20 && Some(proceeds.token) == self.weth9;
        if proceeds.item_type != ItemType::Native && !weth_proceeds {
            return Err(MobError::UnsupportedProceeds);
        }
        Ok(())
    }

    fn approve_exchange(&self, host: &mut Host<'_>) {
        host.ledger
            .set_approval_for_all(self.token, self.address, host.exchange.address(), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mob::core::tests::{init, MOB, NFT};
    use crate::order::{ConsiderationItem, OfferItem, OrderParameters, OrderType};
    use crate::types::ether;
    use alloy_primitives::{address, U256};

    const WETH: Address = address!("000000000000000000000000000000000000e7e0");

    fn held_mob() -> Mob {
        let mut mob = Mob::new(init()).unwrap();
        mob.phase = Phase::NftBought;
        mob.acquired_token_id = Some(U256::from(7u64));
        mob.weth9 = Some(WETH);
        mob
    }

    fn resale(price: U256) -> Order {
        Order {
            parameters: OrderParameters {
                offerer: MOB,
                zone: Address::ZERO,
                offer: vec![OfferItem {
                    item_type: ItemType::Erc721,
                    token: NFT,
                    identifier_or_criteria: U256::from(7u64),
                    start_amount: U256::from(1u64),
                    end_amount: U256::from(1u64),
                }],
                consideration: vec![ConsiderationItem {
                    item_type: ItemType::Native,
                    token: Address::ZERO,
                    identifier_or_criteria: U256::ZERO,
                    start_amount: price,
                    end_amount: price,
                    recipient: MOB,
                }],
                order_type: OrderType::FullOpen,
                start_time: U256::ZERO,
                end_time: U256::from(10_000u64),
                zone_hash: B256::ZERO,
                salt: U256::from(1u64),
                conduit_key: B256::ZERO,
                total_original_consideration_items: U256::from(1u64),
            },
            signature: Bytes::from_static(&MAGIC_SIGNATURE),
        }
    }

    #[test]
    fn floor_price_is_inclusive() {
        let mob = held_mob();
        assert!(mob.check_resale_order(&resale(ether(6))).is_ok());
        let err = mob.check_resale_order(&resale(ether(6) - U256::from(1u64))).unwrap_err();
        assert_eq!(err, MobError::BelowFloorPrice);
        assert_eq!(err.to_string(), "wrong consider.startAmount");
    }

    #[test]
    fn descending_resale_must_end_at_or_above_floor() {
        let mob = held_mob();
        let mut dutch = resale(ether(8));
        dutch.parameters.consideration[0].end_amount = ether(6);
        assert!(mob.check_resale_order(&dutch).is_ok());

        dutch.parameters.consideration[0].end_amount = U256::from(1u64);
        assert_eq!(
            mob.check_resale_order(&dutch),
            Err(MobError::EndBelowFloorPrice {
                end: U256::from(1u64),
                floor: ether(6),
            })
        );

        // start is checked first and keeps its own reason
        dutch.parameters.consideration[0].start_amount = ether(5);
        assert_eq!(mob.check_resale_order(&dutch), Err(MobError::BelowFloorPrice));
    }

    #[test]
    fn resale_must_sell_the_held_token() {
        let mob = held_mob();
        let mut other_id = resale(ether(6));
        other_id.parameters.offer[0].identifier_or_criteria = U256::from(8u64);
        assert_eq!(mob.check_resale_order(&other_id), Err(MobError::WrongResaleItem));

        let mut foreign = resale(ether(6));
        foreign.parameters.offerer = NFT;
        assert_eq!(mob.check_resale_order(&foreign), Err(MobError::NotOfferer));
    }

    #[test]
    fn proceeds_go_to_the_mob_in_native_or_weth() {
        let mob = held_mob();
        let mut elsewhere = resale(ether(6));
        elsewhere.parameters.consideration[0].recipient = NFT;
        assert_eq!(mob.check_resale_order(&elsewhere), Err(MobError::WrongProceedsRecipient));

        let mut weth = resale(ether(6));
        weth.parameters.consideration[0].item_type = ItemType::Erc20;
        weth.parameters.consideration[0].token = WETH;
        assert!(mob.check_resale_order(&weth).is_ok());

        weth.parameters.consideration[0].token = NFT;
        assert_eq!(mob.check_resale_order(&weth), Err(MobError::UnsupportedProceeds));
    }

    #[test]
    fn empty_consideration_rejected() {
        let mob = held_mob();
        let mut order = resale(ether(6));
        order.parameters.consideration.clear();
        assert_eq!(
            mob.check_resale_order(&order),
            Err(MobError::Order(OrderError::MissingConsideration))
        );
    }

    #[test]
    fn eip1271_needs_registered_digest_and_magic_signature() {
        let mut mob = held_mob();
        let digest = B256::repeat_byte(0x11);
        let magic = Bytes::from_static(&MAGIC_SIGNATURE);
        assert_eq!(mob.is_valid_signature(digest, &magic), EIP1271_INVALID);

        mob.registered_digests.insert(digest);
        assert_eq!(mob.is_valid_signature(digest, &magic), EIP1271_MAGIC_VALUE);
        assert_eq!(mob.is_valid_signature(digest, &Bytes::from_static(b"0x43")), EIP1271_INVALID);
        assert_eq!(mob.is_valid_signature(B256::ZERO, &magic), EIP1271_INVALID);
    }
}
