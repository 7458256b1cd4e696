//! NFT acquisition through the exchange. One purchase per mob.

use alloy_primitives::{Address, B256, U256};
use tracing::info;

use super::core::Mob;
use super::results::{MobError, Purchase};
use super::Host;
use crate::config::PurchaseValuePolicy;
use crate::events::{EventPayload, NftBoughtEvent};
use crate::exchange::{CallContext, Exchange};
use crate::ledger::Ledger;
use crate::order::{BasicOrderParameters, BasicOrderRoute, ItemType, Order, OrderError};
use crate::types::{Phase, TargetMode, Timestamp};

impl Mob {
    /// `buyBasicOrder`: anyone may trigger once the raise succeeded.
    pub fn buy_basic_order(
        &mut self,
        host: &mut Host<'_>,
        caller: Address,
        params: &BasicOrderParameters,
    ) -> Result<Purchase, MobError> {
        let now = host.ledger.now();
        self.check_can_buy(now)?;
        self.check_exchange(&*host.exchange)?;

        let (_, route) = params.decode_type()?;
        if route != BasicOrderRoute::EthToErc721 {
            return Err(MobError::UnsupportedPurchase);
        }
        self.check_target(params.offer_token, params.offer_identifier)?;
        let value = self.purchase_value(params.native_value()?)?;

        let signed = params.to_order()?;
        let counter = host.exchange.get_counter(params.offerer);
        let order_hash = host.exchange.get_order_hash(&signed.parameters.to_components(counter));

        let balance_before = host.ledger.balance_of(self.address);
        let mut ctx = CallContext::new(&mut *host.ledger, host.contracts);
        host.exchange.fulfill_basic_order(&mut ctx, self.address, params, value)?;

        info!(mob = %self.id, %caller, %order_hash, "basic order filled");
        self.finish_purchase(&*host.ledger, order_hash, params.offer_identifier, value, balance_before, now)
    }

    /// `buyOrder`: full order path, for listings a basic order cannot express.
    pub fn buy_order(
        &mut self,
        host: &mut Host<'_>,
        caller: Address,
        order: &Order,
        fulfiller_conduit_key: B256,
    ) -> Result<Purchase, MobError> {
        let now = host.ledger.now();
        self.check_can_buy(now)?;
        self.check_exchange(&*host.exchange)?;

        let params = &order.parameters;
        let offer = params.offer.first().ok_or(OrderError::MissingOffer)?;
        if params.offer.len() != 1 || offer.item_type != ItemType::Erc721 {
            return Err(MobError::UnsupportedPurchase);
        }
        if params.consideration.iter().any(|item| item.item_type != ItemType::Native) {
            return Err(MobError::UnsupportedPurchase);
        }
        self.check_target(offer.token, offer.identifier_or_criteria)?;
        let value = self.purchase_value(params.max_native_consideration()?)?;

        let counter = host.exchange.get_counter(params.offerer);
        let order_hash = host.exchange.get_order_hash(&params.to_signed_components(counter));

        let balance_before = host.ledger.balance_of(self.address);
        let mut ctx = CallContext::new(&mut *host.ledger, host.contracts);
        host.exchange
            .fulfill_order(&mut ctx, self.address, order, fulfiller_conduit_key, value)?;

        info!(mob = %self.id, %caller, %order_hash, "order filled");
        self.finish_purchase(&*host.ledger, order_hash, offer.identifier_or_criteria, value, balance_before, now)
    }

    fn check_can_buy(&self, now: Timestamp) -> Result<(), MobError> {
        if self.phase >= Phase::NftBought {
            return Err(MobError::AlreadyBought);
        }
        self.require_phase(Phase::RaiseSuccess)?;
        if now >= self.deadline {
            return Err(MobError::DeadlinePassed {
                deadline: self.deadline,
                now,
            });
        }
        Ok(())
    }

    pub(super) fn check_exchange(&self, exchange: &dyn Exchange) -> Result<(), MobError> {
        if exchange.address() != self.exchange {
            return Err(MobError::ExchangeMismatch {
                expected: self.exchange,
                actual: exchange.address(),
            });
        }
        Ok(())
    }

    // RESTRICT pins the id before any value leaves the mob
    fn check_target(&self, token: Address, token_id: U256) -> Result<(), MobError> {
        if token != self.token {
            return Err(MobError::WrongToken {
                expected: self.token,
                actual: token,
            });
        }
        if self.mode == TargetMode::Restrict {
            if let Some(expected) = self.token_id {
                if expected != token_id {
                    return Err(MobError::WrongTokenId {
                        expected,
                        actual: token_id,
                    });
                }
            }
        }
        Ok(())
    }

    fn purchase_value(&self, required: U256) -> Result<U256, MobError> {
        let value = match self.policy.purchase_value {
            PurchaseValuePolicy::OrderTotal => required,
            PurchaseValuePolicy::RaisedAmount => self.raised_amount,
        };
        if required > self.raised_amount || value > self.raised_amount {
            return Err(MobError::InsufficientFunds {
                required,
                available: self.raised_amount,
            });
        }
        Ok(value)
    }

    fn finish_purchase(
        &mut self,
        ledger: &Ledger,
        order_hash: B256,
        token_id: U256,
        value: U256,
        balance_before: U256,
        now: Timestamp,
    ) -> Result<Purchase, MobError> {
        if self.policy.verify_purchase && ledger.owner_of(self.token, token_id) != Some(self.address) {
            return Err(MobError::PurchaseNotReceived { token_id });
        }
        let spent = balance_before.saturating_sub(ledger.balance_of(self.address));

        self.acquired_token_id = Some(token_id);
        self.emit_event(
            now,
            EventPayload::NftBought(NftBoughtEvent {
                token: self.token,
                token_id,
                value: spent,
                order_hash,
            }),
        );
        self.advance(Phase::NftBought, now);

        Ok(Purchase {
            order_hash,
            token_id,
            value,
            spent,
        })
    }
}
