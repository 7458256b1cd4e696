// 3.0 seaport.rs: MOCKED. in-memory Seaport 1.1 covering the single-order flows.
// no criteria resolution, no partial fills, no conduits: the exchange itself is the
// transfer operator. ERC-1155 items are rejected.
//
// order hashes are derived here from the raw type strings rather than through the
// typed `sol!` structs in order.rs, so the two hashing paths check each other.

use alloy_primitives::{keccak256, Address, Bytes, Signature, B256, U256};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{CallContext, Exchange, ExchangeError, OrderStatus};
use crate::ledger::Ledger;
use crate::order::{
    BasicOrderParameters, ConsiderationItem, ExchangeDomain, ItemType, Order, OrderComponents, OrderParameters,
    CONSIDERATION_ITEM_TYPE, OFFER_ITEM_TYPE, ORDER_COMPONENTS_TYPE,
};

#[derive(Debug, Clone)]
struct TypeHashes {
    offer_item: B256,
    consideration_item: B256,
    order_components: B256,
}

impl TypeHashes {
    fn derive() -> Self {
        // referenced struct types are appended in alphabetical order
        let order_components = format!("{ORDER_COMPONENTS_TYPE}{CONSIDERATION_ITEM_TYPE}{OFFER_ITEM_TYPE}");
        Self {
            offer_item: keccak256(OFFER_ITEM_TYPE),
            consideration_item: keccak256(CONSIDERATION_ITEM_TYPE),
            order_components: keccak256(order_components),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedSeaport {
    address: Address,
    domain: ExchangeDomain,
    counters: HashMap<Address, U256>,
    statuses: HashMap<B256, OrderStatus>,
    type_hashes: TypeHashes,
}

impl SimulatedSeaport {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self::with_domain(ExchangeDomain::seaport(chain_id, address))
    }

    pub fn with_domain(domain: ExchangeDomain) -> Self {
        Self {
            address: domain.verifying_contract,
            domain,
            counters: HashMap::new(),
            statuses: HashMap::new(),
            type_hashes: TypeHashes::derive(),
        }
    }

    /// Invalidates every order the caller has signed so far.
    pub fn increment_counter(&mut self, caller: Address) -> U256 {
        let counter = self.counters.entry(caller).or_insert(U256::ZERO);
        *counter += U256::from(1u64);
        info!(offerer = %caller, counter = %counter, "counter incremented");
        *counter
    }

    pub fn cancel(&mut self, caller: Address, orders: &[OrderComponents]) -> Result<bool, ExchangeError> {
        // all or nothing
        if orders.iter().any(|o| caller != o.offerer && caller != o.zone) {
            return Err(ExchangeError::InvalidCanceller);
        }
        for components in orders {
            let hash = self.derive_order_hash(components);
            let status = self.statuses.entry(hash).or_default();
            status.is_validated = false;
            status.is_cancelled = true;
            debug!(order_hash = %hash, "order cancelled");
        }
        Ok(true)
    }

    /// EIP-712 digest `keccak256(0x1901 ‖ domainSeparator ‖ orderHash)`.
    pub fn digest(&self, order_hash: B256) -> B256 {
        let mut preimage = [0u8; 66];
        preimage[0] = 0x19;
        preimage[1] = 0x01;
        preimage[2..34].copy_from_slice(self.domain.separator().as_slice());
        preimage[34..].copy_from_slice(order_hash.as_slice());
        keccak256(preimage)
    }

    fn derive_order_hash(&self, c: &OrderComponents) -> B256 {
        let mut offer_hashes = Vec::with_capacity(c.offer.len() * 32);
        for item in &c.offer {
            let mut enc = Vec::with_capacity(6 * 32);
            enc.extend_from_slice(self.type_hashes.offer_item.as_slice());
            enc.extend_from_slice(&word(U256::from(u8::from(item.item_type))));
            enc.extend_from_slice(item.token.into_word().as_slice());
            enc.extend_from_slice(&word(item.identifier_or_criteria));
            enc.extend_from_slice(&word(item.start_amount));
            enc.extend_from_slice(&word(item.end_amount));
            offer_hashes.extend_from_slice(keccak256(enc).as_slice());
        }

        let mut consideration_hashes = Vec::with_capacity(c.consideration.len() * 32);
        for item in &c.consideration {
            let mut enc = Vec::with_capacity(7 * 32);
            enc.extend_from_slice(self.type_hashes.consideration_item.as_slice());
            enc.extend_from_slice(&word(U256::from(u8::from(item.item_type))));
            enc.extend_from_slice(item.token.into_word().as_slice());
            enc.extend_from_slice(&word(item.identifier_or_criteria));
            enc.extend_from_slice(&word(item.start_amount));
            enc.extend_from_slice(&word(item.end_amount));
            enc.extend_from_slice(item.recipient.into_word().as_slice());
            consideration_hashes.extend_from_slice(keccak256(enc).as_slice());
        }

        let mut enc = Vec::with_capacity(12 * 32);
        enc.extend_from_slice(self.type_hashes.order_components.as_slice());
        enc.extend_from_slice(c.offerer.into_word().as_slice());
        enc.extend_from_slice(c.zone.into_word().as_slice());
        enc.extend_from_slice(keccak256(&offer_hashes).as_slice());
        enc.extend_from_slice(keccak256(&consideration_hashes).as_slice());
        enc.extend_from_slice(&word(U256::from(u8::from(c.order_type))));
        enc.extend_from_slice(&word(c.start_time));
        enc.extend_from_slice(&word(c.end_time));
        enc.extend_from_slice(c.zone_hash.as_slice());
        enc.extend_from_slice(&word(c.salt));
        enc.extend_from_slice(c.conduit_key.as_slice());
        enc.extend_from_slice(&word(c.counter));
        keccak256(enc)
    }

    // 3.1: the hash of a live order drops the tips appended past the original count.
    fn hash_parameters(&self, params: &OrderParameters) -> Result<B256, ExchangeError> {
        let originals = usize::try_from(params.total_original_consideration_items)
            .map_err(|_| ExchangeError::MissingOriginalConsiderationItems)?;
        if originals > params.consideration.len() {
            return Err(ExchangeError::MissingOriginalConsiderationItems);
        }
        let mut components = params.to_components(self.get_counter(params.offerer));
        components.consideration.truncate(originals);
        Ok(self.derive_order_hash(&components))
    }

    fn verify_signature(
        &self,
        ctx: &CallContext<'_>,
        offerer: Address,
        order_hash: B256,
        signature: &Bytes,
    ) -> Result<(), ExchangeError> {
        let digest = self.digest(order_hash);
        match ctx.contracts.contract_signature(offerer, digest, signature) {
            Some(true) => Ok(()),
            Some(false) => Err(ExchangeError::BadContractSignature),
            None => {
                let sig = Signature::try_from(&signature[..]).map_err(|_| ExchangeError::InvalidSignature)?;
                let signer = sig
                    .recover_address_from_prehash(&digest)
                    .map_err(|_| ExchangeError::InvalidSignature)?;
                if signer != offerer {
                    return Err(ExchangeError::InvalidSigner);
                }
                Ok(())
            }
        }
    }

    // 3.2: status and authorization checks shared by validate and fulfil.
    fn assert_fillable(&self, order_hash: B256) -> Result<OrderStatus, ExchangeError> {
        let status = self.get_order_status(order_hash);
        if status.is_cancelled {
            return Err(ExchangeError::OrderIsCancelled(order_hash));
        }
        if status.is_filled() {
            return Err(ExchangeError::OrderAlreadyFilled(order_hash));
        }
        Ok(status)
    }

    fn fulfill_parameters(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        params: &OrderParameters,
        signature: &Bytes,
        value: U256,
    ) -> Result<B256, ExchangeError> {
        let now = ctx.ledger.now().as_u256();
        if now < params.start_time || now >= params.end_time {
            return Err(ExchangeError::InvalidTime {
                now,
                start: params.start_time,
                end: params.end_time,
            });
        }

        let order_hash = self.hash_parameters(params)?;
        if params.order_type.is_restricted() && caller != params.offerer && caller != params.zone {
            return Err(ExchangeError::InvalidRestrictedOrder(order_hash));
        }
        let status = self.assert_fillable(order_hash)?;
        if !status.is_validated {
            self.verify_signature(ctx, params.offerer, order_hash, signature)?;
        }

        let checkpoint = ctx.ledger.clone();
        if let Err(err) = self.settle(ctx.ledger, caller, params, value, now) {
            *ctx.ledger = checkpoint;
            return Err(err);
        }

        let status = self.statuses.entry(order_hash).or_default();
        status.is_validated = true;
        status.total_filled = U256::from(1u64);
        status.total_size = U256::from(1u64);
        info!(order_hash = %order_hash, fulfiller = %caller, value = %value, "order fulfilled");
        Ok(order_hash)
    }

    // 3.3: value lands at the exchange, goes out to recipients, the excess returns.
    fn settle(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        params: &OrderParameters,
        value: U256,
        now: U256,
    ) -> Result<(), ExchangeError> {
        let (start, end) = (params.start_time, params.end_time);

        let mut required = U256::ZERO;
        for item in params.consideration.iter().filter(|i| i.item_type == ItemType::Native) {
            let amount = current_amount(item.start_amount, item.end_amount, start, end, now, true)?;
            required = required.checked_add(amount).ok_or(ExchangeError::Overflow)?;
        }
        if value < required {
            return Err(ExchangeError::InsufficientEtherSupplied { required, supplied: value });
        }

        ledger.transfer_native(caller, self.address, value)?;

        for item in &params.offer {
            let amount = current_amount(item.start_amount, item.end_amount, start, end, now, false)?;
            match item.item_type {
                ItemType::Native => return Err(ExchangeError::InvalidNativeOfferItem),
                ItemType::Erc20 => ledger.transfer_erc20(item.token, self.address, params.offerer, caller, amount)?,
                ItemType::Erc721 => {
                    ledger.transfer_nft(item.token, item.identifier_or_criteria, self.address, params.offerer, caller)?
                }
                other => return Err(ExchangeError::UnsupportedItemType(other)),
            }
        }

        let mut remaining = value;
        for item in &params.consideration {
            let amount = current_amount(item.start_amount, item.end_amount, start, end, now, true)?;
            self.pay(ledger, caller, item, amount, &mut remaining)?;
        }

        if !remaining.is_zero() {
            ledger.transfer_native(self.address, caller, remaining)?;
        }
        Ok(())
    }

    fn pay(
        &self,
        ledger: &mut Ledger,
        caller: Address,
        item: &ConsiderationItem,
        amount: U256,
        remaining: &mut U256,
    ) -> Result<(), ExchangeError> {
        match item.item_type {
            ItemType::Native => {
                *remaining = remaining.checked_sub(amount).ok_or(ExchangeError::Overflow)?;
                ledger.transfer_native(self.address, item.recipient, amount)?;
            }
            ItemType::Erc20 => ledger.transfer_erc20(item.token, self.address, caller, item.recipient, amount)?,
            ItemType::Erc721 => {
                ledger.transfer_nft(item.token, item.identifier_or_criteria, self.address, caller, item.recipient)?
            }
            other => return Err(ExchangeError::UnsupportedItemType(other)),
        }
        Ok(())
    }
}

fn word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

/// Linear interpolation between start and end amount over the order window.
/// Offer amounts round down, consideration amounts round up.
fn current_amount(
    start_amount: U256,
    end_amount: U256,
    start_time: U256,
    end_time: U256,
    now: U256,
    round_up: bool,
) -> Result<U256, ExchangeError> {
    if start_amount == end_amount {
        return Ok(end_amount);
    }
    let duration = end_time - start_time;
    let elapsed = now - start_time;
    let remaining = duration - elapsed;

    let weighted_start = start_amount.checked_mul(remaining).ok_or(ExchangeError::Overflow)?;
    let weighted_end = end_amount.checked_mul(elapsed).ok_or(ExchangeError::Overflow)?;
    let total = weighted_start.checked_add(weighted_end).ok_or(ExchangeError::Overflow)?;
    let extra = if round_up { duration - U256::from(1u64) } else { U256::ZERO };
    Ok(total.checked_add(extra).ok_or(ExchangeError::Overflow)? / duration)
}

impl Exchange for SimulatedSeaport {
    fn address(&self) -> Address {
        self.address
    }

    fn domain(&self) -> &ExchangeDomain {
        &self.domain
    }

    fn get_counter(&self, offerer: Address) -> U256 {
        self.counters.get(&offerer).copied().unwrap_or(U256::ZERO)
    }

    fn get_order_hash(&self, components: &OrderComponents) -> B256 {
        self.derive_order_hash(components)
    }

    fn get_order_status(&self, order_hash: B256) -> OrderStatus {
        self.statuses.get(&order_hash).copied().unwrap_or_default()
    }

    fn validate(&mut self, ctx: &mut CallContext<'_>, caller: Address, orders: &[Order]) -> Result<bool, ExchangeError> {
        let mut validated = Vec::with_capacity(orders.len());
        for order in orders {
            let params = &order.parameters;
            let order_hash = self.hash_parameters(params)?;
            let status = self.assert_fillable(order_hash)?;
            if status.is_validated {
                continue;
            }
            if caller != params.offerer {
                self.verify_signature(ctx, params.offerer, order_hash, &order.signature)?;
            }
            validated.push(order_hash);
        }
        for order_hash in validated {
            self.statuses.entry(order_hash).or_default().is_validated = true;
            info!(order_hash = %order_hash, "order validated");
        }
        Ok(true)
    }

    fn fulfill_basic_order(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        params: &BasicOrderParameters,
        value: U256,
    ) -> Result<bool, ExchangeError> {
        let (_, route) = params.decode_type()?;
        // routes where the offerer pays ERC-20 settle fees from the offer side; not modelled
        if route.offer_item_type() == ItemType::Erc20 {
            return Err(ExchangeError::UnsupportedBasicOrderType(params.basic_order_type));
        }
        let order = params.to_order()?;
        let fee = order
            .parameters
            .consideration
            .first()
            .map(|item| (item.item_type, item.token))
            .unwrap_or((route.payment_item_type(), params.consideration_token));

        let mut full = order.parameters.clone();
        full.consideration.extend(params.tips()?.iter().map(|tip| ConsiderationItem {
            item_type: fee.0,
            token: fee.1,
            identifier_or_criteria: U256::ZERO,
            start_amount: tip.amount,
            end_amount: tip.amount,
            recipient: tip.recipient,
        }));

        self.fulfill_parameters(ctx, caller, &full, &order.signature, value)?;
        Ok(true)
    }

    fn fulfill_order(
        &mut self,
        ctx: &mut CallContext<'_>,
        caller: Address,
        order: &Order,
        _fulfiller_conduit_key: B256,
        value: U256,
    ) -> Result<bool, ExchangeError> {
        self.fulfill_parameters(ctx, caller, &order.parameters, &order.signature, value)?;
        Ok(true)
    }
}
