//! Deterministic actors and order builders for the simulator and tests.

use alloy_primitives::{Address, B256, U256};

use crate::exchange::{magic_signature, Exchange, ExchangeError, OrderSigner};
use crate::mob::{Mob, MobError};
use crate::order::{ConsiderationItem, ItemType, OfferItem, Order, OrderParameters, OrderType};
use crate::types::Timestamp;

/// A named EOA with a key derived from `seed`.
#[derive(Debug, Clone)]
pub struct Actor {
    pub name: &'static str,
    pub signer: OrderSigner,
}

impl Actor {
    pub fn new(name: &'static str, seed: u64) -> Result<Self, ExchangeError> {
        Ok(Self {
            name,
            signer: OrderSigner::from_seed(seed)?,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// Single ERC-721 for native currency, optionally with fee recipients and a
/// descending (Dutch) price.
#[derive(Debug, Clone)]
pub struct Listing {
    pub seller: Address,
    pub token: Address,
    pub token_id: U256,
    pub price: U256,
    pub end_price: Option<U256>,
    pub fees: Vec<(Address, U256)>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub salt: U256,
}

impl Listing {
    pub fn new(seller: Address, token: Address, token_id: U256, price: U256, start_time: Timestamp, end_time: Timestamp) -> Self {
        Self {
            seller,
            token,
            token_id,
            price,
            end_price: None,
            fees: Vec::new(),
            start_time,
            end_time,
            salt: U256::from(start_time.as_secs()),
        }
    }

    /// Resale of the NFT a mob holds, proceeds to the mob.
    pub fn resale(mob: &Mob, price: U256, start_time: Timestamp, end_time: Timestamp) -> Result<Self, MobError> {
        let token_id = mob.acquired_token_id().ok_or(MobError::WrongResaleItem)?;
        Ok(Self::new(mob.address(), mob.token(), token_id, price, start_time, end_time))
    }

    pub fn with_fee(mut self, recipient: Address, amount: U256) -> Self {
        self.fees.push((recipient, amount));
        self
    }

    pub fn with_end_price(mut self, end_price: U256) -> Self {
        self.end_price = Some(end_price);
        self
    }

    pub fn with_salt(mut self, salt: U256) -> Self {
        self.salt = salt;
        self
    }

    pub fn parameters(&self) -> OrderParameters {
        let native = |amount: U256, end: U256, recipient: Address| ConsiderationItem {
            item_type: ItemType::Native,
            token: Address::ZERO,
            identifier_or_criteria: U256::ZERO,
            start_amount: amount,
            end_amount: end,
            recipient,
        };

        let mut consideration = vec![native(self.price, self.end_price.unwrap_or(self.price), self.seller)];
        consideration.extend(self.fees.iter().map(|(recipient, amount)| native(*amount, *amount, *recipient)));

        OrderParameters {
            offerer: self.seller,
            zone: Address::ZERO,
            offer: vec![OfferItem {
                item_type: ItemType::Erc721,
                token: self.token,
                identifier_or_criteria: self.token_id,
                start_amount: U256::from(1u64),
                end_amount: U256::from(1u64),
            }],
            total_original_consideration_items: U256::from(consideration.len() as u64),
            consideration,
            order_type: OrderType::FullOpen,
            start_time: self.start_time.as_u256(),
            end_time: self.end_time.as_u256(),
            zone_hash: B256::ZERO,
            salt: self.salt,
            conduit_key: B256::ZERO,
        }
    }

    /// Signed by an EOA seller against the exchange's current counter and domain.
    pub fn sign(&self, signer: &OrderSigner, exchange: &dyn Exchange) -> Result<Order, ExchangeError> {
        let parameters = self.parameters();
        let components = parameters.to_components(exchange.get_counter(parameters.offerer));
        let signature = signer.sign(&components, exchange.domain())?;
        Ok(Order { parameters, signature })
    }

    /// Carries the placeholder signature a mob answers for via EIP-1271.
    pub fn magic(&self) -> Order {
        Order {
            parameters: self.parameters(),
            signature: magic_signature(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ether;
    use alloy_primitives::address;

    const NFT: Address = address!("f5de760f2e916647fd766b4ad9e85ff943ce3a2b");

    #[test]
    fn listing_with_fees() {
        let seller = Actor::new("seller", 3).unwrap();
        let params = Listing::new(seller.address(), NFT, U256::from(1u64), ether(3), Timestamp(0), Timestamp(10))
            .with_fee(NFT, ether(1))
            .parameters();

        assert_eq!(params.consideration.len(), 2);
        assert_eq!(params.total_original_consideration_items, U256::from(2u64));
        assert_eq!(params.max_native_consideration().unwrap(), ether(4));
        assert_eq!(params.offerer, seller.address());
    }
}
