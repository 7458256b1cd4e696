//! Exchange order model.
//!
//! Seaport 1.1 order parameters, the EIP-712 struct hash and signing digest
//! derived from them, and the projection of a full order onto the flattened
//! `BasicOrderParameters` used for single-item native purchases.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

/// Canonical EIP-712 type strings. The order hash depends on these byte for byte.
pub const OFFER_ITEM_TYPE: &str =
    "OfferItem(uint8 itemType,address token,uint256 identifierOrCriteria,uint256 startAmount,uint256 endAmount)";
pub const CONSIDERATION_ITEM_TYPE: &str =
    "ConsiderationItem(uint8 itemType,address token,uint256 identifierOrCriteria,uint256 startAmount,uint256 endAmount,address recipient)";
pub const ORDER_COMPONENTS_TYPE: &str =
    "OrderComponents(address offerer,address zone,OfferItem[] offer,ConsiderationItem[] consideration,uint8 orderType,uint256 startTime,uint256 endTime,bytes32 zoneHash,uint256 salt,bytes32 conduitKey,uint256 counter)";

pub const DOMAIN_NAME: &str = "Seaport";
pub const DOMAIN_VERSION: &str = "1.1";

mod typed {
    alloy_sol_types::sol! {
        struct OfferItem {
            uint8 itemType;
            address token;
            uint256 identifierOrCriteria;
            uint256 startAmount;
            uint256 endAmount;
        }

        struct ConsiderationItem {
            uint8 itemType;
            address token;
            uint256 identifierOrCriteria;
            uint256 startAmount;
            uint256 endAmount;
            address recipient;
        }

        struct OrderComponents {
            address offerer;
            address zone;
            OfferItem[] offer;
            ConsiderationItem[] consideration;
            uint8 orderType;
            uint256 startTime;
            uint256 endTime;
            bytes32 zoneHash;
            uint256 salt;
            bytes32 conduitKey;
            uint256 counter;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum ItemType {
    /// ETH on mainnet, MATIC on polygon, etc.
    Native = 0,
    Erc20 = 1,
    Erc721 = 2,
    Erc1155 = 3,
    Erc721WithCriteria = 4,
    Erc1155WithCriteria = 5,
}

impl ItemType {
    pub fn is_nft(&self) -> bool {
        !matches!(self, ItemType::Native | ItemType::Erc20)
    }
}

impl TryFrom<u8> for ItemType {
    type Error = OrderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ItemType::Native),
            1 => Ok(ItemType::Erc20),
            2 => Ok(ItemType::Erc721),
            3 => Ok(ItemType::Erc1155),
            4 => Ok(ItemType::Erc721WithCriteria),
            5 => Ok(ItemType::Erc1155WithCriteria),
            other => Err(OrderError::UnknownItemType(other)),
        }
    }
}

impl From<ItemType> for u8 {
    fn from(value: ItemType) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OrderType {
    /// No partial fills, anyone can execute.
    FullOpen = 0,
    /// Partial fills supported, anyone can execute.
    PartialOpen = 1,
    /// No partial fills, only offerer or zone can execute.
    FullRestricted = 2,
    /// Partial fills supported, only offerer or zone can execute.
    PartialRestricted = 3,
}

impl OrderType {
    pub fn is_restricted(&self) -> bool {
        matches!(self, OrderType::FullRestricted | OrderType::PartialRestricted)
    }
}

impl TryFrom<u8> for OrderType {
    type Error = OrderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OrderType::FullOpen),
            1 => Ok(OrderType::PartialOpen),
            2 => Ok(OrderType::FullRestricted),
            3 => Ok(OrderType::PartialRestricted),
            other => Err(OrderError::UnknownOrderType(other)),
        }
    }
}

impl From<OrderType> for u8 {
    fn from(value: OrderType) -> Self {
        value as u8
    }
}

/// Asset direction of a basic order. `basic_order_type = order_type + 4 * route`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BasicOrderRoute {
    EthToErc721 = 0,
    EthToErc1155 = 1,
    Erc20ToErc721 = 2,
    Erc20ToErc1155 = 3,
    Erc721ToErc20 = 4,
    Erc1155ToErc20 = 5,
}

impl BasicOrderRoute {
    fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(BasicOrderRoute::EthToErc721),
            1 => Some(BasicOrderRoute::EthToErc1155),
            2 => Some(BasicOrderRoute::Erc20ToErc721),
            3 => Some(BasicOrderRoute::Erc20ToErc1155),
            4 => Some(BasicOrderRoute::Erc721ToErc20),
            5 => Some(BasicOrderRoute::Erc1155ToErc20),
            _ => None,
        }
    }

    /// Item type of the offered asset.
    pub fn offer_item_type(&self) -> ItemType {
        match self {
            BasicOrderRoute::EthToErc721 | BasicOrderRoute::Erc20ToErc721 => ItemType::Erc721,
            BasicOrderRoute::EthToErc1155 | BasicOrderRoute::Erc20ToErc1155 => ItemType::Erc1155,
            BasicOrderRoute::Erc721ToErc20 | BasicOrderRoute::Erc1155ToErc20 => ItemType::Erc20,
        }
    }

    /// Item type paid to the offerer and the additional recipients.
    pub fn payment_item_type(&self) -> ItemType {
        match self {
            BasicOrderRoute::EthToErc721 | BasicOrderRoute::EthToErc1155 => ItemType::Native,
            _ => ItemType::Erc20,
        }
    }

    fn offers_payment(&self) -> bool {
        matches!(self, BasicOrderRoute::Erc721ToErc20 | BasicOrderRoute::Erc1155ToErc20)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier_or_criteria: U256,
    pub start_amount: U256,
    pub end_amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsiderationItem {
    pub item_type: ItemType,
    pub token: Address,
    pub identifier_or_criteria: U256,
    pub start_amount: U256,
    pub end_amount: U256,
    pub recipient: Address,
}

impl ConsiderationItem {
    /// Largest amount this item can demand over the order's lifetime.
    pub fn max_amount(&self) -> U256 {
        self.start_amount.max(self.end_amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParameters {
    pub offerer: Address,
    pub zone: Address,
    pub offer: Vec<OfferItem>,
    pub consideration: Vec<ConsiderationItem>,
    pub order_type: OrderType,
    pub start_time: U256,
    pub end_time: U256,
    pub zone_hash: B256,
    pub salt: U256,
    pub conduit_key: B256,
    pub total_original_consideration_items: U256,
}

impl OrderParameters {
    pub fn to_components(&self, counter: U256) -> OrderComponents {
        OrderComponents {
            offerer: self.offerer,
            zone: self.zone,
            offer: self.offer.clone(),
            consideration: self.consideration.clone(),
            order_type: self.order_type,
            start_time: self.start_time,
            end_time: self.end_time,
            zone_hash: self.zone_hash,
            salt: self.salt,
            conduit_key: self.conduit_key,
            counter,
        }
    }

    /// Components of the order as signed: consideration items past
    /// `total_original_consideration_items` are fulfiller tips and not hashed.
    pub fn to_signed_components(&self, counter: U256) -> OrderComponents {
        let mut components = self.to_components(counter);
        let originals = usize::try_from(self.total_original_consideration_items).unwrap_or(usize::MAX);
        components.consideration.truncate(originals);
        components
    }

    /// Upper bound of native currency a fulfiller must attach.
    pub fn max_native_consideration(&self) -> Result<U256, OrderError> {
        self.consideration
            .iter()
            .filter(|item| item.item_type == ItemType::Native)
            .try_fold(U256::ZERO, |acc, item| {
                acc.checked_add(item.max_amount()).ok_or(OrderError::AmountOverflow)
            })
    }
}

/// `OrderParameters` without the recipient count, plus the offerer's counter.
/// This is exactly what gets hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderComponents {
    pub offerer: Address,
    pub zone: Address,
    pub offer: Vec<OfferItem>,
    pub consideration: Vec<ConsiderationItem>,
    pub order_type: OrderType,
    pub start_time: U256,
    pub end_time: U256,
    pub zone_hash: B256,
    pub salt: U256,
    pub conduit_key: B256,
    pub counter: U256,
}

impl OrderComponents {
    fn to_typed(&self) -> typed::OrderComponents {
        typed::OrderComponents {
            offerer: self.offerer,
            zone: self.zone,
            offer: self
                .offer
                .iter()
                .map(|item| typed::OfferItem {
                    itemType: item.item_type.into(),
                    token: item.token,
                    identifierOrCriteria: item.identifier_or_criteria,
                    startAmount: item.start_amount,
                    endAmount: item.end_amount,
                })
                .collect(),
            consideration: self
                .consideration
                .iter()
                .map(|item| typed::ConsiderationItem {
                    itemType: item.item_type.into(),
                    token: item.token,
                    identifierOrCriteria: item.identifier_or_criteria,
                    startAmount: item.start_amount,
                    endAmount: item.end_amount,
                    recipient: item.recipient,
                })
                .collect(),
            orderType: self.order_type.into(),
            startTime: self.start_time,
            endTime: self.end_time,
            zoneHash: self.zone_hash,
            salt: self.salt,
            conduitKey: self.conduit_key,
            counter: self.counter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub parameters: OrderParameters,
    pub signature: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalRecipient {
    pub amount: U256,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicOrderParameters {
    pub consideration_token: Address,
    pub consideration_identifier: U256,
    pub consideration_amount: U256,
    pub offerer: Address,
    pub zone: Address,
    pub offer_token: Address,
    pub offer_identifier: U256,
    pub offer_amount: U256,
    pub basic_order_type: u8,
    pub start_time: U256,
    pub end_time: U256,
    pub zone_hash: B256,
    pub salt: U256,
    pub offerer_conduit_key: B256,
    pub fulfiller_conduit_key: B256,
    pub total_original_additional_recipients: U256,
    pub additional_recipients: Vec<AdditionalRecipient>,
    pub signature: Bytes,
}

impl BasicOrderParameters {
    /// Splits `basic_order_type` into its order type and route.
    pub fn decode_type(&self) -> Result<(OrderType, BasicOrderRoute), OrderError> {
        let order_type = OrderType::try_from(self.basic_order_type % 4)?;
        let route = BasicOrderRoute::from_index(self.basic_order_type / 4)
            .ok_or(OrderError::UnknownBasicOrderType(self.basic_order_type))?;
        Ok((order_type, route))
    }

    fn original_recipient_count(&self) -> Result<usize, OrderError> {
        let count = usize::try_from(self.total_original_additional_recipients)
            .map_err(|_| OrderError::TooManyRecipients)?;
        if count > self.additional_recipients.len() {
            return Err(OrderError::TooManyRecipients);
        }
        Ok(count)
    }

    /// Recipients appended by the fulfiller; paid but not part of the signed order.
    pub fn tips(&self) -> Result<&[AdditionalRecipient], OrderError> {
        let count = self.original_recipient_count()?;
        Ok(&self.additional_recipients[count..])
    }

    /// Total paid by the fulfiller when the route pays in the native asset.
    pub fn native_value(&self) -> Result<U256, OrderError> {
        let (_, route) = self.decode_type()?;
        if route.payment_item_type() != ItemType::Native {
            return Ok(U256::ZERO);
        }
        self.additional_recipients
            .iter()
            .try_fold(self.consideration_amount, |acc, r| {
                acc.checked_add(r.amount).ok_or(OrderError::AmountOverflow)
            })
    }

    /// Rebuilds the signed order these parameters were flattened from.
    /// Tips are not part of it.
    pub fn to_order(&self) -> Result<Order, OrderError> {
        let (order_type, route) = self.decode_type()?;
        let originals = self.original_recipient_count()?;

        let (offer, primary) = if route.offers_payment() {
            // offerer pays ERC-20, receives the NFT
            let offer = OfferItem {
                item_type: ItemType::Erc20,
                token: self.offer_token,
                identifier_or_criteria: U256::ZERO,
                start_amount: self.offer_amount,
                end_amount: self.offer_amount,
            };
            let nft_type = match route {
                BasicOrderRoute::Erc721ToErc20 => ItemType::Erc721,
                _ => ItemType::Erc1155,
            };
            let primary = ConsiderationItem {
                item_type: nft_type,
                token: self.consideration_token,
                identifier_or_criteria: self.consideration_identifier,
                start_amount: self.consideration_amount,
                end_amount: self.consideration_amount,
                recipient: self.offerer,
            };
            (offer, primary)
        } else {
            let offer = OfferItem {
                item_type: route.offer_item_type(),
                token: self.offer_token,
                identifier_or_criteria: self.offer_identifier,
                start_amount: self.offer_amount,
                end_amount: self.offer_amount,
            };
            let primary = ConsiderationItem {
                item_type: route.payment_item_type(),
                token: self.consideration_token,
                identifier_or_criteria: self.consideration_identifier,
                start_amount: self.consideration_amount,
                end_amount: self.consideration_amount,
                recipient: self.offerer,
            };
            (offer, primary)
        };

        let (fee_type, fee_token) = if route.offers_payment() {
            (ItemType::Erc20, self.offer_token)
        } else {
            (route.payment_item_type(), self.consideration_token)
        };

        let mut consideration = Vec::with_capacity(originals + 1);
        consideration.push(primary);
        consideration.extend(self.additional_recipients[..originals].iter().map(|r| ConsiderationItem {
            item_type: fee_type,
            token: fee_token,
            identifier_or_criteria: U256::ZERO,
            start_amount: r.amount,
            end_amount: r.amount,
            recipient: r.recipient,
        }));

        Ok(Order {
            parameters: OrderParameters {
                offerer: self.offerer,
                zone: self.zone,
                offer: vec![offer],
                consideration,
                order_type,
                start_time: self.start_time,
                end_time: self.end_time,
                zone_hash: self.zone_hash,
                salt: self.salt,
                conduit_key: self.offerer_conduit_key,
                total_original_consideration_items: U256::from(originals as u64 + 1),
            },
            signature: self.signature.clone(),
        })
    }
}

/// EIP-712 domain of the exchange. Must match the exchange's own exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl ExchangeDomain {
    pub fn seaport(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(self.name.clone().into()),
            Some(self.version.clone().into()),
            Some(U256::from(self.chain_id)),
            Some(self.verifying_contract),
            None,
        )
    }

    pub fn separator(&self) -> B256 {
        self.eip712().separator()
    }
}

// 2.1: struct hash over the item hashes and scalar fields.
pub fn order_hash(components: &OrderComponents) -> B256 {
    components.to_typed().eip712_hash_struct()
}

// 2.2: what an EOA offerer signs, and what a contract offerer registers.
pub fn signing_digest(components: &OrderComponents, domain: &ExchangeDomain) -> B256 {
    components.to_typed().eip712_signing_hash(&domain.eip712())
}

// 2.3: flatten a one-offer order for fulfillBasicOrder.
// amounts come from end_amount, consideration[1..] become additional recipients, tips go last.
pub fn to_basic_order_parameters(
    order: &Order,
    route: BasicOrderRoute,
    fulfiller_conduit_key: Option<B256>,
    tips: &[AdditionalRecipient],
) -> Result<BasicOrderParameters, OrderError> {
    let params = &order.parameters;
    let offer = params.offer.first().ok_or(OrderError::MissingOffer)?;
    let primary = params.consideration.first().ok_or(OrderError::MissingConsideration)?;

    let mut additional_recipients: Vec<AdditionalRecipient> = params.consideration[1..]
        .iter()
        .map(|item| AdditionalRecipient {
            amount: item.end_amount,
            recipient: item.recipient,
        })
        .collect();
    additional_recipients.extend_from_slice(tips);

    Ok(BasicOrderParameters {
        consideration_token: primary.token,
        consideration_identifier: primary.identifier_or_criteria,
        consideration_amount: primary.end_amount,
        offerer: params.offerer,
        zone: params.zone,
        offer_token: offer.token,
        offer_identifier: offer.identifier_or_criteria,
        offer_amount: offer.end_amount,
        basic_order_type: params.order_type as u8 + 4 * route as u8,
        start_time: params.start_time,
        end_time: params.end_time,
        zone_hash: params.zone_hash,
        salt: params.salt,
        offerer_conduit_key: params.conduit_key,
        fulfiller_conduit_key: fulfiller_conduit_key.unwrap_or(B256::ZERO),
        total_original_additional_recipients: U256::from(params.consideration.len() as u64 - 1),
        additional_recipients,
        signature: order.signature.clone(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("order has no offer item")]
    MissingOffer,

    #[error("order has no consideration item")]
    MissingConsideration,

    #[error("unknown item type {0}")]
    UnknownItemType(u8),

    #[error("unknown order type {0}")]
    UnknownOrderType(u8),

    #[error("unknown basic order type {0}")]
    UnknownBasicOrderType(u8),

    #[error("additional recipient count exceeds the recipients supplied")]
    TooManyRecipients,

    #[error("order amount overflow")]
    AmountOverflow,
}
