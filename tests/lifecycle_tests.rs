//! End-to-end mob campaigns against the simulated chain.
//!
//! Raise, purchase, both resale authorization paths, allocation and claims,
//! plus the guard rails around each step.

use alloy_primitives::{address, Address, B256, U256};
use mob_core::testkit::{Actor, Listing};
use mob_core::*;

const T0: Timestamp = Timestamp(1_700_000_000);
const REGISTRY: Address = address!("00000000000000000000000000000000000f4c70");
const NFT: Address = address!("f5de760f2e916647fd766b4ad9e85ff943ce3a2b");
const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
const TOKEN: u64 = 1024;

struct World {
    chain: Chain,
    owner: Actor,
    creator: Actor,
    oracle: Actor,
    members: Vec<Actor>,
    seller: Actor,
    buyer: Actor,
    id: MobId,
    mob: Address,
}

fn world_with(config: ProtocolConfig, fee_bps: u16) -> World {
    let owner = Actor::new("owner", 1).unwrap();
    let creator = Actor::new("creator", 2).unwrap();
    let oracle = Actor::new("oracle", 3).unwrap();
    let members = vec![
        Actor::new("alice", 10).unwrap(),
        Actor::new("bob", 11).unwrap(),
        Actor::new("carol", 12).unwrap(),
    ];
    let seller = Actor::new("seller", 20).unwrap();
    let buyer = Actor::new("buyer", 21).unwrap();

    let mut chain = Chain::new(config, REGISTRY, owner.address(), T0).unwrap();
    for actor in members.iter().chain([&buyer]) {
        chain.ledger_mut().fund(actor.address(), ether(10));
    }
    let exchange = chain.exchange().address();
    for id in [TOKEN, TOKEN + 1] {
        chain.ledger_mut().mint_nft(NFT, U256::from(id), seller.address()).unwrap();
    }
    chain
        .ledger_mut()
        .set_approval_for_all(NFT, seller.address(), exchange, true);
    chain.set_oracle(owner.address(), oracle.address(), true).unwrap();
    if fee_bps > 0 {
        chain.set_fee_rate(owner.address(), fee_bps).unwrap();
    }

    let (id, mob) = chain
        .create_mob(
            creator.address(),
            CreateMobParams {
                token: NFT,
                token_id: Some(U256::from(TOKEN)),
                raise_target: ether(3),
                take_profit_price: ether(6),
                stop_loss_price: ether(1),
                raise_deadline: T0.plus(86_400),
                deadline: T0.plus(7 * 86_400),
                mode: TargetMode::Restrict,
                name: "ape together".to_string(),
            },
        )
        .unwrap();

    World {
        chain,
        owner,
        creator,
        oracle,
        members,
        seller,
        buyer,
        id,
        mob,
    }
}

fn world(mode: ResaleMode) -> World {
    let mut config = ProtocolConfig::default();
    config.policy.resale_mode = mode;
    world_with(config, 0)
}

impl World {
    fn raise(&mut self) {
        for member in &self.members {
            self.chain
                .join_pay(self.id, member.address(), member.address(), ether(1))
                .unwrap();
        }
    }

    fn listing(&self, token_id: u64, price: U256) -> Order {
        let now = self.chain.now();
        Listing::new(self.seller.address(), NFT, U256::from(token_id), price, now, now.plus(3_600))
            .sign(&self.seller.signer, self.chain.exchange())
            .unwrap()
    }

    fn buy_basic(&mut self) -> Purchase {
        let order = self.listing(TOKEN, ether(3));
        let params = to_basic_order_parameters(&order, BasicOrderRoute::EthToErc721, None, &[]).unwrap();
        self.chain
            .buy_basic_order(self.id, self.creator.address(), &params)
            .unwrap()
    }

    fn resale(&self, price: U256) -> Order {
        let now = self.chain.now();
        Listing::resale(self.chain.mob(self.id).unwrap(), price, now, now.plus(3_600))
            .unwrap()
            .magic()
    }

    fn balance(&self, account: Address) -> U256 {
        self.chain.ledger().balance_of(account)
    }

    fn mob(&self) -> &Mob {
        self.chain.mob(self.id).unwrap()
    }

    fn settle_and_claim_all(&mut self) {
        self.chain.settlement_allocation(self.id).unwrap();
        for member in &self.members {
            self.chain.claim(self.id, member.address()).unwrap();
        }
    }
}

fn mob_error(err: Error) -> MobError {
    err.as_mob_error().cloned().expect("mob error")
}

#[test]
fn three_member_campaign_via_validate_path() {
    let mut w = world(ResaleMode::Validate);

    w.raise();
    assert_eq!(w.mob().phase(), Phase::RaiseSuccess);
    assert_eq!(w.balance(w.mob), ether(3));

    let purchase = w.buy_basic();
    assert_eq!(purchase.spent, ether(3));
    assert_eq!(w.chain.ledger().owner_of(NFT, U256::from(TOKEN)), Some(w.mob));
    assert_eq!(w.balance(w.mob), U256::ZERO);
    assert_eq!(w.balance(w.seller.address()), ether(3));
    assert_eq!(w.mob().phase(), Phase::NftBought);

    let order = w.resale(ether(6));
    let hashes = w
        .chain
        .validate_sell_orders(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();
    assert!(w.chain.order_status(hashes[0]).is_validated);

    w.chain
        .fulfill_order(w.buyer.address(), &order, B256::ZERO, ether(6))
        .unwrap();
    assert_eq!(w.balance(w.mob), ether(6));
    assert_eq!(w.chain.ledger().owner_of(NFT, U256::from(TOKEN)), Some(w.buyer.address()));

    let allocation = w.chain.settlement_allocation(w.id).unwrap();
    assert_eq!(allocation.fee, U256::ZERO);
    assert_eq!(w.mob().phase(), Phase::CanClaim);
    for member in &w.members {
        assert_eq!(w.mob().settlement_of(member.address()), ether(2));
    }

    for member in w.members.iter() {
        let before = w.balance(member.address());
        w.chain.claim(w.id, member.address()).unwrap();
        assert_eq!(w.balance(member.address()), before + ether(2));
        assert_eq!(w.mob().settlement_of(member.address()), U256::ZERO);
    }
    assert_eq!(w.balance(w.mob), U256::ZERO);
    assert_eq!(w.mob().phase(), Phase::AllClaimed);
}

#[test]
fn three_member_campaign_via_register_path() {
    let mut w = world(ResaleMode::Register);
    w.raise();

    let listing = w.listing(TOKEN, ether(3));
    let purchase = w
        .chain
        .buy_order(w.id, w.members[0].address(), &listing, B256::ZERO)
        .unwrap();
    assert_eq!(purchase.token_id, U256::from(TOKEN));

    let order = w.resale(ether(6));
    let digests = w
        .chain
        .register_sell_order(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();
    assert_eq!(
        w.chain.is_valid_signature(w.id, digests[0], &order.signature).unwrap(),
        exchange::EIP1271_MAGIC_VALUE
    );

    // no validation on the exchange: the fill goes through EIP-1271
    let components = order.parameters.to_components(U256::ZERO);
    let hash = w.chain.exchange().get_order_hash(&components);
    assert!(!w.chain.order_status(hash).is_validated);

    w.chain
        .fulfill_order(w.buyer.address(), &order, B256::ZERO, ether(6))
        .unwrap();
    assert_eq!(w.balance(w.mob), ether(6));

    w.settle_and_claim_all();
    assert_eq!(w.balance(w.mob), U256::ZERO);
    assert_eq!(w.mob().phase(), Phase::AllClaimed);
    assert_eq!(w.balance(w.members[2].address()), ether(11));
}

#[test]
fn unregistered_magic_signature_is_rejected() {
    let mut w = world(ResaleMode::Register);
    w.raise();
    w.buy_basic();

    let order = w.resale(ether(6));
    let err = w
        .chain
        .fulfill_order(w.buyer.address(), &order, B256::ZERO, ether(6))
        .unwrap_err();
    assert_eq!(err, Error::Exchange(ExchangeError::BadContractSignature));
}

#[test]
fn authorize_resale_follows_policy() {
    let mut w = world(ResaleMode::Register);
    w.raise();
    w.buy_basic();

    let order = w.resale(ether(7));
    let out = w
        .chain
        .authorize_resale(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();
    assert!(w.mob().is_registered(out[0]));
}

#[test]
fn floor_price_minus_one_wei_rejected_on_both_paths() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();

    let cheap = w.resale(ether(6) - U256::from(1u64));
    let via_validate = w
        .chain
        .validate_sell_orders(w.id, w.creator.address(), std::slice::from_ref(&cheap))
        .unwrap_err();
    let via_register = w
        .chain
        .register_sell_order(w.id, w.creator.address(), std::slice::from_ref(&cheap))
        .unwrap_err();

    assert_eq!(via_validate, via_register);
    assert_eq!(mob_error(via_validate.clone()), MobError::BelowFloorPrice);
    assert_eq!(via_validate.to_string(), "wrong consider.startAmount");
    assert!(w.mob().events().iter().all(|e| !matches!(
        e.payload,
        EventPayload::SellOrderValidated(_) | EventPayload::SellOrderRegistered(_)
    )));
}

#[test]
fn resale_needs_creator_or_oracle() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();
    let order = w.resale(ether(6));

    let err = w
        .chain
        .validate_sell_orders(w.id, w.members[0].address(), std::slice::from_ref(&order))
        .unwrap_err();
    assert!(matches!(mob_error(err), MobError::Unauthorized { .. }));

    w.chain
        .validate_sell_orders(w.id, w.oracle.address(), std::slice::from_ref(&order))
        .unwrap();
}

#[test]
fn resale_before_purchase_is_a_phase_error() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    let now = w.chain.now();
    let order = Listing::new(w.mob, NFT, U256::from(TOKEN), ether(6), now, now.plus(60)).magic();
    let err = w
        .chain
        .validate_sell_orders(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap_err();
    assert!(matches!(mob_error(err), MobError::WrongPhase { .. }));
}

#[test]
fn second_buy_fails_with_already_bought() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();

    let other = w.listing(TOKEN + 1, ether(3));
    let err = w
        .chain
        .buy_order(w.id, w.creator.address(), &other, B256::ZERO)
        .unwrap_err();
    assert_eq!(mob_error(err), MobError::AlreadyBought);
}

#[test]
fn deposit_after_purchase_is_rejected() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();
    let alice = w.members[0].address();
    let err = w.chain.join_pay(w.id, alice, alice, ether(1)).unwrap_err();
    assert!(matches!(mob_error(err), MobError::WrongPhase { .. }));
}

#[test]
fn buy_before_raise_completes_is_rejected() {
    let mut w = world(ResaleMode::Validate);
    let alice = w.members[0].address();
    w.chain.join_pay(w.id, alice, alice, ether(1)).unwrap();
    let order = w.listing(TOKEN, ether(1));
    let err = w
        .chain
        .buy_order(w.id, alice, &order, B256::ZERO)
        .unwrap_err();
    assert!(matches!(mob_error(err), MobError::WrongPhase { .. }));
}

#[test]
fn restrict_mode_refuses_other_token_ids() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    let other = w.listing(TOKEN + 1, ether(3));
    let err = w
        .chain
        .buy_order(w.id, w.creator.address(), &other, B256::ZERO)
        .unwrap_err();
    assert!(matches!(mob_error(err), MobError::WrongTokenId { .. }));
    assert_eq!(w.balance(w.mob), ether(3));
    assert_eq!(w.mob().phase(), Phase::RaiseSuccess);
}

#[test]
fn exchange_failure_reverts_the_purchase() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    let order = w.listing(TOKEN, ether(3));
    w.chain
        .cancel_orders(w.seller.address(), &[order.parameters.to_components(U256::ZERO)])
        .unwrap();

    let err = w
        .chain
        .buy_order(w.id, w.creator.address(), &order, B256::ZERO)
        .unwrap_err();
    assert!(matches!(
        mob_error(err),
        MobError::Exchange(ExchangeError::OrderIsCancelled(_))
    ));
    assert_eq!(w.balance(w.mob), ether(3));
    assert_eq!(w.mob().phase(), Phase::RaiseSuccess);
    assert_eq!(w.chain.ledger().owner_of(NFT, U256::from(TOKEN)), Some(w.seller.address()));
}

#[test]
fn raised_amount_policy_gets_excess_back() {
    let mut config = ProtocolConfig::default();
    config.policy.purchase_value = PurchaseValuePolicy::RaisedAmount;
    config.policy.verify_purchase = true;
    let mut w = world_with(config, 0);
    w.raise();

    let order = w.listing(TOKEN, ether_fraction(25, 1));
    let purchase = w
        .chain
        .buy_order(w.id, w.creator.address(), &order, B256::ZERO)
        .unwrap();
    assert_eq!(purchase.value, ether(3));
    assert_eq!(purchase.spent, ether_fraction(25, 1));
    assert_eq!(w.balance(w.mob), ether_fraction(5, 1));
}

#[test]
fn order_total_above_raise_is_rejected() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    let order = w.listing(TOKEN, ether(4));
    let err = w
        .chain
        .buy_order(w.id, w.creator.address(), &order, B256::ZERO)
        .unwrap_err();
    assert!(matches!(mob_error(err), MobError::InsufficientFunds { .. }));
}

#[test]
fn double_allocation_and_double_claim() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();
    let alice = w.members[0].address();
    assert_eq!(mob_error(w.chain.claim(w.id, alice).unwrap_err()), MobError::NotSettled);
    assert_eq!(
        mob_error(w.chain.settlement_allocation(w.id).unwrap_err()),
        MobError::NotSettled
    );

    let order = w.resale(ether(6));
    w.chain
        .validate_sell_orders(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();
    w.chain
        .fulfill_order(w.buyer.address(), &order, B256::ZERO, ether(6))
        .unwrap();

    w.chain.settlement_allocation(w.id).unwrap();
    assert_eq!(
        mob_error(w.chain.settlement_allocation(w.id).unwrap_err()),
        MobError::AlreadyAllocated
    );

    let before = w.balance(alice);
    w.chain.claim(w.id, alice).unwrap();
    assert_eq!(mob_error(w.chain.claim(w.id, alice).unwrap_err()), MobError::NothingToClaim);
    assert_eq!(w.balance(alice), before + ether(2));
}

#[test]
fn fee_is_paid_to_the_registry_recipient() {
    let mut w = world_with(ProtocolConfig::default(), 250);
    assert_eq!(w.mob().fee_rate().value(), 250);
    w.raise();
    w.buy_basic();

    let order = w.resale(ether(6));
    w.chain
        .validate_sell_orders(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();
    w.chain
        .fulfill_order(w.buyer.address(), &order, B256::ZERO, ether(6))
        .unwrap();

    let allocation = w.chain.settlement_allocation(w.id).unwrap();
    let fee = ether_fraction(15, 2);
    assert_eq!(allocation.fee, fee);
    assert_eq!(w.balance(w.owner.address()), fee);
    for member in &w.members {
        assert_eq!(w.mob().settlement_of(member.address()), (ether(6) - fee) / U256::from(3u64));
    }
}

#[test]
fn weth_resale_proceeds_are_unwrapped() {
    let mut config = ProtocolConfig::default();
    config.chain.weth9 = Some(WETH);
    let mut w = world_with(config, 0);
    w.raise();
    w.buy_basic();

    let mut order = w.resale(ether(6));
    order.parameters.consideration[0].item_type = ItemType::Erc20;
    order.parameters.consideration[0].token = WETH;
    w.chain
        .validate_sell_orders(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();

    let buyer = w.buyer.address();
    let exchange = w.chain.exchange().address();
    w.chain.ledger_mut().wrap_native(WETH, buyer, ether(6)).unwrap();
    w.chain.ledger_mut().approve_erc20(WETH, buyer, exchange, ether(6));
    w.chain.fulfill_order(buyer, &order, B256::ZERO, U256::ZERO).unwrap();
    assert_eq!(w.chain.ledger().erc20_balance(WETH, w.mob), ether(6));

    let allocation = w.chain.settlement_allocation(w.id).unwrap();
    assert_eq!(allocation.balance, ether(6));
    assert_eq!(w.chain.ledger().erc20_balance(WETH, w.mob), U256::ZERO);
}

#[test]
fn failed_raise_refunds_everyone() {
    let mut w = world(ResaleMode::Validate);
    let (alice, bob) = (w.members[0].address(), w.members[1].address());
    w.chain.join_pay(w.id, alice, alice, ether(1)).unwrap();
    w.chain.join_pay(w.id, bob, bob, ether(1)).unwrap();

    assert_eq!(
        mob_error(w.chain.refund(w.id, alice).unwrap_err()),
        MobError::RefundUnavailable
    );
    w.chain.advance_time(86_400);
    w.chain.refund(w.id, alice).unwrap();
    w.chain.refund(w.id, bob).unwrap();

    assert_eq!(w.balance(alice), ether(10));
    assert_eq!(w.balance(w.mob), U256::ZERO);
    assert_eq!(w.mob().phase(), Phase::AllClaimed);
}

#[test]
fn oracle_completes_partial_raise_and_mob_buys_cheaper() {
    let mut w = world(ResaleMode::Validate);
    let alice = w.members[0].address();
    w.chain.join_pay(w.id, alice, alice, ether(2)).unwrap();

    let err = w.chain.complete_raise(w.id, w.creator.address()).unwrap_err();
    assert!(matches!(mob_error(err), MobError::Unauthorized { .. }));
    w.chain.complete_raise(w.id, w.oracle.address()).unwrap();
    assert_eq!(w.mob().phase(), Phase::RaiseSuccess);

    let order = w.listing(TOKEN, ether(2));
    w.chain
        .buy_order(w.id, w.creator.address(), &order, B256::ZERO)
        .unwrap();
    assert_eq!(w.mob().phase(), Phase::NftBought);
}

#[test]
fn rewired_exchange_is_enforced() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    let elsewhere = address!("0000000000000000000000000000000000005ea0");
    w.chain
        .set_exchange_address(w.id, w.creator.address(), elsewhere)
        .unwrap();

    let order = w.listing(TOKEN, ether(3));
    let err = w
        .chain
        .buy_order(w.id, w.creator.address(), &order, B256::ZERO)
        .unwrap_err();
    assert!(matches!(mob_error(err), MobError::ExchangeMismatch { .. }));
}

#[test]
fn wiring_is_frozen_after_purchase() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();

    let fake = address!("00000000000000000000000000000000000fa4e0");
    let creator = w.creator.address();
    let err = w.chain.set_weth9_address(w.id, creator, fake).unwrap_err();
    assert!(matches!(mob_error(err), MobError::WrongPhase { .. }));
    let err = w.chain.set_exchange_address(w.id, creator, fake).unwrap_err();
    assert!(matches!(mob_error(err), MobError::WrongPhase { .. }));
    assert_eq!(w.mob().weth9(), None);

    // proceeds in a token the creator controls are still refused
    let mut order = w.resale(ether(6));
    order.parameters.consideration[0].item_type = ItemType::Erc20;
    order.parameters.consideration[0].token = fake;
    let err = w
        .chain
        .validate_sell_orders(w.id, creator, std::slice::from_ref(&order))
        .unwrap_err();
    assert_eq!(mob_error(err), MobError::UnsupportedProceeds);
    assert_eq!(w.chain.ledger().owner_of(NFT, U256::from(TOKEN)), Some(w.mob));
}

#[test]
fn descending_resale_below_floor_rejected_on_both_paths() {
    let mut w = world(ResaleMode::Validate);
    w.raise();
    w.buy_basic();

    let now = w.chain.now();
    let collapsing = Listing::resale(w.mob(), ether(6), now, now.plus(3_600))
        .unwrap()
        .with_end_price(U256::from(1u64))
        .magic();
    let creator = w.creator.address();
    let via_validate = w
        .chain
        .validate_sell_orders(w.id, creator, std::slice::from_ref(&collapsing))
        .unwrap_err();
    let via_register = w
        .chain
        .register_sell_order(w.id, creator, std::slice::from_ref(&collapsing))
        .unwrap_err();

    let expected = MobError::EndBelowFloorPrice {
        end: U256::from(1u64),
        floor: ether(6),
    };
    assert_eq!(mob_error(via_validate), expected);
    assert_eq!(mob_error(via_register), expected);
}

#[test]
fn descending_resale_settles_at_or_above_floor() {
    let mut w = world(ResaleMode::Register);
    w.raise();
    w.buy_basic();

    let now = w.chain.now();
    let order = Listing::resale(w.mob(), ether(8), now, now.plus(3_600))
        .unwrap()
        .with_end_price(ether(6))
        .magic();
    w.chain
        .register_sell_order(w.id, w.creator.address(), std::slice::from_ref(&order))
        .unwrap();

    w.chain.advance_time(3_599);
    w.chain
        .fulfill_order(w.buyer.address(), &order, B256::ZERO, ether(8))
        .unwrap();
    let proceeds = w.balance(w.mob);
    assert!(proceeds >= ether(6));
    assert!(proceeds < ether(8));
}

#[test]
fn registry_tracks_created_mobs() {
    let w = world(ResaleMode::Validate);
    let registry = w.chain.registry();
    assert_eq!(registry.mobs_total(), 1);
    assert_eq!(registry.mobs_by_id(w.id), Some(w.mob));
    assert!(registry
        .events()
        .iter()
        .any(|e| matches!(&e.payload, EventPayload::MobCreated(c) if c.mob == w.mob && c.creator == w.creator.address())));
}
