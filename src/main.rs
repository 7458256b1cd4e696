//! Mob simulation.
//!
//! Runs full campaigns against the in-memory ledger and exchange: raise, buy,
//! resale through both authorization paths, allocation and claims.
//!
//! Usage: `mob-sim [config.toml]`

use alloy_primitives::{address, Address, B256, U256};
use mob_core::testkit::{Actor, Listing};
use mob_core::*;

const REGISTRY: Address = address!("00000000000000000000000000000000000f4c70");
const NFT: Address = address!("f5de760f2e916647fd766b4ad9e85ff943ce3a2b");
const MARKET_FEE: Address = address!("0000a26b00c1f0df003000390027140000faa719");

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => ProtocolConfig::load(&path),
        None => Ok(ProtocolConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            std::process::exit(1);
        }
    };
    if let Err(err) = config.logging.init() {
        eprintln!("logging disabled: {err}");
    }

    println!("Mob Group-Buy Simulation");
    println!("Chain {}, exchange {}\n", config.chain.chain_id, config.exchange.address);

    let scenarios: [(&str, fn(&ProtocolConfig) -> Result<()>); 4] = [
        ("validate path", scenario_1_validate_path),
        ("register path", scenario_2_register_path),
        ("guard rails", scenario_3_guard_rails),
        ("failed raise", scenario_4_failed_raise),
    ];
    for (name, scenario) in scenarios {
        if let Err(err) = scenario(&config) {
            eprintln!("scenario '{name}' failed: {err}");
            std::process::exit(1);
        }
    }

    println!("\nAll simulations completed successfully.");
}

struct Cast {
    owner: Actor,
    creator: Actor,
    members: [Actor; 3],
    seller: Actor,
    buyer: Actor,
}

fn cast() -> Result<Cast> {
    Ok(Cast {
        owner: Actor::new("owner", 1)?,
        creator: Actor::new("creator", 2)?,
        members: [Actor::new("alice", 3)?, Actor::new("bob", 4)?, Actor::new("carol", 5)?],
        seller: Actor::new("seller", 6)?,
        buyer: Actor::new("buyer", 7)?,
    })
}

fn eth(wei: U256) -> String {
    to_ether(wei).map(|d| d.to_string()).unwrap_or_else(|| wei.to_string())
}

/// Chain with a funded cast, the seller holding token 1024, and a 3 ETH mob.
fn setup(config: &ProtocolConfig, cast: &Cast, mode: ResaleMode) -> Result<(Chain, MobId)> {
    let mut config = config.clone();
    config.policy.resale_mode = mode;

    let start = Timestamp::now();
    let mut chain = Chain::new(config, REGISTRY, cast.owner.address(), start)?;
    for member in &cast.members {
        chain.ledger_mut().fund(member.address(), ether(10));
    }
    chain.ledger_mut().fund(cast.buyer.address(), ether(10));
    chain.ledger_mut().mint_nft(NFT, U256::from(1024u64), cast.seller.address())?;
    let exchange = chain.exchange().address();
    chain
        .ledger_mut()
        .set_approval_for_all(NFT, cast.seller.address(), exchange, true);

    let (id, address) = chain.create_mob(
        cast.creator.address(),
        CreateMobParams {
            token: NFT,
            token_id: Some(U256::from(1024u64)),
            raise_target: ether(3),
            take_profit_price: ether(6),
            stop_loss_price: ether(1),
            raise_deadline: start.plus(86_400),
            deadline: start.plus(7 * 86_400),
            mode: TargetMode::Restrict,
            name: "ape together".to_string(),
        },
    )?;
    println!("  {id} deployed at {address}");
    Ok((chain, id))
}

fn raise(chain: &mut Chain, cast: &Cast, id: MobId) -> Result<()> {
    for member in &cast.members {
        let raised = chain.join_pay(id, member.address(), member.address(), ether(1))?;
        println!("  {} joins with 1 ETH, raised {} ETH", member.name, eth(raised));
    }
    println!("  Phase: {}", chain.mob(id)?.phase());
    Ok(())
}

fn buy(chain: &mut Chain, cast: &Cast, id: MobId, basic: bool) -> Result<()> {
    let now = chain.now();
    let listing = Listing::new(
        cast.seller.address(),
        NFT,
        U256::from(1024u64),
        ether_fraction(29, 1),
        now,
        now.plus(3_600),
    )
    .with_fee(MARKET_FEE, ether_fraction(1, 1));
    let order = listing.sign(&cast.seller.signer, chain.exchange())?;

    let purchase = if basic {
        let params = to_basic_order_parameters(&order, BasicOrderRoute::EthToErc721, None, &[])?;
        chain.buy_basic_order(id, cast.creator.address(), &params)?
    } else {
        chain.buy_order(id, cast.creator.address(), &order, B256::ZERO)?
    };
    println!(
        "  Bought token {} for {} ETH (order {})",
        purchase.token_id,
        eth(purchase.spent),
        purchase.order_hash
    );
    Ok(())
}

fn sell_and_settle(chain: &mut Chain, cast: &Cast, id: MobId) -> Result<()> {
    let now = chain.now();
    let mob = chain.mob(id)?;
    let listing = Listing::resale(mob, ether(6), now, now.plus(3_600))?;
    let order = listing.magic();

    let authorized = chain.authorize_resale(id, cast.creator.address(), std::slice::from_ref(&order))?;
    println!("  Resale at 6 ETH authorized ({:?} mode): {}", chain.config().policy.resale_mode, authorized[0]);

    chain.fulfill_order(cast.buyer.address(), &order, B256::ZERO, ether(6))?;
    println!(
        "  Buyer fills the resale, mob balance {} ETH",
        eth(chain.ledger().balance_of(chain.mob(id)?.address()))
    );

    let allocation = chain.settlement_allocation(id)?;
    println!(
        "  Allocated {} ETH, fee {} ETH, dust {} wei",
        eth(allocation.distributed),
        eth(allocation.fee),
        allocation.dust
    );

    for member in &cast.members {
        let paid = chain.claim(id, member.address())?;
        println!("  {} claims {} ETH", member.name, eth(paid));
    }
    println!("  Phase: {}\n", chain.mob(id)?.phase());
    Ok(())
}

/// Full run with the mob validating its resale order on the exchange.
fn scenario_1_validate_path(config: &ProtocolConfig) -> Result<()> {
    println!("Scenario 1: Raise, basic order buy, validated resale\n");
    let cast = cast()?;
    let (mut chain, id) = setup(config, &cast, ResaleMode::Validate)?;
    raise(&mut chain, &cast, id)?;
    buy(&mut chain, &cast, id, true)?;
    sell_and_settle(&mut chain, &cast, id)
}

/// Full run with the mob registering its resale digest for EIP-1271.
fn scenario_2_register_path(config: &ProtocolConfig) -> Result<()> {
    println!("Scenario 2: Raise, full order buy, registered resale\n");
    let cast = cast()?;
    let (mut chain, id) = setup(config, &cast, ResaleMode::Register)?;
    raise(&mut chain, &cast, id)?;
    buy(&mut chain, &cast, id, false)?;
    sell_and_settle(&mut chain, &cast, id)
}

/// Rejections: over-quota deposit, double buy, underpriced resale.
fn scenario_3_guard_rails(config: &ProtocolConfig) -> Result<()> {
    println!("Scenario 3: Guard rails\n");
    let cast = cast()?;
    let (mut chain, id) = setup(config, &cast, ResaleMode::Validate)?;

    let alice = cast.members[0].address();
    if let Err(err) = chain.join_pay(id, alice, alice, ether(4)) {
        println!("  4 ETH deposit rejected: {err}");
    }
    raise(&mut chain, &cast, id)?;
    buy(&mut chain, &cast, id, true)?;
    if let Err(err) = buy(&mut chain, &cast, id, true) {
        println!("  Second buy rejected: {err}");
    }

    let now = chain.now();
    let cheap = Listing::resale(chain.mob(id)?, ether(6) - U256::from(1u64), now, now.plus(3_600))?.magic();
    for mode in [ResaleMode::Validate, ResaleMode::Register] {
        let result = match mode {
            ResaleMode::Validate => chain.validate_sell_orders(id, cast.creator.address(), std::slice::from_ref(&cheap)),
            ResaleMode::Register => chain.register_sell_order(id, cast.creator.address(), std::slice::from_ref(&cheap)),
        };
        if let Err(err) = result {
            println!("  {mode:?} at floor - 1 wei rejected: {err}");
        }
    }
    println!();
    Ok(())
}

/// Raise misses its deadline and members take their deposits back.
fn scenario_4_failed_raise(config: &ProtocolConfig) -> Result<()> {
    println!("Scenario 4: Failed raise and refunds\n");
    let cast = cast()?;
    let (mut chain, id) = setup(config, &cast, ResaleMode::Validate)?;

    for member in &cast.members[..2] {
        chain.join_pay(id, member.address(), member.address(), ether(1))?;
    }
    chain.advance_time(86_400);
    println!("  Raise deadline passed at {} of 3 ETH", eth(chain.mob(id)?.raised_amount()));

    for member in &cast.members[..2] {
        let refunded = chain.refund(id, member.address())?;
        println!("  {} refunded {} ETH", member.name, eth(refunded));
    }
    println!("  Phase: {}", chain.mob(id)?.phase());
    Ok(())
}
