// mob-core: group buying of single NFTs through a Seaport-style exchange.
// depositors pool native currency, the mob buys one NFT, resells it above a floor
// price and splits the proceeds pro rata after a fee.
// all computation is deterministic; the ledger and the exchange are in-memory.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: MobId, Timestamp, Bps, Phase, wei helpers
//   2.x  order.rs: Seaport order model, EIP-712 hashing, basic order projection
//   3.x  exchange/: Exchange trait, EIP-1271 seam, simulated Seaport (mocked), signer
//   7.x  config.rs: chain, exchange domain, fees, mob policies, logging, env presets
//   8.x  mob/: mob engine: deposits, purchase, resale, settlement, admin
//   9.x  ledger.rs: balances, ERC-20, ERC-721 and clock (mocked)
//   10.x registry.rs: mob factory, fee rate, oracles
//   11.x events.rs: per-contract event logs
//   12.x chain.rs: transaction facade with rollback

// core modules
pub mod mob;
pub mod order;
pub mod registry;
pub mod types;

// host modules
pub mod chain;
pub mod exchange;
pub mod ledger;

// integration modules
pub mod config;
pub mod error;
pub mod events;
pub mod testkit;

// re exports for convenience
pub use chain::Chain;
pub use config::{Environment, FeeBase, MobPolicy, ProtocolConfig, PurchaseValuePolicy, ResaleMode};
pub use error::{Error, Result};
pub use events::{Event, EventPayload};
pub use exchange::{Exchange, ExchangeError, OrderSigner, SimulatedSeaport};
pub use ledger::Ledger;
pub use mob::{Allocation, Mob, MobError, Purchase};
pub use order::*;
pub use registry::{CreateMobParams, MobRegistry, RegistryError};
pub use types::*;
