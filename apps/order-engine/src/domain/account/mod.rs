//! Account Bounded Context
//!
//! Read-only views of exchange state fetched on demand, and the per-user
//! API keys used to act on the exchange.

mod api_keys;
mod balance;
mod depth;
mod repository;

pub use api_keys::ApiKeys;
pub use balance::{AssetBalance, Balance};
pub use depth::{Depth, PriceLevel};
pub use repository::ApiKeyRepository;
