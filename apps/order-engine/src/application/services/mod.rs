//! Application Services
//!
//! Services orchestrate domain logic and the driven ports to fulfill the
//! engine's commands and queries.

mod account;
mod credential_vault;
mod order_execution;
mod symbols;

pub use account::{AccountService, DEFAULT_DEPTH_LIMIT};
pub use credential_vault::CredentialVault;
pub use order_execution::OrderExecutionService;
pub use symbols::SymbolService;
