//! Fallback stream symbols.

use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Fallback symbols to stream when no orders are active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolsConfig {
    /// Symbols, e.g. `BTCUSDT`.
    #[serde(default = "default_symbols")]
    pub defaults: Vec<String>,
}

impl SymbolsConfig {
    /// Configured symbols, normalized.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.defaults.iter().map(Symbol::new).collect()
    }
}

impl Default for SymbolsConfig {
    fn default() -> Self {
        Self {
            defaults: default_symbols(),
        }
    }
}

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
}
