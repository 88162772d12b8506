//! Stop enforcement domain services.

mod trigger_rule;

pub use trigger_rule::TriggerRule;
