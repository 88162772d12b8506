//! Infrastructure Configuration
//!
//! Dependency injection container wiring adapters into services.

pub mod container;

pub use container::Container;
