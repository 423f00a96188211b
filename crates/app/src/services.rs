//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod feed_dedup;
pub mod history_ledger;
pub mod relay_service;

#[cfg(test)]
pub(crate) mod testing;
