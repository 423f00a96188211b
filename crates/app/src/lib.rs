//! # nightrelay-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `KeyValueStore`: durable string map with optional per-key expiry
//!   - `Clock`: wall-clock time source
//!   - `FeedSource`: fetches the external tabular feed
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RelayService`: transitions, auto-off, polling, status
//!   - `HistoryLedger`: capped newest-first audit trail
//!   - `FeedDeduplicator`: at-most-once handling of feed signals
//! - Provide **in-process infrastructure** that doesn't need IO
//!   (`MemoryStore`, `SystemClock`, `ManualClock`)
//!
//! ## Dependency rule
//! Depends on `nightrelay-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod clock;
pub mod memory_store;
pub mod ports;
pub mod services;
