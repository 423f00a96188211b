//! # nightrelay-domain
//!
//! Pure domain model for the nightrelay relay controller.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps and their wire format
//! - Define the **relay state** (`on`/`off`) and its persisted record
//! - Define **history entries** (the audit trail of transitions)
//! - Define the **allowed-hours policy** that gates state-changing actions
//! - Parse the **external feed** cell that drives deduplicated triggers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod feed;
pub mod history;
pub mod relay;
pub mod window;
