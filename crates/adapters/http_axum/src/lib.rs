//! # nightrelay-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** used by the control page
//!   (`/status`, `/history`, `/trigger`, `/trigger_on`, `/trigger_off`)
//! - Serve the **device poll endpoint** (`/poll`, plain text `on`/`off`)
//! - Serve the legacy **pulse webhook** (`GET /trigger`)
//! - Serve the static **control page** at `/`
//! - Map application errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `nightrelay-app` (for port traits and services) and
//! `nightrelay-domain` (for types used in response mapping). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod page;
pub mod router;
pub mod state;
