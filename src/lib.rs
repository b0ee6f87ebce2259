//! Purpose: Shared core library crate used by the `celerite` CLI and tests.
//! Exports: `api` (stable surface) and `core` (racing, storage, helpers, errors).
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: Helpers are independent; none depends on another's state.
#![allow(clippy::result_large_err)]
pub mod api;
pub mod core;
