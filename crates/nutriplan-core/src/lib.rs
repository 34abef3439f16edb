//! Core types and algorithms for the nutriplan diet planner.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! storage backend and the CLI depend on it; it depends on nothing of theirs.
//!
//! Leaves first: [`identity`] and [`lineitem`] feed [`partition`], which the
//! [`session`] and [`wizard`] build on. [`history`] stands on its own and is
//! reused for both plan edits and categorization edits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod history;
pub mod identity;
pub mod lineitem;
pub mod notify;
pub mod partition;
pub mod plan;
pub mod product;
pub mod session;
pub mod store;
pub mod wizard;

pub use error::{Error, Result};
