//! # Operations
//!
//! The business logic of the workspace core. Each operation family lives in
//! its own submodule and is a set of free async functions, generic over
//! [`crate::store::StoreClient`], that load records, validate invariants,
//! and write back. Nothing here formats output or touches a transport; the
//! [`crate::api::Workspace`] facade is the entry point and the HTTP layer
//! above it owns presentation.
//!
//! Because the backing store has no transactions, every multi-step mutation
//! is an ordered sequence of independent round-trips: primary record write
//! first, then the counter delta, then the tag-index delta. A failure after
//! the primary write leaves the derived aggregates stale but recoverable;
//! [`repair`] recomputes them from a full scan.
//!
//! ## Modules
//!
//! - [`containers`]: container lifecycle, counters, cover upload
//! - [`folders`]: folder lifecycle and re-parenting
//! - [`entries`]: entry mutations and their counter/tag fan-out
//! - [`tags`]: the per-container tag reference-count index
//! - [`browse`]: immediate children of a cursor
//! - [`search`]: recursive subtree search
//! - [`repair`]: aggregate reconciliation from a full scan

pub mod browse;
pub mod containers;
pub mod entries;
pub mod folders;
pub mod repair;
pub mod search;
pub mod tags;
