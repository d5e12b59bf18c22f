//! Transfer Engine
//!
//! Moves funds between two accounts as one atomic unit of work.
//!
//! # Flow
//!
//! ```text
//! validate (no store access) → lock both rows in lock order → check funds
//!     → write source → write target → commit
//! ```
//!
//! Any failure after the first lock rolls the whole unit back, so a transfer
//! produces two balance changes or none.
//!
//! # Deadlock freedom
//!
//! Both rows are always locked in the order given by [`lock_order`], so two
//! transfers over the same pair of accounts, in either direction, request the
//! locks in the same sequence.

pub mod engine;
pub mod types;

pub use engine::TransferEngine;
pub use types::{LockOrder, Transfer, TransferRequest, lock_order};
