//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define the single `Task` record and its creation field set.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod task;
