//! Task domain model.
//!
//! # Responsibility
//! - Define the task record persisted in the durable slot.
//! - Own text normalization shared by add and edit paths.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Task text is always normalized and non-empty.

pub mod task;
