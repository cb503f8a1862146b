//! Terminal front-end for the task list.
//!
//! # Responsibility
//! - Resolve configuration and wire the core controller to stdin/stdout.
//! - Keep terminal concerns (parsing, drawing, prompts) out of the core.

pub mod commands;
pub mod config;
pub mod repl;
pub mod screen;
