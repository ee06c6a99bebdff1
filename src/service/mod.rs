//! Service layer for the skill ladder
//!
//! This module wires the rating engine to storage and exposes the entry
//! points the command-line caller uses.

pub mod ladder;

pub use ladder::LadderService;
