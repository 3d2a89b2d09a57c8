//! CLI command implementations.

pub mod offline;
pub mod quote;
pub mod remote;
