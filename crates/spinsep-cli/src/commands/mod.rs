//! CLI command implementations.

pub mod analyze;
pub mod common;
pub mod inspect;
pub mod simulate;
pub mod version;
