//! Command implementations

pub mod bench;
pub mod import;
pub mod search;
pub mod util;
