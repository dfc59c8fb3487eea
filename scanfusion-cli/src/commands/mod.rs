//! Subcommand implementations

pub mod formats;
pub mod rotate;
pub mod scan;
