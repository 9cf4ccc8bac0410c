//! CLI subcommands

pub mod ask;
pub mod train;
