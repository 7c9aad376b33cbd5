//! CLI subcommand implementations.

pub mod inspect;
pub mod scrape;
