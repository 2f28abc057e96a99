//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A missing file is not an error: [`Config::default`] describes a complete run.
//!
//! # Example
//!
//! ```no_run
//! use conference_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Harvesting from: {}", config.site.base_url);
//! ```

mod overrides;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetchConfig, OutputConfig, SessionEntry, SiteConfig, UserAgentConfig,
};

pub use overrides::ConfigOverrides;

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_DELAY_SECS};
