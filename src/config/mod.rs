//! Configuration module for Thread-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All settings have defaults, so a file is optional; the binary layers
//! command-line overrides on top before validating.
//!
//! # Example
//!
//! ```no_run
//! use thread_harvest::config::load_validated_config;
//! use std::path::Path;
//!
//! let config = load_validated_config(Path::new("harvest.toml")).unwrap();
//! println!("Walk cap: {}", config.discovery.max_seq_walk);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DelayWindow, DiscoveryConfig, FetchConfig, OutputConfig, PacingConfig, ParserConfig,
    SourceConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_validated_config, parse_config,
};
pub use validation::{validate, MAX_RETRIES_PER_IDENTITY};
