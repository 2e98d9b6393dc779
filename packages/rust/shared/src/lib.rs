//! Shared types, error model, and configuration for convarchive.
//!
//! This crate is the foundation depended on by all other convarchive crates.
//! It provides:
//! - [`ConvArchiveError`], the unified error type
//! - Domain types ([`Message`], [`Role`], [`Pair`], [`PairFileSet`])
//! - Pair-file naming ([`question_file_name`], [`answer_file_name`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConvertConfig, MergeConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ConvArchiveError, Result};
pub use types::{
    FileRole, Message, NamingConvention, Pair, PairFile, PairFileSet, PairFiles, Role,
    answer_file_name, question_file_name,
};
