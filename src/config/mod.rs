// src/config/mod.rs

//! Configuration loading and validation for sitedag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, or fall back to defaults (`loader.rs`).
//! - Validate directory roles and tool options (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default, DEFAULT_CONFIG_FILE};
pub use model::{
    CommentPolicy, ConfigFile, CssSection, DirsSection, JsSection, RawConfigFile, ServerSection,
    TemplateSection,
};
pub use validate::{parse_browser_version, parse_compatibility};
