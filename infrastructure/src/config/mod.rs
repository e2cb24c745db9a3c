//! Configuration file loading for roundtable
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `ROUNDTABLE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./roundtable.toml`
//! 4. Global: `~/.config/roundtable/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileKnowledgeConfig, FileLlmConfig, FileLoggingConfig, FileNewsConfig,
    FileOrchestrationConfig, FileRoleConfig, FileStoreConfig, FileToolsConfig, StoreKind,
    build_catalog,
};
pub use loader::{ConfigError, ConfigLoader};
