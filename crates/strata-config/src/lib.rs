//! Configuration for the Strata world store.
//!
//! Settings persist to disk as a RON file and are forward/backward compatible:
//! missing fields take their defaults and unknown fields are ignored.

mod config;
mod error;

pub use config::{CacheConfig, Config, DebugConfig, IoMode, StorageConfig, WorldConfig};
pub use error::ConfigError;
