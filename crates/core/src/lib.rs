//! Shared types for the gridgate policy engine: entity identifiers, the
//! node-kind discriminator, the common error enum and env-driven config.

pub mod config;
pub mod entity;
pub mod error;

pub use config::Config;
pub use entity::*;
pub use error::*;
