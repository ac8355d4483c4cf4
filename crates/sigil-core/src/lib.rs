//! Sigil Core Library
//!
//! Shared functionality for embedding the Sigil envelope protocol:
//! - Configuration resolution and hierarchy
//! - Tracing/logging initialisation
//! - Common error types
//!
//! The protocol itself lives in `sigil-crypto`; this crate resolves the
//! configuration it is constructed from.

pub mod config;
pub mod error;
pub mod tracing_init;

pub use config::{Config, load_config};
pub use error::{Error, Result};
pub use tracing_init::init_tracing;
