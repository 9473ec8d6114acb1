//! unmacro Core
//!
//! Core types and interfaces for the unmacro macro expansion engine.

pub mod compdb;
pub mod config;
pub mod error;
pub mod location;
pub mod types;

pub use config::{Config, ReconciliationOptions};
pub use error::{Error, Result};
pub use location::FileLinePosition;
pub use types::*;
