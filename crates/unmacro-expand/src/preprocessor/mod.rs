//! C Preprocessor Integration
//!
//! Invokes a translation unit's compiler in preprocess-only mode and reads
//! the line markers in its output.

pub mod invoker;
pub mod markers;

pub use invoker::{preprocess, run_checked};
pub use markers::{GnuLineMarkers, LineMarkerDialect, PreprocessedLine};
