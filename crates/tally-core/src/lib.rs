//! Core types, errors, and configuration for the tally workspace.
//!
//! This crate provides the foundational types shared by the scanner, the
//! fixture generator, the reporting sinks, and the CLI:
//!
//! - [`ScanResult`] - the path to match-count mapping produced by a scan
//! - [`Pattern`] - the compiled matcher a scan is run with
//! - [`Config`] - JSON-loadable settings for scanning and reporting
//! - Error types for configuration, pattern compilation, and merging

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod pattern;
pub mod result;

pub use config::{Config, ReportConfig, ReportFormat, ScanConfig, TraversalOrder};
pub use error::{ConfigError, MergeConflict, PatternError};
pub use pattern::{Pattern, compile_pattern};
pub use result::ScanResult;
