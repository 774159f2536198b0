//! mis-checker: reconciles monthly catering and vendor MIS workbooks.
//!
//! The `recon` module holds the reconciliation engine, `rules` maps sheet names to rule sets, and
//! `ingest` reads sheets from workbooks on disk. The remaining modules make up the command-line
//! program.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod ingest;
pub mod model;
pub mod recon;
pub mod rules;
mod utils;


pub use config::Config;
pub use error::Error;
pub use error::ErrorType;
pub use error::Result;
