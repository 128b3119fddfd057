//! Core types shared by the lakescan bridge crates: the error taxonomy,
//! reader tunables, and the engine IO configuration.
//!
//! This crate stays free of async/runtime/IO concerns; those live in
//! `lakescan-engine` and `lakescan-dataset`.

pub mod config;
pub mod error;

pub use config::{IoConfig, IoConfigBuilder, ReaderOptions};
pub use error::{Error, Result};
