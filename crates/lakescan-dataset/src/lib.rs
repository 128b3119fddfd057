//! Framework-facing half of the lakescan bridge.
//!
//! [`reader::DataReader`] owns one engine reader and serializes asynchronous
//! batch pulls; [`fragment::TableFragment`] is the schedulable scan unit the
//! host framework enumerates, adapting the pull API into an async batch
//! stream.

pub mod fragment;
mod partition;
pub mod reader;

pub use fragment::{BatchStream, Fragment, ScanOptions, TableFragment, FRAGMENT_TYPE_NAME};
pub use reader::DataReader;
