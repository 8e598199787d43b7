//! quotecache library
//!
//! Exposes the freshness cache, the quote retrieval flow, and the CLI
//! plumbing for use by the binary and integration tests.

pub mod cache;
pub mod cli;
pub mod quote;
pub mod report;
