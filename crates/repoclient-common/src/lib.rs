//! Repoclient Common Library
//!
//! Shared ambient infrastructure for the repoclient workspace.
//!
//! Currently this is the logging setup used by the command-line client:
//! a configurable tracing subscriber with console and rotating file
//! output, driven by environment variables or an explicit [`logging::LogConfig`].

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod logging;
