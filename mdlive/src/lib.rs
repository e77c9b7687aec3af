//! Expose mdlive's internal API for use in integration tests. The supported
//! library surface is the `mdlive-commonmark` crate.
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
