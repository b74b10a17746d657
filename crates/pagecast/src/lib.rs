// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]
// Commands report results on stdout and errors on stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

//! pagecast - render PDF pages through a content-addressed cache
//!
//! The binary is a thin shell over this library: [`cli`] parses arguments,
//! [`config`] loads `pagecast.toml`, and [`commands`] wires the cache
//! registry and the cache-aware renderer together.

pub mod cli;
pub mod commands;
pub mod config;
pub mod tracing;
