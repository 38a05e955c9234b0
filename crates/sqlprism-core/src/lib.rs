//! # SQLPrism Core
//!
//! Core types and implementations for the SQLPrism SQL compiler front end:
//! tokenizer, parser, semantic checker and rule-based optimizer.
//!
//! **Note:** This crate is an internal implementation detail of SQLPrism.
//! Use the [`sqlprism`](https://crates.io/crates/sqlprism) crate instead.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;

pub use error::{Error, Result};
