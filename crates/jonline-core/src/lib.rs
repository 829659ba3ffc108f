//! Core types and trait definitions for the Jonline post cache.
//!
//! This crate is deliberately free of runtime and transport dependencies.
//! The store and the CLI depend on it; it depends on nothing proprietary.

pub mod error;
pub mod listing;
pub mod post;
pub mod source;
pub mod status;

pub use error::{Error, Result};
