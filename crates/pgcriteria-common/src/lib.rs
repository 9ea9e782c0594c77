//! Common utilities for pgcriteria
//!
//! This crate provides the error type shared by every pgcriteria crate.

pub mod error;

pub use error::{CriteriaError, Result};
