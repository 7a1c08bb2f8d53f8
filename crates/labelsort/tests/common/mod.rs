//! Shared test utilities for labelsort integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated job execution with temp directories
//! - Builders writing real manifest spreadsheets and label PDFs

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
