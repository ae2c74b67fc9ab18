//! Shared test utilities for devtools-ext
//!
//! This module provides common helpers for integration tests:
//! - Deterministic timestamps for persisted records
//! - Temporary SQLite stores and overlay test components

pub mod determinism;
pub mod fixtures;
