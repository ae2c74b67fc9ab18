//! Integration tests for devtools-ext
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod overlay_lifecycle;
