//! Test utilities and helpers for the bitkv project.
//!
//! This crate provides:
//! - Seeded data generation for bit patterns, raw store buffers and offsets
//! - Temporary fixture files (e.g. JSON configuration documents)
//!
//! # Usage
//!
//! This crate is intended for use within the bitkv test suites only.

pub mod data_gen;
pub mod fixtures;
