//! Deterministic, pure logic shared by the hook pipeline.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod edits;
pub mod event;
pub mod merge;
pub mod types;
