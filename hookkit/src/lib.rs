//! Policy hooks for coding-agent hosts.
//!
//! Each process invocation handles one lifecycle event: the raw JSON on stdin
//! is normalized, the enabled features for that event run in priority order,
//! and the aggregated result is rendered for the host. The architecture
//! enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (event normalization, config
//!   merging, result aggregation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, git, process execution).
//!   Isolated to enable mocking in tests.
//!
//! [`registry`] and [`features`] define what can run, [`pipeline`] runs it,
//! [`output`] renders the outcome and [`hook`] ties them together for the CLI.

pub mod core;
pub mod exit_codes;
pub mod features;
pub mod hook;
pub mod io;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod registry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
