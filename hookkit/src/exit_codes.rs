//! Stable exit codes for hook entry points.

/// Proceed: nothing blocked (warnings and context may still be emitted).
pub const OK: i32 = 0;
/// The input could not be read or normalized, or an internal error occurred.
pub const INTERNAL: i32 = 1;
/// A feature blocked the action.
pub const BLOCK: i32 = 2;
