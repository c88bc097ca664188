//! Stable exit codes for the batch runner.
//!
//! The overall batch status doubles as the process exit code so captcha-only
//! runs stay distinguishable from failed runs at the process boundary.

/// Every account succeeded or was intentionally skipped.
pub const OK: i32 = 0;
/// At least one account failed or errored; attention required.
pub const ATTENTION: i32 = 1;
/// No failures, but at least one account waits on a manual captcha.
pub const CAPTCHA_PENDING: i32 = 2;
