//! Multi-account batch runner for an AutoMihoyoBBS-style task engine.
//!
//! Discovers per-account config files, drives the task engine once per
//! account, aggregates the outcomes into buckets, and pushes an end-of-run
//! summary. The architecture enforces a strict separation:
//!
//! - **[`core`]**: pure classification and aggregation. No I/O, fully
//!   testable in isolation.
//! - **[`io`]**: side-effecting collaborators (discovery, the engine
//!   subprocess, notification). Isolated behind traits to enable scripting
//!   in tests.
//!
//! [`batch`] coordinates core logic with the engine collaborator to
//! implement the sequential run.

pub mod batch;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
