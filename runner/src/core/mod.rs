//! Pure classification and aggregation logic. No I/O.

pub mod outcome;
pub mod report;
