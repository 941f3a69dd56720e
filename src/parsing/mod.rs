//! Turns raw CSV text into typed records. Malformed rows are dropped, never reported as errors.

pub mod accidents;
pub mod bike_counts;
