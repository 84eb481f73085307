//! Property-based tests for path resolution and pagination

mod round_trip;
