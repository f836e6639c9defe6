//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against the recording mock data plane.  All tests run on the host
//! with no forwarding engine required.

mod lifecycle_tests;
mod mock_dp;
mod serialize_tests;
mod transaction_tests;
