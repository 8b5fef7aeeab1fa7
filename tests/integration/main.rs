//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the system process
//! against mock collaborators.  All tests run on the host with no real
//! hardware required.

mod dispatcher_tests;
mod schedule_tests;
