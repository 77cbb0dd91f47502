//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives one transport binding
//! end to end against mock adapters.  All tests run on the host (x86_64)
//! with no real hardware required.

mod http_flow_tests;
mod mock_hw;
mod serial_flow_tests;
