//! HTTP+JSON control API for the Faultline fault-injection core.
//!
//! A test harness drives the endpoints here to arm failure scenarios,
//! inspect the recorded call history, and run sequence/count assertions
//! after a test run. The proxy data plane (owned by the interception
//! engine) runs on a separate port and shares the same
//! [`faultline_core::FaultlineCore`].

#![forbid(unsafe_code)]

pub mod server;

pub use server::{router, ControlServer};
