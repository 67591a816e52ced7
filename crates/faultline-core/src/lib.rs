//! # Faultline Core
//!
//! Fault-injection control layer for an HTTP-intercepting proxy used to
//! test a SQL-warehouse driver's resilience. An external harness enables
//! named failure scenarios through the control API; the proxy's
//! per-exchange hooks call into this crate to classify traffic, inject
//! failures exactly once per enabled scenario, and record every observed
//! RPC call for later sequence and count assertions.
//!
//! ## Modules
//!
//! - [`classify`]: pure request classification (CloudFetch download,
//!   Thrift call, other)
//! - [`scenario`]: scenario templates, actions, and override merging
//! - [`registry`]: the lock-protected registry + history pair shared by the
//!   control plane and the proxy callbacks
//! - [`inject`]: one-shot failure injection for CloudFetch downloads
//! - [`record`]: call recording and the external wire-decoder seam
//! - [`verify`]: declarative assertions over the recorded method sequence
//! - [`hooks`]: the per-exchange callback surface the interception engine
//!   drives
//!
//! ## Concurrency
//!
//! Proxy callbacks run one logical task per in-flight exchange; the
//! control API listener is scheduled independently. Exactly one mutex
//! guards the shared pair {scenario map, call history} and is held only
//! for the critical operation, never across a delay suspension or an
//! upstream wait.

#![forbid(unsafe_code)]

pub mod classify;
pub mod error;
pub mod history;
pub mod hooks;
pub mod inject;
pub mod record;
pub mod registry;
pub mod scenario;
pub mod verify;

pub use classify::{classify, RequestClass};
pub use error::{FaultlineError, FaultlineResult};
pub use history::{CallRecord, MessageType, MAX_HISTORY};
pub use hooks::{InterceptHook, RequestHead};
pub use inject::{FlowAction, SyntheticResponse};
pub use record::{DecodedCall, ThriftDecoder};
pub use registry::{FaultlineCore, ScenarioStatus, ScenarioSummary};
pub use scenario::{
    builtin_scenarios, ScenarioAction, ScenarioConfig, ScenarioOverrides, ScenarioTemplate,
    TargetOperation,
};
pub use verify::{VerificationRequest, VerificationResult};
