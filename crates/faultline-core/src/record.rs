//! Call recording and the wire-decoder seam.
//!
//! The Thrift wire decoder is an external collaborator; this module only
//! defines the trait it implements and turns its output into history
//! records. Decode failures are logged and skipped, never surfaced on the
//! proxy path.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::FaultlineResult;
use crate::history::{CallRecord, MessageType};
use crate::registry::FaultlineCore;

/// A structured RPC call produced by the external decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// RPC method name.
    pub method: String,
    /// Thrift message type.
    pub message_type: MessageType,
    /// Protocol sequence id.
    pub sequence_id: i32,
    /// Decoded top-level fields of the payload.
    pub fields: Map<String, Value>,
}

/// Wire-format decoder supplied by the interception integration.
pub trait ThriftDecoder: Send + Sync {
    /// Decode a request or response payload into a structured call.
    fn decode(&self, payload: &[u8]) -> FaultlineResult<DecodedCall>;

    /// One-line rendering of a decoded call for diagnostics.
    fn format(&self, call: &DecodedCall) -> String {
        format!(
            "{} (type={:?}, seq={}, fields={})",
            call.method,
            call.message_type,
            call.sequence_id,
            call.fields.len()
        )
    }
}

/// Record a classified Thrift request. Empty payloads are ignored; decode
/// failures are logged and excluded from history.
pub fn record_thrift_request(core: &FaultlineCore, decoder: &dyn ThriftDecoder, payload: &[u8]) {
    if payload.is_empty() {
        return;
    }

    match decoder.decode(payload) {
        Ok(call) => {
            debug!(call = %decoder.format(&call), "recorded thrift call");
            core.record(CallRecord::thrift(
                call.method,
                call.message_type,
                call.sequence_id,
                call.fields,
            ));
        }
        Err(err) => {
            warn!(error = %err, "failed to decode thrift request, skipping record");
        }
    }
}

/// Decode and log a Thrift response for diagnostics. Responses are never
/// appended to history.
pub fn log_thrift_response(decoder: &dyn ThriftDecoder, payload: &[u8]) {
    if payload.is_empty() {
        return;
    }

    match decoder.decode(payload) {
        Ok(call) => debug!(call = %decoder.format(&call), "thrift response"),
        Err(err) => debug!(error = %err, "undecodable thrift response"),
    }
}
