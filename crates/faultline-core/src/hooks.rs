//! Engine-facing hook surface.
//!
//! The interception engine owns the TCP/TLS sessions and calls
//! [`InterceptHook::on_request`] once per in-flight exchange before
//! forwarding, applying the returned [`FlowAction`] with its own flow
//! mutation primitives. Hook invocations may run concurrently; all shared
//! state lives behind the core mutex.

use std::sync::Arc;

use crate::classify::{classify, RequestClass};
use crate::history::CallRecord;
use crate::inject::{inject_cloudfetch, FlowAction};
use crate::record::{log_thrift_response, record_thrift_request, ThriftDecoder};
use crate::registry::FaultlineCore;

/// The request line fields the hook needs for classification.
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// HTTP method.
    pub method: String,
    /// Request host.
    pub host: String,
    /// Request path.
    pub path: String,
    /// Full URL, recorded for cloud downloads.
    pub url: String,
}

/// Per-exchange callbacks wired into the interception engine.
pub struct InterceptHook {
    core: Arc<FaultlineCore>,
    decoder: Arc<dyn ThriftDecoder>,
}

impl InterceptHook {
    /// Create the hook over shared core state and the wire decoder.
    pub fn new(core: Arc<FaultlineCore>, decoder: Arc<dyn ThriftDecoder>) -> Self {
        Self { core, decoder }
    }

    /// Handle one intercepted request before it is forwarded upstream.
    ///
    /// Cloud downloads are recorded before the injection decision so
    /// history reflects every attempt, including ones the injector then
    /// short-circuits. Thrift calls are decoded and recorded; everything
    /// else passes through.
    pub async fn on_request(&self, head: &RequestHead, body: &[u8]) -> FlowAction {
        match classify(&head.method, &head.host, &head.path) {
            RequestClass::CloudFetchDownload => {
                self.core.record(CallRecord::cloud_download(head.url.clone()));
                inject_cloudfetch(&self.core, &head.url).await
            }
            RequestClass::ThriftCall => {
                record_thrift_request(&self.core, self.decoder.as_ref(), body);
                FlowAction::Proceed
            }
            RequestClass::Other => FlowAction::Proceed,
        }
    }

    /// Handle one intercepted response. Diagnostics only; responses are
    /// never appended to history.
    pub fn on_response(&self, head: &RequestHead, body: &[u8]) {
        if classify(&head.method, &head.host, &head.path) == RequestClass::ThriftCall {
            log_thrift_response(self.decoder.as_ref(), body);
        }
    }
}
