//! Bounded call history.
//!
//! Every classified request appends a [`CallRecord`]; Thrift calls carry
//! full decoded detail, cloud downloads a lightweight URL-only record.
//! The buffer is a FIFO bounded at [`MAX_HISTORY`]; on overflow the oldest
//! record is evicted and the remaining order is preserved.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum number of records retained.
pub const MAX_HISTORY: usize = 1000;

/// Thrift message type carried by a decoded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Request expecting a reply.
    Call,
    /// Response to a call.
    Reply,
    /// Server-side exception response.
    Exception,
    /// Fire-and-forget request.
    Oneway,
}

/// One observed request on a monitored channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum CallRecord {
    /// Lightweight record of a CloudFetch download attempt.
    CloudDownload {
        /// When the recording task observed the request.
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
        /// Full URL of the download attempt.
        url: String,
    },
    /// Fully decoded Thrift RPC request.
    Thrift {
        /// When the recording task observed the request.
        #[serde(with = "time::serde::rfc3339")]
        timestamp: OffsetDateTime,
        /// RPC method name, e.g. `ExecuteStatement`.
        method: String,
        /// Thrift message type.
        message_type: MessageType,
        /// Protocol sequence id.
        sequence_id: i32,
        /// Decoded top-level fields of the call payload.
        fields: serde_json::Map<String, serde_json::Value>,
    },
}

impl CallRecord {
    /// Build a cloud-download record stamped with the current time.
    pub fn cloud_download(url: impl Into<String>) -> Self {
        Self::CloudDownload {
            timestamp: OffsetDateTime::now_utc(),
            url: url.into(),
        }
    }

    /// Build a Thrift record stamped with the current time.
    pub fn thrift(
        method: impl Into<String>,
        message_type: MessageType,
        sequence_id: i32,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self::Thrift {
            timestamp: OffsetDateTime::now_utc(),
            method: method.into(),
            message_type,
            sequence_id,
            fields,
        }
    }

    /// Method name for Thrift records, `None` for cloud downloads.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Thrift { method, .. } => Some(method),
            Self::CloudDownload { .. } => None,
        }
    }
}

/// Ordered, bounded FIFO of call records.
#[derive(Debug, Default)]
pub struct CallHistory {
    records: VecDeque<CallRecord>,
}

impl CallHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Append a record, evicting the oldest when at capacity.
    pub fn push(&mut self, record: CallRecord) {
        if self.records.len() == MAX_HISTORY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Copy of all records in arrival order.
    pub fn snapshot(&self) -> Vec<CallRecord> {
        self.records.iter().cloned().collect()
    }

    /// Ordered method-name projection of the Thrift records only.
    pub fn thrift_methods(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|record| record.method().map(str::to_string))
            .collect()
    }
}
