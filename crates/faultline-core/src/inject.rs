//! One-shot failure injection for CloudFetch downloads.
//!
//! Runs once per classified download, before the request is forwarded.
//! The scenario is consumed (disabled) inside the selection critical
//! section in [`FaultlineCore::take_enabled_cloudfetch`]; everything here
//! happens outside the lock, so a delay suspension never serializes
//! unrelated requests. Faults while computing a synthetic response fail
//! open: the request proceeds upstream unmodified rather than masking a
//! harness bug as a driver bug.

use std::time::Duration;

use tracing::{info, warn};

use crate::registry::FaultlineCore;
use crate::scenario::{ScenarioAction, ScenarioConfig, DEFAULT_DELAY_SECONDS};

/// Body of the synthesized expired-link response, matching the error a
/// storage vendor returns for a signed URL whose signature lapsed.
pub const EXPIRED_LINK_BODY: &str =
    "AuthorizationQueryParametersError: Query Parameters are not supported for this operation";

const CONNECTION_RESET_BODY: &str = "Connection reset by peer";
const DEFAULT_ERROR_STATUS: u16 = 500;
const DEFAULT_ERROR_BODY: &str = "Internal Server Error";

/// A response synthesized without contacting upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Content type of the body.
    pub content_type: &'static str,
}

impl SyntheticResponse {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "text/plain",
        }
    }
}

/// What the interception engine should do with the in-flight exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    /// Forward the request upstream unmodified.
    Proceed,
    /// Serve the synthesized response instead of contacting upstream.
    Respond(SyntheticResponse),
    /// Serve the synthesized response, then forcibly terminate the
    /// connection.
    Kill(SyntheticResponse),
}

/// Evaluate injection for one classified CloudFetch download. No enabled
/// scenario targeting downloads means no-op.
pub async fn inject_cloudfetch(core: &FaultlineCore, url: &str) -> FlowAction {
    let Some((name, config)) = core.take_enabled_cloudfetch() else {
        return FlowAction::Proceed;
    };

    info!(scenario = name, url, "triggering scenario");
    apply_action(name, &config).await
}

async fn apply_action(name: &str, config: &ScenarioConfig) -> FlowAction {
    match config.action {
        ScenarioAction::ExpireCloudLink => {
            FlowAction::Respond(SyntheticResponse::text(403, EXPIRED_LINK_BODY))
        }
        ScenarioAction::ReturnError => {
            let status = config.error_code.unwrap_or(DEFAULT_ERROR_STATUS);
            if !(100..=599).contains(&status) {
                warn!(scenario = name, status, "invalid status in scenario config, failing open");
                return FlowAction::Proceed;
            }
            let body = config
                .error_message
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_BODY.to_string());
            FlowAction::Respond(SyntheticResponse::text(status, body))
        }
        ScenarioAction::Delay => {
            // The scenario is already disabled, so downloads arriving
            // during the suspension pass through untouched.
            let seconds = config.duration_seconds.unwrap_or(DEFAULT_DELAY_SECONDS);
            info!(scenario = name, seconds, "delaying request");
            tokio::time::sleep(Duration::from_secs(seconds)).await;
            FlowAction::Proceed
        }
        ScenarioAction::CloseConnection => {
            info!(scenario = name, "closing connection");
            FlowAction::Kill(SyntheticResponse::text(500, CONNECTION_RESET_BODY))
        }
    }
}
