//! Scenario templates and effective configurations.
//!
//! Templates form a fixed catalog created at process start. Enabling a
//! scenario merges recognized overrides onto the template defaults and
//! stores the result as the effective [`ScenarioConfig`]; re-enabling
//! overwrites, never stacks.

use serde::{Deserialize, Serialize};

use crate::error::{FaultlineError, FaultlineResult};

/// Default suspension for delay actions when neither the template nor the
/// enable request carries a duration.
pub const DEFAULT_DELAY_SECONDS: u64 = 5;

/// Operation a scenario targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetOperation {
    /// Result-data download from cloud object storage.
    CloudFetchDownload,
}

/// Failure behavior applied when a scenario fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioAction {
    /// Synthesize the fixed authorization-denied response a storage vendor
    /// returns for an expired signed link.
    ExpireCloudLink,
    /// Synthesize a response with the scenario's status code and message.
    ReturnError,
    /// Suspend the request for the configured duration, then let it
    /// proceed upstream unmodified.
    Delay,
    /// Synthesize a 500 response and forcibly terminate the connection.
    CloseConnection,
}

/// Immutable scenario definition. The built-in set is created once at
/// startup; names are unique.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioTemplate {
    /// Unique scenario name used by the control API.
    pub name: &'static str,
    /// Human-readable description surfaced by `list` and `status`.
    pub description: &'static str,
    /// Operation this scenario targets.
    pub operation: TargetOperation,
    /// Action applied when the scenario fires.
    pub action: ScenarioAction,
    /// Status code for `return_error` actions.
    pub error_code: Option<u16>,
    /// Body for `return_error` actions.
    pub error_message: Option<&'static str>,
    /// Suspension length for `delay` actions.
    pub duration_seconds: Option<u64>,
}

/// Effective configuration stored when a scenario is enabled: template
/// defaults with recognized overrides merged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Description carried over from the template.
    pub description: String,
    /// Operation the scenario targets.
    pub operation: TargetOperation,
    /// Action applied when the scenario fires.
    pub action: ScenarioAction,
    /// Status code for `return_error` actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
    /// Body for `return_error` actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Suspension length for `delay` actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

/// Runtime overrides accepted by the enable endpoint. Unrecognized keys
/// are rejected at deserialization time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioOverrides {
    /// Replacement suspension length; only valid for delay actions.
    pub duration_seconds: Option<u64>,
}

impl ScenarioTemplate {
    /// Build the effective config from this template and the request's
    /// overrides. Only `duration_seconds` is recognized, and only for
    /// delay actions; anything else is an invalid argument.
    pub fn merge(&self, overrides: &ScenarioOverrides) -> FaultlineResult<ScenarioConfig> {
        let mut config = ScenarioConfig {
            description: self.description.to_string(),
            operation: self.operation,
            action: self.action,
            error_code: self.error_code,
            error_message: self.error_message.map(str::to_string),
            duration_seconds: self.duration_seconds,
        };

        if let Some(duration) = overrides.duration_seconds {
            if self.action != ScenarioAction::Delay {
                return Err(FaultlineError::invalid_argument(format!(
                    "duration_seconds is not a recognized override for scenario '{}'",
                    self.name
                )));
            }
            if duration == 0 {
                return Err(FaultlineError::invalid_argument(
                    "duration_seconds must be a positive integer",
                ));
            }
            config.duration_seconds = Some(duration);
        }

        Ok(config)
    }
}

/// The fixed catalog of failure scenarios, in registration order. The
/// injector scans enabled scenarios in this order and takes the first
/// match, so order here is part of the contract.
pub fn builtin_scenarios() -> Vec<ScenarioTemplate> {
    fn return_error(
        name: &'static str,
        description: &'static str,
        code: u16,
        message: &'static str,
    ) -> ScenarioTemplate {
        ScenarioTemplate {
            name,
            description,
            operation: TargetOperation::CloudFetchDownload,
            action: ScenarioAction::ReturnError,
            error_code: Some(code),
            error_message: Some(message),
            duration_seconds: None,
        }
    }

    vec![
        ScenarioTemplate {
            name: "cloudfetch_expired_link",
            description: "CloudFetch link expires, driver should retry via FetchResults",
            operation: TargetOperation::CloudFetchDownload,
            action: ScenarioAction::ExpireCloudLink,
            error_code: None,
            error_message: None,
            duration_seconds: None,
        },
        return_error(
            "cloudfetch_400",
            "CloudFetch returns 400 Bad Request (malformed request or missing parameters)",
            400,
            "Bad Request",
        ),
        return_error(
            "cloudfetch_403",
            "CloudFetch returns 403 Forbidden (expired link or insufficient permissions)",
            403,
            "Forbidden",
        ),
        return_error(
            "cloudfetch_404",
            "CloudFetch returns 404 Not Found (object does not exist)",
            404,
            "Not Found",
        ),
        return_error(
            "cloudfetch_405",
            "CloudFetch returns 405 Method Not Allowed (incorrect HTTP method)",
            405,
            "Method Not Allowed",
        ),
        return_error(
            "cloudfetch_412",
            "CloudFetch returns 412 Precondition Failed (condition not met)",
            412,
            "Precondition Failed",
        ),
        return_error(
            "cloudfetch_500",
            "CloudFetch returns 500 Internal Server Error (server-side error)",
            500,
            "Internal Server Error",
        ),
        return_error(
            "cloudfetch_503",
            "CloudFetch returns 503 Service Unavailable (rate limiting or temporary failure)",
            503,
            "Service Unavailable",
        ),
        ScenarioTemplate {
            name: "cloudfetch_timeout",
            description: "CloudFetch download times out (exceeds 60s) - configurable delay",
            operation: TargetOperation::CloudFetchDownload,
            action: ScenarioAction::Delay,
            error_code: None,
            error_message: None,
            duration_seconds: Some(65),
        },
        ScenarioTemplate {
            name: "cloudfetch_connection_reset",
            description: "Connection reset during CloudFetch download",
            operation: TargetOperation::CloudFetchDownload,
            action: ScenarioAction::CloseConnection,
            error_code: None,
            error_message: None,
            duration_seconds: None,
        },
    ]
}
