//! Declarative assertions over the recorded Thrift method sequence.
//!
//! The harness posts a verification request after a test run; evaluation
//! operates on the ordered method-name projection of the Thrift records
//! (cloud downloads excluded). The result always echoes the actual
//! projection so a failing assertion is diagnosable from the response
//! alone.

use serde::{Deserialize, Serialize};

use crate::error::{FaultlineError, FaultlineResult};

/// A verification request as posted by the harness. Fields are optional
/// at the parsing layer; [`evaluate`] enforces which ones each kind
/// requires so a missing field reports precisely what was missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationRequest {
    /// Verification kind: `exact-sequence`, `contains-sequence`,
    /// `method-count`, or `method-exists`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Expected method sequence for the sequence kinds.
    pub methods: Option<Vec<String>>,
    /// Method name for the count/exists kinds.
    pub method: Option<String>,
    /// Expected occurrence count for `method-count`.
    pub count: Option<u64>,
}

/// Outcome of a verification, echoing inputs for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Whether the assertion held.
    pub verified: bool,
    /// The kind that was evaluated.
    #[serde(rename = "type")]
    pub kind: String,
    /// Ordered method-name projection the assertion ran against.
    pub actual_sequence: Vec<String>,
    /// Expected sequence, for the sequence kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_sequence: Option<Vec<String>>,
    /// Method name, for the count/exists kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Expected count, for `method-count`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_count: Option<u64>,
    /// Observed count, for `method-count`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_count: Option<u64>,
}

impl VerificationResult {
    fn sequence(kind: &str, verified: bool, actual: Vec<String>, expected: Vec<String>) -> Self {
        Self {
            verified,
            kind: kind.to_string(),
            actual_sequence: actual,
            expected_sequence: Some(expected),
            method: None,
            expected_count: None,
            actual_count: None,
        }
    }

    fn count(
        kind: &str,
        verified: bool,
        actual: Vec<String>,
        method: String,
        expected: Option<u64>,
        observed: u64,
    ) -> Self {
        Self {
            verified,
            kind: kind.to_string(),
            actual_sequence: actual,
            expected_sequence: None,
            method: Some(method),
            expected_count: expected,
            actual_count: Some(observed),
        }
    }
}

/// Evaluate a verification request against the projected method sequence.
pub fn evaluate(
    request: &VerificationRequest,
    actual: Vec<String>,
) -> FaultlineResult<VerificationResult> {
    let kind = request
        .kind
        .as_deref()
        .ok_or_else(|| FaultlineError::invalid_argument("missing verification 'type'"))?;

    match kind {
        "exact-sequence" => {
            let expected = required_methods(kind, request)?;
            let verified = actual == expected;
            Ok(VerificationResult::sequence(kind, verified, actual, expected))
        }
        "contains-sequence" => {
            let expected = required_methods(kind, request)?;
            let verified = is_subsequence(&expected, &actual);
            Ok(VerificationResult::sequence(kind, verified, actual, expected))
        }
        "method-count" => {
            let method = required_method(kind, request)?;
            let expected = request.count.ok_or_else(|| {
                FaultlineError::invalid_argument(format!("'{kind}' requires 'count'"))
            })?;
            let observed = occurrences(&actual, &method);
            Ok(VerificationResult::count(
                kind,
                observed == expected,
                actual,
                method,
                Some(expected),
                observed,
            ))
        }
        "method-exists" => {
            let method = required_method(kind, request)?;
            let observed = occurrences(&actual, &method);
            Ok(VerificationResult::count(
                kind,
                observed > 0,
                actual,
                method,
                None,
                observed,
            ))
        }
        other => Err(FaultlineError::invalid_argument(format!(
            "unknown verification type: {other}"
        ))),
    }
}

fn required_methods(kind: &str, request: &VerificationRequest) -> FaultlineResult<Vec<String>> {
    request
        .methods
        .clone()
        .ok_or_else(|| FaultlineError::invalid_argument(format!("'{kind}' requires 'methods'")))
}

fn required_method(kind: &str, request: &VerificationRequest) -> FaultlineResult<String> {
    request
        .method
        .clone()
        .ok_or_else(|| FaultlineError::invalid_argument(format!("'{kind}' requires 'method'")))
}

fn occurrences(actual: &[String], method: &str) -> u64 {
    actual.iter().filter(|m| m.as_str() == method).count() as u64
}

/// Single-pass greedy subsequence check: advance the expected pointer on
/// each match; success iff it reaches the end.
fn is_subsequence(expected: &[String], actual: &[String]) -> bool {
    let mut pending = expected.iter();
    let mut next = pending.next();
    for observed in actual {
        if next.is_none() {
            break;
        }
        if next == Some(observed) {
            next = pending.next();
        }
    }
    next.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn seq(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn request(kind: &str) -> VerificationRequest {
        VerificationRequest {
            kind: Some(kind.to_string()),
            ..VerificationRequest::default()
        }
    }

    #[test]
    fn exact_sequence_requires_full_equality() {
        let mut req = request("exact-sequence");
        req.methods = Some(seq(&["A", "B"]));

        assert!(evaluate(&req, seq(&["A", "B"])).unwrap().verified);
        assert!(!evaluate(&req, seq(&["A", "B", "C"])).unwrap().verified);
        assert!(!evaluate(&req, seq(&["B", "A"])).unwrap().verified);
        assert!(!evaluate(&req, seq(&["A"])).unwrap().verified);
    }

    #[test]
    fn contains_sequence_allows_gaps_but_not_reordering() {
        let mut req = request("contains-sequence");
        req.methods = Some(seq(&["A", "C"]));

        assert!(evaluate(&req, seq(&["A", "B", "C", "D"])).unwrap().verified);
        assert!(!evaluate(&req, seq(&["C", "A"])).unwrap().verified);
    }

    #[test]
    fn contains_sequence_empty_expected_always_verifies() {
        let mut req = request("contains-sequence");
        req.methods = Some(Vec::new());
        assert!(evaluate(&req, seq(&["A"])).unwrap().verified);
        assert!(evaluate(&req, Vec::new()).unwrap().verified);
    }

    #[test]
    fn contains_sequence_greedy_match_handles_duplicates() {
        let mut req = request("contains-sequence");
        req.methods = Some(seq(&["FetchResults", "FetchResults"]));
        assert!(evaluate(&req, seq(&["FetchResults", "CloseOperation", "FetchResults"]))
            .unwrap()
            .verified);
        assert!(!evaluate(&req, seq(&["FetchResults"])).unwrap().verified);
    }

    #[test]
    fn method_count_is_exact() {
        let mut req = request("method-count");
        req.method = Some("FetchResults".to_string());
        req.count = Some(2);

        let twice = seq(&["ExecuteStatement", "FetchResults", "FetchResults"]);
        let result = evaluate(&req, twice).unwrap();
        assert!(result.verified);
        assert_eq!(result.actual_count, Some(2));

        assert!(!evaluate(&req, seq(&["FetchResults"])).unwrap().verified);
        assert!(!evaluate(&req, seq(&["FetchResults", "FetchResults", "FetchResults"]))
            .unwrap()
            .verified);
    }

    #[test]
    fn method_count_requires_method_and_count() {
        let mut req = request("method-count");
        req.count = Some(1);
        assert_matches!(
            evaluate(&req, Vec::new()),
            Err(FaultlineError::InvalidArgument { .. })
        );

        let mut req = request("method-count");
        req.method = Some("FetchResults".to_string());
        assert_matches!(
            evaluate(&req, Vec::new()),
            Err(FaultlineError::InvalidArgument { .. })
        );
    }

    #[test]
    fn method_exists_requires_at_least_one_occurrence() {
        let mut req = request("method-exists");
        req.method = Some("OpenSession".to_string());

        assert!(evaluate(&req, seq(&["OpenSession", "OpenSession"])).unwrap().verified);
        assert!(!evaluate(&req, seq(&["CloseSession"])).unwrap().verified);
    }

    #[test]
    fn unknown_kind_echoes_the_value() {
        let req = request("sequence-prefix");
        let err = evaluate(&req, Vec::new()).unwrap_err();
        assert_matches!(
            &err,
            FaultlineError::InvalidArgument { message } if message.contains("sequence-prefix")
        );
    }

    #[test]
    fn missing_kind_is_invalid() {
        let req = VerificationRequest::default();
        assert_matches!(
            evaluate(&req, Vec::new()),
            Err(FaultlineError::InvalidArgument { .. })
        );
    }

    #[test]
    fn result_echoes_actual_sequence() {
        let mut req = request("exact-sequence");
        req.methods = Some(seq(&["A"]));
        let result = evaluate(&req, seq(&["A", "B"])).unwrap();
        assert_eq!(result.actual_sequence, seq(&["A", "B"]));
        assert_eq!(result.expected_sequence, Some(seq(&["A"])));
    }
}
