//! Shared control state: scenario registry plus call history.
//!
//! Both the control API listener and the proxy's per-exchange callbacks
//! operate on one [`FaultlineCore`] behind an `Arc`. Exactly one mutex
//! guards the pair {scenario map, call history}; it is held only for the
//! critical operation (lookup, snapshot, append, evict, toggle), never
//! across upstream I/O or the delay suspension.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

use crate::error::{FaultlineError, FaultlineResult};
use crate::history::{CallHistory, CallRecord};
use crate::scenario::{
    builtin_scenarios, ScenarioConfig, ScenarioOverrides, ScenarioTemplate, TargetOperation,
};
use crate::verify::{self, VerificationRequest, VerificationResult};

/// One catalog entry: the immutable template plus its runtime state.
/// `enabled` holds the effective merged config while the scenario is
/// armed; re-enabling overwrites it, never stacks.
#[derive(Debug, Clone)]
struct ScenarioEntry {
    template: ScenarioTemplate,
    enabled: Option<ScenarioConfig>,
}

/// The pair of shared structures guarded by the core mutex.
#[derive(Debug)]
struct CoreState {
    /// Insertion order is template registration order; injector selection
    /// scans in this order.
    scenarios: IndexMap<&'static str, ScenarioEntry>,
    history: CallHistory,
}

/// Scenario summary returned by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    /// Unique scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the scenario is currently armed.
    pub enabled: bool,
}

/// Scenario status returned by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioStatus {
    /// Unique scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the scenario is currently armed.
    pub enabled: bool,
    /// Effective merged config while enabled, `null` otherwise.
    pub config: Option<ScenarioConfig>,
}

/// Registry and history shared between the control plane and the proxy
/// data plane.
#[derive(Debug)]
pub struct FaultlineCore {
    state: Mutex<CoreState>,
}

impl Default for FaultlineCore {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultlineCore {
    /// Create a core with the built-in scenario catalog.
    pub fn new() -> Self {
        Self::with_templates(builtin_scenarios())
    }

    /// Create a core with an explicit catalog. Registration order of the
    /// templates is the injector's selection order.
    pub fn with_templates(templates: Vec<ScenarioTemplate>) -> Self {
        let scenarios = templates
            .into_iter()
            .map(|template| {
                (
                    template.name,
                    ScenarioEntry {
                        template,
                        enabled: None,
                    },
                )
            })
            .collect();

        Self {
            state: Mutex::new(CoreState {
                scenarios,
                history: CallHistory::new(),
            }),
        }
    }

    // ===== Scenario registry =====

    /// All templates with their derived enabled flag, in registration
    /// order.
    pub fn list_scenarios(&self) -> Vec<ScenarioSummary> {
        let state = self.state.lock();
        state
            .scenarios
            .values()
            .map(|entry| ScenarioSummary {
                name: entry.template.name.to_string(),
                description: entry.template.description.to_string(),
                enabled: entry.enabled.is_some(),
            })
            .collect()
    }

    /// Enable a scenario, merging recognized overrides onto the template
    /// defaults. Enabling a CloudFetchDownload-targeting scenario clears
    /// the call history so each test starts from a fresh baseline.
    /// Returns the effective config.
    pub fn enable_scenario(
        &self,
        name: &str,
        overrides: &ScenarioOverrides,
    ) -> FaultlineResult<ScenarioConfig> {
        let mut state = self.state.lock();
        let entry = state
            .scenarios
            .get_mut(name)
            .ok_or_else(|| FaultlineError::not_found(format!("scenario not found: {name}")))?;

        let config = entry.template.merge(overrides)?;
        let clears_history = entry.template.operation == TargetOperation::CloudFetchDownload;
        entry.enabled = Some(config.clone());
        if clears_history {
            state.history.clear();
        }
        drop(state);

        info!(scenario = name, "enabled scenario");
        Ok(config)
    }

    /// Disable a scenario. NotFound if the name is unknown.
    pub fn disable_scenario(&self, name: &str) -> FaultlineResult<()> {
        let mut state = self.state.lock();
        let entry = state
            .scenarios
            .get_mut(name)
            .ok_or_else(|| FaultlineError::not_found(format!("scenario not found: {name}")))?;
        entry.enabled = None;
        drop(state);

        info!(scenario = name, "disabled scenario");
        Ok(())
    }

    /// Unconditionally disable every scenario. Returns how many were
    /// enabled.
    pub fn disable_all(&self) -> usize {
        let mut state = self.state.lock();
        let mut disabled = 0;
        for entry in state.scenarios.values_mut() {
            if entry.enabled.take().is_some() {
                disabled += 1;
            }
        }
        drop(state);

        info!(disabled, "disabled all scenarios");
        disabled
    }

    /// Enabled flag plus the effective config for one scenario.
    pub fn scenario_status(&self, name: &str) -> FaultlineResult<ScenarioStatus> {
        let state = self.state.lock();
        let entry = state
            .scenarios
            .get(name)
            .ok_or_else(|| FaultlineError::not_found(format!("scenario not found: {name}")))?;
        Ok(ScenarioStatus {
            name: entry.template.name.to_string(),
            description: entry.template.description.to_string(),
            enabled: entry.enabled.is_some(),
            config: entry.enabled.clone(),
        })
    }

    /// Atomically take the first enabled scenario targeting CloudFetch
    /// downloads, in registration order, marking it disabled in the same
    /// critical section. Consuming at selection is what makes injection
    /// exact-once under concurrent callbacks and guarantees the one-shot
    /// transition regardless of which action branch runs afterwards.
    pub(crate) fn take_enabled_cloudfetch(&self) -> Option<(&'static str, ScenarioConfig)> {
        let mut state = self.state.lock();
        let (name, entry) = state
            .scenarios
            .iter_mut()
            .filter(|(_, entry)| {
                entry.template.operation == TargetOperation::CloudFetchDownload
            })
            .find(|(_, entry)| entry.enabled.is_some())?;
        let name = *name;
        let config = entry.enabled.take()?;
        drop(state);

        info!(scenario = name, "auto-disabled scenario after selection");
        Some((name, config))
    }

    // ===== Call history =====

    /// Append a record, evicting the oldest when at capacity.
    pub fn record(&self, record: CallRecord) {
        self.state.lock().history.push(record);
    }

    /// Snapshot of all records in arrival order.
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().history.snapshot()
    }

    /// Number of retained records.
    pub fn call_count(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Drop all records.
    pub fn reset_calls(&self) {
        self.state.lock().history.clear();
        info!("call history reset");
    }

    /// Evaluate a verification request against a consistent snapshot of
    /// the projected Thrift method sequence.
    pub fn verify(&self, request: &VerificationRequest) -> FaultlineResult<VerificationResult> {
        let projection = self.state.lock().history.thrift_methods();
        verify::evaluate(request, projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MessageType;
    use crate::scenario::ScenarioAction;
    use assert_matches::assert_matches;
    use std::sync::Arc;

    fn thrift(method: &str) -> CallRecord {
        CallRecord::thrift(method, MessageType::Call, 7, serde_json::Map::new())
    }

    #[test]
    fn list_reflects_enabled_flags_in_registration_order() {
        let core = FaultlineCore::new();
        core.enable_scenario("cloudfetch_403", &ScenarioOverrides::default())
            .unwrap();

        let scenarios = core.list_scenarios();
        assert_eq!(scenarios[0].name, "cloudfetch_expired_link");
        let flagged: Vec<_> = scenarios.iter().filter(|s| s.enabled).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].name, "cloudfetch_403");
    }

    #[test]
    fn enable_unknown_scenario_is_not_found() {
        let core = FaultlineCore::new();
        assert_matches!(
            core.enable_scenario("no_such_scenario", &ScenarioOverrides::default()),
            Err(FaultlineError::NotFound { .. })
        );
        assert_matches!(
            core.disable_scenario("no_such_scenario"),
            Err(FaultlineError::NotFound { .. })
        );
        assert_matches!(
            core.scenario_status("no_such_scenario"),
            Err(FaultlineError::NotFound { .. })
        );
    }

    #[test]
    fn status_returns_merged_config() {
        let core = FaultlineCore::new();
        let config = core
            .enable_scenario(
                "cloudfetch_timeout",
                &ScenarioOverrides {
                    duration_seconds: Some(30),
                },
            )
            .unwrap();
        assert_eq!(config.duration_seconds, Some(30));

        let status = core.scenario_status("cloudfetch_timeout").unwrap();
        assert!(status.enabled);
        assert_eq!(status.config, Some(config));
    }

    #[test]
    fn re_enabling_overwrites_rather_than_stacks() {
        let core = FaultlineCore::new();
        core.enable_scenario(
            "cloudfetch_timeout",
            &ScenarioOverrides {
                duration_seconds: Some(30),
            },
        )
        .unwrap();
        core.enable_scenario("cloudfetch_timeout", &ScenarioOverrides::default())
            .unwrap();

        let status = core.scenario_status("cloudfetch_timeout").unwrap();
        // Template default, not the earlier override.
        assert_eq!(
            status.config.and_then(|c| c.duration_seconds),
            Some(65)
        );
    }

    #[test]
    fn enable_clears_call_history() {
        let core = FaultlineCore::new();
        core.record(thrift("ExecuteStatement"));
        assert_eq!(core.call_count(), 1);

        core.enable_scenario("cloudfetch_403", &ScenarioOverrides::default())
            .unwrap();
        assert_eq!(core.call_count(), 0);
    }

    #[test]
    fn disable_all_clears_every_enabled_scenario() {
        let core = FaultlineCore::new();
        core.enable_scenario("cloudfetch_403", &ScenarioOverrides::default())
            .unwrap();
        core.enable_scenario("cloudfetch_500", &ScenarioOverrides::default())
            .unwrap();

        assert_eq!(core.disable_all(), 2);
        assert!(core.list_scenarios().iter().all(|s| !s.enabled));
    }

    #[test]
    fn take_selects_first_enabled_in_registration_order() {
        let core = FaultlineCore::new();
        core.enable_scenario("cloudfetch_500", &ScenarioOverrides::default())
            .unwrap();
        core.enable_scenario("cloudfetch_400", &ScenarioOverrides::default())
            .unwrap();

        // cloudfetch_400 registers before cloudfetch_500.
        let (name, config) = core.take_enabled_cloudfetch().unwrap();
        assert_eq!(name, "cloudfetch_400");
        assert_eq!(config.action, ScenarioAction::ReturnError);

        let (name, _) = core.take_enabled_cloudfetch().unwrap();
        assert_eq!(name, "cloudfetch_500");
        assert!(core.take_enabled_cloudfetch().is_none());
    }

    #[test]
    fn take_consumes_exactly_once() {
        let core = FaultlineCore::new();
        core.enable_scenario("cloudfetch_403", &ScenarioOverrides::default())
            .unwrap();

        assert!(core.take_enabled_cloudfetch().is_some());
        assert!(core.take_enabled_cloudfetch().is_none());
        assert!(!core.scenario_status("cloudfetch_403").unwrap().enabled);
    }

    #[test]
    fn concurrent_enable_and_list_never_observe_torn_state() {
        let core = Arc::new(FaultlineCore::new());
        let mut handles = Vec::new();

        for _ in 0..4 {
            let core = Arc::clone(&core);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    core.enable_scenario("cloudfetch_403", &ScenarioOverrides::default())
                        .unwrap();
                    core.disable_scenario("cloudfetch_403").unwrap();
                }
            }));
        }
        for _ in 0..4 {
            let core = Arc::clone(&core);
            handles.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    let scenarios = core.list_scenarios();
                    // Catalog membership is immutable; only flags toggle.
                    assert_eq!(scenarios.len(), builtin_scenarios().len());
                    let status = core.scenario_status("cloudfetch_403").unwrap();
                    if status.enabled {
                        assert!(status.config.is_some());
                    } else {
                        assert!(status.config.is_none());
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn concurrent_take_fires_exactly_once() {
        let core = Arc::new(FaultlineCore::new());
        core.enable_scenario("cloudfetch_403", &ScenarioOverrides::default())
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let core = Arc::clone(&core);
            handles.push(std::thread::spawn(move || {
                core.take_enabled_cloudfetch().is_some()
            }));
        }

        let hits = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|hit| *hit)
            .count();
        assert_eq!(hits, 1);
        assert!(!core.scenario_status("cloudfetch_403").unwrap().enabled);
    }
}
