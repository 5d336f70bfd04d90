//! Begin/complete dispatch around pipeline phases.
//!
//! A [`LifecycleScope`] fires the begin hook when it is opened and the
//! complete hook exactly once when it is completed or dropped. Nesting is
//! ordinary call nesting; the dispatcher keeps no notion of a current scope.
//!
//! A hook that returns an error is logged and recorded in the event's
//! [`HookReport`]; the remaining plugins are still notified.

use crate::hooks::{HookResult, Phase};
use crate::registry::PluginRegistry;
use deckhand_core::{Error, Result};
use tracing::{debug, warn};

/// One plugin's answer to one hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    pub plugin: &'static str,
    /// The plugin's success indicator, or the error it returned.
    pub result: std::result::Result<Option<bool>, String>,
}

/// Every plugin's answer to one hook, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub hook: &'static str,
    pub outcomes: Vec<HookOutcome>,
}

impl HookReport {
    /// Plugins whose hook returned an error.
    pub fn failures(&self) -> impl Iterator<Item = &HookOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    pub fn notified(&self) -> usize {
        self.outcomes.len()
    }
}

fn notify(
    registry: &PluginRegistry,
    hook: &'static str,
    fire: impl Fn(&dyn crate::Plugin) -> Option<HookResult>,
) -> HookReport {
    let mut outcomes = Vec::new();

    for plugin in registry.iter() {
        let Some(result) = fire(plugin) else {
            continue;
        };
        if let Err(e) = &result {
            warn!(plugin = plugin.name(), hook, error = %e, "Plugin hook failed");
        }
        outcomes.push(HookOutcome {
            plugin: plugin.name(),
            result: result.map_err(|e| e.to_string()),
        });
    }

    debug!(hook, notified = outcomes.len(), "Dispatched hook");
    HookReport { hook, outcomes }
}

/// Opens lifecycle scopes over a registry's plugins.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleManager<'r> {
    registry: &'r PluginRegistry,
}

impl<'r> LifecycleManager<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        Self { registry }
    }

    /// Fire `phase`'s begin hook and return the scope that will fire its
    /// complete hook.
    pub fn begin<'a>(&self, phase: Phase<'a>) -> LifecycleScope<'a>
    where
        'r: 'a,
    {
        let begin_report = notify(self.registry, phase.begin_hook(), |plugin| {
            phase.fire_begin(plugin)
        });
        LifecycleScope {
            registry: self.registry,
            phase,
            begin_report,
            completed: false,
        }
    }

    /// Run `body` inside a scope for `phase`.
    ///
    /// Plugins see the body's error, if any, through the complete hook; the
    /// body's result is then returned unchanged.
    pub fn with_scope<'a, T>(&self, phase: Phase<'a>, body: impl FnOnce() -> Result<T>) -> Result<T>
    where
        'r: 'a,
    {
        let scope = self.begin(phase);
        let result = body();
        scope.complete(result)
    }
}

/// An open begin/complete pair.
///
/// Dropping a scope without completing it fires the complete hook with
/// [`Error::ScopeAbandoned`].
#[must_use = "dropping a scope fires its complete hook as abandoned"]
pub struct LifecycleScope<'a> {
    registry: &'a PluginRegistry,
    phase: Phase<'a>,
    begin_report: HookReport,
    completed: bool,
}

impl<'a> LifecycleScope<'a> {
    pub fn phase(&self) -> &Phase<'a> {
        &self.phase
    }

    pub fn begin_report(&self) -> &HookReport {
        &self.begin_report
    }

    /// Fire the complete hook with `result`'s error and return `result`.
    pub fn complete<T>(self, result: Result<T>) -> Result<T> {
        self.complete_with_report(result).0
    }

    /// Like [`complete`](Self::complete), also returning the hook report.
    pub fn complete_with_report<T>(mut self, result: Result<T>) -> (Result<T>, HookReport) {
        let report = self.fire_complete(result.as_ref().err());
        (result, report)
    }

    fn fire_complete(&mut self, error: Option<&Error>) -> HookReport {
        self.completed = true;
        let phase = self.phase;
        notify(self.registry, phase.complete_hook(), |plugin| {
            phase.fire_complete(plugin, error)
        })
    }
}

impl Drop for LifecycleScope<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let error = Error::ScopeAbandoned(self.phase.name());
        warn!(phase = self.phase.name(), "Lifecycle scope dropped without completion");
        self.fire_complete(Some(&error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{ContainerBuildObserver, Plugin};
    use crate::PluginDescriptor;

    static COUNTER: PluginDescriptor = PluginDescriptor {
        name: "counter",
        verbose_name: "Counter",
        version: "0.1.0",
        required: &[],
        optional: &[],
    };

    struct Counter;

    impl ContainerBuildObserver for Counter {
        fn container_build_begin(&self) -> HookResult {
            Ok(Some(true))
        }

        fn container_build_complete(&self, error: Option<&Error>) -> HookResult {
            Ok(Some(error.is_none()))
        }
    }

    impl Plugin for Counter {
        fn descriptor(&self) -> &'static PluginDescriptor {
            &COUNTER
        }

        fn as_container_build_observer(&self) -> Option<&dyn ContainerBuildObserver> {
            Some(self)
        }
    }

    #[test]
    fn test_begin_report_collects_return_values() {
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Counter)).unwrap();

        let scope = registry.lifecycle().begin(Phase::ContainerBuild);
        assert_eq!(scope.begin_report().hook, "container_build_begin");
        assert_eq!(scope.begin_report().notified(), 1);
        assert_eq!(scope.begin_report().outcomes[0].result, Ok(Some(true)));

        let (result, report) = scope.complete_with_report(Ok(()));
        assert!(result.is_ok());
        assert_eq!(report.hook, "container_build_complete");
        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.outcomes[0].result, Ok(Some(true)));
    }

    #[test]
    fn test_complete_sees_body_error() {
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Counter)).unwrap();

        let scope = registry.lifecycle().begin(Phase::ContainerBuild);
        let (result, report) =
            scope.complete_with_report::<()>(Err(Error::BuildFailed("stage".into())));

        assert!(matches!(result, Err(Error::BuildFailed(msg)) if msg == "stage"));
        assert_eq!(report.outcomes[0].result, Ok(Some(false)));
    }

    #[test]
    fn test_unobserved_phase_notifies_nobody() {
        let mut registry = PluginRegistry::new();
        registry.register(Box::new(Counter)).unwrap();

        let scope = registry.lifecycle().begin(Phase::GitSubmoduleUpdate);
        assert_eq!(scope.begin_report().notified(), 0);
        scope.complete(Ok(())).unwrap();
    }
}
