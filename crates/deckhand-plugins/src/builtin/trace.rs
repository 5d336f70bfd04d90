//! Lifecycle tracing.
//!
//! Opens a `tracing` span for every begin event, nested under the span of the
//! enclosing phase, and closes it on the matching complete event with
//! `status = ok|error`. Enabled with `DECKHAND_TRACE_LIFECYCLE`.

use crate::hooks::{
    ApplicationObserver, ContainerBuildObserver, ContainerBuildStageObserver,
    GitSubmoduleUpdateObserver, HookResult, Plugin, ProjectDeploymentObserver,
    ServiceDeploymentObserver,
};
use crate::{PluginConfig, PluginContext, PluginDescriptor, PluginError, PluginVariable};
use chrono::{DateTime, Utc};
use deckhand_config::ValueParser;
use deckhand_core::{DockerImage, Error, Project, Service};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::field::Empty;
use tracing::{Span, info, info_span, warn};

pub static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: "tracing",
    verbose_name: "Lifecycle tracing",
    version: "0.1.0",
    required: &[],
    optional: &[
        PluginVariable::new("DECKHAND_TRACE_LIFECYCLE", ValueParser::Bool),
        PluginVariable::new("DECKHAND_TRACE_LABEL", ValueParser::Text),
    ],
};

/// Pipeline attributes recorded on every span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PipelineAttributes {
    ci: String,
    commit_sha: String,
    commit_ref_name: String,
    environment: String,
    pipeline_id: String,
    job_name: String,
    pr_id: String,
    project_id: String,
}

struct OpenScope {
    phase: &'static str,
    span: Span,
    started: DateTime<Utc>,
}

pub struct LifecycleTracer {
    label: String,
    attributes: PipelineAttributes,
    stack: Mutex<Vec<OpenScope>>,
}

pub fn build(
    config: PluginConfig,
    context: &PluginContext<'_>,
) -> Result<Box<dyn Plugin>, PluginError> {
    if !config.flag("DECKHAND_TRACE_LIFECYCLE").unwrap_or(false) {
        return Err(PluginError::NotEnabled(
            "Lifecycle tracing not enabled".to_string(),
        ));
    }

    let settings = context.settings;
    Ok(Box::new(LifecycleTracer {
        label: config
            .text("DECKHAND_TRACE_LABEL")
            .unwrap_or("deckhand")
            .to_string(),
        attributes: PipelineAttributes {
            ci: context.ci_provider.unwrap_or("none").to_string(),
            commit_sha: settings.git_commit_sha.clone(),
            commit_ref_name: settings.git_commit_ref_name.clone(),
            environment: settings.environment_slug.clone(),
            pipeline_id: settings.job_pipeline_id.clone(),
            job_name: settings.job_name.clone(),
            pr_id: settings.pr_id.clone(),
            project_id: settings.project_id.clone(),
        },
        stack: Mutex::new(Vec::new()),
    }))
}

impl LifecycleTracer {
    fn stack(&self) -> MutexGuard<'_, Vec<OpenScope>> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of scopes currently open.
    pub fn depth(&self) -> usize {
        self.stack().len()
    }

    /// Phase names of the open scopes, outermost first.
    pub fn open_phases(&self) -> Vec<&'static str> {
        self.stack().iter().map(|open| open.phase).collect()
    }

    fn span_begin(&self, phase: &'static str, record: impl FnOnce(&Span)) -> HookResult {
        let mut stack = self.stack();
        let parent = stack
            .last()
            .map(|open| open.span.id())
            .unwrap_or_else(|| Span::current().id());

        let attrs = &self.attributes;
        let span = info_span!(
            parent: parent,
            "lifecycle",
            phase,
            label = %self.label,
            pipeline.ci = %attrs.ci,
            pipeline.commit_sha = %attrs.commit_sha,
            pipeline.commit_ref_name = %attrs.commit_ref_name,
            pipeline.environment = %attrs.environment,
            pipeline.id = %attrs.pipeline_id,
            pipeline.job_name = %attrs.job_name,
            pipeline.pr_id = %attrs.pr_id,
            pipeline.project_id = %attrs.project_id,
            namespace = Empty,
            track = Empty,
            subject = Empty,
            stage = Empty,
            status = Empty,
            elapsed_ms = Empty,
        );
        record(&span);
        info!(parent: &span, phase, "Lifecycle phase started");

        stack.push(OpenScope {
            phase,
            span,
            started: Utc::now(),
        });
        Ok(Some(true))
    }

    fn span_end(&self, phase: &'static str, error: Option<&Error>) -> HookResult {
        let mut stack = self.stack();
        if stack.last().map(|open| open.phase) != Some(phase) {
            warn!(
                phase,
                open = ?stack.last().map(|open| open.phase),
                "Complete event does not match the innermost open scope"
            );
            return Ok(Some(false));
        }
        let Some(open) = stack.pop() else {
            return Ok(Some(false));
        };

        let elapsed_ms = (Utc::now() - open.started).num_milliseconds();
        let status = if error.is_some() { "error" } else { "ok" };
        open.span.record("status", status);
        open.span.record("elapsed_ms", elapsed_ms);
        match error {
            Some(e) => {
                warn!(parent: &open.span, phase, error = %e, elapsed_ms, "Lifecycle phase failed")
            }
            None => info!(parent: &open.span, phase, elapsed_ms, "Lifecycle phase finished"),
        }
        Ok(Some(true))
    }
}

impl ApplicationObserver for LifecycleTracer {
    fn application_startup(&self) -> HookResult {
        self.span_begin("application", |_| {})
    }

    fn application_shutdown(&self, error: Option<&Error>) -> HookResult {
        self.span_end("application", error)
    }
}

impl ContainerBuildObserver for LifecycleTracer {
    fn container_build_begin(&self) -> HookResult {
        self.span_begin("container_build", |_| {})
    }

    fn container_build_complete(&self, error: Option<&Error>) -> HookResult {
        self.span_end("container_build", error)
    }
}

impl ContainerBuildStageObserver for LifecycleTracer {
    fn container_build_stage_begin(&self, image: &DockerImage, stage: &str) -> HookResult {
        self.span_begin("container_build_stage", |span| {
            span.record("subject", image.repository.as_str());
            span.record("stage", stage);
        })
    }

    fn container_build_stage_complete(
        &self,
        error: Option<&Error>,
        _image: &DockerImage,
        _stage: &str,
    ) -> HookResult {
        self.span_end("container_build_stage", error)
    }
}

impl GitSubmoduleUpdateObserver for LifecycleTracer {
    fn git_submodule_update_begin(&self) -> HookResult {
        self.span_begin("git_submodule_update", |_| {})
    }

    fn git_submodule_update_complete(&self, error: Option<&Error>) -> HookResult {
        self.span_end("git_submodule_update", error)
    }
}

impl ProjectDeploymentObserver for LifecycleTracer {
    fn project_deployment_begin(
        &self,
        namespace: &str,
        project: &Project,
        track: &str,
    ) -> HookResult {
        self.span_begin("project_deployment", |span| {
            span.record("namespace", namespace);
            span.record("track", track);
            span.record("subject", project.name.as_str());
        })
    }

    fn project_deployment_complete(
        &self,
        error: Option<&Error>,
        _namespace: &str,
        _project: &Project,
        _track: &str,
    ) -> HookResult {
        self.span_end("project_deployment", error)
    }
}

impl ServiceDeploymentObserver for LifecycleTracer {
    fn service_deployment_begin(
        &self,
        namespace: &str,
        service: &Service,
        track: &str,
    ) -> HookResult {
        self.span_begin("service_deployment", |span| {
            span.record("namespace", namespace);
            span.record("track", track);
            span.record("subject", service.name.as_str());
        })
    }

    fn service_deployment_complete(
        &self,
        error: Option<&Error>,
        _namespace: &str,
        _service: &Service,
        _track: &str,
    ) -> HookResult {
        self.span_end("service_deployment", error)
    }
}

impl Plugin for LifecycleTracer {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn as_application_observer(&self) -> Option<&dyn ApplicationObserver> {
        Some(self)
    }

    fn as_container_build_observer(&self) -> Option<&dyn ContainerBuildObserver> {
        Some(self)
    }

    fn as_container_build_stage_observer(&self) -> Option<&dyn ContainerBuildStageObserver> {
        Some(self)
    }

    fn as_git_submodule_update_observer(&self) -> Option<&dyn GitSubmoduleUpdateObserver> {
        Some(self)
    }

    fn as_project_deployment_observer(&self) -> Option<&dyn ProjectDeploymentObserver> {
        Some(self)
    }

    fn as_service_deployment_observer(&self) -> Option<&dyn ServiceDeploymentObserver> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracer() -> LifecycleTracer {
        LifecycleTracer {
            label: "test".into(),
            attributes: PipelineAttributes::default(),
            stack: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn test_nested_scopes_push_and_pop() {
        let tracer = tracer();
        let image = DockerImage::new("registry.local/app").with_tag("dev");

        tracer.container_build_begin().unwrap();
        tracer.container_build_stage_begin(&image, "development").unwrap();
        assert_eq!(tracer.open_phases(), vec!["container_build", "container_build_stage"]);

        tracer
            .container_build_stage_complete(None, &image, "development")
            .unwrap();
        tracer.container_build_complete(None).unwrap();
        assert_eq!(tracer.depth(), 0);
    }

    #[test]
    fn test_mismatched_complete_is_ignored() {
        let tracer = tracer();
        tracer.container_build_begin().unwrap();

        let result = tracer.git_submodule_update_complete(None).unwrap();
        assert_eq!(result, Some(false));
        assert_eq!(tracer.open_phases(), vec!["container_build"]);

        let err = Error::BuildFailed("boom".into());
        assert_eq!(tracer.container_build_complete(Some(&err)).unwrap(), Some(true));
        assert_eq!(tracer.depth(), 0);
    }

    #[test]
    fn test_complete_without_begin() {
        let tracer = tracer();
        assert_eq!(tracer.application_shutdown(None).unwrap(), Some(false));
    }
}
