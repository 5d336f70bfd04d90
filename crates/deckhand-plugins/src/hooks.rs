//! The hook catalog.
//!
//! Each begin/complete event pair is its own observer trait. A plugin opts
//! into a pair by implementing the trait and returning itself from the
//! matching `as_*_observer` accessor on [`Plugin`].
//!
//! Hook return values are observational: `Ok(Some(true))` reports success,
//! `Ok(None)` means the plugin had nothing to do. They never change the flow
//! of the pipeline.

use crate::PluginDescriptor;
use deckhand_core::{DockerImage, Error, Project, Service};

pub type HookResult = deckhand_core::Result<Option<bool>>;

pub trait ApplicationObserver {
    fn application_startup(&self) -> HookResult {
        Ok(None)
    }

    fn application_shutdown(&self, _error: Option<&Error>) -> HookResult {
        Ok(None)
    }
}

pub trait ContainerBuildObserver {
    fn container_build_begin(&self) -> HookResult {
        Ok(None)
    }

    fn container_build_complete(&self, _error: Option<&Error>) -> HookResult {
        Ok(None)
    }
}

pub trait ContainerBuildStageObserver {
    fn container_build_stage_begin(&self, _image: &DockerImage, _stage: &str) -> HookResult {
        Ok(None)
    }

    fn container_build_stage_complete(
        &self,
        _error: Option<&Error>,
        _image: &DockerImage,
        _stage: &str,
    ) -> HookResult {
        Ok(None)
    }
}

pub trait GitSubmoduleUpdateObserver {
    fn git_submodule_update_begin(&self) -> HookResult {
        Ok(None)
    }

    fn git_submodule_update_complete(&self, _error: Option<&Error>) -> HookResult {
        Ok(None)
    }
}

pub trait ProjectDeploymentObserver {
    fn project_deployment_begin(
        &self,
        _namespace: &str,
        _project: &Project,
        _track: &str,
    ) -> HookResult {
        Ok(None)
    }

    fn project_deployment_complete(
        &self,
        _error: Option<&Error>,
        _namespace: &str,
        _project: &Project,
        _track: &str,
    ) -> HookResult {
        Ok(None)
    }
}

pub trait ServiceDeploymentObserver {
    fn service_deployment_begin(
        &self,
        _namespace: &str,
        _service: &Service,
        _track: &str,
    ) -> HookResult {
        Ok(None)
    }

    fn service_deployment_complete(
        &self,
        _error: Option<&Error>,
        _namespace: &str,
        _service: &Service,
        _track: &str,
    ) -> HookResult {
        Ok(None)
    }
}

/// A loaded plugin instance.
///
/// Hooks take `&self`; plugins that keep state across hooks use interior
/// mutability.
pub trait Plugin: Send + Sync {
    fn descriptor(&self) -> &'static PluginDescriptor;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    fn as_application_observer(&self) -> Option<&dyn ApplicationObserver> {
        None
    }

    fn as_container_build_observer(&self) -> Option<&dyn ContainerBuildObserver> {
        None
    }

    fn as_container_build_stage_observer(&self) -> Option<&dyn ContainerBuildStageObserver> {
        None
    }

    fn as_git_submodule_update_observer(&self) -> Option<&dyn GitSubmoduleUpdateObserver> {
        None
    }

    fn as_project_deployment_observer(&self) -> Option<&dyn ProjectDeploymentObserver> {
        None
    }

    fn as_service_deployment_observer(&self) -> Option<&dyn ServiceDeploymentObserver> {
        None
    }
}

/// A pipeline phase wrapped in a begin/complete event pair, with the
/// arguments its hooks receive.
#[derive(Debug, Clone, Copy)]
pub enum Phase<'a> {
    Application,
    ContainerBuild,
    ContainerBuildStage {
        image: &'a DockerImage,
        stage: &'a str,
    },
    GitSubmoduleUpdate,
    ProjectDeployment {
        namespace: &'a str,
        project: &'a Project,
        track: &'a str,
    },
    ServiceDeployment {
        namespace: &'a str,
        service: &'a Service,
        track: &'a str,
    },
}

impl Phase<'_> {
    /// Base name shared by the begin and complete events.
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Application => "application",
            Phase::ContainerBuild => "container_build",
            Phase::ContainerBuildStage { .. } => "container_build_stage",
            Phase::GitSubmoduleUpdate => "git_submodule_update",
            Phase::ProjectDeployment { .. } => "project_deployment",
            Phase::ServiceDeployment { .. } => "service_deployment",
        }
    }

    pub fn begin_hook(&self) -> &'static str {
        match self {
            Phase::Application => "application_startup",
            Phase::ContainerBuild => "container_build_begin",
            Phase::ContainerBuildStage { .. } => "container_build_stage_begin",
            Phase::GitSubmoduleUpdate => "git_submodule_update_begin",
            Phase::ProjectDeployment { .. } => "project_deployment_begin",
            Phase::ServiceDeployment { .. } => "service_deployment_begin",
        }
    }

    pub fn complete_hook(&self) -> &'static str {
        match self {
            Phase::Application => "application_shutdown",
            Phase::ContainerBuild => "container_build_complete",
            Phase::ContainerBuildStage { .. } => "container_build_stage_complete",
            Phase::GitSubmoduleUpdate => "git_submodule_update_complete",
            Phase::ProjectDeployment { .. } => "project_deployment_complete",
            Phase::ServiceDeployment { .. } => "service_deployment_complete",
        }
    }

    /// Fire this phase's begin hook on `plugin`. `None` if the plugin does
    /// not observe the phase.
    pub(crate) fn fire_begin(&self, plugin: &dyn Plugin) -> Option<HookResult> {
        match *self {
            Phase::Application => plugin
                .as_application_observer()
                .map(|o| o.application_startup()),
            Phase::ContainerBuild => plugin
                .as_container_build_observer()
                .map(|o| o.container_build_begin()),
            Phase::ContainerBuildStage { image, stage } => plugin
                .as_container_build_stage_observer()
                .map(|o| o.container_build_stage_begin(image, stage)),
            Phase::GitSubmoduleUpdate => plugin
                .as_git_submodule_update_observer()
                .map(|o| o.git_submodule_update_begin()),
            Phase::ProjectDeployment {
                namespace,
                project,
                track,
            } => plugin
                .as_project_deployment_observer()
                .map(|o| o.project_deployment_begin(namespace, project, track)),
            Phase::ServiceDeployment {
                namespace,
                service,
                track,
            } => plugin
                .as_service_deployment_observer()
                .map(|o| o.service_deployment_begin(namespace, service, track)),
        }
    }

    /// Fire this phase's complete hook on `plugin`.
    pub(crate) fn fire_complete(
        &self,
        plugin: &dyn Plugin,
        error: Option<&Error>,
    ) -> Option<HookResult> {
        match *self {
            Phase::Application => plugin
                .as_application_observer()
                .map(|o| o.application_shutdown(error)),
            Phase::ContainerBuild => plugin
                .as_container_build_observer()
                .map(|o| o.container_build_complete(error)),
            Phase::ContainerBuildStage { image, stage } => plugin
                .as_container_build_stage_observer()
                .map(|o| o.container_build_stage_complete(error, image, stage)),
            Phase::GitSubmoduleUpdate => plugin
                .as_git_submodule_update_observer()
                .map(|o| o.git_submodule_update_complete(error)),
            Phase::ProjectDeployment {
                namespace,
                project,
                track,
            } => plugin
                .as_project_deployment_observer()
                .map(|o| o.project_deployment_complete(error, namespace, project, track)),
            Phase::ServiceDeployment {
                namespace,
                service,
                track,
            } => plugin
                .as_service_deployment_observer()
                .map(|o| o.service_deployment_complete(error, namespace, service, track)),
        }
    }
}
