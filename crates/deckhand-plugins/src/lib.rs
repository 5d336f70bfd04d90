//! Plugins and lifecycle hooks for deckhand.
//!
//! This crate handles:
//! - Plugin descriptors and configuration from the environment
//! - Registration and removal of plugin instances
//! - Begin/complete hook dispatch around pipeline phases
//! - Built-in plugins (Slack notifications, lifecycle tracing)

pub mod builtin;
pub mod descriptor;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod registry;

pub use descriptor::{PluginConfig, PluginDescriptor, PluginVariable};
pub use error::PluginError;
pub use hooks::{
    ApplicationObserver, ContainerBuildObserver, ContainerBuildStageObserver,
    GitSubmoduleUpdateObserver, HookResult, Phase, Plugin, ProjectDeploymentObserver,
    ServiceDeploymentObserver,
};
pub use lifecycle::{HookOutcome, HookReport, LifecycleManager, LifecycleScope};
pub use registry::{LoadReport, PluginContext, PluginEntry, PluginRegistry};
