//! `deckhand run`: wrap an external command in lifecycle hooks.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use deckhand_config::{Settings, global};
use deckhand_core::naming::kubernetes_safe_name;
use deckhand_core::{DockerImage, Error, Project, Service};
use deckhand_plugins::Phase;
use std::process::Command;
use tracing::{error, info};

/// Lifecycle phase the command runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseKind {
    ContainerBuild,
    ContainerBuildStage,
    GitSubmoduleUpdate,
    ProjectDeployment,
    ServiceDeployment,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Lifecycle phase to open around the command
    #[arg(value_enum)]
    pub phase: PhaseKind,

    /// Kubernetes namespace (defaults to K8S_NAMESPACE, then the project name)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Deployment track (defaults to TRACK, then DEFAULT_TRACK)
    #[arg(long)]
    pub track: Option<String>,

    /// Image reference (defaults to DOCKER_IMAGE_NAME)
    #[arg(long)]
    pub image: Option<String>,

    /// Build stage name
    #[arg(long, default_value = "production")]
    pub stage: String,

    /// Service name for service deployments
    #[arg(long)]
    pub service: Option<String>,

    /// Command to run
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Hook payloads derived from the arguments and settings.
struct Payloads {
    namespace: String,
    track: String,
    project: Project,
    image: DockerImage,
    service: Service,
}

impl Payloads {
    fn new(args: &RunArgs, settings: &Settings) -> Self {
        let track = settings.track(args.track.as_deref());
        let project = settings.project(&track);
        let namespace = args
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .or_else(|| Some(settings.k8s_namespace.clone()).filter(|ns| !ns.is_empty()))
            .unwrap_or_else(|| kubernetes_safe_name(&project.name));

        let mut image = DockerImage::new(
            args.image
                .clone()
                .unwrap_or_else(|| settings.docker_image_name.clone()),
        );
        if !settings.git_commit_sha.is_empty() {
            image = image.with_tag(settings.git_commit_sha.clone());
        }

        let service = Service::new(
            args.service.clone().unwrap_or_else(|| project.name.clone()),
            track.clone(),
            "",
        );

        Self {
            namespace,
            track,
            project,
            image,
            service,
        }
    }

    fn phase<'a>(&'a self, kind: PhaseKind, stage: &'a str) -> Phase<'a> {
        match kind {
            PhaseKind::ContainerBuild => Phase::ContainerBuild,
            PhaseKind::ContainerBuildStage => Phase::ContainerBuildStage {
                image: &self.image,
                stage,
            },
            PhaseKind::GitSubmoduleUpdate => Phase::GitSubmoduleUpdate,
            PhaseKind::ProjectDeployment => Phase::ProjectDeployment {
                namespace: &self.namespace,
                project: &self.project,
                track: &self.track,
            },
            PhaseKind::ServiceDeployment => Phase::ServiceDeployment {
                namespace: &self.namespace,
                service: &self.service,
                track: &self.track,
            },
        }
    }
}

/// Run `argv`, turning a non-zero exit into the matching phase error.
fn execute(argv: &[String], kind: PhaseKind) -> deckhand_core::Result<()> {
    let Some((program, rest)) = argv.split_first() else {
        return Err(Error::InvalidInput("no command given".to_string()));
    };
    let command = argv.join(" ");

    info!(command = %command, "Running command");
    let status = Command::new(program).args(rest).status()?;
    if status.success() {
        return Ok(());
    }

    let failure = Error::CommandFailed {
        command,
        code: status.code(),
    };
    Err(match kind {
        PhaseKind::ContainerBuild | PhaseKind::ContainerBuildStage => {
            Error::BuildFailed(failure.to_string())
        }
        PhaseKind::ProjectDeployment | PhaseKind::ServiceDeployment => {
            Error::DeploymentFailed(failure.to_string())
        }
        PhaseKind::GitSubmoduleUpdate => failure,
    })
}

pub fn run(args: RunArgs) -> Result<()> {
    let (resolver, settings) = super::resolve()?;
    let settings = global::install(settings).context("Failed to install settings")?;
    let (registry, _) = super::load_plugins(&resolver, settings);

    let payloads = Payloads::new(&args, settings);
    let phase = payloads.phase(args.phase, &args.stage);
    info!(
        phase = phase.name(),
        namespace = %payloads.namespace,
        track = %payloads.track,
        plugins = registry.len(),
        "Starting lifecycle phase"
    );

    let lifecycle = registry.lifecycle();
    let result = lifecycle.with_scope(Phase::Application, || {
        lifecycle.with_scope(phase, || execute(&args.command, args.phase))
    });

    if let Err(e) = &result {
        error!(phase = phase.name(), error = %e, "Lifecycle phase failed");
    }
    result.with_context(|| format!("{} failed", phase.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_config::{ConfigResolver, Environment};
    use pretty_assertions::assert_eq;

    fn args(phase: PhaseKind) -> RunArgs {
        RunArgs {
            phase,
            namespace: None,
            track: None,
            image: None,
            stage: "production".into(),
            service: None,
            command: vec!["true".into()],
        }
    }

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let env: Environment = vars.iter().copied().collect();
        ConfigResolver::new(env).unwrap().resolve().unwrap()
    }

    #[test]
    fn test_payload_defaults_come_from_settings() {
        let settings = settings(&[
            ("PROJECT_NAME", "Shop_Front"),
            ("DOCKER_IMAGE_NAME", "registry.local/shop"),
            ("GIT_COMMIT_SHA", "abc123"),
        ]);

        let payloads = Payloads::new(&args(PhaseKind::ProjectDeployment), &settings);

        assert_eq!(payloads.namespace, "shop-front");
        assert_eq!(payloads.track, settings.default_track);
        assert_eq!(payloads.image.repository, "registry.local/shop");
        assert_eq!(payloads.image.tags, vec!["abc123"]);
        assert_eq!(payloads.service.name, "Shop_Front");
    }

    #[test]
    fn test_arguments_override_settings() {
        let settings = settings(&[("PROJECT_NAME", "shop"), ("K8S_NAMESPACE", "from-env")]);
        let mut run = args(PhaseKind::ServiceDeployment);
        run.track = Some("review".into());
        run.service = Some("postgres".into());

        let payloads = Payloads::new(&run, &settings);
        assert_eq!(payloads.namespace, "from-env");
        assert_eq!(payloads.track, "review");
        assert_eq!(payloads.service.name, "postgres");
        assert_eq!(payloads.service.track, "review");

        run.namespace = Some("explicit".into());
        assert_eq!(Payloads::new(&run, &settings).namespace, "explicit");
    }

    #[test]
    fn test_phase_mapping() {
        let settings = settings(&[("PROJECT_NAME", "shop")]);
        let payloads = Payloads::new(&args(PhaseKind::ContainerBuildStage), &settings);

        let phase = payloads.phase(PhaseKind::ContainerBuildStage, "development");
        assert!(matches!(phase, Phase::ContainerBuildStage { stage: "development", .. }));
        assert_eq!(
            payloads.phase(PhaseKind::GitSubmoduleUpdate, "").name(),
            "git_submodule_update"
        );
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let result = execute(&[], PhaseKind::ContainerBuild);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_maps_to_phase_error() {
        let argv = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];

        let err = execute(&argv, PhaseKind::ProjectDeployment).unwrap_err();
        assert_eq!(
            err.to_string(),
            "deployment failed: command `sh -c exit 3` failed with exit code 3"
        );

        let err = execute(&argv, PhaseKind::GitSubmoduleUpdate).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(3), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_command() {
        execute(&["true".to_string()], PhaseKind::ContainerBuild).unwrap();
    }
}
