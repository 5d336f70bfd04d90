use super::{CiProvider, ProviderKind, VariableMapping};

const MAPPING: &[VariableMapping] = &[
    VariableMapping::env("DOCKER_IMAGE_NAME", "BUILD_DEFINITIONNAME"),
    VariableMapping::env("GIT_COMMIT_REF_NAME", "BUILD_SOURCEBRANCHNAME"),
    VariableMapping::env("GIT_COMMIT_SHA", "BUILD_SOURCEVERSION"),
    VariableMapping::env("JOB_ID", "SYSTEM_JOBID"),
    VariableMapping::env("JOB_NAME", "SYSTEM_JOBNAME"),
    VariableMapping::env("JOB_PIPELINE_ID", "SYSTEM_DEFINITIONID"),
    VariableMapping::env("PROJECT_ID", "BUILD_REPOSITORY_ID"),
    VariableMapping::env("PROJECT_NAME", "SYSTEM_TEAMPROJECT"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AzurePipelines;

impl CiProvider for AzurePipelines {
    fn name(&self) -> &'static str {
        "Azure Pipelines"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::AzurePipelines
    }

    fn mapping(&self) -> &'static [VariableMapping] {
        MAPPING
    }

    fn file_secret_path_prefixes(&self) -> &'static [&'static str] {
        &["/builds/"]
    }
}
