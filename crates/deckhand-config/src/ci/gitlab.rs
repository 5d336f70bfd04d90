use super::{CiProvider, ProviderKind, VariableMapping};

const MAPPING: &[VariableMapping] = &[
    VariableMapping::env("CONTAINER_REGISTRY", "CI_REGISTRY"),
    VariableMapping::env("CONTAINER_REGISTRY_PASSWORD", "CI_REGISTRY_PASSWORD"),
    VariableMapping::env("CONTAINER_REGISTRY_REPO", "CI_REGISTRY_IMAGE"),
    VariableMapping::env("CONTAINER_REGISTRY_USER", "CI_REGISTRY_USER"),
    VariableMapping::env("ENVIRONMENT_SLUG", "CI_ENVIRONMENT_SLUG"),
    VariableMapping::env("ENVIRONMENT_URL", "CI_ENVIRONMENT_URL"),
    VariableMapping::env("GIT_COMMIT_REF_NAME", "CI_COMMIT_REF_NAME"),
    VariableMapping::env("GIT_COMMIT_SHA", "CI_COMMIT_SHA"),
    VariableMapping::env("GIT_DEFAULT_TARGET_BRANCH", "CI_DEFAULT_BRANCH"),
    VariableMapping::env("GIT_TARGET_BRANCH", "CI_MERGE_REQUEST_TARGET_BRANCH_NAME"),
    VariableMapping::env("JOB_ACTOR", "GITLAB_USER_NAME"),
    VariableMapping::env("JOB_ID", "CI_JOB_ID"),
    VariableMapping::env("JOB_NAME", "CI_JOB_NAME"),
    VariableMapping::env("JOB_PIPELINE_ID", "CI_PIPELINE_ID"),
    VariableMapping::env("K8S_CLUSTER_ISSUER", "KUBE_CLUSTER_ISSUER"),
    VariableMapping::env("K8S_INGRESS_BASE_DOMAIN", "KUBE_INGRESS_BASE_DOMAIN"),
    VariableMapping::env("K8S_INGRESS_PREVENT_ROBOTS", "KUBE_INGRESS_PREVENT_ROBOTS"),
    VariableMapping::env("K8S_NAMESPACE", "KUBE_NAMESPACE"),
    VariableMapping::env("PR_ASSIGNEES", "CI_MERGE_REQUEST_ASSIGNEES"),
    VariableMapping::env("PR_ID", "CI_MERGE_REQUEST_ID"),
    VariableMapping::env("PROJECT_DIR", "CI_PROJECT_DIR"),
    VariableMapping::env("PROJECT_ID", "CI_PROJECT_ID"),
    VariableMapping::env("PROJECT_NAME", "CI_PROJECT_NAME"),
    VariableMapping::env("PROJECT_PATH_SLUG", "CI_PROJECT_PATH_SLUG"),
    VariableMapping::env("PR_TITLE", "CI_MERGE_REQUEST_TITLE"),
    VariableMapping::env("PR_URL", "CI_MERGE_REQUEST_PROJECT_URL"),
    VariableMapping::env("VAULT_JWT", "CI_JOB_JWT"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabCi;

impl CiProvider for GitLabCi {
    fn name(&self) -> &'static str {
        "GitLab CI"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn mapping(&self) -> &'static [VariableMapping] {
        MAPPING
    }

    fn file_secret_path_prefixes(&self) -> &'static [&'static str] {
        &["/builds/"]
    }
}
