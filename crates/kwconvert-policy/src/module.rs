//! Kubewarden policy module references

pub const HOST_NAMESPACES_PSP: &str =
    "registry://ghcr.io/kubewarden/policies/host-namespaces-psp:v1.1.0";
pub const ALLOW_PRIVILEGE_ESCALATION_PSP: &str =
    "registry://ghcr.io/kubewarden/policies/allow-privilege-escalation-psp:v1.0.0";
pub const POD_PRIVILEGED: &str = "registry://ghcr.io/kubewarden/policies/pod-privileged:v1.0.3";
pub const CONTAINER_RUNNING_AS_USER: &str =
    "registry://ghcr.io/kubewarden/policies/container-running-as-user:v1.0.4";
pub const TRUSTED_REPOS: &str = "registry://ghcr.io/kubewarden/policies/trusted-repos:v2.0.1";
pub const ENV_VARIABLE_SECRETS_SCANNER: &str =
    "registry://ghcr.io/kubewarden/policies/env-variable-secrets-scanner:v1.0.5";
pub const ENVIRONMENT_VARIABLE_POLICY: &str =
    "registry://ghcr.io/kubewarden/policies/environment-variable-policy:v3.0.2";
pub const LABELS: &str = "registry://ghcr.io/kubewarden/policies/labels:v0.1.0";
pub const ANNOTATIONS: &str = "registry://ghcr.io/kubewarden/policies/annotations:v0.1.0";
pub const CEL_POLICY: &str = "registry://ghcr.io/kubewarden/policies/cel-policy:v1.3.4";
pub const IMAGE_CVE_POLICY: &str = "registry://ghcr.io/kubewarden/policies/image-cve-policy:v0.5.0";
pub const HIGH_RISK_SERVICE_ACCOUNT: &str =
    "registry://ghcr.io/kubewarden/policies/high-risk-service-account:v0.1.2";
pub const CONTAINER_RESOURCES: &str =
    "registry://ghcr.io/kubewarden/policies/container-resources:v1.3.1";
pub const PVC_STORAGE_CLASS: &str =
    "registry://ghcr.io/kubewarden/policies/persistentvolumeclaim-storageclass-policy:v1.1.0";

/// Derive a policy group member name from a module reference.
///
/// Drops the URI scheme and tag, keeps the last path segment and turns
/// dashes into underscores so the result is a valid CEL function name:
/// `registry://ghcr.io/kubewarden/policies/host-namespaces-psp:v1.1.0`
/// becomes `host_namespaces_psp`.
pub fn member_name(module: &str) -> String {
    let mut rest = match module.find("://") {
        Some(idx) => &module[idx + 3..],
        None => module,
    };

    if let Some(idx) = rest.rfind(':') {
        rest = &rest[..idx];
    }

    let last = rest.rsplit('/').next().unwrap_or(rest);
    last.replace('-', "_")
}
