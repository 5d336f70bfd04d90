//! Name sanitizers.

use regex::Regex;
use std::sync::LazyLock;

// A run of leading digits, or any single character that is not allowed in
// an environment variable name.
static ENV_UNSAFE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+|[^a-zA-Z0-9_]").unwrap());

static K8S_UNSAFE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").unwrap());

/// Turn an arbitrary name into a token usable as an environment variable name.
///
/// The result is upper-cased; leading digits and every character outside
/// `[A-Za-z0-9_]` are replaced with an underscore.
///
/// ```
/// use deckhand_core::naming::env_var_safe_key;
/// assert_eq!(env_var_safe_key("my-project"), "MY_PROJECT");
/// assert_eq!(env_var_safe_key("42things"), "_THINGS");
/// ```
pub fn env_var_safe_key(key: &str) -> String {
    ENV_UNSAFE_REGEX.replace_all(key, "_").to_uppercase()
}

/// Turn an arbitrary name into a Kubernetes resource name fragment.
///
/// Everything outside `[A-Za-z0-9]` becomes `-`, then the result is lower-cased.
pub fn kubernetes_safe_name(name: &str) -> String {
    K8S_UNSAFE_REGEX.replace_all(name, "-").to_lowercase()
}
