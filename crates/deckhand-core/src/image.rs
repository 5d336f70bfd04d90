//! Container image payloads.

use serde::{Deserialize, Serialize};

/// A container image being built, as seen by `container_build_stage` hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerImage {
    /// Repository, e.g. `registry.example.com/group/project`.
    pub repository: String,
    /// Tags that will be pushed for this image.
    pub tags: Vec<String>,
}

impl DockerImage {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Fully qualified references (`repository:tag`) for every tag.
    pub fn references(&self) -> Vec<String> {
        self.tags
            .iter()
            .map(|tag| format!("{}:{}", self.repository, tag))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references() {
        let image = DockerImage::new("registry.local/app")
            .with_tag("abc123")
            .with_tag("latest");

        assert_eq!(
            image.references(),
            vec!["registry.local/app:abc123", "registry.local/app:latest"]
        );
    }

    #[test]
    fn test_untagged_image_has_no_references() {
        assert!(DockerImage::new("app").references().is_empty());
    }
}
