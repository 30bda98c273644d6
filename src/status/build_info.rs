// src/status/build_info.rs
use serde::{Deserialize, Serialize};

const UNDEFINED: &str = "undefined";

/// Identifying metadata baked in by the embedding application.
///
/// Any field left out serializes as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildInfo {
    pub artifact_id: String,
    pub build_number: String,
    pub build_machine: String,
    pub built_by: String,
    pub built_when: String,
    pub git_sha1: String,
    pub git_branch: String,
    pub git_repo: String,
    pub runbook_uri: String,
    pub version: String,
}

impl BuildInfo {
    /// Placeholder used when the application supplies nothing.
    pub fn undefined() -> Self {
        Self {
            artifact_id: UNDEFINED.to_string(),
            build_number: UNDEFINED.to_string(),
            build_machine: UNDEFINED.to_string(),
            built_by: UNDEFINED.to_string(),
            built_when: UNDEFINED.to_string(),
            git_sha1: UNDEFINED.to_string(),
            git_branch: UNDEFINED.to_string(),
            git_repo: UNDEFINED.to_string(),
            runbook_uri: UNDEFINED.to_string(),
            version: "dev".to_string(),
        }
    }

    /// Build info for this crate's own package.
    pub fn from_cargo_env() -> Self {
        Self {
            artifact_id: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_repo: env!("CARGO_PKG_REPOSITORY").to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let info: BuildInfo = serde_yaml::from_str("version: \"1.1\"\nbuilt_by: me\n").unwrap();
        assert_eq!(info.version, "1.1");
        assert_eq!(info.built_by, "me");
        assert_eq!(info.artifact_id, "");
    }

    #[test]
    fn test_undefined_placeholder() {
        let info = BuildInfo::undefined();
        assert_eq!(info.artifact_id, "undefined");
        assert_eq!(info.version, "dev");
    }
}
