//! Configuration types for flow warping.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_parallel() -> bool {
    true
}

/// Top-level warp configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpConfig {
    /// What to write for destination pixels whose flow is unknown.
    #[serde(default)]
    pub unknown_policy: UnknownFlowPolicy,
    /// Warp rows on the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Optional text dump of the decoded flow planes.
    #[serde(default)]
    pub dump: Option<DumpConfig>,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            unknown_policy: UnknownFlowPolicy::default(),
            parallel: true,
            dump: None,
        }
    }
}

/// Handling of destination pixels whose flow vector is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UnknownFlowPolicy {
    /// Sample the source pixel at (0, 0).
    #[default]
    Origin,
    /// Leave the destination pixel at 0.0 in every channel.
    Skip,
    /// Set every channel of the destination pixel to `value`.
    Fill {
        /// Sentinel sample value.
        value: f32,
    },
}

/// Paths for the debug text dump of the u and v planes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpConfig {
    /// File receiving the horizontal components.
    pub x_path: PathBuf,
    /// File receiving the vertical components.
    pub y_path: PathBuf,
}

impl WarpConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let UnknownFlowPolicy::Fill { value } = self.unknown_policy
            && !value.is_finite()
        {
            return Err(ConfigError::NonFiniteFill(value));
        }
        if let Some(dump) = &self.dump {
            if dump.x_path.as_os_str().is_empty() || dump.y_path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyDumpPath);
            }
            if dump.x_path == dump.y_path {
                return Err(ConfigError::SharedDumpPath(dump.x_path.clone()));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Fill value must be finite, got {0}")]
    NonFiniteFill(f32),
    #[error("Dump paths must be non-empty")]
    EmptyDumpPath,
    #[error("Dump paths must differ, both are {}", .0.display())]
    SharedDumpPath(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_origin_policy() {
        let config = WarpConfig::default();
        assert_eq!(config.unknown_policy, UnknownFlowPolicy::Origin);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config: WarpConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.unknown_policy, UnknownFlowPolicy::Origin);
        assert!(config.parallel);
        assert!(config.dump.is_none());
    }

    #[test]
    fn test_policy_json() {
        let config: WarpConfig = serde_json::from_str(
            r#"{"unknown_policy": {"type": "Fill", "value": -1.0}, "parallel": false}"#,
        )
        .unwrap();
        assert_eq!(config.unknown_policy, UnknownFlowPolicy::Fill { value: -1.0 });
        assert!(!config.parallel);

        let json = serde_json::to_string(&UnknownFlowPolicy::Skip).unwrap();
        assert_eq!(json, r#"{"type":"Skip"}"#);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = WarpConfig {
            unknown_policy: UnknownFlowPolicy::Fill { value: f32::NAN },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonFiniteFill(_))));

        let config = WarpConfig {
            dump: Some(DumpConfig {
                x_path: PathBuf::from("flow.txt"),
                y_path: PathBuf::from("flow.txt"),
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SharedDumpPath(_))));

        let config = WarpConfig {
            dump: Some(DumpConfig {
                x_path: PathBuf::new(),
                y_path: PathBuf::from("y.txt"),
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDumpPath)));
    }
}
