//! Error types shared across the viewer

use thiserror::Error;

use crate::scene::ModelHandle;

/// A bootstrap step that could not be applied to the scene
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    #[error("scene is not available: {0}")]
    Unavailable(&'static str),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// One construction strategy that declined or failed to build a model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{strategy}: {reason}")]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    #[error("empty payload for {0}")]
    Empty(String),
    #[error("blob store rejected {name}: {reason}")]
    Store { name: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("{}", describe_attempts(.0))]
    AllStrategiesFailed(Vec<StrategyFailure>),
    #[error("could not stage file: {0}")]
    Blob(#[from] BlobError),
    #[error("unsupported file {0}: expected .glb, .gltf or model/gltf-binary")]
    Unsupported(String),
    #[error("{0} is still being framed; queue further selections with submit")]
    Busy(ModelHandle),
}

impl LoadError {
    /// Per-strategy failures, empty for errors that happen before construction
    pub fn attempts(&self) -> &[StrategyFailure] {
        match self {
            LoadError::AllStrategiesFailed(attempts) => attempts,
            _ => &[],
        }
    }
}

fn describe_attempts(attempts: &[StrategyFailure]) -> String {
    if attempts.is_empty() {
        return "no construction strategies configured".to_string();
    }
    let details = attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    format!(
        "all {} construction strategies failed: {}",
        attempts.len(),
        details
    )
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregated_message_lists_every_attempt() {
        let err = LoadError::AllStrategiesFailed(vec![
            StrategyFailure {
                strategy: "binary-gltf-scene",
                reason: "bad magic".to_string(),
            },
            StrategyFailure {
                strategy: "gltf-document-scene",
                reason: "not JSON".to_string(),
            },
        ]);

        let msg = err.to_string();
        assert!(msg.starts_with("all 2 construction strategies failed"));
        assert!(msg.contains("binary-gltf-scene: bad magic"));
        assert!(msg.contains("gltf-document-scene: not JSON"));
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn test_empty_strategy_list_message() {
        let err = LoadError::AllStrategiesFailed(Vec::new());
        assert_eq!(err.to_string(), "no construction strategies configured");
    }
}
