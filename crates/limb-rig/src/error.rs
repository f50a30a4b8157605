//! Error types for rig synthesis and rig-file loading

use limb_scene::SceneError;
use std::path::PathBuf;

/// Result alias for rig construction
pub type RigResult<T> = Result<T, RigError>;

/// Errors raised while synthesizing a limb rig
///
/// Input errors are reported before the scene is touched. Scene errors come
/// from the runtime mid-build and leave whatever was already created in place.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RigError {
    /// Wrong guide count, missing pole vector or unusable guide placement
    #[error("invalid guide set: {0}")]
    InvalidGuideSet(String),

    /// Unrecognized axis label, or primary and up axis share a base axis
    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    /// Side, part or alias cannot form node names
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The scene runtime refused an operation or a reference went missing
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

impl RigError {
    /// True for errors raised by input validation (nothing was created)
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            RigError::InvalidGuideSet(_) | RigError::InvalidAxis(_) | RigError::InvalidName(_)
        )
    }

    /// True for errors surfaced from the scene runtime
    #[must_use]
    pub fn is_scene_error(&self) -> bool {
        matches!(self, RigError::Scene(_))
    }
}

/// Errors raised while loading a rig file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid TOML rig file: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON syntax or schema error
    #[error("invalid JSON rig file: {0}")]
    Json(#[from] serde_json::Error),

    /// Extension is neither `.toml` nor `.json`
    #[error("unsupported rig file format: {0}")]
    UnsupportedFormat(String),

    /// Guides described by the file could not be created
    #[error(transparent)]
    Rig(#[from] RigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_helpers() {
        assert!(RigError::InvalidAxis("x".into()).is_input_error());
        assert!(RigError::InvalidGuideSet("x".into()).is_input_error());
        let scene = RigError::from(SceneError::NodeNotFound("a".into()));
        assert!(scene.is_scene_error());
        assert!(!scene.is_input_error());
    }
}
