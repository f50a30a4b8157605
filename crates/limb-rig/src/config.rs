//! Rig files: build options plus the guides to build from
//!
//! A rig file is TOML or JSON, picked by extension. Build options sit at the
//! top level next to a `guides` list and a `pole_vector` entry:
//!
//! ```toml
//! side = "L"
//! part = "arm"
//! aliases = ["shoulder", "elbow", "wrist"]
//! primary_axis = "X"
//! up_axis = "Y"
//! add_stretch = true
//!
//! [[guides]]
//! name = "shoulder_GDE"
//! translate = [0.0, 0.0, 0.0]
//!
//! [pole_vector]
//! name = "pv_GDE"
//! translate = [10.0, 0.0, -10.0]
//! ```

use crate::error::{ConfigError, RigResult};
use crate::spec::{BuildSpec, GuideSet};
use limb_scene::{NodeType, SceneGraph};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One guide transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideSpec {
    /// Node name
    pub name: String,
    /// World translation
    #[serde(default)]
    pub translate: [f64; 3],
    /// Rotation in degrees
    #[serde(default)]
    pub rotate: [f64; 3],
}

impl GuideSpec {
    /// Guide at `translate` with no rotation
    #[must_use]
    pub fn at(name: impl Into<String>, translate: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            translate,
            rotate: [0.0; 3],
        }
    }
}

/// Parsed rig file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFile {
    /// Build options
    #[serde(flatten)]
    pub build: BuildSpec,
    /// Segment guides, root to tip
    #[serde(default)]
    pub guides: Vec<GuideSpec>,
    /// Pole-vector guide
    #[serde(default)]
    pub pole_vector: Option<GuideSpec>,
}

impl RigFile {
    /// Read a `.toml` or `.json` rig file
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `UnsupportedFormat` for other
    /// extensions and `Toml` / `Json` for malformed content.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = parse(&content)?;
        debug!(path = %path.display(), base = %file.build.base_name(), "loaded rig file");
        Ok(file)
    }

    /// Parse TOML content
    ///
    /// # Errors
    ///
    /// `Toml` for malformed content.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse JSON content
    ///
    /// # Errors
    ///
    /// `Json` for malformed content.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Create the guides as locators and collect them into a [`GuideSet`]
    ///
    /// The guide count is not checked here; the builder rejects bad sets.
    ///
    /// # Errors
    ///
    /// Scene errors, e.g. a guide name already in use.
    pub fn instantiate<S: SceneGraph + ?Sized>(&self, scene: &mut S) -> RigResult<GuideSet> {
        let mut create = |guide: &GuideSpec| -> RigResult<_> {
            let node = scene.create_node(NodeType::Locator, &guide.name, None)?;
            scene.set_vector3(&node.plug("translate"), Vector3::from(guide.translate))?;
            scene.set_vector3(&node.plug("rotate"), Vector3::from(guide.rotate))?;
            Ok(node)
        };
        let segments = self
            .guides
            .iter()
            .map(&mut create)
            .collect::<RigResult<Vec<_>>>()?;
        let pole_vector = self.pole_vector.as_ref().map(&mut create).transpose()?;
        Ok(GuideSet::new(segments, pole_vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::SignedAxis;
    use crate::spec::{ControlRole, Rgb};
    use limb_scene::Scene;

    const TOML_ARM: &str = r#"
side = "R"
part = "leg"
aliases = ["hip", "knee", "ankle"]
primary_axis = "-X"
up_axis = "z"
add_stretch = true

[color_overrides]
pv = [1.0, 0.0, 0.0]

[[guides]]
name = "hip_GDE"
translate = [0.0, 10.0, 0.0]

[[guides]]
name = "knee_GDE"
translate = [0.0, 5.0, 1.0]

[[guides]]
name = "ankle_GDE"
translate = [0.0, 0.0, 0.0]

[pole_vector]
name = "knee_PV_GDE"
translate = [0.0, 5.0, 10.0]
"#;

    #[test]
    fn parses_toml_with_defaults() {
        let file = RigFile::from_toml_str(TOML_ARM).unwrap();
        assert_eq!(file.build.base_name(), "R_leg");
        assert_eq!(file.build.primary_axis, SignedAxis::NEG_X);
        assert_eq!(file.build.up_axis, SignedAxis::POS_Z);
        assert!(file.build.add_stretch);
        assert!(!file.build.remove_guides);
        assert_eq!(file.build.color(ControlRole::Pv), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(file.guides.len(), 3);
        assert_eq!(file.guides[1].rotate, [0.0; 3]);
    }

    #[test]
    fn parses_json() {
        let json = r#"{
            "side": "L",
            "part": "arm",
            "guides": [{"name": "a", "translate": [1.0, 2.0, 3.0]}],
            "pole_vector": {"name": "pv"}
        }"#;
        let file = RigFile::from_json_str(json).unwrap();
        assert_eq!(file.build.aliases, vec!["shoulder", "elbow", "wrist"]);
        assert_eq!(file.guides[0].translate, [1.0, 2.0, 3.0]);
        assert_eq!(file.pole_vector.unwrap().translate, [0.0; 3]);
    }

    #[test]
    fn bad_axis_label_is_a_parse_error() {
        let err = RigFile::from_toml_str("primary_axis = \"W\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = RigFile::load("limb.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn instantiate_creates_locators() {
        let file = RigFile::from_toml_str(TOML_ARM).unwrap();
        let mut scene = Scene::new();
        let guides = file.instantiate(&mut scene).unwrap();
        assert_eq!(guides.segments.len(), 3);
        let knee = scene.require("knee_GDE").unwrap();
        assert_eq!(guides.segments[1], knee);
        assert_eq!(scene.node_type(knee).unwrap(), NodeType::Locator);
        let p = scene.world_position(knee).unwrap();
        assert!((p.y - 5.0).abs() < 1e-9 && (p.z - 1.0).abs() < 1e-9);
        assert!(guides.pole_vector.is_some());
    }
}
