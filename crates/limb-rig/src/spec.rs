//! Build options and guide inputs

use crate::axis::SignedAxis;
use crate::error::{RigError, RigResult};
use limb_scene::{NodeId, SceneGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Number of segments in a limb
pub const SEGMENTS: usize = 3;

/// Semantic role of a control, used for colors and lock policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlRole {
    /// FK segment control
    Fk,
    /// World, base and settings controls
    Primary,
    /// Local IK control
    Secondary,
    /// Pole-vector control
    Pv,
}

impl ControlRole {
    /// Every role, in registry order
    pub const ALL: [ControlRole; 4] = [
        ControlRole::Fk,
        ControlRole::Primary,
        ControlRole::Secondary,
        ControlRole::Pv,
    ];

    /// Tag suffix
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ControlRole::Fk => "fk",
            ControlRole::Primary => "primary",
            ControlRole::Secondary => "secondary",
            ControlRole::Pv => "pv",
        }
    }

    /// Color used when no override is given
    #[must_use]
    pub fn default_color(self) -> Rgb {
        match self {
            ControlRole::Primary => Rgb::new(1.0, 1.0, 0.0),
            ControlRole::Pv => Rgb::new(0.0, 1.0, 1.0),
            ControlRole::Fk => Rgb::new(0.0, 0.0, 1.0),
            ControlRole::Secondary => Rgb::new(0.0, 0.2, 1.0),
        }
    }
}

impl fmt::Display for ControlRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear RGB triple, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rgb {
    /// Red
    pub r: f64,
    /// Green
    pub g: f64,
    /// Blue
    pub b: f64,
}

impl Rgb {
    /// Create a color
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl From<[f64; 3]> for Rgb {
    fn from([r, g, b]: [f64; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [f64; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Options for one limb build
///
/// ```rust
/// use limb_rig::{BuildSpec, SignedAxis};
///
/// let spec = BuildSpec::default()
///     .with_side("R")
///     .with_part("leg")
///     .with_aliases(["hip", "knee", "ankle"])
///     .with_axes(SignedAxis::NEG_X, SignedAxis::POS_Z);
/// assert_eq!(spec.base_name(), "R_leg");
/// assert_eq!(spec.root_name(), "R_LEG");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSpec {
    /// Side tag, e.g. `L`
    pub side: String,
    /// Part tag, e.g. `arm`
    pub part: String,
    /// One alias per segment, used in node names
    pub aliases: Vec<String>,
    /// Axis pointing down each segment
    pub primary_axis: SignedAxis,
    /// Axis the settings control is offset along
    pub up_axis: SignedAxis,
    /// Build the IK and FK stretch networks
    pub add_stretch: bool,
    /// Delete the guides once the rig is built
    pub remove_guides: bool,
    /// Per-role color overrides
    pub color_overrides: BTreeMap<ControlRole, Rgb>,
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self {
            side: "L".to_string(),
            part: "arm".to_string(),
            aliases: vec!["shoulder".into(), "elbow".into(), "wrist".into()],
            primary_axis: SignedAxis::POS_X,
            up_axis: SignedAxis::POS_Y,
            add_stretch: false,
            remove_guides: false,
            color_overrides: BTreeMap::new(),
        }
    }
}

impl BuildSpec {
    /// Set the side tag
    #[must_use]
    pub fn with_side(mut self, side: impl Into<String>) -> Self {
        self.side = side.into();
        self
    }

    /// Set the part tag
    #[must_use]
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = part.into();
        self
    }

    /// Set the segment aliases
    #[must_use]
    pub fn with_aliases<I, A>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Set primary and up axes
    #[must_use]
    pub fn with_axes(mut self, primary: SignedAxis, up: SignedAxis) -> Self {
        self.primary_axis = primary;
        self.up_axis = up;
        self
    }

    /// Enable or disable stretch
    #[must_use]
    pub fn with_stretch(mut self, add_stretch: bool) -> Self {
        self.add_stretch = add_stretch;
        self
    }

    /// Enable or disable guide removal
    #[must_use]
    pub fn with_remove_guides(mut self, remove_guides: bool) -> Self {
        self.remove_guides = remove_guides;
        self
    }

    /// Override the color of one role
    #[must_use]
    pub fn with_color(mut self, role: ControlRole, color: Rgb) -> Self {
        self.color_overrides.insert(role, color);
        self
    }

    /// `{side}_{part}`, the prefix of limb-level node names
    #[must_use]
    pub fn base_name(&self) -> String {
        format!("{}_{}", self.side, self.part)
    }

    /// `{SIDE}_{PART}`, the name of the rig's top node
    #[must_use]
    pub fn root_name(&self) -> String {
        self.base_name().to_uppercase()
    }

    /// Color for a role, honoring overrides
    #[must_use]
    pub fn color(&self, role: ControlRole) -> Rgb {
        self.color_overrides
            .get(&role)
            .copied()
            .unwrap_or_else(|| role.default_color())
    }

    /// Check names and axes
    ///
    /// # Errors
    ///
    /// `InvalidName` for tags that cannot form node names, `InvalidGuideSet`
    /// when there are not exactly three aliases, `InvalidAxis` when primary
    /// and up share a base axis.
    pub fn validate(&self) -> RigResult<()> {
        if self.aliases.len() != SEGMENTS {
            return Err(RigError::InvalidGuideSet(format!(
                "expected {SEGMENTS} aliases, got {}",
                self.aliases.len()
            )));
        }
        check_token("side", &self.side, true)?;
        check_token("part", &self.part, false)?;
        for alias in &self.aliases {
            check_token("alias", alias, false)?;
        }
        let unique: BTreeSet<&str> = self.aliases.iter().map(String::as_str).collect();
        if unique.len() != SEGMENTS {
            return Err(RigError::InvalidName(format!(
                "aliases must be distinct: {:?}",
                self.aliases
            )));
        }
        if self.aliases[0] == self.part {
            return Err(RigError::InvalidName(format!(
                "first alias {:?} clashes with the part name",
                self.part
            )));
        }
        if self.primary_axis.axis() == self.up_axis.axis() {
            return Err(RigError::InvalidAxis(format!(
                "primary axis {} and up axis {} share a base axis",
                self.primary_axis, self.up_axis
            )));
        }
        Ok(())
    }
}

fn check_token(what: &str, value: &str, leading: bool) -> RigResult<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(RigError::InvalidName(format!("{what} is empty")));
    };
    let first_ok = if leading {
        first.is_ascii_alphabetic() || first == '_'
    } else {
        first.is_ascii_alphanumeric() || first == '_'
    };
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(RigError::InvalidName(format!("{what} {value:?}")));
    }
    Ok(())
}

/// Guide transforms a limb is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideSet {
    /// One guide per segment, root to tip
    pub segments: Vec<NodeId>,
    /// Pole-vector guide
    pub pole_vector: Option<NodeId>,
}

impl GuideSet {
    /// Create a guide set from node handles
    #[must_use]
    pub fn new(segments: Vec<NodeId>, pole_vector: Option<NodeId>) -> Self {
        Self {
            segments,
            pole_vector,
        }
    }

    /// Resolve guides by name
    ///
    /// # Errors
    ///
    /// `InvalidGuideSet` if any name does not resolve.
    pub fn from_names<S: SceneGraph + ?Sized>(
        scene: &S,
        segments: &[&str],
        pole_vector: &str,
    ) -> RigResult<Self> {
        let lookup = |name: &str| {
            scene
                .find(name)
                .ok_or_else(|| RigError::InvalidGuideSet(format!("guide {name:?} does not exist")))
        };
        let segments = segments
            .iter()
            .map(|name| lookup(name))
            .collect::<RigResult<Vec<_>>>()?;
        Ok(Self::new(segments, Some(lookup(pole_vector)?)))
    }

    /// Segment guides followed by the pole-vector guide
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.segments.iter().copied().chain(self.pole_vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_arm_layout() {
        let spec = BuildSpec::default();
        assert_eq!(spec.base_name(), "L_arm");
        assert_eq!(spec.root_name(), "L_ARM");
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn rejects_shared_base_axis() {
        let spec = BuildSpec::default().with_axes(SignedAxis::POS_X, SignedAxis::NEG_X);
        assert!(matches!(spec.validate(), Err(RigError::InvalidAxis(_))));
    }

    #[test]
    fn rejects_alias_count() {
        let spec = BuildSpec::default().with_aliases(["upper", "lower"]);
        assert!(matches!(spec.validate(), Err(RigError::InvalidGuideSet(_))));
    }

    #[test]
    fn rejects_bad_tokens() {
        for spec in [
            BuildSpec::default().with_side(""),
            BuildSpec::default().with_side("1L"),
            BuildSpec::default().with_part("fore arm"),
            BuildSpec::default().with_aliases(["a", "b.c", "d"]),
            BuildSpec::default().with_aliases(["a", "a", "d"]),
            BuildSpec::default().with_aliases(["arm", "b", "c"]),
        ] {
            assert!(matches!(spec.validate(), Err(RigError::InvalidName(_))), "{spec:?}");
        }
    }

    #[test]
    fn color_overrides_win() {
        let spec = BuildSpec::default().with_color(ControlRole::Fk, Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(spec.color(ControlRole::Fk), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(spec.color(ControlRole::Pv), Rgb::new(0.0, 1.0, 1.0));
    }
}
