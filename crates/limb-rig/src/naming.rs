//! Deterministic node names for one limb
//!
//! Segment-level nodes are named from `{side}_{alias}`, limb-level nodes from
//! the base name `{side}_{part}`. Nothing downstream parses these names back;
//! stages pass node handles to each other.

use crate::chain::ChainRole;
use crate::spec::{BuildSpec, ControlRole};
use crate::xform::Channel;

/// Name factory for one limb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RigNames {
    side: String,
    part: String,
    base: String,
}

impl RigNames {
    /// Names for the limb described by `spec`
    #[must_use]
    pub fn new(spec: &BuildSpec) -> Self {
        Self {
            side: spec.side.clone(),
            part: spec.part.clone(),
            base: spec.base_name(),
        }
    }

    /// `{side}_{part}`
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Top node, `{SIDE}_{PART}`
    #[must_use]
    pub fn root(&self) -> String {
        self.base.to_uppercase()
    }

    /// `{side}_{alias}_{role}_JNT`
    #[must_use]
    pub fn joint(&self, alias: &str, role: ChainRole) -> String {
        format!("{}_{alias}_{}_JNT", self.side, role.suffix())
    }

    /// `{side}_{alias}_FK_CTRL`
    #[must_use]
    pub fn fk_control(&self, alias: &str) -> String {
        format!("{}_{alias}_FK_CTRL", self.side)
    }

    /// `{side}_{part}_IK_CTRL`
    #[must_use]
    pub fn world_control(&self) -> String {
        format!("{}_IK_CTRL", self.base)
    }

    /// `{side}_{part}_local_IK_CTRL`
    #[must_use]
    pub fn local_control(&self) -> String {
        format!("{}_local_IK_CTRL", self.base)
    }

    /// `{side}_{part}_PV_CTRL`
    #[must_use]
    pub fn pv_control(&self) -> String {
        format!("{}_PV_CTRL", self.base)
    }

    /// `{side}_{alias}_IK_CTRL` for the first segment
    #[must_use]
    pub fn base_control(&self, alias: &str) -> String {
        format!("{}_{alias}_IK_CTRL", self.side)
    }

    /// `{side}_{part}_settings_CTRL`
    #[must_use]
    pub fn settings_control(&self) -> String {
        format!("{}_settings_CTRL", self.base)
    }

    /// `{side}_{part}_IKH`
    #[must_use]
    pub fn ik_handle(&self) -> String {
        format!("{}_IKH", self.base)
    }

    /// `{side}_{alias}_{channel}_BCN`
    #[must_use]
    pub fn blend(&self, alias: &str, channel: Channel) -> String {
        format!("{}_{alias}_{}_BCN", self.side, channel.as_str())
    }

    /// `{side}_{part}_{suffix}` for limb-level utility nodes
    #[must_use]
    pub fn limb_node(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.base)
    }

    /// Per-segment stretch weight attribute on the world control
    ///
    /// `upArm` / `loArm` for the upper and lower segment.
    #[must_use]
    pub fn segment_weight(&self, upper: bool) -> String {
        let prefix = if upper { "up" } else { "lo" };
        format!("{prefix}{}", title_case(&self.part))
    }

    /// `{side}_{alias}_FK_stretch_MDL`
    #[must_use]
    pub fn fk_stretch(&self, alias: &str) -> String {
        format!("{}_{alias}_FK_stretch_MDL", self.side)
    }

    /// `{side}_{alias}_FK_OFF_LOC`, named after the joint it measures
    #[must_use]
    pub fn fk_offset_locator(&self, alias: &str) -> String {
        format!("{}_{alias}_FK_OFF_LOC", self.side)
    }

    /// `{side}_{part}_{stem}_GRP`
    #[must_use]
    pub fn group(&self, stem: &str) -> String {
        format!("{}_{stem}_GRP", self.base)
    }

    /// `{side}_{part}_{role}`, the control tag
    #[must_use]
    pub fn tag(&self, role: ControlRole) -> String {
        format!("{}_{}", self.base, role.as_str())
    }
}

/// `{node}_OFF_GRP`
#[must_use]
pub fn offset_group(node: &str) -> String {
    format!("{node}_OFF_GRP")
}

/// `{node}_{suffix}` for nodes named after another node
#[must_use]
pub fn derived(node: &str, suffix: &str) -> String {
    format!("{node}_{suffix}")
}

/// Capitalize the first letter of every alphabetic run
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for c in s.chars() {
        if c.is_ascii_alphabetic() {
            if boundary {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c.to_ascii_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names() -> RigNames {
        RigNames::new(&BuildSpec::default())
    }

    #[test]
    fn segment_and_limb_names() {
        let n = names();
        assert_eq!(n.root(), "L_ARM");
        assert_eq!(n.joint("elbow", ChainRole::Bind), "L_elbow_bind_JNT");
        assert_eq!(n.fk_control("wrist"), "L_wrist_FK_CTRL");
        assert_eq!(n.base_control("shoulder"), "L_shoulder_IK_CTRL");
        assert_eq!(n.blend("elbow", Channel::Rotate), "L_elbow_rotate_BCN");
        assert_eq!(n.group("noXform"), "L_arm_noXform_GRP");
        assert_eq!(n.tag(ControlRole::Pv), "L_arm_pv");
        assert_eq!(offset_group("L_wrist_FK_CTRL"), "L_wrist_FK_CTRL_OFF_GRP");
    }

    #[test]
    fn segment_weights_are_title_cased() {
        let n = names();
        assert_eq!(n.segment_weight(true), "upArm");
        assert_eq!(n.segment_weight(false), "loArm");
        assert_eq!(title_case("back_LEG2leg"), "Back_Leg2Leg");
    }
}
