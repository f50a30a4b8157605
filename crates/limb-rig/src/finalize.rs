//! Last pass over a built limb: colors, locks, visibility switching, the
//! pole-vector display guide and optional guide removal

use crate::controls::{Control, ControlRegistry, IkControls, CONTROL_TYPE_ATTR, FK_IK_ATTR};
use crate::hierarchy::Hierarchy;
use crate::naming::{derived, RigNames};
use crate::shapes;
use crate::spec::{BuildSpec, GuideSet, SEGMENTS};
use crate::xform::{lock_and_hide, Channel};
use limb_scene::{ConstraintKind, NodeId, NodeType, SceneGraph, SceneResult, Value};
use tracing::{debug, warn};

/// Display line from the pole-vector control to the middle IK joint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PvGuide {
    /// Templated two-point curve
    pub curve: NodeId,
    /// Cluster at the pole-vector end
    pub start_cluster: NodeId,
    /// Cluster at the joint end
    pub end_cluster: NodeId,
}

/// Color every registered control of this limb by role
///
/// Controls whose tag is not `{side}_{part}_{role}` for this limb are left
/// untouched. Returns the number of colored controls.
///
/// # Errors
///
/// Propagates scene errors.
pub fn apply_colors<S: SceneGraph + ?Sized>(
    scene: &mut S,
    registry: &ControlRegistry,
    spec: &BuildSpec,
) -> SceneResult<usize> {
    let mut colored = 0;
    for (role, node) in registry.iter() {
        let tag = scene.get_string(&node.plug(CONTROL_TYPE_ATTR))?;
        if tag != format!("{}_{role}", registry.tag_prefix()) {
            warn!(control = %scene.name(node)?, %tag, "control tag outside this limb, skipping color");
            continue;
        }
        let color = spec.color(role);
        scene.set_bool(&node.plug("overrideEnabled"), true)?;
        scene.set_bool(&node.plug("overrideRGBColors"), true)?;
        scene.set_attr(
            &node.plug("overrideColorRGB"),
            Value::Double3([color.r, color.g, color.b]),
        )?;
        colored += 1;
    }
    debug!(colored, "applied control colors");
    Ok(colored)
}

/// Lock and hide the channels animators must not touch
///
/// FK controls keep rotate, IK controls keep translate and rotate, the pole
/// vector keeps translate and the settings control keeps only its custom
/// attributes.
///
/// # Errors
///
/// Propagates scene errors.
pub fn lock_controls<S: SceneGraph + ?Sized>(
    scene: &mut S,
    fk: &[Control; SEGMENTS],
    ik: &IkControls,
    settings: &Control,
) -> SceneResult<()> {
    for control in fk {
        lock_and_hide(
            scene,
            control.node,
            &[Channel::Translate, Channel::Scale, Channel::Visibility],
        )?;
    }
    for control in [&ik.world, &ik.local, &ik.base] {
        lock_and_hide(scene, control.node, &[Channel::Scale, Channel::Visibility])?;
    }
    lock_and_hide(
        scene,
        ik.pv.node,
        &[Channel::Rotate, Channel::Scale, Channel::Visibility],
    )?;
    lock_and_hide(scene, settings.node, &Channel::ALL)
}

/// Show the IK controls when `fkIk` is on and the FK controls when it is off
///
/// Visibility reads a double as on at 0.5 and above, so at exactly 0.5 both
/// control groups show. Anywhere else exactly one group is visible.
///
/// # Errors
///
/// Propagates scene errors.
pub fn wire_visibility<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    settings: &Control,
    hierarchy: &Hierarchy,
) -> SceneResult<NodeId> {
    let switch = settings.node.plug(FK_IK_ATTR);
    let reverse = scene.create_node(NodeType::Reverse, &names.limb_node("fkIk_vis_REV"), None)?;
    scene.connect(&switch, &reverse.plug("inputX"))?;
    scene.connect(&switch, &hierarchy.ik_controls.plug("visibility"))?;
    scene.connect(&reverse.plug("outputX"), &hierarchy.fk_controls.plug("visibility"))?;
    Ok(reverse)
}

/// Templated line between the pole-vector control and the middle IK joint
///
/// Each end is pinned by a single-CV cluster point-constrained to its node.
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_pv_guide<S: SceneGraph + ?Sized>(
    scene: &mut S,
    pv_control: NodeId,
    middle_joint: NodeId,
    hierarchy: &Hierarchy,
) -> SceneResult<PvGuide> {
    let start = scene.world_pivot(pv_control)?;
    let end = scene.world_pivot(middle_joint)?;
    let pv_name = scene.name(pv_control)?.to_string();
    let joint_name = scene.name(middle_joint)?.to_string();

    let curve = scene.create_curve(&derived(&pv_name, "GDE"), shapes::line(start, end), None)?;
    let start_cluster = scene.create_cluster(&derived(&pv_name, "CLS"), curve, 0)?;
    let end_cluster = scene.create_cluster(&derived(&joint_name, "CLS"), curve, 1)?;
    scene.create_constraint(ConstraintKind::Point, pv_control, start_cluster, false)?;
    scene.create_constraint(ConstraintKind::Point, middle_joint, end_cluster, false)?;
    scene.set_bool(&curve.plug("template"), true)?;
    scene.set_bool(&curve.plug("inheritsTransform"), false)?;

    scene.set_parent(start_cluster, Some(hierarchy.no_xform))?;
    scene.set_parent(end_cluster, Some(hierarchy.no_xform))?;
    scene.set_parent(curve, Some(hierarchy.ik_controls))?;
    Ok(PvGuide {
        curve,
        start_cluster,
        end_cluster,
    })
}

/// Delete the input guides that still exist
///
/// # Errors
///
/// Propagates scene errors.
pub fn remove_guides<S: SceneGraph + ?Sized>(scene: &mut S, guides: &GuideSet) -> SceneResult<usize> {
    let mut removed = 0;
    for guide in guides.iter() {
        if scene.exists(guide) {
            scene.delete_node(guide)?;
            removed += 1;
        }
    }
    debug!(removed, "removed guides");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ControlRole, Rgb};
    use limb_scene::{AttrSpec, Scene};

    fn tagged(scene: &mut Scene, name: &str, tag: &str) -> NodeId {
        let node = scene.create_node(NodeType::Transform, name, None).unwrap();
        scene.add_attr(node, CONTROL_TYPE_ATTR, AttrSpec::string()).unwrap();
        scene
            .set_attr(&node.plug(CONTROL_TYPE_ATTR), Value::String(tag.into()))
            .unwrap();
        node
    }

    #[test]
    fn colors_only_controls_tagged_for_this_limb() {
        let mut scene = Scene::new();
        let mine = tagged(&mut scene, "mine", "L_arm_pv");
        let foreign = tagged(&mut scene, "foreign", "R_arm_pv");
        let mut registry = ControlRegistry::new("L_arm");
        registry.register(ControlRole::Pv, mine);
        registry.register(ControlRole::Pv, foreign);

        let spec = BuildSpec::default().with_color(ControlRole::Pv, Rgb::new(1.0, 0.5, 0.0));
        assert_eq!(apply_colors(&mut scene, &registry, &spec).unwrap(), 1);
        assert!(scene.get_bool(&mine.plug("overrideEnabled")).unwrap());
        assert_eq!(
            scene.get_attr(&mine.plug("overrideColorRGB")).unwrap(),
            Value::Double3([1.0, 0.5, 0.0])
        );
        assert!(!scene.get_bool(&foreign.plug("overrideEnabled")).unwrap());
    }

    #[test]
    fn removes_only_existing_guides() {
        let mut scene = Scene::new();
        let guides: Vec<NodeId> = (0..3)
            .map(|i| {
                scene
                    .create_node(NodeType::Locator, &format!("g{i}"), None)
                    .unwrap()
            })
            .collect();
        scene.delete_node(guides[1]).unwrap();
        let set = GuideSet::new(guides, None);

        assert_eq!(remove_guides(&mut scene, &set).unwrap(), 2);
        assert_eq!(scene.len(), 0);
        assert_eq!(remove_guides(&mut scene, &set).unwrap(), 0);
    }
}
