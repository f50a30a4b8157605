//! Canonical group tree of a limb
//!
//! ```text
//! {SIDE}_{PART}
//!  └─ {side}_{part}_rig_GRP
//!      ├─ {side}_{part}_skeleton_GRP   bind chain
//!      ├─ {side}_{part}_FK_CTRL_GRP    FK control tree
//!      ├─ {side}_{part}_IK_CTRL_GRP    world, pv and base controls
//!      ├─ {side}_{part}_noXform_GRP    IK handle, stretch locators
//!      ├─ FK chain root
//!      ├─ IK chain root
//!      └─ settings offset group
//! ```
//!
//! The skeleton group sits under the rig group rather than directly under the
//! root, so the root's global scale reaches the bind chain through the same
//! parent as the controls.

use crate::chain::Chains;
use crate::controls::{Control, IkControls};
use crate::naming::RigNames;
use crate::xform::{hide, transfer_pivots};
use limb_scene::{AttrSpec, NodeId, NodeType, Plug, SceneGraph, SceneResult};
use tracing::debug;

/// Uniform scale attribute on the root
pub const GLOBAL_SCALE_ATTR: &str = "globalScale";

/// Groups of one limb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hierarchy {
    /// `{SIDE}_{PART}`
    pub root: NodeId,
    /// `_rig_GRP`
    pub rig: NodeId,
    /// `_skeleton_GRP`
    pub skeleton: NodeId,
    /// `_FK_CTRL_GRP`
    pub fk_controls: NodeId,
    /// `_IK_CTRL_GRP`
    pub ik_controls: NodeId,
    /// `_noXform_GRP`
    pub no_xform: NodeId,
}

/// What the organizer places into the tree
#[derive(Debug, Clone, Copy)]
pub struct Members<'a> {
    /// The three chains
    pub chains: &'a Chains,
    /// First FK control, placed by its offset group
    pub fk_root: &'a Control,
    /// IK-side controls
    pub ik: &'a IkControls,
    /// Settings control, placed by its offset group
    pub settings: &'a Control,
    /// Nodes that must not inherit rig transforms
    pub no_xform: &'a [NodeId],
}

/// Create the empty groups, then reparent everything into them
///
/// World transforms are preserved. Group pivots move to the bind root and
/// the internal chains are hidden.
///
/// # Errors
///
/// Propagates scene errors.
pub fn organize<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    members: &Members<'_>,
) -> SceneResult<Hierarchy> {
    let group = |scene: &mut S, name: String| scene.create_node(NodeType::Transform, &name, None);
    let fk_controls = group(scene, names.group("FK_CTRL"))?;
    let ik_controls = group(scene, names.group("IK_CTRL"))?;
    let skeleton = group(scene, names.group("skeleton"))?;
    let no_xform = group(scene, names.group("noXform"))?;
    let rig = group(scene, names.group("rig"))?;
    let root = group(scene, names.root())?;

    let chains = members.chains;
    let ik = members.ik;
    for control in [ik.world.node, ik.pv.node, ik.base.node] {
        scene.set_parent(control, Some(ik_controls))?;
    }
    scene.set_parent(members.fk_root.top(), Some(fk_controls))?;
    scene.set_parent(chains.bind.root(), Some(skeleton))?;
    for node in members.no_xform {
        scene.set_parent(*node, Some(no_xform))?;
    }
    for node in [
        skeleton,
        fk_controls,
        ik_controls,
        no_xform,
        chains.fk.root(),
        chains.ik.root(),
        members.settings.top(),
    ] {
        scene.set_parent(node, Some(rig))?;
    }
    scene.set_parent(rig, Some(root))?;

    let pivot = transfer_pivots(
        scene,
        chains.bind.root(),
        &[skeleton, rig, fk_controls, ik_controls],
    )?;
    hide(
        scene,
        &[no_xform, chains.fk.root(), chains.ik.root(), chains.bind.root()],
    )?;
    debug!(root = %names.root(), ?pivot, "organized hierarchy");

    Ok(Hierarchy {
        root,
        rig,
        skeleton,
        fk_controls,
        ik_controls,
        no_xform,
    })
}

/// Give the root a `globalScale` driving its uniform scale
///
/// # Errors
///
/// Propagates scene errors.
pub fn add_global_scale<S: SceneGraph + ?Sized>(
    scene: &mut S,
    hierarchy: &Hierarchy,
) -> SceneResult<Plug> {
    let root = hierarchy.root;
    scene.add_attr(
        root,
        GLOBAL_SCALE_ATTR,
        AttrSpec::double(1.0).min(0.001).keyable(true),
    )?;
    let global_scale = root.plug(GLOBAL_SCALE_ATTR);
    for axis in ['X', 'Y', 'Z'] {
        scene.connect(&global_scale, &root.plug(format!("scale{axis}")))?;
    }
    Ok(global_scale)
}
