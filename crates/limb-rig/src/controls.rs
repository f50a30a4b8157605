//! Control factory: FK, IK, pole-vector and settings controls
//!
//! Every control is a curve tagged with a `controlType` string attribute
//! (`{side}_{part}_{role}`) right after it is created, and registered by role
//! in a [`ControlRegistry`] that later stages consume instead of scanning the
//! scene.

use crate::axis::SignedAxis;
use crate::chain::JointChain;
use crate::naming::RigNames;
use crate::shapes;
use crate::spec::{ControlRole, SEGMENTS};
use crate::xform::{align_with_offset, distance, snap};
use indexmap::IndexMap;
use limb_scene::{
    AttrSpec, ConstraintKind, FreezeMask, IkSolver, NodeId, SceneGraph, SceneResult, Value,
};
use nalgebra::Vector3;
use tracing::debug;

/// Tag attribute carried by every control
pub const CONTROL_TYPE_ATTR: &str = "controlType";

/// Switch attribute on the settings control
pub const FK_IK_ATTR: &str = "fkIk";

/// Presentation rotation of the circular IK controls, in degrees
pub const IK_CONTROL_ROTATION: f64 = 45.0;

/// A control curve and the offset group above it, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// Curve node
    pub node: NodeId,
    /// `_OFF_GRP` parent
    pub offset: Option<NodeId>,
    /// Semantic role
    pub role: ControlRole,
}

impl Control {
    /// Topmost node of the control: its offset group if it has one
    #[must_use]
    pub fn top(&self) -> NodeId {
        self.offset.unwrap_or(self.node)
    }
}

/// Controls of one limb, grouped by role in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlRegistry {
    tag_prefix: String,
    by_role: IndexMap<ControlRole, Vec<NodeId>>,
}

impl ControlRegistry {
    /// Empty registry for the limb whose tags start with `tag_prefix`
    #[must_use]
    pub fn new(tag_prefix: impl Into<String>) -> Self {
        Self {
            tag_prefix: tag_prefix.into(),
            by_role: IndexMap::new(),
        }
    }

    /// `{side}_{part}` namespace of this limb's tags
    #[must_use]
    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    /// Record a control
    pub fn register(&mut self, role: ControlRole, node: NodeId) {
        self.by_role.entry(role).or_default().push(node);
    }

    /// Controls with a role
    #[must_use]
    pub fn get(&self, role: ControlRole) -> &[NodeId] {
        self.by_role.get(&role).map_or(&[], Vec::as_slice)
    }

    /// Number of controls with a role
    #[must_use]
    pub fn count(&self, role: ControlRole) -> usize {
        self.get(role).len()
    }

    /// Total number of controls
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_role.values().map(Vec::len).sum()
    }

    /// Whether nothing was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(role, control)` pairs in registration order per role
    pub fn iter(&self) -> impl Iterator<Item = (ControlRole, NodeId)> + '_ {
        self.by_role
            .iter()
            .flat_map(|(role, nodes)| nodes.iter().map(move |node| (*role, *node)))
    }
}

/// The IK-side controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IkControls {
    /// World control at the limb tip
    pub world: Control,
    /// Local control under the world control
    pub local: Control,
    /// Pole-vector control
    pub pv: Control,
    /// Base control at the limb root
    pub base: Control,
}

/// Control size for a limb: a fifth of the root-to-tip distance
///
/// # Errors
///
/// Propagates scene errors.
pub fn control_radius<S: SceneGraph + ?Sized>(scene: &S, chain: &JointChain) -> SceneResult<f64> {
    Ok(distance(scene, chain.root(), chain.tip())? / 5.0)
}

/// Creates and tags the controls of one limb
#[derive(Debug)]
pub struct ControlFactory<'n> {
    names: &'n RigNames,
    radius: f64,
    primary: SignedAxis,
    up: SignedAxis,
    registry: ControlRegistry,
}

impl<'n> ControlFactory<'n> {
    /// Factory sized by `radius`
    #[must_use]
    pub fn new(names: &'n RigNames, radius: f64, primary: SignedAxis, up: SignedAxis) -> Self {
        Self {
            names,
            radius,
            primary,
            up,
            registry: ControlRegistry::new(names.base()),
        }
    }

    /// Base control radius
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Controls created so far
    #[must_use]
    pub fn registry(&self) -> &ControlRegistry {
        &self.registry
    }

    /// Hand over the registry
    #[must_use]
    pub fn finish(self) -> ControlRegistry {
        self.registry
    }

    fn tag<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        node: NodeId,
        role: ControlRole,
    ) -> SceneResult<Control> {
        scene.add_attr(node, CONTROL_TYPE_ATTR, AttrSpec::string())?;
        scene.set_attr(
            &node.plug(CONTROL_TYPE_ATTR),
            Value::String(self.names.tag(role)),
        )?;
        self.registry.register(role, node);
        Ok(Control {
            node,
            offset: None,
            role,
        })
    }

    fn ik_circle<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        name: &str,
        radius: f64,
        role: ControlRole,
    ) -> SceneResult<Control> {
        let shape = shapes::circle(radius, &self.primary.vector(), 4, 1);
        let node = scene.create_curve(name, shape, None)?;
        let control = self.tag(scene, node, role)?;
        scene.set_f64(
            &node.plug(self.primary.component("rotate")),
            IK_CONTROL_ROTATION,
        )?;
        Ok(control)
    }

    /// One FK control per joint, each under the previous control
    ///
    /// Each control drives its joint's rotation directly and its position
    /// through a point constraint.
    ///
    /// # Errors
    ///
    /// Propagates scene errors.
    pub fn fk_controls<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        aliases: &[String; SEGMENTS],
        chain: &JointChain,
    ) -> SceneResult<[Control; SEGMENTS]> {
        let mut controls: Vec<Control> = Vec::with_capacity(SEGMENTS);
        for (joint, alias) in chain.joints.iter().zip(aliases) {
            let parent = controls.last().map(|c| c.node);
            let shape = shapes::circle(self.radius, &self.primary.vector(), 8, 3);
            let node = scene.create_curve(&self.names.fk_control(alias), shape, parent)?;
            let mut control = self.tag(scene, node, ControlRole::Fk)?;
            control.offset = Some(align_with_offset(scene, node, *joint)?);
            scene.create_constraint(ConstraintKind::Point, node, *joint, false)?;
            scene.connect(&node.plug("rotate"), &joint.plug("rotate"))?;
            controls.push(control);
        }
        debug!(count = controls.len(), "created FK controls");
        Ok([controls[0], controls[1], controls[2]])
    }

    /// World, local, pole-vector and base IK controls
    ///
    /// # Errors
    ///
    /// Propagates scene errors.
    pub fn ik_controls<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        root_alias: &str,
        chain: &JointChain,
        pole_vector_guide: NodeId,
    ) -> SceneResult<IkControls> {
        let (names, r) = (self.names, self.radius);

        let world = self.ik_circle(scene, &names.world_control(), r * 1.2, ControlRole::Primary)?;
        snap(scene, world.node, chain.tip(), false, Some(FreezeMask::ALL))?;

        let mut local = self.ik_circle(scene, &names.local_control(), r, ControlRole::Secondary)?;
        scene.freeze_transform(local.node, FreezeMask::ROTATE)?;
        let local_offset = align_with_offset(scene, local.node, chain.tip())?;
        scene.set_parent(local_offset, Some(world.node))?;
        local.offset = Some(local_offset);

        let pv_node = scene.create_curve(&names.pv_control(), shapes::cross(), None)?;
        let pv = self.tag(scene, pv_node, ControlRole::Pv)?;
        scene.set_vector3(&pv_node.plug("scale"), Vector3::repeat(r * 0.25))?;
        snap(scene, pv_node, pole_vector_guide, false, Some(FreezeMask::ALL))?;

        let base = self.ik_circle(
            scene,
            &names.base_control(root_alias),
            r * 1.2,
            ControlRole::Primary,
        )?;
        snap(scene, base.node, chain.root(), false, Some(FreezeMask::ALL))?;
        scene.create_constraint(ConstraintKind::Parent, base.node, chain.root(), true)?;

        debug!(base = names.base(), "created IK controls");
        Ok(IkControls {
            world,
            local,
            pv,
            base,
        })
    }

    /// Settings control carrying the `fkIk` switch
    ///
    /// Sits beside the limb tip, pushed out along the up axis, and follows
    /// the bind chain's last joint.
    ///
    /// # Errors
    ///
    /// Propagates scene errors.
    pub fn settings_control<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        ik: &JointChain,
        bind: &JointChain,
    ) -> SceneResult<Control> {
        let r = self.radius;
        let node = scene.create_curve(&self.names.settings_control(), shapes::plus(), None)?;
        let mut control = self.tag(scene, node, ControlRole::Primary)?;
        control.offset = Some(align_with_offset(scene, node, ik.tip())?);
        scene.set_vector3(&node.plug("scale"), Vector3::repeat(r * 0.25))?;
        scene.set_f64(
            &node.plug(self.up.component("translate")),
            self.up.sign() * r * 1.5,
        )?;
        scene.freeze_transform(node, FreezeMask::ALL)?;
        scene.create_constraint(ConstraintKind::Parent, bind.tip(), node, true)?;
        scene.add_attr(
            node,
            FK_IK_ATTR,
            AttrSpec::double(1.0).min(0.0).max(1.0).keyable(true),
        )?;
        debug!(settings = %self.names.settings_control(), "created settings control");
        Ok(control)
    }
}

/// Rotate-plane IK handle over the IK chain, following the local control and
/// aimed by the pole-vector control
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_ik_handle<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    chain: &JointChain,
    controls: &IkControls,
) -> SceneResult<NodeId> {
    let handle = scene.create_ik_handle(
        &names.ik_handle(),
        IkSolver::RotatePlane,
        chain.root(),
        chain.tip(),
    )?;
    scene.create_constraint(ConstraintKind::Parent, controls.local.node, handle, true)?;
    scene.create_constraint(ConstraintKind::PoleVector, controls.pv.node, handle, false)?;
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_groups_by_role() {
        let mut registry = ControlRegistry::new("L_arm");
        registry.register(ControlRole::Fk, NodeId(1));
        registry.register(ControlRole::Primary, NodeId(2));
        registry.register(ControlRole::Fk, NodeId(3));

        assert_eq!(registry.get(ControlRole::Fk), &[NodeId(1), NodeId(3)]);
        assert_eq!(registry.count(ControlRole::Pv), 0);
        assert_eq!(registry.len(), 3);
        let pairs: Vec<_> = registry.iter().collect();
        assert_eq!(pairs[0], (ControlRole::Fk, NodeId(1)));
        assert_eq!(pairs[2], (ControlRole::Primary, NodeId(2)));
    }

    #[test]
    fn control_top_prefers_offset() {
        let bare = Control {
            node: NodeId(4),
            offset: None,
            role: ControlRole::Pv,
        };
        let wrapped = Control {
            offset: Some(NodeId(5)),
            ..bare
        };
        assert_eq!(bare.top(), NodeId(4));
        assert_eq!(wrapped.top(), NodeId(5));
    }
}
