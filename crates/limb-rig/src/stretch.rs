//! IK and FK stretch networks
//!
//! IK stretch measures the live distance between the base and local IK
//! controls, divides it by the rest length of the chain and only lets ratios
//! at or above rest through; below rest the chain keeps a literal scale of 1.
//! The world control blends that ratio in with `stretch` and biases each
//! segment with `up<Part>` / `lo<Part>`.
//!
//! FK stretch gives every non-terminal FK control a `stretch` multiplier that
//! scales its joint and pushes the next control's offset group out by the
//! same factor.

use crate::axis::SignedAxis;
use crate::chain::JointChain;
use crate::controls::{Control, IkControls};
use crate::naming::{derived, RigNames};
use crate::spec::SEGMENTS;
use crate::xform::{distance, snap};
use limb_scene::{
    AttrSpec, ConstraintKind, NodeId, NodeType, Plug, SceneGraph, SceneResult, Value,
};
use tracing::debug;

/// Stretch blend attribute on the world control and FK controls
pub const STRETCH_ATTR: &str = "stretch";

/// `multiplyDivide` operation: divide
const OP_DIVIDE: i64 = 2;
/// `condition` operation: greater or equal
const OP_GREATER_OR_EQUAL: i64 = 3;
/// Floor of the stretch and segment weight attributes
const MIN_WEIGHT: f64 = 0.001;

/// Nodes of the IK stretch network
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IkStretch {
    /// Sum of the two IK segment lengths at build time
    pub rest_length: f64,
    /// Locator following the base control
    pub start_locator: NodeId,
    /// Locator following the local control
    pub end_locator: NodeId,
    /// Live length
    pub distance: NodeId,
    /// Live length over rest length
    pub divide: NodeId,
    /// Gate keeping the ratio at 1 below rest
    pub condition: NodeId,
    /// `stretch`-weighted blend of 1 and the gated ratio
    pub blend: NodeId,
    /// Upper segment scale sum
    pub upper_sum: NodeId,
    /// Lower segment scale sum
    pub lower_sum: NodeId,
}

impl IkStretch {
    /// Locators to be placed under the no-transform group
    #[must_use]
    pub fn locators(&self) -> [NodeId; 2] {
        [self.start_locator, self.end_locator]
    }
}

/// Nodes of one FK control's stretch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FkStretchSegment {
    /// Control carrying the `stretch` attribute
    pub control: NodeId,
    /// `multDoubleLinear` scaling the measured offset
    pub multiplier: NodeId,
    /// Locator under the FK joint measuring the next joint's offset
    pub locator: NodeId,
    /// Decomposition feeding the next control's offset group
    pub decompose: NodeId,
    /// Offset along the primary axis at build time
    pub rest_offset: f64,
}

/// Both stretch networks
#[derive(Debug, Clone, PartialEq)]
pub struct StretchNetwork {
    /// IK side
    pub ik: IkStretch,
    /// FK side, one entry per non-terminal control
    pub fk: Vec<FkStretchSegment>,
}

/// Sum of the two segment lengths of a chain
///
/// # Errors
///
/// Propagates scene errors.
pub fn rest_length<S: SceneGraph + ?Sized>(scene: &S, chain: &JointChain) -> SceneResult<f64> {
    Ok(distance(scene, chain.root(), chain.middle())?
        + distance(scene, chain.middle(), chain.tip())?)
}

fn weight_attr(default: f64) -> AttrSpec {
    AttrSpec::double(default).min(MIN_WEIGHT).keyable(true)
}

/// Build the IK length-ratio network
///
/// Must run before anything moves the IK chain: the rest length is measured
/// from the current pose.
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_ik_stretch<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    primary: SignedAxis,
    chain: &JointChain,
    controls: &IkControls,
) -> SceneResult<IkStretch> {
    let distance_node = scene.create_node(NodeType::DistanceBetween, &names.limb_node("DST"), None)?;
    let condition = scene.create_node(NodeType::Condition, &names.limb_node("CND"), None)?;
    let start_locator = scene.create_node(NodeType::Locator, &names.limb_node("start_LOC"), None)?;
    let end_locator = scene.create_node(NodeType::Locator, &names.limb_node("end_LOC"), None)?;
    let divide = scene.create_node(NodeType::MultiplyDivide, &names.limb_node("stretch_MDN"), None)?;

    let rest = rest_length(scene, chain)?;

    scene.create_constraint(ConstraintKind::Point, controls.base.node, start_locator, false)?;
    scene.create_constraint(ConstraintKind::Point, controls.local.node, end_locator, false)?;
    scene.connect(&start_locator.plug("worldMatrix"), &distance_node.plug("inMatrix1"))?;
    scene.connect(&end_locator.plug("worldMatrix"), &distance_node.plug("inMatrix2"))?;

    scene.connect(&distance_node.plug("distance"), &divide.plug("input1X"))?;
    scene.set_f64(&divide.plug("input2X"), rest)?;
    scene.set_attr(&divide.plug("operation"), Value::Int(OP_DIVIDE))?;

    scene.connect(&distance_node.plug("distance"), &condition.plug("firstTerm"))?;
    scene.connect(&divide.plug("outputX"), &condition.plug("colorIfTrueR"))?;
    scene.set_f64(&condition.plug("secondTerm"), rest)?;
    scene.set_attr(&condition.plug("operation"), Value::Int(OP_GREATER_OR_EQUAL))?;

    let world = controls.world.node;
    let upper_attr = names.segment_weight(true);
    let lower_attr = names.segment_weight(false);
    scene.add_attr(
        world,
        STRETCH_ATTR,
        AttrSpec::double(1.0).min(0.0).max(1.0).keyable(true),
    )?;
    scene.add_attr(world, &upper_attr, weight_attr(1.0))?;
    scene.add_attr(world, &lower_attr, weight_attr(1.0))?;

    let blend = scene.create_node(NodeType::BlendTwoAttr, &names.limb_node("stretch_BTA"), None)?;
    scene.set_f64(&blend.plug("input[0]"), 1.0)?;
    scene.connect(&condition.plug("outColorR"), &blend.plug("input[1]"))?;
    scene.connect(&world.plug(STRETCH_ATTR), &blend.plug("attributesBlender"))?;

    let mut sums = Vec::with_capacity(2);
    for (attr, joint) in [(&upper_attr, chain.root()), (&lower_attr, chain.middle())] {
        let sum = scene.create_node(
            NodeType::PlusMinusAverage,
            &names.limb_node(&format!("{attr}_PMA")),
            None,
        )?;
        scene.connect(&world.plug(attr.as_str()), &sum.plug("input1D[0]"))?;
        scene.connect(&blend.plug("output"), &sum.plug("input1D[1]"))?;
        scene.set_f64(&sum.plug("input1D[2]"), -1.0)?;
        scene.connect(&sum.plug("output1D"), &joint.plug(primary.component("scale")))?;
        sums.push(sum);
    }

    debug!(rest_length = rest, "built IK stretch");
    Ok(IkStretch {
        rest_length: rest,
        start_locator,
        end_locator,
        distance: distance_node,
        divide,
        condition,
        blend,
        upper_sum: sums[0],
        lower_sum: sums[1],
    })
}

/// Build the per-control FK stretch
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_fk_stretch<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    primary: SignedAxis,
    aliases: &[String; SEGMENTS],
    chain: &JointChain,
    controls: &[Control; SEGMENTS],
) -> SceneResult<Vec<FkStretchSegment>> {
    let translate = primary.component("translate");
    let mut segments = Vec::with_capacity(SEGMENTS - 1);
    for i in 0..SEGMENTS - 1 {
        let (control, next) = (controls[i], controls[i + 1]);
        let (joint, next_joint) = (chain.joints[i], chain.joints[i + 1]);

        scene.add_attr(control.node, STRETCH_ATTR, weight_attr(1.0))?;
        let multiplier = scene.create_node(
            NodeType::MultDoubleLinear,
            &names.fk_stretch(&aliases[i]),
            None,
        )?;
        let locator = scene.create_node(
            NodeType::Locator,
            &names.fk_offset_locator(&aliases[i + 1]),
            Some(joint),
        )?;
        snap(scene, locator, next_joint, true, None)?;
        let rest_offset = scene.get_f64(&locator.plug(translate.as_str()))?;

        scene.set_f64(&multiplier.plug("input1"), rest_offset)?;
        scene.connect(&control.node.plug(STRETCH_ATTR), &multiplier.plug("input2"))?;
        scene.connect(&multiplier.plug("output"), &locator.plug(translate.as_str()))?;
        scene.connect(
            &control.node.plug(STRETCH_ATTR),
            &joint.plug(primary.component("scale")),
        )?;

        let decompose_name = derived(scene.name(locator)?, "DCM");
        let decompose = scene.create_node(NodeType::DecomposeMatrix, &decompose_name, None)?;
        scene.connect(&locator.plug("matrix"), &decompose.plug("inputMatrix"))?;
        let target = next.top();
        for (output, input) in [
            ("outputTranslate", "translate"),
            ("outputRotate", "rotate"),
            ("outputScale", "scale"),
        ] {
            scene.connect(&decompose.plug(output), &target.plug(input))?;
        }

        segments.push(FkStretchSegment {
            control: control.node,
            multiplier,
            locator,
            decompose,
            rest_offset,
        });
    }
    debug!(segments = segments.len(), "built FK stretch");
    Ok(segments)
}

/// Multiply the rest length by the rig's global scale before it reaches the
/// divide and the gate
///
/// # Errors
///
/// Propagates scene errors.
pub fn compensate_global_scale<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    stretch: &IkStretch,
    global_scale: &Plug,
) -> SceneResult<NodeId> {
    let mdl = scene.create_node(
        NodeType::MultDoubleLinear,
        &names.limb_node("globalScale_MDL"),
        None,
    )?;
    scene.set_f64(&mdl.plug("input1"), stretch.rest_length)?;
    scene.connect(global_scale, &mdl.plug("input2"))?;
    scene.connect(&mdl.plug("output"), &stretch.divide.plug("input2X"))?;
    scene.connect(&mdl.plug("output"), &stretch.condition.plug("secondTerm"))?;
    Ok(mdl)
}
