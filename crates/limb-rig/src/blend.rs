//! FK/IK blend network feeding the bind chain
//!
//! One `blendColors` node per joint and channel. `color1` reads the IK joint,
//! `color2` the FK joint and every node shares the settings control's `fkIk`
//! as its blender, so the whole limb switches in one step. Intermediate
//! values interpolate each component independently.

use crate::chain::Chains;
use crate::controls::{Control, FK_IK_ATTR};
use crate::naming::RigNames;
use crate::spec::SEGMENTS;
use crate::xform::Channel;
use limb_scene::{NodeId, NodeType, SceneGraph, SceneResult};
use tracing::debug;

/// One blend node and what it drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendUnit {
    /// `blendColors` node
    pub node: NodeId,
    /// Joint index in the chain
    pub joint: usize,
    /// Driven channel
    pub channel: Channel,
}

/// Wire IK and FK chains into the bind chain
///
/// Returns the nine units, joint-major.
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_blend_network<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    aliases: &[String; SEGMENTS],
    chains: &Chains,
    settings: &Control,
) -> SceneResult<Vec<BlendUnit>> {
    let switch = settings.node.plug(FK_IK_ATTR);
    let mut units = Vec::with_capacity(SEGMENTS * Channel::TRS.len());
    for (index, alias) in aliases.iter().enumerate() {
        let (ik, fk, bind) = (
            chains.ik.joints[index],
            chains.fk.joints[index],
            chains.bind.joints[index],
        );
        for channel in Channel::TRS {
            let attr = channel.as_str();
            let node = scene.create_node(NodeType::BlendColors, &names.blend(alias, channel), None)?;
            scene.connect(&ik.plug(attr), &node.plug("color1"))?;
            scene.connect(&fk.plug(attr), &node.plug("color2"))?;
            scene.connect(&switch, &node.plug("blender"))?;
            scene.connect(&node.plug("output"), &bind.plug(attr))?;
            units.push(BlendUnit {
                node,
                joint: index,
                channel,
            });
        }
    }
    debug!(units = units.len(), "wired blend network");
    Ok(units)
}
