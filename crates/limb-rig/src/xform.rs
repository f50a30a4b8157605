//! Transform helpers shared by the build stages

use crate::naming::offset_group;
use limb_scene::{FreezeMask, NodeId, NodeType, SceneGraph, SceneResult};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Animatable channel of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// `translate`
    Translate,
    /// `rotate`
    Rotate,
    /// `scale`
    Scale,
    /// `visibility`
    Visibility,
}

impl Channel {
    /// Translate, rotate and scale
    pub const TRS: [Channel; 3] = [Channel::Translate, Channel::Rotate, Channel::Scale];

    /// Every channel
    pub const ALL: [Channel; 4] = [
        Channel::Translate,
        Channel::Rotate,
        Channel::Scale,
        Channel::Visibility,
    ];

    /// Attribute name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Translate => "translate",
            Channel::Rotate => "rotate",
            Channel::Scale => "scale",
            Channel::Visibility => "visibility",
        }
    }

    /// Plug paths to lock, one per component for compound channels
    fn components(self) -> Vec<String> {
        match self {
            Channel::Visibility => vec![self.as_str().to_string()],
            _ => ['X', 'Y', 'Z']
                .iter()
                .map(|axis| format!("{}{axis}", self.as_str()))
                .collect(),
        }
    }
}

/// Distance between two nodes' world pivots
///
/// # Errors
///
/// Fails if either node is missing or not a transform.
pub fn distance<S: SceneGraph + ?Sized>(scene: &S, a: NodeId, b: NodeId) -> SceneResult<f64> {
    Ok((scene.world_pivot(b)? - scene.world_pivot(a)?).norm())
}

/// Snap `node` onto `target`, optionally freezing the result
///
/// # Errors
///
/// Propagates scene errors.
pub fn snap<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    target: NodeId,
    rotate: bool,
    freeze: Option<FreezeMask>,
) -> SceneResult<()> {
    scene.match_transform(node, target, true, rotate)?;
    if let Some(mask) = freeze {
        scene.freeze_transform(node, mask)?;
    }
    Ok(())
}

/// Insert an `_OFF_GRP` above `node`, aligned to `target`
///
/// The offset group takes the node's place under its parent and matches the
/// target's pivot and orientation; the node is zeroed inside it.
///
/// # Errors
///
/// Propagates scene errors.
pub fn align_with_offset<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    target: NodeId,
) -> SceneResult<NodeId> {
    let name = offset_group(scene.name(node)?);
    let parent = scene.parent(node)?;
    let offset = scene.create_node(NodeType::Transform, &name, parent)?;
    scene.match_transform(offset, target, true, true)?;
    scene.set_parent(node, Some(offset))?;
    scene.set_vector3(&node.plug("translate"), Vector3::zeros())?;
    scene.set_vector3(&node.plug("rotate"), Vector3::zeros())?;
    debug!(offset = %name, "aligned offset group");
    Ok(offset)
}

/// Move the pivots of `targets` onto the world pivot of `source`
///
/// # Errors
///
/// Propagates scene errors.
pub fn transfer_pivots<S: SceneGraph + ?Sized>(
    scene: &mut S,
    source: NodeId,
    targets: &[NodeId],
) -> SceneResult<Point3<f64>> {
    let pivot = scene.world_pivot(source)?;
    for target in targets {
        scene.set_world_pivot(*target, &pivot)?;
    }
    Ok(pivot)
}

/// Lock the given channels and remove them from the channel box
///
/// Idempotent: locking an already locked channel is a no-op.
///
/// # Errors
///
/// Propagates scene errors.
pub fn lock_and_hide<S: SceneGraph + ?Sized>(
    scene: &mut S,
    node: NodeId,
    channels: &[Channel],
) -> SceneResult<()> {
    for channel in channels {
        for attr in channel.components() {
            scene.set_attr_state(&node.plug(attr), Some(true), Some(false))?;
        }
    }
    Ok(())
}

/// Turn visibility off
///
/// # Errors
///
/// Propagates scene errors.
pub fn hide<S: SceneGraph + ?Sized>(scene: &mut S, nodes: &[NodeId]) -> SceneResult<()> {
    for node in nodes {
        scene.set_bool(&node.plug("visibility"), false)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use limb_scene::Scene;

    fn locator(scene: &mut Scene, name: &str, at: Vector3<f64>) -> NodeId {
        let node = scene.create_node(NodeType::Locator, name, None).unwrap();
        scene.set_vector3(&node.plug("translate"), at).unwrap();
        node
    }

    #[test]
    fn distance_uses_world_pivots() {
        let mut scene = Scene::new();
        let a = locator(&mut scene, "a", Vector3::new(1.0, 2.0, 3.0));
        let b = locator(&mut scene, "b", Vector3::new(4.0, 6.0, 3.0));
        assert!((distance(&scene, a, b).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn offset_group_takes_target_pose() {
        let mut scene = Scene::new();
        let target = locator(&mut scene, "target", Vector3::new(3.0, 0.0, 0.0));
        scene
            .set_vector3(&target.plug("rotate"), Vector3::new(0.0, 0.0, 90.0))
            .unwrap();
        let node = scene.create_node(NodeType::Transform, "ctrl", None).unwrap();

        let offset = align_with_offset(&mut scene, node, target).unwrap();

        assert_eq!(scene.name(offset).unwrap(), "ctrl_OFF_GRP");
        assert_eq!(scene.parent(node).unwrap(), Some(offset));
        assert_eq!(scene.get_vector3(&node.plug("translate")).unwrap(), Vector3::zeros());
        let world = scene.world_matrix(node).unwrap();
        let expected = scene.world_matrix(target).unwrap();
        assert!((world - expected).norm() < 1e-9);
    }

    #[test]
    fn lock_and_hide_is_idempotent() {
        let mut scene = Scene::new();
        let node = scene.create_node(NodeType::Transform, "n", None).unwrap();
        lock_and_hide(&mut scene, node, &[Channel::Scale, Channel::Visibility]).unwrap();
        lock_and_hide(&mut scene, node, &[Channel::Scale]).unwrap();
        let state = scene.attr_state(&node.plug("scale")).unwrap();
        assert!(state.locked && !state.keyable);
        assert!(scene.attr_state(&node.plug("visibility")).unwrap().locked);
        assert!(!scene.attr_state(&node.plug("translate")).unwrap().locked);
    }
}
