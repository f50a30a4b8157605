//! Parallel IK, FK and bind joint chains

use crate::naming::RigNames;
use crate::spec::SEGMENTS;
use limb_scene::{FreezeMask, NodeId, NodeType, SceneGraph, SceneResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which chain a joint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainRole {
    /// Driven by the IK handle
    Ik,
    /// Driven by FK controls
    Fk,
    /// Blended output used for deformation
    Bind,
}

impl ChainRole {
    /// Build order
    pub const ALL: [ChainRole; 3] = [ChainRole::Ik, ChainRole::Fk, ChainRole::Bind];

    /// Name suffix
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            ChainRole::Ik => "IK",
            ChainRole::Fk => "FK",
            ChainRole::Bind => "bind",
        }
    }
}

/// Three joints, root to tip, each parented under the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointChain {
    /// Chain role
    pub role: ChainRole,
    /// Joints, root to tip
    pub joints: [NodeId; SEGMENTS],
}

impl JointChain {
    /// First joint
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.joints[0]
    }

    /// Middle joint
    #[must_use]
    pub fn middle(&self) -> NodeId {
        self.joints[1]
    }

    /// Last joint
    #[must_use]
    pub fn tip(&self) -> NodeId {
        self.joints[SEGMENTS - 1]
    }
}

/// The three chains of a limb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chains {
    /// IK chain
    pub ik: JointChain,
    /// FK chain
    pub fk: JointChain,
    /// Bind chain
    pub bind: JointChain,
}

impl Chains {
    /// Every joint, chain by chain
    pub fn joints(&self) -> impl Iterator<Item = NodeId> + '_ {
        [&self.ik, &self.fk, &self.bind]
            .into_iter()
            .flat_map(|chain| chain.joints)
    }
}

/// Create one chain matching `guides`
///
/// Each joint is created under the previous one, snapped to its guide and
/// has its rotation frozen into the joint orient.
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_chain<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    role: ChainRole,
    guides: &[NodeId; SEGMENTS],
    aliases: &[String; SEGMENTS],
) -> SceneResult<JointChain> {
    let mut joints = Vec::with_capacity(SEGMENTS);
    for (guide, alias) in guides.iter().zip(aliases) {
        let previous = joints.last().copied();
        let joint = scene.create_node(NodeType::Joint, &names.joint(alias, role), previous)?;
        scene.match_transform(joint, *guide, true, true)?;
        scene.freeze_transform(joint, FreezeMask::ROTATE)?;
        joints.push(joint);
    }
    debug!(role = role.suffix(), "built joint chain");
    Ok(JointChain {
        role,
        joints: [joints[0], joints[1], joints[2]],
    })
}

/// Create the IK, FK and bind chains in that order
///
/// # Errors
///
/// Propagates scene errors.
pub fn build_chains<S: SceneGraph + ?Sized>(
    scene: &mut S,
    names: &RigNames,
    guides: &[NodeId; SEGMENTS],
    aliases: &[String; SEGMENTS],
) -> SceneResult<Chains> {
    Ok(Chains {
        ik: build_chain(scene, names, ChainRole::Ik, guides, aliases)?,
        fk: build_chain(scene, names, ChainRole::Fk, guides, aliases)?,
        bind: build_chain(scene, names, ChainRole::Bind, guides, aliases)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::BuildSpec;
    use limb_scene::Scene;
    use nalgebra::Vector3;

    fn aliases() -> [String; SEGMENTS] {
        ["shoulder".into(), "elbow".into(), "wrist".into()]
    }

    fn guides(scene: &mut Scene) -> [NodeId; SEGMENTS] {
        let mut out = Vec::new();
        for (i, at) in [[0.0, 0.0, 0.0], [4.0, 0.0, -1.0], [8.0, 0.0, 0.0]].iter().enumerate() {
            let g = scene
                .create_node(NodeType::Locator, &format!("guide{i}"), None)
                .unwrap();
            scene.set_vector3(&g.plug("translate"), Vector3::from(*at)).unwrap();
            scene
                .set_vector3(&g.plug("rotate"), Vector3::new(0.0, 10.0 * i as f64, 0.0))
                .unwrap();
            out.push(g);
        }
        out.try_into().unwrap()
    }

    #[test]
    fn chain_is_parented_and_snapped() {
        let mut scene = Scene::new();
        let guides = guides(&mut scene);
        let spec = BuildSpec::default();
        let names = RigNames::new(&spec);

        let chain = build_chain(&mut scene, &names, ChainRole::Fk, &guides, &aliases()).unwrap();

        assert_eq!(scene.name(chain.root()).unwrap(), "L_shoulder_FK_JNT");
        assert_eq!(scene.parent(chain.root()).unwrap(), None);
        assert_eq!(scene.parent(chain.middle()).unwrap(), Some(chain.root()));
        assert_eq!(scene.parent(chain.tip()).unwrap(), Some(chain.middle()));
        for (joint, guide) in chain.joints.iter().zip(&guides) {
            let a = scene.world_matrix(*joint).unwrap();
            let b = scene.world_matrix(*guide).unwrap();
            assert!((a - b).norm() < 1e-9);
            let rotate = scene.get_vector3(&joint.plug("rotate")).unwrap();
            assert!(rotate.norm() < 1e-9);
        }
    }

    #[test]
    fn chains_are_identical_at_build_time() {
        let mut scene = Scene::new();
        let guides = guides(&mut scene);
        let spec = BuildSpec::default();
        let names = RigNames::new(&spec);

        let chains = build_chains(&mut scene, &names, &guides, &aliases()).unwrap();

        assert_eq!(chains.joints().count(), 9);
        for i in 0..SEGMENTS {
            let ik = scene.world_matrix(chains.ik.joints[i]).unwrap();
            let fk = scene.world_matrix(chains.fk.joints[i]).unwrap();
            let bind = scene.world_matrix(chains.bind.joints[i]).unwrap();
            assert!((ik - fk).norm() < 1e-9);
            assert!((ik - bind).norm() < 1e-9);
        }
    }
}
