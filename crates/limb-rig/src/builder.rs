//! Limb build pipeline
//!
//! [`LimbBuilder`] validates its inputs up front, then runs the stages in a
//! fixed order, handing node handles from one stage to the next:
//!
//! 1. chains
//! 2. controls
//! 3. blend network
//! 4. IK handle
//! 5. stretch (optional)
//! 6. hierarchy and global scale
//! 7. finalize
//!
//! Nothing is created in the scene until every input check has passed. A
//! scene error mid-build leaves the nodes created so far in place.

use crate::blend::{build_blend_network, BlendUnit};
use crate::chain::{build_chains, Chains};
use crate::controls::{
    build_ik_handle, control_radius, Control, ControlFactory, ControlRegistry, IkControls,
};
use crate::error::{RigError, RigResult};
use crate::finalize::{
    apply_colors, build_pv_guide, lock_controls, remove_guides, wire_visibility, PvGuide,
};
use crate::hierarchy::{add_global_scale, organize, Hierarchy, Members};
use crate::naming::RigNames;
use crate::spec::{BuildSpec, GuideSet, SEGMENTS};
use crate::stretch::{build_fk_stretch, build_ik_stretch, compensate_global_scale, StretchNetwork};
use limb_scene::{NodeId, Plug, SceneError, SceneGraph};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Guides closer than this are treated as coincident
const MIN_SEGMENT_LENGTH: f64 = 1e-6;

/// Handles of a finished limb
///
/// Informational: the rig is also reachable by its root name.
#[derive(Debug, Clone, PartialEq)]
pub struct LimbRig {
    /// `{side}_{part}`
    pub base_name: String,
    /// `{SIDE}_{PART}` node
    pub root: NodeId,
    /// IK, FK and bind chains
    pub chains: Chains,
    /// FK controls, root to tip
    pub fk_controls: [Control; SEGMENTS],
    /// IK-side controls
    pub ik_controls: IkControls,
    /// Settings control carrying `fkIk`
    pub settings: Control,
    /// Every control by role
    pub registry: ControlRegistry,
    /// Rotate-plane IK handle
    pub ik_handle: NodeId,
    /// The nine blend nodes
    pub blend_units: Vec<BlendUnit>,
    /// Stretch networks, when enabled
    pub stretch: Option<StretchNetwork>,
    /// Rest-length scaler fed by `globalScale`, when stretch is enabled
    pub global_scale_compensation: Option<NodeId>,
    /// `globalScale` plug on the root
    pub global_scale: Plug,
    /// Group tree
    pub hierarchy: Hierarchy,
    /// `reverse` node driving FK control visibility
    pub visibility_reverse: NodeId,
    /// Pole-vector display line
    pub pv_guide: PvGuide,
    /// Base control radius
    pub radius: f64,
}

/// Builds one limb into a scene
pub struct LimbBuilder<'s, S: SceneGraph + ?Sized> {
    scene: &'s mut S,
    spec: BuildSpec,
    names: RigNames,
    aliases: [String; SEGMENTS],
    guides: [NodeId; SEGMENTS],
    pole_vector: NodeId,
    guide_set: GuideSet,
}

impl<S: SceneGraph + ?Sized> std::fmt::Debug for LimbBuilder<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LimbBuilder")
            .field("base", &self.names.base())
            .field("guides", &self.guides)
            .field("pole_vector", &self.pole_vector)
            .finish_non_exhaustive()
    }
}

impl<'s, S: SceneGraph + ?Sized> LimbBuilder<'s, S> {
    /// Validate the inputs against the scene
    ///
    /// # Errors
    ///
    /// - `InvalidName` / `InvalidAxis` / `InvalidGuideSet` from
    ///   [`BuildSpec::validate`]
    /// - `InvalidGuideSet` when there are not three segment guides and one
    ///   pole-vector guide, a guide is missing or not a transform, a guide is
    ///   repeated or two segment guides coincide
    /// - `Scene(NameCollision)` when the limb's root name is already taken
    pub fn new(scene: &'s mut S, spec: BuildSpec, guides: GuideSet) -> RigResult<Self> {
        spec.validate()?;
        let segments: [NodeId; SEGMENTS] =
            guides.segments.as_slice().try_into().map_err(|_| {
                RigError::InvalidGuideSet(format!(
                    "expected {SEGMENTS} segment guides, got {}",
                    guides.segments.len()
                ))
            })?;
        let pole_vector = guides
            .pole_vector
            .ok_or_else(|| RigError::InvalidGuideSet("missing pole-vector guide".into()))?;

        for guide in guides.iter() {
            let kind = scene
                .node_type(guide)
                .map_err(|_| RigError::InvalidGuideSet(format!("guide {guide} does not exist")))?;
            if !kind.is_dag() {
                return Err(RigError::InvalidGuideSet(format!(
                    "guide {guide} is a {kind}, not a transform"
                )));
            }
        }
        let distinct: BTreeSet<NodeId> = guides.iter().collect();
        if distinct.len() != SEGMENTS + 1 {
            return Err(RigError::InvalidGuideSet("guides must be distinct nodes".into()));
        }
        let positions = segments
            .iter()
            .map(|guide| scene.world_pivot(*guide))
            .collect::<Result<Vec<_>, _>>()?;
        for (a, b) in [(0, 1), (1, 2), (0, 2)] {
            if (positions[b] - positions[a]).norm() <= MIN_SEGMENT_LENGTH {
                return Err(RigError::InvalidGuideSet(format!(
                    "guides {a} and {b} coincide"
                )));
            }
        }

        let names = RigNames::new(&spec);
        let root = names.root();
        if scene.find(&root).is_some() {
            return Err(SceneError::NameCollision(root).into());
        }
        let aliases = [
            spec.aliases[0].clone(),
            spec.aliases[1].clone(),
            spec.aliases[2].clone(),
        ];
        Ok(Self {
            scene,
            spec,
            names,
            aliases,
            guides: segments,
            pole_vector,
            guide_set: guides,
        })
    }

    /// Names this builder will use
    #[must_use]
    pub fn names(&self) -> &RigNames {
        &self.names
    }

    /// Run every stage
    ///
    /// # Errors
    ///
    /// Scene errors from any stage, unchanged.
    pub fn build(self) -> RigResult<LimbRig> {
        let Self {
            scene,
            spec,
            names,
            aliases,
            guides,
            pole_vector,
            guide_set,
        } = self;
        let base = names.base();
        let primary = spec.primary_axis;

        info!(base, "building joint chains");
        let chains = build_chains(scene, &names, &guides, &aliases)?;

        info!(base, "building controls");
        let radius = control_radius(&*scene, &chains.fk)?;
        let mut factory = ControlFactory::new(&names, radius, primary, spec.up_axis);
        let fk_controls = factory.fk_controls(scene, &aliases, &chains.fk)?;
        let ik_controls = factory.ik_controls(scene, &aliases[0], &chains.ik, pole_vector)?;
        let settings = factory.settings_control(scene, &chains.ik, &chains.bind)?;
        let registry = factory.finish();

        info!(base, "wiring blend network");
        let blend_units = build_blend_network(scene, &names, &aliases, &chains, &settings)?;

        info!(base, "creating IK handle");
        let ik_handle = build_ik_handle(scene, &names, &chains.ik, &ik_controls)?;
        let mut no_xform = vec![ik_handle];

        let stretch = if spec.add_stretch {
            info!(base, "building stretch networks");
            let ik = build_ik_stretch(scene, &names, primary, &chains.ik, &ik_controls)?;
            let fk = build_fk_stretch(scene, &names, primary, &aliases, &chains.fk, &fk_controls)?;
            no_xform.extend(ik.locators());
            Some(StretchNetwork { ik, fk })
        } else {
            None
        };

        info!(base, "organizing hierarchy");
        let hierarchy = organize(
            scene,
            &names,
            &Members {
                chains: &chains,
                fk_root: &fk_controls[0],
                ik: &ik_controls,
                settings: &settings,
                no_xform: &no_xform,
            },
        )?;
        let global_scale = add_global_scale(scene, &hierarchy)?;
        let global_scale_compensation = match &stretch {
            Some(network) => Some(compensate_global_scale(
                scene,
                &names,
                &network.ik,
                &global_scale,
            )?),
            None => None,
        };

        info!(base, "finalizing");
        apply_colors(scene, &registry, &spec)?;
        lock_controls(scene, &fk_controls, &ik_controls, &settings)?;
        let visibility_reverse = wire_visibility(scene, &names, &settings, &hierarchy)?;
        let pv_guide = build_pv_guide(scene, ik_controls.pv.node, chains.ik.middle(), &hierarchy)?;
        if spec.remove_guides {
            remove_guides(scene, &guide_set)?;
        }

        debug!(base, controls = registry.len(), "limb built");
        Ok(LimbRig {
            base_name: base.to_string(),
            root: hierarchy.root,
            chains,
            fk_controls,
            ik_controls,
            settings,
            registry,
            ik_handle,
            blend_units,
            stretch,
            global_scale_compensation,
            global_scale,
            hierarchy,
            visibility_reverse,
            pv_guide,
            radius,
        })
    }
}

/// Build a limb rig from `guides` into `scene`
///
/// # Errors
///
/// Input errors before anything is created, scene errors mid-build.
///
/// # Example
///
/// ```rust
/// use limb_rig::{build, BuildSpec, GuideSet};
/// use limb_scene::prelude::*;
/// use nalgebra::Vector3;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut scene = Scene::new();
/// let mut guides = Vec::new();
/// for (name, x) in [("g0", 0.0), ("g1", 10.0), ("g2", 20.0)] {
///     let guide = scene.create_node(NodeType::Locator, name, None)?;
///     scene.set_vector3(&guide.plug("translate"), Vector3::new(x, 0.0, 0.0))?;
///     guides.push(guide);
/// }
/// let pv = scene.create_node(NodeType::Locator, "pv", None)?;
/// scene.set_vector3(&pv.plug("translate"), Vector3::new(10.0, 0.0, -10.0))?;
///
/// let rig = build(&mut scene, BuildSpec::default(), GuideSet::new(guides, Some(pv)))?;
/// assert_eq!(scene.name(rig.root)?, "L_ARM");
/// assert_eq!(rig.blend_units.len(), 9);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn build<S: SceneGraph + ?Sized>(
    scene: &mut S,
    spec: BuildSpec,
    guides: GuideSet,
) -> RigResult<LimbRig> {
    LimbBuilder::new(scene, spec, guides)?.build()
}
