//! Summary of a built limb for the command-line tool

use crate::builder::LimbRig;
use crate::spec::ControlRole;
use limb_scene::{NodeId, SceneGraph, SceneResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One node of the hierarchy tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    /// Node name
    pub name: String,
    /// Node type name
    pub kind: String,
    /// Child entries
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeEntry>,
}

impl TreeEntry {
    fn collect<S: SceneGraph + ?Sized>(scene: &S, node: NodeId) -> SceneResult<Self> {
        let children = scene
            .children(node)?
            .into_iter()
            .map(|child| Self::collect(scene, child))
            .collect::<SceneResult<Vec<_>>>()?;
        Ok(Self {
            name: scene.name(node)?.to_string(),
            kind: scene.node_type(node)?.as_str().to_string(),
            children,
        })
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} ({})", "", self.name, self.kind, indent = depth * 2)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

/// What a build produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigReport {
    /// `{side}_{part}`
    pub limb: String,
    /// Root node name
    pub root: String,
    /// Node count per type, whole scene
    pub node_counts: BTreeMap<String, usize>,
    /// Control names per role
    pub controls: BTreeMap<ControlRole, Vec<String>>,
    /// Chain rest length, when stretch was built
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_length: Option<f64>,
    /// Base control radius
    pub radius: f64,
    /// Group tree from the root
    pub hierarchy: TreeEntry,
}

impl RigReport {
    /// Gather the report from the scene
    ///
    /// # Errors
    ///
    /// Propagates scene errors, e.g. when rig nodes were deleted since.
    pub fn collect<S: SceneGraph + ?Sized>(scene: &S, rig: &LimbRig) -> SceneResult<Self> {
        let mut node_counts = BTreeMap::new();
        for node in scene.node_ids() {
            *node_counts
                .entry(scene.node_type(node)?.as_str().to_string())
                .or_insert(0) += 1;
        }
        let mut controls: BTreeMap<ControlRole, Vec<String>> = BTreeMap::new();
        for (role, node) in rig.registry.iter() {
            controls
                .entry(role)
                .or_default()
                .push(scene.name(node)?.to_string());
        }
        Ok(Self {
            limb: rig.base_name.clone(),
            root: scene.name(rig.root)?.to_string(),
            node_counts,
            controls,
            rest_length: rig.stretch.as_ref().map(|s| s.ik.rest_length),
            radius: rig.radius,
            hierarchy: TreeEntry::collect(scene, rig.root)?,
        })
    }

    /// Total number of nodes counted
    #[must_use]
    pub fn total_nodes(&self) -> usize {
        self.node_counts.values().sum()
    }
}

impl fmt::Display for RigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Limb {} (root {})", self.limb, self.root)?;
        writeln!(f, "  control radius: {:.3}", self.radius)?;
        if let Some(rest) = self.rest_length {
            writeln!(f, "  rest length: {rest:.3}")?;
        }
        writeln!(f, "Nodes: {}", self.total_nodes())?;
        for (kind, count) in &self.node_counts {
            writeln!(f, "  {kind}: {count}")?;
        }
        writeln!(f, "Controls:")?;
        for (role, names) in &self.controls {
            writeln!(f, "  {role}: {}", names.join(", "))?;
        }
        writeln!(f, "Hierarchy:")?;
        self.hierarchy.write_indented(f, 1)
    }
}
