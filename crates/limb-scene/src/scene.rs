//! In-memory scene
//!
//! Nodes live in creation order; connections are stored per destination plug
//! and mirrored into a whole-attribute dependency graph that refuses cycles.

use crate::attr::{catalog, AttrSpec, AttrState, Attribute};
use crate::error::{SceneError, SceneResult};
use crate::eval::{coerce, pivot_matrix, Channels, MAX_EVAL_DEPTH};
use crate::graph::SceneGraph;
use crate::math::{
    degrees_from_rotation, invert, linear_part, rotation_from_degrees, split_rotation_scale,
};
use crate::plug::{split_element, AttrKey, Plug, PlugKey, Selector};
use crate::types::{ConstraintKind, CurveShape, FreezeMask, IkSolver, NodeId, NodeType};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};
use petgraph::algo::has_path_connecting;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// How a constraint holds its driven node relative to the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ConstraintOffset {
    None,
    Translation(Vector3<f64>),
    Matrix(Matrix4<f64>),
}

/// Kind-specific payload of a node
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeData {
    Plain,
    Curve {
        shape: CurveShape,
        clusters: Vec<(usize, NodeId)>,
    },
    Cluster {
        curve: NodeId,
        cv: usize,
        rest: Point3<f64>,
    },
    IkHandle {
        solver: IkSolver,
        start: NodeId,
        end: NodeId,
    },
    Constraint {
        kind: ConstraintKind,
        driver: NodeId,
        driven: NodeId,
        offset: ConstraintOffset,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) kind: NodeType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attrs: IndexMap<AttrKey, Attribute>,
    pub(crate) data: NodeData,
}

/// Single-threaded scene with pull evaluation
///
/// ```
/// use limb_scene::prelude::*;
///
/// let mut scene = Scene::new();
/// let grp = scene.create_node(NodeType::Transform, "grp", None).unwrap();
/// scene.set_vector3(&grp.plug("translate"), [1.0, 2.0, 3.0].into()).unwrap();
/// assert_eq!(scene.world_position(grp).unwrap().y, 2.0);
/// ```
#[derive(Debug)]
pub struct Scene {
    pub(crate) nodes: IndexMap<NodeId, Node>,
    names: HashMap<String, NodeId>,
    attr_names: IndexSet<String>,
    pub(crate) connections: BTreeMap<PlugKey, PlugKey>,
    deps: DiGraphMap<PlugKey, ()>,
    next_id: u32,
    pub(crate) max_depth: usize,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            nodes: IndexMap::new(),
            names: HashMap::new(),
            attr_names: IndexSet::new(),
            connections: BTreeMap::new(),
            deps: DiGraphMap::new(),
            next_id: 0,
            max_depth: MAX_EVAL_DEPTH,
        }
    }
}

fn validate_name(name: &str) -> SceneResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(SceneError::InvalidName(name.to_string()))
    }
}

impl Scene {
    /// Empty scene
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty scene with a custom evaluation nesting limit
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Number of live nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the scene holds no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of plug connections
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ---- lookup helpers ----

    pub(crate) fn node(&self, id: NodeId) -> SceneResult<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| SceneError::NodeNotFound(id.to_string()))
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| SceneError::NodeNotFound(id.to_string()))
    }

    fn dag_node(&self, id: NodeId) -> SceneResult<&Node> {
        let node = self.node(id)?;
        if node.kind.is_dag() {
            Ok(node)
        } else {
            Err(SceneError::NotATransform(node.name.clone()))
        }
    }

    /// Node name, or the raw handle for dead nodes
    pub(crate) fn label(&self, id: NodeId) -> String {
        self.nodes
            .get(&id)
            .map_or_else(|| id.to_string(), |n| n.name.clone())
    }

    fn key_of(&self, name: &str) -> Option<AttrKey> {
        self.attr_names
            .get_index_of(name)
            .and_then(|i| u32::try_from(i).ok())
            .map(AttrKey)
    }

    fn intern(&mut self, name: &str) -> AttrKey {
        let (index, _) = self.attr_names.insert_full(name.to_string());
        AttrKey(u32::try_from(index).unwrap_or(u32::MAX))
    }

    pub(crate) fn attr_name(&self, key: AttrKey) -> &str {
        self.attr_names
            .get_index(key.0 as usize)
            .map_or("", String::as_str)
    }

    pub(crate) fn attr_key(&self, node: NodeId, name: &str) -> SceneResult<PlugKey> {
        let n = self.node(node)?;
        self.key_of(name)
            .filter(|k| n.attrs.contains_key(k))
            .map(|attr| PlugKey {
                node,
                attr,
                selector: Selector::Whole,
            })
            .ok_or_else(|| SceneError::AttributeNotFound {
                node: n.name.clone(),
                attr: name.to_string(),
            })
    }

    pub(crate) fn attribute(&self, key: PlugKey) -> SceneResult<&Attribute> {
        let node = self.node(key.node)?;
        node.attrs
            .get(&key.attr)
            .ok_or_else(|| SceneError::AttributeNotFound {
                node: node.name.clone(),
                attr: self.attr_name(key.attr).to_string(),
            })
    }

    fn attribute_mut(&mut self, key: PlugKey) -> SceneResult<&mut Attribute> {
        let attr_name = self.attr_name(key.attr).to_string();
        let node = self.node_mut(key.node)?;
        let node_name = node.name.clone();
        node.attrs
            .get_mut(&key.attr)
            .ok_or(SceneError::AttributeNotFound {
                node: node_name,
                attr: attr_name,
            })
    }

    /// Resolve a plug path to a key
    pub(crate) fn resolve(&self, plug: &Plug) -> SceneResult<PlugKey> {
        let node = self.node(plug.node)?;
        let missing = || SceneError::AttributeNotFound {
            node: node.name.clone(),
            attr: plug.attr.clone(),
        };
        let key = |attr: AttrKey, selector: Selector| PlugKey {
            node: plug.node,
            attr,
            selector,
        };

        if let Some((base, index)) = split_element(&plug.attr) {
            let attr_key = self.key_of(base).ok_or_else(missing)?;
            let attr = node.attrs.get(&attr_key).ok_or_else(missing)?;
            if !matches!(attr.value, Value::DoubleArray(_)) {
                return Err(missing());
            }
            let index = u32::try_from(index).map_err(|_| SceneError::IndexOutOfRange {
                node: node.name.clone(),
                index,
            })?;
            return Ok(key(attr_key, Selector::Element(index)));
        }

        if let Some(attr_key) = self.key_of(&plug.attr) {
            if node.attrs.contains_key(&attr_key) {
                return Ok(key(attr_key, Selector::Whole));
            }
        }

        let mut chars = plug.attr.chars();
        if let Some(suffix) = chars.next_back() {
            if let Some(attr_key) = self.key_of(chars.as_str()) {
                if let Some(attr) = node.attrs.get(&attr_key) {
                    if let Some(i) = attr.style.index_of(suffix).and_then(|i| u8::try_from(i).ok()) {
                        return Ok(key(attr_key, Selector::Component(i)));
                    }
                }
            }
        }
        Err(missing())
    }

    /// Attribute path of a key, e.g. `translateX` or `input1D[2]`
    fn key_path(&self, key: PlugKey) -> String {
        let base = self.attr_name(key.attr);
        match key.selector {
            Selector::Whole => base.to_string(),
            Selector::Component(i) => {
                let suffixes = match self.attribute(key).map(|a| a.style) {
                    Ok(crate::attr::ComponentStyle::Rgb) => ['R', 'G', 'B'],
                    _ => ['X', 'Y', 'Z'],
                };
                format!("{base}{}", suffixes[usize::from(i) % 3])
            }
            Selector::Element(j) => format!("{base}[{j}]"),
        }
    }

    /// `node.path` for messages
    pub(crate) fn describe(&self, key: PlugKey) -> String {
        format!("{}.{}", self.label(key.node), self.key_path(key))
    }

    fn to_plug(&self, key: PlugKey) -> Plug {
        Plug::new(key.node, self.key_path(key))
    }

    /// Value of the slot's type, used for coercion
    pub(crate) fn slot_value(&self, key: PlugKey) -> SceneResult<Value> {
        match key.selector {
            Selector::Whole => Ok(self.attribute(key)?.value.clone()),
            Selector::Component(_) | Selector::Element(_) => Ok(Value::Double(0.0)),
        }
    }

    /// Whether the plug, or an overlapping whole/part, has an incoming connection
    fn is_driven(&self, key: PlugKey) -> bool {
        if self.connections.contains_key(&key) {
            return true;
        }
        match key.selector {
            Selector::Whole => self
                .connections
                .range(key.with(Selector::Component(0))..=key.with(Selector::Element(u32::MAX)))
                .next()
                .is_some(),
            Selector::Component(_) | Selector::Element(_) => {
                self.connections.contains_key(&key.whole())
            }
        }
    }

    fn is_locked(&self, key: PlugKey) -> SceneResult<bool> {
        let attr = self.attribute(key)?;
        Ok(match key.selector {
            Selector::Component(i) => attr
                .states
                .get(usize::from(i))
                .is_some_and(|s| s.locked),
            Selector::Whole | Selector::Element(_) => attr.states.iter().any(|s| s.locked),
        })
    }

    // ---- writes ----

    fn write(&mut self, key: PlugKey, value: Value) -> SceneResult<()> {
        let path = self.describe(key);
        let attr = self.attribute_mut(key)?;
        match key.selector {
            Selector::Whole => {
                let mut stored = coerce(value, &attr.value, &path)?;
                if let Value::Double(requested) = stored {
                    let (clamped, changed) = attr.clamp(requested);
                    if changed {
                        warn!(plug = %path, requested, stored = clamped, "value clamped into attribute range");
                    }
                    stored = Value::Double(clamped);
                }
                attr.value = stored;
            }
            Selector::Component(i) => {
                let part = coerce(value, &Value::Double(0.0), &path)?
                    .as_f64()
                    .unwrap_or_default();
                if let Value::Double3(c) = &mut attr.value {
                    c[usize::from(i)] = part;
                }
            }
            Selector::Element(j) => {
                let part = coerce(value, &Value::Double(0.0), &path)?
                    .as_f64()
                    .unwrap_or_default();
                if let Value::DoubleArray(a) = &mut attr.value {
                    let j = j as usize;
                    if a.len() <= j {
                        a.resize(j + 1, 0.0);
                    }
                    a[j] = part;
                }
            }
        }
        Ok(())
    }

    /// Write a transform channel, skipping driven components and ignoring locks
    fn store_channel(&mut self, node: NodeId, name: &str, value: &Vector3<f64>) -> SceneResult<()> {
        let whole = self.attr_key(node, name)?;
        if self.connections.contains_key(&whole) {
            return Ok(());
        }
        for i in 0..3u8 {
            let part = whole.with(Selector::Component(i));
            if !self.connections.contains_key(&part) {
                self.write(part, Value::Double(value[usize::from(i)]))?;
            }
        }
        Ok(())
    }

    fn store_channels(&mut self, node: NodeId, channels: &Channels) -> SceneResult<()> {
        self.store_channel(node, "translate", &channels.translate)?;
        self.store_channel(node, "rotate", &channels.rotate)?;
        self.store_channel(node, "scale", &channels.scale)
    }

    /// Set the channels so the node ends up at `world`
    fn place_world(&mut self, node: NodeId, world: &Matrix4<f64>) -> SceneResult<()> {
        let parent = self.parent_world(node, 0)?;
        let local = invert(&parent, &self.label(node))? * world;
        let channels = self.channels_from_local(node, &local, 0)?;
        self.store_channels(node, &channels)
    }

    fn is_descendant(&self, candidate: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.nodes.get(&candidate).and_then(|n| n.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn insert_node(
        &mut self,
        kind: NodeType,
        name: &str,
        parent: Option<NodeId>,
        data: NodeData,
    ) -> SceneResult<NodeId> {
        validate_name(name)?;
        if self.names.contains_key(name) {
            return Err(SceneError::NameCollision(name.to_string()));
        }
        if let Some(parent) = parent {
            let parent_node = self.dag_node(parent)?;
            if !kind.is_dag() {
                return Err(SceneError::NotATransform(format!(
                    "{name} cannot be parented under {}",
                    parent_node.name
                )));
            }
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;

        let mut attrs = IndexMap::new();
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (attr_name, attr) in catalog(kind) {
            let attr_key = self.intern(attr_name);
            let key = PlugKey {
                node: id,
                attr: attr_key,
                selector: Selector::Whole,
            };
            if attr.computed {
                outputs.push(key);
            } else {
                inputs.push(key);
            }
            attrs.insert(attr_key, attr);
        }
        for input in &inputs {
            for output in &outputs {
                self.deps.add_edge(*input, *output, ());
            }
        }

        self.nodes.insert(
            id,
            Node {
                name: name.to_string(),
                kind,
                parent,
                children: Vec::new(),
                attrs,
                data,
            },
        );
        self.names.insert(name.to_string(), id);
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id);
        }
        debug!(node = name, kind = %kind, "created node");
        Ok(id)
    }

    fn constraint_name(&self, kind: ConstraintKind, driven: &str) -> String {
        let mut n = 1;
        loop {
            let candidate = format!("{driven}_{}{n}", kind.stem());
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl SceneGraph for Scene {
    fn create_node(
        &mut self,
        kind: NodeType,
        name: &str,
        parent: Option<NodeId>,
    ) -> SceneResult<NodeId> {
        let data = match kind {
            NodeType::Curve => NodeData::Curve {
                shape: CurveShape::open(Vec::new(), 1),
                clusters: Vec::new(),
            },
            _ => NodeData::Plain,
        };
        self.insert_node(kind, name, parent, data)
    }

    fn create_curve(
        &mut self,
        name: &str,
        shape: CurveShape,
        parent: Option<NodeId>,
    ) -> SceneResult<NodeId> {
        let data = NodeData::Curve {
            shape,
            clusters: Vec::new(),
        };
        self.insert_node(NodeType::Curve, name, parent, data)
    }

    fn create_ik_handle(
        &mut self,
        name: &str,
        solver: IkSolver,
        start: NodeId,
        end: NodeId,
    ) -> SceneResult<NodeId> {
        for joint in [start, end] {
            let node = self.node(joint)?;
            if node.kind != NodeType::Joint {
                return Err(SceneError::NotATransform(format!("{} is not a joint", node.name)));
            }
        }
        let handle = self.insert_node(
            NodeType::IkHandle,
            name,
            None,
            NodeData::IkHandle { solver, start, end },
        )?;
        self.match_transform(handle, end, true, false)?;
        Ok(handle)
    }

    fn create_constraint(
        &mut self,
        kind: ConstraintKind,
        driver: NodeId,
        driven: NodeId,
        maintain_offset: bool,
    ) -> SceneResult<NodeId> {
        self.dag_node(driver)?;
        let driven_node = self.dag_node(driven)?;
        if kind == ConstraintKind::PoleVector && driven_node.kind != NodeType::IkHandle {
            return Err(SceneError::NotATransform(format!(
                "{} is not an IK handle",
                driven_node.name
            )));
        }
        let name = self.constraint_name(kind, &driven_node.name.clone());

        let offset = match (kind, maintain_offset) {
            (ConstraintKind::Point, true) => {
                ConstraintOffset::Translation(self.world_pivot(driven)? - self.world_pivot(driver)?)
            }
            (ConstraintKind::Parent, true) => {
                let driver_world = self.world_matrix(driver)?;
                let inverse = invert(&driver_world, &self.label(driver))?;
                ConstraintOffset::Matrix(inverse * self.world_matrix(driven)?)
            }
            _ => ConstraintOffset::None,
        };

        let constraint = self.insert_node(
            kind.node_type(),
            &name,
            None,
            NodeData::Constraint {
                kind,
                driver,
                driven,
                offset,
            },
        )?;
        let wiring: &[(&str, &str)] = match kind {
            ConstraintKind::Point => &[("constraintTranslate", "translate")],
            ConstraintKind::Parent => &[
                ("constraintTranslate", "translate"),
                ("constraintRotate", "rotate"),
            ],
            ConstraintKind::PoleVector => &[("constraintTranslate", "poleVector")],
        };
        for (out, input) in wiring {
            if let Err(err) = self.connect(&constraint.plug(*out), &driven.plug(*input)) {
                self.delete_node(constraint)?;
                return Err(err);
            }
        }
        Ok(constraint)
    }

    fn create_cluster(&mut self, name: &str, curve: NodeId, cv: usize) -> SceneResult<NodeId> {
        let curve_node = self.node(curve)?;
        if curve_node.kind != NodeType::Curve {
            return Err(SceneError::NotACurve(curve_node.name.clone()));
        }
        let points = self.curve_points(curve)?;
        let rest = *points.get(cv).ok_or_else(|| SceneError::IndexOutOfRange {
            node: self.label(curve),
            index: cv,
        })?;
        let handle = self.insert_node(
            NodeType::ClusterHandle,
            name,
            None,
            NodeData::Cluster { curve, cv, rest },
        )?;
        self.store_channel(handle, "rotatePivot", &rest.coords)?;
        if let NodeData::Curve { clusters, .. } = &mut self.node_mut(curve)?.data {
            clusters.push((cv, handle));
        }
        Ok(handle)
    }

    fn delete_node(&mut self, node: NodeId) -> SceneResult<()> {
        self.node(node)?;
        let mut doomed: BTreeSet<NodeId> = self.subtree(node).into_iter().collect();
        loop {
            let attached: Vec<NodeId> = self
                .nodes
                .iter()
                .filter(|(id, _)| !doomed.contains(*id))
                .filter(|(_, n)| match &n.data {
                    NodeData::Constraint { driver, driven, .. } => {
                        doomed.contains(driver) || doomed.contains(driven)
                    }
                    NodeData::Cluster { curve, .. } => doomed.contains(curve),
                    NodeData::IkHandle { start, end, .. } => {
                        doomed.contains(start) || doomed.contains(end)
                    }
                    NodeData::Plain | NodeData::Curve { .. } => false,
                })
                .map(|(id, _)| *id)
                .collect();
            if attached.is_empty() {
                break;
            }
            for id in attached {
                doomed.extend(self.subtree(id));
            }
        }

        // survivors fed by deleted nodes keep their last evaluated value
        let orphaned: Vec<PlugKey> = self
            .connections
            .iter()
            .filter(|(dst, src)| doomed.contains(&src.node) && !doomed.contains(&dst.node))
            .map(|(dst, _)| *dst)
            .collect();
        let mut baked = Vec::with_capacity(orphaned.len());
        for dst in orphaned {
            if let Ok(value) = self.read(dst, 0) {
                baked.push((dst, value));
            }
        }

        self.connections
            .retain(|dst, src| !doomed.contains(&dst.node) && !doomed.contains(&src.node));
        let stale: Vec<PlugKey> = self
            .deps
            .nodes()
            .filter(|k| doomed.contains(&k.node))
            .collect();
        for key in stale {
            self.deps.remove_node(key);
        }
        for (dst, value) in baked {
            self.write(dst, value)?;
        }

        for id in &doomed {
            if let Some(removed) = self.nodes.shift_remove(id) {
                self.names.remove(&removed.name);
                if let Some(parent) = removed.parent.filter(|p| !doomed.contains(p)) {
                    if let Some(parent_node) = self.nodes.get_mut(&parent) {
                        parent_node.children.retain(|c| c != id);
                    }
                }
            }
        }
        for survivor in self.nodes.values_mut() {
            if let NodeData::Curve { clusters, .. } = &mut survivor.data {
                clusters.retain(|(_, handle)| !doomed.contains(handle));
            }
        }
        debug!(count = doomed.len(), "deleted nodes");
        Ok(())
    }

    fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    fn name(&self, node: NodeId) -> SceneResult<&str> {
        Ok(self.node(node)?.name.as_str())
    }

    fn node_type(&self, node: NodeId) -> SceneResult<NodeType> {
        Ok(self.node(node)?.kind)
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    fn parent(&self, node: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    fn children(&self, node: NodeId) -> SceneResult<Vec<NodeId>> {
        Ok(self.node(node)?.children.clone())
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> SceneResult<()> {
        let current = self.dag_node(node)?.parent;
        if let Some(p) = parent {
            self.dag_node(p)?;
            if p == node || self.is_descendant(p, node) {
                return Err(SceneError::HierarchyCycle {
                    child: self.label(node),
                    parent: self.label(p),
                });
            }
            invert(&self.world_matrix(p)?, &self.label(p))?;
        }
        if current == parent {
            return Ok(());
        }

        let inherits = self.input_bool(node, "inheritsTransform", 0)?;
        let world = self.world_matrix(node)?;

        if let Some(old) = current {
            self.node_mut(old)?.children.retain(|c| *c != node);
        }
        self.node_mut(node)?.parent = parent;
        if let Some(p) = parent {
            self.node_mut(p)?.children.push(node);
        }
        if inherits {
            self.place_world(node, &world)?;
        }
        let parent_name = parent.map_or_else(|| "<world>".to_string(), |p| self.label(p));
        debug!(node = %self.label(node), parent = %parent_name, "reparented");
        Ok(())
    }

    fn add_attr(&mut self, node: NodeId, name: &str, spec: AttrSpec) -> SceneResult<()> {
        validate_name(name)?;
        if self.resolve(&Plug::new(node, name)).is_ok() {
            return Err(SceneError::AttributeExists {
                node: self.label(node),
                attr: name.to_string(),
            });
        }
        let key = self.intern(name);
        self.node_mut(node)?
            .attrs
            .insert(key, Attribute::from_spec(&spec));
        debug!(node = %self.label(node), attr = name, "added attribute");
        Ok(())
    }

    fn has_attr(&self, plug: &Plug) -> bool {
        self.resolve(plug).is_ok()
    }

    fn get_attr(&self, plug: &Plug) -> SceneResult<Value> {
        let key = self.resolve(plug)?;
        self.read(key, 0)
    }

    fn set_attr(&mut self, plug: &Plug, value: Value) -> SceneResult<()> {
        let key = self.resolve(plug)?;
        if self.attribute(key)?.computed {
            return Err(SceneError::ReadOnly(self.describe(key)));
        }
        if self.is_locked(key)? {
            return Err(SceneError::LockedAttribute(self.describe(key)));
        }
        if self.is_driven(key) {
            return Err(SceneError::DrivenAttribute(self.describe(key)));
        }
        self.write(key, value)
    }

    fn attr_state(&self, plug: &Plug) -> SceneResult<AttrState> {
        let key = self.resolve(plug)?;
        let attr = self.attribute(key)?;
        Ok(match key.selector {
            Selector::Component(i) => attr
                .states
                .get(usize::from(i))
                .copied()
                .unwrap_or(AttrState::HIDDEN),
            Selector::Whole | Selector::Element(_) => AttrState {
                locked: attr.states.iter().all(|s| s.locked),
                keyable: attr.states.iter().all(|s| s.keyable),
            },
        })
    }

    fn set_attr_state(
        &mut self,
        plug: &Plug,
        locked: Option<bool>,
        keyable: Option<bool>,
    ) -> SceneResult<()> {
        let key = self.resolve(plug)?;
        let attr = self.attribute_mut(key)?;
        let range = match key.selector {
            Selector::Component(i) => usize::from(i)..usize::from(i) + 1,
            Selector::Whole | Selector::Element(_) => 0..attr.component_count(),
        };
        for state in attr.states.get_mut(range).into_iter().flatten() {
            if let Some(locked) = locked {
                state.locked = locked;
            }
            if let Some(keyable) = keyable {
                state.keyable = keyable;
            }
        }
        Ok(())
    }

    fn connect(&mut self, src: &Plug, dst: &Plug) -> SceneResult<()> {
        let from = self.resolve(src)?;
        let to = self.resolve(dst)?;
        if self.attribute(to)?.computed {
            return Err(SceneError::ReadOnly(self.describe(to)));
        }
        if self.is_locked(to)? {
            return Err(SceneError::LockedAttribute(self.describe(to)));
        }
        if self.is_driven(to) {
            return Err(SceneError::AlreadyConnected(self.describe(to)));
        }
        coerce(self.slot_value(from)?, &self.slot_value(to)?, &self.describe(to))?;

        let (from_whole, to_whole) = (from.whole(), to.whole());
        self.deps.add_node(from_whole);
        self.deps.add_node(to_whole);
        if from_whole == to_whole || has_path_connecting(&self.deps, to_whole, from_whole, None) {
            return Err(SceneError::CycleDetected {
                from: self.describe(from),
                to: self.describe(to),
            });
        }
        self.deps.add_edge(from_whole, to_whole, ());
        self.connections.insert(to, from);
        debug!(from = %self.describe(from), to = %self.describe(to), "connected");
        Ok(())
    }

    fn source(&self, dst: &Plug) -> SceneResult<Option<Plug>> {
        let key = self.resolve(dst)?;
        Ok(self.connections.get(&key).map(|src| self.to_plug(*src)))
    }

    fn world_matrix(&self, node: NodeId) -> SceneResult<Matrix4<f64>> {
        self.dag_node(node)?;
        self.world_matrix_at(node, 0)
    }

    fn world_pivot(&self, node: NodeId) -> SceneResult<Point3<f64>> {
        self.dag_node(node)?;
        self.world_pivot_at(node, 0)
    }

    fn set_world_pivot(&mut self, node: NodeId, point: &Point3<f64>) -> SceneResult<()> {
        let world = self.world_matrix(node)?;
        let new_pivot = invert(&world, &self.label(node))?
            .transform_point(point)
            .coords;
        let old_pivot = self.input_vec3(node, "rotatePivot", 0)?;
        let translate = self.input_vec3(node, "translate", 0)?;
        let linear = linear_part(&self.channel_matrix(node, 0)?);
        let shifted = translate + (Matrix3::identity() - linear) * (old_pivot - new_pivot);
        self.store_channel(node, "rotatePivot", &new_pivot)?;
        self.store_channel(node, "translate", &shifted)
    }

    fn match_transform(
        &mut self,
        node: NodeId,
        target: NodeId,
        translate: bool,
        rotate: bool,
    ) -> SceneResult<()> {
        let world = self.world_matrix(node)?;
        let target_world = self.world_matrix(target)?;
        let (current_rotation, scale) = split_rotation_scale(&linear_part(&world));
        let rotation = if rotate {
            split_rotation_scale(&linear_part(&target_world)).0
        } else {
            current_rotation
        };
        let linear = rotation.matrix() * Matrix3::from_diagonal(&scale);
        let pivot = self.input_vec3(node, "rotatePivot", 0)?;
        let pivot_world = if translate {
            self.world_pivot(target)?
        } else {
            self.world_pivot(node)?
        };
        let desired = pivot_matrix(&linear, &(pivot_world.coords - pivot), &pivot);

        let parent = self.parent_world(node, 0)?;
        let local = invert(&parent, &self.label(node))? * desired;
        let channels = self.channels_from_local(node, &local, 0)?;
        if translate {
            self.store_channel(node, "translate", &channels.translate)?;
        }
        if rotate {
            self.store_channel(node, "rotate", &channels.rotate)?;
        }
        Ok(())
    }

    fn freeze_transform(&mut self, node: NodeId, mask: FreezeMask) -> SceneResult<()> {
        let kind = self.dag_node(node)?.kind;
        let translate = self.input_vec3(node, "translate", 0)?;
        let rotate = self.input_vec3(node, "rotate", 0)?;
        let scale = self.input_vec3(node, "scale", 0)?;

        if kind == NodeType::Joint {
            if mask.rotate {
                let orient = self.input_vec3(node, "jointOrient", 0)?;
                let baked = rotation_from_degrees(&orient) * rotation_from_degrees(&rotate);
                self.store_channel(node, "jointOrient", &degrees_from_rotation(&baked))?;
                self.store_channel(node, "rotate", &Vector3::zeros())?;
            }
            if mask.scale {
                self.store_channel(node, "scale", &Vector3::repeat(1.0))?;
            }
            return Ok(());
        }

        let pivot = self.input_vec3(node, "rotatePivot", 0)?;
        let before = self.channel_matrix(node, 0)?;
        let new_translate = if mask.translate {
            Vector3::zeros()
        } else {
            translate
        };
        let new_rotate = if mask.rotate { Vector3::zeros() } else { rotate };
        let new_scale = if mask.scale {
            Vector3::repeat(1.0)
        } else {
            scale
        };
        let new_pivot = translate + pivot - new_translate;
        let linear =
            rotation_from_degrees(&new_rotate).matrix() * Matrix3::from_diagonal(&new_scale);
        let after = pivot_matrix(&linear, &new_translate, &new_pivot);
        let delta = invert(&after, &self.label(node))? * before;

        let mut child_worlds = Vec::new();
        for child in self.node(node)?.children.clone() {
            child_worlds.push((child, self.world_matrix(child)?));
        }

        self.store_channel(node, "translate", &new_translate)?;
        self.store_channel(node, "rotate", &new_rotate)?;
        self.store_channel(node, "scale", &new_scale)?;
        self.store_channel(node, "rotatePivot", &new_pivot)?;
        if let NodeData::Curve { shape, .. } = &mut self.node_mut(node)?.data {
            for point in &mut shape.points {
                *point = delta.transform_point(point);
            }
        }
        for (child, world) in child_worlds {
            if self.input_bool(child, "inheritsTransform", 0)? {
                self.place_world(child, &world)?;
            }
        }
        debug!(node = %self.label(node), ?mask, "froze transform");
        Ok(())
    }

    fn curve_points(&self, node: NodeId) -> SceneResult<Vec<Point3<f64>>> {
        let curve = self.node(node)?;
        let NodeData::Curve { shape, clusters } = &curve.data else {
            return Err(SceneError::NotACurve(curve.name.clone()));
        };
        let world = self.world_matrix(node)?;
        let mut points: Vec<Point3<f64>> =
            shape.points.iter().map(|p| world.transform_point(p)).collect();
        for (cv, handle) in clusters {
            if let NodeData::Cluster { rest, .. } = &self.node(*handle)?.data {
                let displacement = self.world_pivot(*handle)? - *rest;
                if let Some(point) = points.get_mut(*cv) {
                    *point += displacement;
                }
            }
        }
        Ok(points)
    }
}

impl Scene {
    /// Object-space shape of a curve node
    pub fn curve_shape(&self, node: NodeId) -> SceneResult<&CurveShape> {
        let curve = self.node(node)?;
        match &curve.data {
            NodeData::Curve { shape, .. } => Ok(shape),
            _ => Err(SceneError::NotACurve(curve.name.clone())),
        }
    }

    /// Solver, start and end joint of an IK handle
    pub fn ik_handle_info(&self, node: NodeId) -> SceneResult<(IkSolver, NodeId, NodeId)> {
        let handle = self.node(node)?;
        match &handle.data {
            NodeData::IkHandle { solver, start, end } => Ok((*solver, *start, *end)),
            _ => Err(SceneError::NotATransform(format!(
                "{} is not an IK handle",
                handle.name
            ))),
        }
    }

    /// Kind, driver and driven node of a constraint
    pub fn constraint_info(&self, node: NodeId) -> SceneResult<(ConstraintKind, NodeId, NodeId)> {
        let constraint = self.node(node)?;
        match &constraint.data {
            NodeData::Constraint {
                kind,
                driver,
                driven,
                ..
            } => Ok((*kind, *driver, *driven)),
            _ => Err(SceneError::NodeNotFound(format!(
                "{} is not a constraint",
                constraint.name
            ))),
        }
    }
}
