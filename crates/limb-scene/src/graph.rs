//! The scene contract consumed by rig construction
//!
//! Everything the rig builder does to a scene goes through [`SceneGraph`].
//! Operations are synchronous and immediately observable: a value written by
//! one call is visible to the next, and evaluated reads always reflect the
//! current connections.

use crate::attr::{AttrSpec, AttrState};
use crate::error::{SceneError, SceneResult};
use crate::plug::Plug;
use crate::types::{ConstraintKind, CurveShape, FreezeMask, IkSolver, NodeId, NodeType};
use crate::value::Value;
use nalgebra::{Matrix4, Point3, Vector3};

/// Node creation, hierarchy, attributes and connections of a scene
pub trait SceneGraph {
    // ---- nodes ----

    /// Create a node with a unique name, optionally under a DAG parent
    fn create_node(
        &mut self,
        kind: NodeType,
        name: &str,
        parent: Option<NodeId>,
    ) -> SceneResult<NodeId>;

    /// Create a curve transform carrying `shape` (object-space points)
    fn create_curve(
        &mut self,
        name: &str,
        shape: CurveShape,
        parent: Option<NodeId>,
    ) -> SceneResult<NodeId>;

    /// Create an IK handle spanning `start`..`end`, placed at `end`
    fn create_ik_handle(
        &mut self,
        name: &str,
        solver: IkSolver,
        start: NodeId,
        end: NodeId,
    ) -> SceneResult<NodeId>;

    /// Constrain `driven` to `driver`; returns the constraint node
    ///
    /// With `maintain_offset` the driven node keeps its current world
    /// placement relative to the driver.
    fn create_constraint(
        &mut self,
        kind: ConstraintKind,
        driver: NodeId,
        driven: NodeId,
        maintain_offset: bool,
    ) -> SceneResult<NodeId>;

    /// Create a cluster handle deforming one control vertex of `curve`
    fn create_cluster(&mut self, name: &str, curve: NodeId, cv: usize) -> SceneResult<NodeId>;

    /// Delete a node, its DAG descendants and everything attached to them
    fn delete_node(&mut self, node: NodeId) -> SceneResult<()>;

    /// Look a node up by name
    fn find(&self, name: &str) -> Option<NodeId>;

    /// Name of a live node
    fn name(&self, node: NodeId) -> SceneResult<&str>;

    /// Kind of a live node
    fn node_type(&self, node: NodeId) -> SceneResult<NodeType>;

    /// All live nodes in creation order
    fn node_ids(&self) -> Vec<NodeId>;

    // ---- hierarchy ----

    /// DAG parent, `None` for world-level nodes
    fn parent(&self, node: NodeId) -> SceneResult<Option<NodeId>>;

    /// DAG children in parenting order
    fn children(&self, node: NodeId) -> SceneResult<Vec<NodeId>>;

    /// Reparent, keeping the node's world transform
    ///
    /// Channels driven by connections are left alone.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> SceneResult<()>;

    // ---- attributes ----

    /// Add a dynamic attribute
    fn add_attr(&mut self, node: NodeId, name: &str, spec: AttrSpec) -> SceneResult<()>;

    /// Whether the plug resolves on a live node
    fn has_attr(&self, plug: &Plug) -> bool;

    /// Evaluated value of a plug
    fn get_attr(&self, plug: &Plug) -> SceneResult<Value>;

    /// Store a value; dynamic scalars are clamped into their range
    fn set_attr(&mut self, plug: &Plug, value: Value) -> SceneResult<()>;

    /// Lock / keyable state (a whole compound reads locked only if every
    /// component is locked)
    fn attr_state(&self, plug: &Plug) -> SceneResult<AttrState>;

    /// Update lock and/or keyable state; `None` leaves a flag unchanged
    fn set_attr_state(
        &mut self,
        plug: &Plug,
        locked: Option<bool>,
        keyable: Option<bool>,
    ) -> SceneResult<()>;

    /// Connect `src` into `dst`
    fn connect(&mut self, src: &Plug, dst: &Plug) -> SceneResult<()>;

    /// Incoming connection of exactly this plug
    fn source(&self, dst: &Plug) -> SceneResult<Option<Plug>>;

    // ---- transforms ----

    /// Evaluated world matrix
    fn world_matrix(&self, node: NodeId) -> SceneResult<Matrix4<f64>>;

    /// World-space position of the rotate pivot
    fn world_pivot(&self, node: NodeId) -> SceneResult<Point3<f64>>;

    /// Move the rotate pivot to a world position without moving the node
    fn set_world_pivot(&mut self, node: NodeId, point: &Point3<f64>) -> SceneResult<()>;

    /// Snap `node` to `target`: pivot onto the target's pivot and/or
    /// orientation onto the target's world orientation
    fn match_transform(
        &mut self,
        node: NodeId,
        target: NodeId,
        translate: bool,
        rotate: bool,
    ) -> SceneResult<()>;

    /// Bake the masked channels into the rest pose
    ///
    /// Joints take rotation into their joint orient; other transforms bake
    /// into curve points and move the pivot so nothing moves in world space.
    fn freeze_transform(&mut self, node: NodeId, mask: FreezeMask) -> SceneResult<()>;

    /// World-space control points of a curve, cluster offsets applied
    fn curve_points(&self, node: NodeId) -> SceneResult<Vec<Point3<f64>>>;

    // ---- provided ----

    /// Look a node up by name or fail with `NodeNotFound`
    fn require(&self, name: &str) -> SceneResult<NodeId> {
        self.find(name)
            .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))
    }

    /// Whether a handle refers to a live node
    fn exists(&self, node: NodeId) -> bool {
        self.name(node).is_ok()
    }

    /// Evaluated scalar
    fn get_f64(&self, plug: &Plug) -> SceneResult<f64> {
        let value = self.get_attr(plug)?;
        value.as_f64().ok_or_else(|| SceneError::TypeMismatch {
            plug: plug.to_string(),
            expected: "double",
            found: value.type_name(),
        })
    }

    /// Evaluated boolean
    fn get_bool(&self, plug: &Plug) -> SceneResult<bool> {
        let value = self.get_attr(plug)?;
        value.as_bool().ok_or_else(|| SceneError::TypeMismatch {
            plug: plug.to_string(),
            expected: "bool",
            found: value.type_name(),
        })
    }

    /// Evaluated three-component value
    fn get_vector3(&self, plug: &Plug) -> SceneResult<Vector3<f64>> {
        let value = self.get_attr(plug)?;
        value.as_vector3().ok_or_else(|| SceneError::TypeMismatch {
            plug: plug.to_string(),
            expected: "double3",
            found: value.type_name(),
        })
    }

    /// Evaluated string
    fn get_string(&self, plug: &Plug) -> SceneResult<String> {
        let value = self.get_attr(plug)?;
        match value {
            Value::String(s) => Ok(s),
            other => Err(SceneError::TypeMismatch {
                plug: plug.to_string(),
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Store a scalar
    fn set_f64(&mut self, plug: &Plug, value: f64) -> SceneResult<()> {
        self.set_attr(plug, Value::Double(value))
    }

    /// Store a boolean
    fn set_bool(&mut self, plug: &Plug, value: bool) -> SceneResult<()> {
        self.set_attr(plug, Value::Bool(value))
    }

    /// Store a three-component value
    fn set_vector3(&mut self, plug: &Plug, value: Vector3<f64>) -> SceneResult<()> {
        self.set_attr(plug, Value::from(value))
    }

    /// World-space origin of a transform
    fn world_position(&self, node: NodeId) -> SceneResult<Point3<f64>> {
        let m = self.world_matrix(node)?;
        Ok(Point3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]))
    }
}
