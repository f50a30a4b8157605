//! Pull evaluation
//!
//! A read resolves the incoming connection first, then component and element
//! connections layered over the stored value, then computed outputs
//! (transform matrices, constraints, utility nodes). Recursion is bounded by
//! the scene's depth limit ([`MAX_EVAL_DEPTH`] by default); exceeding it means
//! the graph loops through an implicit dependency such as a constraint driver
//! or a parent matrix.

use crate::error::{SceneError, SceneResult};
use crate::math::{
    decompose, degrees_from_rotation, from_parts, invert, linear_part, orthonormalize,
    rotation_from_degrees, split_rotation_scale, translation_part,
};
use crate::plug::{PlugKey, Selector};
use crate::scene::{ConstraintOffset, NodeData, Scene};
use crate::types::{ConstraintKind, NodeId, NodeType};
use crate::value::Value;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Default nesting limit for a single read
pub const MAX_EVAL_DEPTH: usize = 512;

const SCALE_EPSILON: f64 = 1e-12;

/// Transform channels recovered from a local matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Channels {
    pub(crate) translate: Vector3<f64>,
    pub(crate) rotate: Vector3<f64>,
    pub(crate) scale: Vector3<f64>,
}

/// Coerce `value` to the type of `like`
pub(crate) fn coerce(value: Value, like: &Value, plug: &str) -> SceneResult<Value> {
    let converted = match like {
        Value::Double(_) => value.as_f64().map(Value::Double),
        Value::Bool(_) => value.as_bool().map(Value::Bool),
        Value::Int(_) => value.as_i64().map(Value::Int),
        Value::Double3(_) => value.as_double3().map(Value::Double3),
        Value::Matrix(_) => value.as_matrix().map(Value::Matrix),
        Value::DoubleArray(_) => value.as_array().map(|a| Value::DoubleArray(a.to_vec())),
        Value::String(_) => value.as_str().map(Value::from),
    };
    converted.ok_or_else(|| SceneError::TypeMismatch {
        plug: plug.to_string(),
        expected: like.type_name(),
        found: value.type_name(),
    })
}

/// Pivot-space matrix `T · Tp · A · Tp⁻¹`
pub(crate) fn pivot_matrix(
    linear: &Matrix3<f64>,
    translate: &Vector3<f64>,
    pivot: &Vector3<f64>,
) -> Matrix4<f64> {
    from_parts(linear, &(translate + pivot - linear * pivot))
}

fn inverse_scale(scale: &Vector3<f64>) -> Vector3<f64> {
    scale.map(|s| if s.abs() < SCALE_EPSILON { 1.0 } else { 1.0 / s })
}

fn blend_colors(color1: &Vector3<f64>, color2: &Vector3<f64>, blender: f64) -> Vector3<f64> {
    color1 * blender + color2 * (1.0 - blender)
}

#[allow(clippy::float_cmp)]
fn condition(
    operation: i64,
    first: f64,
    second: f64,
    if_true: Vector3<f64>,
    if_false: Vector3<f64>,
) -> Vector3<f64> {
    let holds = match operation {
        0 => first == second,
        1 => first != second,
        2 => first > second,
        3 => first >= second,
        4 => first < second,
        5 => first <= second,
        _ => false,
    };
    if holds {
        if_true
    } else {
        if_false
    }
}

fn multiply_divide(operation: i64, input1: &Vector3<f64>, input2: &Vector3<f64>) -> Vector3<f64> {
    match operation {
        1 => input1.component_mul(input2),
        2 => input1.component_div(input2),
        3 => input1.zip_map(input2, f64::powf),
        _ => *input1,
    }
}

fn blend_two(inputs: &[f64], blender: f64) -> f64 {
    let first = inputs.first().copied().unwrap_or(0.0);
    let second = inputs.get(1).copied().unwrap_or(0.0);
    (1.0 - blender) * first + blender * second
}

#[allow(clippy::cast_precision_loss)]
fn plus_minus_average(operation: i64, inputs: &[f64]) -> f64 {
    match (operation, inputs.split_first()) {
        (_, None) => 0.0,
        (1, _) => inputs.iter().sum(),
        (2, Some((first, rest))) => rest.iter().fold(*first, |acc, v| acc - v),
        (3, _) => inputs.iter().sum::<f64>() / inputs.len() as f64,
        (_, Some((first, _))) => *first,
    }
}

impl Scene {
    fn depth_check(&self, key: PlugKey, depth: usize) -> SceneResult<()> {
        if depth > self.max_depth {
            return Err(SceneError::EvaluationCycle(self.describe(key)));
        }
        Ok(())
    }

    fn mismatch(&self, key: PlugKey, expected: &'static str, found: &Value) -> SceneError {
        SceneError::TypeMismatch {
            plug: self.describe(key),
            expected,
            found: found.type_name(),
        }
    }

    /// Evaluated value of a resolved plug
    pub(crate) fn read(&self, key: PlugKey, depth: usize) -> SceneResult<Value> {
        self.depth_check(key, depth)?;
        if let Some(src) = self.connections.get(&key) {
            let value = self.read(*src, depth + 1)?;
            return coerce(value, &self.slot_value(key)?, &self.describe(key));
        }
        match key.selector {
            Selector::Whole => self.read_whole(key, depth),
            Selector::Component(i) => {
                let whole = self.read(key.whole(), depth + 1)?;
                whole
                    .as_double3()
                    .map(|c| Value::Double(c[usize::from(i)]))
                    .ok_or_else(|| self.mismatch(key, "double3", &whole))
            }
            Selector::Element(j) => {
                let whole = self.read(key.whole(), depth + 1)?;
                let element = whole
                    .as_array()
                    .and_then(|a| a.get(j as usize).copied())
                    .unwrap_or(0.0);
                Ok(Value::Double(element))
            }
        }
    }

    fn read_whole(&self, key: PlugKey, depth: usize) -> SceneResult<Value> {
        let attr = self.attribute(key)?;
        let mut value = if attr.computed {
            self.compute(key, depth + 1)?
        } else {
            attr.value.clone()
        };
        let lo = key.with(Selector::Component(0));
        let hi = key.with(Selector::Element(u32::MAX));
        for (dst, src) in self.connections.range(lo..=hi) {
            let part = self.read(*src, depth + 1)?;
            let part = part
                .as_f64()
                .ok_or_else(|| self.mismatch(*dst, "double", &part))?;
            match (dst.selector, &mut value) {
                (Selector::Component(i), Value::Double3(c)) => c[usize::from(i)] = part,
                (Selector::Element(j), Value::DoubleArray(a)) => {
                    let j = j as usize;
                    if a.len() <= j {
                        a.resize(j + 1, 0.0);
                    }
                    a[j] = part;
                }
                _ => {}
            }
        }
        Ok(value)
    }

    /// Evaluated whole attribute by name
    pub(crate) fn input(&self, node: NodeId, name: &str, depth: usize) -> SceneResult<Value> {
        let key = self.attr_key(node, name)?;
        self.read(key, depth + 1)
    }

    pub(crate) fn input_f64(&self, node: NodeId, name: &str, depth: usize) -> SceneResult<f64> {
        let value = self.input(node, name, depth)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch_named(node, name, "double", &value))
    }

    pub(crate) fn input_i64(&self, node: NodeId, name: &str, depth: usize) -> SceneResult<i64> {
        let value = self.input(node, name, depth)?;
        value
            .as_i64()
            .ok_or_else(|| self.mismatch_named(node, name, "int", &value))
    }

    pub(crate) fn input_bool(&self, node: NodeId, name: &str, depth: usize) -> SceneResult<bool> {
        let value = self.input(node, name, depth)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch_named(node, name, "bool", &value))
    }

    pub(crate) fn input_vec3(
        &self,
        node: NodeId,
        name: &str,
        depth: usize,
    ) -> SceneResult<Vector3<f64>> {
        let value = self.input(node, name, depth)?;
        value
            .as_vector3()
            .ok_or_else(|| self.mismatch_named(node, name, "double3", &value))
    }

    pub(crate) fn input_matrix(
        &self,
        node: NodeId,
        name: &str,
        depth: usize,
    ) -> SceneResult<Matrix4<f64>> {
        let value = self.input(node, name, depth)?;
        value
            .as_matrix()
            .ok_or_else(|| self.mismatch_named(node, name, "matrix", &value))
    }

    fn input_array(&self, node: NodeId, name: &str, depth: usize) -> SceneResult<Vec<f64>> {
        let value = self.input(node, name, depth)?;
        match value {
            Value::DoubleArray(a) => Ok(a),
            other => Err(self.mismatch_named(node, name, "doubleArray", &other)),
        }
    }

    fn mismatch_named(
        &self,
        node: NodeId,
        name: &str,
        expected: &'static str,
        found: &Value,
    ) -> SceneError {
        SceneError::TypeMismatch {
            plug: format!("{}.{name}", self.label(node)),
            expected,
            found: found.type_name(),
        }
    }

    fn compute(&self, key: PlugKey, depth: usize) -> SceneResult<Value> {
        let id = key.node;
        let kind = self.node(id)?.kind;
        let name = self.attr_name(key.attr);
        match (kind, name) {
            (_, "matrix") => Ok(Value::Matrix(self.local_matrix(id, depth)?)),
            (_, "worldMatrix") => Ok(Value::Matrix(self.world_matrix_at(id, depth)?)),
            (_, "parentMatrix") => Ok(Value::Matrix(self.parent_world(id, depth)?)),
            (k, _) if k.is_constraint() => self.constraint_output(id, name, depth),
            (NodeType::BlendColors, _) => {
                let out = blend_colors(
                    &self.input_vec3(id, "color1", depth)?,
                    &self.input_vec3(id, "color2", depth)?,
                    self.input_f64(id, "blender", depth)?,
                );
                Ok(out.into())
            }
            (NodeType::DistanceBetween, _) => {
                let m1 = self.input_matrix(id, "inMatrix1", depth)?;
                let m2 = self.input_matrix(id, "inMatrix2", depth)?;
                let p1 = Point3::from(self.input_vec3(id, "point1", depth)?);
                let p2 = Point3::from(self.input_vec3(id, "point2", depth)?);
                Ok(Value::Double(
                    (m1.transform_point(&p1) - m2.transform_point(&p2)).norm(),
                ))
            }
            (NodeType::Condition, _) => {
                let out = condition(
                    self.input_i64(id, "operation", depth)?,
                    self.input_f64(id, "firstTerm", depth)?,
                    self.input_f64(id, "secondTerm", depth)?,
                    self.input_vec3(id, "colorIfTrue", depth)?,
                    self.input_vec3(id, "colorIfFalse", depth)?,
                );
                Ok(out.into())
            }
            (NodeType::MultiplyDivide, _) => {
                let out = multiply_divide(
                    self.input_i64(id, "operation", depth)?,
                    &self.input_vec3(id, "input1", depth)?,
                    &self.input_vec3(id, "input2", depth)?,
                );
                Ok(out.into())
            }
            (NodeType::BlendTwoAttr, _) => {
                let inputs = self.input_array(id, "input", depth)?;
                let blender = self.input_f64(id, "attributesBlender", depth)?;
                Ok(Value::Double(blend_two(&inputs, blender)))
            }
            (NodeType::PlusMinusAverage, _) => {
                let inputs = self.input_array(id, "input1D", depth)?;
                let operation = self.input_i64(id, "operation", depth)?;
                Ok(Value::Double(plus_minus_average(operation, &inputs)))
            }
            (NodeType::MultDoubleLinear, _) => Ok(Value::Double(
                self.input_f64(id, "input1", depth)? * self.input_f64(id, "input2", depth)?,
            )),
            (NodeType::Reverse, _) => {
                let input = self.input_vec3(id, "input", depth)?;
                Ok(input.map(|v| 1.0 - v).into())
            }
            (NodeType::DecomposeMatrix, _) => {
                let (t, r, s) = decompose(&self.input_matrix(id, "inputMatrix", depth)?);
                let out = match name {
                    "outputTranslate" => t,
                    "outputRotate" => r,
                    _ => s,
                };
                Ok(out.into())
            }
            _ => Ok(self.attribute(key)?.value.clone()),
        }
    }

    fn constraint_output(&self, id: NodeId, name: &str, depth: usize) -> SceneResult<Value> {
        let NodeData::Constraint {
            kind,
            driver,
            driven,
            offset,
        } = &self.node(id)?.data
        else {
            return Ok(Value::Double3([0.0; 3]));
        };
        let (translate, rotate) = match kind {
            ConstraintKind::Point => {
                let mut target = self.world_pivot_at(*driver, depth + 1)?;
                if let ConstraintOffset::Translation(delta) = offset {
                    target += *delta;
                }
                (self.translate_for_pivot(*driven, &target, depth + 1)?, None)
            }
            ConstraintKind::Parent => {
                let mut desired = self.world_matrix_at(*driver, depth + 1)?;
                if let ConstraintOffset::Matrix(m) = offset {
                    desired = desired * m;
                }
                let parent = self.parent_world(*driven, depth + 1)?;
                let local = invert(&parent, &self.label(*driven))? * desired;
                let channels = self.channels_from_local(*driven, &local, depth + 1)?;
                (channels.translate, Some(channels.rotate))
            }
            ConstraintKind::PoleVector => {
                let start = match &self.node(*driven)?.data {
                    NodeData::IkHandle { start, .. } => *start,
                    _ => *driven,
                };
                let pole = self.world_pivot_at(*driver, depth + 1)?;
                let root = translation_part(&self.world_matrix_at(start, depth + 1)?);
                (pole.coords - root, None)
            }
        };
        let out = match name {
            "constraintRotate" => rotate.unwrap_or_else(Vector3::zeros),
            _ => translate,
        };
        Ok(out.into())
    }

    /// Inverse parent scale for joints compensating segment scale
    fn compensation(&self, id: NodeId, depth: usize) -> SceneResult<Vector3<f64>> {
        let node = self.node(id)?;
        if node.kind != NodeType::Joint || !self.input_bool(id, "segmentScaleCompensate", depth)? {
            return Ok(Vector3::repeat(1.0));
        }
        match node.parent {
            Some(parent) if self.node(parent)?.kind == NodeType::Joint => {
                Ok(self.input_vec3(parent, "scale", depth)?)
            }
            _ => Ok(Vector3::repeat(1.0)),
        }
    }

    fn joint_orient(&self, id: NodeId, depth: usize) -> SceneResult<Matrix3<f64>> {
        if self.node(id)?.kind == NodeType::Joint {
            let orient = self.input_vec3(id, "jointOrient", depth)?;
            Ok(*rotation_from_degrees(&orient).matrix())
        } else {
            Ok(Matrix3::identity())
        }
    }

    /// Linear block between the pivot translations: `IS · JO · R · S`
    fn channel_linear(
        &self,
        id: NodeId,
        rotate: &Vector3<f64>,
        scale: &Vector3<f64>,
        depth: usize,
    ) -> SceneResult<Matrix3<f64>> {
        let parent_scale = self.compensation(id, depth)?;
        let orient = self.joint_orient(id, depth)?;
        Ok(Matrix3::from_diagonal(&inverse_scale(&parent_scale))
            * orient
            * rotation_from_degrees(rotate).matrix()
            * Matrix3::from_diagonal(scale))
    }

    /// Local matrix without the offset parent matrix
    pub(crate) fn channel_matrix(&self, id: NodeId, depth: usize) -> SceneResult<Matrix4<f64>> {
        let translate = self.input_vec3(id, "translate", depth)?;
        let rotate = self.input_vec3(id, "rotate", depth)?;
        let scale = self.input_vec3(id, "scale", depth)?;
        let pivot = self.input_vec3(id, "rotatePivot", depth)?;
        let linear = self.channel_linear(id, &rotate, &scale, depth)?;
        Ok(pivot_matrix(&linear, &translate, &pivot))
    }

    pub(crate) fn local_matrix(&self, id: NodeId, depth: usize) -> SceneResult<Matrix4<f64>> {
        let opm = self.input_matrix(id, "offsetParentMatrix", depth)?;
        Ok(opm * self.channel_matrix(id, depth)?)
    }

    /// World matrix of the parent, identity at world level or when the node
    /// does not inherit its parent's transform
    pub(crate) fn parent_world(&self, id: NodeId, depth: usize) -> SceneResult<Matrix4<f64>> {
        let node = self.node(id)?;
        if !node.kind.is_dag() || !self.input_bool(id, "inheritsTransform", depth)? {
            return Ok(Matrix4::identity());
        }
        match node.parent {
            Some(parent) => self.world_matrix_at(parent, depth + 1),
            None => Ok(Matrix4::identity()),
        }
    }

    pub(crate) fn world_matrix_at(&self, id: NodeId, depth: usize) -> SceneResult<Matrix4<f64>> {
        let key = self.attr_key(id, "worldMatrix")?;
        self.depth_check(key, depth)?;
        Ok(self.parent_world(id, depth + 1)? * self.local_matrix(id, depth + 1)?)
    }

    pub(crate) fn world_pivot_at(&self, id: NodeId, depth: usize) -> SceneResult<Point3<f64>> {
        let pivot = Point3::from(self.input_vec3(id, "rotatePivot", depth)?);
        Ok(self.world_matrix_at(id, depth + 1)?.transform_point(&pivot))
    }

    /// Translate that puts the node's pivot at a world position
    pub(crate) fn translate_for_pivot(
        &self,
        id: NodeId,
        target: &Point3<f64>,
        depth: usize,
    ) -> SceneResult<Vector3<f64>> {
        let space = self.parent_world(id, depth + 1)?
            * self.input_matrix(id, "offsetParentMatrix", depth)?;
        let local = invert(&space, &self.label(id))?.transform_point(target);
        Ok(local.coords - self.input_vec3(id, "rotatePivot", depth)?)
    }

    /// Channels that reproduce a local matrix, given the node's pivot,
    /// offset parent matrix, joint orient and scale compensation
    pub(crate) fn channels_from_local(
        &self,
        id: NodeId,
        local: &Matrix4<f64>,
        depth: usize,
    ) -> SceneResult<Channels> {
        let opm = self.input_matrix(id, "offsetParentMatrix", depth)?;
        let x = invert(&opm, &self.label(id))? * local;
        let linear = linear_part(&x);
        let parent_scale = self.compensation(id, depth)?;
        let uncompensated = Matrix3::from_diagonal(&parent_scale) * linear;
        let (total, scale) = split_rotation_scale(&uncompensated);
        let orient = self.joint_orient(id, depth)?;
        let rotation = orthonormalize(&(orient.transpose() * total.matrix()));
        let pivot = self.input_vec3(id, "rotatePivot", depth)?;
        Ok(Channels {
            translate: translation_part(&x) - pivot + linear * pivot,
            rotate: degrees_from_rotation(&rotation),
            scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_colors_weights_first_input() {
        let out = blend_colors(&Vector3::new(10.0, 0.0, 0.0), &Vector3::new(0.0, 0.0, 4.0), 0.25);
        assert!((out.x - 2.5).abs() < 1e-12);
        assert!((out.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn condition_greater_or_equal_gates() {
        let t = Vector3::new(2.0, 0.0, 0.0);
        let f = Vector3::repeat(1.0);
        assert_eq!(condition(3, 5.0, 5.0, t, f), t);
        assert_eq!(condition(3, 4.0, 5.0, t, f), f);
        assert_eq!(condition(4, 4.0, 5.0, t, f), t);
    }

    #[test]
    fn multiply_divide_operations() {
        let a = Vector3::new(6.0, 2.0, 3.0);
        let b = Vector3::new(3.0, 2.0, 1.0);
        assert_eq!(multiply_divide(1, &a, &b), Vector3::new(18.0, 4.0, 3.0));
        assert_eq!(multiply_divide(2, &a, &b), Vector3::new(2.0, 1.0, 3.0));
        let pow = multiply_divide(3, &a, &b);
        assert!((pow - Vector3::new(216.0, 4.0, 3.0)).norm() < 1e-9);
        assert_eq!(multiply_divide(0, &a, &b), a);
    }

    #[test]
    fn plus_minus_average_operations() {
        assert_eq!(plus_minus_average(1, &[1.0, 2.0, -1.0]), 2.0);
        assert_eq!(plus_minus_average(2, &[5.0, 2.0, 1.0]), 2.0);
        assert_eq!(plus_minus_average(3, &[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(plus_minus_average(1, &[]), 0.0);
    }

    #[test]
    fn blend_two_handles_missing_inputs() {
        assert_eq!(blend_two(&[1.0, 3.0], 0.5), 2.0);
        assert_eq!(blend_two(&[1.0], 1.0), 0.0);
    }

    #[test]
    fn coercion_follows_destination_type() {
        let v = coerce(Value::Double(0.7), &Value::Bool(false), "x").unwrap();
        assert_eq!(v, Value::Bool(true));
        let err = coerce(Value::Double(1.0), &Value::Double3([0.0; 3]), "x").unwrap_err();
        assert!(matches!(err, SceneError::TypeMismatch { .. }));
    }
}
