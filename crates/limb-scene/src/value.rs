//! Attribute values

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// Value stored in or computed for an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// Integer / enum
    Int(i64),
    /// Scalar
    Double(f64),
    /// Three-component vector or color
    Double3([f64; 3]),
    /// Sparse-free scalar array (multi attribute)
    DoubleArray(Vec<f64>),
    /// 4x4 transform matrix
    Matrix(Matrix4<f64>),
    /// Text
    String(String),
}

impl Value {
    /// Type name used in error messages
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Double3(_) => "double3",
            Value::DoubleArray(_) => "doubleArray",
            Value::Matrix(_) => "matrix",
            Value::String(_) => "string",
        }
    }

    /// Numeric scalar view (bools read as 0/1)
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(v) => Some(*v as f64),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Boolean view; scalars round to the nearest of 0/1
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            Value::Double(v) => Some(*v >= 0.5),
            _ => None,
        }
    }

    /// Integer view; doubles truncate
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            #[allow(clippy::cast_possible_truncation)]
            Value::Double(v) => Some(*v as i64),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Three-component view
    #[must_use]
    pub fn as_double3(&self) -> Option<[f64; 3]> {
        match self {
            Value::Double3(v) => Some(*v),
            _ => None,
        }
    }

    /// Vector view of a three-component value
    #[must_use]
    pub fn as_vector3(&self) -> Option<Vector3<f64>> {
        self.as_double3().map(Vector3::from)
    }

    /// Matrix view
    #[must_use]
    pub fn as_matrix(&self) -> Option<Matrix4<f64>> {
        match self {
            Value::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    /// Text view
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Array view
    #[must_use]
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::DoubleArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Double3(v)
    }
}

impl From<Vector3<f64>> for Value {
    fn from(v: Vector3<f64>) -> Self {
        Value::Double3([v.x, v.y, v.z])
    }
}

impl From<Matrix4<f64>> for Value {
    fn from(m: Matrix4<f64>) -> Self {
        Value::Matrix(m)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}
