//! Attribute definitions, per-component state and the built-in catalog

use crate::types::NodeType;
use crate::value::Value;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// Lock / keyable state of one attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrState {
    /// Writes and incoming connections are refused
    pub locked: bool,
    /// Shown in the channel box and keyable by animators
    pub keyable: bool,
}

impl AttrState {
    pub(crate) const KEYABLE: AttrState = AttrState {
        locked: false,
        keyable: true,
    };

    pub(crate) const HIDDEN: AttrState = AttrState {
        locked: false,
        keyable: false,
    };
}

/// How the components of a three-component attribute are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComponentStyle {
    Scalar,
    Xyz,
    Rgb,
}

impl ComponentStyle {
    pub(crate) fn index_of(self, suffix: char) -> Option<usize> {
        match (self, suffix) {
            (ComponentStyle::Xyz, 'X') | (ComponentStyle::Rgb, 'R') => Some(0),
            (ComponentStyle::Xyz, 'Y') | (ComponentStyle::Rgb, 'G') => Some(1),
            (ComponentStyle::Xyz, 'Z') | (ComponentStyle::Rgb, 'B') => Some(2),
            _ => None,
        }
    }
}

/// Description of a dynamic attribute added to a node
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    pub(crate) default: Value,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) keyable: bool,
}

impl AttrSpec {
    /// Scalar attribute with a default value
    #[must_use]
    pub fn double(default: f64) -> Self {
        Self {
            default: Value::Double(default),
            min: None,
            max: None,
            keyable: false,
        }
    }

    /// Boolean attribute
    #[must_use]
    pub fn boolean(default: bool) -> Self {
        Self {
            default: Value::Bool(default),
            min: None,
            max: None,
            keyable: false,
        }
    }

    /// Text attribute (empty by default)
    #[must_use]
    pub fn string() -> Self {
        Self {
            default: Value::String(String::new()),
            min: None,
            max: None,
            keyable: false,
        }
    }

    /// Lower bound; writes below it are clamped
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Upper bound; writes above it are clamped
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Mark keyable
    #[must_use]
    pub fn keyable(mut self, keyable: bool) -> Self {
        self.keyable = keyable;
        self
    }
}

/// Stored attribute
#[derive(Debug, Clone)]
pub(crate) struct Attribute {
    pub(crate) value: Value,
    pub(crate) default: Value,
    pub(crate) style: ComponentStyle,
    pub(crate) states: Vec<AttrState>,
    pub(crate) min: Option<f64>,
    pub(crate) max: Option<f64>,
    pub(crate) computed: bool,
    pub(crate) dynamic: bool,
}

impl Attribute {
    fn stored(value: Value, style: ComponentStyle, state: AttrState) -> Self {
        let count = if matches!(style, ComponentStyle::Scalar) { 1 } else { 3 };
        Self {
            default: value.clone(),
            value,
            style,
            states: vec![state; count],
            min: None,
            max: None,
            computed: false,
            dynamic: false,
        }
    }

    fn channel(default: [f64; 3]) -> Self {
        Self::stored(Value::Double3(default), ComponentStyle::Xyz, AttrState::KEYABLE)
    }

    fn vector(default: [f64; 3], style: ComponentStyle) -> Self {
        Self::stored(Value::Double3(default), style, AttrState::HIDDEN)
    }

    fn scalar(value: Value) -> Self {
        Self::stored(value, ComponentStyle::Scalar, AttrState::HIDDEN)
    }

    fn output(placeholder: Value, style: ComponentStyle) -> Self {
        let mut attr = Self::stored(placeholder, style, AttrState::HIDDEN);
        attr.computed = true;
        attr
    }

    pub(crate) fn from_spec(spec: &AttrSpec) -> Self {
        let state = AttrState {
            locked: false,
            keyable: spec.keyable,
        };
        let mut attr = Self::stored(spec.default.clone(), ComponentStyle::Scalar, state);
        attr.min = spec.min;
        attr.max = spec.max;
        attr.dynamic = true;
        attr
    }

    /// Clamp a scalar into the attribute's range; returns the stored value and
    /// whether clamping happened.
    pub(crate) fn clamp(&self, value: f64) -> (f64, bool) {
        let mut out = value;
        if let Some(min) = self.min {
            out = out.max(min);
        }
        if let Some(max) = self.max {
            out = out.min(max);
        }
        #[allow(clippy::float_cmp)]
        let clamped = out != value;
        (out, clamped)
    }

    pub(crate) fn component_count(&self) -> usize {
        self.states.len()
    }
}

const ZERO: [f64; 3] = [0.0, 0.0, 0.0];
const ONE: [f64; 3] = [1.0, 1.0, 1.0];

fn transform_attributes(out: &mut Vec<(&'static str, Attribute)>) {
    out.push(("translate", Attribute::channel(ZERO)));
    out.push(("rotate", Attribute::channel(ZERO)));
    out.push(("scale", Attribute::channel(ONE)));
    out.push((
        "visibility",
        Attribute::stored(Value::Bool(true), ComponentStyle::Scalar, AttrState::KEYABLE),
    ));
    out.push(("rotatePivot", Attribute::vector(ZERO, ComponentStyle::Xyz)));
    out.push((
        "offsetParentMatrix",
        Attribute::scalar(Value::Matrix(Matrix4::identity())),
    ));
    out.push(("inheritsTransform", Attribute::scalar(Value::Bool(true))));
    out.push(("template", Attribute::scalar(Value::Bool(false))));
    out.push(("overrideEnabled", Attribute::scalar(Value::Bool(false))));
    out.push(("overrideRGBColors", Attribute::scalar(Value::Bool(false))));
    out.push(("overrideColorRGB", Attribute::vector(ZERO, ComponentStyle::Rgb)));
    let identity = Value::Matrix(Matrix4::identity());
    out.push(("matrix", Attribute::output(identity.clone(), ComponentStyle::Scalar)));
    out.push(("worldMatrix", Attribute::output(identity.clone(), ComponentStyle::Scalar)));
    out.push(("parentMatrix", Attribute::output(identity, ComponentStyle::Scalar)));
}

/// Built-in attributes for a node type, in declaration order
pub(crate) fn catalog(node_type: NodeType) -> Vec<(&'static str, Attribute)> {
    let mut out = Vec::new();
    if node_type.is_dag() {
        transform_attributes(&mut out);
    }
    match node_type {
        NodeType::Joint => {
            out.push(("jointOrient", Attribute::vector(ZERO, ComponentStyle::Xyz)));
            out.push(("segmentScaleCompensate", Attribute::scalar(Value::Bool(true))));
        }
        NodeType::IkHandle => {
            out.push(("poleVector", Attribute::vector([0.0, 1.0, 0.0], ComponentStyle::Xyz)));
        }
        NodeType::PointConstraint | NodeType::ParentConstraint | NodeType::PoleVectorConstraint => {
            out.push((
                "constraintTranslate",
                Attribute::output(Value::Double3(ZERO), ComponentStyle::Xyz),
            ));
            out.push((
                "constraintRotate",
                Attribute::output(Value::Double3(ZERO), ComponentStyle::Xyz),
            ));
        }
        NodeType::BlendColors => {
            out.push(("color1", Attribute::vector([1.0, 0.0, 0.0], ComponentStyle::Rgb)));
            out.push(("color2", Attribute::vector([0.0, 0.0, 1.0], ComponentStyle::Rgb)));
            out.push(("blender", Attribute::scalar(Value::Double(0.5))));
            out.push(("output", Attribute::output(Value::Double3(ZERO), ComponentStyle::Rgb)));
        }
        NodeType::DistanceBetween => {
            out.push(("point1", Attribute::vector(ZERO, ComponentStyle::Xyz)));
            out.push(("point2", Attribute::vector(ZERO, ComponentStyle::Xyz)));
            out.push(("inMatrix1", Attribute::scalar(Value::Matrix(Matrix4::identity()))));
            out.push(("inMatrix2", Attribute::scalar(Value::Matrix(Matrix4::identity()))));
            out.push(("distance", Attribute::output(Value::Double(0.0), ComponentStyle::Scalar)));
        }
        NodeType::Condition => {
            out.push(("operation", Attribute::scalar(Value::Int(0))));
            out.push(("firstTerm", Attribute::scalar(Value::Double(0.0))));
            out.push(("secondTerm", Attribute::scalar(Value::Double(0.0))));
            out.push(("colorIfTrue", Attribute::vector(ZERO, ComponentStyle::Rgb)));
            out.push(("colorIfFalse", Attribute::vector(ONE, ComponentStyle::Rgb)));
            out.push(("outColor", Attribute::output(Value::Double3(ZERO), ComponentStyle::Rgb)));
        }
        NodeType::MultiplyDivide => {
            out.push(("operation", Attribute::scalar(Value::Int(1))));
            out.push(("input1", Attribute::vector(ZERO, ComponentStyle::Xyz)));
            out.push(("input2", Attribute::vector(ONE, ComponentStyle::Xyz)));
            out.push(("output", Attribute::output(Value::Double3(ZERO), ComponentStyle::Xyz)));
        }
        NodeType::BlendTwoAttr => {
            out.push(("input", Attribute::scalar(Value::DoubleArray(Vec::new()))));
            out.push(("attributesBlender", Attribute::scalar(Value::Double(0.0))));
            out.push(("output", Attribute::output(Value::Double(0.0), ComponentStyle::Scalar)));
        }
        NodeType::PlusMinusAverage => {
            out.push(("operation", Attribute::scalar(Value::Int(1))));
            out.push(("input1D", Attribute::scalar(Value::DoubleArray(Vec::new()))));
            out.push(("output1D", Attribute::output(Value::Double(0.0), ComponentStyle::Scalar)));
        }
        NodeType::MultDoubleLinear => {
            out.push(("input1", Attribute::scalar(Value::Double(0.0))));
            out.push(("input2", Attribute::scalar(Value::Double(1.0))));
            out.push(("output", Attribute::output(Value::Double(0.0), ComponentStyle::Scalar)));
        }
        NodeType::Reverse => {
            out.push(("input", Attribute::vector(ZERO, ComponentStyle::Xyz)));
            out.push(("output", Attribute::output(Value::Double3(ZERO), ComponentStyle::Xyz)));
        }
        NodeType::DecomposeMatrix => {
            out.push(("inputMatrix", Attribute::scalar(Value::Matrix(Matrix4::identity()))));
            out.push((
                "outputTranslate",
                Attribute::output(Value::Double3(ZERO), ComponentStyle::Xyz),
            ));
            out.push((
                "outputRotate",
                Attribute::output(Value::Double3(ZERO), ComponentStyle::Xyz),
            ));
            out.push((
                "outputScale",
                Attribute::output(Value::Double3(ONE), ComponentStyle::Xyz),
            ));
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joints_extend_transform_catalog() {
        let names: Vec<_> = catalog(NodeType::Joint).into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"translate"));
        assert!(names.contains(&"jointOrient"));
        assert!(names.contains(&"worldMatrix"));
    }

    #[test]
    fn utilities_have_no_transform_channels() {
        let names: Vec<_> = catalog(NodeType::BlendColors).into_iter().map(|(n, _)| n).collect();
        assert!(!names.contains(&"translate"));
        assert_eq!(names, vec!["color1", "color2", "blender", "output"]);
    }

    #[test]
    fn clamp_respects_bounds() {
        let attr = Attribute::from_spec(&AttrSpec::double(1.0).min(0.0).max(1.0));
        assert_eq!(attr.clamp(2.0), (1.0, true));
        assert_eq!(attr.clamp(-1.0), (0.0, true));
        assert_eq!(attr.clamp(0.5), (0.5, false));
    }

    #[test]
    fn component_suffixes_follow_style() {
        assert_eq!(ComponentStyle::Xyz.index_of('Y'), Some(1));
        assert_eq!(ComponentStyle::Rgb.index_of('B'), Some(2));
        assert_eq!(ComponentStyle::Rgb.index_of('X'), None);
        assert_eq!(ComponentStyle::Scalar.index_of('X'), None);
    }
}
