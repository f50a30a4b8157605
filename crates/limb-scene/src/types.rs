use crate::plug::Plug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in a scene
///
/// Handles are never reused within one scene, so a handle to a deleted node
/// stays invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Plug on this node
    #[must_use]
    pub fn plug(self, attr: impl Into<String>) -> Plug {
        Plug::new(self, attr)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    /// Empty transform (group)
    Transform,
    /// Skeleton joint
    Joint,
    /// Locator transform
    Locator,
    /// Transform carrying a NURBS curve shape
    Curve,
    /// IK handle
    IkHandle,
    /// Cluster deformer handle
    ClusterHandle,
    /// Point constraint
    PointConstraint,
    /// Parent constraint
    ParentConstraint,
    /// Pole-vector constraint
    PoleVectorConstraint,
    /// Per-component linear blend of two colors
    BlendColors,
    /// Distance between two points or matrices
    DistanceBetween,
    /// Two-term comparison selecting one of two colors
    Condition,
    /// Component-wise multiply/divide/power
    MultiplyDivide,
    /// Weighted blend of two scalars
    BlendTwoAttr,
    /// Sum/difference/average of scalars
    PlusMinusAverage,
    /// Product of two scalars
    MultDoubleLinear,
    /// One minus each component
    Reverse,
    /// Matrix to translate/rotate/scale
    DecomposeMatrix,
}

impl NodeType {
    /// Nodes that live in the transform hierarchy
    #[must_use]
    pub fn is_dag(self) -> bool {
        matches!(
            self,
            NodeType::Transform
                | NodeType::Joint
                | NodeType::Locator
                | NodeType::Curve
                | NodeType::IkHandle
                | NodeType::ClusterHandle
        )
    }

    /// Constraint node types
    #[must_use]
    pub fn is_constraint(self) -> bool {
        matches!(
            self,
            NodeType::PointConstraint | NodeType::ParentConstraint | NodeType::PoleVectorConstraint
        )
    }

    /// Dependency-graph utility nodes
    #[must_use]
    pub fn is_utility(self) -> bool {
        !self.is_dag() && !self.is_constraint()
    }

    /// Short type name, as used in reports
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Transform => "transform",
            NodeType::Joint => "joint",
            NodeType::Locator => "locator",
            NodeType::Curve => "nurbsCurve",
            NodeType::IkHandle => "ikHandle",
            NodeType::ClusterHandle => "clusterHandle",
            NodeType::PointConstraint => "pointConstraint",
            NodeType::ParentConstraint => "parentConstraint",
            NodeType::PoleVectorConstraint => "poleVectorConstraint",
            NodeType::BlendColors => "blendColors",
            NodeType::DistanceBetween => "distanceBetween",
            NodeType::Condition => "condition",
            NodeType::MultiplyDivide => "multiplyDivide",
            NodeType::BlendTwoAttr => "blendTwoAttr",
            NodeType::PlusMinusAverage => "plusMinusAverage",
            NodeType::MultDoubleLinear => "multDoubleLinear",
            NodeType::Reverse => "reverse",
            NodeType::DecomposeMatrix => "decomposeMatrix",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control points of a curve shape, in object space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveShape {
    /// Control vertices
    pub points: Vec<Point3<f64>>,
    /// Curve degree (1 = polyline)
    pub degree: u8,
    /// Periodic curve (last point connects back to the first)
    pub closed: bool,
}

impl CurveShape {
    /// Open curve through the given points
    #[must_use]
    pub fn open(points: Vec<Point3<f64>>, degree: u8) -> Self {
        Self {
            points,
            degree,
            closed: false,
        }
    }

    /// Closed curve through the given points
    #[must_use]
    pub fn closed(points: Vec<Point3<f64>>, degree: u8) -> Self {
        Self {
            points,
            degree,
            closed: true,
        }
    }
}

/// IK solver used by an IK handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IkSolver {
    /// Single-chain solver
    SingleChain,
    /// Rotate-plane solver (pole vector aware)
    RotatePlane,
}

/// Constraint flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Position only
    Point,
    /// Position and orientation
    Parent,
    /// IK handle pole vector
    PoleVector,
}

impl ConstraintKind {
    /// Node type created for this constraint
    #[must_use]
    pub fn node_type(self) -> NodeType {
        match self {
            ConstraintKind::Point => NodeType::PointConstraint,
            ConstraintKind::Parent => NodeType::ParentConstraint,
            ConstraintKind::PoleVector => NodeType::PoleVectorConstraint,
        }
    }

    /// Name stem; created constraints are named `{driven}_{stem}{n}`
    #[must_use]
    pub fn stem(self) -> &'static str {
        match self {
            ConstraintKind::Point => "pointConstraint",
            ConstraintKind::Parent => "parentConstraint",
            ConstraintKind::PoleVector => "poleVectorConstraint",
        }
    }
}

/// Which channels a freeze bakes into the rest pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FreezeMask {
    /// Bake translation
    pub translate: bool,
    /// Bake rotation (joints: into the joint orient)
    pub rotate: bool,
    /// Bake scale
    pub scale: bool,
}

impl FreezeMask {
    /// Translate, rotate and scale
    pub const ALL: FreezeMask = FreezeMask {
        translate: true,
        rotate: true,
        scale: true,
    };

    /// Rotation only
    pub const ROTATE: FreezeMask = FreezeMask {
        translate: false,
        rotate: true,
        scale: false,
    };
}
