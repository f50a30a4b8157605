//! Limb Scene - transform hierarchy and dependency graph runtime
//!
//! The runtime a rig is synthesized into:
//! - Transform, joint, curve, locator and handle nodes in a DAG hierarchy
//! - Attributes with per-component lock/keyable state and clamped ranges
//! - Plug connections forming an acyclic dependency graph
//! - Pull evaluation of utility nodes, constraints and world matrices
//!
//! # Example
//!
//! ```rust
//! use limb_scene::prelude::*;
//!
//! # fn example() -> Result<(), SceneError> {
//! let mut scene = Scene::new();
//! let a = scene.create_node(NodeType::Transform, "a", None)?;
//! let b = scene.create_node(NodeType::Transform, "b", None)?;
//! scene.connect(&a.plug("translateX"), &b.plug("translateY"))?;
//! scene.set_f64(&a.plug("translateX"), 4.0)?;
//! assert_eq!(scene.get_f64(&b.plug("translateY"))?, 4.0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(unreachable_pub)]

pub mod attr;
pub mod error;
mod eval;
pub mod graph;
pub mod math;
pub mod plug;
pub mod scene;
pub mod types;
pub mod value;

pub use attr::{AttrSpec, AttrState};
pub use error::{SceneError, SceneResult};
pub use eval::MAX_EVAL_DEPTH;
pub use graph::SceneGraph;
pub use plug::Plug;
pub use scene::Scene;
pub use types::{ConstraintKind, CurveShape, FreezeMask, IkSolver, NodeId, NodeType};
pub use value::Value;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building into a scene
    pub use crate::{
        AttrSpec, AttrState, ConstraintKind, CurveShape, FreezeMask, IkSolver, NodeId, NodeType,
        Plug, Scene, SceneError, SceneGraph, SceneResult, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
