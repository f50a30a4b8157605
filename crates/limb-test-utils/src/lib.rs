//! Testing utilities for the limb rig workspace
//!
//! Guide layouts, ready-made scenes and numeric assertions.

#![allow(missing_docs)]

use limb_rig::{build, BuildSpec, GuideSet, LimbRig};
use limb_scene::{NodeId, NodeType, Plug, Scene, SceneGraph};
use nalgebra::{Point3, Vector3};

pub const EPSILON: f64 = 1e-6;

/// Three segment guides and a pole-vector guide, world positions
#[derive(Debug, Clone, PartialEq)]
pub struct GuideLayout {
    pub segments: [[f64; 3]; 3],
    pub pole_vector: [f64; 3],
}

impl GuideLayout {
    /// Arm along +X, ten units per segment, pole vector behind the elbow
    pub fn straight_x() -> Self {
        Self {
            segments: [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [20.0, 0.0, 0.0]],
            pole_vector: [10.0, 0.0, -10.0],
        }
    }

    /// Slightly bent arm, elbow pushed back
    pub fn bent() -> Self {
        Self {
            segments: [[0.0, 15.0, 0.0], [8.0, 14.0, -2.0], [16.0, 15.0, 0.0]],
            pole_vector: [8.0, 14.0, -12.0],
        }
    }

    pub fn upper_length(&self) -> f64 {
        distance(self.segments[0], self.segments[1])
    }

    pub fn lower_length(&self) -> f64 {
        distance(self.segments[1], self.segments[2])
    }

    pub fn rest_length(&self) -> f64 {
        self.upper_length() + self.lower_length()
    }

    /// Create locator guides named `{prefix}_{i}_GDE` and `{prefix}_pv_GDE`
    pub fn create(&self, scene: &mut Scene, prefix: &str) -> GuideSet {
        let segments = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, p)| locator(scene, &format!("{prefix}_{i}_GDE"), *p))
            .collect();
        let pv = locator(scene, &format!("{prefix}_pv_GDE"), self.pole_vector);
        GuideSet::new(segments, Some(pv))
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    (Point3::from(b) - Point3::from(a)).norm()
}

pub fn locator(scene: &mut Scene, name: &str, translate: [f64; 3]) -> NodeId {
    let node = scene.create_node(NodeType::Locator, name, None).unwrap();
    scene
        .set_vector3(&node.plug("translate"), Vector3::from(translate))
        .unwrap();
    node
}

/// L/arm, shoulder/elbow/wrist, primary +X, up +Y
pub fn default_spec() -> BuildSpec {
    BuildSpec::default()
}

/// Scene with straight-arm guides and a built rig
pub fn built_arm(spec: BuildSpec) -> (Scene, LimbRig) {
    let mut scene = Scene::new();
    let guides = GuideLayout::straight_x().create(&mut scene, "arm");
    let rig = build(&mut scene, spec, guides).unwrap();
    (scene, rig)
}

pub fn node(scene: &Scene, name: &str) -> NodeId {
    scene
        .find(name)
        .unwrap_or_else(|| panic!("expected node {name:?} in scene"))
}

pub fn get(scene: &Scene, plug: &Plug) -> f64 {
    scene.get_f64(plug).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

pub fn assert_point(actual: Point3<f64>, expected: [f64; 3]) {
    let expected = Point3::from(expected);
    assert!(
        (actual - expected).norm() < EPSILON,
        "expected {expected:?}, got {actual:?}"
    );
}
