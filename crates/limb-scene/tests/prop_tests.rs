use limb_scene::prelude::*;
use nalgebra::Vector3;
use proptest::prelude::*;

fn vec3(range: std::ops::Range<f64>) -> impl Strategy<Value = Vector3<f64>> {
    (range.clone(), range.clone(), range).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

proptest! {
    #[test]
    fn reparenting_preserves_world_matrix(
        parent_t in vec3(-50.0..50.0),
        parent_r in vec3(-180.0..180.0),
        parent_s in 0.5f64..3.0,
        child_t in vec3(-50.0..50.0),
        child_r in vec3(-180.0..180.0),
    ) {
        let mut scene = Scene::new();
        let parent = scene.create_node(NodeType::Transform, "parent", None).unwrap();
        let child = scene.create_node(NodeType::Transform, "child", None).unwrap();
        scene.set_vector3(&parent.plug("translate"), parent_t).unwrap();
        scene.set_vector3(&parent.plug("rotate"), parent_r).unwrap();
        scene.set_vector3(&parent.plug("scale"), Vector3::repeat(parent_s)).unwrap();
        scene.set_vector3(&child.plug("translate"), child_t).unwrap();
        scene.set_vector3(&child.plug("rotate"), child_r).unwrap();
        let before = scene.world_matrix(child).unwrap();

        scene.set_parent(child, Some(parent)).unwrap();

        let after = scene.world_matrix(child).unwrap();
        prop_assert!((before - after).norm() < 1e-6);
    }

    #[test]
    fn freezing_a_curve_never_moves_its_points(
        t in vec3(-20.0..20.0),
        r in vec3(-180.0..180.0),
        s in vec3(0.2..4.0),
    ) {
        let mut scene = Scene::new();
        let shape = CurveShape::closed(
            vec![
                nalgebra::Point3::new(1.0, 0.0, 0.0),
                nalgebra::Point3::new(0.0, 1.0, 0.0),
                nalgebra::Point3::new(0.0, 0.0, 1.0),
            ],
            3,
        );
        let curve = scene.create_curve("crv", shape, None).unwrap();
        scene.set_vector3(&curve.plug("translate"), t).unwrap();
        scene.set_vector3(&curve.plug("rotate"), r).unwrap();
        scene.set_vector3(&curve.plug("scale"), s).unwrap();
        let before = scene.curve_points(curve).unwrap();
        let pivot = scene.world_pivot(curve).unwrap();

        scene.freeze_transform(curve, FreezeMask::ALL).unwrap();

        let after = scene.curve_points(curve).unwrap();
        for (a, b) in before.iter().zip(&after) {
            prop_assert!((a - b).norm() < 1e-6);
        }
        prop_assert!((scene.world_pivot(curve).unwrap() - pivot).norm() < 1e-6);
    }
}
