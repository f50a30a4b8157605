use limb_scene::prelude::*;
use nalgebra::Vector3;
use pretty_assertions::assert_eq;

fn node(scene: &mut Scene, kind: NodeType, name: &str) -> NodeId {
    scene.create_node(kind, name, None).unwrap()
}

#[test]
fn test_component_connection_overlays_whole_read() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let b = node(&mut scene, NodeType::Transform, "b");
    scene
        .connect(&a.plug("translateX"), &b.plug("translateY"))
        .unwrap();
    scene.set_f64(&a.plug("translateX"), 7.0).unwrap();

    assert_eq!(
        scene.get_attr(&b.plug("translate")).unwrap(),
        Value::Double3([0.0, 7.0, 0.0])
    );
    assert_eq!(
        scene.source(&b.plug("translateY")).unwrap(),
        Some(a.plug("translateX"))
    );
    assert_eq!(scene.source(&b.plug("translateX")).unwrap(), None);
}

#[test]
fn test_connection_cycle_rejected() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let b = node(&mut scene, NodeType::Transform, "b");
    scene
        .connect(&a.plug("translateX"), &b.plug("translateX"))
        .unwrap();

    let result = scene.connect(&b.plug("translateY"), &a.plug("translateY"));
    assert!(matches!(result, Err(SceneError::CycleDetected { .. })));

    let self_loop = scene.connect(&a.plug("rotateX"), &a.plug("rotateY"));
    assert!(matches!(self_loop, Err(SceneError::CycleDetected { .. })));
}

#[test]
fn test_cycle_through_utility_node_rejected() {
    let mut scene = Scene::new();
    let mdl = node(&mut scene, NodeType::MultDoubleLinear, "mdl");
    let result = scene.connect(&mdl.plug("output"), &mdl.plug("input1"));
    assert!(matches!(result, Err(SceneError::CycleDetected { .. })));

    let loc = node(&mut scene, NodeType::Locator, "loc");
    let dcm = node(&mut scene, NodeType::DecomposeMatrix, "dcm");
    scene
        .connect(&loc.plug("matrix"), &dcm.plug("inputMatrix"))
        .unwrap();
    let result = scene.connect(&dcm.plug("outputTranslate"), &loc.plug("translate"));
    assert!(matches!(result, Err(SceneError::CycleDetected { .. })));
}

#[test]
fn test_same_node_attribute_to_channel_allowed() {
    let mut scene = Scene::new();
    let root = node(&mut scene, NodeType::Transform, "root");
    scene
        .add_attr(root, "globalScale", AttrSpec::double(1.0).min(0.001))
        .unwrap();
    for axis in ["X", "Y", "Z"] {
        scene
            .connect(&root.plug("globalScale"), &root.plug(format!("scale{axis}")))
            .unwrap();
    }
    scene.set_f64(&root.plug("globalScale"), 3.0).unwrap();
    assert_eq!(
        scene.get_vector3(&root.plug("scale")).unwrap(),
        Vector3::repeat(3.0)
    );
}

#[test]
fn test_destination_cannot_be_driven_twice() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let b = node(&mut scene, NodeType::Transform, "b");
    let c = node(&mut scene, NodeType::Transform, "c");
    scene.connect(&a.plug("translate"), &c.plug("translate")).unwrap();

    let again = scene.connect(&b.plug("translate"), &c.plug("translate"));
    assert!(matches!(again, Err(SceneError::AlreadyConnected(_))));

    let component = scene.connect(&b.plug("translateX"), &c.plug("translateY"));
    assert!(matches!(component, Err(SceneError::AlreadyConnected(_))));
}

#[test]
fn test_locked_and_driven_plugs_refuse_writes() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let b = node(&mut scene, NodeType::Transform, "b");
    scene
        .set_attr_state(&b.plug("translateX"), Some(true), Some(false))
        .unwrap();

    assert!(matches!(
        scene.set_f64(&b.plug("translateX"), 1.0),
        Err(SceneError::LockedAttribute(_))
    ));
    assert!(matches!(
        scene.connect(&a.plug("translateX"), &b.plug("translateX")),
        Err(SceneError::LockedAttribute(_))
    ));
    scene.set_f64(&b.plug("translateY"), 1.0).unwrap();

    let state = scene.attr_state(&b.plug("translateX")).unwrap();
    assert!(state.locked && !state.keyable);
    let whole = scene.attr_state(&b.plug("translate")).unwrap();
    assert!(!whole.locked);

    scene
        .set_attr_state(&b.plug("translate"), Some(true), Some(false))
        .unwrap();
    scene
        .set_attr_state(&b.plug("translate"), Some(true), Some(false))
        .unwrap();
    assert!(scene.attr_state(&b.plug("translate")).unwrap().locked);
}

#[test]
fn test_computed_outputs_are_read_only() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let rev = node(&mut scene, NodeType::Reverse, "rev");

    assert!(matches!(
        scene.set_attr(&a.plug("worldMatrix"), Value::Matrix(nalgebra::Matrix4::identity())),
        Err(SceneError::ReadOnly(_))
    ));
    assert!(matches!(
        scene.connect(&a.plug("translateX"), &rev.plug("outputX")),
        Err(SceneError::ReadOnly(_))
    ));
}

#[test]
fn test_type_mismatch_on_connect() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let b = node(&mut scene, NodeType::Transform, "b");
    let result = scene.connect(&a.plug("worldMatrix"), &b.plug("translateX"));
    assert!(matches!(result, Err(SceneError::TypeMismatch { .. })));
}

#[test]
fn test_unknown_attribute_reported() {
    let mut scene = Scene::new();
    let a = node(&mut scene, NodeType::Transform, "a");
    let err = scene.get_attr(&a.plug("translateW")).unwrap_err();
    assert!(err.is_reference_error());
    assert!(!scene.has_attr(&a.plug("fkIk")));
    assert!(scene.has_attr(&a.plug("overrideColorRGBG")));
}

#[test]
fn test_dynamic_attribute_clamps_into_range() {
    let mut scene = Scene::new();
    let ctrl = node(&mut scene, NodeType::Curve, "ctrl");
    scene
        .add_attr(ctrl, "fkIk", AttrSpec::double(1.0).min(0.0).max(1.0).keyable(true))
        .unwrap();

    assert_eq!(scene.get_f64(&ctrl.plug("fkIk")).unwrap(), 1.0);
    assert!(scene.attr_state(&ctrl.plug("fkIk")).unwrap().keyable);
    scene.set_f64(&ctrl.plug("fkIk"), 2.5).unwrap();
    assert_eq!(scene.get_f64(&ctrl.plug("fkIk")).unwrap(), 1.0);
    scene.set_f64(&ctrl.plug("fkIk"), -1.0).unwrap();
    assert_eq!(scene.get_f64(&ctrl.plug("fkIk")).unwrap(), 0.0);

    let dup = scene.add_attr(ctrl, "fkIk", AttrSpec::double(0.0));
    assert!(matches!(dup, Err(SceneError::AttributeExists { .. })));
    let shadow = scene.add_attr(ctrl, "translateX", AttrSpec::double(0.0));
    assert!(matches!(shadow, Err(SceneError::AttributeExists { .. })));
}

#[test]
fn test_string_attribute_round_trip() {
    let mut scene = Scene::new();
    let ctrl = node(&mut scene, NodeType::Curve, "ctrl");
    scene
        .add_attr(ctrl, "controlType", AttrSpec::string())
        .unwrap();
    scene
        .set_attr(&ctrl.plug("controlType"), Value::from("L_arm_fk"))
        .unwrap();
    assert_eq!(scene.get_string(&ctrl.plug("controlType")).unwrap(), "L_arm_fk");
}

#[test]
fn test_bool_destination_coerces_scalar() {
    let mut scene = Scene::new();
    let src = node(&mut scene, NodeType::Transform, "src");
    let dst = node(&mut scene, NodeType::Transform, "dst");
    scene
        .connect(&src.plug("translateX"), &dst.plug("visibility"))
        .unwrap();

    scene.set_f64(&src.plug("translateX"), 0.4).unwrap();
    assert!(!scene.get_bool(&dst.plug("visibility")).unwrap());
    scene.set_f64(&src.plug("translateX"), 0.6).unwrap();
    assert!(scene.get_bool(&dst.plug("visibility")).unwrap());
}

#[test]
fn test_blend_colors_node() {
    let mut scene = Scene::new();
    let bcn = node(&mut scene, NodeType::BlendColors, "bcn");
    scene
        .set_vector3(&bcn.plug("color1"), Vector3::new(10.0, 0.0, 0.0))
        .unwrap();
    scene
        .set_vector3(&bcn.plug("color2"), Vector3::new(0.0, 4.0, 0.0))
        .unwrap();

    scene.set_f64(&bcn.plug("blender"), 1.0).unwrap();
    assert_eq!(
        scene.get_vector3(&bcn.plug("output")).unwrap(),
        Vector3::new(10.0, 0.0, 0.0)
    );
    scene.set_f64(&bcn.plug("blender"), 0.0).unwrap();
    assert_eq!(scene.get_f64(&bcn.plug("outputG")).unwrap(), 4.0);
}

#[test]
fn test_stretch_style_utility_chain() {
    let mut scene = Scene::new();
    let start = node(&mut scene, NodeType::Locator, "start");
    let end = node(&mut scene, NodeType::Locator, "end");
    let dst = node(&mut scene, NodeType::DistanceBetween, "dst");
    let mdn = node(&mut scene, NodeType::MultiplyDivide, "mdn");
    let cnd = node(&mut scene, NodeType::Condition, "cnd");
    scene.set_f64(&end.plug("translateX"), 30.0).unwrap();

    scene
        .connect(&start.plug("worldMatrix"), &dst.plug("inMatrix1"))
        .unwrap();
    scene
        .connect(&end.plug("worldMatrix"), &dst.plug("inMatrix2"))
        .unwrap();
    scene.set_attr(&mdn.plug("operation"), Value::Int(2)).unwrap();
    scene.connect(&dst.plug("distance"), &mdn.plug("input1X")).unwrap();
    scene.set_f64(&mdn.plug("input2X"), 20.0).unwrap();
    scene.set_attr(&cnd.plug("operation"), Value::Int(3)).unwrap();
    scene.connect(&dst.plug("distance"), &cnd.plug("firstTerm")).unwrap();
    scene.set_f64(&cnd.plug("secondTerm"), 20.0).unwrap();
    scene
        .connect(&mdn.plug("outputX"), &cnd.plug("colorIfTrueR"))
        .unwrap();

    assert!((scene.get_f64(&cnd.plug("outColorR")).unwrap() - 1.5).abs() < 1e-12);

    scene.set_f64(&end.plug("translateX"), 10.0).unwrap();
    assert_eq!(scene.get_f64(&cnd.plug("outColorR")).unwrap(), 1.0);
}

#[test]
fn test_array_elements_feed_sum_and_blend() {
    let mut scene = Scene::new();
    let pma = node(&mut scene, NodeType::PlusMinusAverage, "pma");
    let bta = node(&mut scene, NodeType::BlendTwoAttr, "bta");
    let src = node(&mut scene, NodeType::Transform, "src");

    scene.set_f64(&bta.plug("input[0]"), 1.0).unwrap();
    scene.set_f64(&src.plug("translateX"), 3.0).unwrap();
    scene
        .connect(&src.plug("translateX"), &bta.plug("input[1]"))
        .unwrap();
    scene.set_f64(&bta.plug("attributesBlender"), 0.5).unwrap();
    assert_eq!(scene.get_f64(&bta.plug("output")).unwrap(), 2.0);

    scene.set_f64(&pma.plug("input1D[0]"), 1.0).unwrap();
    scene
        .connect(&bta.plug("output"), &pma.plug("input1D[1]"))
        .unwrap();
    scene.set_f64(&pma.plug("input1D[2]"), -1.0).unwrap();
    assert_eq!(scene.get_f64(&pma.plug("output1D")).unwrap(), 2.0);
    assert_eq!(
        scene.source(&pma.plug("input1D[1]")).unwrap(),
        Some(bta.plug("output"))
    );
}

#[test]
fn test_decompose_matrix_and_reverse() {
    let mut scene = Scene::new();
    let src = node(&mut scene, NodeType::Transform, "src");
    let dcm = node(&mut scene, NodeType::DecomposeMatrix, "dcm");
    let rev = node(&mut scene, NodeType::Reverse, "rev");
    scene
        .set_vector3(&src.plug("translate"), Vector3::new(1.0, 2.0, 3.0))
        .unwrap();
    scene
        .set_vector3(&src.plug("scale"), Vector3::new(2.0, 2.0, 2.0))
        .unwrap();
    scene.connect(&src.plug("matrix"), &dcm.plug("inputMatrix")).unwrap();

    let t = scene.get_vector3(&dcm.plug("outputTranslate")).unwrap();
    let s = scene.get_vector3(&dcm.plug("outputScale")).unwrap();
    assert!((t - Vector3::new(1.0, 2.0, 3.0)).norm() < 1e-9);
    assert!((s - Vector3::repeat(2.0)).norm() < 1e-9);

    scene.set_f64(&rev.plug("inputX"), 0.25).unwrap();
    assert_eq!(scene.get_f64(&rev.plug("outputX")).unwrap(), 0.75);
    assert_eq!(scene.get_f64(&rev.plug("outputY")).unwrap(), 1.0);
}
