use limb_rig::prelude::*;
use limb_rig::{FK_IK_ATTR, GLOBAL_SCALE_ATTR, SEGMENTS, STRETCH_ATTR};
use limb_scene::prelude::*;
use limb_test_utils::{assert_close, assert_point, built_arm, default_spec, get, node, GuideLayout};

fn assert_vec_close(scene: &Scene, a: &Plug, b: &Plug) {
    let (va, vb) = (scene.get_vector3(a).unwrap(), scene.get_vector3(b).unwrap());
    assert!((va - vb).norm() < 1e-6, "{a} = {va:?}, {b} = {vb:?}");
}

#[test]
fn test_nine_blend_units_share_switch() {
    let (scene, rig) = built_arm(default_spec());
    assert_eq!(rig.blend_units.len(), 9);

    let switch = rig.settings.node.plug(FK_IK_ATTR);
    for unit in &rig.blend_units {
        assert_eq!(scene.source(&unit.node.plug("blender")).unwrap(), Some(switch.clone()));
        let bind = rig.chains.bind.joints[unit.joint];
        assert_eq!(
            scene.source(&bind.plug(unit.channel.as_str())).unwrap(),
            Some(unit.node.plug("output"))
        );
    }
    node(&scene, "L_elbow_rotate_BCN");
    node(&scene, "L_wrist_scale_BCN");
}

#[test]
fn test_switch_extremes_select_chain() {
    let (mut scene, rig) = built_arm(default_spec());
    scene
        .set_f64(&rig.fk_controls[0].node.plug("rotateZ"), 30.0)
        .unwrap();
    scene
        .set_f64(&rig.fk_controls[1].node.plug("rotateY"), -20.0)
        .unwrap();

    for (value, source) in [(1.0, rig.chains.ik), (0.0, rig.chains.fk)] {
        scene.set_f64(&rig.settings.node.plug(FK_IK_ATTR), value).unwrap();
        for i in 0..SEGMENTS {
            for channel in Channel::TRS {
                assert_vec_close(
                    &scene,
                    &rig.chains.bind.joints[i].plug(channel.as_str()),
                    &source.joints[i].plug(channel.as_str()),
                );
            }
        }
    }
}

#[test]
fn test_switch_midpoint_interpolates() {
    let (mut scene, rig) = built_arm(default_spec());
    scene
        .set_f64(&rig.fk_controls[0].node.plug("rotateZ"), 30.0)
        .unwrap();
    scene.set_f64(&rig.settings.node.plug(FK_IK_ATTR), 0.5).unwrap();

    assert_close(get(&scene, &rig.chains.fk.root().plug("rotateZ")), 30.0);
    assert_close(get(&scene, &rig.chains.ik.root().plug("rotateZ")), 0.0);
    assert_close(get(&scene, &rig.chains.bind.root().plug("rotateZ")), 15.0);
}

#[test]
fn test_fk_control_drives_fk_chain() {
    let (mut scene, rig) = built_arm(default_spec());
    scene
        .set_f64(&rig.fk_controls[0].node.plug("rotateZ"), 90.0)
        .unwrap();

    assert_point(scene.world_position(rig.chains.fk.middle()).unwrap(), [0.0, 10.0, 0.0]);
    assert_point(scene.world_position(rig.chains.fk.tip()).unwrap(), [0.0, 20.0, 0.0]);
    assert_point(scene.world_position(rig.fk_controls[2].node).unwrap(), [0.0, 20.0, 0.0]);
}

#[test]
fn test_base_control_carries_ik_root() {
    let (mut scene, rig) = built_arm(default_spec());
    scene
        .set_f64(&rig.ik_controls.base.node.plug("translateY"), 3.0)
        .unwrap();

    assert_point(scene.world_position(rig.chains.ik.root()).unwrap(), [0.0, 3.0, 0.0]);
    assert_point(scene.world_position(rig.chains.bind.tip()).unwrap(), [20.0, 3.0, 0.0]);
}

#[test]
fn test_no_stretch_nodes_without_option() {
    let (scene, rig) = built_arm(default_spec());
    assert!(rig.stretch.is_none());
    assert!(scene.find("L_arm_DST").is_none());
    assert!(!scene.has_attr(&rig.ik_controls.world.node.plug(STRETCH_ATTR)));
}

#[test]
fn test_stretch_attributes_on_world_control() {
    let (scene, rig) = built_arm(default_spec().with_stretch(true));
    let world = rig.ik_controls.world.node;

    for attr in [STRETCH_ATTR, "upArm", "loArm"] {
        let plug = world.plug(attr);
        assert!(scene.attr_state(&plug).unwrap().keyable, "{attr}");
        assert_close(get(&scene, &plug), 1.0);
    }
    let network = rig.stretch.as_ref().unwrap();
    assert_close(network.ik.rest_length, 20.0);
    assert_eq!(network.fk.len(), 2);
    assert_eq!(
        scene.parent(network.ik.start_locator).unwrap(),
        Some(rig.hierarchy.no_xform)
    );
}

#[test]
fn test_ik_ratio_is_one_at_or_below_rest() {
    let mut scene = Scene::new();
    let guides = GuideLayout::bent().create(&mut scene, "arm");
    let rig = build(&mut scene, default_spec().with_stretch(true), guides).unwrap();

    // bent arm: tip closer to the root than the rest length
    assert_eq!(get(&scene, &rig.chains.ik.root().plug("scaleX")), 1.0);
    assert_eq!(get(&scene, &rig.chains.ik.middle().plug("scaleX")), 1.0);

    // straighten partway, still short of rest
    scene
        .set_f64(&rig.ik_controls.world.node.plug("translateX"), 0.2)
        .unwrap();
    assert_eq!(get(&scene, &rig.chains.ik.root().plug("scaleX")), 1.0);
}

#[test]
fn test_ik_stretch_past_rest_length() {
    let (mut scene, rig) = built_arm(default_spec().with_stretch(true));
    let world = rig.ik_controls.world.node;
    let rest = rig.stretch.as_ref().unwrap().ik.rest_length;

    scene.set_f64(&world.plug("translateX"), rest).unwrap();
    let network = &rig.stretch.as_ref().unwrap().ik;
    assert_close(get(&scene, &network.distance.plug("distance")), 2.0 * rest);
    assert_close(get(&scene, &rig.chains.ik.root().plug("scaleX")), 2.0);
    assert_close(get(&scene, &rig.chains.ik.middle().plug("scaleX")), 2.0);

    scene.set_f64(&world.plug(STRETCH_ATTR), 0.0).unwrap();
    assert_close(get(&scene, &rig.chains.ik.root().plug("scaleX")), 1.0);

    scene.set_f64(&world.plug(STRETCH_ATTR), 1.0).unwrap();
    scene.set_f64(&world.plug("loArm"), 0.5).unwrap();
    assert_close(get(&scene, &rig.chains.ik.root().plug("scaleX")), 2.0);
    assert_close(get(&scene, &rig.chains.ik.middle().plug("scaleX")), 1.5);
}

#[test]
fn test_ik_stretch_compensates_global_scale() {
    let (mut scene, rig) = built_arm(default_spec().with_stretch(true));
    assert!(rig.global_scale_compensation.is_some());

    scene.set_f64(&rig.root.plug(GLOBAL_SCALE_ATTR), 2.0).unwrap();
    assert_close(get(&scene, &rig.chains.ik.root().plug("scaleX")), 1.0);

    scene
        .set_f64(&rig.ik_controls.world.node.plug("translateX"), 20.0)
        .unwrap();
    // the control moves in scaled space: 40 world units past a 40 unit rest
    assert_close(get(&scene, &rig.chains.ik.root().plug("scaleX")), 2.0);
}

#[test]
fn test_fk_stretch_pushes_next_control() {
    let (mut scene, rig) = built_arm(default_spec().with_stretch(true));
    let network = rig.stretch.as_ref().unwrap();
    let elbow_loc = node(&scene, "L_elbow_FK_OFF_LOC");
    assert_eq!(network.fk[0].locator, elbow_loc);
    assert_close(network.fk[0].rest_offset, 10.0);

    let shoulder = rig.fk_controls[0].node;
    scene.set_f64(&shoulder.plug(STRETCH_ATTR), 2.0).unwrap();

    assert_close(get(&scene, &elbow_loc.plug("translateX")), 20.0);
    assert_close(get(&scene, &rig.chains.fk.root().plug("scaleX")), 2.0);
    assert_point(scene.world_position(rig.fk_controls[1].node).unwrap(), [20.0, 0.0, 0.0]);
    assert_point(scene.world_position(rig.chains.fk.middle()).unwrap(), [20.0, 0.0, 0.0]);
    assert_point(scene.world_position(rig.chains.fk.tip()).unwrap(), [30.0, 0.0, 0.0]);

    let wrist_loc = node(&scene, "L_wrist_FK_OFF_LOC");
    scene
        .set_f64(&rig.fk_controls[1].node.plug(STRETCH_ATTR), 2.0)
        .unwrap();
    assert_close(get(&scene, &wrist_loc.plug("translateX")), 20.0);
    assert_point(scene.world_position(rig.chains.fk.tip()).unwrap(), [40.0, 0.0, 0.0]);
}

#[test]
fn test_fk_stretch_floor() {
    let (mut scene, rig) = built_arm(default_spec().with_stretch(true));
    let plug = rig.fk_controls[0].node.plug(STRETCH_ATTR);
    scene.set_f64(&plug, -3.0).unwrap();
    assert_close(get(&scene, &plug), 0.001);
}
