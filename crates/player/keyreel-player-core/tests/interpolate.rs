use approx::assert_relative_eq;
use keyreel_api_core::{props, PropValue, PropertySet, Shadow};
use keyreel_player_core::interp::functions::{blend_value, step, STEP_THRESHOLD};
use keyreel_player_core::{interpolate, interpolate_props, Keyframe};

fn kf(frame: u32, props: PropertySet) -> Keyframe {
    Keyframe::new(frame, props)
}

#[test]
fn numbers_blend_linearly() {
    let start = props([("x", 0.0), ("y", -10.0)]);
    let end = props([("x", 100.0), ("y", 10.0)]);
    let out = interpolate_props(&start, &end, 0.25);
    assert_relative_eq!(out["x"].as_number().unwrap(), 25.0);
    assert_relative_eq!(out["y"].as_number().unwrap(), -5.0);
}

#[test]
fn endpoints_match_start_and_end() {
    let start = props([("x", 3.0)]);
    let end = props([("x", 7.0)]);
    assert_eq!(interpolate_props(&start, &end, 0.0)["x"], PropValue::Number(3.0));
    assert_eq!(interpolate_props(&start, &end, 1.0)["x"], PropValue::Number(7.0));
}

#[test]
fn discrete_values_switch_strictly_after_half() {
    let start = PropValue::text("#ff0000");
    let end = PropValue::text("#0000ff");
    assert_eq!(blend_value("fill", Some(&start), &end, 0.5), Some(start.clone()));
    assert_eq!(blend_value("fill", Some(&start), &end, 0.5001), Some(end.clone()));
    assert_eq!(*step(&1, &2, STEP_THRESHOLD), 1);

    let on = PropValue::from(true);
    let off = PropValue::from(false);
    assert_eq!(blend_value("visible", Some(&on), &off, 0.75), Some(off));
}

#[test]
fn mixed_array_blends_numbers_and_steps_the_rest() {
    let start = props([("points", PropValue::array([0.0, 0.0]))]);
    let end = props([(
        "points",
        PropValue::Array(vec![PropValue::num(10.0), PropValue::text("red")]),
    )]);

    let half = interpolate_props(&start, &end, 0.5);
    assert_eq!(
        half["points"],
        PropValue::Array(vec![PropValue::num(5.0), PropValue::num(0.0)])
    );

    let later = interpolate_props(&start, &end, 0.75);
    assert_eq!(
        later["points"],
        PropValue::Array(vec![PropValue::num(7.5), PropValue::text("red")])
    );
}

#[test]
fn arrays_of_different_length_step_whole() {
    let start = PropValue::array([1.0, 2.0]);
    let end = PropValue::array([1.0, 2.0, 3.0]);
    assert_eq!(blend_value("points", Some(&start), &end, 0.4), Some(start.clone()));
    assert_eq!(blend_value("points", Some(&start), &end, 0.9), Some(end));
}

#[test]
fn shadow_blends_components_and_steps_color() {
    let start = props([("shadow", Shadow::new("#000000", 0.0, 0.0, 0.0))]);
    let end = props([("shadow", Shadow::new("#ff0000", 10.0, 4.0, -4.0))]);

    let out = interpolate_props(&start, &end, 0.5);
    let PropValue::Shadow(shadow) = &out["shadow"] else {
        panic!("expected a shadow, got {:?}", out["shadow"]);
    };
    assert_eq!(shadow.color.as_deref(), Some("#000000"));
    assert_relative_eq!(shadow.blur.unwrap(), 5.0);
    assert_relative_eq!(shadow.offset_x.unwrap(), 2.0);
    assert_relative_eq!(shadow.offset_y.unwrap(), -2.0);
}

fn shadow_at(a: &PropValue, b: &PropValue, t: f64) -> Shadow {
    match blend_value("shadow", Some(a), b, t) {
        Some(PropValue::Shadow(shadow)) => shadow,
        other => panic!("expected a shadow, got {other:?}"),
    }
}

#[test]
fn shadow_components_missing_on_one_side_step() {
    let mut start = Shadow {
        color: Some("#000000".into()),
        blur: Some(0.0),
        ..Shadow::default()
    };
    start.extra.insert("affectStroke".into(), serde_json::json!(false));
    let mut end = Shadow::new("#ffffff", 8.0, 4.0, 2.0);
    end.extra.insert("affectStroke".into(), serde_json::json!(true));

    let (a, b) = (PropValue::Shadow(start.clone()), PropValue::Shadow(end.clone()));

    let early = shadow_at(&a, &b, 0.25);
    assert_relative_eq!(early.blur.unwrap(), 2.0);
    assert_eq!(early.offset_x, None);
    assert_eq!(early.extra, start.extra);

    let late = shadow_at(&a, &b, 0.75);
    assert_relative_eq!(late.blur.unwrap(), 6.0);
    assert_eq!(late.offset_x, Some(4.0));
    assert_eq!(late.extra, end.extra);
}

#[test]
fn shadow_shaped_values_under_other_keys_step() {
    let a = PropValue::Shadow(Shadow::new("#000", 0.0, 0.0, 0.0));
    let b = PropValue::Shadow(Shadow::new("#fff", 10.0, 0.0, 0.0));
    assert_eq!(blend_value("glow", Some(&a), &b, 0.5), Some(a));
}

#[test]
fn mismatched_kinds_step() {
    let start = PropValue::num(1.0);
    let end = PropValue::text("auto");
    assert_eq!(blend_value("width", Some(&start), &end, 0.3), Some(start));
    assert_eq!(blend_value("width", Some(&PropValue::num(1.0)), &end, 0.7), Some(end));
}

#[test]
fn only_end_keys_are_produced() {
    let start = props([("x", 0.0), ("gone", 5.0)]);
    let end = props([("x", 10.0)]);
    let out = interpolate_props(&start, &end, 0.5);
    assert_eq!(out.len(), 1);
    assert!(out.get("gone").is_none());
}

#[test]
fn key_missing_from_start_appears_after_half() {
    let start = PropertySet::new();
    let end = props([("opacity", 1.0)]);
    assert!(interpolate_props(&start, &end, 0.5).get("opacity").is_none());
    assert_eq!(
        interpolate_props(&start, &end, 0.75)["opacity"],
        PropValue::Number(1.0)
    );
}

#[test]
fn output_follows_end_key_order() {
    let start = props([("a", 0.0), ("b", 0.0), ("c", 0.0)]);
    let end = props([("c", 1.0), ("a", 1.0), ("b", 1.0)]);
    let out = interpolate_props(&start, &end, 0.5);
    let keys: Vec<&str> = out.keys().map(String::as_str).collect();
    assert_eq!(keys, ["c", "a", "b"]);
}

#[test]
fn hard_cut_holds_start_until_the_end_keyframe() {
    let start = kf(1, props([("x", 0.0), ("label", 0.0)]));
    let mut end_props = props([("x", 100.0)]);
    end_props.insert("label".into(), PropValue::text("done"));
    let end = kf(5, end_props).with_smooth(false);

    for t in [0.0, 0.25, 0.5, 0.99] {
        assert_eq!(interpolate(&start, &end, t), start.props);
    }
    assert_eq!(interpolate(&start, &end, 1.0), end.props);
}
