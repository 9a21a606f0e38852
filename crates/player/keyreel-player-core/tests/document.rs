use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use keyreel_api_core::{prop_to_json, PropValue, Shadow};
use keyreel_player_core::headless::{HeadlessPlayer, HeadlessSurface, ManualScheduler};
use keyreel_player_core::{
    DiagnosticLog, DiagnosticSource, DiagnosticsCfg, DocumentError, PlayerConfig, PlayerError,
    SceneDocument, Session, Severity, SurfaceError,
};
use keyreel_test_fixtures::scenes;
use serde_json::json;

#[test]
fn reads_canvas_animation_and_tracks() {
    let doc = SceneDocument::from_json_str(
        &scenes::json("bouncing-ball").unwrap(),
        &PlayerConfig::default(),
    )
    .unwrap();
    assert_eq!(doc.canvas.width, 400);
    assert_eq!(doc.canvas.height, 300);
    assert_eq!(doc.total_frames, 10);
    assert_eq!(doc.fps, 10.0);
    assert_eq!(doc.library.len(), 2);
    assert_eq!(doc.library.get("box").unwrap().frames().collect::<Vec<_>>(), [1, 5]);
    assert!(!doc.library.get("box").unwrap().get(5).unwrap().smooth);
    assert!(doc.project_script.is_none(), "blank script counts as none");
    assert!(doc.warnings.is_empty());
}

#[test]
fn missing_fields_fall_back_to_config_defaults() {
    let doc =
        SceneDocument::from_json_str(&scenes::json("degraded").unwrap(), &PlayerConfig::default())
            .unwrap();
    assert_eq!(doc.canvas.width, 800);
    assert_eq!(doc.canvas.height, 600);
    assert_eq!(doc.canvas.background, "#ffffff");
    assert_eq!(doc.total_frames, 30);
    assert_eq!(doc.fps, 12.0);
}

#[test]
fn unusable_entries_are_skipped_with_warnings() {
    let doc =
        SceneDocument::from_json_str(&scenes::json("degraded").unwrap(), &PlayerConfig::default())
            .unwrap();
    assert_eq!(doc.warnings.len(), 3, "{:#?}", doc.warnings);
    assert!(doc.library.get("ghost").is_none());
    let ball = doc.library.get("ball").unwrap();
    assert_eq!(ball.frames().collect::<Vec<_>>(), [2]);
}

#[test]
fn document_warnings_are_reported_on_load() {
    let mut player =
        HeadlessPlayer::start(&scenes::json("degraded").unwrap(), PlayerConfig::default())
            .unwrap();
    let loads = player.diagnostics.count(DiagnosticSource::Load);
    assert_eq!(loads, 3);
    assert!(player
        .diagnostics
        .records()
        .iter()
        .all(|d| d.severity == Severity::Warning));

    // The surviving keyframe holds everywhere; the object without a track keeps its value.
    player.advance(500.0);
    assert_eq!(player.prop_of("ball", "left"), Some(PropValue::num(20.0)));
    assert_eq!(player.prop_of("orphan", "left"), Some(PropValue::num(7.0)));
}

#[test]
fn scene_graph_may_be_a_json_string_and_numbers_may_be_strings() {
    let doc = SceneDocument::from_json_str(
        &scenes::json("shadow-array").unwrap(),
        &PlayerConfig::default(),
    )
    .unwrap();
    assert_eq!(doc.canvas.width, 640);
    assert!(doc.scene_graph.get("objects").is_some());
    assert_eq!(doc.fps, 24.0);
}

#[test]
fn shadow_and_array_properties_blend_on_the_surface() {
    let mut player =
        HeadlessPlayer::load(&scenes::json("shadow-array").unwrap(), PlayerConfig::default())
            .unwrap();
    player.session.seek(2);

    let Some(PropValue::Shadow(shadow)) = player.prop_of("glow", "shadow") else {
        panic!("shadow not applied");
    };
    assert_eq!(shadow.color.as_deref(), Some("#000000"));
    assert_relative_eq!(shadow.blur.unwrap(), 5.0);
    assert_relative_eq!(shadow.offset_x.unwrap(), 2.0);
    assert_relative_eq!(shadow.offset_y.unwrap(), -2.0);

    assert_eq!(
        player.prop_of("glow", "points"),
        Some(PropValue::Array(vec![PropValue::num(5.0), PropValue::num(0.0)]))
    );
    assert_eq!(player.prop_of("glow", "visible"), Some(PropValue::from(true)));

    player.session.seek(3);
    assert_eq!(
        player.prop_of("glow", "shadow"),
        Some(PropValue::Shadow(Shadow::new("#ff0000", 10.0, 4.0, -4.0)))
    );
}

#[test]
fn exact_keyframe_shadow_reaches_the_surface_as_authored() {
    let authored = json!({
        "color": "rgba(0,0,0,0.3)",
        "blur": 6,
        "affectStroke": true,
        "nonScaling": false
    });
    let raw = json!({
        "canvas": { "objects": [{ "type": "rect", "animId": "card", "customId": "card" }] },
        "animation": { "totalFrames": 2, "fps": 10, "data": {
            "card": {
                "1": { "props": { "shadow": authored.clone() } },
                "2": { "props": { "shadow": { "color": "#000", "blur": 0 } } }
            }
        } }
    });
    let mut player = HeadlessPlayer::load(&raw.to_string(), PlayerConfig::default()).unwrap();
    player.session.seek(1);

    let shadow = player.prop_of("card", "shadow").expect("shadow applied");
    assert_eq!(prop_to_json(&shadow), authored);
}

#[test]
fn duplicate_frame_keys_keep_the_last_entry() {
    let raw = r#"{
        "animation": { "totalFrames": 5, "fps": 5, "data": {
            "a": { "1": { "props": { "x": 1 } }, "1": { "props": { "x": 2 } } }
        } }
    }"#;
    let doc = SceneDocument::from_json_str(raw, &PlayerConfig::default()).unwrap();
    let kf = doc.library.get("a").unwrap().get(1).unwrap();
    assert_eq!(kf.props["x"], PropValue::num(2.0));
}

#[test]
fn smooth_is_false_only_for_literal_false() {
    let value = json!({
        "animation": { "data": { "a": {
            "1": { "props": {}, "smooth": 0 },
            "2": { "props": {}, "smooth": false },
            "3": { "props": null }
        } } }
    });
    let doc = SceneDocument::from_json_value(value, &PlayerConfig::default()).unwrap();
    let track = doc.library.get("a").unwrap();
    assert!(track.get(1).unwrap().smooth);
    assert!(!track.get(2).unwrap().smooth);
    assert!(track.get(3).unwrap().props.is_empty());
}

#[test]
fn malformed_document_is_a_reported_load_fault() {
    let diagnostics = Rc::new(DiagnosticLog::new(DiagnosticsCfg::default()));
    let result = Session::from_json(
        "{ not json",
        Rc::new(RefCell::new(HeadlessSurface::new())),
        Box::new(ManualScheduler::new()),
        diagnostics.clone(),
        PlayerConfig::default(),
    );
    assert!(matches!(
        result,
        Err(PlayerError::Document(DocumentError::Parse(_)))
    ));
    let records = diagnostics.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source, DiagnosticSource::Load);
    assert_eq!(records[0].severity, Severity::Error);
}

#[test]
fn invalid_scene_graph_string_is_a_document_error() {
    let err = SceneDocument::from_json_str(r#"{ "canvas": "{oops" }"#, &PlayerConfig::default())
        .unwrap_err();
    assert!(matches!(err, DocumentError::SceneGraph(_)));
}

#[test]
fn surface_rejection_blocks_start() {
    let diagnostics = Rc::new(DiagnosticLog::new(DiagnosticsCfg::default()));
    let mut session = Session::from_json(
        r#"{ "canvas": 5 }"#,
        Rc::new(RefCell::new(HeadlessSurface::new())),
        Box::new(ManualScheduler::new()),
        diagnostics.clone(),
        PlayerConfig::default(),
    )
    .unwrap();
    assert!(matches!(
        session.load(),
        Err(PlayerError::Surface(SurfaceError::SceneGraph(_)))
    ));
    assert!(matches!(session.start(), Err(PlayerError::NotLoaded)));
    assert!(!session.is_playing());
    assert_eq!(diagnostics.count(DiagnosticSource::Load), 1);
}
