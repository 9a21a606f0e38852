use keyreel_api_core::{PropValue, Shadow};
use keyreel_player_core::headless::{HeadlessPlayer, MAX_FIRINGS_PER_ADVANCE};
use keyreel_player_core::{DiagnosticSource, PlayerConfig, StartupCfg};
use keyreel_test_fixtures::{scenes, scripts};

fn start(doc: &str, cfg: PlayerConfig) -> HeadlessPlayer {
    HeadlessPlayer::start(doc, cfg).expect("scene starts")
}

fn with_fixture_script(name: &str) -> HeadlessPlayer {
    start(
        &scripts::attach("bouncing-ball", name).unwrap(),
        PlayerConfig::default(),
    )
}

fn with_script(source: &str) -> HeadlessPlayer {
    let mut doc: serde_json::Value = scenes::load("bouncing-ball").unwrap();
    doc["projectScript"] = source.into();
    start(&doc.to_string(), PlayerConfig::default())
}

fn label(player: &HeadlessPlayer) -> Option<PropValue> {
    player.prop_of("label", "text")
}

fn script_errors(player: &HeadlessPlayer) -> Vec<String> {
    player
        .diagnostics
        .records()
        .into_iter()
        .filter(|d| d.source == DiagnosticSource::Script)
        .map(|d| d.message)
        .collect()
}

#[test]
fn script_mutates_objects_found_by_class() {
    let player = with_fixture_script("tag-and-tick");
    assert_eq!(player.prop_of("ball", "stroke"), Some(PropValue::text("#00ff00")));
    assert_eq!(player.prop_of("box", "stroke"), None);
    assert!(script_errors(&player).is_empty());
}

#[test]
fn script_timers_fire_alongside_playback() {
    let mut player = with_fixture_script("tag-and-tick");
    assert_eq!(player.session.script_timer_count(), 2);

    player.advance(100.0);
    assert_eq!(label(&player), Some(PropValue::text("tick 1")));
    assert_eq!(player.session.current_frame(), 3);

    player.advance(150.0);
    assert_eq!(label(&player), Some(PropValue::text("tick 2")));
    assert_eq!(player.prop_of("box", "opacity"), Some(PropValue::num(0.5)));
    assert_eq!(player.prop_of("box", "strokeWidth"), Some(PropValue::num(2.0)));
    // The timeout fired and left the record; the interval is still live.
    assert_eq!(player.session.script_timer_count(), 1);
}

#[test]
fn stop_scripts_cancels_script_timers_but_not_playback() {
    let mut player = with_fixture_script("tag-and-tick");
    assert_eq!(player.session.stop_scripts(), 2);
    assert_eq!(player.session.stop_scripts(), 0);

    player.advance(1_000.0);
    assert_eq!(label(&player), Some(PropValue::text("hello")));
    assert_eq!(player.prop_of("box", "opacity"), None);
    assert!(player.session.is_playing());
    assert_eq!(player.session.current_frame(), 2);
}

#[test]
fn stopping_playback_leaves_script_timers_running() {
    let mut player = with_fixture_script("tag-and-tick");
    player.session.stop();
    player.advance(300.0);
    assert_eq!(label(&player), Some(PropValue::text("tick 3")));
    assert_eq!(player.session.current_frame(), 2);
}

#[test]
fn runtime_error_is_reported_and_earlier_timers_survive() {
    let mut player = with_fixture_script("faulty");
    let errors = script_errors(&player);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("boom"), "{}", errors[0]);
    assert!(player.session.is_playing());

    player.advance(50.0);
    assert_eq!(label(&player), Some(PropValue::text("late")));
}

#[test]
fn compile_error_is_reported_and_playback_continues() {
    let mut player = with_fixture_script("syntax-error");
    let errors = script_errors(&player);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("compile"), "{}", errors[0]);
    assert_eq!(player.session.script_timer_count(), 0);
    player.advance(100.0);
    assert_eq!(player.session.current_frame(), 3);
}

#[test]
fn runaway_script_hits_the_operation_limit() {
    let player = with_fixture_script("runaway");
    assert_eq!(script_errors(&player).len(), 1);
    assert!(player.session.is_playing());
}

#[test]
fn eval_is_not_available() {
    let player = with_script(r#"eval("get_object_by_id(\"label\").set(\"text\", \"escaped\")");"#);
    assert_eq!(script_errors(&player).len(), 1);
    assert_eq!(label(&player), Some(PropValue::text("hello")));
}

#[test]
fn script_runs_at_most_once() {
    let mut player = with_fixture_script("tag-and-tick");
    assert!(!player.session.run_script());
    assert_eq!(player.session.script_timer_count(), 2);
    assert!(script_errors(&player).is_empty());
}

#[test]
fn query_capabilities_are_empty_safe() {
    let player = with_script(
        r#"
        let ids = get_objects_by_ids(["box", "nope", "ball"]);
        let bad = get_objects_by_class(42);
        let none = get_object_by_id(());
        let not_a_list = get_objects_by_ids("ball");
        let all = get_objects_by_all_classes(["shape", "bouncy"]);
        let any = get_objects_by_classes(["text", "bouncy"]);
        let out = "" + ids.len() + ":" + ids[0].id + "," + ids[1].id
            + "|" + bad.len()
            + "|" + type_of(none)
            + "|" + not_a_list.len()
            + "|" + all.len()
            + "|" + any.len();
        get_object_by_id("label").set("text", out);
        "#,
    );
    assert!(script_errors(&player).is_empty(), "{:?}", script_errors(&player));
    assert_eq!(label(&player), Some(PropValue::text("2:box,ball|0|()|0|1|2")));
}

#[test]
fn object_handles_expose_descriptors() {
    let player = with_script(
        r#"
        let b = get_object_by_id("ball");
        let out = b.id + "|" + b.anim_id + "|" + b.classes.len()
            + "|" + b.has_class("bouncy") + "|" + b.has_class("text");
        get_object_by_id("label").set("text", out);
        "#,
    );
    assert_eq!(label(&player), Some(PropValue::text("ball|ball|2|true|false")));
}

#[test]
fn descriptor_fields_cannot_be_set_from_scripts() {
    let player = with_script(r#"get_object_by_id("ball").set("customId", "hijacked");"#);
    let errors = script_errors(&player);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("customId"), "{}", errors[0]);
    assert!(player.session.get_object_by_id("ball").is_some());
    assert!(player.session.get_object_by_id("hijacked").is_none());
}

#[test]
fn set_props_types_shadows_by_name() {
    let player = with_script(
        r##"get_object_by_id("box").set_props(#{ shadow: #{ color: "#111111", blur: 3.0 } });"##,
    );
    assert_eq!(
        player.prop_of("box", "shadow"),
        Some(PropValue::Shadow(Shadow {
            color: Some("#111111".into()),
            blur: Some(3.0),
            ..Shadow::default()
        }))
    );
}

#[test]
fn zero_delay_rearming_timeout_cannot_stall_virtual_time() {
    let mut player = with_script(
        r#"
        fn again() { set_timeout(Fn("again"), 0); }
        again();
        "#,
    );
    assert_eq!(player.advance(50.0), MAX_FIRINGS_PER_ADVANCE);
    assert_eq!(player.scheduler.now(), 0.0);
    assert_eq!(player.session.current_frame(), 2, "tick at 100 ms not reached");

    assert_eq!(player.session.stop_scripts(), 1);
    assert_eq!(player.advance(50.0), 0);
    assert_eq!(player.scheduler.now(), 50.0);
    assert!(script_errors(&player).is_empty());
}

#[test]
fn failing_interval_keeps_firing_and_reporting() {
    let mut player = with_script(r#"set_interval(|| { throw "tick failed"; }, 100);"#);
    player.advance(300.0);
    let errors = script_errors(&player);
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|e| e.contains("tick failed")));
    assert_eq!(player.session.current_frame(), 5);
}

#[test]
fn cleared_timers_never_fire() {
    let mut player = with_script(
        r#"
        let h = set_timeout(|| get_object_by_id("label").set("text", "fired"), 10);
        clear_timer(h);
        "#,
    );
    player.advance(100.0);
    assert_eq!(label(&player), Some(PropValue::text("hello")));
    assert_eq!(player.session.script_timer_count(), 0);
}

#[test]
fn scripts_cannot_clear_playback_ticks() {
    let mut doc: serde_json::Value = scenes::load("bouncing-ball").unwrap();
    doc["projectScript"] = "for i in 0..100 { clear_timer(i); }".into();
    let cfg = PlayerConfig {
        startup: StartupCfg {
            script_delay_ms: Some(50.0),
            ..StartupCfg::default()
        },
        ..PlayerConfig::default()
    };
    let mut player = start(&doc.to_string(), cfg);
    player.advance(100.0);
    assert!(player.session.is_playing());
    assert_eq!(player.session.current_frame(), 3);
    assert!(script_errors(&player).is_empty());
}
