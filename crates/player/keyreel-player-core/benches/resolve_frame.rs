use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keyreel_api_core::{PropValue, PropertySet, Shadow};
use keyreel_player_core::headless::HeadlessPlayer;
use keyreel_player_core::{resolve, Keyframe, PlayerConfig, Track};
use keyreel_test_fixtures::scenes;

fn dense_track(keyframes: u32) -> Track {
    (0..keyframes)
        .map(|i| {
            let mut props = PropertySet::new();
            props.insert("left".into(), PropValue::num(i as f64 * 10.0));
            props.insert("top".into(), PropValue::num(i as f64 * -4.0));
            props.insert("fill".into(), PropValue::text(format!("#{:06x}", i * 4_000)));
            props.insert(
                "shadow".into(),
                PropValue::Shadow(Shadow::new("#000000", i as f64, 2.0, 2.0)),
            );
            props.insert("points".into(), PropValue::array([0.0, i as f64, 1.0]));
            Keyframe::new(1 + i * 8, props)
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let track = dense_track(64);
    c.bench_function("resolve_between_keyframes", |b| {
        let mut frame = 1;
        b.iter(|| {
            frame = frame % 500 + 1;
            black_box(resolve(black_box(&track), frame));
        })
    });
}

fn bench_tick(c: &mut Criterion) {
    let json = scenes::json("bouncing-ball").expect("fixture");
    let mut player = HeadlessPlayer::start(&json, PlayerConfig::default()).expect("scene");
    c.bench_function("headless_tick", |b| {
        b.iter(|| black_box(player.advance(100.0)))
    });
}

criterion_group!(benches, bench_resolve, bench_tick);
criterion_main!(benches);
