use beadchain::{build, ChainParams, EngineConfig, Role, RosaryEngine, Vec2};

#[test]
fn build_is_bit_identical() {
    let params = ChainParams::<f64>::default().with_counts(33, 4);
    let results: Vec<_> = (0..5).map(|_| build(&params).unwrap()).collect();

    for r in &results[1..] {
        assert_eq!(r.bodies.len(), results[0].bodies.len());
        for (a, b) in results[0].bodies.iter().zip(&r.bodies) {
            assert_eq!(a.desc.position.x.to_bits(), b.desc.position.x.to_bits());
            assert_eq!(a.desc.position.y.to_bits(), b.desc.position.y.to_bits());
            assert_eq!(a.role, b.role);
        }
        // Same order, same rest lengths.
        assert_eq!(r.links, results[0].links);
    }
}

#[test]
fn f32_build_is_bit_identical() {
    let params = ChainParams::<f32>::default();
    let a = build(&params).unwrap();
    let b = build(&params).unwrap();
    for (x, y) in a.bodies.iter().zip(&b.bodies) {
        assert_eq!(x.desc.position.x.to_bits(), y.desc.position.x.to_bits());
        assert_eq!(x.desc.position.y.to_bits(), y.desc.position.y.to_bits());
    }
}

fn scripted_run() -> Vec<Vec2<f64>> {
    let mut engine: RosaryEngine = RosaryEngine::new(EngineConfig::default()).unwrap();
    let id = engine.handles().bodies[engine.topology().find(Role::Loop { position: 12, marker: false }).unwrap()];
    let start = engine.world().body(id).unwrap().position;

    engine.pointer_down(start).unwrap();
    for frame in 0..45 {
        let offset = Vec2::new(4.0 * frame as f64, -2.0 * frame as f64);
        engine.pointer_move(start + offset).unwrap();
        engine.tick(1.0 / 60.0);
    }
    engine.pointer_up();
    for _ in 0..60 {
        engine.tick(1.0 / 60.0);
    }
    engine.world().bodies().iter().map(|b| b.position).collect()
}

#[test]
fn simulation_is_deterministic() {
    let results: Vec<_> = (0..3).map(|_| scripted_run()).collect();
    for r in &results[1..] {
        for (a, b) in results[0].iter().zip(r.iter()) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }
}
