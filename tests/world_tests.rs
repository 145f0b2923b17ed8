use approx::assert_abs_diff_eq;
use beadchain::{
    Anchor, BodyDesc, ConstraintId, DistanceConstraint, Material, Rect, SolverConfig, StepObserver, Vec2, World,
    WorldError,
};

const DT: f64 = 1.0 / 60.0;

fn open_world() -> World {
    World::new(Rect::from_size(1000.0, 1000.0), SolverConfig::new())
}

#[test]
fn free_body_coasts_and_slows() {
    let mut world = open_world();
    let id = world
        .add_body(BodyDesc::circle(Vec2::new(100.0, 500.0), 5.0).with_velocity(Vec2::new(60.0, 0.0)))
        .unwrap();

    world.step(DT);
    let body = world.body(id).unwrap();
    // One step of 10% linear damping.
    assert_abs_diff_eq!(body.velocity.x, 54.0, epsilon = 1e-9);
    assert_abs_diff_eq!(body.position.x, 100.0 + 54.0 * DT, epsilon = 1e-9);
    assert_eq!(body.velocity.y, 0.0);
}

#[test]
fn gravity_defaults_to_zero() {
    let mut world = open_world();
    let id = world.add_body(BodyDesc::circle(Vec2::new(500.0, 500.0), 5.0)).unwrap();
    for _ in 0..120 {
        world.step(DT);
    }
    assert_eq!(world.body(id).unwrap().position, Vec2::new(500.0, 500.0));
}

#[test]
fn pinned_body_never_moves() {
    let config = SolverConfig::new().with_gravity(Vec2::new(0.0, 400.0));
    let mut world = World::new(Rect::from_size(1000.0, 1000.0), config);
    let start = Vec2::new(300.0, 200.0);
    let pin = world.add_body(BodyDesc::circle(start, 10.0).pinned()).unwrap();
    let free = world
        .add_body(BodyDesc::circle(Vec2::new(380.0, 200.0), 5.0).with_velocity(Vec2::new(0.0, 900.0)))
        .unwrap();
    world
        .add_constraint(DistanceConstraint::between(pin, free, 40.0).with_damping(0.5))
        .unwrap();

    for _ in 0..300 {
        world.step(DT);
        let body = world.body(pin).unwrap();
        assert_eq!(body.position, start);
        assert_eq!(body.velocity, Vec2::zero());
    }
    assert_eq!(world.body(pin).unwrap().inverse_mass(), 0.0);
}

#[test]
fn bodies_stay_inside_bounds() {
    let bounds = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(200.0, 100.0));
    let config = SolverConfig::new().with_gravity(Vec2::new(30.0, 500.0));
    let mut world = World::new(bounds, config);
    let lively = Material::lively();
    let ids = [
        world
            .add_body(BodyDesc::circle(Vec2::new(50.0, 50.0), 8.0).with_velocity(Vec2::new(-3000.0, 1200.0)).with_material(lively))
            .unwrap(),
        world
            .add_body(BodyDesc::rect(Vec2::new(150.0, 40.0), 12.0, 4.0).with_velocity(Vec2::new(2500.0, -2500.0)).with_material(lively))
            .unwrap(),
        // Starts outside; added bodies are clamped in.
        world.add_body(BodyDesc::circle(Vec2::new(-40.0, 300.0), 5.0)).unwrap(),
    ];

    for _ in 0..500 {
        world.step(DT);
        for &id in &ids {
            let body = world.body(id).unwrap();
            let half = body.shape.half_extents();
            assert!(body.position.x - half.x >= bounds.min.x - 1e-9, "{:?}", body.position);
            assert!(body.position.x + half.x <= bounds.max.x + 1e-9, "{:?}", body.position);
            assert!(body.position.y - half.y >= bounds.min.y - 1e-9, "{:?}", body.position);
            assert!(body.position.y + half.y <= bounds.max.y + 1e-9, "{:?}", body.position);
        }
    }
}

#[test]
fn wall_reflects_normal_velocity_by_restitution() {
    let mut world = World::new(Rect::from_size(100.0, 100.0), SolverConfig::new());
    let material = Material::new(0.5, 0.0, 0.0);
    let id = world
        .add_body(BodyDesc::circle(Vec2::new(94.0, 50.0), 5.0).with_velocity(Vec2::new(120.0, 0.0)).with_material(material))
        .unwrap();

    world.step(DT);
    let body = world.body(id).unwrap();
    assert_eq!(body.position.x, 95.0);
    assert!(body.velocity.x < 0.0, "should bounce back, got {}", body.velocity.x);
}

#[test]
fn stretched_link_converges_without_oscillation() {
    let rest = 30.0;
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(400.0, 500.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(400.0 + 2.0 * rest, 500.0), 5.0)).unwrap();
    world.add_constraint(DistanceConstraint::between(a, b, rest)).unwrap();

    for _ in 0..10 {
        world.step(DT);
    }
    for _ in 0..200 {
        world.step(DT);
        let pa = world.body(a).unwrap().position;
        let pb = world.body(b).unwrap().position;
        assert_abs_diff_eq!(pa.distance(pb), rest, epsilon = 1e-6);
        assert!(world.body(a).unwrap().speed() < 1e-6);
    }
}

#[test]
fn heavier_body_moves_less() {
    let mut world = open_world();
    let heavy = world.add_body(BodyDesc::circle(Vec2::new(400.0, 500.0), 5.0).with_mass(9.0)).unwrap();
    let light = world.add_body(BodyDesc::circle(Vec2::new(440.0, 500.0), 5.0)).unwrap();
    world.add_constraint(DistanceConstraint::between(heavy, light, 20.0)).unwrap();

    world.step(DT);
    let moved_heavy = world.body(heavy).unwrap().position.x - 400.0;
    let moved_light = 440.0 - world.body(light).unwrap().position.x;
    assert_abs_diff_eq!(moved_heavy, 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(moved_light, 18.0, epsilon = 1e-9);
}

#[derive(Default)]
struct ClampCounter {
    clamped: usize,
    largest: f64,
    steps: usize,
}

impl StepObserver for ClampCounter {
    fn on_correction_clamped(&mut self, _constraint: ConstraintId, requested: f64) {
        self.clamped += 1;
        self.largest = self.largest.max(requested);
    }

    fn on_step_complete(&mut self) {
        self.steps += 1;
    }
}

#[test]
fn oversized_correction_is_clamped() {
    let config = SolverConfig::new().with_max_correction(10.0).with_max_speed(1000.0);
    let mut world = World::new(Rect::from_size(4000.0, 1000.0), config);
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 500.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(3100.0, 500.0), 5.0)).unwrap();
    world.add_constraint(DistanceConstraint::between(a, b, 10.0)).unwrap();

    let mut counter = ClampCounter::default();
    world.step_with(DT, &mut counter);

    assert_eq!(counter.steps, 1);
    assert_eq!(counter.clamped, 6, "every iteration should hit the cap");
    assert_abs_diff_eq!(counter.largest, 2990.0, epsilon = 1e-9);
    let pa = world.body(a).unwrap().position;
    let pb = world.body(b).unwrap().position;
    // Six capped corrections of 10 each.
    assert_abs_diff_eq!(pa.distance(pb), 3000.0 - 60.0, epsilon = 1e-9);

    for _ in 0..600 {
        world.step_with(DT, &mut counter);
        for id in [a, b] {
            let body = world.body(id).unwrap();
            assert!(body.position.is_finite() && body.velocity.is_finite());
            assert!(body.speed() <= 1000.0 + 1e-6);
        }
    }
}

#[test]
fn link_between_two_pinned_bodies_is_a_no_op() {
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0).pinned()).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(300.0, 100.0), 5.0).pinned()).unwrap();
    world.add_constraint(DistanceConstraint::between(a, b, 10.0).with_damping(1.0)).unwrap();

    for _ in 0..10 {
        world.step(DT);
    }
    assert_eq!(world.body(a).unwrap().position, Vec2::new(100.0, 100.0));
    assert_eq!(world.body(b).unwrap().position, Vec2::new(300.0, 100.0));
}

#[test]
fn rigid_zero_length_link_does_not_crash() {
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(130.0, 140.0), 5.0)).unwrap();
    world.add_constraint(DistanceConstraint::between(a, b, 0.0).with_stiffness(1.0)).unwrap();

    for _ in 0..60 {
        world.step(DT);
    }
    let pa = world.body(a).unwrap().position;
    let pb = world.body(b).unwrap().position;
    assert!(pa.is_finite() && pb.is_finite());
    assert_abs_diff_eq!(pa.distance(pb), 0.0, epsilon = 1e-9);
}

#[test]
fn invalid_constraints_are_rejected() {
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(200.0, 100.0), 5.0)).unwrap();

    assert_eq!(
        world.add_constraint(DistanceConstraint::between(a, a, 1.0)),
        Err(WorldError::SelfConstraint(a))
    );
    assert!(matches!(
        world.add_constraint(DistanceConstraint::between(a, b, -1.0)),
        Err(WorldError::InvalidConstraint { .. })
    ));
    assert!(matches!(
        world.add_constraint(DistanceConstraint::between(a, b, 1.0).with_stiffness(0.0)),
        Err(WorldError::InvalidConstraint { .. })
    ));
    assert!(matches!(
        world.add_constraint(DistanceConstraint::between(a, b, 1.0).with_damping(1.5)),
        Err(WorldError::InvalidConstraint { .. })
    ));
    assert!(matches!(
        world.add_body(BodyDesc::circle(Vec2::new(f64::NAN, 0.0), 5.0)),
        Err(WorldError::InvalidBody { .. })
    ));
    assert_eq!(world.constraint_count(), 0);
}

#[test]
fn stale_ids_are_not_found() {
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(200.0, 100.0), 5.0)).unwrap();
    let link = world.add_constraint(DistanceConstraint::between(a, b, 50.0)).unwrap();

    world.remove_all();
    assert_eq!(world.body_count(), 0);
    assert_eq!(world.body(a).err(), Some(WorldError::BodyNotFound(a)));
    assert_eq!(world.constraint(link).err(), Some(WorldError::ConstraintNotFound(link)));

    // The new first body occupies the same slot but is a different id.
    let fresh = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0)).unwrap();
    assert_ne!(fresh, a);
    assert!(world.body_mut(a).is_err());
    assert_eq!(
        world.add_constraint(DistanceConstraint::between(fresh, b, 1.0)),
        Err(WorldError::BodyNotFound(b))
    );
    world.step(DT);
}

#[test]
fn only_point_anchors_can_be_moved() {
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(200.0, 100.0), 5.0)).unwrap();
    let link = world.add_constraint(DistanceConstraint::between(a, b, 100.0)).unwrap();
    let target = world
        .add_constraint(DistanceConstraint::new(Anchor::center(a), Anchor::Point(Vec2::new(0.0, 0.0)), 0.0))
        .unwrap();

    world.set_point_anchor(target, Vec2::new(50.0, 60.0)).unwrap();
    assert_eq!(world.constraint(target).unwrap().b, Anchor::Point(Vec2::new(50.0, 60.0)));
    assert_eq!(
        world.set_point_anchor(link, Vec2::new(50.0, 60.0)),
        Err(WorldError::InvalidConstraint { reason: "constraint has no point anchor" })
    );
    assert_eq!(world.constraint(link).unwrap().b, Anchor::center(b));

    // Ids minted by a bigger world never attach here.
    let mut other = open_world();
    let far = (0..5)
        .map(|i| other.add_body(BodyDesc::circle(Vec2::new(100.0 + 50.0 * i as f64, 300.0), 5.0)).unwrap())
        .last()
        .unwrap();
    assert_eq!(
        world.add_constraint(DistanceConstraint::between(a, far, 10.0)),
        Err(WorldError::BodyNotFound(far))
    );
    world.step(DT);

    world.remove_all();
    assert_eq!(
        world.set_point_anchor(target, Vec2::new(1.0, 1.0)),
        Err(WorldError::ConstraintNotFound(target))
    );
}

#[test]
fn never_added_id_is_not_found() {
    let mut big = open_world();
    let mut ids = Vec::new();
    for i in 0..3 {
        ids.push(big.add_body(BodyDesc::circle(Vec2::new(100.0 + 50.0 * i as f64, 100.0), 5.0)).unwrap());
    }
    let small = open_world();
    assert_eq!(small.body(ids[2]).err(), Some(WorldError::BodyNotFound(ids[2])));
}

#[test]
fn removing_a_constraint_keeps_the_rest_in_order() {
    let mut world = open_world();
    let a = world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0)).unwrap();
    let b = world.add_body(BodyDesc::circle(Vec2::new(200.0, 100.0), 5.0)).unwrap();
    let c = world.add_body(BodyDesc::circle(Vec2::new(300.0, 100.0), 5.0)).unwrap();
    let ab = world.add_constraint(DistanceConstraint::between(a, b, 100.0)).unwrap();
    let bc = world.add_constraint(DistanceConstraint::between(b, c, 100.0)).unwrap();
    let ca = world.add_constraint(DistanceConstraint::between(c, a, 200.0)).unwrap();

    world.remove_constraint(bc).unwrap();
    let order: Vec<_> = world.constraints().map(|(id, _)| id).collect();
    assert_eq!(order, vec![ab, ca]);
    assert_eq!(world.remove_constraint(bc).err(), Some(WorldError::ConstraintNotFound(bc)));
}

#[test]
fn large_dt_is_capped() {
    let mut world = open_world();
    let id = world
        .add_body(BodyDesc::circle(Vec2::new(100.0, 500.0), 5.0).with_velocity(Vec2::new(100.0, 0.0)))
        .unwrap();
    world.step(10.0);
    let body = world.body(id).unwrap();
    assert_abs_diff_eq!(body.position.x, 100.0 + 90.0 / 30.0, epsilon = 1e-9);

    let before = body.position;
    world.step(0.0);
    world.step(f64::NAN);
    assert_eq!(world.body(id).unwrap().position, before);
}
