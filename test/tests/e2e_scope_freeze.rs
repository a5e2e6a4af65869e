/// E2E TESTS: interest management
///
/// An entity that leaves a client's scope is frozen with a single empty
/// delta, and stays frozen on the client until it comes back into scope.

use replica_shared::EntityId;
use replica_test::{read_server_packet, GameScopeEvaluator, GameState, TestWorld};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn set_x(world: &mut TestWorld, entity_id: EntityId, x: f32) {
    world
        .server
        .entity_mut(entity_id)
        .unwrap()
        .data_mut()
        .as_dummy_mut()
        .unwrap()
        .x = x;
}

fn client_x(world: &TestWorld, entity_id: EntityId) -> f32 {
    world.client_entity(entity_id).unwrap().data().as_dummy().unwrap().x
}

/// Runs a full step, counting the frozen deltas sent for `entity_id`
fn step_counting_freezes(world: &mut TestWorld, entity_id: EntityId) -> usize {
    let config = world.server.config().replication.clone();
    let mut frozen = 0;

    world.step_server();
    for payload in world.links.to_client.drain() {
        let packet = read_server_packet(&payload, &config).unwrap();
        frozen += packet
            .deltas
            .iter()
            .filter(|delta| delta.entity_id == entity_id && delta.is_frozen)
            .count();
        world.client.receive_payload(&payload).unwrap();
    }
    world.step_client();
    world.deliver_to_server();

    frozen
}

fn scoped_world() -> (TestWorld, GameScopeEvaluator, EntityId) {
    let mut world = TestWorld::new();
    let evaluator = GameScopeEvaluator::new(0.0, 0.0);
    world
        .server
        .set_scope_evaluator(world.key, Box::new(evaluator.clone()))
        .unwrap();

    let entity_id = world.server.create_entity(GameState::DUMMY).unwrap();
    set_x(&mut world, entity_id, 10.0);

    assert!(world.step_until(40, |world| {
        world
            .client_entity(entity_id)
            .map_or(false, |entity| !entity.is_frozen())
    }));
    world.steps(6);

    (world, evaluator, entity_id)
}

#[test]
fn leaving_scope_sends_exactly_one_freeze() {
    init_logger();
    let (mut world, _evaluator, entity_id) = scoped_world();

    set_x(&mut world, entity_id, 500.0);
    let mut freezes = 0;
    for _ in 0..16 {
        freezes += step_counting_freezes(&mut world, entity_id);
    }
    assert_eq!(freezes, 1);

    let entity = world.client_entity(entity_id).unwrap();
    assert!(entity.is_frozen());
    assert_eq!(world.client_behavior.frozen, vec![entity_id]);
    // the client never saw the out of scope position
    assert!((client_x(&world, entity_id) - 10.0).abs() < 0.001);

    let acked = world
        .server
        .controller(world.key)
        .unwrap()
        .scope()
        .acked_by_client()
        .get_latest(entity_id);
    assert!(acked.is_frozen);
}

#[test]
fn moving_the_viewer_freezes_too() {
    init_logger();
    let (mut world, evaluator, entity_id) = scoped_world();

    evaluator.set_origin(400.0, 400.0);
    assert!(world.step_until(40, |world| {
        world.client_entity(entity_id).unwrap().is_frozen()
    }));

    evaluator.set_origin(0.0, 0.0);
    assert!(world.step_until(40, |world| {
        !world.client_entity(entity_id).unwrap().is_frozen()
    }));
}

#[test]
fn returning_to_scope_unfreezes_with_current_state() {
    init_logger();
    let (mut world, _evaluator, entity_id) = scoped_world();

    set_x(&mut world, entity_id, 500.0);
    assert!(world.step_until(40, |world| {
        world.client_entity(entity_id).unwrap().is_frozen()
    }));

    // changed while out of scope, then back in range
    world
        .server
        .entity_mut(entity_id)
        .unwrap()
        .data_mut()
        .as_dummy_mut()
        .unwrap()
        .status = 4;
    world.steps(4);
    set_x(&mut world, entity_id, 20.0);

    assert!(world.step_until(40, |world| {
        !world.client_entity(entity_id).unwrap().is_frozen()
    }));
    assert!(world.step_until(10, |world| (client_x(world, entity_id) - 20.0).abs() < 0.001));

    let dummy = world.client_entity(entity_id).unwrap().data().as_dummy().unwrap();
    assert_eq!(dummy.status, 4);
    // once when first seen, once on return
    assert_eq!(world.client_behavior.unfrozen, vec![entity_id, entity_id]);
    assert_eq!(world.client_behavior.frozen, vec![entity_id]);
}

#[test]
fn controlled_entities_ignore_scope() {
    init_logger();
    let mut world = TestWorld::new();
    world
        .server
        .set_scope_evaluator(world.key, Box::new(GameScopeEvaluator::new(0.0, 0.0)))
        .unwrap();

    let avatar_id = world.server.create_entity(GameState::AVATAR).unwrap();
    world
        .server
        .entity_mut(avatar_id)
        .unwrap()
        .data_mut()
        .as_avatar_mut()
        .unwrap()
        .x = 300.0;
    world.server.grant_control(world.key, avatar_id).unwrap();

    assert!(world.step_until(40, |world| {
        world
            .client_entity(avatar_id)
            .map_or(false, |entity| entity.is_controlled() && !entity.is_frozen())
    }));
}
