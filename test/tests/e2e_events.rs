/// E2E TESTS: events in both directions
///
/// Reliable events are resent until acknowledged and processed once.
/// Best-effort events get a fixed number of sends. Events addressed to an
/// entity only reach the server from the client controlling it.

use replica_shared::Event;
use replica_test::{GameActionEvent, GameEvent, GameState, TestWorld};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn notice(text: &str) -> GameEvent {
    GameEvent::Notice(text.to_string())
}

fn connected_world() -> TestWorld {
    let mut world = TestWorld::new();
    world.steps(10);
    world
}

#[test]
fn server_event_is_delivered_once() {
    init_logger();
    let mut world = connected_world();

    world
        .server
        .queue_event(world.key, &notice("welcome"), Event::<GameEvent>::SEND_RELIABLE)
        .unwrap();
    world.steps(20);

    assert_eq!(world.client_behavior.events, vec![notice("welcome")]);
    assert_eq!(world.server.pools().events.live(), 0);
}

#[test]
fn reliable_event_survives_a_lossy_link() {
    init_logger();
    let mut world = connected_world();

    world.links.to_client.set_lossy(true);
    world
        .server
        .queue_event(world.key, &notice("hold on"), Event::<GameEvent>::SEND_RELIABLE)
        .unwrap();
    world.steps(8);
    assert!(world.links.to_client.dropped_count() >= 4);
    assert!(world.client_behavior.events.is_empty());
    // still queued for resending
    assert_eq!(world.server.pools().events.live(), 1);

    world.links.to_client.set_lossy(false);
    assert!(world.step_until(20, |world| !world.client_behavior.events.is_empty()));
    assert!(world.step_until(20, |world| world.server.pools().events.live() == 0));
    world.steps(10);

    assert_eq!(world.client_behavior.events, vec![notice("hold on")]);
}

#[test]
fn best_effort_event_gives_up_after_its_attempts() {
    init_logger();
    let mut world = connected_world();

    world.links.to_client.set_lossy(true);
    world
        .server
        .queue_event(world.key, &notice("maybe"), 2)
        .unwrap();
    world.steps(8);
    world.links.to_client.set_lossy(false);
    world.steps(20);

    assert!(world.client_behavior.events.is_empty());
    assert_eq!(world.server.pools().events.live(), 0);
}

#[test]
fn client_event_reaches_the_server_once() {
    init_logger();
    let mut world = connected_world();

    let action = GameEvent::Action(GameActionEvent { key: 42 });
    world
        .client
        .queue_event(&action, Event::<GameEvent>::SEND_RELIABLE)
        .unwrap();
    world.steps(20);

    assert_eq!(world.server_behavior.events, vec![(world.key, action)]);
    assert_eq!(world.client.pools().events.live(), 0);
}

#[test]
fn entity_events_need_control() {
    init_logger();
    let mut world = TestWorld::new();
    let avatar_id = world.server.create_entity(GameState::AVATAR).unwrap();
    let dummy_id = world.server.create_entity(GameState::DUMMY).unwrap();
    world.server.grant_control(world.key, avatar_id).unwrap();
    assert!(world.step_until(40, |world| {
        world.client_entity(dummy_id).is_some()
            && world
                .client_entity(avatar_id)
                .map_or(false, |entity| entity.is_controlled())
    }));

    world
        .client
        .queue_entity_event(avatar_id, &notice("mine"), Event::<GameEvent>::SEND_RELIABLE)
        .unwrap();
    world
        .client
        .queue_entity_event(dummy_id, &notice("not mine"), Event::<GameEvent>::SEND_RELIABLE)
        .unwrap();
    world.steps(20);

    assert_eq!(
        world.server_behavior.entity_events,
        vec![(world.key, avatar_id, notice("mine"))]
    );
    assert!(world.server_behavior.events.is_empty());
}

#[test]
fn entity_event_reaches_the_client_entity() {
    init_logger();
    let mut world = TestWorld::new();
    let dummy_id = world.server.create_entity(GameState::DUMMY).unwrap();
    assert!(world.step_until(40, |world| world.client_entity(dummy_id).is_some()));

    world
        .server
        .queue_entity_event(world.key, dummy_id, &notice("poke"), Event::<GameEvent>::SEND_RELIABLE)
        .unwrap();
    world.steps(20);

    assert_eq!(
        world.client_behavior.entity_events,
        vec![(dummy_id, notice("poke"))]
    );
}

#[test]
fn client_cannot_address_unknown_entities() {
    init_logger();
    let mut world = connected_world();
    let missing = replica_shared::EntityId::new(99);

    assert!(world
        .client
        .queue_entity_event(missing, &notice("hello?"), 1)
        .is_err());
    assert_eq!(world.client.pools().events.live(), 0);
}

#[test]
fn broadcast_reaches_every_client() {
    init_logger();
    let mut world = connected_world();

    world
        .server
        .queue_event_broadcast(&notice("everyone"), Event::<GameEvent>::SEND_RELIABLE);
    world.steps(20);

    assert_eq!(world.client_behavior.events, vec![notice("everyone")]);
}

#[test]
fn event_order_is_kept() {
    init_logger();
    let mut world = connected_world();

    for key in 0..5 {
        world
            .server
            .queue_event(
                world.key,
                &GameEvent::Action(GameActionEvent { key }),
                Event::<GameEvent>::SEND_RELIABLE,
            )
            .unwrap();
    }
    world.steps(20);

    let keys: Vec<i32> = world
        .client_behavior
        .events
        .iter()
        .filter_map(|event| match event {
            GameEvent::Action(action) => Some(action.key),
            GameEvent::Notice(_) => None,
        })
        .collect();
    assert_eq!(keys, vec![0, 1, 2, 3, 4]);
}
