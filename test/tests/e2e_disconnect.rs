/// E2E TESTS: connections coming and going
///
/// Transport failures are reported, not fatal. Removing a connection tells
/// the behavior, revokes control and releases everything queued for it.

use replica_shared::{Event, TransportError};
use replica_test::{GameEvent, GameState, TestWorld};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn join_is_announced_on_the_first_update() {
    init_logger();
    let mut world = TestWorld::new();
    assert!(world.server_behavior.joined.is_empty());

    world.step();
    assert_eq!(world.server_behavior.joined, vec![world.key]);
    assert!(world.server_behavior.left.is_empty());
}

#[test]
fn closed_link_is_reported_on_both_sides() {
    init_logger();
    let mut world = TestWorld::new();
    world.steps(4);

    world.links.to_client.close();
    world.links.to_server.close();
    world.steps(4);

    let server_errors = world.server.take_transport_errors();
    assert!(!server_errors.is_empty());
    assert!(server_errors
        .iter()
        .all(|(key, error)| *key == world.key && *error == TransportError::Disconnected));
    // taking them clears them
    assert!(world.server.take_transport_errors().is_empty());

    let client_errors = world.client.take_transport_errors();
    assert!(!client_errors.is_empty());
    assert!(client_errors
        .iter()
        .all(|error| *error == TransportError::Disconnected));
}

#[test]
fn oversized_payload_is_a_send_failure() {
    init_logger();
    let mut world = TestWorld::new();
    // a link smaller than the packets the worlds write
    world.links.to_client = replica_test::LocalLink::new(4);
    world.server.remove_connection(world.key).unwrap();
    world.key = world.server.add_connection(world.links.to_client.connection());
    world.server.create_entity(GameState::DUMMY).unwrap();

    world.steps(2);
    let errors = world.server.take_transport_errors();
    assert!(matches!(
        errors.first(),
        Some((_, TransportError::SendFailed { .. }))
    ));
}

#[test]
fn removing_a_connection_cleans_up() {
    init_logger();
    let mut world = TestWorld::new();
    let avatar_id = world.server.create_entity(GameState::AVATAR).unwrap();
    world.server.grant_control(world.key, avatar_id).unwrap();
    assert!(world.step_until(40, |world| {
        world
            .client_entity(avatar_id)
            .map_or(false, |entity| entity.is_controlled())
    }));

    world
        .server
        .queue_event(
            world.key,
            &GameEvent::Notice("bye".to_string()),
            Event::<GameEvent>::SEND_RELIABLE,
        )
        .unwrap();
    assert_eq!(world.server.pools().events.live(), 1);

    let key = world.key;
    world.server.remove_connection(key).unwrap();
    assert_eq!(world.server.pools().events.live(), 0);
    assert!(world.server.remove_connection(key).is_err());
    assert!(world.server.receive_payload(key, &[1, 2, 3]).is_err());

    world.step_server();
    assert_eq!(world.server_behavior.left, vec![key]);
    assert!(world.server.controller(key).is_none());

    let avatar = world.server_entity(avatar_id).unwrap();
    assert!(!avatar.is_controlled());
    assert_eq!(
        world.server_behavior.controller_changes.last(),
        Some(&(avatar_id, None))
    );
    // nothing is sent to a removed connection
    assert_eq!(world.links.to_client.pending(), 0);
}

#[test]
fn reconnecting_client_gets_a_fresh_start() {
    init_logger();
    let mut world = TestWorld::new();
    let entity_id = world.server.create_entity(GameState::DUMMY).unwrap();
    assert!(world.step_until(40, |world| world.client_entity(entity_id).is_some()));

    world.server.remove_connection(world.key).unwrap();
    let links = replica_test::LocalConnectionPair::new(
        world.server.config().replication.packcap_message_total,
    );
    world.key = world.server.add_connection(links.to_client.connection());
    world.client = replica_client::ClientWorld::new(replica_client::ClientConfig::default());
    world.client.set_connection(links.to_server.connection()).unwrap();
    world.links = links;
    world.client_behavior = Default::default();

    assert!(world.step_until(40, |world| world.client_entity(entity_id).is_some()));
    assert_eq!(world.client_behavior.started, vec![entity_id]);
    assert_eq!(world.server_behavior.joined.len(), 2);
}
