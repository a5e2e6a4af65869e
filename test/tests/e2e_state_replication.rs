/// E2E TESTS: state deltas from server to client
///
/// A new entity reaches the client complete, immutable data included.
/// After the client has acknowledged it, only the mutable fields that
/// changed are sent.

use replica_shared::EntityId;
use replica_test::{read_server_packet, DummyEntityState, GameState, TestWorld};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn spawn_dummy(world: &mut TestWorld) -> EntityId {
    let entity_id = world.server.create_entity(GameState::DUMMY).unwrap();
    let dummy = world
        .server
        .entity_mut(entity_id)
        .unwrap()
        .data_mut()
        .as_dummy_mut()
        .unwrap();
    dummy.archetype_id = 7;
    dummy.user_id = 3;
    entity_id
}

/// Steps only the server until it sends, and returns what it sent
fn next_server_packets(world: &mut TestWorld) -> Vec<Vec<u8>> {
    for _ in 0..4 {
        world.step_server();
        let packets = world.links.to_client.drain();
        if !packets.is_empty() {
            return packets;
        }
    }
    Vec::new()
}

fn client_dummy(world: &TestWorld, entity_id: EntityId) -> Option<DummyEntityState> {
    world
        .client_entity(entity_id)
        .and_then(|entity| entity.data().as_dummy().cloned())
}

#[test]
fn first_delta_carries_every_field() {
    init_logger();
    let mut world = TestWorld::new();
    let entity_id = spawn_dummy(&mut world);

    let packets = next_server_packets(&mut world);
    assert_eq!(packets.len(), 1);

    let packet = read_server_packet(&packets[0], &world.server.config().replication).unwrap();
    assert_eq!(packet.header.sender_tick, world.server.tick());

    let delta = packet.delta_for(entity_id).expect("the new entity should be sent");
    assert!(!delta.is_frozen);
    let state = delta.state.as_ref().unwrap();
    assert_eq!(state.flags, DummyEntityState::ALL);
    assert!(state.has_immutable_data);
    assert!(!state.has_controller_data);
    assert_eq!(state.data.as_dummy().unwrap().archetype_id, 7);
    assert_eq!(state.data.as_dummy().unwrap().user_id, 3);
}

#[test]
fn client_builds_the_entity_once_its_clock_catches_up() {
    init_logger();
    let mut world = TestWorld::new();
    let entity_id = spawn_dummy(&mut world);

    assert!(world.step_until(40, |world| world.client_entity(entity_id).is_some()));

    let entity = world.client_entity(entity_id).unwrap();
    assert_eq!(entity.kind(), GameState::DUMMY);
    assert!(!entity.is_frozen());
    assert!(entity.auth_tick() <= world.server.tick());
    assert_eq!(world.client_behavior.started, vec![entity_id]);

    let dummy = client_dummy(&world, entity_id).unwrap();
    assert_eq!(dummy.archetype_id, 7);
    assert_eq!(dummy.user_id, 3);
    assert_eq!(dummy.x, 0.0);
}

#[test]
fn mutable_change_sends_only_its_flag() {
    init_logger();
    let mut world = TestWorld::new();
    let entity_id = spawn_dummy(&mut world);

    assert!(world.step_until(40, |world| world.client_entity(entity_id).is_some()));
    // let the client's acknowledgements reach the server
    world.steps(10);
    let acked = world
        .server
        .controller(world.key)
        .unwrap()
        .scope()
        .acked_by_client()
        .get_latest(entity_id);
    assert!(acked.tick.is_valid());
    assert!(!acked.is_frozen);

    world
        .server
        .entity_mut(entity_id)
        .unwrap()
        .data_mut()
        .as_dummy_mut()
        .unwrap()
        .x = 5.0;

    let packets = next_server_packets(&mut world);
    let config = world.server.config().replication.clone();
    let delta_flags: Vec<(u32, bool)> = packets
        .iter()
        .map(|payload| read_server_packet(payload, &config).unwrap())
        .filter_map(|packet| {
            packet.delta_for(entity_id).and_then(|delta| {
                delta
                    .state
                    .as_ref()
                    .map(|state| (state.flags, state.has_immutable_data))
            })
        })
        .collect();
    assert_eq!(delta_flags, vec![(DummyEntityState::X, false)]);

    for payload in &packets {
        world.client.receive_payload(payload).unwrap();
    }
    assert!(world.step_until(40, |world| {
        client_dummy(world, entity_id).map_or(false, |dummy| (dummy.x - 5.0).abs() < 0.001)
    }));

    let dummy = client_dummy(&world, entity_id).unwrap();
    assert_eq!(dummy.y, 0.0);
    assert_eq!(dummy.archetype_id, 7);
}

#[test]
fn unchanged_entities_are_not_resent() {
    init_logger();
    let mut world = TestWorld::new();
    let entity_id = spawn_dummy(&mut world);

    assert!(world.step_until(40, |world| world.client_entity(entity_id).is_some()));
    world.steps(10);

    let packets = next_server_packets(&mut world);
    assert_eq!(packets.len(), 1);
    let packet = read_server_packet(&packets[0], &world.server.config().replication).unwrap();
    assert!(packet.delta_for(entity_id).is_none());
}

#[test]
fn every_kind_replicates() {
    init_logger();
    let mut world = TestWorld::new();
    let dummy_id = spawn_dummy(&mut world);
    let avatar_id = world.server.create_entity(GameState::AVATAR).unwrap();
    {
        let avatar = world
            .server
            .entity_mut(avatar_id)
            .unwrap()
            .data_mut()
            .as_avatar_mut()
            .unwrap();
        avatar.user_id = 11;
        avatar.x = -3.5;
    }

    assert!(world.step_until(40, |world| {
        world.client_entity(dummy_id).is_some() && world.client_entity(avatar_id).is_some()
    }));

    let avatar = world.client_entity(avatar_id).unwrap();
    assert_eq!(avatar.kind(), GameState::AVATAR);
    let data = avatar.data().as_avatar().unwrap();
    assert_eq!(data.user_id, 11);
    assert!((data.x + 3.5).abs() < 0.001);
    assert!(!avatar.is_controlled());
}

#[test]
fn many_entities_fit_under_the_packet_cap() {
    init_logger();
    let mut world = TestWorld::new();
    let mut spawned = Vec::new();
    for index in 0..200 {
        let entity_id = world.server.create_entity(GameState::DUMMY).unwrap();
        let dummy = world
            .server
            .entity_mut(entity_id)
            .unwrap()
            .data_mut()
            .as_dummy_mut()
            .unwrap();
        dummy.x = index as f32;
        dummy.status = index as u8;
        spawned.push(entity_id);
    }

    assert!(world.step_until(300, |world| world.client.entities().count() == spawned.len()));
    // the link refuses anything over the cap, so every send went through
    assert!(world.server.take_transport_errors().is_empty());

    for (index, entity_id) in spawned.iter().enumerate() {
        let dummy = world.client_entity(*entity_id).unwrap().data().as_dummy().unwrap();
        assert!((dummy.x - index as f32).abs() < 0.001);
    }
}

#[test]
fn client_world_tick_trails_the_server() {
    init_logger();
    let mut world = TestWorld::new();
    world.steps(40);

    let server_tick = world.server.tick();
    let client_view = world.client.server_tick();
    assert!(client_view.is_valid());
    assert!(client_view < server_tick);

    let lag = server_tick - client_view;
    let config = &world.server.config().replication;
    let delay_max = config.clock_delay_max as i32 + config.network_send_rate as i32;
    assert!(
        (config.clock_delay_min as i32..=delay_max).contains(&lag),
        "lag of {} ticks",
        lag
    );

    // the server's estimate of the client's clock trails it the same way
    let estimate = world.server.controller(world.key).unwrap().estimated_remote_tick();
    assert!(estimate.is_valid());
    assert!(estimate < world.client.local_tick());
}
