//! Single-process walkthrough of the replication protocol over the
//! in-memory transport: spawn, steer, observe, disconnect.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use tether::sample::{sample_registry, Prop, Puck};
use tether::{
    connect, listen, Buttons, NetEvent, ReadCursor, ReplicationClient, ReplicationServer,
    TransportKind, WriteCursor, LOCALHOST,
};

const PORT: u16 = 46650;
const PUCK_ID: u64 = 1;

fn mirrored_position(client: &ReplicationClient) -> Option<(f32, f32)> {
    let object = client.object(PUCK_ID)?;
    let mut state = WriteCursor::new();
    object.borrow_mut().write_net(&mut state);
    let mut input = ReadCursor::new(state.as_bytes());
    Some((input.read::<f32>()?, input.read::<f32>()?))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let listener = listen(TransportKind::Memory, PORT)?;
    let mut server = ReplicationServer::new(listener);

    let puck = Rc::new(RefCell::new(Puck::new()));
    server.add_object(PUCK_ID, puck.clone());
    server.add_object(2, Rc::new(RefCell::new(Prop::from_template(Prop::TEMPLATE_BARREL))));

    let socket = connect(TransportKind::Memory, PORT, LOCALHOST)?;
    let mut client = ReplicationClient::new(socket, sample_registry());

    for tick in 0..20u32 {
        client.push_event(NetEvent::Input {
            buttons: Buttons::FORWARD,
            axis_x: 0.5,
            axis_y: 0.0,
        });
        client.sync();
        server.sync();

        // Authoritative movement from the received input.
        let events: Vec<_> = server.drain_events().collect();
        for (_, event) in events {
            if let NetEvent::Input { axis_x, .. } = event {
                puck.borrow_mut().nudge(axis_x, 1.0);
            }
        }
        server.sync();
        client.sync();

        if tick % 5 == 4 {
            let truth = puck.borrow().position();
            let mirror = mirrored_position(&client);
            log::info!("tick {tick}: server puck {truth:?}, client mirror {mirror:?}");
        }
    }

    log::info!(
        "replicated {} object(s) to client {:?}",
        client.object_count(),
        client.client_id()
    );

    drop(server);
    client.sync();
    log::info!("server dropped, client connected: {}", client.is_connected());

    Ok(())
}
