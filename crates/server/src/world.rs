use std::cell::RefCell;
use std::rc::Rc;

use tether::sample::{Prop, Puck};
use tether::{Buttons, NetEvent, ObjectId, ReplicationServer, ServerNotice};

const PUCK_SPEED: f32 = 2.0;

/// Minimal authoritative world: one player-steered puck and one ambient
/// prop, both replicated to every client.
pub const PUCK_ID: ObjectId = 1;
pub const BARREL_ID: ObjectId = 2;

pub struct World {
    server: ReplicationServer,
    puck: Rc<RefCell<Puck>>,
    barrel: Rc<RefCell<Prop>>,
    tick: u64,
}

impl World {
    pub fn new(mut server: ReplicationServer) -> Self {
        let puck = Rc::new(RefCell::new(Puck::new()));
        let barrel = Rc::new(RefCell::new(Prop::from_template(Prop::TEMPLATE_BARREL)));

        server.add_object(PUCK_ID, puck.clone());
        server.add_object(BARREL_ID, barrel.clone());

        Self {
            server,
            puck,
            barrel,
            tick: 0,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.tick += 1;

        // Ambient state change so spectators see traffic.
        if self.tick % 64 == 0 {
            let tint = self.barrel.borrow().tint();
            self.barrel.borrow_mut().set_tint(tint.wrapping_add(1));
        }

        self.server.sync();

        let events: Vec<_> = self.server.drain_events().collect();
        for (client_id, event) in events {
            match event {
                NetEvent::Input {
                    buttons,
                    axis_x,
                    axis_y,
                } => {
                    let mut dx = axis_x * PUCK_SPEED * dt;
                    let mut dy = axis_y * PUCK_SPEED * dt;
                    if buttons.contains(Buttons::FORWARD) {
                        dy += PUCK_SPEED * dt;
                    }
                    if buttons.contains(Buttons::BACK) {
                        dy -= PUCK_SPEED * dt;
                    }
                    self.puck.borrow_mut().nudge(dx, dy);
                }
                NetEvent::Text(text) => {
                    log::info!("client {client_id}: {text}");
                }
                NetEvent::Quit => {}
            }
        }

        for notice in self.server.drain_notices() {
            match notice {
                ServerNotice::ClientConnected { client_id } => {
                    log::info!("client {client_id} joined");
                }
                ServerNotice::ClientDisconnected { client_id } => {
                    log::info!("client {client_id} left");
                }
            }
        }
    }

    pub fn client_count(&self) -> usize {
        self.server.client_count()
    }

    pub fn stats(&self) -> &tether::NetStats {
        self.server.stats()
    }
}
