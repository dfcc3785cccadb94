use std::collections::{HashMap, VecDeque};

use crate::codec::ReadCursor;
use crate::factory::ObjectRegistry;
use crate::frame;
use crate::transport::Socket;

use super::packet::{
    PACKET_ADD_ENTITY, PACKET_ADD_LOADABLE_ENTITY, PACKET_EVENT, PACKET_INIT,
    PACKET_REMOVE_ENTITY, PACKET_SYNC_ENTITY,
};
use super::{ClientId, NetEvent, NetStats, ObjectId, SharedReplicate};

/// A packet decoded off the wire, lifted out of the frame handler so it can
/// be applied with full access to the client state.
enum Incoming {
    Init(ClientId),
    Add { type_name: String, object_id: ObjectId },
    AddLoadable { template_id: String, object_id: ObjectId },
    Remove(ObjectId),
    Sync { object_id: ObjectId, state: Vec<u8> },
    Malformed(u16),
}

/// Client half of the replication protocol.
///
/// Mirrors the server's replicated set locally: objects are instantiated
/// through the registry when announced, fed state through `read_net`, and
/// queued for destruction when removed. Input events queued via
/// [`push_event`](Self::push_event) are forwarded each sync.
pub struct ReplicationClient {
    socket: Box<dyn Socket>,
    registry: ObjectRegistry,
    client_id: Option<ClientId>,
    connected: bool,
    quit: bool,
    roster: HashMap<ObjectId, SharedReplicate>,
    outgoing: VecDeque<NetEvent>,
    spawned: VecDeque<(ObjectId, SharedReplicate)>,
    despawned: VecDeque<ObjectId>,
    stats: NetStats,
}

impl ReplicationClient {
    pub fn new(socket: Box<dyn Socket>, registry: ObjectRegistry) -> Self {
        Self {
            socket,
            registry,
            client_id: None,
            connected: true,
            quit: false,
            roster: HashMap::new(),
            outgoing: VecDeque::new(),
            spawned: VecDeque::new(),
            despawned: VecDeque::new(),
            stats: NetStats::new(),
        }
    }

    /// Queues a local input event for forwarding on the next sync.
    pub fn push_event(&mut self, event: NetEvent) {
        self.outgoing.push_back(event);
    }

    /// Assigned by the server's `Init` packet; `None` until it arrives.
    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// True once a `Quit` event has been processed. The application stops
    /// calling `sync` and tears down.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn object(&self, object_id: ObjectId) -> Option<&SharedReplicate> {
        self.roster.get(&object_id)
    }

    pub fn object_count(&self) -> usize {
        self.roster.len()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.roster.keys().copied()
    }

    /// Objects instantiated since the last drain.
    pub fn take_spawned(&mut self) -> impl Iterator<Item = (ObjectId, SharedReplicate)> + '_ {
        self.spawned.drain(..)
    }

    /// Ids whose objects were removed since the last drain.
    pub fn take_despawned(&mut self) -> impl Iterator<Item = ObjectId> + '_ {
        self.despawned.drain(..)
    }

    pub fn stats(&self) -> &NetStats {
        &self.stats
    }

    /// One protocol tick: forward queued events, apply everything the server
    /// sent, observe disconnection, refresh statistics.
    pub fn sync(&mut self) {
        if self.connected {
            self.forward_events();
        }
        self.apply_incoming();

        if self.connected && !self.socket.is_connected() {
            log::info!("server connection lost");
            self.connected = false;
        }
        self.stats.refresh();
    }

    fn forward_events(&mut self) {
        let mut sent_any = false;
        while let Some(event) = self.outgoing.pop_front() {
            if matches!(event, NetEvent::Quit) {
                log::info!("quit requested, shutting down");
                self.quit = true;
                continue;
            }
            let client_id = self.client_id;
            match frame::push(self.socket.as_mut(), PACKET_EVENT, |out| {
                out.write(&client_id);
                out.write(&event);
            }) {
                Ok(count) => {
                    self.stats.add_out(count);
                    sent_any = true;
                }
                Err(e) => log::warn!("failed to forward event: {e}"),
            }
        }
        if sent_any {
            if let Err(e) = self.socket.flush() {
                log::warn!("flush to server failed: {e}");
            }
        }
    }

    fn apply_incoming(&mut self) {
        loop {
            let mut incoming = None;
            let pulled = frame::pull(self.socket.as_mut(), |packet_type, payload| {
                incoming = Some(decode_packet(packet_type, payload));
            });
            match pulled {
                Ok(0) => break,
                Ok(count) => self.stats.add_in(count),
                Err(e) => {
                    log::warn!("stream error from server: {e}");
                    self.connected = false;
                    break;
                }
            }
            if let Some(incoming) = incoming {
                self.apply_packet(incoming);
            }
        }
    }

    fn apply_packet(&mut self, incoming: Incoming) {
        match incoming {
            Incoming::Init(client_id) => {
                log::info!("registered with server as client {client_id}");
                self.client_id = Some(client_id);
            }
            Incoming::Add {
                type_name,
                object_id,
            } => match self.registry.create(&type_name) {
                Some(object) => self.bind_object(object_id, object),
                None => log::warn!("no constructor registered for type '{type_name}', dropped"),
            },
            Incoming::AddLoadable {
                template_id,
                object_id,
            } => match self.registry.create_from_template(&template_id) {
                Some(object) => self.bind_object(object_id, object),
                None => log::warn!("no template registered for '{template_id}', dropped"),
            },
            Incoming::Remove(object_id) => {
                if self.roster.remove(&object_id).is_some() {
                    self.despawned.push_back(object_id);
                } else {
                    log::warn!("removal of unknown object {object_id:#x}, dropped");
                }
            }
            Incoming::Sync { object_id, state } => match self.roster.get(&object_id) {
                Some(object) => {
                    let mut cursor = ReadCursor::new(&state);
                    if !object.borrow_mut().read_net(&mut cursor) {
                        log::warn!("state decode failed for object {object_id:#x}, dropped");
                    }
                }
                None => log::warn!("state for unknown object {object_id:#x}, dropped"),
            },
            Incoming::Malformed(packet_type) => {
                log::warn!("malformed packet of type {packet_type}, dropped");
            }
        }
    }

    fn bind_object(&mut self, object_id: ObjectId, object: SharedReplicate) {
        if self.roster.contains_key(&object_id) {
            log::warn!("duplicate add for object {object_id:#x}, dropped");
            return;
        }
        self.spawned.push_back((object_id, object.clone()));
        self.roster.insert(object_id, object);
    }
}

fn decode_packet(packet_type: u16, payload: &mut ReadCursor) -> Incoming {
    match packet_type {
        PACKET_INIT => match payload.read::<ClientId>() {
            Some(client_id) => Incoming::Init(client_id),
            None => Incoming::Malformed(packet_type),
        },
        PACKET_ADD_ENTITY => match (payload.read::<String>(), payload.read::<ObjectId>()) {
            (Some(type_name), Some(object_id)) => Incoming::Add {
                type_name,
                object_id,
            },
            _ => Incoming::Malformed(packet_type),
        },
        PACKET_ADD_LOADABLE_ENTITY => match (payload.read::<String>(), payload.read::<ObjectId>())
        {
            (Some(template_id), Some(object_id)) => Incoming::AddLoadable {
                template_id,
                object_id,
            },
            _ => Incoming::Malformed(packet_type),
        },
        PACKET_REMOVE_ENTITY => match payload.read::<ObjectId>() {
            Some(object_id) => Incoming::Remove(object_id),
            None => Incoming::Malformed(packet_type),
        },
        PACKET_SYNC_ENTITY => match payload.read::<ObjectId>() {
            Some(object_id) => {
                let state = payload
                    .take_bytes(payload.remaining())
                    .unwrap_or_default()
                    .to_vec();
                Incoming::Sync { object_id, state }
            }
            None => Incoming::Malformed(packet_type),
        },
        other => Incoming::Malformed(other),
    }
}
