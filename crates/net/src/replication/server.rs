use std::collections::{HashMap, VecDeque};
use std::io;

use crate::codec::WriteCursor;
use crate::frame;
use crate::transport::Listener;

use super::packet::{
    PACKET_ADD_ENTITY, PACKET_ADD_LOADABLE_ENTITY, PACKET_EVENT, PACKET_INIT,
    PACKET_REMOVE_ENTITY, PACKET_SYNC_ENTITY,
};
use super::{ClientId, NetEvent, NetStats, ObjectId, SharedReplicate};

/// One connected client. Dropped as soon as its socket reports disconnection
/// during a sync pass.
struct ConnectionRecord {
    client_id: ClientId,
    socket: Box<dyn crate::transport::Socket>,
}

/// Connection lifecycle notifications for the surrounding application,
/// drained like any other per-tick queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerNotice {
    ClientConnected { client_id: ClientId },
    ClientDisconnected { client_id: ClientId },
}

/// Server half of the replication protocol.
///
/// The application owns the tick loop and calls [`sync`](Self::sync) on a
/// fixed interval; everything in here polls and returns immediately. Object
/// lifecycle flows in through [`add_object`](Self::add_object) /
/// [`remove_object`](Self::remove_object) queues drained on the next sync,
/// which keeps notification delivery decoupled from object lifetimes.
pub struct ReplicationServer {
    listener: Box<dyn Listener>,
    connections: Vec<ConnectionRecord>,
    next_client_id: ClientId,
    roster: HashMap<ObjectId, SharedReplicate>,
    added: VecDeque<(ObjectId, SharedReplicate)>,
    removed: VecDeque<ObjectId>,
    inbound_events: VecDeque<(ClientId, NetEvent)>,
    notices: VecDeque<ServerNotice>,
    stats: NetStats,
}

impl ReplicationServer {
    pub fn new(listener: Box<dyn Listener>) -> Self {
        Self {
            listener,
            connections: Vec::new(),
            next_client_id: 0,
            roster: HashMap::new(),
            added: VecDeque::new(),
            removed: VecDeque::new(),
            inbound_events: VecDeque::new(),
            notices: VecDeque::new(),
            stats: NetStats::new(),
        }
    }

    /// Queues an object for replication. Announced to all clients on the next
    /// sync; new clients always receive the full roster on join.
    pub fn add_object(&mut self, object_id: ObjectId, object: SharedReplicate) {
        self.added.push_back((object_id, object));
    }

    /// Queues an object for removal from the replicated set.
    pub fn remove_object(&mut self, object_id: ObjectId) {
        self.removed.push_back(object_id);
    }

    pub fn object(&self, object_id: ObjectId) -> Option<&SharedReplicate> {
        self.roster.get(&object_id)
    }

    pub fn object_count(&self) -> usize {
        self.roster.len()
    }

    pub fn client_count(&self) -> usize {
        self.connections.len()
    }

    pub fn client_ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.connections.iter().map(|record| record.client_id)
    }

    /// Input events received from clients since the last drain, tagged with
    /// the connection's server-assigned id.
    pub fn drain_events(&mut self) -> impl Iterator<Item = (ClientId, NetEvent)> + '_ {
        self.inbound_events.drain(..)
    }

    pub fn drain_notices(&mut self) -> impl Iterator<Item = ServerNotice> + '_ {
        self.notices.drain(..)
    }

    pub fn stats(&self) -> &NetStats {
        &self.stats
    }

    /// Extension point for application packet types above
    /// [`PACKET_USER_BASE`](super::PACKET_USER_BASE). Not implemented.
    pub fn broadcast_custom(&mut self, _packet_type: u16, _payload: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "custom packet broadcast is not implemented",
        ))
    }

    /// One protocol tick: refresh connections, announce lifecycle changes,
    /// replicate dirty state, collect client events, refresh statistics.
    pub fn sync(&mut self) {
        self.refresh_connections();
        self.announce_added();
        self.announce_removed();
        self.replicate_dirty();
        self.collect_packets();
        self.stats.refresh();
    }

    fn refresh_connections(&mut self) {
        let notices = &mut self.notices;
        self.connections.retain(|record| {
            if record.socket.is_connected() {
                true
            } else {
                log::info!("client {} disconnected", record.client_id);
                notices.push_back(ServerNotice::ClientDisconnected {
                    client_id: record.client_id,
                });
                false
            }
        });

        while let Some(mut socket) = self.listener.pull_connection() {
            let client_id = self.next_client_id;
            self.next_client_id += 1;

            let mut written = 0;
            let init = frame::push(socket.as_mut(), PACKET_INIT, |out| {
                out.write(&client_id);
            });
            match init {
                Ok(count) => written += count,
                Err(e) => {
                    log::warn!("failed to send init to client {client_id}: {e}");
                    continue;
                }
            }

            // Late joiner: replay the whole replicated set.
            for (&object_id, object) in &self.roster {
                match push_add_packet(socket.as_mut(), object_id, object) {
                    Ok(count) => written += count,
                    Err(e) => log::warn!("failed to announce object {object_id:#x}: {e}"),
                }
            }
            let _ = socket.flush();
            self.stats.add_out(written);

            log::info!("client {client_id} connected");
            self.notices
                .push_back(ServerNotice::ClientConnected { client_id });
            self.connections.push(ConnectionRecord { client_id, socket });
        }
    }

    fn announce_added(&mut self) {
        while let Some((object_id, object)) = self.added.pop_front() {
            let mut payload = WriteCursor::new();
            let packet_type = {
                let guard = object.borrow();
                if let Some(template_id) = guard.template_id() {
                    payload.write(template_id);
                    payload.write(&object_id);
                    PACKET_ADD_LOADABLE_ENTITY
                } else {
                    payload.write(guard.type_name());
                    payload.write(&object_id);
                    PACKET_ADD_ENTITY
                }
            };
            self.broadcast(packet_type, payload.as_bytes());
            self.roster.insert(object_id, object);
        }
    }

    fn announce_removed(&mut self) {
        while let Some(object_id) = self.removed.pop_front() {
            if self.roster.remove(&object_id).is_none() {
                log::warn!("removal of unknown object {object_id:#x} ignored");
                continue;
            }
            let mut payload = WriteCursor::new();
            payload.write(&object_id);
            self.broadcast(PACKET_REMOVE_ENTITY, payload.as_bytes());
        }
    }

    fn replicate_dirty(&mut self) {
        let mut frames = Vec::new();
        for (&object_id, object) in &self.roster {
            if !object.borrow().need_sync_net() {
                continue;
            }
            let mut payload = WriteCursor::new();
            payload.write(&object_id);
            object.borrow_mut().write_net(&mut payload);
            frames.push(payload.into_bytes());
        }

        for payload in &frames {
            self.broadcast(PACKET_SYNC_ENTITY, payload);
        }

        for record in &mut self.connections {
            if let Err(e) = record.socket.flush() {
                log::warn!("flush to client {} failed: {e}", record.client_id);
            }
        }
    }

    fn collect_packets(&mut self) {
        let mut incoming = Vec::new();
        let mut dead = Vec::new();

        for record in &mut self.connections {
            let client_id = record.client_id;
            loop {
                let pulled = frame::pull(record.socket.as_mut(), |packet_type, payload| {
                    if packet_type != PACKET_EVENT {
                        log::warn!(
                            "client {client_id} sent unexpected packet type {packet_type}, dropped"
                        );
                        return;
                    }
                    // The embedded id is the client's claim; the connection
                    // record is authoritative.
                    let claimed = payload.read::<Option<ClientId>>();
                    match (claimed, payload.read::<NetEvent>()) {
                        (Some(_), Some(event)) => incoming.push((client_id, event)),
                        _ => log::warn!("malformed event from client {client_id}, dropped"),
                    }
                });
                match pulled {
                    Ok(0) => break,
                    Ok(count) => self.stats.add_in(count),
                    Err(e) => {
                        log::warn!("stream error from client {client_id}: {e}");
                        dead.push(client_id);
                        break;
                    }
                }
            }
        }

        self.inbound_events.extend(incoming);

        for client_id in dead {
            self.connections
                .retain(|record| record.client_id != client_id);
            self.notices
                .push_back(ServerNotice::ClientDisconnected { client_id });
        }
    }

    fn broadcast(&mut self, packet_type: u16, payload: &[u8]) {
        for record in &mut self.connections {
            match frame::push_raw(record.socket.as_mut(), packet_type, payload) {
                Ok(count) => self.stats.add_out(count),
                Err(e) => log::warn!("send to client {} failed: {e}", record.client_id),
            }
        }
    }
}

fn push_add_packet(
    socket: &mut dyn crate::transport::Socket,
    object_id: ObjectId,
    object: &SharedReplicate,
) -> io::Result<usize> {
    let guard = object.borrow();
    if let Some(template_id) = guard.template_id() {
        frame::push(socket, PACKET_ADD_LOADABLE_ENTITY, |out| {
            out.write(template_id);
            out.write(&object_id);
        })
    } else {
        frame::push(socket, PACKET_ADD_ENTITY, |out| {
            out.write(guard.type_name());
            out.write(&object_id);
        })
    }
}
