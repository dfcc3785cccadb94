pub mod codec;
pub mod factory;
pub mod frame;
pub mod replication;
pub mod ring;
pub mod sample;
pub mod transport;

pub use codec::{Decode, Encode, ReadCursor, WriteCursor};
pub use factory::{
    connect, listen, ObjectRegistry, TransportError, TransportKind, DEFAULT_PORT, LOCALHOST,
};
pub use replication::{
    Buttons, ClientId, NetEvent, NetStats, NetSync, ObjectId, Replicate, ReplicationClient,
    ReplicationServer, ServerNotice, SharedReplicate, PACKET_ADD_ENTITY,
    PACKET_ADD_LOADABLE_ENTITY, PACKET_EVENT, PACKET_INIT, PACKET_REMOVE_ENTITY,
    PACKET_SYNC_ENTITY, PACKET_USER_BASE,
};
pub use ring::RingBuffer;
pub use transport::{Listener, Socket};
