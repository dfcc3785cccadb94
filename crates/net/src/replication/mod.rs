mod client;
mod event;
mod packet;
mod replicate;
mod server;
mod stats;

pub use client::ReplicationClient;
pub use event::{Buttons, NetEvent};
pub use packet::{
    PACKET_ADD_ENTITY, PACKET_ADD_LOADABLE_ENTITY, PACKET_EVENT, PACKET_INIT,
    PACKET_REMOVE_ENTITY, PACKET_SYNC_ENTITY, PACKET_USER_BASE,
};
pub use replicate::{NetSync, Replicate, SharedReplicate};
pub use server::{ReplicationServer, ServerNotice};
pub use stats::NetStats;

/// Server-assigned identifier for a connected client. Unique among currently
/// connected clients, monotonically increasing, never reused within a
/// server's lifetime.
pub type ClientId = u16;

/// Globally unique identifier for a replicated object instance, assigned by
/// its creator. Never reused.
pub type ObjectId = u64;
