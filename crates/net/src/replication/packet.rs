//! Reserved packet types and payload layouts of the replication protocol.
//!
//! Payloads, all big-endian:
//! - `Init`: `ClientId:u16`
//! - `AddEntity`: `TypeName:DynString` `ObjectId:u64`
//! - `AddLoadableEntity`: `TemplateId:DynString` `ObjectId:u64`
//! - `RemoveEntity`: `ObjectId:u64`
//! - `SyncEntity`: `ObjectId:u64` then the object's state bytes
//! - `Event`: `Option<ClientId>` (lossy-optional u16) then the event encoding

pub const PACKET_INIT: u16 = 0;
pub const PACKET_ADD_ENTITY: u16 = 1;
pub const PACKET_REMOVE_ENTITY: u16 = 2;
pub const PACKET_SYNC_ENTITY: u16 = 3;
pub const PACKET_EVENT: u16 = 4;
pub const PACKET_ADD_LOADABLE_ENTITY: u16 = 5;

/// First packet type available for application-defined packets.
pub const PACKET_USER_BASE: u16 = 0x1000;
