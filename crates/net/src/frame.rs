//! Length+type-prefixed packet framing over a [`Socket`].
//!
//! Wire format per packet: `length:u32` (payload bytes only), `type:u16`,
//! then `length` payload bytes. The framing never looks inside the payload.

use std::io;

use crate::codec::{ReadCursor, WriteCursor};
use crate::transport::{Socket, RECV_CAPACITY};

/// Byte length of the length prefix.
pub const LENGTH_FIELD: usize = 4;
/// Byte length of the packet type field.
pub const TYPE_FIELD: usize = 2;
/// Combined header size.
pub const HEADER_SIZE: usize = LENGTH_FIELD + TYPE_FIELD;

/// Largest payload a peer may claim. A frame has to fit in the receive ring
/// in its entirety before it can be consumed, so anything above this can
/// never complete and means the stream is desynchronized or hostile.
pub const MAX_PAYLOAD: usize = RECV_CAPACITY - 1 - HEADER_SIZE;

/// Serializes a payload via `build`, then writes the complete frame to
/// `sink`. Returns the total number of bytes written (0 when the sink turned
/// out to be disconnected).
pub fn push<S, F>(sink: &mut S, packet_type: u16, build: F) -> io::Result<usize>
where
    S: Socket + ?Sized,
    F: FnOnce(&mut WriteCursor),
{
    let mut payload = WriteCursor::new();
    build(&mut payload);
    push_raw(sink, packet_type, payload.as_bytes())
}

/// Writes an already-serialized payload as one frame.
pub fn push_raw<S>(sink: &mut S, packet_type: u16, payload: &[u8]) -> io::Result<usize>
where
    S: Socket + ?Sized,
{
    debug_assert!(payload.len() <= MAX_PAYLOAD);

    let mut frame = WriteCursor::with_capacity(HEADER_SIZE + payload.len());
    frame.write(&(payload.len() as u32));
    frame.write(&packet_type);
    frame.put_slice(payload);
    sink.write(frame.as_bytes())
}

/// Pulls at most one complete frame from `source` and hands its type and a
/// payload-scoped [`ReadCursor`] to `handler`. Returns the number of bytes
/// consumed; 0 means no complete frame was available, in which case nothing
/// was consumed and the stream position is unchanged — a short read never
/// desynchronizes the stream.
pub fn pull<S, F>(source: &mut S, handler: F) -> io::Result<usize>
where
    S: Socket + ?Sized,
    F: FnOnce(u16, &mut ReadCursor),
{
    source.bufferize()?;

    let mut length_bytes = [0u8; LENGTH_FIELD];
    if source.peek(&mut length_bytes) < LENGTH_FIELD {
        return Ok(0);
    }
    let payload_len = u32::from_be_bytes(length_bytes) as usize;

    if payload_len > MAX_PAYLOAD {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame payload of {payload_len} bytes exceeds limit"),
        ));
    }

    if source.bytes_available() < HEADER_SIZE + payload_len {
        return Ok(0);
    }

    let mut header = [0u8; HEADER_SIZE];
    source.read(&mut header);
    let packet_type = u16::from_be_bytes([header[LENGTH_FIELD], header[LENGTH_FIELD + 1]]);

    let mut payload = vec![0u8; payload_len];
    source.read(&mut payload);

    let mut cursor = ReadCursor::new(&payload);
    handler(packet_type, &mut cursor);

    Ok(HEADER_SIZE + payload_len)
}
