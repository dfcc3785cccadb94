pub(crate) mod memory;
mod tcp;

use std::io;

pub use memory::{pair, MemoryListener, MemorySocket};
pub use tcp::{TcpListener, TcpSocket};

/// Receive ring capacity per socket. One slot is reserved by the ring, and a
/// complete frame must fit in the ring before the framing layer will consume
/// it, so the largest usable frame is `RECV_CAPACITY - 1` bytes.
pub const RECV_CAPACITY: usize = 64 * 1024;

/// How many bytes a single OS read may pull while draining the socket.
pub const READ_CHUNK: usize = 4096;

/// A bidirectional, non-blocking byte stream.
///
/// Reads are two-phase: `bufferize` pulls whatever the OS (or the peer, for
/// the in-memory transport) has ready into internal buffering, then `read` /
/// `peek` operate on those buffered bytes. None of the methods block; when
/// nothing is ready they report zero bytes and the caller polls again next
/// tick.
pub trait Socket: Send {
    /// Pulls newly available bytes into the internal buffer. Returns how many
    /// arrived. Stops early when the buffer is full (backpressure). Peer
    /// shutdown or reset flips `is_connected` to false; any other OS error is
    /// fatal for this stream.
    fn bufferize(&mut self) -> io::Result<usize>;

    /// Buffered bytes ready for `read`/`peek`.
    fn bytes_available(&self) -> usize;

    /// Copies up to `dst.len()` buffered bytes into `dst`, consuming them.
    fn read(&mut self, dst: &mut [u8]) -> usize;

    /// Copies up to `dst.len()` buffered bytes without consuming them.
    fn peek(&self, dst: &mut [u8]) -> usize;

    /// Hands bytes to the peer. Returns the number accepted; a connection
    /// reset degrades to `Ok(0)` with `is_connected` now false.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()>;

    fn is_connected(&self) -> bool;
}

/// Accepts inbound connections without blocking.
pub trait Listener: Send {
    /// Returns the next pending connection, or `None` when nobody is waiting.
    fn pull_connection(&mut self) -> Option<Box<dyn Socket>>;
}
