use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::ring::RingBuffer;

use super::{Listener, Socket, READ_CHUNK, RECV_CAPACITY};

fn is_disconnect(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

/// Non-blocking TCP socket. `bufferize` drains the OS receive buffer in
/// [`READ_CHUNK`] slices into a ring buffer until the OS would block, the
/// ring is full, or the peer hung up.
pub struct TcpSocket {
    stream: TcpStream,
    ring: RingBuffer<RECV_CAPACITY>,
    connected: bool,
}

impl TcpSocket {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            ring: RingBuffer::new(),
            connected: true,
        })
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }
}

impl Socket for TcpSocket {
    fn bufferize(&mut self) -> io::Result<usize> {
        if !self.connected {
            return Ok(0);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let mut total = 0;

        loop {
            let room = self.ring.push_ability();
            if room == 0 {
                // Ring full: stop draining, the frame layer catches up next tick.
                break;
            }
            let want = room.min(READ_CHUNK);

            match self.stream.read(&mut chunk[..want]) {
                Ok(0) => {
                    // Orderly shutdown from the peer.
                    self.connected = false;
                    break;
                }
                Ok(count) => {
                    for &byte in &chunk[..count] {
                        self.ring.push(byte);
                    }
                    total += count;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_disconnect(e.kind()) => {
                    self.connected = false;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(total)
    }

    fn bytes_available(&self) -> usize {
        self.ring.len()
    }

    fn read(&mut self, dst: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in dst.iter_mut() {
            match self.ring.pop() {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    fn peek(&self, dst: &mut [u8]) -> usize {
        self.ring.peek(dst)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if !self.connected {
            return Ok(0);
        }

        // Semantically a blocking write: a frame must go out whole or the
        // peer's stream desynchronizes, so WouldBlock retries until the OS
        // send buffer drains.
        let mut written = 0;
        while written < bytes.len() {
            match self.stream.write(&bytes[written..]) {
                Ok(0) => {
                    self.connected = false;
                    return Ok(0);
                }
                Ok(count) => written += count,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::yield_now();
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if is_disconnect(e.kind()) => {
                    self.connected = false;
                    return Ok(0);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Raw writes go straight to the OS; nothing is staged on our side.
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Non-blocking TCP accept loop.
pub struct TcpListener {
    inner: std::net::TcpListener,
}

impl TcpListener {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let inner = std::net::TcpListener::bind(addr)?;
        inner.set_nonblocking(true)?;
        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

impl Listener for TcpListener {
    fn pull_connection(&mut self) -> Option<Box<dyn Socket>> {
        match self.inner.accept() {
            Ok((stream, addr)) => match TcpSocket::from_stream(stream) {
                Ok(socket) => {
                    log::debug!("accepted connection from {addr}");
                    Some(Box::new(socket))
                }
                Err(e) => {
                    log::warn!("failed to configure accepted socket from {addr}: {e}");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => None,
            Err(e) => {
                log::warn!("accept failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_pull_is_non_blocking() {
        let mut listener = TcpListener::bind("127.0.0.1:0").unwrap();
        assert!(listener.pull_connection().is_none());
    }

    #[test]
    fn connect_write_bufferize_read() {
        let mut listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpSocket::connect(addr).unwrap();
        let mut server_side = loop {
            if let Some(socket) = listener.pull_connection() {
                break socket;
            }
            std::thread::yield_now();
        };

        assert_eq!(client.write(b"ping").unwrap(), 4);

        let mut got = Vec::new();
        while got.len() < 4 {
            server_side.bufferize().unwrap();
            let mut buf = [0u8; 16];
            let n = server_side.read(&mut buf);
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(&got, b"ping");
    }

    #[test]
    fn peer_close_is_observed_as_disconnect() {
        let mut listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = TcpSocket::connect(addr).unwrap();
        let mut server_side = loop {
            if let Some(socket) = listener.pull_connection() {
                break socket;
            }
            std::thread::yield_now();
        };

        drop(client);

        // A zero-byte read surfaces the shutdown within a bounded number of
        // polls (the FIN has to cross the loopback first).
        let mut seen_disconnect = false;
        for _ in 0..1000 {
            server_side.bufferize().unwrap();
            if !server_side.is_connected() {
                seen_disconnect = true;
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert!(seen_disconnect);
    }
}
