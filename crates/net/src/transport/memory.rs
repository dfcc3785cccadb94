use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, OnceLock};

use crate::ring::RingBuffer;

use super::{Listener, Socket, RECV_CAPACITY};

type Channel = Arc<Mutex<VecDeque<u8>>>;
type PendingQueue = Arc<Mutex<VecDeque<MemorySocket>>>;

/// In-process loopback "ports": maps a port number to the listener's pending
/// connection queue so `connect` can rendezvous with `listen` without any OS
/// networking.
fn port_table() -> &'static Mutex<HashMap<u16, PendingQueue>> {
    static TABLE: OnceLock<Mutex<HashMap<u16, PendingQueue>>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// One endpoint of an in-memory socket pair. The two endpoints share a pair
/// of one-way byte queues; everything is mutex-guarded so tests may drive the
/// two ends from different threads.
pub struct MemorySocket {
    rx: Channel,
    tx: Channel,
    ring: RingBuffer<RECV_CAPACITY>,
}

/// Creates two connected loopback sockets.
pub fn pair() -> (MemorySocket, MemorySocket) {
    let a_to_b: Channel = Arc::new(Mutex::new(VecDeque::new()));
    let b_to_a: Channel = Arc::new(Mutex::new(VecDeque::new()));

    let a = MemorySocket {
        rx: Arc::clone(&b_to_a),
        tx: Arc::clone(&a_to_b),
        ring: RingBuffer::new(),
    };
    let b = MemorySocket {
        rx: a_to_b,
        tx: b_to_a,
        ring: RingBuffer::new(),
    };
    (a, b)
}

impl Socket for MemorySocket {
    fn bufferize(&mut self) -> io::Result<usize> {
        let mut queue = self.rx.lock().expect("loopback channel poisoned");
        let mut total = 0;
        while self.ring.push_ability() > 0 {
            match queue.pop_front() {
                Some(byte) => {
                    self.ring.push(byte);
                    total += 1;
                }
                None => break,
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
        if !self.is_connected() {
            return Ok(0);
        }
        let mut queue = self.tx.lock().expect("loopback channel poisoned");
        queue.extend(bytes.iter().copied());
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        // Connected only while the peer still holds its end of both queues.
        Arc::strong_count(&self.rx) > 1 && Arc::strong_count(&self.tx) > 1
    }
}

/// Loopback listener registered in the in-process port table.
pub struct MemoryListener {
    port: u16,
    pending: PendingQueue,
}

/// Registers a loopback listener on `port`. Returns `None` when the port is
/// already taken.
pub fn listen(port: u16) -> Option<MemoryListener> {
    let mut table = port_table().lock().expect("loopback port table poisoned");
    if table.contains_key(&port) {
        return None;
    }
    let pending: PendingQueue = Arc::new(Mutex::new(VecDeque::new()));
    table.insert(port, Arc::clone(&pending));
    Some(MemoryListener { port, pending })
}

/// Connects to a loopback listener on `port`. Returns `None` (connection
/// refused) when nobody is listening.
pub fn connect(port: u16) -> Option<MemorySocket> {
    let table = port_table().lock().expect("loopback port table poisoned");
    let pending = table.get(&port)?;
    let (client_end, server_end) = pair();
    pending
        .lock()
        .expect("loopback pending queue poisoned")
        .push_back(server_end);
    Some(client_end)
}

impl Listener for MemoryListener {
    fn pull_connection(&mut self) -> Option<Box<dyn Socket>> {
        let socket = self
            .pending
            .lock()
            .expect("loopback pending queue poisoned")
            .pop_front()?;
        Some(Box::new(socket))
    }
}

impl Drop for MemoryListener {
    fn drop(&mut self) {
        let mut table = port_table().lock().expect("loopback port table poisoned");
        table.remove(&self.port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_round_trip() {
        let (mut a, mut b) = pair();
        assert_eq!(a.write(b"hello").unwrap(), 5);
        assert_eq!(b.bufferize().unwrap(), 5);
        assert_eq!(b.bytes_available(), 5);

        let mut buf = [0u8; 8];
        assert_eq!(b.read(&mut buf), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(b.bytes_available(), 0);
    }

    #[test]
    fn peek_leaves_bytes_in_place() {
        let (mut a, mut b) = pair();
        a.write(&[1, 2, 3]).unwrap();
        b.bufferize().unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(b.peek(&mut buf), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(b.bytes_available(), 3);
    }

    #[test]
    fn dropping_one_end_disconnects_the_other() {
        let (a, b) = pair();
        assert!(a.is_connected());
        assert!(b.is_connected());
        drop(b);
        assert!(!a.is_connected());
    }

    #[test]
    fn disconnected_write_accepts_nothing() {
        let (mut a, b) = pair();
        drop(b);
        assert_eq!(a.write(b"into the void").unwrap(), 0);
    }

    #[test]
    fn listen_connect_rendezvous() {
        let mut listener = listen(40100).expect("port free");
        assert!(listen(40100).is_none(), "port should be taken");

        assert!(listener.pull_connection().is_none());

        let mut client = connect(40100).expect("listener registered");
        let mut accepted = listener.pull_connection().expect("pending connection");

        client.write(b"hi").unwrap();
        accepted.bufferize().unwrap();
        let mut buf = [0u8; 2];
        accepted.read(&mut buf);
        assert_eq!(&buf, b"hi");

        drop(listener);
        assert!(connect(40100).is_none(), "port should be released");
    }

    #[test]
    fn cross_thread_traffic() {
        let (mut a, mut b) = pair();

        let writer = std::thread::spawn(move || {
            for i in 0..100u8 {
                a.write(&[i]).unwrap();
            }
            a
        });

        let mut got = Vec::new();
        while got.len() < 100 {
            b.bufferize().unwrap();
            let mut buf = [0u8; 32];
            let n = b.read(&mut buf);
            got.extend_from_slice(&buf[..n]);
            std::thread::yield_now();
        }
        writer.join().unwrap();
        assert_eq!(got, (0..100u8).collect::<Vec<_>>());
    }
}
