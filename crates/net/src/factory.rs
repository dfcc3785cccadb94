//! Constructs listeners and sockets for a chosen transport kind, and owns the
//! name→constructor registry used to instantiate replicated objects from
//! wire-transmitted type names.

use std::collections::HashMap;
use std::io;

use crate::replication::SharedReplicate;
use crate::transport::{memory, Listener, Socket, TcpListener, TcpSocket};

pub const LOCALHOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 46600;

/// Expected failure modes of `listen`/`connect`. Returned, never panicked;
/// the caller decides whether to retry or abort.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("socket creation failed: {0}")]
    Create(io::Error),
    #[error("address already in use")]
    AddrInUse,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("bind/listen failed: {0}")]
    Bind(io::Error),
    #[error("transport error: {0}")]
    Os(io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Non-blocking TCP through the OS network stack.
    Tcp,
    /// In-process loopback, for tests and single-process setups.
    Memory,
}

/// Binds a listener on `port` for the given transport kind.
pub fn listen(kind: TransportKind, port: u16) -> Result<Box<dyn Listener>, TransportError> {
    match kind {
        TransportKind::Tcp => {
            let listener = TcpListener::bind(("0.0.0.0", port)).map_err(|e| match e.kind() {
                io::ErrorKind::AddrInUse => TransportError::AddrInUse,
                io::ErrorKind::AddrNotAvailable | io::ErrorKind::PermissionDenied => {
                    TransportError::Bind(e)
                }
                _ => TransportError::Create(e),
            })?;
            Ok(Box::new(listener))
        }
        TransportKind::Memory => match memory::listen(port) {
            Some(listener) => Ok(Box::new(listener)),
            None => Err(TransportError::AddrInUse),
        },
    }
}

/// Connects to `address:port`. The in-memory transport ignores the address
/// and rendezvouses through the in-process port table.
pub fn connect(
    kind: TransportKind,
    port: u16,
    address: &str,
) -> Result<Box<dyn Socket>, TransportError> {
    match kind {
        TransportKind::Tcp => {
            let socket = TcpSocket::connect((address, port)).map_err(|e| match e.kind() {
                io::ErrorKind::ConnectionRefused => TransportError::ConnectionRefused,
                io::ErrorKind::AddrInUse => TransportError::AddrInUse,
                _ => TransportError::Os(e),
            })?;
            Ok(Box::new(socket))
        }
        TransportKind::Memory => match memory::connect(port) {
            Some(socket) => Ok(Box::new(socket)),
            None => Err(TransportError::ConnectionRefused),
        },
    }
}

type Constructor = Box<dyn Fn() -> SharedReplicate>;

/// Explicit, closed registry mapping type names (and loadable template ids)
/// to constructors. Declared at startup; no reflection involved. The client
/// uses it to instantiate objects announced by the server.
#[derive(Default)]
pub struct ObjectRegistry {
    types: HashMap<String, Constructor>,
    templates: HashMap<String, Constructor>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, type_name: &str, constructor: F)
    where
        F: Fn() -> SharedReplicate + 'static,
    {
        self.types
            .insert(type_name.to_string(), Box::new(constructor));
    }

    pub fn register_template<F>(&mut self, template_id: &str, constructor: F)
    where
        F: Fn() -> SharedReplicate + 'static,
    {
        self.templates
            .insert(template_id.to_string(), Box::new(constructor));
    }

    pub fn create(&self, type_name: &str) -> Option<SharedReplicate> {
        self.types.get(type_name).map(|ctor| ctor())
    }

    pub fn create_from_template(&self, template_id: &str) -> Option<SharedReplicate> {
        self.templates.get(template_id).map(|ctor| ctor())
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }
}
