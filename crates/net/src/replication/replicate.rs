use std::cell::RefCell;
use std::rc::Rc;

use crate::codec::{ReadCursor, WriteCursor};

/// The contract between the replication protocol and a replicable object.
///
/// Implemented by the entity runtime, not by this crate; the protocol only
/// needs to ask "did anything change", serialize the changes, and feed
/// received state back in.
pub trait Replicate {
    /// Registered type name used to instantiate this object on the client.
    fn type_name(&self) -> &'static str;

    /// Loadable template id, for objects instantiated from a template rather
    /// than a bare constructor.
    fn template_id(&self) -> Option<&str> {
        None
    }

    /// True when any tracked field changed since the last `write_net`.
    fn need_sync_net(&self) -> bool;

    /// Serializes all tracked fields and clears their dirty flags.
    fn write_net(&mut self, out: &mut WriteCursor);

    /// Applies received state. Returns false when the payload failed to
    /// decode; the caller logs and drops, the session continues.
    fn read_net(&mut self, input: &mut ReadCursor) -> bool;
}

/// Shared handle to a replicated object. The protocol is single-threaded by
/// construction, so plain `Rc<RefCell>` ownership is enough.
pub type SharedReplicate = Rc<RefCell<dyn Replicate>>;

/// Mark-dirty-on-write wrapper for a replicated field.
///
/// A fresh wrapper starts dirty so the initial value reaches clients on the
/// first sync.
#[derive(Debug, Clone)]
pub struct NetSync<T> {
    value: T,
    dirty: bool,
}

impl<T> NetSync<T> {
    pub fn new(value: T) -> Self {
        Self { value, dirty: true }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.dirty = true;
    }

    /// Mutable access marks the field dirty, whether or not it actually ends
    /// up modified.
    pub fn get_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.value
    }

    /// Overwrites the value without touching the dirty flag. For applying
    /// state received from the wire.
    pub fn apply(&mut self, value: T) {
        self.value = value;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

impl<T: Clone> NetSync<T> {
    /// Returns the value and clears the dirty flag if the field changed since
    /// the last take, `None` otherwise.
    pub fn take_and_clear(&mut self) -> Option<T> {
        if self.dirty {
            self.dirty = false;
            Some(self.value.clone())
        } else {
            None
        }
    }
}
