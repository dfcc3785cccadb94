//! Reference replicable objects. The real entity runtime lives outside this
//! crate; these implementations exist so the binaries, demo, and integration
//! tests have something concrete to replicate.

use std::cell::RefCell;
use std::rc::Rc;

use crate::codec::{ReadCursor, WriteCursor};
use crate::factory::ObjectRegistry;
use crate::replication::{NetSync, Replicate, SharedReplicate};

/// Wraps a concrete object in the shared handle the protocol works with.
pub fn shared<T: Replicate + 'static>(value: T) -> SharedReplicate {
    Rc::new(RefCell::new(value))
}

/// A constructor-instantiated object with a replicated 2D position.
pub struct Puck {
    pos_x: NetSync<f32>,
    pos_y: NetSync<f32>,
}

impl Puck {
    pub const TYPE_NAME: &'static str = "puck";

    pub fn new() -> Self {
        Self {
            pos_x: NetSync::new(0.0),
            pos_y: NetSync::new(0.0),
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (*self.pos_x.get(), *self.pos_y.get())
    }

    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.pos_x.set(self.pos_x.get() + dx);
        self.pos_y.set(self.pos_y.get() + dy);
    }
}

impl Default for Puck {
    fn default() -> Self {
        Self::new()
    }
}

impl Replicate for Puck {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn need_sync_net(&self) -> bool {
        self.pos_x.is_dirty() || self.pos_y.is_dirty()
    }

    fn write_net(&mut self, out: &mut WriteCursor) {
        out.write(self.pos_x.get());
        out.write(self.pos_y.get());
        self.pos_x.clear_dirty();
        self.pos_y.clear_dirty();
    }

    fn read_net(&mut self, input: &mut ReadCursor) -> bool {
        let (Some(x), Some(y)) = (input.read::<f32>(), input.read::<f32>()) else {
            return false;
        };
        self.pos_x.apply(x);
        self.pos_y.apply(y);
        true
    }
}

/// A template-instantiated object: clients build it from a loadable template
/// id instead of a bare constructor.
pub struct Prop {
    template: &'static str,
    tint: NetSync<u8>,
}

impl Prop {
    pub const TYPE_NAME: &'static str = "prop";
    pub const TEMPLATE_BARREL: &'static str = "barrel";

    pub fn from_template(template: &'static str) -> Self {
        Self {
            template,
            tint: NetSync::new(0),
        }
    }

    pub fn tint(&self) -> u8 {
        *self.tint.get()
    }

    pub fn set_tint(&mut self, tint: u8) {
        self.tint.set(tint);
    }
}

impl Replicate for Prop {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn template_id(&self) -> Option<&str> {
        Some(self.template)
    }

    fn need_sync_net(&self) -> bool {
        self.tint.is_dirty()
    }

    fn write_net(&mut self, out: &mut WriteCursor) {
        out.write(self.tint.get());
        self.tint.clear_dirty();
    }

    fn read_net(&mut self, input: &mut ReadCursor) -> bool {
        match input.read::<u8>() {
            Some(tint) => {
                self.tint.apply(tint);
                true
            }
            None => false,
        }
    }
}

/// Registry covering every sample type, ready for a [`ReplicationClient`].
///
/// [`ReplicationClient`]: crate::replication::ReplicationClient
pub fn sample_registry() -> ObjectRegistry {
    let mut registry = ObjectRegistry::new();
    registry.register(Puck::TYPE_NAME, || shared(Puck::new()));
    registry.register_template(Prop::TEMPLATE_BARREL, || {
        shared(Prop::from_template(Prop::TEMPLATE_BARREL))
    });
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn puck_state_round_trip() {
        let mut source = Puck::new();
        source.nudge(3.5, -1.0);
        assert!(source.need_sync_net());

        let mut out = WriteCursor::new();
        source.write_net(&mut out);
        assert!(!source.need_sync_net(), "write_net clears dirty flags");

        let mut target = Puck::new();
        let mut input = ReadCursor::new(out.as_bytes());
        assert!(target.read_net(&mut input));
        assert_eq!(target.position(), (3.5, -1.0));
    }

    #[test]
    fn read_net_does_not_dirty_the_target() {
        let mut source = Puck::new();
        source.nudge(1.0, 1.0);
        let mut out = WriteCursor::new();
        source.write_net(&mut out);

        let mut target = Puck::new();
        let mut clear = WriteCursor::new();
        target.write_net(&mut clear); // clear the initial dirtiness
        let mut input = ReadCursor::new(out.as_bytes());
        target.read_net(&mut input);
        assert!(!target.need_sync_net());
    }

    #[test]
    fn truncated_state_is_rejected() {
        let mut source = Puck::new();
        let mut out = WriteCursor::new();
        source.write_net(&mut out);

        let bytes = out.into_bytes();
        let mut input = ReadCursor::new(&bytes[..3]);
        let mut target = Puck::new();
        assert!(!target.read_net(&mut input));
    }

    #[test]
    fn registry_builds_both_kinds() {
        let registry = sample_registry();
        assert!(registry.create(Puck::TYPE_NAME).is_some());
        assert!(registry.create("unknown").is_none());
        assert!(registry
            .create_from_template(Prop::TEMPLATE_BARREL)
            .is_some());
    }
}
