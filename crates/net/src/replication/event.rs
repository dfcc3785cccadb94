use bitflags::bitflags;

use crate::codec::{Decode, Encode, ReadCursor, WriteCursor};

bitflags! {
    /// Pressed-button mask carried by input events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Buttons: u16 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const JUMP = 1 << 4;
        const FIRE = 1 << 5;
        const USE = 1 << 6;
    }
}

const TAG_INPUT: u8 = 0;
const TAG_TEXT: u8 = 1;
const TAG_QUIT: u8 = 2;

/// An input event forwarded from client to server.
///
/// `Quit` is local only: the client shuts itself down instead of sending it.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    Input {
        buttons: Buttons,
        axis_x: f32,
        axis_y: f32,
    },
    Text(String),
    Quit,
}

impl Encode for NetEvent {
    fn encode(&self, out: &mut WriteCursor) {
        match self {
            NetEvent::Input {
                buttons,
                axis_x,
                axis_y,
            } => {
                out.write(&TAG_INPUT);
                out.write(&buttons.bits());
                out.write(axis_x);
                out.write(axis_y);
            }
            NetEvent::Text(text) => {
                out.write(&TAG_TEXT);
                out.write(text);
            }
            NetEvent::Quit => {
                out.write(&TAG_QUIT);
            }
        }
    }
}

impl Decode for NetEvent {
    fn decode(input: &mut ReadCursor) -> Option<Self> {
        match input.read::<u8>()? {
            TAG_INPUT => {
                let bits = input.read::<u16>()?;
                let buttons = Buttons::from_bits_truncate(bits);
                let axis_x = input.read::<f32>()?;
                let axis_y = input.read::<f32>()?;
                Some(NetEvent::Input {
                    buttons,
                    axis_x,
                    axis_y,
                })
            }
            TAG_TEXT => Some(NetEvent::Text(input.read::<String>()?)),
            TAG_QUIT => Some(NetEvent::Quit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(event: NetEvent) {
        let mut out = WriteCursor::new();
        out.write(&event);
        let mut input = ReadCursor::new(out.as_bytes());
        assert_eq!(input.read::<NetEvent>(), Some(event));
    }

    #[test]
    fn event_round_trips() {
        round_trip(NetEvent::Input {
            buttons: Buttons::FORWARD | Buttons::FIRE,
            axis_x: 0.5,
            axis_y: -1.0,
        });
        round_trip(NetEvent::Text("gg".to_string()));
        round_trip(NetEvent::Quit);
    }

    #[test]
    fn unknown_tag_fails_decode() {
        let mut input = ReadCursor::new(&[0xFF]);
        assert_eq!(input.read::<NetEvent>(), None);
    }

    #[test]
    fn unknown_button_bits_are_dropped() {
        let mut out = WriteCursor::new();
        out.write(&TAG_INPUT);
        out.write(&0xFFFFu16);
        out.write(&0.0f32);
        out.write(&0.0f32);

        let mut input = ReadCursor::new(out.as_bytes());
        match input.read::<NetEvent>() {
            Some(NetEvent::Input { buttons, .. }) => assert_eq!(buttons, Buttons::all()),
            other => panic!("unexpected decode: {other:?}"),
        }
    }
}
