use super::{ReadCursor, WriteCursor};

/// Serializes a value onto a [`WriteCursor`] in wire order.
///
/// Composite types implement this themselves by encoding their fields in
/// sequence, which makes aggregate encoding recursive and self-describing
/// without an external schema.
pub trait Encode {
    fn encode(&self, out: &mut WriteCursor);
}

/// Deserializes a value from a [`ReadCursor`]. Returns `None` when
/// insufficient bytes remain or the bytes are not a valid encoding; the
/// cursor handles failure stickiness.
pub trait Decode: Sized {
    fn decode(input: &mut ReadCursor) -> Option<Self>;
}

macro_rules! impl_codec_primitive {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, out: &mut WriteCursor) {
                    out.put_slice(&self.to_be_bytes());
                }
            }

            impl Decode for $ty {
                fn decode(input: &mut ReadCursor) -> Option<Self> {
                    let raw = input.take_bytes(size_of::<$ty>())?;
                    Some(<$ty>::from_be_bytes(raw.try_into().ok()?))
                }
            }
        )*
    };
}

impl_codec_primitive!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Encode for bool {
    fn encode(&self, out: &mut WriteCursor) {
        out.put_byte(*self as u8);
    }
}

impl Decode for bool {
    fn decode(input: &mut ReadCursor) -> Option<Self> {
        match input.read::<u8>()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

// Lossy-optional encoding for unsigned integers: the stored value is shifted
// up by one and zero marks "absent". Saves the presence byte at the cost of
// the type's maximum value, which encodes as `None`. Accepted limitation:
// callers must not rely on replicating `MAX` through an optional field.
macro_rules! impl_codec_lossy_option {
    ($($ty:ty),*) => {
        $(
            impl Encode for Option<$ty> {
                fn encode(&self, out: &mut WriteCursor) {
                    match self {
                        Some(value) => out.write(&value.wrapping_add(1)),
                        None => out.write(&(0 as $ty)),
                    };
                }
            }

            impl Decode for Option<$ty> {
                fn decode(input: &mut ReadCursor) -> Option<Self> {
                    let shifted = input.read::<$ty>()?;
                    Some(shifted.checked_sub(1))
                }
            }
        )*
    };
}

impl_codec_lossy_option!(u8, u16, u32, u64);

// Dynamic data is a u32 length prefix followed by raw bytes. Reads fail
// whole when the buffer holds fewer bytes than the prefix claims.

impl Encode for [u8] {
    fn encode(&self, out: &mut WriteCursor) {
        out.write(&(self.len() as u32));
        out.put_slice(self);
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, out: &mut WriteCursor) {
        self.as_slice().encode(out);
    }
}

impl Decode for Vec<u8> {
    fn decode(input: &mut ReadCursor) -> Option<Self> {
        let length = input.read::<u32>()? as usize;
        Some(input.take_bytes(length)?.to_vec())
    }
}

impl Encode for str {
    fn encode(&self, out: &mut WriteCursor) {
        self.as_bytes().encode(out);
    }
}

impl Encode for String {
    fn encode(&self, out: &mut WriteCursor) {
        self.as_str().encode(out);
    }
}

impl Decode for String {
    fn decode(input: &mut ReadCursor) -> Option<Self> {
        let length = input.read::<u32>()? as usize;
        let raw = input.take_bytes(length)?;
        String::from_utf8(raw.to_vec()).ok()
    }
}
