mod cursor;
mod encode;

pub use cursor::{ReadCursor, WriteCursor};
pub use encode::{Decode, Encode};
