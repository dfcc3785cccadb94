/// Fixed-capacity circular byte buffer sitting between the OS socket and the
/// framing layer. Never allocates, so socket polling stays allocation-free.
///
/// One slot is always reserved to tell "full" from "empty":
/// `len() + push_ability() == N - 1` holds at all times.
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> RingBuffer<N> {
    pub fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Appends one byte. Returns false (byte not stored) when full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.tail] = byte;
        self.tail = (self.tail + 1) % N;
        true
    }

    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % N;
        Some(byte)
    }

    /// Copies up to `dst.len()` bytes from the front without consuming them.
    /// Returns the number of bytes copied.
    pub fn peek(&self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.len());
        for (i, slot) in dst[..count].iter_mut().enumerate() {
            *slot = self.buf[(self.head + i) % N];
        }
        count
    }

    pub fn len(&self) -> usize {
        (self.tail + N - self.head) % N
    }

    /// Free slots available for `push`.
    pub fn push_ability(&self) -> usize {
        N - 1 - self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        (self.tail + 1) % N == self.head
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let ring = RingBuffer::<8>::new();
        assert!(ring.is_empty());
        assert!(!ring.is_full());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.push_ability(), 7);
    }

    #[test]
    fn capacity_invariant_holds_throughout() {
        let mut ring = RingBuffer::<8>::new();
        for i in 0..7 {
            assert!(ring.push(i));
            assert_eq!(ring.len() + ring.push_ability(), 7);
        }
        assert!(ring.is_full());
        assert!(!ring.push(99));
        assert_eq!(ring.len(), 7);

        ring.pop();
        assert_eq!(ring.len() + ring.push_ability(), 7);
        assert!(ring.push(99));
    }

    #[test]
    fn fifo_order_across_wrap() {
        let mut ring = RingBuffer::<4>::new();
        for round in 0..10u8 {
            assert!(ring.push(round));
            assert!(ring.push(round.wrapping_add(100)));
            assert_eq!(ring.pop(), Some(round));
            assert_eq!(ring.pop(), Some(round.wrapping_add(100)));
        }
        assert!(ring.is_empty());
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut ring = RingBuffer::<8>::new();
        for b in [10, 20, 30] {
            ring.push(b);
        }

        let mut dst = [0u8; 5];
        assert_eq!(ring.peek(&mut dst), 3);
        assert_eq!(&dst[..3], &[10, 20, 30]);
        assert_eq!(ring.len(), 3);

        let mut two = [0u8; 2];
        assert_eq!(ring.peek(&mut two), 2);
        assert_eq!(two, [10, 20]);
    }

    #[test]
    fn peek_wraps_around() {
        let mut ring = RingBuffer::<4>::new();
        ring.push(1);
        ring.push(2);
        ring.pop();
        ring.pop();
        ring.push(3);
        ring.push(4);
        ring.push(5);

        let mut dst = [0u8; 3];
        assert_eq!(ring.peek(&mut dst), 3);
        assert_eq!(dst, [3, 4, 5]);
    }
}
