//! Outbound queue — the per-session send ring and the `link` primitive
//!
//! `link` (spec §4.2) is the sole mechanism by which frame references
//! enter a subscriber's send queue; it is reused by header sync, catch-up
//! replay, and live forwarding alike.

use tracing::error;

use crate::arena::FrameArena;
use crate::error::CacheError;
use crate::frame::Frame;
use crate::ring::Ring;

/// A session's bounded outbound send queue
pub struct OutboundQueue {
    ring: Ring<Frame>,
}

impl OutboundQueue {
    /// Create a queue with the given capacity. Capacity is fixed at
    /// session creation and shared with the publisher cache's capacity
    /// when this session is itself a publisher (spec §3, §9).
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn occupancy(&self) -> usize {
        self.ring.occupancy()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Link a frame into this queue (spec §4.2).
    ///
    /// `None` is a no-op success, matching the reference implementation's
    /// tolerance for a null frame pointer. Refuses with `Backpressure`
    /// (and logs at error severity, reporting occupancy/capacity — the
    /// only place this module logs above debug) when admitting the frame
    /// would leave no slot to distinguish full from empty.
    pub fn link(&mut self, frame: Option<Frame>, arena: &dyn FrameArena) -> Result<(), CacheError> {
        let frame = match frame {
            Some(frame) => frame,
            None => return Ok(()),
        };

        if self.ring.would_overflow() {
            error!(
                occupancy = self.ring.occupancy(),
                capacity = self.ring.capacity(),
                "link frame into full outbound queue"
            );
            return Err(CacheError::Backpressure);
        }

        let held = arena.acquire(&frame);
        self.ring.push(held);
        Ok(())
    }

    /// Advance the send cursor past the oldest queued frame and return it.
    /// Called by the network sender (out of scope for this core) once it
    /// has written that slot to the wire; the caller releases the frame
    /// via the arena when it's done with it.
    pub fn pop_sent(&mut self) -> Option<Frame> {
        self.ring.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::RefcountArena;
    use crate::frame::FrameKind;
    use bytes::Bytes;

    fn frame(ts: u32) -> Frame {
        Frame::new(FrameKind::Video, ts, 1, Bytes::new())
    }

    #[test]
    fn link_none_is_a_no_op() {
        let mut q = OutboundQueue::new(4);
        let arena = RefcountArena::new();
        assert!(q.link(None, &arena).is_ok());
        assert_eq!(q.occupancy(), 0);
    }

    #[test]
    fn link_refuses_when_queue_would_overflow() {
        let mut q = OutboundQueue::new(3);
        let arena = RefcountArena::new();
        q.link(Some(frame(0)), &arena).unwrap();
        q.link(Some(frame(1)), &arena).unwrap();
        // occupancy now 2, capacity 3: one slot reserved
        let err = q.link(Some(frame(2)), &arena).unwrap_err();
        assert_eq!(err, CacheError::Backpressure);
    }

    #[test]
    fn link_acquires_the_frame() {
        let mut q = OutboundQueue::new(4);
        let arena = RefcountArena::new();
        let f = frame(0);
        q.link(Some(f.clone()), &arena).unwrap();
        assert_eq!(f.strong_count(), 2);
        assert_eq!(arena.balance(), 1);
    }
}
