//! Frame arena — external collaborator contract
//!
//! The shared frame arena (spec §6) is modeled as a trait rather than a
//! concrete allocator: `Frame` already manages its own memory via `Rc`, so
//! `acquire`/`release` here are a thin, explicit protocol layered on top
//! of that for two reasons — it matches the contract the rest of this
//! core is specified against (§4.2, §4.3, §4.7 all call `acquire`/
//! `release` explicitly), and it gives tests a way to assert the
//! refcount-balance property (P6) independently of whatever the last
//! `Rc` strong count happens to be.

use std::cell::Cell;

use crate::frame::Frame;

/// Upstream shared-frame-arena collaborator (spec §6)
pub trait FrameArena {
    /// Take a new reference to `frame` on behalf of the caller (a cache
    /// slot, a latched codec header, an outbound queue slot, ...)
    fn acquire(&self, frame: &Frame) -> Frame;

    /// Release a reference previously obtained from `acquire`
    fn release(&self, frame: Frame);
}

/// Default arena: `acquire` clones the frame's `Rc` handle, `release`
/// drops it. A running balance is kept so `balance()` can be asserted to
/// be zero at session close (P6).
#[derive(Default)]
pub struct RefcountArena {
    balance: Cell<i64>,
}

impl RefcountArena {
    pub fn new() -> Self {
        Self {
            balance: Cell::new(0),
        }
    }

    /// Outstanding acquires not yet matched by a release. Should be zero
    /// once every publisher and subscriber context fed by this arena has
    /// been closed.
    pub fn balance(&self) -> i64 {
        self.balance.get()
    }
}

impl FrameArena for RefcountArena {
    fn acquire(&self, frame: &Frame) -> Frame {
        self.balance.set(self.balance.get() + 1);
        frame.clone()
    }

    fn release(&self, frame: Frame) {
        self.balance.set(self.balance.get() - 1);
        drop(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameKind;
    use bytes::Bytes;

    #[test]
    fn balance_tracks_acquire_release() {
        let arena = RefcountArena::new();
        let frame = Frame::new(FrameKind::Video, 0, 1, Bytes::new());

        let held = arena.acquire(&frame);
        assert_eq!(arena.balance(), 1);

        arena.release(held);
        assert_eq!(arena.balance(), 0);
    }

    #[test]
    fn acquire_clones_underlying_frame() {
        let arena = RefcountArena::new();
        let frame = Frame::new(FrameKind::Audio, 0, 1, Bytes::new());
        assert_eq!(frame.strong_count(), 1);

        let held = arena.acquire(&frame);
        assert_eq!(frame.strong_count(), 2);

        arena.release(held);
        assert_eq!(frame.strong_count(), 1);
    }
}
