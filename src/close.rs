//! Session close (spec §4.7) and the ordered-hook facade (spec §6)
//!
//! The reference module chains into the server's existing close-stream
//! handler (`next_close_stream`) rather than replacing it outright, so
//! other modules' cleanup still runs. `CloseHooks` reproduces that as an
//! explicit, ordered list instead of a single swapped-out function
//! pointer.

use crate::arena::FrameArena;
use crate::publisher::PublisherGopContext;

/// Release a publisher's cache and latched headers on stream close (spec
/// §4.7). A no-op for subscriber-only sessions — a subscriber holds no
/// cache of its own, only whatever is presently in flight in its outbound
/// queue, which the queue's own drop path accounts for.
pub fn close_publisher(publisher: PublisherGopContext, arena: &dyn FrameArena) {
    publisher.close(arena);
}

/// An ordered list of close-time callbacks, run in registration order.
///
/// Grounded on the reference module's `next_close_stream` tail-call
/// chain: each hook runs regardless of whether an earlier one panics-free
/// completes, mirroring "this module's cleanup, then hand off to
/// whatever ran before it was installed."
pub struct CloseHooks<T> {
    hooks: Vec<Box<dyn Fn(&mut T)>>,
}

impl<T> CloseHooks<T> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn register(&mut self, hook: impl Fn(&mut T) + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Run every registered hook, in registration order.
    pub fn run(&self, session: &mut T) {
        for hook in &self.hooks {
            hook(session);
        }
    }
}

impl<T> Default for CloseHooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::RefcountArena;
    use crate::codec::testing::*;
    use crate::config::GopConfig;
    use crate::frame::{Frame, FrameKind};
    use std::cell::RefCell;
    use std::time::Duration;

    #[test]
    fn close_publisher_releases_everything() {
        let config = GopConfig::with_cache_time(Duration::from_millis(1000));
        let mut publisher = PublisherGopContext::new(8, config);
        let codec = FixedCodecState::new();
        let arena = RefcountArena::new();

        let keyframe = Frame::new(FrameKind::Video, 0, 1, video_key(0, &[]));
        publisher.cache_push(keyframe, &codec, &arena).unwrap();
        assert_eq!(arena.balance(), 1);

        close_publisher(publisher, &arena);
        assert_eq!(arena.balance(), 0);
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let order = RefCell::new(Vec::new());
        let mut hooks: CloseHooks<()> = CloseHooks::new();
        hooks.register(|_| order.borrow_mut().push(1));
        hooks.register(|_| order.borrow_mut().push(2));

        hooks.run(&mut ());
        assert_eq!(*order.borrow(), vec![1, 2]);
    }
}
