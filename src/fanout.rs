//! Fan-out — driving one subscriber's state machine against its publisher
//!
//! This ties `publisher::PublisherGopContext` and
//! `subscriber::SubscriberGopContext` together into the single operation a
//! session loop actually calls: make sure headers and catch-up are (still)
//! in flight, then forward the live edge once the subscriber has reached
//! `Live` (spec §4.6).

use crate::arena::FrameArena;
use crate::codec::CodecState;
use crate::error::CacheError;
use crate::frame::Frame;
use crate::publisher::PublisherGopContext;
use crate::subscriber::SubscriberGopContext;

/// A subscriber's outbound link target plus its network-sender kick.
/// Implemented by `queue::OutboundQueue`; kept as a trait so `deliver`
/// doesn't need to know about the queue's internals, only that frames can
/// be linked into it and that the sender can be told to drain (spec §6,
/// the "downstream session" collaborator).
pub trait SessionHandle {
    fn link(&mut self, frame: Option<Frame>, arena: &dyn FrameArena) -> Result<(), CacheError>;

    /// Tell the network sender there's work to drain. A no-op by default
    /// since a bare queue (as used in tests) has no attached sender.
    fn kick(&mut self) {}
}

impl SessionHandle for crate::queue::OutboundQueue {
    fn link(&mut self, frame: Option<Frame>, arena: &dyn FrameArena) -> Result<(), CacheError> {
        crate::queue::OutboundQueue::link(self, frame, arena)
    }
}

/// Drive `sub` one step against `publisher` (spec §4.6, the
/// `deliver(publisher, subscriber)` operation), called once per frame the
/// publisher admits. Thin wrapper around `SubscriberGopContext::deliver`
/// that supplies `session` as both the `link` and `kick` collaborators.
pub fn deliver(
    sub: &mut SubscriberGopContext,
    publisher: &PublisherGopContext,
    codec: &dyn CodecState,
    session: &mut dyn SessionHandle,
    arena: &dyn FrameArena,
) -> Result<(), CacheError> {
    sub.deliver(
        publisher,
        codec,
        |f| session.link(f, arena),
        || session.kick(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::RefcountArena;
    use crate::codec::testing::*;
    use crate::config::GopConfig;
    use crate::frame::FrameKind;
    use crate::queue::OutboundQueue;
    use crate::subscriber::SendGopState;
    use std::time::Duration;

    fn keyframe(ts: u32) -> Frame {
        Frame::new(FrameKind::Video, ts, 1, video_key(ts, &[]))
    }
    fn inter(ts: u32) -> Frame {
        Frame::new(FrameKind::Video, ts, 1, video_inter(&[]))
    }

    #[test]
    fn cold_subscriber_gets_cached_gop_then_live_frames() {
        let config = GopConfig::with_cache_time(Duration::from_millis(50));
        let mut publisher = PublisherGopContext::new(16, config);
        let codec = FixedCodecState::new();
        let arena = RefcountArena::new();

        publisher.cache_push(keyframe(0), &codec, &arena).unwrap();
        publisher.cache_push(inter(33), &codec, &arena).unwrap();
        publisher.cache_push(inter(66), &codec, &arena).unwrap();

        let mut sub = SubscriberGopContext::new();
        let mut session = OutboundQueue::new(16);

        deliver(&mut sub, &publisher, &codec, &mut session, &arena).unwrap();

        assert_eq!(sub.state(), SendGopState::Live);
        // ts=0, ts=33 replayed in catch-up; ts=66 forwarded live
        assert_eq!(session.occupancy(), 3);
    }

    #[test]
    fn backpressure_during_catchup_leaves_subscriber_resumable() {
        let config = GopConfig::with_cache_time(Duration::from_millis(1000));
        let mut publisher = PublisherGopContext::new(16, config);
        let codec = FixedCodecState::new();
        let arena = RefcountArena::new();

        publisher.cache_push(keyframe(0), &codec, &arena).unwrap();
        publisher.cache_push(inter(33), &codec, &arena).unwrap();
        publisher.cache_push(inter(66), &codec, &arena).unwrap();

        let mut sub = SubscriberGopContext::new();
        // capacity 2 means the outbound queue can hold at most 1 frame
        // before backpressure, so catch-up stalls after the first link.
        let mut session = OutboundQueue::new(2);

        let err = deliver(&mut sub, &publisher, &codec, &mut session, &arena).unwrap_err();
        assert_eq!(err, CacheError::Backpressure);
        assert_eq!(sub.state(), SendGopState::Catching);

        // draining and retrying resumes rather than re-sending from the top
        session.pop_sent();
        deliver(&mut sub, &publisher, &codec, &mut session, &arena).ok();
    }
}
