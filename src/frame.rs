//! Frame — an immutable, cheaply-shared unit of media
//!
//! A `Frame` carries a typed payload (audio, video, metadata, other) and a
//! header with timestamp and stream id. It is immutable after creation;
//! derived classification (`is_av_header`, `is_keyframe`, `mandatory`) is
//! computed once on admission to a cache and carried alongside the frame
//! rather than mutating it in place (see `Classification`), which keeps
//! `Frame` a pure value type instead of threading an intrusive
//! `next_keyframe` pointer through it the way the reference implementation
//! does (see `publisher::PublisherGopContext`'s keyframe tracking).
//!
//! `Frame` wraps its payload in `Rc` rather than `Arc`: the concurrency
//! model (see crate docs) pins a publisher and all of its subscribers to a
//! single worker, so no cross-thread sharing is required.

use std::rc::Rc;

use bytes::Bytes;

/// Kind of a frame's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Audio,
    Video,
    Metadata,
    Other,
}

struct FrameInner {
    kind: FrameKind,
    timestamp: u32,
    stream_id: u32,
    payload: Bytes,
}

/// An immutable, reference-counted media frame
#[derive(Clone)]
pub struct Frame(Rc<FrameInner>);

impl Frame {
    /// Create a new frame
    pub fn new(kind: FrameKind, timestamp: u32, stream_id: u32, payload: Bytes) -> Self {
        Self(Rc::new(FrameInner {
            kind,
            timestamp,
            stream_id,
            payload,
        }))
    }

    pub fn kind(&self) -> FrameKind {
        self.0.kind
    }

    pub fn timestamp(&self) -> u32 {
        self.0.timestamp
    }

    pub fn stream_id(&self) -> u32 {
        self.0.stream_id
    }

    pub fn payload(&self) -> &Bytes {
        &self.0.payload
    }

    pub fn len(&self) -> usize {
        self.0.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.payload.is_empty()
    }

    /// Identity comparison, used in place of the reference implementation's
    /// intrusive `next_keyframe` pointer chasing: two `Frame` handles
    /// compare equal here iff they were cloned from the same admission.
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of outstanding handles to this frame (publisher cache slot,
    /// latched codec header, any number of subscriber outbound queues).
    /// Exposed for refcount-balance assertions in tests.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("kind", &self.0.kind)
            .field("timestamp", &self.0.timestamp)
            .field("stream_id", &self.0.stream_id)
            .field("len", &self.0.payload.len())
            .finish()
    }
}

/// Derived classification of a frame, computed once on admission and
/// carried alongside it (see `cache::classify`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// True if the payload is a codec initialization sequence
    pub is_av_header: bool,
    /// True for an intra-coded video picture (always false for non-video)
    pub is_keyframe: bool,
    /// True iff `is_av_header` — frames that must never be dropped by
    /// eviction without first being relatched
    pub mandatory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_accessors() {
        let f = Frame::new(FrameKind::Video, 100, 1, Bytes::from_static(&[1, 2, 3]));
        assert_eq!(f.kind(), FrameKind::Video);
        assert_eq!(f.timestamp(), 100);
        assert_eq!(f.len(), 3);
        assert!(!f.is_empty());
    }

    #[test]
    fn ptr_eq_distinguishes_clones_from_separate_frames() {
        let a = Frame::new(FrameKind::Video, 0, 1, Bytes::new());
        let b = a.clone();
        let c = Frame::new(FrameKind::Video, 0, 1, Bytes::new());

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn strong_count_tracks_clones() {
        let a = Frame::new(FrameKind::Audio, 0, 1, Bytes::new());
        assert_eq!(a.strong_count(), 1);
        let b = a.clone();
        assert_eq!(a.strong_count(), 2);
        drop(b);
        assert_eq!(a.strong_count(), 1);
    }
}
