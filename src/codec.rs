//! Codec state — external collaborator contract
//!
//! The codec module (out of scope for this core, per spec) is consumed
//! through this trait: it exposes the current metadata frame and its
//! monotonically-increasing version, plus the two predicates used to
//! classify a frame's payload. Production code supplies a real
//! implementation backed by SPS/PPS and AudioSpecificConfig inspection;
//! tests use `codec::testing::FixedCodecState`.

use crate::frame::Frame;

/// Video frame type as classified by the codec layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFrameKind {
    Key,
    Inter,
    Other,
}

/// Upstream codec-state collaborator (spec §6)
pub trait CodecState {
    /// True if `payload` is a codec initialization sequence (SPS/PPS,
    /// AudioSpecificConfig, ...)
    fn is_codec_header(&self, payload: &[u8]) -> bool;

    /// Classify a video payload's frame type. Only ever called for video
    /// frames.
    fn video_frame_type(&self, payload: &[u8]) -> VideoFrameKind;

    /// The current metadata frame (onMetaData-equivalent), if any
    fn meta(&self) -> Option<Frame>;

    /// Monotonically increasing version of `meta()`; bumped each time the
    /// publisher's metadata changes
    fn meta_version(&self) -> u64;
}

/// Classify a frame against the current codec state (spec §4.1)
///
/// Idempotent and side-effect free; called exactly once per admitted frame
/// by `PublisherGopContext::cache_push`. Non audio/video frames classify
/// as all-false.
pub fn classify(frame: &Frame, codec: &dyn CodecState) -> crate::frame::Classification {
    use crate::frame::{Classification, FrameKind};

    match frame.kind() {
        FrameKind::Audio | FrameKind::Video => {
            let is_av_header = codec.is_codec_header(frame.payload());
            let is_keyframe = frame.kind() == FrameKind::Video
                && codec.video_frame_type(frame.payload()) == VideoFrameKind::Key;
            Classification {
                is_av_header,
                is_keyframe,
                mandatory: is_av_header,
            }
        }
        FrameKind::Metadata | FrameKind::Other => Classification::default(),
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod testing {
    use super::*;
    use bytes::Bytes;
    use std::cell::Cell;

    /// A `CodecState` double for tests: classification is driven by a
    /// sentinel first byte (`0x00` = header) rather than real SPS/PPS
    /// parsing, mirroring the byte-sentinel convention used throughout
    /// this crate's tests.
    pub struct FixedCodecState {
        meta: Cell<Option<Frame>>,
        version: Cell<u64>,
    }

    impl FixedCodecState {
        pub fn new() -> Self {
            Self {
                meta: Cell::new(None),
                version: Cell::new(0),
            }
        }

        pub fn set_meta(&self, frame: Frame) {
            self.meta.set(Some(frame));
            self.version.set(self.version.get() + 1);
        }
    }

    impl Default for FixedCodecState {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CodecState for FixedCodecState {
        fn is_codec_header(&self, payload: &[u8]) -> bool {
            payload.first() == Some(&0x00)
        }

        fn video_frame_type(&self, payload: &[u8]) -> VideoFrameKind {
            match payload.first() {
                Some(&0x01) => VideoFrameKind::Key,
                Some(&0x02) => VideoFrameKind::Inter,
                _ => VideoFrameKind::Other,
            }
        }

        fn meta(&self) -> Option<Frame> {
            // Cell<Option<Frame>> doesn't implement Clone-through-get, so
            // take/replace round-trips the value.
            let value = self.meta.take();
            self.meta.set(value.clone());
            value
        }

        fn meta_version(&self) -> u64 {
            self.version.get()
        }
    }

    pub fn video_key(timestamp: u32, payload: &[u8]) -> Bytes {
        let mut data = Vec::with_capacity(payload.len() + 1);
        data.push(0x01);
        data.extend_from_slice(payload);
        let _ = timestamp;
        Bytes::from(data)
    }

    pub fn video_inter(payload: &[u8]) -> Bytes {
        let mut data = Vec::with_capacity(payload.len() + 1);
        data.push(0x02);
        data.extend_from_slice(payload);
        Bytes::from(data)
    }

    pub fn header(payload: &[u8]) -> Bytes {
        let mut data = Vec::with_capacity(payload.len() + 1);
        data.push(0x00);
        data.extend_from_slice(payload);
        Bytes::from(data)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::frame::FrameKind;

    #[test]
    fn classify_metadata_is_always_false() {
        let codec = FixedCodecState::new();
        let frame = Frame::new(FrameKind::Metadata, 0, 1, Bytes::new());
        let c = classify(&frame, &codec);
        assert!(!c.is_av_header);
        assert!(!c.is_keyframe);
        assert!(!c.mandatory);
    }

    #[test]
    fn classify_video_header() {
        let codec = FixedCodecState::new();
        let frame = Frame::new(FrameKind::Video, 0, 1, header(&[]));
        let c = classify(&frame, &codec);
        assert!(c.is_av_header);
        assert!(c.mandatory);
        assert!(!c.is_keyframe);
    }

    #[test]
    fn classify_video_keyframe() {
        let codec = FixedCodecState::new();
        let frame = Frame::new(FrameKind::Video, 0, 1, video_key(0, &[]));
        let c = classify(&frame, &codec);
        assert!(!c.is_av_header);
        assert!(c.is_keyframe);
    }

    #[test]
    fn classify_audio_is_never_a_keyframe() {
        let codec = FixedCodecState::new();
        let frame = Frame::new(FrameKind::Audio, 0, 1, video_key(0, &[]));
        let c = classify(&frame, &codec);
        assert!(!c.is_keyframe);
    }
}
