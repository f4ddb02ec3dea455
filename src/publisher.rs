//! Publisher GOP context — cache admission and eviction (spec §4.3, §4.4)

use std::collections::VecDeque;
use std::fmt::Write as _;

use tracing::{debug, error};

use crate::arena::FrameArena;
use crate::codec::{self, CodecState};
use crate::config::GopConfig;
use crate::error::CacheError;
use crate::frame::{Classification, Frame, FrameKind};
use crate::ring::Ring;

/// A cached frame paired with the classification computed for it on
/// admission (spec §4.1: classification is derived once, then frozen).
/// Mirrors `BufferedFrame` in the reference GOP buffer, which likewise
/// wraps the wire frame with a second, admission-time-computed field
/// rather than mutating the frame itself.
#[derive(Clone)]
pub struct CachedFrame {
    pub frame: Frame,
    pub classification: Classification,
}

/// Timestamp subtraction per spec §3: the cache treats `Frame::timestamp`
/// as a monotone clock within one publishing session, so a difference is
/// computed with wrapping (modular) subtraction rather than a signed one.
fn ts_diff(now: u32, then: u32) -> u32 {
    now.wrapping_sub(then)
}

/// Per-publisher GOP cache (spec §3 "Publisher GOP context")
pub struct PublisherGopContext {
    cache: Ring<CachedFrame>,
    /// Keyframes currently resident in the cache, in cache order. The
    /// front is spec's `keyframe`; the second entry (if any) is
    /// `next_keyframe`. Frame handles (not slot indices) are kept here —
    /// `Frame::ptr_eq` gives the identity check the reference
    /// implementation gets from chasing `keyframe->next` pointers, without
    /// needing an intrusive field on `Frame` itself (spec §9).
    keyframes: VecDeque<Frame>,
    aac_header: Option<Frame>,
    avc_header: Option<Frame>,
    config: GopConfig,
}

impl PublisherGopContext {
    /// Create a publisher context. Callers create this lazily on first
    /// frame ingest (spec §3 "Lifecycles") rather than eagerly per
    /// session; `capacity` must match the session's outbound queue
    /// capacity (spec §9).
    pub fn new(capacity: usize, config: GopConfig) -> Self {
        Self {
            cache: Ring::new(capacity),
            keyframes: VecDeque::new(),
            aac_header: None,
            avc_header: None,
            config,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// The cache window, in milliseconds, this context was configured
    /// with (spec §4.6's `cache_time` bound on catch-up duration).
    pub fn cache_time_ms(&self) -> u32 {
        self.config.cache_time.as_millis() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn gop_pos(&self) -> usize {
        self.cache.pos()
    }

    pub fn gop_last(&self) -> usize {
        self.cache.last()
    }

    /// Read the cached frame at a ring index previously obtained from
    /// `gop_pos`/`gop_last`/`next_index`.
    pub fn get(&self, idx: usize) -> Option<&CachedFrame> {
        self.cache.get(idx)
    }

    pub fn next_index(&self, idx: usize) -> usize {
        self.cache.next_index(idx)
    }

    pub fn prev_index(&self, idx: usize) -> usize {
        self.cache.prev_index(idx)
    }

    pub fn aac_header(&self) -> Option<&Frame> {
        self.aac_header.as_ref()
    }

    pub fn avc_header(&self) -> Option<&Frame> {
        self.avc_header.as_ref()
    }

    /// Whether the cache currently holds a complete GOP, i.e. has ever
    /// seen a video keyframe (spec §4.3 step 5, the startup filter).
    pub fn has_keyframe(&self) -> bool {
        !self.keyframes.is_empty()
    }

    /// Admit a publisher-ingested frame (spec §4.3).
    pub fn cache_push(
        &mut self,
        frame: Frame,
        codec: &dyn CodecState,
        arena: &dyn FrameArena,
    ) -> Result<(), CacheError> {
        // Step 1: caching disabled.
        if !self.config.caching_enabled() {
            return Ok(());
        }

        // Step 3: ring occupancy check, before touching anything else.
        if self.cache.would_overflow() {
            error!(
                occupancy = self.cache.occupancy(),
                capacity = self.cache.capacity(),
                "admitting into a full cache"
            );
            return Err(CacheError::Backpressure);
        }

        // Step 4: classify.
        let classification = codec::classify(&frame, codec);

        debug!(
            kind = ?frame.kind(),
            timestamp = frame.timestamp(),
            is_keyframe = classification.is_keyframe,
            is_av_header = classification.is_av_header,
            "cache frame"
        );

        // Step 5: startup filter — a cache that starts mid-GOP can't be
        // replayed to a subscriber.
        if self.keyframes.is_empty()
            && frame.kind() == FrameKind::Video
            && !classification.is_keyframe
            && !classification.is_av_header
        {
            return Ok(());
        }

        // Step 6: keyframe chaining.
        if classification.is_keyframe && !classification.is_av_header {
            self.keyframes.push_back(frame.clone());
        }

        // Step 7: insert and acquire.
        let now = frame.timestamp();
        let held = arena.acquire(&frame);
        self.cache.push(CachedFrame {
            frame: held,
            classification,
        });

        // Step 8: evict.
        self.evict(now, arena);

        Ok(())
    }

    /// Eviction policy (spec §4.4), run once per admission with the
    /// admitted frame's timestamp as "now".
    fn evict(&mut self, now: u32, arena: &dyn FrameArena) {
        let cache_time_ms = self.cache_time_ms();

        // E1 — strip leading codec headers; their data survives via the
        // latch, so no arena release here.
        while let Some(front) = self.cache.front() {
            if !front.classification.is_av_header {
                break;
            }
            let cached = self.cache.pop_front().expect("front just matched");
            self.relatch(cached.frame, arena);
        }

        let Some(oldest) = self.cache.front() else {
            return;
        };

        // E2 — audio-only cache: at most one frame evicted per admission.
        if self.keyframes.is_empty() {
            if ts_diff(now, oldest.frame.timestamp()) > cache_time_ms {
                let cached = self.cache.pop_front().expect("front just matched");
                debug!(timestamp = cached.frame.timestamp(), "evict audio-only frame");
                arena.release(cached.frame);
            }
            return;
        }

        // E4 — exactly one keyframe: never evict, the current GOP must
        // stay resident in full regardless of age.
        let Some(next_keyframe) = self.keyframes.get(1).cloned() else {
            return;
        };

        // E3 — multi-GOP cache: consider dropping the leading GOP. A cache
        // one admission away from overflow forces the drop regardless of
        // age; otherwise the leading GOP goes once the *next* one is old
        // enough on its own (its keyframe's timestamp, not the incoming
        // frame's, is what ages out).
        let force_drop = self.cache.would_overflow();
        let should_drop =
            force_drop || ts_diff(now, next_keyframe.timestamp()) >= cache_time_ms;

        if !should_drop {
            return;
        }

        let mut dropped_span_start = None;
        while let Some(front) = self.cache.front() {
            if front.frame.ptr_eq(&next_keyframe) {
                break;
            }
            let cached = self.cache.pop_front().expect("front just matched");
            if dropped_span_start.is_none() {
                dropped_span_start = Some(cached.frame.timestamp());
            }
            if cached.classification.is_av_header {
                self.relatch(cached.frame, arena);
            } else {
                arena.release(cached.frame);
            }
        }

        if let Some(start) = dropped_span_start {
            debug!(
                span_ms = ts_diff(next_keyframe.timestamp(), start),
                "evict leading GOP"
            );
        }

        self.keyframes.pop_front();
    }

    /// Latch a codec header evicted from the cache, releasing whatever
    /// was previously latched for that kind (spec §4.4 E1: "relatch it
    /// ... releasing any previously latched header of the same kind"),
    /// mirroring `ngx_rtmp_gop_reset_avheader`'s free-before-replace.
    fn relatch(&mut self, frame: Frame, arena: &dyn FrameArena) {
        match frame.kind() {
            FrameKind::Audio => {
                if let Some(old) = self.aac_header.replace(frame) {
                    arena.release(old);
                }
            }
            _ => {
                if let Some(old) = self.avc_header.replace(frame) {
                    arena.release(old);
                }
            }
        }
    }

    /// Release every cached frame and latched header (spec §4.7, publisher
    /// close). Consumes `self`; the context's own memory is then freed
    /// along with the session pool by the caller.
    pub fn close(mut self, arena: &dyn FrameArena) {
        while let Some(cached) = self.cache.pop_front() {
            arena.release(cached.frame);
        }
        if let Some(header) = self.aac_header.take() {
            arena.release(header);
        }
        if let Some(header) = self.avc_header.take() {
            arena.release(header);
        }
    }

    /// Compact per-frame tag dump for diagnostics, grounded on the
    /// reference module's `ngx_rtmp_gop_print_cache` debug trace.
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        let mut pos = self.cache.pos();
        while pos != self.cache.last() {
            if let Some(cached) = self.cache.get(pos) {
                let _ = match cached.frame.kind() {
                    FrameKind::Audio => write!(out, "A"),
                    FrameKind::Video => write!(out, "V"),
                    _ => write!(out, "O"),
                };
                if cached.classification.is_keyframe {
                    let _ = write!(out, "I");
                }
                if cached.classification.is_av_header {
                    let _ = write!(out, "H");
                }
                out.push(' ');
            }
            pos = self.cache.next_index(pos);
        }
        out
    }
}
