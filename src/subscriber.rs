//! Subscriber GOP context — per-subscriber fan-out state (spec §4.5, §4.6)

use tracing::debug;

use crate::codec::CodecState;
use crate::error::CacheError;
use crate::frame::Frame;
use crate::publisher::PublisherGopContext;

/// Where a subscriber is in the catch-up/live sequence (spec §3 `send_gop`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendGopState {
    /// Codec headers and GOP catch-up have not yet been attempted.
    Pending,
    /// Header sync has run; positional replay from the publisher's cache
    /// is in progress.
    Catching,
    /// Catch-up is complete; one cache-cursor frame is forwarded per
    /// publisher admission.
    Live,
}

fn ts_diff(now: u32, then: u32) -> u32 {
    now.wrapping_sub(then)
}

/// Per-subscriber state for one publisher's GOP cache
pub struct SubscriberGopContext {
    state: SendGopState,
    /// Cursor into the publisher's cache ring (spec's `subscriber.gop_pos`).
    gop_pos: usize,
    /// Timestamp of the first frame replayed during catch-up, used to
    /// bound its duration to `cache_time` (spec §4.6, P3).
    first_timestamp: u32,
    last_meta_version: u64,
    /// Identity (not ownership) of the codec headers last delivered to
    /// this subscriber (spec §3). Compared against the publisher's
    /// current header by `Frame::ptr_eq` rather than a one-shot flag, so
    /// a header replaced mid-stream (e.g. a resolution switch) is
    /// re-linked instead of silently going stale (spec §4.5, §9
    /// "Codec-header identity vs ownership").
    latched_aac: Option<Frame>,
    latched_avc: Option<Frame>,
}

impl SubscriberGopContext {
    pub fn new() -> Self {
        Self {
            state: SendGopState::Pending,
            gop_pos: 0,
            first_timestamp: 0,
            last_meta_version: 0,
            latched_aac: None,
            latched_avc: None,
        }
    }

    pub fn state(&self) -> SendGopState {
        self.state
    }

    /// Header sync (spec §4.5): metadata, then AAC header, then AVC
    /// header, in that strict order. A header is linked only when the
    /// publisher's current one differs in identity from what this
    /// subscriber last latched, so both a first sync and a mid-stream
    /// header replacement are handled the same way. A `Backpressure` from
    /// linking any of them aborts the whole sequence and leaves the
    /// remaining headers pending so the next call resumes from there,
    /// instead of re-sending ones already linked.
    pub fn sync_headers(
        &mut self,
        publisher: &PublisherGopContext,
        codec: &dyn CodecState,
        mut link: impl FnMut(Option<Frame>) -> Result<(), CacheError>,
    ) -> Result<(), CacheError> {
        if self.last_meta_version < codec.meta_version() {
            link(codec.meta())?;
            self.last_meta_version = codec.meta_version();
        }

        if let Some(header) = publisher.aac_header() {
            if !self.latched_aac.as_ref().is_some_and(|l| l.ptr_eq(header)) {
                link(Some(header.clone()))?;
                self.latched_aac = Some(header.clone());
            }
        }

        if let Some(header) = publisher.avc_header() {
            if !self.latched_avc.as_ref().is_some_and(|l| l.ptr_eq(header)) {
                link(Some(header.clone()))?;
                self.latched_avc = Some(header.clone());
            }
        }

        Ok(())
    }

    /// Drive this subscriber one step against `publisher` (spec §4.6,
    /// the `deliver(publisher, subscriber)` operation). Called once per
    /// frame the publisher admits; `kick` is invoked once work has been
    /// linked, to tell the network sender there's something to drain.
    pub fn deliver(
        &mut self,
        publisher: &PublisherGopContext,
        codec: &dyn CodecState,
        mut link: impl FnMut(Option<Frame>) -> Result<(), CacheError>,
        mut kick: impl FnMut(),
    ) -> Result<(), CacheError> {
        if self.state == SendGopState::Pending {
            self.sync_headers(publisher, codec, &mut link)?;

            self.gop_pos = publisher.gop_pos();
            let Some(start) = publisher.get(self.gop_pos) else {
                return Err(CacheError::Backpressure);
            };
            self.first_timestamp = start.frame.timestamp();
            self.state = SendGopState::Catching;
            debug!(gop_pos = self.gop_pos, first_timestamp = self.first_timestamp, "begin catch-up");
        }

        if self.state == SendGopState::Catching {
            let cache_time_ms = publisher.cache_time_ms();

            // Publisher evicted past us while we weren't looking: resync
            // once before replaying (spec §4.6). Nothing mutates the
            // publisher's cache during the loop below, so this check
            // doesn't need repeating inside it — a later `None` there
            // means catch-up has reached the live edge, not another
            // eviction.
            if publisher.get(self.gop_pos).is_none() {
                self.gop_pos = publisher.gop_pos();
            }

            loop {
                let Some(cached) = publisher.get(self.gop_pos) else {
                    break;
                };
                if ts_diff(cached.frame.timestamp(), self.first_timestamp) >= cache_time_ms {
                    self.state = SendGopState::Live;
                    debug!(gop_pos = self.gop_pos, "catch-up complete");
                    break;
                }
                let cached_frame = cached.frame.clone();
                if let Err(err) = link(Some(cached_frame)) {
                    kick();
                    return Err(err);
                }
                self.gop_pos = publisher.next_index(self.gop_pos);
            }

            kick();

            if self.state != SendGopState::Live {
                return Err(CacheError::Backpressure);
            }
        }

        // State: Live.
        self.sync_headers(publisher, codec, &mut link)?;

        let newest_idx = publisher.prev_index(publisher.gop_last());
        if let Some(newest) = publisher.get(newest_idx) {
            if newest.classification.is_keyframe && !newest.classification.is_av_header {
                // Resync on keyframe: realign at a decodable boundary.
                self.gop_pos = newest_idx;
            } else if publisher.get(self.gop_pos).is_none() {
                self.gop_pos = publisher.gop_pos();
            }
        }

        let Some(cached) = publisher.get(self.gop_pos) else {
            return Ok(());
        };
        link(Some(cached.frame.clone()))?;
        self.gop_pos = publisher.next_index(self.gop_pos);
        kick();
        Ok(())
    }
}

impl Default for SubscriberGopContext {
    fn default() -> Self {
        Self::new()
    }
}
