//! GOP cache and fan-out engine for a live streaming media relay
//!
//! This crate provides:
//! - publisher-side GOP (group-of-pictures) caching for late-joining
//!   subscribers
//! - a bounded outbound queue primitive shared by catch-up replay and
//!   live forwarding
//! - per-subscriber Pending/Catching/Live fan-out state
//! - optional per-stream timestamp jitter correction
//!
//! # Concurrency model
//!
//! A publisher and all of its subscribers are pinned to a single worker;
//! nothing here is `Send`/`Sync`, and `Frame` shares its payload via `Rc`
//! rather than `Arc`. Callers that need to move a stream across workers
//! do so by handing off the whole worker, not by sharing a `Frame` across
//! one.

pub mod arena;
pub mod close;
pub mod codec;
pub mod config;
pub mod error;
pub mod fanout;
pub mod frame;
pub mod jitter;
pub mod publisher;
pub mod queue;
mod ring;
pub mod subscriber;

pub use arena::{FrameArena, RefcountArena};
pub use close::{close_publisher, CloseHooks};
pub use codec::{CodecState, VideoFrameKind};
pub use config::GopConfig;
pub use error::CacheError;
pub use fanout::{deliver, SessionHandle};
pub use frame::{Classification, Frame, FrameKind};
pub use jitter::{JitterAlgorithm, JitterCorrector};
pub use publisher::{CachedFrame, PublisherGopContext};
pub use queue::OutboundQueue;
pub use subscriber::{SendGopState, SubscriberGopContext};
