//! The download daemon.
//!
//! Files arrive one at a time, already copied off the device into a temp
//! location. For each, the daemon generates a subfolder and a name from the
//! user's token lists, pairs RAW+JPEG captures, moves the file (and its
//! sidecars) into place, and reports a [`FileResult`]. Sequence counters
//! live for the [`Session`] and are handed back in a [`SessionResult`] for
//! the caller to persist.

mod daemon;
pub mod error;
mod message;
mod pairing;
mod service;
mod session;

pub use crate::daemon::{Clock, Control, Daemon, local_now, serve};
pub use crate::message::{
    DownloadStatus, FileRequest, FileResult, Request, Response, SessionResult, SessionStarted,
};
pub use crate::pairing::{CaptureTime, PairStatus, PairingTracker};
pub use crate::service::{MetadataLoader, ThumbnailService};
pub use crate::session::Session;
