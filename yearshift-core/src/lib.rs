//! Yearshift Core Library
//!
//! This library provides the year range, transition asset resolution, the
//! dual-video playback surface and the year-transition sequencer that flips
//! the displayed year mid-clip.

pub mod asset;
pub mod config;
pub mod sequencer;
pub mod surface;
pub mod visit;
pub mod year;

pub use asset::{url_path, AssetKind, AssetResolver, MediaFamily, PreloadManifest};
pub use config::SequencerConfig;
pub use sequencer::{
    ChainStep, EventOutcome, IgnoreReason, RequestOutcome, Sequencer, SessionId, TransitionMode,
    TransitionRequest, ViewState,
};
pub use surface::{
    DualVideoSurface, HeadlessSlot, PlaybackError, PlaybackEvent, PlaybackEventKind,
    PlaybackSurface, VideoSlot,
};
pub use visit::{RecordingNotifier, Visit, VisitNotifier};
pub use year::{Direction, Year, YearRange};

/// Result type for yearshift-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for yearshift-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid year range: {min}..={max}")]
    InvalidRange { min: u16, max: u16 },

    #[error("Year {year} outside range {min}..={max}")]
    YearOutOfRange { year: u16, min: u16, max: u16 },

    #[error("Invalid commit threshold: {0} (expected 0.0..=1.0)")]
    InvalidThreshold(f64),

    #[error("Config parse error: {0}")]
    Config(String),
}
