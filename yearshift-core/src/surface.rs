//! Dual-video playback surface
//!
//! Two statically allocated slots, one per direction. Switching direction
//! only swaps visibility; a slot is never re-pointed while the other plays.

use crate::Direction;

/// Reason a slot failed to start playing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    #[error("Playback rejected: {0}")]
    Rejected(String),

    #[error("Media error: {0}")]
    Media(String),
}

/// One video element the surface controls
pub trait VideoSlot {
    /// Points the slot at a new source
    fn load(&mut self, url: &str);
    /// Currently loaded source
    fn source(&self) -> Option<&str>;
    /// Seeks back to the first frame
    fn rewind(&mut self);
    /// Starts playback; the runtime may refuse (autoplay policy, decode error)
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;
}

/// What the sequencer drives
pub trait PlaybackSurface {
    /// Loads, rewinds, shows and starts the slot for `direction`
    fn activate(&mut self, direction: Direction, url: &str) -> Result<(), PlaybackError>;
    /// Stops and hides whatever slot is showing
    fn deactivate(&mut self);
    /// Slot currently shown, if any
    fn visible_slot(&self) -> Option<Direction>;
}

/// Playback notification from a slot
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackEvent {
    pub slot: Direction,
    pub kind: PlaybackEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEventKind {
    /// Position update; `duration` may be NaN or zero while metadata is unknown
    TimeUpdate { current_time: f64, duration: f64 },
    /// Clip reached its last frame
    Ended,
    /// Media element reported an error
    Error(String),
}

impl PlaybackEvent {
    pub fn time_update(slot: Direction, current_time: f64, duration: f64) -> Self {
        Self {
            slot,
            kind: PlaybackEventKind::TimeUpdate {
                current_time,
                duration,
            },
        }
    }

    pub fn ended(slot: Direction) -> Self {
        Self {
            slot,
            kind: PlaybackEventKind::Ended,
        }
    }

    pub fn error(slot: Direction, message: impl Into<String>) -> Self {
        Self {
            slot,
            kind: PlaybackEventKind::Error(message.into()),
        }
    }
}

/// Surface with one dedicated slot per direction
#[derive(Debug)]
pub struct DualVideoSurface<V> {
    forward: V,
    back: V,
}

impl<V: VideoSlot> DualVideoSurface<V> {
    /// Creates a surface; both slots start hidden
    pub fn new(mut forward: V, mut back: V) -> Self {
        forward.set_visible(false);
        back.set_visible(false);
        Self { forward, back }
    }

    pub fn slot(&self, direction: Direction) -> &V {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Back => &self.back,
        }
    }

    pub fn slot_mut(&mut self, direction: Direction) -> &mut V {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Back => &mut self.back,
        }
    }

    fn other(direction: Direction) -> Direction {
        match direction {
            Direction::Forward => Direction::Back,
            Direction::Back => Direction::Forward,
        }
    }
}

impl<V: VideoSlot> PlaybackSurface for DualVideoSurface<V> {
    fn activate(&mut self, direction: Direction, url: &str) -> Result<(), PlaybackError> {
        let idle = self.slot_mut(Self::other(direction));
        idle.pause();
        idle.set_visible(false);

        let slot = self.slot_mut(direction);
        if slot.source() != Some(url) {
            slot.load(url);
        }
        slot.rewind();
        slot.set_visible(true);

        if let Err(e) = slot.play() {
            slot.pause();
            slot.set_visible(false);
            return Err(e);
        }
        Ok(())
    }

    fn deactivate(&mut self) {
        for direction in Direction::ALL {
            let slot = self.slot_mut(direction);
            if slot.is_visible() {
                slot.pause();
                slot.set_visible(false);
            }
        }
    }

    fn visible_slot(&self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| self.slot(*d).is_visible())
    }
}

/// In-memory slot without a real decoder
#[derive(Debug, Clone, Default)]
pub struct HeadlessSlot {
    source: Option<String>,
    position: f64,
    playing: bool,
    visible: bool,
    block_autoplay: bool,
    loads: usize,
}

impl HeadlessSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot whose `play` is always refused, like a blocked autoplay policy
    pub fn blocking_autoplay() -> Self {
        Self {
            block_autoplay: true,
            ..Self::default()
        }
    }

    pub fn set_block_autoplay(&mut self, block: bool) {
        self.block_autoplay = block;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Moves the play head, as decoding would
    pub fn advance_to(&mut self, position: f64) {
        self.position = position;
    }

    /// Number of times a new source was loaded
    pub fn load_count(&self) -> usize {
        self.loads
    }
}

impl VideoSlot for HeadlessSlot {
    fn load(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.position = 0.0;
        self.playing = false;
        self.loads += 1;
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn rewind(&mut self) {
        self.position = 0.0;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.block_autoplay {
            return Err(PlaybackError::Rejected("autoplay blocked".into()));
        }
        if self.source.is_none() {
            return Err(PlaybackError::Media("no source loaded".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}
