//! Year-transition sequencer
//!
//! A passive reactor: requests and playback events go in, outcomes come out.
//! It never sleeps or polls. Delays it needs (chain spacing, stall guard)
//! are handed back to the host as durations.

use crate::{
    AssetResolver, Direction, DualVideoSurface, HeadlessSlot, PlaybackEvent, PlaybackEventKind, PlaybackSurface, Result,
    SequencerConfig, Visit, VisitNotifier, Year, YearRange,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifies one accepted transition, for matching stall timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Why a request was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// A transition is playing or a chained step is scheduled
    Busy,
    /// An overlay panel holds input focus
    OverlayOpen,
    /// Target equals the current year
    SameYear,
    /// Target lies outside the year range
    OutOfRange,
    /// No adjacent year in that direction
    AtBoundary,
    /// `continue_chain` called with nothing scheduled
    NoChain,
}

/// How a request navigates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransitionMode {
    /// Exactly one year
    Step,
    /// Any reachable year, played as a chain of steps
    Jump,
}

/// An accepted navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub from: Year,
    pub to: Year,
    pub mode: TransitionMode,
}

impl TransitionRequest {
    /// Mode reported for the step that lands on `year`.
    ///
    /// Only the terminal step of a jump counts as a jump; the steps before it
    /// are plain steps.
    pub fn mode_at(&self, year: Year) -> TransitionMode {
        if self.mode == TransitionMode::Jump && year == self.to {
            TransitionMode::Jump
        } else {
            TransitionMode::Step
        }
    }
}

/// Next step of a jump, to be started after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStep {
    pub destination: Year,
    pub delay: Duration,
}

/// Result of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A clip is now playing
    Started {
        session: SessionId,
        direction: Direction,
        pending_year: Year,
        mode: TransitionMode,
        /// Arm a timer for this long and call `on_stall_timeout`, if set
        stall_timeout: Option<Duration>,
    },
    /// Playback refused to start; the year was switched without animation
    CutInstantly {
        year: Year,
        mode: TransitionMode,
        chain: Option<ChainStep>,
    },
    Ignored(IgnoreReason),
}

/// Result of a playback callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not addressed to the running session
    Ignored,
    /// Nothing changed
    Unchanged,
    /// The displayed year flipped mid-clip
    Committed { year: Year, mode: TransitionMode },
    /// The session ended and no further step remains
    Settled { year: Year },
    /// The session ended; call `continue_chain` after the delay
    ChainScheduled(ChainStep),
}

/// Render model for the navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub year: Year,
    /// Still background for `year`
    pub idle_image: String,
    pub visible_slot: Option<Direction>,
    pub transitioning: bool,
    /// Back button shown
    pub can_go_back: bool,
    /// Forward button shown
    pub can_go_forward: bool,
    /// Buttons disabled
    pub nav_locked: bool,
}

#[derive(Debug, Clone, Copy)]
struct Session {
    id: SessionId,
    direction: Direction,
    pending_year: Year,
    mode: TransitionMode,
    committed: bool,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Playing(Session),
}

/// Owns the displayed year and the in-flight transition
pub struct Sequencer<S, N> {
    config: SequencerConfig,
    resolver: AssetResolver,
    surface: S,
    notifier: N,
    year: Year,
    phase: Phase,
    request: Option<TransitionRequest>,
    chain_pending: bool,
    overlay_open: bool,
    next_session: u64,
}

impl<S: PlaybackSurface, N: VisitNotifier> Sequencer<S, N> {
    /// Creates a sequencer showing the configured initial year
    pub fn new(
        config: SequencerConfig,
        resolver: AssetResolver,
        surface: S,
        notifier: N,
    ) -> Result<Self> {
        config.validate()?;
        let year = config.initial_year;
        Ok(Self {
            config,
            resolver,
            surface,
            notifier,
            year,
            phase: Phase::Idle,
            request: None,
            chain_pending: false,
            overlay_open: false,
            next_session: 0,
        })
    }

    /// Records the landing visit for the initial year
    pub fn mount(&mut self) {
        debug!(year = %self.year, "mounted");
        self.notifier.notify(Visit::now(self.year));
    }

    /// Drops any transition and returns to the initial year
    pub fn reset(&mut self) {
        self.surface.deactivate();
        self.phase = Phase::Idle;
        self.year = self.config.initial_year;
        self.request = None;
        self.chain_pending = false;
        self.overlay_open = false;
    }

    pub fn current_year(&self) -> Year {
        self.year
    }

    pub fn range(&self) -> YearRange {
        self.config.range
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// True while a clip is playing
    pub fn is_transitioning(&self) -> bool {
        matches!(self.phase, Phase::Playing(_))
    }

    /// True while playing or while a chained step waits to start
    pub fn is_busy(&self) -> bool {
        self.is_transitioning() || self.chain_pending
    }

    /// Direction of the running clip
    pub fn active_direction(&self) -> Option<Direction> {
        match self.phase {
            Phase::Playing(session) => Some(session.direction),
            Phase::Idle => None,
        }
    }

    /// Id of the running session
    pub fn active_session(&self) -> Option<SessionId> {
        match self.phase {
            Phase::Playing(session) => Some(session.id),
            Phase::Idle => None,
        }
    }

    /// Final year of the current jump, if one is in progress
    pub fn destination(&self) -> Option<Year> {
        self.request.map(|r| r.to)
    }

    /// Request currently being carried out
    pub fn request(&self) -> Option<TransitionRequest> {
        self.request
    }

    /// Marks whether an overlay panel holds input focus
    pub fn set_overlay_open(&mut self, open: bool) {
        self.overlay_open = open;
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay_open
    }

    pub fn view(&self) -> ViewState {
        let range = self.config.range;
        ViewState {
            year: self.year,
            idle_image: self.resolver.idle_image(self.year),
            visible_slot: self.surface.visible_slot(),
            transitioning: self.is_transitioning(),
            can_go_back: self.year > range.min(),
            can_go_forward: self.year < range.max(),
            nav_locked: self.is_busy() || self.overlay_open,
        }
    }

    /// Navigates towards any year, one step per clip
    pub fn request_transition(&mut self, target: Year) -> RequestOutcome {
        if let Some(reason) = self.input_blocked() {
            debug!(%target, ?reason, "transition request dropped");
            return RequestOutcome::Ignored(reason);
        }
        if !self.config.range.contains(target) {
            return RequestOutcome::Ignored(IgnoreReason::OutOfRange);
        }
        let Some(direction) = YearRange::direction_between(self.year, target) else {
            return RequestOutcome::Ignored(IgnoreReason::SameYear);
        };

        let distance = target.get().abs_diff(self.year.get());
        let mode = if distance > 1 {
            TransitionMode::Jump
        } else {
            TransitionMode::Step
        };
        self.accept(target, mode);
        self.begin_step(direction)
    }

    /// Navigates exactly one year
    pub fn request_step(&mut self, direction: Direction) -> RequestOutcome {
        if let Some(reason) = self.input_blocked() {
            debug!(%direction, ?reason, "step request dropped");
            return RequestOutcome::Ignored(reason);
        }
        let Some(next) = self.config.range.step(self.year, direction) else {
            return RequestOutcome::Ignored(IgnoreReason::AtBoundary);
        };

        self.accept(next, TransitionMode::Step);
        self.begin_step(direction)
    }

    /// Starts the next step of a scheduled jump
    pub fn continue_chain(&mut self) -> RequestOutcome {
        if !self.chain_pending {
            return RequestOutcome::Ignored(IgnoreReason::NoChain);
        }
        self.chain_pending = false;

        let Some(request) = self.request else {
            return RequestOutcome::Ignored(IgnoreReason::NoChain);
        };
        match YearRange::direction_between(self.year, request.to) {
            Some(direction) => self.begin_step(direction),
            None => {
                self.request = None;
                RequestOutcome::Ignored(IgnoreReason::SameYear)
            }
        }
    }

    /// Routes a playback callback to the matching handler
    pub fn handle_event(&mut self, event: PlaybackEvent) -> EventOutcome {
        if self.active_direction() != Some(event.slot) {
            debug!(slot = %event.slot, "event from inactive slot dropped");
            return EventOutcome::Ignored;
        }
        match event.kind {
            PlaybackEventKind::TimeUpdate {
                current_time,
                duration,
            } => self.on_progress(current_time, duration),
            PlaybackEventKind::Ended => self.on_ended(),
            PlaybackEventKind::Error(message) => {
                warn!(slot = %event.slot, %message, "media error during transition");
                self.on_playback_start_failure()
            }
        }
    }

    /// Commits once progress reaches the direction's threshold
    pub fn on_progress(&mut self, current_time: f64, duration: f64) -> EventOutcome {
        let Phase::Playing(session) = self.phase else {
            return EventOutcome::Ignored;
        };
        if session.committed || !duration.is_finite() || duration <= 0.0 {
            return EventOutcome::Unchanged;
        }

        let progress = current_time / duration;
        if progress >= self.config.threshold(session.direction) {
            debug!(progress, direction = %session.direction, "threshold crossed");
            match self.commit_pending() {
                Some(year) => EventOutcome::Committed {
                    year,
                    mode: session.mode,
                },
                None => EventOutcome::Unchanged,
            }
        } else {
            EventOutcome::Unchanged
        }
    }

    /// Ends the session, committing first if the threshold was never seen
    pub fn on_ended(&mut self) -> EventOutcome {
        if !self.is_transitioning() {
            return EventOutcome::Ignored;
        }
        self.finish()
    }

    /// Degrades a failed start to an instant cut
    pub fn on_playback_start_failure(&mut self) -> EventOutcome {
        if !self.is_transitioning() {
            return EventOutcome::Ignored;
        }
        warn!(year = %self.year, "transition playback failed, cutting directly");
        self.finish()
    }

    /// Forces a stalled session to end; stale ids are ignored
    pub fn on_stall_timeout(&mut self, session: SessionId) -> EventOutcome {
        if self.active_session() != Some(session) {
            return EventOutcome::Ignored;
        }
        warn!(session = session.get(), "transition stalled, forcing end");
        self.finish()
    }

    fn input_blocked(&self) -> Option<IgnoreReason> {
        if self.is_busy() {
            Some(IgnoreReason::Busy)
        } else if self.overlay_open {
            Some(IgnoreReason::OverlayOpen)
        } else {
            None
        }
    }

    fn accept(&mut self, to: Year, mode: TransitionMode) {
        self.request = Some(TransitionRequest {
            from: self.year,
            to,
            mode,
        });
    }

    fn begin_step(&mut self, direction: Direction) -> RequestOutcome {
        let Some(pending_year) = self.config.range.step(self.year, direction) else {
            self.request = None;
            return RequestOutcome::Ignored(IgnoreReason::AtBoundary);
        };

        self.next_session += 1;
        let session = Session {
            id: SessionId(self.next_session),
            direction,
            pending_year,
            mode: self
                .request
                .map_or(TransitionMode::Step, |r| r.mode_at(pending_year)),
            committed: false,
        };
        self.phase = Phase::Playing(session);

        let url = self.resolver.resolve_transition(direction);
        debug!(from = %self.year, to = %pending_year, %url, "starting transition");

        match self.surface.activate(direction, &url) {
            Ok(()) => RequestOutcome::Started {
                session: session.id,
                direction,
                pending_year,
                mode: session.mode,
                stall_timeout: self.config.stall_timeout,
            },
            Err(e) => {
                warn!(error = %e, %url, "could not start transition clip");
                let chain = match self.finish() {
                    EventOutcome::ChainScheduled(step) => Some(step),
                    _ => None,
                };
                RequestOutcome::CutInstantly {
                    year: self.year,
                    mode: session.mode,
                    chain,
                }
            }
        }
    }

    fn commit_pending(&mut self) -> Option<Year> {
        let Phase::Playing(session) = &mut self.phase else {
            return None;
        };
        if session.committed {
            return None;
        }
        session.committed = true;
        let year = session.pending_year;
        self.year = year;
        info!(%year, mode = ?session.mode, "year committed");
        self.notifier.notify(Visit::now(year));
        Some(year)
    }

    fn finish(&mut self) -> EventOutcome {
        self.commit_pending();
        self.surface.deactivate();
        self.phase = Phase::Idle;

        match self.request.map(|r| r.to) {
            Some(destination) if destination != self.year => {
                self.chain_pending = true;
                let step = ChainStep {
                    destination,
                    delay: self.config.chain_delay,
                };
                debug!(year = %self.year, %destination, "chaining next step");
                EventOutcome::ChainScheduled(step)
            }
            _ => {
                self.request = None;
                EventOutcome::Settled { year: self.year }
            }
        }
    }
}

impl<N: VisitNotifier> Sequencer<DualVideoSurface<HeadlessSlot>, N> {
    /// Moves the play head of the running headless slot.
    ///
    /// Position only; progress still has to arrive through `handle_event`.
    pub fn advance_headless(&mut self, position: f64) {
        if let Some(direction) = self.active_direction() {
            self.surface.slot_mut(direction).advance_to(position);
        }
    }
}
