//! Headless navigation simulation

use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{info, warn};
use yearshift_core::{
    AssetResolver, Direction, DualVideoSurface, EventOutcome, HeadlessSlot, PlaybackEvent,
    RequestOutcome, Sequencer, SequencerConfig, SessionId, Visit, VisitNotifier, Year,
};

type SimSequencer = Sequencer<DualVideoSurface<HeadlessSlot>, JsonLinesNotifier>;

/// What to ask the sequencer for
pub enum Request {
    Jump(Year),
    Step(Direction),
}

/// Shape of every simulated clip
pub struct ClipProfile {
    pub duration: f64,
    pub tick: f64,
    /// Report the real duration in time updates, otherwise NaN
    pub known_duration: bool,
    /// Play head freezes here
    pub stall_at: Option<f64>,
    pub speed: f64,
}

impl ClipProfile {
    fn wall_time(&self, media_secs: f64) -> Duration {
        Duration::from_secs_f64((media_secs / self.speed).max(0.0))
    }
}

/// Prints each visit as a JSON line on stdout
pub struct JsonLinesNotifier;

impl VisitNotifier for JsonLinesNotifier {
    fn notify(&self, visit: Visit) {
        match serde_json::to_string(&visit) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "could not encode visit"),
        }
    }
}

pub async fn run(
    config: SequencerConfig,
    resolver: AssetResolver,
    request: Request,
    clip: ClipProfile,
    block_autoplay: bool,
) -> Result<()> {
    if !(clip.duration > 0.0 && clip.tick > 0.0 && clip.speed > 0.0) {
        bail!("clip duration, tick and speed must be positive");
    }

    let (mut forward, mut back) = (HeadlessSlot::new(), HeadlessSlot::new());
    forward.set_block_autoplay(block_autoplay);
    back.set_block_autoplay(block_autoplay);
    let surface = DualVideoSurface::new(forward, back);

    let mut seq = Sequencer::new(config, resolver, surface, JsonLinesNotifier)?;
    seq.mount();

    let mut outcome = match request {
        Request::Jump(year) => seq.request_transition(year),
        Request::Step(direction) => seq.request_step(direction),
    };

    loop {
        let next = match outcome {
            RequestOutcome::Ignored(reason) => {
                info!(?reason, year = %seq.current_year(), "request ignored");
                None
            }
            RequestOutcome::CutInstantly { year, mode, chain } => {
                info!(%year, ?mode, "cut without animation");
                chain
            }
            RequestOutcome::Started {
                session,
                direction,
                pending_year,
                mode,
                stall_timeout,
            } => {
                info!(%direction, %pending_year, ?mode, "transition started");
                match play_clip(&mut seq, &clip, session, direction, stall_timeout).await? {
                    EventOutcome::ChainScheduled(step) => Some(step),
                    _ => None,
                }
            }
        };

        let Some(step) = next else { break };
        sleep(step.delay).await;
        outcome = seq.continue_chain();
    }

    info!(year = %seq.current_year(), "settled");
    Ok(())
}

async fn play_clip(
    seq: &mut SimSequencer,
    clip: &ClipProfile,
    session: SessionId,
    direction: Direction,
    stall_timeout: Option<Duration>,
) -> Result<EventOutcome> {
    let deadline = stall_timeout.map(|t| Instant::now() + t);
    let reported = if clip.known_duration {
        clip.duration
    } else {
        f64::NAN
    };

    let mut position = 0.0_f64;
    loop {
        if clip.stall_at.is_some_and(|at| position >= at) {
            let Some(deadline) = deadline else {
                bail!("clip stalled at {position:.2}s and no stall timeout is configured");
            };
            sleep_until(deadline).await;
            return Ok(seq.on_stall_timeout(session));
        }

        sleep(clip.wall_time(clip.tick)).await;
        position = (position + clip.tick).min(clip.duration);
        seq.advance_headless(position);

        if let EventOutcome::Committed { year, mode } =
            seq.handle_event(PlaybackEvent::time_update(direction, position, reported))
        {
            info!(%year, ?mode, at = position, "year committed mid-clip");
        }

        if position >= clip.duration {
            return Ok(seq.handle_event(PlaybackEvent::ended(direction)));
        }
    }
}
