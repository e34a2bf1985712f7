//! Preload gate

use crate::progress::format_duration;
use crate::{AssetLoader, PreloadConfig, Progress};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use yearshift_core::{AssetKind, PreloadManifest};

/// Visible state of the splash screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    Loading,
    /// Gate is open; the splash is fading out
    FadingOut,
    /// Splash gone, input may start
    Open,
}

/// Summary of one gate run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadReport {
    pub total: usize,
    /// URLs that failed to load (still counted as complete)
    pub failed: Vec<String>,
    /// Time until the last item settled
    pub load_time: Duration,
    /// Time until the gate signalled completion
    pub elapsed: Duration,
}

impl fmt::Display for PreloadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} assets ({} failed) loaded in {}, gate done in {}",
            self.total,
            self.failed.len(),
            format_duration(self.load_time),
            format_duration(self.elapsed)
        )
    }
}

/// Blocks interaction until every manifest item has settled
pub struct PreloadGate<L> {
    loader: L,
    config: PreloadConfig,
    progress: watch::Sender<Progress>,
    phase: watch::Sender<GatePhase>,
}

impl<L: AssetLoader> PreloadGate<L> {
    /// Creates a gate with the given loader and timing
    pub fn new(loader: L, config: PreloadConfig) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        let (phase, _) = watch::channel(GatePhase::Loading);
        Self {
            loader,
            config,
            progress,
            phase,
        }
    }

    /// Progress updates, one per settled item
    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Phase changes of the splash screen
    pub fn subscribe_phase(&self) -> watch::Receiver<GatePhase> {
        self.phase.subscribe()
    }

    pub fn config(&self) -> &PreloadConfig {
        &self.config
    }

    /// Loads every item concurrently, then holds the splash for the
    /// remaining minimum and the fade-out.
    pub async fn run(&self, manifest: &PreloadManifest) -> PreloadReport {
        let start = Instant::now();
        let total = manifest.len();
        self.phase.send_replace(GatePhase::Loading);
        self.progress.send_replace(Progress::new(0, total));

        let mut pending: FuturesUnordered<_> = manifest
            .entries()
            .map(|(url, kind)| async move {
                let result = match kind {
                    AssetKind::Image => self.loader.load_image(url).await,
                    AssetKind::Video => self.loader.load_video(url).await,
                };
                (url, result)
            })
            .collect();

        let mut completed = 0;
        let mut failed = Vec::new();
        while let Some((url, result)) = pending.next().await {
            completed += 1;
            match result {
                Ok(()) => debug!(%url, "asset ready"),
                Err(e) => {
                    warn!(%url, error = %e, "asset failed to preload");
                    failed.push(url.to_string());
                }
            }
            self.progress.send_replace(Progress::new(completed, total));
        }

        let load_time = start.elapsed();
        if let Some(remaining) = self.config.min_display.checked_sub(load_time) {
            if !remaining.is_zero() {
                sleep(remaining).await;
            }
        }

        info!(total, failed = failed.len(), "preload gate open");
        self.phase.send_replace(GatePhase::FadingOut);
        sleep(self.config.fade_out).await;
        self.phase.send_replace(GatePhase::Open);

        PreloadReport {
            total,
            failed,
            load_time,
            elapsed: start.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Loader with per-URL latency and failures
    #[derive(Default)]
    struct ScriptedLoader {
        delays: HashMap<String, Duration>,
        broken: Vec<String>,
        calls: Mutex<Vec<(String, AssetKind)>>,
    }

    impl ScriptedLoader {
        fn with_delay(mut self, url: &str, delay: Duration) -> Self {
            self.delays.insert(url.to_string(), delay);
            self
        }

        fn with_broken(mut self, url: &str) -> Self {
            self.broken.push(url.to_string());
            self
        }

        async fn fetch(&self, url: &str, kind: AssetKind) -> Result<()> {
            self.calls.lock().unwrap().push((url.to_string(), kind));
            let delay = self
                .delays
                .get(url)
                .copied()
                .unwrap_or(Duration::from_millis(20));
            sleep(delay).await;
            if self.broken.iter().any(|b| b == url) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "404",
                )));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AssetLoader for ScriptedLoader {
        async fn load_image(&self, url: &str) -> Result<()> {
            self.fetch(url, AssetKind::Image).await
        }

        async fn load_video(&self, url: &str) -> Result<()> {
            self.fetch(url, AssetKind::Video).await
        }
    }

    fn manifest() -> PreloadManifest {
        PreloadManifest::new([
            "/assets/transition_forward.webm",
            "/assets/idle_2023.png",
            "/assets/idle_2024.png",
            "/assets/idle_2025.png",
            "/assets/idle_2026.png",
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_image_still_opens_gate() {
        let loader = ScriptedLoader::default().with_broken("/assets/idle_2024.png");
        let gate = PreloadGate::new(loader, PreloadConfig::default());
        let progress = gate.subscribe_progress();
        let phase = gate.subscribe_phase();

        let report = gate.run(&manifest()).await;

        assert_eq!(report.total, 5);
        assert_eq!(report.failed, vec!["/assets/idle_2024.png".to_string()]);
        assert_eq!(progress.borrow().percent(), 100);
        assert_eq!(*phase.borrow(), GatePhase::Open);

        // 20ms of loading is padded to the 400ms minimum, then 400ms of fade
        assert!(report.elapsed >= Duration::from_millis(800));
        assert!(report.elapsed <= report.load_time + Duration::from_millis(810));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_skips_minimum_padding() {
        let loader = ScriptedLoader::default()
            .with_delay("/assets/transition_forward.webm", Duration::from_millis(1200));
        let gate = PreloadGate::new(loader, PreloadConfig::default());

        let report = gate.run(&manifest()).await;

        assert!(report.load_time >= Duration::from_millis(1200));
        assert!(report.elapsed >= report.load_time + Duration::from_millis(400));
        assert!(report.elapsed < report.load_time + Duration::from_millis(450));
        assert!(report.failed.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_by_suffix() {
        let gate = PreloadGate::new(ScriptedLoader::default(), PreloadConfig::default());
        gate.run(&manifest()).await;

        let calls = gate.loader.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 5);
        let videos: Vec<_> = calls
            .iter()
            .filter(|(_, kind)| *kind == AssetKind::Video)
            .map(|(url, _)| url.as_str())
            .collect();
        assert_eq!(videos, vec!["/assets/transition_forward.webm"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_counts_each_item() {
        let loader = ScriptedLoader::default()
            .with_delay("/assets/idle_2023.png", Duration::from_millis(100))
            .with_delay("/assets/idle_2024.png", Duration::from_millis(200))
            .with_delay("/assets/idle_2025.png", Duration::from_millis(300))
            .with_delay("/assets/idle_2026.png", Duration::from_millis(400))
            .with_delay("/assets/transition_forward.webm", Duration::from_millis(500));
        let gate = PreloadGate::new(loader, PreloadConfig::default());
        let mut progress = gate.subscribe_progress();

        let watcher = async {
            let mut seen = Vec::new();
            while progress.changed().await.is_ok() {
                let current = *progress.borrow_and_update();
                seen.push(current.percent());
                if current.is_complete() && current.total > 0 {
                    break;
                }
            }
            seen
        };

        let manifest = manifest();
        let (report, seen) = tokio::join!(gate.run(&manifest), watcher);
        assert_eq!(report.total, 5);
        assert_eq!(seen, vec![0, 20, 40, 60, 80, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_manifest() {
        let gate = PreloadGate::new(ScriptedLoader::default(), PreloadConfig::default());
        let report = gate.run(&PreloadManifest::default()).await;

        assert_eq!(report.total, 0);
        assert_eq!(gate.subscribe_progress().borrow().percent(), 100);
        assert!(report.elapsed >= Duration::from_millis(800));
    }
}
