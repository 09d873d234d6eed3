//! # Poll Loop
//!
//! Drives acquisition: on every tick of the acquisition timer it pulls one
//! raw frame from the link, decodes it and swaps it into the sample store.
//!
//! A link or decode failure is logged and counted, and the store keeps its
//! previous contents. There is no retry within a tick; the next tick is the
//! retry. A second, slower timer refreshes the position readout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::display;
use crate::error::{self, TelemetryError};
use crate::frame::decoder::decode_frame;
use crate::frame::protocol::TelemetrySample;
use crate::link::Link;
use crate::store::SampleStore;

/// Result of one acquisition cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A frame was decoded and stored
    Updated,

    /// The link failed; store unchanged
    LinkFailed,

    /// The frame was rejected by the decoder; store unchanged
    DecodeFailed,
}

/// Running counters for the poll loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub cycles: u64,
    pub updates: u64,
    pub link_failures: u64,
    pub decode_failures: u64,
    pub position_refreshes: u64,
}

/// Periodic Link → Decoder → Store driver
pub struct PollLoop {
    link: Box<dyn Link>,
    store: Arc<SampleStore>,
    acquire_interval: Duration,
    position_interval: Duration,
    status_interval_cycles: u64,
    stats: PollStats,
}

impl PollLoop {
    /// Create a poll loop writing into `store`
    pub fn new(link: Box<dyn Link>, store: Arc<SampleStore>, config: &PollConfig) -> Self {
        Self {
            link,
            store,
            acquire_interval: Duration::from_millis(config.acquire_interval_ms),
            position_interval: Duration::from_millis(config.position_interval_ms),
            status_interval_cycles: config.status_interval_cycles.max(1),
            stats: PollStats::default(),
        }
    }

    /// Counters so far
    pub fn stats(&self) -> PollStats {
        self.stats
    }

    /// Run one acquire/decode/store cycle
    pub async fn cycle(&mut self) -> CycleOutcome {
        self.stats.cycles += 1;

        match self.acquire_sample().await {
            Ok(sample) => {
                self.store.replace(sample);
                self.stats.updates += 1;
                debug!("Stored sample at {}", sample.timestamp);
                CycleOutcome::Updated
            }
            Err(TelemetryError::Decode(e)) => {
                self.stats.decode_failures += 1;
                warn!("Rejected frame from {}: {}", self.link.describe(), e);
                CycleOutcome::DecodeFailed
            }
            Err(e) => {
                self.stats.link_failures += 1;
                warn!("Acquisition from {} failed: {}", self.link.describe(), e);
                CycleOutcome::LinkFailed
            }
        }
    }

    async fn acquire_sample(&mut self) -> error::Result<TelemetrySample> {
        let frame = self.link.acquire().await?;
        debug!("Decoding {} byte frame", frame.len());
        Ok(decode_frame(&frame)?)
    }

    /// Poll until `shutdown` resolves, then return the final counters
    ///
    /// The position timer and shutdown stay live while an acquisition is
    /// waiting on the link; a cycle still in progress at shutdown is dropped.
    pub async fn run<F>(mut self, shutdown: F) -> PollStats
    where
        F: Future<Output = ()>,
    {
        let mut acquire_timer = interval(self.acquire_interval);
        acquire_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut position_timer = interval(self.position_interval);
        position_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);

        info!(
            "Polling {} every {:?} (position every {:?})",
            self.link.describe(),
            self.acquire_interval,
            self.position_interval
        );

        let store = Arc::clone(&self.store);
        let mut position_refreshes = 0;

        loop {
            tokio::select! {
                _ = acquire_timer.tick() => {
                    let interrupted = {
                        let cycle = self.cycle();
                        tokio::pin!(cycle);
                        loop {
                            tokio::select! {
                                _ = &mut cycle => break false,
                                _ = position_timer.tick() => {
                                    refresh_position(&store);
                                    position_refreshes += 1;
                                }
                                _ = &mut shutdown => break true,
                            }
                        }
                    };

                    if interrupted {
                        info!("Poll loop stopping mid-acquisition after {} cycles", self.stats.cycles);
                        break;
                    }

                    if self.stats.cycles % self.status_interval_cycles == 0 {
                        info!(
                            "Cycles: {} (updated {}, link failures {}, rejected frames {})",
                            self.stats.cycles,
                            self.stats.updates,
                            self.stats.link_failures,
                            self.stats.decode_failures
                        );
                    }
                }

                _ = position_timer.tick() => {
                    refresh_position(&store);
                    position_refreshes += 1;
                }

                _ = &mut shutdown => {
                    info!("Poll loop stopping after {} cycles", self.stats.cycles);
                    break;
                }
            }
        }

        self.stats.position_refreshes = position_refreshes;
        self.stats
    }
}

fn refresh_position(store: &SampleStore) {
    info!("{}", display::position_text(&store.current()));
}
