//! # Sample Store Module
//!
//! Holds the latest decoded sample and the plotting windows.
//!
//! This module handles:
//! - Replacing the current sample and appending to all five windows as one step
//! - Read-only snapshots for consumers (dashboard, reporters)
//! - Tracking when telemetry last advanced, so consumers can show staleness

pub mod window;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::frame::protocol::TelemetrySample;
use window::{SlidingWindow, WINDOW_CAPACITY};

/// Scalar channels that keep a history window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    Pressure,
    Temperature,
}

impl Channel {
    /// All windowed channels, in display order
    pub const ALL: [Channel; 5] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::Pressure,
        Channel::Temperature,
    ];

    /// Consumer-facing channel name
    pub fn name(self) -> &'static str {
        match self {
            Channel::AccelX => "accel-x",
            Channel::AccelY => "accel-y",
            Channel::AccelZ => "accel-z",
            Channel::Pressure => "pressure",
            Channel::Temperature => "temperature",
        }
    }

    /// This channel's value in a sample
    pub fn value(self, sample: &TelemetrySample) -> f64 {
        match self {
            Channel::AccelX => sample.acceleration.x,
            Channel::AccelY => sample.acceleration.y,
            Channel::AccelZ => sample.acceleration.z,
            Channel::Pressure => sample.pressure,
            Channel::Temperature => sample.temperature,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|channel| channel.name() == s)
            .ok_or_else(|| format!("unknown channel: {}", s))
    }
}

/// Copies of all five windows, taken together
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSnapshot {
    pub accel_x: Vec<f64>,
    pub accel_y: Vec<f64>,
    pub accel_z: Vec<f64>,
    pub pressure: Vec<f64>,
    pub temperature: Vec<f64>,
}

impl WindowSnapshot {
    /// Window contents for one channel
    pub fn get(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::AccelX => &self.accel_x,
            Channel::AccelY => &self.accel_y,
            Channel::AccelZ => &self.accel_z,
            Channel::Pressure => &self.pressure,
            Channel::Temperature => &self.temperature,
        }
    }
}

/// Consistent view of the whole store at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub sample: TelemetrySample,
    pub windows: WindowSnapshot,
    /// When the sample last changed; `None` before the first frame
    pub updated_at: Option<DateTime<Utc>>,
    pub update_count: u64,
}

impl StoreSnapshot {
    /// Serialize for external consumers
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug)]
struct Windows {
    accel_x: SlidingWindow<f64>,
    accel_y: SlidingWindow<f64>,
    accel_z: SlidingWindow<f64>,
    pressure: SlidingWindow<f64>,
    temperature: SlidingWindow<f64>,
}

impl Windows {
    fn zeroed(capacity: usize) -> Self {
        Self {
            accel_x: SlidingWindow::zeroed(capacity),
            accel_y: SlidingWindow::zeroed(capacity),
            accel_z: SlidingWindow::zeroed(capacity),
            pressure: SlidingWindow::zeroed(capacity),
            temperature: SlidingWindow::zeroed(capacity),
        }
    }

    fn get(&self, channel: Channel) -> &SlidingWindow<f64> {
        match channel {
            Channel::AccelX => &self.accel_x,
            Channel::AccelY => &self.accel_y,
            Channel::AccelZ => &self.accel_z,
            Channel::Pressure => &self.pressure,
            Channel::Temperature => &self.temperature,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut SlidingWindow<f64> {
        match channel {
            Channel::AccelX => &mut self.accel_x,
            Channel::AccelY => &mut self.accel_y,
            Channel::AccelZ => &mut self.accel_z,
            Channel::Pressure => &mut self.pressure,
            Channel::Temperature => &mut self.temperature,
        }
    }

    fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            accel_x: self.accel_x.snapshot(),
            accel_y: self.accel_y.snapshot(),
            accel_z: self.accel_z.snapshot(),
            pressure: self.pressure.snapshot(),
            temperature: self.temperature.snapshot(),
        }
    }
}

#[derive(Debug)]
struct StoreState {
    sample: TelemetrySample,
    windows: Windows,
    updated_at: Option<DateTime<Utc>>,
    update_count: u64,
}

/// Latest sample plus history windows
///
/// Written by the poll loop only; read by any number of consumers. Sample,
/// windows and metadata sit behind a single lock, so a reader never sees a
/// new sample with old windows or the reverse.
#[derive(Debug)]
pub struct SampleStore {
    state: RwLock<StoreState>,
}

impl SampleStore {
    /// Create a store with a zeroed sample and zero-filled windows
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    /// Create a store with a custom window capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(StoreState {
                sample: TelemetrySample::default(),
                windows: Windows::zeroed(capacity),
                updated_at: None,
                update_count: 0,
            }),
        }
    }

    /// Swap in a new sample and append its scalar channels to the windows
    pub fn replace(&self, sample: TelemetrySample) {
        let mut state = self.state.write();
        for channel in Channel::ALL {
            state.windows.get_mut(channel).append(channel.value(&sample));
        }
        state.sample = sample;
        state.updated_at = Some(Utc::now());
        state.update_count += 1;
    }

    /// Latest sample
    pub fn current(&self) -> TelemetrySample {
        self.state.read().sample
    }

    /// Window contents for one channel, oldest first
    pub fn window(&self, channel: Channel) -> Vec<f64> {
        self.state.read().windows.get(channel).snapshot()
    }

    /// Window contents by consumer-facing name (`"accel-x"`, `"pressure"`...)
    pub fn window_by_name(&self, name: &str) -> Option<Vec<f64>> {
        name.parse::<Channel>().ok().map(|channel| self.window(channel))
    }

    /// All five windows, copied under one lock
    pub fn windows(&self) -> WindowSnapshot {
        self.state.read().windows.snapshot()
    }

    /// Sample, windows and metadata, copied under one lock
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            sample: state.sample,
            windows: state.windows.snapshot(),
            updated_at: state.updated_at,
            update_count: state.update_count,
        }
    }

    /// When telemetry last advanced
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().updated_at
    }
}

impl Default for SampleStore {
    fn default() -> Self {
        Self::new()
    }
}
