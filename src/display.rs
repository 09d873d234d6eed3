//! # Display Readouts
//!
//! Text readouts for the dashboard panels, formatted from a sample.
//! Consumers call these at their own refresh rate; nothing here touches a link.

use chrono::{DateTime, Duration, Utc};

use crate::frame::protocol::TelemetrySample;
use crate::store::StoreSnapshot;

/// Telemetry older than this is reported as stale
pub const STALE_AFTER_SECS: i64 = 5;

/// Position panel: six decimal places of latitude and longitude
pub fn position_text(sample: &TelemetrySample) -> String {
    format!(
        "Latitude: {:.6} Longitude: {:.6}",
        sample.latitude, sample.longitude
    )
}

/// Acceleration panel, in g
pub fn acceleration_text(sample: &TelemetrySample) -> String {
    let a = &sample.acceleration;
    format!("X: {:.2} Y: {:.2} Z: {:.2}", a.x, a.y, a.z)
}

/// Pressure and temperature panel
pub fn environment_text(sample: &TelemetrySample) -> String {
    format!(
        "Pres: {:.2}mb Temp: {:.2}°C",
        sample.pressure, sample.temperature
    )
}

/// Payload clock and altitude header
pub fn time_text(sample: &TelemetrySample) -> String {
    format!("T+ {} Alt: {}m", sample.timestamp, sample.altitude)
}

/// How long the displayed sample has gone without advancing
///
/// Returns `None` before the first frame has been stored.
pub fn staleness(snapshot: &StoreSnapshot, now: DateTime<Utc>) -> Option<Duration> {
    snapshot.updated_at.map(|updated| now - updated)
}

/// All readouts for one dashboard refresh
pub fn status_lines(snapshot: &StoreSnapshot, now: DateTime<Utc>) -> Vec<String> {
    let Some(age) = staleness(snapshot, now) else {
        return vec!["Waiting for first telemetry frame".to_string()];
    };

    let sample = &snapshot.sample;
    let mut lines = vec![
        time_text(sample),
        position_text(sample),
        acceleration_text(sample),
        environment_text(sample),
    ];
    if age > Duration::seconds(STALE_AFTER_SECS) {
        lines.push(format!("Telemetry stale for {}s", age.num_seconds()));
    }
    lines
}
