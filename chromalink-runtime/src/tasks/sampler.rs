//! Sampler tick task
//!
//! Pulls the latest camera frame once per tick and publishes the averaged
//! color of the centered box.

use embassy_time::{Duration, Ticker};

use chromalink_core::sampler::PixelBuffer;
use chromalink_hal::{Connector, DeviceFilter, PortRequest};

use crate::clock::Clock;
use crate::session::Session;
use crate::status::StatusSink;

/// Camera frames as RGBA bytes
pub trait FrameSource {
    /// Latest frame, or None while capture is starting
    fn latest_frame(&mut self) -> Option<PixelBuffer<'_>>;
}

/// Sampler task - publishes one color estimate per tick
pub async fn sampler_task<W, S, K, T, F>(session: &Session<W, S, K, T>, source: &mut F)
where
    W: Connector<Selector = DeviceFilter>,
    S: Connector<Selector = PortRequest>,
    K: Clock,
    T: StatusSink,
    F: FrameSource,
{
    let period_ms = session.profile().sample_period_ms as u64;
    info!("Sampler task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms));

    loop {
        if let Some(frame) = source.latest_frame() {
            session.update_from_frame(&frame);
        }
        ticker.next().await;
    }
}
