//! Prediction task
//!
//! Sleeps until prediction is started, then runs the classification loop
//! until it is stopped or runs out of training data.

use chromalink_hal::{Connector, DeviceFilter, PortRequest};

use crate::clock::Clock;
use crate::session::Session;
use crate::status::StatusSink;

/// Prediction task - one classification per scheduler turn while running
pub async fn prediction_task<W, S, K, T>(session: &Session<W, S, K, T>)
where
    W: Connector<Selector = DeviceFilter>,
    S: Connector<Selector = PortRequest>,
    K: Clock,
    T: StatusSink,
{
    info!("Prediction task started");

    loop {
        session.wait_for_start().await;
        session.run_prediction().await;
    }
}
