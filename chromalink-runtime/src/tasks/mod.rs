//! Async tasks
//!
//! Each task borrows the shared [`Session`](crate::Session) and runs on the
//! same executor as the UI handlers.

pub mod device_rx;
pub mod prediction;
pub mod sampler;

pub use device_rx::{channel_rx_task, device_rx_task};
pub use prediction::prediction_task;
pub use sampler::{sampler_task, FrameSource};
