//! Upstream status callbacks
//!
//! The UI layer implements [`StatusSink`] to render classification results,
//! transmitted frames and channel state. All methods default to no-ops.

use chromalink_core::classifier::Label;
use chromalink_core::link::{ChannelKind, LinkState};
use chromalink_protocol::HostMessage;

use crate::session::Facing;

pub trait StatusSink {
    /// A classification tick produced a winner
    fn on_classification(&self, _label: Label, _name: &str, _confidence_percent: u8) {}

    /// A message passed the gate and went to the dispatcher
    fn on_transmit(&self, _message: &HostMessage) {}

    /// Channel state changed; `reason` is set on failure
    fn on_channel_status(&self, _channel: ChannelKind, _state: LinkState, _reason: Option<&str>) {}

    /// The device sent a line of text
    fn on_device_line(&self, _channel: ChannelKind, _line: &str) {}

    /// Camera facing toggled; the host should reopen capture
    fn on_facing_changed(&self, _facing: Facing) {}
}

/// Discards every update
impl StatusSink for () {}

impl<T: StatusSink + ?Sized> StatusSink for &T {
    fn on_classification(&self, label: Label, name: &str, confidence_percent: u8) {
        (**self).on_classification(label, name, confidence_percent)
    }

    fn on_transmit(&self, message: &HostMessage) {
        (**self).on_transmit(message)
    }

    fn on_channel_status(&self, channel: ChannelKind, state: LinkState, reason: Option<&str>) {
        (**self).on_channel_status(channel, state, reason)
    }

    fn on_device_line(&self, channel: ChannelKind, line: &str) {
        (**self).on_device_line(channel, line)
    }

    fn on_facing_changed(&self, facing: Facing) {
        (**self).on_facing_changed(facing)
    }
}
