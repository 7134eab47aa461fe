//! Session state
//!
//! A [`Session`] owns everything the pipeline mutates: the label registry,
//! the classifier, the decision gate, the latest sampled color and both
//! transport channels. All methods take `&self` so the sampler tick, the
//! prediction loop and UI handlers can share one session on a single
//! executor. `RefCell` borrows never cross an await point.

use core::cell::{Cell, RefCell};

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;

use chromalink_core::classifier::{InvalidNameError, KnnClassifier, Label, LabelRegistry};
use chromalink_core::config::DeploymentProfile;
use chromalink_core::gate::{Decision, DecisionGate};
use chromalink_core::link::{ChannelKind, LinkState};
use chromalink_core::sampler::{sample_region, PixelBuffer, Region};
use chromalink_drivers::ble_uart::{nus_filter, BleUartConnector};
use chromalink_drivers::serial::SerialConnector;
use chromalink_hal::{
    ConnectError, Connector, DeviceFilter, GattCentral, PortRequest, SerialConfig, SerialPorts,
};
use chromalink_protocol::{FrameParser, HostMessage, Rgb};

use crate::channel::TransportChannel;
use crate::clock::Clock;
use crate::dispatcher::{Broadcast, Dispatcher};
use crate::status::StatusSink;

/// Reason reported when the host says the link dropped
pub const LINK_LOST_REASON: &str = "connection lost";

/// Camera facing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Facing {
    /// Front camera
    #[default]
    User,
    /// Rear camera
    Environment,
}

impl Facing {
    pub fn toggled(self) -> Self {
        match self {
            Facing::User => Facing::Environment,
            Facing::Environment => Facing::User,
        }
    }
}

/// Preview presentation state; does not affect sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preview {
    /// Mirror the preview horizontally
    pub flipped: bool,
    pub facing: Facing,
}

/// Adding a training example failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExampleError {
    /// No frame has been sampled yet
    NoColor,
    /// Label was never created or has been deleted
    UnknownLabel,
}

/// One row of the label listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub label: Label,
    pub name: String,
    pub examples: usize,
}

/// Pipeline state shared by every task and UI handler
pub struct Session<W, S, K, T>
where
    W: Connector<Selector = DeviceFilter>,
    S: Connector<Selector = PortRequest>,
{
    profile: DeploymentProfile,
    registry: RefCell<LabelRegistry>,
    classifier: RefCell<KnnClassifier>,
    gate: RefCell<DecisionGate>,
    current_color: Cell<Option<Rgb>>,
    preview: Cell<Preview>,
    parsers: RefCell<[FrameParser; 2]>,
    start: Signal<NoopRawMutex, ()>,
    dispatcher: Dispatcher<W, S>,
    clock: K,
    sink: T,
}

impl<C, P, K, T> Session<BleUartConnector<C>, SerialConnector<P>, K, T>
where
    C: GattCentral,
    P: SerialPorts,
    K: Clock,
    T: StatusSink,
{
    /// Session driving a BLE central and a serial port picker
    pub fn with_transports(
        profile: DeploymentProfile,
        central: C,
        ports: P,
        clock: K,
        sink: T,
    ) -> Self {
        Self::new(
            profile,
            BleUartConnector::new(central),
            SerialConnector::new(ports),
            clock,
            sink,
        )
    }
}

impl<W, S, K, T> Session<W, S, K, T>
where
    W: Connector<Selector = DeviceFilter>,
    S: Connector<Selector = PortRequest>,
    K: Clock,
    T: StatusSink,
{
    pub fn new(profile: DeploymentProfile, wireless: W, wired: S, clock: K, sink: T) -> Self {
        let classifier = KnnClassifier::new(profile.k_neighbors as usize);
        let gate = DecisionGate::new(profile.threshold_percent, profile.min_interval_ms as u64);
        let dispatcher = Dispatcher::new(wireless, wired, profile.line_ending);

        Self {
            profile,
            registry: RefCell::new(LabelRegistry::new()),
            classifier: RefCell::new(classifier),
            gate: RefCell::new(gate),
            current_color: Cell::new(None),
            preview: Cell::new(Preview::default()),
            parsers: RefCell::new([FrameParser::new(), FrameParser::new()]),
            start: Signal::new(),
            dispatcher,
            clock,
            sink,
        }
    }

    pub fn profile(&self) -> &DeploymentProfile {
        &self.profile
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    pub fn dispatcher(&self) -> &Dispatcher<W, S> {
        &self.dispatcher
    }

    // --- sampling ---

    /// Latest published color estimate
    pub fn current_color(&self) -> Option<Rgb> {
        self.current_color.get()
    }

    /// Publish a color estimate directly
    pub fn publish_color(&self, color: Rgb) {
        self.current_color.set(Some(color));
    }

    /// Sample the centered box of `frame` and publish the result
    ///
    /// Keeps the previous estimate when no pixel is in bounds.
    pub fn update_from_frame(&self, frame: &PixelBuffer<'_>) -> Option<Rgb> {
        let region = Region::centered(
            frame.width(),
            frame.height(),
            self.profile.sample_box_size as u32,
        );
        let color = sample_region(frame, region)?;
        self.current_color.set(Some(color));
        Some(color)
    }

    // --- labels and training ---

    pub fn create_label(&self, name: &str) -> Result<Label, InvalidNameError> {
        let label = self.registry.borrow_mut().create_label(name)?;
        debug!("label {} created", label.id());
        Ok(label)
    }

    /// Forget a label's name; its training examples stay
    pub fn delete_label(&self, label: Label) -> bool {
        let removed = self.registry.borrow_mut().delete_label(label);
        if removed {
            debug!("label {} deleted", label.id());
        }
        removed
    }

    /// Name shown for `label`
    pub fn label_name(&self, label: Label) -> String {
        self.registry.borrow().name_of(label).to_string()
    }

    /// Store the current color as an example of `label`
    ///
    /// Returns the new example count for the label.
    pub fn add_example(&self, label: Label) -> Result<usize, ExampleError> {
        if !self.registry.borrow().contains(label) {
            return Err(ExampleError::UnknownLabel);
        }
        let color = self.current_color.get().ok_or(ExampleError::NoColor)?;

        let mut classifier = self.classifier.borrow_mut();
        classifier.add_example(color, label);
        let count = classifier.count_for(label);
        debug!("example {} added to label {} ({} total)", color, label.id(), count);
        Ok(count)
    }

    /// Example count per label
    pub fn example_count(&self, label: Label) -> usize {
        self.classifier.borrow().count_for(label)
    }

    /// Current labels with their example counts, in identifier order
    pub fn labels(&self) -> Vec<LabelSummary> {
        let registry = self.registry.borrow();
        let counts = self.classifier.borrow().count_by_label();
        registry
            .labels()
            .map(|(label, name)| LabelSummary {
                label,
                name: name.to_string(),
                examples: counts.get(&label).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Drop all labels and examples; identifiers restart at 1
    pub fn reset_all(&self) {
        self.registry.borrow_mut().reset();
        self.classifier.borrow_mut().clear_all();
        info!("labels and examples cleared");
    }

    // --- prediction ---

    pub fn is_predicting(&self) -> bool {
        self.gate.borrow().is_predicting()
    }

    /// Start the classification loop
    pub fn start_predicting(&self) {
        self.gate.borrow_mut().start();
        self.start.signal(());
        info!("prediction started");
    }

    /// Stop the classification loop and tell the device
    ///
    /// Broadcasts `stop` on every call, whether or not prediction was running.
    pub async fn stop_predicting(&self) {
        let message = self.gate.borrow_mut().stop();
        info!("prediction stopped");
        self.transmit(&message).await;
    }

    /// Wait until [`Session::start_predicting`] is called
    pub async fn wait_for_start(&self) {
        self.start.wait().await;
    }

    /// Classify until prediction is stopped or there is no training data
    pub async fn run_prediction(&self) {
        while self.is_predicting() {
            self.prediction_tick().await;
            yield_now().await;
        }
        trace!("prediction loop idle");
    }

    /// Run one classification tick
    ///
    /// Returns None when nothing was classified (no color yet, or no
    /// training data, which also halts prediction).
    pub async fn prediction_tick(&self) -> Option<Decision> {
        if !self.is_predicting() {
            return Some(Decision::Idle);
        }

        let Some(color) = self.current_color.get() else {
            trace!("no color sampled yet");
            return None;
        };

        let classified = self.classifier.borrow().classify(color);
        let result = match classified {
            Ok(result) => result,
            Err(_) => {
                self.gate.borrow_mut().halt();
                info!("no training data, prediction halted");
                return None;
            }
        };

        let name = self.label_name(result.label);
        let confidence = result.confidence_percent();
        trace!("classified {} as {} ({}%)", color, result.label.id(), confidence);
        self.sink.on_classification(result.label, &name, confidence);

        let now = self.clock.now_ms();
        let decision = self.gate.borrow_mut().evaluate(&result, color, now);
        match decision {
            Decision::Transmit(message) => {
                self.transmit(&message).await;
            }
            Decision::Throttled => trace!("throttled"),
            Decision::LowConfidence => trace!("low confidence"),
            Decision::Idle => {}
        }
        Some(decision)
    }

    async fn transmit(&self, message: &HostMessage) -> Option<Broadcast> {
        self.sink.on_transmit(message);
        match self.dispatcher.broadcast(message).await {
            Ok(result) => {
                if result.delivered() > 0 {
                    debug!("sent {:?} on {} channel(s)", message, result.delivered());
                }
                Some(result)
            }
            Err(e) => {
                warn!("failed to encode {:?}: {:?}", message, e);
                None
            }
        }
    }

    // --- channels ---

    /// Selector for the wireless picker, from the profile
    pub fn wireless_selector(&self) -> DeviceFilter {
        nus_filter(&self.profile.ble_name_prefix)
    }

    /// Selector for the serial picker, from the profile
    pub fn wired_selector(&self) -> PortRequest {
        PortRequest {
            config: SerialConfig::with_baudrate(self.profile.serial_baud),
            vendor_id: self.profile.serial_vendor_id,
        }
    }

    pub fn channel_state(&self, kind: ChannelKind) -> LinkState {
        match kind {
            ChannelKind::Wireless => self.dispatcher.wireless().state(),
            ChannelKind::Wired => self.dispatcher.wired().state(),
        }
    }

    /// Connect one channel, reporting progress to the sink
    pub async fn connect(&self, kind: ChannelKind) -> Result<(), ConnectError> {
        match kind {
            ChannelKind::Wireless => {
                let selector = self.wireless_selector();
                self.connect_channel(self.dispatcher.wireless(), &selector).await
            }
            ChannelKind::Wired => {
                let selector = self.wired_selector();
                self.connect_channel(self.dispatcher.wired(), &selector).await
            }
        }
    }

    async fn connect_channel<C: Connector>(
        &self,
        channel: &TransportChannel<C>,
        selector: &C::Selector,
    ) -> Result<(), ConnectError> {
        let kind = channel.kind();
        let Some(attempt) = channel.begin_connect() else {
            // Ignored: already connected, or a handshake is still pending
            return Ok(());
        };
        self.sink.on_channel_status(kind, LinkState::Connecting, None);

        match attempt.finish(selector).await {
            Ok(state) => {
                self.sink.on_channel_status(kind, state, None);
                Ok(())
            }
            Err(e) => {
                self.sink.on_channel_status(kind, channel.state(), Some(e.reason()));
                Err(e)
            }
        }
    }

    /// Disconnect one channel; safe to call repeatedly
    pub async fn disconnect(&self, kind: ChannelKind) {
        match kind {
            ChannelKind::Wireless => self.dispatcher.wireless().disconnect().await,
            ChannelKind::Wired => self.dispatcher.wired().disconnect().await,
        }
        self.parser_reset(kind);
        self.sink.on_channel_status(kind, self.channel_state(kind), None);
    }

    /// The host reports the transport dropped
    pub async fn link_lost(&self, kind: ChannelKind) {
        let before = self.channel_state(kind);
        match kind {
            ChannelKind::Wireless => self.dispatcher.wireless().link_lost().await,
            ChannelKind::Wired => self.dispatcher.wired().link_lost().await,
        }
        self.parser_reset(kind);
        if before == LinkState::Connected {
            let state = self.channel_state(kind);
            self.sink.on_channel_status(kind, state, Some(LINK_LOST_REASON));
        }
    }

    // --- inbound ---

    /// Feed bytes received from the device on `kind`
    ///
    /// Complete lines are reported to the sink. Returns how many lines were
    /// completed.
    pub fn on_device_data(&self, kind: ChannelKind, bytes: &[u8]) -> usize {
        let mut lines = Vec::new();
        {
            let mut parsers = self.parsers.borrow_mut();
            let parser = &mut parsers[parser_index(kind)];
            for &byte in bytes {
                match parser.feed(byte) {
                    Ok(Some(frame)) => lines.push(frame),
                    Ok(None) => {}
                    Err(e) => warn!("{}: bad line from device: {:?}", kind, e),
                }
            }
        }

        for frame in &lines {
            match frame.as_str() {
                Some(line) => {
                    info!("{}: device says {}", kind, line);
                    self.sink.on_device_line(kind, line);
                }
                None => warn!("{}: device line is not UTF-8", kind),
            }
        }
        lines.len()
    }

    fn parser_reset(&self, kind: ChannelKind) {
        self.parsers.borrow_mut()[parser_index(kind)].reset();
    }

    // --- preview ---

    pub fn preview(&self) -> Preview {
        self.preview.get()
    }

    /// Toggle horizontal mirroring; returns the new setting
    pub fn flip_preview(&self) -> bool {
        let mut preview = self.preview.get();
        preview.flipped = !preview.flipped;
        self.preview.set(preview);
        preview.flipped
    }

    /// Toggle the camera facing mode and tell the host to reopen capture
    pub fn switch_source(&self) -> Facing {
        let mut preview = self.preview.get();
        preview.facing = preview.facing.toggled();
        self.preview.set(preview);
        debug!("camera facing {:?}", preview.facing);
        self.sink.on_facing_changed(preview.facing);
        preview.facing
    }
}

fn parser_index(kind: ChannelKind) -> usize {
    match kind {
        ChannelKind::Wireless => 0,
        ChannelKind::Wired => 1,
    }
}
