//! # Sampling Pipeline Module
//!
//! The fixed-period acquisition-and-control loop at the heart of the
//! application. Each tick:
//!
//! 1. Reads telemetry from the sensor source
//! 2. Derives altitude from pressure (omitted for rejected readings)
//! 3. Renders a frame against a control-state snapshot and pushes it to the
//!    LED sink, honoring power, low-light and mode-transition state
//! 4. Assembles the outward sample and publishes it
//! 5. Appends the sample to the recorder while a session is active
//!
//! The loop terminates only on the cooperative shutdown flag, checked once
//! per iteration; an in-flight frame always completes. A single bad sample is
//! logged and never takes the loop down. Sensor reads carry no timeout, so a
//! hang there stalls the whole pipeline by design.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::display::renderer::render_frame;
use crate::display::{apply_low_light, LedSink, Rgb};
use crate::recorder::Recorder;
use crate::sensor::{read_telemetry, SensorSource};
use crate::state::SharedState;
use crate::telemetry::{pressure_to_altitude, Command, Sample, SamplePublisher};

/// Number of frames between status log messages (1 minute at the 100 ms default)
const LOG_INTERVAL_FRAMES: u64 = 600;

/// The fixed-period sampling pipeline.
///
/// Owns the sensor, the LED sink, the publisher and the recorder; the shared
/// control state is the only boundary it reads concurrently with the input
/// listener.
pub struct Pipeline {
    sensor: Box<dyn SensorSource>,
    sink: Box<dyn LedSink>,
    publisher: Box<dyn SamplePublisher>,
    recorder: Recorder,
    state: SharedState,
    interval: Duration,
    sea_level_pressure: f64,
    indicator_color: Rgb,
    rng: SmallRng,
    started: Instant,
    frame_count: u64,
}

impl Pipeline {
    /// Assemble a pipeline from its collaborators.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated application configuration
    /// * `sensor` - Telemetry source (hardware or mock)
    /// * `sink` - LED matrix output (hardware or null)
    /// * `publisher` - Outward sample publisher
    /// * `recorder` - CSV session recorder (exclusively owned here)
    /// * `state` - Control state shared with the input listener
    pub fn new(
        config: &Config,
        sensor: Box<dyn SensorSource>,
        sink: Box<dyn LedSink>,
        publisher: Box<dyn SamplePublisher>,
        recorder: Recorder,
        state: SharedState,
    ) -> Self {
        Self {
            sensor,
            sink,
            publisher,
            recorder,
            state,
            interval: config.interval(),
            sea_level_pressure: config.pipeline.sea_level_pressure_hpa,
            indicator_color: config.indicator_color(),
            rng: SmallRng::from_entropy(),
            started: Instant::now(),
            frame_count: 0,
        }
    }

    /// Run until the shutdown flag flips.
    ///
    /// Inbound [`Command`]s are consumed between ticks; the command channel
    /// closing is harmless and only disables that control surface.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        self.started = Instant::now();
        info!("Sampling pipeline started (period {:?})", self.interval);

        let mut commands_open = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                cmd = commands.recv(), if commands_open => match cmd {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.recorder.stop();
        if let Err(e) = self.sink.clear() {
            warn!("Failed to clear matrix on shutdown: {}", e);
        }
        info!("Sampling pipeline stopped after {} frames", self.frame_count);
    }

    /// Apply one inbound command.
    fn handle_command(&mut self, command: Command) {
        match command {
            Command::ToggleRecording => {
                self.recorder.toggle();
                info!(
                    "Recording toggled: {}",
                    if self.recorder.is_recording() { "ON" } else { "OFF" }
                );
            }
        }
    }

    /// Execute one frame: read, derive, render, publish, record.
    fn tick(&mut self) {
        let mut telemetry = read_telemetry(self.sensor.as_mut());
        match pressure_to_altitude(telemetry.pressure, self.sea_level_pressure) {
            Ok(altitude) => telemetry.altitude = Some(altitude),
            Err(e) => warn!("Altitude omitted for this frame: {}", e),
        }

        let snapshot = {
            let mut state = self.state.lock().expect("control state mutex poisoned");
            state.snapshot(Instant::now())
        };

        let elapsed = self.started.elapsed().as_secs_f64();
        let mut frame = render_frame(
            &snapshot,
            &telemetry,
            elapsed,
            &mut self.rng,
            self.indicator_color,
        );
        if snapshot.low_light {
            frame = apply_low_light(&frame);
        }
        if let Err(e) = self.sink.draw(&frame) {
            warn!("Failed to draw frame: {}", e);
        }

        let sample = Sample::new(&telemetry, &snapshot, self.recorder.is_recording());
        self.publisher.publish(&sample);
        self.recorder.record(&sample);

        self.frame_count += 1;
        if self.frame_count % LOG_INTERVAL_FRAMES == 0 {
            info!(
                "Processed {} frames (mode {}, recording: {})",
                self.frame_count,
                snapshot.mode.name(),
                self.recorder.is_recording()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::mocks::CapturingSink;
    use crate::display::{pixel_index, Rgb, BLANK_FRAME, GRID_SIZE};
    use crate::input::{apply_event, Action, Direction, InputEvent};
    use crate::sensor::{MockSensor, Orientation};
    use crate::state::{shared_state, DisplayMode};
    use crate::telemetry::ChannelPublisher;
    use tempfile::TempDir;

    /// Sensor with settable readings.
    struct TestSensor {
        pressure: f64,
        orientation: Orientation,
    }

    impl TestSensor {
        fn level() -> Self {
            Self {
                pressure: 1013.25,
                orientation: Orientation::default(),
            }
        }
    }

    impl SensorSource for TestSensor {
        fn temperature_c(&mut self) -> f64 {
            25.0
        }
        fn humidity_percent(&mut self) -> f64 {
            45.0
        }
        fn pressure_hpa(&mut self) -> f64 {
            self.pressure
        }
        fn orientation(&mut self) -> Orientation {
            self.orientation
        }
    }

    struct Harness {
        pipeline: Pipeline,
        sink: CapturingSink,
        samples: mpsc::Receiver<Sample>,
        state: SharedState,
        _log_dir: TempDir,
    }

    fn harness(sensor: TestSensor) -> Harness {
        let config = Config::default();
        let sink = CapturingSink::new();
        let (tx, samples) = mpsc::channel(64);
        let state = shared_state(Duration::ZERO);
        let log_dir = TempDir::new().unwrap();

        let pipeline = Pipeline::new(
            &config,
            Box::new(sensor),
            Box::new(sink.clone()),
            Box::new(ChannelPublisher::new(tx)),
            Recorder::new(log_dir.path()),
            state.clone(),
        );

        Harness {
            pipeline,
            sink,
            samples,
            state,
            _log_dir: log_dir,
        }
    }

    fn lit_pixels(frame: &crate::display::FrameBuffer) -> Vec<(usize, usize, Rgb)> {
        (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| frame[pixel_index(x, y)] != Rgb::BLACK)
            .map(|(x, y)| (x, y, frame[pixel_index(x, y)]))
            .collect()
    }

    fn select_mode(state: &SharedState, mode: DisplayMode) {
        let mut guard = state.lock().unwrap();
        while guard.mode() != mode {
            guard.advance(1, Instant::now());
        }
    }

    #[test]
    fn test_level_spirit_frame_is_green_center() {
        let mut h = harness(TestSensor::level());
        select_mode(&h.state, DisplayMode::SpiritLevel);

        h.pipeline.tick();

        let frame = h.sink.last_frame().unwrap();
        let lit = lit_pixels(&frame);
        assert_eq!(lit.len(), 1);
        let (x, y, color) = lit[0];
        assert!([(3, 3), (3, 4), (4, 3), (4, 4)].contains(&(x, y)));
        assert_eq!(color, Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_tilted_spirit_frame_is_red_at_the_edge() {
        let mut sensor = TestSensor::level();
        sensor.orientation.pitch = 20.0;
        let mut h = harness(sensor);
        select_mode(&h.state, DisplayMode::SpiritLevel);

        h.pipeline.tick();

        let lit = lit_pixels(&h.sink.last_frame().unwrap());
        assert_eq!(lit.len(), 1);
        let (x, y, color) = lit[0];
        assert_eq!(x, 0);
        assert!(y == 3 || y == 4);
        assert_eq!(color, Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_bad_pressure_omits_altitude_and_survives() {
        let mut sensor = TestSensor::level();
        sensor.pressure = -5.0;
        let mut h = harness(sensor);

        h.pipeline.tick();
        h.pipeline.tick();

        let sample = h.samples.try_recv().unwrap();
        assert_eq!(sample.env.altitude, None);
        // Loop kept running; a second sample arrived
        assert!(h.samples.try_recv().is_ok());
    }

    #[test]
    fn test_published_sample_reflects_state_and_telemetry() {
        let mut h = harness(TestSensor::level());

        h.pipeline.tick();

        let sample = h.samples.try_recv().unwrap();
        assert_eq!(sample.env.temp, 25.0);
        assert_eq!(sample.env.altitude, Some(0.0));
        assert_eq!(sample.sys.mode_id, 0);
        assert_eq!(sample.sys.mode_name, "Monitor Mode");
        assert!(sample.sys.is_on);
        assert!(!sample.sys.is_recording);
    }

    #[test]
    fn test_power_off_draws_a_dark_frame() {
        let mut h = harness(TestSensor::level());
        h.state.lock().unwrap().toggle_power();

        h.pipeline.tick();

        assert_eq!(h.sink.last_frame().unwrap(), BLANK_FRAME);
        let sample = h.samples.try_recv().unwrap();
        assert!(!sample.sys.is_on);
    }

    #[test]
    fn test_low_light_dims_the_frame() {
        let mut h = harness(TestSensor::level());

        h.pipeline.tick();
        let bright = h.sink.last_frame().unwrap();

        apply_event(
            &h.state,
            InputEvent {
                direction: Direction::Down,
                action: Action::Pressed,
            },
        );
        h.pipeline.tick();
        let dim = h.sink.last_frame().unwrap();

        let bright_max = bright.iter().map(|p| p.g).max().unwrap();
        let dim_max = dim.iter().map(|p| p.g).max().unwrap();
        assert!(dim_max < bright_max);
    }

    #[test]
    fn test_transition_window_shows_the_indicator_digit() {
        let mut h = harness(TestSensor::level());
        // Non-zero window so the snapshot still sees the transition
        let state = shared_state(Duration::from_secs(5));
        h.pipeline.state = state.clone();
        apply_event(
            &state,
            InputEvent {
                direction: Direction::Right,
                action: Action::Pressed,
            },
        );

        h.pipeline.tick();

        let frame = h.sink.last_frame().unwrap();
        let lit = lit_pixels(&frame);
        assert!(!lit.is_empty());
        for (_, _, color) in lit {
            assert_eq!(color, Rgb::new(0, 0, 255));
        }
    }

    #[test]
    fn test_toggle_recording_records_subsequent_samples() {
        let mut h = harness(TestSensor::level());

        h.pipeline.handle_command(Command::ToggleRecording);
        assert!(h.pipeline.recorder.is_recording());
        let path = h.pipeline.recorder.log_path().unwrap().to_path_buf();

        h.pipeline.tick();
        h.pipeline.tick();
        h.pipeline.handle_command(Command::ToggleRecording);
        assert!(!h.pipeline.recorder.is_recording());

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 3); // header + 2 rows
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_and_clears_the_matrix() {
        let mut h = harness(TestSensor::level());
        // Fast ticks so the test observes at least one frame
        h.pipeline.interval = Duration::from_millis(5);
        let sink = h.sink.clone();

        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(h.pipeline.run(cmd_rx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(sink.frame_count() > 1);
        // Final draw is the shutdown clear
        assert_eq!(sink.last_frame().unwrap(), BLANK_FRAME);
    }

    #[tokio::test]
    async fn test_run_survives_a_closed_command_channel() {
        let h = harness(TestSensor::level());
        let sink = h.sink.clone();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(4);
        drop(cmd_tx);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(h.pipeline.run(cmd_rx, shutdown_rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(sink.frame_count() >= 1);
    }

    #[test]
    fn test_mock_sensor_harness_matches_hardware_contract() {
        // The pipeline must behave identically against the shipped mock
        let config = Config::default();
        let (tx, mut samples) = mpsc::channel(4);
        let log_dir = TempDir::new().unwrap();
        let mut pipeline = Pipeline::new(
            &config,
            Box::new(MockSensor),
            Box::new(CapturingSink::new()),
            Box::new(ChannelPublisher::new(tx)),
            Recorder::new(log_dir.path()),
            shared_state(Duration::ZERO),
        );

        pipeline.tick();

        let sample = samples.try_recv().unwrap();
        assert_eq!(sample.env.temp, 25.0);
        assert_eq!(sample.env.humidity, 45.0);
        assert_eq!(sample.env.pressure, 1013.3);
        assert_eq!(sample.env.altitude, Some(0.0));
    }
}
