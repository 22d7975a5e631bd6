//! # Sense Loop
//!
//! Real-time Sense HAT acquisition loop: sensor sampling, LED matrix
//! visualizations, joystick control and CSV recording.
//!
//! Two long-lived tasks run for the lifetime of the process: the sampling
//! pipeline (sensor read, render, publish, record) and the joystick listener
//! (control-state mutation). Ctrl+C flips a cooperative shutdown flag; both
//! tasks finish their in-flight iteration and exit.

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use sense_loop::config::Config;
use sense_loop::display::{LedSink, NullLedSink, SenseHatMatrix};
use sense_loop::input::{InputListener, JoystickSource, NullJoystick, SenseHatJoystick};
use sense_loop::pipeline::Pipeline;
use sense_loop::recorder::Recorder;
use sense_loop::sensor::MockSensor;
use sense_loop::state::shared_state;
use sense_loop::telemetry::{ChannelPublisher, Command, Sample};

/// Default configuration file path, relative to the working directory.
const CONFIG_PATH: &str = "config/default.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Sense Loop v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(CONFIG_PATH)?;
    let state = shared_state(config.transition_duration());

    // Hardware seams: every missing device degrades to a software fallback
    // and the pipeline runs identically either way.
    let sink: Box<dyn LedSink> = match SenseHatMatrix::open() {
        Ok(matrix) => Box::new(matrix),
        Err(e) => {
            warn!("LED matrix unavailable ({}), frames will be discarded", e);
            Box::new(NullLedSink)
        }
    };
    let joystick: Box<dyn JoystickSource> = match SenseHatJoystick::open() {
        Ok(joystick) => Box::new(joystick),
        Err(e) => {
            warn!("Joystick unavailable ({}), input disabled", e);
            Box::new(NullJoystick)
        }
    };
    // The environmental/IMU sensor driver plugs in at the SensorSource seam;
    // the mock carries the fixed defaults specified for absent hardware.
    let sensor = MockSensor;
    info!("Sensor source: mock defaults (25.0 C, 45.0 %RH, 1013.25 hPa)");

    let (sample_tx, sample_rx) = mpsc::channel(config.publish.channel_capacity);
    let (command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let recorder = Recorder::new(config.recording.log_dir.clone());
    let pipeline = Pipeline::new(
        &config,
        Box::new(sensor),
        sink,
        Box::new(ChannelPublisher::new(sample_tx)),
        recorder,
        state.clone(),
    );
    let listener = InputListener::new(joystick, state, config.poll_interval());

    let pipeline_handle = tokio::spawn(pipeline.run(command_rx, shutdown_rx.clone()));
    let listener_handle = tokio::spawn(listener.run(shutdown_rx));
    let transport_handle = tokio::spawn(transport_stub(sample_rx, command_tx));

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    shutdown_tx.send(true)?;
    pipeline_handle.await?;
    listener_handle.await?;
    transport_handle.abort();

    Ok(())
}

/// Stand-in for the web/socket transport collaborator.
///
/// Drains published samples and holds the command sender; a real transport
/// forwards each sample to its clients and emits
/// [`Command::ToggleRecording`] when the UI requests it.
async fn transport_stub(mut samples: mpsc::Receiver<Sample>, _commands: mpsc::Sender<Command>) {
    while let Some(sample) = samples.recv().await {
        match serde_json::to_string(&sample) {
            Ok(payload) => debug!("sensor_update: {}", payload),
            Err(e) => warn!("Failed to serialize sample: {}", e),
        }
    }
}
