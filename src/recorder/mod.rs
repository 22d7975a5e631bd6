//! # Recorder Module
//!
//! Scoped CSV recording sessions for the per-tick samples.
//!
//! A session is one timestamped file under the configured log directory with
//! a fixed header row and one row per sample. The file handle is exclusively
//! owned by the pipeline task, so rows are never interleaved.
//!
//! ## Failure policy
//!
//! Recording is an optional convenience and must never take the loop down:
//! any I/O failure while starting a session or appending a row is logged and
//! converted into an implicit [`Recorder::stop`], degrading to non-recording.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::telemetry::Sample;

/// Fixed CSV header row.
pub const CSV_HEADER: &str = "timestamp,temp,humidity,pressure,altitude,pitch,roll,yaw,mode_id,mode_name,joystick_direction,joystick_action";

/// Timestamp format embedded in log file names.
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

struct Session {
    writer: BufWriter<File>,
    path: PathBuf,
}

/// CSV session recorder.
pub struct Recorder {
    log_dir: PathBuf,
    session: Option<Session>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("log_dir", &self.log_dir)
            .field("recording", &self.session.is_some())
            .finish()
    }
}

impl Recorder {
    /// Create a recorder writing under `log_dir`. The directory is created
    /// lazily when the first session starts.
    pub fn new<P: Into<PathBuf>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.into(),
            session: None,
        }
    }

    /// Whether a session is currently active.
    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    /// Path of the active session file, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Start a new session: create the log directory and a timestamped file,
    /// and write the header row.
    ///
    /// A no-op while a session is already active (no second file is created).
    /// I/O failure degrades to the non-recording state instead of
    /// propagating.
    pub fn start(&mut self) {
        if self.session.is_some() {
            info!("Recorder is already recording");
            return;
        }

        let stamp = Local::now().format(FILE_STAMP_FORMAT);
        let path = self.log_dir.join(format!("sensordata_{}.csv", stamp));

        if let Err(e) = self.open_session(&path) {
            warn!("Failed to start log file {}: {}", path.display(), e);
            self.stop();
            return;
        }

        info!("Recording started: {}", path.display());
    }

    fn open_session(&mut self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.log_dir)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{}", CSV_HEADER)?;
        self.session = Some(Session {
            writer,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Append one sample row. A no-op while no session is active; a write
    /// failure implicitly stops the session.
    pub fn record(&mut self, sample: &Sample) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Err(e) = write_row(&mut session.writer, sample) {
            warn!("Failed to write log row: {}", e);
            self.stop();
        }
    }

    /// Flush and close the active session. Idempotent.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Err(e) = session.writer.flush() {
            warn!("Failed to flush log file {}: {}", session.path.display(), e);
        }
        info!("Recording stopped: {}", session.path.display());
    }

    /// Flip the session state: start when idle, stop when recording.
    pub fn toggle(&mut self) {
        if self.is_recording() {
            self.stop();
        } else {
            self.start();
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Format one CSV row with a full local ISO-8601 timestamp.
fn write_row<W: Write>(writer: &mut W, sample: &Sample) -> std::io::Result<()> {
    let altitude = sample
        .env
        .altitude
        .map(|a| format!("{:.1}", a))
        .unwrap_or_default();

    writeln!(
        writer,
        "{},{:.1},{:.1},{:.1},{},{:.1},{:.1},{:.1},{},{},{},{}",
        Local::now().to_rfc3339(),
        sample.env.temp,
        sample.env.humidity,
        sample.env.pressure,
        altitude,
        sample.imu.pitch,
        sample.imu.roll,
        sample.imu.yaw,
        sample.sys.mode_id,
        sample.sys.mode_name,
        sample.joystick.direction,
        sample.joystick.action,
    )
}
