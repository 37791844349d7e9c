// SPDX-License-Identifier: MIT OR Apache-2.0
//! Recording capture coordination.
//!
//! This module handles:
//! - Auto-record on play, after a wall-clock countdown
//! - Cancelling a pending countdown on pause or stop
//! - Stopping capture when playback stops or the timeline ends
//! - Manual record/stop requests from the host
//!
//! Capture itself is done by a host [`Recorder`]; the coordinator only
//! decides when to start and stop it. Pausing playback keeps the capture
//! running so the output is a single file.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Capture quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingQuality {
    /// Smallest files
    Low,
    /// Balanced
    Medium,
    /// High quality
    #[default]
    High,
    /// Maximum quality
    Ultra,
}

/// Capture container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordingFormat {
    /// WebM video
    #[default]
    Webm,
    /// MP4 video
    Mp4,
    /// Animated GIF
    Gif,
}

/// Recording configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingSettings {
    /// Start capture automatically when playback starts
    pub auto_record: bool,
    /// Capture audio as well
    pub record_audio: bool,
    /// Quality preset
    pub quality: RecordingQuality,
    /// Output format
    pub format: RecordingFormat,
    /// Seconds between the record request and the capture start
    pub countdown: f64,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            auto_record: false,
            record_audio: false,
            quality: RecordingQuality::High,
            format: RecordingFormat::Webm,
            countdown: 3.0,
        }
    }
}

impl RecordingSettings {
    /// Countdown in milliseconds, with invalid values read as 0
    pub fn countdown_ms(&self) -> f64 {
        if self.countdown.is_finite() {
            self.countdown.max(0.0) * 1000.0
        } else {
            0.0
        }
    }
}

/// What the host recorder produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    /// Location of the capture, if the recorder stores one
    pub url: Option<String>,
    /// Captured length in milliseconds
    pub duration_ms: f64,
}

/// Host-side capture device
pub trait Recorder {
    /// Begin capturing
    fn start_capture(&mut self, settings: &RecordingSettings) -> Result<(), RecorderError>;

    /// Finish capturing
    fn stop_capture(&mut self) -> Result<CaptureResult, RecorderError>;
}

/// Error from the recorder or a recording request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecorderError {
    /// The recorder refused to start
    #[error("Capture failed to start: {0}")]
    StartFailed(String),

    /// The recorder failed to finish
    #[error("Capture failed to stop: {0}")]
    StopFailed(String),

    /// Stop requested while nothing is recording
    #[error("Not recording")]
    NotRecording,

    /// Record requested while already recording
    #[error("Already recording")]
    AlreadyRecording,
}

/// A change in recording state
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingEvent {
    /// Countdown began
    CountdownStarted {
        /// Countdown length in seconds
        seconds: f64,
    },
    /// Countdown was cancelled before capture began
    CountdownCancelled,
    /// Capture began
    Started {
        /// Wall-clock start, milliseconds since the Unix epoch
        start_time: u64,
    },
    /// Capture ended
    Stopped {
        /// Recorder output, if the stop succeeded
        capture: Option<CaptureResult>,
    },
    /// The recorder reported an error
    Failed(RecorderError),
}

/// Starts and stops capture in step with playback
pub struct RecordingCoordinator {
    /// Current settings
    settings: RecordingSettings,
    /// Host capture device
    recorder: Option<Box<dyn Recorder>>,
    /// Remaining countdown, in wall-clock milliseconds
    countdown_remaining: Option<f64>,
    /// Whether capture is running
    is_recording: bool,
    /// Wall-clock capture start, milliseconds since the Unix epoch
    recording_start_time: Option<u64>,
    /// Output of the last finished capture
    last_capture: Option<CaptureResult>,
}

impl RecordingCoordinator {
    /// Create a coordinator without a recorder
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            recorder: None,
            countdown_remaining: None,
            is_recording: false,
            recording_start_time: None,
            last_capture: None,
        }
    }

    /// Attach the host recorder, returning the previous one
    pub fn set_recorder(&mut self, recorder: Box<dyn Recorder>) -> Option<Box<dyn Recorder>> {
        self.recorder.replace(recorder)
    }

    /// Current settings
    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    /// Replace the settings; a running capture is unaffected
    pub fn set_settings(&mut self, settings: RecordingSettings) {
        self.settings = settings;
    }

    /// Whether capture is running
    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Whether a countdown is pending
    pub fn is_counting_down(&self) -> bool {
        self.countdown_remaining.is_some()
    }

    /// Remaining countdown in milliseconds
    pub fn countdown_remaining(&self) -> Option<f64> {
        self.countdown_remaining
    }

    /// Wall-clock capture start, milliseconds since the Unix epoch
    pub fn recording_start_time(&self) -> Option<u64> {
        self.recording_start_time
    }

    /// Output of the last finished capture
    pub fn last_capture(&self) -> Option<&CaptureResult> {
        self.last_capture.as_ref()
    }

    /// Playback started or resumed
    pub fn on_play(&mut self) -> Option<RecordingEvent> {
        if !self.settings.auto_record || self.is_recording || self.is_counting_down() {
            return None;
        }
        Some(self.arm().unwrap_or_else(RecordingEvent::Failed))
    }

    /// Playback paused; only a pending countdown is affected
    pub fn on_pause(&mut self) -> Option<RecordingEvent> {
        self.cancel_countdown()
    }

    /// Playback stopped, explicitly or at the end of the timeline
    pub fn on_stop(&mut self) -> Option<RecordingEvent> {
        if let Some(event) = self.cancel_countdown() {
            return Some(event);
        }
        if !self.is_recording {
            return None;
        }
        Some(match self.finish() {
            Ok(capture) => RecordingEvent::Stopped { capture: Some(capture) },
            Err(err) => RecordingEvent::Failed(err),
        })
    }

    /// Wall time passed; fires the capture start when the countdown runs out.
    ///
    /// Playback speed does not affect the countdown.
    pub fn advance(&mut self, wall_delta_ms: f64) -> Option<RecordingEvent> {
        let remaining = self.countdown_remaining.as_mut()?;
        if wall_delta_ms > 0.0 {
            *remaining -= wall_delta_ms;
        }
        if *remaining > 0.0 {
            return None;
        }
        self.countdown_remaining = None;
        Some(self.begin().unwrap_or_else(RecordingEvent::Failed))
    }

    /// Host asked to record, regardless of auto-record
    pub fn record(&mut self) -> Result<RecordingEvent, RecorderError> {
        if self.is_recording {
            return Err(RecorderError::AlreadyRecording);
        }
        if let Some(remaining) = self.countdown_remaining {
            return Ok(RecordingEvent::CountdownStarted {
                seconds: remaining / 1000.0,
            });
        }
        self.arm()
    }

    /// Host asked to stop recording
    pub fn stop_recording(&mut self) -> Result<RecordingEvent, RecorderError> {
        if let Some(event) = self.cancel_countdown() {
            return Ok(event);
        }
        if !self.is_recording {
            return Err(RecorderError::NotRecording);
        }
        let capture = self.finish()?;
        Ok(RecordingEvent::Stopped { capture: Some(capture) })
    }

    fn arm(&mut self) -> Result<RecordingEvent, RecorderError> {
        let countdown = self.settings.countdown_ms();
        if countdown <= 0.0 {
            return self.begin();
        }
        tracing::info!("Recording starts in {}s", self.settings.countdown);
        self.countdown_remaining = Some(countdown);
        Ok(RecordingEvent::CountdownStarted {
            seconds: countdown / 1000.0,
        })
    }

    fn cancel_countdown(&mut self) -> Option<RecordingEvent> {
        self.countdown_remaining.take().map(|_| {
            tracing::info!("Recording countdown cancelled");
            RecordingEvent::CountdownCancelled
        })
    }

    fn begin(&mut self) -> Result<RecordingEvent, RecorderError> {
        match self.recorder.as_mut() {
            Some(recorder) => {
                if let Err(err) = recorder.start_capture(&self.settings) {
                    tracing::warn!("Recorder failed to start: {}", err);
                    return Err(err);
                }
            }
            None => tracing::info!("No recorder attached; tracking recording state only"),
        }

        let start_time = now_ms();
        self.is_recording = true;
        self.recording_start_time = Some(start_time);
        tracing::info!("Recording started");
        Ok(RecordingEvent::Started { start_time })
    }

    fn finish(&mut self) -> Result<CaptureResult, RecorderError> {
        let started = self.recording_start_time.take();
        self.is_recording = false;

        let result = match self.recorder.as_mut() {
            Some(recorder) => recorder.stop_capture(),
            None => Ok(CaptureResult {
                url: None,
                duration_ms: started.map_or(0.0, |start| now_ms().saturating_sub(start) as f64),
            }),
        };

        match result {
            Ok(capture) => {
                tracing::info!("Recording stopped after {:.0}ms", capture.duration_ms);
                self.last_capture = Some(capture.clone());
                Ok(capture)
            }
            Err(err) => {
                tracing::warn!("Recorder failed to stop: {}", err);
                Err(err)
            }
        }
    }
}

impl Default for RecordingCoordinator {
    fn default() -> Self {
        Self::new(RecordingSettings::default())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
