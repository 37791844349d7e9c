// SPDX-License-Identifier: MIT OR Apache-2.0
//! Logging stand-ins for the host's canvas and screen recorder.

use automation_engine::{
    Action, ActionKind, ActionType, CaptureResult, HandlerContext, HandlerError, PlaybackEvent,
    Recorder, RecorderError, RecordingSettings, TimelinePlayer,
};
use std::time::Instant;

/// Register a handler for every action type that logs what a canvas would do
pub fn register_logging_handlers(player: &mut TimelinePlayer) {
    for action_type in ActionType::ALL {
        if action_type == ActionType::Wait {
            continue;
        }
        player.register_handler(action_type, log_action);
    }
}

fn log_action(action: &Action, progress: f64, ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    let label = action.label.as_deref().unwrap_or(action.id.as_str());

    if !ctx.terminal {
        tracing::debug!(
            "[{:>8.1}ms] {} '{}' at {:.3}",
            ctx.timeline_time,
            action.action_type(),
            label,
            progress
        );
        return Ok(());
    }

    match &action.kind {
        ActionKind::Navigate {
            target_position,
            target_zoom,
        } => {
            tracing::info!(
                "[{:>8.1}ms] navigate to ({}, {}) zoom {:?}",
                ctx.timeline_time,
                target_position.x,
                target_position.y,
                target_zoom
            );
        }
        ActionKind::Animation { item_id, .. } => {
            let properties = ctx
                .properties
                .map(|p| format!("{p:?}"))
                .unwrap_or_default();
            tracing::info!(
                "[{:>8.1}ms] animation of '{}' finished {}",
                ctx.timeline_time,
                item_id,
                properties
            );
        }
        _ => match action.target_item() {
            Some(item) => tracing::info!(
                "[{:>8.1}ms] {} '{}' on '{}' done",
                ctx.timeline_time,
                action.action_type(),
                label,
                item
            ),
            None => tracing::info!(
                "[{:>8.1}ms] {} '{}' done",
                ctx.timeline_time,
                action.action_type(),
                label
            ),
        },
    }
    Ok(())
}

/// Log a playback event
pub fn log_event(event: &PlaybackEvent) {
    match event {
        PlaybackEvent::SceneEntered { scene_id } => tracing::info!("Scene {}", scene_id),
        PlaybackEvent::Looped => tracing::info!("Looped"),
        PlaybackEvent::Recording(event) => tracing::info!("Recording: {:?}", event),
        other => tracing::debug!("{:?}", other),
    }
}

/// Recorder that only logs and measures the capture
#[derive(Debug, Default)]
pub struct LogRecorder {
    started: Option<Instant>,
}

impl Recorder for LogRecorder {
    fn start_capture(&mut self, settings: &RecordingSettings) -> Result<(), RecorderError> {
        if self.started.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }
        tracing::info!(
            "Capture started ({:?}, {:?}, audio: {})",
            settings.format,
            settings.quality,
            settings.record_audio
        );
        self.started = Some(Instant::now());
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<CaptureResult, RecorderError> {
        let started = self.started.take().ok_or(RecorderError::NotRecording)?;
        Ok(CaptureResult {
            url: None,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}
