// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback.
//!
//! [`TimelinePlayer`] owns the playback state machine
//! (`Stopped` / `Playing` / `Paused`), advances the active scene's clock on
//! every host tick, moves between scenes and routes due actions to the
//! executor. It never mutates the timeline it plays.
//!
//! The player is single-threaded and driven entirely by [`TimelinePlayer::tick`];
//! there is no internal timer.

use crate::action::{Action, ActionId, ActionType};
use crate::clock::SceneClock;
use crate::config::PlayerConfig;
use crate::executor::{ActionExecutor, DispatchOutcome, HandlerContext, HandlerError};
use crate::recording::{Recorder, RecorderError, RecordingCoordinator, RecordingEvent, RecordingSettings};
use crate::scene::{Scene, SceneId};
use crate::scheduler::ActionScheduler;
use crate::timeline::{SceneLocation, Timeline};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Stopped
    #[default]
    Stopped,
    /// Playing forward
    Playing,
    /// Paused
    Paused,
}

impl PlaybackStatus {
    /// Get a status string for display
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }
}

/// Snapshot of the playback state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Playing (not paused, not stopped)
    pub is_playing: bool,
    /// Paused
    pub is_paused: bool,
    /// Global time in milliseconds
    pub current_time: f64,
    /// Scene containing the current time
    pub current_scene_id: Option<SceneId>,
    /// Last dispatched action, for highlighting
    pub current_action_id: Option<ActionId>,
    /// Whether playback wraps at the end
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Speed multiplier
    pub speed: f64,
}

impl PlaybackState {
    /// Status encoded by the two flags
    pub fn status(&self) -> PlaybackStatus {
        match (self.is_playing, self.is_paused) {
            (true, _) => PlaybackStatus::Playing,
            (false, true) => PlaybackStatus::Paused,
            (false, false) => PlaybackStatus::Stopped,
        }
    }
}

/// Snapshot of everything the player tracks
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationState {
    /// Loaded timeline
    pub timeline: Option<Arc<Timeline>>,
    /// Playback state
    pub playback_state: PlaybackState,
    /// Recording configuration
    pub recording_settings: RecordingSettings,
    /// Whether capture is running
    pub is_recording: bool,
    /// Wall-clock capture start, milliseconds since the Unix epoch
    pub recording_start_time: Option<u64>,
    /// Actions whose end state has been applied this pass, in firing order
    pub executed_actions: IndexSet<ActionId>,
}

/// Why playback stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called
    Requested,
    /// The end of a non-looping timeline was reached
    EndOfTimeline,
}

/// Something that happened during playback
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// Playback started
    Played {
        /// Whether playback resumed from pause
        resumed: bool,
    },
    /// Playback paused
    Paused,
    /// Playback stopped
    Stopped {
        /// Why
        reason: StopReason,
    },
    /// Time jumped
    Seeked {
        /// Time before the seek
        from: f64,
        /// Time after clamping
        to: f64,
    },
    /// A scene became current
    SceneEntered {
        /// The scene
        scene_id: SceneId,
    },
    /// Playback wrapped to the start
    Looped,
    /// Speed changed
    SpeedChanged {
        /// New multiplier
        speed: f64,
    },
    /// Recording state changed
    Recording(RecordingEvent),
}

/// One action dispatch during a tick or seek
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRecord {
    /// The action
    pub action_id: ActionId,
    /// Action type
    pub action_type: ActionType,
    /// Scene of the action
    pub scene_id: SceneId,
    /// Progress before easing
    pub linear_progress: f64,
    /// Progress after easing
    pub eased_progress: f64,
    /// Whether the end state was delivered
    pub terminal: bool,
    /// Handler result
    pub outcome: DispatchOutcome,
}

/// What one tick or seek did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Virtual time advanced, in milliseconds
    pub advanced_ms: f64,
    /// Dispatches in order
    pub dispatched: Vec<DispatchRecord>,
    /// A scene boundary was crossed
    pub scene_changed: bool,
    /// Playback wrapped to the start
    pub looped: bool,
    /// Playback reached the end and stopped
    pub finished: bool,
}

impl TickReport {
    /// The dispatch of an action, if any
    pub fn dispatch_of(&self, action_id: &str) -> Option<&DispatchRecord> {
        self.dispatched.iter().rev().find(|d| d.action_id.as_str() == action_id)
    }
}

/// Error from a playback call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    /// No timeline is loaded
    #[error("No timeline loaded")]
    NoTimeline,

    /// Speed must be positive and finite
    #[error("Invalid playback speed: {0}")]
    InvalidSpeed(f64),
}

/// Plays a timeline against host handlers
pub struct TimelinePlayer {
    /// Loaded timeline
    timeline: Option<Arc<Timeline>>,
    /// Playback status
    status: PlaybackStatus,
    /// Global time in milliseconds
    current_time: f64,
    /// Index of the current scene
    scene_index: Option<usize>,
    /// Last dispatched action
    current_action_id: Option<ActionId>,
    /// Wrap at the end
    looping: bool,
    /// Clock of the current scene
    clock: SceneClock,
    /// Handler registry
    executor: ActionExecutor,
    /// Capture coordination
    recording: RecordingCoordinator,
    /// End states applied this pass
    executed: IndexSet<ActionId>,
    /// A seek while stopped set the next start position
    start_offset_pending: bool,
    /// Events not yet drained by the host
    events: Vec<PlaybackEvent>,
}

impl TimelinePlayer {
    /// Create a player with no timeline
    pub fn new() -> Self {
        Self {
            timeline: None,
            status: PlaybackStatus::Stopped,
            current_time: 0.0,
            scene_index: None,
            current_action_id: None,
            looping: false,
            clock: SceneClock::new(1.0),
            executor: ActionExecutor::new(),
            recording: RecordingCoordinator::default(),
            executed: IndexSet::new(),
            start_offset_pending: false,
            events: Vec::new(),
        }
    }

    /// Create a player from a configuration
    pub fn with_config(config: &PlayerConfig) -> Self {
        let mut player = Self::new();
        if player.set_speed(config.speed).is_err() {
            tracing::warn!("Ignoring invalid configured speed {}", config.speed);
        }
        player.looping = config.loop_playback;
        player.recording.set_settings(config.recording.clone());
        player.events.clear();
        player
    }

    /// Load a timeline, stopping any current playback
    pub fn load_timeline(&mut self, timeline: impl Into<Arc<Timeline>>) {
        self.stop();
        let timeline = timeline.into();

        for scene in &timeline.scenes {
            if scene.is_duration_short() {
                tracing::warn!(
                    "Scene '{}' declares {}ms but its actions run to {}ms; using the longer duration",
                    scene.id,
                    scene.duration,
                    scene.content_duration()
                );
            }
        }

        tracing::info!(
            "Loaded timeline '{}' ({} scenes, {}ms)",
            timeline.name,
            timeline.scenes.len(),
            timeline.effective_total_duration()
        );
        self.executor.clear_cache();
        self.timeline = Some(timeline);
    }

    /// Unload the timeline, stopping playback
    pub fn unload_timeline(&mut self) -> Option<Arc<Timeline>> {
        self.stop();
        self.executor.clear_cache();
        self.timeline.take()
    }

    /// The loaded timeline
    pub fn timeline(&self) -> Option<&Arc<Timeline>> {
        self.timeline.as_ref()
    }

    /// Handler registry
    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Mutable handler registry
    pub fn executor_mut(&mut self) -> &mut ActionExecutor {
        &mut self.executor
    }

    /// Register a handler for an action type
    pub fn register_handler<F>(&mut self, action_type: ActionType, handler: F)
    where
        F: FnMut(&Action, f64, &HandlerContext<'_>) -> Result<(), HandlerError> + 'static,
    {
        self.executor.register_handler(action_type, handler);
    }

    /// Recording coordinator
    pub fn recording(&self) -> &RecordingCoordinator {
        &self.recording
    }

    /// Attach the host recorder
    pub fn set_recorder(&mut self, recorder: Box<dyn Recorder>) {
        self.recording.set_recorder(recorder);
    }

    /// Replace the recording settings
    pub fn set_recording_settings(&mut self, settings: RecordingSettings) {
        self.recording.set_settings(settings);
    }

    /// Start recording (after the configured countdown)
    pub fn record(&mut self) -> Result<(), RecorderError> {
        let event = self.recording.record()?;
        self.events.push(PlaybackEvent::Recording(event));
        Ok(())
    }

    /// Stop recording, or cancel a pending countdown
    pub fn stop_recording(&mut self) -> Result<(), RecorderError> {
        let event = self.recording.stop_recording()?;
        self.events.push(PlaybackEvent::Recording(event));
        Ok(())
    }

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Whether playing
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    /// Total duration of the loaded timeline
    pub fn total_duration(&self) -> f64 {
        self.timeline.as_ref().map_or(0.0, |t| t.effective_total_duration())
    }

    /// The current scene
    pub fn current_scene(&self) -> Option<&Scene> {
        let index = self.scene_index?;
        self.timeline.as_ref()?.scenes.get(index)
    }

    /// Actions whose end state was applied this pass, in firing order
    pub fn executed_actions(&self) -> &IndexSet<ActionId> {
        &self.executed
    }

    /// Snapshot of the playback state
    pub fn get_state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.status == PlaybackStatus::Playing,
            is_paused: self.status == PlaybackStatus::Paused,
            current_time: self.current_time,
            current_scene_id: self.current_scene().map(|s| s.id.clone()),
            current_action_id: self.current_action_id.clone(),
            looping: self.looping,
            speed: self.clock.speed(),
        }
    }

    /// Snapshot of everything the player tracks
    pub fn automation_state(&self) -> AutomationState {
        AutomationState {
            timeline: self.timeline.clone(),
            playback_state: self.get_state(),
            recording_settings: self.recording.settings().clone(),
            is_recording: self.recording.is_recording(),
            recording_start_time: self.recording.recording_start_time(),
            executed_actions: self.executed.clone(),
        }
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.events)
    }

    /// Play from the current position, or from the start when stopped
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        let timeline = self.loaded()?;

        let resumed = match self.status {
            PlaybackStatus::Playing => return Ok(()),
            PlaybackStatus::Paused => true,
            PlaybackStatus::Stopped => {
                if !self.start_offset_pending {
                    self.current_time = 0.0;
                    self.current_action_id = None;
                    self.executed.clear();
                    self.enter_scene(&timeline, 0);
                }
                self.start_offset_pending = false;
                false
            }
        };

        self.status = PlaybackStatus::Playing;
        self.clock.resume();
        tracing::info!(
            "{} playback at {}ms",
            if resumed { "Resumed" } else { "Started" },
            self.current_time
        );
        self.events.push(PlaybackEvent::Played { resumed });
        if let Some(event) = self.recording.on_play() {
            self.events.push(PlaybackEvent::Recording(event));
        }
        Ok(())
    }

    /// Pause playback, keeping all action state
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        self.loaded()?;
        if self.status != PlaybackStatus::Playing {
            return Ok(());
        }

        self.status = PlaybackStatus::Paused;
        self.clock.pause();
        tracing::info!("Paused playback at {}ms", self.current_time);
        self.events.push(PlaybackEvent::Paused);
        if let Some(event) = self.recording.on_pause() {
            self.events.push(PlaybackEvent::Recording(event));
        }
        Ok(())
    }

    /// Toggle play/pause
    pub fn toggle_playback(&mut self) -> Result<(), PlaybackError> {
        match self.status {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused | PlaybackStatus::Stopped => self.play(),
        }
    }

    /// Stop and reset to the beginning.
    ///
    /// Always succeeds, with or without a timeline.
    pub fn stop(&mut self) {
        let was_active = self.status != PlaybackStatus::Stopped;

        self.status = PlaybackStatus::Stopped;
        self.current_time = 0.0;
        self.scene_index = None;
        self.current_action_id = None;
        self.executed.clear();
        self.start_offset_pending = false;
        self.clock.reset();

        if was_active {
            tracing::info!("Stopped playback");
            self.events.push(PlaybackEvent::Stopped {
                reason: StopReason::Requested,
            });
        }
        if let Some(event) = self.recording.on_stop() {
            self.events.push(PlaybackEvent::Recording(event));
        }
    }

    /// Jump to a global time, clamped to the timeline.
    ///
    /// Moving forward applies the end state of every action passed over and
    /// evaluates in-flight actions at the target. Moving backward forgets the
    /// actions that had not completed before the target and re-evaluates the
    /// target instant.
    pub fn seek(&mut self, time_ms: f64) -> Result<TickReport, PlaybackError> {
        let timeline = self.loaded()?;
        let total = timeline.effective_total_duration();
        let target = if time_ms.is_nan() { 0.0 } else { time_ms.clamp(0.0, total) };
        let from = self.current_time;
        let mut report = TickReport::default();

        if self.scene_index.is_none() {
            self.enter_scene(&timeline, 0);
        }

        if target < from {
            let location = target_location(&timeline, target, total);
            // Earlier scenes are never re-evaluated, so their actions ending
            // on the boundary stay applied
            let target_scene = location.map_or(0, |l| l.index);
            let ends = global_action_ends(&timeline);
            self.executed.retain(|id| {
                ends.get(id).is_some_and(|&(scene, end)| {
                    end < target || (scene < target_scene && end <= target)
                })
            });

            self.current_time = target;
            if let Some(location) = location {
                if self.scene_index != Some(location.index) {
                    report.scene_changed = true;
                }
                self.enter_scene(&timeline, location.index);
                let scene = &timeline.scenes[location.index];
                self.dispatch_span(scene, location.scene_start, None, location.local_time, &mut report);
                self.clock.mark_evaluated(location.local_time);
            }
        } else {
            self.sweep(&timeline, target, &mut report);
        }

        self.current_time = target;
        report.advanced_ms = target - from;
        if self.status == PlaybackStatus::Stopped {
            self.start_offset_pending = true;
        }

        tracing::debug!("Seeked from {}ms to {}ms", from, target);
        self.events.push(PlaybackEvent::Seeked { from, to: target });
        Ok(report)
    }

    /// Set the speed multiplier; applies from the next tick
    pub fn set_speed(&mut self, speed: f64) -> Result<(), PlaybackError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlaybackError::InvalidSpeed(speed));
        }
        self.clock.set_speed(speed);
        self.events.push(PlaybackEvent::SpeedChanged { speed });
        Ok(())
    }

    /// Whether playback wraps at the end
    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Advance playback by a wall-clock delta in milliseconds
    pub fn tick(&mut self, wall_delta_ms: f64) -> Result<TickReport, PlaybackError> {
        let timeline = self.loaded()?;
        let mut report = TickReport::default();

        if let Some(event) = self.recording.advance(wall_delta_ms) {
            self.events.push(PlaybackEvent::Recording(event));
        }

        if self.status != PlaybackStatus::Playing {
            return Ok(report);
        }

        let delta = self.clock.scaled_delta(wall_delta_ms);
        let total = timeline.effective_total_duration();
        let target = self.current_time + delta;
        report.advanced_ms = delta;

        if target < total {
            self.sweep(&timeline, target, &mut report);
            return Ok(report);
        }

        self.sweep(&timeline, total, &mut report);

        if self.looping && total > 0.0 {
            let wrapped = (target - total) % total;
            tracing::debug!("Looping playback to {}ms", wrapped);
            self.executed.clear();
            self.current_time = 0.0;
            self.enter_scene(&timeline, 0);
            self.events.push(PlaybackEvent::Looped);
            report.looped = true;
            self.sweep(&timeline, wrapped, &mut report);
        } else {
            self.finish(total);
            report.finished = true;
        }

        Ok(report)
    }

    fn loaded(&self) -> Result<Arc<Timeline>, PlaybackError> {
        match &self.timeline {
            Some(timeline) => Ok(Arc::clone(timeline)),
            None => {
                tracing::warn!("Playback call ignored: no timeline loaded");
                Err(PlaybackError::NoTimeline)
            }
        }
    }

    /// Natural end of a non-looping timeline
    fn finish(&mut self, total: f64) {
        self.status = PlaybackStatus::Stopped;
        self.current_time = total;
        self.clock.pause();
        tracing::info!("Playback reached the end at {}ms", total);
        self.events.push(PlaybackEvent::Stopped {
            reason: StopReason::EndOfTimeline,
        });
        if let Some(event) = self.recording.on_stop() {
            self.events.push(PlaybackEvent::Recording(event));
        }
    }

    fn enter_scene(&mut self, timeline: &Timeline, index: usize) {
        self.clock.forget_evaluation();
        let Some(scene) = timeline.scenes.get(index) else {
            self.scene_index = None;
            return;
        };
        if self.scene_index != Some(index) {
            tracing::debug!("Entering scene '{}'", scene.name);
        }
        self.scene_index = Some(index);
        self.events.push(PlaybackEvent::SceneEntered {
            scene_id: scene.id.clone(),
        });
    }

    /// Move forward to global time `target`, finishing every scene passed.
    fn sweep(&mut self, timeline: &Timeline, target: f64, report: &mut TickReport) {
        let total = timeline.effective_total_duration();
        let Some(location) = target_location(timeline, target, total) else {
            self.current_time = target;
            return;
        };
        let starts = timeline.scene_starts();
        let mut index = self.scene_index.unwrap_or(0);

        while index < location.index {
            let scene = &timeline.scenes[index];
            // Outgoing scene: everything still open ends at progress 1
            self.dispatch_span(
                scene,
                starts[index],
                self.clock.last_evaluated(),
                scene.effective_duration(),
                report,
            );
            index += 1;
            self.enter_scene(timeline, index);
            report.scene_changed = true;
        }

        let scene = &timeline.scenes[location.index];
        self.dispatch_span(
            scene,
            location.scene_start,
            self.clock.last_evaluated(),
            location.local_time,
            report,
        );
        self.clock.mark_evaluated(location.local_time);
        self.current_time = target;
    }

    fn dispatch_span(
        &mut self,
        scene: &Scene,
        scene_start: f64,
        previous: Option<f64>,
        now: f64,
        report: &mut TickReport,
    ) {
        for due in ActionScheduler::advance(scene, previous, now) {
            let action = due.action;
            if due.terminal && self.executed.contains(&action.id) {
                continue;
            }

            let ctx = HandlerContext {
                scene_id: &scene.id,
                scene_time: now,
                timeline_time: scene_start + now,
                linear_progress: due.linear_progress,
                terminal: due.terminal,
                properties: None,
            };
            let outcome = self.executor.execute(action, due.eased_progress, ctx);
            tracing::trace!(
                "Dispatched {} ({}) at {:.3} -> {:?}",
                action.id,
                action.action_type(),
                due.eased_progress,
                outcome
            );

            if due.terminal {
                self.executed.insert(action.id.clone());
            }
            self.current_action_id = Some(action.id.clone());
            report.dispatched.push(DispatchRecord {
                action_id: action.id.clone(),
                action_type: action.action_type(),
                scene_id: scene.id.clone(),
                linear_progress: due.linear_progress,
                eased_progress: due.eased_progress,
                terminal: due.terminal,
                outcome,
            });
        }
    }
}

impl Default for TimelinePlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scene location used for playback; the timeline end maps to the end of
/// the last scene so trailing empty scenes are still visited.
fn target_location(timeline: &Timeline, time: f64, total: f64) -> Option<SceneLocation> {
    if time >= total {
        let index = timeline.scenes.len().checked_sub(1)?;
        let last = &timeline.scenes[index];
        let duration = last.effective_duration();
        return Some(SceneLocation {
            index,
            scene_start: total - duration,
            local_time: duration,
        });
    }
    timeline.locate(time)
}

/// Scene index and global end time of every action
fn global_action_ends(timeline: &Timeline) -> HashMap<ActionId, (usize, f64)> {
    timeline
        .scenes
        .iter()
        .zip(timeline.scene_starts())
        .enumerate()
        .flat_map(|(index, (scene, start))| {
            scene
                .actions
                .iter()
                .map(move |action| (action.id.clone(), (index, start + action.end())))
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::action::ActionKind;
    use proptest::prelude::*;

    fn player_with_total(total: f64) -> TimelinePlayer {
        let mut player = TimelinePlayer::new();
        player.load_timeline(Timeline::new("P").with_scene(
            Scene::new("S")
                .with_duration(total)
                .with_action(Action::new(ActionKind::Wait).with_duration(total / 2.0)),
        ));
        player
    }

    proptest! {
        /// Property: seek always lands on the clamped time
        #[test]
        fn prop_seek_clamps(targets in prop::collection::vec(-5000.0f64..5000.0, 1..20)) {
            let mut player = player_with_total(3000.0);
            for target in targets {
                player.seek(target).unwrap();
                prop_assert_eq!(player.get_state().current_time, target.clamp(0.0, 3000.0));
            }
        }

        /// Property: looping playback never leaves [0, total)
        #[test]
        fn prop_loop_stays_in_range(
            start in 0.0f64..1000.0,
            deltas in prop::collection::vec(0.0f64..2500.0, 1..30),
            speed in 0.25f64..4.0,
        ) {
            let mut player = player_with_total(1000.0);
            player.set_loop(true);
            player.set_speed(speed).unwrap();
            player.seek(start).unwrap();
            player.play().unwrap();
            for delta in deltas {
                player.tick(delta).unwrap();
                let time = player.get_state().current_time;
                prop_assert!((0.0..1000.0).contains(&time));
                prop_assert!(player.is_playing());
            }
        }

        /// Property: without looping, time never decreases while playing
        #[test]
        fn prop_time_monotonic(deltas in prop::collection::vec(0.0f64..300.0, 1..30)) {
            let mut player = player_with_total(2000.0);
            player.play().unwrap();
            let mut last = 0.0;
            for delta in deltas {
                player.tick(delta).unwrap();
                let time = player.get_state().current_time;
                prop_assert!(time >= last);
                prop_assert!(time <= 2000.0);
                last = time;
            }
        }
    }
}
