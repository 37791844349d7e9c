// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline automation and playback engine.
//!
//! This crate plays scripted timelines against a host application:
//! - Scenes of timed actions (scroll, zoom, camera, item edits, animations)
//! - Easing curves for action progress
//! - Deterministic scheduling and seeking
//! - Speed control and looping
//! - Recording capture coordination
//!
//! ## Architecture
//!
//! The engine is built on:
//! - A pure scheduler mapping scene time to active actions
//! - A per-scene virtual clock driven by host ticks
//! - A handler registry the host fills with effect callbacks
//! - A player state machine tying them together

pub mod easing;
pub mod action;
pub mod scene;
pub mod timeline;
pub mod scheduler;
pub mod clock;
pub mod executor;
pub mod recording;
pub mod config;
pub mod player;

pub use easing::{ease, Easing};
pub use action::{
    Action, ActionId, ActionKind, ActionType,
    AnimationKeyframe, Position, PropertyMap, PropertyValue,
};
pub use scene::{Scene, SceneId};
pub use timeline::{Resolution, SceneLocation, Timeline, TimelineError, TimelineId};
pub use scheduler::{ActionPhase, ActionScheduler, ActiveAction, ScheduledAction};
pub use clock::SceneClock;
pub use executor::{
    interpolate_keyframes, ActionExecutor, ActionHandler, DispatchOutcome, HandlerContext, HandlerError,
};
pub use recording::{
    CaptureResult, Recorder, RecorderError, RecordingCoordinator, RecordingEvent,
    RecordingFormat, RecordingQuality, RecordingSettings,
};
pub use config::{ConfigError, PlayerConfig, CONFIG_FORMAT_VERSION};
pub use player::{
    AutomationState, DispatchRecord, PlaybackError, PlaybackEvent, PlaybackState,
    PlaybackStatus, StopReason, TickReport, TimelinePlayer,
};
