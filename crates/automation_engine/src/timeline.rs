// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline containing multiple scenes.

use crate::scene::{Scene, SceneId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a timeline
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineId(pub String);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimelineId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Output resolution for capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Where a timeline time falls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLocation {
    /// Index into `Timeline::scenes`
    pub index: usize,
    /// Global time at which the scene starts
    pub scene_start: f64,
    /// Time relative to the scene start
    pub local_time: f64,
}

/// An ordered list of scenes played back to back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    /// Unique timeline ID
    pub id: TimelineId,
    /// Timeline name
    pub name: String,
    /// Scenes in playback order
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Stored total duration; informational, playback re-derives it
    #[serde(default)]
    pub total_duration: f64,
    /// Capture frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Capture resolution
    #[serde(default)]
    pub resolution: Resolution,
}

fn default_fps() -> u32 {
    30
}

impl Timeline {
    /// Create an empty timeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            scenes: Vec::new(),
            total_duration: 0.0,
            fps: default_fps(),
            resolution: Resolution::default(),
        }
    }

    /// Set the ID
    pub fn with_id(mut self, id: impl Into<TimelineId>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a scene and refresh the stored total
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self.total_duration = self.effective_total_duration();
        self
    }

    /// Parse a timeline from JSON
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String, TimelineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sum of the effective scene durations
    pub fn effective_total_duration(&self) -> f64 {
        self.scenes.iter().map(Scene::effective_duration).sum()
    }

    /// Global start time of every scene
    pub fn scene_starts(&self) -> Vec<f64> {
        let mut start = 0.0;
        self.scenes
            .iter()
            .map(|scene| {
                let this = start;
                start += scene.effective_duration();
                this
            })
            .collect()
    }

    /// Get a scene by ID
    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    /// Locate the scene containing a global time.
    ///
    /// Scenes own `[start, end)`; the timeline end belongs to the last scene
    /// with a non-zero duration. Times outside the timeline are clamped.
    pub fn locate(&self, time: f64) -> Option<SceneLocation> {
        let total = self.effective_total_duration();
        let time = time.clamp(0.0, total);
        let mut start = 0.0;
        let mut last = None;

        for (index, scene) in self.scenes.iter().enumerate() {
            let duration = scene.effective_duration();
            let end = start + duration;
            if time >= start && time < end {
                return Some(SceneLocation {
                    index,
                    scene_start: start,
                    local_time: time - start,
                });
            }
            if duration > 0.0 || last.is_none() {
                last = Some(SceneLocation {
                    index,
                    scene_start: start,
                    local_time: (time - start).clamp(0.0, duration),
                });
            }
            start = end;
        }

        last
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new("Untitled Timeline")
    }
}

/// Error reading or writing a timeline document
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Malformed or mismatched JSON
    #[error("Timeline JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionKind};

    fn three_scenes() -> Timeline {
        Timeline::new("Demo")
            .with_scene(Scene::new("A").with_id("a").with_duration(1000.0))
            .with_scene(Scene::new("B").with_id("b").with_duration(500.0))
            .with_scene(Scene::new("C").with_id("c").with_duration(250.0))
    }

    #[test]
    fn test_total_duration_is_rederived() {
        let mut timeline = three_scenes();
        timeline.total_duration = 42.0;
        assert_eq!(timeline.effective_total_duration(), 1750.0);
        assert_eq!(timeline.scene_starts(), vec![0.0, 1000.0, 1500.0]);
    }

    #[test]
    fn test_total_duration_includes_short_scenes() {
        let timeline = Timeline::new("Short").with_scene(
            Scene::new("A")
                .with_duration(100.0)
                .with_action(Action::new(ActionKind::Wait).with_duration(900.0)),
        );
        assert_eq!(timeline.effective_total_duration(), 900.0);
    }

    #[test]
    fn test_locate() {
        let timeline = three_scenes();

        let loc = timeline.locate(0.0).unwrap();
        assert_eq!(loc.index, 0);

        let loc = timeline.locate(1000.0).unwrap();
        assert_eq!(loc.index, 1);
        assert_eq!(loc.local_time, 0.0);

        let loc = timeline.locate(1600.0).unwrap();
        assert_eq!(loc.index, 2);
        assert_eq!(loc.scene_start, 1500.0);
        assert_eq!(loc.local_time, 100.0);

        let end = timeline.locate(1750.0).unwrap();
        assert_eq!(end.index, 2);
        assert_eq!(end.local_time, 250.0);

        let clamped = timeline.locate(-50.0).unwrap();
        assert_eq!(clamped.index, 0);
        assert_eq!(clamped.local_time, 0.0);
    }

    #[test]
    fn test_locate_empty_timeline() {
        assert!(Timeline::new("Nothing").locate(0.0).is_none());
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "id": "tl-1",
            "name": "Product tour",
            "scenes": [{
                "id": "scene-1",
                "name": "Intro",
                "duration": 1000,
                "actions": [
                    { "id": "a1", "type": "scroll", "startTime": 0, "duration": 500,
                      "easing": "linear", "targetPosition": { "x": 100, "y": 0 } },
                    { "id": "a2", "type": "wait", "startTime": 500, "duration": 500 }
                ]
            }],
            "totalDuration": 1000,
            "fps": 60,
            "resolution": { "width": 1280, "height": 720 }
        }"#;
        let timeline = Timeline::from_json(json).unwrap();
        assert_eq!(timeline.fps, 60);
        assert_eq!(timeline.scenes[0].actions.len(), 2);
        assert_eq!(timeline.effective_total_duration(), 1000.0);

        let reparsed = Timeline::from_json(&timeline.to_json_pretty().unwrap()).unwrap();
        assert_eq!(reparsed, timeline);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        let err = Timeline::from_json(r#"{ "id": "x" }"#).unwrap_err();
        assert!(err.to_string().starts_with("Timeline JSON error"));
    }

    #[test]
    fn test_demo_walkthrough_parses() {
        let timeline = Timeline::from_json(include_str!("../../../demos/walkthrough.json")).unwrap();
        assert_eq!(timeline.scenes.len(), 2);
        assert_eq!(timeline.effective_total_duration(), 7000.0);
        assert_eq!(
            timeline.scenes[0].actions[1].easing,
            crate::easing::Easing::EaseInOutCubic
        );
    }
}
