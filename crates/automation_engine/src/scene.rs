// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenes: ordered groups of actions sharing one clock.

use crate::action::{Action, ActionId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a scene
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

impl SceneId {
    /// Create a new random scene ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A scene of actions.
///
/// Actions keep their authoring order, which is not necessarily time order.
/// That order is the tie-break for actions that are active together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Unique scene ID
    pub id: SceneId,
    /// Scene name
    pub name: String,
    /// Actions in authoring order
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Stored duration in milliseconds
    #[serde(default)]
    pub duration: f64,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            actions: Vec::new(),
            duration: 0.0,
        }
    }

    /// Set the ID
    pub fn with_id(mut self, id: impl Into<SceneId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the stored duration
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Append an action
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Get the duration implied by the actions
    pub fn content_duration(&self) -> f64 {
        self.actions.iter().map(Action::end).fold(0.0, f64::max)
    }

    /// Get the duration used for playback.
    ///
    /// A stored duration shorter than the actions imply is extended to cover
    /// them.
    pub fn effective_duration(&self) -> f64 {
        let stored = if self.duration.is_nan() { 0.0 } else { self.duration.max(0.0) };
        stored.max(self.content_duration())
    }

    /// Whether the stored duration is shorter than the content
    pub fn is_duration_short(&self) -> bool {
        self.duration < self.content_duration()
    }

    /// Get an action by ID
    pub fn action(&self, id: &ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| &a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    #[test]
    fn test_effective_duration_covers_actions() {
        let scene = Scene::new("Intro")
            .with_duration(300.0)
            .with_action(Action::new(ActionKind::Wait).with_start(200.0).with_duration(400.0));
        assert!(scene.is_duration_short());
        assert_eq!(scene.effective_duration(), 600.0);
    }

    #[test]
    fn test_stored_duration_wins_when_longer() {
        let scene = Scene::new("Outro")
            .with_duration(2000.0)
            .with_action(Action::new(ActionKind::Wait).with_duration(100.0));
        assert!(!scene.is_duration_short());
        assert_eq!(scene.effective_duration(), 2000.0);
    }

    #[test]
    fn test_empty_scene() {
        let scene = Scene::new("Empty");
        assert_eq!(scene.content_duration(), 0.0);
        assert_eq!(scene.effective_duration(), 0.0);
    }
}
