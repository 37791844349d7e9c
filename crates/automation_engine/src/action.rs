// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action definitions for scenes.
//!
//! An [`Action`] is one timed step inside a scene: a scroll, a zoom, a style
//! change, an item lifecycle event, a keyframed animation or a plain wait.
//! The `type` discriminator of the serialized form is the dispatch key the
//! executor uses to find a handler.

use crate::easing::Easing;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    /// Create a new random action ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// 2D position on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Create a position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`
    pub fn lerp(self, other: Position, t: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Value of a style or animated property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Numeric value, interpolated by animations
    Number(f64),
    /// Boolean flag
    Bool(bool),
    /// Any other value (colors, font names, CSS strings)
    Text(String),
}

impl PropertyValue {
    /// Get as number if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpolate towards `other`.
    ///
    /// Numbers are blended linearly. Anything else holds `self` until the
    /// end of the segment.
    pub fn interpolate(&self, other: &PropertyValue, t: f64) -> PropertyValue {
        match (self, other) {
            (PropertyValue::Number(a), PropertyValue::Number(b)) => {
                PropertyValue::Number(a + (b - a) * t)
            }
            _ if t >= 1.0 => other.clone(),
            _ => self.clone(),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_owned())
    }
}

/// Named property values, in authoring order
pub type PropertyMap = IndexMap<String, PropertyValue>;

/// A keyframe of a custom animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationKeyframe {
    /// Normalized time within the action, in `[0, 1]`
    pub time: f64,
    /// Property values at this keyframe
    pub properties: PropertyMap,
}

impl AnimationKeyframe {
    /// Create a keyframe at normalized `time`
    pub fn new(time: f64) -> Self {
        Self {
            time,
            properties: PropertyMap::new(),
        }
    }

    /// Add a property value
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Handler registry key for an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionType {
    /// Viewport scroll
    Scroll,
    /// Viewport zoom
    Zoom,
    /// Combined pan/zoom navigation
    Navigate,
    /// Camera move
    Camera,
    /// Style change on an item
    StyleChange,
    /// Item creation
    ItemCreate,
    /// Item property update
    ItemUpdate,
    /// Item deletion
    ItemDelete,
    /// Item highlight
    Highlight,
    /// Keyframed property animation
    Animation,
    /// Idle time
    Wait,
}

impl ActionType {
    /// All action types
    pub const ALL: [ActionType; 11] = [
        ActionType::Scroll,
        ActionType::Zoom,
        ActionType::Navigate,
        ActionType::Camera,
        ActionType::StyleChange,
        ActionType::ItemCreate,
        ActionType::ItemUpdate,
        ActionType::ItemDelete,
        ActionType::Highlight,
        ActionType::Animation,
        ActionType::Wait,
    ];

    /// Get the serialized name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Zoom => "zoom",
            Self::Navigate => "navigate",
            Self::Camera => "camera",
            Self::StyleChange => "style-change",
            Self::ItemCreate => "item-create",
            Self::ItemUpdate => "item-update",
            Self::ItemDelete => "item-delete",
            Self::Highlight => "highlight",
            Self::Animation => "animation",
            Self::Wait => "wait",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-specific payload of an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ActionKind {
    /// Scroll the viewport to a position
    Scroll {
        /// Final scroll position
        target_position: Position,
    },
    /// Zoom the viewport
    Zoom {
        /// Final zoom factor
        target_zoom: f64,
        /// Zoom anchor
        #[serde(default, skip_serializing_if = "Option::is_none")]
        center: Option<Position>,
    },
    /// Move and optionally zoom the viewport
    Navigate {
        /// Final viewport position
        target_position: Position,
        /// Final zoom factor
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_zoom: Option<f64>,
    },
    /// Move the camera
    Camera {
        /// Final camera position
        target_position: Position,
        /// Final zoom factor
        target_zoom: f64,
        /// Final rotation in degrees
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rotation: Option<f64>,
    },
    /// Change style properties of an item
    StyleChange {
        /// Target item
        item_id: String,
        /// Style values to apply
        style_changes: PropertyMap,
    },
    /// Create an item
    ItemCreate {
        /// New item ID
        item_id: String,
        /// Host-defined item kind
        item_type: String,
        /// Placement
        position: Position,
        /// Initial properties
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        properties: PropertyMap,
    },
    /// Update item properties
    ItemUpdate {
        /// Target item
        item_id: String,
        /// Properties to apply
        properties: PropertyMap,
    },
    /// Delete an item
    ItemDelete {
        /// Target item
        item_id: String,
    },
    /// Highlight an item
    Highlight {
        /// Target item
        item_id: String,
        /// Highlight color
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    /// Keyframed animation of item properties
    Animation {
        /// Target item
        item_id: String,
        /// Keyframes with normalized times
        keyframes: Vec<AnimationKeyframe>,
    },
    /// Do nothing for the duration
    Wait,
}

impl ActionKind {
    /// Get the action type of this payload
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Scroll { .. } => ActionType::Scroll,
            Self::Zoom { .. } => ActionType::Zoom,
            Self::Navigate { .. } => ActionType::Navigate,
            Self::Camera { .. } => ActionType::Camera,
            Self::StyleChange { .. } => ActionType::StyleChange,
            Self::ItemCreate { .. } => ActionType::ItemCreate,
            Self::ItemUpdate { .. } => ActionType::ItemUpdate,
            Self::ItemDelete { .. } => ActionType::ItemDelete,
            Self::Highlight { .. } => ActionType::Highlight,
            Self::Animation { .. } => ActionType::Animation,
            Self::Wait => ActionType::Wait,
        }
    }
}

/// A timed action in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Unique action ID
    pub id: ActionId,
    /// Type-specific payload
    #[serde(flatten)]
    pub kind: ActionKind,
    /// Start offset from the scene start, in milliseconds
    pub start_time: f64,
    /// Duration in milliseconds (0 = instantaneous)
    #[serde(default)]
    pub duration: f64,
    /// Easing curve applied to progress
    #[serde(default)]
    pub easing: Easing,
    /// Display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Action {
    /// Create an instantaneous action at time 0
    pub fn new(kind: ActionKind) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            start_time: 0.0,
            duration: 0.0,
            easing: Easing::Linear,
            label: None,
        }
    }

    /// Set the ID
    pub fn with_id(mut self, id: impl Into<ActionId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the start time
    pub fn with_start(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the easing curve
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the action type
    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    /// Start time, with negative or NaN values read as 0
    pub fn start(&self) -> f64 {
        sanitize(self.start_time)
    }

    /// Duration, with negative or NaN values read as 0
    pub fn span(&self) -> f64 {
        sanitize(self.duration)
    }

    /// End of the active window
    pub fn end(&self) -> f64 {
        self.start() + self.span()
    }

    /// Whether the action fires in a single instant
    pub fn is_instantaneous(&self) -> bool {
        self.span() == 0.0
    }

    /// The item this action targets, if any
    pub fn target_item(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::StyleChange { item_id, .. }
            | ActionKind::ItemCreate { item_id, .. }
            | ActionKind::ItemUpdate { item_id, .. }
            | ActionKind::ItemDelete { item_id }
            | ActionKind::Highlight { item_id, .. }
            | ActionKind::Animation { item_id, .. } => Some(item_id),
            _ => None,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tagged_action() {
        let json = r#"{
            "id": "scroll-1",
            "type": "scroll",
            "startTime": 0,
            "duration": 500,
            "easing": "linear",
            "targetPosition": { "x": 100, "y": 0 }
        }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action.id, ActionId::from("scroll-1"));
        assert_eq!(action.action_type(), ActionType::Scroll);
        assert_eq!(action.end(), 500.0);
        assert_eq!(
            action.kind,
            ActionKind::Scroll {
                target_position: Position::new(100.0, 0.0)
            }
        );
    }

    #[test]
    fn test_missing_duration_and_easing_default() {
        let json = r#"{ "id": "w", "type": "item-delete", "startTime": 20, "itemId": "box" }"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert!(action.is_instantaneous());
        assert_eq!(action.easing, Easing::Linear);
        assert_eq!(action.target_item(), Some("box"));
    }

    #[test]
    fn test_style_changes_keep_mixed_values() {
        let json = r##"{
            "id": "s",
            "type": "style-change",
            "startTime": 0,
            "duration": 0,
            "itemId": "card",
            "styleChanges": { "opacity": 0.5, "visible": true, "color": "#ff0000" }
        }"##;
        let action: Action = serde_json::from_str(json).unwrap();
        let ActionKind::StyleChange { style_changes, .. } = &action.kind else {
            panic!("expected style change");
        };
        assert_eq!(style_changes["opacity"], PropertyValue::Number(0.5));
        assert_eq!(style_changes["visible"], PropertyValue::Bool(true));
        assert_eq!(style_changes["color"], PropertyValue::Text("#ff0000".into()));
    }

    #[test]
    fn test_serialized_form_uses_type_tag() {
        let action = Action::new(ActionKind::Wait)
            .with_id("wait-1")
            .with_start(500.0)
            .with_duration(500.0);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "wait");
        assert_eq!(value["startTime"], 500.0);
        assert!(value.get("label").is_none());
    }

    #[test]
    fn test_negative_times_are_read_as_zero() {
        let action = Action::new(ActionKind::Wait).with_start(-10.0).with_duration(-5.0);
        assert_eq!(action.start(), 0.0);
        assert_eq!(action.span(), 0.0);
        assert!(action.is_instantaneous());
    }

    #[test]
    fn test_non_numeric_properties_step() {
        let a = PropertyValue::from("left");
        let b = PropertyValue::from("right");
        assert_eq!(a.interpolate(&b, 0.99), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
        assert_eq!(
            PropertyValue::from(0.0).interpolate(&PropertyValue::from(10.0), 0.25),
            PropertyValue::Number(2.5)
        );
    }

    #[test]
    fn test_action_type_names_match_serde() {
        for action_type in ActionType::ALL {
            let json = serde_json::to_string(&action_type).unwrap();
            assert_eq!(json, format!("\"{}\"", action_type.name()));
        }
    }
}
