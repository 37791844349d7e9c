// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action dispatch to host-registered handlers.
//!
//! The executor never changes application state itself. It looks up the
//! handler registered for an action's type and calls it with deterministic
//! arguments. A failing handler is logged and reported, never propagated, so
//! one broken action cannot stall the rest of a tick.

use crate::action::{Action, ActionId, ActionKind, ActionType, AnimationKeyframe, PropertyMap};
use crate::scene::SceneId;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};

/// Everything a handler knows about one dispatch besides the action
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// Scene the action belongs to
    pub scene_id: &'a SceneId,
    /// Scene-relative virtual time of the dispatch
    pub scene_time: f64,
    /// Timeline-global virtual time of the dispatch
    pub timeline_time: f64,
    /// Progress before easing
    pub linear_progress: f64,
    /// Whether this dispatch delivers the end state
    pub terminal: bool,
    /// Interpolated keyframe properties, for animation actions
    pub properties: Option<&'a PropertyMap>,
}

impl<'a> HandlerContext<'a> {
    /// Create a context without animation properties
    pub fn new(scene_id: &'a SceneId, scene_time: f64, timeline_time: f64, linear_progress: f64) -> Self {
        Self {
            scene_id,
            scene_time,
            timeline_time,
            linear_progress,
            terminal: linear_progress >= 1.0,
            properties: None,
        }
    }
}

/// Trait for applying an action's effect
pub trait ActionHandler {
    /// Apply `action` at eased `progress`
    fn handle(&mut self, action: &Action, progress: f64, ctx: &HandlerContext<'_>) -> Result<(), HandlerError>;
}

impl<F> ActionHandler for F
where
    F: FnMut(&Action, f64, &HandlerContext<'_>) -> Result<(), HandlerError>,
{
    fn handle(&mut self, action: &Action, progress: f64, ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
        self(action, progress, ctx)
    }
}

/// Error reported by a handler
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HandlerError {
    /// The handler returned an error
    #[error("Handler failed: {0}")]
    Failed(String),

    /// The handler panicked
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Create a failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result of dispatching one action
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The handler ran successfully
    Applied,
    /// No handler is registered for the action type
    Skipped,
    /// The handler failed; the error was logged
    Failed(HandlerError),
}

impl DispatchOutcome {
    /// Whether the handler ran successfully
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied)
    }
}

/// Handler registry and dispatcher
#[derive(Default)]
pub struct ActionExecutor {
    /// Handlers by action type
    handlers: HashMap<ActionType, Box<dyn ActionHandler>>,
    /// Sorted copies of keyframe lists authored out of order
    sorted_keyframes: HashMap<ActionId, Vec<AnimationKeyframe>>,
    /// Types already reported as unhandled
    warned_types: HashSet<ActionType>,
}

impl ActionExecutor {
    /// Create an executor with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure handler, returning the one it replaces
    pub fn register_handler<F>(&mut self, action_type: ActionType, handler: F) -> Option<Box<dyn ActionHandler>>
    where
        F: FnMut(&Action, f64, &HandlerContext<'_>) -> Result<(), HandlerError> + 'static,
    {
        self.register_boxed_handler(action_type, Box::new(handler))
    }

    /// Register a boxed handler, returning the one it replaces
    pub fn register_boxed_handler(
        &mut self,
        action_type: ActionType,
        handler: Box<dyn ActionHandler>,
    ) -> Option<Box<dyn ActionHandler>> {
        self.warned_types.remove(&action_type);
        self.handlers.insert(action_type, handler)
    }

    /// Remove the handler for a type
    pub fn unregister_handler(&mut self, action_type: ActionType) -> Option<Box<dyn ActionHandler>> {
        self.handlers.remove(&action_type)
    }

    /// Whether a handler is registered for a type
    pub fn has_handler(&self, action_type: ActionType) -> bool {
        self.handlers.contains_key(&action_type)
    }

    /// Drop cached keyframe orderings
    pub fn clear_cache(&mut self) {
        self.sorted_keyframes.clear();
    }

    /// Dispatch `action` at eased `progress` to its handler
    pub fn execute(&mut self, action: &Action, progress: f64, ctx: HandlerContext<'_>) -> DispatchOutcome {
        let action_type = action.action_type();

        let animated = match &action.kind {
            ActionKind::Animation { keyframes, .. } => {
                Some(interpolate_keyframes(self.ordered_keyframes(action, keyframes), progress))
            }
            _ => None,
        };

        let Some(handler) = self.handlers.get_mut(&action_type) else {
            if action_type != ActionType::Wait && self.warned_types.insert(action_type) {
                tracing::warn!(
                    "No handler registered for '{}' actions; skipping {}",
                    action_type,
                    action.id
                );
            }
            return DispatchOutcome::Skipped;
        };

        let ctx = HandlerContext {
            properties: animated.as_ref(),
            ..ctx
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(action, progress, &ctx)))
            .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(()) => DispatchOutcome::Applied,
            Err(err) => {
                tracing::warn!("Action {} ({}) failed: {}", action.id, action_type, err);
                DispatchOutcome::Failed(err)
            }
        }
    }

    /// Keyframes in ascending time order, sorting a copy on first use
    fn ordered_keyframes<'a>(&'a mut self, action: &Action, keyframes: &'a [AnimationKeyframe]) -> &'a [AnimationKeyframe] {
        if keyframes.windows(2).all(|pair| pair[0].time <= pair[1].time) {
            return keyframes;
        }

        self.sorted_keyframes.entry(action.id.clone()).or_insert_with(|| {
            tracing::warn!("Keyframes of animation {} are out of order; sorting", action.id);
            let mut sorted = keyframes.to_vec();
            sorted.sort_by(|a, b| a.time.total_cmp(&b.time));
            sorted
        })
        .as_slice()
    }
}

/// Interpolate a sorted keyframe list at normalized time `t`.
///
/// Numeric properties blend linearly between the bracketing keyframes, other
/// values step. Before the first or after the last keyframe its values hold.
pub fn interpolate_keyframes(keyframes: &[AnimationKeyframe], t: f64) -> PropertyMap {
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return PropertyMap::new();
    };

    if t <= first.time {
        return first.properties.clone();
    }
    if t >= last.time {
        return last.properties.clone();
    }

    // First keyframe strictly after t; index 0 is excluded by the check above
    let next_idx = keyframes.iter().position(|k| k.time > t).unwrap_or(keyframes.len() - 1);
    let a = &keyframes[next_idx - 1];
    let b = &keyframes[next_idx];

    let gap = b.time - a.time;
    if gap.abs() < f64::EPSILON {
        return b.properties.clone();
    }
    let local = (t - a.time) / gap;

    let mut result = PropertyMap::new();
    for (name, from) in &a.properties {
        let value = match b.properties.get(name) {
            Some(to) => from.interpolate(to, local),
            None => from.clone(),
        };
        result.insert(name.clone(), value);
    }
    for (name, to) in &b.properties {
        if !result.contains_key(name) {
            result.insert(name.clone(), to.clone());
        }
    }
    result
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Position, PropertyValue};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn scroll() -> Action {
        Action::new(ActionKind::Scroll {
            target_position: Position::new(100.0, 0.0),
        })
        .with_id("scroll")
        .with_duration(500.0)
    }

    fn animation(keyframes: Vec<AnimationKeyframe>) -> Action {
        Action::new(ActionKind::Animation {
            item_id: "card".into(),
            keyframes,
        })
        .with_id("anim")
        .with_duration(1000.0)
    }

    #[test]
    fn test_dispatches_to_registered_handler() {
        let scene_id = SceneId::from("s");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut executor = ActionExecutor::new();
        executor.register_handler(ActionType::Scroll, move |action, progress, ctx| {
            let ActionKind::Scroll { target_position } = &action.kind else {
                return Err(HandlerError::failed("not a scroll"));
            };
            sink.borrow_mut().push((
                Position::new(0.0, 0.0).lerp(*target_position, progress),
                ctx.terminal,
            ));
            Ok(())
        });

        let outcome = executor.execute(&scroll(), 0.5, HandlerContext::new(&scene_id, 250.0, 250.0, 0.5));
        assert!(outcome.is_applied());
        let outcome = executor.execute(&scroll(), 1.0, HandlerContext::new(&scene_id, 500.0, 500.0, 1.0));
        assert!(outcome.is_applied());

        assert_eq!(
            *seen.borrow(),
            vec![(Position::new(50.0, 0.0), false), (Position::new(100.0, 0.0), true)]
        );
    }

    #[test]
    fn test_unregistered_type_is_skipped() {
        let scene_id = SceneId::from("s");
        let mut executor = ActionExecutor::new();
        let outcome = executor.execute(&scroll(), 0.5, HandlerContext::new(&scene_id, 0.0, 0.0, 0.5));
        assert_eq!(outcome, DispatchOutcome::Skipped);
    }

    #[test]
    fn test_failing_handler_is_isolated() {
        let scene_id = SceneId::from("s");
        let mut executor = ActionExecutor::new();
        executor.register_handler(ActionType::Scroll, |_, _, _| Err(HandlerError::failed("boom")));

        let outcome = executor.execute(&scroll(), 0.5, HandlerContext::new(&scene_id, 0.0, 0.0, 0.5));
        assert_eq!(outcome, DispatchOutcome::Failed(HandlerError::failed("boom")));
    }

    #[test]
    fn test_panicking_handler_is_caught() {
        let scene_id = SceneId::from("s");
        let mut executor = ActionExecutor::new();
        executor.register_handler(ActionType::Scroll, |_, _, _| panic!("handler exploded"));

        let outcome = executor.execute(&scroll(), 0.5, HandlerContext::new(&scene_id, 0.0, 0.0, 0.5));
        assert_eq!(
            outcome,
            DispatchOutcome::Failed(HandlerError::Panicked("handler exploded".into()))
        );
    }

    #[test]
    fn test_register_replaces_previous_handler() {
        let mut executor = ActionExecutor::new();
        assert!(executor.register_handler(ActionType::Zoom, |_, _, _| Ok(())).is_none());
        assert!(executor.register_handler(ActionType::Zoom, |_, _, _| Ok(())).is_some());
        assert!(executor.has_handler(ActionType::Zoom));
        assert!(executor.unregister_handler(ActionType::Zoom).is_some());
        assert!(!executor.has_handler(ActionType::Zoom));
    }

    #[test]
    fn test_keyframe_interpolation() {
        let keyframes = vec![
            AnimationKeyframe::new(0.0).with_property("x", 0.0).with_property("fill", "red"),
            AnimationKeyframe::new(0.5).with_property("x", 100.0).with_property("fill", "blue"),
            AnimationKeyframe::new(1.0).with_property("x", 50.0).with_property("fill", "green"),
        ];

        let at = |t| interpolate_keyframes(&keyframes, t);
        assert_eq!(at(0.0)["x"], PropertyValue::Number(0.0));
        assert_eq!(at(0.25)["x"], PropertyValue::Number(50.0));
        assert_eq!(at(0.25)["fill"], PropertyValue::from("red"));
        assert_eq!(at(0.5)["x"], PropertyValue::Number(100.0));
        assert_eq!(at(0.5)["fill"], PropertyValue::from("blue"));
        assert_eq!(at(0.75)["x"], PropertyValue::Number(75.0));
        assert_eq!(at(1.0)["fill"], PropertyValue::from("green"));
        assert_eq!(at(1.2)["x"], PropertyValue::Number(50.0));
        assert!(interpolate_keyframes(&[], 0.5).is_empty());
    }

    #[test]
    fn test_animation_forwards_interpolated_properties() {
        let scene_id = SceneId::from("s");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut executor = ActionExecutor::new();
        executor.register_handler(ActionType::Animation, move |_, _, ctx| {
            let opacity = ctx
                .properties
                .and_then(|props| props.get("opacity"))
                .and_then(PropertyValue::as_number);
            sink.borrow_mut().push(opacity);
            Ok(())
        });

        // Authored out of order; the executor sorts a copy
        let action = animation(vec![
            AnimationKeyframe::new(1.0).with_property("opacity", 1.0),
            AnimationKeyframe::new(0.0).with_property("opacity", 0.0),
        ]);
        executor.execute(&action, 0.5, HandlerContext::new(&scene_id, 500.0, 500.0, 0.5));
        executor.execute(&action, 0.25, HandlerContext::new(&scene_id, 250.0, 250.0, 0.25));

        assert_eq!(*seen.borrow(), vec![Some(0.5), Some(0.25)]);
        let ActionKind::Animation { keyframes, .. } = &action.kind else {
            unreachable!()
        };
        assert_eq!(keyframes[0].time, 1.0);
    }
}
