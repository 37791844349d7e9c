// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action scheduling against scene time.
//!
//! Everything here is a pure function of the scene and the times passed in.
//! Seeking never needs history: evaluating a new time from scratch yields the
//! same result as playing up to it.

use crate::action::Action;
use crate::easing::ease;
use crate::scene::Scene;

/// An action active at some scene time
#[derive(Debug, Clone, Copy)]
pub struct ActiveAction<'a> {
    /// The action
    pub action: &'a Action,
    /// Linear progress through the active window, in `[0, 1]`
    pub linear_progress: f64,
    /// Progress after the action's easing curve
    pub eased_progress: f64,
}

/// An action due for dispatch when time advances over a span
#[derive(Debug, Clone, Copy)]
pub struct ScheduledAction<'a> {
    /// The action
    pub action: &'a Action,
    /// Linear progress through the active window, in `[0, 1]`
    pub linear_progress: f64,
    /// Progress after the action's easing curve
    pub eased_progress: f64,
    /// Whether this dispatch delivers the action's end state
    pub terminal: bool,
}

/// Where an action stands relative to a scene time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    /// Not started yet
    Pending,
    /// Inside its active window
    Active,
    /// Past its active window
    Completed,
}

/// Scheduling rules for scene actions
pub struct ActionScheduler;

impl ActionScheduler {
    /// Whether `action` is active at `time`.
    ///
    /// The window is inclusive at both ends so the end state is delivered at
    /// exactly `start + duration`. An instantaneous action is only active at
    /// its start instant.
    pub fn is_active(action: &Action, time: f64) -> bool {
        if action.is_instantaneous() {
            time == action.start()
        } else {
            time >= action.start() && time <= action.end()
        }
    }

    /// Linear progress of `action` at `time`
    pub fn progress(action: &Action, time: f64) -> f64 {
        if action.is_instantaneous() || time >= action.end() {
            return 1.0;
        }
        ((time - action.start()) / action.span().max(1.0)).clamp(0.0, 1.0)
    }

    /// Phase of `action` at `time`
    pub fn phase_of(action: &Action, time: f64) -> ActionPhase {
        if Self::is_active(action, time) {
            ActionPhase::Active
        } else if time < action.start() {
            ActionPhase::Pending
        } else {
            ActionPhase::Completed
        }
    }

    /// Phase of every action in the scene, in array order
    pub fn phases_at(scene: &Scene, time: f64) -> Vec<(&Action, ActionPhase)> {
        scene
            .actions
            .iter()
            .map(|action| (action, Self::phase_of(action, time)))
            .collect()
    }

    /// Actions active at `time`, in array order
    pub fn active_actions_at(scene: &Scene, time: f64) -> Vec<ActiveAction<'_>> {
        scene
            .actions
            .iter()
            .filter(|action| Self::is_active(action, time))
            .map(|action| {
                let linear_progress = Self::progress(action, time);
                ActiveAction {
                    action,
                    linear_progress,
                    eased_progress: ease(action.easing, linear_progress),
                }
            })
            .collect()
    }

    /// Actions due when scene time advances over `(previous, now]`.
    ///
    /// `previous = None` means nothing in this scene has been observed yet.
    /// Besides the actions active at `now`, this returns instantaneous
    /// actions whose instant fell inside the span and actions whose window
    /// closed inside the span, both at progress 1. Results keep array order.
    pub fn advance(scene: &Scene, previous: Option<f64>, now: f64) -> Vec<ScheduledAction<'_>> {
        let previous = previous.unwrap_or(f64::NEG_INFINITY);
        let mut due = Vec::new();

        for action in &scene.actions {
            let linear_progress = if Self::is_active(action, now) {
                Self::progress(action, now)
            } else if action.is_instantaneous() {
                if previous < action.start() && action.start() <= now {
                    1.0
                } else {
                    continue;
                }
            } else if previous < action.end() && action.end() < now {
                1.0
            } else {
                continue;
            };

            due.push(ScheduledAction {
                action,
                linear_progress,
                eased_progress: ease(action.easing, linear_progress),
                terminal: linear_progress >= 1.0,
            });
        }

        due
    }
}
