// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves for action progress.
//!
//! Every curve maps normalized progress `t` in `[0, 1]` to eased progress.
//! The endpoints are pinned: `ease(e, 0.0) == 0.0` and `ease(e, 1.0) == 1.0`
//! for every curve, so a terminal snap always lands on the exact end state.
//! Back curves overshoot in between.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Easing curve applied to an action's linear progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// Constant rate
    #[default]
    Linear,
    /// Sine, accelerating
    EaseInSine,
    /// Sine, decelerating
    EaseOutSine,
    /// Sine, accelerating then decelerating
    EaseInOutSine,
    /// Quadratic, accelerating
    EaseInQuad,
    /// Quadratic, decelerating
    EaseOutQuad,
    /// Quadratic, accelerating then decelerating
    EaseInOutQuad,
    /// Cubic, accelerating
    #[serde(alias = "ease-in")]
    EaseInCubic,
    /// Cubic, decelerating
    #[serde(alias = "ease-out")]
    EaseOutCubic,
    /// Cubic, accelerating then decelerating
    #[serde(alias = "ease-in-out")]
    EaseInOutCubic,
    /// Quartic, accelerating
    EaseInQuart,
    /// Quartic, decelerating
    EaseOutQuart,
    /// Quartic, accelerating then decelerating
    EaseInOutQuart,
    /// Exponential, accelerating
    EaseInExpo,
    /// Exponential, decelerating
    EaseOutExpo,
    /// Exponential, accelerating then decelerating
    EaseInOutExpo,
    /// Pulls back below 0 before accelerating
    EaseInBack,
    /// Overshoots past 1 before settling
    EaseOutBack,
    /// Pulls back, then overshoots
    EaseInOutBack,
    /// Bounces against the end value
    Bounce,
}

impl Easing {
    /// All supported curves
    pub const ALL: [Easing; 20] = [
        Easing::Linear,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInExpo,
        Easing::EaseOutExpo,
        Easing::EaseInOutExpo,
        Easing::EaseInBack,
        Easing::EaseOutBack,
        Easing::EaseInOutBack,
        Easing::Bounce,
    ];

    /// Get the serialized name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInSine => "ease-in-sine",
            Self::EaseOutSine => "ease-out-sine",
            Self::EaseInOutSine => "ease-in-out-sine",
            Self::EaseInQuad => "ease-in-quad",
            Self::EaseOutQuad => "ease-out-quad",
            Self::EaseInOutQuad => "ease-in-out-quad",
            Self::EaseInCubic => "ease-in-cubic",
            Self::EaseOutCubic => "ease-out-cubic",
            Self::EaseInOutCubic => "ease-in-out-cubic",
            Self::EaseInQuart => "ease-in-quart",
            Self::EaseOutQuart => "ease-out-quart",
            Self::EaseInOutQuart => "ease-in-out-quart",
            Self::EaseInExpo => "ease-in-expo",
            Self::EaseOutExpo => "ease-out-expo",
            Self::EaseInOutExpo => "ease-in-out-expo",
            Self::EaseInBack => "ease-in-back",
            Self::EaseOutBack => "ease-out-back",
            Self::EaseInOutBack => "ease-in-out-back",
            Self::Bounce => "bounce",
        }
    }

    /// Apply this curve to `t`
    pub fn apply(self, t: f64) -> f64 {
        ease(self, t)
    }
}

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;

/// Map linear progress `t` through an easing curve.
///
/// `t` is clamped to `[0, 1]`; NaN is treated as 0.
pub fn ease(easing: Easing, t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    match easing {
        Easing::Linear => t,
        Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
        Easing::EaseOutSine => (t * PI / 2.0).sin(),
        Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
        Easing::EaseInQuad => t * t,
        Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        Easing::EaseInOutQuad => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
            }
        }
        Easing::EaseInCubic => t * t * t,
        Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
        Easing::EaseInOutCubic => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
        Easing::EaseInQuart => t.powi(4),
        Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
        Easing::EaseInOutQuart => {
            if t < 0.5 {
                8.0 * t.powi(4)
            } else {
                1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
            }
        }
        Easing::EaseInExpo => 2f64.powf(10.0 * t - 10.0),
        Easing::EaseOutExpo => 1.0 - 2f64.powf(-10.0 * t),
        Easing::EaseInOutExpo => {
            if t < 0.5 {
                2f64.powf(20.0 * t - 10.0) / 2.0
            } else {
                (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
            }
        }
        Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
        Easing::EaseOutBack => {
            let u = t - 1.0;
            1.0 + BACK_C3 * u.powi(3) + BACK_C1 * u.powi(2)
        }
        Easing::EaseInOutBack => {
            if t < 0.5 {
                ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
            } else {
                ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0) / 2.0
            }
        }
        Easing::Bounce => bounce_out(t),
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}
