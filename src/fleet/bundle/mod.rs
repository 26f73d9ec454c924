//! Weighted-force steering.
//!
//! A steering behaviour is a sum of *force terms*. Each term is a
//! [`BundleForce`]: a weight plus two gates that decide whether the term
//! fires this tick and how strongly.
//!
//! - **Crowd gate**: number of friendly fighters near the mob vs a trigger.
//! - **Range gate**: distance from the mob to the focus point vs a radius.
//!
//! Every scalar is a [`BundleValue`]: a constant or periodically modulated
//! [`BundleAtom`] whose per-mob jitter is drawn once and kept for the mob's
//! lifetime, so each ship carries a small fixed personality.
//!
//! Configuration is immutable once loaded ([`BundleLoader`]); everything that
//! changes per mob lives in [`BundleLive`].

use bevy::prelude::*;

use crate::fleet::math::project_heading;

mod eval;
mod loader;
mod locus;
#[cfg(test)]
mod tests;

pub use eval::{BundleEval, BundleLive};
pub use loader::BundleLoader;
pub use locus::{LocusLive, LocusParams};

/// Upper bound on the weight multiplier any curve check can produce.
pub const MAX_CHECK_WEIGHT: f32 = 100.0;

/// Index of an atom's memoized jitter in a mob's jitter table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomSlot(pub u16);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BundleAtom {
    pub value: f32,
    /// Jitter is drawn uniformly from `[-|scale|, +|scale|]`.
    pub mob_jitter_scale: f32,
    pub slot: AtomSlot,
}

impl BundleAtom {
    pub fn new(value: f32, mob_jitter_scale: f32, slot: AtomSlot) -> Self {
        Self {
            value,
            mob_jitter_scale,
            slot,
        }
    }
}

/// Optional sine envelope over a value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Periodic {
    pub period: BundleAtom,
    pub amplitude: BundleAtom,
    pub tick_shift: BundleAtom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BundleValue {
    pub atom: BundleAtom,
    pub periodic: Option<Periodic>,
}

impl BundleValue {
    pub fn constant(atom: BundleAtom) -> Self {
        Self {
            atom,
            periodic: None,
        }
    }

    pub fn periodic(atom: BundleAtom, periodic: Periodic) -> Self {
        Self {
            atom,
            periodic: Some(periodic),
        }
    }
}

/// Gate response curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BundleCheck {
    #[default]
    Never,
    Always,
    /// Open with weight 1 when `value >= trigger`.
    StrictOn,
    /// Open with weight 1 when `value < trigger`.
    StrictOff,
    LinearUp,
    LinearDown,
    QuadraticUp,
    QuadraticDown,
}

impl BundleCheck {
    /// Registry spelling, case-sensitive.
    pub fn from_key(s: &str) -> Option<Self> {
        Some(match s {
            "never" => Self::Never,
            "always" => Self::Always,
            "strictOn" => Self::StrictOn,
            "strictOff" => Self::StrictOff,
            "linearUp" => Self::LinearUp,
            "linearDown" => Self::LinearDown,
            "quadraticUp" => Self::QuadraticUp,
            "quadraticDown" => Self::QuadraticDown,
            _ => return None,
        })
    }

    pub fn as_key(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Always => "always",
            Self::StrictOn => "strictOn",
            Self::StrictOff => "strictOff",
            Self::LinearUp => "linearUp",
            Self::LinearDown => "linearDown",
            Self::QuadraticUp => "quadraticUp",
            Self::QuadraticDown => "quadraticDown",
        }
    }

    /// Result does not depend on the inputs.
    pub fn is_constant(self) -> bool {
        matches!(self, Self::Never | Self::Always)
    }

    /// Result does not change once the value passes the trigger.
    pub fn is_invariant(self) -> bool {
        matches!(self, Self::StrictOn | Self::StrictOff)
    }
}

/// Evaluate a gate. `Some(weight)` means open.
///
/// Curves clamp at [`MAX_CHECK_WEIGHT`]. Non-finite inputs close the gate.
/// Up-curves open fully when `trigger <= 0` and close when `value <= 0`;
/// down-curves mirror that. A zero weight is reported as closed.
pub fn check(kind: BundleCheck, value: f32, trigger: f32) -> Option<f32> {
    let weight = match kind {
        BundleCheck::Never => return None,
        BundleCheck::Always => return Some(1.0),
        _ if !value.is_finite() || !trigger.is_finite() => return None,
        BundleCheck::StrictOn => return (value >= trigger).then_some(1.0),
        BundleCheck::StrictOff => return (value < trigger).then_some(1.0),
        BundleCheck::LinearUp | BundleCheck::QuadraticUp => {
            if trigger <= 0.0 {
                MAX_CHECK_WEIGHT
            } else if value <= 0.0 {
                return None;
            } else {
                value / trigger
            }
        }
        BundleCheck::LinearDown | BundleCheck::QuadraticDown => {
            if value <= 0.0 {
                MAX_CHECK_WEIGHT
            } else if trigger <= 0.0 {
                return None;
            } else {
                trigger / value
            }
        }
    };

    let weight = match kind {
        BundleCheck::QuadraticUp | BundleCheck::QuadraticDown => weight * weight,
        _ => weight,
    };
    let weight = weight.min(MAX_CHECK_WEIGHT);
    (weight > 0.0).then_some(weight)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BundleRange {
    pub check: BundleCheck,
    pub radius: BundleValue,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BundleCrowd {
    pub check: BundleCheck,
    pub size: BundleValue,
    pub radius: BundleValue,
}

/// One force term.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BundleForce {
    pub weight: BundleValue,
    pub range: BundleRange,
    pub crowd: BundleCrowd,
}

/// Turn an accumulated force into a movement target `speed` away from `pos`.
///
/// A zero force keeps the current heading.
pub fn steer_target(pos: Vec2, heading: Vec2, force: Vec2, speed: f32) -> Vec2 {
    match force.try_normalize() {
        Some(dir) => pos + dir * speed,
        None => project_heading(pos, heading, speed),
    }
}
