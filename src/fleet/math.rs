//! Plane geometry for fleet steering.
//!
//! Positions and forces are plain [`Vec2`]s in battlefield coordinates, where
//! the battlefield spans `[0, width] x [0, height]`. Force terms are most
//! naturally expressed as a magnitude along a heading, so [`Polar`] is the
//! second currency here and converts losslessly (modulo float error) to and
//! from Cartesian form.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A vector expressed as a length along a heading (radians, counter-clockwise
/// from +X).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Polar {
    pub radius: f32,
    pub theta: f32,
}

impl Polar {
    pub const ZERO: Self = Self { radius: 0.0, theta: 0.0 };

    pub fn new(radius: f32, theta: f32) -> Self {
        Self { radius, theta }
    }

    pub fn from_cartesian(v: Vec2) -> Self {
        Self {
            radius: v.length(),
            theta: v.y.atan2(v.x),
        }
    }

    pub fn to_cartesian(self) -> Vec2 {
        Vec2::new(self.radius * self.theta.cos(), self.radius * self.theta.sin())
    }

    /// Polar addition, done in Cartesian space.
    pub fn add(self, other: Self) -> Self {
        Self::from_cartesian(self.to_cartesian() + other.to_cartesian())
    }
}

/// Rectangular battlefield bounds anchored at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f32,
    pub height: f32,
}

impl MapBounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width && p.y <= self.height
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        clamp_to_bounds(p, Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::ZERO,
            Vec2::new(self.width, 0.0),
            Vec2::new(0.0, self.height),
            Vec2::new(self.width, self.height),
        ]
    }

    /// Closest point on each of the four edges (left, right, bottom, top).
    pub fn edge_points(&self, p: Vec2) -> [Vec2; 4] {
        let p = self.clamp(p);
        [
            Vec2::new(0.0, p.y),
            Vec2::new(self.width, p.y),
            Vec2::new(p.x, 0.0),
            Vec2::new(p.x, self.height),
        ]
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::new(1600.0, 1200.0)
    }
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

#[inline]
pub fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    a.distance_squared(b)
}

/// Component-wise clamp into `[min, max]`.
#[inline]
pub fn clamp_to_bounds(p: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(p.x.clamp(min.x, max.x), p.y.clamp(min.y, max.y))
}

/// Add a polar offset to a Cartesian point.
#[inline]
pub fn add_polar(p: Vec2, offset: Polar) -> Vec2 {
    p + offset.to_cartesian()
}

/// Point `speed` units from `from` along the heading of `dir`.
/// A zero heading yields `from` unchanged.
pub fn project_heading(from: Vec2, dir: Vec2, speed: f32) -> Vec2 {
    from + dir.normalize_or_zero() * speed
}

/// Angle of `p` around `center`, in radians.
#[inline]
pub fn angle_around(center: Vec2, p: Vec2) -> f32 {
    let d = p - center;
    d.y.atan2(d.x)
}
