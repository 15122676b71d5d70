//! 2D points and affine transforms in canvas space.
//!
//! A [`Transform`] is the consolidated form of an SVG `transform` attribute:
//! one affine matrix `matrix(a, b, c, d, e, f)` mapping shape-local points
//! into canvas points. It round-trips through its string form without loss,
//! which is what the timeline stores and exports.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RotodragError;

/// A point in canvas or shape-local space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `self - origin`.
    #[must_use]
    pub fn relative_to(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    /// Distance from the origin.
    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// An affine transform in SVG matrix order.
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(x: f64, y: f64) -> Self {
        Self { e: x, f: y, ..Self::IDENTITY }
    }

    /// Rotation about the origin. Positive degrees turn clockwise on screen (y points down).
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    #[must_use]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Matrix product `self × rhs`: `rhs` is applied first, as in an SVG transform list.
    #[must_use]
    pub fn then(self, rhs: Transform) -> Transform {
        Transform {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    /// Map a shape-local point into canvas space.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.a * p.x + self.c * p.y + self.e, self.b * p.x + self.d * p.y + self.f)
    }

    /// The inverse matrix, or `None` when the determinant is zero.
    #[must_use]
    pub fn inverse(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Transform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Canvas position of the shape's local origin, i.e. its center.
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.e, self.f)
    }

    /// Rotation angle in degrees, clockwise from the x axis.
    #[must_use]
    pub fn rotation_degrees(&self) -> f64 {
        self.b.atan2(self.a).to_degrees()
    }

    /// Parse an SVG transform list such as `translate(10, 20) rotate (45)`.
    ///
    /// Supports `matrix`, `translate`, `rotate` (with optional pivot) and
    /// `scale`. An empty string is the identity.
    ///
    /// # Errors
    ///
    /// Returns [`RotodragError::MalformedTransform`] for unknown functions,
    /// wrong argument counts, or unparseable numbers.
    pub fn parse(raw: &str) -> Result<Self, RotodragError> {
        let malformed = || RotodragError::MalformedTransform(raw.to_owned());
        let mut result = Transform::IDENTITY;
        let mut rest = raw.trim();

        while !rest.is_empty() {
            let open = rest.find('(').ok_or_else(malformed)?;
            let close = rest.find(')').ok_or_else(malformed)?;
            if close < open {
                return Err(malformed());
            }
            let name = rest[..open].trim();
            let args = parse_args(&rest[open + 1..close]).ok_or_else(malformed)?;
            let step = match (name, args.as_slice()) {
                ("matrix", &[a, b, c, d, e, f]) => Transform { a, b, c, d, e, f },
                ("translate", &[x]) => Transform::translate(x, 0.0),
                ("translate", &[x, y]) => Transform::translate(x, y),
                ("rotate", &[deg]) => Transform::rotate(deg),
                ("rotate", &[deg, cx, cy]) => Transform::translate(cx, cy)
                    .then(Transform::rotate(deg))
                    .then(Transform::translate(-cx, -cy)),
                ("scale", &[s]) => Transform::scale(s, s),
                ("scale", &[sx, sy]) => Transform::scale(sx, sy),
                _ => return Err(malformed()),
            };
            result = result.then(step);
            rest = rest[close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        }

        Ok(result)
    }
}

fn parse_args(raw: &str) -> Option<Vec<f64>> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            Ok(_) | Err(_) => None,
        })
        .collect()
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "matrix({}, {}, {}, {}, {}, {})", self.a, self.b, self.c, self.d, self.e, self.f)
    }
}

impl FromStr for Transform {
    type Err = RotodragError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Transform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Transform::parse(&raw).map_err(serde::de::Error::custom)
    }
}
