//! World-to-document coordinate transforms.
//!
//! A [`Transform`] maps caller "world" coordinates (data values, dates, …)
//! onto document coordinates inside a reference [`Rect`], typically a
//! `viewBox` or the geometry of a `rect` element in a template.
//!
//! Each axis is an independent affine mapping:
//!
//! ```text
//! x = delta_h(h1, h) * (width  / delta_h(h1, h2)) + rect.x
//! y = delta_v(v1, v) * (height / delta_v(v1, v2)) + rect.y
//! ```
//!
//! `delta` is plain subtraction for numeric types (see [`Distance`]) and a
//! caller supplied function for anything else ([`WorldRange::with_delta`]).
//!
//! # Examples
//!
//! ```rust
//! use svgpipe::{Rect, Transform};
//!
//! let view_box = Rect::new(0.0, 10.0, 90.71, 68.03);
//! let trafo = Transform::new(view_box, (-10.0, 20.0), (0.0, 40.0)).unwrap();
//! assert_eq!(trafo.h2x(&-10.0), 0.0);
//! assert_eq!(trafo.v2y(&0.0), 10.0);
//! ```
//!
//! ## Flipping the vertical axis
//!
//! Document y grows downward. [`Transform::flip_y`] mirrors the vertical
//! mapping about the centre of the rectangle so that growing world values
//! move up:
//!
//! ```rust
//! use svgpipe::{Rect, Transform};
//!
//! let rect = Rect::new(10.0, 30.0, 150.0, 75.0);
//! let trafo = Transform::new(rect, (1000.0, 2000.0), (10.0, 30.0)).unwrap().flip_y();
//! assert_eq!(trafo.v2y(&10.0), 105.0);
//! assert_eq!(trafo.v2y(&30.0), 30.0);
//! ```
//!
//! ## Non-numeric world coordinates
//!
//! Types without a [`Distance`] impl need an explicit delta function, so a
//! transform over them cannot be built by accident:
//!
//! ```compile_fail
//! use std::time::Instant;
//! use svgpipe::{Rect, Transform};
//!
//! let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
//! let now = Instant::now();
//! let trafo = Transform::new(rect, (now, now), (0.0, 1.0));
//! ```

use std::fmt;

use glam::{DVec2, dvec2};

use crate::errors::{DomainError, Result};
use crate::log::debug;

/// Distance between two world values, as a number.
///
/// Implemented as `to - from` for the primitive numeric types.
pub trait Distance {
    fn distance(from: &Self, to: &Self) -> f64;
}

macro_rules! impl_distance {
    ($($ty:ty),*) => {
        $(
            impl Distance for $ty {
                #[inline]
                fn distance(from: &Self, to: &Self) -> f64 {
                    *to as f64 - *from as f64
                }
            }
        )*
    };
}

impl_distance!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Delta function of one axis: `delta(from, to)` as a number.
pub type DeltaFn<W> = fn(&W, &W) -> f64;

/// A view on world data along one axis: `start` maps to the start of the
/// target interval and `end` to its end.
#[derive(Clone, Copy)]
pub struct WorldRange<W> {
    pub start: W,
    pub end: W,
    delta: DeltaFn<W>,
}

impl<W: Distance> WorldRange<W> {
    /// A range over a numeric type, measured by subtraction.
    pub fn new(start: W, end: W) -> Self {
        Self::with_delta(start, end, W::distance)
    }
}

impl<W> WorldRange<W> {
    /// A range measured by `delta` instead of subtraction, e.g. the number of
    /// seconds between two timestamps.
    pub fn with_delta(start: W, end: W, delta: DeltaFn<W>) -> Self {
        Self { start, end, delta }
    }

    /// Signed extent of the range.
    pub fn extent(&self) -> f64 {
        (self.delta)(&self.start, &self.end)
    }
}

impl<W: Distance> From<(W, W)> for WorldRange<W> {
    fn from((start, end): (W, W)) -> Self {
        Self::new(start, end)
    }
}

impl<W: fmt::Debug> fmt::Debug for WorldRange<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldRange")
            .field("start", &self.start)
            .field("end", &self.end)
            .finish_non_exhaustive()
    }
}

/// A rectangle in document coordinates (`viewBox` order).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> DVec2 {
        dvec2(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Which document axis a mapping targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Horizontal,
    Vertical,
}

impl AxisKind {
    pub fn name(self) -> &'static str {
        match self {
            AxisKind::Horizontal => "horizontal",
            AxisKind::Vertical => "vertical",
        }
    }
}

/// One-dimensional affine mapping `delta(origin, w) * scale + offset`.
#[derive(Clone, Copy)]
pub struct Axis<W> {
    origin: W,
    scale: f64,
    offset: f64,
    delta: DeltaFn<W>,
}

impl<W> Axis<W> {
    /// Map `range` onto the document interval `[offset, offset + extent]`.
    pub fn new(range: WorldRange<W>, offset: f64, extent: f64, kind: AxisKind) -> Result<Self> {
        let delta = range.extent();
        let scale = extent / delta;
        if delta == 0.0 || !scale.is_finite() {
            return Err(DomainError::DegenerateRange {
                axis: kind.name(),
                delta,
            }
            .into());
        }
        Ok(Self {
            origin: range.start,
            scale,
            offset,
            delta: range.delta,
        })
    }

    #[inline]
    pub fn map(&self, value: &W) -> f64 {
        (self.delta)(&self.origin, value) * self.scale + self.offset
    }

    /// Document units per world unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

impl Axis<f64> {
    /// The mapping that leaves values untouched.
    pub fn identity() -> Self {
        Self {
            origin: 0.0,
            scale: 1.0,
            offset: 0.0,
            delta: f64::distance,
        }
    }
}

/// Maps world points `(h, v)` onto document points `(x, y)`.
///
/// The two axes are independent and may use different world types.
#[derive(Clone, Copy)]
pub struct Transform<H = f64, V = f64> {
    rect: Rect,
    h: Axis<H>,
    v: Axis<V>,
    flip_y: bool,
}

impl<H, V> Transform<H, V> {
    /// Map `hrange` onto the width and `vrange` onto the height of `rect`.
    ///
    /// Fails if the rectangle has no area or a world range has zero extent.
    pub fn new(
        rect: Rect,
        hrange: impl Into<WorldRange<H>>,
        vrange: impl Into<WorldRange<V>>,
    ) -> Result<Self> {
        if rect.width == 0.0 || rect.height == 0.0 {
            return Err(DomainError::EmptyRect {
                width: rect.width,
                height: rect.height,
            }
            .into());
        }
        let h = Axis::new(hrange.into(), rect.x, rect.width, AxisKind::Horizontal)?;
        let v = Axis::new(vrange.into(), rect.y, rect.height, AxisKind::Vertical)?;
        debug!(
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            h_scale = h.scale,
            v_scale = v.scale,
            "built world-to-document transform"
        );
        Ok(Self {
            rect,
            h,
            v,
            flip_y: false,
        })
    }

    /// Build from already constructed axes.
    pub fn from_axes(rect: Rect, h: Axis<H>, v: Axis<V>) -> Self {
        Self {
            rect,
            h,
            v,
            flip_y: false,
        }
    }

    /// Mirror the vertical mapping about the vertical centre of the rectangle.
    pub fn flip_y(mut self) -> Self {
        self.flip_y = true;
        self
    }

    pub fn is_flipped(&self) -> bool {
        self.flip_y
    }

    /// The reference rectangle in document coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Horizontal world coordinate to document x.
    #[inline]
    pub fn h2x(&self, h: &H) -> f64 {
        self.h.map(h)
    }

    /// Vertical world coordinate to document y.
    #[inline]
    pub fn v2y(&self, v: &V) -> f64 {
        let y = self.v.map(v);
        if self.flip_y {
            2.0 * self.rect.center().y - y
        } else {
            y
        }
    }

    /// Horizontal scale factor, for turning world widths into document widths.
    pub fn h_scale(&self) -> f64 {
        self.h.scale
    }

    /// Vertical scale factor, for turning world heights into document heights.
    ///
    /// This is the magnitude-carrying factor of the unflipped mapping; a
    /// flipped transform still yields positive heights for ordered ranges.
    pub fn v_scale(&self) -> f64 {
        self.v.scale
    }

    /// Map one world point; fails if either coordinate is not finite.
    pub fn map_point(&self, point: &(H, V)) -> Result<DVec2> {
        let (h, v) = point;
        let x = self.h2x(h);
        if !x.is_finite() {
            return Err(DomainError::NonFiniteCoordinate {
                axis: AxisKind::Horizontal.name(),
                value: x,
            }
            .into());
        }
        let y = self.v2y(v);
        if !y.is_finite() {
            return Err(DomainError::NonFiniteCoordinate {
                axis: AxisKind::Vertical.name(),
                value: y,
            }
            .into());
        }
        Ok(dvec2(x, y))
    }

    /// Map every point, failing on the first bad one.
    pub fn map_points(&self, points: &[(H, V)]) -> Result<Vec<DVec2>> {
        points.iter().map(|p| self.map_point(p)).collect()
    }
}

impl Transform<f64, f64> {
    /// Document coordinates in, document coordinates out.
    pub fn identity() -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            h: Axis::identity(),
            v: Axis::identity(),
            flip_y: false,
        }
    }
}

impl<H, V> fmt::Debug for Transform<H, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("rect", &self.rect)
            .field("h_scale", &self.h.scale)
            .field("v_scale", &self.v.scale)
            .field("flip_y", &self.flip_y)
            .finish()
    }
}
