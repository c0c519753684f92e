//! Point lists of `polygon` and `polyline` shapes.
//!
//! A [`PointList`] holds document coordinates. World points go through a
//! [`Transform`](crate::Transform) first (see [`Transform::map_points`]); the
//! editing operations here only ever see document points, so a failed
//! transform never leaves a half-edited list behind.
//!
//! [`Transform::map_points`]: crate::Transform::map_points

use std::fmt;
use std::str::FromStr;

use glam::DVec2;

use crate::dom::XmlElement;
use crate::errors::{Error, IndexError, Result};
use crate::log::{debug, warn};
use crate::parse::parse_points;

/// Where [`PointList::insert`] puts new points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// In front of the existing points.
    Before,
    /// After the existing points.
    After,
}

/// Ordered vertices of a poly shape, in document coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointList(Vec<DVec2>);

impl PointList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the text of a `points` attribute.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self(parse_points(text)?))
    }

    /// Read the `points` attribute of `element`; a missing attribute is an
    /// empty list.
    pub fn read(element: &dyn XmlElement) -> Result<Self> {
        match element.attr("points") {
            Some(text) => Self::parse(text),
            None => Ok(Self::new()),
        }
    }

    /// Store the list as the `points` attribute of `element`.
    pub fn write(&self, element: &mut dyn XmlElement) {
        element.set_attr("points", self.to_string());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[DVec2] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DVec2> {
        self.0.iter()
    }

    /// Prepend or append `points`, keeping their order.
    pub fn insert(&mut self, points: impl IntoIterator<Item = DVec2>, position: InsertPosition) {
        match position {
            InsertPosition::Before => {
                self.0.splice(0..0, points);
            }
            InsertPosition::After => self.0.extend(points),
        }
        debug!(?position, len = self.0.len(), "inserted points");
    }

    /// Insert `points` as one block in front of the point at `index`.
    ///
    /// `index == len()` appends.
    pub fn insert_at(&mut self, points: impl IntoIterator<Item = DVec2>, index: usize) -> Result<()> {
        if index > self.0.len() {
            return Err(out_of_range(index as isize, self.0.len()));
        }
        self.0.splice(index..index, points);
        debug!(index, len = self.0.len(), "inserted points at index");
        Ok(())
    }

    /// Replace the point at `index`; negative indices count from the end.
    pub fn replace_at(&mut self, point: DVec2, index: isize) -> Result<()> {
        let len = self.0.len();
        if len == 0 {
            warn!(index, "replacing a point in an empty point list");
        }
        let resolved = if index < 0 { index + len as isize } else { index };
        if resolved < 0 || resolved as usize >= len {
            return Err(out_of_range(index, len));
        }
        self.0[resolved as usize] = point;
        debug!(index, resolved, "replaced point");
        Ok(())
    }

    /// Drop every point and take `points` instead.
    pub fn replace_all(&mut self, points: impl IntoIterator<Item = DVec2>) {
        self.0.clear();
        self.0.extend(points);
        debug!(len = self.0.len(), "replaced all points");
    }
}

fn out_of_range(index: isize, len: usize) -> Error {
    IndexError::OutOfRange { index, len }.into()
}

impl FromStr for PointList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<Vec<DVec2>> for PointList {
    fn from(points: Vec<DVec2>) -> Self {
        Self(points)
    }
}

impl FromIterator<DVec2> for PointList {
    fn from_iter<I: IntoIterator<Item = DVec2>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Shortest round-trip formatting; `-0` is written as `0`.
fn fmt_coord(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

impl fmt::Display for PointList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{},{}", fmt_coord(p.x), fmt_coord(p.y))?;
        }
        Ok(())
    }
}
