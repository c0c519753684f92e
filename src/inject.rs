//! Inject points: an element of the document bound to a coordinate transform.
//!
//! An [`InjectPoint`] is what the [`SvgDocument`](crate::SvgDocument) lookup
//! helpers hand out. It borrows its target mutably for as long as it lives,
//! so editing sessions on one document are sequenced by the borrow checker.

use crate::dom::{Element, XmlElement};
use crate::errors::Result;
use crate::log::debug;
use crate::points::{InsertPosition, PointList};
use crate::transform::Transform;
use glam::DVec2;

/// Something [`InjectPoint::inject`] can append to its target.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// SVG fragment markup holding exactly one element.
    Markup(String),
    /// A ready made element.
    Element(Element),
}

impl Content {
    fn into_element(self) -> Result<Element> {
        match self {
            Content::Markup(markup) => Element::parse_fragment(&markup),
            Content::Element(el) => Ok(el),
        }
    }
}

impl From<&str> for Content {
    fn from(markup: &str) -> Self {
        Content::Markup(markup.to_string())
    }
}

impl From<String> for Content {
    fn from(markup: String) -> Self {
        Content::Markup(markup)
    }
}

impl From<Element> for Content {
    fn from(el: Element) -> Self {
        Content::Element(el)
    }
}

/// A target element together with the transform for placing things in it.
pub struct InjectPoint<'a, H = f64, V = f64> {
    target: &'a mut dyn XmlElement,
    transform: Transform<H, V>,
}

impl<'a, H, V> InjectPoint<'a, H, V> {
    pub fn new(target: &'a mut dyn XmlElement, transform: Transform<H, V>) -> Self {
        Self { target, transform }
    }

    pub fn transform(&self) -> &Transform<H, V> {
        &self.transform
    }

    /// The bound element, read-only.
    pub fn target(&self) -> &dyn XmlElement {
        &*self.target
    }

    pub fn h2x(&self, h: &H) -> f64 {
        self.transform.h2x(h)
    }

    pub fn v2y(&self, v: &V) -> f64 {
        self.transform.v2y(v)
    }

    pub fn h_scale(&self) -> f64 {
        self.transform.h_scale()
    }

    pub fn v_scale(&self) -> f64 {
        self.transform.v_scale()
    }

    /// Append `content` as the last child of the target.
    ///
    /// Markup is parsed first; malformed markup leaves the target untouched.
    pub fn inject(&mut self, content: impl Into<Content>) -> Result<()> {
        let el = content.into().into_element()?;
        debug!(tag = el.tag(), target = self.target.tag(), "injecting element");
        self.target.append(el);
        Ok(())
    }

    /// Add world points in front of or after the target's points.
    pub fn inject_points(&mut self, points: &[(H, V)], position: InsertPosition) -> Result<()> {
        let mapped = self.transform.map_points(points)?;
        self.edit_points(|list| {
            list.insert(mapped, position);
            Ok(())
        })
    }

    /// Insert world points as one block in front of the point at `index`.
    pub fn inject_points_at(&mut self, points: &[(H, V)], index: usize) -> Result<()> {
        let mapped = self.transform.map_points(points)?;
        self.edit_points(|list| list.insert_at(mapped, index))
    }

    /// Replace one point; negative indices count from the end.
    pub fn replace_point_at(&mut self, point: (H, V), index: isize) -> Result<()> {
        let mapped = self.transform.map_point(&point)?;
        self.edit_points(|list| list.replace_at(mapped, index))
    }

    /// Throw away the target's points and use `points` instead.
    pub fn replace_all_points(&mut self, points: &[(H, V)]) -> Result<()> {
        let mapped = self.transform.map_points(points)?;
        self.edit_points(|list| {
            list.replace_all(mapped);
            Ok(())
        })
    }

    /// [`inject_points`](Self::inject_points) through another transform.
    pub fn inject_points_with<H2, V2>(
        &mut self,
        points: &[(H2, V2)],
        position: InsertPosition,
        transform: &Transform<H2, V2>,
    ) -> Result<()> {
        let mapped = transform.map_points(points)?;
        self.edit_points(|list| {
            list.insert(mapped, position);
            Ok(())
        })
    }

    /// [`inject_points_at`](Self::inject_points_at) through another transform.
    pub fn inject_points_at_with<H2, V2>(
        &mut self,
        points: &[(H2, V2)],
        index: usize,
        transform: &Transform<H2, V2>,
    ) -> Result<()> {
        let mapped = transform.map_points(points)?;
        self.edit_points(|list| list.insert_at(mapped, index))
    }

    /// [`replace_point_at`](Self::replace_point_at) through another transform.
    pub fn replace_point_at_with<H2, V2>(
        &mut self,
        point: (H2, V2),
        index: isize,
        transform: &Transform<H2, V2>,
    ) -> Result<()> {
        let mapped = transform.map_point(&point)?;
        self.edit_points(|list| list.replace_at(mapped, index))
    }

    /// [`replace_all_points`](Self::replace_all_points) through another
    /// transform.
    pub fn replace_all_points_with<H2, V2>(
        &mut self,
        points: &[(H2, V2)],
        transform: &Transform<H2, V2>,
    ) -> Result<()> {
        let mapped = transform.map_points(points)?;
        self.edit_points(|list| {
            list.replace_all(mapped);
            Ok(())
        })
    }

    /// Read, edit and write back the `points` attribute.
    ///
    /// Nothing is written if reading or editing fails.
    fn edit_points(&mut self, edit: impl FnOnce(&mut PointList) -> Result<()>) -> Result<()> {
        let mut list = PointList::read(&*self.target)?;
        edit(&mut list)?;
        list.write(&mut *self.target);
        Ok(())
    }

    /// Current points of the target, in document coordinates.
    pub fn points(&self) -> Result<Vec<DVec2>> {
        Ok(PointList::read(&*self.target)?.as_slice().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, IndexError};
    use crate::transform::Rect;

    fn polygon(points: &str) -> Element {
        Element::new("polygon").with_attr("id", "P").with_attr("points", points)
    }

    fn ref_transform() -> Transform {
        Transform::new(
            Rect::new(10.0, 30.0, 150.0, 75.0),
            (1000.0, 2000.0),
            (10.0, 30.0),
        )
        .expect("valid")
    }

    #[test]
    fn inject_markup_and_elements() {
        let mut layer = Element::new("g").with_attr("id", "L1");
        let mut ip = InjectPoint::new(&mut layer, Transform::identity());
        ip.inject(r#"<circle cx="1" cy="2" r="3"/>"#).expect("valid markup");
        ip.inject(Element::new("rect").with_attr("id", "R"))
            .expect("element");
        assert!(ip.inject("<circle").is_err());
        let tags: Vec<_> = layer.elements().map(|el| el.tag().to_string()).collect();
        assert_eq!(tags, ["circle", "rect"]);
    }

    #[test]
    fn points_go_through_the_transform() {
        let mut poly = polygon("0,0 100,0 100,10");
        let mut ip = InjectPoint::new(&mut poly, ref_transform());
        ip.inject_points(
            &[(1000.0, 10.0), (2000.0, 30.0), (2000.0, 10.0), (1000.0, 30.0)],
            InsertPosition::After,
        )
        .expect("finite points");
        assert_eq!(
            poly.attr("points"),
            Some("0,0 100,0 100,10 10,30 160,105 160,30 10,105")
        );
    }

    #[test]
    fn override_transform_per_call() {
        let mut poly = polygon("10,30 160,30 160,105 10,105");
        let mut ip = InjectPoint::new(&mut poly, Transform::identity());
        ip.replace_point_at_with((1500.0, 30.0), 1, &ref_transform())
            .expect("in range");
        ip.replace_point_at((160.0, 30.0), -2).expect("identity");
        assert_eq!(
            poly.attr("points"),
            Some("10,30 85,105 160,30 10,105")
        );
    }

    #[test]
    fn missing_points_attribute_is_empty() {
        let mut line = Element::new("polyline");
        let mut ip = InjectPoint::new(&mut line, Transform::identity());
        ip.inject_points_at(&[(1.0, 2.0)], 0).expect("index 0 of empty list");
        assert_eq!(line.attr("points"), Some("1,2"));
    }

    #[test]
    fn failed_edit_leaves_target_unchanged() {
        let mut poly = polygon("1,1 2,2");
        let mut ip = InjectPoint::new(&mut poly, Transform::identity());
        let err = ip.inject_points_at(&[(0.0, 0.0)], 5).expect_err("past end");
        assert!(matches!(err, Error::Index(IndexError::OutOfRange { .. })));
        assert!(ip.inject_points(&[(f64::NAN, 0.0)], InsertPosition::Before).is_err());
        assert_eq!(poly.attr("points"), Some("1,1 2,2"));
    }

    #[test]
    fn scales_delegate() {
        let mut g = Element::new("g");
        let ip = InjectPoint::new(&mut g, ref_transform());
        assert_eq!(ip.h_scale(), 0.15);
        assert_eq!(ip.v_scale(), 3.75);
        assert_eq!(ip.h2x(&1000.0), 10.0);
        assert_eq!(ip.v2y(&30.0), 105.0);
        assert_eq!(ip.target().tag(), "g");
    }
}
