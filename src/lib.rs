//! Fill SVG templates with generated content.
//!
//! A template is an SVG drawn by hand, usually in a vector editor. Layers
//! (`g` elements) and reference shapes (`rect`, `polygon`, `polyline`) are
//! addressed by id and turned into [`InjectPoint`]s: an element plus a
//! [`Transform`] from caller "world" coordinates (measurements, dates, …) to
//! document coordinates. Content is then injected as SVG markup or as points
//! appended to, inserted into or replacing a shape's point list.
//!
//! ```rust
//! use svgpipe::SvgDocument;
//!
//! let mut doc = SvgDocument::parse(
//!     r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 100"><g id="data"/></svg>"#,
//! )
//! .unwrap();
//!
//! // world: 0..10 horizontally, 0..1 vertically
//! let mut layer = doc.layer_inject_point("data", (0.0, 10.0), (0.0, 1.0), None).unwrap();
//! let (x, y) = (layer.h2x(&5.0), layer.v2y(&0.5));
//! layer
//!     .inject(format!(r#"<circle cx="{x}" cy="{y}" r="2"/>"#))
//!     .unwrap();
//!
//! assert!(doc.to_xml_string().contains(r#"<circle cx="100" cy="50" r="2"/>"#));
//! ```

pub mod compare;
pub mod defaults;
pub mod document;
pub mod dom;
pub mod errors;
pub mod inject;
mod log;
mod parse;
pub mod points;
pub mod transfer;
pub mod transform;

pub use document::{SvgDocument, WriteOptions};
pub use dom::{Element, Namespace, Node, XmlElement};
pub use errors::{DomainError, Error, IndexError, NotFoundError, ParseError, Result};
pub use inject::{Content, InjectPoint};
pub use points::{InsertPosition, PointList};
pub use transfer::{AttribTransfer, apply_attribs};
pub use transform::{Axis, AxisKind, DeltaFn, Distance, Rect, Transform, WorldRange};
