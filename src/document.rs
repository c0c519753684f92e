//! SVG documents: loading, element lookup, inject points and saving.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::defaults::{INJECT_ID_PREFIX, INJECT_RECT_OPACITY, INPUT_NAME, POLY_TAGS};
use crate::dom::{Element, Node, Tree, XmlElement};
use crate::errors::{DomainError, Error, NotFoundError, ParseError, Result};
use crate::inject::InjectPoint;
use crate::log::debug;
#[cfg(feature = "tracing")]
use crate::log::warn;
use crate::parse::{parse_length, parse_view_box};
use crate::transfer::{AttribTransfer, describe};
use crate::transform::{Rect, Transform, WorldRange};

/// How documents are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Start with `<?xml version="1.0" encoding="UTF-8"?>`.
    pub xml_declaration: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
        }
    }
}

/// An SVG document held in memory for editing.
///
/// Typically a template drawn in a vector editor: layers (`g` elements) and
/// reference shapes are found by id and turned into [`InjectPoint`]s that
/// place generated content in world coordinates.
///
/// ```rust
/// use svgpipe::{InsertPosition, SvgDocument};
///
/// let mut doc: SvgDocument = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
///   <g id="plot"/>
///   <rect id="frame" x="10" y="10" width="80" height="80"/>
///   <polyline id="curve" points="10,90"/>
/// </svg>"#
///     .parse()
///     .unwrap();
///
/// let trafo = doc.trafo_from_rect("frame", (0.0, 1.0), (0.0, 1.0), true).unwrap();
/// let mut curve = doc.poly_inject_point("polyline", "curve").unwrap();
/// curve
///     .inject_points_with(&[(1.0, 1.0)], InsertPosition::After, &trafo)
///     .unwrap();
///
/// assert!(doc.to_xml_string().contains(r#"points="10,90 90,10""#));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    name: String,
    tree: Tree,
}

impl SvgDocument {
    /// Parse a document from text.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_named(INPUT_NAME, text)
    }

    /// Parse a document; `name` labels the source in diagnostics.
    pub fn parse_named(name: impl Into<String>, text: &str) -> Result<Self> {
        let name = name.into();
        let tree = Tree::parse(&name, text)?;
        debug!(name = %name, root = tree.root.tag(), "parsed document");
        Ok(Self { name, tree })
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Read and parse the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse_named(path.display().to_string(), &text)
    }

    /// Name used for this document in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The root `svg` element.
    pub fn root(&self) -> &Element {
        &self.tree.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.tree.root
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// The root `viewBox`, or `None` if the attribute is absent.
    pub fn view_box(&self) -> Result<Option<Rect>> {
        match self.tree.root.attr("viewBox") {
            Some(text) => Ok(Some(parse_view_box(text)?)),
            None => Ok(None),
        }
    }

    /// The layer (`g` element) with the given id, anywhere in the document.
    pub fn layer(&self, id: &str) -> Result<&Element> {
        let pred = layer_pred(id);
        self.warn_if_ambiguous(&pred, "g", id);
        self.tree
            .root
            .find_descendant(&pred)
            .ok_or_else(|| NotFoundError::Layer { id: id.to_string() }.into())
    }

    pub fn layer_mut(&mut self, id: &str) -> Result<&mut Element> {
        let pred = layer_pred(id);
        self.warn_if_ambiguous(&pred, "g", id);
        self.tree
            .root
            .find_descendant_mut(&pred)
            .ok_or_else(|| NotFoundError::Layer { id: id.to_string() }.into())
    }

    /// Top-level layers whose id is one of `ids`, keyed by id.
    ///
    /// Only direct `g` children of the root are considered. Ids with no
    /// layer are absent from the map; two layers sharing a requested id is
    /// an error.
    pub fn layers_by_ids(&self, ids: &[&str]) -> Result<BTreeMap<String, &Element>> {
        let mut layers = BTreeMap::new();
        for el in self.tree.root.elements().filter(|el| el.tag() == "g" && el.is_svg()) {
            let Some(id) = el.id() else { continue };
            if !ids.contains(&id) {
                continue;
            }
            if layers.insert(id.to_string(), el).is_some() {
                return Err(ParseError::DuplicateId { id: id.to_string() }.into());
            }
        }
        debug!(requested = ids.len(), found = layers.len(), "collected layers");
        Ok(layers)
    }

    /// The SVG element `<tag id="id">`, anywhere in the document.
    ///
    /// `tag` is the local name, without namespace prefix.
    pub fn svg_element(&self, tag: &str, id: &str) -> Result<&Element> {
        let pred = element_pred(tag, id);
        self.warn_if_ambiguous(&pred, tag, id);
        self.tree
            .root
            .find_descendant(&pred)
            .ok_or_else(|| not_found(tag, id))
    }

    pub fn svg_element_mut(&mut self, tag: &str, id: &str) -> Result<&mut Element> {
        let pred = element_pred(tag, id);
        self.warn_if_ambiguous(&pred, tag, id);
        self.tree
            .root
            .find_descendant_mut(&pred)
            .ok_or_else(|| not_found(tag, id))
    }

    #[cfg(feature = "tracing")]
    fn warn_if_ambiguous(&self, pred: &dyn Fn(&Element) -> bool, tag: &str, id: &str) {
        let matches = count_descendants(&self.tree.root, pred);
        if matches > 1 {
            warn!(tag, id, matches, "id is not unique, using the first match");
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn warn_if_ambiguous(&self, _pred: &dyn Fn(&Element) -> bool, _tag: &str, _id: &str) {}

    // ------------------------------------------------------------------
    // Inject points
    // ------------------------------------------------------------------

    /// An inject point on the layer `id`, scaled to the root `viewBox`.
    ///
    /// With `group` markup, the group is appended to the layer and becomes
    /// the target instead.
    pub fn layer_inject_point<H, V>(
        &mut self,
        id: &str,
        hrange: impl Into<WorldRange<H>>,
        vrange: impl Into<WorldRange<V>>,
        group: Option<&str>,
    ) -> Result<InjectPoint<'_, H, V>> {
        let view_box = self.view_box()?;
        let layer = self.layer_mut(id)?;
        let view_box = view_box.ok_or(DomainError::MissingViewBox)?;
        let transform = Transform::new(view_box, hrange, vrange)?;
        let group = group.map(Element::parse_fragment).transpose()?;

        let target: &mut Element = match group {
            Some(group) => {
                debug!(layer = id, tag = group.tag(), "appending group to layer");
                layer.push_element(group)
            }
            None => layer,
        };
        Ok(InjectPoint::new(target, transform))
    }

    /// Turn `<rect id="id">` into an inject group scaled to the rect.
    ///
    /// The rect is rewritten in place as `<g id="INJ_id">` holding a copy of
    /// itself with reduced opacity, so the reference frame stays visible
    /// behind the injected content.
    pub fn rect_inject_point<H, V>(
        &mut self,
        id: &str,
        hrange: impl Into<WorldRange<H>>,
        vrange: impl Into<WorldRange<V>>,
    ) -> Result<InjectPoint<'_, H, V>> {
        let rect_el = self.svg_element_mut("rect", id)?;
        let transform = Transform::new(rect_geometry(rect_el)?, hrange, vrange)?;

        let mut copy = rect_el.clone();
        copy.set_attr("opacity", INJECT_RECT_OPACITY.to_string());
        rect_el.set_name("g");
        rect_el.clear_attrs();
        rect_el.set_attr("id", format!("{INJECT_ID_PREFIX}{id}"));
        *rect_el.children_mut() = vec![Node::Element(copy)];
        debug!(id, "rect converted to inject group");

        Ok(InjectPoint::new(rect_el, transform))
    }

    /// An inject point on a `polygon` or `polyline`, working in document
    /// coordinates. Use the `*_with` point methods to inject world points.
    pub fn poly_inject_point(&mut self, tag: &str, id: &str) -> Result<InjectPoint<'_>> {
        if !POLY_TAGS.contains(&tag) {
            return Err(NotFoundError::NotAPolyShape {
                tag: tag.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        let el = self.svg_element_mut(tag, id)?;
        Ok(InjectPoint::new(el, Transform::identity()))
    }

    /// A transform scaled to the geometry of `<rect id="id">`.
    ///
    /// The document is not modified.
    pub fn trafo_from_rect<H, V>(
        &self,
        id: &str,
        hrange: impl Into<WorldRange<H>>,
        vrange: impl Into<WorldRange<V>>,
        flip_y: bool,
    ) -> Result<Transform<H, V>> {
        let rect = rect_geometry(self.svg_element("rect", id)?)?;
        let transform = Transform::new(rect, hrange, vrange)?;
        Ok(if flip_y { transform.flip_y() } else { transform })
    }

    // ------------------------------------------------------------------
    // Attribute transfer
    // ------------------------------------------------------------------

    /// Copy `attribs` (default `fill`, `stroke`, `stroke-width`) from the
    /// `prototype` element onto every target; elements are `(tag, id)`.
    ///
    /// All elements are resolved before anything is changed.
    pub fn apply_attribs(
        &mut self,
        targets: &[(&str, &str)],
        prototype: (&str, &str),
        attribs: Option<&[&str]>,
    ) -> Result<()> {
        let transfer = AttribTransfer::capture(self.svg_element(prototype.0, prototype.1)?, attribs)?;
        for &(tag, id) in targets {
            self.svg_element(tag, id)?;
        }
        for &(tag, id) in targets {
            transfer.apply(self.svg_element_mut(tag, id)?);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn to_xml_string(&self) -> String {
        self.to_xml_string_with(&WriteOptions::default())
    }

    pub fn to_xml_string_with(&self, options: &WriteOptions) -> String {
        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.tree.write(&mut out, options.xml_declaration);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Stream the document to `writer` with default [`WriteOptions`].
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        self.tree.write(&mut writer, WriteOptions::default().xml_declaration)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the document to `path` as UTF-8, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.write_to(BufWriter::new(fs::File::create(path)?))?;
        debug!(path = %path.display(), "saved document");
        Ok(())
    }
}

impl FromStr for SvgDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn layer_pred(id: &str) -> impl Fn(&Element) -> bool + '_ {
    move |el: &Element| el.tag() == "g" && el.is_svg() && el.id() == Some(id)
}

fn element_pred<'a>(tag: &'a str, id: &'a str) -> impl Fn(&Element) -> bool + 'a {
    move |el: &Element| el.tag() == tag && el.is_svg() && el.id() == Some(id)
}

fn not_found(tag: &str, id: &str) -> Error {
    NotFoundError::Element {
        tag: tag.to_string(),
        id: id.to_string(),
    }
    .into()
}

#[cfg(feature = "tracing")]
fn count_descendants(el: &Element, pred: &dyn Fn(&Element) -> bool) -> usize {
    el.elements()
        .map(|child| usize::from(pred(child)) + count_descendants(child, pred))
        .sum()
}

/// `x`, `y`, `width`, `height` of a rect element.
fn rect_geometry(el: &Element) -> Result<Rect> {
    let get = |attribute: &str| -> Result<f64> {
        let value = el.attr(attribute).ok_or_else(|| DomainError::MissingGeometry {
            element: describe(el),
            attribute: attribute.to_string(),
        })?;
        Ok(parse_length(&describe(el), attribute, value)?)
    };
    Ok(Rect::new(get("x")?, get("y")?, get("width")?, get("height")?))
}
