//! Owned XML element tree.
//!
//! Documents are parsed with `roxmltree` (read-only) and converted into an
//! owned tree of [`Element`]s that can be edited in place and written back.
//! Names are kept as written: element prefixes, qualified attribute names
//! (`xlink:href`) and the `xmlns` declarations of each element survive a
//! load-save cycle unchanged. Output goes through `quick_xml::Writer`.

use std::io;

use miette::NamedSource;
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use roxmltree::{NodeType, ParsingOptions};

use crate::defaults::{SVG_NS, XLINK_NS, XML_NS};
use crate::errors::{ParseError, Result};

/// Minimal element interface the editing code works against.
pub trait XmlElement {
    /// Local tag name, without prefix.
    fn tag(&self) -> &str;
    /// Attribute value by (qualified) name.
    fn attr(&self, name: &str) -> Option<&str>;
    /// Set or overwrite an attribute, keeping its position if present.
    fn set_attr(&mut self, name: &str, value: String);
    fn children(&self) -> &[Node];
    /// Append `child` as the last child.
    fn append(&mut self, child: Element);
}

/// A namespace declaration (`xmlns` / `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: Option<String>,
    pub uri: String,
}

/// Any node we keep.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    prefix: Option<String>,
    name: String,
    namespace: Option<String>,
    namespaces: Vec<Namespace>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// A new element without prefix or namespace of its own.
    ///
    /// Written unprefixed, it lands in the default namespace of wherever it
    /// is appended.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
            namespace: None,
            namespaces: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value.into());
        self
    }

    /// Parse a markup fragment holding exactly one element.
    ///
    /// The fragment is read as if it were inside an SVG document: unprefixed
    /// names are SVG and the `xlink` prefix is bound.
    pub fn parse_fragment(markup: &str) -> Result<Self> {
        const OPEN: &str = concat!(
            "<svgpipe-fragment xmlns=\"http://www.w3.org/2000/svg\" ",
            "xmlns:xlink=\"http://www.w3.org/1999/xlink\">"
        );
        const CLOSE: &str = "</svgpipe-fragment>";

        let wrapped = format!("{OPEN}{markup}{CLOSE}");
        let doc = roxmltree::Document::parse(&wrapped).map_err(|e| {
            let offset = text_offset(&wrapped, e.pos()).saturating_sub(OPEN.len());
            ParseError::Xml {
                message: e.to_string(),
                src: NamedSource::new("fragment", markup.to_string()),
                span: (offset.min(markup.len()), 0).into(),
            }
        })?;

        let wrapper = doc.root_element();
        let mut elements = wrapper.children().filter(|n| n.is_element());
        let stray_text = wrapper
            .children()
            .any(|n| n.is_text() && n.text().is_some_and(|t| !t.trim().is_empty()));
        match (elements.next(), elements.next()) {
            (Some(el), None) if !stray_text => Ok(convert_element(el)),
            _ => Err(ParseError::FragmentArity {
                count: wrapper.children().filter(|n| n.is_element()).count(),
            }
            .into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Resolved namespace URI, if the element had one when parsed.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the element is in the SVG namespace, or in none at all.
    pub fn is_svg(&self) -> bool {
        matches!(self.namespace.as_deref(), None | Some(SVG_NS))
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Namespace declarations written on this element.
    pub fn namespace_decls(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Change the local name, keeping prefix and namespace.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn clear_attrs(&mut self) {
        self.attrs.clear();
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Append `child` and return a handle to it inside the tree.
    pub fn push_element(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(el)) => el,
            _ => unreachable!("last child was just pushed as an element"),
        }
    }

    /// First descendant (document order, excluding `self`) matching `pred`.
    pub fn find_descendant(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for el in self.elements() {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = el.find_descendant(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Mutable variant of [`Element::find_descendant`].
    pub fn find_descendant_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        for node in self.children.iter_mut() {
            if let Node::Element(el) = node {
                if pred(el) {
                    return Some(el);
                }
                if let Some(found) = el.find_descendant_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Serialize this element and its subtree.
    pub fn to_xml_string(&self) -> String {
        let mut out = Vec::new();
        // writing into a Vec cannot fail
        let _ = write_element(&mut Writer::new(&mut out), self);
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl XmlElement for Element {
    fn tag(&self) -> &str {
        &self.name
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    fn children(&self) -> &[Node] {
        &self.children
    }

    fn append(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }
}

/// A parsed document, split around its root element.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tree {
    pub doctype: Option<String>,
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl Tree {
    pub(crate) fn parse(name: &str, text: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options).map_err(|e| {
            ParseError::Xml {
                message: e.to_string(),
                src: NamedSource::new(name, text.to_string()),
                span: (text_offset(text, e.pos()), 0).into(),
            }
        })?;

        let root_node = doc.root_element();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut seen_root = false;
        for child in doc.root().children() {
            if child == root_node {
                seen_root = true;
                continue;
            }
            if let Some(node) = convert_node(child) {
                if seen_root {
                    epilog.push(node);
                } else {
                    prolog.push(node);
                }
            }
        }

        Ok(Self {
            doctype: read_doctype(&text[..root_node.range().start]),
            prolog,
            root: convert_element(root_node),
            epilog,
        })
    }

    /// Write the document: XML declaration, DOCTYPE, prolog, root, epilog.
    pub(crate) fn write<W: io::Write>(&self, out: W, xml_declaration: bool) -> io::Result<()> {
        let mut writer = Writer::new(out);
        if xml_declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            newline(&mut writer)?;
        }
        if let Some(doctype) = &self.doctype {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?;
            newline(&mut writer)?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
            newline(&mut writer)?;
        }
        // injected fragments may use `xlink:` without the template declaring it
        let xlink = Namespace {
            prefix: Some("xlink".to_string()),
            uri: XLINK_NS.to_string(),
        };
        let extra: &[Namespace] =
            if uses_xlink(&self.root) && !self.root.namespaces.iter().any(|ns| ns.uri == XLINK_NS) {
                std::slice::from_ref(&xlink)
            } else {
                &[]
            };
        write_element_with(&mut writer, &self.root, extra)?;
        newline(&mut writer)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
            newline(&mut writer)?;
        }
        Ok(())
    }
}

/// The `<!DOCTYPE …>` body (internal subset included) of the text before
/// the root element.
fn read_doctype(prolog: &str) -> Option<String> {
    let mut reader = Reader::from_str(prolog);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::DocType(doctype)) => {
                return std::str::from_utf8(&doctype).ok().map(|s| s.trim().to_string());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

/// Byte offset of a 1-based row/column position.
fn text_offset(text: &str, pos: roxmltree::TextPos) -> usize {
    let mut offset = 0;
    for (row, line) in text.split_inclusive('\n').enumerate() {
        if row + 1 == pos.row as usize {
            let col = line
                .char_indices()
                .nth((pos.col as usize).saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            return offset + col;
        }
        offset += line.len();
    }
    text.len()
}

fn convert_node(node: roxmltree::Node<'_, '_>) -> Option<Node> {
    match node.node_type() {
        NodeType::Element => Some(Node::Element(convert_element(node))),
        NodeType::Text => node.text().map(|t| Node::Text(t.to_string())),
        NodeType::Comment => node.text().map(|t| Node::Comment(t.to_string())),
        NodeType::PI => node.pi().map(|pi| Node::ProcessingInstruction {
            target: pi.target.to_string(),
            value: pi.value.map(str::to_string),
        }),
        NodeType::Root => None,
    }
}

fn convert_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let namespace = tag.namespace().map(str::to_string);
    let prefix = tag
        .namespace()
        .and_then(|uri| node.lookup_prefix(uri))
        .map(str::to_string);

    // declarations new in this scope, relative to the parent element
    let parent_scope: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    let namespaces = node
        .namespaces()
        .filter(|ns| ns.uri() != XML_NS)
        .filter(|ns| !parent_scope.contains(&(ns.name(), ns.uri())))
        .map(|ns| Namespace {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect();

    let attrs = node
        .attributes()
        .map(|a| {
            let name = match a.namespace() {
                Some(XML_NS) => format!("xml:{}", a.name()),
                Some(XLINK_NS) if node.lookup_prefix(XLINK_NS).is_none() => {
                    format!("xlink:{}", a.name())
                }
                Some(uri) => match node.lookup_prefix(uri) {
                    Some(p) => format!("{p}:{}", a.name()),
                    None => a.name().to_string(),
                },
                None => a.name().to_string(),
            };
            (name, a.value().to_string())
        })
        .collect();

    let children = node.children().filter_map(convert_node).collect();

    Element {
        prefix,
        name: tag.name().to_string(),
        namespace,
        namespaces,
        attrs,
        children,
    }
}

fn newline<W: io::Write>(writer: &mut Writer<W>) -> io::Result<()> {
    writer.write_event(Event::Text(BytesText::from_escaped("\n")))
}

fn write_node<W: io::Write>(writer: &mut Writer<W>, node: &Node) -> io::Result<()> {
    match node {
        Node::Element(el) => write_element(writer, el),
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        Node::Comment(text) => writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str()))),
        Node::ProcessingInstruction { target, value } => {
            let content = match value {
                Some(value) => format!("{target} {value}"),
                None => target.clone(),
            };
            writer.write_event(Event::PI(BytesPI::new(content)))
        }
    }
}

fn uses_xlink(el: &Element) -> bool {
    el.attrs.iter().any(|(k, _)| k.starts_with("xlink:")) || el.elements().any(uses_xlink)
}

fn write_element<W: io::Write>(writer: &mut Writer<W>, el: &Element) -> io::Result<()> {
    write_element_with(writer, el, &[])
}

fn write_element_with<W: io::Write>(
    writer: &mut Writer<W>,
    el: &Element,
    extra_namespaces: &[Namespace],
) -> io::Result<()> {
    let name = el.qualified_name();
    let mut start = BytesStart::new(name.as_str());
    for ns in el.namespaces.iter().chain(extra_namespaces) {
        let key = match &ns.prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), ns.uri.as_str()));
    }
    for (key, value) in &el.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }
    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r##"<?xml version="1.0" encoding="utf-8"?>
<!-- made by hand -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 10 10" xml:space="preserve">
<g id="L1"><use xlink:href="#r"/><rect id="r" width="1" height="1"/></g>
<g id="L2">a &amp; b</g>
</svg>
"##;

    fn written(tree: &Tree, xml_declaration: bool) -> String {
        let mut out = Vec::new();
        tree.write(&mut out, xml_declaration).expect("vec never fails");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn parse_keeps_names_and_declarations() {
        let tree = Tree::parse("doc", DOC).expect("valid xml");
        let root = &tree.root;
        assert_eq!(root.tag(), "svg");
        assert_eq!(root.namespace(), Some(SVG_NS));
        assert_eq!(root.prefix(), None);
        let decls = root.namespace_decls();
        assert_eq!(decls.len(), 2);
        assert!(decls.contains(&Namespace { prefix: None, uri: SVG_NS.to_string() }));
        assert!(decls.contains(&Namespace {
            prefix: Some("xlink".to_string()),
            uri: XLINK_NS.to_string()
        }));
        assert_eq!(root.attr("xml:space"), Some("preserve"));
        let layer = root.elements().next().expect("first layer");
        assert!(layer.namespace_decls().is_empty());
        let use_el = layer.elements().next().expect("use");
        assert_eq!(use_el.attr("xlink:href"), Some("#r"));
        assert!(tree.prolog.contains(&Node::Comment(" made by hand ".to_string())));
    }

    #[test]
    fn write_round_trips() {
        let tree = Tree::parse("doc", DOC).expect("valid xml");
        let out = written(&tree, true);
        assert!(out.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
        assert!(out.contains(r##"<use xlink:href="#r"/>"##));
        assert!(out.contains("a &amp; b"));
        let again = Tree::parse("again", &out).expect("output parses");
        assert_eq!(again.root, tree.root);
    }

    #[test]
    fn doctype_survives() {
        let text = "<?xml version=\"1.0\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n<svg xmlns=\"http://www.w3.org/2000/svg\"/>";
        let tree = Tree::parse("doc", text).expect("valid xml");
        assert_eq!(
            tree.doctype.as_deref(),
            Some("svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\"")
        );
        assert!(written(&tree, true).starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n<svg"
        ));
    }

    #[test]
    fn internal_subset_and_prolog_nodes_survive() {
        let text = "<!DOCTYPE svg [\n  <!ENTITY ns \"http://www.w3.org/2000/svg\">\n]>\n<?xml-stylesheet href=\"a.css\"?>\n<svg xmlns=\"http://www.w3.org/2000/svg\"><!--c--></svg>";
        let tree = Tree::parse("doc", text).expect("valid xml");
        let out = written(&tree, false);
        assert!(out.starts_with("<!DOCTYPE svg [\n  <!ENTITY ns \"http://www.w3.org/2000/svg\">\n]>\n"));
        assert!(out.contains("<?xml-stylesheet href=\"a.css\"?>\n"));
        assert!(out.contains("<svg xmlns=\"http://www.w3.org/2000/svg\"><!--c--></svg>"));
        let again = Tree::parse("again", &out).expect("output parses");
        assert_eq!(again, tree);
    }

    #[test]
    fn fragment_lands_in_svg_namespace() {
        let el = Element::parse_fragment(r##"<rect x="1" y="2" fill="#00CC44" />"##)
            .expect("valid fragment");
        assert_eq!(el.tag(), "rect");
        assert_eq!(el.namespace(), Some(SVG_NS));
        assert!(el.namespace_decls().is_empty());
        assert_eq!(el.to_xml_string(), r##"<rect x="1" y="2" fill="#00CC44"/>"##);
    }

    #[test]
    fn fragment_errors() {
        assert!(Element::parse_fragment("<rect").is_err());
        assert!(Element::parse_fragment("<a/><b/>").is_err());
        assert!(Element::parse_fragment("just text").is_err());
        assert!(Element::parse_fragment("").is_err());
    }

    #[test]
    fn set_attr_keeps_position() {
        let mut el = Element::new("rect").with_attr("id", "R").with_attr("fill", "red");
        el.set_attr("id", "S".to_string());
        el.set_attr("opacity", "0.5".to_string());
        assert_eq!(el.to_xml_string(), r#"<rect id="S" fill="red" opacity="0.5"/>"#);
        assert_eq!(el.remove_attr("fill").as_deref(), Some("red"));
        assert_eq!(el.attr("fill"), None);
    }

    #[test]
    fn find_descendant_in_document_order() {
        let tree = Tree::parse("doc", DOC).expect("valid xml");
        let found = tree
            .root
            .find_descendant(&|el| el.id() == Some("r"))
            .expect("rect exists");
        assert_eq!(found.tag(), "rect");
        assert!(tree.root.find_descendant(&|el| el.tag() == "svg").is_none());
    }

    #[test]
    fn xlink_declared_when_injected() {
        let mut tree = Tree::parse("doc", r#"<svg xmlns="http://www.w3.org/2000/svg"><g id="L1"/></svg>"#)
            .expect("valid xml");
        let link = Element::parse_fragment(r##"<use xlink:href="#L1"/>"##).expect("valid fragment");
        tree.root.push_element(link);
        let out = written(&tree, false);
        assert!(out.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#
        ));
        let again = Tree::parse("again", &out).expect("output parses");
        assert_eq!(again.root.elements().nth(1).and_then(|el| el.attr("xlink:href")), Some("#L1"));
    }

    #[test]
    fn escaping() {
        let el = Element::new("text").with_attr("title", "a \"b\" <c>");
        assert_eq!(el.to_xml_string(), r#"<text title="a &quot;b&quot; &lt;c&gt;"/>"#);
    }
}
