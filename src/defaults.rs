//! Namespaces and fixed settings used when editing documents

/// SVG namespace URI
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// XLink namespace URI
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// The implicit `xml:` namespace
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Id prefix of the group a rect becomes when used as an inject point.
pub const INJECT_ID_PREFIX: &str = "INJ_";
/// Opacity given to the copy of a rect kept inside its inject group.
pub const INJECT_RECT_OPACITY: &str = "0.452";

/// Attributes copied by `apply_attribs` when no list is given.
pub const TRANSFER_ATTRIBS: [&str; 3] = ["fill", "stroke", "stroke-width"];

/// Tags whose `points` attribute can be edited.
pub const POLY_TAGS: [&str; 2] = ["polygon", "polyline"];

/// Source name used in diagnostics for documents not read from a file.
pub const INPUT_NAME: &str = "<input>";
