//! Error types with rich diagnostics using miette
//!
//! Parse errors carry source spans so malformed `points`, `viewBox` and
//! fragment markup can be reported with the offending token highlighted.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result alias used throughout svgpipe.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any failure surfaced by svgpipe.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    #[error("i/o error")]
    #[diagnostic(code(svgpipe::io))]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Malformed input: number lists, XML markup, geometry attributes
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("malformed {what}: expected numbers separated by whitespace or commas")]
    #[diagnostic(code(svgpipe::parse::number_list))]
    NumberList {
        what: &'static str,
        #[source_code]
        src: NamedSource<String>,
        #[label("unexpected input")]
        span: SourceSpan,
    },

    #[error("point list has an odd number of coordinates ({count})")]
    #[diagnostic(
        code(svgpipe::parse::odd_coordinates),
        help("every point needs both an x and a y coordinate")
    )]
    OddCoordinateCount {
        count: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("this coordinate has no partner")]
        span: SourceSpan,
    },

    #[error("viewBox needs exactly 4 numbers, found {count}")]
    #[diagnostic(code(svgpipe::parse::view_box))]
    ViewBoxArity {
        count: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("expected `x y width height`")]
        span: SourceSpan,
    },

    #[error("attribute `{attribute}` of `{element}` is not a number: {value:?}")]
    #[diagnostic(code(svgpipe::parse::invalid_number))]
    InvalidNumber {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("malformed XML: {message}")]
    #[diagnostic(code(svgpipe::parse::xml))]
    Xml {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("fragment must contain exactly one element, found {count}")]
    #[diagnostic(code(svgpipe::parse::fragment))]
    FragmentArity { count: usize },

    #[error("duplicate layer id `{id}`")]
    #[diagnostic(code(svgpipe::parse::duplicate_id))]
    DuplicateId { id: String },
}

// ============================================================================
// Lookup Errors
// ============================================================================

/// A requested element does not exist in the tree
#[derive(Error, Diagnostic, Debug)]
pub enum NotFoundError {
    #[error("no layer with id `{id}`")]
    #[diagnostic(
        code(svgpipe::not_found::layer),
        help("layers are `g` elements; check the id in your vector editor")
    )]
    Layer { id: String },

    #[error("no `{tag}` element with id `{id}`")]
    #[diagnostic(code(svgpipe::not_found::element))]
    Element { tag: String, id: String },

    #[error("`{tag}` is not a poly shape (looking for id `{id}`)")]
    #[diagnostic(
        code(svgpipe::not_found::poly_tag),
        help("use `polygon` or `polyline`")
    )]
    NotAPolyShape { tag: String, id: String },
}

// ============================================================================
// Domain Errors
// ============================================================================

/// Values that are well-formed but cannot be used
#[derive(Error, Diagnostic, Debug)]
pub enum DomainError {
    #[error("degenerate {axis} world range: endpoints are {delta} apart")]
    #[diagnostic(
        code(svgpipe::domain::degenerate_range),
        help("the two ends of a world range must differ")
    )]
    DegenerateRange { axis: &'static str, delta: f64 },

    #[error("target rectangle has no area ({width} x {height})")]
    #[diagnostic(code(svgpipe::domain::empty_rect))]
    EmptyRect { width: f64, height: f64 },

    #[error("world coordinate maps to non-finite {axis} document coordinate {value}")]
    #[diagnostic(
        code(svgpipe::domain::non_finite),
        help("check the delta function used for this axis")
    )]
    NonFiniteCoordinate { axis: &'static str, value: f64 },

    #[error("prototype `{element}` has no `{attribute}` attribute")]
    #[diagnostic(code(svgpipe::domain::missing_attribute))]
    MissingAttribute { element: String, attribute: String },

    #[error("`{element}` lacks geometry attribute `{attribute}`")]
    #[diagnostic(code(svgpipe::domain::missing_geometry))]
    MissingGeometry { element: String, attribute: String },

    #[error("document root has no viewBox")]
    #[diagnostic(
        code(svgpipe::domain::missing_view_box),
        help("layer inject points scale to the root viewBox; add one or use a rect inject point")
    )]
    MissingViewBox,
}

// ============================================================================
// Index Errors
// ============================================================================

/// Point index outside the current point list
#[derive(Error, Diagnostic, Debug)]
pub enum IndexError {
    #[error("point index {index} out of range for a list of {len} points")]
    #[diagnostic(code(svgpipe::index::out_of_range))]
    OutOfRange { index: isize, len: usize },
}
