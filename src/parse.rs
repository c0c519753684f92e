//! Parse `points` and `viewBox` number lists with the pest grammar

use glam::{DVec2, dvec2};
use miette::{NamedSource, SourceSpan};
use pest::Parser;
use pest::error::InputLocation;
use pest_derive::Parser;

use crate::errors::ParseError;
use crate::transform::Rect;

#[derive(Parser)]
#[grammar = "numbers.pest"]
struct NumberListParser;

/// A number together with the byte range it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Number {
    pub value: f64,
    pub start: usize,
    pub end: usize,
}

impl Number {
    fn span(&self) -> SourceSpan {
        (self.start, self.end - self.start).into()
    }
}

fn source(what: &'static str, text: &str) -> NamedSource<String> {
    NamedSource::new(what, text.to_string())
}

/// Parse a whitespace/comma separated list of numbers.
///
/// `what` names the attribute in diagnostics.
pub(crate) fn parse_numbers(text: &str, what: &'static str) -> Result<Vec<Number>, ParseError> {
    let pairs = NumberListParser::parse(Rule::number_list, text).map_err(|e| {
        let span: SourceSpan = match e.location {
            InputLocation::Pos(pos) => (pos, 0).into(),
            InputLocation::Span((start, end)) => (start, end - start).into(),
        };
        ParseError::NumberList {
            what,
            src: source(what, text),
            span,
        }
    })?;

    let mut numbers = Vec::new();
    for pair in pairs.flatten().filter(|p| p.as_rule() == Rule::number) {
        let span = pair.as_span();
        // `1e400` is valid syntax but overflows to infinity
        let value = pair
            .as_str()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ParseError::NumberList {
                what,
                src: source(what, text),
                span: (span.start(), span.end() - span.start()).into(),
            })?;
        numbers.push(Number {
            value,
            start: span.start(),
            end: span.end(),
        });
    }
    Ok(numbers)
}

/// Parse a `points` attribute into document points.
pub(crate) fn parse_points(text: &str) -> Result<Vec<DVec2>, ParseError> {
    let numbers = parse_numbers(text, "points")?;
    if numbers.len() % 2 != 0 {
        // the last number is the one left without a partner
        let last = numbers[numbers.len() - 1];
        return Err(ParseError::OddCoordinateCount {
            count: numbers.len(),
            src: source("points", text),
            span: last.span(),
        });
    }
    Ok(numbers
        .chunks_exact(2)
        .map(|xy| dvec2(xy[0].value, xy[1].value))
        .collect())
}

/// Parse a `viewBox` attribute: exactly `x y width height`.
pub(crate) fn parse_view_box(text: &str) -> Result<Rect, ParseError> {
    let numbers = parse_numbers(text, "viewBox")?;
    match numbers.as_slice() {
        [x, y, w, h] => Ok(Rect::new(x.value, y.value, w.value, h.value)),
        _ => Err(ParseError::ViewBoxArity {
            count: numbers.len(),
            src: source("viewBox", text),
            span: (0, text.len()).into(),
        }),
    }
}

/// Parse a single numeric geometry attribute such as `x` or `width`.
pub(crate) fn parse_length(element: &str, attribute: &str, value: &str) -> Result<f64, ParseError> {
    let invalid = || ParseError::InvalidNumber {
        element: element.to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
    };
    match parse_numbers(value, "length") {
        Ok(numbers) if numbers.len() == 1 => Ok(numbers[0].value),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(text: &str) -> Vec<f64> {
        parse_numbers(text, "points")
            .expect("should parse")
            .into_iter()
            .map(|n| n.value)
            .collect()
    }

    #[test]
    fn separators() {
        assert_eq!(values("1,2 3,4"), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values("1 , 2\n\t3 4"), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(values("57.23,2292.125  57.23,2452.75"), vec![57.23, 2292.125, 57.23, 2452.75]);
        assert_eq!(values("  "), Vec::<f64>::new());
        assert_eq!(values(""), Vec::<f64>::new());
    }

    #[test]
    fn sign_without_separator() {
        assert_eq!(values("10-5"), vec![10.0, -5.0]);
        assert_eq!(values("-1.5e2,+.5"), vec![-150.0, 0.5]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_numbers("1,,2", "points").is_err());
        assert!(parse_numbers("1 two", "points").is_err());
        assert!(parse_numbers("1.5.5", "points").is_err());
        assert!(parse_numbers(",1", "points").is_err());
    }

    #[test]
    fn rejects_overflow() {
        let err = parse_numbers("0 1e400,0", "points").expect_err("overflows to infinity");
        let ParseError::NumberList { span, .. } = err else {
            panic!("expected a number list error, got {err:?}");
        };
        assert_eq!((span.offset(), span.len()), (2, 5));
        assert!(parse_numbers("-1e309", "viewBox").is_err());
        assert_eq!(values("1e300"), vec![1e300]);
    }

    #[test]
    fn number_spans_point_at_source() {
        let numbers = parse_numbers("0 10 90.71", "viewBox").expect("should parse");
        assert_eq!((numbers[2].start, numbers[2].end), (5, 10));
    }

    #[test]
    fn odd_point_count() {
        let err = parse_points("1,2 3").expect_err("odd count");
        assert!(matches!(err, ParseError::OddCoordinateCount { count: 3, .. }));
    }

    #[test]
    fn view_box() {
        let rect = parse_view_box("0 0 2834.646 34.6").expect("should parse");
        assert_eq!(rect, Rect::new(0.0, 0.0, 2834.646, 34.6));
        let rect = parse_view_box("0,10,90.71,68.03").expect("commas are separators too");
        assert_eq!(rect, Rect::new(0.0, 10.0, 90.71, 68.03));
        assert!(matches!(
            parse_view_box("0 0 100"),
            Err(ParseError::ViewBoxArity { count: 3, .. })
        ));
        assert!(matches!(
            parse_view_box("0 0 100 100 5"),
            Err(ParseError::ViewBoxArity { count: 5, .. })
        ));
    }

    #[test]
    fn lengths() {
        assert_eq!(parse_length("rect#R", "x", " 59.527 ").expect("number"), 59.527);
        assert!(parse_length("rect#R", "x", "10px").is_err());
        assert!(parse_length("rect#R", "x", "").is_err());
    }
}
