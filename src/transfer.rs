//! Copy presentation attributes from a prototype element onto targets.

use crate::defaults::TRANSFER_ATTRIBS;
use crate::dom::XmlElement;
use crate::errors::{DomainError, Result};
use crate::log::debug;

/// Attribute values captured from a prototype, ready to be stamped onto any
/// number of targets.
///
/// Capturing first means the prototype may live in the same tree as the
/// targets: the borrow of the prototype ends before the targets are touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttribTransfer {
    values: Vec<(String, String)>,
}

impl AttribTransfer {
    /// Read `attribs` (default: `fill`, `stroke`, `stroke-width`) from
    /// `prototype`. Every requested attribute must be present.
    pub fn capture(prototype: &dyn XmlElement, attribs: Option<&[&str]>) -> Result<Self> {
        let names = attribs.unwrap_or(&TRANSFER_ATTRIBS[..]);
        let values = names
            .iter()
            .map(|&name| match prototype.attr(name) {
                Some(value) => Ok((name.to_string(), value.to_string())),
                None => Err(DomainError::MissingAttribute {
                    element: describe(prototype),
                    attribute: name.to_string(),
                }
                .into()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// Overwrite the captured attributes on `target`.
    pub fn apply<E: XmlElement + ?Sized>(&self, target: &mut E) {
        for (name, value) in &self.values {
            target.set_attr(name, value.clone());
        }
        debug!(target = %describe(&*target), count = self.values.len(), "transferred attributes");
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Copy `attribs` of `prototype` onto every target.
///
/// A prototype lacking one of the attributes fails before any target is
/// touched.
pub fn apply_attribs<'t, E>(
    targets: impl IntoIterator<Item = &'t mut E>,
    prototype: &dyn XmlElement,
    attribs: Option<&[&str]>,
) -> Result<()>
where
    E: XmlElement + ?Sized + 't,
{
    let transfer = AttribTransfer::capture(prototype, attribs)?;
    for target in targets {
        transfer.apply(target);
    }
    Ok(())
}

/// `tag#id` for diagnostics.
pub(crate) fn describe(el: &(impl XmlElement + ?Sized)) -> String {
    match el.attr("id") {
        Some(id) => format!("{}#{id}", el.tag()),
        None => el.tag().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;
    use crate::errors::Error;

    fn prototype() -> Element {
        Element::parse_fragment(r##"<rect id="P" fill="#2EC" stroke="#aad" stroke-width="15"/>"##)
            .expect("valid")
    }

    fn target(id: &str) -> Element {
        Element::parse_fragment(&format!(
            r##"<rect id="{id}" fill="#904" stroke="#5d4" stroke-width="8"/>"##
        ))
        .expect("valid")
    }

    #[test]
    fn defaults_copy_paint_attributes() {
        let proto = prototype();
        let mut a = target("A");
        let mut b = target("B");
        apply_attribs([&mut a, &mut b], &proto, None).expect("all present");
        for el in [&a, &b] {
            assert_eq!(el.attr("fill"), Some("#2EC"));
            assert_eq!(el.attr("stroke"), Some("#aad"));
            assert_eq!(el.attr("stroke-width"), Some("15"));
        }
        assert_eq!(a.id(), Some("A"));
        assert_eq!(b.id(), Some("B"));
    }

    #[test]
    fn only_named_attributes() {
        let proto = prototype();
        let mut t = target("T");
        apply_attribs([&mut t], &proto, Some(&["fill"][..])).expect("fill present");
        assert_eq!(
            t.to_xml_string(),
            r##"<rect id="T" fill="#2EC" stroke="#5d4" stroke-width="8"/>"##
        );
    }

    #[test]
    fn missing_prototype_attribute_touches_nothing() {
        let proto = Element::new("rect").with_attr("id", "P").with_attr("fill", "red");
        let mut t = target("T");
        let err = apply_attribs([&mut t], &proto, None).expect_err("no stroke");
        match err {
            Error::Domain(DomainError::MissingAttribute { element, attribute }) => {
                assert_eq!(element, "rect#P");
                assert_eq!(attribute, "stroke");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(t.attr("fill"), Some("#904"));
    }

    #[test]
    fn new_attributes_are_added() {
        let transfer = AttribTransfer::capture(&prototype(), Some(&["stroke"][..])).expect("present");
        let mut bare = Element::new("path");
        transfer.apply(&mut bare);
        assert_eq!(bare.attr("stroke"), Some("#aad"));
        assert_eq!(transfer.values().count(), 1);
    }
}
