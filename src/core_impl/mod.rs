use super::*;

mod dom;
mod xml;

pub(crate) use dom::COMPANION_TAG;

pub(crate) fn parse_xml(xml: &str) -> Result<Dom> {
    xml::parse_xml(xml)
}
