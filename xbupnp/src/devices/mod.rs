//! Descriptions XML publiées par le serveur : device racine et SCPD des services.

mod description;
mod scpd;

pub use description::{DeviceDescription, IconDescription, ServiceDescription};
pub use scpd::{Direction, Scpd, ScpdAction, ScpdArgument, StateVariable};

use xmltree::{Element, EmitterConfig, XMLNode};

fn text_child(parent: &mut Element, name: &str, value: &str) {
    let mut elem = Element::new(name);
    elem.children.push(XMLNode::Text(value.to_string()));
    parent.children.push(XMLNode::Element(elem));
}

fn spec_version() -> Element {
    let mut spec = Element::new("specVersion");
    text_child(&mut spec, "major", "1");
    text_child(&mut spec, "minor", "0");
    spec
}

fn write_document(root: &Element) -> Result<String, xmltree::Error> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    root.write_with_config(&mut buf, config)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
