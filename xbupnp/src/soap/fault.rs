//! Enveloppes `s:Fault`

use super::{text_element, write_envelope};
use xmltree::{Element, XMLNode};

const UPNP_CONTROL_NS: &str = "urn:schemas-upnp-org:control-1-0";

/// `<detail><UPnPError>…</UPnPError></detail>`
fn upnp_error_detail(code: &str, description: &str) -> Element {
    let mut error = Element::new("UPnPError");
    error
        .attributes
        .insert("xmlns".to_string(), UPNP_CONTROL_NS.to_string());
    for (name, value) in [("errorCode", code), ("errorDescription", description)] {
        error.children.push(XMLNode::Element(text_element(name, value)));
    }

    let mut detail = Element::new("detail");
    detail.children.push(XMLNode::Element(error));
    detail
}

/// Construit un SOAP Fault.
///
/// Le bloc `detail/UPnPError` n'est écrit que si le code UPnP et sa
/// description sont fournis tous les deux.
pub fn build_soap_fault(
    fault_code: &str,
    fault_string: &str,
    upnp_error_code: Option<&str>,
    upnp_error_desc: Option<&str>,
) -> Result<String, xmltree::Error> {
    let mut fault = Element::new("s:Fault");
    for (name, value) in [("faultcode", fault_code), ("faultstring", fault_string)] {
        fault.children.push(XMLNode::Element(text_element(name, value)));
    }
    if let (Some(code), Some(desc)) = (upnp_error_code, upnp_error_desc) {
        fault
            .children
            .push(XMLNode::Element(upnp_error_detail(code, desc)));
    }

    write_envelope(fault, false)
}
