//! Construction de réponses SOAP

use super::{text_element, write_envelope};
use xmltree::{Element, XMLNode};

/// Construit une réponse SOAP UPnP
///
/// Les valeurs sont écrites dans l'ordre fourni, qui doit suivre l'ordre des
/// arguments `out` déclaré dans le SCPD.
///
/// # Arguments
///
/// * `service_urn` - URN du service (ex: "urn:schemas-upnp-org:service:ContentDirectory:1")
/// * `action` - Nom de l'action (ex: "Browse")
/// * `values` - Arguments de sortie `(nom, valeur)`
pub fn build_soap_response(
    service_urn: &str,
    action: &str,
    values: Vec<(String, String)>,
) -> Result<String, xmltree::Error> {
    let mut response_elem = Element::new(&format!("u:{}Response", action));
    response_elem
        .attributes
        .insert("xmlns:u".to_string(), service_urn.to_string());

    for (key, value) in values {
        response_elem
            .children
            .push(XMLNode::Element(text_element(&key, &value)));
    }

    write_envelope(response_elem, true)
}
