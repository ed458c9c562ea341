//! # Module SOAP
//!
//! Transport des actions UPnP : lecture de l'action et de ses arguments depuis
//! l'enveloppe reçue, construction de la réponse `u:{Action}Response` ou d'un
//! SOAP fault portant un `UPnPError`.
//!
//! ## Example
//!
//! ```
//! use xbupnp::soap::{build_soap_response, parse_soap_action};
//!
//! let body = r#"<?xml version="1.0"?>
//! <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
//!   <s:Body>
//!     <u:GetSystemUpdateID xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"/>
//!   </s:Body>
//! </s:Envelope>"#;
//!
//! let action = parse_soap_action(body.as_bytes()).unwrap();
//! assert_eq!(action.name, "GetSystemUpdateID");
//!
//! let xml = build_soap_response(
//!     "urn:schemas-upnp-org:service:ContentDirectory:1",
//!     "GetSystemUpdateID",
//!     vec![("Id".to_string(), "3".to_string())],
//! )
//! .unwrap();
//! assert!(xml.contains("<Id>3</Id>"));
//! ```

mod builder;
mod fault;
mod parser;

pub use builder::build_soap_response;
pub use fault::build_soap_fault;
pub use parser::{SoapAction, SoapParseError, parse_soap_action};

const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SOAP_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Codes d'erreur UPnP utilisés par les services du serveur
pub mod error_codes {
    /// Action invalide
    pub const INVALID_ACTION: &str = "401";

    /// Arguments invalides
    pub const INVALID_ARGS: &str = "402";

    /// Action échouée
    pub const ACTION_FAILED: &str = "501";

    /// Valeur d'argument invalide
    pub const ARGUMENT_VALUE_INVALID: &str = "600";

    /// Référence de connexion inconnue (ConnectionManager)
    pub const INVALID_CONNECTION_REFERENCE: &str = "706";

    /// Objet inexistant (ContentDirectory)
    pub const NO_SUCH_OBJECT: &str = "701";
}

/// Enveloppe `s:Envelope` / `s:Body` autour d'un élément, sérialisée
fn write_envelope(
    body_child: xmltree::Element,
    encoding_style: bool,
) -> Result<String, xmltree::Error> {
    use xmltree::{Element, XMLNode};

    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    let mut envelope = Element::new("s:Envelope");
    envelope
        .attributes
        .insert("xmlns:s".to_string(), SOAP_ENVELOPE_NS.to_string());
    if encoding_style {
        envelope
            .attributes
            .insert("s:encodingStyle".to_string(), SOAP_ENCODING_NS.to_string());
    }
    envelope.children.push(XMLNode::Element(body));

    let mut buf = Vec::new();
    let config = xmltree::EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    envelope.write_with_config(&mut buf, config)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Élément texte simple `<name>value</name>`
fn text_element(name: &str, value: &str) -> xmltree::Element {
    let mut elem = xmltree::Element::new(name);
    elem.children
        .push(xmltree::XMLNode::Text(value.to_string()));
    elem
}
