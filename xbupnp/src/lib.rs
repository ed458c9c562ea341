//! # xbupnp - Briques UPnP du serveur XBVR
//!
//! - [`soap`] : lecture des requêtes de contrôle, réponses et SOAP faults
//! - [`ActionError`] : erreurs d'action avec leur code UPnP
//! - [`devices`] : description XML du device et des services (SCPD)
//! - [`ssdp`] : annonces et réponses de découverte

pub mod devices;
mod errors;
pub mod soap;
pub mod ssdp;

pub use errors::ActionError;

/// Content-Type des réponses SOAP et des descriptions
pub const TEXT_XML_UTF8: &str = "text/xml; charset=\"utf-8\"";
