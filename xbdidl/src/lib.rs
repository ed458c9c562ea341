//! # xbdidl - Modèle DIDL-Lite
//!
//! Objets DIDL-Lite (containers et items) utilisés par le ContentDirectory,
//! écrivain DIDL-Lite qui préserve l'ordre des objets, et parser pour relire
//! un document produit par un serveur.
//!
//! ## Example
//!
//! ```
//! use xbdidl::{Container, DidlObject, to_didl_lite};
//!
//! let root = Container::storage_folder("%2Fall", "0", "all");
//! let xml = to_didl_lite(&[DidlObject::Container(root)]).unwrap();
//! assert!(xml.contains(r#"<container id="%2Fall" parentID="0""#));
//! ```

pub mod protocol;

pub use protocol::{ContentFeatures, format_duration_sexagesimal, protocol_info};

use serde::{Deserialize, Serialize};

/// Namespace racine DIDL-Lite
pub const DIDL_LITE_NS: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
/// Namespace Dublin Core
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
/// Namespace UPnP
pub const UPNP_NS: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";
/// Namespace DLNA
pub const DLNA_NS: &str = "urn:schemas-dlna-org:metadata-1-0/";

/// Classe UPnP des dossiers
pub const STORAGE_FOLDER_CLASS: &str = "object.container.storageFolder";
/// Classe UPnP des vidéos
pub const VIDEO_ITEM_CLASS: &str = "object.item.videoItem";

/// Erreurs de sérialisation / désérialisation DIDL-Lite
#[derive(Debug, thiserror::Error)]
pub enum DidlError {
    #[error("Failed to serialize DIDL-Lite object: {0}")]
    Serialize(#[from] quick_xml::se::SeError),

    #[error("Failed to parse DIDL-Lite document: {0}")]
    Parse(#[from] quick_xml::de::DeError),
}

/// Racine d'un document DIDL-Lite (utilisée pour la lecture)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename = "DIDL-Lite")]
pub struct DIDLLite {
    #[serde(rename = "@xmlns", default)]
    pub xmlns: Option<String>,

    #[serde(rename = "container", default)]
    pub containers: Vec<Container>,

    #[serde(rename = "item", default)]
    pub items: Vec<Item>,
}

impl DIDLLite {
    /// Parse un document DIDL-Lite
    pub fn parse(input: &str) -> Result<Self, DidlError> {
        Ok(quick_xml::de::from_str(input)?)
    }
}

/// Container navigable (dossier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "container")]
pub struct Container {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@parentID")]
    pub parent_id: String,

    #[serde(rename = "@restricted", skip_serializing_if = "Option::is_none", default)]
    pub restricted: Option<String>,

    #[serde(rename = "@childCount", skip_serializing_if = "Option::is_none", default)]
    pub child_count: Option<u32>,

    #[serde(rename = "dc:title", alias = "title")]
    pub title: String,

    #[serde(rename = "upnp:class", alias = "class")]
    pub class: String,
}

impl Container {
    /// Crée un dossier en lecture seule (`object.container.storageFolder`)
    pub fn storage_folder(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            restricted: Some("1".to_string()),
            child_count: None,
            title: title.into(),
            class: STORAGE_FOLDER_CLASS.to_string(),
        }
    }
}

/// Item jouable (scène, fichier)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "item")]
pub struct Item {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "@parentID")]
    pub parent_id: String,

    #[serde(rename = "@restricted", skip_serializing_if = "Option::is_none", default)]
    pub restricted: Option<String>,

    #[serde(rename = "dc:title", alias = "title")]
    pub title: String,

    #[serde(rename = "upnp:class", alias = "class")]
    pub class: String,

    #[serde(
        rename = "upnp:icon",
        alias = "icon",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub icon: Option<String>,

    #[serde(
        rename = "upnp:albumArtURI",
        alias = "albumArtURI",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub album_art: Option<String>,

    #[serde(rename = "res", default)]
    pub resources: Vec<Resource>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        title: impl Into<String>,
        class: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            restricted: Some("1".to_string()),
            title: title.into(),
            class: class.into(),
            icon: None,
            album_art: None,
            resources: Vec::new(),
        }
    }
}

/// Représentation jouable d'un item (fichier original, transcodage, vignette)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "@protocolInfo")]
    pub protocol_info: String,

    #[serde(rename = "@size", skip_serializing_if = "Option::is_none", default)]
    pub size: Option<u64>,

    #[serde(rename = "@bitrate", skip_serializing_if = "Option::is_none", default)]
    pub bitrate: Option<u32>,

    #[serde(rename = "@duration", skip_serializing_if = "Option::is_none", default)]
    pub duration: Option<String>,

    #[serde(rename = "@resolution", skip_serializing_if = "Option::is_none", default)]
    pub resolution: Option<String>,

    #[serde(rename = "$text")]
    pub url: String,
}

impl Resource {
    pub fn new(url: impl Into<String>, protocol_info: impl Into<String>) -> Self {
        Self {
            protocol_info: protocol_info.into(),
            size: None,
            bitrate: None,
            duration: None,
            resolution: None,
            url: url.into(),
        }
    }
}

/// Objet UPnP : container ou item
#[derive(Debug, Clone, PartialEq)]
pub enum DidlObject {
    Container(Container),
    Item(Item),
}

impl DidlObject {
    pub fn id(&self) -> &str {
        match self {
            DidlObject::Container(c) => &c.id,
            DidlObject::Item(i) => &i.id,
        }
    }

    pub fn parent_id(&self) -> &str {
        match self {
            DidlObject::Container(c) => &c.parent_id,
            DidlObject::Item(i) => &i.parent_id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            DidlObject::Container(c) => &c.title,
            DidlObject::Item(i) => &i.title,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, DidlObject::Container(_))
    }

    fn to_xml(&self) -> Result<String, DidlError> {
        let fragment = match self {
            DidlObject::Container(c) => quick_xml::se::to_string(c)?,
            DidlObject::Item(i) => quick_xml::se::to_string(i)?,
        };
        Ok(fragment)
    }
}

impl From<Container> for DidlObject {
    fn from(c: Container) -> Self {
        DidlObject::Container(c)
    }
}

impl From<Item> for DidlObject {
    fn from(i: Item) -> Self {
        DidlObject::Item(i)
    }
}

/// Sérialise une liste d'objets dans une enveloppe DIDL-Lite
///
/// Les objets sont écrits dans l'ordre reçu, containers et items mélangés.
pub fn to_didl_lite(objects: &[DidlObject]) -> Result<String, DidlError> {
    let mut out = String::with_capacity(256 + objects.len() * 512);
    out.push_str(&format!(
        r#"<DIDL-Lite xmlns="{}" xmlns:dc="{}" xmlns:upnp="{}" xmlns:dlna="{}">"#,
        DIDL_LITE_NS, DC_NS, UPNP_NS, DLNA_NS
    ));
    for object in objects {
        out.push_str(&object.to_xml()?);
    }
    out.push_str("</DIDL-Lite>");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        let mut item = Item::new("%2Fall%2Fabc", "%2Fall", "Jane - Title", VIDEO_ITEM_CLASS);
        item.icon = Some("http://host/icon?scene=abc&c=jpeg".to_string());
        let mut res = Resource::new(
            "http://host/res?scene=abc",
            "http-get:*:video/mp4:DLNA.ORG_OP=01",
        );
        res.size = Some(1024);
        res.bitrate = Some(8000);
        item.resources.push(res);
        item
    }

    #[test]
    fn test_empty_document() {
        let xml = to_didl_lite(&[]).unwrap();
        assert!(xml.starts_with("<DIDL-Lite xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\""));
        assert!(xml.ends_with("</DIDL-Lite>"));
    }

    #[test]
    fn test_container_serialization() {
        let mut c = Container::storage_folder("%2Ftags", "0", "tags");
        c.child_count = Some(3);
        let xml = to_didl_lite(&[c.into()]).unwrap();

        assert!(xml.contains(r#"<container id="%2Ftags" parentID="0" restricted="1" childCount="3">"#));
        assert!(xml.contains("<dc:title>tags</dc:title>"));
        assert!(xml.contains("<upnp:class>object.container.storageFolder</upnp:class>"));
    }

    #[test]
    fn test_item_escapes_urls() {
        let xml = to_didl_lite(&[sample_item().into()]).unwrap();

        assert!(xml.contains("<item id=\"%2Fall%2Fabc\""));
        assert!(xml.contains("http://host/icon?scene=abc&amp;c=jpeg"));
        assert!(xml.contains(r#"size="1024""#));
        assert!(xml.contains(r#"bitrate="8000""#));
        assert!(!xml.contains("duration="));
    }

    #[test]
    fn test_writer_preserves_order() {
        let objects: Vec<DidlObject> = vec![
            Container::storage_folder("%2Fb", "0", "b").into(),
            sample_item().into(),
            Container::storage_folder("%2Fa", "0", "a").into(),
        ];
        let xml = to_didl_lite(&objects).unwrap();

        let b = xml.find("id=\"%2Fb\"").unwrap();
        let item = xml.find("<item").unwrap();
        let a = xml.find("id=\"%2Fa\"").unwrap();
        assert!(b < item && item < a);
    }

    #[test]
    fn test_parse_written_document() {
        let objects: Vec<DidlObject> = vec![
            Container::storage_folder("%2Fsites", "0", "sites").into(),
            sample_item().into(),
        ];
        let xml = to_didl_lite(&objects).unwrap();
        let didl = DIDLLite::parse(&xml).unwrap();

        assert_eq!(didl.containers.len(), 1);
        assert_eq!(didl.containers[0].title, "sites");
        assert_eq!(didl.items.len(), 1);
        assert_eq!(didl.items[0].resources[0].url, "http://host/res?scene=abc");
        assert_eq!(didl.items[0].resources[0].size, Some(1024));
    }
}
