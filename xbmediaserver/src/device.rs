//! Définition du device MediaServer
//!
//! - Device Type : `urn:schemas-upnp-org:device:MediaServer:1`
//! - Services : ContentDirectory:1, ConnectionManager:1

use crate::connectionmanager::CONNECTION_MANAGER_URN;
use crate::content_handler::CONTENT_DIRECTORY_URN;
use crate::options::MediaServerOptions;
use xbupnp::devices::{DeviceDescription, IconDescription, ServiceDescription};
use xbupnp::ssdp::SsdpDevice;

pub const MEDIA_SERVER_DEVICE_TYPE: &str = "urn:schemas-upnp-org:device:MediaServer:1";

pub const ROOT_DESC_PATH: &str = "/rootDesc.xml";

pub const DEVICE_ICONS_PATH: &str = "/icons";

/// Icônes PNG du device, par taille
pub const DEVICE_ICONS: [(u32, &[u8]); 2] = [
    (48, include_bytes!("../assets/icon-48.png")),
    (128, include_bytes!("../assets/icon-128.png")),
];

/// Icône de `size` pixels de côté, si elle existe
pub fn device_icon(size: u32) -> Option<&'static [u8]> {
    DEVICE_ICONS
        .iter()
        .find(|(s, _)| *s == size)
        .map(|(_, bytes)| *bytes)
}

fn icon_descriptions() -> Vec<IconDescription> {
    DEVICE_ICONS
        .iter()
        .map(|(size, _)| IconDescription {
            mimetype: "image/png".to_string(),
            width: *size,
            height: *size,
            depth: 8,
            url: format!("{}/{}.png", DEVICE_ICONS_PATH, size),
        })
        .collect()
}

pub fn media_server_description(options: &MediaServerOptions) -> DeviceDescription {
    DeviceDescription {
        device_type: MEDIA_SERVER_DEVICE_TYPE.to_string(),
        friendly_name: options.friendly_name.clone(),
        manufacturer: "XBVR".to_string(),
        manufacturer_url: Some("https://github.com/xbapps/xbvr".to_string()),
        model_name: "XBVR Media Server".to_string(),
        model_description: Some("DLNA MediaServer for VR scenes".to_string()),
        model_number: Some(env!("CARGO_PKG_VERSION").to_string()),
        udn: options.udn.clone(),
        services: vec![
            ServiceDescription::standard("ContentDirectory"),
            ServiceDescription::standard("ConnectionManager"),
        ],
        icons: icon_descriptions(),
        presentation_url: Some("/".to_string()),
    }
}

/// Annonce SSDP du device, `base_url` étant l'URL HTTP publique du serveur
pub fn ssdp_device(options: &MediaServerOptions, base_url: &str) -> SsdpDevice {
    SsdpDevice::new(
        options.udn.clone(),
        MEDIA_SERVER_DEVICE_TYPE.to_string(),
        format!("{}{}", base_url.trim_end_matches('/'), ROOT_DESC_PATH),
        format!("XBVR/{} UPnP/1.0 DLNADOC/1.50", env!("CARGO_PKG_VERSION")),
    )
    .with_service(CONTENT_DIRECTORY_URN)
    .with_service(CONNECTION_MANAGER_URN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description() {
        let options = MediaServerOptions {
            friendly_name: "My VR".to_string(),
            udn: "1234".to_string(),
            ..Default::default()
        };
        let xml = media_server_description(&options).to_xml().unwrap();
        assert!(xml.contains("<friendlyName>My VR</friendlyName>"));
        assert!(xml.contains("<UDN>uuid:1234</UDN>"));
        assert!(xml.contains(CONTENT_DIRECTORY_URN));
        assert!(xml.contains("<controlURL>/ctl/ConnectionManager</controlURL>"));
        assert!(xml.contains("<url>/icons/48.png</url>"));
        assert!(xml.contains("<url>/icons/128.png</url>"));
    }

    #[test]
    fn test_device_icons_are_png() {
        for (size, bytes) in DEVICE_ICONS {
            assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"), "icon {}", size);
        }
        assert!(device_icon(128).is_some());
        assert!(device_icon(64).is_none());
    }

    #[test]
    fn test_ssdp_device() {
        let device = ssdp_device(&MediaServerOptions::default(), "http://10.0.0.1:9999/");
        assert_eq!(device.location, "http://10.0.0.1:9999/rootDesc.xml");
        assert!(
            device
                .notification_types
                .iter()
                .any(|nt| nt == CONNECTION_MANAGER_URN)
        );
    }
}
