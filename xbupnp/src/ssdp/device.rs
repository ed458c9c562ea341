//! Device annoncé par SSDP

/// Identité SSDP d'un device racine et des services qu'il expose
#[derive(Debug, Clone)]
pub struct SsdpDevice {
    /// UUID sans le préfixe `uuid:`
    pub uuid: String,
    pub device_type: String,
    /// URL absolue de la description du device
    pub location: String,
    /// En-tête `SERVER`
    pub server: String,
    /// NT annoncés, dans l'ordre : `uuid:{uuid}`, `upnp:rootdevice`, type du
    /// device, puis un par service
    pub notification_types: Vec<String>,
}

impl SsdpDevice {
    pub fn new(uuid: String, device_type: String, location: String, server: String) -> Self {
        let notification_types = vec![
            format!("uuid:{}", uuid),
            "upnp:rootdevice".to_string(),
            device_type.clone(),
        ];
        Self {
            uuid,
            device_type,
            location,
            server,
            notification_types,
        }
    }

    /// Ajoute le type d'un service exposé
    pub fn with_service(mut self, service_type: &str) -> Self {
        if !self.notification_types.iter().any(|nt| nt == service_type) {
            self.notification_types.push(service_type.to_string());
        }
        self
    }

    /// USN associé à un NT
    pub fn usn(&self, nt: &str) -> String {
        if nt.starts_with("uuid:") {
            nt.to_string()
        } else {
            format!("uuid:{}::{}", self.uuid, nt)
        }
    }

    /// NT à renvoyer pour le ST d'un M-SEARCH
    pub fn search_targets(&self, st: &str) -> Vec<&str> {
        if st == "ssdp:all" {
            self.notification_types.iter().map(String::as_str).collect()
        } else {
            self.notification_types
                .iter()
                .filter(|nt| *nt == st)
                .map(String::as_str)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CDS: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

    fn device() -> SsdpDevice {
        SsdpDevice::new(
            "1234".to_string(),
            "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
            "http://192.168.1.2:9999/rootDesc.xml".to_string(),
            "Linux UPnP/1.0 XBVR/0.1".to_string(),
        )
        .with_service(CDS)
        .with_service(CDS)
    }

    #[test]
    fn test_notification_types() {
        let d = device();
        assert_eq!(
            d.notification_types,
            vec![
                "uuid:1234",
                "upnp:rootdevice",
                "urn:schemas-upnp-org:device:MediaServer:1",
                CDS,
            ]
        );
    }

    #[test]
    fn test_usn() {
        let d = device();
        assert_eq!(d.usn("uuid:1234"), "uuid:1234");
        assert_eq!(d.usn("upnp:rootdevice"), "uuid:1234::upnp:rootdevice");
    }

    #[test]
    fn test_search_targets() {
        let d = device();
        assert_eq!(d.search_targets("ssdp:all").len(), 4);
        assert_eq!(d.search_targets(CDS), vec![CDS]);
        assert!(
            d.search_targets("urn:schemas-upnp-org:device:MediaRenderer:1")
                .is_empty()
        );
    }
}
