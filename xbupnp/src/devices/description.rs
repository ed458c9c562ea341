use super::{spec_version, text_child, write_document};
use xmltree::{Element, XMLNode};

/// Service déclaré dans la description du device
#[derive(Debug, Clone)]
pub struct ServiceDescription {
    /// ex: "urn:schemas-upnp-org:service:ContentDirectory:1"
    pub service_type: String,
    /// ex: "urn:upnp-org:serviceId:ContentDirectory"
    pub service_id: String,
    pub scpd_url: String,
    pub control_url: String,
    pub event_sub_url: String,
}

impl ServiceDescription {
    /// Service standard `urn:schemas-upnp-org:service:{name}:1` monté sous
    /// `/scpd/{name}.xml`, `/ctl/{name}` et `/evt/{name}`
    pub fn standard(name: &str) -> Self {
        Self {
            service_type: format!("urn:schemas-upnp-org:service:{}:1", name),
            service_id: format!("urn:upnp-org:serviceId:{}", name),
            scpd_url: format!("/scpd/{}.xml", name),
            control_url: format!("/ctl/{}", name),
            event_sub_url: format!("/evt/{}", name),
        }
    }

    fn to_xml_element(&self) -> Element {
        let mut elem = Element::new("service");
        text_child(&mut elem, "serviceType", &self.service_type);
        text_child(&mut elem, "serviceId", &self.service_id);
        text_child(&mut elem, "SCPDURL", &self.scpd_url);
        text_child(&mut elem, "controlURL", &self.control_url);
        text_child(&mut elem, "eventSubURL", &self.event_sub_url);
        elem
    }
}

/// Icône annoncée par le device
#[derive(Debug, Clone)]
pub struct IconDescription {
    pub mimetype: String,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub url: String,
}

impl IconDescription {
    fn to_xml_element(&self) -> Element {
        let mut elem = Element::new("icon");
        text_child(&mut elem, "mimetype", &self.mimetype);
        text_child(&mut elem, "width", &self.width.to_string());
        text_child(&mut elem, "height", &self.height.to_string());
        text_child(&mut elem, "depth", &self.depth.to_string());
        text_child(&mut elem, "url", &self.url);
        elem
    }
}

/// Description du device racine (`rootDesc.xml`)
#[derive(Debug, Clone)]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub manufacturer_url: Option<String>,
    pub model_name: String,
    pub model_description: Option<String>,
    pub model_number: Option<String>,
    /// UDN sans préfixe `uuid:`
    pub udn: String,
    pub services: Vec<ServiceDescription>,
    pub icons: Vec<IconDescription>,
    pub presentation_url: Option<String>,
}

impl DeviceDescription {
    fn device_element(&self) -> Element {
        let mut elem = Element::new("device");

        let mut dlna_doc = Element::new("dlna:X_DLNADOC");
        dlna_doc.attributes.insert(
            "xmlns:dlna".to_string(),
            "urn:schemas-dlna-org:device-1-0".to_string(),
        );
        dlna_doc
            .children
            .push(XMLNode::Text("DMS-1.50".to_string()));
        elem.children.push(XMLNode::Element(dlna_doc));

        text_child(&mut elem, "deviceType", &self.device_type);
        text_child(&mut elem, "friendlyName", &self.friendly_name);
        text_child(&mut elem, "manufacturer", &self.manufacturer);
        if let Some(url) = &self.manufacturer_url {
            text_child(&mut elem, "manufacturerURL", url);
        }
        if let Some(desc) = &self.model_description {
            text_child(&mut elem, "modelDescription", desc);
        }
        text_child(&mut elem, "modelName", &self.model_name);
        if let Some(number) = &self.model_number {
            text_child(&mut elem, "modelNumber", number);
        }
        text_child(&mut elem, "UDN", &format!("uuid:{}", self.udn));

        if !self.icons.is_empty() {
            let mut icon_list = Element::new("iconList");
            for icon in &self.icons {
                icon_list
                    .children
                    .push(XMLNode::Element(icon.to_xml_element()));
            }
            elem.children.push(XMLNode::Element(icon_list));
        }

        if !self.services.is_empty() {
            let mut service_list = Element::new("serviceList");
            for service in &self.services {
                service_list
                    .children
                    .push(XMLNode::Element(service.to_xml_element()));
            }
            elem.children.push(XMLNode::Element(service_list));
        }

        if let Some(url) = &self.presentation_url {
            text_child(&mut elem, "presentationURL", url);
        }

        elem
    }

    /// Document XML complet
    pub fn to_xml(&self) -> Result<String, xmltree::Error> {
        let mut root = Element::new("root");
        root.attributes.insert(
            "xmlns".to_string(),
            "urn:schemas-upnp-org:device-1-0".to_string(),
        );
        root.children.push(XMLNode::Element(spec_version()));
        root.children.push(XMLNode::Element(self.device_element()));
        write_document(&root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_server_description() {
        let desc = DeviceDescription {
            device_type: "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
            friendly_name: "XBVR".to_string(),
            manufacturer: "XBVR".to_string(),
            manufacturer_url: None,
            model_name: "XBVR".to_string(),
            model_description: None,
            model_number: Some("1".to_string()),
            udn: "abcd".to_string(),
            services: vec![ServiceDescription::standard("ContentDirectory")],
            icons: vec![IconDescription {
                mimetype: "image/png".to_string(),
                width: 48,
                height: 48,
                depth: 8,
                url: "/deviceIcon/48".to_string(),
            }],
            presentation_url: None,
        };

        let xml = desc.to_xml().unwrap();
        assert!(xml.contains("<friendlyName>XBVR</friendlyName>"));
        assert!(xml.contains("<UDN>uuid:abcd</UDN>"));
        assert!(xml.contains("<SCPDURL>/scpd/ContentDirectory.xml</SCPDURL>"));
        assert!(xml.contains("<controlURL>/ctl/ContentDirectory</controlURL>"));
        assert!(xml.contains("<width>48</width>"));
        assert!(!xml.contains("presentationURL"));
    }
}
