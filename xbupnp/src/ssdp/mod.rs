//! # Module SSDP - Simple Service Discovery Protocol
//!
//! Annonce du MediaServer sur le réseau local :
//!
//! - NOTIFY `ssdp:alive` au démarrage puis toutes les `MAX_AGE/2` secondes
//! - réponse unicast aux M-SEARCH
//! - NOTIFY `ssdp:byebye` à l'arrêt
//!
//! ## Constantes SSDP
//!
//! - **Multicast Address**: 239.255.255.250:1900
//! - **Max-Age**: 1800 secondes

mod device;
mod server;

pub use device::SsdpDevice;
pub use server::SsdpServer;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// Adresse multicast SSDP
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port SSDP
pub const SSDP_PORT: u16 = 1900;

/// Durée de validité des annonces (en secondes)
pub const MAX_AGE: u32 = 1800;

fn multicast_target() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(SSDP_MULTICAST_ADDR, SSDP_PORT))
}

fn alive_message(device: &SsdpDevice, nt: &str) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         CACHE-CONTROL: max-age={}\r\n\
         LOCATION: {}\r\n\
         NT: {}\r\n\
         NTS: ssdp:alive\r\n\
         SERVER: {}\r\n\
         USN: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR,
        SSDP_PORT,
        MAX_AGE,
        device.location,
        nt,
        device.server,
        device.usn(nt)
    )
}

fn byebye_message(device: &SsdpDevice, nt: &str) -> String {
    format!(
        "NOTIFY * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         NT: {}\r\n\
         NTS: ssdp:byebye\r\n\
         USN: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR,
        SSDP_PORT,
        nt,
        device.usn(nt)
    )
}

fn search_response(device: &SsdpDevice, st: &str) -> String {
    let date = chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S GMT");
    format!(
        "HTTP/1.1 200 OK\r\n\
         CACHE-CONTROL: max-age={}\r\n\
         DATE: {}\r\n\
         EXT:\r\n\
         LOCATION: {}\r\n\
         SERVER: {}\r\n\
         ST: {}\r\n\
         USN: {}\r\n\
         \r\n",
        MAX_AGE,
        date,
        device.location,
        device.server,
        st,
        device.usn(st)
    )
}

/// Extrait le champ ST d'un M-SEARCH
fn parse_search_target(data: &str) -> Option<String> {
    if !data.starts_with("M-SEARCH") {
        return None;
    }
    data.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case("ST")
            .then(|| value.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> SsdpDevice {
        SsdpDevice::new(
            "1234".to_string(),
            "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
            "http://192.168.1.2:9999/rootDesc.xml".to_string(),
            "Linux UPnP/1.0 XBVR/0.1".to_string(),
        )
    }

    #[test]
    fn test_parse_search_target() {
        let msg = "M-SEARCH * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nMAN: \"ssdp:discover\"\r\nst: ssdp:all\r\nMX: 2\r\n\r\n";
        assert_eq!(parse_search_target(msg).as_deref(), Some("ssdp:all"));
        assert_eq!(parse_search_target("NOTIFY * HTTP/1.1\r\nST: x\r\n"), None);
    }

    #[test]
    fn test_messages() {
        let d = device();
        let alive = alive_message(&d, "upnp:rootdevice");
        assert!(alive.contains("NTS: ssdp:alive\r\n"));
        assert!(alive.contains("LOCATION: http://192.168.1.2:9999/rootDesc.xml\r\n"));
        assert!(alive.ends_with("\r\n\r\n"));

        let bye = byebye_message(&d, "uuid:1234");
        assert!(bye.contains("NTS: ssdp:byebye\r\n"));
        assert!(bye.contains("USN: uuid:1234\r\n"));

        let resp = search_response(&d, "upnp:rootdevice");
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(resp.contains("ST: upnp:rootdevice\r\n"));
    }
}
