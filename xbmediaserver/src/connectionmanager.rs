//! Service ConnectionManager
//!
//! Le serveur ne gère qu'une connexion implicite d'identifiant 0, en sortie.

use crate::content_handler::ActionOutput;
use crate::transcode::PROFILES;
use std::collections::HashMap;
use tracing::debug;
use xbupnp::ActionError;

pub const CONNECTION_MANAGER_URN: &str = "urn:schemas-upnp-org:service:ConnectionManager:1";

/// Types MIME servis directement
const SOURCE_MIME_TYPES: &[&str] = &[
    "video/mp4",
    "video/x-matroska",
    "video/webm",
    "video/quicktime",
    "video/x-msvideo",
    "image/jpeg",
];

/// Valeur `Source` de `GetProtocolInfo`
pub fn source_protocol_info() -> String {
    let mut mimes: Vec<&str> = SOURCE_MIME_TYPES.to_vec();
    for profile in PROFILES {
        if !mimes.contains(&profile.mime) {
            mimes.push(profile.mime);
        }
    }
    mimes
        .iter()
        .map(|m| format!("http-get:*:{}:*", m))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionManager;

impl ConnectionManager {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(
        &self,
        action: &str,
        args: &HashMap<String, String>,
    ) -> Result<ActionOutput, ActionError> {
        debug!(action = %action, "ConnectionManager action");

        let pairs: Vec<(&str, String)> = match action {
            "GetProtocolInfo" => vec![("Source", source_protocol_info()), ("Sink", String::new())],
            "GetCurrentConnectionIDs" => vec![("ConnectionIDs", "0".to_string())],
            "GetCurrentConnectionInfo" => {
                let id = args.get("ConnectionID").map(|s| s.trim()).unwrap_or("");
                if id != "0" {
                    return Err(ActionError::InvalidConnectionReference(id.to_string()));
                }
                vec![
                    ("RcsID", "-1".to_string()),
                    ("AVTransportID", "-1".to_string()),
                    ("ProtocolInfo", String::new()),
                    ("PeerConnectionManager", String::new()),
                    ("PeerConnectionID", "-1".to_string()),
                    ("Direction", "Output".to_string()),
                    ("Status", "OK".to_string()),
                ]
            }
            _ => return Err(ActionError::InvalidAction),
        };

        Ok(pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_protocol_info() {
        let out = ConnectionManager::new()
            .handle("GetProtocolInfo", &HashMap::new())
            .unwrap();
        assert_eq!(out[0].0, "Source");
        assert!(out[0].1.contains("http-get:*:video/mp4:*"));
        assert!(out[0].1.contains("http-get:*:video/mpeg:*"));
        assert_eq!(out[1], ("Sink".to_string(), String::new()));
    }

    #[test]
    fn test_connection_info() {
        let cm = ConnectionManager::new();
        let out = cm
            .handle("GetCurrentConnectionInfo", &args(&[("ConnectionID", "0")]))
            .unwrap();
        assert_eq!(out.len(), 7);
        assert_eq!(out[5], ("Direction".to_string(), "Output".to_string()));

        let err = cm
            .handle("GetCurrentConnectionInfo", &args(&[("ConnectionID", "3")]))
            .unwrap_err();
        assert_eq!(err.code(), "706");
    }

    #[test]
    fn test_unknown_action() {
        let err = ConnectionManager::new()
            .handle("PrepareForConnection", &HashMap::new())
            .unwrap_err();
        assert_eq!(err, ActionError::InvalidAction);
    }
}
