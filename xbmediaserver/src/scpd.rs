//! SCPD des deux services du MediaServer

use xbupnp::devices::{Scpd, ScpdAction, StateVariable};

pub fn content_directory_scpd() -> Scpd {
    Scpd {
        actions: vec![
            ScpdAction::new("GetSearchCapabilities").output("SearchCaps", "SearchCapabilities"),
            ScpdAction::new("GetSortCapabilities").output("SortCaps", "SortCapabilities"),
            ScpdAction::new("GetSystemUpdateID").output("Id", "SystemUpdateID"),
            ScpdAction::new("Browse")
                .input("ObjectID", "A_ARG_TYPE_ObjectID")
                .input("BrowseFlag", "A_ARG_TYPE_BrowseFlag")
                .input("Filter", "A_ARG_TYPE_Filter")
                .input("StartingIndex", "A_ARG_TYPE_Index")
                .input("RequestedCount", "A_ARG_TYPE_Count")
                .input("SortCriteria", "A_ARG_TYPE_SortCriteria")
                .output("Result", "A_ARG_TYPE_Result")
                .output("NumberReturned", "A_ARG_TYPE_Count")
                .output("TotalMatches", "A_ARG_TYPE_Count")
                .output("UpdateID", "A_ARG_TYPE_UpdateID"),
        ],
        state_variables: vec![
            StateVariable::new("SearchCapabilities", "string"),
            StateVariable::new("SortCapabilities", "string"),
            StateVariable::new("SystemUpdateID", "ui4").evented(),
            StateVariable::new("A_ARG_TYPE_ObjectID", "string"),
            StateVariable::new("A_ARG_TYPE_Result", "string"),
            StateVariable::new("A_ARG_TYPE_BrowseFlag", "string")
                .allowed(&["BrowseMetadata", "BrowseDirectChildren"]),
            StateVariable::new("A_ARG_TYPE_Filter", "string"),
            StateVariable::new("A_ARG_TYPE_SortCriteria", "string"),
            StateVariable::new("A_ARG_TYPE_Index", "ui4"),
            StateVariable::new("A_ARG_TYPE_Count", "ui4"),
            StateVariable::new("A_ARG_TYPE_UpdateID", "ui4"),
        ],
    }
}

pub fn connection_manager_scpd() -> Scpd {
    Scpd {
        actions: vec![
            ScpdAction::new("GetProtocolInfo")
                .output("Source", "SourceProtocolInfo")
                .output("Sink", "SinkProtocolInfo"),
            ScpdAction::new("GetCurrentConnectionIDs")
                .output("ConnectionIDs", "CurrentConnectionIDs"),
            ScpdAction::new("GetCurrentConnectionInfo")
                .input("ConnectionID", "A_ARG_TYPE_ConnectionID")
                .output("RcsID", "A_ARG_TYPE_RcsID")
                .output("AVTransportID", "A_ARG_TYPE_AVTransportID")
                .output("ProtocolInfo", "A_ARG_TYPE_ProtocolInfo")
                .output("PeerConnectionManager", "A_ARG_TYPE_ConnectionManager")
                .output("PeerConnectionID", "A_ARG_TYPE_ConnectionID")
                .output("Direction", "A_ARG_TYPE_Direction")
                .output("Status", "A_ARG_TYPE_ConnectionStatus"),
        ],
        state_variables: vec![
            StateVariable::new("SourceProtocolInfo", "string").evented(),
            StateVariable::new("SinkProtocolInfo", "string").evented(),
            StateVariable::new("CurrentConnectionIDs", "string").evented(),
            StateVariable::new("A_ARG_TYPE_ConnectionStatus", "string").allowed(&[
                "OK",
                "ContentFormatMismatch",
                "InsufficientBandwidth",
                "UnreliableChannel",
                "Unknown",
            ]),
            StateVariable::new("A_ARG_TYPE_ConnectionManager", "string"),
            StateVariable::new("A_ARG_TYPE_Direction", "string").allowed(&["Input", "Output"]),
            StateVariable::new("A_ARG_TYPE_ProtocolInfo", "string"),
            StateVariable::new("A_ARG_TYPE_ConnectionID", "i4"),
            StateVariable::new("A_ARG_TYPE_AVTransportID", "i4"),
            StateVariable::new("A_ARG_TYPE_RcsID", "i4"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_declares_all_arguments() {
        let xml = content_directory_scpd().to_xml().unwrap();
        for name in [
            "ObjectID",
            "BrowseFlag",
            "StartingIndex",
            "RequestedCount",
            "NumberReturned",
            "TotalMatches",
            "UpdateID",
        ] {
            assert!(xml.contains(&format!("<name>{}</name>", name)), "{}", name);
        }
        assert!(xml.contains("<allowedValue>BrowseDirectChildren</allowedValue>"));
    }

    #[test]
    fn test_connection_manager_scpd() {
        let xml = connection_manager_scpd().to_xml().unwrap();
        assert!(xml.contains("<name>GetCurrentConnectionInfo</name>"));
        assert!(xml.contains("<stateVariable sendEvents=\"yes\">"));
    }
}
