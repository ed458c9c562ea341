use crate::soap::{build_soap_fault, error_codes};

/// Erreur renvoyée par une action UPnP
///
/// Chaque variante correspond à un code d'erreur UPnP précis ; le transport
/// SOAP la convertit en fault via [`ActionError::to_soap_fault`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("Invalid Action")]
    InvalidAction,

    #[error("Invalid Args: {0}")]
    InvalidArgs(String),

    #[error("Action Failed: {0}")]
    ActionFailed(String),

    #[error("{0}")]
    ArgumentValueInvalid(String),

    #[error("No such object: {0}")]
    NoSuchObject(String),

    #[error("Invalid connection reference: {0}")]
    InvalidConnectionReference(String),
}

const FALLBACK_FAULT: &str = "<?xml version=\"1.0\"?><s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\"><s:Body><s:Fault><faultcode>s:Server</faultcode><faultstring>Internal Error</faultstring></s:Fault></s:Body></s:Envelope>";

impl ActionError {
    /// Code d'erreur UPnP
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::InvalidAction => error_codes::INVALID_ACTION,
            ActionError::InvalidArgs(_) => error_codes::INVALID_ARGS,
            ActionError::ActionFailed(_) => error_codes::ACTION_FAILED,
            ActionError::ArgumentValueInvalid(_) => error_codes::ARGUMENT_VALUE_INVALID,
            ActionError::NoSuchObject(_) => error_codes::NO_SUCH_OBJECT,
            ActionError::InvalidConnectionReference(_) => {
                error_codes::INVALID_CONNECTION_REFERENCE
            }
        }
    }

    /// Enveloppe SOAP fault complète (`s:Client` / `UPnPError`)
    pub fn to_soap_fault(&self) -> String {
        build_soap_fault("s:Client", "UPnPError", Some(self.code()), Some(&self.to_string()))
            .unwrap_or_else(|_| FALLBACK_FAULT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ActionError::InvalidAction.code(), "401");
        assert_eq!(ActionError::InvalidArgs("x".into()).code(), "402");
        assert_eq!(ActionError::ActionFailed("x".into()).code(), "501");
        assert_eq!(ActionError::ArgumentValueInvalid("x".into()).code(), "600");
        assert_eq!(ActionError::NoSuchObject("x".into()).code(), "701");
        assert_eq!(ActionError::InvalidConnectionReference("x".into()).code(), "706");
    }

    #[test]
    fn test_fault_carries_description() {
        let xml = ActionError::ArgumentValueInvalid("unhandled browse flag: BrowseMetadata".into())
            .to_soap_fault();

        assert!(xml.contains("<faultcode>s:Client</faultcode>"));
        assert!(xml.contains("<errorCode>600</errorCode>"));
        assert!(xml.contains("unhandled browse flag: BrowseMetadata"));
    }
}
