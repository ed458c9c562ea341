//! Chaînes protocolInfo DLNA

use std::fmt;
use std::time::Duration;

/// protocolInfo d'une vignette JPEG (items issus du système de fichiers)
pub const JPEG_TN_PROTOCOL_INFO: &str = "http-get:*:image/jpeg:DLNA.ORG_PN=JPEG_TN";

/// protocolInfo de la vignette d'une scène
pub const JPEG_MED_PROTOCOL_INFO: &str = "http-get:*:image/jpeg:DLNA.ORG_PN=JPEG_MED";

const DLNA_ORG_FLAGS: &str = "01700000000000000000000000000000";

/// Paramètres DLNA de la 4e partie d'un protocolInfo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFeatures {
    /// Profil DLNA (`DLNA.ORG_PN`)
    pub profile_name: Option<String>,
    /// Seek temporel (`DLNA.ORG_OP`, premier bit)
    pub support_time_seek: bool,
    /// Requêtes par plage d'octets (`DLNA.ORG_OP`, second bit)
    pub support_range: bool,
    /// Flux converti (`DLNA.ORG_CI`)
    pub transcoded: bool,
}

impl ContentFeatures {
    pub fn byte_range() -> Self {
        Self {
            support_range: true,
            ..Default::default()
        }
    }
}

impl fmt::Display for ContentFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pn) = &self.profile_name {
            write!(f, "DLNA.ORG_PN={};", pn)?;
        }
        write!(
            f,
            "DLNA.ORG_OP={}{};DLNA.ORG_CI={};DLNA.ORG_FLAGS={}",
            self.support_time_seek as u8,
            self.support_range as u8,
            self.transcoded as u8,
            DLNA_ORG_FLAGS
        )
    }
}

/// Construit un protocolInfo `http-get:*:{mime}:{features}`
pub fn protocol_info(mime: &str, features: &ContentFeatures) -> String {
    format!("http-get:*:{}:{}", mime, features)
}

/// Formate une durée au format `H:MM:SS[.F]` attendu par l'attribut `duration`
///
/// Les zéros terminaux de la partie fractionnaire sont supprimés, ainsi que le
/// point s'il ne reste rien derrière.
pub fn format_duration_sexagesimal(d: Duration) -> String {
    let total = d.as_secs();
    let ret = format!(
        "{}:{:02}:{:02}.{:09}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        d.subsec_nanos()
    );
    ret.trim_end_matches('0').trim_end_matches('.').to_string()
}
