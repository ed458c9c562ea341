//! Variantes transcodées annoncées aux clients
//!
//! Le serveur ne fait qu'annoncer les variantes : l'URL `/res?...&transcode=`
//! est servie par un collaborateur externe.

use crate::urls::ResourceTarget;
use tracing::warn;
use xbdidl::{ContentFeatures, Resource, protocol_info};

/// Profil de transcodage connu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeProfile {
    pub name: &'static str,
    pub mime: &'static str,
    /// Profil DLNA (`DLNA.ORG_PN`) s'il y en a un
    pub dlna_profile: Option<&'static str>,
}

pub const PROFILES: &[TranscodeProfile] = &[
    TranscodeProfile {
        name: "t",
        mime: "video/mpeg",
        dlna_profile: Some("MPEG_PS_PAL"),
    },
    TranscodeProfile {
        name: "vp8",
        mime: "video/webm",
        dlna_profile: None,
    },
    TranscodeProfile {
        name: "chromecast",
        mime: "video/mp4",
        dlna_profile: None,
    },
    TranscodeProfile {
        name: "web",
        mime: "video/webm",
        dlna_profile: None,
    },
];

pub fn find_profile(name: &str) -> Option<&'static TranscodeProfile> {
    PROFILES.iter().find(|p| p.name == name)
}

/// Fournit les ressources transcodées d'un item vidéo
pub trait TranscodePlanner: Send + Sync {
    fn plan(
        &self,
        host: &str,
        target: &ResourceTarget,
        resolution: Option<&str>,
        duration: Option<&str>,
    ) -> Vec<Resource>;
}

/// Aucun transcodage
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranscode;

impl TranscodePlanner for NoTranscode {
    fn plan(&self, _: &str, _: &ResourceTarget, _: Option<&str>, _: Option<&str>) -> Vec<Resource> {
        Vec::new()
    }
}

/// Annonce une ressource par profil configuré
#[derive(Debug, Clone)]
pub struct ProfilePlanner {
    profiles: Vec<&'static TranscodeProfile>,
}

impl ProfilePlanner {
    /// Les noms inconnus sont ignorés
    pub fn new(names: &[String]) -> Self {
        let profiles = names
            .iter()
            .filter_map(|name| {
                let profile = find_profile(name);
                if profile.is_none() {
                    warn!(profile = %name, "Unknown transcode profile ignored");
                }
                profile
            })
            .collect();
        Self { profiles }
    }

    pub fn profiles(&self) -> &[&'static TranscodeProfile] {
        &self.profiles
    }
}

impl TranscodePlanner for ProfilePlanner {
    fn plan(
        &self,
        host: &str,
        target: &ResourceTarget,
        resolution: Option<&str>,
        duration: Option<&str>,
    ) -> Vec<Resource> {
        self.profiles
            .iter()
            .map(|profile| {
                let features = ContentFeatures {
                    profile_name: profile.dlna_profile.map(str::to_string),
                    support_time_seek: true,
                    support_range: false,
                    transcoded: true,
                };
                let mut res = Resource::new(
                    target.transcode_url(host, profile.name),
                    protocol_info(profile.mime, &features),
                );
                res.resolution = resolution.map(str::to_string);
                res.duration = duration.map(str::to_string);
                res
            })
            .collect()
    }
}
