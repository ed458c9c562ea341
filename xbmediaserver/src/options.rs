//! Réglages du serveur de médias

use crate::transcode::{NoTranscode, ProfilePlanner, TranscodePlanner};
use anyhow::Result;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use xbconfig::Config;

/// Réglages lus une fois au démarrage
#[derive(Clone)]
pub struct MediaServerOptions {
    pub friendly_name: String,
    /// UDN du device, sans le préfixe `uuid:`
    pub udn: String,
    /// Respecte `StartingIndex` / `RequestedCount`
    pub paginate: bool,
    /// IPs autorisées ; vide = tout le monde
    pub allowed_ips: Vec<IpAddr>,
    /// Racine de la catégorie `folders`
    pub folders_root: Option<PathBuf>,
    pub folders_last_user_agents: Vec<String>,
    pub show_images: bool,
    pub ignore_hidden: bool,
    pub ignore_unreadable: bool,
    pub planner: Arc<dyn TranscodePlanner>,
}

impl fmt::Debug for MediaServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaServerOptions")
            .field("friendly_name", &self.friendly_name)
            .field("udn", &self.udn)
            .field("paginate", &self.paginate)
            .field("allowed_ips", &self.allowed_ips)
            .field("folders_root", &self.folders_root)
            .finish_non_exhaustive()
    }
}

impl Default for MediaServerOptions {
    fn default() -> Self {
        Self {
            friendly_name: "XBVR".to_string(),
            udn: "00000000-0000-0000-0000-000000000000".to_string(),
            paginate: true,
            allowed_ips: Vec::new(),
            folders_root: None,
            folders_last_user_agents: vec!["AwoX/1.1".to_string()],
            show_images: false,
            ignore_hidden: true,
            ignore_unreadable: false,
            planner: Arc::new(NoTranscode),
        }
    }
}

impl MediaServerOptions {
    /// Construit les réglages à partir de la section `dlna` de la configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let planner: Arc<dyn TranscodePlanner> = if config.get_dlna_no_transcode()? {
            Arc::new(NoTranscode)
        } else {
            Arc::new(ProfilePlanner::new(&config.get_dlna_transcode_profiles()?))
        };

        let allowed_ips = config
            .get_dlna_allowed_ips()?
            .iter()
            .filter_map(|raw| match raw.trim().parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(value = %raw, "Ignoring invalid entry in dlna.allowed_ip");
                    None
                }
            })
            .collect();

        Ok(Self {
            friendly_name: config.get_dlna_service_name()?,
            udn: config.get_device_udn("mediaserver", "xbvr")?,
            paginate: config.get_dlna_paginate()?,
            allowed_ips,
            folders_root: config.get_dlna_folders_root()?,
            folders_last_user_agents: config.get_dlna_folders_last_user_agents()?,
            show_images: config.get_dlna_show_images()?,
            ignore_hidden: config.get_dlna_ignore_hidden()?,
            ignore_unreadable: config.get_dlna_ignore_unreadable()?,
            planner,
        })
    }
}
