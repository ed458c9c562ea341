//! # Extension trait pour le serveur HTTP
//!
//! Monte les routes du MediaServer sur un `xbserver::Server`.

use crate::MediaServer;
use async_trait::async_trait;
use tracing::info;
use xbserver::Server;

/// Trait d'extension pour enregistrer le MediaServer
///
/// # Examples
///
/// ```ignore
/// use xbmediaserver::{MediaServer, MediaServerExt};
/// use xbserver::ServerBuilder;
///
/// let mut server = ServerBuilder::new_configured().build();
/// server.register_media_server(&media_server).await;
/// ```
#[async_trait]
pub trait MediaServerExt {
    /// Monte `/rootDesc.xml`, `/scpd`, `/ctl`, `/evt`, `/res` et `/icon`
    async fn register_media_server(&mut self, media_server: &MediaServer);
}

#[async_trait]
impl MediaServerExt for Server {
    async fn register_media_server(&mut self, media_server: &MediaServer) {
        let router = media_server.router();
        self.add_router("/", router).await;
        info!(
            friendly_name = %media_server.options().friendly_name,
            udn = %media_server.options().udn,
            "MediaServer routes registered"
        );
    }
}
