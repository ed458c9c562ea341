//! # xbmediaserver
//!
//! MediaServer UPnP/DLNA exposant la bibliothèque de scènes XBVR.
//!
//! Le device porte deux services :
//!
//! - **ContentDirectory** : arborescence virtuelle (recherches enregistrées,
//!   toutes les scènes, acteurs, tags, mois de sortie, sites, fichiers non
//!   associés et, si configuré, un dossier local)
//! - **ConnectionManager** : connexion implicite unique, protocoles servis
//!
//! Les vidéos sont servies par `/res` avec prise en charge des requêtes
//! partielles, les jaquettes par redirection depuis `/icon`.
//!
//! ```ignore
//! use std::sync::Arc;
//! use xbmediaserver::{MediaServer, MediaServerExt, MediaServerOptions};
//!
//! let library = Arc::new(SqliteLibrary::open(&db_path)?);
//! let media_server = MediaServer::new(library, MediaServerOptions::from_config(&config)?);
//! server.register_media_server(&media_server).await;
//! ```

pub mod connectionmanager;
pub mod content_handler;
pub mod device;
pub mod listing;
pub mod mapper;
pub mod mime;
pub mod object;
pub mod options;
pub mod routes;
pub mod scpd;
pub mod server_ext;
pub mod transcode;
pub mod tree;
pub mod urls;

pub use connectionmanager::ConnectionManager;
pub use content_handler::{BrowseRequest, BrowseResult, ContentDirectory};
pub use object::{ROOT_ID, ROOT_PARENT_ID, id_to_path, path_to_id};
pub use options::MediaServerOptions;
pub use routes::MediaServerState;
pub use server_ext::MediaServerExt;
pub use transcode::{NoTranscode, ProfilePlanner, TranscodePlanner};
pub use tree::{ContentTree, RequestInfo};

use axum::Router;
use std::sync::Arc;
use xblibrary::SceneLibrary;
use xbupnp::ssdp::SsdpDevice;

/// Façade du MediaServer : état partagé et routes HTTP
#[derive(Clone)]
pub struct MediaServer {
    state: MediaServerState,
}

impl MediaServer {
    pub fn new(library: Arc<dyn SceneLibrary>, options: MediaServerOptions) -> Self {
        Self {
            state: MediaServerState::new(library, Arc::new(options)),
        }
    }

    pub fn router(&self) -> Router {
        routes::media_server_router(self.state.clone())
    }

    pub fn content_directory(&self) -> &ContentDirectory {
        &self.state.content_directory
    }

    pub fn options(&self) -> &MediaServerOptions {
        &self.state.options
    }

    /// Device à annoncer par SSDP
    pub fn ssdp_device(&self, base_url: &str) -> SsdpDevice {
        device::ssdp_device(&self.state.options, base_url)
    }
}
