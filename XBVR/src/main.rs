use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use xbconfig::get_config;
use xblibrary::{LibraryBundle, SqliteLibrary};
use xbmediaserver::{MediaServer, MediaServerExt, MediaServerOptions};
use xbserver::ServerBuilder;
use xbupnp::ssdp::SsdpServer;

/// `XBVR import <bundle.json>` : charge un export JSON dans la bibliothèque
fn import_bundle(library: &SqliteLibrary, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let bundle: LibraryBundle = serde_json::from_str(&raw)
        .with_context(|| format!("invalid library bundle {}", file.display()))?;
    library.import(&bundle)?;
    info!(
        scenes = bundle.scenes.len(),
        files = bundle.files.len(),
        playlists = bundle.playlists.len(),
        "Library bundle imported"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = get_config();

    let mut server = ServerBuilder::new_configured().build();
    server.init_logging().await;

    // ========== Bibliothèque ==========
    let db_path = config.get_database_path()?;
    let library = SqliteLibrary::open(&db_path)
        .with_context(|| format!("cannot open library {}", db_path.display()))?;
    info!(path = %db_path.display(), "Scene library opened");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, file] = args.as_slice() {
        if command == "import" {
            return import_bundle(&library, Path::new(file));
        }
    }
    if !args.is_empty() {
        anyhow::bail!("usage: XBVR [import <bundle.json>]");
    }

    // ========== MediaServer ==========
    let options = MediaServerOptions::from_config(&config)?;
    let media_server = MediaServer::new(Arc::new(library), options);
    server.register_media_server(&media_server).await;

    info!("🌐 Starting HTTP server...");
    server.start().await?;

    // ========== Annonces SSDP ==========
    let _ssdp = if config.get_dlna_enabled()? {
        let interval = Duration::from_secs(config.get_dlna_notify_interval()? as u64);
        let mut ssdp = SsdpServer::with_interval(interval);
        match ssdp.start() {
            Ok(()) => {
                let info = server.info();
                let base_url = format!("http://{}:{}", info.base_url, info.http_port);
                ssdp.add_device(media_server.ssdp_device(&base_url));
                info!(location = %base_url, "✅ DLNA MediaServer announced");
                Some(ssdp)
            }
            Err(e) => {
                warn!(error = %e, "SSDP unavailable, the server will not be discovered");
                None
            }
        }
    } else {
        info!("DLNA announcements disabled");
        None
    };

    info!("✅ XBVR is ready!");
    server.wait().await;
    Ok(())
}
