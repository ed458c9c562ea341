//! Routes HTTP du MediaServer
//!
//! | Route | Rôle |
//! |---|---|
//! | `GET /rootDesc.xml` | description du device |
//! | `GET /scpd/{service}.xml` | SCPD |
//! | `POST /ctl/{service}` | contrôle SOAP |
//! | `SUBSCRIBE/UNSUBSCRIBE /evt/{service}` | abonnements (aucun évènement émis) |
//! | `GET /res` | fichier vidéo, requêtes partielles comprises |
//! | `GET /icon` | jaquette d'une scène, sinon icône générique |
//! | `GET /icons/{taille}.png` | icônes du device |

use crate::connectionmanager::{CONNECTION_MANAGER_URN, ConnectionManager};
use crate::content_handler::{CONTENT_DIRECTORY_URN, ContentDirectory};
use crate::device::{DEVICE_ICONS_PATH, ROOT_DESC_PATH, device_icon, media_server_description};
use crate::object::physical_path;
use crate::options::MediaServerOptions;
use crate::scpd::{connection_manager_scpd, content_directory_scpd};
use crate::tree::RequestInfo;
use crate::urls::{ICON_PATH, RES_PATH};
use axum::{
    Router,
    body::Bytes,
    extract::{ConnectInfo, Path, Query, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error, warn};
use uuid::Uuid;
use xbdidl::ContentFeatures;
use xblibrary::{SceneLibrary, VideoFile};
use xbupnp::soap::{build_soap_response, parse_soap_action};
use xbupnp::{ActionError, TEXT_XML_UTF8};

/// Durée d'abonnement renvoyée aux clients
const SUBSCRIPTION_TIMEOUT: &str = "Second-1800";

/// Taille de l'icône renvoyée faute de jaquette
const FALLBACK_ICON_SIZE: u32 = 128;

/// État partagé par les handlers
#[derive(Clone)]
pub struct MediaServerState {
    pub content_directory: ContentDirectory,
    pub connection_manager: ConnectionManager,
    pub library: Arc<dyn SceneLibrary>,
    pub options: Arc<MediaServerOptions>,
}

impl MediaServerState {
    pub fn new(library: Arc<dyn SceneLibrary>, options: Arc<MediaServerOptions>) -> Self {
        Self {
            content_directory: ContentDirectory::new(library.clone(), options.clone()),
            connection_manager: ConnectionManager::new(),
            library,
            options,
        }
    }

    /// Fichier désigné par les paramètres d'une URL `/res`
    async fn resolve_resource(
        &self,
        params: &HashMap<String, String>,
    ) -> xblibrary::Result<Option<PathBuf>> {
        if let Some(scene_id) = params.get("scene") {
            let scene = self.library.scene_by_scene_id(scene_id).await?;
            return Ok(scene.and_then(|s| s.first_file().map(VideoFile::full_path)));
        }
        if let Some(raw) = params.get("file") {
            let Ok(id) = raw.parse::<u64>() else {
                return Ok(None);
            };
            return Ok(self.library.file_by_id(id).await?.map(|f| f.full_path()));
        }
        if let Some(rel) = params.get("path") {
            return Ok(self
                .options
                .folders_root
                .as_deref()
                .and_then(|root| physical_path(root, rel)));
        }
        Ok(None)
    }
}

pub fn media_server_router(state: MediaServerState) -> Router {
    Router::new()
        .route(ROOT_DESC_PATH, get(root_description))
        .route("/scpd/{file}", get(service_description))
        .route("/ctl/{service}", post(control))
        .route("/evt/{service}", any(event_subscription))
        .route(RES_PATH, get(serve_resource))
        .route(ICON_PATH, get(serve_icon))
        .route(&format!("{}/{{file}}", DEVICE_ICONS_PATH), get(serve_device_icon))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            allowed_ip_guard,
        ))
        .with_state(state)
}

fn xml_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_XML_UTF8)], body).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

async fn allowed_ip_guard(
    State(state): State<MediaServerState>,
    request: Request,
    next: Next,
) -> Response {
    let allowed = &state.options.allowed_ips;
    if allowed.is_empty() {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical());
    match peer {
        Some(ip) if allowed.iter().any(|a| a.to_canonical() == ip) => next.run(request).await,
        _ => {
            warn!(peer = ?peer, uri = %request.uri(), "Request from non-allowed address rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

async fn root_description(State(state): State<MediaServerState>) -> Response {
    match media_server_description(&state.options).to_xml() {
        Ok(xml) => xml_response(StatusCode::OK, xml),
        Err(e) => {
            error!(error = %e, "Cannot render device description");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn service_description(Path(file): Path<String>) -> Response {
    let scpd = match file.as_str() {
        "ContentDirectory.xml" => content_directory_scpd(),
        "ConnectionManager.xml" => connection_manager_scpd(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    match scpd.to_xml() {
        Ok(xml) => xml_response(StatusCode::OK, xml),
        Err(e) => {
            error!(error = %e, file = %file, "Cannot render SCPD");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn control(
    State(state): State<MediaServerState>,
    Path(service): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let action = match parse_soap_action(&body) {
        Ok(action) => action,
        Err(e) => {
            warn!(service = %service, error = %e, "Malformed SOAP request");
            return xml_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ActionError::InvalidAction.to_soap_fault(),
            );
        }
    };
    let request = RequestInfo::new(
        header_str(&headers, &header::HOST),
        header_str(&headers, &header::USER_AGENT),
    );

    let (urn, result) = match service.as_str() {
        "ContentDirectory" => (
            CONTENT_DIRECTORY_URN,
            state
                .content_directory
                .handle(&action.name, &action.args, &request)
                .await,
        ),
        "ConnectionManager" => (
            CONNECTION_MANAGER_URN,
            state.connection_manager.handle(&action.name, &action.args),
        ),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    match result {
        Ok(values) => match build_soap_response(urn, &action.name, values) {
            Ok(xml) => xml_response(StatusCode::OK, xml),
            Err(e) => {
                error!(action = %action.name, error = %e, "Cannot render SOAP response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        Err(fault) => {
            warn!(
                service = %service,
                action = %action.name,
                code = fault.code(),
                error = %fault,
                "UPnP action failed"
            );
            xml_response(StatusCode::INTERNAL_SERVER_ERROR, fault.to_soap_fault())
        }
    }
}

async fn event_subscription(
    method: Method,
    Path(service): Path<String>,
    headers: HeaderMap,
) -> Response {
    match method.as_str() {
        "SUBSCRIBE" => {
            let sid = headers
                .get("SID")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .unwrap_or_else(|| format!("uuid:{}", Uuid::new_v4()));
            debug!(service = %service, sid = %sid, "Event subscription");
            (
                StatusCode::OK,
                [("SID", sid), ("TIMEOUT", SUBSCRIPTION_TIMEOUT.to_string())],
            )
                .into_response()
        }
        "UNSUBSCRIBE" => StatusCode::OK.into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

async fn serve_resource(
    State(state): State<MediaServerState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> Response {
    if params.contains_key("transcode") {
        // la conversion est assurée hors de ce serveur
        return StatusCode::NOT_IMPLEMENTED.into_response();
    }

    let path = match state.resolve_resource(&params).await {
        Ok(Some(path)) => path,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, "Resource lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    debug!(path = %path.display(), "Serving resource");

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    };
    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("transfermode.dlna.org"),
        HeaderValue::from_static("Streaming"),
    );
    if let Ok(features) = HeaderValue::from_str(&ContentFeatures::byte_range().to_string()) {
        headers.insert(HeaderName::from_static("contentfeatures.dlna.org"), features);
    }
    response
}

fn png_response(size: u32) -> Response {
    match device_icon(size) {
        Some(bytes) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve_device_icon(Path(file): Path<String>) -> Response {
    match file.strip_suffix(".png").and_then(|size| size.parse::<u32>().ok()) {
        Some(size) => png_response(size),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Redirige vers la jaquette d'une scène. Une cible existante sans jaquette
/// reçoit l'icône du device.
async fn serve_icon(
    State(state): State<MediaServerState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(scene_id) = params.get("scene") {
        return match state.library.scene_by_scene_id(scene_id).await {
            Ok(Some(scene)) if !scene.cover_url.is_empty() => {
                (StatusCode::FOUND, [(header::LOCATION, scene.cover_url)]).into_response()
            }
            Ok(Some(_)) => png_response(FALLBACK_ICON_SIZE),
            Ok(None) => StatusCode::NOT_FOUND.into_response(),
            Err(e) => {
                error!(error = %e, "Icon lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
    }

    match state.resolve_resource(&params).await {
        Ok(Some(path)) if tokio::fs::metadata(&path).await.is_ok() => {
            png_response(FALLBACK_ICON_SIZE)
        }
        Ok(_) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, "Icon lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
