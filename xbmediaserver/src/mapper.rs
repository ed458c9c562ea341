//! Conversion des scènes, fichiers et entrées de dossier en objets UPnP
//!
//! Fonctions pures hormis la lecture du fichier `.json` associé à une entrée
//! de dossier. `None` signifie « ne pas afficher » et n'est pas une erreur.

use crate::listing::FolderEntry;
use crate::mime::{is_image, is_video, item_class, mime_type_by_path};
use crate::object::{join, path_to_id};
use crate::transcode::TranscodePlanner;
use crate::urls::ResourceTarget;
use serde::Deserialize;
use std::io;
use std::time::Duration;
use tracing::warn;
use xblibrary::{Scene, VideoFile};
use xbdidl::protocol::{JPEG_MED_PROTOCOL_INFO, JPEG_TN_PROTOCOL_INFO};
use xbdidl::{
    Container, ContentFeatures, DidlObject, Item, Resource, VIDEO_ITEM_CLASS,
    format_duration_sexagesimal, protocol_info,
};

/// Suffixe qui signale aux lecteurs VR une vidéo 180° stéréo côte à côte
pub const VR_TITLE_SUFFIX: &str = " _180_180x180_3dh_LR.mp4";

const SCENE_MIME: &str = "video/mp4";

/// Contexte de construction des URLs d'une requête
#[derive(Clone, Copy)]
pub struct MapContext<'a> {
    /// En-tête `Host` de la requête
    pub host: &'a str,
    pub planner: &'a dyn TranscodePlanner,
}

/// Filtrage des entrées de dossiers locaux
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryFilter {
    pub show_images: bool,
    pub ignore_hidden: bool,
    pub ignore_unreadable: bool,
}

#[derive(Deserialize)]
struct Sidecar {
    #[serde(default)]
    display: String,
}

/// Durée d'un fichier ; une valeur nulle ou hors bornes est ignorée
fn file_duration(file: &VideoFile) -> Option<String> {
    if file.duration <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(file.duration)
        .ok()
        .map(format_duration_sexagesimal)
}

/// Ressource principale d'un fichier de la bibliothèque, suivie des variantes
/// transcodées
fn library_resources(file: &VideoFile, target: &ResourceTarget, ctx: MapContext<'_>) -> Vec<Resource> {
    let resolution = file.resolution();
    let duration = file_duration(file);

    let mut original = Resource::new(
        target.res_url(ctx.host),
        protocol_info(SCENE_MIME, &ContentFeatures::byte_range()),
    );
    original.size = Some(file.size);
    original.bitrate = (file.video_bitrate > 0).then_some(file.video_bitrate);
    original.duration = duration.clone();
    original.resolution = resolution.clone();

    let mut out = vec![original];
    out.extend(
        ctx.planner
            .plan(ctx.host, target, resolution.as_deref(), duration.as_deref()),
    );
    out
}

/// Titre d'une scène : acteurs, titre et suffixe VR
pub fn scene_title(scene: &Scene) -> String {
    format!("{} - {}{}", scene.cast.join(", "), scene.title, VR_TITLE_SUFFIX)
}

/// Item d'une scène sous `parent` ; `None` si la scène n'a aucun fichier
pub fn scene_to_item(scene: &Scene, parent: &str, ctx: MapContext<'_>) -> Option<Item> {
    let file = scene.first_file()?;
    let target = ResourceTarget::Scene(scene.scene_id.clone());
    let icon = target.icon_url(ctx.host);

    let mut item = Item::new(
        path_to_id(&join(parent, &scene.scene_id)),
        path_to_id(parent),
        scene_title(scene),
        VIDEO_ITEM_CLASS,
    );
    item.icon = Some(icon.clone());
    item.album_art = Some(icon.clone());
    item.resources = library_resources(file, &target, ctx);
    item.resources
        .push(Resource::new(icon, JPEG_MED_PROTOCOL_INFO));
    Some(item)
}

/// Item d'un fichier non rattaché, titré par son nom
pub fn file_to_item(file: &VideoFile, parent: &str, ctx: MapContext<'_>) -> Item {
    let target = ResourceTarget::File(file.id);
    let icon = target.icon_url(ctx.host);

    let mut item = Item::new(
        path_to_id(&join(parent, &format!("file-{}", file.id))),
        path_to_id(parent),
        file.filename.clone(),
        VIDEO_ITEM_CLASS,
    );
    item.icon = Some(icon.clone());
    item.album_art = Some(icon.clone());
    item.resources = library_resources(file, &target, ctx);
    item.resources.push(Resource::new(icon, JPEG_TN_PROTOCOL_INFO));
    item
}

async fn is_ignored(entry: &FolderEntry, filter: EntryFilter) -> bool {
    if filter.ignore_hidden && entry.name.starts_with('.') {
        return true;
    }
    if filter.ignore_unreadable {
        let readable = if entry.is_dir() {
            tokio::fs::read_dir(&entry.fs_path).await.is_ok()
        } else {
            tokio::fs::File::open(&entry.fs_path).await.is_ok()
        };
        if !readable {
            return true;
        }
    }
    false
}

/// Titre issu du fichier `{nom}.json` voisin, s'il existe
async fn sidecar_title(entry: &FolderEntry) -> io::Result<Option<String>> {
    let mut sidecar = entry.fs_path.clone().into_os_string();
    sidecar.push(".json");

    let raw = match tokio::fs::read(&sidecar).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match serde_json::from_slice::<Sidecar>(&raw) {
        Ok(info) => Ok(Some(format!("{}{}", info.display, VR_TITLE_SUFFIX))),
        Err(e) => {
            warn!(path = ?sidecar, error = %e, "Ignoring malformed sidecar");
            Ok(None)
        }
    }
}

/// Objet UPnP d'une entrée de dossier local
///
/// `path` est le chemin virtuel de l'entrée (`/folders/...`) et `rel` son
/// chemin relatif à la racine des dossiers, utilisé dans les URLs.
pub async fn filesystem_entry_to_object(
    entry: &FolderEntry,
    path: &str,
    rel: &str,
    filter: EntryFilter,
    ctx: MapContext<'_>,
) -> io::Result<Option<DidlObject>> {
    if is_ignored(entry, filter).await {
        return Ok(None);
    }

    let id = path_to_id(path);
    let parent = crate::object::parent_id(path);

    if entry.is_dir() {
        return Ok(Some(DidlObject::Container(Container::storage_folder(
            id,
            parent,
            entry.name.clone(),
        ))));
    }
    if !entry.metadata.is_file() {
        return Ok(None);
    }

    let Some(mime) = mime_type_by_path(&entry.fs_path) else {
        return Ok(None);
    };
    let video = is_video(&mime);
    let image = is_image(&mime);
    if !(video || (filter.show_images && image)) {
        return Ok(None);
    }

    let title = sidecar_title(entry)
        .await?
        .unwrap_or_else(|| entry.name.clone());

    let target = ResourceTarget::Path(rel.to_string());
    let icon = target.icon_url(ctx.host);

    let mut item = Item::new(id, parent, title, item_class(&mime));
    item.icon = Some(icon.clone());
    item.album_art = Some(icon.clone());

    let mut original = Resource::new(
        target.res_url(ctx.host),
        protocol_info(mime.essence_str(), &ContentFeatures::byte_range()),
    );
    original.size = Some(entry.metadata.len());
    item.resources.push(original);

    if video {
        item.resources
            .extend(ctx.planner.plan(ctx.host, &target, None, None));
    }
    if video || image {
        item.resources.push(Resource::new(icon, JPEG_TN_PROTOCOL_INFO));
    }

    Ok(Some(DidlObject::Item(item)))
}
